//! DSL AST types and `syn::parse::Parse` implementations.

use proc_macro2::{Span, TokenStream};
use syn::parse::{Parse, ParseStream};
use syn::{braced, parenthesized, parse_quote, Ident, LitStr, Result, Token, Type};

// ============================================================================
// AST types
// ============================================================================

/// One or more root contexts, for `main!`.
#[derive(Debug)]
pub struct Roots {
    pub roots: Vec<Root>,
}

/// `"name" (env: State) { items... }`
#[derive(Debug)]
pub struct Root {
    pub name: LitStr,
    /// Identifier the setup, teardown and test bodies see the environment as.
    pub binding: Ident,
    pub state: Type,
    pub items: Vec<Item>,
}

#[derive(Debug)]
pub enum Item {
    Setup(HookBlock),
    Teardown(HookBlock),
    Should(ShouldBlock),
    Context(ContextBlock),
}

/// `setup { ... }` / `teardown { ... }`
#[derive(Debug)]
pub struct HookBlock {
    pub body: TokenStream,
}

/// `should "name" { ... }` / `it "name" { ... }`
#[derive(Debug)]
pub struct ShouldBlock {
    pub name: LitStr,
    pub body: TokenStream,
}

/// `context "name" { items... }` / `given "name" { items... }`
#[derive(Debug)]
pub struct ContextBlock {
    pub name: LitStr,
    pub items: Vec<Item>,
}

// ============================================================================
// Parsing
// ============================================================================

impl Parse for Roots {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut roots = Vec::new();
        while !input.is_empty() {
            roots.push(input.parse::<Root>()?);
        }
        if roots.is_empty() {
            return Err(input.error("expected at least one root context: `\"name\" { ... }`"));
        }
        Ok(Roots { roots })
    }
}

impl Parse for Root {
    fn parse(input: ParseStream) -> Result<Self> {
        let name: LitStr = input.parse()?;

        let mut binding = Ident::new("env", Span::call_site());
        let mut state: Type = parse_quote!(());
        if input.peek(syn::token::Paren) {
            let content;
            parenthesized!(content in input);
            binding = content.parse()?;
            if content.peek(Token![:]) {
                content.parse::<Token![:]>()?;
                state = content.parse()?;
            }
            if !content.is_empty() {
                return Err(content.error("expected `(binding)` or `(binding: State)`"));
            }
        }

        let content;
        braced!(content in input);
        let items = parse_items(&content)?;
        Ok(Root {
            name,
            binding,
            state,
            items,
        })
    }
}

/// Parse a sequence of DSL items until the stream is exhausted.
fn parse_items(input: ParseStream) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    while !input.is_empty() {
        items.push(input.parse::<Item>()?);
    }
    Ok(items)
}

impl Parse for Item {
    fn parse(input: ParseStream) -> Result<Self> {
        let ident: Ident = input.parse()?;

        match ident.to_string().as_str() {
            "setup" => Ok(Item::Setup(parse_hook_block(input)?)),
            "teardown" => Ok(Item::Teardown(parse_hook_block(input)?)),
            "should" | "it" => Ok(Item::Should(parse_should_block(input)?)),
            "context" | "given" => Ok(Item::Context(parse_context_block(input)?)),
            other => Err(syn::Error::new(
                ident.span(),
                format!(
                    "unknown DSL keyword `{other}`. Expected one of: \
                     setup, teardown, should, it, context, given"
                ),
            )),
        }
    }
}

// ============================================================================
// Block parsers
// ============================================================================

/// Parse: `{ body }`
fn parse_hook_block(input: ParseStream) -> Result<HookBlock> {
    let content;
    braced!(content in input);
    let body: TokenStream = content.parse()?;
    Ok(HookBlock { body })
}

/// Parse: `"name" { body }`
fn parse_should_block(input: ParseStream) -> Result<ShouldBlock> {
    let name: LitStr = input.parse()?;
    let content;
    braced!(content in input);
    let body: TokenStream = content.parse()?;
    Ok(ShouldBlock { name, body })
}

/// Parse: `"name" { items... }`
fn parse_context_block(input: ParseStream) -> Result<ContextBlock> {
    let name: LitStr = input.parse()?;
    let content;
    braced!(content in input);
    let items = parse_items(&content)?;
    Ok(ContextBlock { name, items })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_tree() {
        let root: Root = syn::parse_quote! {
            "Given something" (env: Person) {
                setup { env.name = "james".into(); }
                should "work" { env.assert(true, ""); }
                context "and another thing" {
                    teardown {}
                    it "works too" {}
                    given "deeper" {}
                }
            }
        };

        assert_eq!(root.name.value(), "Given something");
        assert_eq!(root.binding, "env");
        assert_eq!(root.items.len(), 3);
        assert!(matches!(root.items[0], Item::Setup(_)));
        match &root.items[2] {
            Item::Context(block) => {
                assert_eq!(block.name.value(), "and another thing");
                assert_eq!(block.items.len(), 3);
                assert!(matches!(block.items[1], Item::Should(ref s) if s.name.value() == "works too"));
            }
            other => panic!("expected a context, got {other:?}"),
        }
    }

    #[test]
    fn test_binding_and_state_default() {
        let unit: Type = parse_quote!(());

        let root: Root = syn::parse_quote!("bare" {});
        assert_eq!(root.binding, "env");
        assert_eq!(root.state, unit);

        let root: Root = syn::parse_quote!("named" (world) {});
        assert_eq!(root.binding, "world");
        assert_eq!(root.state, unit);
    }

    #[test]
    fn test_unknown_keyword_is_rejected() {
        let err = syn::parse_str::<Root>(r#""root" { before_each {} }"#).unwrap_err();
        assert!(err.to_string().contains("unknown DSL keyword `before_each`"));
    }

    #[test]
    fn test_main_needs_a_root() {
        assert!(syn::parse_str::<Roots>("").is_err());
        let roots = syn::parse_str::<Roots>(r#""a" {} "b" (env: u32) {}"#).unwrap();
        assert_eq!(roots.roots.len(), 2);
    }
}
