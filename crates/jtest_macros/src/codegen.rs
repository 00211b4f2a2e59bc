//! Code generation — turns the DSL AST into `jtest::Scope` builder calls.

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use syn::Type;

use crate::dsl::*;

// ============================================================================
// Public entry points
// ============================================================================

/// `context!` — an expression evaluating to `Rc<jtest::Context<State>>`.
pub fn generate_context(root: &Root) -> TokenStream {
    let name = &root.name;
    let state = &root.state;
    let scope = scope_ident();
    let body = generate_items(&root.items, &root.binding, state);

    quote! {
        ::jtest::Context::<#state>::new(#name, |#scope: &mut ::jtest::Scope<#state>| {
            #body
        })
    }
}

/// `main!` — a `fn main()` that registers every root and runs the registry.
pub fn generate_main(roots: &Roots) -> TokenStream {
    let contexts = roots.roots.iter().map(generate_context);

    quote! {
        fn main() {
            #( ::jtest::registry::register(#contexts); )*
            ::jtest::run_registered();
        }
    }
}

// ============================================================================
// Item generation
// ============================================================================

fn generate_items(items: &[Item], binding: &Ident, state: &Type) -> TokenStream {
    let scope = scope_ident();
    let mut output = TokenStream::new();

    for item in items {
        let call = match item {
            Item::Setup(hook) => {
                let block = generate_block(&hook.body, binding);
                quote! { #scope.setup(#block); }
            }
            Item::Teardown(hook) => {
                let block = generate_block(&hook.body, binding);
                quote! { #scope.teardown(#block); }
            }
            Item::Should(should) => {
                let name = &should.name;
                let block = generate_block(&should.body, binding);
                quote! { #scope.should(#name, #block); }
            }
            Item::Context(context) => {
                let name = &context.name;
                let inner = generate_items(&context.items, binding, state);
                quote! {
                    #scope.context(#name, |#scope: &mut ::jtest::Scope<#state>| {
                        #inner
                    });
                }
            }
        };
        output.extend(call);
    }

    output
}

/// A `'static` closure over the environment. The binding is touched once so
/// bodies that ignore it do not warn.
fn generate_block(body: &TokenStream, binding: &Ident) -> TokenStream {
    quote! {
        move |#binding| {
            let _ = &#binding;
            #body
        }
    }
}

/// The builder's scope handle, invisible to user code.
fn scope_ident() -> Ident {
    Ident::new("__jtest_scope", Span::mixed_site())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_contexts_become_scope_calls() {
        let root: Root = syn::parse_quote! {
            "Given something" (env: Person) {
                setup { env.name = "james".into(); }
                context "and another thing" {
                    should "work" { env.assert(true, ""); }
                }
            }
        };
        let code = generate_context(&root).to_string();

        assert!(code.contains(":: jtest :: Context :: < Person > :: new (\"Given something\""));
        assert!(code.contains(". setup (move | env |"));
        assert!(code.contains(". context (\"and another thing\""));
        assert!(code.contains(". should (\"work\" , move | env |"));
    }

    #[test]
    fn test_main_registers_every_root() {
        let roots: Roots = syn::parse_quote! {
            "one" {}
            "two" {}
        };
        let code = generate_main(&roots).to_string();

        assert!(code.starts_with("fn main ()"));
        assert_eq!(code.matches(":: jtest :: registry :: register").count(), 2);
        assert!(code.contains(":: jtest :: run_registered ()"));
    }
}
