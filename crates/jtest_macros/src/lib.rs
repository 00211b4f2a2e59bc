//! Proc macros for the `jtest` unit-test framework.

mod codegen;
mod dsl;

/// Declare a context tree with a block-structured DSL.
///
/// Expands to a `jtest::Context::<State>::new(..)` call and evaluates to
/// `Rc<jtest::Context<State>>`. The tree is built but not run.
///
/// # Example
///
/// ```text
/// #[derive(Default)]
/// struct Person { name: String }
///
/// let root = jtest::context! {
///     "Given something" (env: Person) {
///         setup {
///             env.name = "james".to_string();
///         }
///
///         should "work" {
///             env.assert_equal("james", env.name.as_str());
///         }
///
///         context "and another thing" {
///             setup { env.name.push_str(" is amazing"); }
///             should "see both setups" {
///                 env.assert_equal("james is amazing", env.name.as_str());
///             }
///         }
///     }
/// };
/// root.run();
/// assert!(root.passed());
/// ```
///
/// # Supported DSL keywords
///
/// - `"name" (binding: State) { ... }` — the root. `(binding: State)` names the
///   environment inside every block and fixes the state type; `(binding)` alone
///   uses `()`; leaving it out binds `env` with state `()`.
/// - `context "name" { ... }` / `given "name" { ... }` — nested context
/// - `should "name" { ... }` / `it "name" { ... }` — a test
/// - `setup { ... }` — runs before every test in this context and below it,
///   outermost first
/// - `teardown { ... }` — runs after every test in this context and below it,
///   innermost first
#[proc_macro]
pub fn context(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let root = syn::parse_macro_input!(input as dsl::Root);
    codegen::generate_context(&root).into()
}

/// Generate `fn main()` for a test target with `harness = false`.
///
/// Each root is built, registered in `jtest::registry`, and the whole
/// registry is run and printed with `jtest::run_registered()`.
///
/// # Setup
///
/// In `Cargo.toml`:
/// ```toml
/// [[test]]
/// name = "my_tests"
/// harness = false
/// ```
///
/// In your test file:
/// ```text
/// jtest::main! {
///     "Calculator" {
///         should "add" { env.assert_equal(5, 2 + 3); }
///     }
///
///     "Strings" (s) {
///         should "uppercase" { s.assert_equal("HI", "hi".to_uppercase()); }
///     }
/// }
/// ```
#[proc_macro]
pub fn main(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let roots = syn::parse_macro_input!(input as dsl::Roots);
    codegen::generate_main(&roots).into()
}
