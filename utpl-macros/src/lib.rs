use proc_macro::TokenStream;

mod assets;

/// Embed every template matching a glob pattern (relative to the crate root)
/// and register them in the process-wide registry at program start.
///
/// ```ignore
/// utpl::templates!["views/**/*.html"];
/// ```
///
/// `views/posts/index.html` is registered as `posts/index`.
#[proc_macro]
pub fn templates(input: TokenStream) -> TokenStream {
    assets::templates_impl(input)
}
