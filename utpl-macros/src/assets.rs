use glob::glob;
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use std::collections::hash_map::DefaultHasher;
use std::env;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use syn::{LitStr, parse_macro_input};

pub fn templates_impl(input: TokenStream) -> TokenStream {
    let pattern = parse_macro_input!(input as LitStr);
    let pattern_str = pattern.value();

    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        return syn::Error::new(pattern.span(), "CARGO_MANIFEST_DIR is not set")
            .to_compile_error()
            .into();
    };
    let root = PathBuf::from(manifest_dir);
    let base = root.join(literal_prefix(&pattern_str));
    let full_pattern = root.join(&pattern_str);

    let paths = match glob(&full_pattern.to_string_lossy()) {
        Ok(paths) => paths,
        Err(e) => {
            return syn::Error::new(pattern.span(), format!("invalid glob pattern: {}", e))
                .to_compile_error()
                .into();
        }
    };

    let mut assets = Vec::new();
    for path in paths.filter_map(Result::ok).filter(|p| p.is_file()) {
        let Some(name) = template_name(&base, &path) else {
            return syn::Error::new(
                pattern.span(),
                format!("cannot derive a template name for {}", path.display()),
            )
            .to_compile_error()
            .into();
        };
        let file = path.to_string_lossy().to_string();
        assets.push(quote! { (#name, include_str!(#file)) });
    }

    // One registration fn per pattern, so several invocations can share a scope.
    let mut hasher = DefaultHasher::new();
    pattern_str.hash(&mut hasher);
    let fn_name = format_ident!("__utpl_register_templates_{}", hasher.finish());

    let output = quote! {
        #[utpl::ctor::ctor]
        fn #fn_name() {
            let assets: ::std::vec::Vec<(&str, &str)> = vec![
                #(#assets),*
            ];
            if let Err(e) = utpl::loader::load_assets(assets) {
                eprintln!("utpl: failed to register embedded templates: {}", e);
            }
        }
    };

    output.into()
}

/// The leading path components of `pattern` that contain no wildcard.
fn literal_prefix(pattern: &str) -> PathBuf {
    Path::new(pattern)
        .components()
        .take_while(|c| {
            !c.as_os_str()
                .to_string_lossy()
                .contains(['*', '?', '[', '{'])
        })
        .collect()
}

fn template_name(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?.with_extension("");
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}
