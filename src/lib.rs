pub mod error;
pub mod loader;
pub mod options;
pub mod registry;
pub mod tpl;
pub mod value;

pub use error::TplError;
pub use options::TemplateOptions;
pub use registry::{TEMPLATES, Templates, templates};
pub use tpl::Template;
pub use value::{Value, to_value};

#[cfg(feature = "macros")]
#[doc(hidden)]
pub use ctor;
#[cfg(feature = "macros")]
pub use utpl_macros::templates;
