use thiserror::Error;

/// Represents errors that can occur while loading, parsing or rendering templates.
#[derive(Error, Debug)]
pub enum TplError {
    #[error("Unclosed tag: input ended inside `<%` or `<%=`")]
    UnclosedTag,
    #[error("Syntax error: {0}")]
    SyntaxError(String),
    #[error("Invalid brackets: {0}")]
    InvalidBrackets(String),
    #[error("Variable not found: {0}")]
    VariableNotFound(String),
    #[error("Type mismatch: `{path}` resolved to {found}, expected a boolean")]
    TypeMismatch { path: String, found: &'static str },
    #[error("Not a collection: `{path}` resolved to {found}, expected a list")]
    NotACollection { path: String, found: &'static str },
    #[error("Template not found: {0}")]
    TemplateNotFound(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
    #[error("Invalid context: {0}")]
    InvalidContext(String),
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Template `{name}`: {source}")]
    Template {
        name: String,
        #[source]
        source: Box<TplError>,
    },
}

impl TplError {
    /// Attach the name of the template that failed to load.
    pub fn in_template(self, name: &str) -> Self {
        TplError::Template {
            name: name.to_string(),
            source: Box::new(self),
        }
    }

    /// Strip any `Template { .. }` wrapping and return the underlying error.
    pub fn root_cause(&self) -> &TplError {
        match self {
            TplError::Template { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl serde::ser::Error for TplError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        TplError::Serialize(msg.to_string())
    }
}
