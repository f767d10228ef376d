pub mod ast;
pub mod engine;
pub mod parser;
pub mod render;
pub mod render_context;
pub mod scanner;
pub mod tokenizer;

pub use ast::{AstNode, Branch};
pub use engine::Template;
pub use parser::{Item, lex, parse, parse_template};
pub use render::evaluate;
pub use scanner::{Keyword, Token, scan};
pub use tokenizer::{Segment, tokenize};
