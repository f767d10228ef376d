use crate::error::TplError;
use crate::tpl::ast::AstNode;
use crate::tpl::parser::parse_template;
use crate::tpl::render;
use crate::tpl::render_context::Context;
use crate::value::{Value, to_value};
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Instant;
use tracing::debug;

/// A parsed template. Immutable once built, so one instance can be rendered
/// from many threads at once.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    name: String,
    nodes: Vec<AstNode>,
    content_hash: u64,
}

impl Template {
    /// Parse `source` into a named template.
    pub fn parse(name: impl Into<String>, source: &str) -> Result<Self, TplError> {
        let name = name.into();
        let nodes = parse_template(source).map_err(|e| e.in_template(&name))?;
        Ok(Self {
            name,
            nodes,
            content_hash: content_hash(source),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[AstNode] {
        &self.nodes
    }

    pub fn content_hash(&self) -> u64 {
        self.content_hash
    }

    /// Render against a serializable context; `None` renders against an
    /// empty mapping.
    pub fn render<T: Serialize + ?Sized>(&self, context: Option<&T>) -> Result<String, TplError> {
        let root = context_value(context)?;
        self.render_value(&root)
    }

    /// Render against an already serialized context.
    pub fn render_value(&self, root: &Value) -> Result<String, TplError> {
        render_template(self, &Context::new(root))
    }
}

/// Hash of the template source, used to skip re-parsing unchanged content.
pub fn content_hash(source: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    hasher.finish()
}

/// Serialize the caller's context. A missing or unit context is an empty
/// mapping; anything else must serialize to a mapping.
pub fn context_value<T: Serialize + ?Sized>(context: Option<&T>) -> Result<Value, TplError> {
    let value = match context {
        Some(context) => to_value(context)?,
        None => return Ok(Value::empty_map()),
    };
    match value {
        Value::Map(_) => Ok(value),
        Value::Null => Ok(Value::empty_map()),
        other => Err(TplError::InvalidContext(format!(
            "context must serialize to a map, got {}",
            other.type_name()
        ))),
    }
}

/// Render a template against `ctx`, logging how long it took.
pub fn render_template(template: &Template, ctx: &Context) -> Result<String, TplError> {
    let start = Instant::now();
    let mut buf = String::with_capacity(estimate_capacity(&template.nodes));
    let result = render::render(&template.nodes, ctx, &mut buf);
    let elapsed_us = start.elapsed().as_micros();
    let err = result.as_ref().err().map(|e| e.to_string());
    debug!(
        "render: template={}, elapsed_us={}, bytes={}, error={:?}",
        template.name,
        elapsed_us,
        buf.len(),
        err
    );
    result.map(|_| buf)
}

fn estimate_capacity(nodes: &[AstNode]) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            AstNode::Text(t) => t.len(),
            _ => 16,
        })
        .sum()
}
