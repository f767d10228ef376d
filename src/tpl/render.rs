use crate::error::TplError;
use crate::tpl::ast::{AstNode, Branch};
use crate::tpl::engine::context_value;
use crate::tpl::render_context::Context;
use crate::value::Value;
use serde::Serialize;

/// Render `nodes` against a serializable context into a new string.
/// `None` renders against an empty mapping.
pub fn evaluate<T: Serialize + ?Sized>(
    nodes: &[AstNode],
    context: Option<&T>,
) -> Result<String, TplError> {
    let root = context_value(context)?;
    let mut buf = String::new();
    render(nodes, &Context::new(&root), &mut buf)?;
    Ok(buf)
}

/// Render `nodes` against `ctx`, appending to `buf`.
///
/// Any lookup or type failure aborts the whole render.
pub fn render(nodes: &[AstNode], ctx: &Context, buf: &mut String) -> Result<(), TplError> {
    for node in nodes {
        match node {
            AstNode::Text(t) => buf.push_str(t),
            AstNode::Expression(path) => {
                buf.push_str(&ctx.lookup(path)?.to_string());
            }
            AstNode::Conditional {
                branches,
                alternative,
            } => {
                if let Some(body) = select_branch(branches, ctx)? {
                    render(body, ctx, buf)?;
                } else if let Some(body) = alternative {
                    render(body, ctx, buf)?;
                }
            }
            AstNode::Loop {
                variable,
                collection,
                body,
            } => {
                let value = ctx.lookup(collection)?;
                let Value::List(items) = &*value else {
                    return Err(TplError::NotACollection {
                        path: collection.clone(),
                        found: value.type_name(),
                    });
                };
                for item in items {
                    render(body, &ctx.bind(variable, item), buf)?;
                }
            }
        }
    }
    Ok(())
}

/// First branch whose condition is `true`; later conditions are not evaluated.
fn select_branch<'n>(
    branches: &'n [Branch],
    ctx: &Context,
) -> Result<Option<&'n [AstNode]>, TplError> {
    for branch in branches {
        if eval_condition(&branch.condition, ctx)? {
            return Ok(Some(&branch.body));
        }
    }
    Ok(None)
}

fn eval_condition(path: &str, ctx: &Context) -> Result<bool, TplError> {
    match &*ctx.lookup(path)? {
        Value::Bool(b) => Ok(*b),
        other => Err(TplError::TypeMismatch {
            path: path.to_string(),
            found: other.type_name(),
        }),
    }
}
