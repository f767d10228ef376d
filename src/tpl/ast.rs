use crate::error::TplError;

/// One `if` / `else if` arm.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub condition: String,
    pub body: Vec<AstNode>,
}

impl Branch {
    pub fn new(condition: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            body: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    Text(String),
    Expression(String),
    Conditional {
        branches: Vec<Branch>,
        alternative: Option<Vec<AstNode>>,
    },
    Loop {
        variable: String,
        collection: String,
        body: Vec<AstNode>,
    },
}

impl AstNode {
    pub(crate) fn push_branch(&mut self, branch: Branch) -> Result<(), TplError> {
        match self {
            AstNode::Conditional {
                alternative: Some(_),
                ..
            } => Err(TplError::SyntaxError(format!(
                "`else if {}` after `else`",
                branch.condition
            ))),
            AstNode::Conditional { branches, .. } => {
                branches.push(branch);
                Ok(())
            }
            AstNode::Loop { .. } => Err(TplError::SyntaxError("`else if` after a `for` loop".into())),
            _ => Err(TplError::SyntaxError("`else if` without a matching `if`".into())),
        }
    }

    pub(crate) fn open_alternative(&mut self) -> Result<(), TplError> {
        match self {
            AstNode::Conditional { branches, .. } if branches.is_empty() => Err(
                TplError::SyntaxError("`else` on a conditional without branches".into()),
            ),
            AstNode::Conditional {
                alternative: Some(_),
                ..
            } => Err(TplError::SyntaxError("duplicate `else`".into())),
            AstNode::Conditional { alternative, .. } => {
                *alternative = Some(Vec::new());
                Ok(())
            }
            AstNode::Loop { .. } => Err(TplError::SyntaxError("`else` after a `for` loop".into())),
            _ => Err(TplError::SyntaxError("`else` without a matching `if`".into())),
        }
    }

    /// The innermost open body of a `Conditional` or `Loop`: the `else` arm
    /// once it exists, otherwise the last branch.
    pub(crate) fn open_body(&mut self) -> Result<&mut Vec<AstNode>, TplError> {
        match self {
            AstNode::Conditional {
                alternative: Some(body),
                ..
            } => Ok(body),
            AstNode::Conditional { branches, .. } => branches
                .last_mut()
                .map(|branch| &mut branch.body)
                .ok_or_else(|| TplError::SyntaxError("conditional has no branch".into())),
            AstNode::Loop { body, .. } => Ok(body),
            AstNode::Text(_) | AstNode::Expression(_) => Err(TplError::SyntaxError(
                "cannot nest content inside text or expression".into(),
            )),
        }
    }
}

/// Walk `depth` levels down the currently open path.
fn descend(nodes: &mut Vec<AstNode>, depth: isize) -> Result<&mut Vec<AstNode>, TplError> {
    if depth < 0 {
        return Err(TplError::InvalidBrackets(format!("negative depth {depth}")));
    }
    let mut current = nodes;
    for _ in 0..depth {
        current = current
            .last_mut()
            .ok_or_else(|| TplError::SyntaxError("no open block at this depth".into()))?
            .open_body()?;
    }
    Ok(current)
}

fn last_node<'n>(nodes: &'n mut [AstNode], statement: &str) -> Result<&'n mut AstNode, TplError> {
    nodes
        .last_mut()
        .ok_or_else(|| TplError::SyntaxError(format!("`{statement}` without a matching `if`")))
}

/// Append `node` to the scope that is `depth` levels below `nodes`.
pub fn add_node(nodes: &mut Vec<AstNode>, node: AstNode, depth: isize) -> Result<(), TplError> {
    descend(nodes, depth)?.push(node);
    Ok(())
}

/// Append an `else if` branch to the last conditional at `depth`.
pub fn add_branch(nodes: &mut Vec<AstNode>, branch: Branch, depth: isize) -> Result<(), TplError> {
    last_node(descend(nodes, depth)?, "else if")?.push_branch(branch)
}

/// Open the `else` arm of the last conditional at `depth`.
pub fn add_alternative(nodes: &mut Vec<AstNode>, depth: isize) -> Result<(), TplError> {
    last_node(descend(nodes, depth)?, "else")?.open_alternative()
}
