use crate::error::TplError;
use crate::tpl::ast::{AstNode, Branch};
use crate::tpl::scanner::{Keyword, Token, scan};
use crate::tpl::tokenizer::{Segment, tokenize};
use std::collections::VecDeque;

/// One element of the combined stream the parser consumes: text and
/// expression segments as-is, code segments already scanned into tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Text(String),
    Expression(String),
    Code(Token),
}

impl Item {
    fn is_blank(&self) -> bool {
        matches!(self, Item::Text(t) if t.trim().is_empty())
    }
}

/// Tokenize `source` and scan every code segment.
pub fn lex(source: &str) -> Result<Vec<Item>, TplError> {
    let mut items = Vec::new();
    for segment in tokenize(source)? {
        match segment {
            Segment::Text(t) => items.push(Item::Text(t)),
            Segment::Expression(e) => items.push(Item::Expression(e)),
            Segment::Code(c) => items.extend(scan(&c).into_iter().map(Item::Code)),
        }
    }
    Ok(items)
}

/// Tokenize, scan and parse `source` in one step.
pub fn parse_template(source: &str) -> Result<Vec<AstNode>, TplError> {
    parse(lex(source)?)
}

/// Build the node tree for a lexed template.
pub fn parse(items: Vec<Item>) -> Result<Vec<AstNode>, TplError> {
    Parser {
        items: items.into(),
        root: Vec::new(),
        open: Vec::new(),
    }
    .run()
}

struct Parser {
    items: VecDeque<Item>,
    root: Vec<AstNode>,
    /// Constructs whose closing `}` has not been seen yet, outermost first.
    /// Its length is the current brace depth.
    open: Vec<AstNode>,
}

impl Parser {
    fn run(mut self) -> Result<Vec<AstNode>, TplError> {
        while let Some(item) = self.items.pop_front() {
            match item {
                Item::Text(text) => append_text(self.scope()?, text),
                Item::Expression(path) => self
                    .scope()?
                    .push(AstNode::Expression(path.trim().to_string())),
                Item::Code(token) => self.statement(token)?,
            }
        }

        if !self.open.is_empty() {
            return Err(TplError::InvalidBrackets(format!(
                "{} block(s) never closed with `}}`",
                self.open.len()
            )));
        }
        Ok(self.root)
    }

    /// The body new content is appended to.
    fn scope(&mut self) -> Result<&mut Vec<AstNode>, TplError> {
        match self.open.last_mut() {
            Some(node) => node.open_body(),
            None => Ok(&mut self.root),
        }
    }

    fn statement(&mut self, token: Token) -> Result<(), TplError> {
        match token {
            Token::Keyword(Keyword::If) => {
                let condition = self.condition()?;
                self.expect(Token::LeftBrace, "`{` after `if` condition")?;
                self.open.push(AstNode::Conditional {
                    branches: vec![Branch::new(condition)],
                    alternative: None,
                });
                Ok(())
            }
            Token::Keyword(Keyword::For) => {
                let (variable, collection) = self.loop_header()?;
                self.expect(Token::LeftBrace, "`{` after `for` header")?;
                self.open.push(AstNode::Loop {
                    variable,
                    collection,
                    body: Vec::new(),
                });
                Ok(())
            }
            Token::RightBrace => self.close(),
            Token::Keyword(Keyword::Else) => Err(TplError::SyntaxError(
                "`else` must directly follow the `}` of an `if` block".into(),
            )),
            other => Err(TplError::SyntaxError(format!(
                "unexpected {other}, expected `if`, `for` or `}}`"
            ))),
        }
    }

    /// Handle `}`, including a following `else { ` or `else if x {`.
    fn close(&mut self) -> Result<(), TplError> {
        let mut node = self
            .open
            .pop()
            .ok_or_else(|| TplError::InvalidBrackets("`}` without an open block".into()))?;

        if !self.next_is_else() {
            return self.scope().map(|scope| scope.push(node));
        }
        self.skip_blank();
        self.items.pop_front();

        match self.next_token("`{` or `if` after `else`")? {
            Token::LeftBrace => node.open_alternative()?,
            Token::Keyword(Keyword::If) => {
                let condition = self.condition()?;
                self.expect(Token::LeftBrace, "`{` after `else if` condition")?;
                node.push_branch(Branch::new(condition))?;
            }
            other => {
                return Err(TplError::SyntaxError(format!(
                    "unexpected {other} after `else`"
                )));
            }
        }
        self.open.push(node);
        Ok(())
    }

    /// `name` or `( name )`.
    fn condition(&mut self) -> Result<String, TplError> {
        match self.next_token("condition")? {
            Token::Identifier(name) => Ok(name),
            Token::LeftParen => {
                let name = self.identifier("condition")?;
                self.expect(Token::RightParen, "`)` after condition")?;
                Ok(name)
            }
            other => Err(TplError::SyntaxError(format!(
                "expected condition, found {other}"
            ))),
        }
    }

    /// `item in items` or `( item in items )`.
    fn loop_header(&mut self) -> Result<(String, String), TplError> {
        let (parenthesized, variable) = match self.next_token("loop variable")? {
            Token::Identifier(name) => (false, name),
            Token::LeftParen => (true, self.identifier("loop variable")?),
            other => {
                return Err(TplError::SyntaxError(format!(
                    "expected loop variable, found {other}"
                )));
            }
        };
        self.expect(Token::Keyword(Keyword::In), "`in` after loop variable")?;
        let collection = self.identifier("loop collection")?;
        if parenthesized {
            self.expect(Token::RightParen, "`)` after loop collection")?;
        }
        Ok((variable, collection))
    }

    fn identifier(&mut self, what: &str) -> Result<String, TplError> {
        match self.next_token(what)? {
            Token::Identifier(name) => Ok(name),
            other => Err(TplError::SyntaxError(format!(
                "expected {what}, found {other}"
            ))),
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), TplError> {
        let token = self.next_token(what)?;
        if token == expected {
            Ok(())
        } else {
            Err(TplError::SyntaxError(format!(
                "expected {what}, found {token}"
            )))
        }
    }

    /// Next token of an unfinished statement. Whitespace-only text between
    /// code tags is dropped so a statement may span several `<% %>` tags.
    fn next_token(&mut self, what: &str) -> Result<Token, TplError> {
        self.skip_blank();
        match self.items.pop_front() {
            Some(Item::Code(token)) => Ok(token),
            Some(Item::Text(text)) => Err(TplError::SyntaxError(format!(
                "expected {what}, found text {text:?}"
            ))),
            Some(Item::Expression(path)) => Err(TplError::SyntaxError(format!(
                "expected {what}, found expression `{}`",
                path.trim()
            ))),
            None => Err(TplError::SyntaxError(format!(
                "expected {what}, found end of template"
            ))),
        }
    }

    fn next_is_else(&self) -> bool {
        matches!(
            self.items.iter().find(|item| !item.is_blank()),
            Some(Item::Code(Token::Keyword(Keyword::Else)))
        )
    }

    fn skip_blank(&mut self) {
        while self.items.front().is_some_and(Item::is_blank) {
            self.items.pop_front();
        }
    }
}

fn append_text(nodes: &mut Vec<AstNode>, text: String) {
    if text.is_empty() {
        return;
    }
    if let Some(AstNode::Text(last_text)) = nodes.last_mut() {
        last_text.push_str(&text);
    } else {
        nodes.push(AstNode::Text(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> Vec<Item> {
        scan(s).into_iter().map(Item::Code).collect()
    }

    fn text(s: &str) -> AstNode {
        AstNode::Text(s.into())
    }

    #[test]
    fn test_parse_text_and_expression() {
        let nodes = parse_template("<h1>Hello <%= user.name %>!</h1>").unwrap();
        assert_eq!(
            nodes,
            vec![
                text("<h1>Hello "),
                AstNode::Expression("user.name".into()),
                text("!</h1>"),
            ]
        );
    }

    #[test]
    fn test_parse_loop() {
        let mut items = code(" for _ in loadingPosts { ");
        items.push(Item::Text("<div>Loading...</div>".into()));
        items.extend(code(" } "));

        assert_eq!(
            parse(items).unwrap(),
            vec![AstNode::Loop {
                variable: "_".into(),
                collection: "loadingPosts".into(),
                body: vec![text("<div>Loading...</div>")],
            }]
        );
    }

    #[test]
    fn test_parse_if_else_chain() {
        let nodes = parse_template(
            "<% if a { %>A<% } else if b { %>B<% } else if (c) { %>C<% } else { %>D<% } %>",
        )
        .unwrap();

        assert_eq!(
            nodes,
            vec![AstNode::Conditional {
                branches: vec![
                    Branch {
                        condition: "a".into(),
                        body: vec![text("A")]
                    },
                    Branch {
                        condition: "b".into(),
                        body: vec![text("B")]
                    },
                    Branch {
                        condition: "c".into(),
                        body: vec![text("C")]
                    },
                ],
                alternative: Some(vec![text("D")]),
            }]
        );
    }

    #[test]
    fn test_parse_else_on_separate_tags() {
        let single = parse_template("<% if a { %>A<% } else { %>B<% } %>").unwrap();
        let split = parse_template("<% if %>\n<% a %>\n<% { %>A<% } %>\n  <% else %>\n<% { %>B<% } %>")
            .unwrap();
        assert_eq!(single, split);
    }

    #[test]
    fn test_parse_nested() {
        let nodes = parse_template(
            "<% for post in posts { %><% if post.draft { %>draft<% } else { %><%= post.title %><% } %><% } %>",
        )
        .unwrap();

        assert_eq!(
            nodes,
            vec![AstNode::Loop {
                variable: "post".into(),
                collection: "posts".into(),
                body: vec![AstNode::Conditional {
                    branches: vec![Branch {
                        condition: "post.draft".into(),
                        body: vec![text("draft")],
                    }],
                    alternative: Some(vec![AstNode::Expression("post.title".into())]),
                }],
            }]
        );
    }

    #[test]
    fn test_whitespace_after_close_is_kept() {
        let nodes = parse_template("<% if a { %>A<% } %>\n<p>after</p>").unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1], text("\n<p>after</p>"));
    }

    #[test]
    fn test_duplicate_else() {
        let result = parse_template("<% if a { %>A<% } else { %>B<% } else { %>C<% } %>");
        assert!(matches!(result, Err(TplError::SyntaxError(_))));
    }

    #[test]
    fn test_else_if_after_else() {
        let result = parse_template("<% if a { %>A<% } else { %>B<% } else if c { %>C<% } %>");
        assert!(matches!(result, Err(TplError::SyntaxError(_))));
    }

    #[test]
    fn test_else_after_loop() {
        let result = parse_template("<% for x in xs { %>A<% } else { %>B<% } %>");
        assert!(matches!(result, Err(TplError::SyntaxError(_))));
    }

    #[test]
    fn test_stray_else() {
        let result = parse_template("<% else { %>B<% } %>");
        assert!(matches!(result, Err(TplError::SyntaxError(_))));
    }

    #[test]
    fn test_malformed_statements() {
        for source in [
            "<% if { %>x<% } %>",
            "<% if a b { %>x<% } %>",
            "<% if a %>x<% } %>",
            "<% for in xs { %>x<% } %>",
            "<% for x xs { %>x<% } %>",
            "<% for x in { %>x<% } %>",
            "<% for x in xs %>x<% } %>",
            "<% unknown %>",
            "<% { %>",
            "<% ( %>",
            "<% if %>text<% a { %><% } %>",
            "<% if %>",
        ] {
            assert!(
                matches!(parse_template(source), Err(TplError::SyntaxError(_))),
                "expected syntax error for {source:?}"
            );
        }
    }

    #[test]
    fn test_unclosed_block() {
        let result = parse_template("<% if x { %><p>never closed</p>");
        assert!(matches!(result, Err(TplError::InvalidBrackets(_))));

        let result = parse_template("<% for x in xs { %><% if x { %><% } %>");
        assert!(matches!(result, Err(TplError::InvalidBrackets(_))));
    }

    #[test]
    fn test_stray_close() {
        let result = parse_template("text<% } %>");
        assert!(matches!(result, Err(TplError::InvalidBrackets(_))));
    }

    #[test]
    fn test_empty_code_tags_are_ignored() {
        assert_eq!(parse_template("a<%%>b").unwrap(), vec![text("ab")]);
    }

    #[test]
    fn test_parenthesized_loop_header() {
        assert_eq!(
            parse_template("<% for (x in xs) { %>.<% } %>").unwrap(),
            parse_template("<% for x in xs { %>.<% } %>").unwrap()
        );
    }
}
