use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    If,
    Else,
    For,
    In,
}

impl Keyword {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "if" => Some(Keyword::If),
            "else" => Some(Keyword::Else),
            "for" => Some(Keyword::For),
            "in" => Some(Keyword::In),
            _ => None,
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Keyword::If => write!(f, "if"),
            Keyword::Else => write!(f, "else"),
            Keyword::For => write!(f, "for"),
            Keyword::In => write!(f, "in"),
        }
    }
}

/// Lexical token of a code segment.
///
/// Identifiers keep their dots; `user.name` is one identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(Keyword),
    Identifier(String),
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Keyword(keyword) => write!(f, "keyword `{keyword}`"),
            Token::Identifier(name) => write!(f, "identifier `{name}`"),
            Token::LeftParen => write!(f, "`(`"),
            Token::RightParen => write!(f, "`)`"),
            Token::LeftBrace => write!(f, "`{{`"),
            Token::RightBrace => write!(f, "`}}`"),
        }
    }
}

/// Split the content of a code segment into tokens. Never fails: any run of
/// non-delimiter characters is an identifier.
pub fn scan(code: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    for c in code.chars() {
        let punct = match c {
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            '{' => Some(Token::LeftBrace),
            '}' => Some(Token::RightBrace),
            c if c.is_whitespace() => None,
            _ => {
                word.push(c);
                continue;
            }
        };
        flush_word(&mut tokens, &mut word);
        if let Some(token) = punct {
            tokens.push(token);
        }
    }
    flush_word(&mut tokens, &mut word);

    tokens
}

fn flush_word(tokens: &mut Vec<Token>, word: &mut String) {
    if word.is_empty() {
        return;
    }
    let word = std::mem::take(word);
    tokens.push(match Keyword::from_word(&word) {
        Some(keyword) => Token::Keyword(keyword),
        None => Token::Identifier(word),
    });
}
