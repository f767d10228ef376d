use crate::error::TplError;

/// A chunk of template source, split on `<% %>` and `<%= %>`.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    /// Raw content between `<%=` and `%>`.
    Expression(String),
    /// Raw content between `<%` and `%>`.
    Code(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TagKind {
    Code,
    Expression,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    ReadingText,
    SawOpeningBracket,
    SawOpeningDelimiter,
    ReadingTag(TagKind),
    SawClosingPercent(TagKind),
}

/// Split template source into text, expression and code segments.
pub fn tokenize(source: &str) -> Result<Vec<Segment>, TplError> {
    let mut segments = Vec::new();
    let mut buffer = String::new();
    let mut state = State::ReadingText;

    for c in source.chars() {
        state = match state {
            State::ReadingText => {
                if c == '<' {
                    State::SawOpeningBracket
                } else {
                    buffer.push(c);
                    State::ReadingText
                }
            }
            State::SawOpeningBracket => {
                if c == '%' {
                    flush_text(&mut segments, &mut buffer);
                    State::SawOpeningDelimiter
                } else if c == '<' {
                    // Deliberate deviation: `<<%` keeps one `<` as text and still opens a tag.
                    buffer.push('<');
                    State::SawOpeningBracket
                } else {
                    buffer.push('<');
                    buffer.push(c);
                    State::ReadingText
                }
            }
            State::SawOpeningDelimiter => match c {
                '=' => State::ReadingTag(TagKind::Expression),
                // `<%%>`: an empty code tag that is already waiting for `>`.
                '%' => State::SawClosingPercent(TagKind::Code),
                _ => {
                    buffer.push(c);
                    State::ReadingTag(TagKind::Code)
                }
            },
            State::ReadingTag(kind) => {
                if c == '%' {
                    State::SawClosingPercent(kind)
                } else {
                    buffer.push(c);
                    State::ReadingTag(kind)
                }
            }
            State::SawClosingPercent(kind) => {
                if c == '>' {
                    let content = std::mem::take(&mut buffer);
                    segments.push(match kind {
                        TagKind::Code => Segment::Code(content),
                        TagKind::Expression => Segment::Expression(content),
                    });
                    State::ReadingText
                } else if c == '%' {
                    // Deliberate deviation: `%%>` still closes, keeping one `%` as content.
                    buffer.push('%');
                    State::SawClosingPercent(kind)
                } else {
                    buffer.push('%');
                    buffer.push(c);
                    State::ReadingTag(kind)
                }
            }
        };
    }

    match state {
        State::ReadingText => {}
        // Deliberate deviation: a lone trailing `<` is plain text, not an unclosed tag.
        State::SawOpeningBracket => buffer.push('<'),
        _ => return Err(TplError::UnclosedTag),
    }
    flush_text(&mut segments, &mut buffer);

    Ok(segments)
}

fn flush_text(segments: &mut Vec<Segment>, buffer: &mut String) {
    if !buffer.is_empty() {
        segments.push(Segment::Text(std::mem::take(buffer)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let source = "<h1>Hello, world!</h1>\n<p>100% < 200%</p> <";
        assert_eq!(
            tokenize(source).unwrap(),
            vec![Segment::Text(source.to_string())]
        );
    }

    #[test]
    fn test_empty_source() {
        assert!(tokenize("").unwrap().is_empty());
    }

    #[test]
    fn test_expression() {
        assert_eq!(
            tokenize("<h1>Hello <%= name %>!</h1>").unwrap(),
            vec![
                Segment::Text("<h1>Hello ".into()),
                Segment::Expression(" name ".into()),
                Segment::Text("!</h1>".into()),
            ]
        );
    }

    #[test]
    fn test_code() {
        assert_eq!(
            tokenize("<% if x { %>yes<% } %>").unwrap(),
            vec![
                Segment::Code(" if x { ".into()),
                Segment::Text("yes".into()),
                Segment::Code(" } ".into()),
            ]
        );
    }

    #[test]
    fn test_empty_tags() {
        assert_eq!(
            tokenize("a<%%>b<%=%>").unwrap(),
            vec![
                Segment::Text("a".into()),
                Segment::Code("".into()),
                Segment::Text("b".into()),
                Segment::Expression("".into()),
            ]
        );
    }

    #[test]
    fn test_percent_inside_tag() {
        assert_eq!(
            tokenize("<%= 50%off %>").unwrap(),
            vec![Segment::Expression(" 50%off ".into())]
        );
    }

    #[test]
    fn test_unclosed_tag() {
        assert!(matches!(tokenize("<% if x { "), Err(TplError::UnclosedTag)));
        assert!(matches!(tokenize("text <%= name"), Err(TplError::UnclosedTag)));
        assert!(matches!(tokenize("text <%"), Err(TplError::UnclosedTag)));
        assert!(matches!(tokenize("<% x %"), Err(TplError::UnclosedTag)));
    }

    #[test]
    fn test_repeated_delimiter_chars() {
        assert_eq!(
            tokenize("a <<%= x %%>").unwrap(),
            vec![
                Segment::Text("a <".into()),
                Segment::Expression(" x %".into()),
            ]
        );
    }
}
