//! Inline markup for paragraph text.
//!
//! Paragraphs accept the two tags the form needs: `<b>` for bold and `<i>` for italic.  Tags
//! nest, must be closed in order, and everything else is literal text.  The parser turns the
//! markup into [`Span`]s that map onto `genpdf` styled strings.

use std::fmt;

use genpdf::style::{Style, StyledString};

/// A slice of text together with its inline style flags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    text: String,
    bold: bool,
    italic: bool,
}

impl Span {
    /// Creates a new span with the provided text and no styles applied.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Returns the raw text contained in this span.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Convenience shorthand that marks the span as bold.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Convenience shorthand that marks the span as italic.
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    fn to_style(&self) -> Style {
        let mut style = Style::new();
        if self.bold {
            style.set_bold();
        }
        if self.italic {
            style.set_italic();
        }
        style
    }

    /// Converts the span to a [`StyledString`]; the paragraph style supplies font and size.
    pub fn to_styled_string(&self) -> StyledString {
        StyledString::new(self.text.clone(), self.to_style())
    }
}

impl From<&Span> for StyledString {
    fn from(span: &Span) -> Self {
        span.to_styled_string()
    }
}

/// Parse errors produced by [`parse_markup`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    index: usize,
    message: String,
}

impl ParseError {
    fn new(index: usize, message: impl Into<String>) -> Self {
        Self {
            index,
            message: message.into(),
        }
    }

    /// Byte index in the input string where the error was detected.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Human-readable description of the parsing error.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {})", self.message, self.index)
    }
}

impl std::error::Error for ParseError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tag {
    Bold,
    Italic,
}

impl Tag {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "b" => Some(Tag::Bold),
            "i" => Some(Tag::Italic),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Tag::Bold => "b",
            Tag::Italic => "i",
        }
    }
}

/// Parses `<b>`/`<i>` markup into a list of [`Span`]s.
pub fn parse_markup(input: &str) -> Result<Vec<Span>, ParseError> {
    let mut spans = Vec::new();
    let mut open: Vec<(Tag, usize)> = Vec::new();
    let mut buffer = String::new();
    let mut index = 0;

    while let Some(offset) = input[index..].find('<') {
        let start = index + offset;
        buffer.push_str(&input[index..start]);

        let end = input[start..]
            .find('>')
            .map(|close| start + close)
            .ok_or_else(|| ParseError::new(start, "unterminated tag"))?;
        let body = &input[start + 1..end];
        let (closing, name) = match body.strip_prefix('/') {
            Some(name) => (true, name),
            None => (false, body),
        };
        let tag = Tag::from_name(name)
            .ok_or_else(|| ParseError::new(start, format!("unsupported tag `<{body}>`")))?;

        flush_buffer(&mut buffer, &mut spans, &open);
        if closing {
            match open.pop() {
                Some((expected, _)) if expected == tag => {}
                Some((expected, _)) => {
                    return Err(ParseError::new(
                        start,
                        format!("expected `</{}>`, found `</{}>`", expected.name(), name),
                    ))
                }
                None => {
                    return Err(ParseError::new(
                        start,
                        format!("closing `</{name}>` without matching opening tag"),
                    ))
                }
            }
        } else {
            open.push((tag, start));
        }
        index = end + 1;
    }

    buffer.push_str(&input[index..]);
    if let Some((tag, position)) = open.last() {
        return Err(ParseError::new(
            *position,
            format!("unterminated `<{}>`", tag.name()),
        ));
    }
    flush_buffer(&mut buffer, &mut spans, &open);
    Ok(spans)
}

fn flush_buffer(buffer: &mut String, spans: &mut Vec<Span>, open: &[(Tag, usize)]) {
    if buffer.is_empty() {
        return;
    }
    let mut span = Span::new(std::mem::take(buffer));
    for (tag, _) in open {
        span = match tag {
            Tag::Bold => span.bold(),
            Tag::Italic => span.italic(),
        };
    }
    spans.push(span);
}

/// Concatenates the text of all spans, dropping the markup.
pub fn plain_text(spans: &[Span]) -> String {
    spans.iter().map(Span::text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_to_style_reflects_flags() {
        let styled = Span::new("Hello").bold().italic().to_styled_string();
        assert_eq!(styled.s, "Hello");
        assert!(styled.style.is_bold());
        assert!(styled.style.is_italic());
    }

    #[test]
    fn parse_plain_text() {
        let spans = parse_markup("Hiermit erkläre ich").expect("parse succeeds");
        assert_eq!(spans, vec![Span::new("Hiermit erkläre ich")]);
    }

    #[test]
    fn parse_nested_tags() {
        let spans = parse_markup("Beim <b>TSV <i>1862</i></b> e.V.").expect("parse succeeds");
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[0], Span::new("Beim "));
        assert_eq!(spans[1], Span::new("TSV ").bold());
        assert_eq!(spans[2], Span::new("1862").bold().italic());
        assert_eq!(spans[3], Span::new(" e.V."));
        assert_eq!(plain_text(&spans), "Beim TSV 1862 e.V.");
    }

    #[test]
    fn error_on_unterminated_tag() {
        let err = parse_markup("<b>oops").unwrap_err();
        assert!(err.message().contains("unterminated `<b>`"));
        assert_eq!(err.index(), 0);
    }

    #[test]
    fn error_on_mismatched_close() {
        let err = parse_markup("<b><i>x</b></i>").unwrap_err();
        assert!(err.message().contains("expected `</i>`"));
    }

    #[test]
    fn error_on_unknown_tag() {
        let err = parse_markup("a <u>b</u>").unwrap_err();
        assert_eq!(err.index(), 2);
        assert!(err.message().contains("unsupported tag"));
    }
}
