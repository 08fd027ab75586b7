use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriviaKind {
    Whitespace,
    EndOfLine,
    SingleLineComment,
    MultiLineComment,
    /// `///` or `/** */` documentation comment.
    DocComment,
    /// Preprocessor line such as `#region`.
    Directive,
    /// Source text the grammar did not account for.
    Skipped,
}

impl TriviaKind {
    pub fn is_comment(self) -> bool {
        matches!(
            self,
            TriviaKind::SingleLineComment | TriviaKind::MultiLineComment | TriviaKind::DocComment
        )
    }

    /// Trivia that carries structure of its own rather than plain formatting.
    pub fn is_structured(self) -> bool {
        matches!(
            self,
            TriviaKind::DocComment | TriviaKind::Directive | TriviaKind::Skipped
        )
    }
}

/// One formatting item attached to a token boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trivia {
    kind: TriviaKind,
    text: String,
}

impl Trivia {
    pub fn new(kind: TriviaKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn whitespace(text: impl Into<String>) -> Self {
        Self::new(TriviaKind::Whitespace, text)
    }

    pub fn end_of_line(text: impl Into<String>) -> Self {
        Self::new(TriviaKind::EndOfLine, text)
    }

    pub fn kind(&self) -> TriviaKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

pub(crate) fn trivia_len(trivia: &[Trivia]) -> usize {
    trivia.iter().map(Trivia::len).sum()
}

/// A slice of gap text: either trivia or a run the lexer could not classify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Piece {
    Trivia(Trivia),
    Text(Range<usize>),
}

/// Split the text between two tokens into trivia.
///
/// `at_line_start` tells whether the gap begins a line (only then may a `#`
/// start a directive).
pub(crate) fn lex_gap(text: &str, at_line_start: bool) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut pos = 0;
    let mut line_start = at_line_start;
    let mut pending_text: Option<usize> = None;

    while pos < text.len() {
        let rest = &text[pos..];
        let item = classify(rest, line_start);

        match item {
            Some((kind, len)) => {
                if let Some(start) = pending_text.take() {
                    pieces.push(Piece::Text(start..pos));
                }
                pieces.push(Piece::Trivia(Trivia::new(kind, &rest[..len])));
                line_start = match kind {
                    TriviaKind::EndOfLine => true,
                    TriviaKind::Whitespace => line_start,
                    _ => false,
                };
                pos += len;
            }
            None => {
                pending_text.get_or_insert(pos);
                line_start = false;
                pos += rest.chars().next().map_or(1, char::len_utf8);
            }
        }
    }

    if let Some(start) = pending_text {
        pieces.push(Piece::Text(start..text.len()));
    }

    pieces
}

/// Split gap text into trivia, keeping unclassified runs as skipped trivia.
pub(crate) fn split_trivia(text: &str, at_line_start: bool) -> Vec<Trivia> {
    lex_gap(text, at_line_start)
        .into_iter()
        .map(|piece| match piece {
            Piece::Trivia(trivia) => trivia,
            Piece::Text(range) => Trivia::new(TriviaKind::Skipped, &text[range]),
        })
        .collect()
}

fn classify(rest: &str, line_start: bool) -> Option<(TriviaKind, usize)> {
    if rest.starts_with("\r\n") {
        return Some((TriviaKind::EndOfLine, 2));
    }
    if rest.starts_with('\n') || rest.starts_with('\r') {
        return Some((TriviaKind::EndOfLine, 1));
    }

    let first = rest.chars().next()?;
    if first.is_whitespace() {
        let len = rest
            .char_indices()
            .find(|(_, c)| !c.is_whitespace() || *c == '\n' || *c == '\r')
            .map_or(rest.len(), |(idx, _)| idx);
        return Some((TriviaKind::Whitespace, len));
    }

    if rest.starts_with("//") {
        let kind = if rest.starts_with("///") && !rest.starts_with("////") {
            TriviaKind::DocComment
        } else {
            TriviaKind::SingleLineComment
        };
        return Some((kind, line_len(rest)));
    }

    if rest.starts_with("/*") {
        let len = rest[2..].find("*/").map_or(rest.len(), |idx| idx + 4);
        let kind = if rest.starts_with("/**") && !rest.starts_with("/**/") {
            TriviaKind::DocComment
        } else {
            TriviaKind::MultiLineComment
        };
        return Some((kind, len));
    }

    if first == '#' && line_start {
        return Some((TriviaKind::Directive, line_len(rest)));
    }

    None
}

fn line_len(text: &str) -> usize {
    text.find(['\n', '\r']).unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TriviaKind> {
        split_trivia(text, true).iter().map(Trivia::kind).collect()
    }

    #[test]
    fn splits_whitespace_and_line_breaks() {
        assert_eq!(
            kinds("  \r\n\t\n"),
            vec![
                TriviaKind::Whitespace,
                TriviaKind::EndOfLine,
                TriviaKind::Whitespace,
                TriviaKind::EndOfLine
            ]
        );
    }

    #[test]
    fn recognizes_comments() {
        assert_eq!(
            kinds("// note\n/* block */ /// doc"),
            vec![
                TriviaKind::SingleLineComment,
                TriviaKind::EndOfLine,
                TriviaKind::MultiLineComment,
                TriviaKind::Whitespace,
                TriviaKind::DocComment
            ]
        );
    }

    #[test]
    fn directive_only_at_line_start() {
        assert_eq!(kinds("    #region Fields"), vec![
            TriviaKind::Whitespace,
            TriviaKind::Directive
        ]);
        let pieces = lex_gap(" #x", false);
        assert!(matches!(pieces.last(), Some(Piece::Text(_))));
    }

    #[test]
    fn unknown_text_is_reported_as_a_run() {
        let pieces = lex_gap(" abc def", false);
        assert_eq!(
            pieces,
            vec![
                Piece::Trivia(Trivia::whitespace(" ")),
                Piece::Text(1..4),
                Piece::Trivia(Trivia::whitespace(" ")),
                Piece::Text(5..8),
            ]
        );
    }

    #[test]
    fn unterminated_block_comment_runs_to_end() {
        let trivia = split_trivia("/* open", false);
        assert_eq!(trivia.len(), 1);
        assert_eq!(trivia[0].text(), "/* open");
    }
}
