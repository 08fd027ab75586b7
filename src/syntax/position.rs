use serde::Serialize;

/// Zero-based line and column; the column counts characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LinePosition {
    pub line: usize,
    pub column: usize,
}

/// Maps byte offsets of one text onto line/column positions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    text: String,
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(idx, _)| idx + 1),
        );
        Self { text, line_starts }
    }

    pub fn position(&self, offset: usize) -> LinePosition {
        let offset = offset.min(self.text.len());
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let start = self.line_starts[line];
        let column = self
            .text
            .get(start..offset)
            .map_or(offset - start, |prefix| prefix.chars().count());
        LinePosition { line, column }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_zero_based() {
        let index = LineIndex::new("class C\n{\n    int x;\n}");
        assert_eq!(index.position(0), LinePosition { line: 0, column: 0 });
        assert_eq!(index.position(8), LinePosition { line: 1, column: 0 });
        assert_eq!(index.position(14), LinePosition { line: 2, column: 4 });
        assert_eq!(index.line_count(), 4);
    }

    #[test]
    fn columns_count_characters() {
        let index = LineIndex::new("é = x;");
        assert_eq!(index.position(5), LinePosition { line: 0, column: 4 });
    }

    #[test]
    fn offsets_past_the_end_clamp() {
        let index = LineIndex::new("ab");
        assert_eq!(index.position(10), LinePosition { line: 0, column: 2 });
    }
}
