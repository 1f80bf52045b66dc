//! Byte offset to line number lookups.

/// Newline offsets of a source text, for fast offset → line conversion.
///
/// Scans the content once; lookups are a binary search over the newline
/// positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offsets of each `\n` in the content.
    line_breaks: Vec<usize>,

    total_length: usize,
}

impl LineIndex {
    pub fn new(content: &str) -> Self {
        let line_breaks = content
            .char_indices()
            .filter_map(|(idx, ch)| if ch == '\n' { Some(idx) } else { None })
            .collect();

        Self {
            line_breaks,
            total_length: content.len(),
        }
    }

    /// 1-based line containing `offset`. Offsets past the end clamp to the
    /// last line.
    pub fn line_of(&self, offset: usize) -> usize {
        let offset = offset.min(self.total_length);
        // A newline belongs to the line it terminates.
        let row = match self.line_breaks.binary_search(&offset) {
            Ok(idx) | Err(idx) => idx,
        };
        row + 1
    }

    pub fn line_count(&self) -> usize {
        self.line_breaks.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line() {
        let index = LineIndex::new("<Wix/>");
        assert_eq!(index.line_of(0), 1);
        assert_eq!(index.line_of(5), 1);
        assert_eq!(index.line_count(), 1);
    }

    #[test]
    fn test_multiple_lines() {
        let index = LineIndex::new("a\nbc\n\nd");
        assert_eq!(index.line_of(0), 1);
        assert_eq!(index.line_of(1), 1); // the newline itself
        assert_eq!(index.line_of(2), 2);
        assert_eq!(index.line_of(5), 3);
        assert_eq!(index.line_of(6), 4);
        assert_eq!(index.line_count(), 4);
    }

    #[test]
    fn test_out_of_bounds_clamps() {
        let index = LineIndex::new("a\nb");
        assert_eq!(index.line_of(100), 2);
    }
}
