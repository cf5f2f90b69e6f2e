use std::ops::Range;

/// Location of a generated block in the original file text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
    /// Byte range from the start of the header line to the end of the
    /// closing line (newline excluded)
    pub byte_range: Range<usize>,
    /// Line range in the original file (0-indexed, exclusive end)
    pub line_range: Range<usize>,
}

impl BlockSpan {
    pub fn new(byte_range: Range<usize>, line_range: Range<usize>) -> Self {
        BlockSpan {
            byte_range,
            line_range,
        }
    }

    /// The verbatim block text within `source`.
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.byte_range.clone()]
    }
}
