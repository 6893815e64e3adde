//! Source Location Utilities
//!
//! Line/column tracking for tokens and parse errors. Offsets are byte offsets
//! into the source text; lines and columns are 1-based, columns count
//! characters rather than bytes.

use std::fmt;

/// A position in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    /// Byte offset from start of input
    pub offset: usize,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, UTF-8 aware)
    pub column: usize,
}

impl SourcePosition {
    /// Create a new source position
    #[inline]
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// Create a position at the start of input
    #[inline]
    pub fn start() -> Self {
        Self::new(0, 1, 1)
    }

    /// Calculate position from a byte offset in the input
    ///
    /// Offsets past the end are clamped; offsets inside a multi-byte
    /// character are moved back to the character's first byte.
    pub fn from_offset(input: &str, offset: usize) -> Self {
        let mut offset = offset.min(input.len());
        while !input.is_char_boundary(offset) {
            offset -= 1;
        }

        let before = &input.as_bytes()[..offset];
        let line = memchr::memchr_iter(b'\n', before).count() + 1;
        let line_start = memchr::memrchr(b'\n', before).map_or(0, |n| n + 1);
        let column = input[line_start..offset].chars().count() + 1;

        Self {
            offset,
            line,
            column,
        }
    }

    /// The full text of the line containing this position, without the newline
    pub fn line_text<'a>(&self, input: &'a str) -> &'a str {
        let offset = self.offset.min(input.len());
        let bytes = input.as_bytes();
        let start = memchr::memrchr(b'\n', &bytes[..offset]).map_or(0, |n| n + 1);
        let end = memchr::memchr(b'\n', &bytes[offset..]).map_or(input.len(), |n| offset + n);
        input[start..end].trim_end_matches('\r')
    }

    /// Render the line containing this position with a caret under the column
    pub fn format_with_underline(&self, input: &str) -> String {
        let mut result = String::new();
        result.push_str(self.line_text(input));
        result.push('\n');
        for _ in 1..self.column {
            result.push(' ');
        }
        result.push('^');
        result
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

impl Default for SourcePosition {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_position_start() {
        let pos = SourcePosition::start();
        assert_eq!(pos.offset, 0);
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 1);
    }

    #[test]
    fn test_from_offset_same_line() {
        let pos = SourcePosition::from_offset("1 + 2", 4);
        assert_eq!(pos, SourcePosition::new(4, 1, 5));
    }

    #[test]
    fn test_from_offset_after_newline() {
        let input = "first\nsecond";
        let pos = SourcePosition::from_offset(input, 8);
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 3);
    }

    #[test]
    fn test_from_offset_multibyte() {
        // 'é' is two bytes but one column
        let input = "é+1";
        let pos = SourcePosition::from_offset(input, 2);
        assert_eq!(pos.column, 2);

        let inside = SourcePosition::from_offset(input, 1);
        assert_eq!(inside.offset, 0);
    }

    #[test]
    fn test_from_offset_beyond_end() {
        let pos = SourcePosition::from_offset("abc", 100);
        assert_eq!(pos.offset, 3);
        assert_eq!(pos.column, 4);
    }

    #[test]
    fn test_format_with_underline() {
        let input = "let x\n1 + * 2\nend";
        let pos = SourcePosition::from_offset(input, 10);
        let formatted = pos.format_with_underline(input);
        assert_eq!(formatted, "1 + * 2\n    ^");
    }
}
