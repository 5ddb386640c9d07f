//! Grapheme-aware offset helpers for the single-string prompt buffer.
//!
//! All offsets are byte offsets into the buffer and always sit on char
//! boundaries.

use unicode_segmentation::UnicodeSegmentation;

/// A selection in the buffer. `start == end` is a collapsed cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    #[must_use]
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    #[must_use]
    pub fn collapsed(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    /// Whether two ranges overlap or share an edge.
    #[must_use]
    pub fn touches(&self, other: &TextRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

#[must_use]
pub fn clamp_to_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while offset > 0 && !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

#[must_use]
pub fn prev_grapheme_boundary(text: &str, offset: usize) -> usize {
    let offset = clamp_to_boundary(text, offset);
    text[..offset]
        .grapheme_indices(true)
        .next_back()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

#[must_use]
pub fn next_grapheme_boundary(text: &str, offset: usize) -> usize {
    let offset = clamp_to_boundary(text, offset);
    text[offset..]
        .graphemes(true)
        .next()
        .map(|grapheme| offset + grapheme.len())
        .unwrap_or(text.len())
}

#[must_use]
pub fn line_start(text: &str, offset: usize) -> usize {
    let offset = clamp_to_boundary(text, offset);
    text[..offset].rfind('\n').map(|idx| idx + 1).unwrap_or(0)
}

#[must_use]
pub fn line_end(text: &str, offset: usize) -> usize {
    let offset = clamp_to_boundary(text, offset);
    text[offset..]
        .find('\n')
        .map(|idx| offset + idx)
        .unwrap_or(text.len())
}

/// Moves one logical line up (`-1`) or down (`1`), keeping the grapheme
/// column where the target line is long enough. Returns `None` when there is
/// no line in that direction.
#[must_use]
pub fn vertical_move(text: &str, offset: usize, direction: isize) -> Option<usize> {
    let start = line_start(text, offset);
    let column = text[start..clamp_to_boundary(text, offset)]
        .graphemes(true)
        .count();

    let target_start = if direction < 0 {
        if start == 0 {
            return None;
        }
        line_start(text, start - 1)
    } else {
        let end = line_end(text, offset);
        if end >= text.len() {
            return None;
        }
        end + 1
    };
    let target_end = line_end(text, target_start);
    let target_col = text[target_start..target_end]
        .grapheme_indices(true)
        .nth(column)
        .map(|(idx, _)| target_start + idx)
        .unwrap_or(target_end);
    Some(target_col)
}

/// Replaces `range` with `replacement`, returning the offset just past the
/// inserted text.
pub fn splice(text: &mut String, range: TextRange, replacement: &str) -> usize {
    let start = clamp_to_boundary(text, range.start);
    let end = clamp_to_boundary(text, range.end).max(start);
    text.replace_range(start..end, replacement);
    start + replacement.len()
}

#[must_use]
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
