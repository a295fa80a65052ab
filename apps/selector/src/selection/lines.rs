//! Printed-line estimation for bullets.
//!
//! Bullets arrive with a character length only, so this is a fixed-width approximation:
//! every bullet starts on a fresh line and wraps every `chars_per_line` characters.
//! The downstream layout simulator re-checks exact fill once text is rewritten.

use serde::{Deserialize, Serialize};

/// Default characters per printed line (11pt on US letter, 1" margins).
pub const DEFAULT_CHARS_PER_LINE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineEstimator {
    chars_per_line: u32,
}

impl Default for LineEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_CHARS_PER_LINE)
    }
}

impl LineEstimator {
    /// A zero width is treated as one character per line.
    pub fn new(chars_per_line: u32) -> Self {
        Self {
            chars_per_line: chars_per_line.max(1),
        }
    }

    /// Estimated printed lines for one bullet. An empty bullet still takes a line.
    pub fn bullet_lines(&self, char_length: u32) -> u32 {
        char_length.div_ceil(self.chars_per_line).max(1)
    }
}
