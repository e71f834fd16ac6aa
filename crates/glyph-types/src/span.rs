//! Source locations

use serde::{Deserialize, Serialize};

/// Byte range inside one registered source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Index into the program's source file list
    #[serde(default)]
    pub file: usize,
    /// Start byte offset
    pub start: u32,
    /// End byte offset (exclusive)
    pub end: u32,
}

impl Span {
    /// Create a new span
    pub fn new(file: usize, start: u32, end: u32) -> Self {
        Self { file, start, end }
    }

    /// Byte range as `usize`, as codespan expects it
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}
