//! Literal pool
//!
//! String literals referenced by method bodies. Entry 0 is always the
//! empty string and every other entry is unique.

use rustc_hash::FxHashMap;

use crate::encoder::{fit_u16, MetadataReader, MetadataWriter};
use crate::error::{DecodeError, SerializeError};

/// Deduplicated string literals
#[derive(Debug, Clone)]
pub struct LiteralPool {
    entries: Vec<String>,
    index: FxHashMap<String, u16>,
}

impl Default for LiteralPool {
    fn default() -> Self {
        Self::new()
    }
}

impl LiteralPool {
    /// Pool holding only the empty string
    pub fn new() -> Self {
        let mut index = FxHashMap::default();
        index.insert(String::new(), 0);
        Self {
            entries: vec![String::new()],
            index,
        }
    }

    /// Index of `literal`, adding it on first use
    pub fn intern(&mut self, literal: &str) -> Result<u16, SerializeError> {
        if let Some(&index) = self.index.get(literal) {
            return Ok(index);
        }
        let index = fit_u16("string literals", self.entries.len())?;
        self.entries.push(literal.to_string());
        self.index.insert(literal.to_string(), index);
        Ok(index)
    }

    /// Literal at `index`
    pub fn get(&self, index: u16) -> Option<&str> {
        self.entries.get(index as usize).map(String::as_str)
    }

    /// Number of entries, the empty string included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: the empty string is always present
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in index order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Write the entry count and every entry
    pub fn encode(&self, writer: &mut MetadataWriter) -> Result<(), SerializeError> {
        writer.emit_count_u16("string literals", self.entries.len())?;
        for entry in &self.entries {
            writer.emit_string(entry)?;
        }
        Ok(())
    }

    /// Read a pool written by [`LiteralPool::encode`]. Entries are kept as
    /// written.
    pub fn decode(reader: &mut MetadataReader<'_>) -> Result<Vec<String>, DecodeError> {
        let count = reader.read_u16()? as usize;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            entries.push(reader.read_string()?);
        }
        Ok(entries)
    }
}
