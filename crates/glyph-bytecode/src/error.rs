//! Serialization and decoding errors

use thiserror::Error;

/// Errors that stop a program from being serialized
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SerializeError {
    /// A count does not fit its fixed-width field
    #[error("Too many {what}: {actual} exceeds the limit of {limit}")]
    LimitExceeded {
        /// What was counted
        what: &'static str,
        /// Largest encodable count
        limit: usize,
        /// Count found
        actual: usize,
    },

    /// No class declares the 🏁 type method
    #[error("No entry point: no class declares the 🏁 type method")]
    MissingEntryPoint,

    /// A class reached the serializer before its tables were numbered
    #[error("Class {class} has not been linked")]
    UnlinkedClass {
        /// Class name
        class: String,
    },

    /// A member reached the serializer without a slot
    #[error("Member {member} of {class} has no VTI")]
    UnassignedVti {
        /// Class name
        class: String,
        /// Member name
        member: String,
    },

    /// A class referenced by the program but absent from its packages
    #[error("Class {class} is not part of the serialized program")]
    MissingClass {
        /// Class name
        class: String,
    },
}

/// Errors that can occur while reading a metadata image
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Unexpected end of the stream
    #[error("Unexpected end of metadata at offset {0}")]
    UnexpectedEnd(usize),

    /// Invalid UTF-8 package name
    #[error("Invalid UTF-8 string at offset {0}")]
    InvalidUtf8(usize),

    /// A string element is not a Unicode scalar value
    #[error("Invalid code point {value:#x} at offset {offset}")]
    InvalidCodePoint {
        /// Raw value
        value: u32,
        /// Offset of the value
        offset: usize,
    },

    /// Package name without its length or terminator
    #[error("Malformed package name at offset {0}")]
    MalformedName(usize),

    /// Byte other than a continuation marker or terminator in a class list
    #[error("Invalid class-list marker {byte:#04x} at offset {offset}")]
    InvalidMarker {
        /// Byte found
        byte: u8,
        /// Offset of the byte
        offset: usize,
    },

    /// Unknown type tag
    #[error("Invalid type tag {tag} at offset {offset}")]
    InvalidTypeTag {
        /// Tag found
        tag: u8,
        /// Offset of the tag
        offset: usize,
    },

    /// Unknown access level
    #[error("Invalid access level {value} at offset {offset}")]
    InvalidAccess {
        /// Value found
        value: u8,
        /// Offset of the value
        offset: usize,
    },

    /// The header's class count disagrees with the classes present
    #[error("Header declares {declared} classes but {found} were found")]
    ClassCountMismatch {
        /// Count in the header
        declared: u16,
        /// Classes decoded
        found: usize,
    },

    /// Bytes left after the entry point
    #[error("{0} trailing bytes after the entry point")]
    TrailingBytes(usize),
}
