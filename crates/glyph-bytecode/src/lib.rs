//! Glyph metadata format
//!
//! Serializes a linked program into the binary metadata stream the Glyph
//! runtime loads, and decodes such streams for inspection.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod decode;
pub mod encoder;
pub mod error;
pub mod metadata;
pub mod strings;

pub use decode::{BodyImage, ClassImage, ConformanceImage, MemberImage, MetadataImage, PackageImage, TypeImage};
pub use encoder::{MetadataReader, MetadataWriter};
pub use error::{DecodeError, SerializeError};
pub use metadata::{serialize, SerializeOptions, DEFAULT_VERSION};
pub use strings::LiteralPool;
