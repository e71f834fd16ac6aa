//! Glyph semantic linker
//!
//! Takes the parsed declarations of every package, builds the type model,
//! assigns dispatch-table slots (VTIs) to methods, type-level methods and
//! initializers, and checks protocol conformances.
//!
//! ```text
//! ProgramDecl ─► declare ─► assign VTIs ─► check conformances ─► LinkedProgram
//! ```

#![warn(rust_2018_idioms)]

pub mod conformance;
pub mod decl;
pub mod declare;
pub mod diagnostic;
pub mod error;
pub mod pipeline;
pub mod vti;

pub use decl::ProgramDecl;
pub use diagnostic::{Diagnostic, Diagnostics, ErrorCode};
pub use error::{ConformanceProblem, LinkError, LinkWarning, OverrideProblem, Promise};
pub use pipeline::{LinkOptions, LinkedProgram, Linker};
