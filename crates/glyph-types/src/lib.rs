//! Glyph Type-Definition Model
//!
//! Classes, protocols and enums together with their generic parameters and
//! member tables, plus the generics resolver and the type compatibility
//! relation the linker uses to compare signatures.
//!
//! Everything lives in a [`Program`], the compilation-unit context that owns
//! every type definition in arenas. Relations between definitions
//! (superclass, conformance, generic owner) are handles into those arenas.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod compat;
pub mod definition;
pub mod error;
pub mod generics;
pub mod ids;
pub mod member;
pub mod program;
pub mod resolve;
pub mod span;
pub mod ty;

pub use definition::{
    Class, ClassLinkState, Conformance, Enum, InstanceVariable, Protocol, TypeDefinition,
    TypeDefinitionWithGenerics,
};
pub use error::TypeError;
pub use generics::{GenericParameter, GenericParameters};
pub use ids::{ClassId, EnumId, GenericOwner, PackageId, ProtocolId, TypeDefId};
pub use member::{AccessLevel, Argument, Body, Member, MemberKind, MemberTable};
pub use program::{EntryPoint, Package, PackageVersion, Program};
pub use resolve::TypeContext;
pub use span::Span;
pub use ty::{Type, TypeKind};
