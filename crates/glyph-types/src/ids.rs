//! Arena handles for type definitions
//!
//! Every type definition is owned by the [`Program`](crate::Program) arena;
//! all relations between definitions are expressed through these handles.

use std::fmt;

/// Dense, program-wide class index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

/// Global protocol index, assigned in creation order across all packages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProtocolId(pub u32);

/// Enum handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumId(pub u32);

/// Package handle, in package load order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(pub u32);

macro_rules! impl_index {
    ($($id:ident => $label:literal),* $(,)?) => {
        $(
            impl $id {
                /// Position in the owning arena
                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }

            impl fmt::Display for $id {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, concat!($label, "({})"), self.0)
                }
            }
        )*
    };
}

impl_index! {
    ClassId => "ClassId",
    ProtocolId => "ProtocolId",
    EnumId => "EnumId",
    PackageId => "PackageId",
}

/// Any named type definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeDefId {
    /// A class
    Class(ClassId),
    /// A protocol
    Protocol(ProtocolId),
    /// An enum
    Enum(EnumId),
}

/// A type definition that can declare generic variables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericOwner {
    /// Generic class
    Class(ClassId),
    /// Generic protocol
    Protocol(ProtocolId),
}

impl From<GenericOwner> for TypeDefId {
    fn from(owner: GenericOwner) -> Self {
        match owner {
            GenericOwner::Class(id) => TypeDefId::Class(id),
            GenericOwner::Protocol(id) => TypeDefId::Protocol(id),
        }
    }
}
