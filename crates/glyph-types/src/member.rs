//! Methods, type-level methods and initializers, and the tables holding them

use crate::error::TypeError;
use crate::generics::GenericParameter;
use crate::ids::TypeDefId;
use crate::span::Span;
use crate::ty::Type;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// 🔓 (default)
    #[default]
    Public,
    /// 🔐
    Protected,
    /// 🔒
    Private,
}

impl AccessLevel {
    /// Wire encoding
    pub fn to_u8(self) -> u8 {
        match self {
            AccessLevel::Public => 0,
            AccessLevel::Protected => 1,
            AccessLevel::Private => 2,
        }
    }

    /// Decode the wire encoding
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(AccessLevel::Public),
            1 => Some(AccessLevel::Protected),
            2 => Some(AccessLevel::Private),
            _ => None,
        }
    }
}

/// Which table a member lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Instance method
    Method,
    /// Type-level (class) method
    TypeMethod,
    /// Initializer
    Initializer,
}

impl MemberKind {
    /// Human-readable name used in diagnostics
    pub fn describe(self) -> &'static str {
        match self {
            MemberKind::Method => "method",
            MemberKind::TypeMethod => "type method",
            MemberKind::Initializer => "initializer",
        }
    }
}

/// Named, typed argument
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    /// Argument name
    pub name: String,
    /// Argument type
    pub ty: Type,
}

/// Checked body handed over by the type checker. Only its size and
/// literal usage matter to the linker.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Body {
    /// Implemented in the package's native binary
    Native,
    /// Compiled bytecode
    Code {
        /// Number of local variable slots
        locals: u16,
        /// Opaque instruction stream
        code: Vec<u8>,
        /// String literals the code refers to, in reference order
        literals: Vec<String>,
    },
    /// Protocol requirement without implementation
    #[default]
    Abstract,
}

impl Body {
    /// Whether the body is native
    pub fn is_native(&self) -> bool {
        matches!(self, Body::Native)
    }
}

/// A method, type-level method or initializer
#[derive(Debug, Clone)]
pub struct Member {
    /// Member name
    pub name: String,
    /// Table this member lives in
    pub kind: MemberKind,
    /// Declaring type
    pub declared_in: TypeDefId,
    /// Visibility
    pub access: AccessLevel,
    /// Cannot be overridden
    pub is_final: bool,
    /// Declared as overriding a superclass member
    pub is_override: bool,
    /// Marked deprecated
    pub deprecated: bool,
    /// Documentation comment
    pub documentation: Option<String>,
    /// Method-level generic variables
    pub generics: Vec<GenericParameter>,
    /// Arguments in order
    pub arguments: Vec<Argument>,
    /// Return type (✨ for initializers)
    pub return_type: Type,
    /// Initializers only: every subclass must implement it
    pub required: bool,
    /// Initializers only: may produce ✨ instead of an instance
    pub can_return_nothing: bool,
    /// Body
    pub body: Body,
    /// Declaration site
    pub span: Option<Span>,
    /// Dispatch-table slot, assigned by the linker
    pub vti: Option<u16>,
}

impl Member {
    /// Public, non-final member without arguments returning ✨
    pub fn new(kind: MemberKind, name: impl Into<String>, declared_in: TypeDefId) -> Self {
        Self {
            name: name.into(),
            kind,
            declared_in,
            access: AccessLevel::Public,
            is_final: false,
            is_override: false,
            deprecated: false,
            documentation: None,
            generics: Vec::new(),
            arguments: Vec::new(),
            return_type: Type::nothingness(),
            required: false,
            can_return_nothing: false,
            body: Body::Abstract,
            span: None,
            vti: None,
        }
    }

    /// Argument types in order
    pub fn argument_types(&self) -> impl Iterator<Item = &Type> {
        self.arguments.iter().map(|a| &a.ty)
    }

    /// Whether 🐕 occurs in the signature
    pub fn uses_self(&self) -> bool {
        self.return_type.mentions_self() || self.arguments.iter().any(|a| a.ty.mentions_self())
    }
}

/// Member table of one kind
///
/// Starts as an insertion-ordered builder; [`seal`](Self::seal) turns it
/// into the slot-indexed table the serializer reads.
#[derive(Debug, Clone, Default)]
pub struct MemberTable {
    members: Vec<Member>,
    by_name: FxHashMap<String, usize>,
    slots: Option<Vec<Option<usize>>>,
}

impl MemberTable {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a member; names must be unique within the table
    pub fn add(&mut self, member: Member) -> Result<&mut Member, TypeError> {
        if self.slots.is_some() {
            return Err(TypeError::SealedTable { name: member.name });
        }
        if self.by_name.contains_key(&member.name) {
            return Err(TypeError::DuplicateDeclaration {
                what: match member.kind {
                    MemberKind::Method => "Method",
                    MemberKind::TypeMethod => "Type method",
                    MemberKind::Initializer => "Initializer",
                },
                name: member.name,
            });
        }
        let position = self.members.len();
        self.by_name.insert(member.name.clone(), position);
        self.members.push(member);
        Ok(&mut self.members[position])
    }

    /// Member by name (this table only)
    pub fn get(&self, name: &str) -> Option<&Member> {
        self.by_name.get(name).map(|&i| &self.members[i])
    }

    /// Member by name, mutably
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Member> {
        self.by_name.get(name).map(|&i| &mut self.members[i])
    }

    /// Members in declaration order
    pub fn iter(&self) -> std::slice::Iter<'_, Member> {
        self.members.iter()
    }

    /// Members in declaration order, mutably
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Member> {
        self.members.iter_mut()
    }

    /// Number of members declared in this table
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether [`seal`](Self::seal) ran
    pub fn is_sealed(&self) -> bool {
        self.slots.is_some()
    }

    /// Freeze the table and index members by VTI. `table_size` is the
    /// class's total slot count including inherited slots.
    pub fn seal(&mut self, table_size: u16) -> Result<(), TypeError> {
        let mut slots = vec![None; table_size as usize];
        for (position, member) in self.members.iter().enumerate() {
            let vti = member.vti.ok_or_else(|| TypeError::UnassignedVti {
                name: member.name.clone(),
            })?;
            if let Some(slot) = slots.get_mut(vti as usize) {
                *slot = Some(position);
            }
        }
        self.slots = Some(slots);
        Ok(())
    }

    /// Own member dispatching through the given slot (sealed tables only)
    pub fn by_slot(&self, vti: u16) -> Option<&Member> {
        self.slots
            .as_ref()
            .and_then(|slots| slots.get(vti as usize).copied().flatten())
            .map(|i| &self.members[i])
    }
}
