//! Core type representation

use crate::ids::{ClassId, EnumId, GenericOwner, ProtocolId};

/// Names of the builtin types as they appear in source
pub mod names {
    /// Integer
    pub const INTEGER: &str = "🚂";
    /// Double precision float
    pub const DOUBLE: &str = "🚀";
    /// Boolean
    pub const BOOLEAN: &str = "👌";
    /// Symbol (single character)
    pub const SYMBOL: &str = "🔣";
    /// The type of the absent value
    pub const NOTHINGNESS: &str = "✨";
    /// Any value at all
    pub const SOMETHING: &str = "⚪";
    /// Any object
    pub const SOME_OBJECT: &str = "🔵";
    /// The conforming or enclosing type itself
    pub const SELF: &str = "🐕";
    /// Prefix marking an optional type
    pub const OPTIONAL: &str = "🍬";
}

/// Kind of a type, without optionality
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// 🚂
    Integer,
    /// 🚀
    Double,
    /// 👌
    Boolean,
    /// 🔣
    Symbol,
    /// ✨
    Nothingness,
    /// ⚪
    Something,
    /// 🔵
    SomeObject,
    /// 🐕 inside a class or protocol body
    SelfType,
    /// Class instance. `args` is flattened to the class's total generic
    /// argument count: superclass positions first, own positions last.
    Class {
        /// Class handle
        id: ClassId,
        /// Generic arguments including those of superclasses
        args: Vec<Type>,
    },
    /// Protocol value
    Protocol {
        /// Protocol handle
        id: ProtocolId,
        /// Generic arguments
        args: Vec<Type>,
        /// Produced by resolving 🐕 against the protocol itself; compared
        /// structurally instead of nominally
        self_referential: bool,
    },
    /// Enum value
    Enum(EnumId),
    /// Generic variable of a type definition, by flattened position
    Reference {
        /// Definition that declared the variable
        owner: GenericOwner,
        /// Flattened position
        index: u16,
    },
    /// Generic variable of the method being compiled
    LocalReference(u16),
    /// Closure
    Callable {
        /// Parameter types
        params: Vec<Type>,
        /// Return type
        returns: Box<Type>,
    },
}

/// A type as used in signatures
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    /// What the type is
    pub kind: TypeKind,
    /// Whether ✨ is also a valid value
    pub optional: bool,
}

impl Type {
    /// Non-optional type of the given kind
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            optional: false,
        }
    }

    /// 🚂
    pub fn integer() -> Self {
        Self::new(TypeKind::Integer)
    }

    /// 🚀
    pub fn double() -> Self {
        Self::new(TypeKind::Double)
    }

    /// 👌
    pub fn boolean() -> Self {
        Self::new(TypeKind::Boolean)
    }

    /// 🔣
    pub fn symbol() -> Self {
        Self::new(TypeKind::Symbol)
    }

    /// ✨
    pub fn nothingness() -> Self {
        Self::new(TypeKind::Nothingness)
    }

    /// ⚪
    pub fn something() -> Self {
        Self::new(TypeKind::Something)
    }

    /// 🔵
    pub fn some_object() -> Self {
        Self::new(TypeKind::SomeObject)
    }

    /// 🐕
    pub fn self_type() -> Self {
        Self::new(TypeKind::SelfType)
    }

    /// Class type with already flattened arguments
    pub fn class(id: ClassId, args: Vec<Type>) -> Self {
        Self::new(TypeKind::Class { id, args })
    }

    /// Protocol type
    pub fn protocol(id: ProtocolId, args: Vec<Type>) -> Self {
        Self::new(TypeKind::Protocol {
            id,
            args,
            self_referential: false,
        })
    }

    /// Enum type
    pub fn enumeration(id: EnumId) -> Self {
        Self::new(TypeKind::Enum(id))
    }

    /// Reference to a definition's generic variable
    pub fn reference(owner: GenericOwner, index: u16) -> Self {
        Self::new(TypeKind::Reference { owner, index })
    }

    /// Reference to a method's generic variable
    pub fn local_reference(index: u16) -> Self {
        Self::new(TypeKind::LocalReference(index))
    }

    /// Closure type
    pub fn callable(params: Vec<Type>, returns: Type) -> Self {
        Self::new(TypeKind::Callable {
            params,
            returns: Box::new(returns),
        })
    }

    /// Builtin type by source name
    pub fn builtin(name: &str) -> Option<Self> {
        let kind = match name {
            names::INTEGER => TypeKind::Integer,
            names::DOUBLE => TypeKind::Double,
            names::BOOLEAN => TypeKind::Boolean,
            names::SYMBOL => TypeKind::Symbol,
            names::NOTHINGNESS => TypeKind::Nothingness,
            names::SOMETHING => TypeKind::Something,
            names::SOME_OBJECT => TypeKind::SomeObject,
            names::SELF => TypeKind::SelfType,
            _ => return None,
        };
        Some(Self::new(kind))
    }

    /// Same type, made optional
    pub fn into_optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Same type, with the given optionality
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Generic arguments of a class or protocol type
    pub fn generic_arguments(&self) -> &[Type] {
        match &self.kind {
            TypeKind::Class { args, .. } | TypeKind::Protocol { args, .. } => args,
            _ => &[],
        }
    }

    /// Class handle if this is a class type
    pub fn as_class(&self) -> Option<ClassId> {
        match self.kind {
            TypeKind::Class { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Protocol handle if this is a protocol type
    pub fn as_protocol(&self) -> Option<ProtocolId> {
        match self.kind {
            TypeKind::Protocol { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Whether 🐕 occurs anywhere inside this type
    pub fn mentions_self(&self) -> bool {
        match &self.kind {
            TypeKind::SelfType => true,
            TypeKind::Class { args, .. } | TypeKind::Protocol { args, .. } => {
                args.iter().any(Type::mentions_self)
            }
            TypeKind::Callable { params, returns } => {
                params.iter().any(Type::mentions_self) || returns.mentions_self()
            }
            _ => false,
        }
    }

    /// Whether a generic variable occurs anywhere inside this type
    pub fn is_generic(&self) -> bool {
        match &self.kind {
            TypeKind::Reference { .. } | TypeKind::LocalReference(_) => true,
            TypeKind::Class { args, .. } | TypeKind::Protocol { args, .. } => {
                args.iter().any(Type::is_generic)
            }
            TypeKind::Callable { params, returns } => {
                params.iter().any(Type::is_generic) || returns.is_generic()
            }
            _ => false,
        }
    }

    /// Structural identity used for invariant positions (generic
    /// arguments). Ignores the self-referential tag.
    pub fn identical_to(&self, other: &Type) -> bool {
        if self.optional != other.optional {
            return false;
        }
        match (&self.kind, &other.kind) {
            (TypeKind::Class { id: a, args: aa }, TypeKind::Class { id: b, args: ba }) => {
                a == b && args_identical(aa, ba)
            }
            (
                TypeKind::Protocol { id: a, args: aa, .. },
                TypeKind::Protocol { id: b, args: ba, .. },
            ) => a == b && args_identical(aa, ba),
            (
                TypeKind::Callable { params: pa, returns: ra },
                TypeKind::Callable { params: pb, returns: rb },
            ) => args_identical(pa, pb) && ra.identical_to(rb),
            (a, b) => a == b,
        }
    }
}

/// Identity of two argument lists; an empty list stands for "unspecialized"
/// and matches anything.
pub(crate) fn args_identical(a: &[Type], b: &[Type]) -> bool {
    if a.is_empty() || b.is_empty() {
        return true;
    }
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.identical_to(y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(Type::builtin("🚂"), Some(Type::integer()));
        assert_eq!(Type::builtin("🐕"), Some(Type::self_type()));
        assert_eq!(Type::builtin("🐟"), None);
    }

    #[test]
    fn test_mentions_self() {
        let ty = Type::callable(vec![Type::integer()], Type::self_type().into_optional());
        assert!(ty.mentions_self());
        assert!(!Type::class(ClassId(0), vec![Type::boolean()]).mentions_self());
    }

    #[test]
    fn test_identical_ignores_self_tag() {
        let plain = Type::protocol(ProtocolId(2), vec![]);
        let mut tagged = plain.clone();
        if let TypeKind::Protocol { self_referential, .. } = &mut tagged.kind {
            *self_referential = true;
        }
        assert!(plain.identical_to(&tagged));
        assert!(!plain.identical_to(&tagged.clone().into_optional()));
    }

    #[test]
    fn test_is_generic() {
        let owner = GenericOwner::Class(ClassId(1));
        assert!(Type::class(ClassId(1), vec![Type::reference(owner, 0)]).is_generic());
        assert!(Type::local_reference(0).is_generic());
        assert!(!Type::something().is_generic());
    }
}
