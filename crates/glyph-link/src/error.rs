//! Link errors and warnings

use glyph_types::{MemberKind, Span, TypeError};
use std::fmt;
use thiserror::Error;

/// Which part of an overriding signature broke the overridden member's promise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promise {
    /// Return type is not compatible
    ReturnType,
    /// Number of arguments differs
    ArgumentCount,
    /// Argument at the given position is not compatible
    Argument(usize),
}

impl fmt::Display for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Promise::ReturnType => f.write_str("return type"),
            Promise::ArgumentCount => f.write_str("argument count"),
            Promise::Argument(index) => write!(f, "argument {}", index + 1),
        }
    }
}

/// Misuse of the override attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideProblem {
    /// Member matches a superclass member but lacks ✒️
    MissingAttribute,
    /// Member has ✒️ but the superclass declares nothing to override
    NothingToOverride,
    /// The superclass member is final
    FinalMember,
}

impl fmt::Display for OverrideProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OverrideProblem::MissingAttribute => "overrides a superclass member but is not declared ✒️",
            OverrideProblem::NothingToOverride => "is declared ✒️ but there is nothing to override",
            OverrideProblem::FinalMember => "overrides a final member",
        })
    }
}

/// Way in which a class fails to conform to a protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConformanceProblem {
    /// Class does not implement the method
    MissingMethod,
    /// Argument counts differ
    ArgumentCount {
        /// Protocol's count
        expected: usize,
        /// Class's count
        found: usize,
    },
    /// Return types are incompatible
    ReturnType {
        /// Protocol's return type
        expected: String,
        /// Class's return type
        found: String,
    },
    /// Argument types are incompatible
    Argument {
        /// Zero-based position
        index: usize,
        /// Protocol's argument type
        expected: String,
        /// Class's argument type
        found: String,
    },
}

impl fmt::Display for ConformanceProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConformanceProblem::MissingMethod => f.write_str("method is not implemented"),
            ConformanceProblem::ArgumentCount { expected, found } => {
                write!(f, "expected {expected} argument(s), found {found}")
            }
            ConformanceProblem::ReturnType { expected, found } => {
                write!(f, "return type {found} is not compatible with {expected}")
            }
            ConformanceProblem::Argument {
                index,
                expected,
                found,
            } => write!(
                f,
                "argument {} of type {found} is not compatible with {expected}",
                index + 1
            ),
        }
    }
}

/// Fatal link error
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LinkError {
    /// Name declared twice in the same scope
    #[error("{what} {name} is already declared")]
    DuplicateDeclaration {
        /// "Type", "Method", "Enum value", ...
        what: &'static str,
        /// Name
        name: String,
        /// Second declaration
        span: Option<Span>,
    },

    /// Type name not visible
    #[error("Could not find type {name}")]
    UnknownType {
        /// Name as written
        name: String,
        /// Use site
        span: Option<Span>,
    },

    /// Generic variable name not in scope
    #[error("No generic variable {name} in scope")]
    UnresolvedGenericVariable {
        /// Variable name
        name: String,
        /// Use site
        span: Option<Span>,
    },

    /// Superclass name not found
    #[error("Superclass {superclass} of {class} could not be found")]
    MissingSupertype {
        /// Subclass name
        class: String,
        /// Superclass name as written
        superclass: String,
        /// Class declaration
        span: Option<Span>,
    },

    /// Superclass is not a class, is optional, or would create a cycle
    #[error("{found} cannot be the superclass of {class}: {reason}")]
    InvalidSupertype {
        /// Subclass name
        class: String,
        /// Superclass as written
        found: String,
        /// What is wrong with it
        reason: &'static str,
        /// Class declaration
        span: Option<Span>,
    },

    /// Overriding member breaks the overridden member's signature
    #[error("{kind} {member} of {class} does not keep the promise of {superclass}'s {member}: incompatible {promise}")]
    PromiseViolation {
        /// Overriding class
        class: String,
        /// Class declaring the overridden member
        superclass: String,
        /// Member name
        member: String,
        /// Member kind
        kind: &'static str,
        /// What failed
        promise: Promise,
        /// Overridden member's type (empty for argument counts)
        expected: String,
        /// Overriding member's type
        found: String,
        /// Overriding member
        span: Option<Span>,
    },

    /// Override attribute misused
    #[error("{kind} {member} of {class} {problem}")]
    InvalidOverride {
        /// Class name
        class: String,
        /// Member name
        member: String,
        /// Member kind
        kind: &'static str,
        /// What is wrong
        problem: OverrideProblem,
        /// Member declaration
        span: Option<Span>,
    },

    /// Inherited required initializer not implemented
    #[error("Required initializer {initializer} was not implemented by {class}")]
    MissingRequiredInitializer {
        /// Class name
        class: String,
        /// First missing initializer
        initializer: String,
        /// Class declaration
        span: Option<Span>,
    },

    /// Class does not fulfil a protocol it declares
    #[error("{class} does not conform to protocol {protocol}: {method}: {problem}")]
    ConformanceViolation {
        /// Class name
        class: String,
        /// Protocol name
        protocol: String,
        /// Protocol method name
        method: String,
        /// What is wrong
        problem: ConformanceProblem,
        /// Conformance declaration or implementing method
        span: Option<Span>,
    },

    /// Conformance to something that is not a non-optional protocol
    #[error("{class} cannot conform to {found}: only non-optional protocols can be conformed to")]
    InvalidConformance {
        /// Class name
        class: String,
        /// Type as written
        found: String,
        /// Conformance declaration
        span: Option<Span>,
    },

    /// Method name is reserved
    #[error("{name} is reserved and cannot be used as {place} name")]
    ReservedName {
        /// Name
        name: String,
        /// "method", "type method" or "initializer"
        place: &'static str,
        /// Declaration
        span: Option<Span>,
    },

    /// 🏁 has the wrong signature
    #[error("🏁 of {class} must return 🚂, found {found}")]
    InvalidEntryPoint {
        /// Declaring class
        class: String,
        /// Declared return type
        found: String,
        /// Declaration
        span: Option<Span>,
    },

    /// Second 🏁 in the program
    #[error("Duplicate 🏁 in {class}: {previous} already declares the entry point")]
    DuplicateEntryPoint {
        /// Second declaring class
        class: String,
        /// First declaring class
        previous: String,
        /// Second declaration
        span: Option<Span>,
    },

    /// Native body outside a package that provides a native binary
    #[error("{member} of {class} cannot be native: {reason}")]
    NativeNotAllowed {
        /// Class name
        class: String,
        /// Member name
        member: String,
        /// Why
        reason: &'static str,
        /// Declaration
        span: Option<Span>,
    },

    /// Package header is not acceptable
    #[error("Package {name}: {reason}")]
    InvalidPackage {
        /// Package name
        name: String,
        /// Why
        reason: &'static str,
    },

    /// A count does not fit its fixed-width encoding
    #[error("Too many {what}: {actual} exceeds the limit of {limit}")]
    SerializationLimitExceeded {
        /// What was counted
        what: &'static str,
        /// Maximum
        limit: usize,
        /// Actual count
        actual: usize,
        /// Offending declaration
        span: Option<Span>,
    },

    /// Type model refused an operation
    #[error("{error}")]
    Model {
        /// Underlying error
        error: TypeError,
        /// Declaration being processed
        span: Option<Span>,
    },
}

impl LinkError {
    /// Source location, when known
    pub fn span(&self) -> Option<Span> {
        use LinkError::*;
        match self {
            DuplicateDeclaration { span, .. }
            | UnknownType { span, .. }
            | UnresolvedGenericVariable { span, .. }
            | MissingSupertype { span, .. }
            | InvalidSupertype { span, .. }
            | PromiseViolation { span, .. }
            | InvalidOverride { span, .. }
            | MissingRequiredInitializer { span, .. }
            | ConformanceViolation { span, .. }
            | InvalidConformance { span, .. }
            | ReservedName { span, .. }
            | InvalidEntryPoint { span, .. }
            | DuplicateEntryPoint { span, .. }
            | NativeNotAllowed { span, .. }
            | SerializationLimitExceeded { span, .. }
            | Model { span, .. } => *span,
            InvalidPackage { .. } => None,
        }
    }

    /// Attach a location to a type model error
    pub fn from_type_error(error: TypeError, span: Option<Span>) -> Self {
        match error {
            TypeError::DuplicateDeclaration { what, name } => {
                LinkError::DuplicateDeclaration { what, name, span }
            }
            TypeError::DuplicateGenericName { name, .. } => LinkError::DuplicateDeclaration {
                what: "Generic variable",
                name,
                span,
            },
            TypeError::UnresolvedGenericVariable { name } => {
                LinkError::UnresolvedGenericVariable { name, span }
            }
            TypeError::UnknownType { name } => LinkError::UnknownType { name, span },
            TypeError::CyclicInheritance { class, superclass } => LinkError::InvalidSupertype {
                class,
                found: superclass,
                reason: "inheritance cycle",
                span,
            },
            error => LinkError::Model { error, span },
        }
    }
}

/// Human-readable member kind for messages
pub(crate) fn kind_label(kind: MemberKind) -> &'static str {
    match kind {
        MemberKind::Method => "Method",
        MemberKind::TypeMethod => "Type method",
        MemberKind::Initializer => "Initializer",
    }
}

/// Non-fatal finding
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LinkWarning {
    /// Instance variables can never be initialized
    #[error("{class} defines {count} instance variable(s) but no initializers")]
    InstanceVariablesWithoutInitializers {
        /// Class name
        class: String,
        /// Instance variable count
        count: usize,
        /// Class declaration
        span: Option<Span>,
    },

    /// Overriding or implementing a deprecated member
    #[error("{member} of {class} overrides a deprecated {kind}")]
    OverridesDeprecated {
        /// Class name
        class: String,
        /// Member name
        member: String,
        /// Member kind
        kind: &'static str,
        /// Overriding member
        span: Option<Span>,
    },
}

impl LinkWarning {
    /// Source location, when known
    pub fn span(&self) -> Option<Span> {
        match self {
            LinkWarning::InstanceVariablesWithoutInitializers { span, .. }
            | LinkWarning::OverridesDeprecated { span, .. } => *span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promise_messages() {
        let err = LinkError::PromiseViolation {
            class: "B".into(),
            superclass: "A".into(),
            member: "m".into(),
            kind: "Method",
            promise: Promise::Argument(0),
            expected: "🚂".into(),
            found: "🚀".into(),
            span: None,
        };
        assert_eq!(
            err.to_string(),
            "Method m of B does not keep the promise of A's m: incompatible argument 1"
        );
    }

    #[test]
    fn test_type_errors_map_to_link_kinds() {
        let err = LinkError::from_type_error(
            TypeError::DuplicateGenericName {
                name: "T".into(),
                owner: "A".into(),
            },
            Some(Span::new(0, 1, 2)),
        );
        assert!(matches!(
            err,
            LinkError::DuplicateDeclaration {
                what: "Generic variable",
                ..
            }
        ));
        assert_eq!(err.span(), Some(Span::new(0, 1, 2)));
    }
}
