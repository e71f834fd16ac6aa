//! Type model errors

use thiserror::Error;

/// Errors raised while building or querying the type-definition model
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    /// A generic variable name is already used in the type's own list
    #[error("Duplicate generic variable '{name}' on {owner}")]
    DuplicateGenericName {
        /// Variable name
        name: String,
        /// Name of the declaring type
        owner: String,
    },

    /// Generic parameters were already finalized
    #[error("Generic arguments of {owner} were already finalized")]
    GenericsAlreadyFinalized {
        /// Name of the declaring type
        owner: String,
    },

    /// Finalization attempted before the supertype arguments were linked
    #[error("Generic arguments of {owner} cannot be finalized before its supertype arguments are set")]
    SupertypeNotLinked {
        /// Name of the declaring type
        owner: String,
    },

    /// Supertype linked after own generic variables were declared
    #[error("Supertype of {owner} must be linked before its own generic variables are declared")]
    SupertypeLinkedLate {
        /// Name of the declaring type
        owner: String,
    },

    /// A generic variable could not be found in any enclosing context
    #[error("No generic variable named '{name}' is in scope")]
    UnresolvedGenericVariable {
        /// Variable name
        name: String,
    },

    /// A type name could not be found
    #[error("Unknown type '{name}'")]
    UnknownType {
        /// Type name
        name: String,
    },

    /// Wrong number of generic arguments supplied to a type
    #[error("{name} expects {expected} generic argument(s), got {actual}")]
    GenericArgumentCount {
        /// Type name
        name: String,
        /// Expected count
        expected: usize,
        /// Actual count
        actual: usize,
    },

    /// Superclass chain would contain a cycle
    #[error("Class {class} cannot inherit from {superclass}: inheritance cycle")]
    CyclicInheritance {
        /// Class name
        class: String,
        /// Rejected superclass name
        superclass: String,
    },

    /// A name is declared twice in the same scope
    #[error("{what} '{name}' is already declared")]
    DuplicateDeclaration {
        /// What kind of thing was redeclared ("Type", "Method", "Enum value", ...)
        what: &'static str,
        /// Redeclared name
        name: String,
    },

    /// Member table was already sealed
    #[error("Cannot add '{name}': member table is sealed")]
    SealedTable {
        /// Member name
        name: String,
    },

    /// Member table sealed while a member still lacks a VTI
    #[error("Member '{name}' has no VTI assigned")]
    UnassignedVti {
        /// Member name
        name: String,
    },
}
