//! Classes, protocols and enums

use crate::error::TypeError;
use crate::generics::GenericParameters;
use crate::ids::{ClassId, EnumId, GenericOwner, PackageId, ProtocolId, TypeDefId};
use crate::member::{Member, MemberKind, MemberTable};
use crate::program::Program;
use crate::span::Span;
use crate::ty::Type;
use std::collections::BTreeSet;

/// Named type owned by exactly one package
pub trait TypeDefinition {
    /// Type name
    fn name(&self) -> &str;
    /// Owning package
    fn package(&self) -> PackageId;
    /// Documentation comment, if any
    fn documentation(&self) -> Option<&str>;
    /// Handle of this definition
    fn def_id(&self) -> TypeDefId;
}

/// Type definition that declares generic variables
pub trait TypeDefinitionWithGenerics: TypeDefinition {
    /// Generic parameter set
    fn generics(&self) -> &GenericParameters;

    /// Whether a generic reference declared by `constraint` may be resolved
    /// against the arguments of a value of this definition's type.
    fn can_be_used_to_resolve(&self, program: &Program, constraint: GenericOwner) -> bool;
}

/// Instance variable declaration
#[derive(Debug, Clone)]
pub struct InstanceVariable {
    /// Variable name
    pub name: String,
    /// Variable type
    pub ty: Type,
    /// Declaration site
    pub span: Option<Span>,
}

/// Declared protocol conformance and, once checked, its dispatch entries
#[derive(Debug, Clone)]
pub struct Conformance {
    /// Protocol type as declared, including generic arguments
    pub ty: Type,
    /// Protocol handle
    pub protocol: ProtocolId,
    /// Method VTIs in protocol declaration order, filled by the checker
    pub vtis: Vec<u16>,
    /// Declaration site
    pub span: Option<Span>,
}

/// Counters and flags produced by VTI assignment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassLinkState {
    /// Method table size including inherited slots
    pub next_method_vti: u16,
    /// Type-method table size including inherited slots
    pub next_type_method_vti: u16,
    /// Initializer table size including inherited slots
    pub next_initializer_vti: u16,
    /// Reuses the superclass's initializer table unchanged
    pub inherits_initializers: bool,
    /// Instance variables including all ancestors'
    pub instance_variable_total: u16,
    /// VTIs assigned and tables sealed
    pub assigned: bool,
    /// Protocol dispatch tables built
    pub conformance_checked: bool,
}

/// A class
#[derive(Debug, Clone)]
pub struct Class {
    /// Dense class index
    pub id: ClassId,
    /// Class name
    pub name: String,
    /// Owning package
    pub package: PackageId,
    /// Documentation comment
    pub documentation: Option<String>,
    /// Declaration site
    pub span: Option<Span>,
    /// Generic variables
    pub generics: GenericParameters,
    pub(crate) superclass: Option<ClassId>,
    /// Instance methods
    pub methods: MemberTable,
    /// Type-level methods
    pub type_methods: MemberTable,
    /// Initializers
    pub initializers: MemberTable,
    /// Instance variables in declaration order
    pub instance_variables: Vec<InstanceVariable>,
    /// Names of all required initializers of this class, inherited or new
    pub required_initializers: BTreeSet<String>,
    /// Inherited required initializers not implemented yet
    pub pending_required: BTreeSet<String>,
    /// Declared conformances in declaration order
    pub conformances: Vec<Conformance>,
    /// Link results
    pub link: ClassLinkState,
}

impl Class {
    pub(crate) fn new(
        id: ClassId,
        name: String,
        package: PackageId,
        documentation: Option<String>,
        span: Option<Span>,
    ) -> Self {
        Self {
            id,
            name,
            package,
            documentation,
            span,
            generics: GenericParameters::new(GenericOwner::Class(id)),
            superclass: None,
            methods: MemberTable::new(),
            type_methods: MemberTable::new(),
            initializers: MemberTable::new(),
            instance_variables: Vec::new(),
            required_initializers: BTreeSet::new(),
            pending_required: BTreeSet::new(),
            conformances: Vec::new(),
            link: ClassLinkState::default(),
        }
    }

    /// Superclass handle
    pub fn superclass(&self) -> Option<ClassId> {
        self.superclass
    }

    /// Table holding members of the given kind
    pub fn table(&self, kind: MemberKind) -> &MemberTable {
        match kind {
            MemberKind::Method => &self.methods,
            MemberKind::TypeMethod => &self.type_methods,
            MemberKind::Initializer => &self.initializers,
        }
    }

    /// Table holding members of the given kind, mutably
    pub fn table_mut(&mut self, kind: MemberKind) -> &mut MemberTable {
        match kind {
            MemberKind::Method => &mut self.methods,
            MemberKind::TypeMethod => &mut self.type_methods,
            MemberKind::Initializer => &mut self.initializers,
        }
    }

    /// Add a member to its table. Initializers update the required sets.
    pub fn add_member(&mut self, member: Member) -> Result<(), TypeError> {
        let kind = member.kind;
        let name = member.name.clone();
        let inherited_required = self.pending_required.contains(&name)
            || (kind == MemberKind::Initializer && self.required_initializers.contains(&name));
        let added = self.table_mut(kind).add(member)?;
        if kind == MemberKind::Initializer {
            if inherited_required {
                added.required = true;
            }
            if added.required {
                self.required_initializers.insert(name.clone());
            }
            self.pending_required.remove(&name);
        }
        Ok(())
    }

    /// Declare a protocol conformance
    pub fn add_conformance(&mut self, conformance: Conformance) -> Result<(), TypeError> {
        if self
            .conformances
            .iter()
            .any(|c| c.protocol == conformance.protocol)
        {
            return Err(TypeError::DuplicateDeclaration {
                what: "Conformance to protocol",
                name: conformance.protocol.to_string(),
            });
        }
        self.conformances.push(conformance);
        Ok(())
    }

    /// Class type as seen inside its own body: every generic slot refers
    /// to the class's own (or inherited) variables.
    pub fn self_type(&self) -> Type {
        let super_args = self.generics.super_arguments();
        let own_offset = self.generics.super_count();
        let mut args: Vec<Type> = super_args.to_vec();
        for position in 0..self.generics.own_count() {
            args.push(Type::reference(self.generics.owner(), own_offset + position));
        }
        Type::class(self.id, args)
    }

    /// Smallest and largest conformed protocol index
    pub fn protocol_index_range(&self) -> Option<(u32, u32)> {
        let indices = self.conformances.iter().map(|c| c.protocol.0);
        let min = indices.clone().min()?;
        let max = indices.max()?;
        Some((min, max))
    }
}

impl TypeDefinition for Class {
    fn name(&self) -> &str {
        &self.name
    }

    fn package(&self) -> PackageId {
        self.package
    }

    fn documentation(&self) -> Option<&str> {
        self.documentation.as_deref()
    }

    fn def_id(&self) -> TypeDefId {
        TypeDefId::Class(self.id)
    }
}

impl TypeDefinitionWithGenerics for Class {
    fn generics(&self) -> &GenericParameters {
        &self.generics
    }

    fn can_be_used_to_resolve(&self, program: &Program, constraint: GenericOwner) -> bool {
        match constraint {
            GenericOwner::Class(declaring) => program.inherits_from(self.id, declaring),
            GenericOwner::Protocol(_) => false,
        }
    }
}

/// A protocol
#[derive(Debug, Clone)]
pub struct Protocol {
    /// Global protocol index
    pub id: ProtocolId,
    /// Protocol name
    pub name: String,
    /// Owning package
    pub package: PackageId,
    /// Documentation comment
    pub documentation: Option<String>,
    /// Declaration site
    pub span: Option<Span>,
    /// Generic variables
    pub generics: GenericParameters,
    /// Required methods in declaration order
    pub methods: MemberTable,
    uses_self: bool,
}

impl Protocol {
    pub(crate) fn new(
        id: ProtocolId,
        name: String,
        package: PackageId,
        documentation: Option<String>,
        span: Option<Span>,
    ) -> Self {
        Self {
            id,
            name,
            package,
            documentation,
            span,
            generics: GenericParameters::new(GenericOwner::Protocol(id)),
            methods: MemberTable::new(),
            uses_self: false,
        }
    }

    /// Add a required method; records whether its signature uses 🐕
    pub fn add_method(&mut self, method: Member) -> Result<(), TypeError> {
        let uses_self = method.uses_self();
        self.methods.add(method)?;
        self.uses_self |= uses_self;
        Ok(())
    }

    /// Whether any method signature refers to the conforming type itself
    pub fn uses_self(&self) -> bool {
        self.uses_self
    }

    /// Protocol type as seen inside its own body
    pub fn self_type(&self) -> Type {
        let args = (0..self.generics.own_count())
            .map(|i| Type::reference(self.generics.owner(), i))
            .collect();
        Type::protocol(self.id, args)
    }
}

impl TypeDefinition for Protocol {
    fn name(&self) -> &str {
        &self.name
    }

    fn package(&self) -> PackageId {
        self.package
    }

    fn documentation(&self) -> Option<&str> {
        self.documentation.as_deref()
    }

    fn def_id(&self) -> TypeDefId {
        TypeDefId::Protocol(self.id)
    }
}

impl TypeDefinitionWithGenerics for Protocol {
    fn generics(&self) -> &GenericParameters {
        &self.generics
    }

    fn can_be_used_to_resolve(&self, _program: &Program, constraint: GenericOwner) -> bool {
        constraint == GenericOwner::Protocol(self.id)
    }
}

/// An enum
#[derive(Debug, Clone)]
pub struct Enum {
    /// Enum handle
    pub id: EnumId,
    /// Enum name
    pub name: String,
    /// Owning package
    pub package: PackageId,
    /// Documentation comment
    pub documentation: Option<String>,
    /// Declaration site
    pub span: Option<Span>,
    values: Vec<String>,
}

impl Enum {
    pub(crate) fn new(
        id: EnumId,
        name: String,
        package: PackageId,
        documentation: Option<String>,
        span: Option<Span>,
    ) -> Self {
        Self {
            id,
            name,
            package,
            documentation,
            span,
            values: Vec::new(),
        }
    }

    /// Declare a value; the first value is 0, each further one the
    /// previous plus one.
    pub fn add_value(&mut self, name: &str) -> Result<i64, TypeError> {
        if self.values.iter().any(|v| v == name) {
            return Err(TypeError::DuplicateDeclaration {
                what: "Enum value",
                name: name.to_string(),
            });
        }
        self.values.push(name.to_string());
        Ok(self.values.len() as i64 - 1)
    }

    /// Integer assigned to a value
    pub fn value_for(&self, name: &str) -> Option<i64> {
        self.values.iter().position(|v| v == name).map(|i| i as i64)
    }

    /// Values with their integers, in declaration order
    pub fn values(&self) -> impl Iterator<Item = (&str, i64)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i as i64))
    }
}

impl TypeDefinition for Enum {
    fn name(&self) -> &str {
        &self.name
    }

    fn package(&self) -> PackageId {
        self.package
    }

    fn documentation(&self) -> Option<&str> {
        self.documentation.as_deref()
    }

    fn def_id(&self) -> TypeDefId {
        TypeDefId::Enum(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_values_are_dense() {
        let mut e = Enum::new(EnumId(0), "🚦".into(), PackageId(0), None, None);
        assert_eq!(e.add_value("🔴").unwrap(), 0);
        assert_eq!(e.add_value("🟡").unwrap(), 1);
        assert_eq!(e.add_value("🟢").unwrap(), 2);
        assert!(matches!(
            e.add_value("🟡"),
            Err(TypeError::DuplicateDeclaration { what: "Enum value", .. })
        ));
        assert_eq!(e.value_for("🟢"), Some(2));
        assert_eq!(e.value_for("⚫"), None);
        let all: Vec<_> = e.values().collect();
        assert_eq!(all, [("🔴", 0), ("🟡", 1), ("🟢", 2)]);
    }

    #[test]
    fn test_initializer_implementing_pending_required_becomes_required() {
        let mut class = Class::new(ClassId(1), "🐈".into(), PackageId(0), None, None);
        class.pending_required.insert("🆕".into());
        class.required_initializers.insert("🆕".into());
        let init = Member::new(MemberKind::Initializer, "🆕", TypeDefId::Class(ClassId(1)));
        class.add_member(init).unwrap();
        assert!(class.pending_required.is_empty());
        assert!(class.initializers.get("🆕").map_or(false, |m| m.required));
    }

    #[test]
    fn test_protocol_tracks_self_usage() {
        let mut protocol = Protocol::new(ProtocolId(0), "😛".into(), PackageId(0), None, None);
        let mut plain = Member::new(MemberKind::Method, "🔢", TypeDefId::Protocol(ProtocolId(0)));
        plain.return_type = Type::integer();
        protocol.add_method(plain).unwrap();
        assert!(!protocol.uses_self());

        let mut equals = Member::new(MemberKind::Method, "😛", TypeDefId::Protocol(ProtocolId(0)));
        equals.arguments.push(crate::member::Argument {
            name: "other".into(),
            ty: Type::self_type(),
        });
        equals.return_type = Type::boolean();
        protocol.add_method(equals).unwrap();
        assert!(protocol.uses_self());
    }
}
