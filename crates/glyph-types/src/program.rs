//! Compilation-unit context
//!
//! [`Program`] owns every package, class, protocol and enum in arenas and
//! answers the hierarchical questions the linker asks: superclass chains,
//! member lookup through ancestors, conformance lookup and instantiation of
//! generic classes.

use crate::definition::{Class, Conformance, Enum, Protocol, TypeDefinition};
use crate::error::TypeError;
use crate::generics::substitute_positions;
use crate::ids::{ClassId, EnumId, GenericOwner, PackageId, ProtocolId, TypeDefId};
use crate::member::{Member, MemberKind};
use crate::span::Span;
use crate::ty::{names, Type, TypeKind};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the type-level method that starts a program
pub const ENTRY_POINT_NAME: &str = "🏁";

/// Package version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackageVersion {
    /// Major version
    pub major: u16,
    /// Minor version
    pub minor: u16,
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A package and the names it declares
#[derive(Debug, Clone)]
pub struct Package {
    /// Package handle
    pub id: PackageId,
    /// Package name
    pub name: String,
    /// Version
    pub version: PackageVersion,
    /// Whether a native binary must be loaded alongside
    pub requires_binary: bool,
    /// Classes in declaration order
    pub classes: Vec<ClassId>,
    types: FxHashMap<String, TypeDefId>,
    exported: FxHashSet<String>,
}

impl Package {
    /// Type declared in this package by name
    pub fn get_type(&self, name: &str) -> Option<TypeDefId> {
        self.types.get(name).copied()
    }

    /// Whether the named type is visible to later packages
    pub fn exports(&self, name: &str) -> bool {
        self.exported.contains(name)
    }
}

/// The designated start of the program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint {
    /// Class declaring the 🏁 type-level method
    pub class: ClassId,
    /// Declaration site
    pub span: Option<Span>,
}

/// Compilation-unit context owning every type definition
#[derive(Debug, Clone, Default)]
pub struct Program {
    packages: Vec<Package>,
    classes: Vec<Class>,
    protocols: Vec<Protocol>,
    enums: Vec<Enum>,
    entry_point: Option<EntryPoint>,
}

impl Program {
    /// Empty program
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Declaration
    // ------------------------------------------------------------------

    /// Register a package. Packages are loaded in registration order.
    pub fn add_package(
        &mut self,
        name: &str,
        version: PackageVersion,
        requires_binary: bool,
    ) -> Result<PackageId, TypeError> {
        if self.packages.iter().any(|p| p.name == name) {
            return Err(TypeError::DuplicateDeclaration {
                what: "Package",
                name: name.to_string(),
            });
        }
        let id = PackageId(self.packages.len() as u32);
        self.packages.push(Package {
            id,
            name: name.to_string(),
            version,
            requires_binary,
            classes: Vec::new(),
            types: FxHashMap::default(),
            exported: FxHashSet::default(),
        });
        Ok(id)
    }

    fn register_type(
        &mut self,
        package: PackageId,
        name: &str,
        exported: bool,
        id: TypeDefId,
    ) -> Result<(), TypeError> {
        let package = &mut self.packages[package.index()];
        if package.types.contains_key(name) {
            return Err(TypeError::DuplicateDeclaration {
                what: "Type",
                name: name.to_string(),
            });
        }
        package.types.insert(name.to_string(), id);
        if exported {
            package.exported.insert(name.to_string());
        }
        Ok(())
    }

    /// Declare a class in a package
    pub fn declare_class(
        &mut self,
        package: PackageId,
        name: &str,
        documentation: Option<String>,
        span: Option<Span>,
        exported: bool,
    ) -> Result<ClassId, TypeError> {
        let id = ClassId(self.classes.len() as u32);
        self.register_type(package, name, exported, TypeDefId::Class(id))?;
        self.classes
            .push(Class::new(id, name.to_string(), package, documentation, span));
        self.packages[package.index()].classes.push(id);
        Ok(id)
    }

    /// Declare a protocol. Its id is the next global protocol index.
    pub fn declare_protocol(
        &mut self,
        package: PackageId,
        name: &str,
        documentation: Option<String>,
        span: Option<Span>,
        exported: bool,
    ) -> Result<ProtocolId, TypeError> {
        let id = ProtocolId(self.protocols.len() as u32);
        self.register_type(package, name, exported, TypeDefId::Protocol(id))?;
        self.protocols
            .push(Protocol::new(id, name.to_string(), package, documentation, span));
        Ok(id)
    }

    /// Declare an enum
    pub fn declare_enum(
        &mut self,
        package: PackageId,
        name: &str,
        documentation: Option<String>,
        span: Option<Span>,
        exported: bool,
    ) -> Result<EnumId, TypeError> {
        let id = EnumId(self.enums.len() as u32);
        self.register_type(package, name, exported, TypeDefId::Enum(id))?;
        self.enums
            .push(Enum::new(id, name.to_string(), package, documentation, span));
        Ok(id)
    }

    /// Find a type visible from `package`.
    ///
    /// With a namespace, only that package is searched (its exported types,
    /// or all types when it is `package` itself). Without one, the package's
    /// own types come first, then exported types of earlier packages.
    pub fn lookup_type(
        &self,
        package: PackageId,
        name: &str,
        namespace: Option<&str>,
    ) -> Option<TypeDefId> {
        if let Some(namespace) = namespace {
            let target = self.packages.iter().find(|p| p.name == namespace)?;
            if target.id == package || target.exports(name) {
                return target.get_type(name);
            }
            return None;
        }
        if let Some(found) = self.packages.get(package.index())?.get_type(name) {
            return Some(found);
        }
        self.packages[..package.index()]
            .iter()
            .find(|p| p.exports(name))
            .and_then(|p| p.get_type(name))
    }

    // ------------------------------------------------------------------
    // Arena access
    // ------------------------------------------------------------------

    /// All packages in load order
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Package by handle
    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.index()]
    }

    /// All classes by dense index
    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    /// Class by handle
    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.index()]
    }

    /// Class by handle, mutably
    pub fn class_mut(&mut self, id: ClassId) -> &mut Class {
        &mut self.classes[id.index()]
    }

    /// All protocols by global index
    pub fn protocols(&self) -> &[Protocol] {
        &self.protocols
    }

    /// Protocol by handle
    pub fn protocol(&self, id: ProtocolId) -> &Protocol {
        &self.protocols[id.index()]
    }

    /// Protocol by handle, mutably
    pub fn protocol_mut(&mut self, id: ProtocolId) -> &mut Protocol {
        &mut self.protocols[id.index()]
    }

    /// All enums
    pub fn enums(&self) -> &[Enum] {
        &self.enums
    }

    /// Enum by handle
    pub fn enumeration(&self, id: EnumId) -> &Enum {
        &self.enums[id.index()]
    }

    /// Enum by handle, mutably
    pub fn enumeration_mut(&mut self, id: EnumId) -> &mut Enum {
        &mut self.enums[id.index()]
    }

    /// Name of any type definition
    pub fn type_name(&self, id: TypeDefId) -> &str {
        match id {
            TypeDefId::Class(id) => self.class(id).name(),
            TypeDefId::Protocol(id) => self.protocol(id).name(),
            TypeDefId::Enum(id) => self.enumeration(id).name(),
        }
    }

    /// Designated entry point
    pub fn entry_point(&self) -> Option<EntryPoint> {
        self.entry_point
    }

    /// Designate the entry point. Returns the previous one, if any, without
    /// replacing it.
    pub fn set_entry_point(&mut self, entry: EntryPoint) -> Result<(), EntryPoint> {
        match self.entry_point {
            Some(previous) => Err(previous),
            None => {
                self.entry_point = Some(entry);
                Ok(())
            }
        }
    }

    /// VTI of the 🏁 method, once assigned
    pub fn entry_point_vti(&self) -> Option<u16> {
        let entry = self.entry_point?;
        self.class(entry.class)
            .type_methods
            .get(ENTRY_POINT_NAME)
            .and_then(|m| m.vti)
    }

    // ------------------------------------------------------------------
    // Hierarchy
    // ------------------------------------------------------------------

    /// Set a class's superclass, rejecting inheritance cycles. Also links
    /// the subclass's generics to the superclass's slot count, so the
    /// superclass's own generic variables must already be declared.
    pub fn set_superclass(&mut self, class: ClassId, superclass: ClassId) -> Result<(), TypeError> {
        if self.inherits_from(superclass, class) {
            return Err(TypeError::CyclicInheritance {
                class: self.class(class).name.clone(),
                superclass: self.class(superclass).name.clone(),
            });
        }
        self.class_mut(class).superclass = Some(superclass);
        Ok(())
    }

    /// Link a class's generics to its superclass's total generic count
    pub fn link_generic_supertype(&mut self, class: ClassId) -> Result<(), TypeError> {
        let Some(superclass) = self.superclass(class) else {
            return Ok(());
        };
        let total = self.class(superclass).generics.total_count();
        let class = &mut self.classes[class.index()];
        class.generics.link_supertype(&class.name, total)
    }

    /// Superclass of a class
    pub fn superclass(&self, class: ClassId) -> Option<ClassId> {
        self.class(class).superclass
    }

    /// Superclass chain, nearest first, excluding `class`
    pub fn ancestors(&self, class: ClassId) -> Ancestors<'_> {
        Ancestors {
            program: self,
            next: self.superclass(class),
        }
    }

    /// Whether `class` is `ancestor` or inherits from it
    pub fn inherits_from(&self, class: ClassId, ancestor: ClassId) -> bool {
        class == ancestor || self.ancestors(class).any(|c| c == ancestor)
    }

    /// Every class after all of its ancestors, otherwise in index order
    pub fn classes_in_dependency_order(&self) -> Vec<ClassId> {
        let mut ordered = Vec::with_capacity(self.classes.len());
        let mut placed = vec![false; self.classes.len()];
        for class in &self.classes {
            let mut chain = Vec::new();
            let mut cursor = Some(class.id);
            while let Some(id) = cursor {
                if placed[id.index()] {
                    break;
                }
                chain.push(id);
                cursor = self.superclass(id);
            }
            for id in chain.into_iter().rev() {
                placed[id.index()] = true;
                ordered.push(id);
            }
        }
        ordered
    }

    /// Sum of the instance variables of every ancestor of `class`
    pub fn inherited_instance_variables(&self, class: ClassId) -> usize {
        self.ancestors(class)
            .map(|c| self.class(c).instance_variables.len())
            .sum()
    }

    // ------------------------------------------------------------------
    // Member and conformance lookup
    // ------------------------------------------------------------------

    /// Nearest member of the given kind named `name`, starting at `class`
    pub fn lookup_member(&self, class: ClassId, kind: MemberKind, name: &str) -> Option<&Member> {
        std::iter::once(class)
            .chain(self.ancestors(class))
            .find_map(|c| self.class(c).table(kind).get(name))
    }

    /// Nearest method named `name`
    pub fn lookup_method(&self, class: ClassId, name: &str) -> Option<&Member> {
        self.lookup_member(class, MemberKind::Method, name)
    }

    /// Nearest type-level method named `name`
    pub fn lookup_type_method(&self, class: ClassId, name: &str) -> Option<&Member> {
        self.lookup_member(class, MemberKind::TypeMethod, name)
    }

    /// Nearest initializer named `name`
    pub fn lookup_initializer(&self, class: ClassId, name: &str) -> Option<&Member> {
        self.lookup_member(class, MemberKind::Initializer, name)
    }

    /// Conformance of `class` (or an ancestor) to `protocol`, together with
    /// the class that declared it
    pub fn conformance(&self, class: ClassId, protocol: ProtocolId) -> Option<(ClassId, &Conformance)> {
        std::iter::once(class)
            .chain(self.ancestors(class))
            .find_map(|c| {
                self.class(c)
                    .conformances
                    .iter()
                    .find(|conf| conf.protocol == protocol)
                    .map(|conf| (c, conf))
            })
    }

    // ------------------------------------------------------------------
    // Generics
    // ------------------------------------------------------------------

    /// Class type from the class's own generic arguments. The superclass
    /// prefix is expanded through the class's super generic arguments.
    pub fn instantiate(&self, class: ClassId, own_args: Vec<Type>) -> Result<Type, TypeError> {
        let definition = self.class(class);
        let generics = &definition.generics;
        if own_args.len() != generics.own_count() as usize {
            return Err(TypeError::GenericArgumentCount {
                name: definition.name.clone(),
                expected: generics.own_count() as usize,
                actual: own_args.len(),
            });
        }
        let super_count = generics.super_count() as usize;
        if super_count == 0 {
            return Ok(Type::class(class, own_args));
        }
        let super_args = generics.super_arguments();
        if super_args.len() != super_count {
            return Err(TypeError::SupertypeNotLinked {
                owner: definition.name.clone(),
            });
        }

        let mut args = vec![Type::something(); super_count];
        args.extend(own_args);
        let prefix: Vec<Type> = super_args
            .iter()
            .map(|a| substitute_positions(a, &args))
            .collect();
        args.splice(0..super_count, prefix);
        Ok(Type::class(class, args))
    }

    /// Finalize a definition's generic parameters. A class's superclass
    /// must be finalized first.
    pub fn finalize_generics(&mut self, owner: GenericOwner) -> Result<(), TypeError> {
        match owner {
            GenericOwner::Class(id) => {
                let inherited = self
                    .superclass(id)
                    .map(|s| self.class(s).generics.variables().clone());
                let class = &mut self.classes[id.index()];
                class.generics.finalize(&class.name, inherited.as_ref())
            }
            GenericOwner::Protocol(id) => {
                let protocol = &mut self.protocols[id.index()];
                protocol.generics.finalize(&protocol.name, None)
            }
        }
    }

    /// Generic parameter set of a class or protocol
    pub fn generics_of(&self, owner: GenericOwner) -> &crate::generics::GenericParameters {
        match owner {
            GenericOwner::Class(id) => &self.class(id).generics,
            GenericOwner::Protocol(id) => &self.protocol(id).generics,
        }
    }

    // ------------------------------------------------------------------
    // Display
    // ------------------------------------------------------------------

    /// Render a type for diagnostics
    pub fn display<'a>(&'a self, ty: &'a Type) -> TypeDisplay<'a> {
        TypeDisplay { program: self, ty }
    }
}

/// Iterator over a superclass chain
pub struct Ancestors<'a> {
    program: &'a Program,
    next: Option<ClassId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ClassId;

    fn next(&mut self) -> Option<ClassId> {
        let current = self.next?;
        self.next = self.program.superclass(current);
        Some(current)
    }
}

/// Diagnostic rendering of a [`Type`]
pub struct TypeDisplay<'a> {
    program: &'a Program,
    ty: &'a Type,
}

impl TypeDisplay<'_> {
    fn write_args(&self, f: &mut fmt::Formatter<'_>, args: &[Type]) -> fmt::Result {
        if args.is_empty() {
            return Ok(());
        }
        f.write_str("<")?;
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", self.program.display(arg))?;
        }
        f.write_str(">")
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ty.optional {
            f.write_str(names::OPTIONAL)?;
        }
        match &self.ty.kind {
            TypeKind::Integer => f.write_str(names::INTEGER),
            TypeKind::Double => f.write_str(names::DOUBLE),
            TypeKind::Boolean => f.write_str(names::BOOLEAN),
            TypeKind::Symbol => f.write_str(names::SYMBOL),
            TypeKind::Nothingness => f.write_str(names::NOTHINGNESS),
            TypeKind::Something => f.write_str(names::SOMETHING),
            TypeKind::SomeObject => f.write_str(names::SOME_OBJECT),
            TypeKind::SelfType => f.write_str(names::SELF),
            TypeKind::Class { id, args } => {
                let class = self.program.class(*id);
                f.write_str(&class.name)?;
                let own_from = (class.generics.super_count() as usize).min(args.len());
                self.write_args(f, &args[own_from..])
            }
            TypeKind::Protocol { id, args, .. } => {
                f.write_str(&self.program.protocol(*id).name)?;
                self.write_args(f, args)
            }
            TypeKind::Enum(id) => f.write_str(&self.program.enumeration(*id).name),
            TypeKind::Reference { owner, index } => {
                match self.program.generics_of(*owner).variable_name(*index) {
                    Some(name) => f.write_str(name),
                    None => write!(f, "${index}"),
                }
            }
            TypeKind::LocalReference(index) => write!(f, "$local{index}"),
            TypeKind::Callable { params, returns } => {
                f.write_str("🍇")?;
                for param in params {
                    write!(f, "{}", self.program.display(param))?;
                }
                write!(f, "➡️{}🍉", self.program.display(returns))
            }
        }
    }
}
