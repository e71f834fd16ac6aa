//! Declaration processing
//!
//! Turns a [`ProgramDecl`] into a [`Program`]: registers packages and type
//! names, links superclasses, declares and finalizes generics, then adds
//! instance variables, conformances and members. Runs in phases so that
//! member signatures may refer to types declared later in the same program.
//! A superclass is the exception: it must be declared before its subclass.

use glyph_types::program::ENTRY_POINT_NAME;
use glyph_types::{
    Argument, Body, ClassId, Conformance, EntryPoint, GenericOwner, GenericParameter,
    InstanceVariable, Member, MemberKind, PackageId, Program, ProtocolId, Span, Type, TypeContext,
    TypeDefId, TypeError, TypeKind,
};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::decl::{
    BodyDecl, ClassDecl, ExtensionDecl, GenericDecl, InitializerDecl, ItemDecl, MembersDecl,
    MethodDecl, ProgramDecl, ProtocolDecl, TypeExpr,
};
use crate::diagnostic::Diagnostics;
use crate::error::{LinkError, LinkWarning};

/// Most packages a program may load
pub const MAX_PACKAGES: usize = 253;

/// Most instance variables a class may carry, inherited ones included
pub const MAX_INSTANCE_VARIABLES: usize = u16::MAX as usize;

/// Method names that cannot be declared: their first character is
/// claimed by the language.
const RESERVED_NAME_STARTS: &[char] = &[
    '🍮', '🍩', '🍰', '🍫', '🍳', '🍪', '🍭', '🔁', '🔂', '🍎', '🍺', '🍻', '🍋', '🍇', '🍓',
    '🔲', '🔷', '🐕', '⚡', '☁', '🍌', '🍯', '🍦', '🍨', '🍊', '🍉', '🍆', '🐚', '⏩', '⏭',
];

/// Whether a method name is reserved
pub fn is_reserved_name(name: &str) -> bool {
    name.chars()
        .next()
        .map_or(false, |c| RESERVED_NAME_STARTS.contains(&c))
}

/// Result of declaration processing
pub(crate) struct Declared {
    pub program: Program,
    /// Classes that must not be numbered or serialized
    pub failed: FxHashSet<ClassId>,
}

/// A block of members and the package that declared it
struct MemberSource<'a> {
    package: PackageId,
    members: &'a MembersDecl,
    span: Option<Span>,
}

pub(crate) struct Declarer<'a> {
    decl: &'a ProgramDecl,
    program: Program,
    diagnostics: &'a mut Diagnostics,
    failed: FxHashSet<ClassId>,
    classes: Vec<(ClassId, &'a ClassDecl)>,
    protocols: Vec<(ProtocolId, &'a ProtocolDecl)>,
    extensions: FxHashMap<ClassId, Vec<MemberSource<'a>>>,
}

impl<'a> Declarer<'a> {
    pub fn new(decl: &'a ProgramDecl, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            decl,
            program: Program::new(),
            diagnostics,
            failed: FxHashSet::default(),
            classes: Vec::new(),
            protocols: Vec::new(),
            extensions: FxHashMap::default(),
        }
    }

    /// Run every declaration phase
    pub fn run(mut self) -> Declared {
        self.declare_packages_and_types();
        self.link_superclasses();
        self.declare_generics();
        self.link_super_arguments();
        self.finalize_generics();
        self.resolve_constraints();
        self.collect_extensions();
        self.declare_protocol_members();
        self.declare_class_members();
        Declared {
            program: self.program,
            failed: self.failed,
        }
    }

    fn fail(&mut self, class: ClassId, error: LinkError) {
        self.diagnostics.error(error);
        self.failed.insert(class);
    }

    /// Skip a class whose superclass failed, marking it failed as well
    fn inherits_failure(&mut self, class: ClassId) -> bool {
        if self.failed.contains(&class) {
            return true;
        }
        let failed_ancestor = self
            .program
            .ancestors(class)
            .any(|ancestor| self.failed.contains(&ancestor));
        if failed_ancestor {
            self.failed.insert(class);
        }
        failed_ancestor
    }

    fn class_decl(&self, class: ClassId) -> Option<&'a ClassDecl> {
        self.classes
            .iter()
            .find(|(id, _)| *id == class)
            .map(|(_, decl)| *decl)
    }

    // ------------------------------------------------------------------
    // Phase 1: packages and names
    // ------------------------------------------------------------------

    fn declare_packages_and_types(&mut self) {
        let decl = self.decl;
        if decl.packages.len() > MAX_PACKAGES {
            self.diagnostics.error(LinkError::SerializationLimitExceeded {
                what: "packages",
                limit: MAX_PACKAGES,
                actual: decl.packages.len(),
                span: None,
            });
        }

        for package_decl in &decl.packages {
            if package_decl.name == "_" && package_decl.requires_binary {
                self.diagnostics.error(LinkError::InvalidPackage {
                    name: package_decl.name.clone(),
                    reason: "the main package cannot require a native binary",
                });
            }
            let package = match self.program.add_package(
                &package_decl.name,
                package_decl.version,
                package_decl.requires_binary,
            ) {
                Ok(package) => package,
                Err(error) => {
                    self.diagnostics.error(LinkError::from_type_error(error, None));
                    continue;
                }
            };
            debug!(package = %package_decl.name, items = package_decl.items.len(), "declaring package");

            for item in &package_decl.items {
                self.declare_item(package, item);
            }
        }
    }

    fn declare_item(&mut self, package: PackageId, item: &'a ItemDecl) {
        let result = match item {
            ItemDecl::Class(class) => self
                .program
                .declare_class(
                    package,
                    &class.name,
                    class.documentation.clone(),
                    class.span,
                    class.exported,
                )
                .map(|id| self.classes.push((id, class)))
                .map_err(|e| LinkError::from_type_error(e, class.span)),
            ItemDecl::Protocol(protocol) => self
                .program
                .declare_protocol(
                    package,
                    &protocol.name,
                    protocol.documentation.clone(),
                    protocol.span,
                    protocol.exported,
                )
                .map(|id| self.protocols.push((id, protocol)))
                .map_err(|e| LinkError::from_type_error(e, protocol.span)),
            ItemDecl::Enum(enumeration) => self
                .program
                .declare_enum(
                    package,
                    &enumeration.name,
                    enumeration.documentation.clone(),
                    enumeration.span,
                    enumeration.exported,
                )
                .map_err(|e| LinkError::from_type_error(e, enumeration.span))
                .and_then(|id| {
                    let target = self.program.enumeration_mut(id);
                    for value in &enumeration.values {
                        target
                            .add_value(value)
                            .map_err(|e| LinkError::from_type_error(e, enumeration.span))?;
                    }
                    Ok(())
                }),
            ItemDecl::Extension(_) => Ok(()),
        };
        if let Err(error) = result {
            self.diagnostics.error(error);
        }
    }

    // ------------------------------------------------------------------
    // Phase 2: superclasses
    // ------------------------------------------------------------------

    fn link_superclasses(&mut self) {
        for index in 0..self.classes.len() {
            let (class, decl) = self.classes[index];
            let Some(superclass) = &decl.superclass else {
                continue;
            };
            let package = self.program.class(class).package;
            match self.superclass_of(class, package, decl, superclass) {
                Ok(superclass) => {
                    if let Err(error) = self.program.set_superclass(class, superclass) {
                        self.fail(class, LinkError::from_type_error(error, decl.span));
                    }
                }
                Err(error) => self.fail(class, error),
            }
        }
    }

    fn superclass_of(
        &self,
        class: ClassId,
        package: PackageId,
        decl: &ClassDecl,
        expr: &TypeExpr,
    ) -> Result<ClassId, LinkError> {
        let invalid = |reason| LinkError::InvalidSupertype {
            class: decl.name.clone(),
            found: expr.describe(),
            reason,
            span: decl.span,
        };
        let TypeExpr::Named {
            name,
            namespace,
            optional,
            ..
        } = expr
        else {
            return Err(invalid("not a class"));
        };
        if *optional {
            return Err(invalid("superclasses cannot be optional"));
        }
        match self.program.lookup_type(package, name, namespace.as_deref()) {
            Some(TypeDefId::Class(superclass)) if superclass == class => {
                Err(invalid("inheritance cycle"))
            }
            Some(TypeDefId::Class(superclass)) if superclass.index() < class.index() => {
                Ok(superclass)
            }
            Some(TypeDefId::Class(_)) => Err(LinkError::MissingSupertype {
                class: decl.name.clone(),
                superclass: name.clone(),
                span: decl.span,
            }),
            Some(_) => Err(invalid("not a class")),
            None if Type::builtin(name).is_some() => Err(invalid("not a class")),
            None => Err(LinkError::MissingSupertype {
                class: decl.name.clone(),
                superclass: name.clone(),
                span: decl.span,
            }),
        }
    }

    // ------------------------------------------------------------------
    // Phase 3-5: generics
    // ------------------------------------------------------------------

    fn declare_generics(&mut self) {
        for class in self.program.classes_in_dependency_order() {
            if self.inherits_failure(class) {
                continue;
            }
            let Some(decl) = self.class_decl(class) else {
                continue;
            };
            let result = self
                .program
                .link_generic_supertype(class)
                .and_then(|()| add_generics(&mut self.program.class_mut(class).generics, &decl.name, &decl.generics));
            if let Err(error) = result {
                self.fail(class, LinkError::from_type_error(error, decl.span));
            }
        }

        for index in 0..self.protocols.len() {
            let (protocol, decl) = self.protocols[index];
            let generics = &mut self.program.protocol_mut(protocol).generics;
            if let Err(error) = add_generics(generics, &decl.name, &decl.generics) {
                self.diagnostics.error(LinkError::from_type_error(error, decl.span));
            }
        }
    }

    /// Resolve the arguments every class applies to its superclass. A class
    /// named in such an argument may itself still lack its super arguments,
    /// so unresolved classes are retried until no more progress is made.
    fn link_super_arguments(&mut self) {
        let mut pending: Vec<ClassId> = self
            .program
            .classes_in_dependency_order()
            .into_iter()
            .filter(|c| self.program.superclass(*c).is_some() && !self.failed.contains(c))
            .collect();

        loop {
            let before = pending.len();
            let mut waiting = Vec::new();
            for class in pending {
                if self.inherits_failure(class) {
                    continue;
                }
                match self.super_arguments(class) {
                    Ok(()) => {}
                    Err(LinkError::Model {
                        error: TypeError::SupertypeNotLinked { .. },
                        ..
                    }) => waiting.push(class),
                    Err(error) => self.fail(class, error),
                }
            }
            pending = waiting;
            if pending.is_empty() || pending.len() == before {
                break;
            }
        }

        for class in pending {
            if self.inherits_failure(class) {
                continue;
            }
            let span = self.program.class(class).span;
            let owner = self.program.class(class).name.clone();
            self.fail(
                class,
                LinkError::from_type_error(TypeError::SupertypeNotLinked { owner }, span),
            );
        }
    }

    fn super_arguments(&mut self, class: ClassId) -> Result<(), LinkError> {
        let Some(decl) = self.class_decl(class) else {
            return Ok(());
        };
        let Some(TypeExpr::Named { args, .. }) = &decl.superclass else {
            return Ok(());
        };
        let Some(superclass) = self.program.superclass(class) else {
            return Ok(());
        };
        let package = self.program.class(class).package;
        let ctx = TypeContext::new(Type::class(class, Vec::new()));
        let own_args = args
            .iter()
            .map(|arg| self.resolve_type(package, arg, &ctx, decl.span))
            .collect::<Result<Vec<_>, _>>()?;
        let super_type = self
            .program
            .instantiate(superclass, own_args)
            .map_err(|e| LinkError::from_type_error(e, decl.span))?;
        let flattened = super_type.generic_arguments().to_vec();
        let target = self.program.class_mut(class);
        target
            .generics
            .set_super_arguments(&decl.name, flattened)
            .map_err(|e| LinkError::from_type_error(e, decl.span))
    }

    fn finalize_generics(&mut self) {
        for class in self.program.classes_in_dependency_order() {
            if self.inherits_failure(class) {
                continue;
            }
            if let Err(error) = self.program.finalize_generics(GenericOwner::Class(class)) {
                let span = self.program.class(class).span;
                self.fail(class, LinkError::from_type_error(error, span));
            }
        }
        for index in 0..self.protocols.len() {
            let (protocol, decl) = self.protocols[index];
            if let Err(error) = self.program.finalize_generics(GenericOwner::Protocol(protocol)) {
                self.diagnostics.error(LinkError::from_type_error(error, decl.span));
            }
        }
    }

    fn resolve_constraints(&mut self) {
        for index in 0..self.classes.len() {
            let (class, decl) = self.classes[index];
            if self.failed.contains(&class) {
                continue;
            }
            let ctx = TypeContext::new(self.program.class(class).self_type());
            let package = self.program.class(class).package;
            match self.resolve_generic_constraints(package, &decl.generics, &ctx, decl.span) {
                Ok(constraints) => {
                    let generics = &mut self.program.class_mut(class).generics;
                    for (position, constraint) in constraints.into_iter().enumerate() {
                        generics.set_constraint(position, constraint);
                    }
                }
                Err(error) => self.fail(class, error),
            }
        }

        for index in 0..self.protocols.len() {
            let (protocol, decl) = self.protocols[index];
            let ctx = TypeContext::new(self.program.protocol(protocol).self_type());
            let package = self.program.protocol(protocol).package;
            match self.resolve_generic_constraints(package, &decl.generics, &ctx, decl.span) {
                Ok(constraints) => {
                    let generics = &mut self.program.protocol_mut(protocol).generics;
                    for (position, constraint) in constraints.into_iter().enumerate() {
                        generics.set_constraint(position, constraint);
                    }
                }
                Err(error) => self.diagnostics.error(error),
            }
        }
    }

    fn resolve_generic_constraints(
        &self,
        package: PackageId,
        generics: &[GenericDecl],
        ctx: &TypeContext<'_>,
        span: Option<Span>,
    ) -> Result<Vec<Type>, LinkError> {
        generics
            .iter()
            .map(|g| match &g.constraint {
                Some(expr) => self.resolve_type(package, expr, ctx, span),
                None => Ok(Type::something()),
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Type expressions
    // ------------------------------------------------------------------

    /// Resolve a type expression as written in `package`, in `ctx`
    fn resolve_type(
        &self,
        package: PackageId,
        expr: &TypeExpr,
        ctx: &TypeContext<'_>,
        span: Option<Span>,
    ) -> Result<Type, LinkError> {
        match expr {
            TypeExpr::Variable { variable, optional } => self
                .program
                .resolve_variable(ctx, variable, *optional)
                .map_err(|e| LinkError::from_type_error(e, span)),
            TypeExpr::Callable {
                params,
                returns,
                optional,
            } => {
                let params = params
                    .iter()
                    .map(|p| self.resolve_type(package, p, ctx, span))
                    .collect::<Result<Vec<_>, _>>()?;
                let returns = self.resolve_type(package, returns, ctx, span)?;
                Ok(Type::callable(params, returns).with_optional(*optional))
            }
            TypeExpr::Named {
                name,
                namespace,
                optional,
                args,
            } => {
                if namespace.is_none() {
                    if let Some(builtin) = Type::builtin(name) {
                        if !args.is_empty() {
                            return Err(LinkError::from_type_error(
                                TypeError::GenericArgumentCount {
                                    name: name.clone(),
                                    expected: 0,
                                    actual: args.len(),
                                },
                                span,
                            ));
                        }
                        return Ok(builtin.with_optional(*optional));
                    }
                }
                let found = self
                    .program
                    .lookup_type(package, name, namespace.as_deref())
                    .ok_or_else(|| LinkError::UnknownType {
                        name: name.clone(),
                        span,
                    })?;
                let args = args
                    .iter()
                    .map(|a| self.resolve_type(package, a, ctx, span))
                    .collect::<Result<Vec<_>, _>>()?;
                let ty = match found {
                    TypeDefId::Class(id) => self
                        .program
                        .instantiate(id, args)
                        .map_err(|e| LinkError::from_type_error(e, span))?,
                    TypeDefId::Protocol(id) => {
                        let expected = self.program.protocol(id).generics.own_count() as usize;
                        if args.len() != expected {
                            return Err(LinkError::from_type_error(
                                TypeError::GenericArgumentCount {
                                    name: name.clone(),
                                    expected,
                                    actual: args.len(),
                                },
                                span,
                            ));
                        }
                        Type::protocol(id, args)
                    }
                    TypeDefId::Enum(id) => {
                        if !args.is_empty() {
                            return Err(LinkError::from_type_error(
                                TypeError::GenericArgumentCount {
                                    name: name.clone(),
                                    expected: 0,
                                    actual: args.len(),
                                },
                                span,
                            ));
                        }
                        Type::enumeration(id)
                    }
                };
                Ok(ty.with_optional(*optional))
            }
        }
    }

    /// Resolve method-level generics one by one; each constraint may refer
    /// to the variables declared before it.
    fn method_generics(
        &self,
        package: PackageId,
        callee: &Type,
        decls: &[GenericDecl],
        span: Option<Span>,
    ) -> Result<Vec<GenericParameter>, LinkError> {
        let mut generics: Vec<GenericParameter> = Vec::with_capacity(decls.len());
        for g in decls {
            if generics.iter().any(|p| p.name == g.name) {
                return Err(LinkError::DuplicateDeclaration {
                    what: "Generic variable",
                    name: g.name.clone(),
                    span,
                });
            }
            let constraint = match &g.constraint {
                Some(expr) => {
                    let ctx = TypeContext::new(callee.clone()).with_method(&generics);
                    self.resolve_type(package, expr, &ctx, span)?
                }
                None => Type::something(),
            };
            generics.push(GenericParameter {
                name: g.name.clone(),
                constraint,
            });
        }
        Ok(generics)
    }

    // ------------------------------------------------------------------
    // Phase 6: members
    // ------------------------------------------------------------------

    fn collect_extensions(&mut self) {
        let decl = self.decl;
        for package_decl in &decl.packages {
            let Some(package) = self
                .program
                .packages()
                .iter()
                .find(|p| p.name == package_decl.name)
                .map(|p| p.id)
            else {
                continue;
            };
            for item in &package_decl.items {
                let ItemDecl::Extension(extension) = item else {
                    continue;
                };
                match self.extended_class(package, extension) {
                    Ok(class) => self.extensions.entry(class).or_default().push(MemberSource {
                        package,
                        members: &extension.members,
                        span: extension.span,
                    }),
                    Err(error) => self.diagnostics.error(error),
                }
            }
        }
    }

    fn extended_class(&self, package: PackageId, extension: &ExtensionDecl) -> Result<ClassId, LinkError> {
        let unknown = || LinkError::UnknownType {
            name: extension.class.describe(),
            span: extension.span,
        };
        let TypeExpr::Named { name, namespace, .. } = &extension.class else {
            return Err(unknown());
        };
        match self.program.lookup_type(package, name, namespace.as_deref()) {
            Some(TypeDefId::Class(class)) => Ok(class),
            _ => Err(unknown()),
        }
    }

    fn declare_protocol_members(&mut self) {
        for index in 0..self.protocols.len() {
            let (protocol, decl) = self.protocols[index];
            let package = self.program.protocol(protocol).package;
            let callee = self.program.protocol(protocol).self_type();
            for method in &decl.methods {
                let result = self
                    .signature(package, &callee, MemberKind::Method, TypeDefId::Protocol(protocol), method)
                    .and_then(|mut member| {
                        member.access = Default::default();
                        member.is_final = false;
                        member.is_override = false;
                        member.body = Body::Abstract;
                        self.program
                            .protocol_mut(protocol)
                            .add_method(member)
                            .map_err(|e| LinkError::from_type_error(e, method.span))
                    });
                if let Err(error) = result {
                    self.diagnostics.error(error);
                }
            }
            trace!(
                protocol = %decl.name,
                methods = self.program.protocol(protocol).methods.len(),
                uses_self = self.program.protocol(protocol).uses_self(),
                "protocol declared"
            );
        }
    }

    fn declare_class_members(&mut self) {
        for class in self.program.classes_in_dependency_order() {
            if self.inherits_failure(class) {
                continue;
            }
            let Some(decl) = self.class_decl(class) else {
                continue;
            };
            let package = self.program.class(class).package;
            let mut sources = vec![MemberSource {
                package,
                members: &decl.members,
                span: decl.span,
            }];
            sources.extend(self.extensions.remove(&class).unwrap_or_default());

            self.seed_required_initializers(class, decl, &sources);
            self.declare_instance_variables(class, decl);
            for source in &sources {
                self.declare_conformances(class, source);
            }
            let callee = self.program.class(class).self_type();
            for source in &sources {
                self.declare_members(class, &callee, source);
            }
            self.close_class(class, decl);
        }
    }

    /// Copy the superclass's required initializers. A class that declares
    /// instance variables or initializers must implement each of them.
    fn seed_required_initializers(&mut self, class: ClassId, decl: &ClassDecl, sources: &[MemberSource<'_>]) {
        let Some(superclass) = self.program.superclass(class) else {
            return;
        };
        let inherited = self.program.class(superclass).required_initializers.clone();
        let builds_own_initializers = !decl.instance_variables.is_empty()
            || sources.iter().any(|s| !s.members.initializers.is_empty());
        let target = self.program.class_mut(class);
        if builds_own_initializers {
            target.pending_required = inherited.clone();
        }
        target.required_initializers = inherited;
    }

    fn declare_instance_variables(&mut self, class: ClassId, decl: &ClassDecl) {
        let package = self.program.class(class).package;
        let ctx = TypeContext::new(self.program.class(class).self_type());
        let mut variables = Vec::with_capacity(decl.instance_variables.len());
        let mut seen = FxHashSet::default();
        for variable in &decl.instance_variables {
            if !seen.insert(variable.name.as_str()) {
                self.diagnostics.error(LinkError::DuplicateDeclaration {
                    what: "Instance variable",
                    name: variable.name.clone(),
                    span: variable.span.or(decl.span),
                });
                continue;
            }
            match self.resolve_type(package, &variable.ty, &ctx, variable.span.or(decl.span)) {
                Ok(ty) => variables.push(InstanceVariable {
                    name: variable.name.clone(),
                    ty,
                    span: variable.span,
                }),
                Err(error) => self.diagnostics.error(error),
            }
        }

        let total = self.program.inherited_instance_variables(class) + variables.len();
        if total > MAX_INSTANCE_VARIABLES {
            self.fail(
                class,
                LinkError::SerializationLimitExceeded {
                    what: "instance variables",
                    limit: MAX_INSTANCE_VARIABLES,
                    actual: total,
                    span: decl.span,
                },
            );
        }
        self.program.class_mut(class).instance_variables = variables;
    }

    fn declare_conformances(&mut self, class: ClassId, source: &MemberSource<'_>) {
        let ctx = TypeContext::new(self.program.class(class).self_type());
        for expr in &source.members.conformances {
            let ty = match self.resolve_type(source.package, expr, &ctx, source.span) {
                Ok(ty) => ty,
                Err(error) => {
                    self.diagnostics.error(error);
                    continue;
                }
            };
            let protocol = match ty.kind {
                TypeKind::Protocol { id, .. } if !ty.optional => id,
                _ => {
                    let error = LinkError::InvalidConformance {
                        class: self.program.class(class).name.clone(),
                        found: self.program.display(&ty).to_string(),
                        span: source.span,
                    };
                    self.diagnostics.error(error);
                    continue;
                }
            };
            let conformance = Conformance {
                ty,
                protocol,
                vtis: Vec::new(),
                span: source.span,
            };
            if let Err(error) = self.program.class_mut(class).add_conformance(conformance) {
                let name = self.program.protocol(protocol).name.clone();
                let error = match error {
                    TypeError::DuplicateDeclaration { what, .. } => LinkError::DuplicateDeclaration {
                        what,
                        name,
                        span: source.span,
                    },
                    other => LinkError::from_type_error(other, source.span),
                };
                self.diagnostics.error(error);
            }
        }
    }

    fn declare_members(&mut self, class: ClassId, callee: &Type, source: &MemberSource<'_>) {
        let owner = TypeDefId::Class(class);
        let methods = source
            .members
            .methods
            .iter()
            .map(|m| (MemberKind::Method, m))
            .chain(source.members.type_methods.iter().map(|m| (MemberKind::TypeMethod, m)));
        for (kind, method) in methods {
            let result = self
                .signature(source.package, callee, kind, owner, method)
                .and_then(|member| self.check_native(class, source.package, member))
                .and_then(|member| self.add_member(class, member));
            if let Err(error) = result {
                self.diagnostics.error(error);
            }
        }

        for initializer in &source.members.initializers {
            let result = self
                .initializer(source.package, callee, class, initializer)
                .and_then(|member| self.check_native(class, source.package, member))
                .and_then(|member| self.add_member(class, member));
            if let Err(error) = result {
                self.diagnostics.error(error);
            }
        }
    }

    /// Build a method or type-level method member
    fn signature(
        &self,
        package: PackageId,
        callee: &Type,
        kind: MemberKind,
        owner: TypeDefId,
        decl: &MethodDecl,
    ) -> Result<Member, LinkError> {
        if is_reserved_name(&decl.name) {
            return Err(LinkError::ReservedName {
                name: decl.name.clone(),
                place: kind.describe(),
                span: decl.span,
            });
        }
        let generics = self.method_generics(package, callee, &decl.generics, decl.span)?;
        let ctx = TypeContext::new(callee.clone()).with_method(&generics);

        let mut member = Member::new(kind, decl.name.clone(), owner);
        for argument in &decl.arguments {
            member.arguments.push(Argument {
                name: argument.name.clone(),
                ty: self.resolve_type(package, &argument.ty, &ctx, argument.span.or(decl.span))?,
            });
        }
        if let Some(returns) = &decl.returns {
            member.return_type = self.resolve_type(package, returns, &ctx, decl.span)?;
        }
        member.generics = generics;
        member.access = decl.access;
        member.is_final = decl.is_final;
        member.is_override = decl.is_override;
        member.deprecated = decl.deprecated;
        member.documentation = decl.documentation.clone();
        member.body = body(&decl.body);
        member.span = decl.span;
        Ok(member)
    }

    fn initializer(
        &self,
        package: PackageId,
        callee: &Type,
        class: ClassId,
        decl: &InitializerDecl,
    ) -> Result<Member, LinkError> {
        let ctx = TypeContext::new(callee.clone());
        let mut member = Member::new(MemberKind::Initializer, decl.name.clone(), TypeDefId::Class(class));
        for argument in &decl.arguments {
            member.arguments.push(Argument {
                name: argument.name.clone(),
                ty: self.resolve_type(package, &argument.ty, &ctx, argument.span.or(decl.span))?,
            });
        }
        member.access = decl.access;
        member.is_final = decl.is_final;
        member.required = decl.required;
        member.can_return_nothing = decl.can_return_nothing;
        member.deprecated = decl.deprecated;
        member.documentation = decl.documentation.clone();
        member.body = body(&decl.body);
        member.span = decl.span;
        Ok(member)
    }

    /// Native bodies need a package that ships a native binary, and may not
    /// be added to another package's class.
    fn check_native(&self, class: ClassId, package: PackageId, member: Member) -> Result<Member, LinkError> {
        if !member.body.is_native() {
            return Ok(member);
        }
        let reason = if self.program.class(class).package != package {
            Some("native members can only be added to classes of the same package")
        } else if !self.program.package(package).requires_binary {
            Some("the package does not require a native binary")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(LinkError::NativeNotAllowed {
                class: self.program.class(class).name.clone(),
                member: member.name,
                reason,
                span: member.span,
            }),
            None => Ok(member),
        }
    }

    fn add_member(&mut self, class: ClassId, member: Member) -> Result<(), LinkError> {
        let kind = member.kind;
        let name = member.name.clone();
        let span = member.span;
        let is_entry_point = kind == MemberKind::TypeMethod && name == ENTRY_POINT_NAME;
        if is_entry_point && member.return_type != Type::integer() {
            return Err(LinkError::InvalidEntryPoint {
                class: self.program.class(class).name.clone(),
                found: self.program.display(&member.return_type).to_string(),
                span,
            });
        }

        self.program
            .class_mut(class)
            .add_member(member)
            .map_err(|e| LinkError::from_type_error(e, span))?;

        if is_entry_point {
            if let Err(previous) = self.program.set_entry_point(EntryPoint { class, span }) {
                return Err(LinkError::DuplicateEntryPoint {
                    class: self.program.class(class).name.clone(),
                    previous: self.program.class(previous.class).name.clone(),
                    span,
                });
            }
        }
        Ok(())
    }

    fn close_class(&mut self, class: ClassId, decl: &ClassDecl) {
        let definition = self.program.class(class);
        if let Some(missing) = definition.pending_required.iter().next() {
            let error = LinkError::MissingRequiredInitializer {
                class: definition.name.clone(),
                initializer: missing.clone(),
                span: decl.span,
            };
            self.fail(class, error);
            return;
        }
        if !definition.instance_variables.is_empty() && definition.initializers.is_empty() {
            self.diagnostics.warning(LinkWarning::InstanceVariablesWithoutInitializers {
                class: definition.name.clone(),
                count: definition.instance_variables.len(),
                span: decl.span,
            });
        }
    }
}

fn add_generics(
    generics: &mut glyph_types::GenericParameters,
    owner: &str,
    decls: &[GenericDecl],
) -> Result<(), TypeError> {
    for g in decls {
        generics.add(owner, &g.name, Type::something())?;
    }
    Ok(())
}

fn body(decl: &BodyDecl) -> Body {
    match decl {
        BodyDecl::Native => Body::Native,
        BodyDecl::Code {
            locals,
            code,
            literals,
        } => Body::Code {
            locals: *locals,
            code: code.clone(),
            literals: literals.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_names() {
        assert!(is_reserved_name("🍇"));
        assert!(is_reserved_name("🐕🐕"));
        assert!(!is_reserved_name("🔢"));
        assert!(!is_reserved_name(""));
    }
}
