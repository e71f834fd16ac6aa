//! VTI assignment
//!
//! Numbers the method, type-method and initializer tables of one class.
//! The superclass must already be numbered: its next free slots seed the
//! class's counters, and overriding members reuse the superclass's slots.

use glyph_types::{ClassId, Member, MemberKind, Program, TypeContext};
use tracing::{debug, trace};

use crate::diagnostic::Diagnostics;
use crate::error::{kind_label, LinkError, LinkWarning, OverrideProblem, Promise};

/// Slot counters of one class after numbering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableSizes {
    /// Method table size
    pub methods: u16,
    /// Type-method table size
    pub type_methods: u16,
    /// Initializer table size
    pub initializers: u16,
}

/// Assign VTIs to every own member of `class`, seal its tables and record
/// the link state. Stops at the first error.
pub fn assign_vtis(program: &mut Program, class: ClassId, diagnostics: &mut Diagnostics) -> Result<TableSizes, LinkError> {
    let superclass = program.superclass(class);
    let seed = superclass.map_or_else(TableSizes::default, |s| {
        let link = &program.class(s).link;
        TableSizes {
            methods: link.next_method_vti,
            type_methods: link.next_type_method_vti,
            initializers: link.next_initializer_vti,
        }
    });

    let (method_vtis, methods) = number_members(program, class, MemberKind::Method, seed.methods, diagnostics)?;
    let (type_method_vtis, type_methods) =
        number_members(program, class, MemberKind::TypeMethod, seed.type_methods, diagnostics)?;

    let definition = program.class(class);
    let inherits_initializers =
        definition.instance_variables.is_empty() && definition.initializers.is_empty();
    let (initializer_vtis, initializers) = if inherits_initializers {
        (Vec::new(), seed.initializers)
    } else {
        number_initializers(program, class)?
    };

    let instance_variable_total =
        program.inherited_instance_variables(class) + program.class(class).instance_variables.len();

    let definition = program.class_mut(class);
    apply(definition.table_mut(MemberKind::Method), &method_vtis);
    apply(definition.table_mut(MemberKind::TypeMethod), &type_method_vtis);
    apply(definition.table_mut(MemberKind::Initializer), &initializer_vtis);

    let span = definition.span;
    let seal = |result: Result<(), glyph_types::TypeError>| {
        result.map_err(|e| LinkError::from_type_error(e, span))
    };
    seal(definition.methods.seal(methods))?;
    seal(definition.type_methods.seal(type_methods))?;
    seal(definition.initializers.seal(initializers))?;

    let link = &mut definition.link;
    link.next_method_vti = methods;
    link.next_type_method_vti = type_methods;
    link.next_initializer_vti = initializers;
    link.inherits_initializers = inherits_initializers;
    link.instance_variable_total = instance_variable_total as u16;
    link.assigned = true;

    debug!(
        class = %definition.name,
        methods,
        type_methods,
        initializers,
        inherits_initializers,
        "assigned VTIs"
    );
    Ok(TableSizes {
        methods,
        type_methods,
        initializers,
    })
}

fn apply(table: &mut glyph_types::MemberTable, vtis: &[u16]) {
    for (member, vti) in table.iter_mut().zip(vtis) {
        member.vti = Some(*vti);
    }
}

/// Number methods or type-level methods. Returns the VTIs in declaration
/// order and the table size.
fn number_members(
    program: &Program,
    class: ClassId,
    kind: MemberKind,
    mut next: u16,
    diagnostics: &mut Diagnostics,
) -> Result<(Vec<u16>, u16), LinkError> {
    let definition = program.class(class);
    let superclass = program.superclass(class);
    let mut vtis = Vec::with_capacity(definition.table(kind).len());

    for member in definition.table(kind).iter() {
        let overridden = superclass.and_then(|s| program.lookup_member(s, kind, &member.name));
        let problem = match overridden {
            Some(_) if !member.is_override => Some(OverrideProblem::MissingAttribute),
            Some(parent) if parent.is_final => Some(OverrideProblem::FinalMember),
            None if member.is_override => Some(OverrideProblem::NothingToOverride),
            _ => None,
        };
        if let Some(problem) = problem {
            return Err(LinkError::InvalidOverride {
                class: definition.name.clone(),
                member: member.name.clone(),
                kind: kind_label(kind),
                problem,
                span: member.span,
            });
        }

        let vti = match overridden.and_then(|parent| parent.vti.map(|vti| (parent, vti))) {
            Some((parent, vti)) => {
                check_promise(program, class, member, parent)?;
                if parent.deprecated {
                    diagnostics.warning(LinkWarning::OverridesDeprecated {
                        class: definition.name.clone(),
                        member: member.name.clone(),
                        kind: kind.describe(),
                        span: member.span,
                    });
                }
                vti
            }
            None => {
                let vti = next;
                next = next.checked_add(1).ok_or_else(|| table_overflow(definition.span, kind))?;
                vti
            }
        };
        trace!(class = %definition.name, member = %member.name, kind = kind.describe(), vti, "slot");
        vtis.push(vti);
    }
    Ok((vtis, next))
}

/// Number initializers. Required initializers occupy the low slots: the
/// superclass's required initializers keep their slots, newly required
/// ones follow, and all other initializers come after the required range.
fn number_initializers(program: &Program, class: ClassId) -> Result<(Vec<u16>, u16), LinkError> {
    let definition = program.class(class);
    let superclass = program.superclass(class);
    let inherited_required = superclass.map_or(0, |s| program.class(s).required_initializers.len());
    let newly_required = definition
        .initializers
        .iter()
        .filter(|init| init.required && !inherited_slot(program, superclass, init))
        .count();
    let required_total = inherited_required + newly_required;
    if required_total > u16::MAX as usize {
        return Err(table_overflow(definition.span, MemberKind::Initializer));
    }

    let mut next_required = inherited_required as u16;
    let mut next = required_total as u16;
    let mut vtis = Vec::with_capacity(definition.initializers.len());
    for init in definition.initializers.iter() {
        let redeclares_final = superclass
            .and_then(|s| program.lookup_initializer(s, &init.name))
            .map_or(false, |parent| parent.is_final);
        if redeclares_final {
            return Err(LinkError::InvalidOverride {
                class: definition.name.clone(),
                member: init.name.clone(),
                kind: kind_label(MemberKind::Initializer),
                problem: OverrideProblem::FinalMember,
                span: init.span,
            });
        }
        let parent = superclass
            .and_then(|s| program.lookup_initializer(s, &init.name))
            .filter(|parent| parent.required);
        let vti = match parent.and_then(|p| p.vti.map(|vti| (p, vti))) {
            Some((parent, vti)) if init.required => {
                check_promise(program, class, init, parent)?;
                vti
            }
            _ if init.required => {
                let vti = next_required;
                next_required += 1;
                vti
            }
            _ => {
                let vti = next;
                next = next
                    .checked_add(1)
                    .ok_or_else(|| table_overflow(definition.span, MemberKind::Initializer))?;
                vti
            }
        };
        trace!(class = %definition.name, initializer = %init.name, required = init.required, vti, "slot");
        vtis.push(vti);
    }
    Ok((vtis, next))
}

/// Whether a required initializer reuses a required superclass slot
fn inherited_slot(program: &Program, superclass: Option<ClassId>, init: &Member) -> bool {
    superclass
        .and_then(|s| program.lookup_initializer(s, &init.name))
        .map_or(false, |parent| parent.required)
}

fn table_overflow(span: Option<glyph_types::Span>, kind: MemberKind) -> LinkError {
    LinkError::SerializationLimitExceeded {
        what: match kind {
            MemberKind::Method => "methods",
            MemberKind::TypeMethod => "type methods",
            MemberKind::Initializer => "initializers",
        },
        limit: u16::MAX as usize,
        actual: u16::MAX as usize + 1,
        span,
    }
}

/// An overriding member must accept everything the overridden member
/// accepts and return nothing it could not return. Types of the overridden
/// member are read as seen from the overriding class.
pub(crate) fn check_promise(program: &Program, class: ClassId, member: &Member, parent: &Member) -> Result<(), LinkError> {
    let definition = program.class(class);
    let ctx = TypeContext::new(definition.self_type()).with_method(&member.generics);
    let violation = |promise, expected: String, found: String| {
        let superclass = match parent.declared_in {
            glyph_types::TypeDefId::Class(id) => program.class(id).name.clone(),
            other => program.type_name(other).to_string(),
        };
        LinkError::PromiseViolation {
            class: definition.name.clone(),
            superclass,
            member: member.name.clone(),
            kind: kind_label(member.kind),
            promise,
            expected,
            found,
            span: member.span,
        }
    };

    if member.kind == MemberKind::Initializer {
        if member.can_return_nothing && !parent.can_return_nothing {
            return Err(violation(
                Promise::ReturnType,
                program.display(&definition.self_type()).to_string(),
                format!("🍬{}", program.display(&definition.self_type())),
            ));
        }
    } else {
        let expected = program.resolve_on(&parent.return_type, &ctx);
        if !program.compatible(&member.return_type, &expected, &ctx) {
            return Err(violation(
                Promise::ReturnType,
                program.display(&expected).to_string(),
                program.display(&member.return_type).to_string(),
            ));
        }
    }

    if member.arguments.len() != parent.arguments.len() {
        return Err(violation(
            Promise::ArgumentCount,
            parent.arguments.len().to_string(),
            member.arguments.len().to_string(),
        ));
    }

    for (index, (own, inherited)) in member.argument_types().zip(parent.argument_types()).enumerate() {
        let expected = program.resolve_on(inherited, &ctx);
        if !program.compatible(&expected, own, &ctx) {
            return Err(violation(
                Promise::Argument(index),
                program.display(&expected).to_string(),
                program.display(own).to_string(),
            ));
        }
    }
    Ok(())
}
