//! Protocol conformance checking
//!
//! For every protocol a class declares, each protocol method must be
//! implemented with a compatible signature. The VTIs of the implementing
//! methods, in protocol declaration order, form the class's dispatch table
//! for that protocol.

use glyph_types::{ClassId, Program, TypeContext};
use tracing::debug;

use crate::error::{ConformanceProblem, LinkError};

/// Check every conformance `class` declares and record its dispatch tables.
/// The class's methods must already be numbered. Stops at the first error.
pub fn check_conformances(program: &mut Program, class: ClassId) -> Result<(), LinkError> {
    let tables = program
        .class(class)
        .conformances
        .iter()
        .enumerate()
        .map(|(position, _)| dispatch_table(program, class, position))
        .collect::<Result<Vec<_>, _>>()?;

    let definition = program.class_mut(class);
    for (conformance, vtis) in definition.conformances.iter_mut().zip(tables) {
        conformance.vtis = vtis;
    }
    definition.link.conformance_checked = true;
    debug!(
        class = %definition.name,
        conformances = definition.conformances.len(),
        "checked conformances"
    );
    Ok(())
}

fn dispatch_table(program: &Program, class: ClassId, position: usize) -> Result<Vec<u16>, LinkError> {
    let definition = program.class(class);
    let conformance = &definition.conformances[position];
    let protocol = program.protocol(conformance.protocol);
    let as_protocol = TypeContext::new(conformance.ty.clone());

    let violation = |method: &str, problem, span| LinkError::ConformanceViolation {
        class: definition.name.clone(),
        protocol: protocol.name.clone(),
        method: method.to_string(),
        problem,
        span,
    };

    let mut vtis = Vec::with_capacity(protocol.methods.len());
    for required in protocol.methods.iter() {
        let Some(implementation) = program.lookup_method(class, &required.name) else {
            return Err(violation(
                &required.name,
                ConformanceProblem::MissingMethod,
                conformance.span,
            ));
        };
        let span = implementation.span.or(conformance.span);
        let as_class =
            TypeContext::new(definition.self_type()).with_method(&implementation.generics);

        if implementation.arguments.len() != required.arguments.len() {
            return Err(violation(
                &required.name,
                ConformanceProblem::ArgumentCount {
                    expected: required.arguments.len(),
                    found: implementation.arguments.len(),
                },
                span,
            ));
        }

        let expected = program.resolve_on(&required.return_type, &as_protocol);
        let found = program.resolve_on(&implementation.return_type, &as_class);
        if !program.compatible(&found, &expected, &as_class) {
            return Err(violation(
                &required.name,
                ConformanceProblem::ReturnType {
                    expected: program.display(&expected).to_string(),
                    found: program.display(&found).to_string(),
                },
                span,
            ));
        }

        for (index, (wanted, given)) in required
            .argument_types()
            .zip(implementation.argument_types())
            .enumerate()
        {
            let expected = program.resolve_on(wanted, &as_protocol);
            let found = program.resolve_on(given, &as_class);
            if !program.compatible(&expected, &found, &as_class) {
                return Err(violation(
                    &required.name,
                    ConformanceProblem::Argument {
                        index,
                        expected: program.display(&expected).to_string(),
                        found: program.display(&found).to_string(),
                    },
                    span,
                ));
            }
        }

        match implementation.vti {
            Some(vti) => vtis.push(vti),
            None => {
                return Err(LinkError::from_type_error(
                    glyph_types::TypeError::UnassignedVti {
                        name: implementation.name.clone(),
                    },
                    span,
                ))
            }
        }
    }
    Ok(vtis)
}
