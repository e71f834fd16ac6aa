use glyph_types::{ClassId, Program};
use rustc_hash::FxHashSet;
use tracing::{info, info_span};

use crate::conformance::check_conformances;
use crate::decl::ProgramDecl;
use crate::declare::Declarer;
use crate::diagnostic::Diagnostics;
use crate::vti::assign_vtis;

/// Linker settings
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkOptions {
    /// Fail when any warning is reported
    pub warnings_as_errors: bool,
}

/// Fully linked program, ready for serialization
#[derive(Debug)]
pub struct LinkedProgram {
    /// The linked type model
    pub program: Program,
    /// Warnings found while linking
    pub diagnostics: Diagnostics,
}

/// Runs declaration processing, VTI assignment and conformance checking
#[derive(Debug, Clone, Default)]
pub struct Linker {
    options: LinkOptions,
}

impl Linker {
    /// Linker with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Linker with the given options
    pub fn with_options(options: LinkOptions) -> Self {
        Self { options }
    }

    /// Link a parsed program. Errors are collected across independent
    /// declarations; any error means no program is returned.
    pub fn link(&self, decl: &ProgramDecl) -> Result<LinkedProgram, Diagnostics> {
        let mut diagnostics = Diagnostics::new();

        let declared = {
            let _span = info_span!("declare", packages = decl.packages.len()).entered();
            Declarer::new(decl, &mut diagnostics).run()
        };
        let mut program = declared.program;
        let mut failed = declared.failed;

        let order = program.classes_in_dependency_order();
        {
            let _span = info_span!("assign_vtis", classes = order.len()).entered();
            for &class in &order {
                if skip(&program, &mut failed, class) {
                    continue;
                }
                if let Err(error) = assign_vtis(&mut program, class, &mut diagnostics) {
                    diagnostics.error(error);
                    failed.insert(class);
                }
            }
        }

        {
            let _span = info_span!("check_conformances").entered();
            for &class in &order {
                if skip(&program, &mut failed, class) {
                    continue;
                }
                if let Err(error) = check_conformances(&mut program, class) {
                    diagnostics.error(error);
                    failed.insert(class);
                }
            }
        }

        let rejected = diagnostics.has_errors()
            || (self.options.warnings_as_errors && !diagnostics.warnings().is_empty());
        info!(
            classes = program.classes().len(),
            protocols = program.protocols().len(),
            errors = diagnostics.errors().len(),
            warnings = diagnostics.warnings().len(),
            "link finished"
        );
        if rejected {
            return Err(diagnostics);
        }
        Ok(LinkedProgram {
            program,
            diagnostics,
        })
    }
}

/// Whether a class or one of its ancestors already failed
fn skip(program: &Program, failed: &mut FxHashSet<ClassId>, class: ClassId) -> bool {
    if failed.contains(&class) {
        return true;
    }
    if program.ancestors(class).any(|ancestor| failed.contains(&ancestor)) {
        failed.insert(class);
        return true;
    }
    false
}
