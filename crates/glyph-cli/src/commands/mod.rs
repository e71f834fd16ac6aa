//! Subcommand implementations

pub mod check;
pub mod dump;
pub mod link;

use std::path::Path;

use anyhow::Context;
use glyph_link::diagnostic::{create_files, SourceFiles};
use glyph_link::{Diagnostics, LinkOptions, LinkedProgram, Linker, ProgramDecl};

use crate::output::{print_summary, StyledOutput};

/// Parsed declarations plus the sources their spans point into
pub struct Loaded {
    pub decl: ProgramDecl,
    pub files: SourceFiles,
    pub file_count: usize,
}

/// Read a declaration file and every source file it references. Source
/// paths are relative to the declaration file; unreadable sources are
/// registered empty so spans keep their file indices.
pub fn load(input: &Path) -> anyhow::Result<Loaded> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("cannot read {}", input.display()))?;
    let decl = ProgramDecl::from_json(&text)
        .with_context(|| format!("invalid declarations in {}", input.display()))?;

    let base = input.parent().unwrap_or_else(|| Path::new(""));
    let sources: Vec<(String, String)> = decl
        .sources
        .iter()
        .map(|source| {
            let content = std::fs::read_to_string(base.join(&source.path)).unwrap_or_else(|error| {
                tracing::warn!(path = %source.path, %error, "source file unavailable");
                String::new()
            });
            (source.path.clone(), content)
        })
        .collect();
    let file_count = sources.len();
    tracing::debug!(packages = decl.packages.len(), files = file_count, "loaded declarations");

    Ok(Loaded {
        decl,
        files: create_files(sources),
        file_count,
    })
}

/// Link and report every diagnostic. Returns the program when linking
/// succeeded.
pub fn link_and_report(
    loaded: &Loaded,
    options: LinkOptions,
    out: &mut StyledOutput,
) -> Option<LinkedProgram> {
    let result = Linker::with_options(options).link(&loaded.decl);
    let (diagnostics, classes) = match &result {
        Ok(linked) => (&linked.diagnostics, linked.program.classes().len()),
        Err(diagnostics) => (diagnostics, 0),
    };
    report(diagnostics, loaded, out);
    print_summary(out, classes, diagnostics.errors().len(), diagnostics.warnings().len());
    result.ok()
}

fn report(diagnostics: &Diagnostics, loaded: &Loaded, out: &mut StyledOutput) {
    if diagnostics.emit(out.stream(), &loaded.files, loaded.file_count).is_ok() {
        return;
    }
    // Spans that no longer fit their source; fall back to bare messages.
    for error in diagnostics.errors() {
        out.error("error");
        out.plain(&format!(": {}", error));
        out.newline();
    }
    for warning in diagnostics.warnings() {
        out.warning("warning");
        out.plain(&format!(": {}", warning));
        out.newline();
    }
}
