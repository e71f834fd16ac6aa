use std::path::{Path, PathBuf};

use anyhow::Context;
use glyph_bytecode::{serialize, SerializeOptions};
use glyph_link::LinkOptions;
use termcolor::ColorChoice;

use crate::config::Config;
use crate::output::StyledOutput;

/// Extension of metadata images
pub const IMAGE_EXTENSION: &str = "glyphc";

pub fn execute(
    input: &Path,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    warnings_as_errors: bool,
    color: ColorChoice,
) -> anyhow::Result<()> {
    let config = Config::load(config.as_deref())?;
    let loaded = super::load(input)?;
    let options = LinkOptions {
        warnings_as_errors: warnings_as_errors || config.link.warnings_as_errors,
    };

    let mut out = StyledOutput::new(color);
    let Some(linked) = super::link_and_report(&loaded, options, &mut out) else {
        anyhow::bail!("{} failed to link", input.display());
    };

    let bytes = serialize(
        &linked.program,
        &SerializeOptions {
            version: config.format.version,
        },
    )
    .context("cannot serialize program")?;

    let path = output
        .or(config.link.output)
        .unwrap_or_else(|| input.with_extension(IMAGE_EXTENSION));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    std::fs::write(&path, &bytes).with_context(|| format!("cannot write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote metadata image");

    out.success("Wrote");
    out.plain(&format!(" {} ({} bytes)", path.display(), bytes.len()));
    out.newline();
    Ok(())
}
