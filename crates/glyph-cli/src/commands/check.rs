use std::path::{Path, PathBuf};

use glyph_link::LinkOptions;
use termcolor::ColorChoice;

use crate::config::Config;
use crate::output::StyledOutput;

pub fn execute(
    input: &Path,
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
    match super::link_and_report(&loaded, options, &mut out) {
        Some(_) => Ok(()),
        None => anyhow::bail!("{} failed to link", input.display()),
    }
}
