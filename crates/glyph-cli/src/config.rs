//! `glyph.toml` settings
//!
//! ```toml
//! [link]
//! output = "build/app.glyphc"
//! warnings-as-errors = true
//!
//! [format]
//! version = 3
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use glyph_bytecode::DEFAULT_VERSION;
use serde::Deserialize;

/// Name of the configuration file searched for
pub const CONFIG_FILE: &str = "glyph.toml";

/// Parsed configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub link: LinkSection,
    pub format: FormatSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct LinkSection {
    /// Where `glyph link` writes the image when `-o` is not given
    pub output: Option<PathBuf>,
    pub warnings_as_errors: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatSection {
    pub version: u8,
}

impl Default for FormatSection {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION,
        }
    }
}

impl Config {
    /// Parse configuration text
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load `explicit` if given, else the nearest `glyph.toml` above the
    /// current directory, else defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match find_config() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let config = Self::parse(&text).with_context(|| format!("invalid {}", path.display()))?;
        tracing::debug!(path = %path.display(), ?config, "loaded configuration");
        Ok(config)
    }
}

/// Walk up from CWD to find `glyph.toml`.
fn find_config() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.format.version, 3);
        assert!(!config.link.warnings_as_errors);
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
            [link]
            output = "out/app.glyphc"
            warnings-as-errors = true

            [format]
            version = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.link.output, Some(PathBuf::from("out/app.glyphc")));
        assert!(config.link.warnings_as_errors);
        assert_eq!(config.format.version, 4);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Config::parse("[link]\nwarnings_as_errors = true\n").is_err());
        assert!(Config::parse("[format]\nversion = 300\n").is_err());
    }

    #[test]
    fn test_explicit_missing_file() {
        let error = Config::load(Some(Path::new("/nonexistent/glyph.toml"))).unwrap_err();
        assert!(error.to_string().contains("cannot read"));
    }
}
