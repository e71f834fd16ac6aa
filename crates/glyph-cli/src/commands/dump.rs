use std::path::Path;

use anyhow::Context;
use glyph_bytecode::MetadataImage;

pub fn execute(file: &Path, json: bool) -> anyhow::Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("cannot read {}", file.display()))?;
    let image = MetadataImage::decode(&bytes)
        .with_context(|| format!("{} is not a valid metadata image", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&image)?);
    } else {
        println!("{}", image);
    }
    Ok(())
}
