use anyhow::{Context, Result};
use std::path::PathBuf;

use qrda_qpp::converter::{ConversionOptions, Converter};
use qrda_qpp::source::Source;

/// Print the decoded node tree of a QRDA III file
pub fn run(input: PathBuf, allow_unknown_templates: bool) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("File does not exist: {}", input.display());
    }

    let source = Source::from_path(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let size = source.len();
    let options = ConversionOptions {
        allow_unknown_templates,
        ..Default::default()
    };
    let root = Converter::new(source)
        .with_options(options)
        .decode()
        .with_context(|| format!("Failed to decode {}", input.display()))?;

    println!("QRDA III Node Tree");
    println!("==================");
    println!("File: {} ({} bytes)", input.display(), size);
    println!();
    print!("{}", root);

    Ok(())
}
