use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use qrda_qpp::converter::Converter;
use qrda_qpp::source::Source;

use super::Config;

/// `report.xml` → `report-<suffix>.json` in the same directory
fn sibling_json(path: &Path, stem_of: &Path, suffix: &str) -> PathBuf {
    let stem = stem_of.file_stem().unwrap_or_default().to_string_lossy();
    path.with_file_name(format!("{}-{}.json", stem, suffix))
}

/// Convert a QRDA III file to QPP JSON
pub fn run(
    input: PathBuf,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    allow_unknown_templates: bool,
    skip_validation: bool,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let config = match &config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let options = config
        .conversion
        .resolve(allow_unknown_templates, skip_validation);

    let output = output.unwrap_or_else(|| sibling_json(&input, &input, "qpp"));
    let error_output = sibling_json(&output, &input, "error");

    info!("qrda-qpp - QRDA III to QPP JSON");
    info!("===============================");
    info!("Input:  {}", input.display());
    info!("Output: {}", output.display());
    if options.allow_unknown_templates {
        info!("Unknown templates: tolerated");
    }
    if options.skip_validation {
        info!("Node validation: skipped");
    }

    let source = Source::from_path(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let report = Converter::new(source)
        .with_options(options)
        .convert()
        .with_context(|| format!("Conversion of {} failed", input.display()))?;

    println!("{}", report.format_colored());

    if report.is_success() {
        let json = report.qpp().to_json_string()?;
        std::fs::write(&output, json)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        info!("Wrote {}", output.display());
        Ok(())
    } else {
        let json = report.errors_json()?.to_json_string()?;
        std::fs::write(&error_output, json)
            .with_context(|| format!("Failed to write {}", error_output.display()))?;
        eprintln!("Conversion failed, details written to {}", error_output.display());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_names() {
        let input = Path::new("/data/report.xml");
        assert_eq!(
            sibling_json(input, input, "qpp"),
            PathBuf::from("/data/report-qpp.json")
        );

        let output = Path::new("/out/custom.json");
        assert_eq!(
            sibling_json(output, input, "error"),
            PathBuf::from("/out/report-error.json")
        );
    }
}
