//! Integration tests for qrda-qpp
//!
//! These tests run the full pipeline from QRDA III XML on disk to QPP JSON.

use qrda_qpp::converter::{ConversionOptions, Converter};
use qrda_qpp::encode::METADATA_HOLDER;
use qrda_qpp::error::ConversionError;
use qrda_qpp::model::TemplateId;
use qrda_qpp::source::Source;
use qrda_qpp::validation::ConversionReport;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn valid_xml() -> String {
    fs::read_to_string(fixture("valid-qrda-iii.xml")).unwrap()
}

fn convert_text(xml: &str) -> Result<ConversionReport, ConversionError> {
    Converter::new(Source::from_bytes("edited.xml", xml)).convert()
}

fn contains_key(value: &Value, key: &str) -> bool {
    match value {
        Value::Object(map) => map.contains_key(key) || map.values().any(|v| contains_key(v, key)),
        Value::Array(list) => list.iter().any(|v| contains_key(v, key)),
        _ => false,
    }
}

/// The valid fixture converts to exactly the expected QPP document
#[test]
fn test_valid_fixture_round_trip() {
    let source = Source::from_path(&fixture("valid-qrda-iii.xml")).unwrap();
    let report = Converter::new(source).convert().unwrap();

    assert!(report.is_success(), "unexpected problems:\n{}", report);
    assert_eq!(report.warning_count(), 0);
    assert_eq!(report.source_name(), "valid-qrda-iii.xml");

    let expected = fs::read_to_string(fixture("valid-qrda-iii.qpp.json")).unwrap();
    let rendered = report.qpp().to_json_string().unwrap();
    assert_eq!(rendered, expected.trim_end());

    let expected: Value = serde_json::from_str(&expected).unwrap();
    assert_eq!(report.qpp().to_value(), expected);
}

/// Metadata is present internally and gone from the submission
#[test]
fn test_metadata_is_stripped_from_output() {
    let report = convert_text(&valid_xml()).unwrap();
    assert!(contains_key(&report.encoded().to_value(), METADATA_HOLDER));
    assert!(!contains_key(&report.qpp().to_value(), METADATA_HOLDER));
}

/// Output is re-readable through a Source
#[test]
fn test_output_as_source() {
    let report = convert_text(&valid_xml()).unwrap();
    let source = report.qpp().to_source().unwrap();
    assert_eq!(source.name(), "QPP");
    let reparsed: Value = serde_json::from_slice(source.bytes()).unwrap();
    assert_eq!(reparsed["performanceYear"], 2017);
}

/// A bad count is reported with its location and kept verbatim
#[test]
fn test_invalid_count_is_reported() {
    let xml = valid_xml().replace(r#"value="600""#, r#"value="six hundred""#);
    let report = convert_text(&xml).unwrap();

    assert!(report.has_errors());
    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors.len(), 1);
    let detail = errors[0];
    assert_eq!(detail.value.as_deref(), Some("six hundred"));
    assert_eq!(detail.template.as_deref(), Some("ACI_AGGREGATE_COUNT"));
    assert!(detail.line.is_some());
    assert!(detail.path.contains("local-name()='observation'"));

    let qpp = report.qpp().to_value();
    assert_eq!(
        qpp["measurementSets"][0]["measurements"][0]["value"]["numerator"],
        "six hundred"
    );

    let errors = report.errors_json().unwrap().to_value();
    assert_eq!(errors["errors"][0]["sourceIdentifier"], "edited.xml");
    assert_eq!(errors["errors"][0]["details"][0]["value"], "six hundred");
}

/// Missing header data fails node validation but still encodes
#[test]
fn test_missing_tin_fails_validation() {
    let xml = valid_xml().replace(r#"extension="123456789""#, "");
    let report = convert_text(&xml).unwrap();

    assert!(report.has_errors());
    assert!(report
        .errors()
        .any(|d| d.message.contains("taxpayer identification number")));
    assert!(report.qpp().get_value("taxpayerIdentificationNumber").is_none());

    let options = ConversionOptions {
        skip_validation: true,
        ..Default::default()
    };
    let skipped = Converter::new(Source::from_bytes("edited.xml", xml))
        .with_options(options)
        .convert()
        .unwrap();
    assert!(skipped.is_success());
}

/// An unknown template aborts the conversion unless tolerated
#[test]
fn test_unknown_template() {
    let xml = valid_xml().replace(
        r#"<templateId root="2.16.840.1.113883.10.20.27.3.33" extension="2017-06-01"/>"#,
        r#"<templateId root="2.16.840.1.113883.10.20.27.3.99" extension="2017-06-01"/>"#,
    );

    match convert_text(&xml).unwrap_err() {
        ConversionError::UnknownTemplate { root, line, .. } => {
            assert_eq!(root, "2.16.840.1.113883.10.20.27.3.99");
            assert!(line > 0);
        }
        other => panic!("unexpected error: {}", other),
    }

    let options = ConversionOptions {
        allow_unknown_templates: true,
        ..Default::default()
    };
    let report = Converter::new(Source::from_bytes("edited.xml", xml))
        .with_options(options)
        .convert()
        .unwrap();
    assert_eq!(report.warning_count(), 1);
    // the IA section lost its only measure
    assert!(report.has_errors());
}

/// A well-formed document that is not a QRDA III report is rejected
#[test]
fn test_wrong_document_type() {
    let xml = valid_xml().replace(
        r#"<templateId root="2.16.840.1.113883.10.20.27.1.2" extension="2017-07-01"/>"#,
        "",
    );
    let err = convert_text(&xml).unwrap_err();
    assert!(matches!(
        err,
        ConversionError::NotQrdaDocument {
            found: TemplateId::Placeholder,
            ..
        }
    ));
}

/// Truncated XML is a hard failure, never a panic
#[test]
fn test_truncated_document() {
    let xml = valid_xml();
    let truncated = &xml[..xml.len() / 2];
    assert!(convert_text(truncated).is_err());
}

/// Decoding alone produces the node tree
#[test]
fn test_decode_tree_shape() {
    let root = Converter::new(Source::from_bytes("tree.xml", valid_xml()))
        .decode()
        .unwrap();

    assert_eq!(root.template(), TemplateId::ClinicalDocument);
    let sections: Vec<_> = root.children().iter().map(|c| c.template()).collect();
    assert_eq!(
        sections,
        vec![
            TemplateId::AciSection,
            TemplateId::IaSection,
            TemplateId::MeasureSection
        ]
    );
    assert_eq!(root.find_nodes(TemplateId::AggregateCount).len(), 7);
    assert!(root.find_first_node(TemplateId::SexSupplementalData).is_none());
    assert!(root.find_first_node(TemplateId::PerformanceRate).is_none());
    assert_eq!(root.source_path(), Some("tree.xml"));
}

/// Sources read from disk keep their file name
#[test]
fn test_source_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("copied.xml");
    fs::write(&path, valid_xml()).unwrap();

    let report = Converter::new(Source::from_path(&path).unwrap())
        .convert()
        .unwrap();
    assert_eq!(report.source_name(), "copied.xml");
    assert!(report.to_string().contains("Source: copied.xml"));
}

/// Overlapping populations are rejected and no negative count is derived
#[test]
fn test_numerator_above_denominator() {
    let xml = valid_xml().replace(r#"value="500""#, r#"value="5000""#);
    let report = convert_text(&xml).unwrap();

    assert!(report.has_errors());
    assert!(report
        .errors()
        .any(|d| d.message.contains("must not exceed the eligible population")));

    let qpp = report.qpp().to_value();
    let quality = &qpp["measurementSets"][2]["measurements"][0]["value"];
    assert_eq!(quality["performanceMet"], 5000);
    assert!(quality.get("performanceNotMet").is_none());
}

/// Pathologically deep nesting is rejected instead of exhausting the stack
#[test]
fn test_deeply_nested_document() {
    let xml = format!("{}{}", "<a>".repeat(3000), "</a>".repeat(3000));
    let err = convert_text(&xml).unwrap_err();
    assert!(matches!(err, ConversionError::Malformed { .. }));
}
