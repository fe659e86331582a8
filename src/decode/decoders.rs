//! The QRDA Category III decoders, one per template.

use super::{DecodeResult, DecoderRegistry};
use crate::error::Result;
use crate::model::fields;
use crate::model::{Node, TemplateId};
use crate::xml::XmlElement;

/// OID of the program name identifier on the intended recipient
const PROGRAM_NAME_ROOT: &str = "2.16.840.1.113883.3.249.7";
/// OID of taxpayer identification numbers
const TIN_ROOT: &str = "2.16.840.1.113883.4.2";
/// OID of national provider identifiers
const NPI_ROOT: &str = "2.16.840.1.113883.4.6";

const RECIPIENT_ID: &[&str] = &["informationRecipient", "intendedRecipient", "id"];
const PERFORMER_ID: &[&str] = &["documentationOf", "serviceEvent", "performer", "assignedEntity", "id"];
const ORGANIZATION_ID: &[&str] = &[
    "documentationOf",
    "serviceEvent",
    "performer",
    "assignedEntity",
    "representedOrganization",
    "id",
];
const SERVICE_START: &[&str] = &["documentationOf", "serviceEvent", "effectiveTime", "low"];
const MEASURE_REFERENCE_ID: &[&str] = &["reference", "externalDocument", "id"];

pub(super) fn builtin() -> DecoderRegistry {
    let mut registry = DecoderRegistry::new();
    registry.register(TemplateId::ClinicalDocument, clinical_document);
    registry.register(TemplateId::AciSection, SectionDecoder { category: "aci" });
    registry.register(TemplateId::IaSection, SectionDecoder { category: "ia" });
    registry.register(TemplateId::MeasureSection, SectionDecoder { category: "quality" });
    registry.register(TemplateId::ReportingParametersAct, reporting_parameters);
    registry.register(TemplateId::AciNumeratorDenominator, measure_id);
    registry.register(TemplateId::AciMeasurePerformed, measure_id);
    registry.register(TemplateId::IaMeasure, measure_id);
    registry.register(TemplateId::MeasureReferenceResults, measure_id);
    registry.register(TemplateId::AciNumerator, container);
    registry.register(TemplateId::AciDenominator, container);
    registry.register(TemplateId::MeasurePerformed, measure_performed);
    registry.register(TemplateId::MeasureData, measure_data);
    registry.register(TemplateId::AggregateCount, aggregate_count);
    for template in TemplateId::ALL.iter().filter(|t| t.is_ignorable()) {
        registry.register(*template, NullReturnDecoder);
    }
    registry
}

fn put_if_present(node: &mut Node, field: &str, value: Option<&str>) {
    if let Some(value) = value {
        node.put_value(field, value);
    }
}

/// Elements that carry nothing for the output; they disappear with their subtree.
pub struct NullReturnDecoder;

impl super::Decoder for NullReturnDecoder {
    fn decode(&self, _element: &XmlElement, _node: &mut Node) -> Result<DecodeResult> {
        Ok(DecodeResult::Elided)
    }
}

/// A measurement set section; the category is fixed per template.
pub struct SectionDecoder {
    category: &'static str,
}

impl super::Decoder for SectionDecoder {
    fn decode(&self, _element: &XmlElement, node: &mut Node) -> Result<DecodeResult> {
        node.put_value(fields::CATEGORY, self.category);
        node.put_value(fields::SUBMISSION_METHOD, fields::ELECTRONIC_HEALTH_RECORD);
        Ok(DecodeResult::TreeContinue)
    }
}

fn clinical_document(element: &XmlElement, node: &mut Node) -> Result<DecodeResult> {
    let program = element.find_id_attr(RECIPIENT_ID, PROGRAM_NAME_ROOT, "extension");
    put_if_present(node, fields::PROGRAM_NAME, program);
    match program {
        Some(fields::MIPS_INDIVIDUAL) => node.put_value(fields::ENTITY_TYPE, fields::ENTITY_INDIVIDUAL),
        Some(fields::MIPS_GROUP) => node.put_value(fields::ENTITY_TYPE, fields::ENTITY_GROUP),
        _ => {}
    }

    put_if_present(
        node,
        fields::TAX_ID,
        element.find_id_attr(ORGANIZATION_ID, TIN_ROOT, "extension"),
    );
    put_if_present(
        node,
        fields::NPI,
        element.find_id_attr(PERFORMER_ID, NPI_ROOT, "extension"),
    );

    let year = element
        .find_path(SERVICE_START)
        .and_then(|low| low.attr("value"))
        .and_then(|value| value.get(..4));
    put_if_present(node, fields::PERFORMANCE_YEAR, year);

    Ok(DecodeResult::TreeContinue)
}

fn reporting_parameters(element: &XmlElement, node: &mut Node) -> Result<DecodeResult> {
    let boundary = |edge: &str| {
        element
            .find_path(&["effectiveTime", edge])
            .and_then(|e| e.attr("value"))
    };
    put_if_present(node, fields::PERFORMANCE_START, boundary("low"));
    put_if_present(node, fields::PERFORMANCE_END, boundary("high"));
    Ok(DecodeResult::TreeFinished)
}

fn measure_id(element: &XmlElement, node: &mut Node) -> Result<DecodeResult> {
    let id = element
        .find_all_path(MEASURE_REFERENCE_ID)
        .into_iter()
        .find_map(|id| id.attr("extension"));
    put_if_present(node, fields::MEASURE_ID, id);
    Ok(DecodeResult::TreeContinue)
}

fn container(_element: &XmlElement, _node: &mut Node) -> Result<DecodeResult> {
    Ok(DecodeResult::TreeContinue)
}

fn value_attr<'a>(element: &'a XmlElement, attr: &str) -> Option<&'a str> {
    element.child("value").and_then(|v| v.attr(attr))
}

fn measure_performed(element: &XmlElement, node: &mut Node) -> Result<DecodeResult> {
    put_if_present(node, fields::MEASURE_PERFORMED, value_attr(element, "code"));
    Ok(DecodeResult::TreeFinished)
}

fn measure_data(element: &XmlElement, node: &mut Node) -> Result<DecodeResult> {
    put_if_present(node, fields::MEASURE_TYPE, value_attr(element, "code"));
    Ok(DecodeResult::TreeContinue)
}

fn aggregate_count(element: &XmlElement, node: &mut Node) -> Result<DecodeResult> {
    put_if_present(node, fields::AGGREGATE_COUNT, value_attr(element, "value"));
    Ok(DecodeResult::TreeFinished)
}
