//! Built-in node validation rules.

use std::collections::HashSet;

use super::{Detail, ValidatorRegistry};
use crate::encode::format::clean_string;
use crate::model::fields;
use crate::model::{Node, TemplateId};

/// Population codes a quality measure may report.
pub const POPULATION_CODES: [&str; 5] = ["IPP", "DENOM", "NUMER", "DENEX", "DENEXCEP"];

pub(super) fn builtin() -> ValidatorRegistry {
    let mut registry = ValidatorRegistry::new();
    registry.register(TemplateId::ClinicalDocument, clinical_document);
    registry.register(TemplateId::AciSection, section);
    registry.register(TemplateId::IaSection, section);
    registry.register(TemplateId::MeasureSection, section);
    registry.register(TemplateId::ReportingParametersAct, reporting_parameters);
    registry.register(TemplateId::AciNumeratorDenominator, aci_numerator_denominator);
    registry.register(TemplateId::AciNumerator, aggregate_container);
    registry.register(TemplateId::AciDenominator, aggregate_container);
    registry.register(TemplateId::AciMeasurePerformed, performed_measure);
    registry.register(TemplateId::IaMeasure, performed_measure);
    registry.register(TemplateId::MeasureReferenceResults, quality_measure);
    registry.register(TemplateId::MeasureData, measure_data);
    registry.register(TemplateId::AggregateCount, aggregate_count);
    registry
}

fn require(node: &Node, field: &str, message: &str, details: &mut Vec<Detail>) {
    let present = node
        .get_value(field)
        .is_some_and(|value| !value.trim().is_empty());
    if !present {
        details.push(Detail::for_node(node, message));
    }
}

fn clinical_document(node: &Node, details: &mut Vec<Detail>) {
    match node.get_value(fields::PROGRAM_NAME) {
        Some(fields::MIPS_INDIVIDUAL) | Some(fields::MIPS_GROUP) => {}
        Some(other) => details.push(
            Detail::for_node(node, "Clinical Document program name must be MIPS_INDIV or MIPS_GROUP")
                .with_value(other),
        ),
        None => details.push(Detail::for_node(
            node,
            "Clinical Document must have a program name",
        )),
    }

    require(
        node,
        fields::TAX_ID,
        "Clinical Document must have a taxpayer identification number",
        details,
    );
    if node.get_value(fields::ENTITY_TYPE) == Some(fields::ENTITY_INDIVIDUAL) {
        require(
            node,
            fields::NPI,
            "Clinical Document for an individual must have a national provider identifier",
            details,
        );
    }

    if !node.children().iter().any(|c| c.template().is_section()) {
        details.push(Detail::for_node(
            node,
            "Clinical Document must have at least one measure section",
        ));
    }
}

fn section(node: &Node, details: &mut Vec<Detail>) {
    if node.child_nodes(TemplateId::ReportingParametersAct).next().is_none() {
        details.push(Detail::for_node(
            node,
            "Section must have a reporting parameters act",
        ));
    }

    let measures: Vec<&Node> = node
        .children()
        .iter()
        .filter(|c| c.template().is_measure())
        .collect();
    if measures.is_empty() {
        details.push(Detail::for_node(node, "Section must have at least one measure"));
    }

    let mut seen = HashSet::new();
    for measure in measures {
        if let Some(id) = measure.get_value(fields::MEASURE_ID) {
            if !seen.insert(id) {
                details.push(
                    Detail::for_node(measure, "Measure is reported more than once in the section")
                        .with_value(id)
                        .warning(),
                );
            }
        }
    }
}

fn reporting_parameters(node: &Node, details: &mut Vec<Detail>) {
    require(
        node,
        fields::PERFORMANCE_START,
        "Reporting parameters must have a performance start",
        details,
    );
    require(
        node,
        fields::PERFORMANCE_END,
        "Reporting parameters must have a performance end",
        details,
    );
}

fn measure_id(node: &Node, details: &mut Vec<Detail>) {
    require(node, fields::MEASURE_ID, "Measure must have a measure id", details);
}

fn exactly_one(node: &Node, template: TemplateId, message: &str, details: &mut Vec<Detail>) {
    if node.child_nodes(template).count() != 1 {
        details.push(Detail::for_node(node, message));
    }
}

fn aci_numerator_denominator(node: &Node, details: &mut Vec<Detail>) {
    measure_id(node, details);
    exactly_one(
        node,
        TemplateId::AciNumerator,
        "ACI numerator/denominator measure must have exactly one numerator",
        details,
    );
    exactly_one(
        node,
        TemplateId::AciDenominator,
        "ACI numerator/denominator measure must have exactly one denominator",
        details,
    );
}

fn aggregate_container(node: &Node, details: &mut Vec<Detail>) {
    exactly_one(
        node,
        TemplateId::AggregateCount,
        "ACI numerator and denominator must have exactly one aggregate count",
        details,
    );
}

fn performed_measure(node: &Node, details: &mut Vec<Detail>) {
    measure_id(node, details);
    exactly_one(
        node,
        TemplateId::MeasurePerformed,
        "Performed measure must have exactly one measure performed observation",
        details,
    );
}

fn quality_measure(node: &Node, details: &mut Vec<Detail>) {
    measure_id(node, details);
    let reported: HashSet<&str> = node
        .child_nodes(TemplateId::MeasureData)
        .filter_map(|d| d.get_value(fields::MEASURE_TYPE))
        .collect();
    for population in ["DENOM", "NUMER"] {
        if !reported.contains(population) {
            details.push(
                Detail::for_node(node, "Quality measure must report its population")
                    .with_value(population),
            );
        }
    }

    let Some(eligible) = population_count(node, "DENOM") else {
        return;
    };
    let accounted: i64 = ["NUMER", "DENEX", "DENEXCEP"]
        .iter()
        .filter_map(|code| population_count(node, code))
        .fold(0, i64::saturating_add);
    if accounted > eligible {
        details.push(
            Detail::for_node(
                node,
                "Performance met, exclusions and exceptions must not exceed the eligible population",
            )
            .with_value(accounted.to_string()),
        );
    }
}

/// Count reported for `code`, when it is present and numeric.
fn population_count(node: &Node, code: &str) -> Option<i64> {
    node.child_nodes(TemplateId::MeasureData)
        .find(|d| d.get_value(fields::MEASURE_TYPE) == Some(code))
        .and_then(|d| d.child_nodes(TemplateId::AggregateCount).next())
        .and_then(|c| c.get_value(fields::AGGREGATE_COUNT))
        .and_then(|value| clean_string(value).parse().ok())
}

fn measure_data(node: &Node, details: &mut Vec<Detail>) {
    match node.get_value(fields::MEASURE_TYPE) {
        Some(code) if POPULATION_CODES.contains(&code) => {}
        Some(code) => details.push(
            Detail::for_node(node, "Measure data population must be one of IPP, DENOM, NUMER, DENEX, DENEXCEP")
                .with_value(code),
        ),
        None => details.push(Detail::for_node(node, "Measure data must have a population")),
    }
}

fn aggregate_count(node: &Node, details: &mut Vec<Detail>) {
    require(
        node,
        fields::AGGREGATE_COUNT,
        "Aggregate count must have a value",
        details,
    );
}
