//! The QPP encoders, one per template.
//!
//! Parents never read their children's [`Node`] fields directly: they encode the
//! child and copy from the child's wrapper, merging the child's metadata under the
//! label of the field it fed. That way an error on an aggregate count can be traced
//! back to the `numerator` it ended up in.

use serde_json::Value;

use super::{EncodeContext, EncodeError, EncoderRegistry, JsonWrapper};
use crate::model::fields;
use crate::model::{Node, TemplateId};

const VALUE: &str = "value";
const MEASUREMENTS: &str = "measurements";
const MEASUREMENT_SETS: &str = "measurementSets";

const PERFORMANCE_MET: &str = "performanceMet";
const PERFORMANCE_NOT_MET: &str = "performanceNotMet";
const ELIGIBLE_POPULATION: &str = "eligiblePopulation";
const ELIGIBLE_POPULATION_EXCLUSION: &str = "eligiblePopulationExclusion";
const ELIGIBLE_POPULATION_EXCEPTION: &str = "eligiblePopulationException";

type EncodeResult = Result<(), EncodeError>;

pub(super) fn builtin() -> EncoderRegistry {
    let mut registry = EncoderRegistry::new();
    registry.register(TemplateId::Placeholder, placeholder);
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
    registry.register(TemplateId::MeasurePerformed, measure_performed);
    registry.register(TemplateId::MeasureReferenceResults, quality_measure);
    registry.register(TemplateId::MeasureData, measure_data);
    registry.register(TemplateId::AggregateCount, aggregate_count);
    registry
}

/// Copy `field` of `node` unchanged, if present.
fn copy_field(wrapper: &mut JsonWrapper, node: &Node, field: &str) -> EncodeResult {
    if let Some(value) = node.get_value(field) {
        wrapper.put_string(field, value)?;
    }
    Ok(())
}

/// Encode every child of `node` accepted by `filter`, in document order.
fn encode_all(
    node: &Node,
    ctx: &mut EncodeContext<'_>,
    filter: impl Fn(TemplateId) -> bool,
) -> Result<Vec<Value>, EncodeError> {
    node.children()
        .iter()
        .filter(|c| filter(c.template()))
        .map(|c| ctx.encode_child(c).map(Value::from))
        .collect()
}

/// Encode the first `template` child and copy its `value` into `target` as `label`.
///
/// The child's metadata is merged into `metadata_target` under `label`.
fn lift_child_value(
    target: &mut JsonWrapper,
    metadata_target: &mut JsonWrapper,
    node: &Node,
    template: TemplateId,
    label: &str,
    ctx: &mut EncodeContext<'_>,
) -> EncodeResult {
    if let Some(child) = node.child_nodes(template).next() {
        let encoded = ctx.encode_child(child)?;
        if let Some(value) = encoded.get_value(VALUE) {
            target.put_object(label, value.clone())?;
        }
        metadata_target.merge_metadata(&encoded, label)?;
    }
    Ok(())
}

fn placeholder(wrapper: &mut JsonWrapper, node: &Node, ctx: &mut EncodeContext<'_>) -> EncodeResult {
    for child in node.children() {
        let encoded = ctx.encode_child(child)?;
        wrapper.push_object(encoded)?;
    }
    Ok(())
}

fn clinical_document(wrapper: &mut JsonWrapper, node: &Node, ctx: &mut EncodeContext<'_>) -> EncodeResult {
    copy_field(wrapper, node, fields::ENTITY_TYPE)?;
    copy_field(wrapper, node, fields::TAX_ID)?;
    copy_field(wrapper, node, fields::NPI)?;
    if let Some(year) = node.get_value(fields::PERFORMANCE_YEAR) {
        ctx.put_checked(wrapper, node, |w| w.put_integer(fields::PERFORMANCE_YEAR, year))?;
    }

    let sets = encode_all(node, ctx, |t| t.is_section())?;
    wrapper.put_object(MEASUREMENT_SETS, sets)?;
    Ok(())
}

fn section(wrapper: &mut JsonWrapper, node: &Node, ctx: &mut EncodeContext<'_>) -> EncodeResult {
    copy_field(wrapper, node, fields::CATEGORY)?;
    copy_field(wrapper, node, fields::SUBMISSION_METHOD)?;

    if let Some(parameters) = node.child_nodes(TemplateId::ReportingParametersAct).next() {
        let encoded = ctx.encode_child(parameters)?;
        for key in [fields::PERFORMANCE_START, fields::PERFORMANCE_END] {
            if let Some(value) = encoded.get_value(key) {
                wrapper.put_object(key, value.clone())?;
            }
        }
        wrapper.merge_metadata(&encoded, "performancePeriod")?;
    }

    let measurements = encode_all(node, ctx, |t| t.is_measure())?;
    wrapper.put_object(MEASUREMENTS, measurements)?;
    Ok(())
}

fn reporting_parameters(wrapper: &mut JsonWrapper, node: &Node, ctx: &mut EncodeContext<'_>) -> EncodeResult {
    for key in [fields::PERFORMANCE_START, fields::PERFORMANCE_END] {
        if let Some(date) = node.get_value(key) {
            ctx.put_checked(wrapper, node, |w| w.put_date(key, date))?;
        }
    }
    Ok(())
}

fn aci_numerator_denominator(wrapper: &mut JsonWrapper, node: &Node, ctx: &mut EncodeContext<'_>) -> EncodeResult {
    copy_field(wrapper, node, fields::MEASURE_ID)?;

    let mut value = JsonWrapper::new();
    lift_child_value(&mut value, wrapper, node, TemplateId::AciNumerator, "numerator", ctx)?;
    lift_child_value(&mut value, wrapper, node, TemplateId::AciDenominator, "denominator", ctx)?;
    wrapper.put_object(VALUE, value)?;
    Ok(())
}

fn aggregate_container(wrapper: &mut JsonWrapper, node: &Node, ctx: &mut EncodeContext<'_>) -> EncodeResult {
    let mut value = JsonWrapper::new();
    lift_child_value(&mut value, wrapper, node, TemplateId::AggregateCount, VALUE, ctx)?;
    if let Some(count) = value.get_value(VALUE) {
        wrapper.put_object(VALUE, count.clone())?;
    }
    Ok(())
}

fn performed_measure(wrapper: &mut JsonWrapper, node: &Node, ctx: &mut EncodeContext<'_>) -> EncodeResult {
    copy_field(wrapper, node, fields::MEASURE_ID)?;

    let mut value = JsonWrapper::new();
    lift_child_value(&mut value, wrapper, node, TemplateId::MeasurePerformed, VALUE, ctx)?;
    if let Some(performed) = value.get_value(VALUE) {
        wrapper.put_object(VALUE, performed.clone())?;
    }
    Ok(())
}

fn measure_performed(wrapper: &mut JsonWrapper, node: &Node, ctx: &mut EncodeContext<'_>) -> EncodeResult {
    if let Some(performed) = node.get_value(fields::MEASURE_PERFORMED) {
        ctx.put_checked(wrapper, node, |w| w.put_boolean(VALUE, performed))?;
    }
    Ok(())
}

fn population_field(code: &str) -> Option<&'static str> {
    match code {
        "NUMER" => Some(PERFORMANCE_MET),
        "DENOM" => Some(ELIGIBLE_POPULATION),
        "DENEX" => Some(ELIGIBLE_POPULATION_EXCLUSION),
        "DENEXCEP" => Some(ELIGIBLE_POPULATION_EXCEPTION),
        _ => None,
    }
}

/// Absent counts are zero; present counts must be integers.
fn optional_count(value: &JsonWrapper, field: &str) -> Option<i64> {
    match value.get_value(field) {
        None => Some(0),
        Some(count) => count.as_i64(),
    }
}

/// Eligible population minus met, excluded and excepted; `None` when any count is
/// unusable or the populations overlap.
fn performance_not_met(value: &JsonWrapper) -> Option<i64> {
    let eligible = value.get_integer(ELIGIBLE_POPULATION)?;
    let met = value.get_integer(PERFORMANCE_MET)?;
    let exclusion = optional_count(value, ELIGIBLE_POPULATION_EXCLUSION)?;
    let exception = optional_count(value, ELIGIBLE_POPULATION_EXCEPTION)?;
    eligible
        .checked_sub(met)?
        .checked_sub(exclusion)?
        .checked_sub(exception)
        .filter(|not_met| *not_met >= 0)
}

fn quality_measure(wrapper: &mut JsonWrapper, node: &Node, ctx: &mut EncodeContext<'_>) -> EncodeResult {
    copy_field(wrapper, node, fields::MEASURE_ID)?;

    let mut value = JsonWrapper::new();
    value.put_object("isEndToEndReported", true)?;
    for data in node.child_nodes(TemplateId::MeasureData) {
        let encoded = ctx.encode_child(data)?;
        let Some(field) = encoded.get_string(fields::MEASURE_TYPE).and_then(population_field) else {
            continue;
        };
        if let Some(count) = encoded.get_value(VALUE) {
            value.put_object(field, count.clone())?;
        }
        wrapper.merge_metadata(&encoded, field)?;
    }

    if let Some(not_met) = performance_not_met(&value) {
        value.put_object(PERFORMANCE_NOT_MET, not_met)?;
    }
    wrapper.put_object(VALUE, value)?;
    Ok(())
}

fn measure_data(wrapper: &mut JsonWrapper, node: &Node, ctx: &mut EncodeContext<'_>) -> EncodeResult {
    copy_field(wrapper, node, fields::MEASURE_TYPE)?;

    let mut value = JsonWrapper::new();
    lift_child_value(&mut value, wrapper, node, TemplateId::AggregateCount, VALUE, ctx)?;
    if let Some(count) = value.get_value(VALUE) {
        wrapper.put_object(VALUE, count.clone())?;
    }
    Ok(())
}

fn aggregate_count(wrapper: &mut JsonWrapper, node: &Node, ctx: &mut EncodeContext<'_>) -> EncodeResult {
    if let Some(count) = node.get_value(fields::AGGREGATE_COUNT) {
        ctx.put_checked(wrapper, node, |w| w.put_integer(VALUE, count))?;
    }
    Ok(())
}
