use serde_json::json;

use super::*;
use crate::model::TemplateId;

fn located(template: TemplateId, line: i32) -> Node {
    let mut node = Node::new(template);
    node.set_line(line);
    node.set_column(5);
    node.set_path("/*[local-name()='observation']");
    node
}

#[test]
fn test_first_named_put_fixes_object_mode() {
    let mut wrapper = JsonWrapper::new();
    assert!(!wrapper.is_object() && !wrapper.is_list());

    wrapper.put_string("measureId", "ACI_EP_1").unwrap();
    assert!(wrapper.is_object());

    let err = wrapper.push_string("x").unwrap_err();
    assert_eq!(
        err.message(),
        "Current state may not change (from list to object or reverse)."
    );
    assert!(!err.is_invalid_value());
    assert_eq!(wrapper.to_value(), json!({"measureId": "ACI_EP_1"}));
}

#[test]
fn test_first_unnamed_put_fixes_list_mode() {
    let mut wrapper = JsonWrapper::new();
    wrapper.push_integer("1").unwrap();
    assert!(wrapper.is_list());
    assert!(wrapper.put_integer("n", "2").is_err());
    assert_eq!(wrapper.to_value(), json!([1]));
}

#[test]
fn test_null_put_fixes_mode_but_stores_nothing() {
    let mut wrapper = JsonWrapper::new();
    wrapper.put_object("absent", Value::Null).unwrap();
    assert!(wrapper.is_object());
    assert!(wrapper.is_empty());
    assert_eq!(wrapper.get_value("absent"), None);
}

#[test]
fn test_put_integer_cleans_thousands_separator() {
    let mut wrapper = JsonWrapper::new();
    wrapper.put_integer("count", "12,000").unwrap();
    assert_eq!(wrapper.get_integer("count"), Some(12000));
}

#[test]
fn test_invalid_integer_stores_raw_value() {
    let mut wrapper = JsonWrapper::new();
    let err = wrapper.put_integer("count", "abc").unwrap_err();
    assert!(err.is_invalid_value());
    assert_eq!(err.value(), Some("abc"));
    assert_eq!(wrapper.get_string("count"), Some("abc"));
    assert_eq!(wrapper.get_integer("count"), None);
}

#[test]
fn test_put_float() {
    let mut wrapper = JsonWrapper::new();
    wrapper.put_float("rate", " 0.75 ").unwrap();
    assert_eq!(wrapper.get_float("rate"), Some(0.75));

    assert!(wrapper.put_float("bad", "NaN").is_err());
    assert!(wrapper.put_float("huge", "1e999").is_err());
    assert_eq!(wrapper.get_string("bad"), Some("NaN"));
}

#[test]
fn test_put_boolean_words() {
    let mut wrapper = JsonWrapper::new();
    wrapper.put_boolean("a", "Y").unwrap();
    wrapper.put_boolean("b", "yes").unwrap();
    wrapper.put_boolean("c", "False").unwrap();
    wrapper.put_boolean("d", "n").unwrap();
    assert_eq!(wrapper.get_boolean("a"), Some(true));
    assert_eq!(wrapper.get_boolean("b"), Some(true));
    assert_eq!(wrapper.get_boolean("c"), Some(false));
    assert_eq!(wrapper.get_boolean("d"), Some(false));
}

#[test]
fn test_invalid_boolean_stores_raw_value() {
    let mut wrapper = JsonWrapper::new();
    let err = wrapper.put_boolean("value", "maybe").unwrap_err();
    assert_eq!(err.value(), Some("maybe"));
    assert_eq!(wrapper.get_string("value"), Some("maybe"));
}

#[test]
fn test_put_date_reformats() {
    let mut wrapper = JsonWrapper::new();
    wrapper.put_date("performanceStart", "20230115").unwrap();
    wrapper.put_date("performanceEnd", "2023-12-31T23:59:59Z").unwrap();
    assert_eq!(wrapper.get_string("performanceStart"), Some("2023-01-15"));
    assert_eq!(wrapper.get_string("performanceEnd"), Some("2023-12-31"));

    let err = wrapper.put_date("other", "01/15/2023").unwrap_err();
    assert!(err.message().contains("is not a date"));
    assert_eq!(wrapper.get_string("other"), Some("01/15/2023"));
}

#[test]
fn test_unnamed_typed_puts() {
    let mut wrapper = JsonWrapper::new();
    wrapper.push_float("1,250.5").unwrap();
    wrapper.push_boolean(" Yes ").unwrap();
    wrapper.push_date("20170131").unwrap();
    assert_eq!(wrapper.to_value(), json!([1250.5, true, "2017-01-31"]));
}

#[test]
fn test_invalid_unnamed_puts_append_raw_value() {
    let mut wrapper = JsonWrapper::new();

    let err = wrapper.push_boolean("maybe").unwrap_err();
    assert!(err.is_invalid_value());
    assert_eq!(err.value(), Some("maybe"));

    let err = wrapper.push_date("15/01/2023").unwrap_err();
    assert_eq!(err.message(), "15/01/2023 is not a date of format YYYYMMDD.");

    let err = wrapper.push_float("abc").unwrap_err();
    assert_eq!(err.value(), Some("abc"));

    assert_eq!(wrapper.to_value(), json!(["maybe", "15/01/2023", "abc"]));
}

#[test]
fn test_getters_are_type_strict() {
    let mut wrapper = JsonWrapper::new();
    wrapper.put_string("s", "12").unwrap();
    assert_eq!(wrapper.get_integer("s"), None);
    assert_eq!(wrapper.get_boolean("missing"), None);

    let mut list = JsonWrapper::new();
    list.push_string("12").unwrap();
    assert_eq!(list.get_value("s"), None);
}

#[test]
fn test_nested_wrapper_is_flattened() {
    let mut value = JsonWrapper::new();
    value.put_integer("numerator", "5").unwrap();

    let mut measure = JsonWrapper::new();
    measure.put_string("measureId", "ACI_EP_1").unwrap();
    measure.put_object("value", value).unwrap();

    assert_eq!(
        measure.to_value(),
        json!({"measureId": "ACI_EP_1", "value": {"numerator": 5}})
    );
}

#[test]
fn test_clone_is_independent() {
    let mut original = JsonWrapper::new();
    original.put_object("value", json!({"n": 1})).unwrap();

    let mut copy = original.clone();
    copy.put_object("value", json!({"n": 2})).unwrap();

    assert_eq!(original.get_value("value"), Some(&json!({"n": 1})));
}

#[test]
fn test_stream_over_list_skips_primitives() {
    let mut list = JsonWrapper::new();
    list.push_object(json!({"a": 1})).unwrap();
    list.push_object(json!({"b": 2})).unwrap();
    list.push_integer("3").unwrap();

    assert_eq!(list.stream().count(), 2);
    // restartable
    assert_eq!(list.stream().count(), 2);

    let ids: Vec<_> = list.stream().map(|w| w.len()).collect();
    assert_eq!(ids, vec![1, 1]);
}

#[test]
fn test_stream_over_object_yields_self() {
    let mut object = JsonWrapper::new();
    object.put_string("a", "b").unwrap();
    let streamed: Vec<_> = object.stream().collect();
    assert_eq!(streamed, vec![object.clone()]);
}

#[test]
fn test_attach_metadata_uses_empty_label() {
    let mut wrapper = JsonWrapper::new();
    wrapper
        .attach_metadata(&located(TemplateId::AggregateCount, 30))
        .unwrap();

    let records = wrapper.metadata();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].encode_label, "");
    assert_eq!(records[0].template, "ACI_AGGREGATE_COUNT");
    assert_eq!(records[0].line, Some(30));
}

#[test]
fn test_metadata_has_set_semantics() {
    let node = located(TemplateId::AggregateCount, 30);
    let mut wrapper = JsonWrapper::new();
    wrapper.attach_metadata(&node).unwrap();
    wrapper.attach_metadata(&node).unwrap();
    assert_eq!(wrapper.metadata().len(), 1);
}

#[test]
fn test_merge_metadata_relabels() {
    let mut child = JsonWrapper::new();
    child
        .attach_metadata(&located(TemplateId::AciNumerator, 10))
        .unwrap();
    child
        .attach_metadata(&located(TemplateId::AggregateCount, 11))
        .unwrap();

    let mut parent = JsonWrapper::new();
    parent.merge_metadata(&child, "measureId").unwrap();

    let records = parent.metadata();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.encode_label == "measureId"));
    // the source keeps its own labels
    assert!(child.metadata().iter().all(|r| r.encode_label.is_empty()));
}

#[test]
fn test_metadata_on_list_is_a_state_error() {
    let mut list = JsonWrapper::new();
    list.push_string("a").unwrap();
    let err = list
        .attach_metadata(&located(TemplateId::AggregateCount, 1))
        .unwrap_err();
    assert!(!err.is_invalid_value());
}

#[test]
fn test_copy_without_metadata_strips_every_level() {
    let node = located(TemplateId::AggregateCount, 3);

    let mut inner = JsonWrapper::new();
    inner.put_integer("numerator", "1").unwrap();
    inner.attach_metadata(&node).unwrap();

    let mut list = JsonWrapper::new();
    list.push_object(inner).unwrap();

    let mut outer = JsonWrapper::new();
    outer.put_object("measurements", list).unwrap();
    outer.attach_metadata(&node).unwrap();

    let stripped = outer.copy_without_metadata();
    assert_eq!(
        stripped.to_value(),
        json!({"measurements": [{"numerator": 1}]})
    );
    assert!(!outer.metadata().is_empty());
}

#[test]
fn test_render_uses_two_space_indent() {
    let mut wrapper = JsonWrapper::new();
    wrapper.put_integer("performanceYear", "2017").unwrap();
    wrapper.put_object("list", json!([1])).unwrap();

    let rendered = wrapper.to_json_string().unwrap();
    assert_eq!(
        rendered,
        "{\n  \"performanceYear\": 2017,\n  \"list\": [\n    1\n  ]\n}"
    );
    assert_eq!(wrapper.to_string(), rendered);
}

#[test]
fn test_insertion_order_is_kept() {
    let mut wrapper = JsonWrapper::new();
    wrapper.put_string("z", "1").unwrap();
    wrapper.put_string("a", "2").unwrap();
    let rendered = wrapper.to_json_string().unwrap();
    assert!(rendered.find("\"z\"") < rendered.find("\"a\""));
}

#[test]
fn test_to_source() {
    let mut wrapper = JsonWrapper::new();
    wrapper.put_string("entityType", "individual").unwrap();

    let source = wrapper.to_source().unwrap();
    assert_eq!(source.name(), SOURCE_NAME);
    let reread: Value = serde_json::from_slice(source.bytes()).unwrap();
    assert_eq!(reread, json!({"entityType": "individual"}));
}

#[test]
fn test_unset_renders_null() {
    assert_eq!(JsonWrapper::new().to_json_string().unwrap(), "null");
}
