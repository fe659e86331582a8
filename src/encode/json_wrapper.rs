//! A JSON builder that is either an object or an array, never both.
//!
//! Encoders fill one [`JsonWrapper`] per node. Typed puts validate string input
//! from the XML before storing it; when validation fails the raw string is stored
//! anyway and the error is returned, so the output stays as complete as possible
//! while the problem is still reported.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use super::format::{clean_string, formatted_date_parse};
use super::metadata::Metadata;
use super::EncodeError;
use crate::model::Node;
use crate::source::Source;

/// Reserved key holding provenance records; removed by [`JsonWrapper::copy_without_metadata`].
pub const METADATA_HOLDER: &str = "metadata_holder";

/// Label of the [`Source`] produced by [`JsonWrapper::to_source`].
pub const SOURCE_NAME: &str = "QPP";

#[derive(Debug, Clone, Default, PartialEq)]
enum Content {
    #[default]
    Unset,
    Object(Map<String, Value>),
    List(Vec<Value>),
}

/// Object-or-array JSON builder with a metadata side channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonWrapper {
    content: Content,
}

impl JsonWrapper {
    /// An empty wrapper whose mode is decided by the first write.
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a named put has made this a JSON object.
    pub fn is_object(&self) -> bool {
        matches!(self.content, Content::Object(_))
    }

    /// True once an unnamed put has made this a JSON array.
    pub fn is_list(&self) -> bool {
        matches!(self.content, Content::List(_))
    }

    /// Number of keys (object) or entries (list); zero while unset.
    pub fn len(&self) -> usize {
        match &self.content {
            Content::Unset => 0,
            Content::Object(map) => map.len(),
            Content::List(list) => list.len(),
        }
    }

    /// True when nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn object_mut(&mut self) -> Result<&mut Map<String, Value>, EncodeError> {
        if let Content::Unset = self.content {
            self.content = Content::Object(Map::new());
        }
        match &mut self.content {
            Content::Object(map) => Ok(map),
            _ => Err(EncodeError::illegal_state()),
        }
    }

    fn list_mut(&mut self) -> Result<&mut Vec<Value>, EncodeError> {
        if let Content::Unset = self.content {
            self.content = Content::List(Vec::new());
        }
        match &mut self.content {
            Content::List(list) => Ok(list),
            _ => Err(EncodeError::illegal_state()),
        }
    }

    // =========================================================================
    // Pass-through puts
    // =========================================================================

    /// Store `value` under `name` (object mode).
    ///
    /// A nested [`JsonWrapper`] is stored as its raw content. A null value fixes the
    /// mode but stores nothing, so "absent" stays distinguishable from "present".
    pub fn put_object(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self, EncodeError> {
        let value = value.into();
        let map = self.object_mut()?;
        if !value.is_null() {
            map.insert(name.to_string(), value);
        }
        Ok(self)
    }

    /// Append `value` (list mode). Same flattening and null rules as [`Self::put_object`].
    pub fn push_object(&mut self, value: impl Into<Value>) -> Result<&mut Self, EncodeError> {
        let value = value.into();
        let list = self.list_mut()?;
        if !value.is_null() {
            list.push(value);
        }
        Ok(self)
    }

    /// Store a string as-is.
    pub fn put_string(&mut self, name: &str, value: &str) -> Result<&mut Self, EncodeError> {
        self.put_object(name, value)
    }

    /// Append a string as-is.
    pub fn push_string(&mut self, value: &str) -> Result<&mut Self, EncodeError> {
        self.push_object(value)
    }

    // =========================================================================
    // Validated puts
    // =========================================================================

    fn put_validated<T: Into<Value>>(
        &mut self,
        name: &str,
        raw: &str,
        parsed: Result<T, EncodeError>,
    ) -> Result<&mut Self, EncodeError> {
        match parsed {
            Ok(valid) => self.put_object(name, valid),
            Err(err) => {
                self.put_object(name, raw)?;
                Err(err)
            }
        }
    }

    fn push_validated<T: Into<Value>>(
        &mut self,
        raw: &str,
        parsed: Result<T, EncodeError>,
    ) -> Result<&mut Self, EncodeError> {
        match parsed {
            Ok(valid) => self.push_object(valid),
            Err(err) => {
                self.push_object(raw)?;
                Err(err)
            }
        }
    }

    /// Store an integer parsed from `value` (`"12,000"` → `12000`).
    pub fn put_integer(&mut self, name: &str, value: &str) -> Result<&mut Self, EncodeError> {
        self.put_validated(name, value, valid_integer(value))
    }

    /// Append an integer parsed from `value`.
    pub fn push_integer(&mut self, value: &str) -> Result<&mut Self, EncodeError> {
        self.push_validated(value, valid_integer(value))
    }

    /// Store a finite number parsed from `value`.
    pub fn put_float(&mut self, name: &str, value: &str) -> Result<&mut Self, EncodeError> {
        self.put_validated(name, value, valid_float(value))
    }

    /// Append a finite number parsed from `value`.
    pub fn push_float(&mut self, value: &str) -> Result<&mut Self, EncodeError> {
        self.push_validated(value, valid_float(value))
    }

    /// Store a boolean from `true/yes/y` or `false/no/n`, case-insensitively.
    pub fn put_boolean(&mut self, name: &str, value: &str) -> Result<&mut Self, EncodeError> {
        self.put_validated(name, value, valid_boolean(value))
    }

    /// Append a boolean.
    pub fn push_boolean(&mut self, value: &str) -> Result<&mut Self, EncodeError> {
        self.push_validated(value, valid_boolean(value))
    }

    /// Store a date reformatted as `YYYY-MM-DD`.
    pub fn put_date(&mut self, name: &str, value: &str) -> Result<&mut Self, EncodeError> {
        self.put_validated(name, value, valid_date(value))
    }

    /// Append a date reformatted as `YYYY-MM-DD`.
    pub fn push_date(&mut self, value: &str) -> Result<&mut Self, EncodeError> {
        self.push_validated(value, valid_date(value))
    }

    // =========================================================================
    // Retrieval
    // =========================================================================

    /// Raw value under `name`. `None` in list mode.
    pub fn get_value(&self, name: &str) -> Option<&Value> {
        match &self.content {
            Content::Object(map) => map.get(name),
            _ => None,
        }
    }

    /// String under `name`
    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.get_value(name).and_then(Value::as_str)
    }

    /// Integer under `name`
    pub fn get_integer(&self, name: &str) -> Option<i64> {
        self.get_value(name).and_then(Value::as_i64)
    }

    /// Number under `name`
    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get_value(name).and_then(Value::as_f64)
    }

    /// Boolean under `name`
    pub fn get_boolean(&self, name: &str) -> Option<bool> {
        self.get_value(name).and_then(Value::as_bool)
    }

    /// Entries of a list-mode wrapper; empty otherwise.
    pub fn entries(&self) -> &[Value] {
        match &self.content {
            Content::List(list) => list,
            _ => &[],
        }
    }

    /// Wrappers over the objects of a list, or over `self` when not a list.
    ///
    /// Non-object list entries are skipped. Each call starts a fresh iteration.
    pub fn stream(&self) -> impl Iterator<Item = JsonWrapper> + '_ {
        let own = match self.content {
            Content::List(_) => None,
            _ => Some(self.clone()),
        };
        own.into_iter().chain(self.entries().iter().filter_map(|entry| {
            entry.as_object().map(|map| JsonWrapper {
                content: Content::Object(map.clone()),
            })
        }))
    }

    // =========================================================================
    // Copies and rendering
    // =========================================================================

    /// Deep copy with every `metadata_holder` key removed at every depth.
    pub fn copy_without_metadata(&self) -> JsonWrapper {
        let mut copy = self.clone();
        match &mut copy.content {
            Content::Unset => {}
            Content::Object(map) => strip_object(map),
            Content::List(list) => list.iter_mut().for_each(strip_metadata),
        }
        copy
    }

    /// Raw content as a JSON value (`null` while unset).
    pub fn to_value(&self) -> Value {
        self.clone().into()
    }

    /// Render with two-space indentation.
    pub fn to_json_string(&self) -> Result<String, EncodeError> {
        let mut out = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"  "));
        self.serialize(&mut serializer).map_err(render_error)?;
        String::from_utf8(out).map_err(render_error)
    }

    /// Rendered JSON as a named, re-readable [`Source`].
    pub fn to_source(&self) -> Result<Source, EncodeError> {
        Ok(Source::from_bytes(SOURCE_NAME, self.to_json_string()?))
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    fn metadata_holder_mut(&mut self) -> Result<&mut Vec<Value>, EncodeError> {
        let map = self.object_mut()?;
        let holder = map
            .entry(METADATA_HOLDER)
            .or_insert_with(|| Value::Array(Vec::new()));
        if !holder.is_array() {
            *holder = Value::Array(Vec::new());
        }
        holder
            .as_array_mut()
            .ok_or_else(|| EncodeError::new("metadata holder is not an array"))
    }

    fn add_record(&mut self, record: Value) -> Result<(), EncodeError> {
        let holder = self.metadata_holder_mut()?;
        if !holder.contains(&record) {
            holder.push(record);
        }
        Ok(())
    }

    /// Record that this wrapper was produced from `node`.
    pub fn attach_metadata(&mut self, node: &Node) -> Result<(), EncodeError> {
        self.merge_metadata_record(&Metadata::for_node(node, ""))
    }

    /// Copy every record of `other` into this wrapper, relabelled with `encode_label`.
    pub fn merge_metadata(&mut self, other: &JsonWrapper, encode_label: &str) -> Result<(), EncodeError> {
        let records: Vec<Value> = other
            .get_value(METADATA_HOLDER)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for mut record in records {
            if let Some(fields) = record.as_object_mut() {
                fields.insert("encodeLabel".to_string(), Value::from(encode_label));
            }
            self.add_record(record)?;
        }
        Ok(())
    }

    /// Add a single record.
    pub fn merge_metadata_record(&mut self, record: &Metadata) -> Result<(), EncodeError> {
        let value = serde_json::to_value(record)
            .map_err(|e| EncodeError::new("Issue serializing metadata record").with_cause(e))?;
        self.add_record(value)
    }

    /// Records attached directly to this wrapper.
    pub fn metadata(&self) -> Vec<Metadata> {
        self.get_value(METADATA_HOLDER)
            .and_then(Value::as_array)
            .map(|records| {
                records
                    .iter()
                    .filter_map(|r| serde_json::from_value(r.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn strip_object(map: &mut Map<String, Value>) {
    if map.contains_key(METADATA_HOLDER) {
        // rebuild rather than remove so the remaining keys keep their order
        *map = std::mem::take(map)
            .into_iter()
            .filter(|(key, _)| key != METADATA_HOLDER)
            .collect();
    }
    map.values_mut().for_each(strip_metadata);
}

fn strip_metadata(value: &mut Value) {
    match value {
        Value::Object(map) => strip_object(map),
        Value::Array(list) => list.iter_mut().for_each(strip_metadata),
        _ => {}
    }
}

fn render_error(cause: impl std::error::Error + Send + Sync + 'static) -> EncodeError {
    EncodeError::new("Issue rendering JSON from JsonWrapper Map").with_cause(cause)
}

fn valid_integer(value: &str) -> Result<i64, EncodeError> {
    clean_string(value).parse::<i64>().map_err(|e| {
        EncodeError::invalid_value(format!("{} is not an integer.", value), value).with_cause(e)
    })
}

fn valid_float(value: &str) -> Result<f64, EncodeError> {
    match clean_string(value).parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(EncodeError::invalid_value(
            format!("{} is not a number.", value),
            value,
        )),
    }
}

fn valid_boolean(value: &str) -> Result<bool, EncodeError> {
    let cleaned = clean_string(value);
    match cleaned.as_str() {
        "true" | "yes" | "y" => Ok(true),
        "false" | "no" | "n" => Ok(false),
        _ => Err(EncodeError::invalid_value(
            format!("{} is not a boolean.", cleaned),
            value,
        )),
    }
}

fn valid_date(value: &str) -> Result<String, EncodeError> {
    formatted_date_parse(value)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .ok_or_else(|| {
            EncodeError::invalid_value(format!("{} is not a date of format YYYYMMDD.", value), value)
        })
}

impl From<JsonWrapper> for Value {
    fn from(wrapper: JsonWrapper) -> Self {
        match wrapper.content {
            Content::Unset => Value::Null,
            Content::Object(map) => Value::Object(map),
            Content::List(list) => Value::Array(list),
        }
    }
}

impl From<&JsonWrapper> for Value {
    fn from(wrapper: &JsonWrapper) -> Self {
        wrapper.to_value()
    }
}

impl Serialize for JsonWrapper {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.content {
            Content::Unset => serializer.serialize_unit(),
            Content::Object(map) => map.serialize(serializer),
            Content::List(list) => list.serialize(serializer),
        }
    }
}

impl fmt::Display for JsonWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.to_json_string().map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

#[cfg(test)]
mod tests;
