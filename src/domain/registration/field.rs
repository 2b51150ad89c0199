//! Field names and field values.
//!
//! Every domain declares its fields as an enum implementing [`FieldName`].
//! Values arrive either already typed or as string-keyed tool-call arguments
//! ([`RawFieldUpdates`]) that the engine resolves against the domain's enum.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// An enumerated field of one domain's draft.
pub trait FieldName: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Every field of the domain, in declaration order.
    const ALL: &'static [Self];

    /// Wire name used by tool calls and stored in the session.
    fn as_str(&self) -> &'static str;

    /// Human-readable label used in prompts and summaries.
    fn label(&self) -> &'static str;

    /// Resolves a wire name, ignoring ASCII case and surrounding whitespace.
    fn parse(name: &str) -> Option<Self> {
        let needle = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.as_str().eq_ignore_ascii_case(needle))
    }
}

/// A reference to another entity, e.g. a category chosen from a menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    pub name: String,
}

impl EntityRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A single extracted value.
///
/// Untagged so that JSON tool-call arguments deserialize directly:
/// `true`, `5`, `{"id": "c1", "name": "Cows"}` and `"feed"` map to the
/// four variants in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Reference(EntityRef),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn reference(id: impl Into<String>, name: impl Into<String>) -> Self {
        FieldValue::Reference(EntityRef::new(id, name))
    }

    /// Interprets free text typed by the user.
    pub fn from_input(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_lowercase().as_str() {
            "true" | "yes" => return FieldValue::Flag(true),
            "false" | "no" => return FieldValue::Flag(false),
            _ => {}
        }
        match trimmed.replace(',', ".").parse::<f64>() {
            Ok(number) if number.is_finite() => FieldValue::Number(number),
            _ => FieldValue::Text(trimmed.to_string()),
        }
    }

    /// Returns the text if this is a non-empty text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) if !text.trim().is_empty() => Some(text.trim()),
            _ => None,
        }
    }

    /// Returns a number, accepting numeric text as well.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(number) => Some(*number),
            FieldValue::Text(text) => text.trim().replace(',', ".").parse().ok(),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&EntityRef> {
        match self {
            FieldValue::Reference(reference) => Some(reference),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Flag(true) => write!(f, "yes"),
            FieldValue::Flag(false) => write!(f, "no"),
            FieldValue::Number(number) if number.fract() == 0.0 => write!(f, "{}", *number as i64),
            FieldValue::Number(number) => write!(f, "{:.2}", number),
            FieldValue::Reference(reference) => write!(f, "{}", reference.name),
            FieldValue::Text(text) => write!(f, "{}", text),
        }
    }
}

/// One value destined for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate<F> {
    pub field: F,
    pub value: FieldValue,
}

/// Ordered set of field updates; inserting an existing field replaces its value.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdates<F> {
    entries: Vec<FieldUpdate<F>>,
}

impl<F> Default for FieldUpdates<F> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<F: FieldName> FieldUpdates<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: F, value: FieldValue) -> Self {
        Self::new().with(field, value)
    }

    /// Builder form of [`FieldUpdates::insert`].
    pub fn with(mut self, field: F, value: FieldValue) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: F, value: FieldValue) {
        match self.entries.iter_mut().find(|entry| entry.field == field) {
            Some(entry) => entry.value = value,
            None => self.entries.push(FieldUpdate { field, value }),
        }
    }

    pub fn get(&self, field: F) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|entry| entry.field == field)
            .map(|entry| &entry.value)
    }

    pub fn fields(&self) -> impl Iterator<Item = F> + '_ {
        self.entries.iter().map(|entry| entry.field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldUpdate<F>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves string-keyed updates, returning the names that matched no field.
    pub fn from_raw(raw: &RawFieldUpdates) -> (Self, Vec<String>) {
        let mut updates = Self::new();
        let mut unknown = Vec::new();
        for (name, value) in raw.iter() {
            match F::parse(name) {
                Some(field) => updates.insert(field, value.clone()),
                None => unknown.push(name.clone()),
            }
        }
        (updates, unknown)
    }
}

/// String-keyed updates as produced by the tool-calling layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFieldUpdates {
    entries: Vec<(String, FieldValue)>,
}

impl RawFieldUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.entries.push((name.into(), value));
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: FieldValue) {
        self.entries.push((name.into(), value));
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, FieldValue)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reads a JSON object of tool-call arguments. `null` values and values
    /// that fit no [`FieldValue`] variant are skipped.
    pub fn from_json(arguments: &serde_json::Value) -> Self {
        let mut raw = Self::new();
        if let Some(object) = arguments.as_object() {
            for (name, value) in object {
                if value.is_null() {
                    continue;
                }
                if let Ok(parsed) = serde_json::from_value::<FieldValue>(value.clone()) {
                    raw.push(name.clone(), parsed);
                }
            }
        }
        raw
    }
}
