use std::{collections::BTreeMap, fmt};

use indexmap::{IndexMap, IndexSet};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schema keywords the model does not interpret, keyed by keyword name.
///
/// Sorted so that re-emitting them is deterministic.
pub type Constraints = BTreeMap<String, Value>;

/// One node of the supported JSON Schema subset.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaValue {
    /// `title` annotation.
    pub title: Option<String>,
    /// `description` annotation.
    pub description: Option<String>,
    /// Shape of the node, selected by its `type` keyword.
    pub kind: SchemaKind,
    /// Keywords carried opaquely (`enum`, `format`, `minimum`, ...).
    pub extra: Constraints,
}

/// Tagged shape of a [`SchemaValue`].
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    /// `{"type": "object"}` with named properties.
    Object(ObjectSchema),
    /// `{"type": "array"}` with a single item schema.
    Array(Box<SchemaValue>),
    /// `{"type": "string"}`
    String,
    /// `{"type": "number"}`
    Number,
    /// `{"type": "integer"}`
    Integer,
    /// `{"type": "boolean"}`
    Boolean,
}

/// Scalar kinds usable as array elements in the visual editor.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    /// Text value.
    #[default]
    String,
    /// Floating-point number.
    Number,
    /// Whole number.
    Integer,
    /// `true` / `false`.
    Boolean,
}

/// Properties and required set of an object schema.
///
/// The required set is kept a subset of the property names: removing a
/// property also drops it from `required`, and only declared properties can
/// be marked required.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    properties: IndexMap<String, SchemaValue>,
    required: IndexSet<String>,
}

impl SchemaValue {
    /// Create a node of the given kind without annotations.
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            title: None,
            description: None,
            kind,
            extra: Constraints::new(),
        }
    }

    /// Empty `{"type": "object"}` schema.
    pub fn object() -> Self {
        Self::new(SchemaKind::Object(ObjectSchema::default()))
    }

    /// `{"type": "array", "items": ...}` schema.
    pub fn array(items: SchemaValue) -> Self {
        Self::new(SchemaKind::Array(Box::new(items)))
    }

    /// Bare schema for a primitive type.
    pub fn primitive(ty: PrimitiveType) -> Self {
        Self::new(ty.into())
    }

    /// Builder-style title setter.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder-style description setter.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder-style opaque keyword setter.
    pub fn with_extra(mut self, keyword: impl Into<String>, value: Value) -> Self {
        self.extra.insert(keyword.into(), value);
        self
    }

    /// The object body, if this is an object schema.
    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match &self.kind {
            SchemaKind::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Mutable object body, if this is an object schema.
    pub fn as_object_mut(&mut self) -> Option<&mut ObjectSchema> {
        match &mut self.kind {
            SchemaKind::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// The primitive type of this node, if it is a scalar.
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        self.kind.primitive_type()
    }

    /// Whether this node is a scalar carrying nothing beyond its type.
    pub fn is_bare_primitive(&self) -> bool {
        self.primitive_type().is_some()
            && self.title.is_none()
            && self.description.is_none()
            && self.extra.is_empty()
    }
}

impl SchemaKind {
    /// The `type` keyword value for this kind.
    pub fn type_tag(&self) -> &'static str {
        match self {
            SchemaKind::Object(_) => "object",
            SchemaKind::Array(_) => "array",
            SchemaKind::String => "string",
            SchemaKind::Number => "number",
            SchemaKind::Integer => "integer",
            SchemaKind::Boolean => "boolean",
        }
    }

    /// Scalar type, or `None` for containers.
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        match self {
            SchemaKind::String => Some(PrimitiveType::String),
            SchemaKind::Number => Some(PrimitiveType::Number),
            SchemaKind::Integer => Some(PrimitiveType::Integer),
            SchemaKind::Boolean => Some(PrimitiveType::Boolean),
            SchemaKind::Object(_) | SchemaKind::Array(_) => None,
        }
    }
}

impl PrimitiveType {
    /// All primitive types, in picker order.
    pub const ALL: [PrimitiveType; 4] = [
        PrimitiveType::String,
        PrimitiveType::Number,
        PrimitiveType::Integer,
        PrimitiveType::Boolean,
    ];

    /// The `type` keyword value.
    pub fn type_tag(self) -> &'static str {
        SchemaKind::from(self).type_tag()
    }

    /// Whether a JSON value is an instance of this type.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            PrimitiveType::String => value.is_string(),
            PrimitiveType::Number => value.is_number(),
            PrimitiveType::Integer => value.is_i64() || value.is_u64(),
            PrimitiveType::Boolean => value.is_boolean(),
        }
    }
}

impl From<PrimitiveType> for SchemaKind {
    fn from(ty: PrimitiveType) -> Self {
        match ty {
            PrimitiveType::String => SchemaKind::String,
            PrimitiveType::Number => SchemaKind::Number,
            PrimitiveType::Integer => SchemaKind::Integer,
            PrimitiveType::Boolean => SchemaKind::Boolean,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_tag())
    }
}

impl ObjectSchema {
    /// Insert or replace a property.
    ///
    /// A replaced property moves to the end, so the last insertion of a name
    /// decides both its schema and its position.
    pub fn insert(&mut self, name: impl Into<String>, schema: SchemaValue, required: bool) {
        let name = name.into();
        self.properties.shift_remove(&name);
        self.required.shift_remove(&name);
        if required {
            self.required.insert(name.clone());
        }
        self.properties.insert(name, schema);
    }

    /// Remove a property and its required mark.
    pub fn remove(&mut self, name: &str) -> Option<SchemaValue> {
        self.required.shift_remove(name);
        self.properties.shift_remove(name)
    }

    /// Mark a declared property as required. Returns `false` if the name is
    /// not a declared property.
    pub fn mark_required(&mut self, name: &str) -> bool {
        if !self.properties.contains_key(name) {
            return false;
        }
        self.required.insert(name.to_string());
        true
    }

    /// Look up a property schema.
    pub fn get(&self, name: &str) -> Option<&SchemaValue> {
        self.properties.get(name)
    }

    /// Whether the property is in the required set.
    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &SchemaValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Required names in declaration order.
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.required.iter().map(String::as_str)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the object declares no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

// Property order is significant; the required list is a set.
impl PartialEq for ObjectSchema {
    fn eq(&self, other: &Self) -> bool {
        self.properties.iter().eq(other.properties.iter()) && self.required == other.required
    }
}
