use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    data::schema::{Constraints, ObjectSchema, PrimitiveType, SchemaKind, SchemaValue},
    error::ProjectionError,
};

/// Stable identity of a property row, independent of its name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic [`ItemId`] allocator owned by an editing session.
#[derive(Debug, Clone, Default)]
pub struct ItemIds {
    next: u64,
}

impl ItemIds {
    /// Allocate a fresh id.
    pub fn next_id(&mut self) -> ItemId {
        let id = ItemId(self.next);
        self.next += 1;
        id
    }
}

/// Kinds a property row can take in the visual editor.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    /// Text value.
    #[default]
    String,
    /// Floating-point number.
    Number,
    /// Whole number.
    Integer,
    /// `true` / `false`.
    Boolean,
    /// List of `array_item_type` values.
    Array,
    /// Nested object, edited only as raw text.
    Object,
}

impl PropertyType {
    /// All property types, in picker order.
    pub const ALL: [PropertyType; 6] = [
        PropertyType::String,
        PropertyType::Number,
        PropertyType::Integer,
        PropertyType::Boolean,
        PropertyType::Array,
        PropertyType::Object,
    ];

    /// Scalar type, or `None` for containers.
    pub fn primitive(self) -> Option<PrimitiveType> {
        match self {
            PropertyType::String => Some(PrimitiveType::String),
            PropertyType::Number => Some(PrimitiveType::Number),
            PropertyType::Integer => Some(PrimitiveType::Integer),
            PropertyType::Boolean => Some(PrimitiveType::Boolean),
            PropertyType::Array | PropertyType::Object => None,
        }
    }

    /// The `type` keyword value.
    pub fn type_tag(self) -> &'static str {
        match self {
            PropertyType::Array => "array",
            PropertyType::Object => "object",
            other => other.primitive().map_or("string", PrimitiveType::type_tag),
        }
    }

    /// Keywords the built schema emits for the body of this kind.
    fn body_keywords(self) -> &'static [&'static str] {
        match self {
            PropertyType::Object => RootType::Object.body_keywords(),
            PropertyType::Array => RootType::Array.body_keywords(),
            _ => &[],
        }
    }
}

impl From<PrimitiveType> for PropertyType {
    fn from(ty: PrimitiveType) -> Self {
        match ty {
            PrimitiveType::String => PropertyType::String,
            PrimitiveType::Number => PropertyType::Number,
            PrimitiveType::Integer => PropertyType::Integer,
            PrimitiveType::Boolean => PropertyType::Boolean,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_tag())
    }
}

/// Shape of the whole schema as edited visually.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum RootType {
    /// Object with the property rows.
    #[default]
    Object,
    /// Array of `array_item_type`; property rows are kept but not built.
    Array,
}

impl RootType {
    fn body_keywords(self) -> &'static [&'static str] {
        match self {
            RootType::Object => &["properties", "required"],
            RootType::Array => &["items"],
        }
    }
}

/// One row of the visual editor.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyItem {
    /// Row identity.
    pub id: ItemId,
    /// Property key. Blank names are skipped when building.
    pub name: String,
    /// Property kind.
    pub property_type: PropertyType,
    /// Whether the property is listed in `required`.
    pub required: bool,
    /// Property `description`.
    pub description: Option<String>,
    /// Element type, meaningful only for [`PropertyType::Array`].
    pub array_item_type: PrimitiveType,
    /// Keywords of the property the visual editor does not edit (`enum`, `title`, ...).
    pub constraints: Constraints,
    /// Object body or non-primitive array items, carried through unchanged.
    pub nested: Option<SchemaValue>,
}

impl PropertyItem {
    /// A fresh row with no opaque data.
    pub fn new(id: ItemId, name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            id,
            name: name.into(),
            property_type,
            required: false,
            description: None,
            array_item_type: PrimitiveType::default(),
            constraints: Constraints::new(),
            nested: None,
        }
    }

    /// Builder-style required flag.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Builder-style description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder-style array element type.
    pub fn with_array_item_type(mut self, ty: PrimitiveType) -> Self {
        self.array_item_type = ty;
        self
    }

    /// Whether the row contributes a property when building.
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Enum values carried in the constraints, if any.
    pub fn enum_values(&self) -> Option<&[Value]> {
        match self.constraints.get("enum") {
            Some(Value::Array(values)) => Some(values),
            _ => None,
        }
    }

    /// Change the kind of the row.
    ///
    /// Opaque nested structure belongs to the old kind and is dropped, as is
    /// an `enum` whose values the new kind cannot hold. Carried keywords the
    /// new kind emits itself (`items`, `properties`, `required`) are dropped too.
    pub fn retype(&mut self, property_type: PropertyType) {
        if self.property_type == property_type {
            return;
        }
        self.property_type = property_type;
        self.nested = None;
        drop_keywords(&mut self.constraints, property_type.body_keywords(), &self.name);

        let enum_fits = match (property_type.primitive(), self.enum_values()) {
            (_, None) => true,
            (Some(ty), Some(values)) => values.iter().all(|v| ty.accepts(v)),
            (None, Some(_)) => false,
        };
        if !enum_fits {
            debug!("dropping enum of `{}` after retype to {property_type}", self.name);
            self.constraints.remove("enum");
        }
    }

    /// Change the array element type, discarding carried item structure.
    pub fn set_array_item_type(&mut self, ty: PrimitiveType) {
        self.array_item_type = ty;
        self.nested = None;
    }

    /// Schema for this row's property.
    pub fn to_schema(&self) -> SchemaValue {
        let mut constraints = self.constraints.clone();
        let title = match constraints.remove("title") {
            Some(Value::String(title)) => Some(title),
            Some(other) => {
                constraints.insert("title".to_string(), other);
                None
            }
            None => None,
        };

        let kind = match self.property_type {
            PropertyType::Array => {
                SchemaKind::Array(Box::new(join_items(self.array_item_type, &self.nested)))
            }
            PropertyType::Object => match self.nested.as_ref().map(|n| &n.kind) {
                Some(SchemaKind::Object(obj)) => SchemaKind::Object(obj.clone()),
                _ => SchemaKind::Object(ObjectSchema::default()),
            },
            primitive => primitive
                .primitive()
                .map(SchemaKind::from)
                .unwrap_or(SchemaKind::String),
        };

        SchemaValue {
            title,
            description: self.description.clone(),
            kind,
            extra: constraints,
        }
    }

    /// Row for a property subschema.
    pub fn from_schema(id: ItemId, name: &str, schema: &SchemaValue, required: bool) -> Self {
        let mut constraints = schema.extra.clone();
        if let Some(title) = &schema.title {
            constraints.insert("title".to_string(), Value::String(title.clone()));
        }

        let mut item = PropertyItem {
            id,
            name: name.to_string(),
            property_type: PropertyType::default(),
            required,
            description: schema.description.clone(),
            array_item_type: PrimitiveType::default(),
            constraints,
            nested: None,
        };

        match &schema.kind {
            SchemaKind::Object(obj) => {
                item.property_type = PropertyType::Object;
                item.nested = Some(SchemaValue::new(SchemaKind::Object(obj.clone())));
            }
            SchemaKind::Array(items) => {
                item.property_type = PropertyType::Array;
                (item.array_item_type, item.nested) = split_items(items);
            }
            other => {
                if let Some(ty) = other.primitive_type() {
                    item.property_type = ty.into();
                }
            }
        }
        item
    }
}

/// Top-level metadata of the edited schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopLevel {
    /// Schema `title`.
    pub title: Option<String>,
    /// Schema `description`.
    pub description: Option<String>,
    /// Whether the schema is an object or an array.
    pub schema_type: RootType,
    /// Element type when the schema itself is an array.
    pub array_item_type: PrimitiveType,
    /// Root keywords the visual editor does not edit (`$schema`, ...).
    pub constraints: Constraints,
    /// Non-primitive root array items, carried through unchanged.
    pub nested_items: Option<SchemaValue>,
}

impl TopLevel {
    /// Switch the root between object and array.
    ///
    /// Carried root keywords the new kind emits itself are dropped.
    pub fn set_schema_type(&mut self, schema_type: RootType) {
        if self.schema_type == schema_type {
            return;
        }
        self.schema_type = schema_type;
        drop_keywords(&mut self.constraints, schema_type.body_keywords(), "<root>");
    }
}

/// Flatten a schema into top-level metadata and ordered property rows.
///
/// Object roots yield one row per property; array roots yield no rows.
/// Enum-bearing properties are projected onto their primitive type and keep
/// the `enum` list in [`PropertyItem::constraints`].
///
/// # Errors
///
/// Returns [`ProjectionError::UnsupportedRoot`] for scalar roots.
pub fn to_property_items(
    schema: &SchemaValue,
    ids: &mut ItemIds,
) -> Result<(TopLevel, Vec<PropertyItem>), ProjectionError> {
    let mut top = TopLevel {
        title: schema.title.clone(),
        description: schema.description.clone(),
        constraints: schema.extra.clone(),
        ..TopLevel::default()
    };

    match &schema.kind {
        SchemaKind::Object(obj) => {
            let items = obj
                .properties()
                .map(|(name, prop)| {
                    PropertyItem::from_schema(ids.next_id(), name, prop, obj.is_required(name))
                })
                .collect();
            Ok((top, items))
        }
        SchemaKind::Array(items) => {
            top.schema_type = RootType::Array;
            (top.array_item_type, top.nested_items) = split_items(items);
            Ok((top, Vec::new()))
        }
        other => Err(ProjectionError::UnsupportedRoot {
            found: other.type_tag(),
        }),
    }
}

/// Build a schema from top-level metadata and property rows.
///
/// Rows with blank names are skipped. When several rows share a name the last
/// one wins, taking its own position and required flag.
pub fn build_schema(top: &TopLevel, items: &[PropertyItem]) -> SchemaValue {
    let kind = match top.schema_type {
        RootType::Object => {
            let mut obj = ObjectSchema::default();
            for item in items.iter().filter(|item| item.has_name()) {
                obj.insert(item.name.clone(), item.to_schema(), item.required);
            }
            SchemaKind::Object(obj)
        }
        RootType::Array => {
            SchemaKind::Array(Box::new(join_items(top.array_item_type, &top.nested_items)))
        }
    };

    SchemaValue {
        title: top.title.clone(),
        description: top.description.clone(),
        kind,
        extra: top.constraints.clone(),
    }
}

fn drop_keywords(constraints: &mut Constraints, keywords: &[&str], owner: &str) {
    for keyword in keywords {
        if constraints.remove(*keyword).is_some() {
            debug!("dropping carried `{keyword}` of `{owner}`");
        }
    }
}

/// Split an `items` schema into a visual element type and carried structure.
fn split_items(items: &SchemaValue) -> (PrimitiveType, Option<SchemaValue>) {
    let nested = (!items.is_bare_primitive()).then(|| items.clone());
    (items.primitive_type().unwrap_or_default(), nested)
}

fn join_items(ty: PrimitiveType, nested: &Option<SchemaValue>) -> SchemaValue {
    nested
        .clone()
        .unwrap_or_else(|| SchemaValue::primitive(ty))
}
