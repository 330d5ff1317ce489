use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use serde_json::{Map, Value, ser::PrettyFormatter};
use thiserror::Error;

use crate::data::schema::{Constraints, ObjectSchema, PrimitiveType, SchemaKind, SchemaValue};

/// Smallest indent width accepted for pretty output.
pub const MIN_INDENT: usize = 2;

const SCALAR_KEYWORDS: &[&str] = &["type", "title", "description"];
const OBJECT_KEYWORDS: &[&str] = &["type", "title", "description", "properties", "required"];
const ARRAY_KEYWORDS: &[&str] = &["type", "title", "description", "items"];

/// Failure to turn text into a [`SchemaValue`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The text is blank.
    #[error("schema text is empty")]
    EmptyInput,
    /// The text is not syntactically valid JSON.
    #[error("malformed JSON: {message}")]
    MalformedJson { message: String },
    /// Valid JSON that does not describe a supported schema.
    #[error("invalid schema at `{path}`: {message}")]
    SchemaShape { path: SchemaPath, message: String },
}

/// Dot-joined location of a node inside a schema document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaPath(Vec<String>);

impl SchemaPath {
    /// Path of the document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Path extended by one key.
    pub fn child(&self, key: impl fmt::Display) -> Self {
        let mut segments = self.0.clone();
        segments.push(key.to_string());
        Self(segments)
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.0.join("."))
        }
    }
}

/// Text codec for schemas.
///
/// Emits schema keywords in lexicographic order so equal schemas always
/// produce identical text. Entries inside `properties` keep their declaration
/// order and `required` lists names in that same order.
#[derive(Debug, Clone)]
pub struct SchemaCodec {
    indent: String,
}

impl Default for SchemaCodec {
    fn default() -> Self {
        Self::new(MIN_INDENT)
    }
}

impl SchemaCodec {
    /// Create a codec with the given pretty-print indent width.
    ///
    /// Widths below [`MIN_INDENT`] are raised to it.
    pub fn new(indent_width: usize) -> Self {
        Self {
            indent: " ".repeat(indent_width.max(MIN_INDENT)),
        }
    }

    /// Indent width used for pretty output.
    pub fn indent_width(&self) -> usize {
        self.indent.len()
    }

    /// Parse schema text.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::EmptyInput`] for blank text,
    /// [`ParseError::MalformedJson`] for invalid JSON and
    /// [`ParseError::SchemaShape`] when the JSON is not a supported schema.
    pub fn parse(&self, text: &str) -> Result<SchemaValue, ParseError> {
        if text.trim().is_empty() {
            return Err(ParseError::EmptyInput);
        }
        let json: Value = serde_json::from_str(text).map_err(|e| ParseError::MalformedJson {
            message: e.to_string(),
        })?;
        from_json_value(&json)
    }

    /// Render a schema as text. `None` renders as the empty string.
    pub fn stringify(&self, schema: Option<&SchemaValue>, pretty: bool) -> String {
        let Some(schema) = schema else {
            return String::new();
        };
        let value = to_json_value(schema);

        let encoded = if pretty {
            let mut buf = Vec::new();
            let formatter = PrettyFormatter::with_indent(self.indent.as_bytes());
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
            value
                .serialize(&mut ser)
                .map_err(|e| e.to_string())
                .and_then(|_| String::from_utf8(buf).map_err(|e| e.to_string()))
        } else {
            serde_json::to_string(&value).map_err(|e| e.to_string())
        };

        encoded.unwrap_or_else(|e| {
            error!("failed to encode schema: {e}");
            String::new()
        })
    }
}

/// Parse schema text with the default codec.
pub fn parse(text: &str) -> Result<SchemaValue, ParseError> {
    SchemaCodec::default().parse(text)
}

/// Stringify with the default codec.
pub fn stringify(schema: Option<&SchemaValue>, pretty: bool) -> String {
    SchemaCodec::default().stringify(schema, pretty)
}

/// Convert an already-decoded JSON document into a schema.
///
/// # Errors
///
/// Returns [`ParseError::SchemaShape`] when the value is not a supported schema.
pub fn from_json_value(value: &Value) -> Result<SchemaValue, ParseError> {
    parse_node(value, &SchemaPath::root())
}

/// Convert a schema into a JSON document with sorted keywords.
pub fn to_json_value(schema: &SchemaValue) -> Value {
    let mut keywords: BTreeMap<&str, Value> = schema
        .extra
        .iter()
        .map(|(k, v)| (k.as_str(), v.clone()))
        .collect();

    if let Some(title) = &schema.title {
        keywords.insert("title", Value::String(title.clone()));
    }
    if let Some(description) = &schema.description {
        keywords.insert("description", Value::String(description.clone()));
    }
    keywords.insert("type", Value::String(schema.kind.type_tag().to_string()));

    match &schema.kind {
        SchemaKind::Object(obj) => {
            let properties: Map<String, Value> = obj
                .properties()
                .map(|(name, prop)| (name.to_string(), to_json_value(prop)))
                .collect();
            // `required` is a set; property order makes it canonical.
            let required = obj
                .properties()
                .filter(|(name, _)| obj.is_required(name))
                .map(|(name, _)| Value::String(name.to_string()))
                .collect();
            keywords.insert("properties", Value::Object(properties));
            keywords.insert("required", Value::Array(required));
        }
        SchemaKind::Array(items) => {
            keywords.insert("items", to_json_value(items));
        }
        SchemaKind::String | SchemaKind::Number | SchemaKind::Integer | SchemaKind::Boolean => {}
    }

    Value::Object(
        keywords
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}

fn shape(path: SchemaPath, message: impl Into<String>) -> ParseError {
    ParseError::SchemaShape {
        path,
        message: message.into(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn parse_node(value: &Value, path: &SchemaPath) -> Result<SchemaValue, ParseError> {
    let Value::Object(map) = value else {
        return Err(shape(
            path.clone(),
            format!("expected a schema object, found {}", json_kind(value)),
        ));
    };

    let tag = match map.get("type") {
        Some(Value::String(tag)) => tag.clone(),
        Some(other) => {
            return Err(shape(
                path.child("type"),
                format!("expected a single type tag string, found {}", json_kind(other)),
            ));
        }
        None => match map.get("enum") {
            Some(values) => infer_enum_type(values, &path.child("enum"))?
                .type_tag()
                .to_string(),
            None => return Err(shape(path.clone(), "missing required key `type`")),
        },
    };

    let title = optional_string(map, "title", path)?;
    let description = optional_string(map, "description", path)?;

    let kind = match tag.as_str() {
        "object" => SchemaKind::Object(parse_object(map, path)?),
        "array" => {
            let items = map
                .get("items")
                .ok_or_else(|| shape(path.clone(), "array schema is missing `items`"))?;
            SchemaKind::Array(Box::new(parse_node(items, &path.child("items"))?))
        }
        "string" => SchemaKind::String,
        "number" => SchemaKind::Number,
        "integer" => SchemaKind::Integer,
        "boolean" => SchemaKind::Boolean,
        other => {
            return Err(shape(
                path.child("type"),
                format!("unrecognized type tag `{other}`"),
            ));
        }
    };

    let known = match kind {
        SchemaKind::Object(_) => OBJECT_KEYWORDS,
        SchemaKind::Array(_) => ARRAY_KEYWORDS,
        _ => SCALAR_KEYWORDS,
    };

    let extra: Constraints = map
        .iter()
        .filter(|(k, _)| !known.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Ok(SchemaValue {
        title,
        description,
        kind,
        extra,
    })
}

fn parse_object(map: &Map<String, Value>, path: &SchemaPath) -> Result<ObjectSchema, ParseError> {
    let mut obj = ObjectSchema::default();

    match map.get("properties") {
        None => {}
        Some(Value::Object(properties)) => {
            let base = path.child("properties");
            for (name, prop) in properties {
                let schema = parse_node(prop, &base.child(name))?;
                obj.insert(name.clone(), schema, false);
            }
        }
        Some(other) => {
            return Err(shape(
                path.child("properties"),
                format!("expected an object of schemas, found {}", json_kind(other)),
            ));
        }
    }

    match map.get("required") {
        None => {}
        Some(Value::Array(names)) => {
            let base = path.child("required");
            for (idx, name) in names.iter().enumerate() {
                let Value::String(name) = name else {
                    return Err(shape(
                        base.child(idx),
                        format!("expected a property name, found {}", json_kind(name)),
                    ));
                };
                if !obj.mark_required(name) {
                    return Err(shape(
                        base.child(idx),
                        format!("`{name}` is not a declared property"),
                    ));
                }
            }
        }
        Some(other) => {
            return Err(shape(
                path.child("required"),
                format!("expected an array of property names, found {}", json_kind(other)),
            ));
        }
    }

    Ok(obj)
}

fn optional_string(
    map: &Map<String, Value>,
    key: &str,
    path: &SchemaPath,
) -> Result<Option<String>, ParseError> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(shape(
            path.child(key),
            format!("expected a string, found {}", json_kind(other)),
        )),
    }
}

/// Nearest primitive type whose instances cover every enum value.
fn infer_enum_type(values: &Value, path: &SchemaPath) -> Result<PrimitiveType, ParseError> {
    let Value::Array(values) = values else {
        return Err(shape(
            path.clone(),
            format!("expected an array of values, found {}", json_kind(values)),
        ));
    };
    if values.is_empty() {
        return Err(shape(path.clone(), "cannot infer a type from an empty enum"));
    }

    // Integer before number so whole-number enums stay integers.
    [
        PrimitiveType::String,
        PrimitiveType::Boolean,
        PrimitiveType::Integer,
        PrimitiveType::Number,
    ]
    .into_iter()
    .find(|ty| values.iter().all(|v| ty.accepts(v)))
    .ok_or_else(|| shape(path.clone(), "cannot infer a type from mixed enum values"))
}
