//! Schema data structures and their conversions.
//!
//! - [`schema`] - In-memory model of the supported JSON Schema subset
//! - [`item`] - Flattened property rows used by the visual editor
//! - [`codec`] - Text parsing and canonical stringification

/// Schema value model.
pub mod schema;

/// Property rows and the schema <-> rows conversions.
pub mod item;

/// JSON text codec.
pub mod codec;

pub use codec::{ParseError, SchemaCodec, parse, stringify};
pub use item::{
    ItemId, PropertyItem, PropertyType, RootType, TopLevel, build_schema, to_property_items,
};
pub use schema::{Constraints, ObjectSchema, PrimitiveType, SchemaKind, SchemaValue};
