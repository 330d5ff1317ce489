//! # schemaform
//!
//! A bidirectional JSON Schema editor engine.
//!
//! A schema can be edited either as an ordered list of property rows (the
//! visual tab) or as raw JSON text (the raw tab). The engine keeps both in
//! sync, validates raw text before it may replace the rows, and hands the
//! committed schema back to its host. It performs no I/O of its own.
//!
//! ## Features
//!
//! - Object schemas with string, number, integer, boolean, array and object properties
//! - Deterministic text output: sorted keywords, declaration-ordered properties
//! - Parse errors that name the offending key path
//! - Unsupported keywords (`enum`, `format`, ...) carried through both tabs
//! - Headless runner for checking, formatting and scripting schema files
//!
//! ## Quick Start
//!
//! ```rust
//! use schemaform::{
//!     config::EditorConfig,
//!     data::PropertyType,
//!     editor::{EditIntent, PropertyDraft, SchemaEditor},
//! };
//!
//! let mut editor = SchemaEditor::new(&EditorConfig::default());
//! editor
//!     .apply_edit(EditIntent::AddProperty(
//!         PropertyDraft::new("row", PropertyType::Integer).required(true),
//!     ))
//!     .unwrap();
//!
//! assert!(editor.state().raw_text.contains("\"row\""));
//! let schema = editor.commit().unwrap();
//! assert!(schema.as_object().unwrap().is_required("row"));
//! ```
//!
//! ## Modules
//!
//! - [`data`] - Schema model, property rows and the text codec
//! - [`editor`] - Editing sessions
//! - [`config`] - Editor configuration
//! - [`error`] - Projection and session errors
//! - [`run`] - File-level operations used by the `schemaform` binary

#[macro_use]
extern crate log;

/// Editor configuration.
pub mod config;

/// Schema data structures, property rows and the text codec.
pub mod data;

/// Editing sessions over a schema.
pub mod editor;

/// Projection and session errors.
pub mod error;

/// File-level operations: check, format, list rows, replay edit scripts.
pub mod run;

pub use data::{SchemaValue, parse, stringify};
pub use editor::SchemaEditor;
pub use serde_json::Value;
