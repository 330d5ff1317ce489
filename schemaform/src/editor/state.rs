use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::data::{
    item::{PropertyItem, TopLevel},
    schema::SchemaValue,
};

/// Which representation is being edited.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    /// Property rows are authoritative.
    #[default]
    Visual,
    /// Raw JSON text is authoritative.
    Raw,
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tab::Visual => f.write_str("visual"),
            Tab::Raw => f.write_str("raw"),
        }
    }
}

/// Everything a presentation layer needs to render an editing session.
///
/// Only [`SchemaEditor`](super::SchemaEditor) mutates it; hosts get a shared
/// reference between intents.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    /// Title, description and root shape.
    pub top_level: TopLevel,
    /// Property rows in display order.
    pub items: Vec<PropertyItem>,
    /// Schema text. Mirrors the rows while the visual tab is active.
    pub raw_text: String,
    /// Active tab.
    pub active_tab: Tab,
    /// Why the raw text is not a usable schema. Always `None` on the visual tab.
    pub raw_parse_error: Option<String>,
    /// Schema the session currently describes, if any.
    pub current_schema: Option<SchemaValue>,
}

impl EditorState {
    pub(crate) fn empty(active_tab: Tab) -> Self {
        Self {
            top_level: TopLevel::default(),
            items: Vec::new(),
            raw_text: String::new(),
            active_tab,
            raw_parse_error: None,
            current_schema: None,
        }
    }
}
