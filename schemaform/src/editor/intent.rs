use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    data::{
        item::{ItemId, PropertyType, RootType},
        schema::PrimitiveType,
    },
    editor::state::Tab,
};

/// A property row to append.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PropertyDraft {
    /// Property key.
    pub name: String,
    /// Property kind.
    pub property_type: PropertyType,
    /// Whether the property is required.
    pub required: bool,
    /// Property description.
    pub description: Option<String>,
    /// Element type for arrays. Falls back to the session default.
    pub array_item_type: Option<PrimitiveType>,
}

impl PropertyDraft {
    /// Draft with a name and type.
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            ..Self::default()
        }
    }

    /// Builder-style required flag.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

/// A user action dispatched to the editor.
///
/// Serialized with an `op` tag, which is also the format of edit scripts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditIntent {
    /// Append a property row.
    AddProperty(PropertyDraft),
    /// Delete a row.
    RemoveProperty { id: ItemId },
    /// Change a row's key.
    RenameProperty { id: ItemId, name: String },
    /// Change a row's kind.
    SetPropertyType {
        id: ItemId,
        property_type: PropertyType,
    },
    /// Change an array row's element type.
    SetArrayItemType { id: ItemId, item_type: PrimitiveType },
    /// Toggle whether a row is required.
    SetRequired { id: ItemId, required: bool },
    /// Change a row's description. Blank clears it.
    SetPropertyDescription {
        id: ItemId,
        #[serde(default)]
        description: Option<String>,
    },
    /// Move a row to a new index, clamped to the list.
    MoveProperty { id: ItemId, to: usize },
    /// Change the schema title. Blank clears it.
    SetTitle {
        #[serde(default)]
        title: Option<String>,
    },
    /// Change the schema description. Blank clears it.
    SetDescription {
        #[serde(default)]
        description: Option<String>,
    },
    /// Switch the schema between object and array.
    SetRootType { schema_type: RootType },
    /// Change the element type of an array schema.
    SetRootArrayItemType { item_type: PrimitiveType },
    /// Replace the raw text.
    SetRawText { text: String },
    /// Change the active tab.
    SwitchTab { tab: Tab },
}

impl EditIntent {
    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            EditIntent::AddProperty(_) => "add_property",
            EditIntent::RemoveProperty { .. } => "remove_property",
            EditIntent::RenameProperty { .. } => "rename_property",
            EditIntent::SetPropertyType { .. } => "set_property_type",
            EditIntent::SetArrayItemType { .. } => "set_array_item_type",
            EditIntent::SetRequired { .. } => "set_required",
            EditIntent::SetPropertyDescription { .. } => "set_property_description",
            EditIntent::MoveProperty { .. } => "move_property",
            EditIntent::SetTitle { .. } => "set_title",
            EditIntent::SetDescription { .. } => "set_description",
            EditIntent::SetRootType { .. } => "set_root_type",
            EditIntent::SetRootArrayItemType { .. } => "set_root_array_item_type",
            EditIntent::SetRawText { .. } => "set_raw_text",
            EditIntent::SwitchTab { .. } => "switch_tab",
        }
    }

    /// The tab this intent requires, or `None` if it is valid on both.
    pub fn required_tab(&self) -> Option<Tab> {
        match self {
            EditIntent::SwitchTab { .. } => None,
            EditIntent::SetRawText { .. } => Some(Tab::Raw),
            _ => Some(Tab::Visual),
        }
    }
}
