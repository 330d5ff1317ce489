//! Error types for projection and editing sessions.

use thiserror::Error;

use crate::{data::item::ItemId, editor::Tab};

/// A schema that parses but cannot be shown in the visual editor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    /// The root is a scalar; only object and array roots are editable.
    #[error("the visual editor cannot edit a `{found}` root, only object or array schemas")]
    UnsupportedRoot { found: &'static str },
}

/// Errors returned by [`SchemaEditor`](crate::editor::SchemaEditor).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    /// The host asked for the schema while the raw text does not parse.
    #[error("schema cannot be committed: {0}")]
    UncommittableSchema(String),

    /// Leaving raw mode was refused because the text is not a usable schema.
    #[error("cannot switch to the visual editor: {0}")]
    TabSwitchRefused(String),

    /// The intent belongs to the other tab.
    #[error("`{intent}` is not accepted while the {active} tab is active")]
    WrongTab { intent: &'static str, active: Tab },

    /// No row with this id exists.
    #[error("no property with id {0}")]
    UnknownItem(ItemId),
}
