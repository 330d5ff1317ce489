//! Editing session that keeps property rows and raw text in sync.
//!
//! The visual tab projects rows onto raw text after every edit. The raw tab
//! only re-parses; its text replaces the rows when the user switches back to
//! the visual tab, and that switch is refused while the text is not a usable
//! schema. Invalid raw text therefore never reaches the rows.

use crate::{
    config::EditorConfig,
    data::{
        codec::{ParseError, SchemaCodec},
        item::{ItemId, ItemIds, PropertyItem, build_schema, to_property_items},
        schema::{PrimitiveType, SchemaValue},
    },
    error::{EditorError, ProjectionError},
};

/// Edit intents.
pub mod intent;

/// Observable session state.
pub mod state;

pub use intent::{EditIntent, PropertyDraft};
pub use state::{EditorState, Tab};

/// One editing session over a schema.
#[derive(Debug, Clone)]
pub struct SchemaEditor {
    state: EditorState,
    codec: SchemaCodec,
    ids: ItemIds,
    pretty: bool,
    default_array_item_type: PrimitiveType,
}

impl SchemaEditor {
    /// Start a session for a new, empty schema.
    pub fn new(config: &EditorConfig) -> Self {
        let mut editor = Self::blank(config);
        editor.refresh_from_items();
        editor
    }

    /// Start a session seeded from an existing schema.
    ///
    /// Schemas the rows cannot represent open on the raw tab.
    pub fn with_schema(config: &EditorConfig, schema: &SchemaValue) -> Self {
        let mut editor = Self::blank(config);
        match editor.load_rows(schema) {
            Ok(()) if editor.state.active_tab == Tab::Visual => editor.refresh_from_items(),
            Ok(()) => {
                editor.state.raw_text = editor.codec.stringify(Some(schema), editor.pretty);
                editor.refresh_from_text();
            }
            Err(e) => {
                warn!("opening on the raw tab: {e}");
                editor.state.active_tab = Tab::Raw;
                editor.state.raw_text = editor.codec.stringify(Some(schema), editor.pretty);
                editor.refresh_from_text();
            }
        }
        editor
    }

    /// Start a session seeded from schema text.
    ///
    /// Text that does not parse or cannot be shown as rows opens on the raw
    /// tab unchanged. Parse failures are reported in
    /// [`raw_parse_error`](EditorState::raw_parse_error).
    pub fn with_text(config: &EditorConfig, text: &str) -> Self {
        let mut editor = Self::blank(config);
        let loaded = editor
            .codec
            .parse(text)
            .map_err(|e| e.to_string())
            .and_then(|schema| editor.load_rows(&schema).map_err(|e| e.to_string()));

        match loaded {
            Ok(()) if editor.state.active_tab == Tab::Visual => editor.refresh_from_items(),
            Ok(()) => {
                editor.state.raw_text = text.to_string();
                editor.refresh_from_text();
            }
            Err(e) => {
                debug!("opening on the raw tab: {e}");
                editor.state.active_tab = Tab::Raw;
                editor.state.raw_text = text.to_string();
                editor.refresh_from_text();
            }
        }
        editor
    }

    fn blank(config: &EditorConfig) -> Self {
        Self {
            state: EditorState::empty(config.initial_tab),
            codec: SchemaCodec::new(config.indent_width),
            ids: ItemIds::default(),
            pretty: config.pretty,
            default_array_item_type: config.default_array_item_type,
        }
    }

    /// Current session state.
    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Schema the session currently describes.
    ///
    /// `None` while the raw tab holds text that does not parse.
    pub fn current_schema(&self) -> Option<&SchemaValue> {
        self.state.current_schema.as_ref()
    }

    /// Look up a row.
    pub fn item(&self, id: ItemId) -> Option<&PropertyItem> {
        self.state.items.iter().find(|item| item.id == id)
    }

    /// Whether a tab control should allow switching right now.
    pub fn can_switch_tab(&self) -> bool {
        match self.state.active_tab {
            Tab::Visual => true,
            Tab::Raw => self
                .state
                .current_schema
                .as_ref()
                .is_some_and(|schema| to_property_items(schema, &mut ItemIds::default()).is_ok()),
        }
    }

    /// The schema to hand to the host.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::UncommittableSchema`] when the raw tab is active
    /// and its text does not parse.
    pub fn commit(&self) -> Result<SchemaValue, EditorError> {
        match self.state.active_tab {
            Tab::Visual => Ok(build_schema(&self.state.top_level, &self.state.items)),
            Tab::Raw => self
                .codec
                .parse(&self.state.raw_text)
                .map_err(|e| EditorError::UncommittableSchema(e.to_string())),
        }
    }

    /// Change the active tab.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::TabSwitchRefused`] when leaving the raw tab with
    /// text that does not parse or cannot be shown as rows. The raw tab stays
    /// active and the rows are untouched.
    pub fn switch_tab(&mut self, tab: Tab) -> Result<&EditorState, EditorError> {
        self.apply_edit(EditIntent::SwitchTab { tab })
    }

    /// Apply one user intent and recompute the derived state.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::WrongTab`] for intents of the inactive tab,
    /// [`EditorError::UnknownItem`] for ids with no row, and
    /// [`EditorError::TabSwitchRefused`] as described in [`Self::switch_tab`].
    /// A rejected intent leaves the rows and raw text unchanged.
    pub fn apply_edit(&mut self, intent: EditIntent) -> Result<&EditorState, EditorError> {
        trace!("apply {}", intent.name());
        if let Some(tab) = intent.required_tab()
            && tab != self.state.active_tab
        {
            return Err(EditorError::WrongTab {
                intent: intent.name(),
                active: self.state.active_tab,
            });
        }

        match intent {
            EditIntent::SwitchTab { tab } => return self.change_tab(tab),
            EditIntent::SetRawText { text } => {
                self.state.raw_text = text;
                self.refresh_from_text();
                return Ok(&self.state);
            }
            EditIntent::AddProperty(draft) => {
                let id = self.ids.next_id();
                let mut item = PropertyItem::new(id, draft.name, draft.property_type)
                    .required(draft.required)
                    .with_array_item_type(
                        draft
                            .array_item_type
                            .unwrap_or(self.default_array_item_type),
                    );
                item.description = non_blank(draft.description);
                self.state.items.push(item);
            }
            EditIntent::RemoveProperty { id } => {
                let idx = self.position(id)?;
                self.state.items.remove(idx);
            }
            EditIntent::RenameProperty { id, name } => self.item_mut(id)?.name = name,
            EditIntent::SetPropertyType { id, property_type } => {
                self.item_mut(id)?.retype(property_type);
            }
            EditIntent::SetArrayItemType { id, item_type } => {
                self.item_mut(id)?.set_array_item_type(item_type);
            }
            EditIntent::SetRequired { id, required } => self.item_mut(id)?.required = required,
            EditIntent::SetPropertyDescription { id, description } => {
                self.item_mut(id)?.description = non_blank(description);
            }
            EditIntent::MoveProperty { id, to } => {
                let idx = self.position(id)?;
                let item = self.state.items.remove(idx);
                let to = to.min(self.state.items.len());
                self.state.items.insert(to, item);
            }
            EditIntent::SetTitle { title } => self.state.top_level.title = non_blank(title),
            EditIntent::SetDescription { description } => {
                self.state.top_level.description = non_blank(description);
            }
            EditIntent::SetRootType { schema_type } => {
                self.state.top_level.set_schema_type(schema_type);
            }
            EditIntent::SetRootArrayItemType { item_type } => {
                self.state.top_level.array_item_type = item_type;
                self.state.top_level.nested_items = None;
            }
        }

        self.refresh_from_items();
        Ok(&self.state)
    }

    fn change_tab(&mut self, tab: Tab) -> Result<&EditorState, EditorError> {
        if tab == self.state.active_tab {
            return Ok(&self.state);
        }

        match tab {
            Tab::Raw => {
                debug!("switching to the raw tab");
                self.refresh_from_items();
                self.state.active_tab = Tab::Raw;
            }
            Tab::Visual => {
                let schema = match self.codec.parse(&self.state.raw_text) {
                    Ok(schema) => schema,
                    Err(e) => return Err(self.refuse_switch(e.to_string())),
                };
                if let Err(e) = self.load_rows(&schema) {
                    return Err(self.refuse_switch(e.to_string()));
                }
                debug!(
                    "switching to the visual tab with {} properties",
                    self.state.items.len()
                );
                self.state.active_tab = Tab::Visual;
                self.refresh_from_items();
            }
        }
        Ok(&self.state)
    }

    fn refuse_switch(&mut self, reason: String) -> EditorError {
        warn!("staying on the raw tab: {reason}");
        self.state.raw_parse_error = Some(reason.clone());
        EditorError::TabSwitchRefused(reason)
    }

    /// Replace rows and top-level metadata with a projection of `schema`.
    fn load_rows(&mut self, schema: &SchemaValue) -> Result<(), ProjectionError> {
        let (top_level, items) = to_property_items(schema, &mut self.ids)?;
        self.state.top_level = top_level;
        self.state.items = items;
        Ok(())
    }

    /// Visual tab: rows are authoritative, raw text follows.
    fn refresh_from_items(&mut self) {
        let schema = build_schema(&self.state.top_level, &self.state.items);
        self.state.raw_text = self.codec.stringify(Some(&schema), self.pretty);
        self.state.raw_parse_error = None;
        self.state.current_schema = Some(schema);
    }

    /// Raw tab: text is authoritative, rows are left alone.
    fn refresh_from_text(&mut self) {
        match self.codec.parse(&self.state.raw_text) {
            Ok(schema) => {
                self.state.current_schema = Some(schema);
                self.state.raw_parse_error = None;
            }
            Err(ParseError::EmptyInput) => {
                self.state.current_schema = None;
                self.state.raw_parse_error = None;
            }
            Err(e) => {
                self.state.current_schema = None;
                self.state.raw_parse_error = Some(e.to_string());
            }
        }
    }

    fn position(&self, id: ItemId) -> Result<usize, EditorError> {
        self.state
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(EditorError::UnknownItem(id))
    }

    fn item_mut(&mut self, id: ItemId) -> Result<&mut PropertyItem, EditorError> {
        self.state
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(EditorError::UnknownItem(id))
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|s| !s.trim().is_empty())
}
