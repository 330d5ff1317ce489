use pretty_assertions::assert_eq;
use schemaform::{
    config::EditorConfig,
    data::{ItemId, PrimitiveType, PropertyType, RootType, SchemaKind, parse, stringify},
    editor::{EditIntent, EditorState, PropertyDraft, SchemaEditor, Tab},
    error::EditorError,
};
use serde_json::json;

fn session() -> SchemaEditor {
    SchemaEditor::new(&EditorConfig::default())
}

fn add(editor: &mut SchemaEditor, draft: PropertyDraft) -> ItemId {
    editor.apply_edit(EditIntent::AddProperty(draft)).unwrap();
    editor.state().items.last().unwrap().id
}

fn set_raw(editor: &mut SchemaEditor, text: &str) -> EditorState {
    editor
        .apply_edit(EditIntent::SetRawText { text: text.into() })
        .unwrap()
        .clone()
}

#[test]
fn visual_edit_updates_raw_text_immediately() {
    let mut editor = session();
    add(
        &mut editor,
        PropertyDraft::new("row", PropertyType::Integer).required(true),
    );

    let raw = parse(&editor.state().raw_text).unwrap();
    let obj = raw.as_object().unwrap();
    assert_eq!(obj.get("row").unwrap().kind, SchemaKind::Integer);
    assert!(obj.is_required("row"));
    assert_eq!(editor.state().raw_parse_error, None);
    assert_eq!(editor.current_schema(), Some(&raw));
}

#[test]
fn empty_schema_commits() {
    let editor = session();
    let schema = editor.commit().unwrap();
    assert_eq!(
        stringify(Some(&schema), false),
        r#"{"properties":{},"required":[],"type":"object"}"#
    );
}

#[test]
fn invalid_raw_text_cannot_reach_the_rows() {
    let mut editor = session();
    add(&mut editor, PropertyDraft::new("shelf", PropertyType::String));
    let before = editor.state().items.clone();

    editor.switch_tab(Tab::Raw).unwrap();
    let state = set_raw(&mut editor, "{invalid json");
    assert!(state.raw_parse_error.is_some());
    assert_eq!(state.current_schema, None);
    assert!(!editor.can_switch_tab());

    let err = editor.switch_tab(Tab::Visual).unwrap_err();
    assert!(matches!(err, EditorError::TabSwitchRefused(_)));
    assert_eq!(editor.state().active_tab, Tab::Raw);
    assert!(!editor.state().raw_parse_error.as_deref().unwrap().is_empty());
    assert_eq!(editor.state().items, before);
    assert_eq!(editor.state().raw_text, "{invalid json");
}

#[test]
fn shape_error_blocks_switch_and_commit() {
    let mut editor = session();
    editor.switch_tab(Tab::Raw).unwrap();
    let state = set_raw(
        &mut editor,
        r#"{"type":"object","properties":{"bin":{"type":"strin"}}}"#,
    );
    assert!(
        state
            .raw_parse_error
            .as_deref()
            .unwrap()
            .contains("properties.bin.type")
    );

    assert!(editor.switch_tab(Tab::Visual).is_err());
    assert!(matches!(
        editor.commit(),
        Err(EditorError::UncommittableSchema(_))
    ));
}

#[test]
fn raw_edits_do_not_touch_rows_until_switch() {
    let mut editor = session();
    add(&mut editor, PropertyDraft::new("old", PropertyType::String));
    editor.switch_tab(Tab::Raw).unwrap();

    let text = r#"{"type":"object","title":"Bin","properties":{"aisle":{"type":"integer"},"level":{"type":"number"}},"required":["aisle"]}"#;
    let state = set_raw(&mut editor, text);
    assert_eq!(state.items.len(), 1);
    assert_eq!(state.items[0].name, "old");
    assert_eq!(state.raw_parse_error, None);

    let committed = editor.commit().unwrap();
    assert_eq!(committed, parse(text).unwrap());

    editor.switch_tab(Tab::Visual).unwrap();
    let names: Vec<_> = editor
        .state()
        .items
        .iter()
        .map(|i| i.name.as_str())
        .collect();
    assert_eq!(names, ["aisle", "level"]);
    assert_eq!(editor.state().top_level.title.as_deref(), Some("Bin"));
    assert!(editor.state().items[0].required);
    assert_eq!(editor.commit().unwrap(), committed);
}

#[test]
fn raw_error_clears_when_fixed() {
    let mut editor = session();
    editor.switch_tab(Tab::Raw).unwrap();
    assert!(set_raw(&mut editor, "{").raw_parse_error.is_some());
    let state = set_raw(&mut editor, r#"{"type":"object"}"#);
    assert_eq!(state.raw_parse_error, None);
    assert!(editor.can_switch_tab());
}

#[test]
fn visual_to_raw_always_allowed() {
    let mut editor = session();
    add(&mut editor, PropertyDraft::new("", PropertyType::String));
    let state = editor.switch_tab(Tab::Raw).unwrap();
    assert_eq!(state.active_tab, Tab::Raw);
    assert_eq!(state.raw_parse_error, None);
    assert!(parse(&state.raw_text).is_ok());
}

#[test]
fn duplicate_and_blank_names_in_session() {
    let mut editor = session();
    add(&mut editor, PropertyDraft::new("a", PropertyType::String));
    add(
        &mut editor,
        PropertyDraft::new("a", PropertyType::Integer).required(true),
    );
    add(&mut editor, PropertyDraft::new("", PropertyType::Boolean));

    let schema = editor.commit().unwrap();
    let obj = schema.as_object().unwrap();
    assert_eq!(obj.len(), 1);
    assert_eq!(obj.get("a").unwrap().kind, SchemaKind::Integer);
    assert!(obj.is_required("a"));
    // All three rows stay editable.
    assert_eq!(editor.state().items.len(), 3);
}

#[test]
fn round_trip_after_edit_sequence() {
    let mut editor = session();
    editor
        .apply_edit(EditIntent::SetTitle {
            title: Some("Position".into()),
        })
        .unwrap();
    editor
        .apply_edit(EditIntent::SetDescription {
            description: Some("Where an item is stored".into()),
        })
        .unwrap();
    let zone = add(
        &mut editor,
        PropertyDraft::new("zone", PropertyType::String).required(true),
    );
    let tags = add(&mut editor, PropertyDraft::new("tags", PropertyType::Array));
    add(&mut editor, PropertyDraft::new("fragile", PropertyType::Boolean));
    editor
        .apply_edit(EditIntent::SetArrayItemType {
            id: tags,
            item_type: PrimitiveType::Integer,
        })
        .unwrap();
    editor
        .apply_edit(EditIntent::SetPropertyDescription {
            id: zone,
            description: Some("Warehouse zone".into()),
        })
        .unwrap();
    editor
        .apply_edit(EditIntent::MoveProperty { id: zone, to: 2 })
        .unwrap();
    editor
        .apply_edit(EditIntent::SetRequired {
            id: tags,
            required: true,
        })
        .unwrap();

    let schema = editor.commit().unwrap();
    let pretty = stringify(Some(&schema), true);
    assert_eq!(parse(&pretty).unwrap(), schema);
    assert_eq!(stringify(Some(&parse(&pretty).unwrap()), true), pretty);
    assert_eq!(editor.state().raw_text, pretty);

    let obj = schema.as_object().unwrap();
    let names: Vec<_> = obj.properties().map(|(k, _)| k).collect();
    assert_eq!(names, ["tags", "fragile", "zone"]);
}

#[test]
fn enum_survives_visual_round_trip() {
    let text = r#"{"type":"object","properties":{"size":{"enum":["S","M","L"]}}}"#;
    let mut editor = SchemaEditor::with_text(&EditorConfig::default(), text);
    assert_eq!(editor.state().active_tab, Tab::Visual);

    let size = &editor.state().items[0];
    assert_eq!(size.property_type, PropertyType::String);
    assert_eq!(size.enum_values().unwrap(), &[json!("S"), json!("M"), json!("L")]);

    let id = size.id;
    editor
        .apply_edit(EditIntent::SetRequired { id, required: true })
        .unwrap();
    let schema = editor.commit().unwrap();
    let size = schema.as_object().unwrap().get("size").unwrap();
    assert_eq!(size.extra.get("enum"), Some(&json!(["S", "M", "L"])));
}

#[test]
fn nested_object_survives_tab_cycle() {
    let text = r#"{
        "type": "object",
        "properties": {
            "dimensions": {
                "type": "object",
                "properties": {"w": {"type": "number"}, "h": {"type": "number"}},
                "required": ["w"]
            }
        }
    }"#;
    let mut editor = session();
    editor.switch_tab(Tab::Raw).unwrap();
    set_raw(&mut editor, text);
    editor.switch_tab(Tab::Visual).unwrap();
    assert_eq!(
        editor.state().items[0].property_type,
        PropertyType::Object
    );

    editor.switch_tab(Tab::Raw).unwrap();
    assert_eq!(parse(&editor.state().raw_text).unwrap(), parse(text).unwrap());
}

#[test]
fn configured_indent_and_initial_tab() {
    let config = EditorConfig::from_toml_str("indent_width = 4\ninitial_tab = \"raw\"").unwrap();
    let editor = SchemaEditor::new(&config);
    assert_eq!(editor.state().active_tab, Tab::Raw);
    assert!(editor.state().raw_text.contains("\n    \"properties\""));
    assert!(editor.commit().is_ok());
}

fn assert_consistent(editor: &SchemaEditor, step: &str) {
    let committed = editor.commit().unwrap();
    let text = stringify(Some(&committed), true);
    assert_eq!(parse(&text).unwrap(), committed, "round trip after {step}");
    assert_eq!(
        editor.current_schema(),
        Some(&parse(&editor.state().raw_text).unwrap()),
        "raw text out of sync after {step}"
    );
}

#[test]
fn every_visual_intent_keeps_text_and_schema_in_sync() {
    let text = r#"{
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "title": "Bin",
        "properties": {
            "code": {"type": "string", "items": {"type": "integer"}, "properties": {}, "pattern": "^B"},
            "tags": {"type": "array", "items": {"type": "string"}, "required": ["x"], "maxItems": 4},
            "size": {"enum": ["S", "M"]},
            "meta": {"type": "object", "properties": {"n": {"type": "number"}}, "items": true}
        },
        "required": ["size", "code"],
        "items": {"type": "integer"}
    }"#;
    let mut editor = SchemaEditor::with_text(&EditorConfig::default(), text);
    assert_eq!(editor.state().active_tab, Tab::Visual);
    assert_consistent(&editor, "load");

    let ids: Vec<ItemId> = editor.state().items.iter().map(|i| i.id).collect();
    let (code, tags, size, meta) = (ids[0], ids[1], ids[2], ids[3]);

    let steps = [
        EditIntent::SetPropertyType {
            id: code,
            property_type: PropertyType::Array,
        },
        EditIntent::SetPropertyType {
            id: code,
            property_type: PropertyType::Object,
        },
        EditIntent::SetPropertyType {
            id: tags,
            property_type: PropertyType::Object,
        },
        EditIntent::SetPropertyType {
            id: meta,
            property_type: PropertyType::Array,
        },
        EditIntent::SetArrayItemType {
            id: meta,
            item_type: PrimitiveType::Boolean,
        },
        EditIntent::SetPropertyType {
            id: size,
            property_type: PropertyType::Integer,
        },
        EditIntent::SetRequired {
            id: tags,
            required: true,
        },
        EditIntent::RenameProperty {
            id: size,
            name: "width".into(),
        },
        EditIntent::SetPropertyDescription {
            id: code,
            description: Some("Bin code".into()),
        },
        EditIntent::MoveProperty { id: meta, to: 0 },
        EditIntent::AddProperty(PropertyDraft::new("code", PropertyType::Boolean)),
        EditIntent::RemoveProperty { id: tags },
        EditIntent::SetTitle { title: None },
        EditIntent::SetDescription {
            description: Some("Storage bin".into()),
        },
        EditIntent::SetRootType {
            schema_type: RootType::Array,
        },
        EditIntent::SetRootArrayItemType {
            item_type: PrimitiveType::Number,
        },
        EditIntent::SetRootType {
            schema_type: RootType::Object,
        },
    ];

    for intent in steps {
        let name = intent.name();
        editor.apply_edit(intent).unwrap();
        assert_consistent(&editor, name);
    }

    editor.switch_tab(Tab::Raw).unwrap();
    editor.switch_tab(Tab::Visual).unwrap();
    assert_consistent(&editor, "tab cycle");
}

#[test]
fn root_retype_drops_colliding_keywords() {
    let text = r#"{"type":"array","items":{"type":"string"},"required":["ghost"],"minItems":1}"#;
    let mut editor = SchemaEditor::with_text(&EditorConfig::default(), text);
    editor
        .apply_edit(EditIntent::SetRootType {
            schema_type: RootType::Object,
        })
        .unwrap();

    let schema = editor.commit().unwrap();
    assert!(schema.extra.get("required").is_none());
    assert_eq!(schema.extra.get("minItems"), Some(&json!(1)));
    assert_eq!(editor.current_schema(), Some(&schema));
    assert_eq!(parse(&editor.state().raw_text).unwrap(), schema);
}
