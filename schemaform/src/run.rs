use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use anyhow::{Context, bail};

use crate::{
    config::EditorConfig,
    data::{
        codec::ParseError,
        item::{ItemIds, PropertyItem, TopLevel, to_property_items},
        schema::SchemaValue,
    },
    editor::{EditIntent, SchemaEditor},
};

/// Outcome of checking one schema file.
#[derive(Debug)]
pub struct CheckReport {
    /// File that was checked.
    pub path: PathBuf,
    /// Parsed schema or the reason it was rejected.
    pub result: Result<SchemaValue, ParseError>,
}

impl CheckReport {
    /// Whether the file holds a valid schema.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

fn read_schema_text(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Parse every file and report per-file results.
///
/// # Errors
///
/// Only I/O failures are errors; invalid schemas are reported in the result.
pub fn check_files(
    paths: &[impl AsRef<Path>],
    config: &EditorConfig,
) -> anyhow::Result<Vec<CheckReport>> {
    let codec = config.codec();
    paths
        .iter()
        .map(|path| -> anyhow::Result<CheckReport> {
            let path = path.as_ref();
            let text = read_schema_text(path)?;
            let result = codec.parse(&text);
            if let Err(e) = &result {
                debug!("{}: {e}", path.display());
            }
            Ok(CheckReport {
                path: path.to_path_buf(),
                result,
            })
        })
        .collect()
}

/// Canonical text of a schema file.
///
/// # Errors
///
/// Returns an error when the file cannot be read or is not a valid schema.
pub fn format_file(path: impl AsRef<Path>, config: &EditorConfig) -> anyhow::Result<String> {
    let path = path.as_ref();
    let codec = config.codec();
    let schema = codec
        .parse(&read_schema_text(path)?)
        .with_context(|| format!("{} is not a valid schema", path.display()))?;
    Ok(codec.stringify(Some(&schema), config.pretty))
}

/// Property rows of a schema file, as the visual editor would show them.
///
/// # Errors
///
/// Returns an error when the file is not a valid schema or its root cannot
/// be shown as rows.
pub fn load_items(
    path: impl AsRef<Path>,
    config: &EditorConfig,
) -> anyhow::Result<(TopLevel, Vec<PropertyItem>)> {
    let path = path.as_ref();
    let schema = config
        .codec()
        .parse(&read_schema_text(path)?)
        .with_context(|| format!("{} is not a valid schema", path.display()))?;
    let rows = to_property_items(&schema, &mut ItemIds::default())?;
    Ok(rows)
}

/// Replay edit intents over a session and commit the result.
///
/// Stops at the first rejected intent.
///
/// # Errors
///
/// Returns an error naming the index and kind of the rejected intent, or the
/// commit failure.
pub fn replay(
    editor: &mut SchemaEditor,
    intents: impl IntoIterator<Item = EditIntent>,
) -> anyhow::Result<SchemaValue> {
    for (idx, intent) in intents.into_iter().enumerate() {
        let name = intent.name();
        editor
            .apply_edit(intent)
            .with_context(|| format!("intent #{idx} (`{name}`) was rejected"))?;
    }
    Ok(editor.commit()?)
}

/// Run an edit script against a schema file.
///
/// A missing or empty schema file starts a new schema. The script is a JSON
/// array of [`EditIntent`]s; see [`script_schema`].
///
/// # Errors
///
/// Returns an error when the script cannot be read or decoded, or as
/// [`replay`].
pub fn run_script(
    schema_path: impl AsRef<Path>,
    script_path: impl AsRef<Path>,
    config: &EditorConfig,
) -> anyhow::Result<SchemaValue> {
    let schema_path = schema_path.as_ref();
    let script_path = script_path.as_ref();

    let content = if schema_path.exists() {
        read_schema_text(schema_path)?
    } else {
        String::new()
    };

    let mut editor = if content.trim().is_empty() {
        SchemaEditor::new(config)
    } else {
        SchemaEditor::with_text(config, &content)
    };

    let script = fs::read_to_string(script_path)
        .with_context(|| format!("Failed to read {}", script_path.display()))?;
    let intents: Vec<EditIntent> = serde_json::from_str(&script)
        .with_context(|| format!("{} is not a valid edit script", script_path.display()))?;

    info!(
        "replaying {} intents from {}",
        intents.len(),
        script_path.display()
    );
    replay(&mut editor, intents)
}

/// Write schema text, keeping a timestamped copy of any previous file.
///
/// Returns the backup path when one was made.
///
/// # Errors
///
/// Returns an error when the backup or the write fails.
pub fn write_schema(
    path: impl AsRef<Path>,
    text: &str,
    config: &EditorConfig,
) -> anyhow::Result<Option<PathBuf>> {
    let path = path.as_ref();
    if text.is_empty() {
        bail!("refusing to write an empty schema to {}", path.display());
    }

    let mut backup = None;
    if config.backup_on_write && path.exists() {
        let bk = backup_path(path)?;
        fs::copy(path, &bk)
            .with_context(|| format!("Failed to back up {}", path.display()))?;
        backup = Some(bk);
    }

    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(backup)
}

/// First free `<stem>.bk-<secs>[-<n>].<ext>` next to `path`.
///
/// Writes within the same second get a counter suffix instead of replacing
/// the earlier backup.
fn backup_path(path: &Path) -> anyhow::Result<PathBuf> {
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("json");
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)?
        .as_secs();

    let mut candidate = path.with_extension(format!("bk-{secs}.{ext}"));
    let mut n = 1;
    while candidate.exists() {
        candidate = path.with_extension(format!("bk-{secs}-{n}.{ext}"));
        n += 1;
    }
    Ok(candidate)
}

/// JSON Schema of the edit script format.
///
/// # Errors
///
/// Returns an error if the generated schema cannot be serialized.
pub fn script_schema() -> anyhow::Result<String> {
    let schema = schemars::schema_for!(Vec<EditIntent>);
    Ok(serde_json::to_string_pretty(&schema)?)
}

/// JSON Schema of the configuration file format.
///
/// # Errors
///
/// Returns an error if the generated schema cannot be serialized.
pub fn config_schema() -> anyhow::Result<String> {
    let schema = schemars::schema_for!(EditorConfig);
    Ok(serde_json::to_string_pretty(&schema)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_schema_backs_up_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("position.json");
        let config = EditorConfig::default();

        assert_eq!(write_schema(&path, "{}", &config).unwrap(), None);
        let backup = write_schema(&path, "{\"a\":1}", &config).unwrap().unwrap();

        assert_eq!(fs::read_to_string(&backup).unwrap(), "{}");
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_backups_in_same_second_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("position.json");
        let config = EditorConfig::default();

        write_schema(&path, "{}", &config).unwrap();
        let first = write_schema(&path, "[1]", &config).unwrap().unwrap();
        let second = write_schema(&path, "[2]", &config).unwrap().unwrap();
        let third = write_schema(&path, "[3]", &config).unwrap().unwrap();

        assert_ne!(first, second);
        assert_ne!(second, third);
        assert_eq!(fs::read_to_string(&first).unwrap(), "{}");
        assert_eq!(fs::read_to_string(&second).unwrap(), "[1]");
        assert_eq!(fs::read_to_string(&third).unwrap(), "[2]");
    }

    #[test]
    fn test_write_schema_without_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("position.json");
        let config = EditorConfig {
            backup_on_write: false,
            ..EditorConfig::default()
        };

        write_schema(&path, "{}", &config).unwrap();
        assert_eq!(write_schema(&path, "{}", &config).unwrap(), None);
    }

    #[test]
    fn test_write_empty_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("position.json");
        assert!(write_schema(&path, "", &EditorConfig::default()).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_script_schema_names_ops() {
        let schema = script_schema().unwrap();
        assert!(schema.contains("add_property"));
        assert!(schema.contains("switch_tab"));
    }
}
