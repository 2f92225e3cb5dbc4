//! Content snapshot loader.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use nexus_core::{Content, EngineError, ErrorKind};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::Diagnostics;
use crate::loaders::{LoadResult, read_json};
use crate::normalize;

/// One exported collection file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Actions,
    Characters,
    Clues,
    Configs,
    Dialogs,
    Media,
    Scenes,
    Sectors,
}

impl Collection {
    pub const ALL: [Collection; 8] = [
        Self::Actions,
        Self::Characters,
        Self::Clues,
        Self::Configs,
        Self::Dialogs,
        Self::Media,
        Self::Scenes,
        Self::Sectors,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Actions => "actions.json",
            Self::Characters => "characters.json",
            Self::Clues => "clues.json",
            Self::Configs => "configs.json",
            Self::Dialogs => "dialogs.json",
            Self::Media => "media.json",
            Self::Scenes => "scenes.json",
            Self::Sectors => "sectors.json",
        }
    }
}

/// A collection file that could not be read. The collection loads empty.
#[derive(Debug, thiserror::Error)]
#[error("failed to load {}: {reason}", .collection.file_name())]
pub struct LoadFailure {
    pub collection: Collection,
    pub reason: String,
}

impl EngineError for LoadFailure {
    fn kind(&self) -> ErrorKind {
        ErrorKind::LoadFailure
    }
}

/// Everything that went wrong while loading, none of it fatal.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub failures: Vec<LoadFailure>,
    pub diagnostics: Diagnostics,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.diagnostics.is_empty()
    }
}

/// Loads the content snapshot from a directory of exported collections.
///
/// # Directory Structure
///
/// ```text
/// content_dir/
/// ├── actions.json
/// ├── characters.json
/// ├── clues.json
/// ├── configs.json
/// ├── dialogs.json
/// ├── media.json
/// ├── scenes.json
/// └── sectors.json
/// ```
pub struct ContentLoader {
    data_dir: PathBuf,
}

impl ContentLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(collection.file_name())
    }

    /// Reads one collection. The file may hold a bare array or a `{data: […]}`
    /// envelope.
    pub fn read_collection(&self, collection: Collection) -> LoadResult<Value> {
        let value = read_json(&self.path(collection))?;
        Ok(match value {
            Value::Object(mut map) if map.contains_key("data") && collection != Collection::Configs => {
                map.remove("data").unwrap_or(Value::Null)
            }
            other => other,
        })
    }

    /// Loads every collection.
    ///
    /// Missing or malformed files are recorded in the report and load empty.
    pub fn load(&self) -> (Content, LoadReport) {
        let mut report = LoadReport::default();
        let mut content = Content::default();

        for collection in Collection::ALL {
            let raw = match self.read_collection(collection) {
                Ok(raw) => raw,
                Err(error) => {
                    let failure = LoadFailure {
                        collection,
                        reason: format!("{error:#}"),
                    };
                    warn!(target: "nexus::content", code = failure.error_code(), "{failure}");
                    report.failures.push(failure);
                    continue;
                }
            };
            apply(&mut content, collection, &raw, &mut report.diagnostics);
        }

        info!(
            target: "nexus::content",
            scenes = content.scenes.len(),
            dialogues = content.dialogues.len(),
            actions = content.actions.len(),
            clues = content.clues.len(),
            failures = report.failures.len(),
            warnings = report.diagnostics.len(),
            "content loaded from {}",
            self.data_dir.display()
        );
        (content, report)
    }
}

/// Normalizes one raw collection into the snapshot.
pub fn apply(content: &mut Content, collection: Collection, raw: &Value, diagnostics: &mut Diagnostics) {
    if collection == Collection::Configs {
        content.configs = normalize::normalize_configs(raw);
        return;
    }
    let items: &[Value] = match raw {
        Value::Array(items) => items,
        Value::Null => &[],
        _ => {
            warn!(
                target: "nexus::content",
                "{} is not a list; ignoring it",
                collection.file_name()
            );
            &[]
        }
    };
    for (index, item) in items.iter().enumerate() {
        match collection {
            Collection::Actions => {
                let action = normalize::normalize_action(item, index, diagnostics);
                insert(&mut content.actions, action, |a| a.id);
            }
            Collection::Characters => {
                let character = normalize::normalize_character(item, index, diagnostics);
                insert(&mut content.characters, character, |c| c.id);
            }
            Collection::Clues => {
                let clue = normalize::normalize_clue(item, index, diagnostics);
                insert(&mut content.clues, clue, |c| c.id);
            }
            Collection::Dialogs => {
                let dialogue = normalize::normalize_dialogue(item, index, diagnostics);
                insert(&mut content.dialogues, dialogue, |d| d.id);
            }
            Collection::Media => {
                let media = normalize::normalize_media(item, index, diagnostics);
                insert(&mut content.media, media, |m| m.id);
            }
            Collection::Scenes => {
                let scene = normalize::normalize_scene(item, index, diagnostics);
                insert(&mut content.scenes, scene, |s| s.id);
            }
            Collection::Sectors => {
                let sector = normalize::normalize_sector(item, index, diagnostics);
                insert(&mut content.sectors, sector, |s| s.id);
            }
            Collection::Configs => {}
        }
    }
}

fn insert<K: Ord, V>(map: &mut BTreeMap<K, V>, value: Option<V>, key: impl Fn(&V) -> K) {
    if let Some(value) = value {
        map.insert(key(&value), value);
    }
}
