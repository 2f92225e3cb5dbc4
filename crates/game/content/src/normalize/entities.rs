use std::collections::BTreeMap;

use nexus_core::{
    ActionDefinition, ActionId, CharacterDef, CharacterId, Clue, ClueId, Media, MediaId, MediaKind,
    Sector, SectorId,
};
use serde_json::Value;

use super::{Record, normalize_steps};
use crate::error::{ContentWarning, Diagnostics};

fn record_with_id<'a>(
    raw: &'a Value,
    collection: &'static str,
    index: usize,
    diagnostics: &mut Diagnostics,
) -> Option<(Record<'a>, u32)> {
    let Some(record) = Record::from_value(raw) else {
        diagnostics.warn(ContentWarning::MalformedRecord { collection, index });
        return None;
    };
    match record.id(&["id"]) {
        Some(id) => Some((record, id)),
        None => {
            diagnostics.warn(ContentWarning::MissingId { collection, index });
            None
        }
    }
}

pub fn normalize_action(raw: &Value, index: usize, diagnostics: &mut Diagnostics) -> Option<ActionDefinition> {
    let (record, id) = record_with_id(raw, "actions", index, diagnostics)?;
    // Older exports keep the steps inside `data`.
    let steps = record
        .first(&["steps", "actions"])
        .or_else(|| record.object(&["data"]).and_then(|d| d.first(&["steps"])));
    Some(ActionDefinition {
        id: ActionId(id),
        name: record.text(&["name", "title"]).unwrap_or_default(),
        description: record.text(&["description"]).unwrap_or_default(),
        steps: normalize_steps(steps, diagnostics),
    })
}

pub fn normalize_character(raw: &Value, index: usize, diagnostics: &mut Diagnostics) -> Option<CharacterDef> {
    let (record, id) = record_with_id(raw, "characters", index, diagnostics)?;
    let name = record.text(&["name"]).unwrap_or_default();
    let is_player = record.flag(&["is_playable", "is_player", "playable"])
        || record
            .text(&["type", "role"])
            .is_some_and(|t| t.eq_ignore_ascii_case("player"));
    Some(CharacterDef {
        id: CharacterId(id),
        slug: record.text(&["slug"]).unwrap_or_else(|| slugify(&name)),
        name,
        is_player,
    })
}

pub fn normalize_clue(raw: &Value, index: usize, diagnostics: &mut Diagnostics) -> Option<Clue> {
    let (record, id) = record_with_id(raw, "clues", index, diagnostics)?;
    Some(Clue {
        id: ClueId(id),
        title: record.text(&["title", "name"]).unwrap_or_default(),
        initial: record.flag(&["initial", "is_initial", "start_with"]),
    })
}

pub fn normalize_media(raw: &Value, index: usize, diagnostics: &mut Diagnostics) -> Option<Media> {
    let (record, id) = record_with_id(raw, "media", index, diagnostics)?;
    let filepad = record.text(&["filepad", "path", "url"])?;
    Some(Media {
        id: MediaId(id),
        filepad,
        kind: MediaKind::parse(&record.text(&["type"]).unwrap_or_default()),
        imageable_id: record.id(&["imageable_id"]),
        imageable_type: record.text(&["imageable_type"]).unwrap_or_default(),
    })
}

pub fn normalize_sector(raw: &Value, index: usize, diagnostics: &mut Diagnostics) -> Option<Sector> {
    let (record, id) = record_with_id(raw, "sectors", index, diagnostics)?;
    Some(Sector {
        id: SectorId(id),
        title: record.text(&["title", "name"]).unwrap_or_default(),
    })
}

/// Configs arrive as `[{key, value}]` or as a plain object.
///
/// String values holding JSON are decoded; anything else is kept as is.
pub fn normalize_configs(raw: &Value) -> BTreeMap<String, Value> {
    let decode = |value: &Value| match value {
        Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| value.clone()),
        other => other.clone(),
    };
    match raw {
        Value::Array(items) => items
            .iter()
            .filter_map(Record::from_value)
            .filter_map(|r| {
                let key = r.text(&["key", "name"])?;
                Some((key, r.first(&["value"]).map(decode).unwrap_or(Value::Null)))
            })
            .collect(),
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), decode(v))).collect(),
        _ => BTreeMap::new(),
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_owned()
}
