use nexus_core::action::params::keys;
use nexus_core::{ActionStep, StepKind, StepParams};
use serde_json::{Map, Value};

use super::{Record, as_text};
use crate::error::{ContentWarning, Diagnostics};

/// Keys that name the step kind itself. Never copied into params.
const KIND_KEYS: [&str; 2] = ["type", "action"];
/// Nested parameter containers, flattened in this order.
const CONTAINERS: [&str; 2] = ["params", "data"];

/// Canonical key and its accepted spellings, first present wins.
type AliasRule = (&'static str, &'static [&'static str]);

fn alias_rules(kind: &StepKind) -> &'static [AliasRule] {
    match kind {
        StepKind::WalkTo => &[
            (keys::ACTOR, &["actor", "character_id", "target_character_id", "actor_id"]),
            (
                keys::SPAWNPOINT,
                &["spawnpoint", "goto_spawnpoint", "spawn_point", "spawnpoint_name", "value"],
            ),
        ],
        StepKind::LookAt => &[
            (keys::ACTOR, &["actor", "subject_id", "character_id"]),
            (
                keys::TARGET,
                &["target", "target_id", "look_at_character_id", "target_character_id", "value"],
            ),
        ],
        StepKind::IdleWait => &[(keys::DURATION, &["duration", "seconds", "value"])],
        StepKind::StartDialogue => &[
            (
                keys::DIALOGUE,
                &["dialogue", "dialog_id", "dialogue_id", "dialoog_id", "id", "value"],
            ),
            (keys::ACTOR, &["actor", "character_id"]),
        ],
        StepKind::GiveClue => &[(keys::CLUE, &["clue", "clue_id", "id", "action_value", "value"])],
        StepKind::GotoScene => &[
            (keys::SCENE, &["scene", "scene_id", "target_scene_id", "value"]),
            (keys::SPAWNPOINT, &["spawnpoint", "target_spawn_point", "spawn_point"]),
        ],
        StepKind::PlayAnimation => &[
            (keys::ANIMATION, &["animation", "animation_name", "name", "value"]),
            (keys::ACTOR, &["actor", "character_id"]),
        ],
        StepKind::SetTag | StepKind::RemoveTag => &[(keys::TAG, &["tag", "game_tag", "value"])],
        StepKind::End | StepKind::Unknown(_) => &[],
    }
}

/// Normalizes one authored step.
///
/// Returns `None` only when the record is not an object at all. A record
/// without a kind becomes `Unknown("")` so it still shows up in logs when
/// executed.
pub fn normalize_step(raw: &Value, diagnostics: &mut Diagnostics) -> Option<ActionStep> {
    let record = Record::from_value(raw)?;

    let kind = match record.text(&KIND_KEYS) {
        Some(text) => StepKind::parse(&text),
        None => {
            diagnostics.warn(ContentWarning::MissingStepKind);
            StepKind::Unknown(String::new())
        }
    };
    if let StepKind::Unknown(raw) = &kind {
        if !raw.is_empty() {
            diagnostics.warn(ContentWarning::UnknownStepKind { raw: raw.clone() });
        }
    }

    let mut flat = flatten(record.0);
    for (canonical, aliases) in alias_rules(&kind) {
        if flat.get(*canonical).is_some_and(|v| !v.is_null()) {
            continue;
        }
        let found = aliases
            .iter()
            .find_map(|alias| flat.get(*alias).filter(|v| !v.is_null()).cloned());
        if let Some(value) = found {
            flat.insert((*canonical).to_owned(), value);
        }
    }

    Some(ActionStep::with_params(kind, StepParams::from_map(flat)))
}

/// Normalizes a step list, skipping records that are not objects.
pub fn normalize_steps(raw: Option<&Value>, diagnostics: &mut Diagnostics) -> Vec<ActionStep> {
    let Some(items) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let step = normalize_step(item, diagnostics);
            if step.is_none() {
                diagnostics.warn(ContentWarning::MalformedRecord {
                    collection: "steps",
                    index,
                });
            }
            step
        })
        .collect()
}

/// Top-level keys, then `params.*`, then `data.*`. Later sources override.
fn flatten(record: &Map<String, Value>) -> Map<String, Value> {
    let mut flat = Map::new();
    for (key, value) in record {
        if KIND_KEYS.contains(&key.as_str()) || CONTAINERS.contains(&key.as_str()) {
            continue;
        }
        flat.insert(key.clone(), value.clone());
    }
    for container in CONTAINERS {
        match record.get(container) {
            Some(Value::Object(inner)) => {
                for (key, value) in inner {
                    flat.insert(key.clone(), value.clone());
                }
            }
            // `data: "dock"` is a bare value.
            Some(other) if !other.is_null() => {
                if let Some(text) = as_text(other) {
                    flat.entry("value").or_insert(Value::String(text));
                }
            }
            _ => {}
        }
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::{ActorRef, ClueId, DialogueId, DialogueRef, SceneId};
    use serde_json::json;

    fn step(raw: Value) -> ActionStep {
        normalize_step(&raw, &mut Diagnostics::new()).unwrap()
    }

    #[test]
    fn walk_to_reads_nested_spawnpoint_alias() {
        let s = step(json!({
            "type": "WALK_TO_SPAWNPOINT",
            "data": { "character_id": 4, "goto_spawnpoint": "dock" }
        }));
        assert_eq!(s.kind, StepKind::WalkTo);
        assert_eq!(s.params.text(keys::SPAWNPOINT).as_deref(), Some("dock"));
        assert_eq!(s.params.actor(), ActorRef::Character(nexus_core::CharacterId(4)));
        // Alias keys are kept alongside the canonical ones.
        assert!(s.params.contains("goto_spawnpoint"));
    }

    #[test]
    fn data_overrides_params_overrides_top_level() {
        let s = step(json!({
            "action": "wait",
            "duration": 1,
            "params": { "duration": 2 },
            "data": { "duration": "3" }
        }));
        assert_eq!(s.kind, StepKind::IdleWait);
        assert_eq!(s.params.number(keys::DURATION), Some(3.0));
    }

    #[test]
    fn bare_value_feeds_the_primary_parameter() {
        let clue = step(json!({ "type": "GEEF AANWIJZING", "value": "12" }));
        assert_eq!(clue.params.clue(), Some(ClueId(12)));

        let scene = step(json!({ "type": "goto-scene", "data": "3" }));
        assert_eq!(scene.params.scene(), Some(SceneId(3)));
    }

    #[test]
    fn dialogue_accepts_legacy_spellings() {
        let s = step(json!({ "type": "START DIALOG", "params": { "dialoog_id": 9 } }));
        assert_eq!(s.params.dialogue(), Some(DialogueRef::Id(DialogueId(9))));
    }

    #[test]
    fn unknown_kind_is_kept_and_reported() {
        let mut diagnostics = Diagnostics::new();
        let s = normalize_step(&json!({ "type": "TELEPORT", "x": 1 }), &mut diagnostics).unwrap();
        assert_eq!(s.kind, StepKind::Unknown("TELEPORT".into()));
        assert_eq!(s.params.number("x"), Some(1.0));
        assert_eq!(
            diagnostics.warnings(),
            &[ContentWarning::UnknownStepKind { raw: "TELEPORT".into() }]
        );
    }

    #[test]
    fn non_objects_are_skipped() {
        let mut diagnostics = Diagnostics::new();
        let steps = normalize_steps(
            Some(&json!([{ "type": "end" }, "garbage", { "type": "wait" }])),
            &mut diagnostics,
        );
        assert_eq!(steps.len(), 2);
        assert_eq!(diagnostics.len(), 1);
    }
}
