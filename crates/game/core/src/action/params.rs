use serde_json::{Map, Value};

use crate::ids::{CharacterId, ClueId, DialogueId, SceneId};

/// Canonical parameter keys read by the interpreter.
///
/// The content loader rewrites every legacy alias onto one of these.
pub mod keys {
    pub const ACTOR: &str = "actor";
    pub const TARGET: &str = "target";
    pub const SPAWNPOINT: &str = "spawnpoint";
    pub const X: &str = "x";
    pub const Y: &str = "y";
    pub const Z: &str = "z";
    pub const DURATION: &str = "duration";
    pub const DIALOGUE: &str = "dialogue";
    pub const CLUE: &str = "clue";
    pub const SCENE: &str = "scene";
    pub const ANIMATION: &str = "animation";
    pub const TAG: &str = "tag";
}

/// Reference to a character inside step parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActorRef {
    /// The character that owns the running action (default).
    Owner,
    Player,
    Character(CharacterId),
    /// Slug or display name, matched case-insensitively.
    Named(String),
}

impl ActorRef {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Number(n) => n
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(|n| Self::Character(CharacterId(n))),
            Value::String(s) => Some(Self::parse(s)),
            Value::Object(obj) => obj.get("value").or_else(|| obj.get("id")).and_then(Self::from_value),
            _ => None,
        }
    }

    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("owner") {
            return Self::Owner;
        }
        if trimmed.eq_ignore_ascii_case("player") {
            return Self::Player;
        }
        match trimmed.parse::<u32>() {
            Ok(id) => Self::Character(CharacterId(id)),
            Err(_) => Self::Named(trimmed.to_owned()),
        }
    }
}

/// Ordered, lossless parameter map of one action step.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct StepParams(Map<String, Value>);

impl StepParams {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// String value; numbers are rendered, `{value: …}` wrappers unwrapped.
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(value_as_text)
    }

    /// Float value from a number or a numeric string.
    pub fn number(&self, key: &str) -> Option<f32> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64().map(|n| n as f32),
            Value::String(s) => s.trim().parse::<f32>().ok(),
            Value::Object(obj) => obj.get("value").and_then(|v| match v {
                Value::Number(n) => n.as_f64().map(|n| n as f32),
                Value::String(s) => s.trim().parse::<f32>().ok(),
                _ => None,
            }),
            _ => None,
        }
        .filter(|n| n.is_finite())
    }

    pub fn id(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(value_as_id)
    }

    pub fn actor(&self) -> ActorRef {
        self.get(keys::ACTOR)
            .and_then(ActorRef::from_value)
            .unwrap_or(ActorRef::Owner)
    }

    /// Look-at target; defaults to the player.
    pub fn target(&self) -> ActorRef {
        self.get(keys::TARGET)
            .and_then(ActorRef::from_value)
            .unwrap_or(ActorRef::Player)
    }

    pub fn clue(&self) -> Option<ClueId> {
        self.id(keys::CLUE).map(ClueId)
    }

    pub fn scene(&self) -> Option<SceneId> {
        self.id(keys::SCENE).map(SceneId)
    }

    /// Dialogue reference: numeric id or slug.
    pub fn dialogue(&self) -> Option<DialogueRef> {
        let raw = self.text(keys::DIALOGUE)?;
        Some(match raw.parse::<u32>() {
            Ok(id) => DialogueRef::Id(DialogueId(id)),
            Err(_) => DialogueRef::Slug(raw),
        })
    }
}

/// A dialogue looked up by id or slug.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DialogueRef {
    Id(DialogueId),
    Slug(String),
}

impl std::fmt::Display for DialogueRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Slug(slug) => f.write_str(slug),
        }
    }
}

impl From<DialogueId> for DialogueRef {
    fn from(id: DialogueId) -> Self {
        Self::Id(id)
    }
}

fn value_as_id(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        Value::Object(obj) => obj.get("value").or_else(|| obj.get("id")).and_then(value_as_id),
        _ => None,
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(obj) => obj.get("value").or_else(|| obj.get("name")).and_then(value_as_text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_parse_from_strings_and_wrappers() {
        let params = StepParams::new()
            .with("duration", "2.5")
            .with("x", json!({ "value": 3 }))
            .with("z", "not a number");
        assert_eq!(params.number("duration"), Some(2.5));
        assert_eq!(params.number("x"), Some(3.0));
        assert_eq!(params.number("z"), None);
        assert_eq!(params.number("missing"), None);
    }

    #[test]
    fn actor_references_default_to_owner() {
        assert_eq!(StepParams::new().actor(), ActorRef::Owner);
        assert_eq!(StepParams::new().with("actor", "PLAYER").actor(), ActorRef::Player);
        assert_eq!(
            StepParams::new().with("actor", 7).actor(),
            ActorRef::Character(CharacterId(7))
        );
        assert_eq!(
            StepParams::new().with("actor", "Hank").actor(),
            ActorRef::Named("Hank".into())
        );
        assert_eq!(StepParams::new().target(), ActorRef::Player);
    }

    #[test]
    fn dialogue_reference_accepts_id_or_slug() {
        assert_eq!(
            StepParams::new().with("dialogue", "12").dialogue(),
            Some(DialogueRef::Id(DialogueId(12)))
        );
        assert_eq!(
            StepParams::new().with("dialogue", "intro-hank").dialogue(),
            Some(DialogueRef::Slug("intro-hank".into()))
        );
    }
}
