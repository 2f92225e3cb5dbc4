//! Canonical step kinds and the legacy spelling table.
//!
//! Authored content spells step types many ways (`WALK_TO_POSITION`,
//! `walk-to`, `START DIALOG`, `GEEF AANWIJZING`). Parsing folds case and the
//! `-`, ` `, `_` separators, then looks the result up in one table. Spellings
//! that are not in the table become [`StepKind::Unknown`] carrying the raw
//! input, so nothing authored is ever lost.

use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq, Hash, strum::EnumString)]
#[strum(ascii_case_insensitive)]
pub enum StepKind {
    #[strum(serialize = "walk_to", serialize = "walk_to_position", serialize = "walk_to_spawnpoint", serialize = "walk")]
    WalkTo,
    #[strum(serialize = "look_at", serialize = "look_at_target")]
    LookAt,
    #[strum(serialize = "idle_wait", serialize = "wait", serialize = "wait_x_seconds", serialize = "idle")]
    IdleWait,
    #[strum(serialize = "start_dialogue", serialize = "start_dialog", serialize = "start_talk", serialize = "talk")]
    StartDialogue,
    #[strum(serialize = "give_clue", serialize = "geef_aanwijzing")]
    GiveClue,
    #[strum(serialize = "goto_scene", serialize = "go_to_scene")]
    GotoScene,
    #[strum(serialize = "play_animation", serialize = "animation")]
    PlayAnimation,
    #[strum(serialize = "set_game_tag", serialize = "set_tag")]
    SetTag,
    #[strum(serialize = "remove_game_tag", serialize = "remove_tag")]
    RemoveTag,
    #[strum(serialize = "end", serialize = "end_talk")]
    End,
    /// A spelling with no canonical mapping. Holds the authored text verbatim.
    #[strum(default)]
    Unknown(String),
}

impl StepKind {
    /// Parses any authored spelling. Never fails.
    pub fn parse(raw: &str) -> Self {
        let folded = fold_separators(raw);
        match StepKind::from_str(&folded) {
            Ok(StepKind::Unknown(_)) | Err(_) => StepKind::Unknown(raw.trim().to_owned()),
            Ok(kind) => kind,
        }
    }

    /// Canonical kebab-case spelling, or the raw text for unknown kinds.
    pub fn as_str(&self) -> &str {
        match self {
            Self::WalkTo => "walk-to",
            Self::LookAt => "look-at",
            Self::IdleWait => "idle-wait",
            Self::StartDialogue => "start-dialogue",
            Self::GiveClue => "give-clue",
            Self::GotoScene => "goto-scene",
            Self::PlayAnimation => "play-animation",
            Self::SetTag => "set-tag",
            Self::RemoveTag => "remove-tag",
            Self::End => "end",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

fn fold_separators(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.trim().chars() {
        let ch = match ch {
            '-' | ' ' | '_' => '_',
            other => other.to_ascii_lowercase(),
        };
        if ch == '_' && out.ends_with('_') {
            continue;
        }
        out.push(ch);
    }
    out
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for StepKind {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<StepKind> for String {
    fn from(kind: StepKind) -> Self {
        kind.as_str().to_owned()
    }
}

impl serde::Serialize for StepKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for StepKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
