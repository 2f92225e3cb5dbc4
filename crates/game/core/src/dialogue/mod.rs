//! Dialogue trees: nodes, choices and start-node resolution.
//!
//! Trees reach this module in canonical shape (a sequence of nodes with
//! unique ids). Keyed legacy maps and alias keys are normalized by the content
//! loader before construction.
pub mod typewriter;

pub use typewriter::{RevealStep, Typewriter};

use std::collections::HashSet;

use crate::action::ActionStep;
use crate::ids::{ActionId, CharacterId, DialogueId, NodeId};

/// Where a choice leads.
///
/// Distinct from the `End` step kind: this closes the dialogue after the
/// choice's actions, the step kind stops the surrounding step list.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextNode {
    Node(NodeId),
    #[default]
    End,
}

impl NextNode {
    /// Legacy end markers recognised in authored `next_node` values.
    pub const END_SENTINELS: [&'static str; 6] = ["_end", "end", "[end]", "close", "stop", "exit"];

    /// Maps an authored target onto a node id or the end sentinel.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::End,
            Some(s) if Self::END_SENTINELS.iter().any(|e| s.eq_ignore_ascii_case(e)) => Self::End,
            Some(s) => Self::Node(s.to_owned()),
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DialogueChoice {
    pub text: String,
    #[serde(default)]
    pub actions: Vec<ActionStep>,
    /// Authored action run after `actions`, before following `next`.
    #[serde(default)]
    pub action_id: Option<ActionId>,
    #[serde(default)]
    pub next: NextNode,
}

impl DialogueChoice {
    pub fn new(text: impl Into<String>, next: NextNode) -> Self {
        Self {
            text: text.into(),
            actions: Vec::new(),
            action_id: None,
            next,
        }
    }

    pub fn with_actions(mut self, actions: Vec<ActionStep>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_action(mut self, action_id: ActionId) -> Self {
        self.action_id = Some(action_id);
        self
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DialogueNode {
    pub id: NodeId,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub initial: bool,
    /// Steps run when the node is entered, before the text is revealed.
    #[serde(default)]
    pub actions: Vec<ActionStep>,
    /// Authored action run after the node's own steps.
    #[serde(default)]
    pub action_id: Option<ActionId>,
    #[serde(default)]
    pub answers: Vec<DialogueChoice>,
}

impl DialogueNode {
    pub fn new(id: impl Into<NodeId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            initial: false,
            actions: Vec::new(),
            action_id: None,
            answers: Vec::new(),
        }
    }

    pub fn with_answers(mut self, answers: Vec<DialogueChoice>) -> Self {
        self.answers = answers;
        self
    }

    pub fn with_actions(mut self, actions: Vec<ActionStep>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_action(mut self, action_id: ActionId) -> Self {
        self.action_id = Some(action_id);
        self
    }

    pub fn initial(mut self) -> Self {
        self.initial = true;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.answers.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DialogueTree {
    #[serde(default)]
    pub nodes: Vec<DialogueNode>,
    #[serde(default)]
    pub start_node_id: Option<NodeId>,
}

impl DialogueTree {
    /// Builds a tree, dropping nodes whose id was already seen.
    ///
    /// Returns the tree and the ids that were dropped.
    pub fn from_nodes(nodes: Vec<DialogueNode>, start_node_id: Option<NodeId>) -> (Self, Vec<NodeId>) {
        let mut seen = HashSet::new();
        let mut dropped = Vec::new();
        let mut unique = Vec::with_capacity(nodes.len());
        for node in nodes {
            if seen.insert(node.id.clone()) {
                unique.push(node);
            } else {
                dropped.push(node.id);
            }
        }
        (
            Self {
                nodes: unique,
                start_node_id,
            },
            dropped,
        )
    }

    pub fn node(&self, id: &str) -> Option<&DialogueNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolves the entry node.
    ///
    /// Order: explicit start id (when it exists), a node flagged `initial`,
    /// a node named `root` or `start`, then the first node.
    pub fn start_node(&self) -> Option<&DialogueNode> {
        if let Some(node) = self.start_node_id.as_deref().and_then(|id| self.node(id)) {
            return Some(node);
        }
        self.nodes
            .iter()
            .find(|n| n.initial)
            .or_else(|| self.node("root"))
            .or_else(|| self.node("start"))
            .or_else(|| self.nodes.first())
    }
}

/// Authored dialogue with its tree.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Dialogue {
    pub id: DialogueId,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub character_id: Option<CharacterId>,
    #[serde(default)]
    pub tree: DialogueTree,
}

impl Dialogue {
    pub fn new(id: DialogueId, slug: impl Into<String>, tree: DialogueTree) -> Self {
        Self {
            id,
            slug: slug.into(),
            title: String::new(),
            character_id: None,
            tree,
        }
    }

    /// Matches a numeric id or slug as authored in step parameters.
    pub fn matches(&self, key: &crate::action::DialogueRef) -> bool {
        match key {
            crate::action::DialogueRef::Id(id) => self.id == *id,
            crate::action::DialogueRef::Slug(slug) => {
                self.slug == *slug || self.id.0.to_string() == *slug
            }
        }
    }
}
