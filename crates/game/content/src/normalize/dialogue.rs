use nexus_core::{
    ActionId, ActionStep, CharacterId, Dialogue, DialogueChoice, DialogueId, DialogueNode, DialogueTree,
    NextNode, StepKind,
};
use serde_json::Value;

use super::{Record, as_text, normalize_steps};
use crate::error::{ContentWarning, Diagnostics};

const NODE_CONTAINERS: [&str; 3] = ["tree", "data", ""];
const START_KEYS: [&str; 3] = ["startNodeId", "start_node_id", "start_node"];
const ANSWER_KEYS: [&str; 2] = ["answers", "options"];
const NODE_ACTION_KEYS: [&str; 2] = ["actions", "nodeActions"];
const NEXT_KEYS: [&str; 5] = ["next_node", "nextNodeId", "next", "targetNodeId", "target_node"];
const NODE_CLUE_KEYS: [&str; 3] = ["clue_id", "action_value", "actionValue"];
const ACTION_REF_KEYS: [&str; 2] = ["actionId", "action_id"];
const ACTION_VALUE_KEYS: [&str; 2] = ["action_value", "actionValue"];
const TRIGGER_ACTION: [&str; 3] = ["trigger_action", "trigger-action", "triggeraction"];

/// Normalizes one dialogue record.
///
/// Nodes are read from `tree.nodes`, `data.nodes` or `nodes`, as a sequence
/// or as a keyed map. `tree` may also arrive as an encoded JSON string.
pub fn normalize_dialogue(raw: &Value, index: usize, diagnostics: &mut Diagnostics) -> Option<Dialogue> {
    let Some(record) = Record::from_value(raw) else {
        diagnostics.warn(ContentWarning::MalformedRecord {
            collection: "dialogs",
            index,
        });
        return None;
    };
    let Some(id) = record.id(&["id"]) else {
        diagnostics.warn(ContentWarning::MissingId {
            collection: "dialogs",
            index,
        });
        return None;
    };
    let label = record.text(&["slug"]).unwrap_or_else(|| id.to_string());

    let decoded_tree = match record.first(&["tree"]) {
        Some(Value::String(encoded)) => serde_json::from_str::<Value>(encoded).ok(),
        _ => None,
    };
    let tree_record = decoded_tree.as_ref().and_then(Record::from_value);

    let mut nodes_value = tree_record.and_then(|t| t.first(&["nodes"]));
    let mut start = tree_record.and_then(|t| t.text(&START_KEYS));
    for container in NODE_CONTAINERS {
        if nodes_value.is_some() {
            break;
        }
        let scope = if container.is_empty() {
            Some(record)
        } else {
            record.object(&[container])
        };
        nodes_value = scope.and_then(|s| s.first(&["nodes"]));
        if start.is_none() {
            start = scope.and_then(|s| s.text(&START_KEYS));
        }
    }
    if start.is_none() {
        start = record.text(&START_KEYS);
    }

    let nodes = match nodes_value {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| normalize_node(item, index, None, &label, diagnostics))
            .collect(),
        Some(Value::Object(keyed)) => {
            diagnostics.warn(ContentWarning::KeyedDialogueNodes {
                dialogue: label.clone(),
            });
            keyed
                .iter()
                .enumerate()
                .filter_map(|(index, (key, item))| {
                    normalize_node(item, index, Some(key.as_str()), &label, diagnostics)
                })
                .collect()
        }
        _ => Vec::new(),
    };

    let (tree, dropped) = DialogueTree::from_nodes(nodes, start.filter(|s| !s.trim().is_empty()));
    for node in dropped {
        diagnostics.warn(ContentWarning::DuplicateNodeId {
            dialogue: label.clone(),
            node,
        });
    }
    report_dangling(&tree, &label, diagnostics);

    Some(Dialogue {
        id: DialogueId(id),
        slug: record.text(&["slug"]).unwrap_or_default(),
        title: record.text(&["title", "name"]).unwrap_or_default(),
        character_id: record.id(&["character_id", "personage_id"]).map(CharacterId),
        tree,
    })
}

fn normalize_node(
    raw: &Value,
    index: usize,
    key: Option<&str>,
    dialogue: &str,
    diagnostics: &mut Diagnostics,
) -> Option<DialogueNode> {
    let record = Record::from_value(raw)?;
    // In a keyed map the key is the node id.
    let inner = record.text(&["id"]);
    let id = match key {
        Some(key) => {
            if let Some(inner) = inner.filter(|inner| inner != key) {
                diagnostics.warn(ContentWarning::KeyedNodeIdMismatch {
                    dialogue: dialogue.to_owned(),
                    key: key.to_owned(),
                    inner,
                });
            }
            Some(key.to_owned())
        }
        None => inner,
    };
    let Some(id) = id.filter(|id| !id.trim().is_empty()) else {
        diagnostics.warn(ContentWarning::MissingId {
            collection: "dialogue nodes",
            index,
        });
        return None;
    };

    let mut actions = normalize_steps(record.first(&NODE_ACTION_KEYS), diagnostics);
    if let Some(clue) = node_clue(record) {
        actions.push(ActionStep::give_clue(clue.into()));
    }

    let answers = record
        .array(&ANSWER_KEYS)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| normalize_choice(item, diagnostics))
                .collect()
        })
        .unwrap_or_default();

    tracing::trace!(target: "nexus::content", dialogue, node = %id, "normalized dialogue node");
    Some(DialogueNode {
        id,
        text: record.text(&["text", "content"]).unwrap_or_default(),
        initial: record.flag(&["initial"]),
        actions,
        action_id: action_ref(record),
        answers,
    })
}

/// Legacy node-level `action: "give-clue"` with the clue id beside it.
fn node_clue(record: Record<'_>) -> Option<u32> {
    let action = record.text(&["action"])?;
    if StepKind::parse(&action) != StepKind::GiveClue {
        return None;
    }
    record
        .id(&NODE_CLUE_KEYS)
        .or_else(|| record.object(&["data"]).and_then(|d| d.id(&["clue_id"])))
}

/// `actionId` on a node or choice, or legacy `action: "trigger_action"`
/// with the action id in `action_value`.
fn action_ref(record: Record<'_>) -> Option<ActionId> {
    record
        .id(&ACTION_REF_KEYS)
        .or_else(|| {
            let action = record.text(&["action"])?;
            TRIGGER_ACTION
                .iter()
                .any(|t| action.trim().eq_ignore_ascii_case(t))
                .then(|| record.id(&ACTION_VALUE_KEYS))
                .flatten()
        })
        .map(ActionId)
}

fn normalize_choice(raw: &Value, diagnostics: &mut Diagnostics) -> Option<DialogueChoice> {
    let record = Record::from_value(raw)?;
    let mut actions = normalize_steps(record.first(&["actions"]), diagnostics);
    let ends = record
        .text(&["action"])
        .is_some_and(|a| StepKind::parse(&a) == StepKind::End);
    if ends {
        actions.push(ActionStep::end());
    }
    let next = record.first(&NEXT_KEYS).and_then(as_text);
    Some(DialogueChoice {
        text: record.text(&["text", "label"]).unwrap_or_default(),
        actions,
        action_id: action_ref(record),
        next: NextNode::parse(next.as_deref()),
    })
}

fn report_dangling(tree: &DialogueTree, dialogue: &str, diagnostics: &mut Diagnostics) {
    for node in &tree.nodes {
        for choice in &node.answers {
            if let NextNode::Node(target) = &choice.next {
                if tree.node(target).is_none() {
                    diagnostics.warn(ContentWarning::DanglingNextNode {
                        dialogue: dialogue.to_owned(),
                        node: node.id.clone(),
                        target: target.clone(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::ClueId;
    use serde_json::json;

    #[test]
    fn keyed_nodes_become_a_sequence_with_ids_from_keys() {
        let mut diagnostics = Diagnostics::new();
        let raw = json!({
            "id": 3,
            "slug": "hank-intro",
            "tree": {
                "nodes": {
                    "root": { "text": "Hey.", "answers": [{ "text": "Hi", "nextNodeId": "bye" }] },
                    "bye": { "text": "Bye." }
                }
            }
        });
        let dialogue = normalize_dialogue(&raw, 0, &mut diagnostics).unwrap();
        let ids: Vec<_> = dialogue.tree.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["root", "bye"]);
        assert_eq!(dialogue.tree.nodes[0].answers[0].next, NextNode::Node("bye".into()));
        assert_eq!(dialogue.tree.nodes[1].text, "Bye.");
        assert!(dialogue.tree.nodes[1].is_leaf());
        assert_eq!(
            diagnostics.warnings(),
            &[ContentWarning::KeyedDialogueNodes {
                dialogue: "hank-intro".into()
            }]
        );
    }

    #[test]
    fn keyed_node_keeps_its_key_over_an_inner_id() {
        let mut diagnostics = Diagnostics::new();
        let raw = json!({
            "id": 4,
            "slug": "dock",
            "nodes": {
                "a": { "id": "x", "text": "A", "answers": [{ "text": "again", "next": "a" }] },
                "b": { "id": "b", "text": "B" }
            }
        });
        let dialogue = normalize_dialogue(&raw, 0, &mut diagnostics).unwrap();
        let ids: Vec<_> = dialogue.tree.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(dialogue.tree.node("a").is_some());
        assert_eq!(
            diagnostics.warnings(),
            &[
                ContentWarning::KeyedDialogueNodes {
                    dialogue: "dock".into()
                },
                ContentWarning::KeyedNodeIdMismatch {
                    dialogue: "dock".into(),
                    key: "a".into(),
                    inner: "x".into(),
                },
            ]
        );
    }

    #[test]
    fn choice_and_node_action_references_are_kept() {
        let raw = json!({
            "id": 6,
            "nodes": [{
                "id": "n1",
                "text": "Well?",
                "action_id": "12",
                "answers": [
                    { "text": "Do it", "actionId": 7, "next_node": "_end" },
                    { "text": "Legacy", "action": "trigger-action", "action_value": "9" },
                    { "text": "Leave" }
                ]
            }]
        });
        let dialogue = normalize_dialogue(&raw, 0, &mut Diagnostics::new()).unwrap();
        let node = &dialogue.tree.nodes[0];
        assert_eq!(node.action_id, Some(ActionId(12)));
        assert_eq!(node.answers[0].action_id, Some(ActionId(7)));
        assert_eq!(node.answers[0].next, NextNode::End);
        assert_eq!(node.answers[1].action_id, Some(ActionId(9)));
        assert_eq!(node.answers[2].action_id, None);
    }

    #[test]
    fn encoded_tree_and_start_node_are_read() {
        let raw = json!({
            "id": "5",
            "tree": r#"{"startNodeId":"b","nodes":[{"id":"a","text":"A"},{"id":"b","text":"B"}]}"#
        });
        let dialogue = normalize_dialogue(&raw, 0, &mut Diagnostics::new()).unwrap();
        assert_eq!(dialogue.id, DialogueId(5));
        assert_eq!(dialogue.tree.start_node().map(|n| n.id.as_str()), Some("b"));
    }

    #[test]
    fn legacy_node_clue_and_choice_end_become_steps() {
        let raw = json!({
            "id": 1,
            "nodes": [{
                "id": "n1",
                "text": "Take this.",
                "action": "give-clue",
                "data": { "clue_id": "8" },
                "options": [{ "text": "Thanks", "action": "end", "next": "[END]" }]
            }]
        });
        let dialogue = normalize_dialogue(&raw, 0, &mut Diagnostics::new()).unwrap();
        let node = &dialogue.tree.nodes[0];
        assert_eq!(node.actions, vec![ActionStep::give_clue(ClueId(8))]);
        assert_eq!(node.answers[0].actions, vec![ActionStep::end()]);
        assert_eq!(node.answers[0].next, NextNode::End);
    }

    #[test]
    fn duplicates_and_dangling_targets_are_reported() {
        let mut diagnostics = Diagnostics::new();
        let raw = json!({
            "id": 2,
            "tree": { "nodes": [
                { "id": "a", "text": "first", "answers": [{ "text": "go", "next_node": "ghost" }] },
                { "id": "a", "text": "second" }
            ]}
        });
        let dialogue = normalize_dialogue(&raw, 0, &mut diagnostics).unwrap();
        assert_eq!(dialogue.tree.nodes.len(), 1);
        assert_eq!(dialogue.tree.nodes[0].text, "first");
        assert_eq!(diagnostics.len(), 2);
    }
}
