use std::fs;
use std::path::Path;

use nexus_content::{Collection, ContentLoader, ContentWarning};
use nexus_core::{
    ActionId, ClueId, DialogueId, DialogueRef, NextNode, SceneId, StepKind,
};
use serde_json::json;

fn write(dir: &Path, collection: Collection, value: serde_json::Value) {
    fs::write(dir.join(collection.file_name()), value.to_string()).expect("write collection");
}

fn harbour_fixture(dir: &Path) {
    write(
        dir,
        Collection::Scenes,
        json!({ "data": [{
            "id": 1,
            "title": "Harbour",
            "3d_spawnpoints": [{ "name": "dock", "x": 1, "y": 0, "z": 2 }],
            "2d_gateways": [{
                "label": "Shed", "type": "trigger", "action_id": 5,
                "x": 40, "y": 40, "width": 10, "height": 10
            }]
        }]}),
    );
    write(
        dir,
        Collection::Actions,
        json!([{
            "id": 5,
            "name": "Search the shed",
            "steps": [
                { "type": "WALK_TO_SPAWNPOINT", "data": { "goto_spawnpoint": "dock" } },
                { "type": "GEEF AANWIJZING", "value": 2 },
                { "type": "TELEPORT" }
            ]
        }]),
    );
    write(
        dir,
        Collection::Clues,
        json!([
            { "id": 1, "title": "Map", "initial": 1 },
            { "id": 2, "title": "Key", "initial": "0" }
        ]),
    );
    write(
        dir,
        Collection::Dialogs,
        json!([{
            "id": 3,
            "slug": "hank",
            "tree": { "nodes": {
                "root": { "text": "Evening.", "answers": [{ "text": "Evening.", "next": "bye" }] },
                "bye": { "text": "Mind the fog." }
            }}
        }]),
    );
    write(
        dir,
        Collection::Configs,
        json!([{ "key": "opening_scene", "value": "1" }]),
    );
}

#[test]
fn loads_and_normalizes_a_content_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    harbour_fixture(dir.path());

    let (content, report) = ContentLoader::new(dir.path()).load();

    // characters, media and sectors are absent and load empty.
    assert_eq!(report.failures.len(), 3);
    assert!(content.characters.is_empty());

    let scene = content.opening_scene().expect("opening scene");
    assert_eq!(scene.id, SceneId(1));
    assert!(scene.spawnpoint("dock").is_some());

    let action = content.action(ActionId(5)).expect("action");
    let kinds: Vec<_> = action.steps.iter().map(|s| s.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![StepKind::WalkTo, StepKind::GiveClue, StepKind::Unknown("TELEPORT".into())]
    );
    assert_eq!(action.steps[1].params.clue(), Some(ClueId(2)));

    assert_eq!(content.initial_inventory(), vec![ClueId(1)]);

    let dialogue = content
        .dialogue(&DialogueRef::Slug("hank".into()))
        .expect("dialogue by slug");
    assert_eq!(dialogue.id, DialogueId(3));
    assert_eq!(dialogue.tree.nodes.len(), 2);
    assert_eq!(dialogue.tree.nodes[0].answers[0].next, NextNode::Node("bye".into()));

    assert!(
        report
            .diagnostics
            .warnings()
            .contains(&ContentWarning::UnknownStepKind { raw: "TELEPORT".into() })
    );
    assert!(
        report
            .diagnostics
            .warnings()
            .contains(&ContentWarning::KeyedDialogueNodes { dialogue: "hank".into() })
    );
}

#[test]
fn malformed_file_is_a_per_collection_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    harbour_fixture(dir.path());
    fs::write(dir.path().join("dialogs.json"), "{ not json").expect("write");

    let (content, report) = ContentLoader::new(dir.path()).load();

    assert!(content.dialogues.is_empty());
    assert!(
        report
            .failures
            .iter()
            .any(|f| f.collection == Collection::Dialogs)
    );
    // The rest of the snapshot still loads.
    assert!(content.action(ActionId(5)).is_some());
}

#[test]
fn empty_directory_loads_an_empty_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (content, report) = ContentLoader::new(dir.path()).load();
    assert_eq!(report.failures.len(), Collection::ALL.len());
    assert!(content.scenes.is_empty());
    assert!(content.opening_scene().is_none());
}
