//! Shared fixture for the runtime integration tests: a small harbour scene
//! with a walkable floor, two characters, clues, actions and dialogues.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use glam::Vec3;
use nexus_content::StorageResolver;
use nexus_core::{
    ActionDefinition, ActionId, ActionStep, ActorId, CharacterDef, CharacterId, Clue, ClueId,
    Content, Dialogue, DialogueChoice, DialogueId, DialogueNode, DialogueTree, EngineConfig,
    Gateway, GatewayId, GatewayKind, Media, MediaId, MediaKind, MeshGeometry, NextNode, Scene,
    SceneId, ScreenRect, Spawnpoint, StepKind, TriggerCondition,
};
use nexus_runtime::{
    ContentSceneLoader, EventBus, SceneLoader, Session, StepError, StepExecutor, StepOutcome,
};
use tokio::task::JoinHandle;

pub const HARBOUR: SceneId = SceneId(1);
pub const LIGHTHOUSE: SceneId = SceneId(2);

pub const DETECTIVE: CharacterId = CharacterId(1);
pub const HANK: CharacterId = CharacterId(2);

pub const RUSTY_KEY: ClueId = ClueId(10);
pub const LETTER: ClueId = ClueId(11);

pub const WALK_AND_TAKE_KEY: ActionId = ActionId(1);
pub const ENDS_EARLY: ActionId = ActionId(2);
pub const BROKEN_TRIP: ActionId = ActionId(3);
pub const TELEPORT: ActionId = ActionId(4);
pub const TIP_OFF: ActionId = ActionId(5);

pub const GREETING: DialogueId = DialogueId(1);
pub const INTERROGATION: DialogueId = DialogueId(2);
pub const FAREWELL: DialogueId = DialogueId(3);
pub const BRIEFING: DialogueId = DialogueId(4);

pub fn floor(name: &str) -> MeshGeometry {
    MeshGeometry {
        name: name.to_owned(),
        vertices: vec![
            [-5.0, 0.0, -5.0],
            [-5.0, 0.0, 5.0],
            [5.0, 0.0, -5.0],
            [5.0, 0.0, 5.0],
        ],
        indices: vec![0, 1, 2, 1, 3, 2],
    }
}

fn harbour() -> Scene {
    let mut scene = Scene::new(HARBOUR, "Harbour");
    scene.spawnpoints = vec![
        Spawnpoint::new("square", Vec3::new(-2.0, 0.0, -2.0)),
        Spawnpoint::new("dock", Vec3::new(1.0, 0.0, 2.0)).facing(90.0),
    ];
    scene.gateways = vec![
        Gateway {
            id: GatewayId(1),
            label: "Lighthouse path".into(),
            kind: GatewayKind::Scene {
                target_scene_id: LIGHTHOUSE,
                target_spawn_point: Some("stairs".into()),
            },
            rect: ScreenRect::new(80.0, 40.0, 20.0, 30.0),
            walk_point: Some(Vec3::new(4.0, 0.0, 0.0)),
            triggers: vec![],
        },
        Gateway {
            id: GatewayId(2),
            label: "Crate".into(),
            kind: GatewayKind::Trigger {
                action_id: WALK_AND_TAKE_KEY,
            },
            rect: ScreenRect::new(10.0, 60.0, 10.0, 10.0),
            walk_point: None,
            triggers: vec![TriggerCondition::HasNot { clue_id: RUSTY_KEY }],
        },
    ];
    scene.npcs = vec![nexus_core::NpcPlacement {
        character_id: HANK,
        spawnpoint: Some("dock".into()),
        position: None,
        direction: None,
    }];
    scene.geometry = vec![floor("Floor_Harbour"), MeshGeometry {
        name: "Crates".into(),
        vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        indices: vec![0, 1, 2],
    }];
    scene
}

fn lighthouse() -> Scene {
    let mut scene = Scene::new(LIGHTHOUSE, "Lighthouse");
    scene.spawnpoints = vec![
        Spawnpoint::new("door", Vec3::new(0.0, 0.0, 0.0)),
        Spawnpoint::new("stairs", Vec3::new(2.0, 0.0, 1.0)).facing(270.0),
    ];
    scene.geometry = vec![floor("walkable")];
    scene
}

pub fn content() -> Content {
    let mut content = Content::default();
    content.scenes.insert(HARBOUR, harbour());
    content.scenes.insert(LIGHTHOUSE, lighthouse());

    content.characters.insert(
        DETECTIVE,
        CharacterDef {
            id: DETECTIVE,
            name: "Detective".into(),
            slug: "detective".into(),
            is_player: true,
        },
    );
    content.characters.insert(
        HANK,
        CharacterDef {
            id: HANK,
            name: "Hank".into(),
            slug: "hank".into(),
            is_player: false,
        },
    );

    content.clues.insert(
        RUSTY_KEY,
        Clue {
            id: RUSTY_KEY,
            title: "Rusty key".into(),
            initial: false,
        },
    );
    content.clues.insert(
        LETTER,
        Clue {
            id: LETTER,
            title: "Letter".into(),
            initial: true,
        },
    );
    content.media.insert(
        MediaId(1),
        Media {
            id: MediaId(1),
            filepad: "clues/key.glb".into(),
            kind: MediaKind::Model3d,
            imageable_id: Some(RUSTY_KEY.0),
            imageable_type: "Clue".into(),
        },
    );

    content.actions.insert(
        WALK_AND_TAKE_KEY,
        ActionDefinition::new(
            WALK_AND_TAKE_KEY,
            "Take the key",
            vec![
                ActionStep::walk_to_spawnpoint("player", "dock"),
                ActionStep::give_clue(RUSTY_KEY),
            ],
        ),
    );
    content.actions.insert(
        ENDS_EARLY,
        ActionDefinition::new(
            ENDS_EARLY,
            "Ends early",
            vec![
                ActionStep::new(StepKind::SetTag).param("tag", "before_end"),
                ActionStep::end(),
                ActionStep::new(StepKind::SetTag).param("tag", "after_end"),
            ],
        ),
    );
    content.actions.insert(
        BROKEN_TRIP,
        ActionDefinition::new(
            BROKEN_TRIP,
            "Broken trip",
            vec![
                ActionStep::goto_scene(LIGHTHOUSE),
                ActionStep::new(StepKind::SetTag).param("tag", "arrived"),
            ],
        ),
    );
    content.actions.insert(
        TELEPORT,
        ActionDefinition::new(
            TELEPORT,
            "Teleport",
            vec![ActionStep::new(StepKind::parse("TELEPORT")).param("x", 3)],
        ),
    );
    content.actions.insert(
        TIP_OFF,
        ActionDefinition::new(
            TIP_OFF,
            "Tip off",
            vec![
                ActionStep::new(StepKind::SetTag).param("tag", "tipped"),
                ActionStep::end(),
                ActionStep::new(StepKind::SetTag).param("tag", "after_tip"),
            ],
        ),
    );

    // One node, one answer that ends the conversation.
    let greeting = DialogueTree::from_nodes(
        vec![DialogueNode::new("root", "Evening.").with_answers(vec![DialogueChoice::new(
            "Goodbye",
            NextNode::End,
        )])],
        None,
    )
    .0;
    let mut greeting = Dialogue::new(GREETING, "greeting", greeting);
    greeting.character_id = Some(HANK);
    content.dialogues.insert(GREETING, greeting);

    let interrogation = DialogueTree::from_nodes(
        vec![
            DialogueNode::new("start", "What do you want?").with_answers(vec![
                DialogueChoice::new("The key.", NextNode::Node("key".into()))
                    .with_actions(vec![ActionStep::give_clue(RUSTY_KEY)]),
                DialogueChoice::new("Nothing.", NextNode::Node("missing".into())),
            ]),
            DialogueNode::new("key", "Take it and go.")
                .with_actions(vec![ActionStep::new(StepKind::SetTag).param("tag", "got_key")]),
        ],
        Some("start".into()),
    )
    .0;
    content.dialogues.insert(
        INTERROGATION,
        Dialogue::new(INTERROGATION, "interrogation", interrogation),
    );

    let farewell = DialogueTree::from_nodes(vec![DialogueNode::new("bye", "Bye.")], None).0;
    content
        .dialogues
        .insert(FAREWELL, Dialogue::new(FAREWELL, "farewell", farewell));

    // Node and choice both reference authored actions that stop with `End`.
    let briefing = DialogueTree::from_nodes(
        vec![
            DialogueNode::new("root", "Listen closely.")
                .with_action(TIP_OFF)
                .with_answers(vec![
                    DialogueChoice::new("Go on.", NextNode::Node("more".into()))
                        .with_action(ENDS_EARLY),
                ]),
            DialogueNode::new("more", "That's all."),
        ],
        None,
    )
    .0;
    let mut briefing = Dialogue::new(BRIEFING, "briefing", briefing);
    briefing.character_id = Some(DETECTIVE);
    content.dialogues.insert(BRIEFING, briefing);

    content
}

pub fn session_with(content: Content, loader: Arc<dyn SceneLoader>) -> Arc<Session> {
    Arc::new(Session::new(
        EngineConfig::default(),
        Arc::new(content),
        loader,
        Arc::new(StorageResolver::default()),
        EventBus::new(),
    ))
}

pub fn session() -> Arc<Session> {
    session_with(content(), Arc::new(ContentSceneLoader))
}

/// A session already standing in the harbour.
pub async fn harbour_session() -> Arc<Session> {
    let session = session();
    session
        .enter_scene(HARBOUR, Some("square"))
        .await
        .expect("harbour loads");
    session
}

/// Advances the session at 60 Hz for as long as the returned task lives.
pub fn spawn_ticker(session: &Arc<Session>) -> JoinHandle<()> {
    let session = Arc::clone(session);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_millis(16)).await;
            session.tick(0.016);
        }
    })
}

/// Records every step it is asked to run and stops at `End`.
#[derive(Default)]
pub struct RecordingExecutor {
    pub seen: Mutex<Vec<(StepKind, ActorId)>>,
}

impl RecordingExecutor {
    pub fn kinds(&self) -> Vec<StepKind> {
        self.seen
            .lock()
            .expect("recorder lock")
            .iter()
            .map(|(kind, _)| kind.clone())
            .collect()
    }
}

#[async_trait]
impl StepExecutor for RecordingExecutor {
    async fn run(&self, step: &ActionStep, owner: ActorId) -> Result<StepOutcome, StepError> {
        self.seen
            .lock()
            .expect("recorder lock")
            .push((step.kind.clone(), owner));
        if step.is_end() {
            Ok(StepOutcome::End)
        } else {
            Ok(StepOutcome::Continue)
        }
    }
}
