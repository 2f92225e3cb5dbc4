//! Headless play script.
//!
//! Each command-line argument is one command, run in order:
//!
//! ```text
//! nexus action:3 dialogue:hank_intro scene:2:door wait:1.5
//! ```
//!
//! Dialogues play themselves: whenever choices are exposed the first one is
//! taken.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use nexus_core::{ActionId, DialogueRef, SceneId};
use nexus_runtime::{DialogueEvent, Event, RuntimeHandle, Topic};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Clone, Debug, PartialEq)]
pub enum ScriptCommand {
    Action(ActionId),
    Dialogue(DialogueRef),
    Scene {
        scene: SceneId,
        spawnpoint: Option<String>,
    },
    Wait(Duration),
}

impl FromStr for ScriptCommand {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let (verb, rest) = raw
            .split_once(':')
            .with_context(|| format!("expected <command>:<argument>, got {raw:?}"))?;
        let rest = rest.trim();
        Ok(match verb.trim().to_ascii_lowercase().as_str() {
            "action" => Self::Action(ActionId(
                rest.parse().with_context(|| format!("invalid action id {rest:?}"))?,
            )),
            "dialogue" | "dialog" => Self::Dialogue(match rest.parse::<u32>() {
                Ok(id) => DialogueRef::Id(id.into()),
                Err(_) => DialogueRef::Slug(rest.to_owned()),
            }),
            "scene" => {
                let (id, spawnpoint) = match rest.split_once(':') {
                    Some((id, spawnpoint)) => (id, Some(spawnpoint.to_owned())),
                    None => (rest, None),
                };
                Self::Scene {
                    scene: SceneId(id.parse().with_context(|| format!("invalid scene id {id:?}"))?),
                    spawnpoint,
                }
            }
            "wait" => {
                let seconds: f32 = rest
                    .parse()
                    .with_context(|| format!("invalid wait {rest:?}"))?;
                if !seconds.is_finite() || seconds < 0.0 {
                    bail!("wait must be a non-negative number of seconds");
                }
                Self::Wait(Duration::from_secs_f32(seconds))
            }
            other => bail!("unknown command {other:?}"),
        })
    }
}

/// Parses every argument, failing on the first bad one.
pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Vec<ScriptCommand>> {
    args.into_iter().map(|arg| arg.parse()).collect()
}

/// Takes the first choice every time a dialogue exposes its choices.
fn spawn_auto_chooser(handle: RuntimeHandle) -> JoinHandle<()> {
    let mut rx = handle.subscribe(Topic::Dialogue);
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(Event::Dialogue(DialogueEvent::ChoicesExposed { node, choices, .. })) => {
                    debug!(node = %node, options = choices.len(), "choosing the first option");
                    let handle = handle.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle.select_choice(0).await {
                            warn!("automatic choice failed: {}", e);
                        }
                    });
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "auto chooser lagged behind dialogue events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Prints every event as one JSON line on stdout.
pub fn spawn_event_printer(handle: &RuntimeHandle) -> Vec<JoinHandle<()>> {
    handle
        .subscribe_multiple(&Topic::ALL)
        .into_values()
        .map(|mut rx| {
            tokio::spawn(async move {
                loop {
                    match rx.recv().await {
                        Ok(event) => match serde_json::to_string(&event) {
                            Ok(line) => println!("{line}"),
                            Err(e) => warn!("failed to encode event: {}", e),
                        },
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    }
                }
            })
        })
        .collect()
}

/// Runs the commands in order, stopping at the first failure.
pub async fn run(handle: &RuntimeHandle, commands: &[ScriptCommand]) -> Result<()> {
    let chooser = spawn_auto_chooser(handle.clone());

    let result = async {
        for command in commands {
            info!(?command, "running script command");
            match command {
                ScriptCommand::Action(id) => {
                    let report = handle.trigger_action(*id).await?;
                    info!(
                        action = %report.action_id,
                        steps = report.steps_run,
                        completion = ?report.completion,
                        "action finished"
                    );
                }
                ScriptCommand::Dialogue(key) => {
                    let outcome = handle.start_dialogue(key.clone()).await?;
                    info!(dialogue = %outcome.dialogue, choices = ?outcome.choices, "dialogue closed");
                }
                ScriptCommand::Scene { scene, spawnpoint } => {
                    handle.enter_scene(*scene, spawnpoint.as_deref()).await?;
                }
                ScriptCommand::Wait(duration) => tokio::time::sleep(*duration).await,
            }
        }
        Ok::<_, anyhow::Error>(())
    }
    .await;

    chooser.abort();
    result
}
