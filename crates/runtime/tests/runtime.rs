mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::*;
use glam::Vec3;
use nexus_core::{ActionStep, ActorId, ClueId};
use nexus_runtime::{
    Completion, Event, FileProfileRepository, InMemoryProfileRepository, PlayerProfile,
    ProfileRepository, RepositoryError, Runtime, RuntimeConfig, RuntimeError, Topic, WorldEvent,
};
use tokio::time::{sleep, timeout};

fn manual_ticks() -> RuntimeConfig {
    RuntimeConfig {
        tick_rate: 0,
        ..RuntimeConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn build_requires_content() {
    let result = Runtime::builder().build().await;
    assert!(matches!(result, Err(RuntimeError::MissingContent)));
}

#[tokio::test(start_paused = true)]
async fn opening_scene_follows_config_then_first_scene() {
    let runtime = Runtime::builder()
        .content(content())
        .build()
        .await
        .expect("runtime should build");
    assert_eq!(runtime.handle().world().current_scene_id, Some(HARBOUR));
    runtime.shutdown().await.expect("shutdown");

    let mut configured = content();
    configured
        .configs
        .insert("opening_scene".into(), serde_json::json!(LIGHTHOUSE.0));
    let runtime = Runtime::builder()
        .content(configured)
        .build()
        .await
        .expect("runtime should build");
    assert_eq!(runtime.handle().world().current_scene_id, Some(LIGHTHOUSE));
    runtime.shutdown().await.expect("shutdown");

    let runtime = Runtime::builder()
        .content(content())
        .start_scene(LIGHTHOUSE)
        .build()
        .await
        .expect("runtime should build");
    assert_eq!(runtime.handle().world().current_scene_id, Some(LIGHTHOUSE));
    runtime.shutdown().await.expect("shutdown");
}

/// With the timer disabled the player only moves when the handle steps
/// the world.
#[tokio::test(start_paused = true)]
async fn manual_ticks_drive_a_triggered_action() {
    let runtime = Runtime::builder()
        .config(manual_ticks())
        .content(content())
        .build()
        .await
        .expect("runtime should build");
    let handle = runtime.handle();

    let running = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.trigger_action(WALK_AND_TAKE_KEY).await })
    };
    while !handle.sequencer().is_executing() {
        tokio::task::yield_now().await;
    }
    sleep(Duration::from_secs(5)).await;
    assert!(!running.is_finished(), "nothing moves without ticks");

    for _ in 0..100 {
        if running.is_finished() {
            break;
        }
        handle.tick(0.1).await.expect("tick worker is running");
        tokio::task::yield_now().await;
    }
    let report = running
        .await
        .expect("no panic")
        .expect("action should run");
    assert_eq!(report.completion, Completion::Finished);
    assert!(handle.world().has_clue(RUSTY_KEY));
    assert!(handle.discovery_frame().is_none(), "the effect starts on the next tick");
    handle.tick(0.1).await.expect("tick worker is running");
    let frame = handle.discovery_frame().expect("discovery effect is showing");
    assert_eq!(frame.clue, RUSTY_KEY);

    runtime.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn timer_ticks_move_the_player() {
    let runtime = Runtime::builder()
        .content(content())
        .build()
        .await
        .expect("runtime should build");
    let handle = runtime.handle();

    let step = ActionStep::walk_to_spawnpoint("player", "dock");
    timeout(Duration::from_secs(30), handle.run_step(&step, ActorId::Player))
        .await
        .expect("walk should arrive")
        .expect("step should run");

    let position = handle
        .session()
        .with_motion(|motion| motion.position(ActorId::Player))
        .expect("player is spawned");
    assert!(position.distance(Vec3::new(1.0, 0.0, 2.0)) < 0.2);
    runtime.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn reset_restores_the_initial_inventory() {
    let runtime = Runtime::builder()
        .config(manual_ticks())
        .content(content())
        .build()
        .await
        .expect("runtime should build");
    let handle = runtime.handle();
    let mut world_rx = handle.subscribe(Topic::World);

    handle
        .run_step(&ActionStep::give_clue(RUSTY_KEY), ActorId::Player)
        .await
        .expect("clue granted");
    handle.reset();

    let world = handle.world();
    assert_eq!(world.inventory.iter().copied().collect::<Vec<_>>(), vec![LETTER]);
    assert_eq!(world.current_scene_id, None);
    assert!(handle.discovery_frame().is_none());

    let mut saw_reset = false;
    while let Ok(event) = world_rx.try_recv() {
        saw_reset |= matches!(event, Event::World(WorldEvent::SessionReset));
    }
    assert!(saw_reset);
    runtime.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn save_profile_requires_persistence() {
    let runtime = Runtime::builder()
        .content(content())
        .build()
        .await
        .expect("runtime should build");
    let result = runtime.handle().save_profile().await;
    assert!(matches!(result, Err(RuntimeError::PersistenceDisabled)));
    runtime.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn profile_is_saved_as_the_world_changes() {
    let repository = Arc::new(InMemoryProfileRepository::new());
    let runtime = Runtime::builder()
        .config(manual_ticks())
        .content(content())
        .repository(repository.clone())
        .enable_persistence(true)
        .build()
        .await
        .expect("runtime should build");
    let handle = runtime.handle();

    handle
        .run_step(&ActionStep::give_clue(RUSTY_KEY), ActorId::Player)
        .await
        .expect("clue granted");
    sleep(Duration::from_millis(10)).await;

    let saved = repository
        .load("default")
        .expect("repository readable")
        .expect("profile saved");
    assert_eq!(saved.inventory, vec![RUSTY_KEY, LETTER]);
    assert_eq!(saved.current_scene_id, Some(HARBOUR));

    let explicit = handle.save_profile().await.expect("save now");
    assert_eq!(explicit.inventory, saved.inventory);

    runtime.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn saved_profile_is_restored_on_build() {
    let profile = PlayerProfile {
        id: "default".into(),
        inventory: vec![RUSTY_KEY],
        tags: vec!["door_open".into()],
        current_scene_id: Some(LIGHTHOUSE),
        saved_at: Utc::now(),
    };
    let repository = Arc::new(InMemoryProfileRepository::with_profile(profile));

    let runtime = Runtime::builder()
        .content(content())
        .repository(repository)
        .build()
        .await
        .expect("runtime should build");
    let world = runtime.handle().world();

    assert!(world.has_clue(RUSTY_KEY));
    assert!(!world.has_clue(LETTER), "saved inventory replaces the initial one");
    assert!(world.has_tag("door_open"));
    assert_eq!(world.current_scene_id, Some(LIGHTHOUSE));
    runtime.shutdown().await.expect("shutdown");
}

#[test]
fn file_repository_round_trips_profiles() {
    let dir = tempfile::tempdir().expect("temp dir");
    let repository = FileProfileRepository::new(dir.path()).expect("repository");

    let profile = PlayerProfile {
        id: "slot-1".into(),
        inventory: vec![ClueId(3), ClueId(8)],
        tags: vec!["met_hank".into()],
        current_scene_id: Some(HARBOUR),
        saved_at: Utc::now(),
    };
    assert!(!repository.exists("slot-1"));
    repository.save(&profile).expect("save");

    assert!(repository.exists("slot-1"));
    assert!(dir.path().join("profile_slot-1.json").exists());
    assert_eq!(repository.load("slot-1").expect("load"), Some(profile));
    assert_eq!(repository.list_ids().expect("list"), vec!["slot-1".to_owned()]);

    repository.delete("slot-1").expect("delete");
    assert_eq!(repository.load("slot-1").expect("load"), None);
}

#[test]
fn file_repository_rejects_path_like_ids() {
    let dir = tempfile::tempdir().expect("temp dir");
    let repository = FileProfileRepository::new(dir.path()).expect("repository");

    let result = repository.load("../outside");
    assert!(matches!(result, Err(RepositoryError::InvalidId(_))));
    assert!(!repository.exists("../outside"));
}
