mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use glam::Vec3;
use nexus_core::{ActorId, CursorHint, DialogueRef, GatewayId};
use nexus_runtime::{ActionSequencer, ClickOutcome, InteractionController, Interpreter, Session};
use tokio::time::timeout;

const LIMIT: Duration = Duration::from_secs(30);

fn controller(session: &Arc<Session>) -> (Arc<Interpreter>, InteractionController) {
    let interpreter = Interpreter::new(Arc::clone(session));
    let sequencer = Arc::new(ActionSequencer::new(Arc::clone(session), interpreter.clone()));
    let controller = InteractionController::new(
        Arc::clone(session),
        interpreter.clone(),
        sequencer,
        Arc::clone(interpreter.dialogue()),
    );
    (interpreter, controller)
}

fn player_position(session: &Session) -> Vec3 {
    session
        .with_motion(|motion| motion.position(ActorId::Player))
        .expect("player is spawned")
}

#[tokio::test(start_paused = true)]
async fn hover_reports_the_cursor_and_remembers_the_arrival_spawnpoint() {
    let session = harbour_session().await;
    let (_interpreter, controller) = controller(&session);

    assert_eq!(controller.hover(50.0, 10.0), CursorHint::Pointer);
    assert_eq!(controller.hover(15.0, 65.0), CursorHint::Hover);
    assert_eq!(session.world().target_spawn_point, None);

    assert_eq!(controller.hover(90.0, 50.0), CursorHint::Direction);
    assert_eq!(session.world().target_spawn_point.as_deref(), Some("stairs"));
}

/// Clicking the crate walks the player to the click, then runs the crate's
/// action, which walks to the dock and hands over the key. The crate's
/// gateway only shows while the key is missing.
#[tokio::test(start_paused = true)]
async fn trigger_gateway_runs_its_action_after_the_walk() {
    let session = harbour_session().await;
    let (_interpreter, controller) = controller(&session);
    let ticker = spawn_ticker(&session);

    let outcome = timeout(LIMIT, controller.click(15.0, 65.0, Some(Vec3::new(-1.0, 0.0, -1.0))))
        .await
        .expect("click should resolve");
    ticker.abort();

    assert_eq!(outcome, ClickOutcome::Gateway(GatewayId(2)));
    let world = session.world();
    assert_eq!(world.last_triggered_gateway_id, Some(GatewayId(2)));
    assert!(world.has_clue(RUSTY_KEY));
    assert!(
        world
            .debug_log
            .lines()
            .any(|line| line == "ACTION TRIGGERED: Take the key")
    );
    assert!(player_position(&session).distance(Vec3::new(1.0, 0.0, 2.0)) < 0.2);

    assert_eq!(controller.hover(15.0, 65.0), CursorHint::Pointer);
}

#[tokio::test(start_paused = true)]
async fn scene_gateway_walks_to_its_walk_point_and_changes_scene() {
    let session = harbour_session().await;
    let (_interpreter, controller) = controller(&session);
    let ticker = spawn_ticker(&session);
    let mut motion_rx = session.events().subscribe(nexus_runtime::Topic::Motion);

    let outcome = timeout(LIMIT, controller.click(90.0, 50.0, None))
        .await
        .expect("click should resolve");
    ticker.abort();

    assert_eq!(outcome, ClickOutcome::Gateway(GatewayId(1)));
    match motion_rx.try_recv() {
        Ok(nexus_runtime::Event::Motion(nexus_runtime::MotionEvent::WalkStarted {
            actor,
            destination,
            ..
        })) => {
            assert_eq!(actor, ActorId::Player);
            assert_eq!(destination, Vec3::new(4.0, 0.0, 0.0));
        }
        other => panic!("expected the walk to the gateway first, got {other:?}"),
    }

    let world = session.world();
    assert_eq!(world.current_scene_id, Some(LIGHTHOUSE));
    assert_eq!(world.target_spawn_point, None);
    assert_eq!(player_position(&session), Vec3::new(2.0, 0.0, 1.0));
}

#[tokio::test(start_paused = true)]
async fn floor_click_walks_to_the_nearest_walkable_point() {
    let session = harbour_session().await;
    let (_interpreter, controller) = controller(&session);
    let ticker = spawn_ticker(&session);

    let outcome = timeout(LIMIT, controller.click(50.0, 10.0, Some(Vec3::new(8.0, 0.0, 3.0))))
        .await
        .expect("click should resolve");
    ticker.abort();

    let ClickOutcome::Walked(point) = outcome else {
        panic!("expected a floor walk, got {outcome:?}");
    };
    assert!(point.distance(Vec3::new(5.0, 0.0, 3.0)) < 1e-3);
    assert!(player_position(&session).distance(point) < 0.2);
}

#[tokio::test(start_paused = true)]
async fn clicks_are_ignored_without_a_floor_hit_or_during_dialogue() {
    let session = harbour_session().await;
    let (interpreter, controller) = controller(&session);

    assert_eq!(controller.click(50.0, 10.0, None).await, ClickOutcome::Ignored);

    let engine = Arc::clone(interpreter.dialogue());
    let running = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.start(&DialogueRef::Id(GREETING), None).await })
    };
    while !engine.is_open() {
        tokio::task::yield_now().await;
    }
    let start = player_position(&session);
    assert_eq!(
        controller.click(15.0, 65.0, Some(Vec3::new(3.0, 0.0, 3.0))).await,
        ClickOutcome::Ignored
    );
    assert_eq!(player_position(&session), start);
    assert_eq!(session.world().last_triggered_gateway_id, None);

    engine.close();
    running.await.expect("no panic").expect("dialogue opened");
}
