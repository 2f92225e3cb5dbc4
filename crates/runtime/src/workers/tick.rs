//! Fixed-rate update loop.
//!
//! Every tick advances character motion and the discovery effect by the real
//! time elapsed since the previous tick. Commands can pause the loop or step
//! it by hand; a tick rate of zero disables the timer so only manual steps
//! move the world.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant, MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::session::Session;

/// Largest step a single timer tick may apply, in seconds. Longer stalls are
/// absorbed instead of teleporting walkers.
const MAX_FRAME_SECS: f32 = 0.25;

/// Commands that can be sent to the tick worker
pub enum Command {
    /// Advance the world by `dt` seconds right away.
    Step { dt: f32, reply: oneshot::Sender<()> },
    /// Stop or resume the timer-driven ticks. Manual steps still apply.
    SetPaused { paused: bool },
    Shutdown,
}

pub struct TickWorker {
    session: Arc<Session>,
    tick_rate: u32,
    paused: bool,
    command_rx: mpsc::Receiver<Command>,
}

impl TickWorker {
    pub fn new(session: Arc<Session>, tick_rate: u32, command_rx: mpsc::Receiver<Command>) -> Self {
        Self {
            session,
            tick_rate,
            paused: false,
            command_rx,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        let timed = self.tick_rate > 0;
        let period = if timed {
            Duration::from_secs_f64(1.0 / f64::from(self.tick_rate))
        } else {
            Duration::from_secs(3600)
        };
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = Instant::now();

        info!(target: "nexus::runtime", tick_rate = self.tick_rate, "TickWorker started");
        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(Command::Step { dt, reply }) => {
                        self.session.tick(dt);
                        let _ = reply.send(());
                    }
                    Some(Command::SetPaused { paused }) => {
                        debug!(target: "nexus::runtime", paused, "update loop pause toggled");
                        self.paused = paused;
                    }
                    Some(Command::Shutdown) | None => break,
                },
                now = ticker.tick(), if timed => {
                    let dt = now.saturating_duration_since(last).as_secs_f32();
                    last = now;
                    if !self.paused {
                        self.session.tick(dt.min(MAX_FRAME_SECS));
                    }
                }
            }
        }
        info!(target: "nexus::runtime", "TickWorker stopped");
    }
}
