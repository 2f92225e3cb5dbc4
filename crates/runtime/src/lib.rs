//! Async runtime of the nexus adventure engine.
//!
//! Wires the pure `nexus-core` model to tokio:
//! - [`Interpreter`] executes single action steps against the [`Session`]
//! - [`ActionSequencer`] runs whole actions, one at a time
//! - [`DialogueEngine`] plays branching dialogue with a typewriter reveal
//! - [`InteractionController`] turns pointer input into walks and gateway activations
//! - workers advance the update loop and persist the player profile
//!
//! Clients build a [`Runtime`] and talk to it through a [`RuntimeHandle`].
pub mod api;
pub mod dialogue;
pub mod events;
pub mod interaction;
pub mod interpreter;
pub mod repository;
pub mod runtime;
pub mod sequencer;
pub mod session;
pub mod stage;
pub mod workers;

pub use api::{Result, RuntimeError, RuntimeHandle};
pub use dialogue::{DialogueEngine, DialogueError, DialogueOutcome, DialogueView};
pub use events::{
    DebugEvent, DialogueEvent, DiscoveryEvent, Event, EventBus, MotionEvent, Topic, WorldEvent,
};
pub use interaction::{ClickOutcome, InteractionController, ScreenProjector};
pub use interpreter::{Interpreter, StepError, StepExecutor, StepOutcome};
pub use repository::{
    FileProfileRepository, InMemoryProfileRepository, PlayerProfile, ProfileRepository,
    RepositoryError,
};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use sequencer::{ActionSequencer, Completion, SequenceError, SequenceReport};
pub use session::Session;
pub use stage::{ContentSceneLoader, SceneError, SceneLoader, Stage, StaticSceneLoader};
