//! Outward events of a play session.
//!
//! Every event belongs to one [`Topic`]. Front ends subscribe only to the
//! topics they render, for example the dialogue box to [`Topic::Dialogue`].

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{DebugEvent, DialogueEvent, DiscoveryEvent, MotionEvent, WorldEvent};
