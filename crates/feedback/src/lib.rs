//! Feedback Emitters
//!
//! Turns a scene into assistive feedback:
//! - Haptic vibration patterns for the nearest critical obstacle
//! - Throttled spoken alerts for dangerous scenes

mod announcer;
mod haptic;

pub use announcer::{AlertAnnouncer, AnnouncerConfig};
pub use haptic::{select_haptic, HapticFeedback, HapticPulse, PulsePattern};
