//! # groupcast-broadcast
//! The part of groupcast that decides who gets messaged and when:
//! per-group cooldown bookkeeping, the persisted membership roster,
//! and the sequential broadcast engine driving both.

pub mod cooldown;
pub mod engine;
pub mod roster;

pub use cooldown::CooldownTracker;
pub use engine::{BroadcastEngine, CycleReport};
pub use roster::{Roster, RosterStore, SharedRoster};
