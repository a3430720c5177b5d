//! Real-time mouth and body motion for talking Kokoro avatars.
//!
//! - [`lipsync`] turns character alignment (or live loudness) into visemes
//!   and a smoothed jaw value.
//! - [`gesture`] schedules punctuation-triggered gestures by priority.
//! - [`motion`] provides deterministic noise and idle wander.
//! - [`engine::AvatarEngine`] ties them together for one avatar, ticked once
//!   per rendered frame.

pub mod config;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod lipsync;
pub mod motion;

pub use config::MotionConfig;
pub use engine::{AvatarEngine, AvatarFrame, GestureFrame, LipSyncMode, TickInput};
pub use error::{MotionError, Result};
