//! Procedural motion — noise primitives and the idle pose built on them.

pub mod idle;
pub mod noise;

pub use idle::{IdleConfig, IdleMotion, IdlePose};
