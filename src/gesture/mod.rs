//! Expressive gestures — catalog, punctuation triggers, presets and the
//! state machine that schedules them.

pub mod library;
pub mod preset;
pub mod state_machine;
pub mod triggers;

pub use library::{
    ease_in_out, gesture_definition, AxisDelta, Bone, BoneRotations, Easing, GestureDefinition,
    GestureKind, Keyframe,
};
pub use preset::BehaviorPreset;
pub use state_machine::{
    ActiveGesture, CoarseState, GestureQueue, GestureRequest, GestureStateMachine, RequestOutcome,
};
pub use triggers::{extract_triggers, TriggerEvent, TriggerKind};
