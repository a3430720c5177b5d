//! Idle motion — low-frequency wander that keeps the avatar alive between
//! and underneath gestures.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use super::noise::{fractal_noise, impulse};
use crate::gesture::CoarseState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Noise seed; avatars with different seeds wander independently.
    #[serde(default)]
    pub seed: i32,
    #[serde(default = "default_octaves")]
    pub octaves: u32,
    #[serde(default = "default_persistence")]
    pub persistence: f64,
    /// Whether idle avatars fire random twitches on their own.
    #[serde(default = "default_true")]
    pub auto_twitch: bool,
}

fn default_true() -> bool {
    true
}
fn default_octaves() -> u32 {
    3
}
fn default_persistence() -> f64 {
    0.5
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: 0,
            octaves: default_octaves(),
            persistence: default_persistence(),
            auto_twitch: true,
        }
    }
}

/// Additive pose offsets (radians) plus a 0–1 breathing phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IdlePose {
    pub head_yaw: f32,
    pub head_pitch: f32,
    pub head_roll: f32,
    pub torso_sway: f32,
    pub breathing: f32,
}

#[derive(Debug, Clone)]
pub struct IdleMotion {
    config: IdleConfig,
}

impl IdleMotion {
    pub fn new(config: IdleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IdleConfig {
        &self.config
    }

    /// Pose at wall time `time`. Speaking and agitation widen the wander.
    pub fn sample(&self, time: f64, state: CoarseState) -> IdlePose {
        if !self.config.enabled {
            return IdlePose::default();
        }

        let (scale, breath_rate) = match state {
            CoarseState::Idle => (1.0, 0.25),
            CoarseState::Speaking => (1.4, 0.3),
            CoarseState::Agitated => (2.2, 0.45),
        };

        let seed = self.config.seed;
        let wander = |rate: f64, offset: i32, amplitude: f64| -> f32 {
            let n = fractal_noise(
                time * rate,
                seed.wrapping_add(offset),
                self.config.octaves,
                self.config.persistence,
            );
            ((n * 2.0 - 1.0) * amplitude * scale) as f32
        };

        // occasional quick head tilt on top of the wander
        let accent = impulse(time * 0.7, seed.wrapping_add(97), 0.6) * 0.04 * scale;

        IdlePose {
            head_yaw: wander(0.23, 11, 0.08),
            head_pitch: wander(0.31, 23, 0.05),
            head_roll: wander(0.19, 37, 0.03) + accent as f32,
            torso_sway: wander(0.11, 53, 0.03),
            breathing: (((time * breath_rate * TAU).sin() * 0.5) + 0.5) as f32,
        }
    }
}
