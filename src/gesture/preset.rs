//! Behavior presets — how eagerly a character gestures.
//!
//! Presets play the role the persona-derived personality plays for
//! emotions: the same punctuation produces a restrained nod from a calm
//! character and a full arm flail from an expressive one.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorPreset {
    /// Chance (0.0–1.0) that a fired punctuation trigger spawns a gesture.
    #[serde(default = "default_emphasis_probability")]
    pub emphasis_probability: f32,
    /// Intensity applied to gestures spawned by `!`.
    #[serde(default = "default_exclamation_intensity")]
    pub exclamation_intensity: f32,
    /// Maximum idle twitches per second.
    #[serde(default = "default_twitch_frequency")]
    pub twitch_frequency: f32,
    /// Intensity (0.0–1.0) of idle twitches.
    #[serde(default = "default_twitch_intensity")]
    pub twitch_intensity: f32,
}

fn default_emphasis_probability() -> f32 {
    0.5
}
fn default_exclamation_intensity() -> f32 {
    1.0
}
fn default_twitch_frequency() -> f32 {
    0.2
}
fn default_twitch_intensity() -> f32 {
    0.5
}

impl Default for BehaviorPreset {
    fn default() -> Self {
        Self::balanced()
    }
}

impl BehaviorPreset {
    pub const NAMES: [&'static str; 4] = ["calm", "balanced", "expressive", "nervous"];

    pub fn calm() -> Self {
        Self {
            emphasis_probability: 0.2,
            exclamation_intensity: 0.6,
            twitch_frequency: 0.05,
            twitch_intensity: 0.3,
        }
    }

    pub fn balanced() -> Self {
        Self {
            emphasis_probability: default_emphasis_probability(),
            exclamation_intensity: default_exclamation_intensity(),
            twitch_frequency: default_twitch_frequency(),
            twitch_intensity: default_twitch_intensity(),
        }
    }

    pub fn expressive() -> Self {
        Self {
            emphasis_probability: 0.85,
            exclamation_intensity: 1.0,
            twitch_frequency: 0.25,
            twitch_intensity: 0.6,
        }
    }

    pub fn nervous() -> Self {
        Self {
            emphasis_probability: 0.6,
            exclamation_intensity: 0.8,
            twitch_frequency: 1.0,
            twitch_intensity: 0.8,
        }
    }

    /// Look up a built-in preset by name (case-insensitive).
    pub fn named(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "calm" => Some(Self::calm()),
            "balanced" | "default" => Some(Self::balanced()),
            "expressive" => Some(Self::expressive()),
            "nervous" => Some(Self::nervous()),
            _ => None,
        }
    }

    /// Clamp every field into its valid range. Non-finite values fall back
    /// to the balanced preset's value.
    pub fn sanitized(&self) -> Self {
        let fallback = Self::balanced();
        let pick = |v: f32, d: f32| if v.is_finite() { v } else { d };
        Self {
            emphasis_probability: pick(self.emphasis_probability, fallback.emphasis_probability)
                .clamp(0.0, 1.0),
            exclamation_intensity: pick(
                self.exclamation_intensity,
                fallback.exclamation_intensity,
            )
            .max(0.0),
            twitch_frequency: {
                let f = pick(self.twitch_frequency, fallback.twitch_frequency);
                if f > 0.0 {
                    f
                } else {
                    fallback.twitch_frequency
                }
            },
            twitch_intensity: pick(self.twitch_intensity, fallback.twitch_intensity)
                .clamp(0.0, 1.0),
        }
    }

    /// Minimum seconds between two idle twitches.
    pub fn twitch_interval_secs(&self) -> f64 {
        1.0 / self.twitch_frequency as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_named_preset_resolves() {
        for name in BehaviorPreset::NAMES {
            assert!(BehaviorPreset::named(name).is_some(), "missing preset {}", name);
        }
        assert_eq!(BehaviorPreset::named(" Calm "), Some(BehaviorPreset::calm()));
        assert_eq!(BehaviorPreset::named("sleepy"), None);
    }

    #[test]
    fn sanitized_clamps_out_of_range_values() {
        let wild = BehaviorPreset {
            emphasis_probability: 3.0,
            exclamation_intensity: -1.0,
            twitch_frequency: 0.0,
            twitch_intensity: f32::NAN,
        };
        let clean = wild.sanitized();
        assert_eq!(clean.emphasis_probability, 1.0);
        assert_eq!(clean.exclamation_intensity, 0.0);
        assert_eq!(clean.twitch_frequency, default_twitch_frequency());
        assert_eq!(clean.twitch_intensity, default_twitch_intensity());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let preset: BehaviorPreset =
            serde_json::from_str(r#"{"emphasis_probability": 0.9}"#).unwrap();
        assert_eq!(preset.emphasis_probability, 0.9);
        assert_eq!(preset.twitch_frequency, default_twitch_frequency());
    }

    #[test]
    fn twitch_interval_is_inverse_frequency() {
        let preset = BehaviorPreset::nervous();
        assert_eq!(preset.twitch_interval_secs(), 1.0);
    }
}
