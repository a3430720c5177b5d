//! Gesture library — the static catalog of keyframed body motions.
//!
//! Each gesture is a short sequence of per-bone rotation deltas (radians,
//! added on top of the rig's pose) over normalised time `0.0..=1.0`.
//! The catalog is built once and shared read-only by every avatar.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

// ── Bones & rotations ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Bone {
    Head,
    Neck,
    Spine,
    Chest,
    LeftShoulder,
    RightShoulder,
    LeftUpperArm,
    RightUpperArm,
    LeftLowerArm,
    RightLowerArm,
}

/// Rotation delta with optional axes. An absent axis is left alone by the
/// renderer rather than driven to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
}

impl AxisDelta {
    pub const fn new(x: Option<f32>, y: Option<f32>, z: Option<f32>) -> Self {
        Self { x, y, z }
    }

    pub const fn x(v: f32) -> Self {
        Self::new(Some(v), None, None)
    }

    pub const fn y(v: f32) -> Self {
        Self::new(None, Some(v), None)
    }

    pub const fn z(v: f32) -> Self {
        Self::new(None, None, Some(v))
    }

    pub const fn xz(x: f32, z: f32) -> Self {
        Self::new(Some(x), None, Some(z))
    }

    /// Per-axis blend from `from` to `to`; an axis present on one side only is
    /// passed through as-is.
    fn blend(from: Option<&AxisDelta>, to: Option<&AxisDelta>, t: f32) -> AxisDelta {
        let axis = |a: Option<f32>, b: Option<f32>| match (a, b) {
            (Some(a), Some(b)) => Some(a + (b - a) * t),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        };
        let from = from.copied().unwrap_or_default();
        let to = to.copied().unwrap_or_default();
        AxisDelta {
            x: axis(from.x, to.x),
            y: axis(from.y, to.y),
            z: axis(from.z, to.z),
        }
    }

    fn scaled(self, factor: f32) -> AxisDelta {
        AxisDelta {
            x: self.x.map(|v| v * factor),
            y: self.y.map(|v| v * factor),
            z: self.z.map(|v| v * factor),
        }
    }
}

/// Rotation deltas for every bone a gesture touches this frame.
pub type BoneRotations = BTreeMap<Bone, AxisDelta>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Normalised time within the gesture, 0.0–1.0.
    pub time: f32,
    pub bones: BoneRotations,
}

impl Keyframe {
    pub fn new(time: f32, bones: &[(Bone, AxisDelta)]) -> Self {
        Self {
            time,
            bones: bones.iter().copied().collect(),
        }
    }
}

// ── Easing ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    #[default]
    EaseInOut,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::EaseInOut => ease_in_out(t),
        }
    }
}

/// Quadratic ease-in-out.
pub fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

// ── Gesture kinds ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GestureKind {
    HeadNod,
    HeadShake,
    Shrug,
    LeanForward,
    LeanBack,
    PointLeft,
    PointRight,
    ArmFlailBoth,
    ArmFlailLeft,
    ArmFlailRight,
    HeadTwitch,
    ShoulderTwitch,
}

impl GestureKind {
    /// Catalog order; the library is indexed by position in this array.
    pub const ALL: [GestureKind; 12] = [
        GestureKind::HeadNod,
        GestureKind::HeadShake,
        GestureKind::Shrug,
        GestureKind::LeanForward,
        GestureKind::LeanBack,
        GestureKind::PointLeft,
        GestureKind::PointRight,
        GestureKind::ArmFlailBoth,
        GestureKind::ArmFlailLeft,
        GestureKind::ArmFlailRight,
        GestureKind::HeadTwitch,
        GestureKind::ShoulderTwitch,
    ];

    /// Small idle accents used by the twitch trigger.
    pub const TWITCHES: [GestureKind; 2] = [GestureKind::HeadTwitch, GestureKind::ShoulderTwitch];

    pub fn name(self) -> &'static str {
        match self {
            GestureKind::HeadNod => "headNod",
            GestureKind::HeadShake => "headShake",
            GestureKind::Shrug => "shrug",
            GestureKind::LeanForward => "leanForward",
            GestureKind::LeanBack => "leanBack",
            GestureKind::PointLeft => "pointLeft",
            GestureKind::PointRight => "pointRight",
            GestureKind::ArmFlailBoth => "armFlailBoth",
            GestureKind::ArmFlailLeft => "armFlailLeft",
            GestureKind::ArmFlailRight => "armFlailRight",
            GestureKind::HeadTwitch => "headTwitch",
            GestureKind::ShoulderTwitch => "shoulderTwitch",
        }
    }

    /// Accepts `headNod`, `head_nod`, `head-nod` and any casing thereof.
    pub fn from_name(name: &str) -> Option<GestureKind> {
        let wanted: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        GestureKind::ALL
            .iter()
            .copied()
            .find(|k| k.name().to_lowercase() == wanted)
    }

    pub fn definition(self) -> &'static GestureDefinition {
        gesture_definition(self)
    }

    fn index(self) -> usize {
        self as usize
    }
}

// ── Definitions ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GestureDefinition {
    pub kind: GestureKind,
    pub duration_secs: f32,
    pub keyframes: Vec<Keyframe>,
    /// Whether a higher-priority request may cut this gesture short.
    pub interruptible: bool,
    pub priority: u8,
    pub easing: Easing,
}

impl GestureDefinition {
    /// Whether `incoming` may cut this gesture short: only interruptible
    /// gestures yield, and only to strictly higher priority.
    pub fn yields_to(&self, incoming: &GestureDefinition) -> bool {
        self.interruptible && incoming.priority > self.priority
    }

    /// Interpolated bone rotations at `progress` (0.0–1.0), scaled by
    /// `intensity`.
    ///
    /// The bracketing keyframe pair is the first one found by a linear scan;
    /// outside every pair the first or last keyframe is held.
    ///
    /// # Panics
    /// If the definition has no keyframes. The catalog never builds one, so
    /// this only fires on a malformed custom definition.
    pub fn sample(&self, progress: f32, intensity: f32) -> BoneRotations {
        assert!(
            !self.keyframes.is_empty(),
            "gesture {:?} has no keyframes",
            self.kind
        );
        let frames = &self.keyframes;

        let (from, to) = frames
            .windows(2)
            .find(|pair| pair[0].time <= progress && progress <= pair[1].time)
            .map(|pair| (&pair[0], &pair[1]))
            .unwrap_or_else(|| {
                let last = &frames[frames.len() - 1];
                if progress < frames[0].time {
                    (&frames[0], &frames[0])
                } else {
                    (last, last)
                }
            });

        let span = to.time - from.time;
        let local = if span > 0.0 {
            ((progress - from.time) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let t = self.easing.apply(local);

        let bones: BTreeSet<Bone> = from.bones.keys().chain(to.bones.keys()).copied().collect();
        bones
            .into_iter()
            .map(|bone| {
                let delta = AxisDelta::blend(from.bones.get(&bone), to.bones.get(&bone), t);
                (bone, delta.scaled(intensity))
            })
            .collect()
    }
}

/// The shared catalog entry for `kind`.
pub fn gesture_definition(kind: GestureKind) -> &'static GestureDefinition {
    static LIBRARY: OnceLock<Vec<GestureDefinition>> = OnceLock::new();
    let library = LIBRARY.get_or_init(|| GestureKind::ALL.iter().map(|k| build(*k)).collect());
    &library[kind.index()]
}

fn build(kind: GestureKind) -> GestureDefinition {
    use Bone::*;
    let kf = Keyframe::new;

    let (duration_secs, priority, interruptible, keyframes) = match kind {
        GestureKind::HeadNod => (
            0.8,
            1,
            true,
            vec![
                kf(0.0, &[(Head, AxisDelta::x(0.0))]),
                kf(0.25, &[(Head, AxisDelta::x(0.25))]),
                kf(0.5, &[(Head, AxisDelta::x(-0.05))]),
                kf(0.75, &[(Head, AxisDelta::x(0.15))]),
                kf(1.0, &[(Head, AxisDelta::x(0.0))]),
            ],
        ),
        GestureKind::HeadShake => (
            1.0,
            1,
            true,
            vec![
                kf(0.0, &[(Head, AxisDelta::y(0.0))]),
                kf(0.2, &[(Head, AxisDelta::y(0.25))]),
                kf(0.4, &[(Head, AxisDelta::y(-0.25))]),
                kf(0.6, &[(Head, AxisDelta::y(0.2))]),
                kf(0.8, &[(Head, AxisDelta::y(-0.1))]),
                kf(1.0, &[(Head, AxisDelta::y(0.0))]),
            ],
        ),
        GestureKind::Shrug => (
            1.2,
            2,
            true,
            vec![
                kf(
                    0.0,
                    &[
                        (LeftShoulder, AxisDelta::z(0.0)),
                        (RightShoulder, AxisDelta::z(0.0)),
                        (Head, AxisDelta::z(0.0)),
                    ],
                ),
                kf(
                    0.3,
                    &[
                        (LeftShoulder, AxisDelta::z(0.3)),
                        (RightShoulder, AxisDelta::z(-0.3)),
                        (Head, AxisDelta::z(0.08)),
                    ],
                ),
                kf(
                    0.7,
                    &[
                        (LeftShoulder, AxisDelta::z(0.3)),
                        (RightShoulder, AxisDelta::z(-0.3)),
                        (Head, AxisDelta::z(0.08)),
                    ],
                ),
                kf(
                    1.0,
                    &[
                        (LeftShoulder, AxisDelta::z(0.0)),
                        (RightShoulder, AxisDelta::z(0.0)),
                        (Head, AxisDelta::z(0.0)),
                    ],
                ),
            ],
        ),
        GestureKind::LeanForward => (
            1.5,
            1,
            true,
            vec![
                kf(0.0, &[(Spine, AxisDelta::x(0.0)), (Head, AxisDelta::x(0.0))]),
                kf(0.3, &[(Spine, AxisDelta::x(0.15)), (Head, AxisDelta::x(-0.05))]),
                kf(0.7, &[(Spine, AxisDelta::x(0.15)), (Head, AxisDelta::x(-0.05))]),
                kf(1.0, &[(Spine, AxisDelta::x(0.0)), (Head, AxisDelta::x(0.0))]),
            ],
        ),
        GestureKind::LeanBack => (
            1.5,
            1,
            true,
            vec![
                kf(0.0, &[(Spine, AxisDelta::x(0.0))]),
                kf(0.35, &[(Spine, AxisDelta::x(-0.12))]),
                kf(0.7, &[(Spine, AxisDelta::x(-0.12))]),
                kf(1.0, &[(Spine, AxisDelta::x(0.0))]),
            ],
        ),
        GestureKind::PointLeft => (1.4, 2, true, point(LeftUpperArm, LeftLowerArm, 1.0)),
        GestureKind::PointRight => (1.4, 2, true, point(RightUpperArm, RightLowerArm, -1.0)),
        GestureKind::ArmFlailBoth => (
            1.2,
            3,
            false,
            flail(&[(LeftUpperArm, 1.0), (RightUpperArm, -1.0)]),
        ),
        GestureKind::ArmFlailLeft => (1.0, 3, false, flail(&[(LeftUpperArm, 1.0)])),
        GestureKind::ArmFlailRight => (1.0, 3, false, flail(&[(RightUpperArm, -1.0)])),
        GestureKind::HeadTwitch => (
            0.3,
            0,
            true,
            vec![
                kf(0.0, &[(Head, AxisDelta::z(0.0))]),
                kf(0.3, &[(Head, AxisDelta::z(0.06))]),
                kf(1.0, &[(Head, AxisDelta::z(0.0))]),
            ],
        ),
        GestureKind::ShoulderTwitch => (
            0.35,
            0,
            true,
            vec![
                kf(0.0, &[(RightShoulder, AxisDelta::z(0.0))]),
                kf(0.4, &[(RightShoulder, AxisDelta::z(-0.1))]),
                kf(1.0, &[(RightShoulder, AxisDelta::z(0.0))]),
            ],
        ),
    };

    GestureDefinition {
        kind,
        duration_secs,
        keyframes,
        interruptible,
        priority,
        easing: Easing::EaseInOut,
    }
}

/// Raise an arm sideways and hold. `side` is +1 for left, -1 for right.
fn point(upper: Bone, lower: Bone, side: f32) -> Vec<Keyframe> {
    let rest = [
        (upper, AxisDelta::xz(0.0, 0.0)),
        (lower, AxisDelta::y(0.0)),
        (Bone::Head, AxisDelta::y(0.0)),
    ];
    let raised = [
        (upper, AxisDelta::xz(-0.2, 1.1 * side)),
        (lower, AxisDelta::y(0.2 * side)),
        (Bone::Head, AxisDelta::y(0.2 * side)),
    ];
    vec![
        Keyframe::new(0.0, &rest),
        Keyframe::new(0.3, &raised),
        Keyframe::new(0.75, &raised),
        Keyframe::new(1.0, &rest),
    ]
}

/// Rapid up/down swings of one or both upper arms.
fn flail(arms: &[(Bone, f32)]) -> Vec<Keyframe> {
    let amplitudes = [0.0, 0.9, 0.4, 1.0, 0.3, 0.0];
    amplitudes
        .iter()
        .enumerate()
        .map(|(i, amp)| {
            let bones: Vec<(Bone, AxisDelta)> = arms
                .iter()
                .map(|&(bone, side)| (bone, AxisDelta::z(*amp * side)))
                .collect();
            Keyframe::new(i as f32 / (amplitudes.len() - 1) as f32, &bones)
        })
        .collect()
}
