//! Punctuation triggers — timestamps in the utterance where a gesture may
//! fire.

use serde::{Deserialize, Serialize};

use super::library::GestureKind;
use crate::lipsync::Alignment;

/// A trigger fires once playback enters `[time - LEAD, time + TAIL]`.
pub const TRIGGER_LEAD_SECS: f32 = 0.05;
pub const TRIGGER_TAIL_SECS: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    Emphasis,
    Question,
    Exclaim,
}

impl TriggerKind {
    /// Full-width CJK punctuation is recognised alongside ASCII.
    pub fn from_punctuation(c: char) -> Option<Self> {
        match c {
            '?' | '？' => Some(TriggerKind::Question),
            '!' | '！' => Some(TriggerKind::Exclaim),
            '.' | ',' | ';' | ':' | '。' | '，' | '；' | '：' => Some(TriggerKind::Emphasis),
            _ => None,
        }
    }

    /// Gestures a trigger of this kind may spawn, picked uniformly.
    pub fn candidates(self) -> &'static [GestureKind] {
        match self {
            TriggerKind::Emphasis => &[
                GestureKind::HeadNod,
                GestureKind::PointLeft,
                GestureKind::PointRight,
                GestureKind::LeanForward,
            ],
            TriggerKind::Question => &[
                GestureKind::HeadShake,
                GestureKind::Shrug,
                GestureKind::LeanBack,
            ],
            TriggerKind::Exclaim => &[
                GestureKind::ArmFlailBoth,
                GestureKind::ArmFlailLeft,
                GestureKind::ArmFlailRight,
                GestureKind::LeanForward,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub time: f32,
    pub kind: TriggerKind,
}

impl TriggerEvent {
    pub fn new(time: f32, kind: TriggerKind) -> Self {
        Self { time, kind }
    }

    pub fn in_window(&self, playback_time: f32) -> bool {
        playback_time >= self.time - TRIGGER_LEAD_SECS && playback_time <= self.time + TRIGGER_TAIL_SECS
    }

    /// Dedup key. Triggers are identified by their time.
    pub(crate) fn key(&self) -> u32 {
        self.time.to_bits()
    }
}

/// One trigger per validly-timed punctuation character, at its start time.
pub fn extract_triggers(alignment: &Alignment) -> Vec<TriggerEvent> {
    (0..alignment.len())
        .filter_map(|i| alignment.timed(i))
        .filter_map(|c| TriggerKind::from_punctuation(c.ch).map(|kind| TriggerEvent::new(c.start, kind)))
        .collect()
}
