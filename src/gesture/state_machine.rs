//! Gesture state machine — coarse body state plus one active gesture and a
//! FIFO of pending ones.
//!
//! All timing is driven by caller-supplied clocks (`now` in wall seconds,
//! playback time in utterance seconds), never by tick counts, so irregular
//! frame rates do not stretch or squash gestures.

use std::collections::{HashSet, VecDeque};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::library::{gesture_definition, BoneRotations, GestureKind};
use super::preset::BehaviorPreset;
use super::triggers::{TriggerEvent, TriggerKind};

/// Amplitude above which a speaking avatar counts as agitated.
pub const AGITATION_THRESHOLD: f32 = 60.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoarseState {
    #[default]
    Idle,
    Speaking,
    Agitated,
}

impl CoarseState {
    /// Pure function of playback status and current amplitude.
    pub fn from_playback(is_playing: bool, amplitude: f32) -> Self {
        match (is_playing, amplitude > AGITATION_THRESHOLD) {
            (false, _) => CoarseState::Idle,
            (true, true) => CoarseState::Agitated,
            (true, false) => CoarseState::Speaking,
        }
    }
}

/// A gesture waiting to run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GestureRequest {
    pub kind: GestureKind,
    pub intensity: f32,
}

/// Pending requests, served first in first out.
pub type GestureQueue = VecDeque<GestureRequest>;

/// The gesture currently playing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActiveGesture {
    pub kind: GestureKind,
    pub duration_secs: f32,
    pub intensity: f32,
    /// Wall-clock seconds at which this gesture (re)started.
    pub started_at: f64,
}

/// What happened to a gesture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Nothing was playing; the request started immediately.
    Activated,
    /// The request outranked the active gesture and replaced it.
    Preempted { replaced: GestureKind },
    /// Appended to the queue at this position (0 = next up).
    Queued { position: usize },
}

pub struct GestureStateMachine<R = StdRng> {
    preset: BehaviorPreset,
    rng: R,
    state: CoarseState,
    active: Option<ActiveGesture>,
    progress: f32,
    queue: GestureQueue,
    /// Trigger times already consumed in this utterance.
    fired_triggers: HashSet<u32>,
    last_twitch_at: Option<f64>,
}

impl GestureStateMachine<StdRng> {
    pub fn new(preset: BehaviorPreset) -> Self {
        Self::with_rng(preset, StdRng::from_entropy())
    }
}

impl<R: Rng> GestureStateMachine<R> {
    pub fn with_rng(preset: BehaviorPreset, rng: R) -> Self {
        Self {
            preset: preset.sanitized(),
            rng,
            state: CoarseState::Idle,
            active: None,
            progress: 0.0,
            queue: GestureQueue::new(),
            fired_triggers: HashSet::new(),
            last_twitch_at: None,
        }
    }

    // ── Coarse state ───────────────────────────────────────

    /// Recompute the coarse state. Leaving playback forgets which triggers
    /// fired so the next utterance starts clean.
    pub fn update_state(&mut self, is_playing: bool, amplitude: f32) -> CoarseState {
        let state = CoarseState::from_playback(is_playing, amplitude);
        if !is_playing {
            self.fired_triggers.clear();
        }
        if state != self.state {
            trace!(from = ?self.state, to = ?state, "coarse state changed");
        }
        self.state = state;
        state
    }

    // ── Triggers ───────────────────────────────────────────

    /// Fire every trigger whose window contains `playback_time` and has not
    /// fired before. Returns how many gestures were requested.
    ///
    /// A seek that jumps clean over a window skips that trigger for good.
    pub fn process_triggers(&mut self, triggers: &[TriggerEvent], playback_time: f32, now: f64) -> usize {
        let mut spawned = 0;
        for trigger in triggers {
            if !trigger.in_window(playback_time) || !self.fired_triggers.insert(trigger.key()) {
                continue;
            }

            let roll: f32 = self.rng.gen();
            if roll >= self.preset.emphasis_probability {
                trace!(time = trigger.time, kind = ?trigger.kind, "trigger fired without gesture");
                continue;
            }

            let Some(kind) = trigger.kind.candidates().choose(&mut self.rng).copied() else {
                continue;
            };
            let intensity = match trigger.kind {
                TriggerKind::Exclaim => self.preset.exclamation_intensity,
                _ => 1.0,
            };
            debug!(time = trigger.time, trigger = ?trigger.kind, gesture = kind.name(), "trigger fired");
            self.request(kind, intensity, now);
            spawned += 1;
        }
        spawned
    }

    // ── Requests ───────────────────────────────────────────

    /// Queue or start a gesture according to priority.
    pub fn request(&mut self, kind: GestureKind, intensity: f32, now: f64) -> RequestOutcome {
        let request = GestureRequest {
            kind,
            intensity: intensity.clamp(0.0, 1.0),
        };

        let Some(active) = self.active else {
            self.activate(request, now);
            return RequestOutcome::Activated;
        };

        if gesture_definition(active.kind).yields_to(gesture_definition(kind)) {
            debug!(
                gesture = kind.name(),
                replaced = active.kind.name(),
                discarded_progress = self.progress,
                "gesture preempted"
            );
            self.activate(request, now);
            return RequestOutcome::Preempted {
                replaced: active.kind,
            };
        }

        self.queue.push_back(request);
        let position = self.queue.len() - 1;
        trace!(gesture = kind.name(), position, "gesture queued");
        RequestOutcome::Queued { position }
    }

    /// Request by catalog name. Unknown names are ignored.
    pub fn request_by_name(&mut self, name: &str, intensity: f32, now: f64) -> Option<RequestOutcome> {
        match GestureKind::from_name(name) {
            Some(kind) => Some(self.request(kind, intensity, now)),
            None => {
                debug!(name, "ignoring unknown gesture");
                None
            }
        }
    }

    /// Queue a random idle twitch, at most once per
    /// `1 / twitch_frequency` seconds. Returns whether a twitch was requested.
    pub fn try_twitch(&mut self, now: f64) -> bool {
        if let Some(last) = self.last_twitch_at {
            if now - last < self.preset.twitch_interval_secs() {
                return false;
            }
        }
        let Some(kind) = GestureKind::TWITCHES.choose(&mut self.rng).copied() else {
            return false;
        };
        self.last_twitch_at = Some(now);
        self.request(kind, self.preset.twitch_intensity, now);
        true
    }

    fn activate(&mut self, request: GestureRequest, now: f64) {
        let def = gesture_definition(request.kind);
        self.active = Some(ActiveGesture {
            kind: request.kind,
            duration_secs: def.duration_secs,
            intensity: request.intensity,
            started_at: now,
        });
        self.progress = 0.0;
        trace!(gesture = request.kind.name(), intensity = request.intensity, "gesture started");
    }

    // ── Time ───────────────────────────────────────────────

    /// Move the active gesture forward to wall time `now`. A finished gesture
    /// hands over to the head of the queue, which starts at `now`.
    pub fn advance(&mut self, now: f64) -> Option<&ActiveGesture> {
        if let Some(active) = self.active {
            let elapsed = (now - active.started_at).max(0.0) as f32;
            self.progress = (elapsed / active.duration_secs).min(1.0);

            if self.progress >= 1.0 {
                trace!(gesture = active.kind.name(), "gesture finished");
                self.active = None;
                self.progress = 0.0;
                if let Some(next) = self.queue.pop_front() {
                    self.activate(next, now);
                }
            }
        }
        self.active.as_ref()
    }

    /// Bone rotation deltas for the active gesture at its current progress.
    pub fn rotations(&self) -> BoneRotations {
        match &self.active {
            Some(active) => gesture_definition(active.kind).sample(self.progress, active.intensity),
            None => BoneRotations::new(),
        }
    }

    // ── Accessors ──────────────────────────────────────────

    pub fn state(&self) -> CoarseState {
        self.state
    }

    pub fn active(&self) -> Option<&ActiveGesture> {
        self.active.as_ref()
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn queue(&self) -> impl Iterator<Item = &GestureRequest> {
        self.queue.iter()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn preset(&self) -> &BehaviorPreset {
        &self.preset
    }

    pub fn set_preset(&mut self, preset: BehaviorPreset) {
        self.preset = preset.sanitized();
    }

    /// Forget everything tied to the current utterance.
    pub fn reset(&mut self) {
        self.state = CoarseState::Idle;
        self.active = None;
        self.progress = 0.0;
        self.queue.clear();
        self.fired_triggers.clear();
        self.last_twitch_at = None;
    }
}
