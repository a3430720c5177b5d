//! Avatar engine — one avatar's lip-sync, gestures and idle motion, advanced
//! once per rendering tick.
//!
//! The engine owns every piece of per-utterance state so several avatars can
//! run side by side; the viseme table and gesture catalog are shared
//! read-only.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use crate::config::MotionConfig;
use crate::gesture::{
    extract_triggers, BehaviorPreset, BoneRotations, CoarseState, GestureKind, GestureStateMachine,
    RequestOutcome, TriggerEvent,
};
use crate::lipsync::{Alignment, AmplitudeSmoother, PlaybackSample, PlaybackSampler, Timeline};
use crate::motion::{IdleMotion, IdlePose};

/// Per-tick inputs from the audio and playback collaborators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInput {
    /// Seconds since utterance start.
    pub playback_time: f32,
    /// Raw 0–100 loudness.
    pub amplitude: f32,
    pub is_playing: bool,
    /// Monotonic wall-clock seconds.
    pub now: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LipSyncMode {
    /// Driven by character alignment.
    Precise,
    /// Driven by loudness alone.
    #[default]
    Amplitude,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GestureFrame {
    pub kind: GestureKind,
    pub progress: f32,
    pub intensity: f32,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvatarFrame {
    pub mode: LipSyncMode,
    pub mouth: PlaybackSample,
    pub state: CoarseState,
    /// Smoothed amplitude the state decision was based on.
    pub amplitude: f32,
    pub gesture: Option<GestureFrame>,
    pub rotations: BoneRotations,
    pub idle: IdlePose,
}

pub struct AvatarEngine<R = StdRng> {
    timeline: Option<Timeline>,
    triggers: Vec<TriggerEvent>,
    sampler: PlaybackSampler,
    smoother: AmplitudeSmoother,
    gestures: GestureStateMachine<R>,
    idle: IdleMotion,
    mode: LipSyncMode,
}

impl AvatarEngine<StdRng> {
    pub fn new(config: MotionConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic engine for replays and tests.
    pub fn seeded(config: MotionConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> AvatarEngine<R> {
    pub fn with_rng(config: MotionConfig, rng: R) -> Self {
        Self {
            timeline: None,
            triggers: Vec::new(),
            sampler: PlaybackSampler::new(),
            smoother: AmplitudeSmoother::new(config.amplitude_smoothing),
            gestures: GestureStateMachine::with_rng(config.preset, rng),
            idle: IdleMotion::new(config.idle),
            mode: LipSyncMode::Amplitude,
        }
    }

    /// Prepare for a new utterance. Without usable alignment the engine runs
    /// in amplitude mode.
    pub fn start_utterance(&mut self, alignment: Option<&Alignment>) {
        self.stop();

        let Some(alignment) = alignment else {
            debug!("utterance without alignment, using amplitude lip-sync");
            return;
        };

        let timeline = Timeline::build(alignment);
        self.triggers = extract_triggers(alignment);
        if timeline.is_empty() {
            debug!("alignment had no usable timing, using amplitude lip-sync");
        } else {
            debug!(
                events = timeline.len(),
                triggers = self.triggers.len(),
                "utterance started with precise lip-sync"
            );
            self.timeline = Some(timeline);
        }
    }

    /// Drop all per-utterance state so the next start behaves like a fresh
    /// engine. The random source is not per-utterance and keeps its stream,
    /// so gesture picks after a restart may differ from a fresh engine's.
    pub fn stop(&mut self) {
        self.timeline = None;
        self.triggers.clear();
        self.sampler.reset();
        self.smoother.reset();
        self.gestures.reset();
        self.mode = LipSyncMode::Amplitude;
    }

    /// Advance one rendering tick.
    pub fn tick(&mut self, input: TickInput) -> AvatarFrame {
        let amplitude = self.smoother.push(input.amplitude);
        let state = self.gestures.update_state(input.is_playing, amplitude);

        let (mode, mouth) = match &self.timeline {
            Some(timeline) => {
                if input.is_playing {
                    self.gestures
                        .process_triggers(&self.triggers, input.playback_time, input.now);
                }
                (
                    LipSyncMode::Precise,
                    self.sampler.sample(timeline, input.playback_time),
                )
            }
            None => (LipSyncMode::Amplitude, self.sampler.sample_amplitude(amplitude)),
        };
        if mode != self.mode {
            debug!(from = ?self.mode, to = ?mode, "lip-sync mode changed");
            self.mode = mode;
        }

        self.gestures.advance(input.now);
        let idle_config = self.idle.config();
        if state == CoarseState::Idle && idle_config.enabled && idle_config.auto_twitch {
            self.gestures.try_twitch(input.now);
        }

        let gesture = self.gestures.active().map(|active| GestureFrame {
            kind: active.kind,
            progress: self.gestures.progress(),
            intensity: active.intensity,
        });

        AvatarFrame {
            mode,
            mouth,
            state,
            amplitude,
            gesture,
            rotations: self.gestures.rotations(),
            idle: self.idle.sample(input.now, state),
        }
    }

    pub fn request_gesture(&mut self, kind: GestureKind, intensity: f32, now: f64) -> RequestOutcome {
        self.gestures.request(kind, intensity, now)
    }

    /// Unknown names are ignored.
    pub fn request_gesture_by_name(
        &mut self,
        name: &str,
        intensity: f32,
        now: f64,
    ) -> Option<RequestOutcome> {
        self.gestures.request_by_name(name, intensity, now)
    }

    pub fn try_twitch(&mut self, now: f64) -> bool {
        self.gestures.try_twitch(now)
    }

    pub fn set_preset(&mut self, preset: BehaviorPreset) {
        self.gestures.set_preset(preset);
    }

    pub fn timeline(&self) -> Option<&Timeline> {
        self.timeline.as_ref()
    }

    pub fn triggers(&self) -> &[TriggerEvent] {
        &self.triggers
    }

    pub fn gestures(&self) -> &GestureStateMachine<R> {
        &self.gestures
    }

    pub fn mode(&self) -> LipSyncMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::TriggerKind;
    use crate::lipsync::{MouthShape, Viseme};
    use crate::motion::IdleConfig;

    fn quiet_config() -> MotionConfig {
        MotionConfig {
            preset: BehaviorPreset {
                emphasis_probability: 1.0,
                ..BehaviorPreset::balanced()
            },
            amplitude_smoothing: 0.0,
            idle: IdleConfig {
                auto_twitch: false,
                ..IdleConfig::default()
            },
        }
    }

    fn hi() -> Alignment {
        Alignment::from_text("hi!", vec![0.0, 0.2, 0.4], vec![0.2, 0.4, 0.5])
    }

    fn playing(playback_time: f32, amplitude: f32, now: f64) -> TickInput {
        TickInput {
            playback_time,
            amplitude,
            is_playing: true,
            now,
        }
    }

    #[test]
    fn precise_mode_samples_alignment() {
        let mut engine = AvatarEngine::seeded(quiet_config(), 1);
        engine.start_utterance(Some(&hi()));
        let frame = engine.tick(playing(0.3, 30.0, 0.0));
        assert_eq!(frame.mode, LipSyncMode::Precise);
        assert_eq!(frame.mouth.viseme, Viseme::I);
        assert!((frame.mouth.progress - 0.5).abs() < 1e-4);
        assert_eq!(frame.state, CoarseState::Speaking);
    }

    #[test]
    fn missing_alignment_falls_back_to_amplitude() {
        let mut engine = AvatarEngine::seeded(quiet_config(), 1);
        engine.start_utterance(None);
        let frame = engine.tick(playing(0.3, 50.0, 0.0));
        assert_eq!(frame.mode, LipSyncMode::Amplitude);
        assert_eq!(frame.mouth.viseme, Viseme::O);
        assert_eq!(frame.mouth.mouth_shape, Some(MouthShape::Medium));
    }

    #[test]
    fn untimed_alignment_falls_back_to_amplitude() {
        let mut engine = AvatarEngine::seeded(quiet_config(), 1);
        engine.start_utterance(Some(&Alignment::from_text("abc", vec![], vec![])));
        assert!(engine.timeline().is_none());
        assert_eq!(engine.tick(playing(0.1, 10.0, 0.0)).mode, LipSyncMode::Amplitude);
    }

    #[test]
    fn loud_playback_is_agitated() {
        let mut engine = AvatarEngine::seeded(quiet_config(), 1);
        engine.start_utterance(None);
        assert_eq!(engine.tick(playing(0.0, 90.0, 0.0)).state, CoarseState::Agitated);
    }

    #[test]
    fn exclamation_spawns_gesture_during_playback() {
        let mut engine = AvatarEngine::seeded(quiet_config(), 3);
        engine.start_utterance(Some(&hi()));
        assert_eq!(engine.triggers().len(), 1);
        engine.tick(playing(0.2, 30.0, 10.0));
        let frame = engine.tick(playing(0.4, 30.0, 10.2));
        let gesture = frame.gesture.expect("exclamation should spawn a gesture");
        assert_eq!(gesture.progress, 0.0);
        assert!(!frame.rotations.is_empty() || gesture.kind == GestureKind::LeanForward);
    }

    #[test]
    fn stop_then_restart_matches_fresh_engine() {
        let mut config = quiet_config();
        config.preset.emphasis_probability = 0.0;
        let mut fresh = AvatarEngine::seeded(config.clone(), 9);
        let mut used = AvatarEngine::seeded(config, 9);

        used.start_utterance(Some(&hi()));
        for i in 0..40 {
            let t = i as f32 / 60.0;
            used.tick(playing(t, 70.0, i as f64 / 60.0));
        }
        used.stop();

        used.start_utterance(Some(&hi()));
        fresh.start_utterance(Some(&hi()));
        // first tick lands inside the "!" trigger window
        let input = playing(0.4, 40.0, 100.0);
        assert_eq!(used.tick(input), fresh.tick(input));
        assert!(used.gestures().active().is_none());
    }

    #[test]
    fn restart_refires_triggers_consumed_before_stop() {
        let mut engine = AvatarEngine::seeded(quiet_config(), 9);
        engine.start_utterance(Some(&hi()));
        assert!(engine.tick(playing(0.4, 30.0, 0.0)).gesture.is_some());
        engine.stop();

        engine.start_utterance(Some(&hi()));
        let frame = engine.tick(playing(0.4, 30.0, 50.0));
        let gesture = frame.gesture.expect("trigger should fire again after restart");
        assert!(TriggerKind::Exclaim.candidates().contains(&gesture.kind));
    }

    #[test]
    fn non_finite_playback_time_keeps_ticking() {
        let mut engine = AvatarEngine::seeded(quiet_config(), 1);
        engine.start_utterance(Some(&hi()));
        for playback_time in [f32::NAN, f32::NEG_INFINITY, f32::INFINITY] {
            let frame = engine.tick(playing(playback_time, 30.0, 0.0));
            assert_eq!(frame.mode, LipSyncMode::Precise);
            assert_eq!(frame.mouth.viseme, Viseme::Sil, "t = {}", playback_time);
            assert!(frame.mouth.jaw_rotation.is_finite());
        }
        let frame = engine.tick(playing(0.3, 30.0, 0.1));
        assert_eq!(frame.mouth.viseme, Viseme::I);
    }

    #[test]
    fn stop_clears_gestures_and_timeline() {
        let mut engine = AvatarEngine::seeded(quiet_config(), 1);
        engine.start_utterance(Some(&hi()));
        engine.request_gesture(GestureKind::Shrug, 1.0, 0.0);
        engine.stop();
        assert!(engine.timeline().is_none());
        assert!(engine.gestures().active().is_none());
        assert_eq!(engine.mode(), LipSyncMode::Amplitude);
    }

    #[test]
    fn idle_avatar_twitches_when_enabled() {
        let mut config = quiet_config();
        config.idle.auto_twitch = true;
        let mut engine = AvatarEngine::seeded(config, 1);
        let frame = engine.tick(TickInput {
            playback_time: 0.0,
            amplitude: 0.0,
            is_playing: false,
            now: 0.0,
        });
        let gesture = frame.gesture.expect("first idle tick should twitch");
        assert!(GestureKind::TWITCHES.contains(&gesture.kind));
    }

    #[test]
    fn frame_serializes_for_renderer() {
        let mut engine = AvatarEngine::seeded(quiet_config(), 1);
        engine.start_utterance(Some(&hi()));
        engine.request_gesture(GestureKind::HeadNod, 1.0, 0.0);
        let frame = engine.tick(playing(0.3, 30.0, 0.2));
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["mode"], "precise");
        assert_eq!(json["mouth"]["viseme"], "I");
        assert_eq!(json["state"], "speaking");
        assert_eq!(json["gesture"]["kind"], "headNod");
        assert!(json["rotations"]["head"]["x"].is_number());
    }
}
