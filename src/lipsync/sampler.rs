//! Playback sampler — mouth state at an arbitrary playback time.
//!
//! Two modes share one output type:
//! - precise: a [`Timeline`] is available, the current event is found by
//!   binary search and the jaw anticipates the next shape near the end of
//!   each event;
//! - amplitude fallback: no timing data, the mouth follows a 0–100 loudness
//!   value bucketed into visemes.

use serde::Serialize;

use super::timeline::{MouthEvent, Timeline};
use super::viseme::{MouthShape, Viseme, MAX_JAW_ROTATION};

/// Fraction of an event during which the shape is held before blending.
pub const BLEND_START: f32 = 0.7;
/// Weight of the previous frame's jaw in the per-frame smoothing.
pub const JAW_SMOOTHING: f32 = 0.3;
/// Amplitude that maps to a fully open mouth in fallback mode.
pub const AMPLITUDE_FULL_OPEN: f32 = 80.0;

/// Raw position within the event sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimelineSample {
    pub viseme: Viseme,
    pub progress: f32,
    pub next: Option<Viseme>,
}

impl TimelineSample {
    fn silent(next: Option<Viseme>) -> Self {
        Self {
            viseme: Viseme::Sil,
            progress: 1.0,
            next,
        }
    }
}

/// Mouth state handed to the renderer each frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaybackSample {
    pub viseme: Viseme,
    pub progress: f32,
    pub next_viseme: Option<Viseme>,
    pub jaw_rotation: f32,
    pub mouth_openness: f32,
    /// Display bucket, only set in amplitude fallback mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mouth_shape: Option<MouthShape>,
}

impl Default for PlaybackSample {
    fn default() -> Self {
        Self {
            viseme: Viseme::Sil,
            progress: 1.0,
            next_viseme: None,
            jaw_rotation: 0.0,
            mouth_openness: 0.0,
            mouth_shape: None,
        }
    }
}

/// Locate the event active at `t`. A non-finite `t` samples as silence.
pub fn sample_timeline(events: &[MouthEvent], t: f32) -> TimelineSample {
    let (Some(first), Some(last)) = (events.first(), events.last()) else {
        return TimelineSample::silent(None);
    };
    if !t.is_finite() {
        return TimelineSample::silent(None);
    }
    if t >= last.end {
        return TimelineSample::silent(None);
    }
    if t < first.start {
        return TimelineSample::silent(Some(first.viseme));
    }

    // first.start <= t, so at least one event satisfies the predicate
    let index = events.partition_point(|e| e.start <= t) - 1;
    let event = &events[index];
    let next = events.get(index + 1).map(|e| e.viseme);

    if !event.contains(t) {
        return TimelineSample::silent(next);
    }

    let duration = event.duration();
    let progress = if duration > 0.0 {
        ((t - event.start) / duration).clamp(0.0, 1.0)
    } else {
        1.0
    };

    TimelineSample {
        viseme: event.viseme,
        progress,
        next,
    }
}

/// Jaw value for a sample: held for the first 70% of the event, then eased
/// toward the next shape.
pub fn interpolated_jaw(sample: &TimelineSample) -> f32 {
    let current = sample.viseme.jaw_rotation();
    match sample.next {
        Some(next) if sample.progress >= BLEND_START => {
            let local = ((sample.progress - BLEND_START) / (1.0 - BLEND_START)).clamp(0.0, 1.0);
            let eased = 1.0 - (1.0 - local) * (1.0 - local);
            current + (next.jaw_rotation() - current) * eased
        }
        _ => current,
    }
}

/// Map a 0–1 openness to the closest viseme.
pub fn viseme_for_openness(openness: f32) -> Viseme {
    match openness {
        o if o < 0.1 => Viseme::Sil,
        o if o < 0.2 => Viseme::SS,
        o if o < 0.35 => Viseme::I,
        o if o < 0.5 => Viseme::E,
        o if o < 0.7 => Viseme::O,
        _ => Viseme::AA,
    }
}

/// Amplitude fallback. No cross-viseme interpolation: the amplitude itself
/// already moves continuously.
pub fn sample_amplitude(amplitude: f32) -> PlaybackSample {
    let openness = (amplitude / AMPLITUDE_FULL_OPEN).clamp(0.0, 1.0);
    let viseme = viseme_for_openness(openness);
    PlaybackSample {
        viseme,
        progress: 1.0,
        next_viseme: None,
        jaw_rotation: viseme.jaw_rotation(),
        mouth_openness: openness,
        mouth_shape: Some(MouthShape::from_amplitude(amplitude)),
    }
}

/// Exponential smoother for raw 0–100 amplitude readings.
#[derive(Debug, Clone, Default)]
pub struct AmplitudeSmoother {
    factor: f32,
    value: Option<f32>,
}

impl AmplitudeSmoother {
    /// `factor` is the weight kept from the previous reading (0 disables).
    pub fn new(factor: f32) -> Self {
        Self {
            factor: factor.clamp(0.0, 0.99),
            value: None,
        }
    }

    pub fn push(&mut self, raw: f32) -> f32 {
        let raw = if raw.is_finite() {
            raw.clamp(0.0, 100.0)
        } else {
            0.0
        };
        let smoothed = match self.value {
            Some(prev) => prev * self.factor + raw * (1.0 - self.factor),
            None => raw,
        };
        self.value = Some(smoothed);
        smoothed
    }

    pub fn value(&self) -> f32 {
        self.value.unwrap_or(0.0)
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}

/// Per-avatar sampler carrying the frame-to-frame jaw smoothing.
#[derive(Debug, Clone, Default)]
pub struct PlaybackSampler {
    previous_jaw: f32,
}

impl PlaybackSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Precise mode sample at playback time `t`.
    pub fn sample(&mut self, timeline: &Timeline, t: f32) -> PlaybackSample {
        let raw = sample_timeline(timeline.events(), t);
        let target = interpolated_jaw(&raw);
        let jaw = self.previous_jaw * JAW_SMOOTHING + target * (1.0 - JAW_SMOOTHING);
        self.previous_jaw = jaw;

        PlaybackSample {
            viseme: raw.viseme,
            progress: raw.progress,
            next_viseme: raw.next,
            jaw_rotation: jaw,
            mouth_openness: (jaw / MAX_JAW_ROTATION).min(1.0),
            mouth_shape: None,
        }
    }

    /// Fallback mode sample from an already-smoothed amplitude.
    pub fn sample_amplitude(&mut self, amplitude: f32) -> PlaybackSample {
        let sample = sample_amplitude(amplitude);
        // Keep the accumulator in step so a switch to precise mode blends
        // from where the mouth actually is.
        self.previous_jaw = sample.jaw_rotation;
        sample
    }

    pub fn previous_jaw(&self) -> f32 {
        self.previous_jaw
    }

    pub fn reset(&mut self) {
        self.previous_jaw = 0.0;
    }
}
