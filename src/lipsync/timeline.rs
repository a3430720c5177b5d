//! Timeline builder — turns per-character alignment into mouth events.
//!
//! The output is contiguous from 0 to the final character's end time,
//! non-overlapping and ordered by start time. Untimed characters are
//! dropped silently, leaving more silence in their place.

use serde::Serialize;
use tracing::debug;

use super::alignment::{Alignment, TimedChar};
use super::viseme::Viseme;

/// Same-viseme events closer than this are merged into one.
pub const MERGE_EPSILON: f32 = 0.05;
/// Gaps wider than this get an explicit silence event.
pub const GAP_FILL_THRESHOLD: f32 = 0.01;

/// A single mouth shape held over `[start, end)` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MouthEvent {
    pub viseme: Viseme,
    pub start: f32,
    pub end: f32,
}

impl MouthEvent {
    pub fn new(viseme: Viseme, start: f32, end: f32) -> Self {
        Self { viseme, start, end }
    }

    fn silence(start: f32, end: f32) -> Self {
        Self::new(Viseme::Sil, start, end)
    }

    pub fn duration(&self) -> f32 {
        self.end - self.start
    }

    pub fn contains(&self, t: f32) -> bool {
        self.start <= t && t < self.end
    }
}

/// Immutable event sequence for one utterance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Timeline {
    events: Vec<MouthEvent>,
}

impl Timeline {
    /// Build the event sequence for an utterance.
    ///
    /// An empty result means there is no usable timing and the caller should
    /// drive the mouth from amplitude instead.
    pub fn build(alignment: &Alignment) -> Self {
        let spans = map_spans(alignment);
        let merged = merge_same_visemes(spans);
        let events = fill_gaps(merged);
        debug!(
            characters = alignment.len(),
            events = events.len(),
            duration = events.last().map(|e| e.end).unwrap_or(0.0),
            "built mouth timeline"
        );
        Self { events }
    }

    pub fn events(&self) -> &[MouthEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// End of the last event, or 0 for an empty timeline.
    pub fn duration(&self) -> f32 {
        self.events.last().map(|e| e.end).unwrap_or(0.0)
    }
}

/// Step 1–2: one event per character or digraph, clipped so nothing overlaps.
fn map_spans(alignment: &Alignment) -> Vec<MouthEvent> {
    let mut spans: Vec<MouthEvent> = Vec::with_capacity(alignment.len());
    let mut i = 0;
    while i < alignment.len() {
        let Some(current) = alignment.timed(i) else {
            i += 1;
            continue;
        };

        let digraph = alignment.timed(i + 1).and_then(|next| {
            Viseme::from_digraph(current.ch, next.ch).map(|v| (v, next))
        });

        match digraph {
            Some((viseme, next)) => {
                push_clipped(&mut spans, viseme, current.start, next.end.max(current.end));
                i += 2;
            }
            None => {
                let TimedChar { ch, start, end } = current;
                push_clipped(&mut spans, Viseme::from_char(ch), start, end);
                i += 1;
            }
        }
    }
    spans
}

fn push_clipped(spans: &mut Vec<MouthEvent>, viseme: Viseme, start: f32, end: f32) {
    let start = match spans.last() {
        Some(prev) => start.max(prev.end),
        None => start,
    };
    if start < end {
        spans.push(MouthEvent::new(viseme, start, end));
    }
}

/// Step 3: extend the earlier event over a short same-viseme gap.
fn merge_same_visemes(spans: Vec<MouthEvent>) -> Vec<MouthEvent> {
    let mut merged: Vec<MouthEvent> = Vec::with_capacity(spans.len());
    for event in spans {
        if let Some(last) = merged.last_mut() {
            if last.viseme == event.viseme && event.start - last.end < MERGE_EPSILON {
                last.end = event.end;
                continue;
            }
        }
        merged.push(event);
    }
    merged
}

/// Steps 4–5: leading silence, explicit silence for gaps, tiny gaps closed.
fn fill_gaps(merged: Vec<MouthEvent>) -> Vec<MouthEvent> {
    let mut out: Vec<MouthEvent> = Vec::with_capacity(merged.len() * 2);

    for mut event in merged {
        let mut fill = None;

        match out.last_mut() {
            None if event.start > 0.0 => {
                if event.viseme == Viseme::Sil {
                    event.start = 0.0;
                } else {
                    fill = Some(MouthEvent::silence(0.0, event.start));
                }
            }
            None => {}
            Some(prev) => {
                let gap = event.start - prev.end;
                if gap > GAP_FILL_THRESHOLD {
                    if prev.viseme == Viseme::Sil {
                        prev.end = event.start;
                    } else if event.viseme == Viseme::Sil {
                        event.start = prev.end;
                    } else {
                        fill = Some(MouthEvent::silence(prev.end, event.start));
                    }
                } else if gap > 0.0 {
                    prev.end = event.start;
                }

                // Two silences meeting after gap handling collapse into one.
                if fill.is_none() && prev.viseme == Viseme::Sil && event.viseme == Viseme::Sil {
                    prev.end = event.end;
                    continue;
                }
            }
        }

        if let Some(silence) = fill {
            out.push(silence);
        }
        out.push(event);
    }
    out
}
