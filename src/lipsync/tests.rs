//! Property tests for timeline construction and sampling.
//!
//! Alignments are generated as a run of consecutive characters with random
//! durations and random pauses between them, the shape a speech synthesizer
//! actually returns.

use proptest::prelude::*;

use super::alignment::Alignment;
use super::sampler::sample_timeline;
use super::timeline::Timeline;
use super::viseme::Viseme;

const ALPHABET: &[char] = &[
    'a', 'b', 'c', 'd', 'e', 'h', 'i', 'm', 'n', 'o', 's', 't', 'u', 'w', ' ', '!', '?', ',',
];

fn arb_alignment() -> impl Strategy<Value = Alignment> {
    prop::collection::vec(
        (
            prop::sample::select(ALPHABET),
            10u32..300,
            0u32..120,
        ),
        1..40,
    )
    .prop_map(|chars| {
        let mut characters = Vec::with_capacity(chars.len());
        let mut starts = Vec::with_capacity(chars.len());
        let mut ends = Vec::with_capacity(chars.len());
        let mut cursor_ms = 0u32;
        for (ch, duration_ms, pause_ms) in chars {
            cursor_ms += pause_ms;
            characters.push(ch.to_string());
            starts.push(cursor_ms as f32 / 1000.0);
            cursor_ms += duration_ms;
            ends.push(cursor_ms as f32 / 1000.0);
        }
        Alignment::new(characters, starts, ends)
    })
}

proptest! {
    #[test]
    fn timeline_is_contiguous_and_ordered(alignment in arb_alignment()) {
        let timeline = Timeline::build(&alignment);
        let events = timeline.events();
        prop_assert!(!events.is_empty());
        prop_assert_eq!(events[0].start, 0.0);
        for pair in events.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start, "gap or overlap in {:?}", events);
        }
        for event in events {
            prop_assert!(event.end > event.start, "empty event {:?}", event);
        }
        prop_assert_eq!(timeline.duration(), alignment.total_duration());
    }

    #[test]
    fn timeline_is_at_most_twice_the_input(alignment in arb_alignment()) {
        let timeline = Timeline::build(&alignment);
        prop_assert!(timeline.len() <= 2 * alignment.len());
    }

    #[test]
    fn no_mergeable_neighbours_remain(alignment in arb_alignment()) {
        let timeline = Timeline::build(&alignment);
        for pair in timeline.events().windows(2) {
            prop_assert!(pair[0].viseme != pair[1].viseme || pair[0].viseme != Viseme::Sil,
                "adjacent silences {:?}", pair);
        }
    }

    #[test]
    fn sampling_inside_timeline_yields_valid_progress(
        alignment in arb_alignment(),
        fraction in 0.0f32..1.0,
    ) {
        let timeline = Timeline::build(&alignment);
        let t = timeline.duration() * fraction;
        prop_assume!(t < timeline.duration());
        let sample = sample_timeline(timeline.events(), t);
        prop_assert!((0.0..=1.0).contains(&sample.progress));
        let owner = timeline.events().iter().filter(|e| e.contains(t)).count();
        prop_assert_eq!(owner, 1);
    }

    #[test]
    fn sampling_past_the_end_is_silence(alignment in arb_alignment(), extra in 0.0f32..5.0) {
        let timeline = Timeline::build(&alignment);
        let sample = sample_timeline(timeline.events(), timeline.duration() + extra);
        prop_assert_eq!(sample.viseme, Viseme::Sil);
        prop_assert_eq!(sample.next, None);
    }
}
