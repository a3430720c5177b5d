//! Character-level alignment returned alongside synthesized speech.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::Result;

/// Per-character timing in seconds from utterance start.
///
/// The three arrays are parallel. They are allowed to disagree in length;
/// a character without a start or end time is treated as untimed and skipped
/// downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    pub characters: Vec<String>,
    #[serde(rename = "character_start_times_seconds", default)]
    pub start_times: Vec<f32>,
    #[serde(rename = "character_end_times_seconds", default)]
    pub end_times: Vec<f32>,
}

/// One timed character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedChar {
    pub ch: char,
    pub start: f32,
    pub end: f32,
}

impl Alignment {
    pub fn new(characters: Vec<String>, start_times: Vec<f32>, end_times: Vec<f32>) -> Self {
        Self {
            characters,
            start_times,
            end_times,
        }
    }

    /// Build from a plain string and parallel timings.
    pub fn from_text(text: &str, start_times: Vec<f32>, end_times: Vec<f32>) -> Self {
        Self::new(
            text.chars().map(|c| c.to_string()).collect(),
            start_times,
            end_times,
        )
    }

    /// Read an alignment JSON file as produced by the speech service.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let alignment: Self = serde_json::from_str(&content)?;
        debug!(path = %path.display(), characters = alignment.len(), "loaded alignment");
        Ok(alignment)
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// The character at `index` with its timing, or `None` when the timing is
    /// missing, non-finite, negative, or not strictly increasing.
    pub fn timed(&self, index: usize) -> Option<TimedChar> {
        let ch = self.characters.get(index)?.chars().next()?;
        let start = *self.start_times.get(index)?;
        let end = *self.end_times.get(index)?;
        if !start.is_finite() || !end.is_finite() || start < 0.0 || start >= end {
            return None;
        }
        Some(TimedChar { ch, start, end })
    }

    /// End time of the last validly timed character.
    pub fn total_duration(&self) -> f32 {
        (0..self.len())
            .filter_map(|i| self.timed(i))
            .map(|c| c.end)
            .fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MotionError;
    use tempfile::TempDir;

    #[test]
    fn loads_alignment_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("alignment.json");
        std::fs::write(
            &path,
            r#"{"characters": ["o", "k"],
                "character_start_times_seconds": [0.0, 0.1],
                "character_end_times_seconds": [0.1, 0.2]}"#,
        )
        .unwrap();
        let alignment = Alignment::load(&path).unwrap();
        assert_eq!(alignment.len(), 2);
        assert_eq!(alignment.total_duration(), 0.2);
    }

    #[test]
    fn load_surfaces_missing_and_malformed_files() {
        let tmp = TempDir::new().unwrap();
        let missing = Alignment::load(&tmp.path().join("absent.json"));
        assert!(matches!(missing, Err(MotionError::Io(_))));

        let path = tmp.path().join("broken.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(Alignment::load(&path), Err(MotionError::Json(_))));
    }

    #[test]
    fn deserializes_speech_collaborator_shape() {
        let json = r#"{
            "characters": ["h", "i"],
            "character_start_times_seconds": [0.0, 0.2],
            "character_end_times_seconds": [0.2, 0.4]
        }"#;
        let alignment: Alignment = serde_json::from_str(json).unwrap();
        assert_eq!(alignment.len(), 2);
        assert_eq!(
            alignment.timed(1),
            Some(TimedChar {
                ch: 'i',
                start: 0.2,
                end: 0.4
            })
        );
    }

    #[test]
    fn invalid_timings_are_untimed() {
        let alignment = Alignment::from_text("abcd", vec![0.0, 0.5, f32::NAN], vec![0.1, 0.5, 1.0, 2.0]);
        assert!(alignment.timed(0).is_some());
        assert!(alignment.timed(1).is_none(), "start == end is invalid");
        assert!(alignment.timed(2).is_none(), "NaN start is invalid");
        assert!(alignment.timed(3).is_none(), "missing start is invalid");
        assert_eq!(alignment.total_duration(), 0.1);
    }
}
