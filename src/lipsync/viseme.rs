//! Viseme table — phonetic mouth-shape categories and their jaw values.
//!
//! A viseme is the visual mouth shape shared by a group of phonemes that
//! look alike when spoken. The tables here are static and may be shared by
//! any number of avatars.

use serde::{Deserialize, Serialize};

/// Largest jaw rotation in the table; openness is jaw relative to this.
pub const MAX_JAW_ROTATION: f32 = 0.35;

/// Oculus-style viseme set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Viseme {
    /// Silence, mouth at rest.
    #[default]
    #[serde(rename = "sil")]
    Sil,
    /// /p/, /b/, /m/ — lips pressed together.
    PP,
    /// /f/, /v/ — teeth on lip.
    FF,
    /// /θ/, /ð/ — tongue between teeth.
    TH,
    /// /t/, /d/, /l/ — tongue at roof.
    DD,
    /// /k/, /g/ — back of tongue raised.
    #[serde(rename = "kk")]
    KK,
    /// /tʃ/, /dʒ/, /ʃ/ — rounded, tongue curved.
    CH,
    /// /s/, /z/ — teeth together.
    SS,
    /// /n/, /ŋ/
    #[serde(rename = "nn")]
    NN,
    /// /r/
    RR,
    /// /a/ — wide open.
    #[serde(rename = "aa")]
    AA,
    /// /e/
    E,
    /// /i/
    I,
    /// /o/
    O,
    /// /u/
    U,
}

impl Viseme {
    pub const ALL: [Viseme; 15] = [
        Viseme::Sil,
        Viseme::PP,
        Viseme::FF,
        Viseme::TH,
        Viseme::DD,
        Viseme::KK,
        Viseme::CH,
        Viseme::SS,
        Viseme::NN,
        Viseme::RR,
        Viseme::AA,
        Viseme::E,
        Viseme::I,
        Viseme::O,
        Viseme::U,
    ];

    /// Static jaw rotation for this mouth shape.
    pub fn jaw_rotation(self) -> f32 {
        match self {
            Viseme::Sil => 0.0,
            Viseme::PP => 0.0,
            Viseme::FF => 0.05,
            Viseme::TH => 0.08,
            Viseme::DD => 0.1,
            Viseme::KK => 0.12,
            Viseme::CH => 0.1,
            Viseme::SS => 0.06,
            Viseme::NN => 0.08,
            Viseme::RR => 0.12,
            Viseme::AA => MAX_JAW_ROTATION,
            Viseme::E => 0.22,
            Viseme::I => 0.15,
            Viseme::O => 0.28,
            Viseme::U => 0.14,
        }
    }

    /// Canonical tag as used by rendering layers ("sil", "aa", "kk", …).
    pub fn tag(self) -> &'static str {
        match self {
            Viseme::Sil => "sil",
            Viseme::PP => "PP",
            Viseme::FF => "FF",
            Viseme::TH => "TH",
            Viseme::DD => "DD",
            Viseme::KK => "kk",
            Viseme::CH => "CH",
            Viseme::SS => "SS",
            Viseme::NN => "nn",
            Viseme::RR => "RR",
            Viseme::AA => "aa",
            Viseme::E => "E",
            Viseme::I => "I",
            Viseme::O => "O",
            Viseme::U => "U",
        }
    }

    /// Parse a tag; anything unrecognised is silence.
    pub fn from_tag(tag: &str) -> Viseme {
        Viseme::ALL
            .iter()
            .copied()
            .find(|v| v.tag().eq_ignore_ascii_case(tag))
            .unwrap_or(Viseme::Sil)
    }

    /// Map a single character to its viseme. Unknown characters are silence.
    pub fn from_char(c: char) -> Viseme {
        match c.to_ascii_lowercase() {
            'a' => Viseme::AA,
            'e' => Viseme::E,
            'i' | 'y' => Viseme::I,
            'o' => Viseme::O,
            'u' | 'w' => Viseme::U,
            'b' | 'm' | 'p' => Viseme::PP,
            'f' | 'v' => Viseme::FF,
            'd' | 't' | 'l' => Viseme::DD,
            'c' | 'g' | 'k' | 'q' | 'x' => Viseme::KK,
            'j' => Viseme::CH,
            's' | 'z' => Viseme::SS,
            'n' => Viseme::NN,
            'r' => Viseme::RR,
            // 'h' and punctuation/whitespace read as a closed mouth
            _ => Viseme::Sil,
        }
    }

    /// Two-character lookahead table. Checked before the single-character map.
    pub fn from_digraph(first: char, second: char) -> Option<Viseme> {
        let pair = [first.to_ascii_lowercase(), second.to_ascii_lowercase()];
        let viseme = match pair {
            ['t', 'h'] => Viseme::TH,
            ['s', 'h'] | ['c', 'h'] => Viseme::CH,
            ['p', 'h'] => Viseme::FF,
            ['n', 'g'] => Viseme::NN,
            ['c', 'k'] | ['q', 'u'] => Viseme::KK,
            ['w', 'h'] => Viseme::U,
            ['e', 'e'] | ['e', 'a'] => Viseme::I,
            ['o', 'o'] | ['o', 'u'] => Viseme::U,
            ['a', 'i'] | ['a', 'y'] => Viseme::E,
            ['o', 'a'] | ['o', 'w'] => Viseme::O,
            _ => return None,
        };
        Some(viseme)
    }
}

/// Coarse display bucket used in amplitude fallback mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouthShape {
    Closed,
    Small,
    Medium,
    Wide,
}

impl MouthShape {
    /// Bucket a 0–100 amplitude.
    pub fn from_amplitude(amplitude: f32) -> Self {
        match amplitude {
            a if a < 15.0 => MouthShape::Closed,
            a if a < 35.0 => MouthShape::Small,
            a if a < 60.0 => MouthShape::Medium,
            _ => MouthShape::Wide,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_characters_are_silence() {
        for c in ['!', ' ', '7', 'h', '字'] {
            assert_eq!(Viseme::from_char(c), Viseme::Sil, "char {:?}", c);
        }
    }

    #[test]
    fn vowels_map_to_vowel_shapes() {
        assert_eq!(Viseme::from_char('A'), Viseme::AA);
        assert_eq!(Viseme::from_char('i'), Viseme::I);
        assert_eq!(Viseme::from_char('o'), Viseme::O);
    }

    #[test]
    fn digraphs_take_precedence() {
        assert_eq!(Viseme::from_digraph('T', 'h'), Some(Viseme::TH));
        assert_eq!(Viseme::from_digraph('s', 'h'), Some(Viseme::CH));
        assert_eq!(Viseme::from_digraph('o', 'o'), Some(Viseme::U));
        assert_eq!(Viseme::from_digraph('h', 'i'), None);
    }

    #[test]
    fn tags_round_trip_and_unknown_is_silence() {
        for v in Viseme::ALL {
            assert_eq!(Viseme::from_tag(v.tag()), v);
        }
        assert_eq!(Viseme::from_tag("zz"), Viseme::Sil);
    }

    #[test]
    fn jaw_values_stay_within_max() {
        for v in Viseme::ALL {
            let jaw = v.jaw_rotation();
            assert!(
                (0.0..=MAX_JAW_ROTATION).contains(&jaw),
                "{:?} jaw out of range: {}",
                v,
                jaw
            );
        }
    }

    #[test]
    fn amplitude_buckets() {
        assert_eq!(MouthShape::from_amplitude(0.0), MouthShape::Closed);
        assert_eq!(MouthShape::from_amplitude(20.0), MouthShape::Small);
        assert_eq!(MouthShape::from_amplitude(50.0), MouthShape::Medium);
        assert_eq!(MouthShape::from_amplitude(60.0), MouthShape::Wide);
    }
}
