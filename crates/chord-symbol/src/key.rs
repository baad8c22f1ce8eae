//! Keys and modes: interval patterns, parent-key relationships, and
//! key-string parsing.

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::note::Note;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Major,
    Minor,
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
}

impl Mode {
    /// Parse mode from string (case-insensitive, allows abbreviations)
    pub fn parse(s: &str) -> Option<Mode> {
        match s.to_lowercase().as_str() {
            "maj" | "major" | "" => Some(Mode::Major),
            "min" | "minor" | "m" => Some(Mode::Minor),
            "ion" | "ionian" => Some(Mode::Ionian),
            "dor" | "dorian" => Some(Mode::Dorian),
            "phr" | "phrygian" => Some(Mode::Phrygian),
            "lyd" | "lydian" => Some(Mode::Lydian),
            "mix" | "mixolydian" => Some(Mode::Mixolydian),
            "aeo" | "aeolian" => Some(Mode::Aeolian),
            "loc" | "locrian" => Some(Mode::Locrian),
            _ => None,
        }
    }

    /// Scale pattern as semitone offsets from the local tonic.
    pub fn intervals(self) -> [u8; 7] {
        match self {
            Mode::Major | Mode::Ionian => [0, 2, 4, 5, 7, 9, 11],
            Mode::Dorian => [0, 2, 3, 5, 7, 9, 10],
            Mode::Phrygian => [0, 1, 3, 5, 7, 8, 10],
            Mode::Lydian => [0, 2, 4, 6, 7, 9, 11],
            Mode::Mixolydian => [0, 2, 4, 5, 7, 9, 10],
            Mode::Minor | Mode::Aeolian => [0, 2, 3, 5, 7, 8, 10],
            Mode::Locrian => [0, 1, 3, 5, 6, 8, 10],
        }
    }

    /// Semitone offset of this mode's tonic above its parent major tonic.
    pub fn degree_in_parent(self) -> u8 {
        match self {
            Mode::Major | Mode::Ionian => 0,
            Mode::Dorian => 2,
            Mode::Phrygian => 4,
            Mode::Lydian => 5,
            Mode::Mixolydian => 7,
            Mode::Minor | Mode::Aeolian => 9,
            Mode::Locrian => 11,
        }
    }

    /// Church mode whose tonic sits `semitones` above the parent major tonic.
    pub fn from_degree(semitones: u8) -> Option<Mode> {
        match semitones % 12 {
            0 => Some(Mode::Ionian),
            2 => Some(Mode::Dorian),
            4 => Some(Mode::Phrygian),
            5 => Some(Mode::Lydian),
            7 => Some(Mode::Mixolydian),
            9 => Some(Mode::Aeolian),
            11 => Some(Mode::Locrian),
            _ => None,
        }
    }

    /// The scale degrees whose alteration relative to major distinguishes
    /// this mode.
    pub fn characteristic_degrees(self) -> &'static [&'static str] {
        match self {
            Mode::Major | Mode::Ionian => &[],
            Mode::Dorian => &["6"],
            Mode::Phrygian => &["b2"],
            Mode::Lydian => &["#4"],
            Mode::Mixolydian => &["b7"],
            Mode::Minor | Mode::Aeolian => &["b6"],
            Mode::Locrian => &["b2", "b5"],
        }
    }

    pub fn is_minor_flavored(self) -> bool {
        matches!(
            self,
            Mode::Minor | Mode::Dorian | Mode::Phrygian | Mode::Aeolian | Mode::Locrian
        )
    }

    pub fn is_church_mode(self) -> bool {
        !matches!(self, Mode::Major | Mode::Minor)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
            Mode::Ionian => "Ionian",
            Mode::Dorian => "Dorian",
            Mode::Phrygian => "Phrygian",
            Mode::Lydian => "Lydian",
            Mode::Mixolydian => "Mixolydian",
            Mode::Aeolian => "Aeolian",
            Mode::Locrian => "Locrian",
        };
        write!(f, "{}", s)
    }
}

/// A key: local tonic plus mode.
///
/// The key signature (note collection) and the local tonic are distinct
/// concepts: for modes, the underlying diatonic collection belongs to the
/// parent major key, recoverable via `parent_tonic_pitch_class`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    pub tonic: Note,
    pub mode: Mode,
}

impl Key {
    pub fn new(tonic: Note, mode: Mode) -> Self {
        Key { tonic, mode }
    }

    pub fn major(tonic: Note) -> Self {
        Key {
            tonic,
            mode: Mode::Major,
        }
    }

    pub fn minor(tonic: Note) -> Self {
        Key {
            tonic,
            mode: Mode::Minor,
        }
    }

    pub fn is_minor(&self) -> bool {
        self.mode == Mode::Minor
    }

    /// Tonic pitch class of the parent major collection.
    ///
    /// Uniquely determined by (mode, tonic): e.g. G Mixolydian -> C.
    pub fn parent_tonic_pitch_class(&self) -> u8 {
        (self.tonic.pitch_class() + 12 - self.mode.degree_in_parent()) % 12
    }

    /// The seven pitch classes of this key's scale.
    pub fn pitch_classes(&self) -> [u8; 7] {
        let tonic = self.tonic.pitch_class();
        let mut out = [0u8; 7];
        for (i, iv) in self.mode.intervals().iter().enumerate() {
            out[i] = (tonic + iv) % 12;
        }
        out
    }

    pub fn contains(&self, pc: u8) -> bool {
        self.pitch_classes().contains(&(pc % 12))
    }

    /// Parse key strings like "C major", "A minor", "Am", "F#m", "D dorian".
    pub fn parse(input: &str) -> Result<Key, ParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ParseError::InvalidKey(input.to_string()));
        }

        if let Some((root_str, mode_str)) = trimmed.split_once(char::is_whitespace) {
            let tonic = Note::parse(root_str)
                .map_err(|_| ParseError::InvalidKey(input.to_string()))?;
            let mode = Mode::parse(mode_str.trim())
                .ok_or_else(|| ParseError::InvalidKey(input.to_string()))?;
            return Ok(Key { tonic, mode });
        }

        // Compact form: "Am", "F#m", "Bb"
        let normalized = trimmed.replace('♯', "#").replace('♭', "b");
        if !normalized.as_bytes().first().is_some_and(u8::is_ascii_uppercase) {
            return Err(ParseError::InvalidKey(input.to_string()));
        }
        let root_len = if matches!(normalized.as_bytes().get(1), Some(b'#') | Some(b'b')) {
            2
        } else {
            1
        };
        let (root_str, rest) = normalized.split_at(root_len);

        let tonic =
            Note::parse(root_str).map_err(|_| ParseError::InvalidKey(input.to_string()))?;
        let mode = match rest {
            "" => Mode::Major,
            "m" => Mode::Minor,
            other => {
                Mode::parse(other).ok_or_else(|| ParseError::InvalidKey(input.to_string()))?
            }
        };
        Ok(Key { tonic, mode })
    }

    /// Canonical display with a flat-preferred tonic spelling.
    pub fn normalized(&self) -> Key {
        Key {
            tonic: Note::from_pitch_class(self.tonic.pitch_class()),
            mode: self.mode,
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.tonic, self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{Accidental, NoteName};

    #[test]
    fn parse_simple_keys() {
        let k = Key::parse("C major").unwrap();
        assert_eq!(k.tonic.pitch_class(), 0);
        assert_eq!(k.mode, Mode::Major);

        let k = Key::parse("A minor").unwrap();
        assert_eq!(k.tonic.pitch_class(), 9);
        assert!(k.is_minor());
    }

    #[test]
    fn parse_compact_keys() {
        assert_eq!(Key::parse("Am").unwrap().mode, Mode::Minor);
        assert_eq!(Key::parse("Bb").unwrap().tonic.pitch_class(), 10);
        let fsm = Key::parse("F#m").unwrap();
        assert_eq!(fsm.tonic.pitch_class(), 6);
        assert_eq!(fsm.mode, Mode::Minor);
    }

    #[test]
    fn parse_modal_keys() {
        let k = Key::parse("D dorian").unwrap();
        assert_eq!(k.mode, Mode::Dorian);
        assert_eq!(k.parent_tonic_pitch_class(), 0);

        let k = Key::parse("E mix").unwrap();
        assert_eq!(k.mode, Mode::Mixolydian);
        assert_eq!(k.parent_tonic_pitch_class(), 9);
    }

    #[test]
    fn parse_rejects_nonsense() {
        assert!(Key::parse("").is_err());
        assert!(Key::parse("X major").is_err());
        assert!(Key::parse("C nonsense").is_err());
    }

    #[test]
    fn parent_of_g_mixolydian_is_c() {
        let k = Key::new(Note::natural(NoteName::G), Mode::Mixolydian);
        assert_eq!(k.parent_tonic_pitch_class(), 0);
    }

    #[test]
    fn minor_shares_relative_major_collection() {
        let am = Key::minor(Note::natural(NoteName::A));
        let c = Key::major(Note::natural(NoteName::C));
        let mut am_set = am.pitch_classes();
        let mut c_set = c.pitch_classes();
        am_set.sort_unstable();
        c_set.sort_unstable();
        assert_eq!(am_set, c_set);
    }

    #[test]
    fn mode_scale_patterns() {
        let gmix = Key::new(Note::natural(NoteName::G), Mode::Mixolydian);
        // G A B C D E F
        assert_eq!(gmix.pitch_classes(), [7, 9, 11, 0, 2, 4, 5]);
        assert!(gmix.contains(5));
        assert!(!gmix.contains(6));
    }

    #[test]
    fn characteristic_degrees_per_mode() {
        assert_eq!(Mode::Mixolydian.characteristic_degrees(), &["b7"]);
        assert_eq!(Mode::Locrian.characteristic_degrees(), &["b2", "b5"]);
        assert!(Mode::Major.characteristic_degrees().is_empty());
    }

    #[test]
    fn flat_key_normalization() {
        let cs = Key::major(Note::new(NoteName::C, Some(Accidental::Sharp)));
        assert_eq!(cs.normalized().to_string(), "Db major");
    }
}
