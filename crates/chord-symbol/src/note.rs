//! Note names, accidentals, and pitch-class arithmetic.

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

pub const NOTE_NAMES_SHARP: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
pub const NOTE_NAMES_FLAT: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Pitch classes conventionally spelled with flats.
pub const FLAT_PREFERRED: [u8; 6] = [1, 3, 5, 6, 8, 10];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteName {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl NoteName {
    /// Semitone offset from C (0-11)
    pub fn to_semitone(self) -> u8 {
        match self {
            NoteName::C => 0,
            NoteName::D => 2,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::G => 7,
            NoteName::A => 9,
            NoteName::B => 11,
        }
    }

    pub fn parse(c: char) -> Option<NoteName> {
        match c {
            'C' => Some(NoteName::C),
            'D' => Some(NoteName::D),
            'E' => Some(NoteName::E),
            'F' => Some(NoteName::F),
            'G' => Some(NoteName::G),
            'A' => Some(NoteName::A),
            'B' => Some(NoteName::B),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::D => "D",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::G => "G",
            NoteName::A => "A",
            NoteName::B => "B",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accidental {
    Sharp,
    Flat,
}

impl Accidental {
    pub fn semitones(self) -> i8 {
        match self {
            Accidental::Sharp => 1,
            Accidental::Flat => -1,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Accidental::Sharp => "#",
            Accidental::Flat => "b",
        }
    }
}

/// A spelled note: letter name plus optional accidental.
///
/// `None` for the accidental means natural. The spelling is preserved so
/// enharmonic input (`C#` vs `Db`) round-trips, while `pitch_class` gives
/// the enharmonic-insensitive value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    pub name: NoteName,
    pub accidental: Option<Accidental>,
}

impl Note {
    pub fn new(name: NoteName, accidental: Option<Accidental>) -> Self {
        Note { name, accidental }
    }

    pub fn natural(name: NoteName) -> Self {
        Note {
            name,
            accidental: None,
        }
    }

    /// Pitch class 0-11 (C = 0).
    pub fn pitch_class(self) -> u8 {
        let base = self.name.to_semitone() as i8;
        let offset = self.accidental.map(Accidental::semitones).unwrap_or(0);
        (base + offset).rem_euclid(12) as u8
    }

    /// Spell a pitch class, preferring sharps for chromatic notes.
    pub fn from_pitch_class_sharp(pc: u8) -> Note {
        match pc % 12 {
            0 => Note::natural(NoteName::C),
            1 => Note::new(NoteName::C, Some(Accidental::Sharp)),
            2 => Note::natural(NoteName::D),
            3 => Note::new(NoteName::D, Some(Accidental::Sharp)),
            4 => Note::natural(NoteName::E),
            5 => Note::natural(NoteName::F),
            6 => Note::new(NoteName::F, Some(Accidental::Sharp)),
            7 => Note::natural(NoteName::G),
            8 => Note::new(NoteName::G, Some(Accidental::Sharp)),
            9 => Note::natural(NoteName::A),
            10 => Note::new(NoteName::A, Some(Accidental::Sharp)),
            11 => Note::natural(NoteName::B),
            _ => unreachable!(),
        }
    }

    /// Spell a pitch class, preferring flats for chromatic notes.
    pub fn from_pitch_class_flat(pc: u8) -> Note {
        match pc % 12 {
            1 => Note::new(NoteName::D, Some(Accidental::Flat)),
            3 => Note::new(NoteName::E, Some(Accidental::Flat)),
            6 => Note::new(NoteName::G, Some(Accidental::Flat)),
            8 => Note::new(NoteName::A, Some(Accidental::Flat)),
            10 => Note::new(NoteName::B, Some(Accidental::Flat)),
            pc => Note::from_pitch_class_sharp(pc),
        }
    }

    /// Conventional spelling: flats for the flat-preferred pitch classes.
    pub fn from_pitch_class(pc: u8) -> Note {
        if FLAT_PREFERRED.contains(&(pc % 12)) {
            Note::from_pitch_class_flat(pc)
        } else {
            Note::from_pitch_class_sharp(pc)
        }
    }

    /// Parse a note token: letter A-G, optional `#`/`b` (or `♯`/`♭`),
    /// optional trailing octave digits which are accepted and ignored.
    pub fn parse(token: &str) -> Result<Note, ParseError> {
        let normalized: String = token.trim().replace('♯', "#").replace('♭', "b");
        let mut chars = normalized.chars().peekable();

        let name = chars
            .next()
            .and_then(NoteName::parse)
            .ok_or_else(|| ParseError::InvalidNote(token.to_string()))?;

        let accidental = match chars.peek() {
            Some('#') => {
                chars.next();
                Some(Accidental::Sharp)
            }
            // 'b' is flat only when not itself a note letter context; in a
            // bare note token it is always the accidental.
            Some('b') => {
                chars.next();
                Some(Accidental::Flat)
            }
            _ => None,
        };

        // Trailing octave digits are ignored; anything else is an error.
        if chars.any(|c| !c.is_ascii_digit()) {
            return Err(ParseError::InvalidNote(token.to_string()));
        }

        Ok(Note { name, accidental })
    }
}

impl std::fmt::Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            self.name.as_str(),
            self.accidental.map(Accidental::symbol).unwrap_or("")
        )
    }
}
