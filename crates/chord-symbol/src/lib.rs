//! Chord symbol parsing and tonal music primitives.
//!
//! This crate provides the structured vocabulary for tonal analysis:
//! spelled notes with pitch-class arithmetic, chords parsed from symbols
//! like `Cmaj7` or `F#m7b5/A`, and keys/modes with their interval patterns
//! and parent-key relationships.
//!
//! # Example
//!
//! ```
//! use chord_symbol::{parse, Key};
//!
//! let chord = parse("G7sus4").unwrap();
//! assert_eq!(chord.pitch_classes(), vec![0, 2, 5, 7]);
//!
//! let key = Key::parse("G mixolydian").unwrap();
//! assert_eq!(key.parent_tonic_pitch_class(), 0); // C major collection
//! ```

pub mod chord;
pub mod error;
pub mod key;
pub mod note;
pub mod parser;

pub use chord::{Alteration, AlteredDegree, Chord, ChordQuality, Extension, Seventh};
pub use error::ParseError;
pub use key::{Key, Mode};
pub use note::{Accidental, Note, NoteName, FLAT_PREFERRED, NOTE_NAMES_FLAT, NOTE_NAMES_SHARP};
pub use parser::parse;
