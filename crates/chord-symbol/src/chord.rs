//! Chord structure: quality, seventh, extensions, alterations, and the
//! derived pitch-class set.

use serde::{Deserialize, Serialize};

use crate::note::{Accidental, Note};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Suspended2,
    Suspended4,
    Power,
}

impl ChordQuality {
    /// Semitone offsets of the base triad (or dyad) from the root.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Augmented => &[0, 4, 8],
            ChordQuality::Suspended2 => &[0, 2, 7],
            ChordQuality::Suspended4 => &[0, 5, 7],
            ChordQuality::Power => &[0, 7],
        }
    }

    /// Suffix for chord symbol display
    pub fn suffix(self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Diminished => "dim",
            ChordQuality::Augmented => "aug",
            ChordQuality::Suspended2 => "sus2",
            ChordQuality::Suspended4 => "sus4",
            ChordQuality::Power => "5",
        }
    }

    pub fn is_suspended(self) -> bool {
        matches!(self, ChordQuality::Suspended2 | ChordQuality::Suspended4)
    }
}

/// Seventh variant added above the triad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seventh {
    /// Minor seventh: the dominant 7th over major, m7 over minor.
    Minor,
    Major,
    Diminished,
    HalfDiminished,
}

impl Seventh {
    pub fn semitones(self) -> u8 {
        match self {
            Seventh::Minor => 10,
            Seventh::Major => 11,
            Seventh::Diminished => 9,
            Seventh::HalfDiminished => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extension {
    Ninth,
    Eleventh,
    Thirteenth,
}

impl Extension {
    /// Pitch-class offset from the root (octave-folded).
    pub fn pitch_class_offset(self) -> u8 {
        match self {
            Extension::Ninth => 2,
            Extension::Eleventh => 5,
            Extension::Thirteenth => 9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlteredDegree {
    Fifth,
    Ninth,
    Eleventh,
    Thirteenth,
}

impl AlteredDegree {
    /// Offset of the unaltered degree, used when the alteration replaces it.
    pub fn natural_offset(self) -> u8 {
        match self {
            AlteredDegree::Fifth => 7,
            AlteredDegree::Ninth => 2,
            AlteredDegree::Eleventh => 5,
            AlteredDegree::Thirteenth => 9,
        }
    }
}

/// A chromatic alteration such as `b5` or `#11`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Alteration {
    pub degree: AlteredDegree,
    pub accidental: Accidental,
}

impl Alteration {
    pub fn pitch_class_offset(self) -> u8 {
        let base = self.degree.natural_offset() as i8;
        (base + self.accidental.semitones()).rem_euclid(12) as u8
    }
}

/// A parsed chord symbol.
///
/// The pitch-class set is fully determined by root + quality + seventh +
/// extensions + alterations. The bass note of a slash chord is the nominal
/// lowest pitch and is tracked separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    pub root: Note,
    pub quality: ChordQuality,
    pub seventh: Option<Seventh>,
    pub extensions: Vec<Extension>,
    pub alterations: Vec<Alteration>,
    pub bass: Option<Note>,
    /// Original textual form of the symbol.
    pub symbol: String,
}

impl Chord {
    pub fn root_pitch_class(&self) -> u8 {
        self.root.pitch_class()
    }

    /// Pitch class of the nominal lowest note: the slash bass, or the root.
    pub fn bass_pitch_class(&self) -> u8 {
        self.bass
            .map(|b| b.pitch_class())
            .unwrap_or_else(|| self.root.pitch_class())
    }

    /// Sorted, deduplicated pitch classes of the chord tones.
    ///
    /// Alterations replace the degree they alter (`C7b5` has no natural
    /// fifth). The slash bass is not part of this set.
    pub fn pitch_classes(&self) -> Vec<u8> {
        let root = self.root.pitch_class();
        let mut offsets: Vec<u8> = self.quality.intervals().to_vec();

        if let Some(seventh) = self.seventh {
            offsets.push(seventh.semitones());
        }
        for ext in &self.extensions {
            offsets.push(ext.pitch_class_offset());
        }
        for alt in &self.alterations {
            offsets.retain(|&o| o != alt.degree.natural_offset());
            offsets.push(alt.pitch_class_offset());
        }

        let mut pcs: Vec<u8> = offsets.into_iter().map(|o| (root + o) % 12).collect();
        pcs.sort_unstable();
        pcs.dedup();
        pcs
    }

    /// True for a major triad or a dominant seventh chord.
    pub fn is_dominant_quality(&self) -> bool {
        matches!(self.quality, ChordQuality::Major | ChordQuality::Augmented)
            && matches!(self.seventh, None | Some(Seventh::Minor))
    }

    /// True when a minor seventh sits over a major-third triad.
    pub fn has_dominant_seventh(&self) -> bool {
        matches!(self.quality, ChordQuality::Major | ChordQuality::Augmented)
            && self.seventh == Some(Seventh::Minor)
    }

    pub fn is_minor_family(&self) -> bool {
        matches!(self.quality, ChordQuality::Minor | ChordQuality::Diminished)
    }

    /// True when the chord is a slash chord with a bass other than the root.
    pub fn is_slash_chord(&self) -> bool {
        self.bass
            .map(|b| b.pitch_class() != self.root.pitch_class())
            .unwrap_or(false)
    }
}
