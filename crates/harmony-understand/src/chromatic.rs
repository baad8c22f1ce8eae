//! Chromatic harmony: secondary dominants, borrowed chords, and chromatic
//! mediants relative to an established key.

use chord_symbol::{Chord, ChordQuality, Key};

use crate::functional::{is_diatonic, roman_for};
use crate::types::{BorrowedChord, ChromaticMediant, SecondaryDominant};

#[derive(Debug, Clone, Default)]
pub struct ChromaticAnalysis {
    pub secondary_dominants: Vec<SecondaryDominant>,
    pub borrowed_chords: Vec<BorrowedChord>,
    pub chromatic_mediants: Vec<ChromaticMediant>,
}

impl ChromaticAnalysis {
    pub fn is_empty(&self) -> bool {
        self.secondary_dominants.is_empty()
            && self.borrowed_chords.is_empty()
            && self.chromatic_mediants.is_empty()
    }
}

pub fn analyze_chromatic(chords: &[Chord], key: &Key) -> ChromaticAnalysis {
    let mut result = ChromaticAnalysis::default();

    for (i, chord) in chords.iter().enumerate() {
        if is_diatonic(chord, key) {
            continue;
        }

        if let Some(secondary) = secondary_dominant(chord, chords.get(i + 1), key) {
            result.secondary_dominants.push(secondary);
            continue;
        }

        if let Some(borrowed) = borrowed_chord(chord, key) {
            result.borrowed_chords.push(borrowed);
            continue;
        }

        if let Some(mediant) = chromatic_mediant(chord, key) {
            result.chromatic_mediants.push(mediant);
        }
    }

    result
}

/// A major or dominant-7 chord a perfect fifth above the following diatonic
/// chord is its applied dominant; a diminished chord a semitone below it is
/// the applied leading-tone chord.
fn secondary_dominant(
    chord: &Chord,
    next: Option<&Chord>,
    key: &Key,
) -> Option<SecondaryDominant> {
    let next = next?;
    if !is_diatonic(next, key) {
        return None;
    }

    let target = roman_for(next, key);
    let interval_down = (chord.root_pitch_class() + 12 - next.root_pitch_class()) % 12;

    if chord.is_dominant_quality() && interval_down == 7 {
        let head = if chord.has_dominant_seventh() { "V7" } else { "V" };
        return Some(SecondaryDominant {
            chord: chord.symbol.clone(),
            target: next.symbol.clone(),
            roman_numeral: format!("{}/{}", head, target.text),
        });
    }

    if chord.quality == ChordQuality::Diminished && interval_down == 11 {
        return Some(SecondaryDominant {
            chord: chord.symbol.clone(),
            target: next.symbol.clone(),
            roman_numeral: format!("vii°/{}", target.text),
        });
    }

    None
}

/// A chord diatonic to the parallel mode but not to the current key.
fn borrowed_chord(chord: &Chord, key: &Key) -> Option<BorrowedChord> {
    let parallel = if key.is_minor() {
        Key::major(key.tonic)
    } else {
        Key::minor(key.tonic)
    };
    if !is_diatonic(chord, &parallel) {
        return None;
    }

    let borrowed_from = if key.is_minor() {
        "parallel major"
    } else {
        "parallel minor"
    };
    Some(BorrowedChord {
        chord: chord.symbol.clone(),
        roman_numeral: roman_for(chord, key).text,
        borrowed_from: borrowed_from.to_string(),
    })
}

/// A major or minor chord a third from the tonic sharing exactly one common
/// tone with the tonic triad.
fn chromatic_mediant(chord: &Chord, key: &Key) -> Option<ChromaticMediant> {
    if !matches!(chord.quality, ChordQuality::Major | ChordQuality::Minor) {
        return None;
    }
    let tonic = key.tonic.pitch_class();
    let rel = (chord.root_pitch_class() + 12 - tonic) % 12;
    let relationship = match rel {
        3 => "minor third above the tonic",
        4 => "major third above the tonic",
        8 => "major third below the tonic",
        9 => "minor third below the tonic",
        _ => return None,
    };

    let tonic_third = if key.is_minor() { 3 } else { 4 };
    let tonic_triad = [tonic, (tonic + tonic_third) % 12, (tonic + 7) % 12];
    let common = chord
        .pitch_classes()
        .iter()
        .filter(|pc| tonic_triad.contains(pc))
        .count();
    if common != 1 {
        return None;
    }

    Some(ChromaticMediant {
        chord: chord.symbol.clone(),
        relationship: relationship.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chord_symbol::parse;

    fn chords(symbols: &[&str]) -> Vec<Chord> {
        symbols.iter().map(|s| parse(s).unwrap()).collect()
    }

    fn c_major() -> Key {
        Key::parse("C major").unwrap()
    }

    #[test]
    fn diatonic_progression_has_no_chromatic_elements() {
        let result = analyze_chromatic(&chords(&["C", "F", "G7", "C"]), &c_major());
        assert!(result.is_empty());
    }

    #[test]
    fn v7_of_ii_detected() {
        let result = analyze_chromatic(&chords(&["C", "A7", "Dm", "G7", "C"]), &c_major());
        assert_eq!(result.secondary_dominants.len(), 1);
        let sd = &result.secondary_dominants[0];
        assert_eq!(sd.chord, "A7");
        assert_eq!(sd.target, "Dm");
        assert_eq!(sd.roman_numeral, "V7/ii");
    }

    #[test]
    fn major_triad_secondary_dominant() {
        // E major resolving to Am in C major: V/vi.
        let result = analyze_chromatic(&chords(&["C", "E", "Am", "G", "C"]), &c_major());
        assert_eq!(result.secondary_dominants.len(), 1);
        assert_eq!(result.secondary_dominants[0].roman_numeral, "V/vi");
    }

    #[test]
    fn leading_tone_applied_chord() {
        // C#° resolving to Dm: vii°/ii.
        let result = analyze_chromatic(&chords(&["C", "C#dim", "Dm", "G", "C"]), &c_major());
        assert_eq!(result.secondary_dominants.len(), 1);
        assert_eq!(result.secondary_dominants[0].roman_numeral, "vii°/ii");
    }

    #[test]
    fn borrowed_from_parallel_minor() {
        let result = analyze_chromatic(&chords(&["C", "Bb", "F", "C"]), &c_major());
        assert_eq!(result.borrowed_chords.len(), 1);
        let borrowed = &result.borrowed_chords[0];
        assert_eq!(borrowed.chord, "Bb");
        assert_eq!(borrowed.roman_numeral, "bVII");
        assert_eq!(borrowed.borrowed_from, "parallel minor");
    }

    #[test]
    fn borrowed_iv_minor() {
        let result = analyze_chromatic(&chords(&["C", "Fm", "C"]), &c_major());
        assert_eq!(result.borrowed_chords.len(), 1);
        assert_eq!(result.borrowed_chords[0].roman_numeral, "iv");
    }

    #[test]
    fn chromatic_mediant_detected() {
        // E major over C major tonic: shares only E with C-E-G once G# and B
        // replace the common tones.
        let result = analyze_chromatic(&chords(&["C", "E", "C"]), &c_major());
        assert_eq!(result.chromatic_mediants.len(), 1);
        assert!(result.chromatic_mediants[0]
            .relationship
            .contains("major third above"));
    }
}
