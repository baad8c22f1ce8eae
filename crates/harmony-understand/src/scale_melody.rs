//! Scale and melody analysis: parent-scale detection, modal labels for
//! candidate tonics, and tonic inference for melodic lines.

use std::collections::BTreeMap;

use chord_symbol::{Key, Mode, Note};

use crate::types::ContextualClass;

/// Major keys in circle-of-fifths order, used for parent scanning.
const MAJOR_ROOTS: [u8; 12] = [0, 7, 2, 9, 4, 11, 6, 1, 8, 3, 10, 5];

const NATURAL_MINOR: [u8; 7] = [0, 2, 3, 5, 7, 8, 10];
const HARMONIC_MINOR: [u8; 7] = [0, 2, 3, 5, 7, 8, 11];
const MELODIC_MINOR: [u8; 7] = [0, 2, 3, 5, 7, 9, 11];
const MAJOR: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

#[derive(Debug, Clone)]
pub struct ScaleAnalysis {
    /// Major keys whose scale contains the input set.
    pub parent_majors: Vec<Key>,
    /// All parent scales by name, including minor variants.
    pub parent_scales: Vec<String>,
    /// Candidate tonic -> modal label, e.g. "G" -> "G Mixolydian".
    pub modal_labels: BTreeMap<String, String>,
    pub classification: ContextualClass,
}

pub fn analyze_scale(notes: &[Note]) -> ScaleAnalysis {
    let mut pcs: Vec<u8> = notes.iter().map(|n| n.pitch_class()).collect();
    pcs.sort_unstable();
    pcs.dedup();

    let mut parent_majors = Vec::new();
    let mut parent_scales = Vec::new();

    for &root in &MAJOR_ROOTS {
        let note = Note::from_pitch_class(root);
        if contains_all(root, &MAJOR, &pcs) {
            parent_majors.push(Key::major(note));
            parent_scales.push(format!("{} major", note));
        }
        if contains_all(root, &NATURAL_MINOR, &pcs) {
            parent_scales.push(format!("{} minor", note));
        }
        if contains_all(root, &HARMONIC_MINOR, &pcs) {
            parent_scales.push(format!("{} harmonic minor", note));
        }
        if contains_all(root, &MELODIC_MINOR, &pcs) {
            parent_scales.push(format!("{} melodic minor", note));
        }
    }
    parent_scales.sort();

    let classification = match parent_majors.len() {
        0 => ContextualClass::ModalCandidate,
        1 => ContextualClass::Diatonic,
        _ => ContextualClass::ModalBorrowing,
    };

    let modal_labels = modal_labels(notes, &parent_majors);

    ScaleAnalysis {
        parent_majors,
        parent_scales,
        modal_labels,
        classification,
    }
}

fn contains_all(root: u8, intervals: &[u8; 7], pcs: &[u8]) -> bool {
    pcs.iter()
        .all(|pc| intervals.iter().any(|iv| (root + iv) % 12 == *pc))
}

/// For every input note that can serve as a tonic, pick the most plausible
/// modal label among the parent collections.
fn modal_labels(notes: &[Note], parents: &[Key]) -> BTreeMap<String, String> {
    let mut labels: BTreeMap<String, (f64, String)> = BTreeMap::new();

    for note in notes {
        let tonic_pc = note.pitch_class();
        for parent in parents {
            let parent_pc = parent.tonic.pitch_class();
            let degree = (tonic_pc + 12 - parent_pc) % 12;
            let Some(mode) = Mode::from_degree(degree) else {
                continue;
            };
            let priority = label_priority(tonic_pc, parent_pc, mode);
            let label = format!("{} {}", note, mode);
            let entry = labels
                .entry(note.to_string())
                .or_insert_with(|| (priority, label.clone()));
            if priority < entry.0 {
                *entry = (priority, label);
            }
        }
    }

    labels.into_iter().map(|(k, (_, v))| (k, v)).collect()
}

/// Lower is better: the tonic's own major scale first, then modes by how
/// common they are in practice, with a small penalty for distant parents.
fn label_priority(tonic_pc: u8, parent_pc: u8, mode: Mode) -> f64 {
    if tonic_pc == parent_pc {
        return 1.0;
    }
    let base = match mode {
        Mode::Ionian | Mode::Major => 3.0,
        Mode::Dorian | Mode::Mixolydian => 3.0,
        Mode::Phrygian | Mode::Lydian => 4.0,
        Mode::Aeolian | Mode::Minor => 4.0,
        Mode::Locrian => 5.0,
    };
    let diff = (tonic_pc as i8 - parent_pc as i8).rem_euclid(12) as f64;
    let distance = diff.min(12.0 - diff);
    base + distance * 0.1
}

/// Tonic inference for a melodic line: last note weighs 3, first note 2,
/// each occurrence 1, and a pitch appearing as both a peak and a valley of
/// the contour gains 2.
pub fn infer_melody_tonic(notes: &[Note]) -> (Option<Note>, f64) {
    if notes.is_empty() {
        return (None, 0.0);
    }

    let heights: Vec<i32> = notes.iter().map(|n| n.pitch_class() as i32).collect();
    let mut peaks = [false; 12];
    let mut valleys = [false; 12];
    for i in 1..heights.len().saturating_sub(1) {
        let pc = (heights[i].rem_euclid(12)) as usize;
        if heights[i] > heights[i - 1] && heights[i] > heights[i + 1] {
            peaks[pc] = true;
        }
        if heights[i] < heights[i - 1] && heights[i] < heights[i + 1] {
            valleys[pc] = true;
        }
    }

    let mut score = [0.0f64; 12];
    for note in notes {
        score[note.pitch_class() as usize] += 1.0;
    }
    score[notes[0].pitch_class() as usize] += 2.0;
    score[notes[notes.len() - 1].pitch_class() as usize] += 3.0;
    for pc in 0..12 {
        if peaks[pc] && valleys[pc] {
            score[pc] += 2.0;
        }
    }

    let best = score.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let last_pc = notes[notes.len() - 1].pitch_class();
    let first_pc = notes[0].pitch_class();
    let winner_pc = if score[last_pc as usize] == best {
        last_pc
    } else if score[first_pc as usize] == best {
        first_pc
    } else {
        (0..12u8).find(|&pc| score[pc as usize] == best).unwrap_or(0)
    };

    let second = score
        .iter()
        .enumerate()
        .filter(|(pc, _)| *pc != winner_pc as usize)
        .map(|(_, s)| *s)
        .fold(0.0f64, f64::max);

    let confidence = if (best - second).abs() < f64::EPSILON {
        0.3
    } else {
        ((best - second) / best).clamp(0.0, 1.0)
    };

    let tonic = notes
        .iter()
        .find(|n| n.pitch_class() == winner_pc)
        .copied()
        .unwrap_or_else(|| Note::from_pitch_class(winner_pc));

    (Some(tonic), confidence)
}

/// Compact human-readable account of the scale analysis.
pub fn rationale(
    analysis: &ScaleAnalysis,
    suggested_tonic: Option<&Note>,
) -> String {
    let mut parts = Vec::new();
    if !analysis.parent_scales.is_empty() {
        parts.push(format!("Parents: {}", analysis.parent_scales.join(", ")));
    }
    if let Some(tonic) = suggested_tonic {
        parts.push(format!("Suggested tonic: {}", tonic));
    }
    if !analysis.modal_labels.is_empty() {
        let labels: Vec<&str> = analysis.modal_labels.values().map(String::as_str).collect();
        parts.push(format!("Modal candidates: {}", labels.join(", ")));
    }
    if parts.is_empty() {
        "no diatonic parent found".to_string()
    } else {
        parts.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notes(tokens: &[&str]) -> Vec<Note> {
        tokens.iter().map(|t| Note::parse(t).unwrap()).collect()
    }

    #[test]
    fn full_major_scale_is_diatonic() {
        let analysis = analyze_scale(&notes(&["C", "D", "E", "F", "G", "A", "B"]));
        assert_eq!(analysis.classification, ContextualClass::Diatonic);
        assert_eq!(analysis.parent_majors.len(), 1);
        assert!(analysis.parent_scales.contains(&"C major".to_string()));
        assert!(analysis.parent_scales.contains(&"A minor".to_string()));
    }

    #[test]
    fn dorian_scale_has_major_parent_a_whole_step_down() {
        let analysis = analyze_scale(&notes(&["D", "E", "F", "G", "A", "B", "C"]));
        assert_eq!(analysis.classification, ContextualClass::Diatonic);
        assert_eq!(analysis.parent_majors[0].tonic.pitch_class(), 0);
        assert_eq!(
            analysis.modal_labels.get("D").map(String::as_str),
            Some("D Dorian")
        );
    }

    #[test]
    fn pentatonic_subset_is_modal_borrowing() {
        let analysis = analyze_scale(&notes(&["C", "D", "E", "G", "A"]));
        assert_eq!(analysis.classification, ContextualClass::ModalBorrowing);
        assert!(analysis.parent_majors.len() > 1);
    }

    #[test]
    fn whole_tone_has_no_parent() {
        let analysis = analyze_scale(&notes(&["C", "D", "E", "F#", "G#", "A#"]));
        assert_eq!(analysis.classification, ContextualClass::ModalCandidate);
        assert!(analysis.parent_majors.is_empty());
    }

    #[test]
    fn harmonic_minor_parent_reported() {
        let analysis = analyze_scale(&notes(&["A", "B", "C", "D", "E", "F", "G#"]));
        assert!(analysis
            .parent_scales
            .contains(&"A harmonic minor".to_string()));
        assert!(analysis.parent_majors.is_empty());
    }

    #[test]
    fn melody_tonic_prefers_final_note() {
        let (tonic, confidence) = infer_melody_tonic(&notes(&["C", "D", "E", "D", "C"]));
        assert_eq!(tonic.unwrap().pitch_class(), 0);
        assert!(confidence > 0.5);
    }

    #[test]
    fn tied_scores_floor_confidence() {
        // C: two occurrences + first position = 4; G: one + final position = 4.
        let (tonic, confidence) = infer_melody_tonic(&notes(&["C", "C", "G"]));
        assert_eq!(tonic.unwrap().pitch_class(), 7);
        assert_eq!(confidence, 0.3);
    }

    #[test]
    fn single_note_melody_is_certain() {
        let (tonic, confidence) = infer_melody_tonic(&notes(&["E"]));
        assert_eq!(tonic.unwrap().pitch_class(), 4);
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn octave_digits_ignored() {
        let analysis = analyze_scale(&notes(&["C4", "E4", "G4"]));
        assert!(!analysis.parent_majors.is_empty());
    }
}
