//! Evidence collection and confidence calibration.
//!
//! Analyzers return facts; this module is the single place where facts
//! become weighted evidence and evidence becomes a calibrated confidence.

use chord_symbol::Chord;

use crate::chromatic::ChromaticAnalysis;
use crate::functional::FunctionalAnalysis;
use crate::modal::ModalAnalysis;
use crate::types::{Evidence, EvidenceType, InterpretationType};

/// Confidence floor when an interpretation has no supporting evidence.
pub const NO_EVIDENCE_FLOOR: f64 = 0.2;

/// Bonus for interpretations supported by more than one evidence type.
pub const DIVERSITY_BONUS: f64 = 0.1;

/// Weighted-mean confidence over evidence, with a diversity bonus.
pub fn confidence_from(evidence: &[Evidence]) -> f64 {
    if evidence.is_empty() {
        return NO_EVIDENCE_FLOOR;
    }

    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for piece in evidence {
        let weight = piece.kind.weight();
        weighted_sum += piece.strength * weight;
        total_weight += weight;
    }
    let base = weighted_sum / total_weight;

    let mut kinds: Vec<EvidenceType> = Vec::new();
    for piece in evidence {
        if !kinds.contains(&piece.kind) {
            kinds.push(piece.kind);
        }
    }
    let bonus = if kinds.len() > 1 { DIVERSITY_BONUS } else { 0.0 };

    (base + bonus).clamp(0.0, 1.0)
}

fn piece(
    kind: EvidenceType,
    strength: f64,
    supports: &[InterpretationType],
    description: String,
    musical_basis: String,
) -> Evidence {
    Evidence {
        kind,
        strength,
        supports: supports.to_vec(),
        description,
        musical_basis,
    }
}

/// Evidence for the functional reading.
///
/// Single chords and static repetitions yield nothing, so they fall to the
/// no-evidence floor.
pub fn functional_evidence(chords: &[Chord], analysis: &FunctionalAnalysis) -> Vec<Evidence> {
    let mut out = Vec::new();

    if chords.len() < 2 {
        return out;
    }
    let static_repetition = chords.iter().all(|c| {
        c.root_pitch_class() == chords[0].root_pitch_class() && c.quality == chords[0].quality
    });
    if static_repetition {
        return out;
    }

    for cadence in &analysis.cadences {
        out.push(piece(
            EvidenceType::Cadential,
            cadence.strength(),
            &[InterpretationType::Functional],
            format!("{} cadence detected", cadence.kind.label()),
            format!(
                "{} cadential motion resolves within {}",
                cadence.kind.label(),
                analysis.key
            ),
        ));
    }

    if analysis.romans.last().is_some_and(|rn| rn.is_tonic()) {
        out.push(piece(
            EvidenceType::Structural,
            0.6,
            &[InterpretationType::Functional],
            "progression closes on the tonic".to_string(),
            "final tonic arrival confirms the key center".to_string(),
        ));
    }

    if analysis.diatonic_ratio > 0.5 {
        out.push(piece(
            EvidenceType::Harmonic,
            (analysis.diatonic_ratio * 0.65).min(0.60),
            &[InterpretationType::Functional],
            "chords predominantly diatonic to the key".to_string(),
            format!(
                "{:.0}% of chords belong to {}",
                analysis.diatonic_ratio * 100.0,
                analysis.key
            ),
        ));
    }

    if let Some(pattern) = analysis.pattern {
        out.push(piece(
            EvidenceType::Structural,
            0.95,
            &[InterpretationType::Functional],
            format!("classic functional pattern {}", pattern),
            format!("{} demonstrates strong tonal logic", pattern),
        ));
    }

    out
}

/// Evidence for the modal reading.
pub fn modal_evidence(analysis: &ModalAnalysis) -> Vec<Evidence> {
    let mut out = Vec::new();

    for characteristic in &analysis.characteristics {
        out.push(piece(
            EvidenceType::Intervallic,
            0.7,
            &[InterpretationType::Modal],
            characteristic.clone(),
            format!("characteristic of {}", analysis.mode_name),
        ));
    }

    if let Some((kind, strength)) = analysis.modal_cadence {
        out.push(piece(
            EvidenceType::Cadential,
            strength,
            &[InterpretationType::Modal],
            format!("{} cadence onto the local tonic", kind.label()),
            format!("cadential resolution to {}", analysis.tonic),
        ));
    }

    if analysis.tonic_frames {
        out.push(piece(
            EvidenceType::Structural,
            0.6,
            &[InterpretationType::Modal],
            format!("progression framed by {}", analysis.tonic),
            "first and last chords establish the local tonic".to_string(),
        ));
    }

    if let Some((pattern, strength)) = analysis.pattern {
        out.push(piece(
            EvidenceType::Structural,
            strength,
            &[InterpretationType::Modal],
            format!("modal pattern {}", pattern),
            format!("{} is idiomatic {}", pattern, analysis.mode_name),
        ));
    }

    out
}

/// Evidence for the chromatic reading: applied dominants resolve, borrowed
/// chords color the harmony, mediants recontextualize the tonic.
pub fn chromatic_evidence(analysis: &ChromaticAnalysis) -> Vec<Evidence> {
    let mut out = Vec::new();

    for sd in &analysis.secondary_dominants {
        out.push(piece(
            EvidenceType::Cadential,
            0.7,
            &[InterpretationType::Chromatic],
            format!("secondary dominant {} ({})", sd.roman_numeral, sd.chord),
            format!("{} tonicizes {}", sd.chord, sd.target),
        ));
    }
    for bc in &analysis.borrowed_chords {
        out.push(piece(
            EvidenceType::Harmonic,
            0.6,
            &[InterpretationType::Chromatic],
            format!("borrowed chord {} ({})", bc.roman_numeral, bc.chord),
            format!("{} comes from the {}", bc.chord, bc.borrowed_from),
        ));
    }
    for cm in &analysis.chromatic_mediants {
        out.push(piece(
            EvidenceType::Contextual,
            0.5,
            &[InterpretationType::Chromatic],
            format!("chromatic mediant {}", cm.chord),
            cm.relationship.clone(),
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CadenceType;
    use chord_symbol::parse;

    fn ev(kind: EvidenceType, strength: f64) -> Evidence {
        piece(
            kind,
            strength,
            &[InterpretationType::Functional],
            String::new(),
            String::new(),
        )
    }

    #[test]
    fn no_evidence_floor() {
        assert_eq!(confidence_from(&[]), NO_EVIDENCE_FLOOR);
    }

    #[test]
    fn single_type_has_no_diversity_bonus() {
        let conf = confidence_from(&[ev(EvidenceType::Cadential, 0.7)]);
        assert!((conf - 0.7).abs() < 1e-9);
    }

    #[test]
    fn weighted_mean_with_diversity_bonus() {
        // cadential 0.9 (w 0.4) + structural 0.6 (w 0.25) + harmonic 0.6
        // (w 0.15) = 0.75 weighted mean, +0.1 diversity.
        let conf = confidence_from(&[
            ev(EvidenceType::Cadential, 0.9),
            ev(EvidenceType::Structural, 0.6),
            ev(EvidenceType::Harmonic, 0.6),
        ]);
        assert!((conf - 0.85).abs() < 1e-9);
    }

    #[test]
    fn confidence_clamped_to_one() {
        let conf = confidence_from(&[
            ev(EvidenceType::Cadential, 1.0),
            ev(EvidenceType::Structural, 1.0),
        ]);
        assert!(conf <= 1.0);
    }

    #[test]
    fn authentic_cadence_progression_calibrates_high() {
        let chords: Vec<_> = ["C", "F", "G", "C"].iter().map(|s| parse(s).unwrap()).collect();
        let analysis = crate::functional::analyze_functionally(&chords, None);
        let evidence = functional_evidence(&chords, &analysis);
        let conf = confidence_from(&evidence);
        assert!((conf - 0.85).abs() < 0.05, "got {}", conf);
    }

    #[test]
    fn plagal_progression_calibrates_moderate() {
        let chords: Vec<_> = ["C", "F", "C"].iter().map(|s| parse(s).unwrap()).collect();
        let analysis = crate::functional::analyze_functionally(&chords, None);
        let conf = confidence_from(&functional_evidence(&chords, &analysis));
        assert!(conf > 0.55 && conf < 0.8, "got {}", conf);
    }

    #[test]
    fn single_chord_has_no_functional_evidence() {
        let chords = vec![parse("C").unwrap()];
        let analysis = crate::functional::analyze_functionally(&chords, None);
        assert!(functional_evidence(&chords, &analysis).is_empty());
    }

    #[test]
    fn static_repetition_has_no_functional_evidence() {
        let chords: Vec<_> = ["C", "C", "C", "C"].iter().map(|s| parse(s).unwrap()).collect();
        let analysis = crate::functional::analyze_functionally(&chords, None);
        assert!(functional_evidence(&chords, &analysis).is_empty());
    }

    #[test]
    fn half_cadence_only_calibrates_around_half() {
        // A bare dominant ending with nothing else carries only the half
        // cadence's own weight.
        let evidence = vec![ev(EvidenceType::Cadential, CadenceType::Half.strength())];
        let conf = confidence_from(&evidence);
        assert!((conf - 0.5).abs() < 1e-9);
    }
}
