//! End-to-end engine behavior: seed progressions, calibration targets, and
//! the universal result invariants.

use harmony_understand::{
    AnalysisError, AnalysisOptions, CadenceType, ContextualClass, HarmonyEngine,
    InterpretationType, MultipleInterpretationResult, PedagogicalLevel,
};

async fn analyze(chords: &[&str], parent_key: Option<&str>) -> MultipleInterpretationResult {
    let engine = HarmonyEngine::new();
    let options = AnalysisOptions {
        parent_key: parent_key.map(str::to_string),
        ..Default::default()
    };
    engine
        .analyze_chord_progression(chords, &options)
        .await
        .expect("analysis should succeed")
}

fn assert_invariants(result: &MultipleInterpretationResult) {
    let primary = &result.primary_analysis;
    assert!((0.0..=1.0).contains(&primary.confidence));
    for alt in &result.alternative_analyses {
        let interp = &alt.interpretation;
        assert!((0.0..=1.0).contains(&interp.confidence));
        assert!(
            primary.confidence >= interp.confidence,
            "primary {} must outrank alternative {}",
            primary.confidence,
            interp.confidence
        );
        assert!(
            interp.confidence >= result.metadata.confidence_threshold,
            "alternative below threshold"
        );
        assert!(!alt.relationship_to_primary.is_empty());
    }
}

#[tokio::test]
async fn authentic_cadence_progression() {
    let result = analyze(&["C", "F", "G", "C"], None).await;
    assert_invariants(&result);

    let primary = &result.primary_analysis;
    assert_eq!(primary.kind, InterpretationType::Functional);
    assert_eq!(primary.key, "C major");
    assert_eq!(primary.roman_numerals, vec!["I", "IV", "V", "I"]);
    assert!(primary
        .cadences
        .iter()
        .any(|c| c.kind == CadenceType::Authentic));
    assert!(
        primary.confidence >= 0.75 && primary.confidence <= 1.0,
        "got {}",
        primary.confidence
    );
}

#[tokio::test]
async fn pop_progression_with_parent_key() {
    let result = analyze(&["C", "Am", "F", "G"], Some("C major")).await;
    assert_invariants(&result);

    let primary = &result.primary_analysis;
    assert_eq!(primary.kind, InterpretationType::Functional);
    assert_eq!(primary.roman_numerals, vec!["I", "vi", "IV", "V"]);
    assert!(primary
        .evidence
        .iter()
        .any(|e| e.description.contains("I-vi-IV-V")));
    assert!(
        primary.confidence >= 0.75,
        "strong pattern should score high, got {}",
        primary.confidence
    );
}

#[tokio::test]
async fn jazz_cadence_without_key() {
    let result = analyze(&["Dm", "G", "C"], None).await;
    assert_invariants(&result);

    let primary = &result.primary_analysis;
    assert_eq!(primary.kind, InterpretationType::Functional);
    assert_eq!(primary.key, "C major");
    assert_eq!(primary.roman_numerals, vec!["ii", "V", "I"]);
    assert!(primary
        .cadences
        .iter()
        .any(|c| c.kind == CadenceType::Authentic));
    assert!(
        primary.confidence >= 0.73,
        "ii-V-I should be near-definitive, got {}",
        primary.confidence
    );
}

#[tokio::test]
async fn mixolydian_reading_beats_functional() {
    let result = analyze(&["G", "F", "C", "G"], Some("C major")).await;
    assert_invariants(&result);

    let primary = &result.primary_analysis;
    assert_eq!(primary.kind, InterpretationType::Modal);
    assert_eq!(primary.mode.as_deref(), Some("G Mixolydian"));
    assert_eq!(
        primary.contextual_classification,
        ContextualClass::ModalBorrowing
    );
    assert_eq!(primary.roman_numerals, vec!["I", "bVII", "IV", "I"]);
    assert!(
        primary.confidence >= 0.75 && primary.confidence <= 0.95,
        "got {}",
        primary.confidence
    );

    // The functional reading of the same chords survives as an alternative
    // with a different tonal center.
    let functional_alt = result
        .alternative_analyses
        .iter()
        .find(|a| a.interpretation.kind == InterpretationType::Functional);
    if let Some(alt) = functional_alt {
        assert_eq!(alt.relationship_to_primary, "reinterpretation");
    }
}

#[tokio::test]
async fn plagal_progression_moderate_confidence() {
    let result = analyze(&["C", "F", "C"], None).await;
    assert_invariants(&result);

    let primary = &result.primary_analysis;
    assert_eq!(primary.kind, InterpretationType::Functional);
    assert_eq!(primary.key, "C major");
    assert_eq!(primary.roman_numerals, vec!["I", "IV", "I"]);
    assert!(primary
        .cadences
        .iter()
        .any(|c| c.kind == CadenceType::Plagal));
    assert!(
        primary.confidence > 0.5 && primary.confidence < 0.8,
        "plagal-only should sit mid-range, got {}",
        primary.confidence
    );
}

#[tokio::test]
async fn secondary_dominant_progression() {
    let result = analyze(&["C", "A7", "Dm", "G7", "C"], Some("C major")).await;
    assert_invariants(&result);

    let primary = &result.primary_analysis;
    assert!(matches!(
        primary.kind,
        InterpretationType::Functional | InterpretationType::Chromatic
    ));
    assert_eq!(primary.secondary_dominants.len(), 1);
    let sd = &primary.secondary_dominants[0];
    assert_eq!(sd.chord, "A7");
    assert_eq!(sd.target, "Dm");
    assert_eq!(sd.roman_numeral, "V7/ii");

    let chromatic_confidence = primary.confidence_breakdown.chromatic.expect("chromatic ran");
    assert!(chromatic_confidence >= 0.699, "got {}", chromatic_confidence);
}

#[tokio::test]
async fn add_key_suggested_for_unkeyed_jazz_cadence() {
    let result = analyze(&["Dm7", "G7", "Cmaj7"], None).await;
    let suggestions = result.suggestions.expect("suggestions expected");
    let first = &suggestions.suggestions[0];
    assert_eq!(first.suggested_key.as_deref(), Some("C major"));
    assert!(first.confidence >= 0.70, "got {}", first.confidence);
}

#[tokio::test]
async fn empty_progression_is_an_input_error() {
    let engine = HarmonyEngine::new();
    let err = engine
        .analyze_chord_progression::<&str>(&[], &AnalysisOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err, AnalysisError::EmptyProgression);
    assert_eq!(err.to_string(), "progression is empty");
}

#[tokio::test]
async fn unparsable_chord_names_symbol_and_position() {
    let engine = HarmonyEngine::new();
    let err = engine
        .analyze_chord_progression(&["C", "Xyz", "G"], &AnalysisOptions::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AnalysisError::UnparsableChord {
            symbol: "Xyz".into(),
            position: 1
        }
    );
}

#[tokio::test]
async fn invalid_parent_key_rejected() {
    let engine = HarmonyEngine::new();
    let options = AnalysisOptions::with_parent_key("H sharp");
    let err = engine
        .analyze_chord_progression(&["C", "G"], &options)
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidKey(_)));
}

#[tokio::test]
async fn single_chord_stays_humble() {
    let result = analyze(&["C"], None).await;
    assert_invariants(&result);
    assert!(result.primary_analysis.confidence <= 0.40);
    assert!(result.alternative_analyses.is_empty());
}

#[tokio::test]
async fn static_repetition_stays_humbler() {
    let result = analyze(&["C", "C", "C", "C"], None).await;
    assert_invariants(&result);

    let primary = &result.primary_analysis;
    assert_eq!(primary.kind, InterpretationType::Functional);
    assert!(primary.confidence <= 0.30);
    assert!(primary.cadences.is_empty());
}

#[tokio::test]
async fn pathological_progression_is_low_confidence_not_an_error() {
    let result = analyze(&["C", "F#", "Bb", "E"], None).await;
    assert_invariants(&result);
    assert!(
        result.primary_analysis.confidence <= 0.501,
        "got {}",
        result.primary_analysis.confidence
    );
}

#[tokio::test]
async fn enharmonic_spellings_read_identically() {
    let sharp = analyze(&["C#", "F#", "G#", "C#"], None).await;
    let flat = analyze(&["Db", "Gb", "Ab", "Db"], None).await;

    assert_eq!(
        sharp.primary_analysis.roman_numerals,
        flat.primary_analysis.roman_numerals
    );
    assert_eq!(sharp.primary_analysis.key, flat.primary_analysis.key);
    assert_eq!(sharp.primary_analysis.key, "Db major");
    assert_eq!(
        sharp.primary_analysis.confidence,
        flat.primary_analysis.confidence
    );
}

#[tokio::test]
async fn deterministic_across_fresh_engines() {
    let first = analyze(&["C", "Am", "F", "G"], Some("C major")).await;
    let second = analyze(&["C", "Am", "F", "G"], Some("C major")).await;
    assert_eq!(first.primary_analysis, second.primary_analysis);
    assert_eq!(first.alternative_analyses, second.alternative_analyses);
}

#[tokio::test]
async fn repeat_requests_hit_the_cache() {
    let engine = HarmonyEngine::new();
    let options = AnalysisOptions::default();
    let first = engine
        .analyze_chord_progression(&["C", "F", "G", "C"], &options)
        .await
        .unwrap();
    let second = engine
        .analyze_chord_progression(&["C", "F", "G", "C"], &options)
        .await
        .unwrap();
    // A hit returns the stored result verbatim, timing included.
    assert_eq!(first, second);
}

#[tokio::test]
async fn beginner_threshold_hides_weak_alternatives() {
    let engine = HarmonyEngine::new();
    let options = AnalysisOptions {
        pedagogical_level: PedagogicalLevel::Beginner,
        ..Default::default()
    };
    let result = engine
        .analyze_chord_progression(&["C", "F", "C"], &options)
        .await
        .unwrap();
    assert_eq!(result.metadata.confidence_threshold, 0.70);
    assert!(result.alternative_analyses.is_empty());
}

#[tokio::test]
async fn max_alternatives_is_honored() {
    let engine = HarmonyEngine::new();
    let options = AnalysisOptions {
        parent_key: Some("C major".into()),
        max_alternatives: Some(0),
        ..Default::default()
    };
    let result = engine
        .analyze_chord_progression(&["G", "F", "C", "G"], &options)
        .await
        .unwrap();
    assert!(result.alternative_analyses.is_empty());
}

#[tokio::test]
async fn applying_a_suggested_key_does_not_hurt() {
    let without = analyze(&["Dm7", "G7", "Cmaj7"], None).await;
    let suggestion = without
        .suggestions
        .as_ref()
        .and_then(|s| s.suggestions.first())
        .expect("add-key suggestion expected");
    let key = suggestion.suggested_key.clone().unwrap();

    let with = analyze(&["Dm7", "G7", "Cmaj7"], Some(&key)).await;
    assert!(
        with.primary_analysis.confidence >= without.primary_analysis.confidence - 0.05,
        "suggested key {} degraded the analysis",
        key
    );
}

#[tokio::test]
async fn comprehensive_entry_splits_on_whitespace() {
    let engine = HarmonyEngine::new();
    let result = engine
        .analyze_comprehensively("Dm G C", None)
        .await
        .unwrap();
    assert_eq!(result.input_chords, vec!["Dm", "G", "C"]);
    assert_eq!(result.primary_analysis.roman_numerals, vec!["ii", "V", "I"]);
}

#[tokio::test]
async fn conflicting_parent_key_reported_honestly() {
    let result = analyze(&["G", "F", "C", "G"], Some("F# major")).await;
    // The engine keeps the caller's key and reports the conflict instead of
    // silently substituting one.
    let modal = result
        .alternative_analyses
        .iter()
        .map(|a| &a.interpretation)
        .chain(std::iter::once(&result.primary_analysis))
        .find(|i| i.kind == InterpretationType::Modal);
    if let Some(modal) = modal {
        assert_eq!(
            modal.parent_key_relationship,
            harmony_understand::KeyRelationship::Conflicts
        );
    }
}
