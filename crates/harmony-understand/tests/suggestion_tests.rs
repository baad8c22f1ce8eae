//! Bidirectional key-suggestion behavior: the decision table emits at most
//! one suggestion kind per request.

use harmony_understand::{AnalysisError, HarmonyEngine, SuggestionKind};

#[tokio::test]
async fn add_key_for_clear_cadence_without_key() {
    let engine = HarmonyEngine::new();
    let suggestions = engine
        .suggest_keys(&["Dm7", "G7", "Cmaj7"], None)
        .await
        .unwrap();

    assert!(!suggestions.is_empty());
    let first = &suggestions.suggestions[0];
    assert_eq!(first.kind, SuggestionKind::AddKey);
    assert_eq!(first.suggested_key.as_deref(), Some("C major"));
    assert!(first.confidence >= 0.70);
}

#[tokio::test]
async fn no_suggestion_when_provided_key_is_optimal() {
    let engine = HarmonyEngine::new();
    let suggestions = engine
        .suggest_keys(&["C", "F", "G", "C"], Some("C major"))
        .await
        .unwrap();
    assert!(suggestions.is_empty());
}

#[tokio::test]
async fn remove_key_when_it_only_confuses() {
    let engine = HarmonyEngine::new();
    let suggestions = engine
        .suggest_keys(&["C", "F", "G", "C"], Some("F# major"))
        .await
        .unwrap();

    assert_eq!(suggestions.suggestions.len(), 1);
    let suggestion = &suggestions.suggestions[0];
    assert_eq!(suggestion.kind, SuggestionKind::RemoveKey);
    assert!(suggestion.suggested_key.is_none());
    assert!(suggestion.confidence >= 0.55);
}

#[tokio::test]
async fn single_suggestion_kind_per_request() {
    let engine = HarmonyEngine::new();
    for (chords, key) in [
        (vec!["Dm7", "G7", "Cmaj7"], None),
        (vec!["C", "F", "G", "C"], Some("F# major")),
        (vec!["G", "F", "C", "G"], Some("C major")),
    ] {
        let suggestions = engine.suggest_keys(&chords, key).await.unwrap();
        let mut kinds: Vec<SuggestionKind> =
            suggestions.suggestions.iter().map(|s| s.kind).collect();
        kinds.dedup();
        assert!(
            kinds.len() <= 1,
            "mixed suggestion kinds for {:?}: {:?}",
            chords,
            kinds
        );
    }
}

#[tokio::test]
async fn all_suggestion_confidences_in_band() {
    let engine = HarmonyEngine::new();
    let suggestions = engine
        .suggest_keys(&["Dm7", "G7", "Cmaj7"], None)
        .await
        .unwrap();
    for suggestion in &suggestions.suggestions {
        assert!(
            (0.55..=1.0).contains(&suggestion.confidence),
            "got {}",
            suggestion.confidence
        );
        assert!(!suggestion.reason.is_empty());
        assert!(!suggestion.expected_improvement.is_empty());
    }
}

#[tokio::test]
async fn empty_input_rejected() {
    let engine = HarmonyEngine::new();
    let err = engine.suggest_keys::<&str>(&[], None).await.unwrap_err();
    assert_eq!(err, AnalysisError::EmptyProgression);
}

#[tokio::test]
async fn invalid_current_key_rejected() {
    let engine = HarmonyEngine::new();
    let err = engine
        .suggest_keys(&["C", "G"], Some("Q minor"))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidKey(_)));
}
