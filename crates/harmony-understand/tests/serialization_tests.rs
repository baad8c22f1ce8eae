//! Results serialize to a self-describing structured form with the field
//! names collaborators assert on.

use harmony_understand::{AnalysisOptions, HarmonyEngine};
use serde_json::Value;

async fn analyze_json(chords: &[&str], parent_key: Option<&str>) -> Value {
    let engine = HarmonyEngine::new();
    let options = AnalysisOptions {
        parent_key: parent_key.map(str::to_string),
        ..Default::default()
    };
    let result = engine
        .analyze_chord_progression(chords, &options)
        .await
        .unwrap();
    serde_json::to_value(result).unwrap()
}

#[tokio::test]
async fn top_level_result_fields() {
    let json = analyze_json(&["C", "F", "G", "C"], None).await;

    assert!(json.get("primary_analysis").is_some());
    assert!(json.get("alternative_analyses").is_some());
    assert!(json.get("metadata").is_some());
    assert_eq!(json["input_chords"][0], "C");

    let metadata = &json["metadata"];
    assert!(metadata.get("analysis_time_ms").is_some());
    assert!(metadata.get("interpretations_considered").is_some());
    assert_eq!(metadata["confidence_threshold"], 0.5);
    assert_eq!(metadata["pedagogical_level"], "intermediate");
}

#[tokio::test]
async fn interpretation_fields_are_snake_case() {
    let json = analyze_json(&["G", "F", "C", "G"], Some("C major")).await;
    let primary = &json["primary_analysis"];

    assert_eq!(primary["type"], "modal");
    assert_eq!(primary["mode"], "G Mixolydian");
    assert_eq!(primary["contextual_classification"], "modal_borrowing");
    assert_eq!(primary["parent_key_relationship"], "matches");
    assert!(primary["confidence"].is_number());
    assert!(primary["roman_numerals"].is_array());
    assert!(primary["evidence"].is_array());
    assert!(primary["modal_characteristics"].is_array());
    assert!(primary["confidence_breakdown"].get("functional").is_some());
}

#[tokio::test]
async fn evidence_fields() {
    let json = analyze_json(&["Dm", "G", "C"], None).await;
    let evidence = json["primary_analysis"]["evidence"]
        .as_array()
        .expect("evidence array");
    assert!(!evidence.is_empty());
    for piece in evidence {
        assert!(piece.get("kind").is_some());
        assert!(piece["strength"].as_f64().unwrap() <= 1.0);
        assert!(piece.get("description").is_some());
        assert!(piece.get("musical_basis").is_some());
        assert!(!piece["supports"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn alternatives_carry_relationship_and_flattened_fields() {
    let json = analyze_json(&["G", "F", "C", "G"], Some("C major")).await;
    let alternatives = json["alternative_analyses"].as_array().unwrap();
    for alt in alternatives {
        assert!(alt.get("relationship_to_primary").is_some());
        // Flattened interpretation fields sit beside it.
        assert!(alt.get("type").is_some());
        assert!(alt.get("confidence").is_some());
    }
}

#[tokio::test]
async fn suggestions_serialize_with_kind_tags() {
    let json = analyze_json(&["Dm7", "G7", "Cmaj7"], None).await;
    let suggestions = json["suggestions"]["suggestions"].as_array().unwrap();
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0]["kind"], "add_key");
    assert_eq!(suggestions[0]["suggested_key"], "C major");
}

#[tokio::test]
async fn secondary_dominants_serialize() {
    let json = analyze_json(&["C", "A7", "Dm", "G7", "C"], Some("C major")).await;
    let dominants = json["primary_analysis"]["secondary_dominants"]
        .as_array()
        .unwrap();
    assert_eq!(dominants[0]["chord"], "A7");
    assert_eq!(dominants[0]["target"], "Dm");
    assert_eq!(dominants[0]["roman_numeral"], "V7/ii");
}

#[tokio::test]
async fn scale_and_melody_results_serialize() {
    let engine = HarmonyEngine::new();
    let options = AnalysisOptions::default();

    let scale = engine
        .analyze_scale(&["C", "D", "E", "F", "G", "A", "B"], &options)
        .await
        .unwrap();
    let scale_json = serde_json::to_value(&scale).unwrap();
    assert_eq!(scale_json["classification"], "diatonic");
    assert!(scale_json["parent_scales"]
        .as_array()
        .unwrap()
        .contains(&Value::String("C major".into())));

    let melody = engine
        .analyze_melody(&["C", "D", "E", "D", "C"], &options)
        .await
        .unwrap();
    let melody_json = serde_json::to_value(&melody).unwrap();
    assert_eq!(melody_json["suggested_tonic"], "C");
    assert!(melody_json["tonic_confidence"].as_f64().unwrap() > 0.5);
    // Flattened scale fields are present on the melody result too.
    assert!(melody_json.get("parent_scales").is_some());
}
