//! Bidirectional key suggestions.
//!
//! Compares the analysis under the provided key, without any key, and under
//! closely related candidate keys, then applies one decision: add a key,
//! remove the provided key, change to a better one, or stay silent. At most
//! one suggestion kind is ever emitted per request.

use std::future::Future;
use std::pin::Pin;

use chord_symbol::{Key, Mode, Note};
use futures::future::join_all;
use tracing::debug;

use crate::error::AnalysisError;
use crate::types::{
    AnalysisOptions, CadenceType, Interpretation, InterpretationType, KeySuggestion,
    MultipleInterpretationResult, SuggestionKind, Suggestions,
};
use crate::HarmonyEngine;

/// Boxes a recursive call into `HarmonyEngine::analyze_internal` behind an
/// explicit `+ Send` trait object, breaking the cyclic auto-trait
/// computation that `suggest::generate` and `analyze_internal` would
/// otherwise form by awaiting each other.
fn boxed_analysis<'a>(
    engine: &'a HarmonyEngine,
    chords: &'a [String],
    options: &'a AnalysisOptions,
    run_suggestions: bool,
) -> Pin<Box<dyn Future<Output = Result<MultipleInterpretationResult, AnalysisError>> + Send + 'a>>
{
    Box::pin(engine.analyze_internal(chords, options, run_suggestions))
}

/// Minimum relevance for an add-key suggestion, and the floor of every
/// emitted suggestion's confidence.
const RELEVANCE_GATE: f64 = 0.55;

/// Margin a candidate key must clear over the provided key to justify a
/// change suggestion.
const CHANGE_MARGIN: f64 = 0.15;

pub(crate) async fn generate(
    engine: &HarmonyEngine,
    chords: &[String],
    provided_key: Option<&str>,
) -> Result<Suggestions, AnalysisError> {
    let no_key_opts = AnalysisOptions::default();
    let without_key = boxed_analysis(engine, chords, &no_key_opts, false).await?;

    match provided_key {
        Some(key_str) => {
            let key = Key::parse(key_str)
                .map_err(|_| AnalysisError::InvalidKey(key_str.to_string()))?;
            evaluate_provided(engine, chords, &key, &without_key).await
        }
        None => evaluate_missing(engine, chords, &without_key).await,
    }
}

async fn evaluate_missing(
    engine: &HarmonyEngine,
    chords: &[String],
    without_key: &MultipleInterpretationResult,
) -> Result<Suggestions, AnalysisError> {
    // Candidates: the key the analysis itself inferred, plus its neighbors.
    let Ok(inferred) = Key::parse(&without_key.primary_analysis.key) else {
        return Ok(Suggestions::default());
    };
    let mut candidates = vec![inferred.normalized()];
    candidates.extend(related_keys(&inferred));

    let analyses = join_all(candidates.iter().map(|candidate| {
        let opts = AnalysisOptions::with_parent_key(candidate.to_string());
        async move { boxed_analysis(engine, chords, &opts, false).await }
    }))
    .await;

    let mut scored: Vec<(Key, f64, MultipleInterpretationResult)> = Vec::new();
    for (candidate, analysis) in candidates.into_iter().zip(analyses) {
        let Ok(analysis) = analysis else { continue };
        let score = relevance(&analysis.primary_analysis, &without_key.primary_analysis);
        debug!(key = %candidate, score, "scored candidate key");
        // An added key must never make the analysis worse.
        let holds_up = analysis.primary_analysis.confidence
            >= without_key.primary_analysis.confidence - 0.05;
        if score > RELEVANCE_GATE && holds_up {
            scored.push((candidate, score, analysis));
        }
    }

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(3);

    let suggestions = scored
        .into_iter()
        .map(|(key, score, analysis)| KeySuggestion {
            kind: SuggestionKind::AddKey,
            suggested_key: Some(key.to_string()),
            reason: add_reason(&key, &analysis.primary_analysis),
            confidence: renormalize(score),
            expected_improvement: "anchors Roman numerals and pattern recognition in a confirmed key"
                .to_string(),
        })
        .collect();

    Ok(Suggestions { suggestions })
}

async fn evaluate_provided(
    engine: &HarmonyEngine,
    chords: &[String],
    provided: &Key,
    without_key: &MultipleInterpretationResult,
) -> Result<Suggestions, AnalysisError> {
    let provided_opts = AnalysisOptions::with_parent_key(provided.to_string());
    let with_key = boxed_analysis(engine, chords, &provided_opts, false).await?;

    let provided_score = relevance(&with_key.primary_analysis, &without_key.primary_analysis);

    // Row 1: the key hurts more than it helps.
    if quality(&with_key.primary_analysis) + 1e-9 < quality(&without_key.primary_analysis) {
        return Ok(Suggestions {
            suggestions: vec![KeySuggestion {
                kind: SuggestionKind::RemoveKey,
                suggested_key: None,
                reason: format!(
                    "{} does not improve the analysis of this progression",
                    provided
                ),
                confidence: renormalize(1.0 - provided_score),
                expected_improvement: "simplifies the analysis without losing information"
                    .to_string(),
            }],
        });
    }

    // Row 2: a related key does clearly better.
    let candidates = related_keys(provided);
    let analyses = join_all(candidates.iter().map(|candidate| {
        let opts = AnalysisOptions::with_parent_key(candidate.to_string());
        async move { boxed_analysis(engine, chords, &opts, false).await }
    }))
    .await;

    let mut best: Option<(Key, f64)> = None;
    for (candidate, analysis) in candidates.into_iter().zip(analyses) {
        let Ok(analysis) = analysis else { continue };
        let score = relevance(&analysis.primary_analysis, &without_key.primary_analysis);
        if best.as_ref().map(|(_, s)| score > *s).unwrap_or(true) {
            best = Some((candidate, score));
        }
    }

    if let Some((candidate, score)) = best {
        if score > provided_score + CHANGE_MARGIN {
            return Ok(Suggestions {
                suggestions: vec![KeySuggestion {
                    kind: SuggestionKind::ChangeKey,
                    suggested_key: Some(candidate.to_string()),
                    reason: format!("{} provides a clearer analysis than {}", candidate, provided),
                    confidence: renormalize(score),
                    expected_improvement: "improves pattern recognition and harmonic clarity"
                        .to_string(),
                }],
            });
        }
    }

    // Row 3: the provided key is already optimal.
    Ok(Suggestions::default())
}

/// Key-relevance of an analysis under a candidate key, against the key-less
/// baseline: Roman-numeral availability (0.3), confidence improvement
/// (0.2), analysis-type improvement (0.2), pattern clarity (0.3).
fn relevance(with_key: &Interpretation, without_key: &Interpretation) -> f64 {
    let roman_score = if with_key.roman_numerals.is_empty() { 0.0 } else { 1.0 };

    let confidence_score =
        ((with_key.confidence - without_key.confidence) * 2.0).clamp(0.0, 1.0);

    let type_score = match (without_key.kind, with_key.kind) {
        (InterpretationType::Modal, InterpretationType::Functional) => 0.8,
        (InterpretationType::Functional, InterpretationType::Functional) => 0.4,
        _ => 0.2,
    };

    let pattern_score = if has_strong_pattern(with_key) { 1.0 } else { 0.0 };

    0.3 * roman_score + 0.2 * confidence_score + 0.2 * type_score + 0.3 * pattern_score
}

/// Flat quality score of one analysis, used for the remove-key comparison.
fn quality(interp: &Interpretation) -> f64 {
    let mut q = interp.confidence;
    if !interp.roman_numerals.is_empty() {
        q += 0.15;
    }
    if has_strong_pattern(interp) {
        q += 0.15;
    }
    q
}

fn has_strong_pattern(interp: &Interpretation) -> bool {
    interp
        .evidence
        .iter()
        .any(|e| e.description.starts_with("classic functional pattern"))
}

fn has_authentic_cadence(interp: &Interpretation) -> bool {
    interp
        .cadences
        .iter()
        .any(|c| c.kind == CadenceType::Authentic)
}

/// Map a [0, 1] relevance score onto the suggestion-confidence band
/// [0.55, 1.0].
fn renormalize(score: f64) -> f64 {
    (0.55 + score.clamp(0.0, 1.0) * 0.45).min(1.0)
}

/// The closest related keys: a fifth up and down, the relative, and the
/// parallel key.
pub(crate) fn related_keys(key: &Key) -> Vec<Key> {
    let tonic_pc = key.tonic.pitch_class();
    let minor = key.is_minor();
    let mode = if minor { Mode::Minor } else { Mode::Major };

    let fifth_up = Key::new(Note::from_pitch_class((tonic_pc + 7) % 12), mode);
    let fifth_down = Key::new(Note::from_pitch_class((tonic_pc + 5) % 12), mode);
    let relative = if minor {
        Key::major(Note::from_pitch_class((tonic_pc + 3) % 12))
    } else {
        Key::minor(Note::from_pitch_class((tonic_pc + 9) % 12))
    };
    let parallel = if minor {
        Key::major(Note::from_pitch_class(tonic_pc))
    } else {
        Key::minor(Note::from_pitch_class(tonic_pc))
    };

    vec![fifth_up, fifth_down, relative, parallel]
}

fn add_reason(key: &Key, interp: &Interpretation) -> String {
    if has_strong_pattern(interp) {
        format!("{} reveals a classic functional pattern", key)
    } else if has_authentic_cadence(interp) {
        format!("{} anchors the cadential motion", key)
    } else {
        format!("{} makes Roman-numeral analysis available", key)
    }
}
