//! Tonal harmony analysis engine.
//!
//! Takes a chord progression (or a scale / melody) and produces one or more
//! ranked analytical interpretations with calibrated confidence, supporting
//! evidence, and key suggestions. Three analyzers run concurrently per
//! request: functional (Roman numerals, cadences), modal (local tonic,
//! parent key, characteristic degrees), and chromatic (secondary dominants,
//! borrowed chords, mediants). The interpretation service reconciles their
//! facts into weighted evidence and calibrated confidence.
//!
//! ```no_run
//! use harmony_understand::{AnalysisOptions, HarmonyEngine};
//!
//! # async fn demo() -> Result<(), harmony_understand::AnalysisError> {
//! let engine = HarmonyEngine::new();
//! let result = engine
//!     .analyze_chord_progression(&["C", "F", "G", "C"], &AnalysisOptions::default())
//!     .await?;
//! println!(
//!     "{} ({:.2})",
//!     result.primary_analysis.summary, result.primary_analysis.confidence
//! );
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod chromatic;
pub mod error;
pub mod evidence;
pub mod functional;
pub mod modal;
pub mod scale_melody;
pub mod suggest;
pub mod types;

use std::time::Instant;

use chord_symbol::{Chord, Key, Note};
use tracing::debug;

use cache::AnalysisCache;
use chromatic::ChromaticAnalysis;
use functional::FunctionalAnalysis;
use modal::ModalAnalysis;

pub use error::AnalysisError;
pub use types::{
    Alternative, AnalysisMetadata, AnalysisOptions, BorrowedChord, Cadence, CadenceType,
    ChordFunction, ChromaticMediant, ComprehensiveResult, ConfidenceBreakdown, ContextualClass,
    Evidence, EvidenceType, Interpretation, InterpretationType, KeyRelationship, KeySuggestion,
    MelodyAnalysisResult, MultipleInterpretationResult, PedagogicalLevel, RomanNumeral,
    ScaleAnalysisResult, SecondaryDominant, SuggestionKind, Suggestions,
};

/// Lifecycle of one interpretation slot inside the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Parsed,
    Analyzed,
    EvidenceCollected,
    Scored,
    Displayed,
    Suppressed,
}

fn slot_index(kind: InterpretationType) -> usize {
    match kind {
        InterpretationType::Functional => 0,
        InterpretationType::Modal => 1,
        InterpretationType::Chromatic => 2,
    }
}

fn advance(kind: InterpretationType, from: &mut SlotState, to: SlotState) {
    debug!(?kind, from = ?*from, to = ?to, "interpretation state");
    *from = to;
}

fn advance_all(slots: &mut [SlotState; 3], to: SlotState) {
    for kind in [
        InterpretationType::Functional,
        InterpretationType::Modal,
        InterpretationType::Chromatic,
    ] {
        advance(kind, &mut slots[slot_index(kind)], to);
    }
}

/// The analysis engine: a value holding its cache, no global state.
pub struct HarmonyEngine {
    cache: AnalysisCache,
}

impl Default for HarmonyEngine {
    fn default() -> Self {
        HarmonyEngine::new()
    }
}

impl HarmonyEngine {
    pub fn new() -> Self {
        HarmonyEngine {
            cache: AnalysisCache::default(),
        }
    }

    pub fn with_cache(cache: AnalysisCache) -> Self {
        HarmonyEngine { cache }
    }

    /// Analyze a chord progression into ranked interpretations.
    pub async fn analyze_chord_progression<S: AsRef<str>>(
        &self,
        chords: &[S],
        options: &AnalysisOptions,
    ) -> Result<MultipleInterpretationResult, AnalysisError> {
        let symbols: Vec<String> = chords.iter().map(|s| s.as_ref().to_string()).collect();
        self.analyze_internal(&symbols, options, true).await
    }

    /// Identify the parent scales containing a set of notes.
    pub async fn analyze_scale<S: AsRef<str>>(
        &self,
        notes: &[S],
        _options: &AnalysisOptions,
    ) -> Result<ScaleAnalysisResult, AnalysisError> {
        let parsed = parse_notes(notes)?;
        let analysis = scale_melody::analyze_scale(&parsed);
        let rationale = scale_melody::rationale(&analysis, None);
        Ok(ScaleAnalysisResult {
            notes: notes.iter().map(|n| n.as_ref().to_string()).collect(),
            parent_scales: analysis.parent_scales,
            modal_labels: analysis.modal_labels,
            classification: analysis.classification,
            rationale,
        })
    }

    /// Scale analysis plus tonic inference for an ordered melody.
    pub async fn analyze_melody<S: AsRef<str>>(
        &self,
        notes: &[S],
        _options: &AnalysisOptions,
    ) -> Result<MelodyAnalysisResult, AnalysisError> {
        let parsed = parse_notes(notes)?;
        let analysis = scale_melody::analyze_scale(&parsed);
        let (tonic, confidence) = scale_melody::infer_melody_tonic(&parsed);
        let rationale = scale_melody::rationale(&analysis, tonic.as_ref());
        Ok(MelodyAnalysisResult {
            scale: ScaleAnalysisResult {
                notes: notes.iter().map(|n| n.as_ref().to_string()).collect(),
                parent_scales: analysis.parent_scales,
                modal_labels: analysis.modal_labels,
                classification: analysis.classification,
                rationale,
            },
            suggested_tonic: tonic.map(|t| t.to_string()),
            tonic_confidence: confidence,
        })
    }

    /// Whitespace-separated convenience form of
    /// [`analyze_chord_progression`](Self::analyze_chord_progression).
    pub async fn analyze_comprehensively(
        &self,
        progression: &str,
        parent_key: Option<&str>,
    ) -> Result<MultipleInterpretationResult, AnalysisError> {
        let symbols: Vec<String> = progression
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let options = AnalysisOptions {
            parent_key: parent_key.map(str::to_string),
            ..Default::default()
        };
        self.analyze_internal(&symbols, &options, true).await
    }

    /// Suggest adding, removing, or changing the parent key.
    pub async fn suggest_keys<S: AsRef<str>>(
        &self,
        chords: &[S],
        current_key: Option<&str>,
    ) -> Result<Suggestions, AnalysisError> {
        let symbols: Vec<String> = chords.iter().map(|s| s.as_ref().to_string()).collect();
        if symbols.is_empty() {
            return Err(AnalysisError::EmptyProgression);
        }
        suggest::generate(self, &symbols, current_key).await
    }

    pub(crate) async fn analyze_internal(
        &self,
        chords: &[String],
        options: &AnalysisOptions,
        run_suggestions: bool,
    ) -> Result<MultipleInterpretationResult, AnalysisError> {
        if chords.is_empty() {
            return Err(AnalysisError::EmptyProgression);
        }

        let started = Instant::now();

        // Validate the key up front: an unparsable key must never alias the
        // key-less fingerprint.
        let parent_key = match options.parent_key.as_deref() {
            Some(text) => Some(
                Key::parse(text).map_err(|_| AnalysisError::InvalidKey(text.to_string()))?,
            ),
            None => None,
        };

        let fingerprint = cache::fingerprint(chords, options, run_suggestions);
        if let Some(hit) = self.cache.get(&fingerprint) {
            debug!(fingerprint = fingerprint.as_str(), "analysis cache hit");
            return Ok(hit);
        }

        let parsed = parse_chords(chords)?;

        let mut slots = [SlotState::Parsed; 3];

        // The three analyzers are logically concurrent: each is a pure
        // function of the parsed chords, so any interleaving is equivalent.
        let (functional, modal, chromatic) = tokio::join!(
            async { functional::analyze_functionally(&parsed, parent_key.as_ref()) },
            async { modal::analyze_modal(&parsed, parent_key.as_ref()) },
            async {
                let key = parent_key.unwrap_or_else(|| functional::infer_key(&parsed));
                chromatic::analyze_chromatic(&parsed, &key)
            },
        );
        advance_all(&mut slots, SlotState::Analyzed);

        let functional_evidence = evidence::functional_evidence(&parsed, &functional);
        let modal_evidence = modal.as_ref().map(|m| evidence::modal_evidence(m));
        let chromatic_evidence = evidence::chromatic_evidence(&chromatic);
        advance_all(&mut slots, SlotState::EvidenceCollected);

        let functional_confidence = evidence::confidence_from(&functional_evidence);
        let modal_confidence = modal.as_ref().zip(modal_evidence.as_ref()).map(|(m, ev)| {
            evidence::confidence_from(ev).min(m.confidence_cap)
        });
        let chromatic_confidence = if chromatic.is_empty() {
            None
        } else {
            Some(evidence::confidence_from(&chromatic_evidence))
        };
        advance_all(&mut slots, SlotState::Scored);

        let breakdown = ConfidenceBreakdown {
            functional: Some(functional_confidence),
            modal: modal_confidence,
            chromatic: chromatic_confidence,
        };

        let mut interpretations = vec![build_functional_interpretation(
            &functional,
            functional_evidence,
            functional_confidence,
            &chromatic,
            modal.as_ref(),
            parent_key.as_ref(),
            breakdown,
        )];
        if let (Some(m), Some(ev), Some(conf)) = (&modal, modal_evidence, modal_confidence) {
            interpretations.push(build_modal_interpretation(m, ev, conf, &chromatic, breakdown));
        }
        if let Some(conf) = chromatic_confidence {
            interpretations.push(build_chromatic_interpretation(
                &functional,
                &chromatic,
                chromatic_evidence,
                conf,
                parent_key.as_ref(),
                modal.as_ref(),
                breakdown,
            ));
        }
        let considered = interpretations.len();

        rank_interpretations(&mut interpretations, parent_key.as_ref());

        let threshold = options.effective_threshold();
        let primary = interpretations.remove(0);
        advance(primary.kind, &mut slots[slot_index(primary.kind)], SlotState::Displayed);

        let mut alternatives = Vec::new();
        for mut interp in interpretations {
            let slot = &mut slots[slot_index(interp.kind)];
            if interp.confidence >= threshold {
                // Presentation invariant: the primary outranks every shown
                // alternative.
                interp.confidence = interp.confidence.min(primary.confidence);
                let relationship = relationship_to_primary(&primary, &interp);
                advance(interp.kind, slot, SlotState::Displayed);
                alternatives.push(Alternative {
                    interpretation: interp,
                    relationship_to_primary: relationship,
                });
            } else {
                advance(interp.kind, slot, SlotState::Suppressed);
            }
        }
        alternatives.truncate(options.effective_max_alternatives());

        let suggestions = if run_suggestions {
            // Boxed: the suggestion engine re-enters analysis under
            // counterfactual keys.
            let fut: std::pin::Pin<
                Box<
                    dyn std::future::Future<Output = Result<Suggestions, AnalysisError>>
                        + Send
                        + '_,
                >,
            > = Box::pin(suggest::generate(self, chords, options.parent_key.as_deref()));
            let generated = fut.await?;
            if generated.is_empty() {
                None
            } else {
                Some(generated)
            }
        } else {
            None
        };

        let result = MultipleInterpretationResult {
            input_chords: chords.to_vec(),
            parent_key: options.parent_key.clone(),
            primary_analysis: primary,
            alternative_analyses: alternatives,
            suggestions,
            metadata: AnalysisMetadata {
                analysis_time_ms: started.elapsed().as_secs_f64() * 1000.0,
                interpretations_considered: considered,
                confidence_threshold: threshold,
                pedagogical_level: options.pedagogical_level,
            },
        };

        for interp in std::iter::once(&result.primary_analysis)
            .chain(result.alternative_analyses.iter().map(|a| &a.interpretation))
        {
            if !(0.0..=1.0).contains(&interp.confidence) {
                return Err(AnalysisError::Inconsistency(format!(
                    "{:?} confidence {} out of range",
                    interp.kind, interp.confidence
                )));
            }
        }

        self.cache.put(fingerprint, result.clone());
        Ok(result)
    }
}

fn parse_chords(symbols: &[String]) -> Result<Vec<Chord>, AnalysisError> {
    symbols
        .iter()
        .enumerate()
        .map(|(position, symbol)| {
            chord_symbol::parse(symbol).map_err(|_| AnalysisError::UnparsableChord {
                symbol: symbol.clone(),
                position,
            })
        })
        .collect()
}

fn parse_notes<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<Note>, AnalysisError> {
    if tokens.is_empty() {
        return Err(AnalysisError::EmptyProgression);
    }
    tokens
        .iter()
        .enumerate()
        .map(|(position, token)| {
            Note::parse(token.as_ref()).map_err(|_| AnalysisError::UnparsableNote {
                token: token.as_ref().to_string(),
                position,
            })
        })
        .collect()
}

fn fallback_classification(
    parent_key: Option<&Key>,
    diatonic_ratio: f64,
) -> ContextualClass {
    match parent_key {
        None => ContextualClass::ModalCandidate,
        Some(_) if diatonic_ratio >= 1.0 => ContextualClass::Diatonic,
        Some(_) => ContextualClass::ModalBorrowing,
    }
}

#[allow(clippy::too_many_arguments)]
fn build_functional_interpretation(
    functional: &FunctionalAnalysis,
    evidence: Vec<Evidence>,
    confidence: f64,
    chromatic: &ChromaticAnalysis,
    modal: Option<&ModalAnalysis>,
    parent_key: Option<&Key>,
    breakdown: ConfidenceBreakdown,
) -> Interpretation {
    let romans: Vec<String> = functional.romans.iter().map(|r| r.text.clone()).collect();
    let summary = format!(
        "Functional progression in {}: {}",
        functional.key,
        romans.join(" - ")
    );

    let classification = modal
        .map(|m| m.classification)
        .unwrap_or_else(|| fallback_classification(parent_key, functional.diatonic_ratio));

    Interpretation {
        kind: InterpretationType::Functional,
        confidence,
        summary,
        roman_numerals: romans,
        key: functional.key.to_string(),
        mode: None,
        cadences: functional.cadences.clone(),
        evidence,
        chord_functions: functional.functions.clone(),
        modal_characteristics: Vec::new(),
        secondary_dominants: chromatic.secondary_dominants.clone(),
        borrowed_chords: chromatic.borrowed_chords.clone(),
        chromatic_mediants: chromatic.chromatic_mediants.clone(),
        contextual_classification: classification,
        parent_key_relationship: if parent_key.is_some() {
            KeyRelationship::Matches
        } else {
            KeyRelationship::None
        },
        confidence_breakdown: breakdown,
    }
}

fn build_modal_interpretation(
    modal: &ModalAnalysis,
    evidence: Vec<Evidence>,
    confidence: f64,
    chromatic: &ChromaticAnalysis,
    breakdown: ConfidenceBreakdown,
) -> Interpretation {
    Interpretation {
        kind: InterpretationType::Modal,
        confidence,
        summary: format!("{} modal progression", modal.mode_name),
        roman_numerals: modal.romans.clone(),
        key: modal.parent_key.to_string(),
        mode: Some(modal.mode_name.clone()),
        cadences: Vec::new(),
        evidence,
        chord_functions: Vec::new(),
        modal_characteristics: modal.characteristics.clone(),
        secondary_dominants: chromatic.secondary_dominants.clone(),
        borrowed_chords: chromatic.borrowed_chords.clone(),
        chromatic_mediants: chromatic.chromatic_mediants.clone(),
        contextual_classification: modal.classification,
        parent_key_relationship: modal.relationship,
        confidence_breakdown: breakdown,
    }
}

#[allow(clippy::too_many_arguments)]
fn build_chromatic_interpretation(
    functional: &FunctionalAnalysis,
    chromatic: &ChromaticAnalysis,
    evidence: Vec<Evidence>,
    confidence: f64,
    parent_key: Option<&Key>,
    modal: Option<&ModalAnalysis>,
    breakdown: ConfidenceBreakdown,
) -> Interpretation {
    let mut parts = Vec::new();
    if !chromatic.secondary_dominants.is_empty() {
        parts.push(format!(
            "{} secondary dominant(s)",
            chromatic.secondary_dominants.len()
        ));
    }
    if !chromatic.borrowed_chords.is_empty() {
        parts.push(format!("{} borrowed chord(s)", chromatic.borrowed_chords.len()));
    }
    if !chromatic.chromatic_mediants.is_empty() {
        parts.push(format!(
            "{} chromatic mediant(s)",
            chromatic.chromatic_mediants.len()
        ));
    }

    let classification = modal
        .map(|m| m.classification)
        .unwrap_or_else(|| fallback_classification(parent_key, functional.diatonic_ratio));

    Interpretation {
        kind: InterpretationType::Chromatic,
        confidence,
        summary: format!(
            "Chromatic harmony in {}: {}",
            functional.key,
            parts.join(", ")
        ),
        roman_numerals: functional.romans.iter().map(|r| r.text.clone()).collect(),
        key: functional.key.to_string(),
        mode: None,
        cadences: functional.cadences.clone(),
        evidence,
        chord_functions: functional.functions.clone(),
        modal_characteristics: Vec::new(),
        secondary_dominants: chromatic.secondary_dominants.clone(),
        borrowed_chords: chromatic.borrowed_chords.clone(),
        chromatic_mediants: chromatic.chromatic_mediants.clone(),
        contextual_classification: classification,
        parent_key_relationship: if parent_key.is_some() {
            KeyRelationship::Matches
        } else {
            KeyRelationship::None
        },
        confidence_breakdown: breakdown,
    }
}

/// Sort by confidence; when the functional and modal readings land within
/// 0.05 of each other, prefer the one consistent with the supplied parent
/// key, defaulting to functional.
fn rank_interpretations(interpretations: &mut [Interpretation], parent_key: Option<&Key>) {
    interpretations.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if interpretations.len() >= 2 {
        let close = (interpretations[0].confidence - interpretations[1].confidence).abs() <= 0.05;
        let pair_is_func_modal = matches!(
            (interpretations[0].kind, interpretations[1].kind),
            (InterpretationType::Modal, InterpretationType::Functional)
                | (InterpretationType::Functional, InterpretationType::Modal)
        );
        if close && pair_is_func_modal && interpretations[0].kind == InterpretationType::Modal {
            // Within the tie band, modal keeps the lead only when the
            // supplied key is confirmed as its parent collection.
            let modal_consistent = parent_key.is_some()
                && interpretations[0].parent_key_relationship == KeyRelationship::Matches
                && interpretations[0].mode.is_some();
            if !modal_consistent {
                interpretations.swap(0, 1);
            }
        }
    }
}

fn tonal_center(interp: &Interpretation) -> Option<u8> {
    match interp.kind {
        InterpretationType::Modal => interp
            .mode
            .as_deref()
            .and_then(|m| m.split_whitespace().next())
            .and_then(|tonic| Note::parse(tonic).ok())
            .map(|n| n.pitch_class()),
        _ => interp
            .key
            .split_whitespace()
            .next()
            .and_then(|tonic| Note::parse(tonic).ok())
            .map(|n| n.pitch_class()),
    }
}

fn relationship_to_primary(primary: &Interpretation, alternative: &Interpretation) -> String {
    if tonal_center(primary) != tonal_center(alternative) {
        return "reinterpretation".to_string();
    }
    match (primary.kind, alternative.kind) {
        (InterpretationType::Functional, InterpretationType::Modal) => "modal reading".to_string(),
        (InterpretationType::Modal, InterpretationType::Functional) => {
            "functional reading".to_string()
        }
        _ => "alternative lens".to_string(),
    }
}
