//! Result types shared across the analyzers and the interpretation service.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpretationType {
    Functional,
    Modal,
    Chromatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PedagogicalLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl PedagogicalLevel {
    /// Default display threshold for alternatives at this level.
    pub fn default_threshold(self) -> f64 {
        match self {
            PedagogicalLevel::Beginner => 0.70,
            PedagogicalLevel::Intermediate => 0.50,
            PedagogicalLevel::Advanced => 0.40,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    Cadential,
    Structural,
    Intervallic,
    Harmonic,
    Contextual,
}

impl EvidenceType {
    /// Evidence weighting by theoretical importance.
    pub fn weight(self) -> f64 {
        match self {
            EvidenceType::Cadential => 0.4,
            EvidenceType::Structural => 0.25,
            EvidenceType::Intervallic => 0.2,
            EvidenceType::Harmonic => 0.15,
            EvidenceType::Contextual => 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CadenceType {
    Authentic,
    Plagal,
    Deceptive,
    Half,
    Phrygian,
    Modal,
}

impl CadenceType {
    /// Intrinsic cadence strength. Every calibration target traces back to
    /// this one table.
    pub fn strength(self) -> f64 {
        match self {
            CadenceType::Authentic => 0.9,
            CadenceType::Plagal => 0.65,
            CadenceType::Deceptive => 0.7,
            CadenceType::Half => 0.5,
            CadenceType::Phrygian => 0.8,
            CadenceType::Modal => 0.75,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CadenceType::Authentic => "authentic",
            CadenceType::Plagal => "plagal",
            CadenceType::Deceptive => "deceptive",
            CadenceType::Half => "half",
            CadenceType::Phrygian => "phrygian",
            CadenceType::Modal => "modal",
        }
    }
}

/// A detected cadence spanning two adjacent chords.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cadence {
    pub kind: CadenceType,
    pub start: usize,
    pub end: usize,
}

impl Cadence {
    pub fn strength(&self) -> f64 {
        self.kind.strength()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordFunction {
    Tonic,
    Predominant,
    Dominant,
    Chromatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextualClass {
    Diatonic,
    ModalBorrowing,
    ModalCandidate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRelationship {
    Matches,
    Conflicts,
    None,
}

/// A single theory-grounded fact with a weight, contributing to confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub kind: EvidenceType,
    /// 0.0 to 1.0
    pub strength: f64,
    pub supports: Vec<InterpretationType>,
    pub description: String,
    pub musical_basis: String,
}

/// Roman-numeral label for one chord.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RomanNumeral {
    /// Scale degree 1-7 of the (possibly altered) root.
    pub degree: u8,
    /// Full textual form, e.g. "V7", "bVII", "V7/ii", "I6".
    pub text: String,
    /// Target degree for applied chords such as V/ii.
    pub applied_to: Option<u8>,
    /// Inversion figure ("6", "64", "42") when a slash bass implies one.
    pub figure: Option<String>,
}

impl RomanNumeral {
    /// True for the tonic numeral I or i, ignoring figures and sevenths.
    pub fn is_tonic(&self) -> bool {
        self.degree == 1 && self.applied_to.is_none() && !self.text.starts_with('b')
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryDominant {
    pub chord: String,
    pub target: String,
    pub roman_numeral: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowedChord {
    pub chord: String,
    pub roman_numeral: String,
    pub borrowed_from: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromaticMediant {
    pub chord: String,
    pub relationship: String,
}

/// Per-lens confidences computed for the request.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    pub functional: Option<f64>,
    pub modal: Option<f64>,
    pub chromatic: Option<f64>,
}

/// One analytical reading of the progression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    #[serde(rename = "type")]
    pub kind: InterpretationType,
    pub confidence: f64,
    pub summary: String,
    /// Possibly empty: a pure modal reading carries no functional numerals.
    pub roman_numerals: Vec<String>,
    pub key: String,
    pub mode: Option<String>,
    pub cadences: Vec<Cadence>,
    pub evidence: Vec<Evidence>,
    pub chord_functions: Vec<ChordFunction>,
    pub modal_characteristics: Vec<String>,
    pub secondary_dominants: Vec<SecondaryDominant>,
    pub borrowed_chords: Vec<BorrowedChord>,
    pub chromatic_mediants: Vec<ChromaticMediant>,
    pub contextual_classification: ContextualClass,
    pub parent_key_relationship: KeyRelationship,
    pub confidence_breakdown: ConfidenceBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    #[serde(flatten)]
    pub interpretation: Interpretation,
    pub relationship_to_primary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub analysis_time_ms: f64,
    pub interpretations_considered: usize,
    pub confidence_threshold: f64,
    pub pedagogical_level: PedagogicalLevel,
}

/// Options accepted by every analysis entry point.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub parent_key: Option<String>,
    pub pedagogical_level: PedagogicalLevel,
    /// Overrides the pedagogical-level default when set.
    pub confidence_threshold: Option<f64>,
    /// Defaults to 2.
    pub max_alternatives: Option<usize>,
}

impl AnalysisOptions {
    pub fn with_parent_key(key: impl Into<String>) -> Self {
        AnalysisOptions {
            parent_key: Some(key.into()),
            ..Default::default()
        }
    }

    pub fn effective_threshold(&self) -> f64 {
        self.confidence_threshold
            .unwrap_or_else(|| self.pedagogical_level.default_threshold())
    }

    pub fn effective_max_alternatives(&self) -> usize {
        self.max_alternatives.unwrap_or(2)
    }
}

/// Complete result: the primary reading plus ranked alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleInterpretationResult {
    pub input_chords: Vec<String>,
    pub parent_key: Option<String>,
    pub primary_analysis: Interpretation,
    pub alternative_analyses: Vec<Alternative>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Suggestions>,
    pub metadata: AnalysisMetadata,
}

/// Result of the whitespace-splitting convenience entry point; identical in
/// shape to a progression analysis.
pub type ComprehensiveResult = MultipleInterpretationResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleAnalysisResult {
    pub notes: Vec<String>,
    pub parent_scales: Vec<String>,
    /// Tonic note name -> modal label, e.g. "G" -> "G Mixolydian".
    pub modal_labels: std::collections::BTreeMap<String, String>,
    pub classification: ContextualClass,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelodyAnalysisResult {
    #[serde(flatten)]
    pub scale: ScaleAnalysisResult,
    pub suggested_tonic: Option<String>,
    pub tonic_confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    AddKey,
    RemoveKey,
    ChangeKey,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySuggestion {
    pub kind: SuggestionKind,
    /// None for remove-key suggestions.
    pub suggested_key: Option<String>,
    pub reason: String,
    /// Confidence of the suggestion itself, in [0.55, 1.0].
    pub confidence: f64,
    pub expected_improvement: String,
}

/// At most one suggestion kind per request; the decision table is
/// exhaustive and mutually exclusive.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Suggestions {
    pub suggestions: Vec<KeySuggestion>,
}

impl Suggestions {
    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }
}
