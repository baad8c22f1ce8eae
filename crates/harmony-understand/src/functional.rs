//! Functional harmony analysis: key inference, Roman numerals, chord
//! functions, and cadence detection.
//!
//! The analyzer returns facts; the interpretation service turns them into
//! weighted evidence.

use chord_symbol::{Chord, ChordQuality, Key, Note, Seventh};

use crate::types::{Cadence, CadenceType, ChordFunction, RomanNumeral};

const MAJOR_DEGREES: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
const MINOR_DEGREES: [u8; 7] = [0, 2, 3, 5, 7, 8, 10];

const DEGREE_NUMERALS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

/// Classic progressions that establish tonality beyond doubt, with their
/// minor-key duals.
pub const STRONG_PATTERNS: &[&str] = &[
    "I-vi-IV-V",
    "I-V-vi-IV",
    "ii-V-I",
    "I-vi-ii-V",
    "vi-IV-I-V",
    "i-VI-iv-V",
    "i-v-VI-iv",
    "ii°-V-i",
    "i-VI-ii°-V",
    "VI-iv-i-v",
];

/// Facts extracted by functional analysis of a progression.
#[derive(Debug, Clone)]
pub struct FunctionalAnalysis {
    pub key: Key,
    pub key_inferred: bool,
    pub romans: Vec<RomanNumeral>,
    pub functions: Vec<ChordFunction>,
    pub cadences: Vec<Cadence>,
    /// Fraction of chords diatonic to the key.
    pub diatonic_ratio: f64,
    /// Strongest classic pattern matched by the numeral sequence, if any.
    pub pattern: Option<&'static str>,
    /// Raw analyzer confidence: diatonic fraction x strongest cadence.
    pub confidence: f64,
}

pub fn analyze_functionally(chords: &[Chord], parent_key: Option<&Key>) -> FunctionalAnalysis {
    let (key, key_inferred) = match parent_key {
        Some(k) => (*k, false),
        None => (infer_key(chords), true),
    };

    let romans: Vec<RomanNumeral> = chords.iter().map(|c| roman_for(c, &key)).collect();
    let functions: Vec<ChordFunction> = chords.iter().map(|c| function_for(c, &key)).collect();
    let cadences = detect_cadences(&romans);

    let diatonic_mask: Vec<bool> = chords.iter().map(|c| is_diatonic(c, &key)).collect();
    let diatonic = diatonic_mask.iter().filter(|&&d| d).count();
    let diatonic_ratio = if chords.is_empty() {
        0.0
    } else {
        diatonic as f64 / chords.len() as f64
    };

    let pattern = detect_strong_pattern(&romans, &diatonic_mask);
    let cadence_bonus = cadences
        .iter()
        .map(|c| c.strength())
        .fold(0.0_f64, f64::max);

    FunctionalAnalysis {
        key,
        key_inferred,
        romans,
        functions,
        cadences,
        diatonic_ratio,
        pattern,
        confidence: diatonic_ratio * cadence_bonus,
    }
}

/// Infer the most plausible key by scoring every major and minor key on how
/// many chords fit its diatonic set. First and last chords count double.
/// Ties prefer a key whose tonic is the final chord, then major over minor.
pub fn infer_key(chords: &[Chord]) -> Key {
    let last_root = chords.last().map(|c| c.root_pitch_class());
    let mut best: Option<(u32, bool, bool, Key)> = None;

    for pc in 0..12u8 {
        let tonic = Note::from_pitch_class(pc);
        for key in [Key::major(tonic), Key::minor(tonic)] {
            let mut score = 0u32;
            for (i, chord) in chords.iter().enumerate() {
                if is_diatonic(chord, &key) {
                    let weight = if i == 0 || i + 1 == chords.len() { 2 } else { 1 };
                    score += weight;
                }
            }
            let last_is_tonic = last_root == Some(pc);
            let candidate = (score, last_is_tonic, !key.is_minor(), key);
            let better = match &best {
                None => true,
                Some((s, lt, maj, _)) => {
                    (candidate.0, candidate.1, candidate.2) > (*s, *lt, *maj)
                }
            };
            if better {
                best = Some(candidate);
            }
        }
    }

    best.map(|(_, _, _, k)| k)
        .unwrap_or_else(|| Key::major(Note::from_pitch_class(0)))
}

fn degree_index(rel: u8, minor: bool) -> Option<usize> {
    let table = if minor { &MINOR_DEGREES } else { &MAJOR_DEGREES };
    table.iter().position(|&d| d == rel)
}

fn expected_quality(idx: usize, minor: bool) -> ChordQuality {
    if minor {
        [
            ChordQuality::Minor,
            ChordQuality::Diminished,
            ChordQuality::Major,
            ChordQuality::Minor,
            ChordQuality::Minor,
            ChordQuality::Major,
            ChordQuality::Major,
        ][idx]
    } else {
        [
            ChordQuality::Major,
            ChordQuality::Minor,
            ChordQuality::Minor,
            ChordQuality::Major,
            ChordQuality::Major,
            ChordQuality::Minor,
            ChordQuality::Diminished,
        ][idx]
    }
}

/// Whether the chord belongs to the key's diatonic set, taking quality into
/// account. A dominant seventh is diatonic only on the dominant degree.
/// In minor the dominant accepts a major triad (harmonic-minor V).
pub fn is_diatonic(chord: &Chord, key: &Key) -> bool {
    let rel = (chord.root_pitch_class() + 12 - key.tonic.pitch_class()) % 12;
    let minor = key.is_minor();
    match degree_index(rel, minor) {
        Some(idx) => quality_fits(chord, idx, minor),
        None => false,
    }
}

fn quality_fits(chord: &Chord, idx: usize, minor: bool) -> bool {
    // Suspended and power chords carry no third; they fit any degree.
    if chord.quality.is_suspended() || chord.quality == ChordQuality::Power {
        return true;
    }

    let expected = expected_quality(idx, minor);
    match (chord.quality, expected) {
        (ChordQuality::Major, ChordQuality::Major) => {
            // Dominant 7th quality marks a secondary dominant anywhere but V.
            !chord.has_dominant_seventh() || idx == 4
        }
        (ChordQuality::Minor, ChordQuality::Minor) => true,
        (ChordQuality::Diminished, ChordQuality::Diminished) => true,
        // Harmonic-minor dominant: major (or V7) on the fifth degree.
        (ChordQuality::Major, ChordQuality::Minor) if minor && idx == 4 => true,
        _ => false,
    }
}

/// Map a chord to its Roman numeral in the key, including applied-dominant
/// notation for chromatic dominants and inversion figures for slash basses.
pub fn roman_for(chord: &Chord, key: &Key) -> RomanNumeral {
    let rel = (chord.root_pitch_class() + 12 - key.tonic.pitch_class()) % 12;
    let minor = key.is_minor();

    if let Some(idx) = degree_index(rel, minor) {
        if quality_fits(chord, idx, minor) {
            let mut text = cased_numeral(DEGREE_NUMERALS[idx], chord);
            text.push_str(seventh_suffix(chord));
            if chord.quality.is_suspended() {
                text.push_str(chord.quality.suffix());
            }
            let figure = inversion_figure(chord);
            if let Some(fig) = &figure {
                text.push_str(fig);
            }
            return RomanNumeral {
                degree: idx as u8 + 1,
                text,
                applied_to: None,
                figure,
            };
        }
    }

    // Chromatic: applied dominants first.
    if chord.is_dominant_quality() {
        let applied = if minor {
            match rel {
                2 => Some((5, "v")),
                3 => Some((6, "VI")),
                5 => Some((7, "VII")),
                10 => Some((3, "III")),
                _ => None,
            }
        } else {
            match rel {
                2 => Some((5, "V")),
                4 => Some((6, "vi")),
                9 => Some((2, "ii")),
                11 => Some((3, "iii")),
                _ => None,
            }
        };
        if let Some((target, target_text)) = applied {
            let head = if chord.has_dominant_seventh() { "V7" } else { "V" };
            return RomanNumeral {
                degree: 5,
                text: format!("{}/{}", head, target_text),
                applied_to: Some(target),
                figure: None,
            };
        }
    }

    // Borrowed / chromatic fallback: interval-based numeral with an
    // accidental relative to the key's own diatonic degrees.
    let (base, degree) = if minor {
        match rel {
            0 => ("I", 1),
            1 => ("bII", 2),
            2 => ("II", 2),
            3 => ("III", 3),
            4 => ("#III", 3),
            5 => ("IV", 4),
            6 => {
                if chord.quality == ChordQuality::Diminished {
                    ("#IV", 4)
                } else {
                    ("bV", 5)
                }
            }
            7 => ("V", 5),
            8 => ("VI", 6),
            9 => ("#VI", 6),
            10 => ("VII", 7),
            11 => ("#VII", 7),
            _ => unreachable!(),
        }
    } else {
        match rel {
            0 => ("I", 1),
            1 => ("bII", 2),
            2 => ("II", 2),
            3 => ("bIII", 3),
            4 => ("III", 3),
            5 => ("IV", 4),
            6 => {
                if chord.quality == ChordQuality::Diminished {
                    ("#IV", 4)
                } else {
                    ("bV", 5)
                }
            }
            7 => ("V", 5),
            8 => ("bVI", 6),
            9 => ("VI", 6),
            10 => ("bVII", 7),
            11 => ("VII", 7),
            _ => unreachable!(),
        }
    };

    let mut text = cased_numeral(base, chord);
    text.push_str(seventh_suffix(chord));
    let figure = inversion_figure(chord);
    if let Some(fig) = &figure {
        text.push_str(fig);
    }
    RomanNumeral {
        degree,
        text,
        applied_to: None,
        figure,
    }
}

/// Uppercase for major/dominant/augmented quality, lowercase for minor and
/// diminished, with the diminished circle appended.
fn cased_numeral(base: &str, chord: &Chord) -> String {
    match chord.quality {
        ChordQuality::Minor => base.to_lowercase(),
        ChordQuality::Diminished => {
            let mut s = base.to_lowercase();
            if chord.seventh != Some(Seventh::HalfDiminished) {
                s.push('°');
            }
            s
        }
        ChordQuality::Augmented => format!("{}+", base),
        _ => base.to_string(),
    }
}

fn seventh_suffix(chord: &Chord) -> &'static str {
    match chord.seventh {
        Some(Seventh::Minor) => "7",
        Some(Seventh::Major) => "maj7",
        Some(Seventh::Diminished) => "7",
        Some(Seventh::HalfDiminished) => "ø7",
        None => "",
    }
}

/// Figure implied by a slash bass: third -> 6, fifth -> 64, seventh -> 42.
fn inversion_figure(chord: &Chord) -> Option<String> {
    if !chord.is_slash_chord() {
        return None;
    }
    let root = chord.root_pitch_class();
    let bass = chord.bass_pitch_class();
    let interval = (bass + 12 - root) % 12;

    let third = chord.quality.intervals().get(1).copied().unwrap_or(4);
    let fifth = chord.quality.intervals().get(2).copied().unwrap_or(7);

    let figure = if interval == third {
        "6"
    } else if interval == fifth {
        "64"
    } else if chord.seventh.map(Seventh::semitones) == Some(interval) {
        "42"
    } else {
        "6"
    };
    Some(figure.to_string())
}

/// Chord-function tag for the degree: {1,3,6} tonic, {2,4} predominant,
/// {5,7} dominant; everything chromatic falls outside the scheme.
pub fn function_for(chord: &Chord, key: &Key) -> ChordFunction {
    if !is_diatonic(chord, key) {
        return ChordFunction::Chromatic;
    }
    let rel = (chord.root_pitch_class() + 12 - key.tonic.pitch_class()) % 12;
    match degree_index(rel, key.is_minor()) {
        Some(0) | Some(2) | Some(5) => ChordFunction::Tonic,
        Some(1) | Some(3) => ChordFunction::Predominant,
        Some(4) | Some(6) => ChordFunction::Dominant,
        _ => ChordFunction::Chromatic,
    }
}

/// Scan adjacent chord pairs for cadential motion.
pub fn detect_cadences(romans: &[RomanNumeral]) -> Vec<Cadence> {
    let mut cadences = Vec::new();
    let n = romans.len();

    for i in 0..n.saturating_sub(1) {
        let cur = &romans[i];
        let next = &romans[i + 1];

        let kind = if is_plain_dominant(cur) && next.is_tonic() {
            Some(CadenceType::Authentic)
        } else if cur.degree == 4
            && !cur.text.starts_with('b')
            && !cur.text.starts_with('#')
            && cur.applied_to.is_none()
            && next.is_tonic()
        {
            Some(CadenceType::Plagal)
        } else if is_plain_dominant(cur) && next.degree == 6 {
            Some(CadenceType::Deceptive)
        } else if cur.text.starts_with("bII") && next.is_tonic() {
            Some(CadenceType::Phrygian)
        } else if cur.degree == 7
            && !cur.text.contains('°')
            && !cur.text.contains('ø')
            && !cur.text.starts_with('#')
            && next.is_tonic()
        {
            // bVII-I in major spelling, VII-i in minor spelling: the same
            // subtonic motion, reported as modal.
            Some(CadenceType::Modal)
        } else {
            None
        };

        if let Some(kind) = kind {
            cadences.push(Cadence {
                kind,
                start: i,
                end: i + 1,
            });
        }
    }

    // Ending on the dominant is a half cadence.
    if n >= 2 {
        let last = &romans[n - 1];
        if is_plain_dominant(last) {
            cadences.push(Cadence {
                kind: CadenceType::Half,
                start: n - 2,
                end: n - 1,
            });
        }
    }

    cadences
}

fn is_plain_dominant(rn: &RomanNumeral) -> bool {
    rn.degree == 5 && rn.applied_to.is_none() && rn.text.starts_with('V')
}

/// Reduce a numeral to its pattern form: no sevenths, figures, or sus marks.
pub fn normalize_numeral(text: &str) -> String {
    let mut s = text.to_string();
    for (from, to) in [
        ("maj7", ""),
        ("ø7", "°"),
        ("°7", "°"),
        ("sus4", ""),
        ("sus2", ""),
        ("64", ""),
        ("42", ""),
        ("13", ""),
        ("11", ""),
        ("9", ""),
        ("7", ""),
        ("6", ""),
        ("+", ""),
    ] {
        s = s.replace(from, to);
    }
    s
}

/// Return the classic functional pattern the progression matches, if any.
/// Matches the whole sequence or its tail; every chord in the matched
/// window must be diatonic, so chromatic look-alikes don't count.
pub fn detect_strong_pattern(
    romans: &[RomanNumeral],
    diatonic: &[bool],
) -> Option<&'static str> {
    if romans.len() < 3 {
        return None;
    }
    let normalized: Vec<String> = romans.iter().map(|r| normalize_numeral(&r.text)).collect();
    let joined = normalized.join("-");

    STRONG_PATTERNS
        .iter()
        .find(|p| {
            let window = p.split('-').count();
            if window > romans.len() {
                return false;
            }
            let text_match = joined == **p || joined.ends_with(&format!("-{}", p));
            text_match && diatonic[romans.len() - window..].iter().all(|&d| d)
        })
        .copied()
}
