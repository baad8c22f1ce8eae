//! Modal analysis: local tonic detection, parent-key determination, mode
//! identification, and characteristic-degree evidence.
//!
//! The central framing: the key signature is the note collection, the local
//! tonic is the chord that feels like home, and the mode is the pair. The
//! analyzer keeps those three apart and never collapses them.

use chord_symbol::{Chord, ChordQuality, Key, Mode, Note, Seventh};

use crate::functional;
use crate::types::{CadenceType, ContextualClass, KeyRelationship};

/// Known modal progressions with their strengths.
struct ModalPattern {
    pattern: &'static str,
    mode: Mode,
    strength: f64,
}

const MODAL_PATTERNS: &[ModalPattern] = &[
    // Ionian
    ModalPattern { pattern: "I-IV-I", mode: Mode::Ionian, strength: 0.80 },
    ModalPattern { pattern: "I-IV", mode: Mode::Ionian, strength: 0.75 },
    // Dorian
    ModalPattern { pattern: "i-IV-bVII-i", mode: Mode::Dorian, strength: 0.95 },
    ModalPattern { pattern: "i-bVII-IV-i", mode: Mode::Dorian, strength: 0.95 },
    ModalPattern { pattern: "i-IV-i", mode: Mode::Dorian, strength: 0.90 },
    ModalPattern { pattern: "i-IV-bVII", mode: Mode::Dorian, strength: 0.85 },
    ModalPattern { pattern: "i-IV", mode: Mode::Dorian, strength: 0.80 },
    // Mixolydian
    ModalPattern { pattern: "I-bVII-IV-I", mode: Mode::Mixolydian, strength: 0.95 },
    ModalPattern { pattern: "I-bVII-I", mode: Mode::Mixolydian, strength: 0.90 },
    ModalPattern { pattern: "I-IV-bVII-I", mode: Mode::Mixolydian, strength: 0.88 },
    ModalPattern { pattern: "bVII-I", mode: Mode::Mixolydian, strength: 0.85 },
    ModalPattern { pattern: "I-bVII", mode: Mode::Mixolydian, strength: 0.85 },
    ModalPattern { pattern: "I-bVII-IV", mode: Mode::Mixolydian, strength: 0.82 },
    // Phrygian
    ModalPattern { pattern: "i-bII-i", mode: Mode::Phrygian, strength: 0.95 },
    ModalPattern { pattern: "i-bII-bVII-i", mode: Mode::Phrygian, strength: 0.95 },
    ModalPattern { pattern: "bII-i", mode: Mode::Phrygian, strength: 0.90 },
    ModalPattern { pattern: "i-bII-bVII", mode: Mode::Phrygian, strength: 0.88 },
    ModalPattern { pattern: "i-bII", mode: Mode::Phrygian, strength: 0.85 },
    // Lydian
    ModalPattern { pattern: "I-#IV-I", mode: Mode::Lydian, strength: 0.95 },
    ModalPattern { pattern: "I-II-I", mode: Mode::Lydian, strength: 0.90 },
    ModalPattern { pattern: "I-II-I-II", mode: Mode::Lydian, strength: 0.88 },
    ModalPattern { pattern: "I-II", mode: Mode::Lydian, strength: 0.80 },
    // Aeolian
    ModalPattern { pattern: "i-bVII-iv-i", mode: Mode::Aeolian, strength: 0.95 },
    ModalPattern { pattern: "i-iv-bVII-i", mode: Mode::Aeolian, strength: 0.92 },
    ModalPattern { pattern: "i-bVI-bVII-i", mode: Mode::Aeolian, strength: 0.90 },
    ModalPattern { pattern: "i-bVII-bVI-i", mode: Mode::Aeolian, strength: 0.88 },
    ModalPattern { pattern: "i-bVI-iv-i", mode: Mode::Aeolian, strength: 0.85 },
    ModalPattern { pattern: "bVII-i", mode: Mode::Aeolian, strength: 0.80 },
    // Locrian
    ModalPattern { pattern: "i°-bII-i°", mode: Mode::Locrian, strength: 0.95 },
    ModalPattern { pattern: "bII-i°", mode: Mode::Locrian, strength: 0.90 },
];

/// Functional progressions masquerading as modal; a modal reading of these
/// is a foil and gets its confidence capped.
const FOIL_PATTERNS: &[&str] = &[
    "I-V-I",
    "I-IV-V-I",
    "ii-V-I",
    "vi-IV-I-V",
    "i-iv-i",
    "i-II-i",
    "i-V-i",
    "i-v-i",
    "i°-V-i°",
];

/// Facts extracted by modal analysis. `None` means no modal reading exists
/// for this progression.
#[derive(Debug, Clone)]
pub struct ModalAnalysis {
    pub tonic: Note,
    /// Major key naming the underlying diatonic collection.
    pub parent_key: Key,
    pub mode: Option<Mode>,
    pub mode_name: String,
    /// Numerals relative to the local tonic.
    pub romans: Vec<String>,
    pub characteristics: Vec<String>,
    /// Modal cadence resolving to the local tonic, with its strength.
    pub modal_cadence: Option<(CadenceType, f64)>,
    pub pattern: Option<(&'static str, f64)>,
    /// Local tonic opens and closes the progression.
    pub tonic_frames: bool,
    pub relationship: KeyRelationship,
    pub classification: ContextualClass,
    /// Ceiling applied to the evidence-based confidence.
    pub confidence_cap: f64,
    pub foil: bool,
}

pub fn analyze_modal(chords: &[Chord], parent_key: Option<&Key>) -> Option<ModalAnalysis> {
    if chords.len() < 2 {
        return None;
    }
    if chords
        .iter()
        .all(|c| c.root_pitch_class() == chords[0].root_pitch_class() && c.quality == chords[0].quality)
    {
        // Static harmony: nothing modal about repetition.
        return None;
    }

    // Clear functional progressions in the supplied key are not reread as
    // modal at all.
    if let Some(key) = parent_key {
        let functional_romans: Vec<_> =
            chords.iter().map(|c| functional::roman_for(c, key)).collect();
        let diatonic: Vec<bool> = chords
            .iter()
            .map(|c| functional::is_diatonic(c, key))
            .collect();
        if functional::detect_strong_pattern(&functional_romans, &diatonic).is_some() {
            return None;
        }
    }

    let tonic = detect_tonic(chords);
    let tonic_pc = tonic.pitch_class();

    let romans: Vec<String> = chords.iter().map(|c| modal_roman(c, tonic_pc)).collect();
    let normalized: Vec<String> = romans
        .iter()
        .map(|r| functional::normalize_numeral(r))
        .collect();
    let joined = normalized.join("-");

    let union = pitch_class_union(chords);
    let (parent_key_resolved, mode, relationship) =
        resolve_parent(tonic_pc, &union, parent_key);

    let mode_name = match mode {
        Some(m) => format!("{} {}", tonic, m),
        None => format!("{} modal", tonic),
    };

    let characteristics = mode
        .map(|m| characteristic_hits(m, &romans, &normalized))
        .unwrap_or_default();

    let modal_cadence = detect_modal_cadence(&normalized);
    let pattern = mode.and_then(|m| best_pattern(m, &joined));

    let tonic_frames = chords[0].root_pitch_class() == tonic_pc
        && chords[chords.len() - 1].root_pitch_class() == tonic_pc;

    let foil = FOIL_PATTERNS.iter().any(|p| joined == *p);

    let classification = match parent_key {
        None => ContextualClass::ModalCandidate,
        Some(key) => {
            let collection = major_collection(parent_of(key));
            if union.iter().all(|pc| collection.contains(pc)) {
                if characteristics.is_empty() {
                    ContextualClass::Diatonic
                } else {
                    ContextualClass::ModalBorrowing
                }
            } else {
                ContextualClass::ModalCandidate
            }
        }
    };

    let mut cap: f64 = 0.95;
    if parent_key.is_none() {
        cap = cap.min(0.65);
    }
    if mode == Some(Mode::Locrian) {
        cap = cap.min(0.5);
    }
    if foil {
        cap = cap.min(0.3);
    }

    Some(ModalAnalysis {
        tonic,
        parent_key: parent_key_resolved,
        mode,
        mode_name,
        romans,
        characteristics,
        modal_cadence,
        pattern,
        tonic_frames,
        relationship,
        classification,
        confidence_cap: cap,
        foil,
    })
}

/// The chord most likely to feel like home: final position weighs 3,
/// initial position 2, each occurrence 1.
pub fn detect_tonic(chords: &[Chord]) -> Note {
    let mut score = [0.0f64; 12];
    for chord in chords {
        score[chord.root_pitch_class() as usize] += 1.0;
    }
    score[chords[0].root_pitch_class() as usize] += 2.0;
    score[chords[chords.len() - 1].root_pitch_class() as usize] += 3.0;

    let best = score
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);
    let last_pc = chords[chords.len() - 1].root_pitch_class();
    let first_pc = chords[0].root_pitch_class();

    let winner_pc = if score[last_pc as usize] == best {
        last_pc
    } else if score[first_pc as usize] == best {
        first_pc
    } else {
        (0..12u8).find(|&pc| score[pc as usize] == best).unwrap_or(0)
    };

    // Canonical spelling so enharmonic inputs read identically.
    Note::from_pitch_class(winner_pc)
}

fn pitch_class_union(chords: &[Chord]) -> Vec<u8> {
    let mut union: Vec<u8> = chords.iter().flat_map(|c| c.pitch_classes()).collect();
    union.sort_unstable();
    union.dedup();
    union
}

fn parent_of(key: &Key) -> u8 {
    key.parent_tonic_pitch_class()
}

fn major_collection(parent_pc: u8) -> [u8; 7] {
    let mut out = [0u8; 7];
    for (i, iv) in [0u8, 2, 4, 5, 7, 9, 11].iter().enumerate() {
        out[i] = (parent_pc + iv) % 12;
    }
    out
}

/// Preference order when several parent collections fit: the commoner the
/// mode, the earlier it wins a tie.
fn mode_preference(m: Mode) -> usize {
    match m {
        Mode::Ionian => 0,
        Mode::Mixolydian => 1,
        Mode::Dorian => 2,
        Mode::Aeolian => 3,
        Mode::Phrygian => 4,
        Mode::Lydian => 5,
        _ => 6,
    }
}

fn resolve_parent(
    tonic_pc: u8,
    union: &[u8],
    supplied: Option<&Key>,
) -> (Key, Option<Mode>, KeyRelationship) {
    if let Some(key) = supplied {
        let parent_pc = parent_of(key);
        let collection = major_collection(parent_pc);
        let degree = (tonic_pc + 12 - parent_pc) % 12;
        let mode = Mode::from_degree(degree);
        let consistent = union.iter().all(|pc| collection.contains(pc)) && mode.is_some();
        let relationship = if consistent {
            KeyRelationship::Matches
        } else {
            KeyRelationship::Conflicts
        };
        // Never silently override the caller's key, even in conflict.
        return (Key::major(Note::from_pitch_class(parent_pc)), mode, relationship);
    }

    let mut best: Option<(usize, Key, Mode)> = None;
    for parent_pc in 0..12u8 {
        let collection = major_collection(parent_pc);
        if !union.iter().all(|pc| collection.contains(pc)) {
            continue;
        }
        let degree = (tonic_pc + 12 - parent_pc) % 12;
        let Some(mode) = Mode::from_degree(degree) else {
            continue;
        };
        let pref = mode_preference(mode);
        let better = match &best {
            None => true,
            Some((p, _, _)) => pref < *p,
        };
        if better {
            best = Some((pref, Key::major(Note::from_pitch_class(parent_pc)), mode));
        }
    }

    match best {
        Some((_, key, mode)) => (key, Some(mode), KeyRelationship::None),
        None => {
            // Chromatic content with no single diatonic parent: fall back to
            // the tonic's own collection.
            let key = Key::major(Note::from_pitch_class(tonic_pc));
            (key, Some(Mode::Ionian), KeyRelationship::None)
        }
    }
}

/// Numeral relative to the local tonic, cased by chord quality.
pub fn modal_roman(chord: &Chord, tonic_pc: u8) -> String {
    let interval = (chord.root_pitch_class() + 12 - tonic_pc) % 12;
    let base = match interval {
        0 => "I",
        1 => "bII",
        2 => "II",
        3 => "bIII",
        4 => "III",
        5 => "IV",
        6 => "#IV",
        7 => "V",
        8 => "bVI",
        9 => "VI",
        10 => "bVII",
        11 => "VII",
        _ => unreachable!(),
    };

    let mut text = match chord.quality {
        ChordQuality::Minor => base.to_lowercase(),
        ChordQuality::Diminished => format!("{}°", base.to_lowercase()),
        ChordQuality::Augmented => format!("{}+", base),
        q if q.is_suspended() => format!("{}sus", base),
        _ => base.to_string(),
    };

    match chord.seventh {
        Some(Seventh::HalfDiminished) => {
            text = text.trim_end_matches('°').to_string();
            text.push_str("ø7");
        }
        Some(_) => text.push('7'),
        None => {}
    }
    text
}

fn characteristic_hits(mode: Mode, romans: &[String], normalized: &[String]) -> Vec<String> {
    let has_norm = |needle: &str| normalized.iter().any(|r| r == needle);
    let has_raw = |needle: &str| romans.iter().any(|r| r == needle);

    let mut hits = Vec::new();
    match mode {
        Mode::Mixolydian => {
            if has_norm("bVII") {
                hits.push("bVII chord (lowered seventh scale degree)".to_string());
            }
            if has_norm("v") {
                hits.push("minor v chord (lowered seventh scale degree)".to_string());
            }
        }
        Mode::Dorian => {
            if has_norm("IV") {
                hits.push("major IV chord in a minor context (raised sixth)".to_string());
            }
            if has_norm("ii") {
                hits.push("minor ii chord (raised sixth scale degree)".to_string());
            }
            if has_raw("i7") {
                hits.push("minor seventh tonic chord".to_string());
            }
        }
        Mode::Phrygian => {
            if has_norm("bII") {
                hits.push("bII chord (lowered second scale degree)".to_string());
            }
            if has_norm("bvii") {
                hits.push("minor bvii chord (lowered seventh)".to_string());
            }
        }
        Mode::Lydian => {
            if has_norm("II") {
                hits.push("major II chord (raised fourth scale degree)".to_string());
            }
            if has_norm("#iv°") {
                hits.push("#iv diminished chord (raised fourth)".to_string());
            }
        }
        Mode::Aeolian | Mode::Minor => {
            if has_norm("bVI") {
                hits.push("bVI chord (lowered sixth scale degree)".to_string());
            }
            if has_norm("bVII") {
                hits.push("bVII chord (lowered seventh scale degree)".to_string());
            }
            if has_norm("i") {
                hits.push("minor tonic chord".to_string());
            }
        }
        Mode::Locrian => {
            if has_norm("i°") {
                hits.push("diminished tonic chord".to_string());
            }
        }
        Mode::Major | Mode::Ionian => {}
    }
    hits
}

fn detect_modal_cadence(normalized: &[String]) -> Option<(CadenceType, f64)> {
    for pair in normalized.windows(2) {
        let to_tonic = matches!(pair[1].as_str(), "I" | "i" | "i°");
        if !to_tonic {
            continue;
        }
        if pair[0] == "bII" {
            return Some((CadenceType::Phrygian, 0.8));
        }
        if pair[0] == "bVII" {
            return Some((CadenceType::Modal, 0.75));
        }
    }
    None
}

fn best_pattern(mode: Mode, joined: &str) -> Option<(&'static str, f64)> {
    let mode = match mode {
        Mode::Major => Mode::Ionian,
        Mode::Minor => Mode::Aeolian,
        m => m,
    };
    MODAL_PATTERNS
        .iter()
        .filter(|p| p.mode == mode)
        .filter(|p| segment_match(joined, p.pattern))
        .map(|p| (p.pattern, p.strength))
        .fold(None, |acc, cur| match acc {
            Some((_, s)) if s >= cur.1 => acc,
            _ => Some(cur),
        })
}

/// True when `pattern` occurs in `joined` on dash boundaries.
fn segment_match(joined: &str, pattern: &str) -> bool {
    joined == pattern
        || joined.starts_with(&format!("{}-", pattern))
        || joined.ends_with(&format!("-{}", pattern))
        || joined.contains(&format!("-{}-", pattern))
}
