//! Chord symbol parser.
//!
//! Accepts symbols like `C`, `Dm7`, `F#m7b5/A`, `G7sus4`, `Bbmaj7#11`.
//! Quality tokens are matched longest-first so `maj7` beats `maj`, `sus4`
//! beats `sus`, and `m7b5` is never read as `m` + `7` + `b5`.

use crate::chord::{Alteration, AlteredDegree, Chord, ChordQuality, Extension, Seventh};
use crate::error::ParseError;
use crate::note::{Accidental, Note, NoteName};

/// Parse a chord symbol into a structured chord.
pub fn parse(symbol: &str) -> Result<Chord, ParseError> {
    let original = symbol.trim();
    if original.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let normalized = original.replace('♯', "#").replace('♭', "b");

    // Split off a slash bass; the first '/' separates chord from bass.
    let (head, bass_str) = match normalized.split_once('/') {
        Some((head, bass)) => (head, Some(bass)),
        None => (normalized.as_str(), None),
    };

    let (root, rest) = parse_root(head, original)?;
    let mut cursor = SuffixCursor::new(rest, original);
    cursor.run()?;

    let bass = match bass_str {
        Some(b) => {
            let note =
                Note::parse(b).map_err(|_| ParseError::InvalidChord(original.to_string()))?;
            // A bass equal to the root is not an inversion; normalize it away.
            if note.pitch_class() == root.pitch_class() {
                None
            } else {
                Some(note)
            }
        }
        None => None,
    };

    Ok(Chord {
        root,
        quality: cursor.quality.unwrap_or(ChordQuality::Major),
        seventh: cursor.seventh,
        extensions: cursor.extensions,
        alterations: cursor.alterations,
        bass,
        symbol: original.to_string(),
    })
}

fn parse_root<'a>(head: &'a str, original: &str) -> Result<(Note, &'a str), ParseError> {
    let mut chars = head.char_indices();
    let name = match chars.next() {
        Some((_, c)) if c.is_ascii_uppercase() => NoteName::parse(c)
            .ok_or_else(|| ParseError::InvalidChord(original.to_string()))?,
        // Lowercase roots are Roman-numeral territory, not chord symbols.
        _ => return Err(ParseError::InvalidChord(original.to_string())),
    };

    let mut rest_start = 1;
    let mut accidental = None;
    if let Some(&b) = head.as_bytes().get(1) {
        if b == b'#' {
            accidental = Some(Accidental::Sharp);
            rest_start = 2;
        } else if b == b'b' {
            // 'b' is a flat only when not starting a quality word such as
            // the "b5" of "Cmb5" -- at root position it always binds to the
            // root unless the root letter cannot carry a flat reading.
            accidental = Some(Accidental::Flat);
            rest_start = 2;
        }
    }

    Ok((Note::new(name, accidental), &head[rest_start..]))
}

struct SuffixCursor<'a> {
    rest: &'a str,
    original: &'a str,
    quality: Option<ChordQuality>,
    seventh: Option<Seventh>,
    extensions: Vec<Extension>,
    alterations: Vec<Alteration>,
}

impl<'a> SuffixCursor<'a> {
    fn new(rest: &'a str, original: &'a str) -> Self {
        SuffixCursor {
            rest,
            original,
            quality: None,
            seventh: None,
            extensions: Vec::new(),
            alterations: Vec::new(),
        }
    }

    fn eat(&mut self, token: &str) -> bool {
        if let Some(stripped) = self.rest.strip_prefix(token) {
            self.rest = stripped;
            true
        } else {
            false
        }
    }

    fn invalid(&self) -> ParseError {
        ParseError::InvalidChord(self.original.to_string())
    }

    fn set_quality(&mut self, quality: ChordQuality) -> Result<(), ParseError> {
        if self.quality.is_some() {
            return Err(self.invalid());
        }
        self.quality = Some(quality);
        Ok(())
    }

    fn push_extension(&mut self, ext: Extension) {
        if !self.extensions.contains(&ext) {
            self.extensions.push(ext);
        }
    }

    fn push_alteration(&mut self, degree: AlteredDegree, accidental: Accidental) {
        let alt = Alteration { degree, accidental };
        if !self.alterations.contains(&alt) {
            self.alterations.push(alt);
        }
    }

    fn run(&mut self) -> Result<(), ParseError> {
        while !self.rest.is_empty() {
            // Composite tokens first: longest match wins.
            if self.eat("m7b5") || self.eat("ø7") || self.eat("ø") {
                self.set_quality(ChordQuality::Diminished)?;
                self.seventh = Some(Seventh::HalfDiminished);
            } else if self.eat("maj7") || self.eat("M7") {
                if self.seventh.is_some() {
                    return Err(self.invalid());
                }
                self.seventh = Some(Seventh::Major);
            } else if self.eat("maj") || self.eat("M") {
                self.set_quality(ChordQuality::Major)?;
            } else if self.eat("dim7") || self.eat("°7") {
                self.set_quality(ChordQuality::Diminished)?;
                self.seventh = Some(Seventh::Diminished);
            } else if self.eat("dim") || self.eat("°") {
                self.set_quality(ChordQuality::Diminished)?;
            } else if self.eat("aug") || self.eat("+") {
                match self.quality {
                    None => self.quality = Some(ChordQuality::Augmented),
                    Some(ChordQuality::Major) => self.quality = Some(ChordQuality::Augmented),
                    _ => return Err(self.invalid()),
                }
            } else if self.eat("sus4") {
                self.set_quality(ChordQuality::Suspended4)?;
            } else if self.eat("sus2") {
                self.set_quality(ChordQuality::Suspended2)?;
            } else if self.eat("sus") {
                // Bare "sus" conventionally means sus4.
                self.set_quality(ChordQuality::Suspended4)?;
            } else if self.eat("min") || self.eat("-") {
                self.set_quality(ChordQuality::Minor)?;
            } else if self.rest.starts_with('m') && !self.rest.starts_with("maj") {
                self.rest = &self.rest[1..];
                self.set_quality(ChordQuality::Minor)?;
            } else if self.eat("add13") {
                self.push_extension(Extension::Thirteenth);
            } else if self.eat("add11") {
                self.push_extension(Extension::Eleventh);
            } else if self.eat("add9") {
                self.push_extension(Extension::Ninth);
            } else if self.eat("13") {
                self.push_extension(Extension::Thirteenth);
            } else if self.eat("11") {
                self.push_extension(Extension::Eleventh);
            } else if self.eat("9") {
                self.push_extension(Extension::Ninth);
            } else if self.eat("7") {
                if self.seventh.is_some() {
                    return Err(self.invalid());
                }
                self.seventh = Some(match self.quality {
                    Some(ChordQuality::Diminished) => Seventh::Diminished,
                    _ => Seventh::Minor,
                });
            } else if self.eat("b13") {
                self.push_alteration(AlteredDegree::Thirteenth, Accidental::Flat);
            } else if self.eat("b11") {
                self.push_alteration(AlteredDegree::Eleventh, Accidental::Flat);
            } else if self.eat("b9") {
                self.push_alteration(AlteredDegree::Ninth, Accidental::Flat);
            } else if self.eat("b5") {
                self.push_alteration(AlteredDegree::Fifth, Accidental::Flat);
            } else if self.eat("#13") {
                self.push_alteration(AlteredDegree::Thirteenth, Accidental::Sharp);
            } else if self.eat("#11") {
                self.push_alteration(AlteredDegree::Eleventh, Accidental::Sharp);
            } else if self.eat("#9") {
                self.push_alteration(AlteredDegree::Ninth, Accidental::Sharp);
            } else if self.eat("#5") {
                self.push_alteration(AlteredDegree::Fifth, Accidental::Sharp);
            } else if self.rest.starts_with('5') {
                // Power chord: only valid as the sole suffix token.
                if self.quality.is_some()
                    || self.seventh.is_some()
                    || !self.extensions.is_empty()
                    || !self.alterations.is_empty()
                {
                    return Err(self.invalid());
                }
                self.rest = &self.rest[1..];
                self.quality = Some(ChordQuality::Power);
            } else {
                return Err(self.invalid());
            }
        }
        Ok(())
    }
}
