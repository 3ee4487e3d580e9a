//! Text normalizer: turns noisy extracted or OCR text into a canonical string.
//!
//! Line structure is preserved (headings are detected per line), but each
//! line is trimmed, inner whitespace runs collapse to one space and runs of
//! blank lines collapse to a single blank line.

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const PLACEHOLDER: char = '\u{FFFD}';

/// Repair counters for one document.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizeStats {
    /// Control characters removed (tabs and form feeds included).
    pub control_stripped: usize,
    /// Zero-width characters, BOMs and soft hyphens removed.
    pub invisible_stripped: usize,
    /// Characters rewritten by compatibility folding (ligatures, full-width forms).
    pub compat_folded: usize,
    /// Hyphenated line wraps that were rejoined.
    pub hyphen_joins: usize,
    /// Surplus spaces and blank lines removed when runs were collapsed.
    pub whitespace_collapsed: usize,
    /// U+FFFD placeholders present in the text, from the decoder or the source.
    pub placeholders: usize,
}

impl NormalizeStats {
    /// Total number of characters the normalizer had to repair.
    pub fn chars_repaired(&self) -> usize {
        self.control_stripped
            + self.invisible_stripped
            + self.compat_folded
            + self.hyphen_joins
            + self.whitespace_collapsed
    }
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub text: String,
    pub stats: NormalizeStats,
}

pub fn normalize(raw: &str) -> Normalized {
    let mut stats = NormalizeStats::default();

    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut cleaned = String::with_capacity(unified.len());
    for c in unified.chars() {
        match c {
            '\n' => cleaned.push('\n'),
            PLACEHOLDER => {
                stats.placeholders += 1;
                cleaned.push(c);
            }
            '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}' => {
                stats.invisible_stripped += 1;
            }
            c if c.is_control() => {
                stats.control_stripped += 1;
                // Tabs and page breaks still separate words.
                if c == '\t' || c == '\u{000C}' {
                    cleaned.push(' ');
                }
            }
            c => {
                let folded: String = std::iter::once(c).nfkc().collect();
                if folded.chars().eq(std::iter::once(c)) {
                    cleaned.push(c);
                } else {
                    stats.compat_folded += 1;
                    cleaned.push_str(&folded);
                }
            }
        }
    }

    let lines: Vec<String> =
        cleaned.split('\n').map(|l| collapse_spaces(l, &mut stats)).collect();
    let joined = join_hyphenated(lines, &mut stats);

    let mut text = String::with_capacity(joined.iter().map(|l| l.len() + 1).sum());
    let mut blank_run = 0usize;
    for line in &joined {
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !text.is_empty() {
            text.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
            // Leading and trailing blank lines are not counted.
            stats.whitespace_collapsed += blank_run.saturating_sub(1);
        }
        blank_run = 0;
        text.push_str(line);
    }

    if stats.chars_repaired() > 0 || stats.placeholders > 0 {
        tracing::debug!(
            chars_repaired = stats.chars_repaired(),
            hyphen_joins = stats.hyphen_joins,
            whitespace_collapsed = stats.whitespace_collapsed,
            placeholders = stats.placeholders,
            "normalized document text"
        );
    }

    Normalized { text, stats }
}

fn collapse_spaces(line: &str, stats: &mut NormalizeStats) -> String {
    let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
    stats.whitespace_collapsed += line.chars().count() - collapsed.chars().count();
    collapsed
}

/// A line ending in `<letter>-` followed by a line starting with a lowercase
/// letter is a wrapped word: drop the hyphen and merge the lines.
fn join_hyphenated(lines: Vec<String>, stats: &mut NormalizeStats) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        if let Some(prev) = out.last_mut() {
            let continues = line.chars().next().is_some_and(char::is_lowercase);
            let mut tail = prev.chars().rev();
            let wrapped = tail.next() == Some('-') && tail.next().is_some_and(char::is_alphabetic);
            if continues && wrapped {
                prev.pop();
                prev.push_str(&line);
                stats.hyphen_joins += 1;
                continue;
            }
        }
        out.push(line);
    }
    out
}

/// Case-folds text for keyword comparison: compatibility decomposition,
/// combining marks dropped, dotless `ı` unified with `i`, lower-cased.
/// "EĞİTİM", "Eğitim" and "egitim" all fold to "egitim".
pub fn fold(text: &str) -> String {
    fold_with_offsets(text).text
}

/// Folded text plus, for every byte of it, the byte offset of the source
/// character it came from. `offsets` has one extra trailing entry equal to
/// the source length so that match ends map back too.
pub struct Folded {
    pub text: String,
    offsets: Vec<usize>,
}

impl Folded {
    pub fn source_offset(&self, folded_offset: usize) -> usize {
        self.offsets[folded_offset.min(self.offsets.len() - 1)]
    }
}

pub fn fold_with_offsets(source: &str) -> Folded {
    let mut text = String::with_capacity(source.len());
    let mut offsets = Vec::with_capacity(source.len() + 1);
    for (at, c) in source.char_indices() {
        for d in std::iter::once(c).nfkd() {
            if is_combining_mark(d) {
                continue;
            }
            let d = if d == 'ı' { 'i' } else { d };
            for l in d.to_lowercase() {
                text.push(l);
                offsets.extend(std::iter::repeat(at).take(l.len_utf8()));
            }
        }
    }
    offsets.push(source.len());
    Folded { text, offsets }
}
