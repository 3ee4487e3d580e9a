//! Splits an Experience body into entries at date-range lines.
//!
//! Role and organization come from the header lines nearest above each date
//! range: header pieces are classified by lexical cues (job-title words,
//! company suffixes) rather than a trained entity model.

use regex::Regex;
use std::sync::LazyLock;

use super::dates;
use super::ExtractedExperience;

/// Header lines considered above a date line.
const MAX_HEADER_LINES: usize = 2;
/// Longer pieces are prose, not a title or a company name.
const MAX_PIECE_LEN: usize = 80;

static ROLE_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:engineer|developer|programmer|manager|analyst|intern|specialist|consultant|lead|director|designer|architect|scientist|administrator|officer|assistant|coordinator|head|technician|founder|teacher|researcher|mühendis\p{L}*|geliştirici|yazılımcı|uzman\p{L}*|stajyer|müdür\p{L}*|yönetici\p{L}*|analist|danışman|sorumlu\p{L}*)\b",
    )
    .expect("role hint pattern is valid")
});

static ORG_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\b(?:inc|ltd|llc|corp|corporation|gmbh|company|co|technologies|technology|solutions|group|bank|bankası|holding|labs|systems|university|üniversitesi|agency|studio|software|yazılım|teknoloji|şirketi)\b\.?|\ba\.ş\.?|\bş\.?t\.?i\.?)",
    )
    .expect("organization hint pattern is valid")
});

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+(?:at|@|-|–|—)\s+|\s*[,|()\[\]]\s*|\s+@").expect("separator pattern is valid")
});

pub fn split_entries(body: &str) -> Vec<ExtractedExperience> {
    let lines: Vec<&str> = body.lines().collect();
    let date_lines: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| dates::find_range(l).is_some())
        .map(|(i, _)| i)
        .collect();

    if date_lines.is_empty() {
        return split_blocks(body);
    }

    // Header of each entry: up to MAX_HEADER_LINES plain lines directly
    // above its date line, stopping at blanks, bullets and earlier dates.
    let header_starts: Vec<usize> = date_lines
        .iter()
        .enumerate()
        .map(|(k, &d)| {
            let floor = if k == 0 { 0 } else { date_lines[k - 1] + 1 };
            let mut start = d;
            while start > floor && d - start < MAX_HEADER_LINES {
                let above = lines[start - 1].trim();
                if above.is_empty() || is_bullet(above) {
                    break;
                }
                start -= 1;
            }
            start
        })
        .collect();

    let mut entries = Vec::with_capacity(date_lines.len());
    for (k, &d) in date_lines.iter().enumerate() {
        // The first entry also keeps any preamble above its header.
        let from = if k == 0 { 0 } else { header_starts[k] };
        let to = header_starts.get(k + 1).copied().unwrap_or(lines.len());
        let text = lines[from..to].join("\n").trim().to_string();
        if text.is_empty() {
            continue;
        }

        let date_line = lines[d];
        let (date_raw, date_line_rest) = match dates::find_range(date_line) {
            Some((s, e)) => (
                Some(date_line[s..e].trim().to_string()),
                format!("{} {}", &date_line[..s], &date_line[e..]),
            ),
            None => (None, date_line.to_string()),
        };
        let mut header: Vec<&str> = lines[header_starts[k]..d].iter().map(|l| l.trim()).collect();
        header.push(date_line_rest.trim());
        let (role, organization) = role_and_organization(&header);

        entries.push(ExtractedExperience { role, organization, date_raw, text });
    }
    entries
}

/// Fallback for bodies without any date range: blank-line separated blocks.
fn split_blocks(body: &str) -> Vec<ExtractedExperience> {
    body.split("\n\n")
        .map(str::trim)
        .filter(|b| b.chars().filter(|c| c.is_alphanumeric()).count() >= 3)
        .map(|block| {
            let first = block.lines().next().unwrap_or_default().trim();
            let (role, organization) = role_and_organization(&[first]);
            ExtractedExperience {
                role,
                organization,
                date_raw: dates::find_date(block).map(str::to_string),
                text: block.to_string(),
            }
        })
        .collect()
}

fn is_bullet(line: &str) -> bool {
    line.starts_with(['•', '-', '*', '▪', '■', '●', '·', '–'])
}

/// Classify header pieces into a role and an organization. When only one of
/// the two has a lexical cue, the first remaining piece fills the other.
pub fn role_and_organization(header: &[&str]) -> (Option<String>, Option<String>) {
    let pieces: Vec<String> = header
        .iter()
        .flat_map(|line| SEPARATORS.split(line))
        .map(|p| p.trim_matches(|c: char| c.is_whitespace() || ",.;:-–—|".contains(c)).to_string())
        .filter(|p| !p.is_empty() && p.len() <= MAX_PIECE_LEN && p.chars().any(char::is_alphabetic))
        .collect();

    let role_at = pieces.iter().position(|p| ROLE_HINT.is_match(p));
    let org_at = pieces
        .iter()
        .enumerate()
        .find(|(i, p)| Some(*i) != role_at && ORG_HINT.is_match(p))
        .map(|(i, _)| i);

    let other = |taken: usize| pieces.iter().enumerate().find(|(i, _)| *i != taken).map(|(_, p)| p.clone());

    match (role_at, org_at) {
        (Some(r), Some(o)) => (Some(pieces[r].clone()), Some(pieces[o].clone())),
        (Some(r), None) => (Some(pieces[r].clone()), other(r)),
        (None, Some(o)) => (other(o), Some(pieces[o].clone())),
        (None, None) if pieces.len() >= 2 => (Some(pieces[0].clone()), Some(pieces[1].clone())),
        (None, None) => (None, None),
    }
}
