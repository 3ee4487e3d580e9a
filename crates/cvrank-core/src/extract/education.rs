use regex::Regex;
use std::sync::LazyLock;

use super::dates;
use super::keywords::KeywordMatcher;
use super::ExtractedEducation;

static PIECES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*[,|;]\s*|\s+(?:-|–|—)\s+").expect("piece separator pattern is valid")
});

/// Splits an Education body into entries. Lines naming a degree start a new
/// entry; an institution line right above a degree line belongs to it.
/// Without any degree keyword, institution lines are the boundaries, and
/// without either the body falls back to blank-line blocks.
pub fn split_entries(
    body: &str,
    degrees: &KeywordMatcher,
    institutions: &KeywordMatcher,
) -> Vec<ExtractedEducation> {
    let lines: Vec<&str> = body.lines().collect();

    let degree_lines: Vec<usize> = (0..lines.len()).filter(|&i| degrees.is_match(lines[i])).collect();
    let starts: Vec<usize> = if !degree_lines.is_empty() {
        degree_lines
            .iter()
            .enumerate()
            .map(|(k, &d)| {
                let previous = if k == 0 { None } else { Some(degree_lines[k - 1]) };
                let pulls_institution = d > 0
                    && previous.map_or(true, |p| d - 1 > p)
                    && institutions.is_match(lines[d - 1]);
                if pulls_institution { d - 1 } else { d }
            })
            .collect()
    } else {
        (0..lines.len()).filter(|&i| institutions.is_match(lines[i])).collect()
    };

    let blocks: Vec<String> = if starts.is_empty() {
        body.split("\n\n").map(|b| b.trim().to_string()).collect()
    } else {
        starts
            .iter()
            .enumerate()
            .map(|(k, &s)| {
                let from = if k == 0 { 0 } else { s };
                let to = starts.get(k + 1).copied().unwrap_or(lines.len());
                lines[from..to].join("\n").trim().to_string()
            })
            .collect()
    };

    blocks
        .into_iter()
        .filter(|b| b.chars().filter(|c| c.is_alphanumeric()).count() >= 3)
        .map(|text| ExtractedEducation {
            degree: piece_with(&text, degrees),
            institution: piece_with(&text, institutions),
            date_raw: dates::find_date(&text).map(|d| d.trim().to_string()),
            text,
        })
        .collect()
}

/// The separator-delimited piece of `text` containing a keyword, with any
/// date stripped off.
fn piece_with(text: &str, matcher: &KeywordMatcher) -> Option<String> {
    text.lines()
        .flat_map(|line| PIECES.split(line))
        .find(|piece| matcher.is_match(piece))
        .map(|piece| {
            let piece = match dates::find_range(piece) {
                Some((s, e)) => format!("{} {}", &piece[..s], &piece[e..]),
                None => piece.to_string(),
            };
            piece
                .trim_matches(|c: char| c.is_whitespace() || ",.;:()-–—".contains(c))
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|p| !p.is_empty())
}
