//! Date-range and year patterns shared by entry splitting and profile building.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::DateRange;

const MONTH: &str = r"(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec|ocak|şubat|mart|nisan|mayıs|haziran|temmuz|ağustos|eylül|ekim|kasım|aralık)[\p{L}]*\.?";
const ONGOING: &str = r"(?:present|current|now|today|ongoing|devam\p{L}*|günümüz|halen|hala|hâlâ)";

fn point() -> String {
    format!(r"(?:(?:0?[1-9]|1[0-2])\s*[/.]\s*(?:19|20)\d{{2}}|{MONTH}\s+(?:19|20)\d{{2}}|(?:19|20)\d{{2}})")
}

/// "MM/YYYY – MM/YYYY", "Jan 2019 - Present", "2018–2020", "2020 - Devam".
static DATE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    let point = point();
    Regex::new(&format!(
        r"(?i)\b(?P<start>{point})\s*(?:-|–|—|to\b|until\b|through\b)\s*(?P<end>{point}|{ONGOING}\b)"
    ))
    .expect("date range pattern is valid")
});

static YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:19|20)\d{2}\b").expect("year pattern is valid")
});

static ONGOING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b{ONGOING}\b")).expect("ongoing pattern is valid")
});

/// Byte span of the first date range in `text`.
pub fn find_range(text: &str) -> Option<(usize, usize)> {
    DATE_RANGE.find(text).map(|m| (m.start(), m.end()))
}

/// First date range, or failing that the first lone year.
pub fn find_date(text: &str) -> Option<&str> {
    DATE_RANGE
        .find(text)
        .or_else(|| YEAR.find(text))
        .map(|m| m.as_str())
}

pub fn years(text: &str) -> Vec<u16> {
    YEAR.find_iter(text).filter_map(|m| m.as_str().parse().ok()).collect()
}

/// Parse the years out of a raw date range. Missing parts stay `None`.
pub fn parse_range(raw: &str) -> DateRange {
    let raw = raw.trim();
    let (start_year, end_year, ongoing) = match DATE_RANGE.captures(raw) {
        Some(caps) => {
            let start = caps.name("start").map_or("", |m| m.as_str());
            let end = caps.name("end").map_or("", |m| m.as_str());
            let ongoing = ONGOING_RE.is_match(end);
            (years(start).first().copied(), years(end).first().copied(), ongoing)
        }
        None => {
            let ys = years(raw);
            (ys.first().copied(), ys.get(1).copied(), ONGOING_RE.is_match(raw))
        }
    };
    DateRange { raw: raw.to_string(), start_year, end_year, ongoing }
}
