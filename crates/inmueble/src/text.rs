use std::sync::LazyLock;

use regex::Regex;

const INVISIBLE_MARKS: [char; 5] = ['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

static RE_BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("invalid regex: blank run"));

static RE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+\.?[0-9]*)").expect("invalid regex: number"));

pub fn strip_invisible(text: &str) -> String {
    text.chars().filter(|c| !INVISIBLE_MARKS.contains(c)).collect()
}

/// Collapses every whitespace run (newlines included) into a single space.
pub fn clean_single_line(text: &str) -> String {
    strip_invisible(text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Like [`clean_single_line`] but per physical line, keeping at most one blank
/// line between paragraphs.
pub fn clean_multiline(text: &str) -> String {
    let joined = strip_invisible(text)
        .split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n");

    RE_BLANK_RUN
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}

pub fn extract_number(text: &str) -> Option<f64> {
    let text = text.replace(',', "");
    RE_NUMBER
        .captures(&text)
        .and_then(|caps| caps[1].parse::<f64>().ok())
}

/// Listings give either the construction year or the building's age in the
/// same field.
pub fn infer_construction_year(value: f64, current_year: i32) -> Option<i32> {
    let upper = f64::from(current_year + 2);
    if (1900.0..=upper).contains(&value) {
        Some(value as i32)
    } else if value > 0.0 && value < 100.0 {
        Some((f64::from(current_year) - value) as i32)
    } else {
        None
    }
}

pub fn normalize_key(text: &str) -> String {
    text.to_lowercase().replace(' ', "_")
}

pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
