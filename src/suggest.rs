//! "Did you mean" suggestions
//!
//! Picks the nearest valid alternative for a rejected value. Scoring is
//! deterministic:
//!
//! 1. Case-insensitive Levenshtein distance. The closest candidate wins when
//!    its distance is at most `max(1, len / 3)`, `len` being the length of
//!    the longer of the two strings (typos: `Paragrph` → `Paragraph`).
//! 2. Otherwise the best skim fuzzy score (abbreviations and fragments:
//!    `para` → `Paragraph`).
//!
//! Ties keep candidate order. A candidate equal to the input is never
//! suggested.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

/// Nearest candidate to `input`, if any is close enough
pub fn nearest<'a, I>(input: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let candidates: Vec<&str> = candidates
        .into_iter()
        .filter(|c| !c.is_empty() && *c != input)
        .collect();
    if input.is_empty() || candidates.is_empty() {
        return None;
    }

    let folded = input.to_lowercase();
    let mut best: Option<(usize, &str)> = None;
    for candidate in &candidates {
        let distance = levenshtein(&folded, &candidate.to_lowercase());
        let longest = input.chars().count().max(candidate.chars().count());
        if distance > (longest / 3).max(1) {
            continue;
        }
        if best.map(|(d, _)| distance < d).unwrap_or(true) {
            best = Some((distance, candidate));
        }
    }
    if let Some((_, candidate)) = best {
        return Some(candidate.to_string());
    }

    let matcher = SkimMatcherV2::default();
    let mut best: Option<(i64, &str)> = None;
    for candidate in &candidates {
        if let Some(score) = matcher.fuzzy_match(candidate, input) {
            if best.map(|(s, _)| score > s).unwrap_or(true) {
                best = Some((score, candidate));
            }
        }
    }
    best.map(|(_, candidate)| candidate.to_string())
}

/// Edit distance between two strings, in chars
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
