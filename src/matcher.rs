//! Fuzzy record matching.
//!
//! `find_best` looks for the haystack record that best matches a probe:
//! every probe field other than the match field must be equal, and the match
//! field is scored with a Ratcliff/Obershelp similarity ratio.

use crate::record::Record;
use std::collections::HashMap;

/// Best candidate found by `find_best`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub index: usize,
    pub score: f64,
}

impl Match {
    /// Score 1.0 means the match is certain and needs no arbitration.
    pub fn is_exact(&self) -> bool {
        self.score >= 1.0
    }
}

/// Find the best match for `probe` in `haystack`, scoring on `match_field`.
///
/// A haystack record equal to the probe wins outright with score 1.0.
/// Otherwise records that differ from the probe on any other field (or lack
/// it) are skipped, and the remaining ones are scored on `match_field`, also
/// trying the probe's words in reverse order. Ties keep the earliest record.
/// Returns `None` when nothing qualifies or the best score is 0.
pub fn find_best(probe: &Record, haystack: &[Record], match_field: &str) -> Option<Match> {
    if let Some(index) = haystack.iter().position(|candidate| candidate == probe) {
        return Some(Match { index, score: 1.0 });
    }

    let needle = probe.get(match_field)?;
    let reversed = reversed_words(needle);

    let mut best: Option<Match> = None;
    for (index, candidate) in haystack.iter().enumerate() {
        if !satisfies_constraints(probe, candidate, match_field) {
            continue;
        }

        let text = candidate.get(match_field).unwrap_or("");
        let mut score = similarity(text, needle);
        if let Some(reversed) = &reversed {
            score = score.max(similarity(text, reversed));
        }

        if score > best.map_or(0.0, |m| m.score) {
            best = Some(Match { index, score });
        }
    }

    best
}

fn satisfies_constraints(probe: &Record, candidate: &Record, match_field: &str) -> bool {
    probe
        .iter()
        .filter(|(key, _)| *key != match_field)
        .all(|(key, value)| candidate.entry(key) == Some(value))
}

/// The words of `text` in reverse order, when there is more than one.
fn reversed_words(text: &str) -> Option<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < 2 {
        return None;
    }
    Some(words.into_iter().rev().collect::<Vec<_>>().join(" "))
}

/// Ratcliff/Obershelp similarity: `2 * M / T` where `M` is the number of
/// characters in matching blocks and `T` the total length of both strings.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut positions: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate() {
        positions.entry(*c).or_default().push(j);
    }

    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
        let (i, j, size) = longest_block(a, &positions, a_lo, a_hi, b_lo, b_hi);
        if size == 0 {
            continue;
        }
        matched += size;
        if a_lo < i && b_lo < j {
            pending.push((a_lo, i, b_lo, j));
        }
        if i + size < a_hi && j + size < b_hi {
            pending.push((i + size, a_hi, j + size, b_hi));
        }
    }
    matched
}

/// Longest common block of `a[a_lo..a_hi]` and `b[b_lo..b_hi]`, earliest in
/// `a` (then in `b`) on ties. Returns `(start in a, start in b, length)`.
fn longest_block(
    a: &[char],
    positions: &HashMap<char, Vec<usize>>,
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (a_lo, b_lo, 0);
    // run length of the block ending at (i - 1, j), keyed by j
    let mut runs: HashMap<usize, usize> = HashMap::new();

    for (i, c) in a.iter().enumerate().take(a_hi).skip(a_lo) {
        let mut next_runs = HashMap::new();
        for &j in positions.get(c).map(Vec::as_slice).unwrap_or(&[]) {
            if j < b_lo {
                continue;
            }
            if j >= b_hi {
                break;
            }
            let size = j
                .checked_sub(1)
                .and_then(|prev| runs.get(&prev))
                .copied()
                .unwrap_or(0)
                + 1;
            next_runs.insert(j, size);
            if size > best_size {
                best_i = i + 1 - size;
                best_j = j + 1 - size;
                best_size = size;
            }
        }
        runs = next_runs;
    }

    (best_i, best_j, best_size)
}
