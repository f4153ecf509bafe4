//! Fuzzy matching of a question against the answer store.
//!
//! A single greedy pass: every key is scored against the query and the
//! lowest score wins. Short keys opt out of fuzzy scoring entirely and act
//! as exact case-insensitive substring triggers instead, so an acronym like
//! "hru" can never be stolen by a fuzzier long key.

use serde::{Deserialize, Serialize};

use crate::store::AnswerStore;

/// Score assigned to keys that cannot match. Also the "no match" score in a
/// [`MatchOutcome`]. Larger than any score a real key pair can produce.
pub const SCORE_SENTINEL: usize = 1_000_000;

/// Knobs for one matching pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Best local score above this falls through to the remote fallback.
    #[serde(default = "default_fitness_threshold")]
    pub fitness_threshold: usize,

    /// Keys shorter than this use the substring override instead of edit
    /// distance.
    #[serde(default = "default_short_key_length")]
    pub short_key_length: usize,

    /// Skip local matching entirely.
    #[serde(default)]
    pub force_remote: bool,
}

fn default_fitness_threshold() -> usize {
    6
}

fn default_short_key_length() -> usize {
    20
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            fitness_threshold: default_fitness_threshold(),
            short_key_length: default_short_key_length(),
            force_remote: false,
        }
    }
}

/// Where the final answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchSource {
    Local,
    Remote,
    None,
}

/// Result of one matching pass. Built fresh per query, never stored.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub matched_key: Option<String>,
    pub score: usize,
    pub answer: Option<String>,
    pub source: MatchSource,
}

impl MatchOutcome {
    pub fn none() -> Self {
        Self {
            matched_key: None,
            score: SCORE_SENTINEL,
            answer: None,
            source: MatchSource::None,
        }
    }
}

/// Levenshtein distance over Unicode scalar values, unit costs.
///
/// Two rolling rows of `len(b) + 1`; the full matrix is never materialized.
pub fn distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let del = prev[j + 1] + 1;
            let ins = curr[j] + 1;
            let sub = if ca == cb { prev[j] } else { prev[j] + 1 };
            curr[j + 1] = del.min(ins).min(sub);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Edit distance with the pure length gap subtracted out, so a short query
/// embedded in a long key is not penalized just for the padding. Distance is
/// never below the length gap, so this cannot underflow. Only meaningful for
/// relative ranking.
pub fn score(a: &str, b: &str) -> usize {
    let gap = a.chars().count().abs_diff(b.chars().count());
    distance(a, b) - gap
}

/// Scan the whole store once and pick the best-scoring key for `query`.
///
/// Ties are broken by insertion order: the comparison is strict `<`, so the
/// first key to reach a given minimum keeps it. That is intentional and
/// tests pin it down.
pub fn find_best_match(store: &AnswerStore, query: &str, config: &MatchConfig) -> MatchOutcome {
    let query_lower = query.to_lowercase();

    let mut min_score = SCORE_SENTINEL;
    let mut best: Option<(&str, &str)> = None;

    for (key, answer) in store.iter() {
        let key_score = if key.chars().count() < config.short_key_length {
            // Short keys are exact triggers: substring hit or disqualified.
            if query_lower.contains(&key.to_lowercase()) {
                0
            } else {
                SCORE_SENTINEL
            }
        } else {
            score(key, query)
        };

        if key_score < min_score {
            min_score = key_score;
            best = Some((key, answer));
        }
    }

    match best {
        Some((key, answer)) if min_score <= config.fitness_threshold => MatchOutcome {
            matched_key: Some(key.to_string()),
            score: min_score,
            answer: Some(answer.to_string()),
            source: MatchSource::Local,
        },
        _ => MatchOutcome::none(),
    }
}
