//! Score aggregation and signal flagging.
//!
//! The zero-shot model scores each fine phrase independently (multi-label), so the
//! per-category score is the strongest contributing phrase, not a sum.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::labels::{FineLabel, GenericLabel};

pub const DEFAULT_FLAG_THRESHOLD: f64 = 0.6;

/// One aggregated category score. Serialized with capitalized keys for UI consumers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    #[serde(rename = "Label")]
    pub label: GenericLabel,
    #[serde(rename = "Score")]
    pub score: f64,
}

/// All categories at 0.0, in category order.
pub fn zero_scores() -> Vec<ScoreRecord> {
    GenericLabel::ALL
        .into_iter()
        .map(|label| ScoreRecord { label, score: 0.0 })
        .collect()
}

/// Rounds to three decimals on the exact binary value, as `{:.3}` does.
#[inline]
fn round3(x: f64) -> f64 {
    format!("{x:.3}").parse().unwrap_or(x)
}

/// Reduce raw `(phrase, score)` pairs to one record per generic category.
///
/// Phrases not in the taxonomy are skipped; a phrase reported twice keeps its higher
/// score. Output covers every category, sorted by score descending with ties left in
/// category order.
pub fn aggregate<I, S>(raw: I) -> Vec<ScoreRecord>
where
    I: IntoIterator<Item = (S, f64)>,
    S: AsRef<str>,
{
    let mut by_fine: HashMap<FineLabel, f64> = HashMap::new();
    for (phrase, score) in raw {
        match FineLabel::from_phrase(phrase.as_ref()) {
            Some(fine) => {
                let slot = by_fine.entry(fine).or_insert(score);
                if score > *slot {
                    *slot = score;
                }
            }
            None => tracing::debug!(label = phrase.as_ref(), "ignoring unknown classifier label"),
        }
    }

    let mut records: Vec<ScoreRecord> = GenericLabel::ALL
        .into_iter()
        .map(|label| {
            let best = label
                .members()
                .map(|f| by_fine.get(&f).copied().unwrap_or(0.0))
                .fold(0.0_f64, f64::max);
            ScoreRecord {
                label,
                score: round3(best),
            }
        })
        .collect();

    // sort_by is stable: equal scores keep category order.
    records.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    records
}

/// Records strictly above `threshold`, excluding the benign category, input order kept.
pub fn flagged_records(
    records: &[ScoreRecord],
    threshold: f64,
) -> impl Iterator<Item = &ScoreRecord> + '_ {
    records
        .iter()
        .filter(move |r| r.score > threshold && !r.label.is_benign())
}

/// Display strings like `"Flattery (0.87)"` for every flagged record.
pub fn flag_signals(records: &[ScoreRecord], threshold: f64) -> Vec<String> {
    flagged_records(records, threshold)
        .map(|r| format!("{} ({:.2})", r.label, r.score))
        .collect()
}
