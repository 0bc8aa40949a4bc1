//! Counter answers worth recommending on a counter page.

use compass_core::CounterRecord;

use crate::thresholds::EFFECTIVENESS_MIN_SCORE;

/// Answers with an effectiveness score of at least
/// [`EFFECTIVENESS_MIN_SCORE`], best first, ties broken by answer key.
pub fn recommended_answers(records: &[CounterRecord]) -> Vec<&CounterRecord> {
    let mut picked: Vec<&CounterRecord> = records
        .iter()
        .filter(|r| r.effectiveness_score.is_some_and(|s| s >= EFFECTIVENESS_MIN_SCORE))
        .collect();
    picked.sort_by(|x, y| {
        let (sx, sy) = (x.effectiveness_score.unwrap_or(0.0), y.effectiveness_score.unwrap_or(0.0));
        sy.total_cmp(&sx).then_with(|| x.answer_key.cmp(&y.answer_key))
    });
    picked
}
