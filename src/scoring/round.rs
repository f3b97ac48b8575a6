use crate::marks::{present, MarksEntry};

/// How a single round's score was assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundBreakdown {
    pub deduction: f64,          // D, 0 when unset
    pub penalty: f64,            // P, 0 when unset
    pub judge_scores: Vec<f64>,  // E scores that parsed, in entry order
    pub dropped_low: Option<f64>,
    pub dropped_high: Option<f64>,
    pub middle: Vec<f64>,        // scores left after trimming, ascending
    pub divisor: f64,
    pub middle_average: f64,
    pub score: f64,
}

/// Parse one stored field. Unset, blank and non-numeric text all yield `None`.
pub(crate) fn parse_field(field: &Option<String>) -> Option<f64> {
    present(field)
        .and_then(|raw| raw.parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Score one round: trimmed middle of the judge scores, plus D, minus P.
pub fn score_round(entry: &MarksEntry) -> f64 {
    round_breakdown(entry).score
}

/// Same as [`score_round`] but keeps every intermediate value for display.
///
/// With fewer than two judge scores no trimming happens and they are summed.
/// Otherwise exactly one minimum and one maximum are dropped, whatever the
/// count, and the rest is divided by 1 (two or three scores) or 2 (four or
/// more). Two scores therefore leave an empty middle worth 0.
pub fn round_breakdown(entry: &MarksEntry) -> RoundBreakdown {
    let deduction = parse_field(&entry.d).unwrap_or(0.0);
    let penalty = parse_field(&entry.p).unwrap_or(0.0);
    let judge_scores: Vec<f64> = entry
        .judge_fields()
        .iter()
        .filter_map(|field| parse_field(field))
        .collect();

    let n = judge_scores.len();
    if n < 2 {
        let sum: f64 = judge_scores.iter().sum();
        return RoundBreakdown {
            deduction,
            penalty,
            middle: judge_scores.clone(),
            judge_scores,
            dropped_low: None,
            dropped_high: None,
            divisor: 1.0,
            middle_average: sum,
            score: sum + deduction - penalty,
        };
    }

    let mut sorted = judge_scores.clone();
    sorted.sort_by(f64::total_cmp);
    let dropped_low = sorted.first().copied();
    let dropped_high = sorted.last().copied();
    let middle = sorted[1..n - 1].to_vec();

    let divisor = if n >= 4 { 2.0 } else { 1.0 };
    let middle_average = middle.iter().sum::<f64>() / divisor;

    RoundBreakdown {
        deduction,
        penalty,
        judge_scores,
        dropped_low,
        dropped_high,
        middle,
        divisor,
        middle_average,
        score: middle_average + deduction - penalty,
    }
}
