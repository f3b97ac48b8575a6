use super::round::{round_breakdown, score_round, RoundBreakdown};
use crate::marks::Rounds;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub round1: RoundBreakdown,
    pub round2: Option<RoundBreakdown>,
    pub final_score: f64,
}

/// Final score for a (student, event): round 1 alone, or the plain mean of
/// both rounds when round 2 carries data. Applies to both tiers.
pub fn final_score(rounds: &Rounds) -> f64 {
    let round1 = score_round(&rounds.round1);
    match rounds.second_round() {
        Some(round2) => (round1 + score_round(round2)) / 2.0,
        None => round1,
    }
}

pub fn score_breakdown(rounds: &Rounds) -> ScoreBreakdown {
    let round1 = round_breakdown(&rounds.round1);
    let round2 = rounds.second_round().map(round_breakdown);
    let final_score = match &round2 {
        Some(second) => (round1.score + second.score) / 2.0,
        None => round1.score,
    };
    ScoreBreakdown {
        round1,
        round2,
        final_score,
    }
}
