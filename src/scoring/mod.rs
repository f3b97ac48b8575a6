pub mod combine;
pub mod round;
pub mod validation;

pub use combine::{final_score, score_breakdown, ScoreBreakdown};
pub use round::{round_breakdown, score_round, RoundBreakdown};
pub use validation::{validate_entry, validate_rounds};
