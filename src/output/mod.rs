pub mod formatter;

pub use formatter::{
    format_breakdown, format_outcome, format_qualifiers, format_requests, format_results,
    format_score, should_use_colors, Names,
};
