use owo_colors::OwoColorize;
use std::collections::HashMap;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::lifecycle::SaveOutcome;
use crate::marks::{EditRequest, Event, Student};
use crate::qualify::{NoDataReason, Selection};
use crate::results::EventResults;
use crate::scoring::{RoundBreakdown, ScoreBreakdown};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a score with at most two decimals and no trailing zeros
/// (10.5, 9.25, -7, 0)
pub fn format_score(score: f64) -> String {
    let formatted = format!("{:.2}", score);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Display names for roster ids, falling back to the id itself.
#[derive(Debug, Default)]
pub struct Names {
    students: HashMap<String, String>,
    events: HashMap<String, String>,
}

impl Names {
    pub fn new(students: &[Student], events: &[Event]) -> Self {
        let pick = |id: &str, name: &str| {
            if name.trim().is_empty() {
                id.to_string()
            } else {
                name.to_string()
            }
        };
        Self {
            students: students
                .iter()
                .map(|s| (s.id.clone(), pick(&s.id, &s.name)))
                .collect(),
            events: events
                .iter()
                .map(|e| (e.id.clone(), pick(&e.id, &e.name)))
                .collect(),
        }
    }

    pub fn student<'a>(&'a self, id: &'a str) -> &'a str {
        self.students.get(id).map(String::as_str).unwrap_or(id)
    }

    pub fn event<'a>(&'a self, id: &'a str) -> &'a str {
        self.events.get(id).map(String::as_str).unwrap_or(id)
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn format_round(label: &str, round: &RoundBreakdown) -> String {
    let judges = round
        .judge_scores
        .iter()
        .map(|s| format_score(*s))
        .collect::<Vec<_>>()
        .join(", ");
    let dropped = match (round.dropped_low, round.dropped_high) {
        (Some(low), Some(high)) => format!(
            " (dropped {} and {})",
            format_score(low),
            format_score(high)
        ),
        _ => String::new(),
    };
    format!(
        "{}: {}\n  Judges: [{}]{}\n  Middle average: {} (/{})\n  D: +{}  P: -{}",
        label,
        format_score(round.score),
        judges,
        dropped,
        format_score(round.middle_average),
        format_score(round.divisor),
        format_score(round.deduction),
        format_score(round.penalty),
    )
}

/// Multi-line explanation of how a final score was reached
pub fn format_breakdown(breakdown: &ScoreBreakdown, use_colors: bool) -> String {
    let mut lines = vec![format_round("Round 1", &breakdown.round1)];
    if let Some(round2) = &breakdown.round2 {
        lines.push(format_round("Round 2", round2));
    }
    let total = format_score(breakdown.final_score);
    if use_colors {
        lines.push(format!("Final: {}", total.bold()));
    } else {
        lines.push(format!("Final: {}", total));
    }
    lines.join("\n")
}

/// Qualifier table: index, score, student, event. No headers.
pub fn format_qualifiers(selection: &Selection, names: &Names, use_colors: bool) -> String {
    let candidates = match selection {
        Selection::Qualified(candidates) => candidates,
        Selection::NoData(reason) => {
            return match reason {
                NoDataReason::NoStudents => "No students registered.".to_string(),
                NoDataReason::NoEvents => "No events registered.".to_string(),
                NoDataReason::NoRecords => "No tier-1 marks recorded yet.".to_string(),
            };
        }
    };

    let term_width = get_terminal_width();
    let score_width = 7;
    let separator = "  ";

    candidates
        .iter()
        .enumerate()
        .map(|(idx, candidate)| {
            let index_str = format!("{:>2}.", idx + 1);
            let score_padded = format!(
                "{:>width$}",
                format_score(candidate.score),
                width = score_width
            );
            let event = names.event(&candidate.event_id);
            let fixed_width =
                index_str.len() + 1 + score_width + separator.len() * 2 + event.chars().count();

            let student = match term_width {
                Some(width) if width > fixed_width + 10 => {
                    truncate_name(names.student(&candidate.student_id), width - fixed_width)
                }
                Some(_) => truncate_name(names.student(&candidate.student_id), 20),
                None => names.student(&candidate.student_id).to_string(),
            };

            if use_colors {
                format!(
                    "{} {}{}{}{}{}",
                    index_str.dimmed(),
                    score_padded.bold(),
                    separator,
                    student,
                    separator,
                    event.cyan()
                )
            } else {
                format!(
                    "{} {}{}{}{}{}",
                    index_str, score_padded, separator, student, separator, event
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ranked results, one block per event
pub fn format_results(results: &[EventResults], names: &Names, use_colors: bool) -> String {
    if results.is_empty() {
        return "No marks recorded.".to_string();
    }

    results
        .iter()
        .map(|group| {
            let title = names.event(&group.event_id);
            let header = if use_colors {
                title.bold().to_string()
            } else {
                title.to_string()
            };
            let rows = group.rows.iter().map(|row| {
                let rounds = match row.round2 {
                    Some(round2) => {
                        format!("{} / {}", format_score(row.round1), format_score(round2))
                    }
                    None => format_score(row.round1),
                };
                format!(
                    "{:>3}. {:>7}  {}  ({})",
                    row.rank,
                    format_score(row.final_score),
                    names.student(&row.student_id),
                    rounds
                )
            });
            std::iter::once(header)
                .chain(rows)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One line per edit request
pub fn format_requests(requests: &[EditRequest], use_colors: bool) -> String {
    if requests.is_empty() {
        return "No edit requests.".to_string();
    }

    requests
        .iter()
        .map(|request| {
            let created = request.created_at.format("%Y-%m-%d %H:%M");
            if use_colors {
                format!(
                    "{}  {:<9}  mark {}  by {}  {}",
                    request.id.dimmed(),
                    request.status.as_str().yellow(),
                    request.mark_id,
                    request.requester_id,
                    created
                )
            } else {
                format!(
                    "{}  {:<9}  mark {}  by {}  {}",
                    request.id,
                    request.status.as_str(),
                    request.mark_id,
                    request.requester_id,
                    created
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Human-readable message for a save attempt
pub fn format_outcome(outcome: &SaveOutcome) -> String {
    match outcome {
        SaveOutcome::Created {
            mark_id,
            final_score,
            ..
        } => format!("Saved marks {} (final score {})", mark_id, format_score(*final_score)),
        SaveOutcome::Updated {
            mark_id,
            final_score,
            completed_request,
            ..
        } => match completed_request {
            Some(request_id) => format!(
                "Updated marks {} under approved request {} (final score {})",
                mark_id,
                request_id,
                format_score(*final_score)
            ),
            None => format!(
                "Updated marks {} (final score {})",
                mark_id,
                format_score(*final_score)
            ),
        },
        SaveOutcome::EditRequested {
            mark_id,
            request_id,
            previous,
        } => {
            let note = match previous {
                Some(status) => format!(" (previous request was {})", status),
                None => String::new(),
            };
            format!(
                "Marks {} already recorded. Edit request {} sent for approval{}; \
                 nothing was changed.",
                mark_id, request_id, note
            )
        }
        SaveOutcome::AwaitingApproval {
            mark_id,
            request_id,
        } => format!(
            "Edit request {} for marks {} is still pending approval; nothing was changed.",
            request_id, mark_id
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::{EditRequestStatus, QualificationCandidate};
    use crate::results::ResultRow;
    use chrono::Utc;

    fn names() -> Names {
        Names::new(
            &[
                Student {
                    id: "s1".to_string(),
                    name: "Ada Park".to_string(),
                },
                Student {
                    id: "s2".to_string(),
                    name: String::new(),
                },
            ],
            &[Event {
                id: "e1".to_string(),
                name: "Floor".to_string(),
            }],
        )
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(10.5), "10.5");
        assert_eq!(format_score(9.25), "9.25");
        assert_eq!(format_score(-7.0), "-7");
        assert_eq!(format_score(0.0), "0");
        assert_eq!(format_score(1.0 / 3.0), "0.33");
        assert_eq!(format_score(-0.001), "0");
    }

    #[test]
    fn test_names_fall_back_to_id() {
        let names = names();
        assert_eq!(names.student("s1"), "Ada Park");
        assert_eq!(names.student("s2"), "s2");
        assert_eq!(names.student("s9"), "s9");
        assert_eq!(names.event("e1"), "Floor");
    }

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("short", 10), "short");
        assert_eq!(truncate_name("a much longer name", 8), "a muc...");
        assert_eq!(truncate_name("abcdef", 2), "ab");
    }

    #[test]
    fn test_format_qualifiers_plain() {
        let selection = Selection::Qualified(vec![QualificationCandidate {
            student_id: "s1".to_string(),
            event_id: "e1".to_string(),
            score: 10.5,
        }]);
        let output = format_qualifiers(&selection, &names(), false);
        assert!(output.starts_with(" 1."));
        assert!(output.contains("10.5"));
        assert!(output.contains("Ada Park"));
        assert!(output.ends_with("Floor"));
    }

    #[test]
    fn test_format_qualifiers_no_data() {
        let selection = Selection::NoData(NoDataReason::NoRecords);
        let output = format_qualifiers(&selection, &names(), false);
        assert_eq!(output, "No tier-1 marks recorded yet.");
    }

    #[test]
    fn test_format_results() {
        let results = vec![EventResults {
            event_id: "e1".to_string(),
            rows: vec![ResultRow {
                rank: 1,
                student_id: "s1".to_string(),
                mark_id: "m1".to_string(),
                round1: 8.0,
                round2: Some(10.0),
                final_score: 9.0,
            }],
        }];
        let output = format_results(&results, &names(), false);
        assert_eq!(output, "Floor\n  1.       9  Ada Park  (8 / 10)");
    }

    #[test]
    fn test_format_requests() {
        let requests = vec![EditRequest {
            id: "r1".to_string(),
            mark_id: "m1".to_string(),
            requester_id: "sup-1".to_string(),
            status: EditRequestStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }];
        let output = format_requests(&requests, false);
        assert!(output.starts_with("r1  pending    mark m1  by sup-1"));
        assert_eq!(format_requests(&[], false), "No edit requests.");
    }

    #[test]
    fn test_format_outcome_messages() {
        let created = SaveOutcome::Created {
            mark_id: "m1".to_string(),
            final_score: 10.5,
            notified: true,
        };
        assert_eq!(format_outcome(&created), "Saved marks m1 (final score 10.5)");

        let requested = SaveOutcome::EditRequested {
            mark_id: "m1".to_string(),
            request_id: "r2".to_string(),
            previous: Some(EditRequestStatus::Rejected),
        };
        assert!(format_outcome(&requested).contains("previous request was rejected"));
    }
}
