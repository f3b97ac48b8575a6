use crate::marks::{present, MarksEntry, Rounds};

/// Check every numeric field of one round. Unset or blank fields are fine;
/// anything else must parse as a finite number.
/// Returns all validation errors at once (not just the first).
pub fn validate_entry(label: &str, entry: &MarksEntry) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    for (name, field) in entry.numeric_fields() {
        let Some(raw) = present(field) else {
            continue;
        };
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => {}
            Ok(_) => errors.push(format!("{}.{}: '{}' is not a finite number", label, name, raw)),
            Err(_) => errors.push(format!("{}.{}: '{}' is not a number", label, name, raw)),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate round 1 and, when present, round 2.
pub fn validate_rounds(rounds: &Rounds) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Err(round_errors) = validate_entry("round1", &rounds.round1) {
        errors.extend(round_errors);
    }
    if let Some(round2) = &rounds.round2 {
        if let Err(round_errors) = validate_entry("round2", round2) {
            errors.extend(round_errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
