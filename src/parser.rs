// 🔢 Input Parser - numeric text from fields, CLI args and query strings
//
// Policy: parse failures become 0. Several calculators recompute on every
// keystroke, so an empty or half-typed field must read as zero rather than
// as an error. The manual rate edit is the one place that needs strict
// parsing, see `parse_number_strict`.

// ============================================================================
// FIELD LIMITS
// ============================================================================

/// Currency fields keep two decimals
pub const CURRENCY_DECIMALS: usize = 2;

/// Gram fields keep four decimals
pub const GRAMS_DECIMALS: usize = 4;

/// Ratti fields keep two decimals
pub const RATTI_DECIMALS: usize = 2;

/// Masha is entered as a whole number below one tola
pub const MAX_MASHA_INPUT: u32 = 11;

/// Ratti is entered as a fraction below one masha
pub const MAX_RATTI_INPUT: f64 = 7.99;

// ============================================================================
// LENIENT PARSING
// ============================================================================

/// Parse the longest numeric prefix of `text`, or 0.0 if there is none.
///
/// `"12.5"` -> 12.5, `"12.5g"` -> 12.5, `""` -> 0.0, `"abc"` -> 0.0.
/// NaN and infinities also become 0.0.
pub fn parse_number(text: &str) -> f64 {
    let prefix = numeric_prefix(text.trim());
    match prefix.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Strict parse: the whole (trimmed) text must be a finite number.
pub fn parse_number_strict(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn numeric_prefix(text: &str) -> &str {
    let bytes = text.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return "";
    }

    // Exponent only counts when followed by at least one digit
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    &text[..end]
}

// ============================================================================
// TEXT FIELD SANITIZING
// ============================================================================

/// Clean keystroke input for a decimal field.
///
/// Drops every character that is not a digit or '.', truncates the fraction
/// to `max_decimals`, and returns `None` when the text would contain a second
/// decimal point (the caller keeps the previous value).
pub fn sanitize_decimal(text: &str, max_decimals: usize) -> Option<String> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let mut parts = cleaned.splitn(3, '.');
    let whole = parts.next().unwrap_or("");
    let fraction = parts.next();
    if parts.next().is_some() {
        return None;
    }

    Some(match fraction {
        Some(frac) if frac.len() > max_decimals => {
            format!("{}.{}", whole, &frac[..max_decimals])
        }
        Some(frac) => format!("{}.{}", whole, frac),
        None => whole.to_string(),
    })
}

/// Clean keystroke input for a whole-number field
pub fn sanitize_integer(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Masha field: whole number no greater than 11
pub fn accept_masha_input(text: &str) -> Option<String> {
    let cleaned = sanitize_integer(text);
    let accepted = match cleaned.parse::<u64>() {
        Ok(value) => value <= MAX_MASHA_INPUT as u64,
        Err(_) => cleaned.is_empty(),
    };
    accepted.then_some(cleaned)
}

/// Ratti field: up to two decimals, no greater than 7.99
pub fn accept_ratti_input(text: &str) -> Option<String> {
    let cleaned = sanitize_decimal(text, RATTI_DECIMALS)?;
    (parse_number(&cleaned) <= MAX_RATTI_INPUT).then_some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_coerces_garbage_to_zero() {
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("   "), 0.0);
        assert_eq!(parse_number("abc"), 0.0);
        assert_eq!(parse_number("."), 0.0);
        assert_eq!(parse_number("-"), 0.0);
        assert_eq!(parse_number("NaN"), 0.0);
        assert_eq!(parse_number("inf"), 0.0);
    }

    #[test]
    fn test_parse_number_reads_prefix() {
        assert_eq!(parse_number("12.5"), 12.5);
        assert_eq!(parse_number(" 12.5g "), 12.5);
        assert_eq!(parse_number("3."), 3.0);
        assert_eq!(parse_number(".5"), 0.5);
        assert_eq!(parse_number("1.2.3"), 1.2);
        assert_eq!(parse_number("-4"), -4.0);
        assert_eq!(parse_number("1e3"), 1000.0);
        assert_eq!(parse_number("2e"), 2.0);
    }

    #[test]
    fn test_parse_number_strict() {
        assert_eq!(parse_number_strict("341000"), Some(341000.0));
        assert_eq!(parse_number_strict(" 12.5 "), Some(12.5));
        assert_eq!(parse_number_strict("12.5g"), None);
        assert_eq!(parse_number_strict(""), None);
        assert_eq!(parse_number_strict("inf"), None);
    }

    #[test]
    fn test_sanitize_decimal() {
        assert_eq!(sanitize_decimal("12a.3456789", 4), Some("12.3456".to_string()));
        assert_eq!(sanitize_decimal("1,000", 2), Some("1000".to_string()));
        assert_eq!(sanitize_decimal("12.", 2), Some("12.".to_string()));
        assert_eq!(sanitize_decimal("1.2.3", 2), None);
        assert_eq!(sanitize_decimal("", 2), Some(String::new()));
    }

    #[test]
    fn test_field_limits() {
        assert_eq!(sanitize_integer("1a2"), "12");
        assert_eq!(accept_masha_input("11"), Some("11".to_string()));
        assert_eq!(accept_masha_input("12"), None);
        assert_eq!(accept_masha_input(""), Some(String::new()));
        assert_eq!(accept_masha_input("99999999999"), None);
        assert_eq!(accept_masha_input("99999999999999999999999"), None);
        assert_eq!(accept_ratti_input("7.99"), Some("7.99".to_string()));
        assert_eq!(accept_ratti_input("7.999"), Some("7.99".to_string()));
        assert_eq!(accept_ratti_input("8"), None);
    }
}
