// Display helpers shared by the CLI, TUI and server.

use crate::units::Tmr;

/// Whole-currency amount with thousands separators: `Rs 341,000`
pub fn format_currency(amount: f64, symbol: &str) -> String {
    if !amount.is_finite() {
        return format!("{} 0", symbol);
    }

    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-{} {}", symbol, grouped)
    } else {
        format!("{} {}", symbol, grouped)
    }
}

/// Fixed-decimal weight, `0.0000` for zero
pub fn format_weight(weight: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, weight)
}

pub fn format_tmr(tmr: &Tmr) -> String {
    format!(
        "{} Tola, {} Masha, {:.2} Ratti",
        tmr.tola, tmr.masha, tmr.ratti
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(341000.0, "Rs"), "Rs 341,000");
        assert_eq!(format_currency(312594.7, "Rs"), "Rs 312,595");
        assert_eq!(format_currency(999.4, "Rs"), "Rs 999");
        assert_eq!(format_currency(1234567.0, "$"), "$ 1,234,567");
        assert_eq!(format_currency(0.0, "Rs"), "Rs 0");
        assert_eq!(format_currency(-2500.0, "Rs"), "-Rs 2,500");
        assert_eq!(format_currency(f64::NAN, "Rs"), "Rs 0");
    }

    #[test]
    fn test_format_weight() {
        assert_eq!(format_weight(0.0, 4), "0.0000");
        assert_eq!(format_weight(11.664, 4), "11.6640");
        assert_eq!(format_weight(9.1674, 2), "9.17");
    }

    #[test]
    fn test_format_tmr() {
        assert_eq!(format_tmr(&Tmr::new(1.0, 2.0, 3.5)), "1 Tola, 2 Masha, 3.50 Ratti");
    }
}
