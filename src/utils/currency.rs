//! Rupiah amount formatting.
//!
//! Only the integer part is rendered: digits are grouped in threes from the
//! right and joined with the separator, and the currency marker goes in
//! front. `1234567` → `Rp 1.234.567`.

use crate::config::schema::DisplayConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub prefix: String,
    pub separator: String,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            prefix: "Rp".to_string(),
            separator: ".".to_string(),
        }
    }
}

impl CurrencyFormat {
    pub fn from_config(display: &DisplayConfig) -> Self {
        Self {
            prefix: display.currency_prefix.clone(),
            separator: display.thousands_separator.clone(),
        }
    }

    /// Format `amount`, dropping any fractional part.
    ///
    /// Non-finite input renders as zero.
    pub fn format(&self, amount: f64) -> String {
        let amount = if amount.is_finite() { amount.trunc() } else { 0.0 };
        let sign = if amount < 0.0 { "-" } else { "" };
        let digits = format!("{:.0}", amount.abs());
        format!("{} {}{}", self.prefix, sign, group_digits(&digits, &self.separator))
    }
}

/// Format with the default `Rp` / `.` convention.
pub fn format_rupiah(amount: f64) -> String {
    CurrencyFormat::default().format(amount)
}

fn group_digits(digits: &str, separator: &str) -> String {
    let head = digits.len() % 3;
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * separator.len());
    out.push_str(&digits[..head]);
    for (i, chunk) in digits.as_bytes()[head..].chunks(3).enumerate() {
        if head > 0 || i > 0 {
            out.push_str(separator);
        }
        // Digits are ASCII, so every chunk is valid UTF-8.
        out.push_str(std::str::from_utf8(chunk).unwrap_or_default());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_rupiah(1_234_567.0), "Rp 1.234.567");
        assert_eq!(format_rupiah(45_000.0), "Rp 45.000");
        assert_eq!(format_rupiah(100_000.0), "Rp 100.000");
    }

    #[test]
    fn small_values_have_no_separator() {
        assert_eq!(format_rupiah(0.0), "Rp 0");
        assert_eq!(format_rupiah(7.0), "Rp 7");
        assert_eq!(format_rupiah(999.0), "Rp 999");
    }

    #[test]
    fn fraction_is_truncated() {
        assert_eq!(format_rupiah(1000.99), "Rp 1.000");
        assert_eq!(format_rupiah(0.5), "Rp 0");
    }

    #[test]
    fn negative_keeps_sign_after_prefix() {
        assert_eq!(format_rupiah(-1234.0), "Rp -1.234");
    }

    #[test]
    fn non_finite_renders_zero() {
        assert_eq!(format_rupiah(f64::NAN), "Rp 0");
        assert_eq!(format_rupiah(f64::INFINITY), "Rp 0");
    }

    #[test]
    fn custom_prefix_and_separator() {
        let fmt = CurrencyFormat {
            prefix: "IDR".to_string(),
            separator: ",".to_string(),
        };
        assert_eq!(fmt.format(9_876_543.0), "IDR 9,876,543");
    }
}
