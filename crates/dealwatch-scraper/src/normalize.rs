//! Currency amount normalization for locale-ambiguous price strings.
//!
//! This is best effort, not guaranteed-correct. Storefronts mix Swiss
//! (`1’234.50`), German (`1.234,50`) and English (`1,234.50`) conventions,
//! and a bare `"1.234"` cannot be disambiguated without context; the rules
//! below pick one reading and stick to it.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Parses a raw price fragment into a decimal amount.
///
/// 1. Keep only digits, `.`, `,` and `-`; drop separators dangling at either
///    end (`"Fr. 49.90"`, `"49.–"`).
/// 2. Both `.` and `,` present: whichever occurs last is the decimal
///    separator, the other is a thousands separator.
/// 3. Only `,`: decimal separator.
/// 4. Only `.`: decimal separator when followed by exactly two trailing
///    digits, otherwise a thousands separator (`"1.234"` → `1234`).
///
/// Returns `None` when no digits remain or the result does not parse.
#[must_use]
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    let cleaned = kept
        .trim_start_matches(['.', ','])
        .trim_end_matches(['.', ',', '-']);

    if !cleaned.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    let normalized = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) => {
            let (decimal, thousands) = if dot > comma { ('.', ',') } else { (',', '.') };
            cleaned.replace(thousands, "").replace(decimal, ".")
        }
        (None, Some(_)) => cleaned.replace(',', "."),
        (Some(_), None) => {
            if has_two_decimal_tail(cleaned) {
                cleaned.to_string()
            } else {
                cleaned.replace('.', "")
            }
        }
        (None, None) => cleaned.to_string(),
    };

    Decimal::from_str(&normalized).ok()
}

/// Parses a machine-formatted amount (`"1999.00"`, `"12"`), as found in
/// JSON feeds and structured metadata, falling back to [`parse_price`] for
/// anything localized.
#[must_use]
pub fn parse_machine_price(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    let is_plain = !trimmed.is_empty()
        && trimmed.matches('.').count() <= 1
        && trimmed
            .trim_start_matches('-')
            .bytes()
            .all(|b| b.is_ascii_digit() || b == b'.');
    if is_plain {
        if let Ok(value) = Decimal::from_str(trimmed) {
            return Some(value);
        }
    }
    parse_price(trimmed)
}

/// `true` for `…<digit>.<digit><digit>` endings.
fn has_two_decimal_tail(s: &str) -> bool {
    let bytes = s.as_bytes();
    let n = bytes.len();
    n >= 4
        && bytes[n - 3] == b'.'
        && bytes[n - 4].is_ascii_digit()
        && bytes[n - 2].is_ascii_digit()
        && bytes[n - 1].is_ascii_digit()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
