//! Phone number normalization for Uzbekistan numbers.
//!
//! Numbers are shown in one of two canonical shapes:
//!
//! - international: `+998 XX XXX XX XX`
//! - bare local: `XX XXX XX XX`
//!
//! [`normalize`] runs on every keystroke and always returns a best-effort
//! string; partial input renders as partial groups without padding.
//! [`on_focus`] and [`on_blur`] implement the field's focus and blur
//! behavior.

/// Country code digits.
pub const COUNTRY_CODE: &str = "998";

/// Country code as rendered at the start of an international number.
pub const PHONE_PREFIX: &str = "+998";

/// Value placed into an empty field when it gains focus.
pub const FOCUS_PREFILL: &str = "+998 ";

/// Digits in a national number (operator code plus subscriber number).
pub const LOCAL_DIGITS: usize = 9;

/// Digits in a full international number, country code included.
pub const INTERNATIONAL_DIGITS: usize = COUNTRY_CODE.len() + LOCAL_DIGITS;

/// Group widths of a national number: `XX XXX XX XX`.
const GROUPS: [usize; 4] = [2, 3, 2, 2];

/// Return only the ASCII digits of `input`.
#[must_use]
pub fn digits(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Reformat raw phone input into its canonical display shape.
///
/// - Digits starting with `998` (with or without a leading `+`) render as
///   `+998 XX XXX XX XX`.
/// - Digits starting with a bare `9` get an implicit `998` and render the
///   same way.
/// - Anything else is grouped as a bare local number.
///
/// Digits past the ninth national digit are dropped. Every character other
/// than a digit is discarded, so `normalize(normalize(x)) == normalize(x)`.
///
/// # Examples
///
/// ```
/// use leadbox_core::phone::normalize;
///
/// assert_eq!(normalize("901234567"), "+998 90 123 45 67");
/// assert_eq!(normalize("+998(90)123-45-67"), "+998 90 123 45 67");
/// assert_eq!(normalize("+998 90 1"), "+998 90 1");
/// assert_eq!(normalize("123"), "12 3");
/// ```
#[must_use]
pub fn normalize(input: &str) -> String {
    let digits = digits(input);

    // A leading `+` never changes the outcome: `+998…` always has digits
    // starting with `998`.
    if let Some(national) = digits.strip_prefix(COUNTRY_CODE) {
        return international(national);
    }

    if digits.starts_with('9') {
        return international(&digits);
    }

    group(&digits)
}

/// Value the field should hold after gaining focus.
///
/// An empty field is pre-filled with `+998 ` so the visitor does not have to
/// type the country code; anything else is left alone.
#[must_use]
pub fn on_focus(current: &str) -> String {
    if current.trim().is_empty() {
        FOCUS_PREFILL.to_owned()
    } else {
        current.to_owned()
    }
}

/// Value the field should hold after losing focus.
///
/// - A 9-digit national number gets the country code inserted.
/// - A `998…` number typed without the `+` is reformatted with separators.
/// - Everything else, canonical international numbers included, is left as
///   it is.
#[must_use]
pub fn on_blur(current: &str) -> String {
    let trimmed = current.trim();
    if trimmed.is_empty() || trimmed.starts_with(PHONE_PREFIX) {
        return current.to_owned();
    }

    let digits = digits(trimmed);
    if digits.len() == LOCAL_DIGITS {
        return normalize(&format!("{COUNTRY_CODE}{digits}"));
    }
    if digits.starts_with(COUNTRY_CODE) {
        return normalize(&digits);
    }

    current.to_owned()
}

fn international(national: &str) -> String {
    let grouped = group(national);
    if grouped.is_empty() {
        PHONE_PREFIX.to_owned()
    } else {
        format!("{PHONE_PREFIX} {grouped}")
    }
}

/// Split up to nine digits into `XX XXX XX XX`, skipping groups not yet typed.
fn group(digits: &str) -> String {
    let digits = &digits[..digits.len().min(LOCAL_DIGITS)];
    let mut parts = Vec::with_capacity(GROUPS.len());
    let mut start = 0;

    for width in GROUPS {
        if start >= digits.len() {
            break;
        }
        let end = (start + width).min(digits.len());
        parts.push(&digits[start..end]);
        start = end;
    }

    parts.join(" ")
}
