//! Locale-agnostic number parsing for extracted cells

/// Map full-width digits and punctuation to their ASCII forms
fn normalize_char(c: char) -> char {
    match c {
        '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
        '．' => '.',
        '，' => ',',
        _ => c,
    }
}

/// Parse a cell such as `4,200万元`, `12.5%` or `４２００` into a finite float
///
/// Every character that is not a digit or a decimal point is dropped, so
/// thousands separators, unit suffixes and signs disappear. Returns `None`
/// when nothing numeric is left or the value is not finite.
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let digits: String = raw
        .trim()
        .chars()
        .map(normalize_char)
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if !digits.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    let value: f64 = digits.parse().ok()?;
    value.is_finite().then_some(value)
}
