// src/core/amount.rs
// Amount normalization: "฿ 1,234.50 THB" -> "1234.50".

/// Keep digits and '.', drop thousands commas and everything else.
/// Empty residue becomes "0". Never fails; non-numeric residue (e.g. "1.2.3")
/// passes through as the cleaned string.
pub fn normalize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() { s!("0") } else { cleaned }
}

/// Numeric value of the normalized amount, if it is a number at all.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let n = normalize(raw);
    // f64::from_str accepts "inf"/"nan"; the residue cannot contain letters.
    n.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Dedup key for the sent-record ledger: `<identity>_<normalized amount>`.
pub fn delivery_key(identity: &str, normalized_amount: &str) -> String {
    join!(identity, "_", normalized_amount)
}
