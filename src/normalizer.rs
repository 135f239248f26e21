use crate::fields::{self, FieldMap, RawFields};
use chrono::NaiveDate;

/// Quantity label injected in front of medicine quantities, leading comma
/// included: `", Qty – 30"`.
pub const QTY_LABEL: &str = ", Qty – ";

const RUPEE_SIGN: char = '₹';

/// Normalize a raw provider mapping into the canonical field mapping used by
/// the template filler. The derived month field is taken from the local clock.
pub fn normalize(raw: &RawFields) -> FieldMap {
    normalize_at(raw, chrono::Local::now().date_naive())
}

/// Same as [`normalize`] with an explicit processing date, so the derived
/// `CURRENT_MONTH_YEAR` value is deterministic.
///
/// Normalization never fails: every rule degrades to an empty string on
/// unparsable input, because one malformed field must not abort the fill.
pub fn normalize_at(raw: &RawFields, today: NaiveDate) -> FieldMap {
    let mut out = FieldMap::new();

    // Every supplied key survives, unknown ones included; null folds to empty.
    for (key, value) in raw {
        out.set(key.clone(), value.clone().unwrap_or_default());
    }

    // The fixed vocabulary is always present, even when the provider dropped keys.
    for key in fields::field_vocabulary() {
        if !out.contains_key(&key) {
            out.set(key, "");
        }
    }

    if out.is_blank(fields::DATE_EXPENDITURE) {
        let fallback = out.get(fields::DATE).to_string();
        out.set(fields::DATE_EXPENDITURE, fallback);
    }

    // Always recomputed; an externally supplied value is overridden.
    out.set(
        fields::CURRENT_MONTH_YEAR,
        today.format("%b %Y").to_string(),
    );

    let payable = rupees_payable(out.get(fields::TOTAL_AMOUNT));
    out.set(fields::TOTAL_AMOUNT, payable);

    let subtotal = money_two_decimals(out.get(fields::TOTAL_WO_DISCOUNT));
    let subtotal = if subtotal.is_empty() {
        subtotal
    } else {
        format!("{} {}", RUPEE_SIGN, subtotal)
    };
    out.set(fields::TOTAL_WO_DISCOUNT, subtotal);

    for slot in 1..=fields::MEDICINE_SLOTS {
        let amount = money_two_decimals(out.get(&fields::amount_key(slot)));
        out.set(fields::amount_key(slot), amount);

        let quantity = quantity_fragment(out.get(&fields::quantity_key(slot)));
        out.set(fields::quantity_key(slot), quantity);
    }

    out
}

/// "Total payable" display convention: `₹ <integer> /-`, fractional part
/// truncated. `"1234.50"`, `"₹1,234.50"` and `"1234.50/-"` all render as
/// `"₹ 1234 /-"`. No parseable number yields an empty string.
pub fn rupees_payable(raw: &str) -> String {
    match first_number(&strip_currency_noise(raw)) {
        Some(value) => format!("{} {} /-", RUPEE_SIGN, value.trunc() as i64),
        None => String::new(),
    }
}

/// "Line amount" display convention: the first numeric substring rendered with
/// exactly two decimals (`"192"` → `"192.00"`), or empty when no number is
/// present.
pub fn money_two_decimals(raw: &str) -> String {
    match first_number(&strip_currency_noise(raw)) {
        Some(value) => format!("{:.2}", value),
        None => String::new(),
    }
}

/// Medicine quantity presentation fragment. A bare `"30"` becomes
/// `", Qty – 30"`; an empty value stays empty (the slot paragraph is deleted
/// instead of rendering a dash). Values already carrying the label pass
/// through unchanged so normalization stays idempotent.
pub fn quantity_fragment(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with(", Qty") {
        return trimmed.to_string();
    }
    format!("{}{}", QTY_LABEL, trimmed)
}

fn strip_currency_noise(text: &str) -> String {
    text.replace(RUPEE_SIGN, "")
        .replace("/-", "")
        .replace(',', "")
}

/// First substring matching an integer-or-decimal pattern, parsed as f64.
fn first_number(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let mut end = i;
            // Optional fractional part; a trailing bare dot is not part of it.
            if i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                end = i;
            }
            return text[start..end].parse::<f64>().ok();
        }
        i += 1;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;

    fn raw(pairs: &[(&str, Option<&str>)]) -> RawFields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect()
    }

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 24).unwrap()
    }

    #[test]
    fn test_payable_convention_variants() {
        assert_eq!(rupees_payable("1234.50"), "₹ 1234 /-");
        assert_eq!(rupees_payable("₹1,234.50"), "₹ 1234 /-");
        assert_eq!(rupees_payable("1234.50/-"), "₹ 1234 /-");
        assert_eq!(rupees_payable("₹ 1234 /-"), "₹ 1234 /-");
        assert_eq!(rupees_payable(""), "");
        assert_eq!(rupees_payable("no charge"), "");
    }

    #[test]
    fn test_line_amount_convention() {
        assert_eq!(money_two_decimals("192"), "192.00");
        assert_eq!(money_two_decimals("₹1,192.5"), "1192.50");
        assert_eq!(money_two_decimals("45.5"), "45.50");
        assert_eq!(money_two_decimals(""), "");
        assert_eq!(money_two_decimals("n/a"), "");
    }

    #[test]
    fn test_quantity_fragment() {
        assert_eq!(quantity_fragment("30"), ", Qty – 30");
        assert_eq!(quantity_fragment("  30 "), ", Qty – 30");
        assert_eq!(quantity_fragment(""), "");
        assert_eq!(quantity_fragment("   "), "");
        // Already-normalized values are left alone.
        assert_eq!(quantity_fragment(", Qty – 30"), ", Qty – 30");
    }

    #[test]
    fn test_first_number_scanning() {
        assert_eq!(first_number("abc 12.5 def"), Some(12.5));
        assert_eq!(first_number("12."), Some(12.0));
        assert_eq!(first_number("x-40"), Some(40.0));
        assert_eq!(first_number("12.5.6"), Some(12.5));
        assert_eq!(first_number("none"), None);
    }

    #[test]
    fn test_vocabulary_always_present() {
        let fields_out = normalize_at(&raw(&[("PATIENT_NAME", Some("A Sharma"))]), fixed_today());

        for key in fields::field_vocabulary() {
            assert!(fields_out.contains_key(&key), "missing key {}", key);
        }
        assert_eq!(fields_out.get("PATIENT_NAME"), "A Sharma");
        assert_eq!(fields_out.get("MED_4"), "");
    }

    #[test]
    fn test_null_and_missing_become_empty() {
        let fields_out = normalize_at(&raw(&[("DIAGNOSIS", None)]), fixed_today());
        assert_eq!(fields_out.get("DIAGNOSIS"), "");
        assert_eq!(fields_out.get("AMT_2"), "");
    }

    #[test]
    fn test_unknown_keys_are_preserved() {
        let fields_out = normalize_at(&raw(&[("HOSPITAL_NAME", Some("MH Jalandhar"))]), fixed_today());
        assert_eq!(fields_out.get("HOSPITAL_NAME"), "MH Jalandhar");
    }

    #[test]
    fn test_expenditure_date_falls_back_to_bill_date() {
        let fields_out = normalize_at(
            &raw(&[("DATE", Some("12-07-2026")), ("DATE_EXPENDITURE", Some(""))]),
            fixed_today(),
        );
        assert_eq!(fields_out.get("DATE_EXPENDITURE"), "12-07-2026");

        let fields_out = normalize_at(
            &raw(&[
                ("DATE", Some("12-07-2026")),
                ("DATE_EXPENDITURE", Some("15-07-2026")),
            ]),
            fixed_today(),
        );
        assert_eq!(fields_out.get("DATE_EXPENDITURE"), "15-07-2026");
    }

    #[test]
    fn test_current_month_is_always_recomputed() {
        let fields_out = normalize_at(
            &raw(&[("CURRENT_MONTH_YEAR", Some("Jan 1999"))]),
            fixed_today(),
        );
        assert_eq!(fields_out.get("CURRENT_MONTH_YEAR"), "Aug 2026");
    }

    #[test]
    fn test_subtotal_keeps_symbol_but_empty_stays_empty() {
        let fields_out = normalize_at(
            &raw(&[("TOTAL_WO_DISCOUNT", Some("1,234.5"))]),
            fixed_today(),
        );
        assert_eq!(fields_out.get("TOTAL_WO_DISCOUNT"), "₹ 1234.50");

        let fields_out = normalize_at(&raw(&[("TOTAL_WO_DISCOUNT", Some("tbd"))]), fixed_today());
        assert_eq!(fields_out.get("TOTAL_WO_DISCOUNT"), "");
    }

    #[test]
    fn test_total_amount_scenario() {
        let fields_out = normalize_at(&raw(&[("TOTAL_AMOUNT", Some("5432.90"))]), fixed_today());
        assert_eq!(fields_out.get("TOTAL_AMOUNT"), "₹ 5432 /-");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let first = normalize_at(
            &raw(&[
                ("PATIENT_NAME", Some("A Sharma")),
                ("DATE", Some("12-07-2026")),
                ("TOTAL_AMOUNT", Some("₹1,234.50")),
                ("TOTAL_WO_DISCOUNT", Some("1301.20")),
                ("MED_1", Some("Paracetamol 500mg")),
                ("QTY_MED_1", Some("30")),
                ("AMT_1", Some("192")),
            ]),
            fixed_today(),
        );

        let as_raw: RawFields = first
            .iter()
            .map(|(k, v)| (k.clone(), Some(v.clone())))
            .collect();
        let second = normalize_at(&as_raw, fixed_today());

        assert_eq!(first, second);
    }
}
