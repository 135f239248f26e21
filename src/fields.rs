use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const PATIENT_NAME: &str = "PATIENT_NAME";
pub const ECHS_CARD_NO: &str = "ECHS_CARD_NO";
pub const SERVICE_NO: &str = "SERVICE_NO";
pub const MOBILE_NO: &str = "MOBILE_NO";
pub const DIAGNOSIS: &str = "DIAGNOSIS";
/// The trailing dot is part of the key as it appears in the claim template.
pub const INVOICE_NO: &str = "INVOICE_NO.";
pub const DATE: &str = "DATE";
pub const DATE_EXPENDITURE: &str = "DATE_EXPENDITURE";
pub const TOTAL_WO_DISCOUNT: &str = "TOTAL_WO_DISCOUNT";
pub const TOTAL_AMOUNT: &str = "TOTAL_AMOUNT";
pub const AMOUNT_WORDS: &str = "AMOUNT_WORDS";
pub const CURRENT_MONTH_YEAR: &str = "CURRENT_MONTH_YEAR";

/// The claim form carries five medicine lines; lines 1-2 are part of the fixed
/// layout, lines 3-5 are optional and their paragraphs are removed when unused.
pub const MEDICINE_SLOTS: usize = 5;
pub const OPTIONAL_SLOTS: [usize; 3] = [3, 4, 5];

pub fn medicine_key(slot: usize) -> String {
    format!("MED_{}", slot)
}

pub fn form_key(slot: usize) -> String {
    format!("FORM_MED_{}", slot)
}

pub fn quantity_key(slot: usize) -> String {
    format!("QTY_MED_{}", slot)
}

pub fn amount_key(slot: usize) -> String {
    format!("AMT_{}", slot)
}

/// All four keys of one medicine slot, in template order.
pub fn slot_keys(slot: usize) -> [String; 4] {
    [
        medicine_key(slot),
        form_key(slot),
        quantity_key(slot),
        amount_key(slot),
    ]
}

/// Wrap a field name in the `{{...}}` delimiters used by the template.
/// Matching is case-sensitive and exact; no whitespace is tolerated inside
/// the braces.
pub fn placeholder(field: &str) -> String {
    format!("{{{{{}}}}}", field)
}

/// The fixed field vocabulary. Every one of these keys is present after
/// normalization, even if its value is empty.
pub fn field_vocabulary() -> Vec<String> {
    let mut keys: Vec<String> = [
        PATIENT_NAME,
        ECHS_CARD_NO,
        SERVICE_NO,
        MOBILE_NO,
        DIAGNOSIS,
        INVOICE_NO,
        DATE,
        DATE_EXPENDITURE,
        TOTAL_WO_DISCOUNT,
        TOTAL_AMOUNT,
        AMOUNT_WORDS,
        CURRENT_MONTH_YEAR,
    ]
    .iter()
    .map(|k| k.to_string())
    .collect();

    for slot in 1..=MEDICINE_SLOTS {
        keys.extend(slot_keys(slot));
    }

    keys
}

/// Fields whose rendered value must be bold + underlined when a paragraph
/// consists of nothing but that field's placeholder.
pub fn default_emphasized_fields() -> BTreeSet<String> {
    [
        PATIENT_NAME,
        ECHS_CARD_NO,
        SERVICE_NO,
        TOTAL_AMOUNT,
        AMOUNT_WORDS,
    ]
    .iter()
    .map(|k| k.to_string())
    .collect()
}

/// Raw provider output: a flat JSON object whose values may be null.
pub type RawFields = BTreeMap<String, Option<String>>;

/// Canonical field mapping produced by normalization. Absence and empty string
/// both mean "no data".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, String>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for a key, empty when the key is absent.
    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// True when the key is absent or its value is whitespace-only.
    pub fn is_blank(&self, key: &str) -> bool {
        self.get(key).trim().is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl FromIterator<(String, String)> for FieldMap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, String>> for FieldMap {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_is_complete() {
        let vocab = field_vocabulary();
        assert_eq!(vocab.len(), 32);

        for key in [PATIENT_NAME, INVOICE_NO, CURRENT_MONTH_YEAR] {
            assert!(vocab.contains(&key.to_string()), "missing {}", key);
        }
        for slot in 1..=MEDICINE_SLOTS {
            assert!(vocab.contains(&medicine_key(slot)));
            assert!(vocab.contains(&form_key(slot)));
            assert!(vocab.contains(&quantity_key(slot)));
            assert!(vocab.contains(&amount_key(slot)));
        }
    }

    #[test]
    fn test_placeholder_syntax() {
        assert_eq!(placeholder("PATIENT_NAME"), "{{PATIENT_NAME}}");
        assert_eq!(placeholder(&amount_key(3)), "{{AMT_3}}");
        assert_eq!(placeholder(INVOICE_NO), "{{INVOICE_NO.}}");
    }

    #[test]
    fn test_slot_keys_order() {
        assert_eq!(
            slot_keys(2),
            [
                "MED_2".to_string(),
                "FORM_MED_2".to_string(),
                "QTY_MED_2".to_string(),
                "AMT_2".to_string()
            ]
        );
    }

    #[test]
    fn test_emphasized_defaults() {
        let emphasized = default_emphasized_fields();
        assert_eq!(emphasized.len(), 5);
        assert!(emphasized.contains(PATIENT_NAME));
        assert!(emphasized.contains(AMOUNT_WORDS));
        assert!(!emphasized.contains(DIAGNOSIS));
    }

    #[test]
    fn test_field_map_blank_semantics() {
        let mut fields = FieldMap::new();
        assert!(fields.is_blank("MED_3"));

        fields.set("MED_3", "   ");
        assert!(fields.is_blank("MED_3"));

        fields.set("MED_3", "Paracetamol");
        assert!(!fields.is_blank("MED_3"));
        assert_eq!(fields.get("MED_3"), "Paracetamol");
        assert_eq!(fields.get("MED_4"), "");
    }

    #[test]
    fn test_field_map_serde_is_flat() {
        let mut fields = FieldMap::new();
        fields.set("PATIENT_NAME", "A Sharma");
        fields.set("INVOICE_NO.", "INV-91");

        let json = serde_json::to_string(&fields).unwrap();
        assert_eq!(json, r#"{"INVOICE_NO.":"INV-91","PATIENT_NAME":"A Sharma"}"#);

        let back: FieldMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fields);
    }
}
