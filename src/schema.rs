use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::fields::{self, RawFields};

/// One purchased medicine as it appears on the bill. The claim form carries
/// at most five of these lines.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct MedicineLine {
    #[schemars(description = "Medicine name exactly as printed on the bill (e.g., 'Paracetamol 650mg')")]
    #[serde(default)]
    pub name: String,

    #[schemars(
        description = "Dosage form, abbreviated as printed: 'Tab', 'Cap', 'Syp', 'Inj' and so on. Empty if not stated."
    )]
    #[serde(default)]
    pub form: String,

    #[schemars(
        description = "Numeric quantity purchased, digits only (e.g., '30'). Empty if not stated."
    )]
    #[serde(default)]
    pub quantity: String,

    #[schemars(
        description = "Line amount for this medicine with two decimals and no currency symbol (e.g., '192.00'). Empty if not stated."
    )]
    #[serde(default)]
    pub amount: String,
}

/// Everything the extraction step reads off the bill and prescription images.
/// Values are verbatim strings; reformatting (dates, currency conventions,
/// quantity fragments) happens later in normalization, never in the extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ClaimExtraction {
    #[schemars(description = "Patient's full name as written on the prescription")]
    #[serde(default)]
    pub patient_name: String,

    #[schemars(description = "ECHS card number of the patient")]
    #[serde(default)]
    pub echs_card_no: String,

    #[schemars(description = "Service number of the ex-serviceman the patient claims under")]
    #[serde(default)]
    pub service_no: String,

    #[schemars(description = "Patient or claimant mobile number, digits only")]
    #[serde(default)]
    pub mobile_no: String,

    #[schemars(description = "Diagnosis or complaint as written on the prescription")]
    #[serde(default)]
    pub diagnosis: String,

    // The template key carries a trailing dot, so the wire key does too.
    #[schemars(description = "Invoice / bill number printed on the bill")]
    #[serde(default, rename = "INVOICE_NO.")]
    pub invoice_no: String,

    #[schemars(description = "Bill date in DD-MM-YYYY format")]
    #[serde(default)]
    pub date: String,

    #[schemars(
        description = "Date the expenditure was incurred, DD-MM-YYYY. Leave empty if identical to the bill date."
    )]
    #[serde(default)]
    pub date_expenditure: String,

    #[schemars(
        description = "Subtotal before any discount, two decimals, no currency symbol (e.g., '1450.00')"
    )]
    #[serde(default)]
    pub total_wo_discount: String,

    #[schemars(
        description = "Final payable amount after discount, two decimals, no currency symbol (e.g., '1234.50')"
    )]
    #[serde(default)]
    pub total_amount: String,

    #[schemars(
        description = "Payable amount written out in words (e.g., 'One Thousand Two Hundred Thirty Four Only')"
    )]
    #[serde(default)]
    pub amount_words: String,

    #[schemars(
        description = "Only the medicines actually purchased on this bill, at most five. Do not pad with empty lines."
    )]
    #[serde(default)]
    pub medicines: Vec<MedicineLine>,
}

impl ClaimExtraction {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ClaimExtraction)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }

    /// Flatten into the provider key vocabulary the normalizer and filler work
    /// with. Medicine lines land in slots 1..=5 in bill order; slots beyond
    /// the extracted lines stay absent and normalize to empty.
    pub fn into_raw_fields(self) -> RawFields {
        let mut raw = RawFields::new();
        raw.insert(fields::PATIENT_NAME.to_string(), Some(self.patient_name));
        raw.insert(fields::ECHS_CARD_NO.to_string(), Some(self.echs_card_no));
        raw.insert(fields::SERVICE_NO.to_string(), Some(self.service_no));
        raw.insert(fields::MOBILE_NO.to_string(), Some(self.mobile_no));
        raw.insert(fields::DIAGNOSIS.to_string(), Some(self.diagnosis));
        raw.insert(fields::INVOICE_NO.to_string(), Some(self.invoice_no));
        raw.insert(fields::DATE.to_string(), Some(self.date));
        raw.insert(
            fields::DATE_EXPENDITURE.to_string(),
            Some(self.date_expenditure),
        );
        raw.insert(
            fields::TOTAL_WO_DISCOUNT.to_string(),
            Some(self.total_wo_discount),
        );
        raw.insert(fields::TOTAL_AMOUNT.to_string(), Some(self.total_amount));
        raw.insert(fields::AMOUNT_WORDS.to_string(), Some(self.amount_words));

        for (i, line) in self
            .medicines
            .into_iter()
            .take(fields::MEDICINE_SLOTS)
            .enumerate()
        {
            let slot = i + 1;
            raw.insert(fields::medicine_key(slot), Some(line.name));
            raw.insert(fields::form_key(slot), Some(line.form));
            raw.insert(fields::quantity_key(slot), Some(line.quantity));
            raw.insert(fields::amount_key(slot), Some(line.amount));
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema_json = ClaimExtraction::schema_as_json().unwrap();
        assert!(schema_json.contains("PATIENT_NAME"));
        assert!(schema_json.contains("INVOICE_NO."));
        assert!(schema_json.contains("MEDICINES"));
        assert!(schema_json.contains("DD-MM-YYYY"));
        println!("Generated schema:\n{}", schema_json);
    }

    #[test]
    fn test_wire_keys_match_template_vocabulary() {
        let extraction = ClaimExtraction {
            patient_name: "A Sharma".to_string(),
            invoice_no: "INV-91".to_string(),
            ..ClaimExtraction::default()
        };

        let json = serde_json::to_string(&extraction).unwrap();
        assert!(json.contains("\"PATIENT_NAME\":\"A Sharma\""));
        assert!(json.contains("\"INVOICE_NO.\":\"INV-91\""));

        let back: ClaimExtraction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, extraction);
    }

    #[test]
    fn test_missing_wire_keys_default_to_empty() {
        let extraction: ClaimExtraction =
            serde_json::from_str(r#"{"PATIENT_NAME": "A Sharma"}"#).unwrap();
        assert_eq!(extraction.patient_name, "A Sharma");
        assert_eq!(extraction.diagnosis, "");
        assert!(extraction.medicines.is_empty());
    }

    #[test]
    fn test_flatten_into_slot_vocabulary() {
        let extraction = ClaimExtraction {
            patient_name: "A Sharma".to_string(),
            medicines: vec![
                MedicineLine {
                    name: "Paracetamol".to_string(),
                    form: "Tab".to_string(),
                    quantity: "30".to_string(),
                    amount: "192".to_string(),
                },
                MedicineLine {
                    name: "Atorvastatin".to_string(),
                    ..MedicineLine::default()
                },
            ],
            ..ClaimExtraction::default()
        };

        let raw = extraction.into_raw_fields();
        assert_eq!(raw.get("MED_1"), Some(&Some("Paracetamol".to_string())));
        assert_eq!(raw.get("QTY_MED_1"), Some(&Some("30".to_string())));
        assert_eq!(raw.get("MED_2"), Some(&Some("Atorvastatin".to_string())));
        // Unextracted slots are absent, not empty strings.
        assert!(!raw.contains_key("MED_3"));
        assert!(raw.get("CURRENT_MONTH_YEAR").is_none());
    }
}
