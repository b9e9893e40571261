//! Driver-licence check against a fixed DVLA-shaped sample.
//!
//! There is no live licence API behind this yet; the record is the documented sample response.

use rand::Rng;
use serde::{Deserialize, Serialize};

const LICENCE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const LICENCE_NUMBER_LENGTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverRecord {
    pub driver: Driver,
    pub licence: Licence,
    pub entitlement: Vec<Entitlement>,
    pub endorsements: Vec<Endorsement>,
    pub test_pass: Vec<TestPass>,
    pub token: PhotocardToken,
    pub cpc: Cpc,
    pub holder: Holder,
    #[serde(default)]
    pub errors: Vec<ApiError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub driving_licence_number: String,
    pub first_names: String,
    pub last_name: String,
    pub gender: String,
    pub date_of_birth: String,
    pub address: Address,
    pub disqualified_until: Option<String>,
    pub disqualified_for_life: bool,
    pub disqualified_pending_sentence: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub unstructured_address: UnstructuredAddress,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnstructuredAddress {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
    #[serde(default)]
    pub line3: String,
    #[serde(default)]
    pub line4: String,
    #[serde(default)]
    pub line5: String,
    #[serde(default)]
    pub postcode: String,
}

impl UnstructuredAddress {
    /// Non-empty address parts joined with `", "`.
    pub fn joined(&self) -> String {
        [
            &self.line1,
            &self.line2,
            &self.line3,
            &self.line4,
            &self.line5,
            &self.postcode,
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Licence {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    #[serde(default)]
    pub status_qualifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub category_code: String,
    pub category_legal_literal: String,
    pub category_type: String,
    pub from_date: String,
    pub expiry_date: String,
    #[serde(default)]
    pub restrictions: Vec<Restriction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restriction {
    pub restriction_literal: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endorsement {
    #[serde(default)]
    pub offence_legal_literal: Option<String>,
    pub offence_code: String,
    pub offence_date: String,
    pub penalty_points: u32,
}

impl Endorsement {
    pub fn offence(&self) -> &str {
        self.offence_legal_literal
            .as_deref()
            .filter(|literal| !literal.is_empty())
            .unwrap_or(&self.offence_code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPass {
    pub test_date: String,
    pub status: String,
    pub category_legal_literal: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotocardToken {
    pub valid_from_date: String,
    pub valid_to_date: String,
    pub issue_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cpc {
    pub cpcs: Vec<CpcEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpcEntry {
    pub lgv_valid_to: String,
    pub pcv_valid_to: String,
    pub national: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holder {
    pub tacho_cards: Vec<TachoCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TachoCard {
    pub card_number: String,
    pub card_expiry_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub status: String,
    pub code: String,
    pub detail: String,
}

/// The documented sample licence response.
pub fn mock_driver_record() -> DriverRecord {
    DriverRecord {
        driver: Driver {
            driving_licence_number: "ABCDE123456AB1AB".to_string(),
            first_names: "JOHN".to_string(),
            last_name: "DOE".to_string(),
            gender: "Male".to_string(),
            date_of_birth: "2019-12-31".to_string(),
            address: Address {
                unstructured_address: UnstructuredAddress {
                    line1: "5 HIGH STREET".to_string(),
                    line2: "GARNET".to_string(),
                    line3: "AMMANFORD".to_string(),
                    line4: "CARMARTHENSHIRE".to_string(),
                    line5: "WALES".to_string(),
                    postcode: "SA18 1AB".to_string(),
                },
            },
            disqualified_until: Some("2019-12-31".to_string()),
            disqualified_for_life: true,
            disqualified_pending_sentence: true,
        },
        licence: Licence {
            kind: "Provisional".to_string(),
            status: "Valid".to_string(),
            status_qualifier: Some("For re-assessment only".to_string()),
        },
        entitlement: vec![Entitlement {
            category_code: "A1".to_string(),
            category_legal_literal: "Motorbikes with engine size up to 125 cc, power output up to 11 kW and power/weight ratio up to 0.1 kW/kg".to_string(),
            category_type: "Provisional".to_string(),
            from_date: "2019-12-31".to_string(),
            expiry_date: "2019-12-31".to_string(),
            restrictions: vec![Restriction {
                restriction_literal: "Eyesight Correction".to_string(),
            }],
        }],
        endorsements: vec![Endorsement {
            offence_legal_literal: Some("Speeding".to_string()),
            offence_code: "SP30".to_string(),
            offence_date: "2020-06-15".to_string(),
            penalty_points: 3,
        }],
        test_pass: vec![TestPass {
            test_date: "2021-11-20".to_string(),
            status: "Passed".to_string(),
            category_legal_literal: "Car (Category B)".to_string(),
        }],
        token: PhotocardToken {
            valid_from_date: "2022-01-01".to_string(),
            valid_to_date: "2022-12-31".to_string(),
            issue_number: "02".to_string(),
        },
        cpc: Cpc {
            cpcs: vec![CpcEntry {
                lgv_valid_to: "2023-05-01".to_string(),
                pcv_valid_to: "2023-07-01".to_string(),
                national: true,
            }],
        },
        holder: Holder {
            tacho_cards: vec![TachoCard {
                card_number: "TCH123456".to_string(),
                card_expiry_date: "2024-12-31".to_string(),
            }],
        },
        errors: Vec::new(),
    }
}

/// Random 16-character licence number drawn from `A-Z0-9`.
pub fn generate_licence_number() -> String {
    generate_licence_number_with(&mut rand::rng())
}

pub fn generate_licence_number_with<R: Rng>(rng: &mut R) -> String {
    (0..LICENCE_NUMBER_LENGTH)
        .map(|_| {
            let index = rng.random_range(0..LICENCE_ALPHABET.len());
            char::from(LICENCE_ALPHABET[index])
        })
        .collect()
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

/// Text sections of the licence check, in display order.
pub fn render_driver_check(licence_number: &str, record: &DriverRecord) -> Vec<String> {
    let mut lines = vec![
        "DVLA Driver License Check".to_string(),
        format!("Licence No: {licence_number}"),
        String::new(),
        "Driver Info".to_string(),
    ];

    let driver = &record.driver;
    lines.push(format!("  {} {}", driver.first_names, driver.last_name));
    lines.push(format!("  DL No: {}", driver.driving_licence_number));
    lines.push(format!("  DOB: {}", driver.date_of_birth));
    lines.push(format!("  Gender: {}", driver.gender));
    lines.push(format!(
        "  Address: {}",
        driver.address.unstructured_address.joined()
    ));

    lines.push("Licence Status".to_string());
    lines.push(format!("  Type: {}", record.licence.kind));
    match record.licence.status_qualifier.as_deref() {
        Some(qualifier) if !qualifier.is_empty() => {
            lines.push(format!("  Status: {} ({qualifier})", record.licence.status))
        }
        _ => lines.push(format!("  Status: {}", record.licence.status)),
    }
    lines.push(format!(
        "  Disqualified Until: {}",
        driver.disqualified_until.as_deref().unwrap_or_default()
    ));
    lines.push(format!(
        "  Life Disqualification: {}",
        yes_no(driver.disqualified_for_life)
    ));

    lines.push("Entitlements".to_string());
    for entitlement in &record.entitlement {
        lines.push(format!(
            "  {} - {}",
            entitlement.category_code, entitlement.category_legal_literal
        ));
        lines.push(format!(
            "  {} to {}",
            entitlement.from_date, entitlement.expiry_date
        ));
        if !entitlement.restrictions.is_empty() {
            let restrictions: Vec<&str> = entitlement
                .restrictions
                .iter()
                .map(|restriction| restriction.restriction_literal.as_str())
                .collect();
            lines.push(format!("  Restrictions: {}", restrictions.join(", ")));
        }
    }

    lines.push("Endorsements".to_string());
    if record.endorsements.is_empty() {
        lines.push("  None".to_string());
    }
    for endorsement in &record.endorsements {
        lines.push(format!("  Offence: {}", endorsement.offence()));
        lines.push(format!("  Date: {}", endorsement.offence_date));
        lines.push(format!("  Points: {}", endorsement.penalty_points));
    }

    lines.push("Test Passes".to_string());
    for pass in &record.test_pass {
        lines.push(format!("  {}", pass.category_legal_literal));
        lines.push(format!("  Date: {}", pass.test_date));
        lines.push(format!("  Status: {}", pass.status));
    }

    lines.push("Token".to_string());
    lines.push(format!("  Issue No: {}", record.token.issue_number));
    lines.push(format!(
        "  Valid: {} - {}",
        record.token.valid_from_date, record.token.valid_to_date
    ));

    lines.push("CPC".to_string());
    for cpc in &record.cpc.cpcs {
        lines.push(format!("  LGV Valid To: {}", cpc.lgv_valid_to));
        lines.push(format!("  PCV Valid To: {}", cpc.pcv_valid_to));
        lines.push(format!("  National: {}", yes_no(cpc.national)));
    }

    lines.push("Tacho Cards".to_string());
    for card in &record.holder.tacho_cards {
        lines.push(format!("  Card No: {}", card.card_number));
        lines.push(format!("  Expiry: {}", card.card_expiry_date));
    }

    if !record.errors.is_empty() {
        lines.push("Errors".to_string());
        for error in &record.errors {
            lines.push(format!("  {} - {}", error.status, error.code));
            lines.push(format!("  {}", error.detail));
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn licence_numbers_use_the_expected_alphabet() {
        for _ in 0..50 {
            let number = generate_licence_number();
            assert_eq!(number.len(), LICENCE_NUMBER_LENGTH);
            assert!(number
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
        }
    }

    #[test]
    fn mock_record_serializes_in_api_shape() {
        let value = serde_json::to_value(mock_driver_record()).expect("serialize");
        assert_eq!(value["driver"]["drivingLicenceNumber"], "ABCDE123456AB1AB");
        assert_eq!(value["licence"]["type"], "Provisional");
        assert_eq!(value["testPass"][0]["categoryLegalLiteral"], "Car (Category B)");
        assert_eq!(value["holder"]["tachoCards"][0]["cardNumber"], "TCH123456");

        let back: DriverRecord = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, mock_driver_record());
    }

    #[test]
    fn address_skips_blank_lines() {
        let address = UnstructuredAddress {
            line1: "1 MAIN ROAD".to_string(),
            line3: "LEEDS".to_string(),
            postcode: "LS1 1AA".to_string(),
            ..UnstructuredAddress::default()
        };
        assert_eq!(address.joined(), "1 MAIN ROAD, LEEDS, LS1 1AA");
    }

    #[test]
    fn rendering_covers_each_section() {
        let lines = render_driver_check("LICENCE", &mock_driver_record());
        assert!(lines.contains(&"Licence No: LICENCE".to_string()));
        assert!(lines.contains(&"  Status: Valid (For re-assessment only)".to_string()));
        assert!(lines.contains(&"  Offence: Speeding".to_string()));
        assert!(lines.contains(&"  Life Disqualification: Yes".to_string()));
        assert!(!lines.contains(&"Errors".to_string()));
    }

    #[test]
    fn endorsement_falls_back_to_offence_code() {
        let mut record = mock_driver_record();
        record.endorsements[0].offence_legal_literal = None;
        assert_eq!(record.endorsements[0].offence(), "SP30");
    }
}
