//! Manual staker directory records
//!
//! Off-platform counterparties kept by a user. Remote documents have stored
//! contact info as either text or a bare number over the app's history, so
//! deserialization normalizes both to text at this boundary.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualStaker {
    pub id: String,
    pub created_by_user_id: String,
    pub name: String,
    #[serde(default, deserialize_with = "contact_info_as_text")]
    pub contact_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ManualStaker {
    /// Key half of the (creator, name) directory lookup tuple.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Trim, collapse internal whitespace and lowercase a display name so that
/// " Uncle  Ray " and "uncle ray" group together.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn contact_info_as_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    let raw = Option::<Raw>::deserialize(deserializer)?;
    Ok(raw.map(|value| match value {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name(" Uncle  Ray "), "uncle ray");
        assert_eq!(normalize_name("UNCLE RAY"), "uncle ray");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn test_contact_info_accepts_text_or_number() {
        let from_text: ManualStaker = serde_json::from_str(
            r#"{"id":"m1","createdByUserId":"bob","name":"Ray","contactInfo":"555-0100"}"#,
        )
        .unwrap();
        assert_eq!(from_text.contact_info.as_deref(), Some("555-0100"));

        let from_number: ManualStaker = serde_json::from_str(
            r#"{"id":"m1","createdByUserId":"bob","name":"Ray","contactInfo":5550100}"#,
        )
        .unwrap();
        assert_eq!(from_number.contact_info.as_deref(), Some("5550100"));

        let missing: ManualStaker =
            serde_json::from_str(r#"{"id":"m1","createdByUserId":"bob","name":"Ray"}"#).unwrap();
        assert_eq!(missing.contact_info, None);
    }
}
