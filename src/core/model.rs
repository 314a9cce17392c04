//! Wire types exchanged with the review service.
//!
//! Field names follow the service's JSON exactly (`_id`, `snake_case`), so the
//! structs double as request bodies and response shapes.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ───────────────────────────────────────── users ─────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl User {
    /// "First Last", falling back to the email when no name is on file.
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            self.email.clone()
        } else {
            name
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}

// ───────────────────────────────────────── review enums ──────

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => ($wire:literal, $label:literal)),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant,)+
            #[default]
            Other,
        }

        impl $name {
            pub const ALL: &[$name] = &[$($name::$variant,)+ $name::Other];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                    $name::Other => "Other",
                }
            }

            /// Wire value, also accepted on the command line.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                    $name::Other => "other",
                }
            }

            pub fn parse(s: &str) -> Option<Self> {
                let s = s.trim().to_lowercase().replace(['-', ' '], "_");
                Self::ALL.iter().copied().find(|v| v.as_str() == s)
            }

            /// The next value in [`Self::ALL`], wrapping around.
            pub fn cycle(self) -> Self {
                let idx = Self::ALL.iter().position(|v| *v == self).unwrap_or(0);
                Self::ALL[(idx + 1) % Self::ALL.len()]
            }
        }
    };
}

wire_enum!(ContractType {
    ServiceLevelAgreement => ("service_level_agreement", "Service Level Agreement"),
    MasterServiceAgreement => ("master_service_agreement", "Master Service Agreement"),
    NonDisclosureAgreement => ("non_disclosure_agreement", "Non-Disclosure Agreement"),
});

wire_enum!(ContractIndustry {
    Technology => ("technology", "Technology"),
    Finance => ("finance", "Finance"),
    Healthcare => ("healthcare", "Healthcare"),
});

wire_enum!(ContractJurisdiction {
    UnitedStates => ("united_states", "United States"),
    UnitedKingdom => ("united_kingdom", "United Kingdom"),
});

// ───────────────────────────────────────── contracts ─────────

/// A structurally identified segment of a contract (e.g. `clause-12`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub key: String,
    pub content: String,
}

/// A clause the review flagged, with the model's assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskyClause {
    pub key: String,
    pub content: String,
    pub risk_type: String,
    pub risk_level: u8,
    pub concerns: String,
    pub recommendations: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub processed_html: String,
    #[serde(default)]
    pub original_html: String,
    #[serde(default)]
    pub uploaded_by: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub clauses: Vec<Clause>,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub has_review: bool,
    #[serde(default, deserialize_with = "flexible_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "flexible_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewAnalytics {
    pub tokens_used: u64,
    pub total_time_taken: f64,
    pub total_clauses: u64,
    pub risky_clauses: u64,
    pub total_batches: u64,
    pub rate_limit_hits: u64,
    pub average_time_per_batch: f64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractReview {
    #[serde(rename = "_id")]
    pub id: String,
    pub contract_id: String,
    #[serde(default)]
    pub risky_clauses: Vec<RiskyClause>,
    #[serde(default)]
    pub contract_type: ContractType,
    #[serde(default)]
    pub contract_industry: ContractIndustry,
    #[serde(default)]
    pub contract_jurisdiction: ContractJurisdiction,
    #[serde(default)]
    pub summary_checklist: Option<String>,
    #[serde(default)]
    pub analytics: Option<ReviewAnalytics>,
    #[serde(default, deserialize_with = "flexible_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractWithReview {
    #[serde(flatten)]
    pub contract: Contract,
    #[serde(default)]
    pub review: Option<ContractReview>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub jurisdiction: ContractJurisdiction,
    pub industry: ContractIndustry,
    pub contract_type: ContractType,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExplainClauseRequest {
    pub clause: String,
}

// ───────────────────────────────────────── analytics ─────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Analytics {
    #[serde(default)]
    pub contracts_reviewed: HashMap<String, u64>,
    #[serde(default)]
    pub total_clauses: u64,
    #[serde(default)]
    pub total_risky_clauses: u64,
    #[serde(default)]
    pub total_contracts: u64,
    #[serde(default)]
    pub total_pages: u64,
    #[serde(default)]
    pub total_tokens_used: u64,
}

// ───────────────────────────────────────── serde helpers ─────

fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

/// Accept RFC 3339 timestamps as well as the naive ISO-8601 form the service
/// emits (`2024-05-01T09:30:00.123000`), which is taken as UTC.
fn flexible_datetime<'de, D>(de: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(de)? else {
        return Ok(None);
    };
    Ok(parse_timestamp(&raw))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn contract_with_review_parses_service_payload() {
        let json = r#"{
            "_id": "66a1",
            "title": "MSA",
            "processed_html": "<ol><li data-clause-id=\"clause-1\">Term</li></ol>",
            "original_html": "",
            "uploaded_by": "u1",
            "clauses": [{"key": "clause-1", "content": "Term", "location": "section"}],
            "pages": 3,
            "has_review": true,
            "created_at": "2024-05-01T09:30:00.123000",
            "updated_at": "2024-05-01T09:30:00Z",
            "review": {
                "_id": "r1",
                "contract_id": "66a1",
                "risky_clauses": [{
                    "key": "clause-1", "content": "Term", "risk_type": "Legal",
                    "risk_level": 2, "concerns": "Vague", "recommendations": "Define"
                }],
                "contract_type": "master_service_agreement",
                "contract_industry": "technology",
                "contract_jurisdiction": "united_kingdom",
                "summary_checklist": null,
                "analytics": null
            }
        }"#;

        let parsed: ContractWithReview = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.contract.id, "66a1");
        assert_eq!(parsed.contract.pages, Some(3));
        assert_eq!(parsed.contract.clauses.len(), 1);
        assert!(parsed.contract.created_at.is_some());
        assert!(parsed.contract.updated_at.is_some());

        let review = parsed.review.unwrap();
        assert_eq!(review.contract_type, ContractType::MasterServiceAgreement);
        assert_eq!(review.contract_jurisdiction, ContractJurisdiction::UnitedKingdom);
        assert_eq!(review.risky_clauses[0].risk_level, 2);
    }

    #[test]
    fn null_clauses_become_empty() {
        let json = r#"{"_id": "1", "title": "NDA", "clauses": null}"#;
        let contract: Contract = serde_json::from_str(json).unwrap();
        assert!(contract.clauses.is_empty());
        assert!(!contract.has_review);
    }

    #[test]
    fn review_request_uses_snake_case_wire_values() {
        let req = ReviewRequest {
            jurisdiction: ContractJurisdiction::UnitedStates,
            industry: ContractIndustry::Other,
            contract_type: ContractType::NonDisclosureAgreement,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "jurisdiction": "united_states",
                "industry": "other",
                "contract_type": "non_disclosure_agreement",
            })
        );
    }

    #[test]
    fn enum_parse_accepts_cli_spellings() {
        assert_eq!(ContractType::parse("non-disclosure-agreement"), Some(ContractType::NonDisclosureAgreement));
        assert_eq!(ContractIndustry::parse("Finance"), Some(ContractIndustry::Finance));
        assert_eq!(ContractJurisdiction::parse("mars"), None);
        assert_eq!(ContractJurisdiction::Other.cycle(), ContractJurisdiction::UnitedStates);
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let mut user = User {
            id: None,
            email: "a@b.co".into(),
            first_name: None,
            last_name: None,
        };
        assert_eq!(user.display_name(), "a@b.co");
        user.first_name = Some("Ada".into());
        assert_eq!(user.display_name(), "Ada");
        user.last_name = Some("Lovelace".into());
        assert_eq!(user.display_name(), "Ada Lovelace");
    }
}
