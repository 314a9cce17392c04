//! Clause rows for the review view: the contract's clauses joined with the
//! risk assessment of the review.

use std::collections::{HashMap, HashSet};

use super::model::{ContractWithReview, RiskyClause};

/// Coarse risk grouping of the service's 1–3 `risk_level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn from_level(level: u8) -> Self {
        match level {
            0 | 1 => RiskBand::Low,
            2 => RiskBand::Medium,
            _ => RiskBand::High,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskBand::Low => "Low",
            RiskBand::Medium => "Medium",
            RiskBand::High => "High",
        }
    }
}

/// One selectable clause in the review view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseRow {
    pub key: String,
    /// Short number shown in the UI (`clause-12` → `12`).
    pub number: String,
    pub content: String,
    pub risk: Option<RiskyClause>,
}

impl ClauseRow {
    pub fn band(&self) -> Option<RiskBand> {
        self.risk.as_ref().map(|r| RiskBand::from_level(r.risk_level))
    }
}

/// The part of a clause key after its last `-`.
pub fn clause_number(key: &str) -> &str {
    key.rsplit('-').next().unwrap_or(key)
}

/// Build the clause list in document order.  Risky clauses the contract's
/// own clause list doesn't mention are appended at the end so none are lost.
pub fn build_clause_rows(data: &ContractWithReview) -> Vec<ClauseRow> {
    let risky: HashMap<&str, &RiskyClause> = data
        .review
        .iter()
        .flat_map(|r| r.risky_clauses.iter())
        .map(|c| (c.key.as_str(), c))
        .collect();

    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(data.contract.clauses.len());

    for clause in &data.contract.clauses {
        if !seen.insert(clause.key.as_str()) {
            continue;
        }
        rows.push(ClauseRow {
            key: clause.key.clone(),
            number: clause_number(&clause.key).to_string(),
            content: clause.content.clone(),
            risk: risky.get(clause.key.as_str()).map(|r| (*r).clone()),
        });
    }

    for risky_clause in data.review.iter().flat_map(|r| r.risky_clauses.iter()) {
        if seen.insert(risky_clause.key.as_str()) {
            rows.push(ClauseRow {
                key: risky_clause.key.clone(),
                number: clause_number(&risky_clause.key).to_string(),
                content: risky_clause.content.clone(),
                risk: Some(risky_clause.clone()),
            });
        }
    }

    rows
}
