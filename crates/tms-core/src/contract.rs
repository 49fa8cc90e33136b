//! Contract records and the documents nested inside them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of a contract.
///
/// Serialised with the display labels the records have always used
/// (`"Asset Return"` keeps its space).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractStatus {
    Active,
    Overdue,
    Closed,
    #[serde(rename = "Asset Return")]
    AssetReturn,
    Cancelled,
}

impl ContractStatus {
    pub const ALL: [ContractStatus; 5] = [
        ContractStatus::Active,
        ContractStatus::Overdue,
        ContractStatus::Closed,
        ContractStatus::AssetReturn,
        ContractStatus::Cancelled,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ContractStatus::Active => "Active",
            ContractStatus::Overdue => "Overdue",
            ContractStatus::Closed => "Closed",
            ContractStatus::AssetReturn => "Asset Return",
            ContractStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown contract status: {0:?}")]
pub struct ParseStatusError(pub String);

impl FromStr for ContractStatus {
    type Err = ParseStatusError;

    /// Accepts the display label in any case, with spaces, `-` or `_`
    /// between words ("Asset Return", "asset-return", "ASSET_RETURN").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        ContractStatus::ALL
            .into_iter()
            .find(|status| status.label().replace(' ', "").to_ascii_lowercase() == wanted)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// A tenancy/asset agreement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    /// Contract date as entered (`YYYY-MM-DD`).
    #[serde(default)]
    pub date: String,
    pub status: ContractStatus,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub paid: f64,
    #[serde(default = "default_installments")]
    pub installments: u32,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub resale: f64,
    #[serde(default)]
    pub plan_type: String,
    /// Newest first.
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

fn default_installments() -> u32 {
    1
}

impl Contract {
    /// A fresh `Active` contract with no payments or attachments.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phone: String::new(),
            date: String::new(),
            status: ContractStatus::Active,
            total: 0.0,
            paid: 0.0,
            installments: default_installments(),
            cost: 0.0,
            resale: 0.0,
            plan_type: String::new(),
            payments: Vec::new(),
            attachments: Vec::new(),
        }
    }

    /// Amount still owed. Never negative.
    pub fn outstanding(&self) -> f64 {
        (self.total - self.paid).max(0.0)
    }
}

/// One recorded payment. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Display date of the submission (`YYYY-MM-DD`).
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: f64,
    pub receipt: Option<String>,
}

/// Metadata of a file already stored by the upload service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
    pub size: u64,
    /// Display timestamp of when it was attached.
    pub time: String,
}

/// An asset taken back into stock when a contract moves to `Asset Return`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub contract_id: String,
    pub name: String,
    pub cost: f64,
    pub resale: f64,
    pub registered_at: DateTime<Utc>,
}
