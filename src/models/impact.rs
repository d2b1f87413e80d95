//! Impact types: severity levels and per-test impact records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity ranking assigned to a test believed affected by a code change.
///
/// Ordered so that comparisons follow urgency: `Low < Medium < High <
/// Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImpactLevel::Low => write!(f, "low"),
            ImpactLevel::Medium => write!(f, "medium"),
            ImpactLevel::High => write!(f, "high"),
            ImpactLevel::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for ImpactLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(ImpactLevel::Low),
            "medium" => Ok(ImpactLevel::Medium),
            "high" => Ok(ImpactLevel::High),
            "critical" => Ok(ImpactLevel::Critical),
            other => Err(format!(
                "unknown impact level: '{other}'. Expected: low, medium, high, critical"
            )),
        }
    }
}

/// One test believed to exercise a changed function.
///
/// Emitted by the impact classifier: one record per
/// (changed function × candidate test). `line_number` is a best-effort
/// display hint and carries no semantic weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffectedTestCase {
    pub test_file: String,
    pub test_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_class: Option<String>,
    pub impact_level: ImpactLevel,
    /// Human-readable rationale for why this test is affected.
    pub reason: String,
    pub requires_update: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_function: Option<String>,
}
