//! Qualitative risk levels shared by the taxonomy and the ontology.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Risk level assigned by rule cascade (never by the classifier itself)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Bajo,
    Medio,
    Alto,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Bajo, RiskLevel::Medio, RiskLevel::Alto];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Bajo => "BAJO",
            RiskLevel::Medio => "MEDIO",
            RiskLevel::Alto => "ALTO",
        }
    }
}

impl Default for RiskLevel {
    fn default() -> Self {
        RiskLevel::Medio
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BAJO" => Ok(RiskLevel::Bajo),
            "MEDIO" => Ok(RiskLevel::Medio),
            "ALTO" => Ok(RiskLevel::Alto),
            other => Err(format!("unknown risk level: {}", other)),
        }
    }
}
