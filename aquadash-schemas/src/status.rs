use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-parameter classification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLabel {
    Normal,
    Warning,
    Critical,
}

impl StatusLabel {
    pub fn is_normal(self) -> bool {
        self == StatusLabel::Normal
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatusLabel::Normal => "Normal",
            StatusLabel::Warning => "Warning",
            StatusLabel::Critical => "Critical",
        };
        f.write_str(s)
    }
}

/// Row-level alert composed from the per-parameter labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Normal,
    Warning,
    Critical,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertLevel::Normal => "Normal",
            AlertLevel::Warning => "Warning",
            AlertLevel::Critical => "Critical",
        };
        f.write_str(s)
    }
}

/// Presentation color keyed by status, consumed by table styling and chart
/// markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskColor {
    Green,
    Orange,
    Red,
}

impl RiskColor {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskColor::Green => "green",
            RiskColor::Orange => "orange",
            RiskColor::Red => "red",
        }
    }
}

/// Growth-uniformity verdict from the coefficient of variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStatus {
    Uniform,
    Uneven,
    /// CV is zero or undefined (no size-class weights, or no end weight).
    NoVerdict,
}

impl fmt::Display for GrowthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GrowthStatus::Uniform => "Uniform",
            GrowthStatus::Uneven => "Uneven",
            GrowthStatus::NoVerdict => "\u{2013}",
        };
        f.write_str(s)
    }
}
