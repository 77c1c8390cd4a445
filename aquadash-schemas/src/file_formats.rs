use crate::policy::RiskPolicy;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PolicyFile {
    pub schema_version: String,
    pub policies: Vec<RiskPolicy>,
}
