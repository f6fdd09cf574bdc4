use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::CandidateProfile;

/// Request to rank a set of candidates against one requirements text
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RankCandidatesRequest {
    #[serde(alias = "requirements_text", rename = "requirementsText")]
    pub requirements_text: String,
    #[validate(length(min = 1), nested)]
    pub candidates: Vec<CandidateProfile>,
    #[serde(default, alias = "min_score", rename = "minScore")]
    #[validate(range(max = 100))]
    pub min_score: Option<u8>,
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Request to analyze every postulation of a vacancy
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AnalyzeVacancyRequest {
    /// Skip the best-effort write-back to the hosted backend
    #[serde(default, alias = "dry_run", rename = "dryRun")]
    pub dry_run: bool,
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Throttled sign-in request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(length(min = 1, max = 128))]
    #[serde(alias = "client_id", rename = "clientId")]
    pub client_id: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}
