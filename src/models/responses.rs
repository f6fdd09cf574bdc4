use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::throttle::ThrottleStatus;
use crate::models::domain::RankedCandidate;

/// Response for the ranking and vacancy analysis endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankCandidatesResponse {
    pub candidates: Vec<RankedCandidate>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
    #[serde(rename = "totalRequirements")]
    pub total_requirements: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status_code,
        }
    }
}

/// Successful sign-in response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInResponse {
    pub success: bool,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Throttle status as reported to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleStatusResponse {
    #[serde(rename = "clientId")]
    pub client_id: String,
    #[serde(flatten)]
    pub status: ThrottleStatus,
}
