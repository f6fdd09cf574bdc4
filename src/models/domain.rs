use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Free-text inputs to a single compatibility computation
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CompatibilityInput {
    #[serde(rename = "requirementsText", alias = "requirements_text", default)]
    #[validate(length(max = 20000))]
    pub requirements_text: String,
    #[serde(rename = "candidateSkillsText", alias = "candidate_skills_text", default)]
    #[validate(length(max = 20000))]
    pub candidate_skills_text: String,
    #[serde(rename = "candidateExperienceText", alias = "candidate_experience_text", default)]
    #[validate(length(max = 20000))]
    pub candidate_experience_text: String,
}

impl CompatibilityInput {
    pub fn new(
        requirements: impl Into<String>,
        skills: impl Into<String>,
        experience: impl Into<String>,
    ) -> Self {
        Self {
            requirements_text: requirements.into(),
            candidate_skills_text: skills.into(),
            candidate_experience_text: experience.into(),
        }
    }
}

/// Qualitative label derived from a compatibility score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    HighPriority,
    Competent,
    NeedsTraining,
    LowAffinity,
}

impl Feedback {
    /// Map a 0-100 score to its label. Thresholds are inclusive.
    pub fn from_score(score: u8) -> Self {
        match score {
            85.. => Feedback::HighPriority,
            60..=84 => Feedback::Competent,
            30..=59 => Feedback::NeedsTraining,
            _ => Feedback::LowAffinity,
        }
    }

    /// Stable identifier used for storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Feedback::HighPriority => "high_priority",
            Feedback::Competent => "competent",
            Feedback::NeedsTraining => "needs_training",
            Feedback::LowAffinity => "low_affinity",
        }
    }

    /// Recruiter-facing comment written back onto the postulation
    pub fn comment(&self) -> &'static str {
        match self {
            Feedback::HighPriority => "Perfil de alta prioridad.",
            Feedback::Competent => "Candidato competente.",
            Feedback::NeedsTraining => "Requiere capacitación.",
            Feedback::LowAffinity => "Baja afinidad.",
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feedback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high_priority" => Ok(Feedback::HighPriority),
            "competent" => Ok(Feedback::Competent),
            "needs_training" => Ok(Feedback::NeedsTraining),
            "low_affinity" => Ok(Feedback::LowAffinity),
            other => Err(format!("unknown feedback label: {}", other)),
        }
    }
}

/// Outcome of scoring one candidate against one set of requirements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityResult {
    pub score: u8,
    pub feedback: Feedback,
    #[serde(rename = "matchedRequirements")]
    pub matched_requirements: Vec<String>,
    #[serde(rename = "totalRequirements")]
    pub total_requirements: usize,
}

impl CompatibilityResult {
    /// Result for input with no requirement tokens
    pub fn empty() -> Self {
        Self {
            score: 0,
            feedback: Feedback::LowAffinity,
            matched_requirements: Vec::new(),
            total_requirements: 0,
        }
    }
}

/// A postulation as the scorer sees it
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CandidateProfile {
    #[serde(rename = "postulationId", alias = "postulation_id")]
    #[validate(length(min = 1))]
    pub postulation_id: String,
    #[serde(rename = "candidateName", alias = "candidate_name", default)]
    pub candidate_name: String,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub experience: String,
}

/// Candidate with its computed compatibility, as returned by ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCandidate {
    #[serde(rename = "postulationId")]
    pub postulation_id: String,
    #[serde(rename = "candidateName")]
    pub candidate_name: String,
    #[serde(flatten)]
    pub result: CompatibilityResult,
}

/// Persisted login throttle record for one client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginThrottleState {
    #[serde(rename = "attemptCount")]
    pub attempt_count: u32,
    #[serde(rename = "lockedUntil")]
    pub locked_until: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_thresholds_inclusive() {
        assert_eq!(Feedback::from_score(100), Feedback::HighPriority);
        assert_eq!(Feedback::from_score(85), Feedback::HighPriority);
        assert_eq!(Feedback::from_score(84), Feedback::Competent);
        assert_eq!(Feedback::from_score(60), Feedback::Competent);
        assert_eq!(Feedback::from_score(59), Feedback::NeedsTraining);
        assert_eq!(Feedback::from_score(30), Feedback::NeedsTraining);
        assert_eq!(Feedback::from_score(29), Feedback::LowAffinity);
        assert_eq!(Feedback::from_score(0), Feedback::LowAffinity);
    }

    #[test]
    fn test_feedback_storage_label() {
        for feedback in [
            Feedback::HighPriority,
            Feedback::Competent,
            Feedback::NeedsTraining,
            Feedback::LowAffinity,
        ] {
            assert_eq!(feedback.as_str().parse::<Feedback>(), Ok(feedback));
        }
        assert!("excellent".parse::<Feedback>().is_err());
    }

    #[test]
    fn test_feedback_comment_text() {
        assert_eq!(Feedback::HighPriority.comment(), "Perfil de alta prioridad.");
        assert_eq!(Feedback::Competent.comment(), "Candidato competente.");
        assert_eq!(Feedback::NeedsTraining.comment(), "Requiere capacitación.");
        assert_eq!(Feedback::LowAffinity.comment(), "Baja afinidad.");
    }

    #[test]
    fn test_throttle_state_json_shape() {
        let state = LoginThrottleState::default();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["attemptCount"], 0);
        assert!(json["lockedUntil"].is_null());
    }

    #[test]
    fn test_ranked_candidate_flattens_result() {
        let ranked = RankedCandidate {
            postulation_id: "p1".to_string(),
            candidate_name: "Ana".to_string(),
            result: CompatibilityResult::empty(),
        };
        let json = serde_json::to_value(&ranked).unwrap();
        assert_eq!(json["score"], 0);
        assert_eq!(json["feedback"], "low_affinity");
    }
}
