// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{CompatibilityInput, CompatibilityResult, Feedback, CandidateProfile, RankedCandidate, LoginThrottleState};
pub use requests::{RankCandidatesRequest, AnalyzeVacancyRequest, SignInRequest};
pub use responses::{RankCandidatesResponse, HealthResponse, ErrorResponse, SignInResponse, ThrottleStatusResponse};
