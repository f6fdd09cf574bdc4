//! Recruit Algo - compatibility scoring and sign-in throttling for the recruiting marketplace
//!
//! The library holds the two pieces of decision logic (keyword compatibility
//! scoring of candidates against vacancy requirements, and the failed sign-in
//! throttle) plus the HTTP service that exposes them.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{calculate_compatibility, LoginThrottle, Matcher, ThrottlePolicy, ThrottleStatus};
pub use models::{CompatibilityInput, CompatibilityResult, Feedback, CandidateProfile, RankedCandidate, LoginThrottleState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let result = calculate_compatibility(&CompatibilityInput::new("rust", "Rust", ""));
        assert_eq!(result.score, 100);
        assert_eq!(result.feedback, Feedback::HighPriority);
    }
}
