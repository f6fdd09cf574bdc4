// Core algorithm exports
pub mod matcher;
pub mod normalize;
pub mod scoring;
pub mod throttle;
pub mod unlock;

pub use matcher::{Matcher, MatchResult, RankOptions};
pub use normalize::{normalize_text, requirement_tokens};
pub use scoring::{calculate_compatibility, RequirementSet};
pub use throttle::{AttemptOutcome, LoginThrottle, ThrottleDecision, ThrottlePolicy, ThrottleStatus};
pub use unlock::{SharedThrottle, UnlockWatcher};
