use crate::core::scoring::RequirementSet;
use crate::models::{CandidateProfile, RankedCandidate};

/// Result of ranking a batch of candidates
#[derive(Debug)]
pub struct MatchResult {
    pub candidates: Vec<RankedCandidate>,
    pub total_candidates: usize,
    pub total_requirements: usize,
}

/// Optional post-ranking filters. A limit is capped at the matcher's maximum.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankOptions {
    pub min_score: Option<u8>,
    pub limit: Option<usize>,
}

/// Batch orchestrator: scores every candidate against one vacancy
///
/// # Pipeline Stages
/// 1. Parse and compile the requirement tokens once
/// 2. Score each candidate independently
/// 3. Stable sort by score, descending
/// 4. Apply the score floor and limit
#[derive(Debug, Clone)]
pub struct Matcher {
    max_limit: usize,
}

impl Matcher {
    pub fn new(max_limit: usize) -> Self {
        Self { max_limit: max_limit.max(1) }
    }

    pub fn max_limit(&self) -> usize {
        self.max_limit
    }

    /// Rank candidates for a vacancy, highest score first
    ///
    /// Candidates with equal scores keep their input order.
    pub fn rank_candidates(
        &self,
        requirements_text: &str,
        candidates: Vec<CandidateProfile>,
        options: RankOptions,
    ) -> MatchResult {
        let total_candidates = candidates.len();
        let requirements = RequirementSet::parse(requirements_text);

        let mut ranked: Vec<RankedCandidate> = candidates
            .into_iter()
            .map(|candidate| {
                let result = requirements.score(&candidate.skills, &candidate.experience);
                RankedCandidate {
                    postulation_id: candidate.postulation_id,
                    candidate_name: candidate.candidate_name,
                    result,
                }
            })
            .collect();

        sort_by_score(&mut ranked);

        if let Some(min_score) = options.min_score {
            ranked.retain(|c| c.result.score >= min_score);
        }

        if let Some(limit) = options.limit {
            ranked.truncate(limit.min(self.max_limit));
        }

        tracing::debug!(
            "Ranked {} of {} candidates against {} requirement tokens",
            ranked.len(),
            total_candidates,
            requirements.len()
        );

        MatchResult {
            candidates: ranked,
            total_candidates,
            total_requirements: requirements.len(),
        }
    }
}

/// Stable descending sort by score
pub fn sort_by_score(ranked: &mut [RankedCandidate]) {
    ranked.sort_by(|a, b| b.result.score.cmp(&a.result.score));
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(500)
    }
}
