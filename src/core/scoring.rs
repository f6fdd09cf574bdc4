use regex::Regex;

use crate::core::normalize::{candidate_profile_text, requirement_tokens};
use crate::models::{CompatibilityInput, CompatibilityResult, Feedback};

/// One requirement token with its whole-word pattern
#[derive(Debug, Clone)]
struct RequirementPattern {
    token: String,
    pattern: Option<Regex>,
}

impl RequirementPattern {
    fn new(token: String) -> Self {
        let pattern = match Regex::new(&format!(r"\b{}\b", regex::escape(&token))) {
            Ok(re) => Some(re),
            Err(e) => {
                // Only reachable for tokens past the regex size limit
                tracing::warn!("Requirement token {:?} cannot be matched: {}", token, e);
                None
            }
        };
        Self { token, pattern }
    }

    #[inline]
    fn is_match(&self, profile: &str) -> bool {
        self.pattern.as_ref().is_some_and(|re| re.is_match(profile))
    }
}

/// Requirement tokens of one vacancy, compiled once and reused per candidate
#[derive(Debug, Clone)]
pub struct RequirementSet {
    patterns: Vec<RequirementPattern>,
}

impl RequirementSet {
    pub fn parse(requirements_text: &str) -> Self {
        Self {
            patterns: requirement_tokens(requirements_text)
                .into_iter()
                .map(RequirementPattern::new)
                .collect(),
        }
    }

    /// Number of requirement tokens, duplicates included
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.token.as_str())
    }

    /// Score a candidate's skills and experience against these requirements
    pub fn score(&self, skills: &str, experience: &str) -> CompatibilityResult {
        if self.is_empty() {
            return CompatibilityResult::empty();
        }

        let profile = candidate_profile_text(skills, experience);
        let matched_requirements: Vec<String> = self
            .patterns
            .iter()
            .filter(|p| p.is_match(&profile))
            .map(|p| p.token.clone())
            .collect();

        let score = compute_score(matched_requirements.len(), self.len());

        CompatibilityResult {
            score,
            feedback: Feedback::from_score(score),
            matched_requirements,
            total_requirements: self.len(),
        }
    }
}

/// Calculate the compatibility (0-100) of a candidate with a vacancy
///
/// Never fails: empty or unusable text degrades to a low score.
pub fn calculate_compatibility(input: &CompatibilityInput) -> CompatibilityResult {
    RequirementSet::parse(&input.requirements_text)
        .score(&input.candidate_skills_text, &input.candidate_experience_text)
}

/// Percentage of matched tokens, rounded half up and capped at 100
#[inline]
pub fn compute_score(matched: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (matched as f64 / total as f64) * 100.0;
    pct.min(100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(requirements: &str, skills: &str, experience: &str) -> CompatibilityResult {
        calculate_compatibility(&CompatibilityInput::new(requirements, skills, experience))
    }

    #[test]
    fn test_two_of_three_is_competent() {
        let result = score("react, sql, node", "React y SQL avanzado", "");
        assert_eq!(result.score, 67);
        assert_eq!(result.feedback, Feedback::Competent);
        assert_eq!(result.matched_requirements, vec!["react", "sql"]);
        assert_eq!(result.total_requirements, 3);
    }

    #[test]
    fn test_empty_requirements() {
        let result = score("", "React", "Node");
        assert_eq!(result.score, 0);
        assert_eq!(result.feedback, Feedback::LowAffinity);
        assert_eq!(result.total_requirements, 0);
    }

    #[test]
    fn test_whole_word_only() {
        // "java" must not match inside "javascript"
        let result = score("java", "javascript developer", "");
        assert_eq!(result.score, 0);

        let result = score("java", "java, javascript", "");
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_multi_word_token() {
        let result = score("machine learning, sql", "Machine   Learning", "sql server");
        assert_eq!(result.matched_requirements, vec!["sql"]);

        let result = score("machine learning", "experto en machine learning", "");
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_experience_counts_toward_profile() {
        let result = score("docker, kubernetes", "", "Desplegué con Docker y Kubernetes");
        assert_eq!(result.score, 100);
        assert_eq!(result.feedback, Feedback::HighPriority);
    }

    #[test]
    fn test_duplicates_each_count() {
        let result = score("sql, sql, go", "sql", "");
        assert_eq!(result.total_requirements, 3);
        assert_eq!(result.score, 67);
    }

    #[test]
    fn test_compute_score_formula() {
        for total in 1..=12usize {
            for matched in 0..=total {
                let expected = ((matched as f64 / total as f64) * 100.0).min(100.0).round() as u8;
                assert_eq!(compute_score(matched, total), expected);
            }
        }
        assert_eq!(compute_score(1, 8), 13);
        assert_eq!(compute_score(1, 3), 33);
        assert_eq!(compute_score(0, 0), 0);
    }

    #[test]
    fn test_score_monotonic_in_matches() {
        let requirements = "rust, tokio, sql, docker, aws";
        let profiles = ["", "rust", "rust tokio", "rust tokio sql", "rust tokio sql docker", "rust tokio sql docker aws"];
        let scores: Vec<u8> = profiles.iter().map(|p| score(requirements, p, "").score).collect();
        assert!(scores.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(scores, vec![0, 20, 40, 60, 80, 100]);
    }

    #[test]
    fn test_case_and_accent_invariance() {
        let plain = score("diseno, programacion", "diseno y programacion", "");
        let accented = score("DISEÑO, Programación", "Diseño y PROGRAMACIÓN", "");
        assert_eq!(plain, accented);
    }
}
