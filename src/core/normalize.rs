use unicode_normalization::UnicodeNormalization;

/// Combining diacritical marks block, removed after NFD decomposition
const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036f}';

/// Normalize free text for keyword matching
///
/// Lower-cases, strips accent marks, then keeps only lowercase ASCII
/// letters, digits, commas and spaces. "Programación, C#" becomes
/// "programacion, c".
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !COMBINING_MARKS.contains(c))
        .filter(|c| matches!(c, 'a'..='z' | '0'..='9' | ',' | ' '))
        .collect()
}

/// Split requirements text into requirement tokens
///
/// Tokens are comma separated, trimmed, and empty ones dropped. Duplicates
/// are kept in order since every occurrence counts toward the total.
pub fn requirement_tokens(requirements_text: &str) -> Vec<String> {
    normalize_text(requirements_text)
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build the single profile string matched against requirement tokens
pub fn candidate_profile_text(skills: &str, experience: &str) -> String {
    normalize_text(&format!("{} {}", skills, experience))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_accents() {
        assert_eq!(normalize_text("Programación"), "programacion");
        assert_eq!(normalize_text("DISEÑO Gráfico"), "diseno grafico");
        assert_eq!(normalize_text("Über"), "uber");
    }

    #[test]
    fn test_normalize_drops_symbols() {
        assert_eq!(normalize_text("C#, C++, Node.js"), "c, c, nodejs");
        assert_eq!(normalize_text("react;\tsql\nnode"), "reactsqlnode");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_text("Análisis de Datos, SQL, Python 3");
        assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn test_tokens_trimmed_and_non_empty() {
        assert_eq!(
            requirement_tokens(" React , SQL,, node ,  "),
            vec!["react", "sql", "node"]
        );
        assert!(requirement_tokens("").is_empty());
        assert!(requirement_tokens(" , ,, ").is_empty());
    }

    #[test]
    fn test_tokens_keep_duplicates() {
        assert_eq!(requirement_tokens("sql, SQL, sql"), vec!["sql", "sql", "sql"]);
    }

    #[test]
    fn test_profile_text_joins_skills_and_experience() {
        assert_eq!(
            candidate_profile_text("React y SQL", "5 años en Node"),
            "react y sql 5 anos en node"
        );
    }
}
