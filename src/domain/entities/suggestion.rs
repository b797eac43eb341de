//! Title suggestions proposed by content generation

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::ProblemId;

/// Which list of suggestions a generation feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "problem_id", rename_all = "snake_case")]
pub enum SuggestionScope {
    ProblemTitles,
    SolutionTitles(ProblemId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    /// Set once the user turned the suggestion into a problem or solution
    pub confirmed: bool,
}

impl Suggestion {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            confirmed: false,
        }
    }
}

/// Replace unconfirmed suggestions with fresh titles
///
/// Confirmed entries keep their place at the front. Fresh titles that
/// duplicate a confirmed one (case-insensitive) are dropped, and the list is
/// capped at `limit` unless confirmed entries alone exceed it.
pub fn merge_regenerated(current: &[Suggestion], fresh: Vec<String>, limit: usize) -> Vec<Suggestion> {
    let mut merged: Vec<Suggestion> = current.iter().filter(|s| s.confirmed).cloned().collect();

    for title in fresh {
        let title = title.trim();
        if title.is_empty() {
            continue;
        }
        if merged.len() >= limit {
            break;
        }
        let duplicate = merged
            .iter()
            .any(|s| s.title.eq_ignore_ascii_case(title));
        if !duplicate {
            merged.push(Suggestion::new(title));
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regeneration_keeps_confirmed_suggestions() {
        let current = vec![
            Suggestion {
                title: "Slow onboarding".to_string(),
                confirmed: true,
            },
            Suggestion::new("Unclear pricing"),
        ];

        let merged = merge_regenerated(
            &current,
            vec![
                "slow onboarding".to_string(),
                "High churn".to_string(),
                "  ".to_string(),
                "Poor support".to_string(),
            ],
            10,
        );

        let titles: Vec<&str> = merged.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Slow onboarding", "High churn", "Poor support"]);
        assert!(merged[0].confirmed);
        assert!(!merged[1].confirmed);
    }

    #[test]
    fn test_regeneration_respects_limit() {
        let merged = merge_regenerated(
            &[],
            (0..20).map(|i| format!("Title {}", i)).collect(),
            3,
        );
        assert_eq!(merged.len(), 3);
    }
}
