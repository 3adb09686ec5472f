use std::sync::Arc;

use thiserror::Error;

use crate::bank::{Bank, Category, Question};

pub const MAX_QUERY_CHARS: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("enter a keyword to search")]
    EmptyQuery,
    #[error("keyword is {len} characters long; the limit is {max}")]
    QueryTooLong { len: usize, max: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchTier {
    ExactId,
    IdSuffix,
    Substring,
}

#[derive(Clone, Debug)]
pub struct SearchHit {
    pub category: Category,
    pub question: Arc<Question>,
}

#[derive(Clone, Debug)]
pub struct SearchResults {
    /// The keyword after markup neutralization; safe to echo back.
    pub keyword: String,
    pub tier: Option<MatchTier>,
    pub hits: Vec<SearchHit>,
}

/// Escape markup-significant characters.
pub fn neutralize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn id_suffix(id: &str) -> &str {
    id.split_once('-').map(|(_, rest)| rest).unwrap_or(id)
}

/// Search across banks, returning hits from the first tier that matches
/// anything: exact id, then id suffix after the first hyphen, then substring
/// of id or question text.
pub fn search(banks: &[Arc<Bank>], keyword: &str) -> Result<SearchResults, SearchError> {
    let trimmed = keyword.trim();
    if trimmed.is_empty() {
        return Err(SearchError::EmptyQuery);
    }
    let len = trimmed.chars().count();
    if len > MAX_QUERY_CHARS {
        return Err(SearchError::QueryTooLong {
            len,
            max: MAX_QUERY_CHARS,
        });
    }
    let keyword = neutralize(trimmed);

    let tiers: [(MatchTier, &dyn Fn(&Question) -> bool); 3] = [
        (MatchTier::ExactId, &|q: &Question| q.id == keyword),
        (MatchTier::IdSuffix, &|q: &Question| id_suffix(&q.id) == keyword),
        (MatchTier::Substring, &|q: &Question| {
            q.id.contains(keyword.as_str()) || q.question.contains(keyword.as_str())
        }),
    ];

    for (tier, pred) in tiers {
        let hits: Vec<SearchHit> = banks
            .iter()
            .flat_map(|bank| {
                bank.questions
                    .iter()
                    .filter(move |q| pred(&***q))
                    .map(move |q| SearchHit {
                        category: bank.category,
                        question: Arc::clone(q),
                    })
            })
            .collect();
        if !hits.is_empty() {
            return Ok(SearchResults {
                keyword: keyword.clone(),
                tier: Some(tier),
                hits,
            });
        }
    }

    Ok(SearchResults {
        keyword,
        tier: None,
        hits: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::tests::question;

    fn banks() -> Vec<Arc<Bank>> {
        let mut a1 = question("MC1-0001", &["A", "B"], "A");
        a1.question = "What does MC2-0001 refer to?".to_string();
        let a2 = question("MC1-0002", &["A", "B"], "B");
        let b1 = question("MC2-0001", &["A", "B"], "A");
        let mut c1 = question("MC3-0002", &["A", "B"], "A");
        c1.question = "Dipole antenna length".to_string();
        vec![
            Arc::new(Bank::new(Category::A, vec![a1, a2])),
            Arc::new(Bank::new(Category::B, vec![b1])),
            Arc::new(Bank::new(Category::C, vec![c1])),
        ]
    }

    #[test]
    fn exact_id_wins_over_substring() {
        let results = search(&banks(), "MC2-0001").unwrap();
        assert_eq!(results.tier, Some(MatchTier::ExactId));
        assert_eq!(results.hits.len(), 1);
        assert_eq!(results.hits[0].category, Category::B);
        assert_eq!(results.hits[0].question.id, "MC2-0001");
    }

    #[test]
    fn suffix_matches_across_categories() {
        let results = search(&banks(), "0002").unwrap();
        assert_eq!(results.tier, Some(MatchTier::IdSuffix));
        let ids: Vec<&str> = results.hits.iter().map(|h| h.question.id.as_str()).collect();
        assert_eq!(ids, vec!["MC1-0002", "MC3-0002"]);
    }

    #[test]
    fn substring_matches_question_text() {
        let results = search(&banks(), "  antenna ").unwrap();
        assert_eq!(results.tier, Some(MatchTier::Substring));
        assert_eq!(results.hits.len(), 1);
        assert_eq!(results.keyword, "antenna");
    }

    #[test]
    fn no_hits_is_not_an_error() {
        let results = search(&banks(), "zzz").unwrap();
        assert!(results.hits.is_empty());
        assert_eq!(results.tier, None);
    }

    #[test]
    fn rejects_empty_and_overlong_queries() {
        assert_eq!(search(&banks(), "   ").unwrap_err(), SearchError::EmptyQuery);
        let long = "x".repeat(101);
        assert!(matches!(
            search(&banks(), &long),
            Err(SearchError::QueryTooLong { len: 101, .. })
        ));
        assert!(search(&banks(), &"x".repeat(100)).is_ok());
    }

    #[test]
    fn markup_is_neutralized_before_echo() {
        let results = search(&banks(), "<script>").unwrap();
        assert_eq!(results.keyword, "&lt;script&gt;");
        assert!(results.hits.is_empty());
    }
}
