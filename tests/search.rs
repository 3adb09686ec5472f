use hamexam::bank::{BankLoader, Category, EmbeddedSource};
use hamexam::engine::search::{MatchTier, SearchError, search};

fn banks() -> Vec<std::sync::Arc<hamexam::bank::Bank>> {
    BankLoader::new(EmbeddedSource).load_all().unwrap()
}

#[test]
fn exact_id_returns_single_hit() {
    let results = search(&banks(), "MC2-0003").unwrap();
    assert_eq!(results.tier, Some(MatchTier::ExactId));
    assert_eq!(results.hits.len(), 1);
    assert_eq!(results.hits[0].category, Category::B);
}

#[test]
fn number_matches_every_class() {
    let results = search(&banks(), "0001").unwrap();
    assert_eq!(results.tier, Some(MatchTier::IdSuffix));
    let categories: Vec<Category> = results.hits.iter().map(|h| h.category).collect();
    assert_eq!(categories, [Category::A, Category::B, Category::C]);
}

#[test]
fn text_search_falls_through_to_substring() {
    let results = search(&banks(), "ionosphere").unwrap();
    assert_eq!(results.tier, Some(MatchTier::Substring));
    assert_eq!(results.hits.len(), 1);
    assert_eq!(results.hits[0].question.id, "MC2-0009");
}

#[test]
fn overlong_keyword_is_rejected() {
    let keyword = "a".repeat(150);
    assert_eq!(
        search(&banks(), &keyword).unwrap_err(),
        SearchError::QueryTooLong { len: 150, max: 100 }
    );
}
