use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bank::Category;
use crate::engine::grading::Answer;
use crate::session::PracticeOrder;

/// Id collections kept per category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Wrong,
    Favorite,
}

impl Collection {
    pub fn key(self, category: Category) -> String {
        match self {
            Collection::Wrong => format!("ham_wrong_{category}"),
            Collection::Favorite => format!("ham_fav_{category}"),
        }
    }
}

pub fn pending_key(category: Category, order: PracticeOrder) -> String {
    format!("ham_pending_{category}_{}", order.as_str())
}

/// Resumable snapshot of a normal practice session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSessionRecord {
    pub questions: Vec<String>,
    pub answers: Vec<Option<Answer>>,
    pub current_index: usize,
    pub total: usize,
    pub option_orders: Vec<Vec<usize>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PendingSessionRecord {
    /// A record whose parallel arrays disagree is treated as corrupt.
    pub fn is_consistent(&self) -> bool {
        let n = self.questions.len();
        n > 0
            && self.answers.len() == n
            && self.option_orders.len() == n
            && self.total == n
            && self.current_index < n
    }

    pub fn answered(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    pub fn unanswered_ids(&self) -> impl Iterator<Item = &str> {
        self.questions
            .iter()
            .zip(&self.answers)
            .filter(|(_, a)| a.is_none())
            .map(|(id, _)| id.as_str())
    }

    /// First unanswered position, or the last question when all are answered.
    pub fn resume_position(&self) -> usize {
        self.answers
            .iter()
            .position(Option::is_none)
            .unwrap_or(self.answers.len().saturating_sub(1))
    }
}
