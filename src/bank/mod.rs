pub mod loader;
pub mod markup;
pub mod source;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use loader::BankLoader;
pub use source::{BankSource, DirSource, EmbeddedSource};
#[cfg(feature = "network")]
pub use source::HttpSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    A,
    B,
    C,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::A, Category::B, Category::C];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::A => "A",
            Category::B => "B",
            Category::C => "C",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Category::A => Category::B,
            Category::B => Category::C,
            Category::C => Category::A,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Category::A),
            "B" => Ok(Category::B),
            "C" => Ok(Category::C),
            other => Err(format!("unknown category '{other}' (expected A, B or C)")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub value: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub question: String,
    pub options: Vec<QuestionOption>,
    pub answer: String,
}

impl Question {
    pub fn is_multi(&self) -> bool {
        self.answer.chars().count() > 1
    }

    pub fn has_value(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }

    pub fn option(&self, value: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.value == value)
    }
}

/// The immutable question pool for one category.
#[derive(Debug)]
pub struct Bank {
    pub category: Category,
    pub questions: Vec<Arc<Question>>,
}

impl Bank {
    pub fn new(category: Category, questions: Vec<Question>) -> Self {
        Self {
            category,
            questions: questions.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Question>> {
        self.questions.iter().find(|q| q.id == id)
    }
}

#[derive(Debug, Error)]
pub enum BankLoadError {
    #[error("question bank {category} is unreachable: {reason}")]
    Unreachable { category: Category, reason: String },

    #[error("question bank {category} is malformed: {reason}")]
    Malformed { category: Category, reason: String },

    #[error("question bank {category}, record {index} ({id}): {reason}")]
    InvalidRecord {
        category: Category,
        index: usize,
        id: String,
        reason: String,
    },
}

/// Parse a bank payload. Accepts a plain JSON array or a legacy script file
/// of the form `const questions_X = [ ... ];`, whose array literal is read as
/// data only.
pub fn parse_bank(category: Category, payload: &str) -> Result<Bank, BankLoadError> {
    let trimmed = payload.trim_start_matches('\u{feff}').trim();
    let array = if trimmed.starts_with('[') {
        trimmed
    } else {
        let start = trimmed.find('[');
        let end = trimmed.rfind(']');
        match (start, end) {
            (Some(s), Some(e)) if s < e => &trimmed[s..=e],
            _ => {
                return Err(BankLoadError::Malformed {
                    category,
                    reason: "no question array found".to_string(),
                });
            }
        }
    };

    let questions: Vec<Question> =
        serde_json::from_str(array).map_err(|e| BankLoadError::Malformed {
            category,
            reason: e.to_string(),
        })?;

    validate(category, &questions)?;
    Ok(Bank::new(category, questions))
}

fn validate(category: Category, questions: &[Question]) -> Result<(), BankLoadError> {
    let mut seen = std::collections::HashSet::new();
    for (index, q) in questions.iter().enumerate() {
        let fail = |reason: &str| BankLoadError::InvalidRecord {
            category,
            index,
            id: q.id.clone(),
            reason: reason.to_string(),
        };

        if q.id.trim().is_empty() {
            return Err(fail("empty id"));
        }
        if !seen.insert(q.id.as_str()) {
            return Err(fail("duplicate id"));
        }
        if q.options.is_empty() {
            return Err(fail("no options"));
        }
        let mut values = std::collections::HashSet::new();
        for opt in &q.options {
            if opt.value.is_empty() {
                return Err(fail("option with empty value"));
            }
            if !values.insert(opt.value.as_str()) {
                return Err(fail("duplicate option value"));
            }
        }
        if q.answer.is_empty() {
            return Err(fail("empty answer"));
        }
        let mut buf = [0u8; 4];
        if q.answer
            .chars()
            .any(|ch| !values.contains(&*ch.encode_utf8(&mut buf)))
        {
            return Err(fail("answer references an unknown option value"));
        }
    }
    Ok(())
}
