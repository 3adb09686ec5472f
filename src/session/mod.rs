pub mod controller;
pub mod countdown;
pub mod result;
pub mod state;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::bank::{BankLoadError, Category};

pub use controller::{ResumeOutcome, SessionController, SessionState};
pub use countdown::Countdown;
pub use result::{ExamResult, WrongItem};
pub use state::Session;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PracticeOrder {
    Asc,
    Desc,
    Random,
}

impl PracticeOrder {
    pub const ALL: [PracticeOrder; 3] = [PracticeOrder::Asc, PracticeOrder::Desc, PracticeOrder::Random];

    pub fn as_str(self) -> &'static str {
        match self {
            PracticeOrder::Asc => "asc",
            PracticeOrder::Desc => "desc",
            PracticeOrder::Random => "random",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PracticeOrder::Asc => "in order",
            PracticeOrder::Desc => "reverse order",
            PracticeOrder::Random => "shuffled",
        }
    }

    pub fn next(self) -> Self {
        match self {
            PracticeOrder::Asc => PracticeOrder::Desc,
            PracticeOrder::Desc => PracticeOrder::Random,
            PracticeOrder::Random => PracticeOrder::Asc,
        }
    }
}

impl FromStr for PracticeOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(PracticeOrder::Asc),
            "desc" => Ok(PracticeOrder::Desc),
            "random" => Ok(PracticeOrder::Random),
            other => Err(format!("unknown practice order '{other}'")),
        }
    }
}

impl fmt::Display for PracticeOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PracticeFilter {
    None,
    WrongOnly,
    FavoriteOnly,
    PendingOnly,
}

impl PracticeFilter {
    /// Only unfiltered practice keeps resumable progress.
    pub fn is_normal(self) -> bool {
        self == PracticeFilter::None
    }

    pub fn label(self) -> &'static str {
        match self {
            PracticeFilter::None => "Practice",
            PracticeFilter::WrongOnly => "Wrong-answer review",
            PracticeFilter::FavoriteOnly => "Favorites",
            PracticeFilter::PendingOnly => "Unfinished questions",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionMode {
    Exam,
    Practice {
        order: PracticeOrder,
        filter: PracticeFilter,
    },
}

impl SessionMode {
    pub fn is_exam(self) -> bool {
        matches!(self, SessionMode::Exam)
    }

    pub fn is_normal_practice(self) -> bool {
        matches!(self, SessionMode::Practice { filter, .. } if filter.is_normal())
    }

    pub fn label(self) -> &'static str {
        match self {
            SessionMode::Exam => "Mock exam",
            SessionMode::Practice { filter, .. } => filter.label(),
        }
    }
}

/// Identifies one session for its whole lifetime; never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Bank(#[from] BankLoadError),

    #[error("saved progress for {category} references {} question(s) no longer in the bank", .missing.len())]
    StaleBank {
        category: Category,
        missing: Vec<String>,
    },

    #[error("{}: nothing to practice", .filter.label())]
    EmptyFilterResult { filter: PracticeFilter },

    #[error("question {} is out of range; choose 1 to {len}", display_index(.index))]
    OutOfRangeNavigation { index: isize, len: usize },

    #[error("no saved progress for {category} ({order})")]
    NoPendingSession {
        category: Category,
        order: PracticeOrder,
    },

    #[error("no session is active")]
    NotActive,

    #[error("{action} is only available in {expected}")]
    WrongMode {
        action: &'static str,
        expected: &'static str,
    },

    #[error("'{value}' is not an option of question {id}")]
    InvalidOption { id: String, value: String },
}

fn display_index(index: &isize) -> isize {
    index.saturating_add(1)
}
