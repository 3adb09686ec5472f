use serde::{Deserialize, Serialize};

use crate::bank::Question;
use crate::engine::OptionLayout;

/// A recorded choice. Multi-choice values stay sorted so that comparing the
/// concatenation against the canonical answer string is order-independent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Single(String),
    Multi(Vec<String>),
}

impl Answer {
    pub fn values(&self) -> Vec<&str> {
        match self {
            Answer::Single(v) => vec![v.as_str()],
            Answer::Multi(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        match self {
            Answer::Single(v) => v == value,
            Answer::Multi(vs) => vs.iter().any(|v| v == value),
        }
    }

    pub fn concatenated(&self) -> String {
        match self {
            Answer::Single(v) => v.clone(),
            Answer::Multi(vs) => vs.concat(),
        }
    }
}

/// New slot contents after the user picks `value` on `question`.
///
/// Single-choice replaces the slot. Multi-choice toggles membership and keeps
/// the set sorted; toggling the last value off leaves the slot unanswered.
pub fn apply_choice(question: &Question, slot: Option<&Answer>, value: &str) -> Option<Answer> {
    if !question.is_multi() {
        return Some(Answer::Single(value.to_string()));
    }

    let mut values: Vec<String> = match slot {
        Some(Answer::Multi(vs)) => vs.clone(),
        Some(Answer::Single(v)) => vec![v.clone()],
        None => Vec::new(),
    };
    if let Some(pos) = values.iter().position(|v| v == value) {
        values.remove(pos);
    } else {
        values.push(value.to_string());
        values.sort();
    }

    (!values.is_empty()).then_some(Answer::Multi(values))
}

pub fn is_correct(question: &Question, answer: Option<&Answer>) -> bool {
    match answer {
        None => false,
        Some(Answer::Single(v)) => *v == question.answer,
        Some(multi @ Answer::Multi(_)) => {
            sorted_chars(&multi.concatenated()) == sorted_chars(&question.answer)
        }
    }
}

fn sorted_chars(s: &str) -> Vec<char> {
    let mut chars: Vec<char> = s.chars().collect();
    chars.sort_unstable();
    chars
}

/// Whether a stored answer still matches the question's shape and options.
pub fn fits(question: &Question, answer: &Answer) -> bool {
    let shape_ok = match answer {
        Answer::Single(_) => !question.is_multi(),
        Answer::Multi(vs) => question.is_multi() && !vs.is_empty(),
    };
    shape_ok && answer.values().into_iter().all(|v| question.has_value(v))
}

/// The user's answer in display letters, for result listings.
pub fn describe_answer(answer: Option<&Answer>, layout: &OptionLayout) -> String {
    match answer {
        None => "unanswered".to_string(),
        Some(a) => layout.letters_for(a.values()),
    }
}

/// The canonical answer in display letters.
pub fn describe_correct(question: &Question, layout: &OptionLayout) -> String {
    let mut buf = [0u8; 4];
    question
        .answer
        .chars()
        .map(|ch| {
            let value = ch.encode_utf8(&mut buf);
            layout
                .letter_for(value)
                .map(String::from)
                .unwrap_or_else(|| value.to_string())
        })
        .collect()
}
