use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bank::Category;
use crate::config::ExamRule;
use crate::engine::grading;
use crate::session::Session;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExamResult {
    pub category: Category,
    pub correct: usize,
    pub total: usize,
    pub pass_mark: usize,
    pub passed: bool,
    pub elapsed_secs: u64,
    pub finished_at: DateTime<Utc>,
    pub wrong: Vec<WrongItem>,
}

/// One missed question, with answers rendered in the letters the user saw.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WrongItem {
    pub number: usize,
    pub id: String,
    pub your_answer: String,
    pub correct_answer: String,
}

impl ExamResult {
    pub fn from_session(session: &Session, rule: &ExamRule, elapsed_secs: u64) -> Self {
        let mut correct = 0;
        let mut wrong = Vec::new();

        for (idx, question) in session.questions.iter().enumerate() {
            let answer = session.answers[idx].as_ref();
            if grading::is_correct(question, answer) {
                correct += 1;
                continue;
            }
            let layout = &session.layouts[idx];
            wrong.push(WrongItem {
                number: idx + 1,
                id: question.id.clone(),
                your_answer: grading::describe_answer(answer, layout),
                correct_answer: grading::describe_correct(question, layout),
            });
        }

        let total = session.questions.len();
        let pass_mark = scaled_pass_mark(rule, total);
        Self {
            category: session.category,
            correct,
            total,
            pass_mark,
            passed: correct >= pass_mark,
            elapsed_secs,
            finished_at: Utc::now(),
            wrong,
        }
    }

    pub fn wrong_ids(&self) -> impl Iterator<Item = &str> {
        self.wrong.iter().map(|w| w.id.as_str())
    }

    pub fn score_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64
    }
}

/// Pass mark for a paper of `drawn` questions. A bank shorter than the
/// configured exam keeps the same pass ratio, rounded up.
pub fn scaled_pass_mark(rule: &ExamRule, drawn: usize) -> usize {
    if drawn >= rule.total {
        return rule.pass;
    }
    (rule.pass * drawn).div_ceil(rule.total.max(1))
}
