use std::sync::Arc;
use std::time::Instant;

use crate::bank::{Category, Question, QuestionOption};
use crate::engine::OptionLayout;
use crate::engine::grading::{self, Answer};
use crate::session::{Countdown, SessionId, SessionMode};

/// The active attempt. `questions`, `layouts` and `answers` always have the
/// same length.
#[derive(Clone, Debug)]
pub struct Session {
    pub(crate) id: SessionId,
    pub(crate) mode: SessionMode,
    pub(crate) category: Category,
    pub(crate) questions: Vec<Arc<Question>>,
    pub(crate) layouts: Vec<OptionLayout>,
    pub(crate) answers: Vec<Option<Answer>>,
    pub(crate) current: usize,
    pub(crate) countdown: Option<Countdown>,
    pub(crate) started_at: Instant,
}

impl Session {
    pub(crate) fn new(
        id: SessionId,
        mode: SessionMode,
        category: Category,
        questions: Vec<Arc<Question>>,
        layouts: Vec<OptionLayout>,
        started_at: Instant,
    ) -> Self {
        debug_assert_eq!(questions.len(), layouts.len());
        let answers = vec![None; questions.len()];
        Self {
            id,
            mode,
            category,
            questions,
            layouts,
            answers,
            current: 0,
            countdown: None,
            started_at,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index).map(|q| &**q)
    }

    pub fn questions(&self) -> &[Arc<Question>] {
        &self.questions
    }

    pub fn layout(&self, index: usize) -> Option<&OptionLayout> {
        self.layouts.get(index)
    }

    pub fn answer(&self, index: usize) -> Option<&Answer> {
        self.answers.get(index).and_then(Option::as_ref)
    }

    pub fn answers(&self) -> &[Option<Answer>] {
        &self.answers
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    /// Current question's options in display order.
    pub fn displayed_options(&self) -> Vec<(char, &QuestionOption)> {
        self.layouts[self.current].displayed(&self.questions[self.current])
    }

    /// Practice feedback for a question, once it has an answer.
    pub fn verdict(&self, index: usize) -> Option<bool> {
        let question = self.questions.get(index)?;
        let answer = self.answer(index)?;
        Some(grading::is_correct(question, Some(answer)))
    }

    pub fn countdown(&self) -> Option<&Countdown> {
        self.countdown.as_ref()
    }

    pub fn remaining_secs(&self, now: Instant) -> Option<u64> {
        self.countdown.as_ref().map(|c| c.remaining_secs(now))
    }

    pub fn progress(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        (self.current + 1) as f64 / self.questions.len() as f64
    }
}
