use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::bank::{Bank, Category, Question};
use crate::config::{ExamConfig, ExamRule};
use crate::engine::grading;
use crate::engine::{OptionLayout, shuffle};
use crate::session::{
    Countdown, ExamResult, PracticeFilter, PracticeOrder, Session, SessionError, SessionId,
    SessionMode,
};
use crate::store::{Collection, KvStore, PendingSessionRecord, ProgressStore};

pub enum SessionState {
    Idle,
    Active(Session),
    Graded(ExamResult),
}

#[derive(Debug)]
pub enum ResumeOutcome {
    Resumed,
    /// The saved progress no longer matched the bank; it was discarded and a
    /// fresh normal practice session started instead.
    Restarted { reason: SessionError },
}

pub struct SessionController<K> {
    store: ProgressStore<K>,
    exams: ExamConfig,
    rng: SmallRng,
    state: SessionState,
    next_id: u64,
}

impl<K: KvStore> SessionController<K> {
    pub fn new(store: ProgressStore<K>, exams: ExamConfig) -> Self {
        Self::with_rng(store, exams, SmallRng::from_entropy())
    }

    pub fn with_rng(store: ProgressStore<K>, exams: ExamConfig, rng: SmallRng) -> Self {
        Self {
            store,
            exams,
            rng,
            state: SessionState::Idle,
            next_id: 1,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            SessionState::Active(s) => Some(s),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&ExamResult> {
        match &self.state {
            SessionState::Graded(r) => Some(r),
            _ => None,
        }
    }

    pub fn store(&self) -> &ProgressStore<K> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ProgressStore<K> {
        &mut self.store
    }

    pub fn exam_rule(&self, category: Category) -> &ExamRule {
        self.exams.rule(category)
    }

    fn allocate_id(&mut self) -> SessionId {
        let id = SessionId(self.next_id);
        self.next_id += 1;
        id
    }

    fn randomize_layouts(&mut self, questions: &[Arc<Question>]) -> Vec<OptionLayout> {
        questions
            .iter()
            .map(|q| OptionLayout::randomize(q, &mut self.rng))
            .collect()
    }

    pub fn start_exam(&mut self, bank: &Bank, now: Instant) -> Result<(), SessionError> {
        let rule = *self.exams.rule(bank.category);
        let count = rule.total.min(bank.len());
        if count == 0 {
            return Err(SessionError::EmptyFilterResult {
                filter: PracticeFilter::None,
            });
        }

        let mut picked = shuffle::shuffled(bank.questions.clone(), &mut self.rng);
        picked.truncate(count);
        let layouts = self.randomize_layouts(&picked);

        let id = self.allocate_id();
        let mut session = Session::new(id, SessionMode::Exam, bank.category, picked, layouts, now);
        session.countdown = Some(Countdown::start(
            id,
            Duration::from_secs(rule.time * 60),
            now,
        ));

        tracing::info!(category = %bank.category, questions = count, minutes = rule.time, ?id, "exam started");
        self.state = SessionState::Active(session);
        Ok(())
    }

    pub fn start_practice(
        &mut self,
        bank: &Bank,
        order: PracticeOrder,
        filter: PracticeFilter,
        now: Instant,
    ) -> Result<(), SessionError> {
        let category = bank.category;
        let keep: Option<HashSet<String>> = match filter {
            PracticeFilter::None => None,
            PracticeFilter::WrongOnly => Some(self.store.id_set(Collection::Wrong, category)),
            PracticeFilter::FavoriteOnly => {
                Some(self.store.id_set(Collection::Favorite, category))
            }
            PracticeFilter::PendingOnly => Some(
                self.store
                    .pending(category, order)
                    .map(|r| r.unanswered_ids().map(str::to_string).collect())
                    .unwrap_or_default(),
            ),
        };

        let base: Vec<Arc<Question>> = bank
            .questions
            .iter()
            .filter(|q| keep.as_ref().is_none_or(|ids| ids.contains(&q.id)))
            .cloned()
            .collect();
        if base.is_empty() {
            return Err(SessionError::EmptyFilterResult { filter });
        }

        let questions = match order {
            PracticeOrder::Asc => base,
            PracticeOrder::Desc => base.into_iter().rev().collect(),
            PracticeOrder::Random => shuffle::shuffled(base, &mut self.rng),
        };
        let layouts = self.randomize_layouts(&questions);

        let id = self.allocate_id();
        let mode = SessionMode::Practice { order, filter };
        let session = Session::new(id, mode, category, questions, layouts, now);

        if filter.is_normal() {
            if let Err(e) = self.store.clear_pending(category, order) {
                tracing::warn!(%category, %order, error = %e, "could not clear old progress");
            }
            persist_pending(&mut self.store, &session);
        }

        tracing::info!(%category, %order, ?filter, questions = session.len(), ?id, "practice started");
        self.state = SessionState::Active(session);
        Ok(())
    }

    pub fn resume_practice(
        &mut self,
        bank: &Bank,
        order: PracticeOrder,
        now: Instant,
    ) -> Result<ResumeOutcome, SessionError> {
        let category = bank.category;
        let mut record = self
            .store
            .pending(category, order)
            .ok_or(SessionError::NoPendingSession { category, order })?;

        let by_id: HashMap<&str, &Arc<Question>> =
            bank.questions.iter().map(|q| (q.id.as_str(), q)).collect();

        let mut questions = Vec::with_capacity(record.questions.len());
        let mut layouts = Vec::with_capacity(record.questions.len());
        let mut missing = Vec::new();
        for (id, stored_order) in record.questions.iter().zip(&record.option_orders) {
            let layout = by_id
                .get(id.as_str())
                .and_then(|q| OptionLayout::from_order(q, stored_order.clone()).map(|l| (*q, l)));
            match layout {
                Some((q, l)) => {
                    questions.push(Arc::clone(q));
                    layouts.push(l);
                }
                None => missing.push(id.clone()),
            }
        }

        if !missing.is_empty() {
            tracing::warn!(%category, %order, missing = missing.len(), "saved progress is stale; starting over");
            if let Err(e) = self.store.clear_pending(category, order) {
                tracing::warn!(%category, %order, error = %e, "could not discard stale progress");
            }
            let reason = SessionError::StaleBank { category, missing };
            self.start_practice(bank, order, PracticeFilter::None, now)?;
            return Ok(ResumeOutcome::Restarted { reason });
        }

        let mut dropped = 0;
        for (question, slot) in questions.iter().zip(record.answers.iter_mut()) {
            if slot.as_ref().is_some_and(|a| !grading::fits(question, a)) {
                *slot = None;
                dropped += 1;
            }
        }
        if dropped > 0 {
            tracing::warn!(%category, %order, dropped, "discarded saved answers that no longer match their questions");
        }

        let id = self.allocate_id();
        let mode = SessionMode::Practice {
            order,
            filter: PracticeFilter::None,
        };
        let mut session = Session::new(id, mode, category, questions, layouts, now);
        session.answers = record.answers.clone();
        session.current = record.resume_position();
        persist_pending(&mut self.store, &session);

        tracing::info!(%category, %order, answered = record.answered(), position = session.current, ?id, "practice resumed");
        self.state = SessionState::Active(session);
        Ok(ResumeOutcome::Resumed)
    }

    fn active_mut(&mut self) -> Result<&mut Session, SessionError> {
        match &mut self.state {
            SessionState::Active(s) => Ok(s),
            _ => Err(SessionError::NotActive),
        }
    }

    pub fn record_answer(&mut self, index: usize, value: &str) -> Result<(), SessionError> {
        let SessionState::Active(session) = &mut self.state else {
            return Err(SessionError::NotActive);
        };
        let Some(question) = session.questions.get(index).cloned() else {
            return Err(SessionError::OutOfRangeNavigation {
                index: index as isize,
                len: session.len(),
            });
        };
        if !question.has_value(value) {
            return Err(SessionError::InvalidOption {
                id: question.id.clone(),
                value: value.to_string(),
            });
        }

        let updated = grading::apply_choice(&question, session.answers[index].as_ref(), value);
        session.answers[index] = updated;

        if let SessionMode::Practice { filter, .. } = session.mode {
            let correct = grading::is_correct(&question, session.answers[index].as_ref());
            let category = session.category;
            let outcome = if correct {
                self.store.remove_id(Collection::Wrong, category, &question.id)
            } else {
                self.store.add_id(Collection::Wrong, category, &question.id)
            };
            if let Err(e) = outcome {
                tracing::warn!(%category, id = %question.id, error = %e, "could not update wrong list");
            }
            if filter.is_normal() {
                persist_pending(&mut self.store, session);
            }
        }
        Ok(())
    }

    /// Answer the current question by the letter shown on screen.
    pub fn answer_letter(&mut self, letter: char) -> Result<(), SessionError> {
        let session = self.session().ok_or(SessionError::NotActive)?;
        let index = session.current;
        let question = &session.questions[index];
        let value = session.layouts[index]
            .value_for_letter(question, letter)
            .ok_or_else(|| SessionError::InvalidOption {
                id: question.id.clone(),
                value: letter.to_string(),
            })?
            .to_string();
        self.record_answer(index, &value)
    }

    pub fn goto(&mut self, index: isize) -> Result<(), SessionError> {
        let SessionState::Active(session) = &mut self.state else {
            return Err(SessionError::NotActive);
        };
        let len = session.len();
        let target = usize::try_from(index)
            .ok()
            .filter(|&i| i < len)
            .ok_or(SessionError::OutOfRangeNavigation { index, len })?;

        session.current = target;
        if session.mode.is_normal_practice() {
            persist_pending(&mut self.store, session);
        }
        Ok(())
    }

    /// Move forward one question; stays put on the last one.
    pub fn next(&mut self) -> Result<(), SessionError> {
        let session = self.active_mut()?;
        if session.current + 1 < session.len() {
            let target = session.current + 1;
            self.goto(target as isize)?;
        }
        Ok(())
    }

    /// Move back one question; stays put on the first one.
    pub fn prev(&mut self) -> Result<(), SessionError> {
        let session = self.active_mut()?;
        if session.current > 0 {
            let target = session.current - 1;
            self.goto(target as isize)?;
        }
        Ok(())
    }

    pub fn submit(&mut self, now: Instant) -> Result<&ExamResult, SessionError> {
        let session = match &self.state {
            SessionState::Active(s) if s.mode.is_exam() => s,
            SessionState::Active(_) => {
                return Err(SessionError::WrongMode {
                    action: "submitting",
                    expected: "mock exams",
                });
            }
            _ => return Err(SessionError::NotActive),
        };

        let rule = *self.exams.rule(session.category);
        let elapsed = session
            .countdown
            .as_ref()
            .map(|c| c.elapsed(now))
            .unwrap_or_else(|| now.saturating_duration_since(session.started_at));
        let result = ExamResult::from_session(session, &rule, elapsed.as_secs());

        if let Err(e) = self
            .store
            .add_ids(Collection::Wrong, result.category, result.wrong_ids())
        {
            tracing::warn!(category = %result.category, error = %e, "could not record exam mistakes");
        }

        tracing::info!(
            category = %result.category,
            correct = result.correct,
            total = result.total,
            passed = result.passed,
            "exam submitted"
        );
        self.state = SessionState::Graded(result);
        match &self.state {
            SessionState::Graded(r) => Ok(r),
            _ => Err(SessionError::NotActive),
        }
    }

    /// Timer callback for the countdown owned by `owner`. Ignored unless that
    /// exam is still the active session. Returns whether it submitted.
    pub fn expire(&mut self, owner: SessionId, now: Instant) -> bool {
        let owns = self
            .session()
            .and_then(Session::countdown)
            .is_some_and(|c| c.owner() == owner);
        if !owns {
            tracing::debug!(?owner, "ignoring stale countdown");
            return false;
        }
        self.submit(now).is_ok()
    }

    /// Drive the countdown; submits the exam once time is up.
    pub fn tick(&mut self, now: Instant) -> bool {
        let expired = self
            .session()
            .and_then(Session::countdown)
            .filter(|c| c.is_expired(now))
            .map(Countdown::owner);
        match expired {
            Some(owner) => self.expire(owner, now),
            None => false,
        }
    }

    fn practice_session(&self, action: &'static str) -> Result<&Session, SessionError> {
        match &self.state {
            SessionState::Active(s) if !s.mode.is_exam() => Ok(s),
            SessionState::Active(_) => Err(SessionError::WrongMode {
                action,
                expected: "practice",
            }),
            _ => Err(SessionError::NotActive),
        }
    }

    /// Returns whether the current question is a favorite afterwards.
    pub fn toggle_favorite(&mut self) -> Result<bool, SessionError> {
        let session = self.practice_session("favorites")?;
        let category = session.category;
        let id = session.current_question().id.clone();
        match self.store.toggle_id(Collection::Favorite, category, &id) {
            Ok(now_favorite) => Ok(now_favorite),
            Err(e) => {
                tracing::warn!(%category, %id, error = %e, "could not update favorites");
                Ok(self.store.contains(Collection::Favorite, category, &id))
            }
        }
    }

    /// Returns whether the current question was on the wrong list.
    pub fn remove_current_from_wrong(&mut self) -> Result<bool, SessionError> {
        let session = self.practice_session("removing from the wrong list")?;
        let category = session.category;
        let id = session.current_question().id.clone();
        match self.store.remove_id(Collection::Wrong, category, &id) {
            Ok(was_present) => Ok(was_present),
            Err(e) => {
                tracing::warn!(%category, %id, error = %e, "could not update wrong list");
                Ok(false)
            }
        }
    }

    fn current_in(&self, collection: Collection) -> bool {
        self.session().is_some_and(|s| {
            self.store
                .contains(collection, s.category, &s.current_question().id)
        })
    }

    pub fn is_favorite(&self) -> bool {
        self.current_in(Collection::Favorite)
    }

    pub fn is_wrong(&self) -> bool {
        self.current_in(Collection::Wrong)
    }

    /// Leave the current session or result screen. Any saved practice
    /// progress stays in the store.
    pub fn exit(&mut self) {
        if let SessionState::Active(s) = &self.state {
            tracing::info!(id = ?s.id, mode = s.mode.label(), "session exited");
        }
        self.state = SessionState::Idle;
    }
}

fn persist_pending<K: KvStore>(store: &mut ProgressStore<K>, session: &Session) {
    let SessionMode::Practice { order, filter } = session.mode else {
        return;
    };
    if !filter.is_normal() {
        return;
    }
    let record = PendingSessionRecord {
        questions: session.questions.iter().map(|q| q.id.clone()).collect(),
        answers: session.answers.clone(),
        current_index: session.current,
        total: session.len(),
        option_orders: session.layouts.iter().map(|l| l.order().to_vec()).collect(),
        updated_at: Some(Utc::now()),
    };
    match store.save_pending(session.category, order, &record) {
        Ok(()) => tracing::debug!(category = %session.category, %order, position = session.current, "progress saved"),
        Err(e) => tracing::warn!(category = %session.category, %order, error = %e, "could not save progress"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::tests::question;
    use crate::engine::grading::Answer;
    use crate::store::MemoryKvStore;

    fn bank(category: Category, n: usize) -> Bank {
        let questions = (1..=n)
            .map(|i| question(&format!("MC1-{i:04}"), &["A", "B", "C", "D"], "A"))
            .collect();
        Bank::new(category, questions)
    }

    fn controller() -> SessionController<MemoryKvStore> {
        SessionController::with_rng(
            ProgressStore::new(MemoryKvStore::new()),
            ExamConfig::default(),
            SmallRng::seed_from_u64(7),
        )
    }

    fn ids(session: &Session) -> Vec<String> {
        session.questions.iter().map(|q| q.id.clone()).collect()
    }

    #[test]
    fn exam_draws_distinct_questions_and_auto_submits() {
        let mut ctl = controller();
        let bank = bank(Category::A, 50);
        let t0 = Instant::now();
        ctl.start_exam(&bank, t0).unwrap();

        let session = ctl.session().unwrap();
        assert_eq!(session.len(), 40);
        let distinct: HashSet<_> = ids(session).into_iter().collect();
        assert_eq!(distinct.len(), 40);
        assert_eq!(session.remaining_secs(t0), Some(2400));

        assert!(!ctl.tick(t0 + Duration::from_secs(2399)));
        assert!(ctl.session().is_some());
        assert!(ctl.tick(t0 + Duration::from_secs(2400)));

        let result = ctl.result().unwrap();
        assert_eq!(result.total, 40);
        assert_eq!(result.correct, 0);
        assert!(!result.passed);
        assert_eq!(result.elapsed_secs, 2400);
        assert_eq!(ctl.store().stats().count(Collection::Wrong, Category::A), 40);
    }

    #[test]
    fn exam_on_small_bank_uses_every_question() {
        let mut ctl = controller();
        ctl.start_exam(&bank(Category::B, 12), Instant::now()).unwrap();
        assert_eq!(ctl.session().unwrap().len(), 12);
    }

    #[test]
    fn exam_defers_wrong_list_until_submit() {
        let mut ctl = controller();
        let t0 = Instant::now();
        ctl.start_exam(&bank(Category::A, 40), t0).unwrap();
        ctl.record_answer(0, "A").unwrap();
        ctl.record_answer(1, "B").unwrap();

        assert_eq!(ctl.store().stats().count(Collection::Wrong, Category::A), 0);
        assert!(ctl.store().pending(Category::A, PracticeOrder::Asc).is_none());

        let result = ctl.submit(t0 + Duration::from_secs(90)).unwrap();
        assert_eq!(result.correct, 1);
        assert_eq!(result.wrong.len(), 39);
        assert_eq!(result.elapsed_secs, 90);
        assert_eq!(ctl.store().stats().count(Collection::Wrong, Category::A), 39);
    }

    #[test]
    fn practice_single_answer_tracks_wrong_list() {
        let mut ctl = controller();
        ctl.start_practice(&bank(Category::A, 5), PracticeOrder::Asc, PracticeFilter::None, Instant::now())
            .unwrap();

        ctl.record_answer(0, "B").unwrap();
        assert!(ctl.is_wrong());
        assert_eq!(ctl.session().unwrap().verdict(0), Some(false));

        ctl.record_answer(0, "A").unwrap();
        assert!(!ctl.is_wrong());
        assert_eq!(
            ctl.session().unwrap().answer(0),
            Some(&Answer::Single("A".to_string()))
        );
    }

    #[test]
    fn practice_multi_answer_toggles_until_exact() {
        let mut ctl = controller();
        let bank = Bank::new(
            Category::C,
            vec![question("MC3-0001", &["A", "B", "C", "D"], "AC")],
        );
        ctl.start_practice(&bank, PracticeOrder::Asc, PracticeFilter::None, Instant::now())
            .unwrap();

        ctl.record_answer(0, "C").unwrap();
        assert!(ctl.is_wrong());
        ctl.record_answer(0, "A").unwrap();
        assert!(!ctl.is_wrong());
        assert_eq!(
            ctl.session().unwrap().answer(0),
            Some(&Answer::Multi(vec!["A".to_string(), "C".to_string()]))
        );

        ctl.record_answer(0, "C").unwrap();
        assert!(ctl.is_wrong());
        ctl.record_answer(0, "A").unwrap();
        assert_eq!(ctl.session().unwrap().answer(0), None);
        assert!(ctl.is_wrong());
    }

    #[test]
    fn practice_orders_sequence() {
        let bank = bank(Category::A, 4);
        let mut ctl = controller();
        ctl.start_practice(&bank, PracticeOrder::Asc, PracticeFilter::None, Instant::now())
            .unwrap();
        assert_eq!(ids(ctl.session().unwrap()), ["MC1-0001", "MC1-0002", "MC1-0003", "MC1-0004"]);

        ctl.start_practice(&bank, PracticeOrder::Desc, PracticeFilter::None, Instant::now())
            .unwrap();
        assert_eq!(ids(ctl.session().unwrap()), ["MC1-0004", "MC1-0003", "MC1-0002", "MC1-0001"]);

        ctl.start_practice(&bank, PracticeOrder::Random, PracticeFilter::None, Instant::now())
            .unwrap();
        let mut shuffled = ids(ctl.session().unwrap());
        shuffled.sort();
        assert_eq!(shuffled, ["MC1-0001", "MC1-0002", "MC1-0003", "MC1-0004"]);
    }

    #[test]
    fn resume_restores_orders_and_first_unanswered() {
        let bank = bank(Category::B, 8);
        let mut ctl = controller();
        ctl.start_practice(&bank, PracticeOrder::Random, PracticeFilter::None, Instant::now())
            .unwrap();
        ctl.record_answer(0, "A").unwrap();
        ctl.record_answer(1, "B").unwrap();
        ctl.goto(6).unwrap();
        let before = ctl.session().unwrap().clone();
        ctl.exit();
        assert!(ctl.session().is_none());

        for _ in 0..2 {
            let outcome = ctl
                .resume_practice(&bank, PracticeOrder::Random, Instant::now())
                .unwrap();
            assert!(matches!(outcome, ResumeOutcome::Resumed));
            let session = ctl.session().unwrap();
            assert_eq!(ids(session), ids(&before));
            assert_eq!(session.layouts, before.layouts);
            assert_eq!(session.answers, before.answers);
            assert_eq!(session.current_index(), 2);
            ctl.exit();
        }
    }

    #[test]
    fn resume_discards_answers_the_bank_no_longer_offers() {
        let mut ctl = controller();
        let original = bank(Category::A, 3);
        ctl.start_practice(&original, PracticeOrder::Asc, PracticeFilter::None, Instant::now())
            .unwrap();
        ctl.record_answer(0, "D").unwrap();
        ctl.record_answer(1, "B").unwrap();
        ctl.record_answer(2, "A").unwrap();
        ctl.exit();

        // Same ids, but the first question lost option D and the second
        // became multi-choice.
        let revised = Bank::new(
            Category::A,
            vec![
                question("MC1-0001", &["A", "B", "C"], "A"),
                question("MC1-0002", &["A", "B", "C", "D"], "AB"),
                question("MC1-0003", &["A", "B", "C", "D"], "A"),
            ],
        );
        let mut record = ctl.store().pending(Category::A, PracticeOrder::Asc).unwrap();
        record.option_orders[0] = vec![0, 1, 2];
        ctl.store_mut()
            .save_pending(Category::A, PracticeOrder::Asc, &record)
            .unwrap();

        let outcome = ctl
            .resume_practice(&revised, PracticeOrder::Asc, Instant::now())
            .unwrap();
        assert!(matches!(outcome, ResumeOutcome::Resumed));
        let session = ctl.session().unwrap();
        assert_eq!(session.answer(0), None);
        assert_eq!(session.answer(1), None);
        assert_eq!(session.answer(2), Some(&Answer::Single("A".to_string())));
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn resume_without_progress_is_rejected() {
        let mut ctl = controller();
        let err = ctl
            .resume_practice(&bank(Category::A, 3), PracticeOrder::Desc, Instant::now())
            .unwrap_err();
        assert!(matches!(err, SessionError::NoPendingSession { .. }));
    }

    #[test]
    fn new_normal_practice_overwrites_progress() {
        let bank = bank(Category::A, 5);
        let mut ctl = controller();
        ctl.start_practice(&bank, PracticeOrder::Asc, PracticeFilter::None, Instant::now())
            .unwrap();
        ctl.record_answer(0, "A").unwrap();
        ctl.exit();
        assert_eq!(ctl.store().pending(Category::A, PracticeOrder::Asc).unwrap().answered(), 1);

        ctl.start_practice(&bank, PracticeOrder::Asc, PracticeFilter::None, Instant::now())
            .unwrap();
        let record = ctl.store().pending(Category::A, PracticeOrder::Asc).unwrap();
        assert_eq!(record.answered(), 0);
        assert_eq!(record.total, 5);
    }

    #[test]
    fn filtered_practice_never_saves_progress() {
        let bank = bank(Category::A, 5);
        let mut ctl = controller();
        ctl.store_mut()
            .add_ids(Collection::Wrong, Category::A, ["MC1-0002", "MC1-0004"])
            .unwrap();

        ctl.start_practice(&bank, PracticeOrder::Asc, PracticeFilter::WrongOnly, Instant::now())
            .unwrap();
        assert_eq!(ids(ctl.session().unwrap()), ["MC1-0002", "MC1-0004"]);
        ctl.record_answer(0, "A").unwrap();
        ctl.next().unwrap();
        assert!(ctl.store().pending(Category::A, PracticeOrder::Asc).is_none());
        assert_eq!(ctl.store().ids(Collection::Wrong, Category::A), ["MC1-0004"]);
    }

    #[test]
    fn empty_filter_leaves_state_untouched() {
        let mut ctl = controller();
        let err = ctl
            .start_practice(&bank(Category::C, 3), PracticeOrder::Asc, PracticeFilter::FavoriteOnly, Instant::now())
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::EmptyFilterResult {
                filter: PracticeFilter::FavoriteOnly
            }
        ));
        assert!(matches!(ctl.state(), SessionState::Idle));
    }

    #[test]
    fn pending_only_practices_unanswered_questions() {
        let bank = bank(Category::A, 5);
        let mut ctl = controller();
        ctl.start_practice(&bank, PracticeOrder::Asc, PracticeFilter::None, Instant::now())
            .unwrap();
        ctl.record_answer(0, "A").unwrap();
        ctl.record_answer(1, "C").unwrap();
        ctl.exit();

        ctl.start_practice(&bank, PracticeOrder::Asc, PracticeFilter::PendingOnly, Instant::now())
            .unwrap();
        assert_eq!(ids(ctl.session().unwrap()), ["MC1-0003", "MC1-0004", "MC1-0005"]);
        ctl.record_answer(0, "A").unwrap();
        let record = ctl.store().pending(Category::A, PracticeOrder::Asc).unwrap();
        assert_eq!(record.answered(), 2);
    }

    #[test]
    fn goto_rejects_out_of_range_and_next_prev_clamp() {
        let mut ctl = controller();
        ctl.start_practice(&bank(Category::A, 3), PracticeOrder::Asc, PracticeFilter::None, Instant::now())
            .unwrap();

        assert!(matches!(
            ctl.goto(-1),
            Err(SessionError::OutOfRangeNavigation { index: -1, len: 3 })
        ));
        assert!(matches!(
            ctl.goto(3),
            Err(SessionError::OutOfRangeNavigation { index: 3, len: 3 })
        ));
        assert_eq!(ctl.session().unwrap().current_index(), 0);

        ctl.prev().unwrap();
        assert_eq!(ctl.session().unwrap().current_index(), 0);
        ctl.goto(2).unwrap();
        ctl.next().unwrap();
        assert_eq!(ctl.session().unwrap().current_index(), 2);
        assert_eq!(
            ctl.store().pending(Category::A, PracticeOrder::Asc).unwrap().current_index,
            2
        );
    }

    #[test]
    fn answers_stay_aligned_with_questions() {
        let mut ctl = controller();
        ctl.start_exam(&bank(Category::A, 45), Instant::now()).unwrap();
        for i in 0..40 {
            ctl.record_answer(i, "B").unwrap();
        }
        let session = ctl.session().unwrap();
        assert_eq!(session.answers().len(), session.len());
        assert!(matches!(
            ctl.record_answer(40, "A"),
            Err(SessionError::OutOfRangeNavigation { .. })
        ));
        assert!(matches!(
            ctl.record_answer(0, "Z"),
            Err(SessionError::InvalidOption { .. })
        ));
    }

    #[test]
    fn stale_countdown_cannot_submit_a_later_exam() {
        let bank = bank(Category::A, 40);
        let mut ctl = controller();
        let t0 = Instant::now();
        ctl.start_exam(&bank, t0).unwrap();
        let first = ctl.session().unwrap().id();
        ctl.exit();

        ctl.start_exam(&bank, t0).unwrap();
        let second = ctl.session().unwrap().id();
        assert_ne!(first, second);

        let late = t0 + Duration::from_secs(10_000);
        assert!(!ctl.expire(first, late));
        assert!(ctl.session().is_some());
        assert!(ctl.expire(second, late));
        assert!(ctl.result().is_some());
    }

    #[test]
    fn tick_ignores_practice() {
        let mut ctl = controller();
        let t0 = Instant::now();
        ctl.start_practice(&bank(Category::A, 3), PracticeOrder::Asc, PracticeFilter::None, t0)
            .unwrap();
        assert!(!ctl.tick(t0 + Duration::from_secs(100_000)));
        assert!(ctl.session().is_some());
    }

    #[test]
    fn stale_bank_restarts_fresh_practice() {
        let mut ctl = controller();
        ctl.start_practice(&bank(Category::A, 6), PracticeOrder::Asc, PracticeFilter::None, Instant::now())
            .unwrap();
        ctl.record_answer(0, "A").unwrap();
        ctl.goto(5).unwrap();
        ctl.exit();

        let shrunk = bank(Category::A, 4);
        let outcome = ctl
            .resume_practice(&shrunk, PracticeOrder::Asc, Instant::now())
            .unwrap();
        match outcome {
            ResumeOutcome::Restarted {
                reason: SessionError::StaleBank { missing, .. },
            } => assert_eq!(missing, ["MC1-0005", "MC1-0006"]),
            other => panic!("unexpected outcome {other:?}"),
        }
        let session = ctl.session().unwrap();
        assert_eq!(session.len(), 4);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.answered_count(), 0);
        assert_eq!(ctl.store().pending(Category::A, PracticeOrder::Asc).unwrap().total, 4);
    }

    #[test]
    fn answer_letter_follows_displayed_order() {
        let mut ctl = controller();
        ctl.start_practice(&bank(Category::B, 2), PracticeOrder::Asc, PracticeFilter::None, Instant::now())
            .unwrap();
        let letter = ctl.session().unwrap().layouts[0].letter_for("C").unwrap();
        ctl.answer_letter(letter.to_ascii_lowercase()).unwrap();
        assert_eq!(
            ctl.session().unwrap().answer(0),
            Some(&Answer::Single("C".to_string()))
        );
        assert!(ctl.answer_letter('Q').is_err());
    }

    #[test]
    fn favorites_and_wrong_removal_are_practice_only() {
        let bank = bank(Category::A, 3);
        let mut ctl = controller();
        ctl.start_exam(&bank, Instant::now()).unwrap();
        assert!(matches!(ctl.toggle_favorite(), Err(SessionError::WrongMode { .. })));
        assert!(matches!(
            ctl.submit(Instant::now()).map(|_| ()),
            Ok(())
        ));

        ctl.start_practice(&bank, PracticeOrder::Asc, PracticeFilter::None, Instant::now())
            .unwrap();
        assert!(matches!(ctl.submit(Instant::now()), Err(SessionError::WrongMode { .. })));
        assert!(ctl.toggle_favorite().unwrap());
        assert!(ctl.is_favorite());
        assert!(!ctl.toggle_favorite().unwrap());
        assert!(!ctl.is_favorite());

        ctl.record_answer(0, "D").unwrap();
        assert!(ctl.remove_current_from_wrong().unwrap());
        assert!(!ctl.remove_current_from_wrong().unwrap());
    }
}
