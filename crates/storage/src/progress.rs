use chrono::Duration;
use tracing::debug;

use quiz_core::model::{SessionId, TestSession, TestType, UserAnswer};

use crate::cache::CacheService;

/// Namespace holding in-progress session records.
pub const PROGRESS_NAMESPACE: &str = "test-progress";

/// Soft TTL for a progress record; frequent re-saves keep active sessions
/// alive past it.
const PROGRESS_TTL_HOURS: i64 = 24;

/// Coarse retention: records untouched for this long are cleaned up even if
/// re-saves kept refreshing the per-entry TTL.
const CLEANUP_AFTER_DAYS: i64 = 7;

/// Persists and recovers partial [`TestSession`] state through the cache
/// service.
///
/// The store holds a serialized copy of the session, not a live reference;
/// the session manager remains the exclusive owner of the active value.
#[derive(Clone)]
pub struct ProgressStore {
    cache: CacheService,
}

impl ProgressStore {
    #[must_use]
    pub fn new(cache: CacheService) -> Self {
        Self { cache }
    }

    fn record_key(test_type: TestType, session_id: &SessionId) -> String {
        format!("{}:{session_id}", test_type.slug())
    }

    /// Upserts the session with a refreshed `last_update_time`.
    ///
    /// Returns `false` when the cache write failed (absorbed, never thrown).
    pub fn save_progress(&self, session: &mut TestSession) -> bool {
        session.touch(self.cache.clock().now());
        let key = Self::record_key(session.test_type(), session.id());
        self.cache.set(
            &key,
            session,
            Duration::hours(PROGRESS_TTL_HOURS),
            Some(PROGRESS_NAMESPACE),
        )
    }

    #[must_use]
    pub fn load_progress(
        &self,
        test_type: TestType,
        session_id: &SessionId,
    ) -> Option<TestSession> {
        self.cache.get(
            &Self::record_key(test_type, session_id),
            Some(PROGRESS_NAMESPACE),
        )
    }

    /// Removes one record; `false` if it did not exist.
    pub fn delete_progress(&self, test_type: TestType, session_id: &SessionId) -> bool {
        self.cache.delete(
            &Self::record_key(test_type, session_id),
            Some(PROGRESS_NAMESPACE),
        )
    }

    /// Appends an answer to a persisted record and advances its question
    /// index.
    ///
    /// Returns `false` when no record exists for the session.
    pub fn add_answer(
        &self,
        test_type: TestType,
        session_id: &SessionId,
        answer: UserAnswer,
    ) -> bool {
        let Some(mut session) = self.load_progress(test_type, session_id) else {
            return false;
        };
        let replaced = session.upsert_answer(answer);
        if !replaced {
            session.advance();
        }
        self.save_progress(&mut session)
    }

    /// Every live progress record, newest first.
    ///
    /// Used to surface "resume unfinished test" prompts.
    #[must_use]
    pub fn get_all_progress(&self) -> Vec<TestSession> {
        let keys = self
            .cache
            .try_keys_in_namespace(PROGRESS_NAMESPACE)
            .unwrap_or_default();
        let prefix = format!("{PROGRESS_NAMESPACE}:");
        let mut sessions: Vec<TestSession> = keys
            .iter()
            .filter_map(|full_key| {
                let key = full_key.strip_prefix(&prefix)?;
                self.cache.get(key, Some(PROGRESS_NAMESPACE))
            })
            .collect();
        sessions.sort_by(|a, b| b.last_update_time().cmp(&a.last_update_time()));
        sessions
    }

    /// Most recent non-completed record for the given test type, if any.
    #[must_use]
    pub fn find_resumable(&self, test_type: TestType) -> Option<TestSession> {
        self.get_all_progress()
            .into_iter()
            .find(|s| s.test_type() == test_type && s.is_resumable())
    }

    /// Removes every record for the given test type; returns how many.
    pub fn clear_test_type(&self, test_type: TestType) -> usize {
        let mut removed = 0;
        for session in self.get_all_progress() {
            if session.test_type() == test_type
                && self.delete_progress(test_type, session.id())
            {
                removed += 1;
            }
        }
        removed
    }

    /// Deletes records whose `last_update_time` is older than 7 days.
    ///
    /// Returns the number deleted.
    pub fn cleanup_expired_progress(&self) -> usize {
        let cutoff = self.cache.clock().now() - Duration::days(CLEANUP_AFTER_DAYS);
        let mut removed = 0;
        for session in self.get_all_progress() {
            if session.last_update_time() < cutoff
                && self.delete_progress(session.test_type(), session.id())
            {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, "cleaned up stale progress records");
        }
        removed
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use quiz_core::Clock;
    use quiz_core::model::{AnswerValue, QuestionId};
    use quiz_core::time::{fixed_clock, fixed_now};
    use std::sync::Arc;

    fn store_with_clock(clock: Clock) -> ProgressStore {
        store_over(&MemoryBackend::new(), clock)
    }

    fn store_over(backend: &MemoryBackend, clock: Clock) -> ProgressStore {
        ProgressStore::new(CacheService::new(Arc::new(backend.clone()), clock))
    }

    fn answer(id: &str, value: u8) -> UserAnswer {
        UserAnswer::new(
            QuestionId::new(id),
            AnswerValue::likert(value).unwrap(),
            fixed_now(),
        )
    }

    #[test]
    fn save_load_delete_round_trip() {
        let store = store_with_clock(fixed_clock());
        let mut session = TestSession::start(TestType::Disc, 4, fixed_now());
        for i in 0..3 {
            session.upsert_answer(answer(&format!("q{i}"), 3));
            session.advance();
        }

        assert!(store.save_progress(&mut session));

        let loaded = store
            .load_progress(TestType::Disc, session.id())
            .expect("record saved");
        assert_eq!(loaded.current_question_index(), 3);
        assert_eq!(loaded.answers().len(), 3);
        assert!(!loaded.is_completed());

        let all = store.get_all_progress();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id(), session.id());

        assert!(store.delete_progress(TestType::Disc, session.id()));
        assert!(store.get_all_progress().is_empty());
    }

    #[test]
    fn add_answer_requires_existing_record() {
        let store = store_with_clock(fixed_clock());
        let mut session = TestSession::start(TestType::Holland, 6, fixed_now());

        assert!(!store.add_answer(TestType::Holland, session.id(), answer("q0", 4)));

        store.save_progress(&mut session);
        assert!(store.add_answer(TestType::Holland, session.id(), answer("q0", 4)));

        let loaded = store
            .load_progress(TestType::Holland, session.id())
            .unwrap();
        assert_eq!(loaded.answers().len(), 1);
        assert_eq!(loaded.current_question_index(), 1);
    }

    #[test]
    fn resubmitted_answer_does_not_advance_twice() {
        let store = store_with_clock(fixed_clock());
        let mut session = TestSession::start(TestType::Holland, 6, fixed_now());
        store.save_progress(&mut session);

        store.add_answer(TestType::Holland, session.id(), answer("q0", 2));
        store.add_answer(TestType::Holland, session.id(), answer("q0", 5));

        let loaded = store
            .load_progress(TestType::Holland, session.id())
            .unwrap();
        assert_eq!(loaded.answers().len(), 1);
        assert_eq!(loaded.current_question_index(), 1);
        assert_eq!(loaded.answers()[0].value.as_likert(), Some(5));
    }

    #[test]
    fn listing_sorts_newest_first() {
        let backend = MemoryBackend::new();
        let mut clock = fixed_clock();

        let mut older = TestSession::start(TestType::Disc, 4, clock.now());
        store_over(&backend, clock).save_progress(&mut older);

        clock.advance(Duration::minutes(5));
        let mut newer = TestSession::start(TestType::Holland, 6, clock.now());
        store_over(&backend, clock).save_progress(&mut newer);

        let all = store_over(&backend, clock).get_all_progress();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id(), newer.id());
        assert_eq!(all[1].id(), older.id());
    }

    #[test]
    fn find_resumable_skips_completed_and_other_types() {
        let backend = MemoryBackend::new();
        let clock = fixed_clock();
        let store = store_over(&backend, clock);

        let mut done = TestSession::start(TestType::Disc, 1, clock.now());
        done.begin_finalizing().unwrap();
        done.complete(clock.now()).unwrap();
        store.save_progress(&mut done);

        let mut other = TestSession::start(TestType::Holland, 6, clock.now());
        store.save_progress(&mut other);

        assert!(store.find_resumable(TestType::Disc).is_none());
        let found = store.find_resumable(TestType::Holland).unwrap();
        assert_eq!(found.id(), other.id());
    }

    #[test]
    fn starting_other_types_does_not_disturb_persisted_progress() {
        let backend = MemoryBackend::new();
        let clock = fixed_clock();
        let store = store_over(&backend, clock);

        let mut disc = TestSession::start(TestType::Disc, 4, clock.now());
        let mut holland = TestSession::start(TestType::Holland, 6, clock.now());
        store.save_progress(&mut disc);
        store.save_progress(&mut holland);

        assert_eq!(store.clear_test_type(TestType::Disc), 1);
        assert!(store.load_progress(TestType::Disc, disc.id()).is_none());
        assert!(
            store
                .load_progress(TestType::Holland, holland.id())
                .is_some()
        );
    }

    #[test]
    fn cleanup_removes_week_old_records_still_inside_their_ttl() {
        let backend = MemoryBackend::new();
        let mut old_clock = fixed_clock();
        let cache = CacheService::new(Arc::new(backend.clone()), old_clock);

        // A record whose envelope TTL was refreshed generously but whose
        // last_update_time lags more than 7 days behind.
        let stale = TestSession::start(TestType::Disc, 4, old_clock.now());
        let key = format!("{}:{}", TestType::Disc.slug(), stale.id());
        assert!(cache.set(&key, &stale, Duration::days(30), Some(PROGRESS_NAMESPACE)));

        old_clock.advance(Duration::days(8));
        let store = store_over(&backend, old_clock);
        assert_eq!(store.get_all_progress().len(), 1);
        assert_eq!(store.cleanup_expired_progress(), 1);
        assert!(store.get_all_progress().is_empty());
    }

    #[test]
    fn cleanup_keeps_fresh_records() {
        let backend = MemoryBackend::new();
        let clock = fixed_clock();
        let store = store_over(&backend, clock);

        let mut fresh = TestSession::start(TestType::Disc, 4, clock.now());
        store.save_progress(&mut fresh);

        assert_eq!(store.cleanup_expired_progress(), 0);
        assert_eq!(store.get_all_progress().len(), 1);
    }
}
