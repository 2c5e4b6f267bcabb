use std::path::Path;
use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::TestType;
use storage::{CacheService, FileBackend, MemoryBackend, ProgressStore, StorageBackend};

use crate::narrative::ResultAssembler;
use crate::question_source::{CachedQuestionSource, QuestionSource};
use crate::session_manager::SessionManager;

/// Wires the whole subsystem together: one storage backend shared by the
/// cache, progress store, and question cache, plus the session manager on
/// top.
///
/// Construct once per user context and hand out `manager_mut()` to the
/// surface that drives the assessment.
pub struct QuizServices {
    cache: CacheService,
    progress: ProgressStore,
    question_cache: Arc<CachedQuestionSource>,
    manager: SessionManager,
}

impl QuizServices {
    /// Ephemeral wiring: everything lives in memory. Suited to tests and
    /// one-shot sessions.
    #[must_use]
    pub fn in_memory(source: Arc<dyn QuestionSource>, clock: Clock) -> Self {
        Self::over_backend(Arc::new(MemoryBackend::new()), source, clock)
    }

    /// Durable wiring over a JSON store on disk, so paused sessions survive
    /// restarts.
    #[must_use]
    pub fn file_backed(path: impl AsRef<Path>, source: Arc<dyn QuestionSource>) -> Self {
        Self::over_backend(
            Arc::new(FileBackend::new(path.as_ref())),
            source,
            Clock::default(),
        )
    }

    fn over_backend(
        backend: Arc<dyn StorageBackend>,
        source: Arc<dyn QuestionSource>,
        clock: Clock,
    ) -> Self {
        let cache = CacheService::new(backend, clock);
        let question_cache = Arc::new(CachedQuestionSource::new(source, cache.clone()));
        let progress = ProgressStore::new(cache.clone());
        let manager = SessionManager::new(
            clock,
            question_cache.clone(),
            progress.clone(),
            ResultAssembler::from_env(),
        );
        Self {
            cache,
            progress,
            question_cache,
            manager,
        }
    }

    #[must_use]
    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut SessionManager {
        &mut self.manager
    }

    #[must_use]
    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    /// Drops the cached question set for one instrument.
    pub fn invalidate_questions(&self, test_type: TestType) -> bool {
        self.question_cache.invalidate(test_type)
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    /// Removes progress records untouched for over a week. Run on startup
    /// or on a coarse timer.
    pub fn cleanup_expired_progress(&self) -> usize {
        self.progress.cleanup_expired_progress()
    }
}
