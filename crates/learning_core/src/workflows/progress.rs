//! Lesson progress: read-or-default and composite-key lesson upsert.

use std::sync::Arc;

use tracing::{info, instrument};

use super::{WorkflowError, WorkflowResult};
use crate::domain::{LessonSubmission, Progress, ProgressView};
use crate::entities::{DocumentAdapter, ProgressDraft, ProgressFilter, ReadOptions};
use crate::ports::{Clock, WriteOutcome};

#[derive(Clone)]
pub struct ProgressWorkflow {
    progress: DocumentAdapter<Progress>,
    clock: Arc<dyn Clock>,
}

impl ProgressWorkflow {
    pub fn new(progress: DocumentAdapter<Progress>, clock: Arc<dyn Clock>) -> Self {
        Self { progress, clock }
    }

    /// Returns the learner's progress, or the empty shape when there is none.
    /// Never writes.
    pub async fn get_progress(&self, user_id: &str) -> WorkflowResult<ProgressView> {
        let found = self
            .progress
            .find_one(&ProgressFilter::Owner(user_id.to_string()), ReadOptions::default())
            .await?;
        Ok(found.map_or_else(ProgressView::empty, ProgressView::Stored))
    }

    /// Records one lesson attempt, creating the progress document on first use.
    ///
    /// The read-modify-write is not guarded against a concurrent submission for the
    /// same learner: the last save wins.
    #[instrument(
        skip(self, submission),
        fields(module_key = %submission.module_key, lesson_id = %submission.lesson_id)
    )]
    pub async fn submit_lesson(
        &self,
        user_id: &str,
        submission: LessonSubmission,
    ) -> WorkflowResult<Progress> {
        let filter = ProgressFilter::Owner(user_id.to_string());
        let mut progress = match self.progress.find_one(&filter, ReadOptions::default()).await? {
            Some(progress) => progress,
            None => match self.progress.create(ProgressDraft::for_owner(user_id)).await? {
                WriteOutcome::Written(progress) => {
                    info!(progress_id = %progress.id, "Progress document created");
                    progress
                }
                WriteOutcome::AlreadyExists => self
                    .progress
                    .find_one(&filter, ReadOptions::default())
                    .await?
                    .ok_or_else(|| {
                        WorkflowError::Server("progress missing after duplicate insert".to_string())
                    })?,
            },
        };

        let attempts = progress.record_attempt(submission, self.clock.now()).attempts;
        let saved = self.progress.save(&progress).await?;
        info!(attempts, "Lesson attempt recorded");
        Ok(saved)
    }
}
