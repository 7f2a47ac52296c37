//! Bounded fan-out/fan-in for the blocking work of one pipeline phase.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::diagnostic::CodegenError;

/// Runs blocking jobs with at most `workers` in flight.
///
/// The first error is kept and later ones are discarded. Once an error is
/// recorded, queued jobs are skipped; jobs already running finish normally.
pub struct TaskPool {
    semaphore: Arc<Semaphore>,
    tasks: JoinSet<()>,
    first_error: Arc<Mutex<Option<CodegenError>>>,
}

impl TaskPool {
    pub fn new(workers: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
            tasks: JoinSet::new(),
            first_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Queues a job. It runs on tokio's blocking pool once a permit is free.
    pub fn spawn<F>(&mut self, job: F)
    where
        F: FnOnce() -> Result<(), CodegenError> + Send + 'static,
    {
        let semaphore = Arc::clone(&self.semaphore);
        let first_error = Arc::clone(&self.first_error);

        self.tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            if first_error.lock().is_some() {
                return;
            }

            let result = match tokio::task::spawn_blocking(job).await {
                Ok(result) => result,
                Err(e) => Err(CodegenError::Task {
                    message: e.to_string(),
                }),
            };
            if let Err(err) = result {
                record(&first_error, err);
            }
        });
    }

    /// Waits for every queued job; returns the first error, if any.
    pub async fn join(mut self) -> Result<(), CodegenError> {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                record(
                    &self.first_error,
                    CodegenError::Task {
                        message: e.to_string(),
                    },
                );
            }
        }
        match self.first_error.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn record(slot: &Mutex<Option<CodegenError>>, err: CodegenError) {
    let mut slot = slot.lock();
    if slot.is_none() {
        *slot = Some(err);
    }
}
