use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};
use mashup_contracts::assets::GenerationResult;
use mashup_engine::{GenerationError, GenerationJob, GenerationRequester};
use tracing::debug;

pub type Outcome = (u64, Result<GenerationResult, GenerationError>);

/// Runs generation jobs off the input loop. Jobs run one at a time, in the
/// order they were submitted.
pub struct GenerationWorker {
    job_tx: Option<Sender<GenerationJob>>,
    outcome_rx: Receiver<Outcome>,
    handle: Option<JoinHandle<()>>,
}

impl GenerationWorker {
    pub fn spawn(requester: Arc<dyn GenerationRequester>) -> Self {
        let (job_tx, job_rx) = mpsc::channel::<GenerationJob>();
        let (outcome_tx, outcome_rx) = mpsc::channel::<Outcome>();
        let handle = thread::spawn(move || {
            for job in job_rx {
                debug!(ticket = job.ticket, requester = requester.name(), "worker picked up job");
                let outcome = job.run(requester.as_ref());
                if outcome_tx.send((job.ticket, outcome)).is_err() {
                    break;
                }
            }
        });
        Self {
            job_tx: Some(job_tx),
            outcome_rx,
            handle: Some(handle),
        }
    }

    pub fn submit(&self, job: GenerationJob) -> Result<()> {
        let Some(job_tx) = self.job_tx.as_ref() else {
            return Err(anyhow!("generation worker already shut down"));
        };
        job_tx
            .send(job)
            .map_err(|_| anyhow!("generation worker stopped"))
    }

    pub fn try_next(&self) -> Option<Outcome> {
        match self.outcome_rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    pub fn wait(&self) -> Result<Outcome> {
        self.outcome_rx
            .recv()
            .map_err(|_| anyhow!("generation worker stopped"))
    }
}

impl Drop for GenerationWorker {
    fn drop(&mut self) {
        self.job_tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
