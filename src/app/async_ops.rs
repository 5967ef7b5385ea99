//! Background fetch worker
//!
//! The TUI loop is synchronous. Fetch jobs go to the worker over a channel,
//! each runs as its own task, and results come back over a second channel
//! that the loop drains every frame.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::FetchPage;
use crate::engine::{FetchDone, FetchJob};

/// Commands sent from the TUI to the worker
#[derive(Debug, Clone)]
pub enum AsyncCommand {
    /// Run a page fetch
    Fetch(FetchJob),
    /// Stop accepting jobs
    Shutdown,
}

/// Results sent back from the worker
#[derive(Debug)]
pub enum AsyncResult {
    /// A fetch finished, successfully or not
    Fetched(FetchDone),
}

/// Channel handles for talking to the worker
pub struct AsyncHandle {
    /// Send commands to the worker
    pub cmd_tx: mpsc::Sender<AsyncCommand>,
    /// Receive results from the worker
    pub result_rx: mpsc::Receiver<AsyncResult>,
}

impl AsyncHandle {
    /// Hand jobs to the worker from the synchronous loop
    pub fn dispatch(&self, jobs: Vec<FetchJob>) {
        for job in jobs {
            if let Err(e) = self.cmd_tx.blocking_send(AsyncCommand::Fetch(job)) {
                tracing::error!("Fetch worker is gone: {}", e);
            }
        }
    }
}

/// Spawn the worker on the current runtime
pub fn spawn_worker<F: FetchPage>(client: F) -> AsyncHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<AsyncCommand>(32);
    let (result_tx, result_rx) = mpsc::channel::<AsyncResult>(32);
    let client = Arc::new(client);

    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                AsyncCommand::Shutdown => break,
                AsyncCommand::Fetch(job) => {
                    let client = Arc::clone(&client);
                    let result_tx = result_tx.clone();
                    tokio::spawn(async move {
                        let done = run_job(client.as_ref(), job).await;
                        let _ = result_tx.send(AsyncResult::Fetched(done)).await;
                    });
                }
            }
        }
        tracing::debug!("Fetch worker stopped");
    });

    AsyncHandle { cmd_tx, result_rx }
}

async fn run_job<F: FetchPage>(client: &F, job: FetchJob) -> FetchDone {
    let result = client.fetch_page(&job.identity, &job.request).await;
    if let Err(e) = &result {
        tracing::debug!("Fetch {} for {} failed: {}", job.ticket.0, job.identity, e);
    }
    FetchDone {
        ticket: job.ticket,
        identity: job.identity,
        request: job.request,
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FetchError, Page};
    use crate::engine::Ticket;
    use crate::models::{Item, PageRequest, TimelineIdentity};

    struct FakeClient;

    impl FetchPage for FakeClient {
        async fn fetch_page(
            &self,
            identity: &TimelineIdentity,
            _request: &PageRequest,
        ) -> Result<Page, FetchError> {
            match identity {
                TimelineIdentity::Home => Ok(Page::new(vec![Item::new("1", "a@b")], None, None)),
                _ => Err(FetchError::Auth("no".to_string())),
            }
        }
    }

    fn job(ticket: u64, identity: TimelineIdentity) -> FetchJob {
        FetchJob {
            ticket: Ticket(ticket),
            identity,
            request: PageRequest::latest(),
        }
    }

    #[tokio::test]
    async fn test_worker_returns_every_result() {
        let mut handle = spawn_worker(FakeClient);
        for (ticket, identity) in [(1, TimelineIdentity::Home), (2, TimelineIdentity::Local)] {
            tokio_test::assert_ok!(
                handle
                    .cmd_tx
                    .send(AsyncCommand::Fetch(job(ticket, identity)))
                    .await
            );
        }

        let mut results = Vec::new();
        for _ in 0..2 {
            let AsyncResult::Fetched(done) = handle.result_rx.recv().await.unwrap();
            results.push(done);
        }
        results.sort_by_key(|d| d.ticket);

        assert_eq!(results[0].result.as_ref().unwrap().items.len(), 1);
        assert!(matches!(results[1].result, Err(FetchError::Auth(_))));
        assert_eq!(results[1].identity, TimelineIdentity::Local);

        tokio_test::assert_ok!(handle.cmd_tx.send(AsyncCommand::Shutdown).await);
    }
}
