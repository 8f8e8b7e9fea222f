use crate::{
    api::{ApiError, CurriculumClient},
    curriculum::{FilterOption, LearningOutcome},
    questions::GenerateRequest,
    selection::{FetchTarget, FetchTicket},
    test_paper::{TestCatalog, TestPaper, TestPaperRequest},
};
use serde_json::Value;
use std::{
    future::Future,
    sync::mpsc::{self, Receiver, Sender, TryRecvError},
    thread,
};
use tokio::runtime::Runtime;
use tracing::{debug, warn};

/// Requests the UI hands to the background.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum WorkerJob {
    Health,
    Fetch(FetchTicket),
    Generate(GenerateRequest),
    /// Load the test paper catalog under the given generation.
    TestCatalog(u64),
    GenerateTest(TestPaperRequest),
}

/// Results reported back to the UI loop.
#[derive(Debug)]
pub(crate) enum WorkerMessage {
    Health(Result<String, ApiError>),
    Options(FetchTicket, Result<Vec<FilterOption>, ApiError>),
    Outcomes(FetchTicket, Result<Vec<LearningOutcome>, ApiError>),
    Generated(Result<Vec<Value>, ApiError>),
    TestCatalog(u64, Result<TestCatalog, ApiError>),
    TestGenerated(Result<TestPaper, ApiError>),
}

/// Runs each job on its own thread and Tokio runtime; results come back
/// over a channel the UI drains between frames.
#[derive(Debug)]
pub(crate) struct WorkerHandle {
    client: Option<CurriculumClient>,
    sender: Sender<WorkerMessage>,
    receiver: Receiver<WorkerMessage>,
    held: Vec<WorkerJob>,
}

impl WorkerHandle {
    pub(crate) fn new(client: CurriculumClient) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            client: Some(client),
            sender,
            receiver,
            held: Vec::new(),
        }
    }

    /// A handle that keeps submitted jobs instead of running them.
    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            client: None,
            sender,
            receiver,
            held: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn take_held(&mut self) -> Vec<WorkerJob> {
        std::mem::take(&mut self.held)
    }

    pub(crate) fn set_client(&mut self, client: CurriculumClient) {
        if self.client.is_some() {
            self.client = Some(client);
        }
    }

    pub(crate) fn submit(&mut self, job: WorkerJob) {
        let Some(client) = self.client.clone() else {
            debug!("worker: holding {job:?}");
            self.held.push(job);
            return;
        };
        let sender = self.sender.clone();
        match job {
            WorkerJob::Health => {
                spawn_request("health check", sender, WorkerMessage::Health, async move {
                    client.health().await
                });
            }
            WorkerJob::Fetch(ticket) => spawn_fetch(client, ticket, sender),
            WorkerJob::Generate(request) => {
                spawn_request(
                    "question generation",
                    sender,
                    WorkerMessage::Generated,
                    async move { client.generate_questions(&request).await },
                );
            }
            WorkerJob::TestCatalog(generation) => {
                spawn_request(
                    "test paper catalog",
                    sender,
                    move |result| WorkerMessage::TestCatalog(generation, result),
                    async move { client.fetch_test_catalog().await },
                );
            }
            WorkerJob::GenerateTest(request) => {
                spawn_request(
                    "test paper generation",
                    sender,
                    WorkerMessage::TestGenerated,
                    async move { client.generate_test(&request).await },
                );
            }
        }
    }

    /// Next finished result, if any.
    pub(crate) fn try_recv(&self) -> Option<WorkerMessage> {
        match self.receiver.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) => None,
            // The handle owns a sender, so the channel cannot disconnect.
            Err(TryRecvError::Disconnected) => None,
        }
    }
}

fn spawn_fetch(client: CurriculumClient, ticket: FetchTicket, sender: Sender<WorkerMessage>) {
    match ticket.target.clone() {
        FetchTarget::LearningOutcomes { substrand_id } => spawn_request(
            "learning outcome lookup",
            sender,
            move |result| WorkerMessage::Outcomes(ticket, result),
            async move { client.fetch_learning_outcomes(&substrand_id).await },
        ),
        target => spawn_request(
            "option lookup",
            sender,
            move |result| WorkerMessage::Options(ticket, result),
            async move { client.fetch_options(&target).await },
        ),
    }
}

fn spawn_request<T, F, W>(label: &'static str, sender: Sender<WorkerMessage>, wrap: W, request: F)
where
    T: Send + 'static,
    F: Future<Output = Result<T, ApiError>> + Send + 'static,
    W: FnOnce(Result<T, ApiError>) -> WorkerMessage + Send + 'static,
{
    thread::spawn(move || {
        debug!("worker: {label} started");
        let result = match Runtime::new() {
            Ok(runtime) => runtime.block_on(request),
            Err(err) => Err(ApiError::Runtime(err)),
        };
        if sender.send(wrap(result)).is_err() {
            warn!("worker: UI went away before {label} finished");
        }
    });
}
