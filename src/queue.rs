//! Serialised job queue.
//!
//! Submissions land in a bounded FIFO and a single worker drains it, so at
//! most one job is ever inside the [`Pipeline`]. Jobs run to completion in
//! submission order and each submitter gets its own result back.

use crate::error::DocTitleError;
use crate::job::Job;
use crate::output::JobReport;
use crate::pipeline::Pipeline;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

type Reply = oneshot::Sender<Result<JobReport, DocTitleError>>;

struct Submission {
    job: Job,
    reply: Reply,
}

/// Handle to the queue worker.
///
/// Cheap to share behind an `Arc`; every method takes `&self` except
/// [`JobQueue::shutdown`].
pub struct JobQueue {
    tx: mpsc::Sender<Submission>,
    pending: Arc<AtomicUsize>,
    worker: JoinHandle<()>,
}

impl JobQueue {
    /// Spawn the worker on the current tokio runtime.
    pub fn start(pipeline: Arc<Pipeline>) -> Self {
        let capacity = pipeline.config().queue_capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let pending = Arc::new(AtomicUsize::new(0));

        let worker = tokio::spawn(run_worker(pipeline, rx, pending.clone()));
        info!("Job queue started (capacity {})", capacity);

        Self {
            tx,
            pending,
            worker,
        }
    }

    /// Enqueue `job` and wait for its result.
    ///
    /// Waits for channel space when the queue is full. Fails with
    /// [`DocTitleError::QueueClosed`] once the worker is gone.
    pub async fn submit(&self, job: Job) -> Result<JobReport, DocTitleError> {
        let (reply, rx) = oneshot::channel();
        debug!("Queueing job {}", job.id);

        let mut guard = PendingGuard::new(&self.pending);
        if self.tx.send(Submission { job, reply }).await.is_err() {
            return Err(DocTitleError::QueueClosed);
        }
        guard.disarm();

        rx.await.map_err(|_| DocTitleError::QueueClosed)?
    }

    /// Jobs accepted but not yet picked up by the worker.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Stop accepting jobs, let the worker finish what is queued, and wait
    /// for it to exit.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            error!("Job queue worker panicked: {}", e);
        }
        info!("Job queue stopped");
    }
}

/// Counts a submission as pending until it is handed to the channel.
///
/// Dropping it armed (send failed, or the submit future was dropped while
/// waiting for space) takes the count back.
struct PendingGuard<'a> {
    pending: &'a AtomicUsize,
    armed: bool,
}

impl<'a> PendingGuard<'a> {
    fn new(pending: &'a AtomicUsize) -> Self {
        pending.fetch_add(1, Ordering::SeqCst);
        Self {
            pending,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

async fn run_worker(
    pipeline: Arc<Pipeline>,
    mut rx: mpsc::Receiver<Submission>,
    pending: Arc<AtomicUsize>,
) {
    while let Some(Submission { job, reply }) = rx.recv().await {
        let waiting = pending.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        let job_id = job.id.clone();
        if let Some(ref cb) = pipeline.config().progress_callback {
            cb.on_job_start(&job_id, waiting);
        }

        // Its own task, so a panicking stage fails only this job.
        let p = pipeline.clone();
        let result = match tokio::spawn(async move { p.run(job).await }).await {
            Ok(result) => result,
            Err(e) => {
                error!("Job {} panicked: {}", job_id, e);
                Err(DocTitleError::Internal(format!("Job {job_id} panicked: {e}")))
            }
        };

        if reply.send(result).is_err() {
            debug!("Submitter of job {} went away", job_id);
        }
    }
    debug!("Job queue drained");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::pipeline::sniff::TypeSniffer;
    use crate::progress::JobProgressCallback;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;

    struct PanickingSniffer;

    #[async_trait]
    impl TypeSniffer for PanickingSniffer {
        async fn detect(&self, _path: &Path) -> Result<String, DocTitleError> {
            panic!("sniffer exploded");
        }
    }

    struct TextSniffer;

    #[async_trait]
    impl TypeSniffer for TextSniffer {
        async fn detect(&self, _path: &Path) -> Result<String, DocTitleError> {
            Ok("ASCII text".to_string())
        }
    }

    struct HangingSniffer;

    #[async_trait]
    impl TypeSniffer for HangingSniffer {
        async fn detect(&self, _path: &Path) -> Result<String, DocTitleError> {
            std::future::pending().await
        }
    }

    #[derive(Default)]
    struct StartLog(Mutex<Vec<(String, usize)>>);

    impl JobProgressCallback for StartLog {
        fn on_job_start(&self, job_id: &str, pending: usize) {
            self.0.lock().unwrap().push((job_id.to_string(), pending));
        }
    }

    fn queue_with(sniffer: Arc<dyn TypeSniffer>) -> JobQueue {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap().with_sniffer(sniffer);
        JobQueue::start(Arc::new(pipeline))
    }

    #[tokio::test]
    async fn submitter_receives_its_own_error() {
        let queue = queue_with(Arc::new(TextSniffer));
        let err = queue.submit(Job::new("/tmp/a.txt", "a.txt")).await.unwrap_err();
        assert!(matches!(err, DocTitleError::UnapprovedType { .. }));
        assert_eq!(queue.pending(), 0);
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn panicking_job_does_not_stop_the_worker() {
        let queue = queue_with(Arc::new(PanickingSniffer));
        let first = queue.submit(Job::new("/tmp/a.pdf", "a.pdf")).await.unwrap_err();
        assert!(matches!(first, DocTitleError::Internal(_)), "got: {first:?}");

        let second = queue.submit(Job::new("/tmp/b.pdf", "b.pdf")).await.unwrap_err();
        assert!(matches!(second, DocTitleError::Internal(_)));
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn dropped_submit_releases_its_pending_slot() {
        let config = PipelineConfig::builder().queue_capacity(1).build().unwrap();
        let pipeline = Pipeline::new(config).unwrap().with_sniffer(Arc::new(HangingSniffer));
        let queue = Arc::new(JobQueue::start(Arc::new(pipeline)));

        // The worker takes the first job and hangs on it.
        let q = queue.clone();
        tokio::spawn(async move { q.submit(Job::new("/tmp/a.pdf", "a.pdf")).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        // The second job fills the channel.
        let q = queue.clone();
        tokio::spawn(async move { q.submit(Job::new("/tmp/b.pdf", "b.pdf")).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(queue.pending(), 1);

        // The third waits for space until the timeout drops it.
        let timed_out = tokio::time::timeout(
            Duration::from_millis(50),
            queue.submit(Job::new("/tmp/c.pdf", "c.pdf")),
        )
        .await;
        assert!(timed_out.is_err());
        assert_eq!(queue.pending(), 1);
    }

    #[tokio::test]
    async fn job_start_reports_jobs_still_waiting() {
        let log = Arc::new(StartLog::default());
        let config = PipelineConfig::builder().progress_callback(log.clone()).build().unwrap();
        let pipeline = Pipeline::new(config).unwrap().with_sniffer(Arc::new(TextSniffer));
        let queue = Arc::new(JobQueue::start(Arc::new(pipeline)));

        let submits = ["a", "b", "c"].map(|id| {
            let q = queue.clone();
            let job = Job::new(format!("/tmp/{id}.txt"), format!("{id}.txt"));
            async move { q.submit(job).await }
        });
        let results = futures::future::join_all(submits).await;
        assert!(results.iter().all(|r| matches!(r, Err(DocTitleError::UnapprovedType { .. }))));

        let starts = log.0.lock().unwrap().clone();
        let ids: Vec<_> = starts.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(starts.last().map(|&(_, n)| n), Some(0));
        assert!(starts.windows(2).all(|w| w[0].1 >= w[1].1));
        assert_eq!(queue.pending(), 0);
    }
}
