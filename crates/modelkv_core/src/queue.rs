//! The per-collection operation queue.
//!
//! Every save, load and destroy is pushed onto an unbounded FIFO channel at
//! call time and executed by a single worker task. Completions therefore
//! resolve in submission order no matter how the backend schedules its own
//! I/O, and at most one storage interaction per collection is in flight.

use crate::error::{CoreError, CoreResult};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

/// Executes queued operations against the backend.
#[async_trait]
pub(crate) trait Executor<E>: Send + Sync + 'static {
    async fn save(&self, entity: E) -> CoreResult<E>;
    async fn load(&self, id: &str) -> CoreResult<Option<E>>;
    async fn destroy(&self, id: &str) -> CoreResult<()>;
}

pub(crate) enum Operation<E> {
    Save {
        entity: E,
        reply: oneshot::Sender<CoreResult<E>>,
    },
    Load {
        id: String,
        reply: oneshot::Sender<CoreResult<Option<E>>>,
    },
    Destroy {
        id: String,
        reply: oneshot::Sender<CoreResult<()>>,
    },
}

impl<E> Operation<E> {
    fn kind(&self) -> &'static str {
        match self {
            Self::Save { .. } => "save",
            Self::Load { .. } => "load",
            Self::Destroy { .. } => "destroy",
        }
    }
}

#[derive(Debug, Default)]
struct QueueState {
    pending: AtomicUsize,
    busy: AtomicBool,
}

impl QueueState {
    fn finish(&self) {
        self.busy.store(false, Ordering::SeqCst);
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Handle to a running worker. Dropping every clone stops the worker once
/// it has drained what was already queued.
pub(crate) struct OperationQueue<E> {
    sender: mpsc::UnboundedSender<Operation<E>>,
    state: Arc<QueueState>,
    stopped: watch::Receiver<bool>,
}

impl<E> Clone for OperationQueue<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            state: Arc::clone(&self.state),
            stopped: self.stopped.clone(),
        }
    }
}

impl<E: Send + 'static> OperationQueue<E> {
    /// Spawns the worker on the current tokio runtime.
    pub(crate) fn spawn<X: Executor<E>>(
        name: String,
        executor: Arc<X>,
        runtime: &tokio::runtime::Handle,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let state = Arc::new(QueueState::default());
        let (stop_signal, stopped) = watch::channel(false);
        runtime.spawn(run(name, receiver, executor, Arc::clone(&state), stop_signal));
        Self {
            sender,
            state,
            stopped,
        }
    }

    /// Drops this handle and waits for the worker to drain and exit.
    ///
    /// Only returns once every other handle is gone too.
    pub(crate) async fn close(self) {
        let Self {
            sender,
            mut stopped,
            ..
        } = self;
        drop(sender);
        // An error means the worker already exited and dropped the signal.
        let _ = stopped.wait_for(|stopped| *stopped).await;
    }

    pub(crate) fn save(&self, entity: E) -> Completion<E> {
        let (reply, completion) = Completion::channel();
        self.submit(Operation::Save { entity, reply });
        completion
    }

    pub(crate) fn load(&self, id: String) -> Completion<Option<E>> {
        let (reply, completion) = Completion::channel();
        self.submit(Operation::Load { id, reply });
        completion
    }

    pub(crate) fn destroy(&self, id: String) -> Completion<()> {
        let (reply, completion) = Completion::channel();
        self.submit(Operation::Destroy { id, reply });
        completion
    }

    /// Queued plus running operations.
    pub(crate) fn pending(&self) -> usize {
        self.state.pending.load(Ordering::SeqCst)
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.state.busy.load(Ordering::SeqCst)
    }

    fn submit(&self, operation: Operation<E>) {
        self.state.pending.fetch_add(1, Ordering::SeqCst);
        // On failure the operation, and with it the reply sender, is
        // dropped; its completion then resolves to `QueueClosed`.
        if self.sender.send(operation).is_err() {
            self.state.pending.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

async fn run<E, X>(
    name: String,
    mut receiver: mpsc::UnboundedReceiver<Operation<E>>,
    executor: Arc<X>,
    state: Arc<QueueState>,
    stop_signal: watch::Sender<bool>,
) where
    E: Send + 'static,
    X: Executor<E>,
{
    debug!(collection = %name, "operation queue started");

    while let Some(operation) = receiver.recv().await {
        state.busy.store(true, Ordering::SeqCst);
        debug!(collection = %name, op = operation.kind(), "running queued operation");

        // A dropped completion is not an error; the operation still ran.
        match operation {
            Operation::Save { entity, reply } => {
                let result = executor.save(entity).await;
                state.finish();
                let _ = reply.send(result);
            }
            Operation::Load { id, reply } => {
                let result = executor.load(&id).await;
                state.finish();
                let _ = reply.send(result);
            }
            Operation::Destroy { id, reply } => {
                let result = executor.destroy(&id).await;
                state.finish();
                let _ = reply.send(result);
            }
        }

        tokio::task::yield_now().await;
    }

    drop(executor);
    let _ = stop_signal.send(true);
    debug!(collection = %name, "operation queue stopped");
}

/// The eventual result of a queued operation.
///
/// The operation is enqueued when the collection method is called, not when
/// this future is first polled. Dropping it does not cancel the operation.
#[must_use = "the operation runs regardless, but its result is lost unless awaited"]
#[derive(Debug)]
pub struct Completion<T> {
    receiver: oneshot::Receiver<CoreResult<T>>,
}

impl<T> Completion<T> {
    fn channel() -> (oneshot::Sender<CoreResult<T>>, Self) {
        let (sender, receiver) = oneshot::channel();
        (sender, Self { receiver })
    }
}

impl<T> Future for Completion<T> {
    type Output = CoreResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let receiver = &mut self.get_mut().receiver;
        match ready!(Pin::new(receiver).poll(cx)) {
            Ok(result) => Poll::Ready(result),
            Err(_) => Poll::Ready(Err(CoreError::QueueClosed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;

    /// Records call order and sleeps longest on the earliest calls, so any
    /// concurrency would reorder the log.
    #[derive(Default)]
    struct Recorder {
        log: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl Recorder {
        async fn step(&self, entry: String) {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = 20u64.saturating_sub(n as u64 * 5);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.log.lock().push(entry);
        }
    }

    #[async_trait]
    impl Executor<u32> for Recorder {
        async fn save(&self, entity: u32) -> CoreResult<u32> {
            self.step(format!("save {entity}")).await;
            if entity == 0 {
                return Err(CoreError::invalid_config("zero"));
            }
            Ok(entity)
        }

        async fn load(&self, id: &str) -> CoreResult<Option<u32>> {
            self.step(format!("load {id}")).await;
            Ok(id.parse().ok())
        }

        async fn destroy(&self, id: &str) -> CoreResult<()> {
            self.step(format!("destroy {id}")).await;
            Ok(())
        }
    }

    fn spawn(recorder: &Arc<Recorder>) -> OperationQueue<u32> {
        OperationQueue::spawn(
            "test".into(),
            Arc::clone(recorder),
            &tokio::runtime::Handle::current(),
        )
    }

    #[tokio::test]
    async fn operations_run_in_submission_order() {
        let recorder = Arc::new(Recorder::default());
        let queue = spawn(&recorder);

        let a = queue.save(1);
        let b = queue.load("1".into());
        let c = queue.destroy("1".into());
        let d = queue.load("x".into());

        assert_eq!(d.await.unwrap(), None);
        c.await.unwrap();
        assert_eq!(b.await.unwrap(), Some(1));
        assert_eq!(a.await.unwrap(), 1);
        assert_eq!(
            *recorder.log.lock(),
            vec!["save 1", "load 1", "destroy 1", "load x"]
        );
    }

    #[tokio::test]
    async fn failure_does_not_stall_the_queue() {
        let recorder = Arc::new(Recorder::default());
        let queue = spawn(&recorder);

        let failed = queue.save(0);
        let next = queue.save(2);
        assert!(failed.await.is_err());
        assert_eq!(next.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn pending_counts_down_to_zero() {
        let recorder = Arc::new(Recorder::default());
        let queue = spawn(&recorder);

        let first = queue.save(1);
        let second = queue.save(2);
        assert_eq!(queue.pending(), 2);
        first.await.unwrap();
        assert_eq!(queue.pending(), 1);
        second.await.unwrap();
        assert_eq!(queue.pending(), 0);
        assert!(!queue.is_busy());
    }

    #[tokio::test]
    async fn dropped_completion_still_runs() {
        let recorder = Arc::new(Recorder::default());
        let queue = spawn(&recorder);

        drop(queue.save(7));
        queue.load("7".into()).await.unwrap();
        assert_eq!(*recorder.log.lock(), vec!["save 7", "load 7"]);
    }

    #[tokio::test]
    async fn closed_queue_reports_queue_closed() {
        let (sender, receiver) = mpsc::unbounded_channel::<Operation<u32>>();
        drop(receiver);
        let queue = OperationQueue {
            sender,
            state: Arc::new(QueueState::default()),
            stopped: watch::channel(true).1,
        };
        assert!(matches!(queue.save(1).await, Err(CoreError::QueueClosed)));
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test]
    async fn close_waits_for_queued_work_and_releases_the_executor() {
        let recorder = Arc::new(Recorder::default());
        let queue = spawn(&recorder);

        drop(queue.save(1));
        drop(queue.save(2));
        queue.close().await;
        assert_eq!(*recorder.log.lock(), vec!["save 1", "save 2"]);
        assert_eq!(Arc::strong_count(&recorder), 1);
    }
}
