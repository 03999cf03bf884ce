//! Test doubles shared by the tests in this crate.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::{
    ActionDisposable, CompletableObserver, Disposable, DisposableRef, DynError, Executor,
    MaybeObserver, ObservableObserver, Scheduler, SingleObserver, reset_uncaught_error_handler,
    set_uncaught_error_handler,
};

/// A labelled error for asserting error propagation.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub(crate) struct TestError(pub(crate) &'static str);

pub(crate) fn test_error(label: &'static str) -> DynError {
    Arc::new(TestError(label))
}

/// Records everything an observer of any cardinality sees.
///
/// `on_success` values and `on_next` values land in the same list; the
/// cardinality under test determines which callbacks can fire.
pub(crate) struct Recording<T> {
    handles: Mutex<Vec<DisposableRef>>,
    values: Mutex<Vec<T>>,
    completed: AtomicBool,
    errors: Mutex<Vec<DynError>>,
}

impl<T> Recording<T> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            handles: Mutex::new(Vec::new()),
            values: Mutex::new(Vec::new()),
            completed: AtomicBool::new(false),
            errors: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn values(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.values.lock().unwrap().clone()
    }

    pub(crate) fn value_count(&self) -> usize {
        self.values.lock().unwrap().len()
    }

    pub(crate) fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    pub(crate) fn error_count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }

    pub(crate) fn errors(&self) -> Vec<DynError> {
        self.errors.lock().unwrap().clone()
    }

    pub(crate) fn error_messages(&self) -> Vec<String> {
        self.errors
            .lock()
            .unwrap()
            .iter()
            .map(|error| error.to_string())
            .collect()
    }

    pub(crate) fn handle(&self) -> DisposableRef {
        self.handles
            .lock()
            .unwrap()
            .first()
            .cloned()
            .expect("observer has not received on_subscribe yet")
    }

    fn record_handle(&self, handle: DisposableRef) {
        self.handles.lock().unwrap().push(handle);
    }

    fn record_value(&self, value: T) {
        self.values.lock().unwrap().push(value);
    }

    fn record_complete(&self) {
        self.completed.store(true, Ordering::SeqCst);
    }

    fn record_error(&self, error: DynError) {
        self.errors.lock().unwrap().push(error);
    }
}

impl<T> ObservableObserver<T> for Recording<T>
where
    T: Send + Sync,
{
    fn on_subscribe(&self, handle: DisposableRef) {
        self.record_handle(handle);
    }

    fn on_next(&self, value: T) {
        self.record_value(value);
    }

    fn on_complete(&self) {
        self.record_complete();
    }

    fn on_error(&self, error: DynError) {
        self.record_error(error);
    }
}

impl<T> SingleObserver<T> for Recording<T>
where
    T: Send + Sync,
{
    fn on_subscribe(&self, handle: DisposableRef) {
        self.record_handle(handle);
    }

    fn on_success(&self, value: T) {
        self.record_value(value);
    }

    fn on_error(&self, error: DynError) {
        self.record_error(error);
    }
}

impl<T> MaybeObserver<T> for Recording<T>
where
    T: Send + Sync,
{
    fn on_subscribe(&self, handle: DisposableRef) {
        self.record_handle(handle);
    }

    fn on_success(&self, value: T) {
        self.record_value(value);
    }

    fn on_complete(&self) {
        self.record_complete();
    }

    fn on_error(&self, error: DynError) {
        self.record_error(error);
    }
}

impl CompletableObserver for Recording<()> {
    fn on_subscribe(&self, handle: DisposableRef) {
        self.record_handle(handle);
    }

    fn on_complete(&self) {
        self.record_complete();
    }

    fn on_error(&self, error: DynError) {
        self.record_error(error);
    }
}

/// A manually driven multi-value upstream.
pub(crate) struct TestObservable<T> {
    observers: Mutex<Vec<Arc<dyn ObservableObserver<T>>>>,
    upstream_handles: Mutex<Vec<DisposableRef>>,
}

impl<T> TestObservable<T>
where
    T: Clone + Send + 'static,
{
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            observers: Mutex::new(Vec::new()),
            upstream_handles: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn source(self: &Arc<Self>) -> crate::Observable<T> {
        let this = Arc::clone(self);
        crate::Observable::new_unsafe(move |observer| {
            let handle: DisposableRef = Arc::new(ActionDisposable::new(|| {}));
            this.upstream_handles.lock().unwrap().push(Arc::clone(&handle));
            observer.on_subscribe(handle);
            this.observers.lock().unwrap().push(observer);
        })
    }

    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.lock().unwrap().is_empty()
    }

    pub(crate) fn all_upstream_handles_disposed(&self) -> bool {
        self.upstream_handles
            .lock()
            .unwrap()
            .iter()
            .all(|handle| handle.is_disposed())
    }

    pub(crate) fn on_next(&self, value: T) {
        for observer in self.observers.lock().unwrap().iter() {
            observer.on_next(value.clone());
        }
    }

    pub(crate) fn on_complete(&self) {
        for observer in self.observers.lock().unwrap().iter() {
            observer.on_complete();
        }
    }

    pub(crate) fn on_error(&self, error: DynError) {
        for observer in self.observers.lock().unwrap().iter() {
            observer.on_error(Arc::clone(&error));
        }
    }
}

/// A manually driven single-value upstream.
pub(crate) struct TestSingle<T> {
    observers: Mutex<Vec<Arc<dyn SingleObserver<T>>>>,
    upstream_handles: Mutex<Vec<DisposableRef>>,
}

impl<T> TestSingle<T>
where
    T: Clone + Send + 'static,
{
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            observers: Mutex::new(Vec::new()),
            upstream_handles: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn source(self: &Arc<Self>) -> crate::Single<T> {
        let this = Arc::clone(self);
        crate::Single::new_unsafe(move |observer| {
            let handle: DisposableRef = Arc::new(ActionDisposable::new(|| {}));
            this.upstream_handles.lock().unwrap().push(Arc::clone(&handle));
            observer.on_subscribe(handle);
            this.observers.lock().unwrap().push(observer);
        })
    }

    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.lock().unwrap().is_empty()
    }

    pub(crate) fn on_success(&self, value: T) {
        for observer in self.observers.lock().unwrap().iter() {
            observer.on_success(value.clone());
        }
    }

    pub(crate) fn on_error(&self, error: DynError) {
        for observer in self.observers.lock().unwrap().iter() {
            observer.on_error(Arc::clone(&error));
        }
    }
}

/// A manually driven optional-value upstream.
pub(crate) struct TestMaybe<T> {
    observers: Mutex<Vec<Arc<dyn MaybeObserver<T>>>>,
}

impl<T> TestMaybe<T>
where
    T: Clone + Send + 'static,
{
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            observers: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn source(self: &Arc<Self>) -> crate::Maybe<T> {
        let this = Arc::clone(self);
        crate::Maybe::new_unsafe(move |observer| {
            observer.on_subscribe(Arc::new(ActionDisposable::new(|| {})));
            this.observers.lock().unwrap().push(observer);
        })
    }

    pub(crate) fn on_success(&self, value: T) {
        for observer in self.observers.lock().unwrap().iter() {
            observer.on_success(value.clone());
        }
    }

    pub(crate) fn on_complete(&self) {
        for observer in self.observers.lock().unwrap().iter() {
            observer.on_complete();
        }
    }

    pub(crate) fn on_error(&self, error: DynError) {
        for observer in self.observers.lock().unwrap().iter() {
            observer.on_error(Arc::clone(&error));
        }
    }
}

/// A manually driven value-less upstream.
pub(crate) struct TestCompletable {
    observers: Mutex<Vec<Arc<dyn CompletableObserver>>>,
    upstream_handles: Mutex<Vec<DisposableRef>>,
}

impl TestCompletable {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            observers: Mutex::new(Vec::new()),
            upstream_handles: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn source(self: &Arc<Self>) -> crate::Completable {
        let this = Arc::clone(self);
        crate::Completable::new_unsafe(move |observer| {
            let handle: DisposableRef = Arc::new(ActionDisposable::new(|| {}));
            this.upstream_handles.lock().unwrap().push(Arc::clone(&handle));
            observer.on_subscribe(handle);
            this.observers.lock().unwrap().push(observer);
        })
    }

    pub(crate) fn all_upstream_handles_disposed(&self) -> bool {
        self.upstream_handles
            .lock()
            .unwrap()
            .iter()
            .all(|handle| handle.is_disposed())
    }

    pub(crate) fn on_complete(&self) {
        for observer in self.observers.lock().unwrap().iter() {
            observer.on_complete();
        }
    }

    pub(crate) fn on_error(&self, error: DynError) {
        for observer in self.observers.lock().unwrap().iter() {
            observer.on_error(Arc::clone(&error));
        }
    }
}

/// Serializes tests that install a process-wide uncaught-error handler.
static HOOK_LOCK: Mutex<()> = Mutex::new(());

pub(crate) fn hook_lock() -> MutexGuard<'static, ()> {
    HOOK_LOCK
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Captures everything reported to the uncaught-error sink while alive,
/// restoring the default sink on drop.
///
/// Tests using this serialize on a shared lock so captures from parallel
/// tests cannot interleave.
pub(crate) struct UncaughtErrorCapture {
    errors: Arc<Mutex<Vec<DynError>>>,
    _lock: MutexGuard<'static, ()>,
}

impl UncaughtErrorCapture {
    pub(crate) fn install() -> Self {
        let lock = hook_lock();

        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        set_uncaught_error_handler(move |error| {
            sink.lock().unwrap().push(Arc::clone(error));
        });

        Self {
            errors,
            _lock: lock,
        }
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        self.errors
            .lock()
            .unwrap()
            .iter()
            .map(|error| error.to_string())
            .collect()
    }
}

impl Drop for UncaughtErrorCapture {
    fn drop(&mut self) {
        reset_uncaught_error_handler();
    }
}

/// A virtual-time scheduler pumped explicitly by the test.
///
/// Nothing runs until the test calls [`process`][Self::process] (run
/// everything due at the current virtual time) or
/// [`advance_by`][Self::advance_by] (move virtual time forward, running
/// tasks in due order and re-arming periodic tasks as time passes).
#[derive(Clone)]
pub(crate) struct ManualScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    now: Mutex<Duration>,
    sequence: AtomicU64,
    executors: Mutex<Vec<Arc<ManualExecutor>>>,
}

impl ManualScheduler {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                now: Mutex::new(Duration::ZERO),
                sequence: AtomicU64::new(0),
                executors: Mutex::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn executors(&self) -> Vec<Arc<ManualExecutor>> {
        self.inner.executors.lock().unwrap().clone()
    }

    /// Runs every task due at the current virtual time.
    pub(crate) fn process(&self) {
        let now = *self.inner.now.lock().unwrap();
        self.run_due(now);
    }

    /// Moves virtual time forward by `duration`, running tasks as their due
    /// times are reached.
    pub(crate) fn advance_by(&self, duration: Duration) {
        let target = *self.inner.now.lock().unwrap() + duration;
        self.run_due(target);
        *self.inner.now.lock().unwrap() = target;
    }

    fn run_due(&self, target: Duration) {
        loop {
            // Find the globally earliest due task at or before `target`.
            let mut earliest: Option<(Duration, u64, Arc<ManualExecutor>)> = None;
            for executor in self.executors() {
                if let Some((due, sequence)) = executor.peek_due(target) {
                    let is_earlier = earliest
                        .as_ref()
                        .is_none_or(|(best_due, best_seq, _)| (due, sequence) < (*best_due, *best_seq));
                    if is_earlier {
                        earliest = Some((due, sequence, executor));
                    }
                }
            }

            let Some((due, sequence, executor)) = earliest else {
                return;
            };

            *self.inner.now.lock().unwrap() = due;
            executor.run_task(sequence);
        }
    }
}

impl Scheduler for ManualScheduler {
    fn new_executor(&self) -> Arc<dyn Executor> {
        let executor = Arc::new(ManualExecutor {
            scheduler: Arc::clone(&self.inner),
            disposed: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        });
        self.inner.executors.lock().unwrap().push(Arc::clone(&executor));
        executor
    }
}

enum TaskKind {
    Once(Option<Box<dyn FnOnce() + Send>>),
    Periodic {
        period: Duration,
        task: Arc<dyn Fn() + Send + Sync>,
    },
}

struct ScheduledTask {
    due: Duration,
    sequence: u64,
    kind: TaskKind,
}

/// An executor produced by [`ManualScheduler`].
pub(crate) struct ManualExecutor {
    scheduler: Arc<SchedulerInner>,
    disposed: AtomicBool,
    tasks: Mutex<Vec<ScheduledTask>>,
}

impl ManualExecutor {
    fn now(&self) -> Duration {
        *self.scheduler.now.lock().unwrap()
    }

    fn next_sequence(&self) -> u64 {
        self.scheduler.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// The earliest task due at or before `target`, if any.
    fn peek_due(&self, target: Duration) -> Option<(Duration, u64)> {
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|task| task.due <= target)
            .map(|task| (task.due, task.sequence))
            .min()
    }

    /// Runs (and re-arms, if periodic) the task with the given sequence
    /// number. The task may have been cancelled in the meantime, in which
    /// case this is a no-op.
    fn run_task(&self, sequence: u64) {
        let mut tasks = self.tasks.lock().unwrap();
        let Some(index) = tasks.iter().position(|task| task.sequence == sequence) else {
            return;
        };
        let mut entry = tasks.remove(index);

        match &mut entry.kind {
            TaskKind::Once(task) => {
                let task = task.take().expect("one-shot task is present until it runs");
                drop(tasks);
                task();
            }
            TaskKind::Periodic { period, task } => {
                let task = Arc::clone(task);
                let rearmed = ScheduledTask {
                    due: entry.due + *period,
                    sequence: self.next_sequence(),
                    kind: TaskKind::Periodic {
                        period: *period,
                        task: Arc::clone(&task),
                    },
                };
                tasks.push(rearmed);
                drop(tasks);
                task();
            }
        }
    }
}

impl Disposable for ManualExecutor {
    fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.tasks.lock().unwrap().clear();
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl Executor for ManualExecutor {
    fn submit(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) {
        if self.is_disposed() {
            return;
        }

        let entry = ScheduledTask {
            due: self.now() + delay,
            sequence: self.next_sequence(),
            kind: TaskKind::Once(Some(task)),
        };
        self.tasks.lock().unwrap().push(entry);
    }

    fn submit_periodic(
        &self,
        delay: Duration,
        period: Duration,
        task: Box<dyn Fn() + Send + Sync>,
    ) {
        if self.is_disposed() {
            return;
        }

        let entry = ScheduledTask {
            due: self.now() + delay,
            sequence: self.next_sequence(),
            kind: TaskKind::Periodic {
                period,
                task: Arc::from(task),
            },
        };
        self.tasks.lock().unwrap().push(entry);
    }

    fn cancel(&self) {
        self.tasks.lock().unwrap().clear();
    }
}
