/*
 * Responsibility
 * - one-time verifier initialization: parameters -> role mapping -> construction -> warm-up
 * - SharedVerifier: the process-wide memoized outcome every request awaits
 *   - the first attempt starts at cold start, on its own task (callers never cancel it)
 *   - concurrent callers share the in-flight attempt and its outcome
 *   - a failed outcome is kept for the life of the environment unless FailurePolicy::Retry
 */
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::error::InitError;
use crate::services::auth::factory::VerifierFactory;
use crate::services::auth::verifier::TokenVerifier;
use crate::services::params::ParameterResolver;

/// Settled result of an initialization attempt, cloned out to every caller.
pub type VerifierOutcome = Result<Arc<dyn TokenVerifier>, Arc<InitError>>;

type SharedInit = Shared<BoxFuture<'static, VerifierOutcome>>;

/// What happens after an initialization attempt fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Keep the failure; every later request gets Server-Error until the
    /// environment is recycled.
    Permanent,
    /// The first request arriving `cooldown` after the failed attempt started
    /// launches one new attempt, shared by everyone who asks meanwhile.
    Retry { cooldown: Duration },
}

pub struct VerifierInitializer {
    resolver: ParameterResolver,
    factory: Arc<dyn VerifierFactory>,
}

impl VerifierInitializer {
    pub fn new(resolver: ParameterResolver, factory: Arc<dyn VerifierFactory>) -> Self {
        Self { resolver, factory }
    }

    pub async fn initialize(&self) -> Result<Arc<dyn TokenVerifier>, InitError> {
        // The store may answer in any order: roles are matched by name.
        let pool = self.resolver.resolve().await?;

        self.factory.build(pool).await
    }
}

struct Attempt {
    future: SharedInit,
    started_at: Instant,
}

impl Attempt {
    fn spawn(initializer: Arc<VerifierInitializer>) -> Self {
        let task = tokio::spawn(async move {
            initializer.initialize().await.map_err(|err| {
                tracing::error!(error = %err, kind = err.kind(), "verifier initialization failed");
                Arc::new(err)
            })
        });

        let future = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(join_err) => Err(Arc::new(InitError::Aborted(join_err.to_string()))),
            }
        }
        .boxed()
        .shared();

        Self {
            future,
            started_at: Instant::now(),
        }
    }

    fn has_failed(&self) -> bool {
        matches!(self.future.peek(), Some(Err(_)))
    }
}

struct Inner {
    initializer: Arc<VerifierInitializer>,
    policy: FailurePolicy,
    current: Mutex<Attempt>,
    attempts: AtomicU64,
}

/// Cheap to clone; all clones share one slot.
#[derive(Clone)]
pub struct SharedVerifier {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SharedVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedVerifier")
            .field("policy", &self.inner.policy)
            .field("attempts", &self.attempts())
            .finish()
    }
}

impl SharedVerifier {
    /// Start the first attempt right away. Must be called inside a tokio runtime.
    pub fn start(initializer: VerifierInitializer, policy: FailurePolicy) -> Self {
        let initializer = Arc::new(initializer);
        let first = Attempt::spawn(initializer.clone());

        Self {
            inner: Arc::new(Inner {
                initializer,
                policy,
                current: Mutex::new(first),
                attempts: AtomicU64::new(1),
            }),
        }
    }

    /// Await the current attempt.
    pub async fn get(&self) -> VerifierOutcome {
        self.current().await
    }

    /// Number of initialization attempts started so far.
    pub fn attempts(&self) -> u64 {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    pub fn policy(&self) -> FailurePolicy {
        self.inner.policy
    }

    fn current(&self) -> SharedInit {
        let mut current = self
            .inner
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let FailurePolicy::Retry { cooldown } = self.inner.policy {
            if current.has_failed() && current.started_at.elapsed() >= cooldown {
                let attempt = self.inner.attempts.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::warn!(attempt, "retrying verifier initialization");
                *current = Attempt::spawn(self.inner.initializer.clone());
            }
        }

        current.future.clone()
    }
}
