//! Operation interception.
//!
//! # Responsibilities
//! - Keep an ordered list of observers per operation key
//! - Run pre-hooks, the call, then post-hooks
//! - Classify the call's output as success or failure for post-hooks
//!
//! # Design Decisions
//! - Observers attach by key; the observed code never sees them
//! - An observer error is logged at WARN and dropped
//! - With no observers attached, `observe` is a plain await

use axum::response::Response;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Stable operation keys.
pub mod ops {
    pub const ACCOUNT_FETCH: &str = "account.fetch";
    pub const ACCOUNT_LIST: &str = "account.list";
    pub const ACCOUNT_CREATE: &str = "account.create";
    pub const BENEFICIARY_FETCH: &str = "beneficiary.fetch";
    pub const BENEFICIARY_ADD: &str = "beneficiary.add";
    pub const BENEFICIARY_REMOVE: &str = "beneficiary.remove";
    pub const BENEFICIARY_ALLOCATE: &str = "beneficiary.allocate";

    pub const STORE_FIND_BY_ID: &str = "store.find_by_id";
    pub const STORE_FIND_BY_NUMBER: &str = "store.find_by_number";
    pub const STORE_FIND_ALL: &str = "store.find_all";
    pub const STORE_COUNT: &str = "store.count";

    /// Every store read.
    pub const STORE_READS: [&str; 4] = [STORE_FIND_BY_ID, STORE_FIND_BY_NUMBER, STORE_FIND_ALL, STORE_COUNT];
}

/// How an observed call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// Output types whose success can be judged by a post-hook.
pub trait Observed {
    fn outcome(&self) -> Outcome;
}

impl<T, E> Observed for Result<T, E> {
    fn outcome(&self) -> Outcome {
        match self {
            Ok(_) => Outcome::Success,
            Err(_) => Outcome::Failure,
        }
    }
}

impl Observed for Response {
    fn outcome(&self) -> Outcome {
        let status = self.status();
        if status.is_client_error() || status.is_server_error() {
            Outcome::Failure
        } else {
            Outcome::Success
        }
    }
}

/// A single observed call, as seen by the hooks.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    operation: &'a str,
    started: Instant,
}

impl<'a> Invocation<'a> {
    pub fn new(operation: &'a str) -> Self {
        Self {
            operation,
            started: Instant::now(),
        }
    }

    pub fn operation(&self) -> &'a str {
        self.operation
    }

    /// Time since the invocation started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Failure inside an observer. Never reaches the observed caller.
#[derive(Debug, Error)]
#[error("observer '{observer}' failed: {message}")]
pub struct ObserverError {
    pub observer: String,
    pub message: String,
}

impl ObserverError {
    pub fn new(observer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            observer: observer.into(),
            message: message.into(),
        }
    }
}

/// A side-channel component attached to named operations.
pub trait Observer: Send + Sync {
    /// Identifying name, included in whatever the observer emits.
    fn name(&self) -> &str;

    fn before(&self, _invocation: &Invocation<'_>) -> Result<(), ObserverError> {
        Ok(())
    }

    fn after(&self, _invocation: &Invocation<'_>, _outcome: Outcome) -> Result<(), ObserverError> {
        Ok(())
    }
}

/// Observers keyed by operation, in attachment order.
#[derive(Clone, Default)]
pub struct Interceptor {
    observers: HashMap<String, Vec<Arc<dyn Observer>>>,
}

impl Interceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an observer to an operation. Observers run in attachment order.
    pub fn attach(&mut self, operation: impl Into<String>, observer: Arc<dyn Observer>) -> &mut Self {
        self.observers
            .entry(operation.into())
            .or_default()
            .push(observer);
        self
    }

    /// Builder form of [`attach`](Self::attach).
    pub fn with(mut self, operation: impl Into<String>, observer: Arc<dyn Observer>) -> Self {
        self.attach(operation, observer);
        self
    }

    pub fn observers(&self, operation: &str) -> &[Arc<dyn Observer>] {
        self.observers
            .get(operation)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Run `call` with the observers attached to `operation` around it.
    ///
    /// The call's output is returned as-is.
    pub async fn observe<F>(&self, operation: &str, call: F) -> F::Output
    where
        F: Future,
        F::Output: Observed,
    {
        let observers = self.observers(operation);
        if observers.is_empty() {
            return call.await;
        }

        let invocation = Invocation::new(operation);
        for observer in observers {
            if let Err(e) = observer.before(&invocation) {
                tracing::warn!(operation, error = %e, "Observer pre-hook failed");
            }
        }

        let output = call.await;
        let outcome = output.outcome();

        for observer in observers {
            if let Err(e) = observer.after(&invocation, outcome) {
                tracing::warn!(operation, error = %e, "Observer post-hook failed");
            }
        }

        output
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (operation, observers) in &self.observers {
            let names: Vec<&str> = observers.iter().map(|o| o.name()).collect();
            map.entry(operation, &names);
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Observer for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn before(&self, invocation: &Invocation<'_>) -> Result<(), ObserverError> {
            self.events
                .lock()
                .unwrap()
                .push(format!("before {}", invocation.operation()));
            Ok(())
        }

        fn after(&self, invocation: &Invocation<'_>, outcome: Outcome) -> Result<(), ObserverError> {
            self.events
                .lock()
                .unwrap()
                .push(format!("after {} {:?}", invocation.operation(), outcome));
            Ok(())
        }
    }

    struct Broken;

    impl Observer for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn before(&self, _: &Invocation<'_>) -> Result<(), ObserverError> {
            Err(ObserverError::new("broken", "sink unavailable"))
        }

        fn after(&self, _: &Invocation<'_>, _: Outcome) -> Result<(), ObserverError> {
            Err(ObserverError::new("broken", "sink unavailable"))
        }
    }

    #[tokio::test]
    async fn test_hooks_wrap_the_call() {
        let recorder = Arc::new(Recorder::default());
        let interceptor = Interceptor::new().with(ops::ACCOUNT_LIST, recorder.clone());

        let out: Result<u32, String> = interceptor
            .observe(ops::ACCOUNT_LIST, async {
                recorder.events.lock().unwrap().push("call".into());
                Ok(7)
            })
            .await;

        assert_eq!(out, Ok(7));
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["before account.list", "call", "after account.list Success"]
        );
    }

    #[tokio::test]
    async fn test_errors_pass_through_unchanged() {
        let recorder = Arc::new(Recorder::default());
        let interceptor = Interceptor::new().with(ops::ACCOUNT_FETCH, recorder.clone());

        let out: Result<u32, &str> = interceptor
            .observe(ops::ACCOUNT_FETCH, async { Err("missing") })
            .await;

        assert_eq!(out, Err("missing"));
        assert_eq!(
            recorder.events.lock().unwrap().last().unwrap(),
            "after account.fetch Failure"
        );
    }

    #[tokio::test]
    async fn test_failing_observer_is_swallowed() {
        let recorder = Arc::new(Recorder::default());
        let interceptor = Interceptor::new()
            .with(ops::ACCOUNT_LIST, Arc::new(Broken))
            .with(ops::ACCOUNT_LIST, recorder.clone());

        let out: Result<&str, ()> = interceptor.observe(ops::ACCOUNT_LIST, async { Ok("fine") }).await;

        assert_eq!(out, Ok("fine"));
        assert_eq!(recorder.events.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_other_operations_are_not_observed() {
        let recorder = Arc::new(Recorder::default());
        let interceptor = Interceptor::new().with(ops::ACCOUNT_LIST, recorder.clone());

        let _: Result<(), ()> = interceptor.observe(ops::ACCOUNT_CREATE, async { Ok(()) }).await;

        assert!(recorder.events.lock().unwrap().is_empty());
        assert!(interceptor.observers(ops::ACCOUNT_CREATE).is_empty());
    }

    #[test]
    fn test_response_outcome() {
        let ok = Response::builder().status(204).body(axum::body::Body::empty()).unwrap();
        assert_eq!(ok.outcome(), Outcome::Success);

        let missing = Response::builder().status(404).body(axum::body::Body::empty()).unwrap();
        assert_eq!(missing.outcome(), Outcome::Failure);
    }
}
