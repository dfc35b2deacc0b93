//! Registered dependency checks.
//!
//! # Responsibilities
//! - Give each dependency a stable identity
//! - Declare which status keys its health influences
//! - Wrap the caller's connectivity probe behind the `Check` trait
//!
//! # Design Decisions
//! - Checkables are immutable after construction and shared via `Arc`
//! - `check_fn` adapts any async closure into a `Check`
//! - The deadline is advisory for the check; the round executor enforces it

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::time::Instant;

use crate::health::status::StatusKey;

/// Reason a dependency check reported failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CheckError(String);

impl CheckError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    pub fn reason(&self) -> &str {
        &self.0
    }
}

impl From<std::io::Error> for CheckError {
    fn from(e: std::io::Error) -> Self {
        Self(e.to_string())
    }
}

/// Execution context handed to a single check invocation.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext {
    deadline: Instant,
    budget: Duration,
}

impl CheckContext {
    /// A context whose deadline is `budget` from now.
    pub fn with_budget(budget: Duration) -> Self {
        Self {
            deadline: Instant::now() + budget,
            budget,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// Something that can be asked, within a deadline, whether it is healthy.
pub trait Check: Send + Sync {
    fn check(&self, ctx: CheckContext) -> BoxFuture<'_, Result<(), CheckError>>;
}

/// A `Check` backed by an async closure. Built with [`check_fn`].
#[derive(Clone)]
pub struct CheckFn<F> {
    f: F,
}

/// Adapt `f` into a [`Check`].
pub fn check_fn<F, Fut>(f: F) -> CheckFn<F>
where
    F: Fn(CheckContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), CheckError>> + Send + 'static,
{
    CheckFn { f }
}

impl<F, Fut> Check for CheckFn<F>
where
    F: Fn(CheckContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), CheckError>> + Send + 'static,
{
    fn check(&self, ctx: CheckContext) -> BoxFuture<'_, Result<(), CheckError>> {
        Box::pin((self.f)(ctx))
    }
}

impl<C: Check + ?Sized> Check for Arc<C> {
    fn check(&self, ctx: CheckContext) -> BoxFuture<'_, Result<(), CheckError>> {
        (**self).check(ctx)
    }
}

/// Error returned when a checkable cannot be registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("service id must not be empty")]
    EmptyServiceId,
}

/// A dependency whose health is probed every round.
#[derive(Clone)]
pub struct Checkable {
    service_id: String,
    affected_statuses: BTreeSet<StatusKey>,
    checker: Option<Arc<dyn Check>>,
}

impl Checkable {
    /// Register a dependency check.
    ///
    /// An empty `affected_statuses` is accepted: the dependency still shows up in
    /// the snapshot but never moves a status key.
    pub fn new<C>(
        service_id: impl Into<String>,
        affected_statuses: impl IntoIterator<Item = StatusKey>,
        check: C,
    ) -> Result<Self, RegistrationError>
    where
        C: Check + 'static,
    {
        Self::build(service_id.into(), affected_statuses, Some(Arc::new(check)))
    }

    /// Register a dependency without a probe; it always reports healthy.
    pub fn always_ok(
        service_id: impl Into<String>,
        affected_statuses: impl IntoIterator<Item = StatusKey>,
    ) -> Result<Self, RegistrationError> {
        Self::build(service_id.into(), affected_statuses, None)
    }

    fn build(
        service_id: String,
        affected_statuses: impl IntoIterator<Item = StatusKey>,
        checker: Option<Arc<dyn Check>>,
    ) -> Result<Self, RegistrationError> {
        if service_id.trim().is_empty() {
            return Err(RegistrationError::EmptyServiceId);
        }

        Ok(Self {
            service_id,
            affected_statuses: affected_statuses.into_iter().collect(),
            checker,
        })
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn affected_statuses(&self) -> &BTreeSet<StatusKey> {
        &self.affected_statuses
    }

    pub fn affects(&self, key: StatusKey) -> bool {
        self.affected_statuses.contains(&key)
    }

    /// Run the wrapped check once.
    pub async fn check(&self, ctx: CheckContext) -> Result<(), CheckError> {
        match &self.checker {
            Some(checker) => checker.check(ctx).await,
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Checkable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checkable")
            .field("service_id", &self.service_id)
            .field("affected_statuses", &self.affected_statuses)
            .field("has_checker", &self.checker.is_some())
            .finish()
    }
}
