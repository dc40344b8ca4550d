//! Single-flight token refresh.
//!
//! At most one refresh runs at a time. The first caller that needs new
//! credentials starts it; every caller arriving while it runs awaits the same
//! shared future and observes the same outcome. The slot is emptied once the
//! refresh resolves, whatever the outcome.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};

use super::error::ApiError;
use crate::models::TokenPair;

type RefreshFuture = Shared<BoxFuture<'static, Result<TokenPair, ApiError>>>;

struct InFlight {
    generation: u64,
    future: RefreshFuture,
}

#[derive(Default)]
struct Slot {
    next_generation: u64,
    current: Option<InFlight>,
}

/// Coordinates refresh calls so concurrent 401s trigger exactly one.
#[derive(Default)]
pub struct RefreshCoordinator {
    slot: Mutex<Slot>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a refresh is currently running.
    pub fn in_flight(&self) -> bool {
        self.lock().current.is_some()
    }

    /// Join the running refresh, or start one with `start`.
    ///
    /// `start` is only invoked when no refresh is in flight.
    pub async fn refresh<F, Fut>(&self, start: F) -> Result<TokenPair, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TokenPair, ApiError>> + Send + 'static,
    {
        let (generation, future) = {
            let mut slot = self.lock();
            match &slot.current {
                Some(in_flight) => {
                    tracing::debug!("Joining in-flight token refresh #{}", in_flight.generation);
                    (in_flight.generation, in_flight.future.clone())
                }
                None => {
                    let generation = slot.next_generation;
                    slot.next_generation += 1;
                    let future = start().boxed().shared();
                    slot.current = Some(InFlight {
                        generation,
                        future: future.clone(),
                    });
                    tracing::debug!("Starting token refresh #{}", generation);
                    (generation, future)
                }
            }
        };

        let result = future.await;
        self.finish(generation);
        result
    }

    fn finish(&self, generation: u64) {
        let mut slot = self.lock();
        if slot
            .current
            .as_ref()
            .is_some_and(|in_flight| in_flight.generation == generation)
        {
            slot.current = None;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Run `attempt` under `timeout`, retrying transport failures up to `retries` times.
///
/// Business failures (a non-200 envelope) are returned immediately.
pub async fn with_timeout_and_retries<F, Fut>(
    timeout: Duration,
    retries: u32,
    mut attempt: F,
) -> Result<TokenPair, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<TokenPair, ApiError>>,
{
    let mut tries = 0;
    loop {
        tries += 1;
        let err = match tokio::time::timeout(timeout, attempt()).await {
            Ok(Ok(tokens)) => return Ok(tokens),
            Ok(Err(e)) if !e.is_transport() => return Err(e),
            Ok(Err(e)) => e,
            Err(_) => ApiError::transport(format!("token refresh timed out after {:?}", timeout)),
        };

        if tries > retries {
            return Err(err);
        }

        tracing::warn!("Token refresh attempt {} failed: {}; retrying", tries, err.message);
        // Small jitter so parallel clients do not hit the endpoint in lockstep
        let jitter = rand::random::<u64>() % 100;
        tokio::time::sleep(Duration::from_millis(jitter)).await;
    }
}
