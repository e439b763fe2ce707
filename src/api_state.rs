use std::future::Future;

use crate::error::ApiError;

/// Lifecycle of one data fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiState<T> {
    Idle,
    Loading,
    Success(T),
    Failure(String),
}

/// A fetch handed out by a [`StatusMachine`]. Its result only lands if no
/// newer ticket has been issued since.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<R> {
    pub generation: u64,
    pub request: R,
}

/// Drives one view's `ApiState` from the request `R` it was asked for.
///
/// Every `begin` bumps the generation; `complete` with an older generation is
/// dropped, so the state always reflects the most recently issued request no
/// matter in which order responses arrive.
#[derive(Debug)]
pub struct StatusMachine<R, T> {
    state: ApiState<T>,
    generation: u64,
    last_request: Option<R>,
}

impl<R, T> Default for StatusMachine<R, T> {
    fn default() -> Self {
        Self {
            state: ApiState::Idle,
            generation: 0,
            last_request: None,
        }
    }
}

impl<R: Clone, T> StatusMachine<R, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_state(&self) -> &ApiState<T> {
        &self.state
    }

    pub fn begin(&mut self, request: R) -> Ticket<R> {
        self.generation += 1;
        self.state = ApiState::Loading;
        self.last_request = Some(request.clone());
        Ticket {
            generation: self.generation,
            request,
        }
    }

    /// Applies a result. Returns false if the ticket was stale.
    pub fn complete(&mut self, generation: u64, result: Result<T, ApiError>) -> bool {
        if generation != self.generation {
            tracing::debug!(
                stale = generation,
                current = self.generation,
                "discarding stale response"
            );
            return false;
        }
        self.state = match result {
            Ok(payload) => ApiState::Success(payload),
            Err(e) => ApiState::Failure(e.display_message()),
        };
        true
    }

    /// Re-issues the last request. `None` before anything was triggered.
    pub fn retry(&mut self) -> Option<Ticket<R>> {
        let request = self.last_request.clone()?;
        Some(self.begin(request))
    }

    /// Begin, await `fetch`, complete.
    pub async fn trigger<F, Fut>(&mut self, request: R, fetch: F) -> &ApiState<T>
    where
        F: FnOnce(R) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let ticket = self.begin(request);
        let result = fetch(ticket.request).await;
        self.complete(ticket.generation, result);
        &self.state
    }
}
