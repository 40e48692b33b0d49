//! # Mock Collections
//!
//! Utilities for testing store consumers (most importantly [`PrinterService`](crate::service::PrinterService))
//! without spawning real collection actors.
//!
//! [`MockCollection`] answers requests from a queue of expectations and records every
//! request it receives, so a test can assert both what was returned and which writes
//! were issued:
//!
//! ```ignore
//! let mut printers = MockCollection::<Printer>::new();
//! printers.expect_get(PrinterId(1)).return_ok(Some(idle_printer));
//! printers.expect_update(PrinterId(1)).return_ok(idle_printer);
//!
//! // ... exercise code using printers.client() ...
//!
//! assert_eq!(printers.updates().len(), 1);
//! printers.verify();
//! ```

use crate::framework::{CollectionClient, CollectionRequest, Resource, StoreError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

enum Expectation<T: Resource> {
    List {
        response: Result<Vec<T>, StoreError>,
    },
    Get {
        id: T::Id,
        response: Result<Option<T>, StoreError>,
    },
    Create {
        response: Result<T, StoreError>,
    },
    Update {
        id: T::Id,
        response: Result<T, StoreError>,
    },
    Delete {
        id: T::Id,
        response: Result<(), StoreError>,
    },
}

/// A request observed by a [`MockCollection`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall<T: Resource> {
    List,
    Get(T::Id),
    Create(T::Draft),
    Update(T::Id, T::Patch),
    Delete(T::Id),
}

struct MockState<T: Resource> {
    expectations: VecDeque<Expectation<T>>,
    calls: Vec<RecordedCall<T>>,
    mismatches: Vec<String>,
}

/// A scripted collection for fluent testing.
///
/// Requests that do not match the next expectation are answered with
/// [`StoreError::Unexpected`] and reported by [`MockCollection::verify`].
pub struct MockCollection<T: Resource> {
    client: CollectionClient<T>,
    state: Arc<Mutex<MockState<T>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: Resource> MockCollection<T> {
    /// Creates a new mock with no expectations. Must be called inside a tokio runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<CollectionRequest<T>>(100);
        let state = Arc::new(Mutex::new(MockState {
            expectations: VecDeque::new(),
            calls: Vec::new(),
            mismatches: Vec::new(),
        }));
        let task_state = state.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let mut state = task_state.lock().unwrap();
                let expectation = state.expectations.pop_front();

                match (request, expectation) {
                    (CollectionRequest::List { respond_to }, Some(Expectation::List { response })) => {
                        state.calls.push(RecordedCall::List);
                        let _ = respond_to.send(response);
                    }
                    (
                        CollectionRequest::Get { id, respond_to },
                        Some(Expectation::Get { id: expected, response }),
                    ) if id == expected => {
                        state.calls.push(RecordedCall::Get(id));
                        let _ = respond_to.send(response);
                    }
                    (
                        CollectionRequest::Create { draft, respond_to },
                        Some(Expectation::Create { response }),
                    ) => {
                        state.calls.push(RecordedCall::Create(draft));
                        let _ = respond_to.send(response);
                    }
                    (
                        CollectionRequest::Update { id, patch, respond_to },
                        Some(Expectation::Update { id: expected, response }),
                    ) if id == expected => {
                        state.calls.push(RecordedCall::Update(id, patch));
                        let _ = respond_to.send(response);
                    }
                    (
                        CollectionRequest::Delete { id, respond_to },
                        Some(Expectation::Delete { id: expected, response }),
                    ) if id == expected => {
                        state.calls.push(RecordedCall::Delete(id));
                        let _ = respond_to.send(response);
                    }
                    (request, expectation) => {
                        let (call, respond) = describe(request);
                        let message = format!(
                            "{} {:?} (expected {})",
                            T::COLLECTION,
                            call,
                            expectation.as_ref().map_or("nothing", Expectation::kind)
                        );
                        if let Some(expectation) = expectation {
                            state.expectations.push_front(expectation);
                        }
                        state.calls.push(call);
                        state.mismatches.push(message.clone());
                        respond(StoreError::Unexpected(message));
                    }
                }
            }
        });

        Self {
            client: CollectionClient::new(sender),
            state,
            _handle: handle,
        }
    }

    /// Returns a client wired to this mock.
    pub fn client(&self) -> CollectionClient<T> {
        self.client.clone()
    }

    fn push(&self, expectation: Expectation<T>) {
        self.state.lock().unwrap().expectations.push_back(expectation);
    }

    /// Expects a `list` request.
    pub fn expect_list(&mut self) -> ExpectationBuilder<'_, T, Vec<T>> {
        ExpectationBuilder::new(self, |response| Expectation::List { response })
    }

    /// Expects a `get` request for `id`.
    pub fn expect_get(&mut self, id: T::Id) -> ExpectationBuilder<'_, T, Option<T>> {
        ExpectationBuilder::new(self, move |response| Expectation::Get { id, response })
    }

    /// Expects a `create` request.
    pub fn expect_create(&mut self) -> ExpectationBuilder<'_, T, T> {
        ExpectationBuilder::new(self, |response| Expectation::Create { response })
    }

    /// Expects an `update` request for `id`.
    pub fn expect_update(&mut self, id: T::Id) -> ExpectationBuilder<'_, T, T> {
        ExpectationBuilder::new(self, move |response| Expectation::Update { id, response })
    }

    /// Expects a `delete` request for `id`.
    pub fn expect_delete(&mut self, id: T::Id) -> ExpectationBuilder<'_, T, ()> {
        ExpectationBuilder::new(self, move |response| Expectation::Delete { id, response })
    }

    /// Every request received so far, in arrival order.
    pub fn calls(&self) -> Vec<RecordedCall<T>> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Just the patches sent, in arrival order.
    pub fn updates(&self) -> Vec<(T::Id, T::Patch)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::Update(id, patch) => Some((id, patch)),
                _ => None,
            })
            .collect()
    }

    /// Verifies that all expectations were met and nothing unexpected arrived.
    pub fn verify(&self) {
        let state = self.state.lock().unwrap();
        if !state.mismatches.is_empty() {
            panic!("Unexpected requests: {:?}", state.mismatches);
        }
        if !state.expectations.is_empty() {
            panic!(
                "Not all expectations were met. {} remaining",
                state.expectations.len()
            );
        }
    }
}

impl<T: Resource> Expectation<T> {
    fn kind(&self) -> &'static str {
        match self {
            Expectation::List { .. } => "list",
            Expectation::Get { .. } => "get",
            Expectation::Create { .. } => "create",
            Expectation::Update { .. } => "update",
            Expectation::Delete { .. } => "delete",
        }
    }
}

/// Splits an unmatched request into its record and a way to answer it with an error.
fn describe<T: Resource>(
    request: CollectionRequest<T>,
) -> (RecordedCall<T>, Box<dyn FnOnce(StoreError) + Send>) {
    match request {
        CollectionRequest::List { respond_to } => (
            RecordedCall::List,
            Box::new(move |e| {
                let _ = respond_to.send(Err(e));
            }),
        ),
        CollectionRequest::Get { id, respond_to } => (
            RecordedCall::Get(id),
            Box::new(move |e| {
                let _ = respond_to.send(Err(e));
            }),
        ),
        CollectionRequest::Create { draft, respond_to } => (
            RecordedCall::Create(draft),
            Box::new(move |e| {
                let _ = respond_to.send(Err(e));
            }),
        ),
        CollectionRequest::Update { id, patch, respond_to } => (
            RecordedCall::Update(id, patch),
            Box::new(move |e| {
                let _ = respond_to.send(Err(e));
            }),
        ),
        CollectionRequest::Delete { id, respond_to } => (
            RecordedCall::Delete(id),
            Box::new(move |e| {
                let _ = respond_to.send(Err(e));
            }),
        ),
    }
}

/// Builder returned by the `expect_*` methods.
pub struct ExpectationBuilder<'a, T: Resource, R> {
    mock: &'a MockCollection<T>,
    build: Box<dyn FnOnce(Result<R, StoreError>) -> Expectation<T> + 'a>,
}

impl<'a, T: Resource, R> ExpectationBuilder<'a, T, R> {
    fn new(
        mock: &'a MockCollection<T>,
        build: impl FnOnce(Result<R, StoreError>) -> Expectation<T> + 'a,
    ) -> Self {
        Self {
            mock,
            build: Box::new(build),
        }
    }

    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: R) {
        self.mock.push((self.build)(Ok(value)));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: StoreError) {
        self.mock.push((self.build)(Err(error)));
    }
}
