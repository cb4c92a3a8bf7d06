//! Client-side cache of the current user's pending evaluations.
//!
//! UI consumers read through [`PendingEvaluationCache`] instead of calling the
//! endpoints directly: repeated reads within the TTL window are served from
//! memory, concurrent reads of the same key share a single in-flight fetch,
//! and registered subscribers are told whenever the pending-evaluations list
//! changes. The cache is an explicitly constructed instance, owned by the
//! application root and cloned into whoever needs it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::Error;
use crate::models::evaluation::{EvaluationStatus, PendingEvaluation};
use crate::Client;

/// Cache entries older than this are treated as absent and refetched.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// A cached value with its fetch timestamp.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    fetched_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() <= ttl
    }
}

/// Result delivered to every caller coalesced onto one fetch. The error is
/// `Clone` (see [`Error`]), so a shared failure reaches each waiter intact.
type FetchResult<T> = Result<T, Error>;

type Callback = Arc<dyn Fn(&[PendingEvaluation]) + Send + Sync>;

/// Per-evaluation status entries are kept per user, so a status read for a
/// different user never observes another user's cached value.
type StatusKey = (String, String);

struct Inner {
    pending: Option<CacheEntry<Vec<PendingEvaluation>>>,
    statuses: HashMap<StatusKey, CacheEntry<EvaluationStatus>>,
    pending_flight: Option<broadcast::Sender<FetchResult<Vec<PendingEvaluation>>>>,
    status_flights: HashMap<StatusKey, broadcast::Sender<FetchResult<EvaluationStatus>>>,
    subscribers: Vec<(u64, Callback)>,
    next_subscriber_id: u64,
}

/// Cache of the current user's pending evaluations and per-evaluation
/// evaluator statuses.
///
/// Entries move through `absent -> fetching -> fresh -> stale` and back;
/// while a fetch for a key is in flight, every overlapping read of that key
/// awaits the same fetch instead of issuing its own request. A failed fetch
/// never overwrites a previously cached value, and a refresh cycle that fails
/// skips subscriber notification.
///
/// The cache is `Clone`; clones share the same state.
#[derive(Clone)]
pub struct PendingEvaluationCache {
    client: Client,
    ttl: Duration,
    inner: Arc<Mutex<Inner>>,
}

impl PendingEvaluationCache {
    /// Creates a cache over the given client with the default five-minute TTL.
    pub fn new(client: Client) -> Self {
        Self::with_ttl(client, DEFAULT_TTL)
    }

    /// Creates a cache with a custom TTL.
    pub fn with_ttl(client: Client, ttl: Duration) -> Self {
        Self {
            client,
            ttl,
            inner: Arc::new(Mutex::new(Inner {
                pending: None,
                statuses: HashMap::new(),
                pending_flight: None,
                status_flights: HashMap::new(),
                subscribers: Vec::new(),
                next_subscriber_id: 0,
            })),
        }
    }

    /// Returns the pending evaluations, fetching them when absent or stale.
    ///
    /// A fresh cached list is returned without network traffic. Otherwise the
    /// evaluations endpoint is queried, the result cached with the current
    /// timestamp, and subscribers notified before this call resolves.
    ///
    /// On a failed fetch the error is returned and the previously cached
    /// value, if any, is left intact; callers that prefer showing stale data
    /// over an error can fall back to
    /// [`cached_pending_evaluations`](Self::cached_pending_evaluations).
    pub async fn pending_evaluations(&self) -> Result<Vec<PendingEvaluation>, Error> {
        let mut rx = {
            let mut inner = self.lock();
            if let Some(entry) = &inner.pending {
                if entry.is_fresh(self.ttl) {
                    debug!("pending evaluations served from cache");
                    return Ok(entry.value.clone());
                }
            }
            match &inner.pending_flight {
                Some(tx) => tx.subscribe(),
                None => {
                    let (tx, rx) = broadcast::channel(1);
                    inner.pending_flight = Some(tx);
                    self.spawn_pending_fetch();
                    rx
                }
            }
        };
        Self::await_flight(rx.recv().await)
    }

    /// Refetches the pending evaluations unconditionally, regardless of TTL.
    ///
    /// Overwrites the cache, notifies subscribers, and returns the new list.
    /// An overlapping in-flight list fetch is joined rather than duplicated.
    pub async fn refresh(&self) -> Result<Vec<PendingEvaluation>, Error> {
        let mut rx = {
            let mut inner = self.lock();
            match &inner.pending_flight {
                Some(tx) => tx.subscribe(),
                None => {
                    let (tx, rx) = broadcast::channel(1);
                    inner.pending_flight = Some(tx);
                    self.spawn_pending_fetch();
                    rx
                }
            }
        };
        Self::await_flight(rx.recv().await)
    }

    /// The last successfully fetched list, fresh or stale, without any
    /// network traffic.
    ///
    /// Intended as the documented fallback after a failed
    /// [`pending_evaluations`](Self::pending_evaluations) or
    /// [`refresh`](Self::refresh); `None` means nothing was ever fetched.
    pub fn cached_pending_evaluations(&self) -> Option<Vec<PendingEvaluation>> {
        self.lock().pending.as_ref().map(|entry| entry.value.clone())
    }

    /// Returns the given user's status within the given evaluation.
    ///
    /// A fresh cached status is returned without network traffic. Otherwise
    /// the evaluators endpoint is queried and the status extracted from the
    /// record matching `(evaluation_id, user_id)`; a user not listed as an
    /// evaluator reads as [`EvaluationStatus::Pending`].
    pub async fn evaluator_status(
        &self,
        evaluation_id: &str,
        user_id: &str,
    ) -> Result<EvaluationStatus, Error> {
        let key = (evaluation_id.to_owned(), user_id.to_owned());
        let mut rx = {
            let mut inner = self.lock();
            if let Some(entry) = inner.statuses.get(&key) {
                if entry.is_fresh(self.ttl) {
                    debug!(evaluation_id, user_id, "evaluator status served from cache");
                    return Ok(entry.value);
                }
            }
            match inner.status_flights.get(&key) {
                Some(tx) => tx.subscribe(),
                None => {
                    let (tx, rx) = broadcast::channel(1);
                    inner.status_flights.insert(key.clone(), tx);
                    self.spawn_status_fetch(key);
                    rx
                }
            }
        };
        Self::await_flight(rx.recv().await)
    }

    /// Drops every cached status entry for the given evaluation, forcing a
    /// fresh fetch on the next read. Entries for other evaluations and the
    /// pending-evaluations list are untouched.
    ///
    /// Typically called after the user submits an evaluation, so the next
    /// status read reflects the submission.
    pub fn invalidate(&self, evaluation_id: &str) {
        let mut inner = self.lock();
        inner
            .statuses
            .retain(|(cached_id, _), _| cached_id.as_str() != evaluation_id);
        debug!(evaluation_id, "evaluator status entries invalidated");
    }

    /// Registers a callback invoked with the new pending-evaluations list on
    /// every successful list fetch.
    ///
    /// Callbacks run before the triggering [`refresh`](Self::refresh) or
    /// [`pending_evaluations`](Self::pending_evaluations) call resolves. The
    /// returned [`Subscription`] deregisters the callback when dropped or via
    /// [`Subscription::unsubscribe`]; deregistering during an in-flight fetch
    /// does not abort the fetch, whose result still populates the cache.
    pub fn subscribe(
        &self,
        callback: impl Fn(&[PendingEvaluation]) + Send + Sync + 'static,
    ) -> Subscription {
        let mut inner = self.lock();
        let id = inner.next_subscriber_id;
        inner.next_subscriber_id += 1;
        inner.subscribers.push((id, Arc::new(callback)));
        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("cache state lock poisoned")
    }

    // The fetch runs on its own task so that a caller dropped mid-await does
    // not cancel it; the result still lands in the cache.
    fn spawn_pending_fetch(&self) {
        let cache = self.clone();
        tokio::spawn(async move {
            let result = cache.client.list_pending_evaluations().await;
            cache.complete_pending_fetch(result);
        });
    }

    fn complete_pending_fetch(&self, result: FetchResult<Vec<PendingEvaluation>>) {
        let (tx, notify) = {
            let mut inner = self.lock();
            let tx = inner.pending_flight.take();
            let notify = match &result {
                Ok(list) => {
                    inner.pending = Some(CacheEntry::new(list.clone()));
                    let callbacks: Vec<Callback> = inner
                        .subscribers
                        .iter()
                        .map(|(_, callback)| callback.clone())
                        .collect();
                    Some((list.clone(), callbacks))
                }
                Err(error) => {
                    warn!(%error, "pending evaluations fetch failed; keeping previous value");
                    None
                }
            };
            (tx, notify)
        };

        // Callbacks run outside the lock so they may subscribe or
        // unsubscribe without deadlocking.
        if let Some((list, callbacks)) = notify {
            for callback in callbacks {
                callback(&list);
            }
        }

        if let Some(tx) = tx {
            // No receivers is fine: every waiting caller has gone away.
            let _ = tx.send(result);
        }
    }

    fn spawn_status_fetch(&self, key: StatusKey) {
        let cache = self.clone();
        tokio::spawn(async move {
            let (evaluation_id, user_id) = &key;
            let result = cache.client.list_evaluators().await.map(|records| {
                records
                    .iter()
                    .find(|record| {
                        record.evaluation_id == *evaluation_id && record.user_id == *user_id
                    })
                    .map(|record| record.status)
                    // Not being listed as an evaluator reads as pending.
                    .unwrap_or_default()
            });
            cache.complete_status_fetch(&key, result);
        });
    }

    fn complete_status_fetch(&self, key: &StatusKey, result: FetchResult<EvaluationStatus>) {
        let tx = {
            let mut inner = self.lock();
            match &result {
                Ok(status) => {
                    inner.statuses.insert(key.clone(), CacheEntry::new(*status));
                }
                Err(error) => {
                    warn!(%error, "evaluator status fetch failed; keeping previous value");
                }
            }
            inner.status_flights.remove(key)
        };
        if let Some(tx) = tx {
            let _ = tx.send(result);
        }
    }

    fn await_flight<T>(
        received: Result<FetchResult<T>, broadcast::error::RecvError>,
    ) -> Result<T, Error> {
        match received {
            Ok(result) => result,
            // The fetch task delivers exactly one message before the sender
            // is dropped, so this arm is unreachable in practice.
            Err(_) => Err(Error::Other("in-flight fetch ended without a result".into())),
        }
    }
}

/// Handle for a registered subscriber callback.
///
/// Dropping the handle (or calling [`unsubscribe`](Subscription::unsubscribe))
/// deregisters the callback; no further notifications reach it.
#[must_use = "dropping the subscription immediately unsubscribes the callback"]
pub struct Subscription {
    id: u64,
    inner: Weak<Mutex<Inner>>,
}

impl Subscription {
    /// Deregisters the callback. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            if let Ok(mut inner) = inner.lock() {
                inner.subscribers.retain(|(id, _)| *id != self.id);
            }
        }
    }
}
