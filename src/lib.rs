//! # TalentHub API Client
//!
//! This crate provides a client for the TalentHub HR evaluations API, giving
//! applications typed access to the remote evaluations and evaluators webhook
//! endpoints together with a client-side cache of the current user's pending
//! evaluations.
//!
//! ## Features
//! - **Typed endpoint access**: fetch pending evaluations and evaluator
//!   assignments as plain Rust structs.
//! - **Response normalization**: the webhook endpoints answer in several
//!   envelope shapes; all of them are decoded at a single boundary.
//! - **Client-side caching**: [`PendingEvaluationCache`] serves repeated reads
//!   within a TTL window from memory, coalesces concurrent fetches, and keeps
//!   subscribers notified of list changes.
//!
//! ## Installation
//!
//! Add this crate to your `Cargo.toml` file:
//!
//! ```sh
//! cargo add talenthub
//! ```
//!
//! ## Usage
//!
//! Create a [`Client`] with the authenticated session, then hand it to a
//! [`PendingEvaluationCache`] owned by your application root.
//!
//! ```rust
//! use talenthub::{Client, PendingEvaluationCache, Session};
//!
//! let client = Client::builder()
//!     .session(Session::new("session-token".into(), "user-1".into()))
//!     .build();
//! let cache = PendingEvaluationCache::new(client);
//! # drop(cache);
//! ```

use reqwest::{Client as ReqwestClient, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use models::envelope::{self, WebhookRequest};

pub mod cache;
pub mod error;
pub mod models;

pub use cache::{PendingEvaluationCache, Subscription, DEFAULT_TTL};
pub use error::Error;
pub use models::evaluation::{EvaluationStatus, PendingEvaluation};
pub use models::evaluator::EvaluatorRecord;

static BASE_URL: &str = "https://hooks.talenthub.app/api/v1";
static APP_USER_AGENT: &str = env!("CARGO_PKG_NAME");

const EVALUATIONS_PATH: &str = "/evaluations";
const EVALUATORS_PATH: &str = "/evaluators";

/// The authenticated user session whose bearer token is attached to every
/// outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer credential for the webhook endpoints.
    pub token: String,
    /// Identifier of the signed-in user.
    pub user_id: String,
}

impl Session {
    pub fn new(token: String, user_id: String) -> Self {
        Self { token, user_id }
    }
}

/// The `Client` for interacting with the TalentHub API.
///
/// The `Client` provides typed access to the evaluations and evaluators
/// endpoints. It is configured using the [`ClientBuilder`], which allows for
/// flexible and customizable initialization.
///
/// A client without a [`Session`] can be constructed (the application may not
/// have signed in yet), but every endpoint operation on it fails with
/// [`Error::NotAuthenticated`] before any request is issued.
///
/// ## Usage Example
///
/// ```
/// use talenthub::{Client, Session};
///
/// let client = Client::builder()
///     .session(Session::new("session-token".into(), "user-1".into()))
///     .base_url("https://custom.url/api".to_string())
///     .build();
/// ```
#[derive(Clone)]
pub struct Client {
    /// The authenticated session, if any.
    session: Option<Session>,
    /// Internal HTTP client for making requests.
    client: ReqwestClient,
    /// The base URL for API requests.
    base_url: String,
}

impl Client {
    /// Creates a new `ClientBuilder`.
    ///
    /// The `ClientBuilder` enables optional configuration of the session and
    /// the base URL.
    ///
    /// # Example
    ///
    /// ```
    /// use talenthub::Client;
    ///
    /// let client_builder = Client::builder();
    /// ```
    pub fn builder() -> ClientBuilder {
        ClientBuilder {
            session: None,
            base_url: BASE_URL.into(),
        }
    }

    /// Creates a new `Client` with the provided session and base URL.
    ///
    /// # Arguments
    /// * `session` - The authenticated session, or `None` when signed out.
    /// * `base_url` - Override for the API base URL; defaults to the hosted
    ///   endpoint when `None`.
    pub fn new(session: Option<Session>, base_url: Option<String>) -> Self {
        let client = ReqwestClient::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        let base_url = base_url.unwrap_or_else(|| BASE_URL.into());

        Self {
            session,
            client,
            base_url,
        }
    }

    /// Returns `true` when the client carries an authenticated session.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// The authenticated session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Fetches every evaluation campaign visible to the current user.
    ///
    /// Issues a `readAll` request against the evaluations endpoint. Fails with
    /// [`Error::NotAuthenticated`] when no session is present, with
    /// [`Error::Status`] on a non-success HTTP status, and with
    /// [`Error::Parse`] when the body matches none of the accepted envelope
    /// shapes.
    pub async fn list_pending_evaluations(&self) -> Result<Vec<PendingEvaluation>, Error> {
        self.read_all(EVALUATIONS_PATH).await
    }

    /// Fetches every evaluator assignment record.
    ///
    /// Same request shape and failure modes as
    /// [`list_pending_evaluations`](Client::list_pending_evaluations).
    pub async fn list_evaluators(&self) -> Result<Vec<EvaluatorRecord>, Error> {
        self.read_all(EVALUATORS_PATH).await
    }

    async fn read_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, Error> {
        let session = self.session.as_ref().ok_or(Error::NotAuthenticated)?;

        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "issuing readAll request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&session.token)
            .json(&WebhookRequest::read_all())
            .send()
            .await?;

        Self::check_status(response.status())?;

        let body = response.text().await?;
        envelope::decode_records(&body)
    }

    pub(crate) fn check_status(status: StatusCode) -> Result<(), Error> {
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::Status(status))
        }
    }
}

/// Builder for configuring and creating a `Client` instance.
///
/// The `ClientBuilder` provides a fluent interface for setting optional
/// parameters. Once all desired parameters are set, call `build` to create a
/// `Client` instance.
pub struct ClientBuilder {
    session: Option<Session>,
    base_url: String,
}

impl ClientBuilder {
    /// Sets the authenticated [`Session`] for the `Client`.
    ///
    /// # Example
    ///
    /// ```
    /// use talenthub::{Client, Session};
    ///
    /// let client_builder = Client::builder()
    ///     .session(Session::new("session-token".into(), "user-1".into()));
    /// ```
    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Sets a custom `base_url` for the API endpoint.
    ///
    /// This is useful if the API endpoint changes or if using a mock server
    /// for testing purposes.
    ///
    /// # Example
    ///
    /// ```
    /// use talenthub::Client;
    ///
    /// let client_builder = Client::builder()
    ///     .base_url("https://custom.url/api".to_string());
    /// ```
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Builds and returns a new `Client` instance.
    pub fn build(self) -> Client {
        Client::new(self.session, Some(self.base_url))
    }
}
