//! Seams between the intake flows and the outside world
//!
//! - [`FlightGateway`]: remote submission endpoint
//! - [`FlightExtractor`]: image-to-flight-data service
//! - [`FlightHistory`]: append-only local record store
//! - [`IdentitySource`]: read-only view of the signed-in user
//! - [`Clock`]: current time and date

use crate::error::{ExtractError, StoreError, SubmitError};
use crate::types::{
    ExtractedFlightData, FlightPayload, StoredFlightRecord, SubmissionReceipt, UserIdentity,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::watch;

#[cfg(test)]
use mockall::automock;

/// Remote flight submission endpoint
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FlightGateway: Send + Sync {
    /// POST a payload; any non-error answer is a success
    async fn submit(&self, payload: &FlightPayload) -> Result<SubmissionReceipt, SubmitError>;
}

/// Image to flight data extraction service
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FlightExtractor: Send + Sync {
    /// Read flight details from an image
    async fn extract(&self, image: ImageUpload) -> Result<ExtractedFlightData, ExtractError>;
}

/// Append-only store of accepted flights
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FlightHistory: Send + Sync {
    /// Append one record
    async fn append(&self, record: StoredFlightRecord) -> Result<(), StoreError>;

    /// Every stored record, oldest first
    async fn all(&self) -> Result<Vec<StoredFlightRecord>, StoreError>;

    /// Records owned by one user, oldest first
    async fn records_for(&self, owner_email: &str) -> Result<Vec<StoredFlightRecord>, StoreError> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .filter(|r| r.owner_email == owner_email)
            .collect())
    }
}

/// Read-only view of the identity provider
#[cfg_attr(test, automock)]
pub trait IdentitySource: Send + Sync {
    /// Latest known user (take-one semantics)
    fn current_user(&self) -> Option<UserIdentity>;

    /// Whether anyone is signed in
    fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }
}

/// Time source
#[cfg_attr(test, automock)]
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Current local calendar date
    fn today(&self) -> NaiveDate;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Raw image handed to an extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Original file name, for logs
    pub file_name: String,
    /// Encoded image bytes
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Wrap image bytes
    #[inline]
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Size in bytes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the upload is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Identity fed by a reactive "current user" stream
///
/// The provider side publishes sign-in/sign-out changes through the
/// [`watch::Sender`]; readers only ever look at the latest value.
#[derive(Debug, Clone)]
pub struct WatchIdentity {
    receiver: watch::Receiver<Option<UserIdentity>>,
}

impl WatchIdentity {
    /// Create a channel pair starting from `initial`
    #[must_use]
    pub fn channel(initial: Option<UserIdentity>) -> (watch::Sender<Option<UserIdentity>>, Self) {
        let (sender, receiver) = watch::channel(initial);
        (sender, Self { receiver })
    }

    /// Wrap an existing receiver
    #[inline]
    #[must_use]
    pub fn new(receiver: watch::Receiver<Option<UserIdentity>>) -> Self {
        Self { receiver }
    }
}

impl IdentitySource for WatchIdentity {
    fn current_user(&self) -> Option<UserIdentity> {
        self.receiver.borrow().clone()
    }
}

/// Identity fixed at construction
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Option<UserIdentity>,
}

impl StaticIdentity {
    /// Signed in as `user`
    #[inline]
    #[must_use]
    pub fn signed_in(user: UserIdentity) -> Self {
        Self { user: Some(user) }
    }

    /// Nobody signed in
    #[inline]
    #[must_use]
    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

impl IdentitySource for StaticIdentity {
    fn current_user(&self) -> Option<UserIdentity> {
        self.user.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_identity_sees_latest_user() {
        let (sender, identity) = WatchIdentity::channel(None);
        assert!(!identity.is_authenticated());

        sender
            .send(Some(UserIdentity::with_email("pilot@example.com")))
            .unwrap();
        assert_eq!(
            identity.current_user().and_then(|u| u.email).as_deref(),
            Some("pilot@example.com")
        );

        sender.send(None).unwrap();
        assert!(identity.current_user().is_none());
    }

    #[test]
    fn static_identity() {
        assert!(!StaticIdentity::anonymous().is_authenticated());
        assert!(StaticIdentity::signed_in(UserIdentity::default()).is_authenticated());
    }
}
