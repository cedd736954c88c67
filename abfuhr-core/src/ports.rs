//! The error taxonomy and the trait describing the waste API backend.

use async_trait::async_trait;
use reqwest::Error as ReqwestError;
use serde_json::Error as JsonError;

use crate::model::{CollectionEvent, Fraction, Locality, Street};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while resolving a collection schedule.
pub enum AbfallError {
    /// The municipality key is not in the registry.
    #[error("Unknown municipality: {0}")]
    UnknownMunicipality(String),
    /// Network failure or non-success HTTP status.
    #[error("Transport error on {endpoint}: {source}")]
    Transport {
        /// Endpoint path that was requested.
        endpoint: String,
        /// Underlying HTTP client error.
        #[source]
        source: ReqwestError,
    },
    /// Response body was not valid JSON or lacked expected fields.
    #[error("Decode error on {endpoint}: {source}")]
    Decode {
        /// Endpoint path that was requested.
        endpoint: String,
        /// Underlying JSON error.
        #[source]
        source: JsonError,
    },
    /// No locality matched the configured name.
    #[error("No locality named '{0}' was found")]
    LocalityNotFound(String),
    /// More than one locality matched the configured name.
    #[error("More than one locality matches '{query}': {matches:?}")]
    AmbiguousLocality {
        /// Configured name, normalized.
        query: String,
        /// Every matching entry.
        matches: Vec<Locality>,
    },
    /// No street matched the configured name.
    #[error("No street named '{0}' was found")]
    StreetNotFound(String),
    /// More than one street matched the configured name.
    #[error("More than one street matches '{query}': {matches:?}")]
    AmbiguousStreet {
        /// Configured name, normalized.
        query: String,
        /// Every matching entry.
        matches: Vec<Street>,
    },
    /// Loading the fraction table failed.
    #[error("Fraction lookup failed: {0}")]
    FractionLookupFailed(#[source] Box<AbfallError>),
    /// Loading the collection events failed.
    #[error("Collection event lookup failed: {0}")]
    EventLookupFailed(#[source] Box<AbfallError>),
}

impl AbfallError {
    /// Whether the error comes from the configuration rather than the network.
    ///
    /// Configuration errors repeat on every cycle until the configuration changes;
    /// transport and decode errors may clear on their own.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownMunicipality(_)
                | Self::LocalityNotFound(_)
                | Self::AmbiguousLocality { .. }
                | Self::StreetNotFound(_)
                | Self::AmbiguousStreet { .. }
        )
    }
}

#[async_trait]
/// Lookups the schedule resolver needs from a waste API backend.
pub trait WasteApi: Send + Sync {
    /// Fetch every fraction known to the deployment.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    async fn fractions(&self) -> Result<Vec<Fraction>, AbfallError>;

    /// Fetch every locality served by the deployment.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    async fn localities(&self) -> Result<Vec<Locality>, AbfallError>;

    /// Fetch every street of a locality.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    async fn streets(&self, locality_id: i64) -> Result<Vec<Street>, AbfallError>;

    /// Fetch the collection events scheduled for a street.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    async fn collection_events(&self, street_id: i64)
    -> Result<Vec<CollectionEvent>, AbfallError>;
}
