//! Client for the RegioIT waste collection REST API used by many German waste authorities.
//!
//! Every operation is a single GET against `{base_url}{endpoint}` with no retry.
//! Callers supply the [`Client`] and with it the request timeout.

/// REST endpoints of a deployment.
pub mod endpoint;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use abfuhr_core::{
    model::{CollectionEvent, District, Fraction, Locality, Street},
    ports::{AbfallError, WasteApi},
    registry::Municipality,
};

pub use endpoint::{DEFAULT_NOTIFICATION_COUNT, Endpoint};

/// Build an HTTP client with an explicit timeout, which the upstream API does not define.
///
/// # Errors
///
/// Returns a [`reqwest::Error`] when the TLS backend cannot be initialised.
pub fn http_client(timeout: Duration, user_agent: &str) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
}

#[derive(Debug, Clone)]
/// Waste API client bound to one deployment's base URL.
pub struct RegioItClient {
    client: Client,
    base_url: String,
}

impl RegioItClient {
    /// Create a client for an arbitrary base URL, e.g. a test server.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { client, base_url }
    }

    /// Create a client for a registered municipality.
    #[must_use]
    pub fn for_municipality(client: Client, municipality: Municipality) -> Self {
        Self::new(client, municipality.base_url())
    }

    /// Base URL all endpoint paths are appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one GET and return the body text undecoded.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] on network failure or a non-2xx status.
    pub async fn raw(&self, endpoint: &Endpoint) -> Result<String, AbfallError> {
        let transport = |source| AbfallError::Transport {
            endpoint: endpoint.to_string(),
            source,
        };

        debug!(%endpoint, base_url = %self.base_url, "requesting");

        let mut request = self
            .client
            .get(format!("{}{}", self.base_url, endpoint.path()));
        let query = endpoint.query();
        if !query.is_empty() {
            request = request.query(&query);
        }

        request
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(transport)?
            .text()
            .await
            .map_err(transport)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T, AbfallError> {
        let body = self.raw(&endpoint).await?;
        serde_json::from_str(&body).map_err(|source| AbfallError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    /// All waste fractions of the deployment.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    pub async fn list_fractions(&self) -> Result<Vec<Fraction>, AbfallError> {
        self.fetch_json(Endpoint::Fractions).await
    }

    /// All localities served by the deployment.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    pub async fn list_localities(&self) -> Result<Vec<Locality>, AbfallError> {
        self.fetch_json(Endpoint::Localities).await
    }

    /// All streets of a locality.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    pub async fn list_streets(&self, locality_id: i64) -> Result<Vec<Street>, AbfallError> {
        self.fetch_json(Endpoint::Streets { locality_id }).await
    }

    /// Streets of a locality filtered server-side by a free-text query.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    pub async fn find_streets_by_name(
        &self,
        locality_id: i64,
        query: &str,
    ) -> Result<Vec<Street>, AbfallError> {
        self.fetch_json(Endpoint::StreetsByName {
            locality_id,
            query: query.to_owned(),
        })
        .await
    }

    /// Collection districts a street belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    pub async fn list_districts(&self, street_id: i64) -> Result<Vec<District>, AbfallError> {
        self.fetch_json(Endpoint::Districts { street_id }).await
    }

    /// Collection events scheduled for a street.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    pub async fn list_collection_events(
        &self,
        street_id: i64,
    ) -> Result<Vec<CollectionEvent>, AbfallError> {
        self.fetch_json(Endpoint::CollectionEvents { street_id }).await
    }

    /// Hazardous substance categories.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    pub async fn list_categories(&self) -> Result<Value, AbfallError> {
        self.fetch_json(Endpoint::Categories).await
    }

    /// Hazardous substances and how to dispose of them.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    pub async fn list_substances(&self) -> Result<Value, AbfallError> {
        self.fetch_json(Endpoint::Substances).await
    }

    /// Recycling centres and other drop-off points.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    pub async fn list_collection_points(&self) -> Result<Value, AbfallError> {
        self.fetch_json(Endpoint::CollectionPoints).await
    }

    /// One drop-off point.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    pub async fn get_collection_point(&self, point_id: i64) -> Result<Value, AbfallError> {
        self.fetch_json(Endpoint::CollectionPoint { point_id }).await
    }

    /// Kinds of drop-off points.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    pub async fn list_collection_point_types(&self) -> Result<Value, AbfallError> {
        self.fetch_json(Endpoint::CollectionPointTypes).await
    }

    /// Mobile hazardous waste collection dates at a drop-off point.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    pub async fn list_hazardous_waste_dates(&self, point_id: i64) -> Result<Value, AbfallError> {
        self.fetch_json(Endpoint::HazardousWasteDates { point_id })
            .await
    }

    /// News texts for a locality.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    pub async fn get_news(&self, locality_id: i64) -> Result<Value, AbfallError> {
        self.fetch_json(Endpoint::News { locality_id }).await
    }

    /// Legal notice for a locality.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    pub async fn get_impressum(&self, locality_id: i64) -> Result<Value, AbfallError> {
        self.fetch_json(Endpoint::Impressum { locality_id }).await
    }

    /// Fee information for a locality.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    pub async fn get_pricing(&self, locality_id: i64) -> Result<Value, AbfallError> {
        self.fetch_json(Endpoint::Pricing { locality_id }).await
    }

    /// Service texts for a locality.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    pub async fn get_services(&self, locality_id: i64) -> Result<Value, AbfallError> {
        self.fetch_json(Endpoint::Services { locality_id }).await
    }

    /// The latest `count` push notifications for a locality.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    pub async fn get_push_notifications(
        &self,
        locality_id: i64,
        count: u32,
    ) -> Result<Value, AbfallError> {
        self.fetch_json(Endpoint::PushNotifications { locality_id, count })
            .await
    }

    /// App metadata of the deployment.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    pub async fn get_app_metadata(&self) -> Result<Value, AbfallError> {
        self.fetch_json(Endpoint::AppMetadata).await
    }

    /// When the deployment last imported schedule data.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    pub async fn get_last_import_timestamp(&self) -> Result<Value, AbfallError> {
        self.fetch_json(Endpoint::LastImport).await
    }

    /// Menu entries of the mobile app.
    ///
    /// # Errors
    ///
    /// Returns [`AbfallError::Transport`] or [`AbfallError::Decode`].
    pub async fn get_menu_items(&self) -> Result<Value, AbfallError> {
        self.fetch_json(Endpoint::MenuItems).await
    }
}

#[async_trait]
impl WasteApi for RegioItClient {
    async fn fractions(&self) -> Result<Vec<Fraction>, AbfallError> {
        self.list_fractions().await
    }

    async fn localities(&self) -> Result<Vec<Locality>, AbfallError> {
        self.list_localities().await
    }

    async fn streets(&self, locality_id: i64) -> Result<Vec<Street>, AbfallError> {
        self.list_streets(locality_id).await
    }

    async fn collection_events(
        &self,
        street_id: i64,
    ) -> Result<Vec<CollectionEvent>, AbfallError> {
        self.list_collection_events(street_id).await
    }
}
