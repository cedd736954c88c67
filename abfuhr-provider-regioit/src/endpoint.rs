//! REST endpoints exposed by every RegioIT deployment.

use std::fmt;

/// Default number of push notifications requested.
pub const DEFAULT_NOTIFICATION_COUNT: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
/// One GET endpoint, relative to a deployment's base URL.
pub enum Endpoint {
    /// `/rest/fraktionen`
    Fractions,
    /// `/rest/orte`
    Localities,
    /// `/rest/orte/{id}/strassen`
    Streets {
        /// Locality id.
        locality_id: i64,
    },
    /// `/rest/orte/{id}/strassen?q={query}`
    StreetsByName {
        /// Locality id.
        locality_id: i64,
        /// Free-text street name filter.
        query: String,
    },
    /// `/rest/strassen/{id}/bezirke`
    Districts {
        /// Street id.
        street_id: i64,
    },
    /// `/rest/strassen/{id}/termine`
    CollectionEvents {
        /// Street id.
        street_id: i64,
    },
    /// `/rest/kategorien`
    Categories,
    /// `/rest/stoffe`
    Substances,
    /// `/rest/standorte`
    CollectionPoints,
    /// `/rest/standorte/{id}`
    CollectionPoint {
        /// Collection point id.
        point_id: i64,
    },
    /// `/rest/standorte/standortarten`
    CollectionPointTypes,
    /// `/rest/standorte/{id}/mobiltermine`
    HazardousWasteDates {
        /// Collection point id.
        point_id: i64,
    },
    /// `/rest/texte/aktuelles?ort={id}`
    News {
        /// Locality id.
        locality_id: i64,
    },
    /// `/rest/texte/ort/{id}/impressum`
    Impressum {
        /// Locality id.
        locality_id: i64,
    },
    /// `/rest/texte/ort/{id}/preise`
    Pricing {
        /// Locality id.
        locality_id: i64,
    },
    /// `/rest/texte/ort/{id}/service`
    Services {
        /// Locality id.
        locality_id: i64,
    },
    /// `/rest/pushnotifications/{id}?count={count}`
    PushNotifications {
        /// Locality id.
        locality_id: i64,
        /// Maximum number of notifications.
        count: u32,
    },
    /// `/rest/appdata`
    AppMetadata,
    /// `/rest/appdata/lastimport`
    LastImport,
    /// `/rest/menue`
    MenuItems,
}

impl Endpoint {
    /// Path below the base URL, without the query string.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Fractions => "/rest/fraktionen".to_owned(),
            Self::Localities => "/rest/orte".to_owned(),
            Self::Streets { locality_id } | Self::StreetsByName { locality_id, .. } => {
                format!("/rest/orte/{locality_id}/strassen")
            }
            Self::Districts { street_id } => format!("/rest/strassen/{street_id}/bezirke"),
            Self::CollectionEvents { street_id } => format!("/rest/strassen/{street_id}/termine"),
            Self::Categories => "/rest/kategorien".to_owned(),
            Self::Substances => "/rest/stoffe".to_owned(),
            Self::CollectionPoints => "/rest/standorte".to_owned(),
            Self::CollectionPoint { point_id } => format!("/rest/standorte/{point_id}"),
            Self::CollectionPointTypes => "/rest/standorte/standortarten".to_owned(),
            Self::HazardousWasteDates { point_id } => {
                format!("/rest/standorte/{point_id}/mobiltermine")
            }
            Self::News { .. } => "/rest/texte/aktuelles".to_owned(),
            Self::Impressum { locality_id } => format!("/rest/texte/ort/{locality_id}/impressum"),
            Self::Pricing { locality_id } => format!("/rest/texte/ort/{locality_id}/preise"),
            Self::Services { locality_id } => format!("/rest/texte/ort/{locality_id}/service"),
            Self::PushNotifications { locality_id, .. } => {
                format!("/rest/pushnotifications/{locality_id}")
            }
            Self::AppMetadata => "/rest/appdata".to_owned(),
            Self::LastImport => "/rest/appdata/lastimport".to_owned(),
            Self::MenuItems => "/rest/menue".to_owned(),
        }
    }

    /// Query parameters, unencoded.
    #[must_use]
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::StreetsByName { query, .. } => vec![("q", query.clone())],
            Self::News { locality_id } => vec![("ort", locality_id.to_string())],
            Self::PushNotifications { count, .. } => vec![("count", count.to_string())],
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.path())?;
        for (index, (key, value)) in self.query().iter().enumerate() {
            let separator = if index == 0 { '?' } else { '&' };
            write!(formatter, "{separator}{key}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_the_rest_surface() {
        let cases = [
            (Endpoint::Fractions, "/rest/fraktionen"),
            (Endpoint::Localities, "/rest/orte"),
            (Endpoint::Streets { locality_id: 7 }, "/rest/orte/7/strassen"),
            (
                Endpoint::StreetsByName {
                    locality_id: 7,
                    query: "Haupt".to_owned(),
                },
                "/rest/orte/7/strassen?q=Haupt",
            ),
            (Endpoint::Districts { street_id: 3 }, "/rest/strassen/3/bezirke"),
            (Endpoint::CollectionEvents { street_id: 3 }, "/rest/strassen/3/termine"),
            (Endpoint::Categories, "/rest/kategorien"),
            (Endpoint::Substances, "/rest/stoffe"),
            (Endpoint::CollectionPoints, "/rest/standorte"),
            (Endpoint::CollectionPoint { point_id: 9 }, "/rest/standorte/9"),
            (Endpoint::CollectionPointTypes, "/rest/standorte/standortarten"),
            (
                Endpoint::HazardousWasteDates { point_id: 9 },
                "/rest/standorte/9/mobiltermine",
            ),
            (Endpoint::News { locality_id: 7 }, "/rest/texte/aktuelles?ort=7"),
            (
                Endpoint::Impressum { locality_id: 7 },
                "/rest/texte/ort/7/impressum",
            ),
            (Endpoint::Pricing { locality_id: 7 }, "/rest/texte/ort/7/preise"),
            (Endpoint::Services { locality_id: 7 }, "/rest/texte/ort/7/service"),
            (
                Endpoint::PushNotifications {
                    locality_id: 7,
                    count: DEFAULT_NOTIFICATION_COUNT,
                },
                "/rest/pushnotifications/7?count=10",
            ),
            (Endpoint::AppMetadata, "/rest/appdata"),
            (Endpoint::LastImport, "/rest/appdata/lastimport"),
            (Endpoint::MenuItems, "/rest/menue"),
        ];

        for (endpoint, expected) in cases {
            assert_eq!(endpoint.to_string(), expected);
        }
    }
}
