//! Domain data structures for localities, streets, districts, and collection events.
//!
//! Field names follow the RegioIT wire format through serde renames; any field
//! not modelled here is ignored on decode.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A town, city, or district served by a municipality's waste authority (`Ort`).
pub struct Locality {
    /// Upstream identifier.
    pub id: i64,
    /// Display name, possibly with irregular whitespace.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// House number entry inside a street's `hausNrList`.
pub struct HouseNumber {
    /// Upstream identifier.
    pub id: i64,
    /// House number including additions such as "A".
    #[serde(rename = "nr")]
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A street within a locality (`Strasse`).
pub struct Street {
    /// Upstream identifier.
    pub id: i64,
    /// Display name, possibly with irregular whitespace.
    pub name: String,
    /// House numbers, when the deployment splits the street by number.
    #[serde(rename = "hausNrList", default)]
    pub house_numbers: Option<Vec<HouseNumber>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Collection zone linking a street to the fraction collected there (`Bezirk`).
pub struct District {
    /// Upstream identifier. Nested district objects inside events may omit it.
    #[serde(default)]
    pub id: Option<i64>,
    /// Fraction collected in this district.
    #[serde(rename = "fraktionId")]
    pub fraction_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A scheduled pickup of one district's fraction on one date (`Termin`).
pub struct CollectionEvent {
    /// Pickup date, `YYYY-MM-DD` on the wire.
    #[serde(rename = "datum")]
    pub date: NaiveDate,
    /// District being served.
    #[serde(rename = "bezirk")]
    pub district: District,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Human-readable waste category (`Fraktion`).
pub struct Fraction {
    /// Upstream identifier referenced by [`District::fraction_id`].
    pub id: i64,
    /// Category name, e.g. "Papier" or "Restabfall".
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
/// Reference to a locality or street, either pre-resolved or by name.
pub enum Selector {
    /// Numeric upstream id; no lookup request is needed.
    Id(i64),
    /// Display name that must match exactly one upstream entry.
    Name(String),
}

impl Selector {
    /// Parse a command-line value: all ASCII digits is an id, anything else a name.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if !trimmed.is_empty()
            && trimmed.bytes().all(|byte| byte.is_ascii_digit())
            && let Ok(id) = trimmed.parse()
        {
            return Self::Id(id);
        }
        Self::Name(raw.to_owned())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(formatter, "#{id}"),
            Self::Name(name) => write!(formatter, "{name}"),
        }
    }
}
