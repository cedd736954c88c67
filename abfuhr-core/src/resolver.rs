//! Turns a locality and street reference into a date-keyed collection schedule.
//!
//! One call to [`build_schedule`] is one linear pipeline: fractions, locality,
//! street, events, grouping. Any failing step aborts the whole pipeline.

use std::collections::{BTreeMap, HashMap};

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::model::{CollectionEvent, Fraction, Locality, Selector, Street};
use crate::ports::{AbfallError, WasteApi};
use crate::transform::ValueTransform;

/// Format of date keys in the published attributes.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Format of the "last refreshed" timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Localizable strings placed into the published state.
pub struct Labels {
    /// Headline value when nothing is collected tomorrow.
    pub none: String,
    /// Attribute key holding the refresh timestamp.
    pub last_refreshed: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            none: "None".to_owned(),
            last_refreshed: "last refreshed".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Output of one successful cycle: a headline value and its attribute set.
pub struct SensorState {
    /// Collection scheduled for tomorrow, after the value transform.
    pub value: String,
    /// Date keys mapped to comma-joined fraction names, plus the refresh timestamp.
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Grouped collection dates for one street.
pub struct Schedule {
    /// Comma-joined fraction names per date, in upstream event order.
    pub by_date: BTreeMap<NaiveDate, String>,
    /// Local time the schedule was built.
    pub refreshed_at: NaiveDateTime,
}

impl Schedule {
    /// Categories collected on the day after [`Schedule::refreshed_at`].
    #[must_use]
    pub fn tomorrow(&self) -> Option<&str> {
        self.refreshed_at
            .date()
            .checked_add_days(Days::new(1))
            .and_then(|date| self.by_date.get(&date))
            .map(String::as_str)
    }

    /// Finalize into the state published to the host.
    #[must_use]
    pub fn into_state(self, labels: &Labels, transform: Option<&dyn ValueTransform>) -> SensorState {
        let raw = self.tomorrow().unwrap_or(labels.none.as_str()).to_owned();
        let value = match transform {
            Some(transform) => transform.apply(&raw),
            None => raw,
        };

        let mut attributes: BTreeMap<String, String> = self
            .by_date
            .into_iter()
            .map(|(date, categories)| (date.format(DATE_FORMAT).to_string(), categories))
            .collect();
        attributes.insert(
            labels.last_refreshed.clone(),
            self.refreshed_at.format(TIMESTAMP_FORMAT).to_string(),
        );

        SensorState { value, attributes }
    }
}

/// Collapse every run of whitespace into a single space and trim the ends.
#[must_use]
pub fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn matches_by_name<T>(candidates: Vec<T>, query: &str, name: impl Fn(&T) -> &str) -> Vec<T> {
    candidates
        .into_iter()
        .filter(|candidate| normalize_whitespace(name(candidate)) == query)
        .collect()
}

/// Pick the one locality whose normalized name equals the normalized query.
///
/// # Errors
///
/// Returns [`AbfallError::LocalityNotFound`] for zero matches and
/// [`AbfallError::AmbiguousLocality`] for more than one.
pub fn resolve_locality(localities: Vec<Locality>, query: &str) -> Result<i64, AbfallError> {
    let query = normalize_whitespace(query);
    let mut matches = matches_by_name(localities, &query, |locality| locality.name.as_str());
    match matches.len() {
        0 => Err(AbfallError::LocalityNotFound(query)),
        1 => Ok(matches.remove(0).id),
        _ => Err(AbfallError::AmbiguousLocality { query, matches }),
    }
}

/// Pick the one street whose normalized name equals the normalized query.
///
/// # Errors
///
/// Returns [`AbfallError::StreetNotFound`] for zero matches and
/// [`AbfallError::AmbiguousStreet`] for more than one.
pub fn resolve_street(streets: Vec<Street>, query: &str) -> Result<i64, AbfallError> {
    let query = normalize_whitespace(query);
    let mut matches = matches_by_name(streets, &query, |street| street.name.as_str());
    match matches.len() {
        0 => Err(AbfallError::StreetNotFound(query)),
        1 => Ok(matches.remove(0).id),
        _ => Err(AbfallError::AmbiguousStreet { query, matches }),
    }
}

/// Build the id to name lookup table for fractions.
#[must_use]
pub fn fraction_names(fractions: Vec<Fraction>) -> HashMap<i64, String> {
    fractions
        .into_iter()
        .map(|fraction| (fraction.id, fraction.name))
        .collect()
}

/// Group events by date, joining fraction names with `", "` in event order.
///
/// Categories are neither sorted nor deduplicated.
#[must_use]
pub fn group_by_date(
    events: &[CollectionEvent],
    fractions: &HashMap<i64, String>,
) -> BTreeMap<NaiveDate, String> {
    let mut grouped = BTreeMap::<NaiveDate, String>::new();
    for event in events {
        let fraction_id = event.district.fraction_id;
        let name = if let Some(name) = fractions.get(&fraction_id) {
            name.clone()
        } else {
            warn!(fraction_id, date = %event.date, "event references an unknown fraction");
            format!("Fraction {fraction_id}")
        };

        grouped
            .entry(event.date)
            .and_modify(|categories| {
                categories.push_str(", ");
                categories.push_str(&name);
            })
            .or_insert(name);
    }
    grouped
}

/// Run the full lookup chain for one street and group its collection dates.
///
/// Name selectors are resolved against the upstream lists; id selectors skip
/// the corresponding request.
///
/// # Errors
///
/// - [`AbfallError::FractionLookupFailed`] when the fraction table cannot be loaded.
/// - [`AbfallError::Transport`] or [`AbfallError::Decode`] while listing localities or streets.
/// - [`AbfallError::LocalityNotFound`], [`AbfallError::AmbiguousLocality`],
///   [`AbfallError::StreetNotFound`], or [`AbfallError::AmbiguousStreet`] on name mismatches.
/// - [`AbfallError::EventLookupFailed`] when the events cannot be loaded.
pub async fn build_schedule(
    api: &dyn WasteApi,
    locality: &Selector,
    street: &Selector,
    now: NaiveDateTime,
) -> Result<Schedule, AbfallError> {
    let fractions = api
        .fractions()
        .await
        .map_err(|err| AbfallError::FractionLookupFailed(Box::new(err)))?;
    let fractions = fraction_names(fractions);
    debug!(count = fractions.len(), "loaded fractions");

    let locality_id = match locality {
        Selector::Id(id) => *id,
        Selector::Name(name) => {
            let id = resolve_locality(api.localities().await?, name)?;
            info!(locality = %name, locality_id = id, "resolved locality");
            id
        }
    };

    let street_id = match street {
        Selector::Id(id) => *id,
        Selector::Name(name) => {
            let id = resolve_street(api.streets(locality_id).await?, name)?;
            info!(street = %name, street_id = id, "resolved street");
            id
        }
    };

    let events = api
        .collection_events(street_id)
        .await
        .map_err(|err| AbfallError::EventLookupFailed(Box::new(err)))?;
    debug!(count = events.len(), street_id, "loaded collection events");

    Ok(Schedule {
        by_date: group_by_date(&events, &fractions),
        refreshed_at: now,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::model::District;
    use crate::transform::Template;

    /// In-memory backend that records which lookups were made.
    #[derive(Default)]
    pub(crate) struct FakeApi {
        pub(crate) fractions: Vec<Fraction>,
        pub(crate) localities: Vec<Locality>,
        pub(crate) streets: Vec<Street>,
        pub(crate) events: Vec<CollectionEvent>,
        pub(crate) fail_on: Option<&'static str>,
        pub(crate) calls: Mutex<Vec<String>>,
    }

    impl FakeApi {
        fn record(&self, call: &'static str) -> Result<(), AbfallError> {
            self.calls.lock().expect("calls lock").push(call.to_owned());
            if self.fail_on == Some(call) {
                let source = reqwest::Client::new()
                    .get("not a url")
                    .build()
                    .expect_err("an invalid url must not build");
                return Err(AbfallError::Transport {
                    endpoint: call.to_owned(),
                    source,
                });
            }
            Ok(())
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait]
    impl WasteApi for FakeApi {
        async fn fractions(&self) -> Result<Vec<Fraction>, AbfallError> {
            self.record("fractions")?;
            Ok(self.fractions.clone())
        }

        async fn localities(&self) -> Result<Vec<Locality>, AbfallError> {
            self.record("localities")?;
            Ok(self.localities.clone())
        }

        async fn streets(&self, _locality_id: i64) -> Result<Vec<Street>, AbfallError> {
            self.record("streets")?;
            Ok(self.streets.clone())
        }

        async fn collection_events(
            &self,
            _street_id: i64,
        ) -> Result<Vec<CollectionEvent>, AbfallError> {
            self.record("events")?;
            Ok(self.events.clone())
        }
    }

    pub(crate) fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, DATE_FORMAT).expect("valid test date")
    }

    pub(crate) fn event(raw_date: &str, fraction_id: i64) -> CollectionEvent {
        CollectionEvent {
            date: date(raw_date),
            district: District {
                id: None,
                fraction_id,
            },
        }
    }

    pub(crate) fn locality(id: i64, name: &str) -> Locality {
        Locality {
            id,
            name: name.to_owned(),
        }
    }

    pub(crate) fn street(id: i64, name: &str) -> Street {
        Street {
            id,
            name: name.to_owned(),
            house_numbers: None,
        }
    }

    pub(crate) fn fraction(id: i64, name: &str) -> Fraction {
        Fraction {
            id,
            name: name.to_owned(),
        }
    }

    pub(crate) fn at(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).expect("valid test timestamp")
    }

    pub(crate) fn sample_api() -> FakeApi {
        FakeApi {
            fractions: vec![fraction(5, "Residual"), fraction(7, "Paper")],
            localities: vec![locality(1, "Bergisch  Gladbach"), locality(2, "Bensberg")],
            streets: vec![street(10, "Hauptstraße"), street(11, "Am   Markt")],
            events: vec![
                event("2024-01-02", 5),
                event("2024-01-02", 7),
                event("2024-01-01", 5),
            ],
            ..FakeApi::default()
        }
    }

    #[test]
    fn normalize_collapses_runs_and_is_idempotent() {
        assert_eq!(normalize_whitespace("Köln  Stadt"), "Köln Stadt");
        assert_eq!(normalize_whitespace(" \tKöln \n Stadt "), "Köln Stadt");
        for input in ["a  b", "  lead", "trail  ", "x\t\ty", ""] {
            let once = normalize_whitespace(input);
            assert_eq!(normalize_whitespace(&once), once);
        }
    }

    #[test]
    fn locality_resolution_requires_exactly_one_match() {
        let ambiguous = resolve_locality(vec![locality(1, "A"), locality(2, "A")], "A");
        assert!(
            matches!(ambiguous, Err(AbfallError::AmbiguousLocality { ref matches, .. }) if matches.len() == 2),
            "expected AmbiguousLocality, got {ambiguous:?}"
        );

        let missing = resolve_locality(vec![locality(1, "B")], "A");
        assert!(matches!(missing, Err(AbfallError::LocalityNotFound(ref name)) if name == "A"));

        assert_eq!(resolve_locality(vec![locality(1, "A")], "A").ok(), Some(1));
    }

    #[test]
    fn street_resolution_normalizes_both_sides() {
        let streets = vec![street(10, "Am   Markt"), street(11, "Am Marktplatz")];
        assert_eq!(resolve_street(streets.clone(), " Am Markt ").ok(), Some(10));
        assert!(matches!(
            resolve_street(streets, "Markt"),
            Err(AbfallError::StreetNotFound(_))
        ));
        assert!(matches!(
            resolve_street(vec![street(1, "X"), street(2, "X ")], "X"),
            Err(AbfallError::AmbiguousStreet { .. })
        ));
    }

    #[test]
    fn grouping_keeps_event_order_within_a_day() {
        let fractions = fraction_names(vec![fraction(5, "Residual"), fraction(7, "Paper")]);
        let events = [
            event("2024-01-02", 5),
            event("2024-01-02", 7),
            event("2024-01-01", 5),
        ];

        let grouped = group_by_date(&events, &fractions);

        let expected: Vec<(NaiveDate, &str)> = vec![
            (date("2024-01-01"), "Residual"),
            (date("2024-01-02"), "Residual, Paper"),
        ];
        let actual: Vec<(NaiveDate, &str)> = grouped
            .iter()
            .map(|(day, categories)| (*day, categories.as_str()))
            .collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn grouping_does_not_deduplicate_or_sort() {
        let fractions = fraction_names(vec![fraction(1, "Paper"), fraction(2, "Bio")]);
        let events = [
            event("2024-03-01", 1),
            event("2024-03-01", 2),
            event("2024-03-01", 1),
        ];
        let grouped = group_by_date(&events, &fractions);
        assert_eq!(
            grouped.get(&date("2024-03-01")).map(String::as_str),
            Some("Paper, Bio, Paper")
        );
    }

    #[test]
    fn grouping_labels_unknown_fractions() {
        let grouped = group_by_date(&[event("2024-03-01", 99)], &HashMap::new());
        assert_eq!(
            grouped.get(&date("2024-03-01")).map(String::as_str),
            Some("Fraction 99")
        );
    }

    #[test]
    fn missing_tomorrow_yields_none_label() {
        let schedule = Schedule {
            by_date: BTreeMap::from([(date("2024-01-05"), "Paper".to_owned())]),
            refreshed_at: at("2024-01-01 08:00:00"),
        };
        assert_eq!(schedule.tomorrow(), None);
        let state = schedule.into_state(&Labels::default(), None);
        assert_eq!(state.value, "None");
    }

    #[test]
    fn state_carries_dates_and_refresh_timestamp() {
        let schedule = Schedule {
            by_date: BTreeMap::from([
                (date("2024-01-02"), "Residual, Paper".to_owned()),
                (date("2024-01-01"), "Residual".to_owned()),
            ]),
            refreshed_at: at("2024-01-01 21:30:05"),
        };
        let template = Template::new("Tomorrow: {value}");

        let state = schedule.into_state(&Labels::default(), Some(&template));

        assert_eq!(state.value, "Tomorrow: Residual, Paper");
        let keys: Vec<&str> = state.attributes.keys().map(String::as_str).collect();
        assert_eq!(keys, ["2024-01-01", "2024-01-02", "last refreshed"]);
        assert_eq!(
            state.attributes.get("last refreshed").map(String::as_str),
            Some("2024-01-01 21:30:05")
        );
    }

    #[test]
    fn labels_are_localizable() {
        let labels = Labels {
            none: "Keine".to_owned(),
            last_refreshed: "Zuletzt aktualisiert".to_owned(),
        };
        let schedule = Schedule {
            by_date: BTreeMap::new(),
            refreshed_at: at("2024-01-01 00:00:00"),
        };
        let state = schedule.into_state(&labels, None);
        assert_eq!(state.value, "Keine");
        assert!(state.attributes.contains_key("Zuletzt aktualisiert"));
    }

    #[tokio::test]
    async fn names_are_resolved_before_events_are_fetched() {
        let api = sample_api();
        let schedule = build_schedule(
            &api,
            &Selector::Name("Bergisch Gladbach".to_owned()),
            &Selector::Name("Hauptstraße".to_owned()),
            at("2024-01-01 10:00:00"),
        )
        .await
        .expect("schedule should build");

        assert_eq!(api.calls(), ["fractions", "localities", "streets", "events"]);
        assert_eq!(schedule.tomorrow(), Some("Residual, Paper"));
        assert_eq!(schedule.by_date.len(), 2);
    }

    #[tokio::test]
    async fn id_selectors_skip_resolution() {
        let api = sample_api();
        build_schedule(
            &api,
            &Selector::Id(1),
            &Selector::Id(10),
            at("2024-01-01 10:00:00"),
        )
        .await
        .expect("schedule should build");

        assert_eq!(api.calls(), ["fractions", "events"]);
    }

    #[tokio::test]
    async fn failures_map_to_their_step() {
        let api = FakeApi {
            fail_on: Some("fractions"),
            ..sample_api()
        };
        let result = build_schedule(
            &api,
            &Selector::Id(1),
            &Selector::Id(10),
            at("2024-01-01 10:00:00"),
        )
        .await;
        assert!(matches!(result, Err(AbfallError::FractionLookupFailed(_))));
        assert_eq!(api.calls(), ["fractions"]);

        let api = FakeApi {
            fail_on: Some("events"),
            ..sample_api()
        };
        let result = build_schedule(
            &api,
            &Selector::Id(1),
            &Selector::Id(10),
            at("2024-01-01 10:00:00"),
        )
        .await;
        assert!(matches!(result, Err(AbfallError::EventLookupFailed(_))));

        let api = FakeApi {
            fail_on: Some("streets"),
            ..sample_api()
        };
        let result = build_schedule(
            &api,
            &Selector::Id(1),
            &Selector::Name("Hauptstraße".to_owned()),
            at("2024-01-01 10:00:00"),
        )
        .await;
        let err = result.expect_err("streets lookup fails");
        assert!(matches!(err, AbfallError::Transport { .. }));
        assert!(!err.is_configuration());
    }

    #[tokio::test]
    async fn ambiguous_street_aborts_before_events() {
        let api = FakeApi {
            streets: vec![street(10, "Hauptstraße"), street(12, "Hauptstraße ")],
            ..sample_api()
        };
        let err = build_schedule(
            &api,
            &Selector::Id(1),
            &Selector::Name("Hauptstraße".to_owned()),
            at("2024-01-01 10:00:00"),
        )
        .await
        .expect_err("two streets match");

        assert!(err.is_configuration());
        assert!(!api.calls().contains(&"events".to_owned()));
    }
}
