//! The polled sensor: one configured street, one published state.

use chrono::{Local, NaiveDateTime};
use tracing::{Instrument, Span, error, info, info_span};

use crate::config::SensorConfig;
use crate::ports::{AbfallError, WasteApi};
use crate::resolver::{SensorState, build_schedule};
use crate::transform::ValueTransform;

/// Waste collection sensor bound to a backend and a validated configuration.
///
/// The published state stays unknown until the first successful cycle. A
/// failed cycle never clears or partially overwrites it.
pub struct WasteSensor<A> {
    api: A,
    config: SensorConfig,
    span: Span,
    state: Option<SensorState>,
}

impl<A: WasteApi> WasteSensor<A> {
    /// Create a sensor. No request is made until [`WasteSensor::update`].
    #[must_use]
    pub fn new(api: A, config: SensorConfig) -> Self {
        let span = info_span!(
            "sensor",
            sensor = %config.name,
            municipality = %config.municipality,
        );
        Self {
            api,
            config,
            span,
            state: None,
        }
    }

    /// Display label from the configuration.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The configuration the sensor was built with.
    #[must_use]
    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Last successfully published state, if any.
    #[must_use]
    pub fn state(&self) -> Option<&SensorState> {
        self.state.as_ref()
    }

    /// Headline value, if a cycle has succeeded.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.state.as_ref().map(|state| state.value.as_str())
    }

    /// Run one cycle against the current local time.
    ///
    /// # Errors
    ///
    /// Returns the [`AbfallError`] that aborted the cycle after logging it; the
    /// previously published state is left untouched.
    pub async fn update(&mut self) -> Result<&SensorState, AbfallError> {
        self.update_at(Local::now().naive_local()).await
    }

    /// Run one cycle as if the local time were `now`.
    ///
    /// # Errors
    ///
    /// As [`WasteSensor::update`].
    pub async fn update_at(&mut self, now: NaiveDateTime) -> Result<&SensorState, AbfallError> {
        let span = self.span.clone();
        let result = self.refresh(now).instrument(span.clone()).await;

        let _entered = span.enter();
        match result {
            Ok(state) => {
                info!(
                    value = %state.value,
                    dates = state.attributes.len().saturating_sub(1),
                    "sensor updated"
                );
                let published = self.state.insert(state);
                Ok(&*published)
            }
            Err(err) => {
                error!(
                    error = %err,
                    configuration = err.is_configuration(),
                    "update cycle failed, keeping previous state"
                );
                Err(err)
            }
        }
    }

    async fn refresh(&self, now: NaiveDateTime) -> Result<SensorState, AbfallError> {
        let schedule =
            build_schedule(&self.api, &self.config.locality, &self.config.street, now).await?;
        let transform = self
            .config
            .value_template
            .as_ref()
            .map(|template| -> &dyn ValueTransform { template });
        Ok(schedule.into_state(&self.config.labels, transform))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Selector;
    use crate::registry::Municipality;
    use crate::resolver::tests::{FakeApi, at, sample_api};
    use crate::transform::Template;

    fn config() -> SensorConfig {
        SensorConfig::new(
            "Abfall",
            Municipality::BergischGladbach,
            Selector::Name("Bergisch Gladbach".to_owned()),
            Selector::Name("Hauptstraße".to_owned()),
        )
        .expect("valid config")
    }

    #[test]
    fn state_is_unknown_until_first_success() {
        let sensor = WasteSensor::new(sample_api(), config());
        assert!(sensor.state().is_none());
        assert_eq!(sensor.value(), None);
        assert!(sensor.api.calls().is_empty());
    }

    #[tokio::test]
    async fn successful_cycle_publishes_headline_and_attributes() {
        let mut sensor = WasteSensor::new(sample_api(), config());

        let state = sensor
            .update_at(at("2024-01-01 18:00:00"))
            .await
            .expect("cycle succeeds")
            .clone();

        assert_eq!(state.value, "Residual, Paper");
        assert_eq!(
            state.attributes.get("2024-01-01").map(String::as_str),
            Some("Residual")
        );
        assert_eq!(
            state.attributes.get("last refreshed").map(String::as_str),
            Some("2024-01-01 18:00:00")
        );
        assert_eq!(sensor.value(), Some("Residual, Paper"));
    }

    #[tokio::test]
    async fn failed_cycle_keeps_previous_state() {
        let mut sensor = WasteSensor::new(sample_api(), config());
        sensor
            .update_at(at("2024-01-01 18:00:00"))
            .await
            .expect("first cycle succeeds");
        let published = sensor.state().cloned();

        for step in ["fractions", "localities", "streets", "events"] {
            sensor.api = FakeApi {
                fail_on: Some(step),
                ..sample_api()
            };
            let err = sensor
                .update_at(at("2024-01-02 18:00:00"))
                .await
                .expect_err("cycle fails");
            assert!(!err.is_configuration(), "{step} failure is transient");
            assert_eq!(sensor.state().cloned(), published, "{step} failure overwrote state");
        }
    }

    #[tokio::test]
    async fn configuration_errors_are_distinguishable() {
        let mut config = config();
        config.street = Selector::Name("Nirgendwo".to_owned());
        let mut sensor = WasteSensor::new(sample_api(), config);

        let err = sensor
            .update_at(at("2024-01-01 18:00:00"))
            .await
            .expect_err("street does not exist");

        assert!(matches!(err, AbfallError::StreetNotFound(ref name) if name == "Nirgendwo"));
        assert!(err.is_configuration());
        assert!(sensor.state().is_none());
    }

    #[tokio::test]
    async fn template_is_applied_to_the_none_placeholder_too() {
        let mut config = config();
        config.value_template = Some(Template::new("Tomorrow: {value}"));
        let mut sensor = WasteSensor::new(sample_api(), config);

        let state = sensor
            .update_at(at("2024-01-05 07:00:00"))
            .await
            .expect("cycle succeeds");

        assert_eq!(state.value, "Tomorrow: None");
    }

    #[tokio::test]
    async fn each_cycle_rebuilds_from_scratch() {
        let mut sensor = WasteSensor::new(sample_api(), config());
        sensor
            .update_at(at("2024-01-01 18:00:00"))
            .await
            .expect("first cycle");

        sensor.api = FakeApi {
            events: Vec::new(),
            ..sample_api()
        };
        let state = sensor
            .update_at(at("2024-01-01 19:00:00"))
            .await
            .expect("second cycle");

        let keys: Vec<&str> = state.attributes.keys().map(String::as_str).collect();
        assert_eq!(keys, ["last refreshed"]);
        assert_eq!(state.value, "None");
    }
}
