use std::time::Instant;

use abfuhr_core::{
    Locality, Municipality, Selector, SensorConfig, Street, WasteSensor, normalize_whitespace,
};
use abfuhr_provider_regioit::RegioItClient;
use reqwest::Client;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    MunicipalitySelect,
    LocalitySelect,
    StreetSelect,
    SensorView,
}

impl Screen {
    /// Screens with a filter input swallow plain character keys.
    pub(crate) fn has_filter(self) -> bool {
        matches!(self, Self::LocalitySelect | Self::StreetSelect)
    }
}

pub(crate) struct App {
    pub http: Client,

    pub screen: Screen,
    pub municipality_index: usize,
    pub municipality: Option<Municipality>,

    pub localities: Vec<Locality>,
    pub selected_locality: Option<Locality>,
    pub streets: Vec<Street>,
    pub filter: String,
    pub list_index: usize,

    pub sensor: Option<WasteSensor<RegioItClient>>,
    pub last_update: Option<Instant>,

    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl App {
    /// Start at municipality selection.
    pub(crate) fn interactive(http: Client) -> Self {
        Self {
            http,
            screen: Screen::MunicipalitySelect,
            municipality_index: 0,
            municipality: None,
            localities: Vec::new(),
            selected_locality: None,
            streets: Vec::new(),
            filter: String::new(),
            list_index: 0,
            sensor: None,
            last_update: None,
            is_loading: false,
            error_message: None,
        }
    }

    /// Start directly on the sensor view for a configured street.
    pub(crate) fn configured(http: Client, config: SensorConfig) -> Self {
        let mut app = Self::interactive(http);
        app.municipality = Some(config.municipality);
        app.start_sensor(config);
        app
    }

    pub(crate) fn api(&self) -> Option<RegioItClient> {
        self.municipality
            .map(|municipality| RegioItClient::for_municipality(self.http.clone(), municipality))
    }

    pub(crate) fn visible_localities(&self) -> Vec<&Locality> {
        let needle = self.needle();
        self.localities
            .iter()
            .filter(|locality| matches_filter(&locality.name, &needle))
            .collect()
    }

    pub(crate) fn visible_streets(&self) -> Vec<&Street> {
        let needle = self.needle();
        self.streets
            .iter()
            .filter(|street| matches_filter(&street.name, &needle))
            .collect()
    }

    pub(crate) fn visible_len(&self) -> usize {
        match self.screen {
            Screen::MunicipalitySelect => Municipality::ALL.len(),
            Screen::LocalitySelect => self.visible_localities().len(),
            Screen::StreetSelect => self.visible_streets().len(),
            Screen::SensorView => 0,
        }
    }

    pub(crate) fn select_current_municipality(&mut self) -> bool {
        let Some(municipality) = Municipality::ALL.get(self.municipality_index).copied() else {
            return false;
        };
        self.municipality = Some(municipality);
        self.localities.clear();
        self.selected_locality = None;
        self.reset_list();
        self.screen = Screen::LocalitySelect;
        true
    }

    pub(crate) fn select_current_locality(&mut self) -> bool {
        let Some(locality) = self.visible_localities().get(self.list_index).copied().cloned()
        else {
            return false;
        };
        self.selected_locality = Some(locality);
        self.streets.clear();
        self.reset_list();
        self.screen = Screen::StreetSelect;
        true
    }

    /// Build a sensor for the highlighted street, referencing both by id.
    pub(crate) fn select_current_street(&mut self) -> Result<(), String> {
        let street = self
            .visible_streets()
            .get(self.list_index)
            .copied()
            .cloned()
            .ok_or_else(|| "No street selected".to_owned())?;
        let locality = self
            .selected_locality
            .clone()
            .ok_or_else(|| "Select a locality first".to_owned())?;
        let municipality = self
            .municipality
            .ok_or_else(|| "Select a municipality first".to_owned())?;

        let name = format!(
            "{} ({})",
            normalize_whitespace(&street.name),
            normalize_whitespace(&locality.name)
        );
        let config = SensorConfig::new(
            name,
            municipality,
            Selector::Id(locality.id),
            Selector::Id(street.id),
        )
        .map_err(|err| err.to_string())?;

        self.start_sensor(config);
        Ok(())
    }

    pub(crate) fn go_back(&mut self) {
        self.reset_list();
        self.screen = match self.screen {
            Screen::MunicipalitySelect | Screen::LocalitySelect => Screen::MunicipalitySelect,
            Screen::StreetSelect => Screen::LocalitySelect,
            Screen::SensorView if self.streets.is_empty() => Screen::MunicipalitySelect,
            Screen::SensorView => Screen::StreetSelect,
        };
    }

    /// Whether the configured scan interval has passed since the last cycle.
    pub(crate) fn update_due(&self) -> bool {
        let Some(sensor) = &self.sensor else {
            return false;
        };
        self.last_update
            .is_none_or(|last| last.elapsed() >= sensor.config().scan_interval)
    }

    fn start_sensor(&mut self, config: SensorConfig) {
        let api = RegioItClient::for_municipality(self.http.clone(), config.municipality);
        self.sensor = Some(WasteSensor::new(api, config));
        self.last_update = None;
        self.screen = Screen::SensorView;
    }

    fn reset_list(&mut self) {
        self.filter.clear();
        self.list_index = 0;
    }

    fn needle(&self) -> String {
        normalize_whitespace(&self.filter).to_lowercase()
    }
}

fn matches_filter(name: &str, needle: &str) -> bool {
    needle.is_empty() || normalize_whitespace(name).to_lowercase().contains(needle)
}
