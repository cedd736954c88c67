//! Terminal front end for abfuhr: pick a street or load a configured sensor and watch its schedule.

mod app;
mod input;
mod ui;

use std::{
    fs::File,
    io::{self, Write},
    path::PathBuf,
    sync::Mutex,
    time::{Duration as StdDuration, Instant},
};

use abfuhr_core::{Municipality, Selector, SensorConfig, WasteSensor};
use abfuhr_provider_regioit::{RegioItClient, http_client};
use anyhow::{Context, Result, bail};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::{App, Screen};
use crate::input::Action;

const INTERACTIVE_TIMEOUT: StdDuration = StdDuration::from_secs(30);
const INTERACTIVE_USER_AGENT: &str = concat!("abfuhr/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Parser)]
#[command(name = "abfuhr")]
#[command(about = "Waste collection schedules from RegioIT deployments")]
struct Cli {
    /// Sensor configuration file (TOML).
    #[arg(short, long, env = "ABFUHR_CONFIG")]
    config: Option<PathBuf>,

    /// Municipality key, e.g. "Bergisch Gladbach".
    #[arg(long)]
    municipality: Option<String>,

    /// Locality name, or its numeric id.
    #[arg(long)]
    locality: Option<String>,

    /// Street name, or its numeric id.
    #[arg(long)]
    street: Option<String>,

    /// Run a single update, print the state as JSON, and exit.
    #[arg(long)]
    once: bool,

    /// Write logs here while the terminal UI is running.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Merge the config file with command-line overrides; `None` means interactive.
    fn sensor_config(&self) -> Result<Option<SensorConfig>> {
        let mut config = match &self.config {
            Some(path) => SensorConfig::load(path)?,
            None => match (&self.municipality, &self.locality, &self.street) {
                (Some(municipality), Some(locality), Some(street)) => SensorConfig::new(
                    "abfuhr",
                    municipality.parse::<Municipality>()?,
                    Selector::parse(locality),
                    Selector::parse(street),
                )?,
                (None, None, None) => return Ok(None),
                _ => bail!("--municipality, --locality and --street must be given together"),
            },
        };

        if let Some(municipality) = &self.municipality {
            config.municipality = municipality.parse()?;
        }
        if let Some(locality) = &self.locality {
            config.locality = Selector::parse(locality);
        }
        if let Some(street) = &self.street {
            config.street = Selector::parse(street);
        }
        config.validate()?;
        Ok(Some(config))
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.sensor_config()?;

    if cli.once {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(io::stderr)
            .init();
        let config = config.context("--once needs --config or --municipality/--locality/--street")?;
        info!(sensor = %config.name, municipality = %config.municipality, "running a single update");
        return run_once(config).await;
    }

    if let Some(path) = &cli.log_file {
        let file = File::create(path)
            .with_context(|| format!("cannot create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    }

    info!(configured = config.is_some(), "starting terminal UI");
    let app = match config {
        Some(config) => App::configured(http_client(config.timeout, &config.user_agent)?, config),
        None => App::interactive(http_client(INTERACTIVE_TIMEOUT, INTERACTIVE_USER_AGENT)?),
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run(&mut terminal, app).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

async fn run_once(config: SensorConfig) -> Result<()> {
    let http = http_client(config.timeout, &config.user_agent)?;
    let api = RegioItClient::for_municipality(http, config.municipality);
    let mut sensor = WasteSensor::new(api, config);

    let state = sensor.update().await?.clone();
    let output = serde_json::json!({
        "name": sensor.name(),
        "state": state.value,
        "attributes": state.attributes,
    });

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &output)?;
    writeln!(stdout)?;
    Ok(())
}

async fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        if app.screen == Screen::SensorView && app.update_due() {
            refresh_sensor(terminal, &mut app).await?;
        }

        terminal.draw(|frame| ui::draw(frame, &app))?;

        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            let action = input::handle_key_event(key, &mut app);

            match action {
                Action::Quit => break,
                Action::None => {}
                Action::LoadLocalities => {
                    let Some(api) = app.api() else {
                        app.error_message = Some("Select a municipality first".into());
                        continue;
                    };

                    begin_loading(terminal, &mut app)?;
                    let res = api.list_localities().await;
                    app.is_loading = false;

                    match res {
                        Ok(localities) => app.localities = localities,
                        Err(err) => {
                            app.error_message = Some(format!("Loading localities failed: {err}"));
                        }
                    }
                }
                Action::LoadStreets => {
                    let (Some(api), Some(locality_id)) = (
                        app.api(),
                        app.selected_locality.as_ref().map(|locality| locality.id),
                    ) else {
                        app.error_message = Some("Select a locality first".into());
                        continue;
                    };

                    begin_loading(terminal, &mut app)?;
                    let res = api.list_streets(locality_id).await;
                    app.is_loading = false;

                    match res {
                        Ok(streets) => app.streets = streets,
                        Err(err) => {
                            app.error_message = Some(format!("Loading streets failed: {err}"));
                        }
                    }
                }
                Action::Refresh => refresh_sensor(terminal, &mut app).await?,
            }
        }
    }

    Ok(())
}

fn begin_loading(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    app.is_loading = true;
    app.error_message = None;
    terminal.draw(|frame| ui::draw(frame, app))?;
    Ok(())
}

async fn refresh_sensor(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    if app.sensor.is_none() {
        return Ok(());
    }
    begin_loading(terminal, app)?;

    let failure = match app.sensor.as_mut() {
        Some(sensor) => sensor.update().await.err(),
        None => None,
    };

    app.is_loading = false;
    app.last_update = Some(Instant::now());
    app.error_message = failure.map(|err| {
        if err.is_configuration() {
            format!("Update failed, check the configuration: {err}")
        } else {
            format!("Update failed, keeping previous data: {err}")
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_means_interactive() {
        let cli = Cli::try_parse_from(["abfuhr"]).expect("valid arguments");
        assert!(cli.sensor_config().expect("no config").is_none());
    }

    #[test]
    fn flags_build_a_config_with_id_detection() {
        let cli = Cli::try_parse_from([
            "abfuhr",
            "--municipality",
            "Lindlar",
            "--locality",
            "12",
            "--street",
            "Hauptstraße",
        ])
        .expect("valid arguments");

        let config = cli
            .sensor_config()
            .expect("flags are valid")
            .expect("config is present");
        assert_eq!(config.municipality, Municipality::Lindlar);
        assert_eq!(config.locality, Selector::Id(12));
        assert_eq!(config.street, Selector::Name("Hauptstraße".to_owned()));
    }

    #[test]
    fn partial_flags_are_rejected() {
        let cli = Cli::try_parse_from(["abfuhr", "--municipality", "Lindlar"])
            .expect("valid arguments");
        assert!(cli.sensor_config().is_err());
    }

    #[test]
    fn unknown_municipality_flag_is_rejected() {
        let cli = Cli::try_parse_from([
            "abfuhr",
            "--municipality",
            "Atlantis",
            "--locality",
            "1",
            "--street",
            "2",
        ])
        .expect("valid arguments");
        let err = cli.sensor_config().expect_err("Atlantis is unknown");
        assert!(err.to_string().contains("Atlantis"), "got: {err}");
    }
}
