use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Screen};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    None,
    Quit,
    /// Fetch localities for the selected municipality
    LoadLocalities,
    /// Fetch streets for the selected locality
    LoadStreets,
    /// Run a sensor update cycle now
    Refresh,
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Backspace, Char, Down, Enter, Esc, Left, Up};

    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }
    if key.code == Char('q') && key.modifiers.is_empty() && !app.screen.has_filter() {
        return Action::Quit;
    }

    let mut action = Action::None;

    match key.code {
        Up if app.screen != Screen::SensorView => move_selection(app, -1),
        Down if app.screen != Screen::SensorView => move_selection(app, 1),
        Esc | Left => app.go_back(),
        _ => {}
    }

    match app.screen {
        Screen::MunicipalitySelect => match key.code {
            Char('k') => move_selection(app, -1),
            Char('j') => move_selection(app, 1),
            Enter | Char(' ') => {
                if app.select_current_municipality() {
                    action = Action::LoadLocalities;
                }
            }
            _ => {}
        },

        Screen::LocalitySelect => match key.code {
            Char(character) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                app.filter.push(character);
                app.list_index = 0;
            }
            Backspace => {
                app.filter.pop();
                app.list_index = 0;
            }
            Enter => {
                if app.select_current_locality() {
                    action = Action::LoadStreets;
                } else {
                    app.error_message = Some("No locality matches the filter".into());
                }
            }
            _ => {}
        },

        Screen::StreetSelect => match key.code {
            Char(character) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                app.filter.push(character);
                app.list_index = 0;
            }
            Backspace => {
                app.filter.pop();
                app.list_index = 0;
            }
            Enter => match app.select_current_street() {
                Ok(()) => action = Action::Refresh,
                Err(message) => app.error_message = Some(message),
            },
            _ => {}
        },

        Screen::SensorView => {
            if key.code == Char('r') {
                action = Action::Refresh;
            }
        }
    }
    action
}

fn move_selection(app: &mut App, delta: isize) {
    let len = app.visible_len();
    let index = match app.screen {
        Screen::MunicipalitySelect => &mut app.municipality_index,
        _ => &mut app.list_index,
    };
    if len == 0 {
        *index = 0;
    } else if delta < 0 {
        *index = index.saturating_sub(1);
    } else if *index + 1 < len {
        *index += 1;
    }
}
