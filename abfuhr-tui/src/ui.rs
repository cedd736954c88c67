use abfuhr_core::{DATE_FORMAT, Municipality, normalize_whitespace};
use chrono::{Days, Local, NaiveDate};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
};

use crate::app::{App, Screen};

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    let header = Paragraph::new("abfuhr – waste collection sensor")
        .block(Block::default().borders(Borders::ALL).title("Abfuhr"));
    frame.render_widget(header, *header_area);

    match app.screen {
        Screen::MunicipalitySelect => draw_municipality_select(frame, app, *content_area),
        Screen::LocalitySelect => draw_locality_select(frame, app, *content_area),
        Screen::StreetSelect => draw_street_select(frame, app, *content_area),
        Screen::SensorView => draw_sensor_view(frame, app, *content_area),
    }

    let nav_hint = match app.screen {
        Screen::MunicipalitySelect => "↑/↓ move · Enter/Space select · q/Ctrl-C quit",
        Screen::LocalitySelect | Screen::StreetSelect => {
            "Type to filter · ↑/↓ move · Enter select · Left/Esc back · Ctrl-C quit"
        }
        Screen::SensorView => "r refresh · Esc/← back · q/Ctrl-C quit",
    };

    let status_text = if app.is_loading {
        format!("Loading… · {nav_hint}")
    } else if let Some(msg) = &app.error_message {
        format!("{msg} · {nav_hint}")
    } else {
        nav_hint.to_owned()
    };

    let status_style = if app.error_message.is_some() {
        Style::default().fg(Color::Red)
    } else if app.is_loading {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn highlight() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

fn draw_list(
    frame: &mut Frame<'_>,
    area: Rect,
    title: String,
    items: Vec<ListItem<'_>>,
    selected: usize,
) {
    let mut state = ListState::default();
    if !items.is_empty() {
        state.select(Some(selected));
    }
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(highlight())
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_municipality_select(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let items = Municipality::ALL
        .iter()
        .map(|municipality| ListItem::new(municipality.key()))
        .collect::<Vec<ListItem<'_>>>();

    draw_list(
        frame,
        area,
        "Select municipality (↑/↓, Enter)".to_owned(),
        items,
        app.municipality_index,
    );
}

/// Filter input on top, list below; returns the list area.
fn draw_filter(frame: &mut Frame<'_>, app: &App, area: Rect, label: &str) -> Option<Rect> {
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [input_area, list_area] = chunks else {
        return None;
    };

    let input = Paragraph::new(app.filter.as_str())
        .block(Block::default().borders(Borders::ALL).title(label.to_owned()))
        .wrap(Wrap { trim: true });
    frame.render_widget(input, *input_area);
    Some(*list_area)
}

fn draw_locality_select(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let municipality = app
        .municipality
        .map_or("<municipality>", Municipality::key);
    let Some(list_area) = draw_filter(frame, app, area, &format!("Filter localities in {municipality}"))
    else {
        return;
    };

    let items = app
        .visible_localities()
        .into_iter()
        .map(|locality| {
            ListItem::new(format!(
                "{} (#{})",
                normalize_whitespace(&locality.name),
                locality.id
            ))
        })
        .collect::<Vec<ListItem<'_>>>();

    let title = format!("Localities ({} shown)", items.len());
    draw_list(frame, list_area, title, items, app.list_index);
}

fn draw_street_select(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let locality = app
        .selected_locality
        .as_ref()
        .map_or_else(|| "<locality>".to_owned(), |locality| normalize_whitespace(&locality.name));
    let Some(list_area) = draw_filter(frame, app, area, &format!("Filter streets in {locality}"))
    else {
        return;
    };

    let items = app
        .visible_streets()
        .into_iter()
        .map(|street| {
            let name = normalize_whitespace(&street.name);
            let numbers = street
                .house_numbers
                .as_deref()
                .filter(|numbers| !numbers.is_empty())
                .map(|numbers| {
                    numbers
                        .iter()
                        .map(|house_number| house_number.number.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                });
            match numbers {
                Some(numbers) => ListItem::new(format!("{name} (#{}) · Nr. {numbers}", street.id)),
                None => ListItem::new(format!("{name} (#{})", street.id)),
            }
        })
        .collect::<Vec<ListItem<'_>>>();

    let title = format!("Streets ({} shown)", items.len());
    draw_list(frame, list_area, title, items, app.list_index);
}

fn draw_sensor_view(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(sensor) = &app.sensor else {
        let paragraph = Paragraph::new("No sensor configured.")
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
        return;
    };

    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);
    let chunks = layout_chunks.as_ref();
    let [headline_area, table_area] = chunks else {
        return;
    };

    let labels = &sensor.config().labels;
    let headline = sensor.value().unwrap_or("unknown");
    let refreshed = sensor
        .state()
        .and_then(|state| state.attributes.get(&labels.last_refreshed))
        .map_or_else(|| "never".to_owned(), Clone::clone);

    let headline_widget = Paragraph::new(headline.to_owned())
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title(format!(
            "{} · tomorrow · {}: {refreshed}",
            sensor.name(),
            labels.last_refreshed
        )));
    frame.render_widget(headline_widget, *headline_area);

    let today = Local::now().date_naive();
    let tomorrow = today.checked_add_days(Days::new(1));

    let rows = sensor
        .state()
        .into_iter()
        .flat_map(|state| state.attributes.iter())
        .filter_map(|(key, categories)| {
            NaiveDate::parse_from_str(key, DATE_FORMAT)
                .ok()
                .map(|date| (date, categories))
        })
        .filter(|(date, _)| *date >= today)
        .map(|(date, categories)| {
            let mut style = Style::default().fg(category_color(categories));
            if Some(date) == tomorrow {
                style = style.add_modifier(Modifier::BOLD);
            }
            Row::new(vec![
                Cell::from(date.format("%d.%m.%Y").to_string()),
                Cell::from(date.format("%a").to_string()),
                Cell::from(relative_day_label(date, today)),
                Cell::from(categories.clone()),
            ])
            .style(style)
        })
        .collect::<Vec<Row<'_>>>();

    if rows.is_empty() {
        let paragraph = Paragraph::new("No upcoming collections.")
            .block(Block::default().borders(Borders::ALL).title("Schedule"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, *table_area);
        return;
    }

    let column_widths = [
        Constraint::Length(12),
        Constraint::Length(5),
        Constraint::Length(12),
        Constraint::Min(20),
    ];

    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["Date", "Day", "In", "Collection"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title("Schedule"))
        .column_spacing(1);

    frame.render_widget(table, *table_area);
}

/// Color of the first category on a day, guessed from its German name.
fn category_color(categories: &str) -> Color {
    let first = categories
        .split(", ")
        .next()
        .unwrap_or_default()
        .to_lowercase();

    if first.contains("rest") {
        Color::Gray
    } else if first.contains("bio") {
        Color::Green
    } else if first.contains("papier") || first.contains("pappe") {
        Color::Blue
    } else if first.contains("gelb") || first.contains("wertstoff") || first.contains("verpackung") {
        Color::Yellow
    } else if first.contains("glas") {
        Color::Cyan
    } else if first.contains("schadstoff") {
        Color::Red
    } else {
        Color::Magenta
    }
}

fn relative_day_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "today".to_owned(),
        1 => "tomorrow".to_owned(),
        days => format!("in {days} days"),
    }
}
