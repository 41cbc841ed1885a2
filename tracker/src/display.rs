//! Terminal rendering of the tracking display: the status card, the progress
//! bar and the map panel. Everything here is a pure function of the view.

use logger::Color;

use crate::types::flight::FlightRecord;
use crate::types::flight_status::FlightStatus;
use crate::types::tracker::ViewState;

const MAP_WIDTH: usize = 60;
const BAR_WIDTH: usize = 40;

/// How a status badge is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusStyle {
    pub label: &'static str,
    pub color: Color,
}

impl StatusStyle {
    pub fn for_status(status: FlightStatus) -> Self {
        let color = match status {
            FlightStatus::EnRoute => Color::Green,
            FlightStatus::Departed => Color::Blue,
            FlightStatus::Landed => Color::White,
            FlightStatus::Delayed => Color::Yellow,
            _ => Color::Red,
        };
        StatusStyle {
            label: status.as_str(),
            color,
        }
    }

    pub fn badge(&self) -> String {
        self.color.paint(&format!("[ {} ]", self.label))
    }
}

/// Horizontal position of the aircraft marker on the map panel, as a
/// percentage of the panel width. Stays between the two airport pins.
pub fn marker_position(progress: f64) -> f64 {
    (10.0 + progress * 0.8).clamp(10.0, 90.0)
}

/// A bar of `width` cells, filled in proportion to `progress`.
pub fn progress_bar(progress: f64, width: usize) -> String {
    let filled = ((progress.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Rounds `value` and groups its digits by thousands, e.g. `35,000`.
pub fn thousands(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if rounded < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

pub fn render_card(record: &FlightRecord) -> String {
    let style = StatusStyle::for_status(record.status);
    let mut out = String::new();

    out.push_str(&format!(
        "{}  {}    {}\n",
        record.flight_number,
        record.airline,
        style.badge()
    ));
    out.push_str(&format!(
        "{:<30}{:>30}\n",
        format!("{} {}", record.departure.airport, record.departure.city),
        format!("{} {}", record.arrival.airport, record.arrival.city)
    ));
    out.push_str(&format!(
        "{:<30}{:>30}\n",
        format!("{} - Gate {}", record.departure.time, record.departure.gate),
        format!("{} - Gate {}", record.arrival.time, record.arrival.gate)
    ));
    out.push_str(&format!("Aircraft: {}\n", record.aircraft));
    out.push_str(&format!(
        "Progress {} {}%\n",
        progress_bar(record.progress, BAR_WIDTH),
        record.progress.round()
    ));
    out.push_str(&format!(
        "Speed: {} mph | Altitude: {} ft | Distance: {} mi | Travelled: {} mi | Remaining: {} mi\n",
        record.speed.round(),
        thousands(record.altitude),
        record.distance.total.round(),
        record.distance.travelled().round(),
        record.distance.remaining.round()
    ));
    out
}

pub fn render_map(record: &FlightRecord, live: bool) -> String {
    let mut out = String::new();

    let mut track: Vec<char> = vec!['-'; MAP_WIDTH];
    let travelled = ((record.progress.clamp(0.0, 100.0) / 100.0) * MAP_WIDTH as f64) as usize;
    for cell in track.iter_mut().take(travelled) {
        *cell = '=';
    }
    let marker = ((marker_position(record.progress) / 100.0) * (MAP_WIDTH - 1) as f64).round()
        as usize;
    track[marker] = '>';

    out.push_str(&format!(
        "{} o{}o {}\n",
        record.departure.airport,
        track.into_iter().collect::<String>(),
        record.arrival.airport
    ));
    out.push_str(&format!(
        "Current position: {:.4}°, {:.4}°",
        record.position.lat, record.position.lng
    ));
    if live {
        out.push_str(&format!("    {}", Color::Green.paint("* Live")));
    }
    out.push('\n');
    out
}

/// Renders the whole screen for `state`.
pub fn render(state: &ViewState, live: bool) -> String {
    match state {
        ViewState::Idle => "Enter a flight number to start tracking.\n".to_string(),
        ViewState::Loading(flight_number) => format!("Searching for {}...\n", flight_number),
        ViewState::Failed(message) => format!("{}\n", Color::Red.paint(message)),
        ViewState::Showing(record) => {
            format!("{}\n{}", render_card(record), render_map(record, live))
        }
    }
}
