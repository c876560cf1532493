//! Plain-text rendering of the derived views for the terminal.

use ansi_term::{Colour, Style};

use crate::{
    notify::{Notification, Severity},
    store::checkin::Checkin,
    utils::time::{format_date, format_time_of_day},
    views::{
        listing::Listing,
        stats::TagStat,
        text_log::{self, DailyLog, FULL_DAY_HOURS},
    },
};

const EMPTY_PERIOD_MESSAGE: &str = "No check ins within the selected time period";

pub fn listing(listing: &Listing, page: usize) -> String {
    if listing.count == 0 {
        return EMPTY_PERIOD_MESSAGE.into();
    }

    let mut lines: Vec<String> = listing.results.iter().map(listing_line).collect();
    lines.push(format!(
        "page {page} of {} ({} check-ins)",
        listing.page_count(),
        listing.count
    ));
    lines.join("\n")
}

fn listing_line(checkin: &Checkin) -> String {
    format!(
        "{}  {}-{}  {:>5.2} hrs  {}  {}  {}",
        format_date(checkin.record_date),
        format_time_of_day(checkin.start_time),
        format_time_of_day(checkin.end_time()),
        checkin.duration,
        Colour::Cyan.paint(format!("#{}", checkin.tag)),
        checkin.activities,
        Style::new().dimmed().paint(checkin.id.as_str().to_owned()),
    )
}

pub fn text_log(log: &DailyLog) -> String {
    if log.is_empty() {
        return EMPTY_PERIOD_MESSAGE.into();
    }

    let going = text_log::total_hours(log);
    let remaining = FULL_DAY_HOURS - going;
    format!(
        "{}Going on {}\nRemaining {}",
        text_log::render(log),
        Style::new().bold().paint(hours_label(going)),
        Style::new().bold().paint(hours_label(remaining)),
    )
}

fn hours_label(hours: f64) -> String {
    format!("{hours:.2} {}", if hours == 1.0 { "hour" } else { "hours" })
}

pub fn stats(stats: &[TagStat]) -> String {
    if stats.is_empty() {
        return "No checkins within the selected period".into();
    }

    let total: f64 = stats.iter().map(|s| s.hours).sum();
    stats
        .iter()
        .map(|stat| {
            let share = if total > 0.0 { stat.hours / total } else { 0.0 };
            format!(
                "{}  {:>6.2} {}  {}",
                Colour::Cyan.paint(format!("{:<20}", format!("#{}", stat.tag))),
                stat.hours,
                if stat.hours == 1.0 { "hr " } else { "hrs" },
                "▇".repeat((share * 30.0).round() as usize),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn tags(tags: &[String]) -> String {
    if tags.is_empty() {
        return "No tags yet".into();
    }
    tags.iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn notification(notification: &Notification) -> String {
    let colour = match notification.severity {
        Severity::Info => Colour::Cyan,
        Severity::Success => Colour::Green,
        Severity::Warning => Colour::Yellow,
        Severity::Error => Colour::Red,
    };
    colour.paint(&notification.message).to_string()
}
