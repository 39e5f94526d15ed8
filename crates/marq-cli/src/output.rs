//! Text and table output formatting for threads.

use std::io::IsTerminal;

use chrono::{DateTime, Local, Utc};
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, ContentArrangement, Table};
use owo_colors::OwoColorize;

use marq_core::Thread;

/// Render a millisecond timestamp in local time.
pub fn format_timestamp(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}

/// Build the thread table shown by `marq list`.
pub fn thread_table(threads: &[Thread]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "Woven", "Intention", "Time", "Region", "Title"]);

    for thread in threads {
        let id = if thread.is_corrupted() {
            format!("{} !", thread.id)
        } else {
            thread.id.clone()
        };
        table.add_row(vec![
            Cell::new(id),
            Cell::new(format_timestamp(thread.timestamp)),
            Cell::new(thread.intention.as_str()),
            Cell::new(thread.time.as_str()),
            Cell::new(&thread.region),
            Cell::new(&thread.title),
        ]);
    }
    table
}

/// One-line summary used after `marq add`.
pub fn thread_summary(thread: &Thread) -> String {
    format!(
        "Wove thread {} ({}, {}) \"{}\" at {}",
        thread.id, thread.intention, thread.time, thread.title, thread.region
    )
}

/// Color is used only on a terminal and when NO_COLOR is unset.
pub fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// "OK" or "FAILED", colored when `color` is set.
pub fn status_badge(ok: bool, color: bool) -> String {
    match (ok, color) {
        (true, true) => "OK".green().bold().to_string(),
        (true, false) => "OK".to_string(),
        (false, true) => "FAILED".red().bold().to_string(),
        (false, false) => "FAILED".to_string(),
    }
}

/// Keep only the last `limit` threads.
pub fn tail(threads: &[Thread], limit: Option<usize>) -> &[Thread] {
    match limit {
        Some(limit) if limit < threads.len() => &threads[threads.len() - limit..],
        _ => threads,
    }
}
