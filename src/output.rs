//! Console rendering for the service inventory.

use chrono::TimeDelta;
use comfy_table::{Cell, Color, ContentArrangement, Table};

use crate::error::ResultOkLogExt;
use crate::inventory::{Service, ServiceStatus};

/// Create a styled table with the given headers.
fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.load_preset(comfy_table::presets::NOTHING);
    table.set_header(headers);
    table
}

/// Truncates an image or container id for display, dropping any digest
/// algorithm prefix.
pub fn short_id(id: &str) -> &str {
    let id = id.strip_prefix("sha256:").unwrap_or(id);
    &id[..id.len().min(12)]
}

/// Formats a running duration as a coarse human-readable string.
pub fn format_uptime(uptime: TimeDelta) -> String {
    let secs = uptime.num_seconds();
    if secs < 0 {
        return "just now".to_string();
    }
    if secs < 60 {
        return format!("{secs} seconds");
    }

    let mins = uptime.num_minutes();
    if mins < 60 {
        return format!("{mins} minutes");
    }

    let hours = uptime.num_hours();
    if hours < 24 {
        return format!("{hours} hours");
    }

    format!("{} days", uptime.num_days())
}

fn marker(service: &Service) -> Cell {
    if service.metadata.is_some() {
        Cell::new("■").fg(Color::Green)
    } else {
        Cell::new("■").fg(Color::Red)
    }
}

fn status_cell(service: &Service) -> Cell {
    match service.status() {
        ServiceStatus::Error => {
            let reason = service
                .diagnostic
                .as_deref()
                .unwrap_or("metadata retrieval failed");
            Cell::new(format!("error: {reason}")).fg(Color::Red)
        }
        ServiceStatus::Running { since } => {
            let annotation = since
                .map(|uptime| format!("running {}", format_uptime(uptime)))
                .unwrap_or_else(|| "running".to_owned());
            Cell::new(annotation).fg(Color::Green)
        }
        ServiceStatus::Stopped => Cell::new("stopped"),
    }
}

/// Display-time metadata lookup that must not abort rendering.
fn storage_plugin(service: &Service) -> Option<String> {
    let metadata = service.metadata.as_ref()?;
    match metadata.get("mini:storage").ok_log()? {
        Some(oxrdf::Term::Literal(literal)) => Some(literal.value().to_owned()),
        _ => None,
    }
}

/// Renders one row per service: marker, identifier, truncated id, title,
/// storage plugin and status with running-duration annotation.
pub fn render_services(services: &[Service]) -> Table {
    let mut table = new_table(&["", "IMAGE", "ID", "TITLE", "STORAGE", "STATUS"]);
    for service in services {
        let title = service
            .metadata
            .as_ref()
            .and_then(|metadata| metadata.title())
            .unwrap_or_default();
        table.add_row(vec![
            marker(service),
            Cell::new(&service.image.repo_tag),
            Cell::new(short_id(&service.image.id)).fg(Color::DarkGrey),
            Cell::new(title),
            Cell::new(storage_plugin(service).unwrap_or_default()),
            status_cell(service),
        ]);
    }
    table
}

pub fn print_services(services: &[Service]) {
    println!("{}", render_services(services));
}
