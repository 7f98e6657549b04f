//! What each table row shows, derived purely from the row. The DOM code in
//! `flow_list_table` only renders these values.

use chrono::{DateTime, Utc};

use crate::models::{SandboxStatus, WorkflowRow};
use crate::sorting::{parse_timestamp_ms, ListVariant};

/// Run/stop button state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryAction {
    Run { disabled: bool },
    Stop,
}

impl PrimaryAction {
    pub fn label(self) -> &'static str {
        match self {
            PrimaryAction::Run { .. } => "Run",
            PrimaryAction::Stop => "Stop",
        }
    }

    pub fn is_disabled(self) -> bool {
        matches!(self, PrimaryAction::Run { disabled: true })
    }
}

/// One entry of the observability menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityLink {
    pub label: &'static str,
    pub test_id: &'static str,
    /// `None` renders the entry disabled.
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub id: String,
    pub name: String,
    pub canvas_href: String,
    pub last_modified: String,
    pub owner: Option<String>,
    pub status_label: &'static str,
    pub show_spinner: bool,
    pub action: PrimaryAction,
    /// Target of the "Open app" button; `None` while it is disabled.
    pub app_href: Option<String>,
    pub observability: Vec<ObservabilityLink>,
}

impl RowView {
    pub fn from_row(row: &WorkflowRow, variant: ListVariant, is_admin: bool) -> Self {
        let status = row.sandbox_status;
        let ready = status == SandboxStatus::Ready;
        let enabled_href = |url: &Option<String>| {
            url.as_deref()
                .filter(|u| ready && !u.is_empty())
                .map(str::to_string)
        };

        Self {
            id: row.id.clone(),
            name: row.display_name().to_string(),
            canvas_href: format!("/{}/{}", variant.canvas_route(), row.id),
            last_modified: row
                .updated_date
                .as_deref()
                .map(format_last_modified)
                .unwrap_or_default(),
            owner: is_admin.then(|| row.user_id.clone().unwrap_or_default()),
            status_label: status_label(status),
            show_spinner: matches!(status, SandboxStatus::GettingReady | SandboxStatus::Stopping),
            action: primary_action(status),
            app_href: enabled_href(&row.urls.app),
            observability: vec![
                ObservabilityLink {
                    label: "Monitoring Dashboard",
                    test_id: "grafana-link",
                    href: enabled_href(&row.urls.grafana),
                },
                ObservabilityLink {
                    label: "LLM Call Traces",
                    test_id: "tracer-link",
                    href: enabled_href(&row.urls.tracer),
                },
                ObservabilityLink {
                    label: "Debug Logs",
                    test_id: "debug-logs-link",
                    href: enabled_href(&row.urls.debug_logs),
                },
            ],
        }
    }
}

pub fn status_label(status: SandboxStatus) -> &'static str {
    match status {
        SandboxStatus::NotRunning => "Not Running",
        SandboxStatus::Ready => "Ready",
        SandboxStatus::GettingReady => "Getting Ready",
        SandboxStatus::Stopping => "Stopping",
        SandboxStatus::Error => "Error",
        SandboxStatus::SendingRequest => "Sending Request",
        SandboxStatus::Done => "Done",
    }
}

pub fn primary_action(status: SandboxStatus) -> PrimaryAction {
    match status {
        SandboxStatus::Ready | SandboxStatus::GettingReady => PrimaryAction::Stop,
        SandboxStatus::Stopping => PrimaryAction::Run { disabled: true },
        _ => PrimaryAction::Run { disabled: false },
    }
}

/// `YYYY-MM-DD HH:MM:SS` in UTC; empty for anything unparseable.
pub fn format_last_modified(raw: &str) -> String {
    parse_timestamp_ms(raw)
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}
