use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Sandbox status
// ---------------------------------------------------------------------------

/// Deployment status of a workflow's sandbox, spelled on the wire the way the
/// studio server reports it ("Getting Ready", "Not Running", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SandboxStatus {
    #[default]
    #[serde(rename = "Not Running")]
    NotRunning,
    Ready,
    #[serde(rename = "Getting Ready")]
    GettingReady,
    Stopping,
    Error,
    #[serde(rename = "Sending Request")]
    SendingRequest,
    Done,
}

/// Row of the status transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTraits {
    /// A live status channel must be open while the row sits in this status.
    pub watches_channel: bool,
    /// A channel message carrying this status ends the watch.
    pub is_terminal: bool,
}

impl SandboxStatus {
    pub const ALL: [SandboxStatus; 7] = [
        SandboxStatus::NotRunning,
        SandboxStatus::Ready,
        SandboxStatus::GettingReady,
        SandboxStatus::Stopping,
        SandboxStatus::Error,
        SandboxStatus::SendingRequest,
        SandboxStatus::Done,
    ];

    /// The single transition table. Everything that needs to know whether a
    /// status is transitional or terminal asks here.
    pub const fn traits(self) -> StatusTraits {
        match self {
            SandboxStatus::GettingReady | SandboxStatus::Stopping => StatusTraits {
                watches_channel: true,
                is_terminal: false,
            },
            SandboxStatus::NotRunning
            | SandboxStatus::Ready
            | SandboxStatus::Error
            | SandboxStatus::Done => StatusTraits {
                watches_channel: false,
                is_terminal: true,
            },
            SandboxStatus::SendingRequest => StatusTraits {
                watches_channel: false,
                is_terminal: false,
            },
        }
    }

    pub fn watches_channel(self) -> bool {
        self.traits().watches_channel
    }

    pub fn is_terminal(self) -> bool {
        self.traits().is_terminal
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SandboxStatus::NotRunning => "Not Running",
            SandboxStatus::Ready => "Ready",
            SandboxStatus::GettingReady => "Getting Ready",
            SandboxStatus::Stopping => "Stopping",
            SandboxStatus::Error => "Error",
            SandboxStatus::SendingRequest => "Sending Request",
            SandboxStatus::Done => "Done",
        }
    }
}

impl fmt::Display for SandboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SandboxStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SandboxStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown sandbox status: {:?}", s))
    }
}

// Rows coming from the list endpoint may carry null, "" or a status this
// build does not know about; all of those read as "Not Running".
fn lenient_status<'de, D>(deserializer: D) -> Result<SandboxStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default())
}

fn optional_status<'de, D>(deserializer: D) -> Result<Option<SandboxStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(|s| s.parse().ok()))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Sandbox endpoint URLs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxUrls {
    #[serde(rename = "sandboxAppUrl", default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(rename = "sandboxGrafanaUrl", default, skip_serializing_if = "Option::is_none")]
    pub grafana: Option<String>,
    #[serde(rename = "sandboxTracerUrl", default, skip_serializing_if = "Option::is_none")]
    pub tracer: Option<String>,
    #[serde(rename = "sandboxDebugLogsUrl", default, skip_serializing_if = "Option::is_none")]
    pub debug_logs: Option<String>,
}

impl SandboxUrls {
    /// Overwrite each field that `incoming` carries a non-empty value for.
    /// Returns true if anything changed.
    pub fn merge_from(&mut self, incoming: &SandboxUrls) -> bool {
        let mut changed = false;
        for (slot, value) in [
            (&mut self.app, &incoming.app),
            (&mut self.grafana, &incoming.grafana),
            (&mut self.tracer, &incoming.tracer),
            (&mut self.debug_logs, &incoming.debug_logs),
        ] {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                if slot.as_deref() != Some(v) {
                    *slot = Some(v.to_string());
                    changed = true;
                }
            }
        }
        changed
    }
}

// ---------------------------------------------------------------------------
// Workflow rows
// ---------------------------------------------------------------------------

/// One workflow as listed by the chatflows endpoint. Only the sandbox status
/// and URLs are ever mutated after the row is fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRow {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    #[serde(default)]
    pub updated_date: Option<String>,
    #[serde(default, rename = "userid", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub sandbox_status: SandboxStatus,
    #[serde(flatten)]
    pub urls: SandboxUrls,
}

impl WorkflowRow {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            template_name: None,
            updated_date: None,
            user_id: None,
            sandbox_status: SandboxStatus::NotRunning,
            urls: SandboxUrls::default(),
        }
    }

    pub fn with_status(mut self, status: SandboxStatus) -> Self {
        self.sandbox_status = status;
        self
    }

    pub fn with_updated_date(mut self, date: impl Into<String>) -> Self {
        self.updated_date = Some(date.into());
        self
    }

    /// Name shown in the table; the template name wins when present.
    pub fn display_name(&self) -> &str {
        self.template_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.name)
    }

    /// Apply a status patch. Status is overwritten, URLs merge-if-present.
    /// Returns true if the row changed.
    pub fn apply(&mut self, patch: &StatusPatch) -> bool {
        let status_changed = self.sandbox_status != patch.status;
        self.sandbox_status = patch.status;
        let urls_changed = self.urls.merge_from(&patch.urls);
        status_changed || urls_changed
    }
}

/// The only kind of mutation a row accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusPatch {
    pub status: SandboxStatus,
    pub urls: SandboxUrls,
}

impl StatusPatch {
    pub fn status(status: SandboxStatus) -> Self {
        Self {
            status,
            urls: SandboxUrls::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// REST payloads
// ---------------------------------------------------------------------------

/// Body returned by the run and stop sandbox endpoints.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxResponse {
    #[serde(default, alias = "sandbox_status", deserialize_with = "optional_status")]
    pub sandbox_status: Option<SandboxStatus>,
    #[serde(default, alias = "sandbox_app_url")]
    pub sandbox_app_url: Option<String>,
    #[serde(default, alias = "sandbox_grafana_url")]
    pub sandbox_grafana_url: Option<String>,
    #[serde(default, alias = "sandbox_tracer_url")]
    pub sandbox_tracer_url: Option<String>,
    #[serde(default, alias = "sandbox_debuglogs_url", alias = "sandbox_debug_logs_url")]
    pub sandbox_debug_logs_url: Option<String>,
}

impl SandboxResponse {
    pub fn urls(&self) -> SandboxUrls {
        SandboxUrls {
            app: self.sandbox_app_url.clone(),
            grafana: self.sandbox_grafana_url.clone(),
            tracer: self.sandbox_tracer_url.clone(),
            debug_logs: self.sandbox_debug_logs_url.clone(),
        }
    }
}

/// Body of the fire-and-forget persist call made after each channel update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSandboxUpdate {
    pub sandbox_status: SandboxStatus,
    #[serde(flatten)]
    pub urls: SandboxUrls,
}

impl From<&StatusPatch> for FlowSandboxUpdate {
    fn from(patch: &StatusPatch) -> Self {
        Self {
            sandbox_status: patch.status,
            urls: patch.urls.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Status channel wire format
// ---------------------------------------------------------------------------

/// First frame sent by the client once the status channel is open.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelHandshake {
    pub id: String,
    pub status: SandboxStatus,
}

/// Frame pushed by the server on the status channel.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChannelUpdate {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sandbox_app_url: Option<String>,
    #[serde(default)]
    pub sandbox_grafana_url: Option<String>,
    #[serde(default)]
    pub sandbox_tracer_url: Option<String>,
    #[serde(default)]
    pub sandbox_debuglogs_url: Option<String>,
}

impl ChannelUpdate {
    /// Convert into a row patch. `None` when the frame has no recognisable
    /// status.
    pub fn to_patch(&self) -> Option<StatusPatch> {
        let status = self.status.as_deref()?.parse().ok()?;
        Some(StatusPatch {
            status,
            urls: SandboxUrls {
                app: self.sandbox_app_url.clone(),
                grafana: self.sandbox_grafana_url.clone(),
                tracer: self.sandbox_tracer_url.clone(),
                debug_logs: self.sandbox_debuglogs_url.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        let watched: Vec<_> = SandboxStatus::ALL
            .into_iter()
            .filter(|s| s.watches_channel())
            .collect();
        assert_eq!(watched, vec![SandboxStatus::GettingReady, SandboxStatus::Stopping]);

        let terminal: Vec<_> = SandboxStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            vec![
                SandboxStatus::NotRunning,
                SandboxStatus::Ready,
                SandboxStatus::Error,
                SandboxStatus::Done
            ]
        );
        assert!(!SandboxStatus::SendingRequest.is_terminal());
        assert!(!SandboxStatus::SendingRequest.watches_channel());
    }

    #[test]
    fn test_status_wire_spelling() {
        assert_eq!(
            serde_json::to_string(&SandboxStatus::GettingReady).unwrap(),
            "\"Getting Ready\""
        );
        assert_eq!(
            "Sending Request".parse::<SandboxStatus>().unwrap(),
            SandboxStatus::SendingRequest
        );
        assert!("getting ready".parse::<SandboxStatus>().is_err());
    }

    #[test]
    fn test_row_defaults_missing_status_to_not_running() {
        let json = r#"[
            {"id": "a", "name": "Alpha"},
            {"id": "b", "name": null, "sandboxStatus": ""},
            {"id": "c", "name": "Gamma", "sandboxStatus": "Rebooting"},
            {"id": "d", "name": "Delta", "sandboxStatus": "Ready",
             "sandboxAppUrl": "https://app", "userid": "u1"}
        ]"#;
        let rows: Vec<WorkflowRow> = serde_json::from_str(json).unwrap();
        assert_eq!(rows[0].sandbox_status, SandboxStatus::NotRunning);
        assert_eq!(rows[1].sandbox_status, SandboxStatus::NotRunning);
        assert_eq!(rows[1].name, "");
        assert_eq!(rows[2].sandbox_status, SandboxStatus::NotRunning);
        assert_eq!(rows[3].sandbox_status, SandboxStatus::Ready);
        assert_eq!(rows[3].urls.app.as_deref(), Some("https://app"));
        assert_eq!(rows[3].user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn test_apply_keeps_urls_when_absent_or_empty() {
        let mut row = WorkflowRow::new("a", "Alpha");
        row.urls.grafana = Some("https://grafana".into());

        let patch = StatusPatch {
            status: SandboxStatus::Ready,
            urls: SandboxUrls {
                app: Some("https://app".into()),
                grafana: Some(String::new()),
                tracer: None,
                debug_logs: None,
            },
        };
        assert!(row.apply(&patch));
        assert_eq!(row.sandbox_status, SandboxStatus::Ready);
        assert_eq!(row.urls.app.as_deref(), Some("https://app"));
        assert_eq!(row.urls.grafana.as_deref(), Some("https://grafana"));

        // Same patch again is a no-op.
        let snapshot = row.clone();
        assert!(!row.apply(&patch));
        assert_eq!(row, snapshot);
    }

    #[test]
    fn test_channel_update_to_patch() {
        let update: ChannelUpdate = serde_json::from_str(
            r#"{"status": "Ready", "sandbox_app_url": "https://app", "sandbox_debuglogs_url": "https://logs"}"#,
        )
        .unwrap();
        let patch = update.to_patch().unwrap();
        assert_eq!(patch.status, SandboxStatus::Ready);
        assert_eq!(patch.urls.app.as_deref(), Some("https://app"));
        assert_eq!(patch.urls.debug_logs.as_deref(), Some("https://logs"));

        let no_status: ChannelUpdate = serde_json::from_str(r#"{"sandbox_app_url": "x"}"#).unwrap();
        assert!(no_status.to_patch().is_none());
    }

    #[test]
    fn test_sandbox_response_accepts_both_spellings() {
        let camel: SandboxResponse =
            serde_json::from_str(r#"{"sandboxStatus": "Ready", "sandboxAppUrl": "https://x"}"#).unwrap();
        let snake: SandboxResponse =
            serde_json::from_str(r#"{"sandboxStatus": "Ready", "sandbox_app_url": "https://x"}"#).unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.sandbox_status, Some(SandboxStatus::Ready));

        let empty: SandboxResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.sandbox_status, None);
    }

    #[test]
    fn test_persist_body_skips_missing_urls() {
        let patch = StatusPatch {
            status: SandboxStatus::Stopping,
            urls: SandboxUrls {
                tracer: Some("https://trace".into()),
                ..Default::default()
            },
        };
        let body = serde_json::to_value(FlowSandboxUpdate::from(&patch)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"sandboxStatus": "Stopping", "sandboxTracerUrl": "https://trace"})
        );
    }

    mod merge_props {
        use super::*;
        use proptest::prelude::*;

        fn url_strategy() -> impl Strategy<Value = Option<String>> {
            prop_oneof![
                Just(None),
                Just(Some(String::new())),
                "https://[a-z]{1,8}\\.example".prop_map(Some),
            ]
        }

        fn urls_strategy() -> impl Strategy<Value = SandboxUrls> {
            (url_strategy(), url_strategy(), url_strategy(), url_strategy()).prop_map(
                |(app, grafana, tracer, debug_logs)| SandboxUrls {
                    app,
                    grafana,
                    tracer,
                    debug_logs,
                },
            )
        }

        proptest! {
            #[test]
            fn applying_a_patch_twice_equals_applying_it_once(
                status_idx in 0usize..SandboxStatus::ALL.len(),
                start in urls_strategy(),
                incoming in urls_strategy(),
            ) {
                let mut row = WorkflowRow::new("id", "name");
                row.urls = start;
                let patch = StatusPatch { status: SandboxStatus::ALL[status_idx], urls: incoming };

                row.apply(&patch);
                let once = row.clone();
                prop_assert!(!row.apply(&patch));
                prop_assert_eq!(row, once);
            }
        }
    }
}
