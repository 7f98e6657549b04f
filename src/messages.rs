// The events the workflow list reacts to, and the side effects it asks for.
//
// Channel callbacks and request completions only ever carry a row id plus
// the channel generation or request id; all row mutation happens inside
// `update`.
//
use crate::models::{ChannelUpdate, FlowSandboxUpdate, SandboxResponse, SandboxStatus, WorkflowRow};
use crate::sorting::{ListVariant, SortConfig, SortField};

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // Row set
    RefreshRows,                              // Ask the list endpoint again
    RowsFetched {                             // Replaces every row if `request` is the latest fetch
        request: u64,
        rows: Vec<WorkflowRow>,
    },
    RowsFetchFailed {
        request: u64,
        error: String,
    },
    RowsSupplied(Vec<WorkflowRow>),           // Pushed by the host page; supersedes any fetch in flight

    // Sorting / filtering
    UpdateSort(SortField),                    // Header click
    UpdateFilter(String),

    // Sandbox actions. Responses carry the request id they answer; only the
    // latest request per row is applied.
    RunSandbox(String),
    RunSandboxResponded {
        id: String,
        request: u64,
        response: SandboxResponse,
    },
    RunSandboxFailed {
        id: String,
        request: u64,
        error: String,
    },
    StopSandbox(String),
    StopSandboxResponded {
        id: String,
        request: u64,
        response: SandboxResponse,
    },
    StopSandboxFailed {
        id: String,
        request: u64,
        error: String,
    },

    // Status channels
    ChannelUpdated {
        id: String,
        generation: u64,
        update: ChannelUpdate,
    },
    ChannelDropped {
        id: String,
        generation: u64,
    },

    // View teardown
    Unmount,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Open a status channel and send the `{id, status}` handshake.
    OpenChannel {
        id: String,
        generation: u64,
        status: SandboxStatus,
    },
    CloseChannel {
        id: String,
    },

    /// GET the row list for a variant
    FetchRows {
        variant: ListVariant,
        request: u64,
    },
    /// POST run sandbox
    DeploySandbox {
        id: String,
        request: u64,
    },
    /// POST stop sandbox
    StopSandbox {
        id: String,
        request: u64,
    },
    /// Fire-and-forget PUT reconciling the server record with what a channel reported.
    PersistSandboxState {
        id: String,
        update: FlowSandboxUpdate,
    },
    PersistSortPreference {
        variant: ListVariant,
        sort: SortConfig,
    },

    /// Show an error to the user
    ReportError(String),
    /// Re-render the table from state
    Render,
}
