//! Sandbox action reducer: optimistic run/stop and their responses.

use crate::constants::STOP_FAILED_MESSAGE;
use crate::debug_log;
use crate::messages::{Command, Message};
use crate::models::{SandboxStatus, StatusPatch};
use crate::state::FlowListState;

pub fn update(state: &mut FlowListState, msg: &Message, commands: &mut Vec<Command>) -> bool {
    match msg {
        Message::RunSandbox(id) => {
            if state.row(id).is_none() {
                debug_log!("Run requested for unknown row {}", id);
                return true;
            }
            state.patch_row(id, &StatusPatch::status(SandboxStatus::SendingRequest));
            commands.push(Command::DeploySandbox {
                id: id.clone(),
                request: state.begin_action(id),
            });
            commands.push(Command::Render);
            true
        }
        Message::RunSandboxResponded { id, request, response } => {
            if !accept_response(state, id, *request) {
                return true;
            }
            let patch = StatusPatch {
                status: response.sandbox_status.unwrap_or(SandboxStatus::Error),
                urls: response.urls(),
            };
            if state.patch_row(id, &patch) {
                commands.push(Command::Render);
            }
            true
        }
        Message::RunSandboxFailed { id, request, error } => {
            if !accept_response(state, id, *request) {
                return true;
            }
            // Row stays at "Sending Request" until the next refresh or action.
            debug_log!("Run sandbox failed for {}: {}", id, error);
            commands.push(Command::ReportError(format!(
                "Failed to run sandbox: {}",
                error
            )));
            true
        }
        Message::StopSandbox(id) => {
            if state.row(id).is_none() {
                debug_log!("Stop requested for unknown row {}", id);
                return true;
            }
            state.patch_row(id, &StatusPatch::status(SandboxStatus::SendingRequest));
            commands.push(Command::StopSandbox {
                id: id.clone(),
                request: state.begin_action(id),
            });
            commands.push(Command::Render);
            true
        }
        Message::StopSandboxResponded { id, request, response } => {
            if !accept_response(state, id, *request) {
                return true;
            }
            match response.sandbox_status {
                Some(status) => {
                    if state.patch_row(id, &StatusPatch::status(status)) {
                        commands.push(Command::Render);
                    }
                }
                None => {
                    // Known gap: the row is left at "Sending Request".
                    debug_log!("Stop response for {} carried no status", id);
                    commands.push(Command::ReportError(STOP_FAILED_MESSAGE.to_string()));
                }
            }
            true
        }
        Message::StopSandboxFailed { id, request, error } => {
            if !accept_response(state, id, *request) {
                return true;
            }
            debug_log!("Stop sandbox failed for {}: {}", id, error);
            commands.push(Command::ReportError(format!(
                "{}: {}",
                STOP_FAILED_MESSAGE, error
            )));
            true
        }
        _ => false,
    }
}

// Only the answer to the latest run/stop request of a row is applied.
fn accept_response(state: &mut FlowListState, id: &str, request: u64) -> bool {
    let current = state.finish_action(id, request);
    if !current {
        debug_log!("Dropping stale sandbox response #{} for {}", request, id);
    }
    current
}
