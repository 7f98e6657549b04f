//! Row set reducer: fetching, replacing, sorting and filtering the list.

use crate::debug_log;
use crate::messages::{Command, Message};
use crate::models::WorkflowRow;
use crate::state::FlowListState;
use crate::update::channel_command;

/// Handles row-set messages. Returns true if the message was handled.
pub fn update(state: &mut FlowListState, msg: &Message, commands: &mut Vec<Command>) -> bool {
    match msg {
        Message::RefreshRows => {
            state.is_loading = true;
            commands.push(Command::FetchRows {
                variant: state.options.variant,
                request: state.begin_fetch(),
            });
            commands.push(Command::Render);
            true
        }
        Message::RowsFetched { request, rows } => {
            if !state.finish_fetch(*request) {
                debug_log!("Dropping stale row fetch #{}", request);
                return true;
            }
            debug_log!("Flow list received {} rows", rows.len());
            replace_row_set(state, rows, commands);
            true
        }
        Message::RowsSupplied(rows) => {
            debug_log!("Host supplied {} rows", rows.len());
            state.supersede_fetches();
            replace_row_set(state, rows, commands);
            true
        }
        Message::RowsFetchFailed { request, error } => {
            if !state.finish_fetch(*request) {
                debug_log!("Ignoring failure of stale row fetch #{}: {}", request, error);
                return true;
            }
            state.is_loading = false;
            commands.push(Command::ReportError(format!(
                "Failed to load workflows: {}",
                error
            )));
            commands.push(Command::Render);
            true
        }
        Message::UpdateSort(field) => {
            state.sort = state.sort.toggled(*field);
            commands.push(Command::PersistSortPreference {
                variant: state.options.variant,
                sort: state.sort,
            });
            commands.push(Command::Render);
            true
        }
        Message::UpdateFilter(query) => {
            if state.filter != *query {
                state.filter = query.clone();
                commands.push(Command::Render);
            }
            true
        }
        _ => false,
    }
}

fn replace_row_set(state: &mut FlowListState, rows: &[WorkflowRow], commands: &mut Vec<Command>) {
    // A new row set means new channels: everything open now is torn down and
    // the reconcile pass reopens what is still transitional.
    commands.extend(state.channels.close_all().into_iter().map(channel_command));

    state.replace_rows(rows.to_vec());
    state.is_loading = false;
    commands.push(Command::Render);
}
