use std::rc::Rc;

use crate::components::flow_list_table;
use crate::debug_log;
use crate::messages::{Command, Message};
use crate::models::{SandboxResponse, WorkflowRow};
use crate::network::api_client::{describe_js_error, ApiClient};
use crate::network::config::current_api_config;
use crate::network::sandbox_channel::{ChannelEvent, ChannelRegistry, WsSandboxChannel, CHANNELS};
use crate::network::ISandboxChannel;
use crate::state::dispatch_global_message;
use crate::storage;
use crate::toast;

/// Run one side effect produced by `update`.
pub fn execute(cmd: Command) {
    match cmd {
        Command::OpenChannel { id, generation, status } => {
            let opened = CHANNELS.with(|cell| match cell.borrow_mut().as_mut() {
                Some(registry) => registry.open(&id, generation, status).map_err(|e| describe_js_error(&e)),
                None => Err("channel registry not initialised".to_string()),
            });
            // Report after the registry borrow is gone; the dispatch closes
            // the channel through the registry again.
            if let Err(e) = opened {
                web_sys::console::error_1(&format!("Failed to open sandbox channel for {}: {}", id, e).into());
                dispatch_global_message(Message::ChannelDropped { id, generation });
            }
        }
        Command::CloseChannel { id } => {
            CHANNELS.with(|cell| {
                if let Some(registry) = cell.borrow_mut().as_mut() {
                    if let Err(e) = registry.close(&id) {
                        web_sys::console::warn_1(
                            &format!("Failed to close sandbox channel for {}: {:?}", id, e).into(),
                        );
                    }
                }
            });
        }
        Command::FetchRows { variant, request } => {
            wasm_bindgen_futures::spawn_local(async move {
                let msg = match ApiClient::get_chatflows(variant).await {
                    Ok(response) => match serde_json::from_str::<Vec<WorkflowRow>>(&response) {
                        Ok(rows) => Message::RowsFetched { request, rows },
                        Err(e) => Message::RowsFetchFailed {
                            request,
                            error: format!("unexpected response ({})", e),
                        },
                    },
                    Err(e) => Message::RowsFetchFailed {
                        request,
                        error: describe_js_error(&e),
                    },
                };
                dispatch_global_message(msg);
            });
        }
        Command::DeploySandbox { id, request } => {
            wasm_bindgen_futures::spawn_local(async move {
                match ApiClient::run_sandbox(&id).await {
                    Ok(body) => {
                        let response = parse_sandbox_response(&body);
                        dispatch_global_message(Message::RunSandboxResponded { id, request, response });
                    }
                    Err(e) => dispatch_global_message(Message::RunSandboxFailed {
                        id,
                        request,
                        error: describe_js_error(&e),
                    }),
                }
            });
        }
        Command::StopSandbox { id, request } => {
            wasm_bindgen_futures::spawn_local(async move {
                match ApiClient::stop_sandbox(&id).await {
                    Ok(body) => {
                        let response = parse_sandbox_response(&body);
                        dispatch_global_message(Message::StopSandboxResponded { id, request, response });
                    }
                    Err(e) => dispatch_global_message(Message::StopSandboxFailed {
                        id,
                        request,
                        error: describe_js_error(&e),
                    }),
                }
            });
        }
        Command::PersistSandboxState { id, update } => {
            let body = match serde_json::to_string(&update) {
                Ok(body) => body,
                Err(e) => {
                    web_sys::console::error_1(&format!("Failed to encode sandbox state: {}", e).into());
                    return;
                }
            };
            // Fire and forget: the row already shows the new state.
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = ApiClient::update_chatflow(&id, &body).await {
                    web_sys::console::error_1(
                        &format!("Failed to persist sandbox state for {}: {}", id, describe_js_error(&e)).into(),
                    );
                }
            });
        }
        Command::PersistSortPreference { variant, sort } => {
            if let Err(e) = storage::save_sort_config(variant, sort) {
                web_sys::console::warn_1(&format!("Failed to save sort preference: {:?}", e).into());
            }
        }
        Command::ReportError(msg) => {
            toast::error(&msg);
        }
        Command::Render => {
            if let Err(e) = flow_list_table::render() {
                web_sys::console::error_1(&format!("Failed to render workflow list: {:?}", e).into());
            }
        }
    }
}

// A body that isn't the expected JSON is treated like one without a status.
fn parse_sandbox_response(body: &str) -> SandboxResponse {
    serde_json::from_str(body).unwrap_or_else(|e| {
        debug_log!("Unexpected sandbox response ({}): {}", e, body);
        SandboxResponse::default()
    })
}

/// Create the channel registry for a freshly mounted list.
pub fn init_channel_registry() {
    let url = current_api_config().sandbox_status_url();
    let registry = ChannelRegistry::new(
        url,
        Box::new(|| Box::new(WsSandboxChannel::new()) as Box<dyn ISandboxChannel>),
        Rc::new(|event: ChannelEvent| match event {
            ChannelEvent::Update { id, generation, update } => {
                dispatch_global_message(Message::ChannelUpdated { id, generation, update })
            }
            ChannelEvent::Dropped { id, generation } => {
                dispatch_global_message(Message::ChannelDropped { id, generation })
            }
        }),
    );
    CHANNELS.with(|cell| {
        if let Some(mut old) = cell.borrow_mut().replace(registry) {
            old.close_all();
        }
    });
}

/// Close every channel and drop the registry.
pub fn teardown_channel_registry() {
    let registry = CHANNELS.with(|cell| cell.borrow_mut().take());
    if let Some(mut registry) = registry {
        registry.close_all();
    }
}
