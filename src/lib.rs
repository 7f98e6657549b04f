use wasm_bindgen::prelude::*;

mod macros;

pub mod command_executors;
pub mod components;
pub mod constants;
pub mod live_channels;
pub mod messages;
pub mod models;
pub mod network;
mod reducers;
pub mod sorting;
pub mod state;
pub mod storage;
pub mod toast;
pub mod update;

use messages::Message;
use network::config::{set_api_config, ApiConfig};
use sorting::ListVariant;
use state::{dispatch_global_message, FlowListOptions, FlowListState, FLOW_LIST};

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    // Better panic messages in the browser console
    console_error_panic_hook::set_once();
    Ok(())
}

/// Override the compile-time API configuration. Call before mounting.
#[wasm_bindgen]
pub fn init_api_config_js(base_url: &str, sandbox_status_endpoint: &str) {
    set_api_config(ApiConfig::from_parts(base_url, sandbox_status_endpoint));
}

/// Mount the workflow list into the element with id `container_id` and
/// start loading its rows. `variant` is one of `agent`, `chat` or `opea`.
/// Mounting again replaces the previous list.
#[wasm_bindgen]
pub fn mount_flow_list(container_id: &str, variant: &str, is_admin: bool) -> Result<(), JsValue> {
    if FLOW_LIST.with(|cell| cell.borrow().is_some()) {
        unmount_flow_list();
    }

    let options = FlowListOptions {
        variant: ListVariant::parse(variant),
        is_admin,
    };
    let sort = storage::load_sort_config(options.variant);
    crate::debug_log!("Mounting flow list {:?} into #{} ({:?})", options.variant, container_id, sort);

    components::flow_list_table::set_container(container_id)?;
    command_executors::init_channel_registry();
    FLOW_LIST.with(|cell| *cell.borrow_mut() = Some(FlowListState::new(options, sort)));

    dispatch_global_message(Message::RefreshRows);
    Ok(())
}

/// Replace the rows with a list supplied by the host page.
#[wasm_bindgen]
pub fn set_flow_rows(rows: JsValue) -> Result<(), JsValue> {
    let rows: Vec<models::WorkflowRow> = serde_wasm_bindgen::from_value(rows)?;
    dispatch_global_message(Message::RowsSupplied(rows));
    Ok(())
}

/// Fetch the rows again.
#[wasm_bindgen]
pub fn refresh_flow_list() {
    dispatch_global_message(Message::RefreshRows);
}

#[wasm_bindgen]
pub fn set_flow_filter(query: &str) {
    dispatch_global_message(Message::UpdateFilter(query.to_string()));
}

/// Tear the list down. Every channel is closed and no callback reaches the
/// list afterwards.
#[wasm_bindgen]
pub fn unmount_flow_list() {
    dispatch_global_message(Message::Unmount);
    command_executors::teardown_channel_registry();
    FLOW_LIST.with(|cell| *cell.borrow_mut() = None);
    components::flow_list_table::clear_container();
}
