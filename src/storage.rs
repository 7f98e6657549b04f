//! Sort preference persistence in `localStorage`.
//!
//! Keys are namespaced per list variant, e.g. `agentcanvas_order` and
//! `agentcanvas_orderBy`.

use wasm_bindgen::prelude::*;
use web_sys::Storage;

use crate::sorting::{ListVariant, SortConfig};

fn local_storage() -> Result<Storage, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window exists"))?;
    window
        .local_storage()?
        .ok_or_else(|| JsValue::from_str("no local storage exists"))
}

/// Stored preference for `variant`, or the default (last modified,
/// newest first) when nothing usable is stored.
pub fn load_sort_config(variant: ListVariant) -> SortConfig {
    let storage = match local_storage() {
        Ok(s) => s,
        Err(_) => return SortConfig::default(),
    };
    let order = storage.get_item(&variant.order_key()).ok().flatten();
    let order_by = storage.get_item(&variant.order_by_key()).ok().flatten();
    SortConfig::from_stored(order.as_deref(), order_by.as_deref())
}

pub fn save_sort_config(variant: ListVariant, config: SortConfig) -> Result<(), JsValue> {
    let storage = local_storage()?;
    storage.set_item(&variant.order_key(), config.direction.as_str())?;
    storage.set_item(&variant.order_by_key(), config.field.as_str())?;
    Ok(())
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use crate::sorting::{SortDirection, SortField};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_sort_preference_round_trips_per_variant() {
        let cfg = SortConfig {
            field: SortField::Name,
            direction: SortDirection::Asc,
        };
        save_sort_config(ListVariant::AgentFlows, cfg).unwrap();
        assert_eq!(load_sort_config(ListVariant::AgentFlows), cfg);

        let storage = local_storage().unwrap();
        assert_eq!(storage.get_item("agentcanvas_order").unwrap().as_deref(), Some("asc"));
        assert_eq!(storage.get_item("agentcanvas_orderBy").unwrap().as_deref(), Some("name"));
    }

    #[wasm_bindgen_test]
    fn test_garbage_falls_back_to_default() {
        let storage = local_storage().unwrap();
        storage.set_item("chatflowcanvas_order", "sideways").unwrap();
        storage.set_item("chatflowcanvas_orderBy", "colour").unwrap();
        assert_eq!(load_sort_config(ListVariant::ChatFlows), SortConfig::default());
    }
}
