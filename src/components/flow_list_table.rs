// DOM rendering of the workflow list. Every render rebuilds the table from
// `FLOW_LIST`. Clicks are handled by one listener on the container, which
// reads the `data-action` of the clicked control.

use std::cell::RefCell;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, MouseEvent};

use super::row_controls::{PrimaryAction, RowView};
use crate::constants::{
    ATTR_DATA_ACTION, ATTR_DATA_FIELD, ATTR_DATA_FLOW_ID, ATTR_DATA_HREF, ATTR_DATA_TESTID,
    SKELETON_ROWS,
};
use crate::debug_log;
use crate::messages::Message;
use crate::sorting::{SortConfig, SortDirection, SortField};
use crate::state::{dispatch_global_message, FLOW_LIST};

const ACTION_SORT: &str = "sort";
const ACTION_RUN: &str = "run";
const ACTION_STOP: &str = "stop";
const ACTION_OPEN: &str = "open";

// The container and the click listener attached to it. The listener lives
// exactly as long as the mount.
struct MountPoint {
    container: Element,
    on_click: Closure<dyn FnMut(MouseEvent)>,
}

thread_local! {
    static MOUNT: RefCell<Option<MountPoint>> = RefCell::new(None);
}

/// Render into the element with id `id` from now on.
pub fn set_container(id: &str) -> Result<(), JsValue> {
    clear_container();

    let document = document().ok_or_else(|| JsValue::from_str("no document"))?;
    let container = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Flow list container #{} not found", id)))?;

    let on_click = Closure::wrap(Box::new(handle_click) as Box<dyn FnMut(MouseEvent)>);
    container.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;

    MOUNT.with(|m| *m.borrow_mut() = Some(MountPoint { container, on_click }));
    Ok(())
}

/// Detach the click listener and empty the container.
pub fn clear_container() {
    let Some(mount) = MOUNT.with(|m| m.borrow_mut().take()) else {
        return;
    };
    if let Err(e) = mount
        .container
        .remove_event_listener_with_callback("click", mount.on_click.as_ref().unchecked_ref())
    {
        debug_log!("Failed to detach flow list click listener: {:?}", e);
    }
    mount.container.set_inner_html("");
}

fn document() -> Option<Document> {
    web_sys::window().and_then(|w| w.document())
}

/// What a click on a control of the table should do.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickAction {
    Dispatch(Message),
    Open(String),
}

/// Map the data attributes of a clicked control to its action. `None` for
/// controls that are missing the attributes their action needs.
pub fn click_action(
    action: &str,
    flow_id: Option<&str>,
    field: Option<&str>,
    href: Option<&str>,
) -> Option<ClickAction> {
    match action {
        ACTION_SORT => field
            .and_then(SortField::from_stored)
            .map(|field| ClickAction::Dispatch(Message::UpdateSort(field))),
        ACTION_RUN => flow_id.map(|id| ClickAction::Dispatch(Message::RunSandbox(id.to_string()))),
        ACTION_STOP => flow_id.map(|id| ClickAction::Dispatch(Message::StopSandbox(id.to_string()))),
        ACTION_OPEN => href
            .filter(|href| !href.is_empty())
            .map(|href| ClickAction::Open(href.to_string())),
        _ => None,
    }
}

fn handle_click(event: MouseEvent) {
    let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
        return;
    };
    let control = match target.closest(&format!("[{}]", ATTR_DATA_ACTION)) {
        Ok(Some(control)) => control,
        _ => return,
    };
    if control.has_attribute("disabled") {
        return;
    }
    let Some(action) = control.get_attribute(ATTR_DATA_ACTION) else {
        return;
    };

    match click_action(
        &action,
        control.get_attribute(ATTR_DATA_FLOW_ID).as_deref(),
        control.get_attribute(ATTR_DATA_FIELD).as_deref(),
        control.get_attribute(ATTR_DATA_HREF).as_deref(),
    ) {
        Some(ClickAction::Dispatch(msg)) => dispatch_global_message(msg),
        Some(ClickAction::Open(href)) => open_in_new_tab(&href),
        None => debug_log!("Ignoring click on incomplete '{}' control", action),
    }
}

fn open_in_new_tab(href: &str) {
    if let Some(window) = web_sys::window() {
        if let Err(e) = window.open_with_url_and_target(href, "_blank") {
            web_sys::console::error_1(&format!("Failed to open {}: {:?}", href, e).into());
        }
    }
}

// Snapshot of the state needed for one render, taken so no borrow of
// FLOW_LIST is held while the DOM is built.
struct TableSnapshot {
    is_admin: bool,
    is_loading: bool,
    sort: SortConfig,
    rows: Vec<RowView>,
}

fn snapshot() -> Option<TableSnapshot> {
    FLOW_LIST.with(|cell| {
        let slot = cell.borrow();
        let state = slot.as_ref()?;
        let variant = state.options.variant;
        let is_admin = state.options.is_admin;
        Some(TableSnapshot {
            is_admin,
            is_loading: state.is_loading,
            sort: state.sort,
            rows: state
                .visible_rows()
                .into_iter()
                .map(|row| RowView::from_row(row, variant, is_admin))
                .collect(),
        })
    })
}

/// Rebuild the table inside the mounted container.
pub fn render() -> Result<(), JsValue> {
    let Some(snap) = snapshot() else {
        return Ok(());
    };
    let Some(container) = MOUNT.with(|m| m.borrow().as_ref().map(|m| m.container.clone())) else {
        return Ok(());
    };
    let document = document().ok_or_else(|| JsValue::from_str("no document"))?;

    let table = document.create_element("table")?;
    table.set_class_name("flow-list-table");
    table.set_attribute(ATTR_DATA_TESTID, "flow-list-table")?;

    let thead = create_header(&document, &snap)?;
    table.append_child(&thead)?;

    let tbody = document.create_element("tbody")?;
    let columns = column_count(snap.is_admin);
    if snap.is_loading {
        for _ in 0..SKELETON_ROWS {
            let skeleton = create_message_row(&document, columns, "", "skeleton-row")?;
            tbody.append_child(&skeleton)?;
        }
    } else if snap.rows.is_empty() {
        let empty = create_message_row(&document, columns, "No data", "empty-row")?;
        tbody.append_child(&empty)?;
    } else {
        for view in &snap.rows {
            let tr = create_row(&document, view, snap.is_admin)?;
            tbody.append_child(&tr)?;
        }
    }
    table.append_child(&tbody)?;

    container.set_inner_html("");
    container.append_child(&table)?;
    Ok(())
}

fn column_count(is_admin: bool) -> u32 {
    // name, last modified, status, action, open app, observability
    if is_admin {
        7
    } else {
        6
    }
}

fn create_header(document: &Document, snap: &TableSnapshot) -> Result<Element, JsValue> {
    let thead = document.create_element("thead")?;
    let header_row = document.create_element("tr")?;

    let name = create_sort_header(document, "Name", SortField::Name, snap.sort)?;
    header_row.append_child(&name)?;
    if snap.is_admin {
        let owner = create_plain_header(document, "Owner")?;
        header_row.append_child(&owner)?;
    }
    let updated = create_sort_header(document, "Last Modified Date", SortField::UpdatedDate, snap.sort)?;
    header_row.append_child(&updated)?;
    for title in ["Sandbox Status", "Sandbox", "Open App", "Observability"] {
        let th = create_plain_header(document, title)?;
        header_row.append_child(&th)?;
    }

    thead.append_child(&header_row)?;
    Ok(thead)
}

fn create_plain_header(document: &Document, title: &str) -> Result<Element, JsValue> {
    let th = document.create_element("th")?;
    th.set_text_content(Some(title));
    Ok(th)
}

fn create_sort_header(
    document: &Document,
    title: &str,
    field: SortField,
    sort: SortConfig,
) -> Result<Element, JsValue> {
    let th = document.create_element("th")?;
    th.set_class_name("sortable");
    th.set_attribute(ATTR_DATA_ACTION, ACTION_SORT)?;
    th.set_attribute(ATTR_DATA_FIELD, field.as_str())?;
    th.set_text_content(Some(title));

    if sort.field == field {
        let indicator = document.create_element("span")?;
        indicator.set_class_name("sort-indicator");
        indicator.set_text_content(Some(match sort.direction {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }));
        th.append_child(&indicator)?;
    }

    Ok(th)
}

fn create_message_row(document: &Document, columns: u32, text: &str, class: &str) -> Result<Element, JsValue> {
    let tr = document.create_element("tr")?;
    tr.set_class_name(class);
    let td = document.create_element("td")?;
    td.set_attribute("colspan", &columns.to_string())?;
    td.set_text_content(Some(text));
    tr.append_child(&td)?;
    Ok(tr)
}

fn create_row(document: &Document, view: &RowView, is_admin: bool) -> Result<Element, JsValue> {
    let tr = document.create_element("tr")?;
    tr.set_attribute(ATTR_DATA_FLOW_ID, &view.id)?;

    // Name, linking to the canvas
    let name_td = document.create_element("td")?;
    let link = document.create_element("a")?;
    link.set_attribute("href", &view.canvas_href)?;
    link.set_text_content(Some(&view.name));
    name_td.append_child(&link)?;
    tr.append_child(&name_td)?;

    if is_admin {
        let owner_td = document.create_element("td")?;
        owner_td.set_text_content(view.owner.as_deref());
        tr.append_child(&owner_td)?;
    }

    let date_td = document.create_element("td")?;
    date_td.set_text_content(Some(&view.last_modified));
    tr.append_child(&date_td)?;

    // Status
    let status_td = document.create_element("td")?;
    status_td.set_attribute(ATTR_DATA_TESTID, &format!("sandbox-status-{}", view.id))?;
    if view.show_spinner {
        let spinner = document.create_element("span")?;
        spinner.set_class_name("spinner");
        status_td.append_child(&spinner)?;
    }
    let label = document.create_element("span")?;
    label.set_text_content(Some(view.status_label));
    status_td.append_child(&label)?;
    tr.append_child(&status_td)?;

    // Run / stop
    let action_td = document.create_element("td")?;
    let action_button = create_action_button(document, view)?;
    action_td.append_child(&action_button)?;
    tr.append_child(&action_td)?;

    // Open app
    let app_td = document.create_element("td")?;
    let app_button = create_open_button(document, "Open App", "open-app", view.app_href.as_deref())?;
    app_td.append_child(&app_button)?;
    tr.append_child(&app_td)?;

    // Observability menu
    let obs_td = document.create_element("td")?;
    let menu = document.create_element("div")?;
    menu.set_class_name("observability-menu");
    for entry in &view.observability {
        let button = create_open_button(document, entry.label, entry.test_id, entry.href.as_deref())?;
        menu.append_child(&button)?;
    }
    obs_td.append_child(&menu)?;
    tr.append_child(&obs_td)?;

    Ok(tr)
}

fn create_action_button(document: &Document, view: &RowView) -> Result<Element, JsValue> {
    let button = document.create_element("button")?;
    let (class, action) = match view.action {
        PrimaryAction::Stop => ("btn btn-stop", ACTION_STOP),
        PrimaryAction::Run { .. } => ("btn btn-run", ACTION_RUN),
    };
    button.set_class_name(class);
    button.set_text_content(Some(view.action.label()));
    button.set_attribute(ATTR_DATA_TESTID, &format!("sandbox-action-{}", view.id))?;
    button.set_attribute(ATTR_DATA_ACTION, action)?;
    button.set_attribute(ATTR_DATA_FLOW_ID, &view.id)?;
    if view.action.is_disabled() {
        button.set_attribute("disabled", "")?;
    }
    Ok(button)
}

// A button opening `href` in a new tab, rendered disabled when there is none.
fn create_open_button(
    document: &Document,
    label: &str,
    test_id: &str,
    href: Option<&str>,
) -> Result<Element, JsValue> {
    let button = document.create_element("button")?;
    button.set_class_name("btn btn-link");
    button.set_text_content(Some(label));
    button.set_attribute(ATTR_DATA_TESTID, test_id)?;
    button.set_attribute(ATTR_DATA_ACTION, ACTION_OPEN)?;
    match href {
        Some(href) => button.set_attribute(ATTR_DATA_HREF, href)?,
        None => button.set_attribute("disabled", "")?,
    }
    Ok(button)
}
