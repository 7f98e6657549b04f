use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::debug_log;
use crate::live_channels::{ChannelAction, LiveChannels};
use crate::messages::{Command, Message};
use crate::models::{StatusPatch, WorkflowRow};
use crate::sorting::{sort_rows, ListVariant, SortConfig};
use crate::update::update;

/// Mount-time options supplied by the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowListOptions {
    pub variant: ListVariant,
    /// Admins get an extra owner column.
    pub is_admin: bool,
}

impl Default for FlowListOptions {
    fn default() -> Self {
        Self {
            variant: ListVariant::ChatFlows,
            is_admin: false,
        }
    }
}

/// State of one mounted workflow list.
pub struct FlowListState {
    pub options: FlowListOptions,
    rows: HashMap<String, WorkflowRow>,
    // Order in which the fetch collaborator delivered the rows; sorting is
    // stable with respect to it.
    fetch_order: Vec<String>,
    pub sort: SortConfig,
    pub filter: String,
    pub is_loading: bool,
    pub mounted: bool,
    pub channels: LiveChannels,
    // Latest list fetch; older responses are dropped.
    latest_fetch: Option<u64>,
    // Latest run/stop request per row still awaiting its response.
    pending_actions: HashMap<String, u64>,
}

thread_local! {
    // Shared by every mount so a response from a torn-down list can never
    // match a request of the current one.
    static NEXT_REQUEST: Cell<u64> = Cell::new(0);
}

fn next_request_id() -> u64 {
    NEXT_REQUEST.with(|next| {
        let id = next.get() + 1;
        next.set(id);
        id
    })
}

impl FlowListState {
    pub fn new(options: FlowListOptions, sort: SortConfig) -> Self {
        Self {
            options,
            rows: HashMap::new(),
            fetch_order: Vec::new(),
            sort,
            filter: String::new(),
            is_loading: true,
            mounted: true,
            channels: LiveChannels::new(),
            latest_fetch: None,
            pending_actions: HashMap::new(),
        }
    }

    /// Start a list fetch. Any fetch still in flight becomes stale.
    pub fn begin_fetch(&mut self) -> u64 {
        let request = next_request_id();
        self.latest_fetch = Some(request);
        request
    }

    /// Rows arrived from somewhere other than a fetch; in-flight fetches are
    /// stale from now on.
    pub fn supersede_fetches(&mut self) {
        self.latest_fetch = None;
    }

    /// Consume the answer to fetch `request`. False if it is stale.
    pub fn finish_fetch(&mut self, request: u64) -> bool {
        if self.latest_fetch == Some(request) {
            self.latest_fetch = None;
            true
        } else {
            false
        }
    }

    /// Start a run/stop request for row `id`, superseding any earlier one.
    pub fn begin_action(&mut self, id: &str) -> u64 {
        let request = next_request_id();
        self.pending_actions.insert(id.to_string(), request);
        request
    }

    /// Consume the answer to action `request` on row `id`. False if a newer
    /// action was started since, or the request belongs to another mount.
    pub fn finish_action(&mut self, id: &str, request: u64) -> bool {
        if self.pending_actions.get(id) == Some(&request) {
            self.pending_actions.remove(id);
            true
        } else {
            false
        }
    }

    /// Swap in a freshly fetched row set. Duplicate ids keep their first
    /// position and their last payload.
    pub fn replace_rows(&mut self, rows: Vec<WorkflowRow>) {
        self.rows.clear();
        self.fetch_order.clear();
        for row in rows {
            if !self.rows.contains_key(&row.id) {
                self.fetch_order.push(row.id.clone());
            }
            self.rows.insert(row.id.clone(), row);
        }
    }

    pub fn row(&self, id: &str) -> Option<&WorkflowRow> {
        self.rows.get(id)
    }

    pub fn rows_by_id(&self) -> &HashMap<String, WorkflowRow> {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.fetch_order.len()
    }

    /// The one write path for rows. Unknown ids are ignored.
    pub fn patch_row(&mut self, id: &str, patch: &StatusPatch) -> bool {
        match self.rows.get_mut(id) {
            Some(row) => row.apply(patch),
            None => {
                debug_log!("Ignoring patch for unknown row {}", id);
                false
            }
        }
    }

    /// Rows in fetch order.
    pub fn rows_in_fetch_order(&self) -> impl Iterator<Item = &WorkflowRow> {
        self.fetch_order.iter().filter_map(|id| self.rows.get(id))
    }

    /// All rows in display order.
    pub fn sorted_rows(&self) -> Vec<&WorkflowRow> {
        sort_rows(self.rows_in_fetch_order(), self.sort)
    }

    /// Rows in display order that pass the search filter.
    pub fn visible_rows(&self) -> Vec<&WorkflowRow> {
        let query = self.filter.trim().to_lowercase();
        self.sorted_rows()
            .into_iter()
            .filter(|row| {
                query.is_empty()
                    || row.display_name().to_lowercase().contains(&query)
                    || row.name.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Diff the open channels against the current row statuses.
    pub fn reconcile_channels(&mut self) -> Vec<ChannelAction> {
        self.channels.reconcile(&self.rows)
    }

    pub fn dispatch(&mut self, msg: Message) -> Vec<Command> {
        update(self, msg)
    }
}

thread_local! {
    pub static FLOW_LIST: RefCell<Option<FlowListState>> = RefCell::new(None);
}

/// Run a message through the mounted list and execute the resulting
/// commands once the state borrow is released. A no-op when nothing is
/// mounted, which is what keeps late callbacks harmless after unmount.
pub fn dispatch_global_message(msg: Message) {
    let commands = FLOW_LIST.with(|cell| {
        let mut slot = cell.borrow_mut();
        match slot.as_mut() {
            Some(state) => state.dispatch(msg),
            None => {
                debug_log!("Flow list not mounted, dropping {:?}", msg);
                Vec::new()
            }
        }
    });

    for cmd in commands {
        crate::command_executors::execute(cmd);
    }
}
