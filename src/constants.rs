// REST routes for the chatflow API. All are relative to the configured base URL.
pub const CHATFLOWS_PATH: &str = "/api/v1/chatflows";
pub const SANDBOX_RUN_PATH: &str = "/api/v1/chatflows-sandbox/run";
pub const SANDBOX_STOP_PATH: &str = "/api/v1/chatflows-sandbox/stop";

// Push endpoint for per-row sandbox status, appended to the WebSocket base.
pub const DEFAULT_SANDBOX_STATUS_ENDPOINT: &str = "ws/sandbox-status";

// localStorage key suffixes for the persisted sort preference
pub const STORAGE_KEY_ORDER: &str = "order";
pub const STORAGE_KEY_ORDER_BY: &str = "orderBy";

// Error surfaced when a stop request comes back without a status
pub const STOP_FAILED_MESSAGE: &str = "Failed to stop sandbox";

// Number of placeholder rows rendered while the list is loading
pub const SKELETON_ROWS: usize = 2;

pub const ATTR_DATA_TESTID: &str = "data-testid";

// Attributes read by the table's delegated click listener
pub const ATTR_DATA_ACTION: &str = "data-action";
pub const ATTR_DATA_FLOW_ID: &str = "data-flow-id";
pub const ATTR_DATA_FIELD: &str = "data-field";
pub const ATTR_DATA_HREF: &str = "data-href";
