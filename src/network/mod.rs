// Network layer: REST calls to the chatflow API and the per-row sandbox
// status channels.
pub mod api_client;
pub mod config;
pub mod sandbox_channel;


pub use api_client::ApiClient;
pub use config::ApiConfig;
pub use sandbox_channel::{ChannelEvent, ChannelRegistry, ConnectionState, ISandboxChannel, WsSandboxChannel};
