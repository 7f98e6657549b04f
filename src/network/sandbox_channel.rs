//! Per-row sandbox status channels.
//!
//! Each transitional row gets its own WebSocket to the status endpoint. The
//! socket sends one `{id, status}` handshake when it opens and then receives
//! status frames until the server reports a terminal status or the socket
//! closes. The [`ChannelRegistry`] owns the sockets; what it should hold is
//! decided elsewhere (`LiveChannels`), it only executes opens and closes.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{MessageEvent, WebSocket};

use crate::debug_log;
use crate::models::{ChannelHandshake, ChannelUpdate, SandboxStatus};

/// Status channel interface, mockable in tests.
pub trait ISandboxChannel {
    /// Connect to `url` and send `handshake` once the socket is open.
    fn open(&mut self, url: &str, handshake: ChannelHandshake) -> Result<(), JsValue>;
    /// Detach every callback and close the socket. No callback fires after
    /// this returns.
    fn close(&mut self) -> Result<(), JsValue>;
    fn connection_state(&self) -> ConnectionState;
    fn set_on_update(&mut self, callback: Box<dyn FnMut(ChannelUpdate) + 'static>);
    fn set_on_drop(&mut self, callback: Box<dyn FnMut() + 'static>);
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error(String),
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

type OnUpdateCallback = Rc<RefCell<Box<dyn FnMut(ChannelUpdate)>>>;
type OnDropCallback = Rc<RefCell<Box<dyn FnMut()>>>;

/// Browser WebSocket implementation of [`ISandboxChannel`].
pub struct WsSandboxChannel {
    websocket: Option<WebSocket>,
    state: Rc<RefCell<ConnectionState>>,
    // Shared with the JS handlers; flipped on close so a frame already queued
    // by the browser is swallowed.
    closed: Rc<Cell<bool>>,
    on_update: Option<OnUpdateCallback>,
    on_drop: Option<OnDropCallback>,
}

impl Default for WsSandboxChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl WsSandboxChannel {
    pub fn new() -> Self {
        Self {
            websocket: None,
            state: Rc::new(RefCell::new(ConnectionState::Disconnected)),
            closed: Rc::new(Cell::new(false)),
            on_update: None,
            on_drop: None,
        }
    }

    fn attach_handlers(&self, ws: &WebSocket, handshake: ChannelHandshake) {
        let state = self.state.clone();
        let ws_for_open = ws.clone();
        let onopen = Closure::wrap(Box::new(move |_: web_sys::Event| {
            *state.borrow_mut() = ConnectionState::Connected;
            match serde_json::to_string(&handshake) {
                Ok(json) => {
                    if let Err(e) = ws_for_open.send_with_str(&json) {
                        web_sys::console::error_1(
                            &format!("Failed to send sandbox handshake: {:?}", e).into(),
                        );
                    }
                }
                Err(e) => web_sys::console::error_1(
                    &format!("Failed to encode sandbox handshake: {}", e).into(),
                ),
            }
        }) as Box<dyn FnMut(web_sys::Event)>);
        ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        onopen.forget();

        let closed = self.closed.clone();
        let on_update = self.on_update.clone();
        let onmessage = Closure::wrap(Box::new(move |event: MessageEvent| {
            if closed.get() {
                return;
            }
            let Some(text) = event.data().as_string() else {
                web_sys::console::warn_1(&"Received non-text sandbox status frame".into());
                return;
            };
            match serde_json::from_str::<ChannelUpdate>(&text) {
                Ok(update) => {
                    if let Some(cb) = &on_update {
                        (cb.borrow_mut())(update);
                    }
                }
                Err(e) => web_sys::console::error_1(
                    &format!("Malformed sandbox status frame ({}): {}", e, text).into(),
                ),
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        onmessage.forget();

        let state = self.state.clone();
        let onerror = Closure::wrap(Box::new(move |e: web_sys::Event| {
            web_sys::console::error_1(&format!("Sandbox status channel error: {:?}", e).into());
            *state.borrow_mut() = ConnectionState::Error("transport error".to_string());
        }) as Box<dyn FnMut(web_sys::Event)>);
        ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onerror.forget();

        let state = self.state.clone();
        let closed = self.closed.clone();
        let on_drop = self.on_drop.clone();
        let onclose = Closure::wrap(Box::new(move |_: web_sys::Event| {
            *state.borrow_mut() = ConnectionState::Disconnected;
            if closed.replace(true) {
                return;
            }
            debug_log!("Sandbox status channel closed by peer");
            if let Some(cb) = &on_drop {
                (cb.borrow_mut())();
            }
        }) as Box<dyn FnMut(web_sys::Event)>);
        ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));
        onclose.forget();
    }
}

impl ISandboxChannel for WsSandboxChannel {
    fn open(&mut self, url: &str, handshake: ChannelHandshake) -> Result<(), JsValue> {
        self.close()?;
        self.closed = Rc::new(Cell::new(false));

        let ws = WebSocket::new(url)?;
        *self.state.borrow_mut() = ConnectionState::Connecting;
        self.attach_handlers(&ws, handshake);
        self.websocket = Some(ws);
        Ok(())
    }

    fn close(&mut self) -> Result<(), JsValue> {
        self.closed.set(true);
        if let Some(ws) = self.websocket.take() {
            ws.set_onopen(None);
            ws.set_onmessage(None);
            ws.set_onerror(None);
            ws.set_onclose(None);
            ws.close()?;
        }
        *self.state.borrow_mut() = ConnectionState::Disconnected;
        Ok(())
    }

    fn connection_state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    fn set_on_update(&mut self, callback: Box<dyn FnMut(ChannelUpdate) + 'static>) {
        self.on_update = Some(Rc::new(RefCell::new(callback)));
    }

    fn set_on_drop(&mut self, callback: Box<dyn FnMut() + 'static>) {
        self.on_drop = Some(Rc::new(RefCell::new(callback)));
    }
}

impl Drop for WsSandboxChannel {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            web_sys::console::warn_1(&format!("Failed to close sandbox channel: {:?}", e).into());
        }
    }
}

/// What a channel reports back, stamped with the row id and the generation
/// the channel was opened under.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Update {
        id: String,
        generation: u64,
        update: ChannelUpdate,
    },
    Dropped {
        id: String,
        generation: u64,
    },
}

pub type ChannelSink = Rc<dyn Fn(ChannelEvent)>;
pub type ChannelFactory = Box<dyn Fn() -> Box<dyn ISandboxChannel>>;

struct OpenChannel {
    generation: u64,
    channel: Box<dyn ISandboxChannel>,
}

/// Owns at most one open channel per row id.
pub struct ChannelRegistry {
    url: String,
    factory: ChannelFactory,
    sink: ChannelSink,
    channels: HashMap<String, OpenChannel>,
}

impl ChannelRegistry {
    pub fn new(url: impl Into<String>, factory: ChannelFactory, sink: ChannelSink) -> Self {
        Self {
            url: url.into(),
            factory,
            sink,
            channels: HashMap::new(),
        }
    }

    /// Open a channel for `id`, replacing any channel already open for it.
    ///
    /// On error nothing is registered; the caller reports the drop once it
    /// no longer holds the registry.
    pub fn open(&mut self, id: &str, generation: u64, status: SandboxStatus) -> Result<(), JsValue> {
        self.close(id)?;

        let mut channel = (self.factory)();

        let sink = self.sink.clone();
        let row_id = id.to_string();
        channel.set_on_update(Box::new(move |update| {
            sink(ChannelEvent::Update {
                id: row_id.clone(),
                generation,
                update,
            })
        }));

        let sink = self.sink.clone();
        let row_id = id.to_string();
        channel.set_on_drop(Box::new(move || {
            sink(ChannelEvent::Dropped {
                id: row_id.clone(),
                generation,
            })
        }));

        let handshake = ChannelHandshake {
            id: id.to_string(),
            status,
        };
        channel.open(&self.url, handshake)?;
        debug_log!("Opened sandbox channel for {} (gen {}, {})", id, generation, status);
        self.channels
            .insert(id.to_string(), OpenChannel { generation, channel });
        Ok(())
    }

    /// Close the channel for `id`, if any.
    pub fn close(&mut self, id: &str) -> Result<(), JsValue> {
        if let Some(mut open) = self.channels.remove(id) {
            debug_log!(
                "Closing sandbox channel for {} (gen {}, {})",
                id,
                open.generation,
                open.channel.connection_state()
            );
            open.channel.close()?;
        }
        Ok(())
    }

    /// Close every channel. Errors from individual sockets are logged and
    /// do not stop the sweep.
    pub fn close_all(&mut self) {
        for (id, mut open) in self.channels.drain() {
            let state = open.channel.connection_state();
            if open.channel.close().is_err() {
                crate::warn_log!("Failed to close sandbox channel for {} ({})", id, state);
            }
        }
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.channels.contains_key(id)
    }

    pub fn generation(&self, id: &str) -> Option<u64> {
        self.channels.get(id).map(|open| open.generation)
    }

    pub fn open_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.channels.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

thread_local! {
    /// Live registry for the mounted list; `None` while unmounted.
    pub static CHANNELS: RefCell<Option<ChannelRegistry>> = RefCell::new(None);
}
