//! End-to-end status tracking: the list state drives a channel registry
//! backed by in-memory channels, and channel events flow back as messages.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::JsValue;

use flow_sandbox_frontend::messages::{Command, Message};
use flow_sandbox_frontend::models::{ChannelHandshake, ChannelUpdate, SandboxStatus, WorkflowRow};
use flow_sandbox_frontend::network::{ChannelEvent, ChannelRegistry, ConnectionState, ISandboxChannel};
use flow_sandbox_frontend::sorting::SortConfig;
use flow_sandbox_frontend::state::{FlowListOptions, FlowListState};

type Callbacks = Rc<RefCell<(Option<Box<dyn FnMut(ChannelUpdate)>>, Option<Box<dyn FnMut()>>)>>;

// Row id -> callbacks of the channel currently open for it.
type Server = Rc<RefCell<HashMap<String, Callbacks>>>;

struct FakeChannel {
    server: Server,
    callbacks: Callbacks,
    id: Option<String>,
}

impl ISandboxChannel for FakeChannel {
    fn open(&mut self, _url: &str, handshake: ChannelHandshake) -> Result<(), JsValue> {
        self.server
            .borrow_mut()
            .insert(handshake.id.clone(), self.callbacks.clone());
        self.id = Some(handshake.id);
        Ok(())
    }

    fn close(&mut self) -> Result<(), JsValue> {
        *self.callbacks.borrow_mut() = (None, None);
        if let Some(id) = self.id.take() {
            self.server.borrow_mut().remove(&id);
        }
        Ok(())
    }

    fn connection_state(&self) -> ConnectionState {
        if self.id.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    fn set_on_update(&mut self, callback: Box<dyn FnMut(ChannelUpdate)>) {
        self.callbacks.borrow_mut().0 = Some(callback);
    }

    fn set_on_drop(&mut self, callback: Box<dyn FnMut()>) {
        self.callbacks.borrow_mut().1 = Some(callback);
    }
}

struct Harness {
    state: FlowListState,
    registry: ChannelRegistry,
    server: Server,
    inbox: Rc<RefCell<Vec<ChannelEvent>>>,
    // Every callback ever installed, including ones for closed channels.
    all_callbacks: Rc<RefCell<Vec<Callbacks>>>,
    // Request id of the last run/stop call the list issued.
    last_action: Option<u64>,
}

impl Harness {
    fn new() -> Self {
        let server: Server = Rc::new(RefCell::new(HashMap::new()));
        let inbox = Rc::new(RefCell::new(Vec::new()));
        let all_callbacks = Rc::new(RefCell::new(Vec::new()));

        let factory_server = server.clone();
        let factory_log = all_callbacks.clone();
        let sink_inbox = inbox.clone();
        let registry = ChannelRegistry::new(
            "ws://test/ws/sandbox-status",
            Box::new(move || {
                let callbacks: Callbacks = Rc::new(RefCell::new((None, None)));
                factory_log.borrow_mut().push(callbacks.clone());
                Box::new(FakeChannel {
                    server: factory_server.clone(),
                    callbacks,
                    id: None,
                }) as Box<dyn ISandboxChannel>
            }),
            Rc::new(move |event: ChannelEvent| sink_inbox.borrow_mut().push(event)),
        );

        Self {
            state: FlowListState::new(FlowListOptions::default(), SortConfig::default()),
            registry,
            server,
            inbox,
            all_callbacks,
            last_action: None,
        }
    }

    fn send(&mut self, msg: Message) {
        let mut queue = vec![msg];
        while let Some(msg) = queue.pop() {
            for cmd in self.state.dispatch(msg) {
                match cmd {
                    Command::OpenChannel { id, generation, status } => {
                        self.registry.open(&id, generation, status).unwrap();
                    }
                    Command::CloseChannel { id } => {
                        self.registry.close(&id).unwrap();
                    }
                    Command::DeploySandbox { request, .. } | Command::StopSandbox { request, .. } => {
                        self.last_action = Some(request);
                    }
                    _ => {}
                }
            }
            queue.extend(self.drain_inbox());
        }
    }

    fn drain_inbox(&self) -> Vec<Message> {
        self.inbox
            .borrow_mut()
            .drain(..)
            .map(|event| match event {
                ChannelEvent::Update { id, generation, update } => {
                    Message::ChannelUpdated { id, generation, update }
                }
                ChannelEvent::Dropped { id, generation } => Message::ChannelDropped { id, generation },
            })
            .collect()
    }

    fn push(&mut self, id: &str, status: &str) {
        let callbacks = self.server.borrow().get(id).cloned();
        if let Some(callbacks) = callbacks {
            if let Some(cb) = callbacks.borrow_mut().0.as_mut() {
                cb(serde_json::from_str(&format!(r#"{{"status":"{}"}}"#, status)).unwrap());
            }
        }
        let pending = self.drain_inbox();
        for msg in pending {
            self.send(msg);
        }
    }

    fn status(&self, id: &str) -> SandboxStatus {
        self.state.row(id).unwrap().sandbox_status
    }
}

fn rows(list: &[(&str, SandboxStatus)]) -> Message {
    Message::RowsSupplied(
        list.iter()
            .map(|(id, status)| WorkflowRow::new(*id, *id).with_status(*status))
            .collect(),
    )
}

#[test]
fn test_registry_mirrors_transitional_rows() {
    let mut h = Harness::new();
    h.send(rows(&[
        ("a", SandboxStatus::GettingReady),
        ("b", SandboxStatus::Ready),
        ("c", SandboxStatus::Stopping),
    ]));
    assert_eq!(h.registry.open_ids(), vec!["a".to_string(), "c".to_string()]);
    assert_eq!(h.registry.open_ids(), h.state.channels.active_ids());

    h.push("a", "Ready");
    assert_eq!(h.status("a"), SandboxStatus::Ready);
    assert_eq!(h.registry.open_ids(), vec!["c".to_string()]);

    h.push("c", "Not Running");
    assert_eq!(h.status("c"), SandboxStatus::NotRunning);
    assert!(h.registry.is_empty());
}

#[test]
fn test_stop_flow_watches_until_terminal() {
    let mut h = Harness::new();
    h.send(rows(&[("a", SandboxStatus::Ready)]));
    assert!(h.registry.is_empty());

    h.send(Message::StopSandbox("a".into()));
    assert_eq!(h.status("a"), SandboxStatus::SendingRequest);

    h.send(Message::StopSandboxResponded {
        id: "a".into(),
        request: h.last_action.unwrap(),
        response: serde_json::from_str(r#"{"sandboxStatus":"Stopping"}"#).unwrap(),
    });
    assert!(h.registry.is_open("a"));

    h.push("a", "Stopping");
    assert!(h.registry.is_open("a"));

    h.push("a", "Not Running");
    assert_eq!(h.status("a"), SandboxStatus::NotRunning);
    assert!(!h.registry.is_open("a"));
}

#[test]
fn test_unmount_closes_both_channels_and_no_callback_fires() {
    let mut h = Harness::new();
    h.send(rows(&[
        ("a", SandboxStatus::GettingReady),
        ("b", SandboxStatus::Stopping),
    ]));
    assert_eq!(h.registry.len(), 2);

    h.send(Message::Unmount);
    assert!(h.registry.is_empty());
    assert!(h.server.borrow().is_empty());

    // Every channel that was ever opened has had its callbacks detached.
    for callbacks in h.all_callbacks.borrow().iter() {
        let callbacks = callbacks.borrow();
        assert!(callbacks.0.is_none());
        assert!(callbacks.1.is_none());
    }
    assert!(h.inbox.borrow().is_empty());
}
