//! Bookkeeping for the per-row status channels.
//!
//! The set of channels that *should* be open is a pure function of the row
//! statuses. [`LiveChannels::reconcile`] diffs that against what is open and
//! returns the opens/closes to perform; the executors only ever act on those
//! actions. Every open gets a fresh generation number so frames from a
//! superseded socket can be told apart and dropped.

use std::collections::{BTreeMap, HashMap};

use crate::models::{SandboxStatus, WorkflowRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelTicket {
    pub generation: u64,
    /// Status the channel was opened for (sent in the handshake).
    pub status: SandboxStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelAction {
    Open {
        id: String,
        generation: u64,
        status: SandboxStatus,
    },
    Close {
        id: String,
    },
}

#[derive(Debug, Default)]
pub struct LiveChannels {
    active: BTreeMap<String, ChannelTicket>,
    // Rows whose channel died under them, with the status they were stuck in.
    // They are not re-watched until that status changes.
    dropped: HashMap<String, SandboxStatus>,
    next_generation: u64,
}

impl LiveChannels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active.contains_key(id)
    }

    pub fn ticket(&self, id: &str) -> Option<ChannelTicket> {
        self.active.get(id).copied()
    }

    pub fn active_ids(&self) -> Vec<String> {
        self.active.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// True if a frame stamped with `generation` belongs to the channel that
    /// is currently open for `id`.
    pub fn accepts(&self, id: &str, generation: u64) -> bool {
        self.active
            .get(id)
            .is_some_and(|ticket| ticket.generation == generation)
    }

    /// Bring the open set in line with the rows. Closes come before opens.
    pub fn reconcile(&mut self, rows: &HashMap<String, WorkflowRow>) -> Vec<ChannelAction> {
        self.dropped.retain(|id, stuck| {
            rows.get(id)
                .is_some_and(|row| row.sandbox_status == *stuck)
        });

        let desired: BTreeMap<&str, SandboxStatus> = rows
            .values()
            .filter(|row| row.sandbox_status.watches_channel())
            .filter(|row| !self.dropped.contains_key(&row.id))
            .map(|row| (row.id.as_str(), row.sandbox_status))
            .collect();

        let mut actions = Vec::new();

        let stale: Vec<String> = self
            .active
            .iter()
            .filter(|(id, ticket)| desired.get(id.as_str()) != Some(&ticket.status))
            .map(|(id, _)| id.clone())
            .collect();
        for id in stale {
            self.active.remove(&id);
            actions.push(ChannelAction::Close { id });
        }

        for (id, status) in desired {
            if self.active.contains_key(id) {
                continue;
            }
            self.next_generation += 1;
            let ticket = ChannelTicket {
                generation: self.next_generation,
                status,
            };
            self.active.insert(id.to_string(), ticket);
            actions.push(ChannelAction::Open {
                id: id.to_string(),
                generation: ticket.generation,
                status,
            });
        }

        actions
    }

    /// The channel delivered a terminal status and is done.
    pub fn retire(&mut self, id: &str, generation: u64) -> bool {
        if self.accepts(id, generation) {
            self.active.remove(id);
            true
        } else {
            false
        }
    }

    /// The transport dropped the channel. The row keeps its status and is
    /// not re-watched until that status changes or the rows are replaced.
    pub fn mark_dropped(&mut self, id: &str, generation: u64) -> bool {
        match self.active.get(id) {
            Some(ticket) if ticket.generation == generation => {
                self.dropped.insert(id.to_string(), ticket.status);
                self.active.remove(id);
                true
            }
            _ => false,
        }
    }

    /// Close everything, e.g. before the row set is replaced or on unmount.
    pub fn close_all(&mut self) -> Vec<ChannelAction> {
        self.dropped.clear();
        std::mem::take(&mut self.active)
            .into_keys()
            .map(|id| ChannelAction::Close { id })
            .collect()
    }
}
