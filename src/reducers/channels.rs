//! Status channel reducer: frames pushed by the server, transport drops and
//! teardown.

use crate::debug_log;
use crate::messages::{Command, Message};
use crate::state::FlowListState;
use crate::update::channel_command;
use crate::warn_log;

pub fn update(state: &mut FlowListState, msg: &Message, commands: &mut Vec<Command>) -> bool {
    match msg {
        Message::ChannelUpdated {
            id,
            generation,
            update,
        } => {
            if !state.channels.accepts(id, *generation) {
                debug_log!("Discarding frame from closed channel {} (gen {})", id, generation);
                return true;
            }
            let Some(patch) = update.to_patch() else {
                warn_log!("Status frame for {} has no usable status: {:?}", id, update.status);
                return true;
            };

            if state.patch_row(id, &patch) {
                commands.push(Command::Render);
            }
            commands.push(Command::PersistSandboxState {
                id: id.clone(),
                update: (&patch).into(),
            });

            if patch.status.is_terminal() && state.channels.retire(id, *generation) {
                debug_log!("Channel for {} finished with {}", id, patch.status);
                commands.push(Command::CloseChannel { id: id.clone() });
            }
            true
        }
        Message::ChannelDropped { id, generation } => {
            if state.channels.mark_dropped(id, *generation) {
                debug_log!("Channel for {} dropped by transport, not retrying", id);
                commands.push(Command::CloseChannel { id: id.clone() });
            }
            true
        }
        Message::Unmount => {
            state.mounted = false;
            commands.extend(state.channels.close_all().into_iter().map(channel_command));
            true
        }
        _ => false,
    }
}
