use crate::live_channels::ChannelAction;
use crate::messages::{Command, Message};
use crate::reducers;
use crate::state::FlowListState;

/// Apply `msg` to the list and return the side effects to run.
///
/// After the domain reducer has run, the open channel set is reconciled
/// against the rows, so every path that changes a status (fetch, action,
/// channel frame) gets its channels opened or closed the same way.
pub fn update(state: &mut FlowListState, msg: Message) -> Vec<Command> {
    let mut commands = Vec::new();

    let handled = reducers::rows::update(state, &msg, &mut commands)
        || reducers::sandbox::update(state, &msg, &mut commands)
        || reducers::channels::update(state, &msg, &mut commands);

    if !handled {
        crate::warn_log!("Unhandled flow list message: {:?}", msg);
    }

    if state.mounted {
        let actions = state.reconcile_channels();
        commands.extend(actions.into_iter().map(channel_command));
    }

    // One render at the end, no matter how many reducers asked for it.
    let wants_render = commands.iter().any(|c| matches!(c, Command::Render));
    commands.retain(|c| !matches!(c, Command::Render));
    if wants_render && state.mounted {
        commands.push(Command::Render);
    }

    commands
}

pub(crate) fn channel_command(action: ChannelAction) -> Command {
    match action {
        ChannelAction::Open {
            id,
            generation,
            status,
        } => Command::OpenChannel {
            id,
            generation,
            status,
        },
        ChannelAction::Close { id } => Command::CloseChannel { id },
    }
}
