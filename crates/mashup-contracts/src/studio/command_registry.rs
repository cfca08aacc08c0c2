use crate::assets::SlotRole;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CommandAction {
    Select(SlotRole),
    Remove,
    Generate,
    Wait,
    Status,
    Download,
    Help,
    Quit,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: CommandAction,
}

pub(crate) const SINGLE_PATH_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "character",
        action: CommandAction::Select(SlotRole::Character),
    },
    CommandSpec {
        command: "product",
        action: CommandAction::Select(SlotRole::Product),
    },
];

pub(crate) const OPTIONAL_PATH_COMMANDS: &[CommandSpec] = &[CommandSpec {
    command: "download",
    action: CommandAction::Download,
}];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "generate",
        action: CommandAction::Generate,
    },
    CommandSpec {
        command: "wait",
        action: CommandAction::Wait,
    },
    CommandSpec {
        command: "status",
        action: CommandAction::Status,
    },
    CommandSpec {
        command: "help",
        action: CommandAction::Help,
    },
    CommandSpec {
        command: "quit",
        action: CommandAction::Quit,
    },
    CommandSpec {
        command: "exit",
        action: CommandAction::Quit,
    },
];

pub(crate) const REMOVE_COMMAND: CommandSpec = CommandSpec {
    command: "remove",
    action: CommandAction::Remove,
};

pub const STUDIO_HELP_COMMANDS: &[&str] = &[
    "/character <image file>",
    "/product <image file>",
    "/remove character|product",
    "/generate",
    "/wait",
    "/status",
    "/download [dir]",
    "/help",
    "/quit",
];
