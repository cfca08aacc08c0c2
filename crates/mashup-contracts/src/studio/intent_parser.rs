use crate::assets::SlotRole;

use super::command_registry::{
    CommandAction, CommandSpec, NO_ARG_COMMANDS, OPTIONAL_PATH_COMMANDS, REMOVE_COMMAND,
    SINGLE_PATH_COMMANDS,
};

/// One line of studio input, resolved to the gesture it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudioIntent {
    Noop,
    Select { role: SlotRole, path: String },
    Remove { role: SlotRole },
    Generate,
    Wait,
    Status,
    Download { dir: Option<String> },
    Help,
    Quit,
    /// A slash command that was recognised but given unusable arguments.
    Invalid { command: String, reason: String },
    Unknown { command: String, arg: String },
    /// Input that is not a slash command at all.
    Text(String),
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<CommandAction> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn parse_path_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg
            .split_whitespace()
            .map(str::to_string)
            .filter(|value| !value.is_empty())
            .collect(),
    }
}

fn parse_single_path_arg(arg: &str) -> String {
    let parts = parse_path_args(arg);
    match parts.len() {
        0 => String::new(),
        1 => parts[0].clone(),
        _ => parts.join(" "),
    }
}

pub fn parse_intent(text: &str) -> StudioIntent {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return StudioIntent::Noop;
    }

    let Some(slash_tail) = raw_trimmed.strip_prefix('/') else {
        return StudioIntent::Text(raw_trimmed.to_string());
    };
    let command_len = slash_tail
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .count();
    if command_len == 0 {
        return StudioIntent::Text(raw_trimmed.to_string());
    }

    let command = slash_tail[..command_len].to_ascii_lowercase();
    let arg = slash_tail[command_len..].trim();

    if let Some(CommandAction::Select(role)) = find_action(&command, SINGLE_PATH_COMMANDS) {
        let path = parse_single_path_arg(arg);
        if path.is_empty() {
            return StudioIntent::Invalid {
                command,
                reason: format!("/{} requires an image path", role.as_str()),
            };
        }
        return StudioIntent::Select { role, path };
    }

    if command == REMOVE_COMMAND.command {
        return match SlotRole::parse(arg) {
            Some(role) => StudioIntent::Remove { role },
            None => StudioIntent::Invalid {
                command,
                reason: "/remove expects 'character' or 'product'".to_string(),
            },
        };
    }

    if find_action(&command, OPTIONAL_PATH_COMMANDS) == Some(CommandAction::Download) {
        let dir = parse_single_path_arg(arg);
        return StudioIntent::Download {
            dir: if dir.is_empty() { None } else { Some(dir) },
        };
    }

    match find_action(&command, NO_ARG_COMMANDS) {
        Some(CommandAction::Generate) => StudioIntent::Generate,
        Some(CommandAction::Wait) => StudioIntent::Wait,
        Some(CommandAction::Status) => StudioIntent::Status,
        Some(CommandAction::Help) => StudioIntent::Help,
        Some(CommandAction::Quit) => StudioIntent::Quit,
        _ => StudioIntent::Unknown {
            command,
            arg: arg.to_string(),
        },
    }
}
