use async_trait::async_trait;
use thiserror::Error;

use scuderia_core::domain::pick::UserId;

use crate::blocks::{self, MessageTemplate};

pub const TEAM_SELECT_ID: &str = "team_select";
pub const DRIVER_SELECT_ID: &str = "driver_select";
/// Option value carried by a disabled placeholder menu.
pub const UNAVAILABLE_OPTION_VALUE: &str = "error";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashCommandPayload {
    pub command: String,
    pub text: String,
    pub channel_id: String,
    pub user_id: String,
    pub request_id: String,
}

/// A value chosen from one of the picker's select menus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionPayload {
    pub custom_id: String,
    pub value: String,
    pub channel_id: String,
    pub user_id: String,
    pub request_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: UserId,
    pub channel_id: String,
    pub request_id: String,
}

impl From<&SlashCommandPayload> for RequestContext {
    fn from(payload: &SlashCommandPayload) -> Self {
        Self {
            user_id: UserId::new(payload.user_id.clone()),
            channel_id: payload.channel_id.clone(),
            request_id: payload.request_id.clone(),
        }
    }
}

impl From<&SelectionPayload> for RequestContext {
    fn from(payload: &SelectionPayload) -> Self {
        Self {
            user_id: UserId::new(payload.user_id.clone()),
            channel_id: payload.channel_id.clone(),
            request_id: payload.request_id.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PickerCommand {
    /// `/pick [ea_username]`
    Pick { ea_username: Option<String> },
    MyPick,
    Leaderboard,
    Help,
    Unknown { command: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionAction {
    Team { team: String, ea_username: Option<String> },
    Driver { team: String, driver: String, ea_username: Option<String> },
    /// The placeholder option of a disabled menu was submitted.
    Unavailable,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandRouteError {
    #[error("invalid selection payload for `{custom_id}`")]
    InvalidSelectionPayload { custom_id: String },
}

pub fn parse_picker_command(payload: &SlashCommandPayload) -> PickerCommand {
    let command = payload.command.trim().trim_start_matches('/').to_ascii_lowercase();
    match command.as_str() {
        "pick" => {
            let ea_username = payload.text.trim();
            PickerCommand::Pick {
                ea_username: (!ea_username.is_empty()).then(|| ea_username.to_owned()),
            }
        }
        "mypick" => PickerCommand::MyPick,
        "leaderboard" => PickerCommand::Leaderboard,
        "pickhelp" => PickerCommand::Help,
        _ => PickerCommand::Unknown { command: payload.command.trim().to_owned() },
    }
}

pub fn team_option_value(team: &str, ea_username: Option<&str>) -> String {
    let mut value = format!("team={}", encode_action_value_component(team));
    push_ea_username(&mut value, ea_username);
    value
}

pub fn driver_option_value(team: &str, driver: &str, ea_username: Option<&str>) -> String {
    let mut value = format!(
        "team={};driver={}",
        encode_action_value_component(team),
        encode_action_value_component(driver)
    );
    push_ea_username(&mut value, ea_username);
    value
}

fn push_ea_username(value: &mut String, ea_username: Option<&str>) {
    if let Some(ea_username) = ea_username.filter(|name| !name.is_empty()) {
        value.push_str(";ea=");
        value.push_str(&encode_action_value_component(ea_username));
    }
}

/// Decodes a select-menu value. Returns `None` for anything the picker did
/// not produce: unknown menus, unknown or repeated keys, bad escapes, or a
/// driver value without its team.
pub fn parse_selection_value(custom_id: &str, value: &str) -> Option<SelectionAction> {
    if value == UNAVAILABLE_OPTION_VALUE {
        return Some(SelectionAction::Unavailable);
    }

    let mut team = None::<String>;
    let mut driver = None::<String>;
    let mut ea_username = None::<String>;

    for segment in value.split(';') {
        if segment.is_empty() {
            continue;
        }
        let (key, raw_value) = segment.split_once('=')?;
        // Values are compared verbatim against roster names.
        let decoded = decode_action_value_component(raw_value)?;
        if decoded.is_empty() {
            return None;
        }

        let slot = match key {
            "team" => &mut team,
            "driver" => &mut driver,
            "ea" => &mut ea_username,
            _ => return None,
        };
        if slot.replace(decoded).is_some() {
            return None;
        }
    }

    match custom_id {
        TEAM_SELECT_ID if driver.is_none() => {
            Some(SelectionAction::Team { team: team?, ea_username })
        }
        DRIVER_SELECT_ID => {
            Some(SelectionAction::Driver { team: team?, driver: driver?, ea_username })
        }
        _ => None,
    }
}

pub struct CommandRouter<S> {
    service: S,
}

impl<S> CommandRouter<S>
where
    S: PickerCommandService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub async fn route(
        &self,
        payload: &SlashCommandPayload,
    ) -> Result<MessageTemplate, CommandRouteError> {
        let context = RequestContext::from(payload);
        match parse_picker_command(payload) {
            PickerCommand::Pick { ea_username } => {
                self.service.start_pick(ea_username, &context).await
            }
            PickerCommand::MyPick => self.service.my_pick(&context).await,
            PickerCommand::Leaderboard => self.service.leaderboard(&context).await,
            PickerCommand::Help => Ok(blocks::help_message()),
            PickerCommand::Unknown { command } => Ok(blocks::error_message(
                &format!("Unsupported command `{command}`. Try `/pickhelp`."),
                &context.request_id,
            )),
        }
    }

    pub async fn route_selection(
        &self,
        payload: &SelectionPayload,
    ) -> Result<MessageTemplate, CommandRouteError> {
        let context = RequestContext::from(payload);
        let action = parse_selection_value(&payload.custom_id, &payload.value).ok_or_else(
            || CommandRouteError::InvalidSelectionPayload { custom_id: payload.custom_id.clone() },
        )?;

        match action {
            SelectionAction::Team { team, ea_username } => {
                self.service.select_team(team, ea_username, &context).await
            }
            SelectionAction::Driver { team, driver, ea_username } => {
                self.service.select_driver(team, driver, ea_username, &context).await
            }
            SelectionAction::Unavailable => Ok(blocks::selection_unavailable_message()),
        }
    }
}

#[async_trait]
pub trait PickerCommandService: Send + Sync {
    async fn start_pick(
        &self,
        ea_username: Option<String>,
        context: &RequestContext,
    ) -> Result<MessageTemplate, CommandRouteError>;

    async fn select_team(
        &self,
        team: String,
        ea_username: Option<String>,
        context: &RequestContext,
    ) -> Result<MessageTemplate, CommandRouteError>;

    async fn select_driver(
        &self,
        team: String,
        driver: String,
        ea_username: Option<String>,
        context: &RequestContext,
    ) -> Result<MessageTemplate, CommandRouteError>;

    async fn my_pick(&self, context: &RequestContext) -> Result<MessageTemplate, CommandRouteError>;

    async fn leaderboard(
        &self,
        context: &RequestContext,
    ) -> Result<MessageTemplate, CommandRouteError>;
}

fn encode_action_value_component(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '%' | ';' | '=' => {
                let byte = ch as u8;
                encoded.push('%');
                encoded.push(hex_digit(byte >> 4));
                encoded.push(hex_digit(byte & 0x0f));
            }
            _ => encoded.push(ch),
        }
    }
    encoded
}

fn decode_action_value_component(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0usize;

    while index < bytes.len() {
        match bytes[index] {
            b'%' => {
                if index + 2 >= bytes.len() {
                    return None;
                }

                let high = hex_nibble(bytes[index + 1])?;
                let low = hex_nibble(bytes[index + 2])?;
                decoded.push((high << 4) | low);
                index += 3;
            }
            byte => {
                decoded.push(byte);
                index += 1;
            }
        }
    }

    String::from_utf8(decoded).ok()
}

fn hex_digit(value: u8) -> char {
    char::from(b"0123456789ABCDEF"[usize::from(value & 0x0f)])
}

fn hex_nibble(value: u8) -> Option<u8> {
    match value {
        b'0'..=b'9' => Some(value - b'0'),
        b'a'..=b'f' => Some(value - b'a' + 10),
        b'A'..=b'F' => Some(value - b'A' + 10),
        _ => None,
    }
}
