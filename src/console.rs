//! Console transport for local deployment.
//!
//! Reads one user event per stdin line and prints every outgoing
//! notification to stdout.

use std::sync::Arc;

use async_trait::async_trait;
use common::{ConversationId, Error, Location, Notification};
use rain_alerts::Messenger;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::conversation::{ConversationHandler, UserEvent, EXIT_APP, SHOW_MAP, START_APP};

/// Conversation id used for the single console user.
pub const CONSOLE_CONVERSATION: ConversationId = ConversationId(1);

#[derive(Debug, Clone, Default)]
pub struct ConsoleMessenger;

#[async_trait]
impl Messenger for ConsoleMessenger {
    async fn send(&self, conversation: ConversationId, content: Notification) -> Result<(), Error> {
        println!("[{conversation}] {content}");
        Ok(())
    }
}

/// Map a typed line to an event. Blank lines map to nothing.
pub fn parse_line(line: &str) -> Option<UserEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let lowered = line.to_ascii_lowercase();
    let mut words = lowered.split_whitespace();
    let head = words.next()?;

    let event = match head {
        "/start" => UserEvent::Start,
        "/sign_out" => UserEvent::SignOut,
        "map" => UserEvent::ShowMap,
        "exit" => UserEvent::Exit,
        "location" | "/location" => {
            let lat = words.next().and_then(|w| w.parse::<f64>().ok());
            let lon = words.next().and_then(|w| w.parse::<f64>().ok());
            match (lat, lon) {
                (Some(lat), Some(lon)) => UserEvent::Location(Location::new(lat, lon)),
                _ => UserEvent::Text(line.to_string()),
            }
        }
        cmd if cmd.starts_with('/') => UserEvent::UnknownCommand(cmd.to_string()),
        _ if line.eq_ignore_ascii_case(SHOW_MAP) => UserEvent::ShowMap,
        _ if line.eq_ignore_ascii_case(EXIT_APP) => UserEvent::Exit,
        _ if line.eq_ignore_ascii_case(START_APP) => UserEvent::Start,
        _ => UserEvent::Text(line.to_string()),
    };
    Some(event)
}

/// Feed stdin to the handler until EOF.
pub async fn run_console(handler: Arc<ConversationHandler>) -> Result<(), Error> {
    info!("Console ready: /start, location <lat> <lon>, map, exit, /sign_out");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if let Some(event) = parse_line(&line) {
            handler.handle(CONSOLE_CONVERSATION, event).await;
        }
    }

    info!("Console input closed");
    Ok(())
}
