//! Conversation flow: turns user events into alert lifecycle actions and
//! replies.
//!
//! Flow per conversation: `/start` asks for a location, a location starts
//! (or restarts) rain alerts and opens the actions menu, exit or sign-out
//! stops alerts and forgets the conversation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{ConversationId, Location, Notification};
use rain_alerts::{AlertScheduler, Messenger};
use sataako_client::{RainMap, RainMapClient};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub const SHOW_MAP: &str = "Show rain map";
pub const UPDATE_LOCATION: &str = "Update location";
pub const EXIT_APP: &str = "Exit application";
pub const START_APP: &str = "Start application";

const WELCOME: &str = "Hey there and welcome to the Sataako service! Send your location to get started.";
const LOCATION_UPDATED: &str = "Your location has been updated!";
const BAD_LOCATION: &str = "That location doesn't look right. Please send it again.";
const FETCHING_MAP: &str = "Hold on tight, we're fetching the rain map.";
const GOODBYE: &str =
    "Hope you enjoyed the service. Choose \"Start application\" to use it again. Bye!";
const UNKNOWN_COMMAND: &str = "Sorry, I didn't understand that command.";

/// Something a user did in a conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum UserEvent {
    Start,
    Location(Location),
    ShowMap,
    Exit,
    SignOut,
    Text(String),
    UnknownCommand(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    AwaitingLocation,
    HandlingActions,
}

#[async_trait]
pub trait RainMapSource: Send + Sync {
    async fn get_rain_map(&self) -> RainMap;
}

#[async_trait]
impl RainMapSource for RainMapClient {
    async fn get_rain_map(&self) -> RainMap {
        RainMapClient::get_rain_map(self).await
    }
}

pub struct ConversationHandler {
    scheduler: AlertScheduler,
    rain_map: Arc<dyn RainMapSource>,
    messenger: Arc<dyn Messenger>,
    interval: Duration,
    flows: RwLock<HashMap<ConversationId, FlowState>>,
}

impl ConversationHandler {
    pub fn new(
        scheduler: AlertScheduler,
        rain_map: Arc<dyn RainMapSource>,
        messenger: Arc<dyn Messenger>,
        interval: Duration,
    ) -> Self {
        Self {
            scheduler,
            rain_map,
            messenger,
            interval,
            flows: RwLock::new(HashMap::new()),
        }
    }

    pub fn scheduler(&self) -> &AlertScheduler {
        &self.scheduler
    }

    pub async fn flow_state(&self, conversation: ConversationId) -> Option<FlowState> {
        self.flows.read().await.get(&conversation).copied()
    }

    pub async fn handle(&self, conversation: ConversationId, event: UserEvent) {
        let current = self.flow_state(conversation).await;

        match (event, current) {
            (UserEvent::Start, current) => {
                info!(conversation = %conversation, "Starting new conversation");
                if current == Some(FlowState::HandlingActions) {
                    self.scheduler.stop(conversation);
                }
                self.set_flow(conversation, FlowState::AwaitingLocation).await;
                self.reply(conversation, Notification::text(WELCOME)).await;
            }

            (UserEvent::Location(location), Some(_)) => {
                if !location.is_valid() {
                    warn!(conversation = %conversation, ?location, "Rejected invalid location");
                    self.reply(conversation, Notification::text(BAD_LOCATION)).await;
                    return;
                }
                info!(conversation = %conversation, "Updating location");
                self.scheduler.start(conversation, location, self.interval);
                self.set_flow(conversation, FlowState::HandlingActions).await;
                self.reply(conversation, Notification::text(LOCATION_UPDATED)).await;
                self.show_menu(conversation).await;
            }

            (UserEvent::ShowMap, Some(FlowState::HandlingActions)) => {
                info!(conversation = %conversation, "Getting rain map");
                self.reply(conversation, Notification::text(FETCHING_MAP)).await;
                let map = self.rain_map.get_rain_map().await;
                self.reply(conversation, Notification::Text(map.caption)).await;
                if let Some(url) = map.image_url {
                    self.reply(conversation, Notification::Image { url }).await;
                }
                self.show_menu(conversation).await;
            }

            (UserEvent::Exit, Some(FlowState::HandlingActions))
            | (UserEvent::SignOut, Some(_)) => {
                info!(conversation = %conversation, "Conversation exited the application");
                self.scheduler.stop(conversation);
                self.flows.write().await.remove(&conversation);
                self.reply(conversation, Notification::text(GOODBYE)).await;
                self.reply(conversation, Notification::Menu(vec![START_APP.into()]))
                    .await;
            }

            (UserEvent::UnknownCommand(command), _) => {
                debug!(conversation = %conversation, %command, "Unknown command");
                self.reply(conversation, Notification::text(UNKNOWN_COMMAND)).await;
            }

            (event, state) => {
                debug!(conversation = %conversation, ?event, ?state, "Ignoring event");
            }
        }
    }

    async fn set_flow(&self, conversation: ConversationId, state: FlowState) {
        self.flows.write().await.insert(conversation, state);
    }

    async fn show_menu(&self, conversation: ConversationId) {
        let options = vec![SHOW_MAP.into(), UPDATE_LOCATION.into(), EXIT_APP.into()];
        self.reply(conversation, Notification::Menu(options)).await;
    }

    async fn reply(&self, conversation: ConversationId, content: Notification) {
        if let Err(e) = self.messenger.send(conversation, content).await {
            warn!(conversation = %conversation, "Reply delivery failed: {}", e);
        }
    }
}
