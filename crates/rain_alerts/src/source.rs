//! Seams to the outside world: where forecasts come from and where
//! notifications go.

use async_trait::async_trait;
use common::{ConversationId, Error, ForecastDocument, Location, Notification};
use sataako_client::ForecastClient;

#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch(&self, location: &Location) -> Result<ForecastDocument, Error>;
}

#[async_trait]
impl ForecastSource for ForecastClient {
    async fn fetch(&self, location: &Location) -> Result<ForecastDocument, Error> {
        ForecastClient::fetch(self, location).await
    }
}

/// Delivers content to a conversation. Formatting is the transport's job.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, conversation: ConversationId, content: Notification) -> Result<(), Error>;
}
