use crate::config::MqttConfig;
use crate::models::DisplayFrame;
use async_trait::async_trait;
use log::{debug, info};
use rumqttc::{AsyncClient, Event, MqttOptions, Outgoing, Packet, QoS};
use std::time::Duration;
use thiserror::Error;

const KEEP_ALIVE: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("cannot encode frames: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),
    #[error("MQTT connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),
    #[error("broker did not acknowledge within {0:?}")]
    Timeout(Duration),
}

/// Where formatted frames end up.
#[async_trait]
pub trait FrameSink: Send + Sync {
    async fn publish(&self, frames: &[DisplayFrame]) -> Result<(), PublishError>;
}

/// A lone frame goes out as an object, several as an array of pages.
pub fn encode_frames(frames: &[DisplayFrame]) -> Result<Vec<u8>, serde_json::Error> {
    match frames {
        [single] => serde_json::to_vec(single),
        many => serde_json::to_vec(many),
    }
}

pub struct MqttPublisher {
    config: MqttConfig,
}

impl MqttPublisher {
    pub fn new(config: MqttConfig) -> Self {
        Self { config }
    }

    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(
            self.config.client_id.clone(),
            self.config.broker.clone(),
            self.config.port,
        );
        options.set_keep_alive(KEEP_ALIVE);
        options.set_clean_session(true);
        if let Some((username, password)) = &self.config.credentials {
            options.set_credentials(username, password);
        }
        // Room for a full page set
        options.set_max_packet_size(256 * 1024, 256 * 1024);
        options
    }

    // Connect, publish once, wait for the ack, disconnect
    async fn publish_once(&self, payload: Vec<u8>) -> Result<(), PublishError> {
        let (client, mut eventloop) = AsyncClient::new(self.options(), 10);
        client
            .publish(&self.config.topic, QoS::AtLeastOnce, false, payload)
            .await?;

        loop {
            match eventloop.poll().await? {
                Event::Incoming(Packet::ConnAck(_)) => {
                    debug!("Connected to {}:{}", self.config.broker, self.config.port);
                }
                Event::Incoming(Packet::PubAck(_)) => {
                    client.disconnect().await?;
                }
                Event::Outgoing(Outgoing::Disconnect) => return Ok(()),
                _ => {}
            }
        }
    }
}

#[async_trait]
impl FrameSink for MqttPublisher {
    async fn publish(&self, frames: &[DisplayFrame]) -> Result<(), PublishError> {
        let payload = encode_frames(frames)?;
        info!(
            "Publishing {} frame(s) ({} bytes) to {}",
            frames.len(),
            payload.len(),
            self.config.topic
        );

        tokio::time::timeout(self.config.timeout, self.publish_once(payload))
            .await
            .map_err(|_| PublishError::Timeout(self.config.timeout))?
    }
}
