//! AMQP announcer: publishes the indexing metadata to a durable RabbitMQ queue.

use crate::load_config::BrokerConfig;
use async_trait::async_trait;
use dataset_uploader_core::contract::{Announcer, BoxError, IndexingMetadata};
use lapin::options::{BasicPublishOptions, ConfirmSelectOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::uri::{AMQPAuthority, AMQPScheme, AMQPUri, AMQPUserInfo};
use lapin::{BasicProperties, Connection, ConnectionProperties};
use tracing::{debug, info, warn};

/// AMQP delivery mode for messages that survive a broker restart.
const PERSISTENT: u8 = 2;

/// Opens one connection per announcement, declares the queue durable,
/// publishes on the default exchange, waits for the publisher confirm and
/// closes the connection again. lapin runs on the caller's tokio runtime.
pub struct AmqpAnnouncer {
    config: BrokerConfig,
}

impl AmqpAnnouncer {
    pub fn new(config: BrokerConfig) -> Self {
        Self { config }
    }

    pub fn uri(&self) -> AMQPUri {
        AMQPUri {
            scheme: AMQPScheme::AMQP,
            authority: AMQPAuthority {
                userinfo: AMQPUserInfo {
                    username: self.config.username.clone(),
                    password: self.config.password.clone(),
                },
                host: self.config.host.clone(),
                port: self.config.port,
            },
            vhost: "/".to_string(),
            query: Default::default(),
        }
    }
}

#[async_trait]
impl Announcer for AmqpAnnouncer {
    async fn announce(&self, message: &IndexingMetadata) -> Result<(), BoxError> {
        let queue = self.config.queue.as_str();
        let payload = serde_json::to_vec(message)?;

        info!(
            host = %self.config.host,
            port = self.config.port,
            queue,
            "Connecting to message broker"
        );
        let properties = ConnectionProperties::default()
            .with_executor(tokio_executor_trait::Tokio::current())
            .with_reactor(tokio_reactor_trait::Tokio);
        let connection = Connection::connect_uri(self.uri(), properties).await?;
        let channel = connection.create_channel().await?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await?;

        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;
        debug!(queue, "Declared durable queue");

        let confirm = channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default().with_delivery_mode(PERSISTENT),
            )
            .await?;
        let confirmation = confirm.await?;
        if confirmation.is_nack() {
            warn!(queue, "Broker rejected the indexing metadata");
            connection.close(200, "OK").await?;
            return Err(format!("broker did not accept the message for queue {queue}").into());
        }
        info!(queue, bytes = payload.len(), "Published indexing metadata");

        connection.close(200, "OK").await?;
        Ok(())
    }

    fn destination(&self) -> String {
        self.config.queue.clone()
    }
}
