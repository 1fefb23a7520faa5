use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::common::{NetworkCommand, NetworkEvent};
use crate::config::{self, SessionConfig};
use crate::error::ChatError;

const KEEP_ALIVE: Duration = Duration::from_secs(30);
const CHANNEL_CAPACITY: usize = 100;

/// Background task owning the MQTT connection.
///
/// Consumes [`NetworkCommand`]s from the session loop and forwards inbound
/// payloads as [`NetworkEvent`]s, so the core logic never touches transport
/// threading details.
pub struct MqttClient {
    client: AsyncClient,
    eventloop: rumqttc::EventLoop,
    event_sender: mpsc::Sender<NetworkEvent>,
    command_receiver: mpsc::Receiver<NetworkCommand>,
}

impl MqttClient {
    pub fn new(
        config: &SessionConfig,
        event_sender: mpsc::Sender<NetworkEvent>,
        command_receiver: mpsc::Receiver<NetworkCommand>,
    ) -> Self {
        let client_id = format!("tmessage-{}", Uuid::new_v4().simple());
        let mut options = MqttOptions::new(client_id, &config.server, config.port);
        options.set_keep_alive(KEEP_ALIVE);

        let (client, eventloop) = AsyncClient::new(options, CHANNEL_CAPACITY);
        Self {
            client,
            eventloop,
            event_sender,
            command_receiver,
        }
    }

    pub async fn run(mut self) -> Result<(), ChatError> {
        // Connecting phase: nothing is subscribed or published until the
        // broker acknowledges the connection.
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => break,
                Ok(_) => {}
                Err(err) => {
                    let _ = self
                        .event_sender
                        .send(NetworkEvent::ConnectionFailed(err.to_string()))
                        .await;
                    return Err(ChatError::Connection(err));
                }
            }
        }

        self.client
            .subscribe(config::CHAT_TOPIC, QoS::AtMostOnce)
            .await?;
        log::info!("Subscribed to topic `{}`", config::CHAT_TOPIC);
        let _ = self.event_sender.send(NetworkEvent::Connected).await;

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => match command {
                    Some(NetworkCommand::Publish(payload)) => {
                        if let Err(err) = self
                            .client
                            .publish(config::CHAT_TOPIC, QoS::AtMostOnce, false, payload)
                            .await
                        {
                            log::warn!("Publish error: {err}");
                        }
                    }
                    // A closed channel means the session loop is gone.
                    Some(NetworkCommand::Shutdown) | None => {
                        let _ = self.client.disconnect().await;
                        log::info!("Disconnected from broker");
                        return Ok(());
                    }
                },
                event = self.eventloop.poll() => {
                    match event {
                        Ok(Event::Incoming(Packet::Publish(publish))) => {
                            let payload = String::from_utf8_lossy(&publish.payload).into_owned();
                            let _ = self
                                .event_sender
                                .send(NetworkEvent::MessageReceived(payload))
                                .await;
                        }
                        Ok(_) => {}
                        Err(err) => {
                            let _ = self
                                .event_sender
                                .send(NetworkEvent::ConnectionLost(err.to_string()))
                                .await;
                            return Err(ChatError::Connection(err));
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refused_connection_fails_before_any_subscription() {
        // Bind then drop a listener so the port is known to be closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("local addr").port()
        };

        let config = SessionConfig {
            server: "127.0.0.1".to_string(),
            port,
            store_enabled: false,
        };
        let (_cmd_tx, cmd_rx) = mpsc::channel(8);
        let (event_tx, mut event_rx) = mpsc::channel(8);
        let client = MqttClient::new(&config, event_tx, cmd_rx);

        let result = client.run().await;
        assert!(matches!(result, Err(ChatError::Connection(_))));

        match event_rx.recv().await {
            Some(NetworkEvent::ConnectionFailed(_)) => {}
            other => panic!("expected ConnectionFailed, got {other:?}"),
        }
        // The task stopped during the connecting phase, so its event sender
        // is gone and no Connected or MessageReceived can ever arrive.
        assert!(event_rx.recv().await.is_none());
    }
}
