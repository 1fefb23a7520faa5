//! Interactive session loop: the send path (stdin) and the receive path
//! (network events) multiplexed in one task, with interrupt handling.

pub mod render;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;

use crate::common::codec;
use crate::common::{AuthenticatedIdentity, NetworkCommand, NetworkEvent};
use crate::storage::MessageStore;

/// Why the session ended. Every variant maps to one closing message; the
/// caller runs the same cleanup for all of them.
#[derive(Debug)]
pub enum SessionEnd {
    Interrupted,
    ConnectionFailed(String),
    ConnectionLost(String),
    InputClosed,
}

pub struct ChatSession {
    identity: AuthenticatedIdentity,
    command_sender: mpsc::Sender<NetworkCommand>,
    event_receiver: mpsc::Receiver<NetworkEvent>,
    /// `None` when the user passed `--dont-store`.
    store: Option<MessageStore>,
}

impl ChatSession {
    pub fn new(
        identity: AuthenticatedIdentity,
        command_sender: mpsc::Sender<NetworkCommand>,
        event_receiver: mpsc::Receiver<NetworkEvent>,
        store: Option<MessageStore>,
    ) -> Self {
        Self {
            identity,
            command_sender,
            event_receiver,
            store,
        }
    }

    pub async fn run(mut self) -> SessionEnd {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    log::info!("Interrupt received, closing session");
                    return SessionEnd::Interrupted;
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => self.handle_line(&line).await,
                    Ok(None) | Err(_) => return SessionEnd::InputClosed,
                },
                event = self.event_receiver.recv() => match event {
                    Some(event) => {
                        if let Some(end) = self.handle_event(event) {
                            return end;
                        }
                    }
                    None => return SessionEnd::ConnectionLost("network task stopped".to_string()),
                },
            }
        }
    }

    /// Send path: publish one message per non-empty input line.
    async fn handle_line(&mut self, raw: &str) {
        if raw.is_empty() {
            render::notice("Can't send empty message");
            return;
        }

        let payload = codec::encode(&self.identity.user_id, &self.identity.display_name, raw);
        // Only messages the network task accepted go into the session log.
        if let Err(err) = self
            .command_sender
            .send(NetworkCommand::Publish(payload))
            .await
        {
            log::warn!("Failed to send command to network: {err}");
            return;
        }

        self.store_message(&self.identity.user_id, raw);
    }

    fn handle_event(&mut self, event: NetworkEvent) -> Option<SessionEnd> {
        match event {
            NetworkEvent::Connected => {
                render::info("Connected. Type a message and press Enter to send.");
                None
            }
            NetworkEvent::MessageReceived(payload) => {
                self.handle_payload(&payload);
                None
            }
            NetworkEvent::ConnectionFailed(reason) => Some(SessionEnd::ConnectionFailed(reason)),
            NetworkEvent::ConnectionLost(reason) => Some(SessionEnd::ConnectionLost(reason)),
        }
    }

    /// Receive path: decode, drop own messages, render and store the rest.
    fn handle_payload(&mut self, payload: &str) {
        let message = codec::decode(payload);
        // Anti-echo: this client already displayed and stored its own
        // message at publish time.
        if message.sender_id == self.identity.user_id {
            return;
        }

        render::incoming(payload);
        self.store_message(&message.sender_id, &message.body);
    }

    fn store_message(&self, user: &str, content: &str) {
        let Some(store) = &self.store else {
            return;
        };
        // A failed append is logged but never ends the chat.
        if let Err(err) = store.append(user, content) {
            log::warn!("Failed to store message: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use chrono::Local;

    fn session(
        store: Option<MessageStore>,
    ) -> (
        ChatSession,
        mpsc::Receiver<NetworkCommand>,
        mpsc::Sender<NetworkEvent>,
    ) {
        let identity = AuthenticatedIdentity {
            user_id: "bob".to_string(),
            display_name: "Bob".to_string(),
        };
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (event_tx, event_rx) = mpsc::channel(8);
        (
            ChatSession::new(identity, cmd_tx, event_rx, store),
            cmd_rx,
            event_tx,
        )
    }

    fn stored_records(store_path: &std::path::Path) -> Vec<serde_json::Value> {
        match fs::read_to_string(store_path) {
            Ok(content) => content
                .lines()
                .map(|line| serde_json::from_str(line).expect("valid record"))
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    #[tokio::test]
    async fn empty_input_is_rejected_without_publish() {
        let (mut session, mut cmd_rx, _event_tx) = session(None);

        session.handle_line("").await;

        assert!(cmd_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn non_empty_input_publishes_exactly_once_and_stores() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MessageStore::new(dir.path(), Local::now());
        let store_path = store.path().to_path_buf();
        let (mut session, mut cmd_rx, _event_tx) = session(Some(store));

        session.handle_line("hello").await;

        match cmd_rx.try_recv() {
            Ok(NetworkCommand::Publish(payload)) => assert_eq!(payload, "[bob] Bob: hello"),
            other => panic!("expected one publish, got {other:?}"),
        }
        assert!(cmd_rx.try_recv().is_err());

        let records = stored_records(&store_path);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["from"], "bob");
        assert_eq!(records[0]["content"], "hello");
    }

    #[tokio::test]
    async fn own_messages_are_never_stored_on_receive() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MessageStore::new(dir.path(), Local::now());
        let store_path = store.path().to_path_buf();
        let (mut session, _cmd_rx, _event_tx) = session(Some(store));

        session.handle_payload("[bob] Bob: hello");

        assert!(stored_records(&store_path).is_empty());
    }

    #[tokio::test]
    async fn other_senders_are_stored_with_decoded_attribution() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MessageStore::new(dir.path(), Local::now());
        let store_path = store.path().to_path_buf();
        let (mut session, _cmd_rx, _event_tx) = session(Some(store));

        session.handle_payload("[carol] Carol: hi");

        let records = stored_records(&store_path);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["from"], "carol");
        assert_eq!(records[0]["content"], "hi");
    }

    #[tokio::test]
    async fn unknown_sender_is_not_mistaken_for_self() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MessageStore::new(dir.path(), Local::now());
        let store_path = store.path().to_path_buf();
        let (mut session, _cmd_rx, _event_tx) = session(Some(store));

        // No bracket pair: decodes to an empty sender id, which is a valid
        // unknown sender and must still be stored.
        session.handle_payload("garbled payload");

        let records = stored_records(&store_path);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["from"], "");
    }

    #[tokio::test]
    async fn unpublished_input_is_not_logged() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MessageStore::new(dir.path(), Local::now());
        let store_path = store.path().to_path_buf();
        let (mut session, cmd_rx, _event_tx) = session(Some(store));

        // Network task gone: publishing is impossible, so nothing may be
        // recorded either.
        drop(cmd_rx);
        session.handle_line("hello").await;

        assert!(stored_records(&store_path).is_empty());
    }

    #[tokio::test]
    async fn connection_events_end_the_session() {
        let (mut session, _cmd_rx, _event_tx) = session(None);

        let end = session.handle_event(NetworkEvent::ConnectionFailed("refused".to_string()));
        assert!(matches!(end, Some(SessionEnd::ConnectionFailed(_))));

        let end = session.handle_event(NetworkEvent::ConnectionLost("reset".to_string()));
        assert!(matches!(end, Some(SessionEnd::ConnectionLost(_))));
    }

    #[tokio::test]
    async fn disabled_store_keeps_chat_working() {
        let (mut session, mut cmd_rx, _event_tx) = session(None);

        session.handle_payload("[carol] Carol: hi");
        session.handle_line("hello").await;

        assert!(matches!(
            cmd_rx.try_recv(),
            Ok(NetworkCommand::Publish(_))
        ));
    }
}
