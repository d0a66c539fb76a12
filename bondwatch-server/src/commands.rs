//! Operator chat commands.
//!
//! The CommandHandler is responsible for:
//! - Parsing `/chatid`, `/test`, `/setkeyword <kw>` and `/getkeyword`
//!   (optionally addressed as `/command@botname`)
//! - Restricting `/setkeyword` to the authorized chat
//! - Replying to the chat the command came from

use bondwatch_core::config::KeywordStore;
use bondwatch_core::events::{IncomingMessage, TransportEvent, TransportEventReceiver};
use bondwatch_core::transport::ChatTransport;
use kanau::processor::Processor;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ChatId,
    Test,
    /// The argument, trimmed; empty when none was given.
    SetKeyword(String),
    GetKeyword,
}

/// Parse a chat message into a command. Anything else yields `None`.
pub fn parse_command(text: &str) -> Option<Command> {
    let text = text.trim_start();
    let (head, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    let name = head.strip_prefix('/')?;
    let name = name.split_once('@').map_or(name, |(name, _bot)| name);

    match name {
        "chatid" => Some(Command::ChatId),
        "test" => Some(Command::Test),
        "setkeyword" => Some(Command::SetKeyword(rest.trim().to_string())),
        "getkeyword" => Some(Command::GetKeyword),
        _ => None,
    }
}

/// Answers operator commands over the chat transport.
pub struct CommandHandler {
    transport: Arc<dyn ChatTransport>,
    keyword: KeywordStore,
    authorized_chat_id: i64,
}

impl CommandHandler {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        keyword: KeywordStore,
        authorized_chat_id: i64,
    ) -> Self {
        Self {
            transport,
            keyword,
            authorized_chat_id,
        }
    }

    /// The reply for `message`, or `None` if it is not a command.
    pub async fn reply(&self, message: &IncomingMessage) -> Option<String> {
        let command = parse_command(&message.text)?;
        info!(
            chat_id = message.chat_id,
            from = message.from_username.as_deref().unwrap_or("-"),
            ?command,
            "Received command"
        );

        let reply = match command {
            Command::ChatId => format!("Your Chat ID is: {}", message.chat_id),
            Command::Test => "Bot is working! 🚀".to_string(),
            Command::SetKeyword(_) if message.chat_id != self.authorized_chat_id => {
                warn!(chat_id = message.chat_id, "Unauthorized /setkeyword");
                "⛔ You are not authorized to change the keyword.".to_string()
            }
            Command::SetKeyword(keyword) if keyword.is_empty() => {
                "Usage: /setkeyword <keyword>".to_string()
            }
            Command::SetKeyword(keyword) => match self.keyword.set_keyword(&keyword).await {
                Ok(updated) => {
                    info!(keyword = %updated.keyword, "Keyword updated");
                    format!("✅ Keyword set to: {}", updated.keyword)
                }
                Err(e) => {
                    error!(error = %e, "Failed to save keyword");
                    "❌ Failed to save keyword.".to_string()
                }
            },
            Command::GetKeyword => {
                let keyword = self.keyword.keyword().await;
                if keyword.is_empty() {
                    "No keyword set.".to_string()
                } else {
                    format!("Current keyword: {keyword}")
                }
            }
        };
        Some(reply)
    }

    /// Answer commands from `events` until shutdown or until the channel
    /// closes.
    pub async fn run(self, mut events: TransportEventReceiver, mut shutdown_rx: watch::Receiver<bool>) {
        if *shutdown_rx.borrow_and_update() {
            return;
        }
        info!("CommandHandler started");

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("CommandHandler received shutdown signal");
                        break;
                    }
                }

                event = events.recv() => match event {
                    Ok(TransportEvent::Message(message)) => {
                        let Ok(()) = self.process(message).await;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "CommandHandler lagged behind transport events");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        info!("CommandHandler shutdown complete");
    }
}

impl Processor<IncomingMessage> for CommandHandler {
    type Output = ();
    type Error = Infallible;

    async fn process(&self, message: IncomingMessage) -> Result<(), Infallible> {
        let Some(reply) = self.reply(&message).await else {
            debug!(chat_id = message.chat_id, "Ignoring non-command message");
            return Ok(());
        };
        if let Err(e) = self.transport.send_message(message.chat_id, &reply).await {
            error!(chat_id = message.chat_id, error = %e, "Failed to reply to command");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubTransport;

    const AUTHORIZED: i64 = 100;

    fn message(chat_id: i64, text: &str) -> IncomingMessage {
        IncomingMessage {
            chat_id,
            text: text.to_string(),
            from_username: Some("operator".to_string()),
        }
    }

    async fn setup(dir: &tempfile::TempDir) -> (Arc<StubTransport>, KeywordStore, CommandHandler) {
        let transport = Arc::new(StubTransport::default());
        let keyword = KeywordStore::load(dir.path().join("keyword.json")).await;
        let handler = CommandHandler::new(
            Arc::clone(&transport) as Arc<dyn ChatTransport>,
            keyword.clone(),
            AUTHORIZED,
        );
        (transport, keyword, handler)
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/chatid"), Some(Command::ChatId));
        assert_eq!(parse_command("/test@watch_bot"), Some(Command::Test));
        assert_eq!(
            parse_command("/setkeyword  Moon "),
            Some(Command::SetKeyword("Moon".to_string()))
        );
        assert_eq!(
            parse_command("/setkeyword@watch_bot doge"),
            Some(Command::SetKeyword("doge".to_string()))
        );
        assert_eq!(parse_command("/setkeyword"), Some(Command::SetKeyword(String::new())));
        assert_eq!(parse_command("/getkeyword"), Some(Command::GetKeyword));
        assert_eq!(parse_command("hello /test"), None);
        assert_eq!(parse_command("/start"), None);
        assert_eq!(parse_command(""), None);
    }

    #[tokio::test]
    async fn test_chatid_and_test_replies() {
        let dir = tempfile::tempdir().unwrap();
        let (transport, _keyword, handler) = setup(&dir).await;

        handler.process(message(-55, "/chatid")).await.unwrap();
        handler.process(message(-55, "/test")).await.unwrap();
        handler.process(message(-55, "just chatting")).await.unwrap();

        assert_eq!(
            transport.sent(),
            vec![
                (-55, "Your Chat ID is: -55".to_string()),
                (-55, "Bot is working! 🚀".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_setkeyword_persists_lowercased() {
        let dir = tempfile::tempdir().unwrap();
        let (_transport, keyword, handler) = setup(&dir).await;

        let reply = handler.reply(&message(AUTHORIZED, "/setkeyword MOON")).await;
        assert_eq!(reply.as_deref(), Some("✅ Keyword set to: moon"));
        assert_eq!(keyword.keyword().await, "moon");

        let reloaded = KeywordStore::load(dir.path().join("keyword.json")).await;
        assert_eq!(reloaded.keyword().await, "moon");

        let reply = handler.reply(&message(-1, "/getkeyword")).await;
        assert_eq!(reply.as_deref(), Some("Current keyword: moon"));
    }

    #[tokio::test]
    async fn test_setkeyword_requires_authorized_chat() {
        let dir = tempfile::tempdir().unwrap();
        let (_transport, keyword, handler) = setup(&dir).await;

        let reply = handler.reply(&message(AUTHORIZED + 1, "/setkeyword moon")).await;
        assert!(reply.unwrap().contains("not authorized"));
        assert_eq!(keyword.keyword().await, "");
        assert!(!dir.path().join("keyword.json").exists());
    }

    #[tokio::test]
    async fn test_setkeyword_without_argument() {
        let dir = tempfile::tempdir().unwrap();
        let (_transport, keyword, handler) = setup(&dir).await;

        let reply = handler.reply(&message(AUTHORIZED, "/setkeyword   ")).await;
        assert_eq!(reply.as_deref(), Some("Usage: /setkeyword <keyword>"));
        assert_eq!(keyword.keyword().await, "");
    }

    #[tokio::test]
    async fn test_getkeyword_when_unset() {
        let dir = tempfile::tempdir().unwrap();
        let (_transport, _keyword, handler) = setup(&dir).await;
        let reply = handler.reply(&message(AUTHORIZED, "/getkeyword")).await;
        assert_eq!(reply.as_deref(), Some("No keyword set."));
    }

    #[tokio::test]
    async fn test_run_answers_messages_until_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let (transport, _keyword, handler) = setup(&dir).await;
        let (events, _) = bondwatch_core::events::transport_event_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(handler.run(events.subscribe(), shutdown_rx));

        events.send(TransportEvent::Polled).unwrap();
        events
            .send(TransportEvent::Message(message(7, "/test")))
            .unwrap();

        for _ in 0..100 {
            if !transport.sent().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(transport.sent(), vec![(7, "Bot is working! 🚀".to_string())]);

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_run_stops_when_shutdown_sender_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let (_transport, _keyword, handler) = setup(&dir).await;
        let (events, _) = bondwatch_core::events::transport_event_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(handler.run(events.subscribe(), shutdown_rx));

        drop(shutdown_tx);
        tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
    }
}
