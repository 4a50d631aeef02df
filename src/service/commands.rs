//! Chat command interpreter.
//!
//! A message is addressed to the relay when its first space-separated word
//! is one of the trigger words (case-insensitive). The second word selects
//! a handler from [`COMMANDS`]; anything that goes wrong while handling it
//! collapses into a short reply, never an error.

use std::sync::Arc;

use crate::domain::{ChannelId, GameEmbed, GameId, OutboundMessage};
use crate::error::RelayError;
use crate::persistence::SubscriptionStore;
use crate::source::GameSource;

/// Reply for anything the interpreter cannot make sense of.
pub const CONFUSED_REPLY: &str = "Huh?";

/// Reply when `follow` names a game that cannot be read.
pub const INVALID_GAME_REPLY: &str = "That game seems to be invalid!";

/// Messages answered regardless of trigger word.
const CHATTER: &[(&str, &str)] = &[
    ("lol", "lol xD"),
    ("rofl", "lol xD"),
    ("lmao", "lol xD"),
    ("haha", "lol xD"),
    ("hihi", "lol xD"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandKind {
    Greet,
    Follow,
    Unfollow,
    Alert,
    Silence,
    List,
}

/// Command keyword table.
const COMMANDS: &[(&str, CommandKind)] = &[
    ("hi", CommandKind::Greet),
    ("hello", CommandKind::Greet),
    ("help", CommandKind::Greet),
    ("follow", CommandKind::Follow),
    ("unfollow", CommandKind::Unfollow),
    ("alert", CommandKind::Alert),
    ("silence", CommandKind::Silence),
    ("list", CommandKind::List),
];

fn lookup(keyword: &str) -> Option<CommandKind> {
    COMMANDS
        .iter()
        .find(|(name, _)| *name == keyword)
        .map(|(_, kind)| *kind)
}

/// Translates chat text into store operations and replies.
#[derive(Clone)]
pub struct CommandInterpreter {
    store: Arc<dyn SubscriptionStore>,
    source: Arc<dyn GameSource>,
    trigger_words: Vec<String>,
    description: String,
}

impl std::fmt::Debug for CommandInterpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandInterpreter")
            .field("trigger_words", &self.trigger_words)
            .finish_non_exhaustive()
    }
}

impl CommandInterpreter {
    /// Creates an interpreter answering to `trigger_words`.
    #[must_use]
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        source: Arc<dyn GameSource>,
        trigger_words: Vec<String>,
    ) -> Self {
        let trigger_words: Vec<String> = trigger_words
            .into_iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        let description = describe(&trigger_words);
        Self {
            store,
            source,
            trigger_words,
            description,
        }
    }

    /// Handles one inbound chat message and returns the reply, if any.
    pub async fn handle(
        &self,
        author: &str,
        channel: ChannelId,
        content: &str,
    ) -> Option<OutboundMessage> {
        if let Some((_, reply)) = CHATTER.iter().find(|(word, _)| *word == content) {
            return Some(OutboundMessage::from(*reply));
        }

        let mut words = content.split(' ');
        let first = words.next()?.to_lowercase();
        if !self.trigger_words.contains(&first) {
            return None;
        }
        let command = words.next().unwrap_or_default();
        let arguments: Vec<&str> = words.collect();
        tracing::debug!(%channel, %author, command, ?arguments, "received command");

        let reply = match lookup(command) {
            Some(kind) => self.dispatch(kind, author, channel, &arguments).await,
            None => Err(RelayError::InvalidCommand(format!(
                "unknown command: {command}"
            ))),
        };

        Some(match reply {
            Ok(reply) => reply,
            Err(RelayError::InvalidGame(reason)) => {
                tracing::info!(%channel, %reason, "refusing to follow invalid game");
                OutboundMessage::from(INVALID_GAME_REPLY)
            }
            Err(e) => {
                tracing::warn!(%channel, error = %e, content, "could not handle command");
                OutboundMessage::from(CONFUSED_REPLY)
            }
        })
    }

    async fn dispatch(
        &self,
        kind: CommandKind,
        author: &str,
        channel: ChannelId,
        arguments: &[&str],
    ) -> Result<OutboundMessage, RelayError> {
        match kind {
            CommandKind::Greet => Ok(format!("Hello, {author}!\n{}", self.description).into()),
            CommandKind::Follow => self.follow(channel, arguments).await,
            CommandKind::Unfollow => {
                let game = game_argument(arguments)?;
                let reply = if self.store.remove_poller(game, channel).await? {
                    tracing::info!(game_id = %game, %channel, "unfollowed game");
                    "Consider it done!"
                } else {
                    "Huh? What game?"
                };
                Ok(reply.into())
            }
            CommandKind::Alert if arguments.first() == Some(&"list") => {
                let alarms = self.store.alarms_for_channel(channel).await?;
                let listed: Vec<String> = alarms.iter().map(|a| format!("T-{}h", a.hours)).collect();
                Ok(format!("I'm alerting at: {}", listed.join(", ")).into())
            }
            CommandKind::Alert => {
                let hours = hours_argument(arguments)?;
                let reply = if self.store.add_alarm(hours, channel).await? {
                    tracing::info!(hours, %channel, "alarm added");
                    format!("OK, I will alert {hours} hours before a deadline.")
                } else {
                    format!("I'm already alerting {hours} hours before a deadline!")
                };
                Ok(reply.into())
            }
            CommandKind::Silence => {
                let hours = hours_argument(arguments)?;
                let reply = if self.store.remove_alarm(hours, channel).await? {
                    tracing::info!(hours, %channel, "alarm removed");
                    format!("Understood, I will stop alerting T-{hours}h..")
                } else {
                    format!("I already don't alert {hours} hours before a deadline?!")
                };
                Ok(reply.into())
            }
            CommandKind::List => {
                let pollers = self.store.pollers_for_channel(channel).await?;
                let listed: Vec<String> = pollers.iter().map(|p| p.game_id.to_string()).collect();
                Ok(format!("I'm following: {}", listed.join(", ")).into())
            }
        }
    }

    async fn follow(
        &self,
        channel: ChannelId,
        arguments: &[&str],
    ) -> Result<OutboundMessage, RelayError> {
        let game_id = game_argument(arguments)?;
        let game = self.source.fetch(game_id).await?;
        let description = if self.store.add_poller(game_id, channel).await? {
            tracing::info!(%game_id, %channel, "following game");
            format!("Now following {game_id}!")
        } else {
            "I'm already following that game!".to_string()
        };
        Ok(OutboundMessage::Embed(GameEmbed::for_game(&game, description)))
    }
}

fn game_argument(arguments: &[&str]) -> Result<GameId, RelayError> {
    let raw = arguments
        .first()
        .ok_or_else(|| RelayError::InvalidCommand("missing game id".to_string()))?;
    // A bad id is a typo, not a cancelled game.
    raw.parse::<GameId>()
        .map_err(|e| RelayError::InvalidCommand(e.to_string()))
}

fn hours_argument(arguments: &[&str]) -> Result<u32, RelayError> {
    let raw = arguments
        .first()
        .ok_or_else(|| RelayError::InvalidCommand("missing hours".to_string()))?;
    match raw.parse::<u32>() {
        Ok(hours) if hours > 0 => Ok(hours),
        _ => Err(RelayError::InvalidCommand(format!("not a number of hours: {raw}"))),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Help text listing every command, addressed with the first trigger word.
fn describe(trigger_words: &[String]) -> String {
    let name = trigger_words
        .first()
        .map_or_else(|| "Relay".to_string(), |w| capitalize(w));
    let aliases: Vec<String> = trigger_words
        .iter()
        .skip(1)
        .map(|w| format!("'{w}'"))
        .collect();
    let nickname = if aliases.is_empty() {
        String::new()
    } else {
        format!(" (friends call me {})", aliases.join(" or "))
    };
    format!(
        "I respond to the following commands{nickname}:\n\
         \x20   * {name} hi/help - I'll show you this list!\n\
         \x20   * {name} follow <ID> - I'll keep track of a game with this ID.\n\
         \x20   * {name} unfollow <N> - I'll stop following this given game.\n\
         \x20   * {name} alert <N> - I'll alert N hours before a deadline.\n\
         \x20   * {name} alert list - I'll tell you when I'm alerting.\n\
         \x20   * {name} silence <N> - I won't alert N hours before a deadline.\n\
         \x20   * {name} list - I'll give you a list of the games I'm following.\n\
         \n\
         I will give a notification when a new round starts and when a deadline\n\
         alarm goes off, and will warn you if players have not given their orders yet.\n"
    )
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::game::tests::snapshot;
    use crate::persistence::SqliteStore;
    use crate::service::scheduler::tests::FakeSource;

    async fn interpreter() -> (CommandInterpreter, Arc<SqliteStore>, Arc<FakeSource>) {
        let Ok(store) = SqliteStore::in_memory().await else {
            panic!("in-memory store opens");
        };
        let store = Arc::new(store);
        let source = Arc::new(FakeSource::default());
        for id in [1234, 1337] {
            let mut game = snapshot(None);
            let Ok(game_id) = GameId::new(id) else {
                panic!("valid id");
            };
            game.game_id = game_id;
            source.set(game).await;
        }
        source.set_invalid(666).await;
        let interpreter = CommandInterpreter::new(
            Arc::clone(&store) as Arc<dyn SubscriptionStore>,
            Arc::clone(&source) as Arc<dyn GameSource>,
            vec!["svetlana".to_string(), "svet".to_string()],
        );
        (interpreter, store, source)
    }

    const CH: ChannelId = ChannelId::new(1);

    async fn say(interpreter: &CommandInterpreter, content: &str) -> String {
        interpreter
            .handle("Foo", CH, content)
            .await
            .map(|m| m.text().to_string())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn greeting_lists_commands() {
        let (interpreter, _, _) = interpreter().await;
        for word in ["hi", "hello", "help"] {
            let reply = say(&interpreter, &format!("Svetlana {word}")).await;
            assert!(reply.starts_with("Hello, Foo!\nI respond to the following commands"));
            assert!(reply.contains("(friends call me 'svet')"));
            assert!(reply.contains("* Svetlana follow <ID>"));
        }
    }

    #[tokio::test]
    async fn follow_then_list_in_insertion_order() {
        let (interpreter, store, _) = interpreter().await;

        let Some(OutboundMessage::Embed(embed)) =
            interpreter.handle("Foo", CH, "svetlana follow 1234").await
        else {
            panic!("follow replies with an embed");
        };
        assert_eq!(embed.description, "Now following 1234!");
        assert_eq!(embed.title, "Mock - Spring, 1901 - Diplomacy phase");

        assert_eq!(
            say(&interpreter, "svet follow 1234").await,
            "I'm already following that game!"
        );
        assert_eq!(say(&interpreter, "SVET follow 1337").await, "Now following 1337!");
        assert_eq!(say(&interpreter, "svet list").await, "I'm following: 1234, 1337");
        assert_eq!(store.pollers().await.map(|p| p.len()).unwrap_or(0), 2);

        // Other channels have their own list.
        let other = interpreter
            .handle("Foo", ChannelId::new(2), "svet list")
            .await
            .map(|m| m.text().to_string())
            .unwrap_or_default();
        assert_eq!(other, "I'm following: ");
    }

    #[tokio::test]
    async fn unfollow_reports_missing_game() {
        let (interpreter, _, _) = interpreter().await;
        let _ = say(&interpreter, "svet follow 1337").await;
        assert_eq!(say(&interpreter, "svet unfollow 1337").await, "Consider it done!");
        assert_eq!(say(&interpreter, "svet unfollow 1337").await, "Huh? What game?");
    }

    #[tokio::test]
    async fn invalid_game_is_not_followed() {
        let (interpreter, store, _) = interpreter().await;
        assert_eq!(say(&interpreter, "svet follow 666").await, INVALID_GAME_REPLY);
        assert_eq!(store.pollers().await.map(|p| p.len()).unwrap_or(1), 0);
    }

    #[tokio::test]
    async fn alarms_are_managed_per_channel() {
        let (interpreter, _, _) = interpreter().await;
        assert_eq!(
            say(&interpreter, "svet alert 3").await,
            "OK, I will alert 3 hours before a deadline."
        );
        assert_eq!(
            say(&interpreter, "svet alert 3").await,
            "I'm already alerting 3 hours before a deadline!"
        );
        let _ = say(&interpreter, "svet alert 2").await;
        assert_eq!(say(&interpreter, "svet alert list").await, "I'm alerting at: T-3h, T-2h");

        assert_eq!(
            say(&interpreter, "svet silence 3").await,
            "Understood, I will stop alerting T-3h.."
        );
        assert_eq!(
            say(&interpreter, "svet silence 3").await,
            "I already don't alert 3 hours before a deadline?!"
        );
        assert_eq!(say(&interpreter, "svet alert list").await, "I'm alerting at: T-2h");
    }

    #[tokio::test]
    async fn malformed_commands_get_confused_reply() {
        let (interpreter, _, _) = interpreter().await;
        for content in [
            "svet",
            "svet dance",
            "svet follow",
            "svet follow abc",
            "svet follow 0",
            "svet follow -5",
            "svet unfollow x",
            "svet alert 0",
            "svet alert -1",
            "svet silence",
            "svet follow 42",
        ] {
            assert_eq!(say(&interpreter, content).await, CONFUSED_REPLY, "{content}");
        }
    }

    #[tokio::test]
    async fn unaddressed_messages_are_ignored() {
        let (interpreter, _, _) = interpreter().await;
        assert!(interpreter.handle("Foo", CH, "hello there").await.is_none());
        assert!(interpreter.handle("Foo", CH, "svetlanas list").await.is_none());
        assert!(interpreter.handle("Foo", CH, "").await.is_none());
    }

    #[tokio::test]
    async fn chatter_gets_laughed_at() {
        let (interpreter, _, _) = interpreter().await;
        for word in ["lol", "rofl", "lmao", "haha", "hihi"] {
            assert_eq!(say(&interpreter, word).await, "lol xD");
        }
        assert!(interpreter.handle("Foo", CH, "lol!").await.is_none());
    }
}
