//! End-to-end tests of the bot core over an in-memory transport
//! Run with: cargo test --test bot_dispatch_test

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;

use irc_memo_bot::application::errors::BotError;
use irc_memo_bot::application::messaging::DispatchKind;
use irc_memo_bot::application::{Bot, BotSettings, BotState};
use irc_memo_bot::domain::entities::{Command, IncomingMessage, ReplyPayload, Roster};
use irc_memo_bot::domain::traits::{
    command_fn, message_fn, MessageHandler, SharedReplySink, Transport,
};
use irc_memo_bot::infrastructure::database::Database;
use irc_memo_bot::infrastructure::irc::IrcLine;
use irc_memo_bot::plugins::{MemoPlugin, PluginManager};

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Transport recording everything the bot writes
#[derive(Default)]
struct RecordingTransport {
    messages: Mutex<Vec<(Instant, String, String)>>,
    raw: Mutex<Vec<String>>,
}

impl RecordingTransport {
    fn messages(&self) -> Vec<(Instant, String, String)> {
        self.messages.lock().unwrap().clone()
    }

    fn raw(&self) -> Vec<String> {
        self.raw.lock().unwrap().clone()
    }

    async fn wait_for_raw(&self, line: &str) {
        while !self.raw().iter().any(|l| l == line) {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn privmsg(&self, target: &str, text: &str) -> Result<(), BotError> {
        self.messages
            .lock()
            .unwrap()
            .push((Instant::now(), target.to_string(), text.to_string()));
        Ok(())
    }

    async fn send_raw(&self, line: &str) -> Result<(), BotError> {
        self.raw.lock().unwrap().push(line.to_string());
        Ok(())
    }
}

/// Transport whose connection is already gone
struct ClosedTransport;

#[async_trait]
impl Transport for ClosedTransport {
    async fn privmsg(&self, _target: &str, _text: &str) -> Result<(), BotError> {
        Err(BotError::Network("Connection closed".to_string()))
    }

    async fn send_raw(&self, _line: &str) -> Result<(), BotError> {
        Err(BotError::Network("Connection closed".to_string()))
    }
}

fn bot() -> (Bot, Arc<RecordingTransport>) {
    ensure_init();
    let transport = Arc::new(RecordingTransport::default());
    let bot = Bot::new(BotSettings::new("memo-bot", "#home"), transport.clone());
    (bot, transport)
}

fn line(raw: &str) -> IrcLine {
    raw.parse().unwrap()
}

fn privmsg(sender: &str, text: &str) -> IrcLine {
    line(&format!(":{}!u@host PRIVMSG #home :{}", sender, text))
}

fn counting_passive(hits: Arc<AtomicUsize>) -> Option<Arc<dyn MessageHandler>> {
    Some(Arc::new(message_fn(move |_, _| {
        let hits = hits.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })))
}

#[tokio::test]
async fn test_memo_trigger_parses_recipient_sender_and_text() {
    let (bot, _) = bot();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let recorder = seen.clone();
    let command = Command::new("memo")
        .with_triggers(["!memo", "!m"])
        .with_handler(command_fn(move |msg: IncomingMessage, _reply: SharedReplySink| {
            let recorder = recorder.clone();
            async move {
                let fields = msg.fields();
                recorder.lock().unwrap().push((
                    fields[1].to_string(),
                    msg.sender.clone(),
                    fields[2..].join(" "),
                ));
                Ok(true)
            }
        }));
    bot.add_command(&command, bot.direct_sink()).unwrap();

    let dispatch = bot.handle_event(privmsg("Alice", "!m Bob hello there")).unwrap();
    assert_eq!(dispatch.kind, DispatchKind::Command { trigger: "!m".to_string() });
    dispatch.join().await;
    bot.handle_event(privmsg("Alice", "!memo Bob hello there")).unwrap().join().await;

    let expected = ("Bob".to_string(), "Alice".to_string(), "hello there".to_string());
    assert_eq!(seen.lock().unwrap().clone(), vec![expected.clone(), expected]);
}

#[tokio::test]
async fn test_whitespace_only_message_invokes_nothing() {
    let (bot, _) = bot();
    let hits = Arc::new(AtomicUsize::new(0));
    bot.add_message_handler(counting_passive(hits.clone()), bot.direct_sink()).unwrap();

    let dispatch = bot.handle_event(privmsg("Alice", " ")).unwrap();

    assert_eq!(dispatch.kind, DispatchKind::Ignored);
    assert_eq!(dispatch.task_count(), 0);
    dispatch.join().await;
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_passive_handlers_start_in_registration_order() {
    let (bot, _) = bot();
    let started = Arc::new(Mutex::new(Vec::new()));

    for name in ["A", "B"] {
        let started = started.clone();
        let handler: Arc<dyn MessageHandler> = Arc::new(message_fn(move |_, _| {
            let started = started.clone();
            async move {
                started.lock().unwrap().push(name);
                Ok(())
            }
        }));
        bot.add_message_handler(Some(handler), bot.direct_sink()).unwrap();
    }

    let dispatch = bot.handle_event(privmsg("Alice", "hi")).unwrap();
    assert_eq!(dispatch.kind, DispatchKind::Passive { handlers: 2 });
    dispatch.join().await;

    assert_eq!(started.lock().unwrap().clone(), vec!["A", "B"]);
}

#[tokio::test]
async fn test_reregistered_trigger_only_fires_new_handler() {
    let (bot, _) = bot();
    let old_hits = Arc::new(AtomicUsize::new(0));
    let new_hits = Arc::new(AtomicUsize::new(0));

    for hits in [old_hits.clone(), new_hits.clone()] {
        let command = Command::new("x")
            .with_trigger("!x")
            .with_handler(command_fn(move |_, _| {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Ok(true)
                }
            }));
        bot.add_command(&command, bot.direct_sink()).unwrap();
    }

    bot.handle_event(privmsg("Alice", "!x")).unwrap().join().await;

    assert_eq!(old_hits.load(Ordering::SeqCst), 0);
    assert_eq!(new_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_welcome_joins_and_refreshes_roster_before_running() {
    let (bot, transport) = bot();
    assert_eq!(bot.state(), BotState::Constructed);

    bot.handle_event(line(":irc.example.net 001 memo-bot :Welcome"));
    assert_eq!(bot.state(), BotState::Connected);

    transport.wait_for_raw("NAMES #home").await;
    assert_eq!(transport.raw(), vec!["JOIN #home", "NAMES #home"]);
    assert_eq!(bot.state(), BotState::Connected);

    bot.handle_event(line(":irc.example.net 353 memo-bot = #home :@Alice Bob @Carol"));
    bot.handle_event(line(":irc.example.net 366 memo-bot #home :End of /NAMES list."));
    bot.wait_until_running().await.unwrap();

    assert_eq!(bot.state(), BotState::Running);
    assert_eq!(bot.roster(), Roster::from_names("@Alice @Carol"));
    assert!(bot.is_privileged("Alice"));
    assert!(!bot.is_privileged("Bob"));
}

#[tokio::test]
async fn test_failed_join_stops_the_bot() {
    ensure_init();
    let bot = Bot::new(BotSettings::new("memo-bot", "#home"), Arc::new(ClosedTransport));

    bot.handle_event(line(":irc.example.net 001 memo-bot :Welcome"));

    assert!(bot.wait_until_running().await.is_err());
    assert_eq!(bot.state(), BotState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_replies_from_concurrent_handlers_are_spaced() {
    let (bot, transport) = bot();
    for text in ["first", "second"] {
        let handler: Arc<dyn MessageHandler> =
            Arc::new(message_fn(move |msg: IncomingMessage, reply: SharedReplySink| async move {
                reply.deliver(ReplyPayload::to(msg.sender.clone(), text)).await
            }));
        bot.add_message_handler(Some(handler), bot.direct_sink()).unwrap();
    }

    bot.handle_event(privmsg("Alice", "hello")).unwrap().join().await;

    let messages = transport.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|(_, target, _)| target == "Alice"));
    assert!(messages[1].0 - messages[0].0 >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_reply_to_all_and_reply_without_target() {
    let (bot, transport) = bot();

    bot.reply_to_all(ReplyPayload::to("ignored", "hello channel")).await.unwrap();
    bot.reply(ReplyPayload::new("goes nowhere")).await.unwrap();

    let messages = transport.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].1, "#home");
    assert_eq!(messages[0].2, "hello channel");
}

#[tokio::test(start_paused = true)]
async fn test_memo_plugin_end_to_end() {
    let (bot, transport) = bot();
    let mut plugins = PluginManager::new();
    plugins
        .register(MemoPlugin::new(Arc::new(Database::in_memory().unwrap()), "!"))
        .unwrap();
    plugins.install(&bot).unwrap();

    bot.handle_event(privmsg("Alice", "!memo Bob see you tomorrow")).unwrap().join().await;
    bot.handle_event(privmsg("Bob", "morning all")).unwrap().join().await;
    bot.handle_event(privmsg("Bob", "anyone?")).unwrap().join().await;

    let messages = transport.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].1, "Alice");
    assert_eq!(messages[0].2, "Alice: memo for Bob saved");
    assert_eq!(messages[1].1, "Bob");
    assert!(messages[1].2.starts_with("Bob: memo from Alice => \"see you tomorrow\" ("));
}

#[tokio::test]
async fn test_run_ends_on_server_error() {
    let (bot, transport) = bot();
    let bot = Arc::new(bot);
    let hits = Arc::new(AtomicUsize::new(0));
    bot.add_message_handler(counting_passive(hits.clone()), bot.direct_sink()).unwrap();

    let (tx, rx) = mpsc::channel(8);
    let runner = tokio::spawn({
        let bot = bot.clone();
        async move { bot.run(rx).await }
    });

    tx.send(privmsg("Alice", "hello")).await.unwrap();
    tx.send(line("ERROR :Closing Link")).await.unwrap();
    runner.await.unwrap().unwrap();

    assert_eq!(bot.state(), BotState::Stopped);
    assert!(bot.wait_until_running().await.is_err());
    assert!(transport.raw().is_empty());

    while hits.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_stop_sends_quit_once() {
    let (bot, transport) = bot();

    bot.stop().await.unwrap();
    bot.stop().await.unwrap();

    assert_eq!(bot.state(), BotState::Stopped);
    assert_eq!(transport.raw(), vec!["QUIT :Bye"]);
}
