use clap::{Parser, Subcommand};
use std::sync::Arc;

use irc_memo_bot::application::errors::BotError;
use irc_memo_bot::application::{Bot, BotSettings};
use irc_memo_bot::infrastructure::config::Config;
use irc_memo_bot::infrastructure::database::Database;
use irc_memo_bot::infrastructure::irc::IrcConnection;
use irc_memo_bot::plugins::{install_plugin, HelpPlugin, MemoPlugin, PluginManager};

#[derive(Parser)]
#[command(name = "irc-memo-bot")]
#[command(about = "An IRC bot that keeps memos for absent users", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Nick (overrides config)
    #[arg(short, long)]
    nick: Option<String>,

    /// Server address as host:port (overrides config)
    #[arg(short, long)]
    server: Option<String>,

    /// Channel to join (overrides config)
    #[arg(long)]
    channel: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => {
            let config = load_config(&cli);
            match tokio::runtime::Runtime::new() {
                Ok(rt) => rt.block_on(run_bot(config)),
                Err(e) => Err(BotError::Internal(format!("Failed to start runtime: {}", e))),
            }
        }
        Commands::Version => {
            println!("irc-memo-bot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(&cli.config),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Config {
    let mut config = if std::path::Path::new(&cli.config).exists() {
        Config::load(&cli.config).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    };

    if let Some(nick) = &cli.nick {
        config.bot.nick = nick.clone();
    }
    if let Some(server) = &cli.server {
        config.server.address = server.clone();
    }
    if let Some(channel) = &cli.channel {
        config.server.channel = channel.clone();
    }
    config
}

async fn run_bot(config: Config) -> Result<(), BotError> {
    config.validate()?;
    tracing::info!("Starting irc-memo-bot as {}", config.bot.nick);

    let db = Database::new(&config.database.path)?;
    tracing::info!("Database opened at {}", config.database.path.display());

    let (client, events) = IrcConnection::connect(&config.server.address, &config.bot.nick).await?;
    let bot = Arc::new(Bot::new(BotSettings::from(&config), Arc::new(client)));

    let mut plugins = PluginManager::new();
    plugins
        .register(MemoPlugin::new(Arc::new(db), &config.bot.command_marker))
        .map_err(BotError::Internal)?;
    plugins.install(&bot)?;
    // Help goes last so it can list everything else
    install_plugin(&HelpPlugin::new(&config.bot.command_marker, bot.help_lines()), &bot)?;

    let stopper = bot.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            if let Err(e) = stopper.stop().await {
                tracing::error!("Failed to quit cleanly: {}", e);
            }
        }
    });

    bot.run(events).await
}

fn init_config(path: &str) -> Result<(), BotError> {
    if std::path::Path::new(path).exists() {
        println!("{} already exists, not overwriting", path);
        return Ok(());
    }
    let yaml = Config::default().to_yaml()?;
    std::fs::write(path, yaml)
        .map_err(|e| BotError::Internal(format!("Failed to write {}: {}", path, e)))?;
    println!("Wrote default config to {}", path);
    Ok(())
}
