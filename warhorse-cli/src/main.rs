use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored_json::{ColorMode, ColoredFormatter, Output, PrettyFormatter};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use warhorse::{
    ChatChannel, Client, ClientConfig, Commands, ConnectionState, Event, EventKind, Language,
};

#[derive(Parser, Debug)]
#[command(name = "warhorse", version, about = "Warhorse command line client")]
struct Cli {
    /// Address of the Warhorse server
    #[arg(
        short,
        long,
        env = "WARHORSE_ADDRESS",
        default_value = "tcp:127.0.0.1:3000"
    )]
    address: String,

    /// Account name or email
    #[arg(short, long, env = "WARHORSE_USER")]
    username: String,

    #[arg(short, long, env = "WARHORSE_PASSWORD", hide_env_values = true)]
    password: String,

    /// Seconds to wait for the connection
    #[arg(long, value_name = "SECONDS", default_value_t = 10.0)]
    connect_timeout: f64,

    #[arg(long, value_enum, default_value_t = LanguageArg::English)]
    language: LanguageArg,

    /// Exit after printing this many events
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Milliseconds between polls
    #[arg(long, default_value_t = 50)]
    interval: u64,

    /// Colorize output
    #[arg(long, value_enum, default_value_t = ColorArg::Auto)]
    color: ColorArg,

    /// Print debug logs
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Action>,
}

/// What to do once logged in. Events are printed either way.
#[derive(Subcommand, Debug, Clone)]
enum Action {
    /// Only print events
    Listen,
    /// Send a friend request
    AddFriend { friend_id: String },
    /// Accept a pending friend request
    Accept { friend_id: String },
    /// Remove a friend
    RemoveFriend { friend_id: String },
    Block { user_id: String },
    Unblock { user_id: String },
    /// Send a message to a chat room
    Say { room: String, message: String },
    /// Send a private message to a user
    Whisper { user_id: String, message: String },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum LanguageArg {
    English,
    Spanish,
    French,
}

impl From<LanguageArg> for Language {
    fn from(language: LanguageArg) -> Self {
        match language {
            LanguageArg::English => Language::English,
            LanguageArg::Spanish => Language::Spanish,
            LanguageArg::French => Language::French,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ColorArg {
    On,
    Off,
    Auto,
}

fn run_action(action: &Action, commands: &mut Commands<'_>) -> warhorse::Result<()> {
    match action {
        Action::Listen => Ok(()),
        Action::AddFriend { friend_id } => commands.send_friend_request(friend_id),
        Action::Accept { friend_id } => commands.accept_friend_request(friend_id),
        Action::RemoveFriend { friend_id } => commands.remove_friend(friend_id),
        Action::Block { user_id } => commands.block_user(user_id),
        Action::Unblock { user_id } => commands.unblock_user(user_id),
        Action::Say { room, message } => {
            commands.send_chat_message(ChatChannel::Room(room.clone()), message)
        }
        Action::Whisper { user_id, message } => {
            commands.send_chat_message(ChatChannel::PrivateMessage(user_id.clone()), message)
        }
    }
}

fn print_event(event: &Event, cf: &ColoredFormatter<PrettyFormatter>, color_mode: ColorMode) {
    let payload = match event.payload_json() {
        Ok(value) => cf
            .clone()
            .to_colored_json(&value, color_mode)
            .unwrap_or_else(|_| event.payload().to_string()),
        Err(_) => event.payload().to_string(),
    };
    println!("{}: {}", event.kind(), payload);
}

fn do_main(cli: Cli) -> Result<()> {
    let color_mode = match cli.color {
        ColorArg::On => ColorMode::On,
        ColorArg::Off => ColorMode::Off,
        ColorArg::Auto if ColorMode::should_colorize(Output::StdOut) => ColorMode::On,
        ColorArg::Auto => ColorMode::Off,
    };

    let cf = ColoredFormatter::new(PrettyFormatter::new());

    if !cli.connect_timeout.is_finite() || cli.connect_timeout < 0.0 {
        bail!("Invalid connect timeout: {}", cli.connect_timeout);
    }
    let config = ClientConfig::default()
        .with_connect_timeout(Duration::from_secs_f64(cli.connect_timeout))
        .with_language(cli.language.into());

    let mut client = Client::open_with(&cli.address, config)
        .with_context(|| format!("Failed to connect to '{}'", cli.address))?;

    let mut action = cli.command.clone();
    let mut handler = |event: Event, commands: &mut Commands<'_>| {
        print_event(&event, &cf, color_mode);
        match event.kind() {
            EventKind::Hello => {
                commands.login(&cli.username, &cli.password);
            }
            EventKind::LoggedIn => {
                if let Some(action) = action.take() {
                    if let Err(e) = run_action(&action, commands) {
                        error!(?action, error = %e, "Request failed");
                    }
                }
            }
            _ => {}
        }
    };

    let interval = Duration::from_millis(cli.interval);
    let mut printed = 0;
    loop {
        let max = cli.count.map_or(usize::MAX, |count| count - printed);
        printed += client.dispatch(&mut handler, max)?;

        if cli.count.is_some_and(|count| printed >= count) {
            break;
        }
        if client.state() == ConnectionState::Failed {
            client.close();
            bail!("Session with '{}' failed", cli.address);
        }
        thread::sleep(interval);
    }

    info!(events = printed, "Done");
    client.close();
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = do_main(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
