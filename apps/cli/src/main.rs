//! Onkyo CLI - command-line control for an Onkyo TX-L20D receiver.
//!
//! Each invocation opens one eISCP session, runs a single command and
//! closes the connection.

mod chat;

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use onkyo_core::eiscp::{InputControl, PowerControl, SubwooferControl, VolumeControl};
use onkyo_core::protocol_constants::DEFAULT_EISCP_PORT;
use onkyo_core::services::profiles::{self, apply_profile, device_info};
use onkyo_core::{InputSelector, OnkyoClient, Session};
use tokio::io::BufReader;

/// Onkyo TX-L20D client.
#[derive(Parser, Debug)]
#[command(name = "onkyo")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Receiver host IP address.
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "ONKYO_HOST")]
    host: String,

    /// Receiver eISCP port.
    #[arg(short = 'P', long, default_value_t = DEFAULT_EISCP_PORT, env = "ONKYO_PORT")]
    port: u16,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "warn", env = "ONKYO_LOG_LEVEL")]
    log_level: log::LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat with the receiver using raw ISCP messages.
    Chat,
    /// Control device power.
    #[command(subcommand)]
    Power(PowerCommand),
    /// Control master volume.
    #[command(subcommand)]
    Volume(LevelCommand),
    /// Control subwoofer level.
    #[command(subcommand)]
    Subwoofer(LevelCommand),
    /// Control input source.
    #[command(subcommand)]
    Source(SourceCommand),
    /// Set front panel brightness (0 bright, 1 dim, 2 dark).
    Brightness { level: i32 },
    /// Apply or show listening profiles.
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[derive(Subcommand, Debug)]
enum PowerCommand {
    /// Turn device on.
    On,
    /// Turn device off.
    Off,
    /// Print whether the device is on.
    Query,
    /// Toggle power.
    Switch,
}

#[derive(Subcommand, Debug)]
enum LevelCommand {
    /// Print the current level.
    Query,
    /// Set the level.
    Set {
        #[arg(allow_negative_numbers = true)]
        level: i32,
    },
    /// Step up.
    Up,
    /// Step down.
    Down,
}

#[derive(Subcommand, Debug)]
enum SourceCommand {
    /// Print the current input source.
    Query,
    /// Set input source (tv, spotify, dj, vinyl).
    Set { name: String },
    /// List available input sources.
    List,
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    /// Power on and apply a profile's presets.
    Set { name: String },
    /// Show the current input with live levels.
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    // Listing needs no connection.
    if let Commands::Source(SourceCommand::List) = args.command {
        print_sources();
        return Ok(());
    }

    let session = Arc::new(
        Session::connect(&args.host, args.port)
            .await
            .context("error connecting to receiver")?,
    );

    let result = run(Arc::clone(&session), args.command).await;
    session.close().await;
    result
}

async fn run(session: Arc<Session>, command: Commands) -> Result<()> {
    let client = OnkyoClient::new(Arc::clone(&session));

    match command {
        Commands::Chat => {
            let watched = Arc::clone(&session);
            tokio::spawn(async move {
                close_on_interrupt(ctrl_c(), watched).await;
                // The stdin reader thread would otherwise block runtime shutdown
                std::process::exit(0);
            });

            let stdin = BufReader::new(tokio::io::stdin());
            chat::run(&*session, stdin, tokio::io::stdout()).await?;
        }
        Commands::Power(cmd) => match cmd {
            PowerCommand::On => client.power_on().await?,
            PowerCommand::Off => client.power_off().await?,
            PowerCommand::Query => println!("{}", power_label(client.query_power().await?)),
            PowerCommand::Switch => println!("{}", power_label(client.switch_power().await?)),
        },
        Commands::Volume(cmd) => match cmd {
            LevelCommand::Query => println!("{}", client.query_volume().await?),
            LevelCommand::Set { level } => client.set_volume(level).await?,
            LevelCommand::Up => client.volume_up().await?,
            LevelCommand::Down => client.volume_down().await?,
        },
        Commands::Subwoofer(cmd) => match cmd {
            LevelCommand::Query => println!("{}", client.query_subwoofer_level().await?),
            LevelCommand::Set { level } => client.set_subwoofer_level(level).await?,
            LevelCommand::Up => client.subwoofer_up().await?,
            LevelCommand::Down => client.subwoofer_down().await?,
        },
        Commands::Source(cmd) => match cmd {
            SourceCommand::Query => println!("{}", client.query_input_selector().await?),
            SourceCommand::Set { name } => client.set_input_selector(&name).await?,
            SourceCommand::List => print_sources(),
        },
        Commands::Brightness { level } => client.set_dimmer(level).await?,
        Commands::Profile(cmd) => {
            let table = profiles::default_profiles();
            match cmd {
                ProfileCommand::Set { name } => {
                    let profile = profiles::find(&table, &name)
                        .with_context(|| format!("unknown profile '{}'", name))?;
                    apply_profile(&client, profile).await?;
                }
                ProfileCommand::Show => {
                    let info = device_info(&client, &table).await?;
                    println!(
                        "profile: {}\nvolume: {}/{}\nsubwoofer: {}",
                        info.profile, info.volume_level, info.max_volume, info.subwoofer_level
                    );
                }
            }
        }
    }
    Ok(())
}

/// Closes the session once `interrupt` resolves.
async fn close_on_interrupt<F>(interrupt: F, session: Arc<Session>)
where
    F: Future<Output = ()>,
{
    interrupt.await;
    println!("\nTerminating chat session...");
    session.close().await;
}

/// Resolves on Ctrl+C. Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn power_label(is_powered: bool) -> &'static str {
    if is_powered {
        "on"
    } else {
        "off"
    }
}

fn print_sources() {
    println!("Available sources:");
    for input in InputSelector::all() {
        println!("  - {}", input);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    #[test]
    fn parses_negative_subwoofer_level() {
        let args = Args::try_parse_from(["onkyo", "subwoofer", "set", "-6"]).unwrap();
        assert!(matches!(
            args.command,
            Commands::Subwoofer(LevelCommand::Set { level: -6 })
        ));
    }

    #[test]
    fn host_and_port_flags() {
        let args =
            Args::try_parse_from(["onkyo", "-H", "10.0.0.5", "-P", "60129", "power", "on"])
                .unwrap();
        assert_eq!(args.host, "10.0.0.5");
        assert_eq!(args.port, 60129);
        assert!(matches!(args.command, Commands::Power(PowerCommand::On)));
    }

    #[test]
    fn brightness_requires_a_level() {
        assert!(Args::try_parse_from(["onkyo", "brightness"]).is_err());
    }

    #[test]
    fn command_is_required() {
        assert!(Args::try_parse_from(["onkyo"]).is_err());
    }

    #[tokio::test]
    async fn interrupt_closes_the_session() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let _conn = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(1)).await;
        });

        let session = Arc::new(Session::connect("127.0.0.1", port).await.unwrap());
        let (interrupt_tx, interrupt_rx) = oneshot::channel::<()>();
        let watcher = tokio::spawn(close_on_interrupt(
            async move {
                let _ = interrupt_rx.await;
            },
            Arc::clone(&session),
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!session.is_closed());

        interrupt_tx.send(()).unwrap();
        watcher.await.unwrap();
        assert!(session.is_closed());
    }
}
