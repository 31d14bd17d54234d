//! Grunty - let a vision-language model drive your desktop.
//!
//! ```bash
//! grunty "open a terminal and run htop"
//! grunty --dry-run "find the weather for Paris"
//! grunty --list-screens
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use grunty_lib::agent_engine::engine::AgentSession;
use grunty_lib::agent_engine::event_bus::Notifier;
use grunty_lib::agent_engine::state::LoopConfig;
use grunty_lib::config::load_config;
use grunty_lib::errors::GruntyResult;
use grunty_lib::executor::capability::ActionCapability;
use grunty_lib::executor::coordinator::CoordinateMapper;
use grunty_lib::executor::desktop::DesktopCapability;
use grunty_lib::executor::mock::RecordingCapability;
use grunty_lib::llm::provider::ModelClient;
use grunty_lib::llm::providers::anthropic::AnthropicClient;
use grunty_lib::perception::screenshot::{list_screens, resolve_geometry};
use grunty_lib::{init_tracing, spawn_run, translator_from_config, Interrupt, InterruptCounter};

#[derive(Parser)]
#[command(name = "grunty")]
#[command(version)]
#[command(about = "Desktop computer-use agent driven by a remote vision-language model")]
struct Args {
    /// What the agent should do, in plain English
    #[arg(trailing_var_arg = true)]
    instructions: Vec<String>,

    /// Path to config.toml
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Record actions instead of performing them
    #[arg(long)]
    dry_run: bool,

    /// List the available screens and exit
    #[arg(long)]
    list_screens: bool,

    /// Write the last screenshot of the run to this PNG file
    #[arg(long, value_name = "FILE")]
    save_screenshot: Option<PathBuf>,

    /// Show debug output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    init_tracing(if args.verbose { "debug" } else { "info" });

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> GruntyResult<ExitCode> {
    if args.list_screens {
        for screen in list_screens()? {
            let g = screen.geometry;
            println!(
                "[{}] {} {}x{} at ({}, {}){}",
                screen.index,
                screen.name,
                g.width,
                g.height,
                g.offset_x,
                g.offset_y,
                if screen.primary { " (primary)" } else { "" }
            );
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(args.config.as_deref())?;
    let instructions = args.instructions.join(" ");
    let translator = translator_from_config(&config)?;

    let client: Arc<dyn ModelClient> = Arc::new(AnthropicClient::from_config(
        &config.model,
        config.resolve_api_key()?,
    )?);

    let capability: Arc<dyn ActionCapability> = if args.dry_run {
        tracing::info!("dry run: actions are recorded, not performed");
        Arc::new(RecordingCapability::new()?)
    } else {
        let screen_index = config.display.screen_index;
        let geometry = resolve_geometry(screen_index)?;
        tracing::info!(?geometry, screen_index, "target display");
        Arc::new(DesktopCapability::new(
            CoordinateMapper::new(geometry),
            screen_index,
            Duration::from_millis(config.run.action_delay_ms),
        ))
    };

    let (notifier, mut notes) = Notifier::channel();
    let session = AgentSession::new(&instructions, translator, client, capability)?
        .with_notifier(notifier)
        .with_loop_config(LoopConfig {
            max_steps: config.run.max_steps,
            max_duration_minutes: config.run.max_duration_minutes,
        });

    let handle = spawn_run(session);
    let mut interrupts = InterruptCounter::default();
    loop {
        tokio::select! {
            note = notes.recv() => match note {
                Some(note) => println!("{note}"),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => match interrupts.press() {
                Interrupt::StopAfterStep => {
                    eprintln!("Stopping after the current step... (press Ctrl-C again to abort)");
                    handle.stop();
                }
                Interrupt::Abort => {
                    eprintln!("Aborting run.");
                    handle.abort();
                    return Ok(ExitCode::from(130));
                }
            },
        }
    }

    let report = handle.join().await?;
    if let (Some(path), Some(png)) = (&args.save_screenshot, &report.last_screenshot) {
        std::fs::write(path, png)?;
        tracing::info!(path = %path.display(), "last screenshot saved");
    }

    Ok(if report.outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
