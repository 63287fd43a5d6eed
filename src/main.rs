mod app;
mod commands;
mod config;
mod file_io;

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use app::App;
use commands::EditCommand;
use config::Config;

/// Cover art document editor with undo history and snapshots
#[derive(Parser, Debug)]
#[command(name = "coverart")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding the current document and snapshots
    #[arg(long, value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Log more (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current document and snapshots
    Show,
    /// Migrate a JSON file and print the result without touching the session
    Normalize {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Replace the current document with a JSON file (undoable)
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Write the current document as `<name>-config.json`
    Export {
        /// Output file or directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Render the current document to PNG
    Render {
        /// Output file or directory
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Output pixels per canvas pixel (default from config)
        #[arg(long)]
        pixel_ratio: Option<f64>,
    },
    /// Manage snapshots
    #[command(subcommand)]
    Snapshot(SnapshotCommand),
    /// Edit interactively, one command per line on stdin
    Edit,
    /// Print the config path and effective settings
    Config {
        /// Write the effective settings to the config file
        #[arg(long)]
        init: bool,
    },
}

/// Snapshots are addressed by list position (0 is newest) or id
#[derive(Subcommand, Debug)]
enum SnapshotCommand {
    Capture,
    List,
    Restore { snapshot: String },
    Rename { snapshot: String, name: String },
    Delete { snapshot: String },
    Export {
        snapshot: String,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = Config::load();
    if let Some(dir) = args.data_dir {
        config.data_dir = Some(dir);
    }

    let command = args.command.unwrap_or(Command::Show);
    match &command {
        Command::Normalize { file } => {
            let text = file_io::read_import(file)?;
            let doc = coverart_core::normalize_str(&text)
                .with_context(|| format!("Failed to migrate {:?}", file))?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
            return Ok(());
        }
        Command::Config { init } => {
            let path = Config::config_path();
            if *init {
                config.save_to(&path)?;
            }
            println!("{}", path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
            return Ok(());
        }
        _ => {}
    }

    let mut app = App::open(config)?;
    let result = run(&mut app, command).await;

    // Save on the way out, even after a failed command
    let saved = app.flush();
    if let Some(status) = app.take_status() {
        eprintln!("{status}");
    }
    result.and(saved)
}

async fn run(app: &mut App, command: Command) -> Result<()> {
    match command {
        Command::Show => {
            print!("{}", app.describe());
            print!("{}", app.snapshot_list());
        }
        Command::Import { file } => app.import_file(&file)?,
        Command::Export { out } => {
            let path = app.export_json(out.as_deref())?;
            println!("{}", path.display());
        }
        Command::Render { out, pixel_ratio } => {
            let path = app.export_png(out.as_deref(), pixel_ratio).await?;
            println!("{}", path.display());
        }
        Command::Snapshot(cmd) => match cmd {
            SnapshotCommand::Capture => {
                let id = app.capture().await;
                println!("{id}");
            }
            SnapshotCommand::List => print!("{}", app.snapshot_list()),
            SnapshotCommand::Restore { snapshot } => app.restore(&snapshot)?,
            SnapshotCommand::Rename { snapshot, name } => app.rename_snapshot(&snapshot, &name)?,
            SnapshotCommand::Delete { snapshot } => app.delete_snapshot(&snapshot)?,
            SnapshotCommand::Export { snapshot, out } => {
                let path = app.export_snapshot(&snapshot, out.as_deref())?;
                println!("{}", path.display());
            }
        },
        Command::Edit => edit_loop(app).await?,
        Command::Normalize { .. } | Command::Config { .. } => {}
    }
    Ok(())
}

/// Read commands from stdin until `quit` or end of input
async fn edit_loop(app: &mut App) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    print!("{}", app.describe());
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let keep_going = match EditCommand::parse(&line) {
            Ok(Some(command)) => match app.apply(command).await {
                Ok(keep_going) => keep_going,
                Err(e) => {
                    app.set_status(format!("Error: {e:#}"));
                    true
                }
            },
            Ok(None) => true,
            Err(e) => {
                app.set_status(format!("Error: {e:#}"));
                true
            }
        };

        app.autosave();
        if let Some(status) = app.take_status() {
            println!("{status}");
        }
        if !keep_going {
            break;
        }
    }
    Ok(())
}
