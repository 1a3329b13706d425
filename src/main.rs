mod cli;
mod config;
mod constants;
mod editor;
mod headless;
mod paths;
mod ui;

use std::process::ExitCode;

use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use clap::Parser;

use cli::{Cli, Command, EditArgs};
use constants::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};
use editor::{InitialDocument, RegionSource};

/// Set up file logging for debug builds
#[cfg(debug_assertions)]
fn setup_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use std::fs::OpenOptions;
    use std::io::Write;
    use tracing_subscriber::prelude::*;

    let logs_dir = paths::logs_dir();
    if std::fs::create_dir_all(&logs_dir).is_err() {
        eprintln!("Failed to create logs directory");
        return None;
    }

    let log_file_path = logs_dir.join("masquerade.log");

    // Append session separator to existing log file
    if let Ok(mut file) = OpenOptions::new().append(true).open(&log_file_path) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let separator = "=".repeat(80);
        let _ = writeln!(
            file,
            "\n\n{}\n=== New Session Started at {} ===\n{}\n",
            separator, timestamp, separator
        );
    }

    let file_appender = tracing_appender::rolling::never(&logs_dir, "masquerade.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // No ANSI colors in the file
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true)
        .with_level(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,masquerade=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Some(guard)
}

#[cfg(not(debug_assertions))]
fn setup_logging() -> Option<()> {
    None
}

/// Release builds have no file log; headless runs still report to stderr
#[cfg(not(debug_assertions))]
fn setup_headless_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,masquerade=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(debug_assertions)]
fn setup_headless_logging() {}

fn run_editor(args: EditArgs) {
    let regions = match (args.detections, args.session) {
        (Some(path), _) => RegionSource::Detections(path),
        (None, Some(path)) => RegionSource::SavedSession(path),
        (None, None) => RegionSource::Empty,
    };

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Masquerade".into(),
                resolution: (DEFAULT_WINDOW_WIDTH as u32, DEFAULT_WINDOW_HEIGHT as u32).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(EguiPlugin::default())
        .add_plugins(config::ConfigPlugin)
        .add_plugins(editor::EditorPlugin)
        .add_plugins(ui::UiPlugin)
        .insert_resource(InitialDocument {
            path: args.image,
            regions,
        })
        .run();
}

fn run_headless(command: Command) -> ExitCode {
    setup_headless_logging();

    let config = config::load_config();
    if let Some(reason) = &config.reset_reason {
        warn!("{}; using default settings", reason);
    }

    let result = match &command {
        Command::Faces(args) => headless::run_faces(args, &config.data),
        Command::Text(args) => headless::run_text(args, &config.data),
        Command::Edit(_) => return ExitCode::SUCCESS,
    };

    match result {
        Ok(summary) => {
            println!("{}", summary.message());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    // Keep the guard alive for the duration of the program
    let _log_guard = setup_logging();
    let cli = Cli::parse();

    match cli.command {
        None => {
            run_editor(EditArgs::default());
            ExitCode::SUCCESS
        }
        Some(Command::Edit(args)) => {
            run_editor(args);
            ExitCode::SUCCESS
        }
        Some(command) => run_headless(command),
    }
}
