//! reborn - "Reborn in a New World" text adventure in the terminal
//!
//! The story runs on a worker thread and talks to the window only through
//! an output bridge (coloured text with ANSI styling) and a prompt queue
//! fed from the input field.
//!
//! # Quick Start
//!
//! ```text
//! reborn                 # Open the window, press F5 to start
//! reborn --autostart     # Start the story immediately
//! reborn -t dark         # Use the dark theme
//! ```
//!
//! # Keybindings
//!
//! | Key | Action |
//! |-----|--------|
//! | F5 / Ctrl+R | Start / restart game |
//! | F6 / Ctrl+L | Clear transcript |
//! | Enter | Send input |
//! | PgUp / PgDn | Scroll transcript |
//! | Esc / Ctrl+Q | Quit |

mod app;
mod config;
mod core;
mod story;
mod ui;

use std::env;
use std::fs::OpenOptions;
use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use crossterm::cursor::Show;
use crossterm::event::{self, DisableMouseCapture, Event};
use crossterm::execute;
use crossterm::terminal::{self, LeaveAlternateScreen};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::app::App;
use crate::config::{ColorScheme, Config};
use crate::ui::Renderer;

/// Command line options
#[derive(Debug, Default)]
struct Options {
    /// Explicit config file
    config_path: Option<PathBuf>,
    /// Theme override
    theme: Option<String>,
    /// Start the story right away
    autostart: bool,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    eprintln!("reborn {}", VERSION);
}

fn print_help() {
    eprintln!("reborn {} - Reborn in a New World, a terminal text adventure", VERSION);
    eprintln!();
    eprintln!("Usage: reborn [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <PATH>   Config file (default: ~/.reborn/config.toml)");
    eprintln!("  -t, --theme <NAME>    Color scheme: {}", ColorScheme::list().join(", "));
    eprintln!("      --autostart       Start the story immediately");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Keys:");
    eprintln!("  F5, Ctrl+R            Start / restart game");
    eprintln!("  F6, Ctrl+L            Clear transcript");
    eprintln!("  Enter                 Send input");
    eprintln!("  PgUp/PgDn, wheel      Scroll transcript");
    eprintln!("  Ctrl+End              Jump to latest output");
    eprintln!("  Esc, Ctrl+Q           Quit");
    eprintln!();
    eprintln!("Log file: ~/.reborn/reborn.log (filter with RUST_LOG)");
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Options, String> {
    let args: Vec<String> = args.into_iter().collect();
    let mut options = Options::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing config path".to_string());
                }
                options.config_path = Some(PathBuf::from(&args[i]));
            }
            "-t" | "--theme" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing theme name".to_string());
                }
                let name = args[i].to_lowercase();
                if !ColorScheme::list().contains(&name.as_str()) {
                    return Err(format!(
                        "Unknown theme: {}. Available: {}",
                        args[i],
                        ColorScheme::list().join(", ")
                    ));
                }
                options.theme = Some(name);
            }
            "--autostart" => {
                options.autostart = true;
            }
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
        i += 1;
    }

    Ok(options)
}

/// Send tracing output to ~/.reborn/reborn.log
fn init_logging(level: &str) {
    let log_path = config::app_dir()
        .map(|dir| dir.join("reborn.log"))
        .unwrap_or_else(|| PathBuf::from("reborn.log"));

    // Open log file (append mode)
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Log panics; restore the terminal when the UI thread panics
fn install_panic_hook() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let on_ui_thread = thread::current().name() == Some("main");
        error!("Panic on {:?}: {}", thread::current().name(), info);

        // Worker panics are reported in the transcript instead
        if on_ui_thread {
            let mut stdout = io::stdout();
            let _ = execute!(stdout, DisableMouseCapture, LeaveAlternateScreen, Show);
            let _ = terminal::disable_raw_mode();
            default_hook(info);
        }
    }));
}

fn main() -> anyhow::Result<()> {
    let options = match parse_args(env::args()) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    let (mut config, config_error) = match &options.config_path {
        Some(path) => (
            Config::load_from(path).with_context(|| format!("loading {}", path.display()))?,
            None,
        ),
        None => match Config::load() {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        },
    };
    if let Some(theme) = options.theme {
        config.color_scheme = theme;
    }

    init_logging(&config.log.level);
    info!("reborn {} starting", VERSION);
    if let Some(e) = config_error {
        warn!("Ignoring config, using defaults: {}", e);
    }

    install_panic_hook();

    let mut renderer = Renderer::new();
    renderer.init(&config.ui.title).context("initializing terminal")?;

    let (cols, rows) = terminal::size()?;
    let mut app = App::new(&config, cols, rows);
    if options.autostart {
        app.start_game();
    }

    let result = run_main_loop(&mut app, &mut renderer);

    renderer.cleanup()?;
    // Closes the input queue and joins a waiting worker
    drop(app);

    match &result {
        Ok(()) => info!("reborn exiting"),
        Err(e) => error!("Main loop failed: {:#}", e),
    }
    result
}

fn run_main_loop(app: &mut App, renderer: &mut Renderer) -> anyhow::Result<()> {
    let poll_timeout = Duration::from_millis(10);

    loop {
        // Drain story output and exit notifications
        app.process_host_events();

        if app.take_dirty() {
            renderer.render(app)?;
        }
        if app.should_quit() {
            break;
        }

        // Poll for events
        if event::poll(poll_timeout)? {
            match event::read()? {
                Event::Key(key_event) => app.handle_key(&key_event),
                Event::Mouse(mouse_event) => app.handle_mouse(&mouse_event),
                Event::Resize(cols, rows) => {
                    renderer.resize(cols, rows);
                    app.resize(cols, rows);
                }
                _ => {}
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("reborn")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_defaults() {
        let options = parse_args(args(&[])).unwrap();
        assert!(options.config_path.is_none());
        assert!(options.theme.is_none());
        assert!(!options.autostart);
    }

    #[test]
    fn test_parse_all_options() {
        let options =
            parse_args(args(&["-c", "/tmp/reborn.toml", "--theme", "Dark", "--autostart"])).unwrap();
        assert_eq!(options.config_path, Some(PathBuf::from("/tmp/reborn.toml")));
        assert_eq!(options.theme.as_deref(), Some("dark"));
        assert!(options.autostart);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(args(&["--config"])).is_err());
        assert!(parse_args(args(&["-t", "neon"])).unwrap_err().contains("Unknown theme"));
        assert!(parse_args(args(&["--bogus"])).unwrap_err().contains("Unknown argument"));
    }
}
