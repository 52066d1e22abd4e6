use ime_core::config::get_settings_path;
use ime_core::protocol::{encode, parse_line, Request};
use ime_core::{EngineConfig, ImeEngine, Notification};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

// Settings path may be overridden by the first argument; stdout carries only protocol lines.
fn settings_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(get_settings_path)
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();
    info!("code table engine starting");

    let settings = settings_path();
    let mut saved = EngineConfig::load_or_default(&settings);
    let config = saved.clone();
    let (mut engine, startup) = ImeEngine::from_config(&config);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    emit(&startup, &mut stdout)?;

    for line in stdin.lock().lines() {
        let input = line?;
        debug!(input = %input, "<-");
        match parse_line(&input) {
            Ok(Request::Engine(command)) => {
                let events = engine.handle(command);
                emit(&events, &mut stdout)?;
            }
            Ok(Request::Exit) => {
                info!("received EXIT");
                break;
            }
            Err(e) => warn!(error = %e, "ignoring line"),
        }
    }

    engine.sync_config(&config, &mut saved);
    if let Err(e) = saved.save(&settings) {
        error!(error = %e, "could not save settings");
    }
    info!("shutting down");
    Ok(())
}

fn emit(events: &[Notification], stdout: &mut io::Stdout) -> io::Result<()> {
    for event in events {
        let line = encode(event)?;
        debug!(output = %line, "->");
        writeln!(stdout, "{}", line)?;
    }
    stdout.flush()
}
