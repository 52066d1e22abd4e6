use arboard::Clipboard;
use clap::Parser;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use ime_core::config::get_settings_path;
use ime_core::{Command, EngineConfig, ImeEngine, Notification};
use std::io::{self, stdin, stdout, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Interactive code-table input: type a code, pick a candidate, press Enter
/// to copy the result.
#[derive(Parser, Debug)]
#[command(name = "ime_engine")]
struct Args {
    /// Settings file (defaults to the per-user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dictionary source file, overriding the settings
    #[arg(long)]
    dictionary: Option<PathBuf>,

    /// Enable V/R shortcodes
    #[arg(long)]
    vr: bool,

    /// Provisionally insert the first candidate when a choice opens
    #[arg(long)]
    preselect: bool,
}

/// Sends committed text to the system clipboard. A missing clipboard (e.g. a
/// headless session) only disables copying.
struct ClipboardSink {
    clipboard: Option<Clipboard>,
}

impl ClipboardSink {
    fn new() -> Self {
        let clipboard = Clipboard::new()
            .map_err(|e| warn!(error = %e, "clipboard unavailable"))
            .ok();
        Self { clipboard }
    }

    fn copy(&mut self, text: &str) -> bool {
        match self.clipboard.as_mut().map(|c| c.set_text(text)) {
            Some(Ok(())) => true,
            Some(Err(e)) => {
                warn!(error = %e, "failed to copy to clipboard");
                false
            }
            None => false,
        }
    }
}

#[derive(Default)]
struct Screen {
    candidates: Vec<String>,
    status: Option<String>,
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let settings_path = args.config.clone().unwrap_or_else(get_settings_path);
    // Flags apply to this run only; `saved` is what goes back to disk.
    let mut saved = EngineConfig::load_or_default(&settings_path);
    let mut config = saved.clone();
    if let Some(dictionary) = args.dictionary {
        config.dictionary_path = dictionary;
    }
    config.vr_mode |= args.vr;
    config.preselect_mode |= args.preselect;

    let (mut engine, startup) = ImeEngine::from_config(&config);
    let mut clipboard = ClipboardSink::new();
    let mut screen = Screen::default();
    apply(startup, &mut screen, &mut clipboard);

    loop {
        print_ui(&engine, &screen)?;

        let mut input = String::new();
        if stdin().read_line(&mut input)? == 0 {
            break;
        }
        screen.status = None;

        let command = match input.trim() {
            "exit" | ":q" => break,
            "" => Command::CommitTrigger,
            ":x" => Command::Cancel,
            ":vr" => Command::ToggleVrMode(!engine.vr_mode()),
            ":pre" => Command::TogglePreselectMode(!engine.preselect_mode()),
            ":clear" => Command::ClearOutput,
            ":clearhistory" => Command::ClearHistory,
            ":reload" => Command::ReloadDictionary,
            s if s.starts_with(":h ") => match s[3..].trim().parse::<usize>() {
                Ok(n) => Command::RecallHistory(n),
                Err(_) => {
                    screen.status = Some(format!("not a history index: {}", &s[3..]));
                    continue;
                }
            },
            s if s.starts_with(':') && s.len() > 1 => match s[1..].parse::<usize>() {
                Ok(n) => Command::SelectIndex(n),
                Err(_) => {
                    screen.status = Some(format!("unknown command: {}", s));
                    continue;
                }
            },
            s if s.starts_with('\'') => Command::TypedText(s[1..].to_string()),
            s => Command::TypedCode(s.to_string()),
        };

        let events = engine.handle(command);
        apply(events, &mut screen, &mut clipboard);
    }

    engine.sync_config(&config, &mut saved);
    if let Err(e) = saved.save(&settings_path) {
        eprintln!("[ERROR] Could not save settings: {}", e);
    } else {
        info!(path = %settings_path.display(), "settings saved");
    }
    Ok(())
}

fn apply(events: Vec<Notification>, screen: &mut Screen, clipboard: &mut ClipboardSink) {
    for event in events {
        match event {
            Notification::CandidatesReady { candidates } => screen.candidates = candidates,
            Notification::SessionClosed => screen.candidates.clear(),
            Notification::Committed { text } | Notification::CopyRequested { text } => {
                let note = if clipboard.copy(&text) { "copied" } else { "not copied" };
                screen.status = Some(format!("'{}' {}", text, note));
            }
            Notification::NoMatch { code } => {
                screen.status = Some(format!("no words for '{}'", code));
            }
            Notification::DictionaryLoaded { entries } => {
                screen.status = Some(format!("dictionary: {} codes", entries));
            }
            Notification::Warning { message } => screen.status = Some(message),
            Notification::OutputChanged { .. } | Notification::HistoryChanged { .. } => {}
        }
    }
}

fn print_ui(engine: &ImeEngine, screen: &Screen) -> io::Result<()> {
    let mut out = stdout();
    execute!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    writeln!(out, "{}", "Code Table IME".bold())?;
    writeln!(out, "---------------------------------------------------------------")?;
    writeln!(out, "Type a code and press [Enter]. Empty line copies the output.")?;
    writeln!(out, "':N' picks a candidate, ':x' cancels, a leading ' types text literally.")?;
    writeln!(out, "':vr' / ':pre' toggle modes, ':h N' recalls history, 'exit' quits.\n")?;

    let on_off = |b: bool| if b { "on".green() } else { "off".dark_grey() };
    writeln!(
        out,
        "VR shortcodes: {}   Preselect: {}",
        on_off(engine.vr_mode()),
        on_off(engine.preselect_mode())
    )?;
    writeln!(out, "\nOutput: [{}]", engine.output().cyan())?;

    if !screen.candidates.is_empty() {
        writeln!(out, "\nCandidates:")?;
        for (i, word) in screen.candidates.iter().enumerate() {
            writeln!(out, "  :{}: {}", i, word)?;
        }
    }

    if !engine.history().is_empty() {
        writeln!(out, "\nHistory:")?;
        for (i, entry) in engine.history().iter().enumerate() {
            writeln!(out, "  {:>2} {}", i, entry)?;
        }
    }

    if let Some(status) = &screen.status {
        writeln!(out, "\n{}", status.as_str().yellow())?;
    }
    write!(out, "\n> ")?;
    out.flush()
}
