mod app;
mod audio;
mod config;
mod ui;

use std::fs::File;
use std::path::PathBuf;
use std::{io, time::{Duration, Instant}};

use anyhow::Result;
use app::App;
use audio::AudioEngine;
use clap::Parser;
use config::Config;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        KeyboardEnhancementFlags, KeyModifiers, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::{backend::CrosstermBackend, Terminal};
use turing_cv::{Controller, MonotonicTimebase};

const FRAME: Duration = Duration::from_millis(16);

/// Desktop simulator for the Turing CV sequencer panel.
#[derive(Parser, Debug)]
#[command(name = "turing-cv", version, about)]
struct Args {
    /// Config file to overlay on the built-in defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for the note generator (overrides the config).
    #[arg(short, long)]
    seed: Option<u64>,

    /// Log at debug level (one line per step).
    #[arg(short, long)]
    verbose: bool,

    /// Don't open an audio device.
    #[arg(long)]
    no_audio: bool,
}

fn init_logging(verbose: bool) {
    use simplelog::{LevelFilter, WriteLogger};

    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("turing-cv")
        .join("turing-cv.log");
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = File::create(&log_path)
        .or_else(|_| File::create(std::env::temp_dir().join("turing-cv.log")));
    match file {
        Ok(file) => {
            if WriteLogger::init(level, simplelog::Config::default(), file).is_err() {
                eprintln!("logger already initialized");
            }
        }
        Err(e) => eprintln!("logging disabled: {}", e),
    }

    log::info!("turing-cv starting (log level: {:?})", level);
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = Config::load(args.config.as_deref())?;
    let settings = config.settings();
    let rng = match args.seed.or(config.seed()) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None       => StdRng::from_entropy(),
    };
    let controller = Controller::new(settings, MonotonicTimebase::new(), rng);

    let audio = if args.no_audio || !config.audio_enabled() {
        None
    } else {
        match AudioEngine::new(config.audio_wave(), config.audio_volume()) {
            Ok(engine) => Some(engine),
            Err(e) => {
                log::warn!("audio monitor unavailable: {:#}", e);
                None
            }
        }
    };
    let mut app = App::new(controller, settings.button_threshold, audio);

    enable_raw_mode()?;
    let mut stdout = io::stdout();

    let enhanced = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                    | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES))?;
    } else {
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let result = run(&mut terminal, &mut app, enhanced);

    disable_raw_mode()?;
    if enhanced {
        execute!(terminal.backend_mut(),
            PopKeyboardEnhancementFlags, LeaveAlternateScreen, DisableMouseCapture)?;
    } else {
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    }
    terminal.show_cursor()?;
    if let Err(e) = result {
        log::error!("{:#}", e);
        eprintln!("Error: {:?}", e);
    }
    Ok(())
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App, enhanced: bool) -> Result<()> {
    let mut last_draw: Option<Instant> = None;

    loop {
        if !enhanced { app.tick_fallback_release(); }
        app.step();

        if last_draw.map_or(true, |t| t.elapsed() >= FRAME) {
            terminal.draw(|f| ui::draw(f, app, enhanced))?;
            last_draw = Some(Instant::now());
        }

        if event::poll(Duration::from_millis(2))? {
            match event::read()? {
                Event::Key(key) => {
                    // ── Key release (enhanced mode only) ──────────────────
                    if key.kind == KeyEventKind::Release {
                        if key.code == KeyCode::Char(' ') { app.button_release(); }
                        continue;
                    }

                    // ── Key repeat ────────────────────────────────────────
                    if key.kind == KeyEventKind::Repeat {
                        match key.code {
                            KeyCode::Left  => app.knob0_down(),
                            KeyCode::Right => app.knob0_up(),
                            KeyCode::Up    => app.knob1_up(),
                            KeyCode::Down  => app.knob1_down(),
                            KeyCode::Char(' ') if !enhanced => app.button_press_fallback(),
                            _ => {}
                        }
                        continue;
                    }

                    // ── Key press ─────────────────────────────────────────
                    match key.code {
                        KeyCode::Esc | KeyCode::Char('q') => break,
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,

                        KeyCode::Left     => app.knob0_down(),
                        KeyCode::Right    => app.knob0_up(),
                        KeyCode::Home     => app.knob0_min(),
                        KeyCode::End      => app.knob0_max(),
                        KeyCode::Up       => app.knob1_up(),
                        KeyCode::Down     => app.knob1_down(),
                        KeyCode::PageUp   => { for _ in 0..32 { app.knob1_up(); } }
                        KeyCode::PageDown => { for _ in 0..32 { app.knob1_down(); } }

                        KeyCode::Char(' ') => {
                            if enhanced { app.button_press(); } else { app.button_press_fallback(); }
                        }
                        KeyCode::Char('c') | KeyCode::Enter => app.clock_pulse(),

                        _ => {}
                    }
                }
                Event::FocusLost => app.button_release(),
                _ => {}
            }
        }
    }

    app.button_release();
    Ok(())
}
