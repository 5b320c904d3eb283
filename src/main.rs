use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::EnvFilter;
use tui_dispatch::{
    EffectContext, EffectStoreLike, EffectStoreWithMiddleware, EventOutcome, RenderContext, TaskKey,
};
use tui_dispatch_debug::debug::DebugLayer;
use tui_dispatch_debug::{
    DebugCliArgs, DebugRunOutput, DebugSession, DebugSessionError, ReplayItem,
};

use pocketbattle::action::Action;
use pocketbattle::audio::{AudioService, MutedAudio, SynthAudio};
use pocketbattle::config::{default_log_path, Pacing, TICK_INTERVAL};
use pocketbattle::effect::Effect;
use pocketbattle::locale::{Language, Locales};
use pocketbattle::reducer::reducer;
use pocketbattle::rng::SeededRng;
use pocketbattle::roster::Roster;
use pocketbattle::state::AppState;
use pocketbattle::ui;

#[derive(Parser, Debug)]
#[command(name = "pocketbattle")]
#[command(about = "Turn-based monster battles against a ladder of trainers")]
struct Args {
    /// Seed for combat randomness. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Interface language (en or es).
    #[arg(long, default_value = "en")]
    lang: String,

    /// RON roster to load instead of the built-in one.
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Multiplier for dialog and pause timings.
    #[arg(long, default_value_t = 1.0)]
    speed: f32,

    /// Log file location.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Disable sound and music.
    #[arg(long)]
    mute: bool,

    #[command(flatten)]
    debug: DebugCliArgs,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    let log_path = args.log_file.clone().unwrap_or_else(default_log_path);
    init_logging(&log_path)?;

    let language = Language::from_code(&args.lang).map_err(io::Error::other)?;
    let locales = Locales::embedded(language).map_err(io::Error::other)?;
    let roster = match args.roster.as_deref() {
        Some(path) => Roster::load(path).await,
        None => Roster::embedded(),
    }
    .map_err(io::Error::other)?;
    let rng = match args.seed {
        Some(seed) => SeededRng::new(seed),
        None => SeededRng::from_entropy(),
    };
    let pacing = Pacing::with_speed(args.speed);
    tracing::info!(
        language = language.code(),
        seed = ?args.seed,
        speed = args.speed,
        trainers = roster.trainers.len(),
        "starting pocketbattle"
    );

    let audio: Box<dyn AudioService> = if args.mute {
        Box::new(MutedAudio)
    } else {
        Box::new(SynthAudio::spawn())
    };

    let fresh = AppState::new(roster, locales, pacing, rng);
    let debug = DebugSession::new(args.debug);
    let state = debug
        .load_state_or_else_async(|| {
            let fresh = fresh.clone();
            async move { Ok::<AppState, io::Error>(fresh) }
        })
        .await
        .map_err(debug_error)?;
    let replay_actions = debug.load_replay_items().map_err(debug_error)?;
    let (middleware, recorder) = debug.middleware_with_recorder();
    let store = EffectStoreWithMiddleware::new(state, reducer, middleware);

    let use_alt_screen = debug.use_alt_screen();
    let mut stdout = io::stdout();
    if use_alt_screen {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &debug, store, replay_actions, audio.as_ref()).await;

    if use_alt_screen {
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
    }

    let run_output = result?;
    run_output.write_render_output()?;
    debug.save_actions(recorder.as_ref()).map_err(debug_error)?;
    tracing::info!("pocketbattle exited");
    Ok(())
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pocketbattle=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn debug_error(error: DebugSessionError) -> io::Error {
    io::Error::other(format!("debug session error: {error}"))
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    debug: &DebugSession,
    store: impl EffectStoreLike<AppState, Action, Effect>,
    replay_actions: Vec<ReplayItem<Action>>,
    audio: &dyn AudioService,
) -> io::Result<DebugRunOutput<AppState>> {
    debug
        .run_effect_app(
            terminal,
            store,
            DebugLayer::simple(),
            replay_actions,
            Some(Action::Init),
            Some(Action::Quit),
            |runtime| {
                if debug.render_once() {
                    return;
                }
                runtime
                    .subscriptions()
                    .interval("tick", TICK_INTERVAL, || Action::Tick);
            },
            |frame, area, state, render_ctx: RenderContext| {
                ui::render(frame, area, state, render_ctx);
            },
            |event, state| -> EventOutcome<Action> { ui::handle_event(event, state) },
            |action| matches!(action, Action::Quit),
            |effect, ctx| handle_effect(effect, ctx, audio),
        )
        .await
}

fn handle_effect(effect: Effect, ctx: &mut EffectContext<Action>, audio: &dyn AudioService) {
    match effect {
        Effect::Wait { ticket, duration } => {
            ctx.tasks().spawn(TaskKey::new("battle_wait"), async move {
                sleep(duration).await;
                Action::BattleResume { ticket }
            });
        }
        Effect::TypeLetter { ticket, delay } => {
            ctx.tasks().spawn(TaskKey::new("dialog_letter"), async move {
                sleep(delay).await;
                Action::DialogLetter { ticket }
            });
        }
        Effect::PlaySound(name) => audio.play_sound(name),
        Effect::PlayMusic(name) => audio.play_music(name),
        Effect::PauseMusic(paused) => audio.pause_music(paused),
    }
}

async fn sleep(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
