/// Entry point and frame loop.
///
/// usage: trainercard [--config <path-to-config.toml>]

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use trainercard::config::{AppConfig, LogConfig};
use trainercard::sim::canvas::CardCanvas;
use trainercard::sim::display::DisplayState;
use trainercard::sim::event::CardEvent;
use trainercard::sim::link::Offline;
use trainercard::sim::screen::{ScreenInput, TrainerCardScreen};
use trainercard::ui::gamepad::GamepadState;
use trainercard::ui::input::InputState;
use trainercard::ui::renderer::Renderer;
use trainercard::ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(2);

#[derive(Debug, Default)]
struct CliArgs {
    config: Option<PathBuf>,
}

fn parse_args() -> Result<CliArgs> {
    let mut args = env::args().skip(1);
    let mut cli = CliArgs::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a path to config.toml"))?;
                cli.config = Some(PathBuf::from(path));
            }
            _ => return Err(anyhow!("unexpected argument: {arg}\nusage: trainercard [--config <path>]")),
        }
    }

    Ok(cli)
}

/// File-only logging: the terminal belongs to the renderer.
/// `RUST_LOG` overrides the configured level.
fn init_tracing(log: &LogConfig) -> Result<WorkerGuard> {
    // Start each run with a fresh log file.
    let _ = fs::remove_file(&log.file);

    let dir = match log.file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = log
        .file
        .file_name()
        .ok_or_else(|| anyhow!("log file path has no file name: {}", log.file.display()))?;
    let file_appender = tracing_appender::rolling::never(dir, name);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log.level))
        .context("invalid log level")?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(writer)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;
    Ok(guard)
}

fn main() -> Result<()> {
    let args = parse_args()?;
    let loaded = AppConfig::load(args.config.as_deref());
    let _guard = init_tracing(&loaded.config.log)?;
    loaded.report();
    let config = loaded.config;
    info!(tick_rate_ms = config.timing.tick_rate_ms, "starting");
    let p = &config.profile;
    info!(
        name = %p.name,
        stars = p.star_count(),
        badges = p.badge_count(),
        link_record = p.has_link_results(),
        "profile loaded"
    );

    let mut renderer = Renderer::new();
    renderer.init().context("terminal init failed")?;

    let sound = SoundEngine::new();

    let result = frame_loop(&mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = &result {
        error!("{e:#}");
    }
    result
}

fn frame_loop(renderer: &mut Renderer, sound: Option<&SoundEngine>, config: &AppConfig) -> Result<()> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.reports_key_release();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let mut screen = TrainerCardScreen::new();
    let mut canvas = CardCanvas::new(config.profile.clone());
    let mut display = DisplayState::new();
    let link = Offline;

    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);
    let mut last_tick = Instant::now();

    // Presses seen between ticks, latched until the next tick consumes them.
    let mut pending = ScreenInput::default();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            info!("interrupted");
            break;
        }
        pending.flip |= kb.flip_pressed() || gp.flip_pressed();
        pending.close |= kb.close_pressed() || gp.close_pressed();

        if last_tick.elapsed() >= tick_rate {
            let input = std::mem::take(&mut pending);
            let events = screen.tick(input, &mut canvas, &mut display, &link);
            process_sound_events(sound, &events);
            screen.vblank(&mut display);

            renderer.render(&canvas, &display, screen.fade_level())?;
            last_tick = Instant::now();

            if screen.closed() {
                break;
            }
        }

        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[CardEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            CardEvent::FlipStarted => sfx.play_card_flip(),
            CardEvent::FlipMidpoint => sfx.play_card_flipping(),
            CardEvent::CardOpened => sfx.play_card_open(),
            CardEvent::FlipFinished | CardEvent::CardClosed => {}
        }
    }
}
