use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::{info, warn};
use tunnelvision::{Engine, EngineConfig, LevelDescription, LevelManager};

#[derive(Parser, Debug)]
#[command(name = "tunnelvision", version, about = "Walk through non-Euclidean tunnels")]
struct Args {
    /// Level name under the levels directory, or a path to a level file.
    level: Option<String>,

    /// Engine configuration JSON; defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Render a single frame headless and write it as PNG.
    #[arg(long, value_name = "OUT.png")]
    screenshot: Option<PathBuf>,

    #[arg(long, default_value = "levels")]
    levels_dir: PathBuf,

    /// Recurse into every portal instead of pruning hidden ones.
    #[arg(long)]
    no_queries: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    let manager = LevelManager::from_dir(&args.levels_dir).unwrap_or_else(|err| {
        warn!("no level directory: {err}");
        LevelManager::new()
    });

    let mut engine = Engine::new(config, args.width, args.height)?;
    engine.set_occlusion_queries(!args.no_queries);

    let level = pick_level(&manager, args.level.as_deref())?;
    let report = engine.load_level(&level)?;
    if report.dropped_count() > 0 {
        warn!("{} portal link(s) could not be resolved", report.dropped_count());
    }

    if let Some(out) = &args.screenshot {
        let stats = engine.render();
        info!("{stats:?}");
        engine.save_screenshot(out)?;
        return Ok(());
    }

    run_window(engine, &manager)
}

/// A file path wins over a level name; no argument picks the first known level.
fn pick_level(manager: &LevelManager, level: Option<&str>) -> Result<LevelDescription, Box<dyn Error>> {
    match level {
        Some(arg) if Path::new(arg).is_file() => Ok(LevelDescription::from_file(arg)?),
        Some(name) => Ok(manager.load(name)?),
        None => {
            let first = manager.names().next().ok_or("no levels found")?;
            Ok(manager.load(first)?)
        }
    }
}

#[cfg(feature = "window")]
fn run_window(mut engine: Engine, manager: &LevelManager) -> Result<(), Box<dyn Error>> {
    use tunnelvision::window::{FrameLimiter, Window, WindowEvent};

    let mut window = Window::new("Tunnelvision", engine.screen().width(), engine.screen().height())?;
    let mut limiter = FrameLimiter::new(&window);
    let names: Vec<&str> = manager.names().collect();

    loop {
        match window.poll_events() {
            WindowEvent::Quit => break,
            WindowEvent::Resize(w, h) => {
                window.resize(w, h)?;
                engine.resize(w, h);
            }
            WindowEvent::SelectLevel(index) => match names.get(index) {
                Some(name) => {
                    if let Err(err) = manager.load(name).and_then(|desc| engine.load_level(&desc)) {
                        warn!("could not load level '{name}': {err}");
                    }
                }
                None => warn!("no level bound to key {}", index + 1),
            },
            WindowEvent::None => {}
        }

        let delta_ms = limiter.wait_and_get_delta(&window);
        let input = window.take_input().to_player_input();
        engine.advance(delta_ms as f32 / 1000.0, &input);
        engine.render();
        window.present(engine.frame_buffer())?;
    }
    Ok(())
}

#[cfg(not(feature = "window"))]
fn run_window(_engine: Engine, _manager: &LevelManager) -> Result<(), Box<dyn Error>> {
    Err("built without the `window` feature; pass --screenshot to render headless".into())
}
