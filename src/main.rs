//! docanno-replay: feed a page and a recorded input script through the
//! annotation engine and print what it emitted.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use docanno::replay::{load_script, run_script};
use docanno::{AnnotationEngine, EngineConfig, PageError, PageView};

#[derive(Parser, Debug)]
#[command(
    name = "docanno-replay",
    version,
    about = "Replay recorded pointer and keyboard input against a document page"
)]
struct Cli {
    /// Page JSON (tokens, annotations, categories)
    page: PathBuf,
    /// Input script JSON (array of steps)
    script: PathBuf,
    /// Page image, required by the magic wand
    #[arg(long)]
    image: Option<PathBuf>,
    /// Engine config JSON (default: user config directory)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Also write a COCO export of the final page here
    #[arg(long)]
    coco: Option<PathBuf>,
}

fn load_config(path: Option<&PathBuf>) -> EngineConfig {
    match path {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config {:?}: {}; using defaults", path, e);
                EngineConfig::default()
            }
        },
        None => EngineConfig::load_from_default_path().unwrap_or_default(),
    }
}

fn run(cli: &Cli, config: EngineConfig) -> Result<(), PageError> {
    let page = PageView::load(&cli.page)?;
    let steps = load_script(&cli.script)?;

    let mut engine = AnnotationEngine::from_page(page, config);
    if let Some(path) = &cli.image {
        let image = image::open(path)?.to_rgba8();
        engine.set_image(image);
    }

    let output = run_script(&mut engine, &steps)?;
    log::info!(
        "✅ Replay finished: {} events, {} annotations",
        output.events.len(),
        output.annotations.len()
    );

    if let Some(path) = &cli.coco {
        docanno::export::export_page_to_file(engine.page(), engine.annotations(), path)?;
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Start logging before the config is read so its load messages are kept.
/// Without `RUST_LOG`, the config's level takes over once it is known.
fn init_logging() -> bool {
    let from_env = std::env::var_os("RUST_LOG").is_some();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace")).init();
    if !from_env {
        log::set_max_level(log::LevelFilter::Info);
    }
    from_env
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let from_env = init_logging();
    let config = load_config(cli.config.as_ref());
    if !from_env {
        log::set_max_level(config.log_level.to_level_filter());
    }

    match run(&cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Replay failed: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
