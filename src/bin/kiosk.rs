use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kiosk::{
    CoordinatorOpts, DirectorySource, Key, Millis, RecordingSurface, SceneSource, SimClip,
    SimulatedBackend, Size, TransitionCoordinator,
};

#[derive(Parser, Debug)]
#[command(name = "kiosk", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate every scene document in a directory.
    Check(CheckArgs),
    /// Drive the presentation headlessly through a key script and print the final state as JSON.
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Directory holding `<scene>.yaml` / `.yml` / `.json` documents.
    #[arg(long)]
    scenes: PathBuf,

    /// Coordinator options (YAML or JSON).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Directory holding `<scene>.yaml` / `.yml` / `.json` documents.
    #[arg(long)]
    scenes: PathBuf,

    /// Comma-separated keys (`up`, `down`, `enter`, `escape`, digits, or transition names).
    #[arg(long, default_value = "")]
    keys: String,

    /// Simulated time between host updates.
    #[arg(long, default_value_t = 10)]
    step_ms: u64,

    /// Simulated time to run after each key (and after start).
    #[arg(long, default_value_t = 500)]
    settle_ms: u64,

    /// Duration reported for every simulated clip.
    #[arg(long, default_value_t = 3_000)]
    clip_ms: u64,

    /// Viewport as `<width>x<height>`.
    #[arg(long, default_value = "1920x1080")]
    viewport: String,

    /// Coordinator options (YAML or JSON).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kiosk=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Check(args) => cmd_check(args),
        Command::Simulate(args) => cmd_simulate(args),
    }
}

fn load_opts(path: Option<&PathBuf>) -> anyhow::Result<CoordinatorOpts> {
    match path {
        Some(path) => CoordinatorOpts::from_path(path)
            .with_context(|| format!("load config '{}'", path.display())),
        None => Ok(CoordinatorOpts::default()),
    }
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let opts = load_opts(args.config.as_ref())?;
    let source = DirectorySource::new(&args.scenes).with_preload_name(&opts.preload_doc);
    let names = source
        .scene_names()
        .with_context(|| format!("list scenes in '{}'", args.scenes.display()))?;
    let known: BTreeSet<&str> = names.iter().map(String::as_str).collect();

    let mut problems = Vec::new();
    if !known.contains(opts.entry_scene.as_str()) {
        problems.push(format!("entry scene '{}' is not defined", opts.entry_scene));
    }
    match source.load_preload(&opts.preload_doc) {
        Ok(Some(preload)) => problems.extend(
            preload
                .asset_problems()
                .into_iter()
                .map(|p| format!("{}: {p}", opts.preload_doc)),
        ),
        Ok(None) => {}
        Err(e) => problems.push(format!("{}: {e}", opts.preload_doc)),
    }
    for name in &names {
        match source.load_spec(name) {
            Ok(spec) => {
                problems.extend(
                    spec.asset_problems()
                        .into_iter()
                        .map(|p| format!("{name}: {p}")),
                );
                for target in spec.referenced_scenes() {
                    if !known.contains(target) {
                        problems.push(format!("{name}: references missing scene '{target}'"));
                    }
                }
            }
            Err(e) => problems.push(format!("{name}: {e}")),
        }
    }

    for p in &problems {
        eprintln!("{p}");
    }
    if !problems.is_empty() {
        anyhow::bail!("{} problem(s) in {} scene(s)", problems.len(), names.len());
    }
    eprintln!("{} scene(s) ok", names.len());
    Ok(())
}

fn parse_viewport(s: &str) -> anyhow::Result<Size> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .with_context(|| format!("viewport '{s}' must look like 1920x1080"))?;
    let w: f64 = w.trim().parse().with_context(|| format!("viewport width '{w}'"))?;
    let h: f64 = h.trim().parse().with_context(|| format!("viewport height '{h}'"))?;
    anyhow::ensure!(w > 0.0 && h > 0.0, "viewport must be positive");
    Ok(Size::new(w, h))
}

#[derive(serde::Serialize)]
struct SimReport<'a> {
    now: Millis,
    current: Option<&'a str>,
    transitioning: bool,
    menu_index: Option<usize>,
    selected: Option<&'a str>,
    background_from: Option<&'a str>,
    audio: Vec<&'a str>,
    history: &'a [kiosk::CommittedTransition],
    videos: Vec<kiosk::SimVideoSnapshot>,
    playing_audio: Vec<kiosk::SimAudioSnapshot>,
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let opts = load_opts(args.config.as_ref())?;
    anyhow::ensure!(args.step_ms > 0, "step-ms must be > 0");
    let keys = args
        .keys
        .split(',')
        .filter_map(Key::parse)
        .collect::<Vec<_>>();

    let backend = SimulatedBackend::new();
    backend.set_default_clip(SimClip {
        duration: Millis(args.clip_ms),
        ..SimClip::default()
    });
    let surface = RecordingSurface::new(parse_viewport(&args.viewport)?);
    let source = DirectorySource::new(&args.scenes).with_preload_name(&opts.preload_doc);

    let mut coord = TransitionCoordinator::new(
        Box::new(source),
        Box::new(backend.clone()),
        Box::new(surface),
        opts,
    )?;
    coord.start().context("start entry scene")?;

    let mut now = Millis::ZERO;
    let mut settle = |coord: &mut TransitionCoordinator| {
        let until = now + Millis(args.settle_ms);
        while now < until {
            now = now + Millis(args.step_ms);
            coord.update(now);
        }
    };

    settle(&mut coord);
    for key in &keys {
        if let Err(e) = coord.handle_key(key) {
            tracing::error!(?key, error = %e, "key failed");
        }
        settle(&mut coord);
    }

    let scene = coord.current_scene();
    let report = SimReport {
        now: coord.now(),
        current: coord.current_name(),
        transitioning: coord.is_transitioning(),
        menu_index: scene
            .filter(|s| !s.menu().is_empty())
            .map(|s| s.menu().index()),
        selected: scene.and_then(|s| s.selected()),
        background_from: scene.and_then(|s| s.background()).map(|bg| bg.source()),
        audio: coord.registry().iter().map(|(file, _)| file).collect(),
        history: coord.history(),
        videos: backend.videos().into_iter().filter(|v| v.visible).collect(),
        playing_audio: backend.audios().into_iter().filter(|a| a.playing).collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serialize report")?
    );
    Ok(())
}
