use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use visilathe::camtools::export::file_extension;
use visilathe::{
    init_logging, AppConfig, BackgroundComputeTask, ComputeInput, ComputeOutput, EventBus,
    PostprocessorRegistry, Project, ProjectSession, SimulationPlayback, StockProfile, BUILD_DATE,
    VERSION,
};

const USAGE: &str = "\
usage:
  visilathe export <project.json> <output> [--post <id>]
  visilathe demo <project.json>
  visilathe simulate <project.json>
  visilathe list-post
  visilathe --version";

fn main() -> anyhow::Result<()> {
    // Initialize logging
    init_logging()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config();
    let registry = PostprocessorRegistry::builtin().context("postprocessor registry is invalid")?;

    match args.first().map(String::as_str) {
        Some("export") => {
            let (project, output, post) = export_args(&args[1..])?;
            export(&config, registry, &project, output, post.as_deref())
        }
        Some("demo") => match args.get(1) {
            Some(path) => demo(&config, Path::new(path)),
            None => bail!("missing project path\n{}", USAGE),
        },
        Some("simulate") => match args.get(1) {
            Some(path) => simulate(&config, Path::new(path)),
            None => bail!("missing project path\n{}", USAGE),
        },
        Some("list-post") => {
            for entry in registry.entries() {
                println!("{:<10} {}", entry.id, entry.description);
            }
            Ok(())
        }
        Some("--version") => {
            println!("visilathe {} (built {})", VERSION, BUILD_DATE);
            Ok(())
        }
        _ => bail!("{}", USAGE),
    }
}

/// Application config, falling back to defaults when absent or unreadable.
fn load_config() -> AppConfig {
    let loaded = AppConfig::default_path().and_then(|path| AppConfig::load_or_default(&path));
    match loaded {
        Ok(config) => match config.validate() {
            Ok(()) => config,
            Err(e) => {
                tracing::warn!("Ignoring invalid config: {}", e);
                AppConfig::default()
            }
        },
        Err(e) => {
            tracing::warn!("Using default config: {}", e);
            AppConfig::default()
        }
    }
}

fn export_args(args: &[String]) -> anyhow::Result<(PathBuf, PathBuf, Option<String>)> {
    let mut positional = Vec::new();
    let mut post = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--post" {
            post = Some(iter.next().context("--post needs a postprocessor id")?.clone());
        } else {
            positional.push(PathBuf::from(arg));
        }
    }
    match <[PathBuf; 2]>::try_from(positional) {
        Ok([project, output]) => Ok((project, output, post)),
        Err(_) => bail!("export takes a project and an output path\n{}", USAGE),
    }
}

fn open(config: &AppConfig, path: &Path) -> anyhow::Result<ProjectSession> {
    let mut session = ProjectSession::new().with_atomic_save(config.export.atomic_write);
    session
        .open(path)
        .with_context(|| format!("failed to open project {}", path.display()))?;
    Ok(session)
}

fn export(
    config: &AppConfig,
    registry: &PostprocessorRegistry,
    project: &Path,
    mut output: PathBuf,
    post: Option<&str>,
) -> anyhow::Result<()> {
    let session = open(config, project)?;
    let id = post.unwrap_or(&session.project().global().postprocessor_id);
    if output.extension().is_none() {
        output.set_extension(file_extension(session.project().global(), registry, id)?);
    }
    let lines = session
        .export(&output, registry, post)
        .with_context(|| format!("failed to export {}", output.display()))?;
    println!("{}: {} lines ({})", output.display(), lines, id);
    Ok(())
}

/// Write a small starter project with one default toolpath.
fn demo(config: &AppConfig, path: &Path) -> anyhow::Result<()> {
    let mut project = Project::new();
    let global = project.global_mut();
    global.material_diameter = 35.0;
    global.material_length = 60.0;
    global.postprocessor_id = config.export.default_postprocessor.clone();
    project.add_toolpath();

    let mut session = ProjectSession::new().with_atomic_save(config.export.atomic_write);
    *session.project_mut() = project;
    session
        .save_as(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}

/// Compute the project in the background and play the result to the end.
fn simulate(config: &AppConfig, path: &Path) -> anyhow::Result<()> {
    let session = open(config, path)?;
    let project = session.project();

    let task = BackgroundComputeTask::new(Arc::new(EventBus::new()))?;
    task.restart_with_data(ComputeInput {
        global: project.global().clone(),
        toolpaths: project.toolpaths().to_vec(),
    });
    if !task.wait_idle(Duration::from_secs(120)) {
        bail!("toolpath computation did not finish");
    }
    let moves = match task.output() {
        ComputeOutput::Ready { moves, .. } => moves,
        ComputeOutput::NoResult => bail!("no toolpath result: {:?}", task.state()),
    };

    let stock = StockProfile::for_toolpaths(project.global(), project.toolpaths())
        .context("project has no machinable shape")?;
    let mut playback = SimulationPlayback::new(moves.clone(), stock.clone());
    playback.set_rate(config.simulation.ticks_per_second)?;
    playback.play();
    while playback.tick().is_some() {}

    let estimated = moves.estimated_time(project.global());
    println!("moves:          {}", playback.progress_label());
    println!("cut length:     {:.1} mm", moves.cut_length());
    println!("rapid length:   {:.1} mm", moves.rapid_length());
    println!("machining time: {:.0} s", estimated.as_secs_f64());
    println!(
        "removed:        {:.0} mm³",
        playback.state().profile.removed_volume(&stock)
    );
    println!(
        "playback:       {:.0} s at {} ticks/s",
        playback.total() as f64 * playback.interval().as_secs_f64(),
        playback.rate()
    );
    Ok(())
}
