use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use framestate::{
    ExportOpts, FrameIndex, FrameRange, JsonLinesSink, MemoryHost, Project, TimelineResolver,
};

#[derive(Parser, Debug)]
#[command(name = "framestate", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved document state at one frame.
    State(StateArgs),
    /// List the events a replay of one frame applies.
    Events(EventsArgs),
    /// Write every frame of a range as JSON lines.
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
struct StateArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Write the state here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct EventsArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output JSON lines path.
    #[arg(long)]
    out: PathBuf,

    /// First exported frame.
    #[arg(long, default_value_t = 0)]
    start: u64,

    /// End of the range (exclusive); defaults to the project duration.
    #[arg(long)]
    end: Option<u64>,

    /// Fail on frames that stay partial after retries.
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// Replays allowed per partial frame.
    #[arg(long, default_value_t = 2)]
    max_retries: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::State(args) => cmd_state(args).await,
        Command::Events(args) => cmd_events(args),
        Command::Export(args) => cmd_export(args).await,
    }
}

fn load(path: &Path) -> anyhow::Result<TimelineResolver<MemoryHost>> {
    let project =
        Project::from_path(path).with_context(|| format!("load project '{}'", path.display()))?;
    Ok(project.into_resolver(MemoryHost::new())?)
}

fn create_output(path: &Path) -> anyhow::Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create '{}'", path.display()))?;
    Ok(BufWriter::new(f))
}

async fn cmd_state(args: StateArgs) -> anyhow::Result<()> {
    let mut resolver = load(&args.in_path)?;
    let resolved = resolver
        .get_state_at_frame(FrameIndex(args.frame))
        .await
        .with_context(|| format!("resolve frame {}", args.frame))?;
    if resolved.status.is_partial() {
        tracing::warn!(frame = args.frame, "state is partial");
    }

    match &args.out {
        Some(path) => {
            let mut w = create_output(path)?;
            serde_json::to_writer_pretty(&mut w, &resolved).context("serialize state")?;
            w.flush().with_context(|| format!("write '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer_pretty(&mut lock, &resolved).context("serialize state")?;
            writeln!(lock)?;
        }
    }
    Ok(())
}

fn cmd_events(args: EventsArgs) -> anyhow::Result<()> {
    let resolver = load(&args.in_path)?;
    for line in resolver.describe_events_up_to(FrameIndex(args.frame)) {
        println!("{line}");
    }
    Ok(())
}

async fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let mut resolver = load(&args.in_path)?;
    let end = args.end.unwrap_or(resolver.config().duration_frames);
    let range = FrameRange::new(FrameIndex(args.start), FrameIndex(end))?;

    let mut sink = JsonLinesSink::new(create_output(&args.out)?);
    let opts = ExportOpts {
        max_retries: args.max_retries,
        strict: args.strict,
    };
    let stats = framestate::export_range(&mut resolver, range, opts, &mut sink)
        .await
        .with_context(|| format!("export frames {}..{}", args.start, end))?;

    eprintln!(
        "wrote {} ({} frames, {} partial, {} retries)",
        args.out.display(),
        stats.frames_total,
        stats.frames_partial,
        stats.retries
    );
    Ok(())
}
