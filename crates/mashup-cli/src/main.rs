mod render;
mod worker;

use std::io::{self, BufRead, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use mashup_contracts::assets::SlotRole;
use mashup_contracts::events::{EventWriter, SessionEvent, SessionMode};
use mashup_contracts::studio::{parse_intent, StudioIntent, STUDIO_HELP_COMMANDS};
use mashup_engine::{
    default_registry, AppController, DisplayState, GenerationRequester, RequesterConfig,
    SelectedFile, SlotChange,
};
use tracing_subscriber::EnvFilter;

use crate::render::render_view;
use crate::worker::GenerationWorker;

#[derive(Debug, Parser)]
#[command(
    name = "mashup",
    version,
    about = "Put a character and a product into one generated image"
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate one mashup and write it to the output directory
    Generate(GenerateArgs),
    /// Interactive session with upload slots and a generate action
    Studio(StudioArgs),
}

#[derive(Debug, Args)]
struct ProviderArgs {
    /// Generation backend
    #[arg(long, default_value = "gemini")]
    provider: String,
    /// Model identifier; overrides MASHUP_IMAGE_MODEL
    #[arg(long)]
    model: Option<String>,
    /// Event log path; defaults to <out>/events.jsonl
    #[arg(long)]
    events: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct GenerateArgs {
    /// Character image file
    #[arg(long)]
    character: PathBuf,
    /// Product image file
    #[arg(long)]
    product: PathBuf,
    #[arg(long, default_value = ".")]
    out: PathBuf,
    #[command(flatten)]
    provider: ProviderArgs,
}

#[derive(Debug, Parser)]
struct StudioArgs {
    #[arg(long, default_value = ".")]
    out: PathBuf,
    #[command(flatten)]
    provider: ProviderArgs,
}

fn main() {
    let cli = Cli::parse();
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(cli.command) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("mashup error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run(command: Command) -> Result<i32> {
    match command {
        Command::Generate(args) => run_generate(args),
        Command::Studio(args) => {
            run_studio(args)?;
            Ok(0)
        }
    }
}

fn resolve_requester(args: &ProviderArgs) -> Result<Arc<dyn GenerationRequester>> {
    let config = RequesterConfig::from_env().with_model(args.model.as_deref());
    let registry = default_registry(&config)?;
    let Some(requester) = registry.get(&args.provider) else {
        bail!(
            "unknown provider '{}' (available: {})",
            args.provider,
            registry.names().join(", ")
        );
    };
    Ok(requester)
}

fn open_events(out: &Path, events: Option<&Path>) -> EventWriter {
    let path = events
        .map(Path::to_path_buf)
        .unwrap_or_else(|| out.join("events.jsonl"));
    let session_id = format!("session-{}", uuid::Uuid::new_v4().simple());
    EventWriter::new(path, session_id)
}

fn run_generate(args: GenerateArgs) -> Result<i32> {
    let requester = resolve_requester(&args.provider)?;
    let events = open_events(&args.out, args.provider.events.as_deref());
    events.emit(&SessionEvent::SessionStarted {
        mode: SessionMode::Generate,
        provider: requester.name().to_string(),
    })?;

    let mut controller = AppController::new();
    for (role, path) in [
        (SlotRole::Character, &args.character),
        (SlotRole::Product, &args.product),
    ] {
        let change = controller.select(role, &SelectedFile::from_path(path));
        emit_slot_event(&events, &controller, role, change)?;
        if !controller.slot(role).is_populated() {
            bail!("could not read {} image {}", role, path.display());
        }
    }

    let Some(job) = controller.begin_generate() else {
        bail!("generation could not start");
    };
    events.emit(&SessionEvent::GenerationStarted { ticket: job.ticket })?;
    let outcome = job.run(requester.as_ref());
    controller.complete_generate(job.ticket, outcome);
    emit_outcome_event(&events, controller.display())?;

    match controller.display() {
        DisplayState::Result(_) => {
            let path = controller.download(&args.out)?;
            events.emit(&SessionEvent::DownloadWritten { path: path.clone() })?;
            println!("{}", path.display());
            Ok(0)
        }
        DisplayState::Error(message) => {
            eprintln!("Generation Failed: {message}");
            Ok(1)
        }
        other => bail!("generation ended in unexpected state '{}'", other.label()),
    }
}

fn run_studio(args: StudioArgs) -> Result<()> {
    let requester = resolve_requester(&args.provider)?;
    let events = open_events(&args.out, args.provider.events.as_deref());
    studio_loop(
        requester,
        &events,
        &args.out,
        io::stdin().lock(),
        io::stdout().lock(),
    )
}

/// Reads studio commands from `input` until EOF or `/quit`, writing views
/// and messages to `output`.
fn studio_loop(
    requester: Arc<dyn GenerationRequester>,
    events: &EventWriter,
    out_dir: &Path,
    mut input: impl BufRead,
    mut output: impl Write,
) -> Result<()> {
    events.emit(&SessionEvent::SessionStarted {
        mode: SessionMode::Studio,
        provider: requester.name().to_string(),
    })?;

    let worker = GenerationWorker::spawn(Arc::clone(&requester));
    let mut controller = AppController::new();
    let mut line = String::new();

    writeln!(
        output,
        "Character Product Mashup ({}). Type /help for commands.",
        requester.name()
    )?;
    write!(output, "{}", render_view(&controller.view()))?;

    loop {
        drain_outcomes(&worker, &mut controller, events, &mut output)?;
        write!(output, "> ")?;
        output.flush()?;

        line.clear();
        let read = match input.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }
        drain_outcomes(&worker, &mut controller, events, &mut output)?;

        match parse_intent(line.trim_end_matches(['\n', '\r'])) {
            StudioIntent::Noop => {}
            StudioIntent::Help => {
                writeln!(output, "Commands: {}", STUDIO_HELP_COMMANDS.join("  "))?;
                writeln!(output, "Slots accept image files (png, jpg, webp, gif, ...).")?;
            }
            StudioIntent::Select { role, path } => {
                let change = controller.select(role, &SelectedFile::from_path(&path));
                emit_slot_event(events, &controller, role, change)?;
                if change == SlotChange::Unchanged {
                    writeln!(output, "{path} is already selected for the {role} slot.")?;
                }
                write!(output, "{}", render_view(&controller.view()))?;
            }
            StudioIntent::Remove { role } => {
                let change = controller.remove(role);
                emit_slot_event(events, &controller, role, change)?;
                write!(output, "{}", render_view(&controller.view()))?;
            }
            StudioIntent::Generate => {
                let Some(job) = controller.begin_generate() else {
                    writeln!(
                        output,
                        "Generate is unavailable: add both images and wait for any running generation."
                    )?;
                    continue;
                };
                events.emit(&SessionEvent::GenerationStarted { ticket: job.ticket })?;
                worker.submit(job)?;
                write!(output, "{}", render_view(&controller.view()))?;
            }
            StudioIntent::Wait => {
                if controller.is_busy() {
                    let (ticket, outcome) = worker.wait()?;
                    if controller.complete_generate(ticket, outcome) {
                        emit_outcome_event(events, controller.display())?;
                    }
                }
                write!(output, "{}", render_view(&controller.view()))?;
            }
            StudioIntent::Status => {
                write!(output, "{}", render_view(&controller.view()))?;
            }
            StudioIntent::Download { dir } => {
                let dir = dir.map(PathBuf::from).unwrap_or_else(|| out_dir.to_path_buf());
                match controller.download(&dir) {
                    Ok(path) => {
                        events.emit(&SessionEvent::DownloadWritten { path: path.clone() })?;
                        writeln!(output, "Saved {}", path.display())?;
                    }
                    Err(err) => writeln!(output, "Download unavailable: {err}")?,
                }
            }
            StudioIntent::Quit => break,
            StudioIntent::Invalid { reason, .. } => writeln!(output, "{reason}")?,
            StudioIntent::Unknown { command, .. } => writeln!(
                output,
                "Unknown command: /{command}. Type /help for commands."
            )?,
            StudioIntent::Text(_) => {
                writeln!(output, "Commands start with '/'. Type /help for commands.")?
            }
        }
    }

    if controller.is_busy() {
        writeln!(output, "Waiting for the running generation to finish...")?;
        let (ticket, outcome) = worker
            .wait()
            .context("generation worker stopped before finishing")?;
        if controller.complete_generate(ticket, outcome) {
            emit_outcome_event(events, controller.display())?;
        }
    }
    Ok(())
}

fn drain_outcomes(
    worker: &GenerationWorker,
    controller: &mut AppController,
    events: &EventWriter,
    output: &mut impl Write,
) -> Result<()> {
    while let Some((ticket, outcome)) = worker.try_next() {
        if controller.complete_generate(ticket, outcome) {
            emit_outcome_event(events, controller.display())?;
            write!(output, "\n{}", render_view(&controller.view()))?;
        }
    }
    Ok(())
}

fn emit_slot_event(
    events: &EventWriter,
    controller: &AppController,
    role: SlotRole,
    change: SlotChange,
) -> Result<()> {
    let event = match change {
        SlotChange::Unchanged => return Ok(()),
        SlotChange::Populated => match controller.slot(role).asset() {
            Some(asset) => SessionEvent::slot_selected(role, asset),
            None => return Ok(()),
        },
        SlotChange::Cleared => SessionEvent::SlotCleared { slot: role },
    };
    events.emit(&event)?;
    Ok(())
}

fn emit_outcome_event(events: &EventWriter, display: &DisplayState) -> Result<()> {
    let event = match display {
        DisplayState::Result(result) => SessionEvent::GenerationSucceeded {
            mime_type: result.mime_type().to_string(),
        },
        DisplayState::Error(message) => SessionEvent::GenerationFailed {
            error: message.clone(),
        },
        DisplayState::Empty | DisplayState::Loading => return Ok(()),
    };
    events.emit(&event)?;
    Ok(())
}
