//=====================================================
// File: main.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: PlainTalk CLI entry point
// Objective: Command-line host that runs PlainTalk files and bundled samples
//            against a console output/input implementation
//=====================================================

use std::cell::Cell;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tokio::task::LocalSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use plaintalk::samples::{self, SAMPLES};
use plaintalk::{CliConfig, Engine, HostIo, LocalBoxFuture, NO_NEWLINE_MARKER, Severity};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "PLAINTALK_LOG";
/// How often the host checks whether timers are still keeping the engine alive.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(name = "plaintalk", about = "PlainTalk natural-language interpreter")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a PlainTalk source file.
    Run(RunArgs),
    /// List the bundled sample programs.
    Samples,
    /// Run one bundled sample by name.
    Sample(SampleArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Path to the script to execute.
    pub file: PathBuf,

    #[command(flatten)]
    pub exec: ExecArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SampleArgs {
    /// Sample name, e.g. "hello-world".
    pub name: String,

    #[command(flatten)]
    pub exec: ExecArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ExecArgs {
    /// Log interpreter activity at debug level.
    #[arg(long)]
    pub trace: bool,

    /// Configuration file (defaults to <config dir>/plaintalk/config.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Trigger these events after the program body ran, in order.
    #[arg(long = "event", value_name = "NAME")]
    pub events: Vec<String>,

    /// Stop timers after this many seconds.
    #[arg(long = "max-duration", value_name = "SECS")]
    pub max_duration: Option<f64>,

    /// Print the final variables as JSON.
    #[arg(long = "dump-vars")]
    pub dump_vars: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Samples => {
            for sample in SAMPLES {
                println!("{:<22} {}", sample.slug(), sample.name);
            }
            Ok(())
        }
        Command::Run(cmd) => {
            let source = fs::read_to_string(&cmd.file)
                .with_context(|| format!("reading script {}", cmd.file.display()))?;
            run_source(&source, &cmd.exec)
        }
        Command::Sample(cmd) => {
            let sample = samples::find(&cmd.name).ok_or_else(|| {
                anyhow!("unknown sample '{}'; run `plaintalk samples` to list them", cmd.name)
            })?;
            run_source(sample.source, &cmd.exec)
        }
    }
}

fn install_tracing(trace: bool) {
    let filter = if trace {
        EnvFilter::new("plaintalk=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

//Function: run_source
//Purpose: Build the console host, run the program on a local task set and
//         keep the runtime alive while timers are pending
//Inputs: source text, execution flags
//Returns: Result<()> (exits with status 1 when the program reported errors)
fn run_source(source: &str, exec: &ExecArgs) -> Result<()> {
    install_tracing(exec.trace);
    let config = CliConfig::load(exec.config.as_deref())?;
    let max_duration = exec
        .max_duration
        .map(Duration::try_from_secs_f64)
        .transpose()
        .context("--max-duration must be a non-negative number of seconds")?;

    let host = Rc::new(ConsoleHost::new(&config));
    let engine = Engine::with_config(host.clone(), config.engine.clone());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("tokio runtime init failed")?;
    let local = LocalSet::new();
    local.block_on(&runtime, drive(&engine, source, exec, max_duration));
    host.finish_line();
    // A prompt may still be parked on stdin; do not wait for it
    drop(local);
    runtime.shutdown_background();

    if exec.dump_vars {
        let variables = serde_json::to_string_pretty(&engine.variables())?;
        println!("{variables}");
    }

    if host.error_count() > 0 {
        io::stdout().flush().ok();
        std::process::exit(1);
    }
    Ok(())
}

async fn drive(engine: &Engine, source: &str, exec: &ExecArgs, max_duration: Option<Duration>) {
    engine.execute(source).await;

    for name in &exec.events {
        engine.trigger_event(name).await;
    }

    let deadline = max_duration.map(|limit| Instant::now() + limit);
    while engine.is_running() {
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            info!("maximum duration reached, stopping timers");
            engine.stop();
            break;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    debug!(timers = engine.active_timers(), "engine idle");
}

//=============================================
//            Console host
//=============================================

struct ConsoleHost {
    color: bool,
    show_system: bool,
    prompt_suffix: String,
    errors: Cell<usize>,
    // A `display` left the cursor mid-line
    open_line: Cell<bool>,
}

impl ConsoleHost {
    fn new(config: &CliConfig) -> Self {
        Self {
            color: config.color,
            show_system: config.show_system,
            prompt_suffix: config.prompt_suffix.clone(),
            errors: Cell::new(0),
            open_line: Cell::new(false),
        }
    }

    fn error_count(&self) -> usize {
        self.errors.get()
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if self.color {
            format!("\u{001b}[{code}m{text}\u{001b}[0m")
        } else {
            text.to_string()
        }
    }

    fn finish_line(&self) {
        if self.open_line.replace(false) {
            println!();
        }
    }
}

impl HostIo for ConsoleHost {
    fn output(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info | Severity::Success => match message.strip_suffix(NO_NEWLINE_MARKER) {
                Some(text) => {
                    print!("{text}");
                    io::stdout().flush().ok();
                    self.open_line.set(true);
                }
                None => {
                    self.open_line.set(false);
                    println!("{message}");
                }
            },
            Severity::System => {
                if self.show_system {
                    self.finish_line();
                    println!("{}", self.paint(message, "2"));
                }
            }
            Severity::Warning => {
                self.finish_line();
                eprintln!("{}", self.paint(message, "33"));
            }
            Severity::Error => {
                self.errors.set(self.errors.get() + 1);
                self.finish_line();
                eprintln!("{}", self.paint(message, "31"));
            }
        }
    }

    fn input(&self, prompt: &str) -> LocalBoxFuture<'static, String> {
        print!("{prompt}{}", self.prompt_suffix);
        io::stdout().flush().ok();
        self.open_line.set(false);

        Box::pin(async move {
            let read = tokio::task::spawn_blocking(|| {
                let mut line = String::new();
                io::stdin().lock().read_line(&mut line).map(|_| line)
            })
            .await;
            match read {
                Ok(Ok(line)) => line.trim_end_matches(['\r', '\n']).to_string(),
                Ok(Err(err)) => {
                    warn!(error = %err, "reading stdin failed");
                    String::new()
                }
                Err(err) => {
                    warn!(error = %err, "stdin reader task failed");
                    String::new()
                }
            }
        })
    }
}
