//! Pintool CLI
//!
//! Usage:
//!   pintool -l 20 -i 'CTF{' ./crackme            # Solve, candidate on stdin
//!   pintool -l 20 -g ./crackme                   # Candidate as last argument
//!   pintool -d -l 40 ./crackme                   # Sweep lengths 1..=40
//!   pintool -l 8 -e '== -12' -r -u ./crackme     # Reverse, best-effort order
//!   pintool -l 8 --json ./crackme                # JSON report

use clap::Parser;
use colored::Colorize;
use log::{debug, trace};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use pintool::core::{build_charset, Comparator, CountingOracle, LengthDetector, PinOracle, PinSettings, SearchEngine};
use pintool::types::{
    parse_placeholder, Anchor, Architecture, ConfigError, Direction, InputMode, MatchOrder,
    OracleError, SolveError, SolverConfig,
};
use pintool::{
    DEFAULT_CHARSET, DEFAULT_CONCURRENCY, DEFAULT_EXPRESSION, DEFAULT_LENGTH, DEFAULT_PASSES,
    DEFAULT_PIN_ROOT, PIN_LOG, VERSION,
};

#[derive(Parser, Debug)]
#[command(
    name = "pintool",
    version = VERSION,
    about = "Recover a password from instruction counts measured with Pin",
    long_about = "Runs the target under Pin's inscount0 tracer once per guess.\n\n\
                  For each unknown character, one guess per charset symbol is\n\
                  raced (at most --jobs at a time). The first guess whose\n\
                  instruction count differs from the baseline as described by\n\
                  --expression is kept, and the remaining guesses are killed."
)]
struct Args {
    /// Detect the password length. For example -d -l 40, with 40 characters
    #[arg(short, long)]
    detect: bool,

    /// Length of password
    #[arg(short = 'l', long = "len", default_value_t = DEFAULT_LENGTH)]
    len: usize,

    /// Charset definition for brute force
    /// (default, default2, lower, upper, digit, hex, punct, print)
    #[arg(short, long, default_value = DEFAULT_CHARSET)]
    charset: String,

    /// Add characters for the charset. For example, -b _-
    #[arg(short = 'b', long = "chars", visible_alias = "characters", default_value = "")]
    characters: String,

    /// Program architecture (32 or 64)
    #[arg(short, long, default_value = "64")]
    arch: Architecture,

    /// Initial password characters. For example, -i CTF{
    #[arg(short = 'i', long = "init", visible_alias = "init-pass", default_value = "")]
    init_pass: String,

    /// End of the password the initial characters belong to
    #[arg(long, value_enum, default_value_t = Anchor::Prefix)]
    anchor: Anchor,

    /// Symbol used as password placeholder
    #[arg(short, long, default_value = "-")]
    symbol: String,

    /// Difference between instructions that are successful or not.
    /// For example: -e '== -12', -e '=> 900', -e '<= 17' or -e '!= 32'
    #[arg(short, long, default_value = DEFAULT_EXPRESSION, allow_hyphen_values = true)]
    expression: String,

    /// Reverse order, bruteforcing starting from the last character
    #[arg(short, long)]
    reverse: bool,

    /// Target program doesn't check chars in ascending order
    #[arg(short = 'u', long = "unordered", visible_alias = "non-ascending")]
    unordered: bool,

    /// Passes over still-unknown characters in unordered mode
    #[arg(long, default_value_t = DEFAULT_PASSES)]
    passes: usize,

    /// Pass argument via command-line arguments instead of stdin
    #[arg(short = 'g', long = "argv")]
    use_argv: bool,

    /// Maximum number of Pin processes running at once
    #[arg(short = 'j', long = "jobs", default_value_t = DEFAULT_CONCURRENCY)]
    jobs: usize,

    /// Kill a probe after this many seconds (0 = never)
    #[arg(long, default_value_t = 0)]
    timeout: u64,

    /// Pin installation directory
    #[arg(long, env = "PIN_ROOT", default_value = DEFAULT_PIN_ROOT)]
    pin_root: PathBuf,

    /// Pin driver, overrides <PIN_ROOT>/pin
    #[arg(long)]
    pin: Option<PathBuf>,

    /// Tracer module, overrides the inscount0.so under <PIN_ROOT>
    #[arg(long)]
    tool: Option<PathBuf>,

    /// Output the report as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Target program
    filename: PathBuf,

    /// Extra arguments for the target, placed before the password
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    additional_args: Vec<String>,
}

/// Why the CLI stopped early
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Solve(#[from] SolveError),

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Solve(SolveError::Interrupted { .. }) => ExitCode::from(130),
            CliError::Oracle(OracleError::Cancelled) => ExitCode::from(130),
            _ => ExitCode::FAILURE,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();
    trace!("Args: {args:#?}");

    if args.no_color {
        colored::control::set_override(false);
    }

    let shutdown = CancellationToken::new();
    let on_interrupt = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    // Oracle (and its artifact directory) is dropped inside run()
    let result = run(&args, shutdown).await;
    cleanup();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            e.exit_code()
        }
    }
}

/// Search inputs parsed from the command line
#[derive(Debug)]
struct Inputs {
    placeholder: char,
    alphabet: Vec<char>,
    comparator: Comparator,
}

/// Parse every search input up front, whichever mode runs
fn parse_inputs(args: &Args) -> Result<Inputs, ConfigError> {
    Ok(Inputs {
        placeholder: parse_placeholder(&args.symbol)?,
        alphabet: build_charset(&args.charset, &args.characters)?,
        comparator: Comparator::parse(&args.expression)?,
    })
}

async fn run(args: &Args, shutdown: CancellationToken) -> Result<(), CliError> {
    let Inputs { placeholder, alphabet, comparator } = parse_inputs(args)?;
    let target = resolve_target(&args.filename)?;
    let settings = pin_settings(args, target);

    if args.detect {
        return run_detect(args, settings, placeholder, shutdown).await;
    }

    let config = SolverConfig {
        length: args.len,
        seed: args.init_pass.clone(),
        anchor: args.anchor,
        placeholder,
        direction: if args.reverse { Direction::Reverse } else { Direction::Forward },
        order: if args.unordered { MatchOrder::BestEffort } else { MatchOrder::Strict },
        concurrency: args.jobs,
        passes: args.passes,
    };
    let engine = SearchEngine::new(config, alphabet, comparator)?.with_shutdown(shutdown);
    debug!(
        "Solving {} characters with {} symbols, accepting delta {}",
        engine.config().length,
        engine.alphabet().len(),
        comparator
    );

    let oracle = CountingOracle::new(PinOracle::new(settings)?);
    let report = engine.solve(&oracle).await?;
    debug!("{} Pin runs, {} failed", oracle.calls(), oracle.failures());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if args.no_color {
        println!("{}", report.to_parseable_string());
    } else {
        println!("{}", report.to_terminal_string());
    }
    Ok(())
}

/// Length sweep (-d)
async fn run_detect(
    args: &Args,
    settings: PinSettings,
    placeholder: char,
    shutdown: CancellationToken,
) -> Result<(), CliError> {
    if args.len == 0 {
        return Err(ConfigError::ZeroLength.into());
    }
    let oracle = PinOracle::new(settings)?;
    let detector = LengthDetector::new(placeholder).with_shutdown(shutdown);
    let json = args.json;

    let samples = detector
        .detect(&oracle, args.len, |sample| {
            if !json {
                println!("{}", sample);
            }
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&samples)?);
    }
    Ok(())
}

fn resolve_target(filename: &Path) -> Result<PathBuf, ConfigError> {
    filename
        .canonicalize()
        .map_err(|_| ConfigError::TargetNotFound(filename.to_path_buf()))
}

fn pin_settings(args: &Args, target: PathBuf) -> PinSettings {
    let mut settings = PinSettings::from_root(&args.pin_root, args.arch, target);
    if let Some(pin) = &args.pin {
        settings.pin = pin.clone();
    }
    if let Some(tool) = &args.tool {
        settings.tool = tool.clone();
    }
    settings.target_args = args.additional_args.clone();
    settings.input = if args.use_argv { InputMode::Argv } else { InputMode::Stdin };
    settings.timeout = (args.timeout > 0).then(|| Duration::from_secs(args.timeout));
    settings
}

/// Remove the log Pin drops in the working directory
fn cleanup() {
    let path = Path::new(PIN_LOG);
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            debug!("Could not remove {}: {}", PIN_LOG, e);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
