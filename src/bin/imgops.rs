//! CLI binary for edgequake-imgops.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! `TransformConfig` + `TransformRequest` and writes the result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_imgops::pipeline::input::is_url;
use edgequake_imgops::{
    ImgOpsError, ImagePipeline, ImageSource, PipelineProgressCallback, Presentation,
    PresentedOutput, ProgressCallback, ResampleFilter, Stage, TransformConfig, TransformRequest,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that names the current pipeline stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("imgops");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        let msg = match stage {
            Stage::Acquire => "Acquiring image…",
            Stage::Decode => "Decoding…",
            Stage::Transform => "Transforming…",
            Stage::Encode => "Encoding…",
        };
        self.bar.set_message(msg);
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<10} {}",
            green("✓"),
            stage,
            dim(&format!("{elapsed_ms}ms"))
        ));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        self.bar
            .println(format!("  {} {:<10} {}", red("✗"), stage, red(error)));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Crop a remote image to a 250x250 PNG
  imgops crop https://example.com/avatar.jpg --width 250 --height 250 --image-format png -o out.png

  # Resize a local file with bicubic resampling
  imgops resize photo.jpg --width 640 --height 480 --resample 3 -o small.jpg

  # Convert a base64 payload from stdin, answer as { "image": "<base64>" }
  cat payload.b64 | imgops convert - --base64 --image-format webp --json

RESAMPLE FILTERS:
  0 Nearest   1 Lanczos (default)   2 Bilinear   3 Bicubic   4 Box   5 Hamming

OUTPUT FORMATS:
  JPEG (default), PNG, GIF, BMP, TIFF, WEBP, ICO, TGA, PNM, QOI

ENVIRONMENT VARIABLES:
  IMGOPS_MAX_PAYLOAD_BYTES  Size ceiling for inputs (default 20971520)
  IMGOPS_FETCH_TIMEOUT      Remote fetch timeout in seconds
  IMGOPS_JPEG_QUALITY       JPEG quality 1–100 (default 75)
  RUST_LOG                  Override log filter (e.g. edgequake_imgops=debug)
"#;

/// Crop, resize and convert images from URLs, files or base64 payloads.
#[derive(Parser, Debug)]
#[command(
    name = "imgops",
    version,
    about = "Crop, resize and convert images from URLs, files or base64 payloads",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Maximum input size in bytes.
    #[arg(long, global = true, env = "IMGOPS_MAX_PAYLOAD_BYTES", default_value_t = edgequake_imgops::MAX_PAYLOAD_BYTES)]
    max_payload_bytes: u64,

    /// Remote fetch timeout in seconds (none by default).
    #[arg(long, global = true, env = "IMGOPS_FETCH_TIMEOUT")]
    fetch_timeout: Option<u64>,

    /// JPEG output quality (1–100).
    #[arg(long, global = true, env = "IMGOPS_JPEG_QUALITY", default_value_t = 75,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Disable the progress spinner.
    #[arg(long, global = true, env = "IMGOPS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "IMGOPS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "IMGOPS_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cut a rectangle out of the image. May extend past the edges.
    Crop {
        #[command(flatten)]
        io: IoArgs,
        /// Left edge of the rectangle (may be negative).
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        x: i64,
        /// Top edge of the rectangle (may be negative).
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        y: i64,
        #[arg(long, default_value_t = 250, allow_hyphen_values = true)]
        width: i64,
        #[arg(long, default_value_t = 250, allow_hyphen_values = true)]
        height: i64,
    },
    /// Resample the image to exactly WIDTH x HEIGHT.
    Resize {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long, default_value_t = 250, allow_hyphen_values = true)]
        width: i64,
        #[arg(long, default_value_t = 250, allow_hyphen_values = true)]
        height: i64,
        /// Resample filter code (0–5).
        #[arg(long, default_value_t = 1)]
        resample: i64,
    },
    /// Re-encode the image in another format.
    Convert {
        #[command(flatten)]
        io: IoArgs,
    },
}

#[derive(Args, Debug)]
struct IoArgs {
    /// HTTP/HTTPS URL or local file path; with --base64, a file of base64 text or `-` for stdin.
    input: String,

    /// Treat the input as base64 text rather than image bytes.
    #[arg(long)]
    base64: bool,

    /// Output container (JPEG, PNG, WEBP, …).
    #[arg(long, env = "IMGOPS_IMAGE_FORMAT", default_value = "JPEG")]
    image_format: String,

    /// Write the image to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print `{ "image": "<base64>" }` instead of raw bytes.
    #[arg(long)]
    json: bool,
}

impl Command {
    fn io(&self) -> &IoArgs {
        match self {
            Command::Crop { io, .. } | Command::Resize { io, .. } | Command::Convert { io } => io,
        }
    }

    fn to_request(&self) -> Result<TransformRequest, ImgOpsError> {
        let request = match *self {
            Command::Crop {
                x,
                y,
                width,
                height,
                ..
            } => TransformRequest::crop(x, y, width, height),
            Command::Resize {
                width,
                height,
                resample,
                ..
            } => TransformRequest::resize(width, height)
                .with_filter(ResampleFilter::from_code(resample)?),
            Command::Convert { .. } => TransformRequest::convert(),
        };
        Ok(request.with_format(self.io().image_format.clone()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let io_args = cli.command.io();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && io::stderr().is_terminal();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if io_args.output.is_none() && !io_args.json && io::stdout().is_terminal() {
        anyhow::bail!("Refusing to write binary image data to a terminal; use -o <FILE> or --json");
    }

    // ── Build config ─────────────────────────────────────────────────────
    let spinner = show_progress.then(CliProgressCallback::new);
    let config = build_config(&cli, spinner.clone().map(|s| s as ProgressCallback))?;
    let pipeline = ImagePipeline::new(config).context("Failed to initialise pipeline")?;

    let source = resolve_source(io_args)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let result = run(&cli, &pipeline, source).await;
    if let Some(ref s) = spinner {
        s.finish();
    }

    match result {
        Ok(()) => Ok(()),
        Err(e) if io_args.json => {
            let body = serde_json::json!({
                "status_code": e.status_code(),
                "detail": e.public_message(),
            });
            println!("{body}");
            std::process::exit(1);
        }
        Err(e) => {
            let status = e.status_code();
            Err(anyhow::Error::new(e).context(format!("Transformation failed (status {status})")))
        }
    }
}

async fn run(cli: &Cli, pipeline: &ImagePipeline, source: ImageSource) -> Result<(), ImgOpsError> {
    let io_args = cli.command.io();
    let request = cli.command.to_request()?;

    if let Some(ref path) = io_args.output {
        let stats = pipeline.run_to_file(source, &request, path).await?;
        if !cli.quiet {
            eprintln!(
                "{}  {} {}x{} → {} bytes  {}ms  →  {}",
                green("✔"),
                stats.operation,
                stats.source_width,
                stats.source_height,
                stats.output_bytes,
                stats.total_duration_ms,
                bold(&path.display().to_string()),
            );
        }
        return Ok(());
    }

    let mode = if io_args.json {
        Presentation::Base64
    } else {
        Presentation::Raw
    };

    let presented = pipeline.run_presented(source, &request, mode).await?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let written = match presented {
        PresentedOutput::Raw { bytes, .. } => handle.write_all(&bytes),
        PresentedOutput::Base64(resp) => serde_json::to_writer(&mut handle, &resp)
            .map_err(io::Error::from)
            .and_then(|_| handle.write_all(b"\n")),
    };
    written.map_err(|e| ImgOpsError::OutputWriteFailed {
        path: PathBuf::from("<stdout>"),
        source: e,
    })
}

/// Map CLI args to `TransformConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<TransformConfig> {
    let mut builder = TransformConfig::builder()
        .max_payload_bytes(cli.max_payload_bytes)
        .jpeg_quality(cli.jpeg_quality);

    if let Some(secs) = cli.fetch_timeout {
        builder = builder.fetch_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Decide which source the positional input names.
fn resolve_source(io_args: &IoArgs) -> Result<ImageSource> {
    if io_args.base64 {
        let text = if io_args.input == "-" {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read base64 payload from stdin")?;
            buf
        } else {
            std::fs::read_to_string(&io_args.input)
                .with_context(|| format!("Failed to read base64 payload from {:?}", io_args.input))?
        };
        return Ok(ImageSource::inline(text));
    }

    if is_url(&io_args.input) {
        Ok(ImageSource::remote(io_args.input.clone()))
    } else {
        Ok(ImageSource::file(&io_args.input))
    }
}
