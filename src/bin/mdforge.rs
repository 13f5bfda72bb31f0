//! CLI binary for markdown-forge.
//!
//! A thin shim over the library crate: loads `.env` and the environment into
//! a `ForgeConfig`, maps flags to a `ConversionRequest`, and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use markdown_forge::pipeline::input::has_pdf_extension;
use markdown_forge::{ConversionRequest, ConversionTask, Dispatcher, ForgeConfig, ProviderKind};
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
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

const AFTER_HELP: &str = r#"EXAMPLES:
  # Restructure and polish a text file (stdout)
  mdforge convert notes.txt

  # Keep the wording, add structure only, with Gemini
  mdforge convert --provider gemini --task structure notes.txt -o notes.md

  # Convert the text layer of a PDF
  mdforge convert report.pdf -o report.md

  # Read from stdin
  pbpaste | mdforge convert - --provider openai

  # Which providers are configured?
  mdforge providers

ENVIRONMENT VARIABLES:
  ANTHROPIC_API_KEY      Claude credential
  OPENAI_API_KEY         OpenAI credential
  GEMINI_API_KEY         Gemini credential
  CLAUDE_MODEL           Default: claude-3-sonnet-20240229
  OPENAI_MODEL           Default: gpt-4
  GEMINI_MODEL           Default: gemini-pro
  MAX_TOKENS             Output-token budget per call (default 4000)
  REQUEST_TIMEOUT        Provider timeout in seconds (default 120)
  PDF_MAX_PAGES          Pages read from a PDF (default 500)
  PDF_PASSWORD           Password for encrypted PDFs
  PDFIUM_LIB_PATH        Path to libpdfium (default: system library)
  MAX_TEXT_LENGTH        Max characters of plain text (default 100000)
  MAX_FILE_SIZE_MB       Max PDF size (default 50)

  A `.env` file in the working directory is loaded first.
"#;

/// Convert text and PDF files to Markdown with Claude, OpenAI or Gemini.
#[derive(Parser, Debug)]
#[command(
    name = "mdforge",
    version,
    about = "Convert text and PDF files to Markdown with Claude, OpenAI or Gemini",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MDFORGE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "MDFORGE_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a text or PDF file to Markdown.
    Convert(ConvertArgs),
    /// Show which providers are configured and with which model.
    Providers {
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug)]
struct ConvertArgs {
    /// Input file, or `-` for stdin.
    input: String,

    /// Provider to use.
    #[arg(
        short,
        long,
        env = "MDFORGE_PROVIDER",
        value_enum,
        ignore_case = true,
        default_value = "claude"
    )]
    provider: ProviderArg,

    /// What to do with the text.
    #[arg(short, long, env = "MDFORGE_TASK", value_enum, default_value = "improve")]
    task: TaskArg,

    /// Treat the input as a PDF regardless of its extension.
    #[arg(long)]
    pdf: bool,

    /// Write Markdown to this file instead of stdout.
    #[arg(short, long, env = "MDFORGE_OUTPUT")]
    output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ProviderArg {
    /// Anthropic Claude.
    #[value(alias = "anthropic")]
    Claude,
    /// OpenAI chat completions.
    #[value(name = "openai")]
    OpenAi,
    /// Google Gemini.
    #[value(alias = "google")]
    Gemini,
}

impl From<ProviderArg> for ProviderKind {
    fn from(v: ProviderArg) -> Self {
        match v {
            ProviderArg::Claude => ProviderKind::Claude,
            ProviderArg::OpenAi => ProviderKind::OpenAi,
            ProviderArg::Gemini => ProviderKind::Gemini,
        }
    }
}

#[derive(ValueEnum, Clone, Debug)]
enum TaskArg {
    /// Improve clarity, grammar and structure.
    Improve,
    /// Add structure, keep the original wording.
    Structure,
}

impl From<TaskArg> for ConversionTask {
    fn from(v: TaskArg) -> Self {
        match v {
            TaskArg::Improve => ConversionTask::ImproveStructure,
            TaskArg::Structure => ConversionTask::PreserveStructureOnly,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Configuration ────────────────────────────────────────────────────
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e).context("Failed to read .env");
        }
    }
    let config = ForgeConfig::from_env().context("Failed to load configuration")?;
    let dispatcher = Dispatcher::from_config(&config).context("Failed to initialise providers")?;

    match cli.command {
        Command::Providers { json } => print_providers(&dispatcher, json),
        Command::Convert(args) => run_convert(&dispatcher, &config, args, cli.quiet).await,
    }
}

fn print_providers(dispatcher: &Dispatcher, json: bool) -> Result<()> {
    let statuses = dispatcher.provider_statuses();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&statuses).context("Failed to serialise status")?
        );
        return Ok(());
    }
    for status in statuses {
        let mark = if status.available {
            green("✓")
        } else {
            red("✗")
        };
        let state = if status.available {
            "configured".to_string()
        } else {
            dim(&format!("set {}", status.provider.credential_env()))
        };
        println!(
            "{mark} {:<8} {:<28} {state}",
            bold(status.provider.name()),
            status.model
        );
    }
    Ok(())
}

async fn run_convert(
    dispatcher: &Dispatcher,
    config: &ForgeConfig,
    args: ConvertArgs,
    quiet: bool,
) -> Result<()> {
    let kind = ProviderKind::from(args.provider);

    let bytes = read_input(&args.input)?;
    let is_pdf = args.pdf || has_pdf_extension(Path::new(&args.input));
    let task = ConversionTask::from(args.task);
    let request = if is_pdf {
        ConversionRequest::from_pdf(bytes, task, kind.name())
    } else {
        let text = String::from_utf8(bytes).context("Input is not valid UTF-8 text")?;
        ConversionRequest::from_text(text, task, kind.name())
    };
    request.check_limits(&config.limits)?;

    let spinner = (!quiet && io::stderr().is_terminal()).then(|| waiting_spinner(kind, dispatcher));
    let start = Instant::now();
    let result = dispatcher.dispatch(request).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let markdown = result.context("Conversion failed")?;

    match &args.output {
        Some(path) => {
            write_atomic(path, &markdown)?;
            if !quiet {
                eprintln!(
                    "{}  {} chars  {}ms  →  {}",
                    green("✔"),
                    markdown.len(),
                    start.elapsed().as_millis(),
                    bold(&path.display().to_string()),
                );
            }
        }
        None => write_markdown(&mut io::stdout().lock(), &markdown)?,
    }
    Ok(())
}

fn waiting_spinner(kind: ProviderKind, dispatcher: &Dispatcher) -> ProgressBar {
    let model = dispatcher
        .adapter(kind)
        .map(|a| a.model().to_string())
        .unwrap_or_default();
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix("Converting");
    bar.set_message(format!("{kind} ({model})"));
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn read_input(input: &str) -> Result<Vec<u8>> {
    if input == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read(input).with_context(|| format!("Failed to read '{input}'"))
}

/// Write `markdown` to `out`, ending with exactly one trailing newline.
fn write_markdown<W: Write>(out: &mut W, markdown: &str) -> Result<()> {
    out.write_all(markdown.as_bytes())
        .context("Failed to write to stdout")?;
    if !markdown.ends_with('\n') {
        out.write_all(b"\n").context("Failed to write to stdout")?;
    }
    out.flush().context("Failed to write to stdout")?;
    Ok(())
}

/// Write to a sibling temp file, then rename over the target.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create '{}'", parent.display()))?;
    }
    let tmp_path = path.with_extension("md.tmp");
    std::fs::write(&tmp_path, contents)
        .with_context(|| format!("Failed to write '{}'", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to write output file '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_of(argv: &[&str]) -> ProviderKind {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Command::Convert(args) => ProviderKind::from(args.provider),
            other => panic!("expected convert, got {other:?}"),
        }
    }

    #[test]
    fn provider_flag_accepts_aliases_and_any_case() {
        assert_eq!(provider_of(&["mdforge", "convert", "a.txt", "-p", "anthropic"]), ProviderKind::Claude);
        assert_eq!(provider_of(&["mdforge", "convert", "a.txt", "-p", "Claude"]), ProviderKind::Claude);
        assert_eq!(provider_of(&["mdforge", "convert", "a.txt", "-p", "OPENAI"]), ProviderKind::OpenAi);
        assert_eq!(provider_of(&["mdforge", "convert", "a.txt", "-p", "google"]), ProviderKind::Gemini);
    }

    /// Accepts a fixed number of bytes, then fails every write.
    struct ShortWriter {
        room: usize,
        written: Vec<u8>,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.room == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
            }
            let n = buf.len().min(self.room);
            self.room -= n;
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn markdown_gets_one_trailing_newline() {
        let mut out = Vec::new();
        write_markdown(&mut out, "# Title").unwrap();
        assert_eq!(out, b"# Title\n");

        let mut out = Vec::new();
        write_markdown(&mut out, "# Title\n").unwrap();
        assert_eq!(out, b"# Title\n");
    }

    #[test]
    fn failed_trailing_newline_is_an_error() {
        let mut out = ShortWriter {
            room: "# Title".len(),
            written: Vec::new(),
        };
        let err = write_markdown(&mut out, "# Title").unwrap_err();
        assert!(err.to_string().contains("stdout"));
        assert_eq!(out.written, b"# Title");
    }

    #[test]
    fn provider_flag_rejects_unknown_names() {
        assert!(Cli::try_parse_from(["mdforge", "convert", "a.txt", "-p", "mistral"]).is_err());
    }

    #[test]
    fn cli_hands_canonical_names_to_the_core() {
        for arg in ["anthropic", "OpenAI", "Google"] {
            let kind = provider_of(&["mdforge", "convert", "a.txt", "--provider", arg]);
            assert_eq!(kind.name().parse::<ProviderKind>().unwrap(), kind);
        }
    }
}
