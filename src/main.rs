use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use nu_ansi_term::{Color, Style as AnsiStyle};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use rewind::{render_cards, CardVariant, RenderOptions, SelectedFile, Stage, UploadPayload, Uploader};

const ACCENT_COLOR: Color = Color::Rgb(244, 170, 214);
const EDGE_COLOR: Color = Color::Rgb(251, 176, 120);
const DIM_COLOR: Color = Color::Rgb(150, 138, 160);
const ERROR_COLOR: Color = Color::Rgb(248, 113, 113);

/// Validate chat export files and show their rewind cards.
#[derive(Debug, Parser)]
#[command(name = "rewind", version)]
struct Cli {
    /// Raw conversation exports or a single processed stats file.
    files: Vec<PathBuf>,

    /// Card layout.
    #[arg(long, value_enum, env = "REWIND_VARIANT", default_value_t = CardVariant::Compact)]
    variant: CardVariant,

    /// Disable colours.
    #[arg(long, env = "REWIND_NO_COLOR")]
    no_color: bool,

    /// Print the accepted stats as JSON instead of cards.
    #[arg(long)]
    json: bool,

    /// Hide progress stages.
    #[arg(short, long)]
    quiet: bool,

    /// Keep prompting for new files after each batch.
    #[arg(short, long)]
    interactive: bool,
}

#[derive(Debug, Clone, Copy)]
struct Term {
    color: bool,
}

impl Term {
    fn paint(&self, style: AnsiStyle, text: &str) -> String {
        if self.color {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn accent(&self, text: &str) -> String {
        self.paint(AnsiStyle::new().fg(ACCENT_COLOR), text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(AnsiStyle::new().fg(DIM_COLOR), text)
    }

    fn edge(&self, text: &str) -> String {
        self.paint(AnsiStyle::new().fg(EDGE_COLOR), text)
    }

    fn error(&self, text: &str) -> String {
        self.paint(AnsiStyle::new().fg(ERROR_COLOR).bold(), text)
    }

    fn prompt(&self, label: &str) -> String {
        self.paint(AnsiStyle::new().fg(ACCENT_COLOR).bold(), label)
    }

    fn bullet(&self) -> String {
        self.edge("⋆")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
        )
        .with_writer(io::stderr)
        .init();

    let term = Term {
        color: !cli.no_color,
    };

    if !cli.json {
        print_banner(&term);
    }

    if cli.interactive {
        if !cli.files.is_empty() {
            run_batch(&cli, &term, &cli.files).await?;
        }
        upload_loop(&cli, &term).await?;
        return Ok(());
    }

    if !run_batch(&cli, &term, &cli.files).await? {
        std::process::exit(1);
    }
    Ok(())
}

fn print_banner(term: &Term) {
    println!("{}", term.edge("~ ~ ~ ~ ~ ~ ~ ~ ~ ~ ~ ~ ~ ~ ~"));
    println!("{} {}", term.bullet(), term.accent("rewind"));
    println!(
        "{} {}",
        term.bullet(),
        term.dim("shareable cards for your group chat")
    );
    println!("{}", term.edge("~ ~ ~ ~ ~ ~ ~ ~ ~ ~ ~ ~ ~ ~ ~"));
}

/// Validate and present one batch. Returns whether the batch was accepted.
async fn run_batch(cli: &Cli, term: &Term, paths: &[PathBuf]) -> Result<bool> {
    let files: Vec<SelectedFile> = paths
        .iter()
        .map(|path| SelectedFile::from_path(path.clone()))
        .collect();

    let (tx, mut rx) = mpsc::unbounded_channel::<Stage>();
    let quiet = cli.quiet;
    let progress_term = *term;
    let printer = tokio::spawn(async move {
        while let Some(stage) = rx.recv().await {
            if !quiet {
                eprintln!(
                    "{} {}",
                    progress_term.bullet(),
                    progress_term.dim(&stage.to_string())
                );
            }
        }
    });

    let outcome = Uploader::with_progress(tx).process_files(&files).await;
    printer.await.context("progress display stopped unexpectedly")?;

    let payload = match outcome {
        Ok(payload) => payload,
        Err(err) => {
            report_error(term, &err);
            return Ok(false);
        }
    };

    present(cli, term, payload)
}

fn present(cli: &Cli, term: &Term, payload: UploadPayload) -> Result<bool> {
    let stats = match payload.into_stats() {
        Ok(stats) => stats,
        Err(err) => {
            report_error(term, &err);
            return Ok(false);
        }
    };

    if cli.json {
        let rendered =
            serde_json::to_string_pretty(&stats).context("serialising accepted stats")?;
        println!("{rendered}");
        return Ok(true);
    }

    let options = RenderOptions {
        variant: cli.variant,
        color: term.color,
        ..RenderOptions::default()
    };
    println!("\n{}", render_cards(&stats, &options));
    Ok(true)
}

fn report_error(term: &Term, err: &dyn std::fmt::Display) {
    eprintln!("{} {}", term.error("error:"), err);
}

async fn upload_loop(cli: &Cli, term: &Term) -> Result<()> {
    loop {
        println!(
            "{}",
            term.dim("enter JSON file paths separated by spaces (quote paths with spaces), q to exit.")
        );
        print!("\n{} ", term.prompt("files>"));
        io::stdout().flush()?;
        let input = match read_line() {
            Ok(input) => input,
            Err(_) => return Ok(()),
        };
        let trimmed = input.trim();

        if trimmed.eq_ignore_ascii_case("q") {
            return Ok(());
        }
        if trimmed.is_empty() {
            continue;
        }

        let paths: Vec<PathBuf> = split_paths(trimmed).into_iter().map(PathBuf::from).collect();
        run_batch(cli, term, &paths).await?;
    }
}

fn read_line() -> Result<String> {
    let mut buf = String::new();
    let bytes = io::stdin().read_line(&mut buf)?;
    if bytes == 0 {
        Err(anyhow!("input closed"))
    } else {
        Ok(buf)
    }
}

/// Split a prompt line into paths on whitespace. Single or double quotes keep
/// spaces inside a path; an unclosed quote runs to the end of the line.
fn split_paths(input: &str) -> Vec<String> {
    let mut paths = Vec::new();
    let mut current = String::new();
    let mut in_path = false;
    let mut quote: Option<char> = None;

    for ch in input.chars() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_path = true;
            }
            None if ch.is_whitespace() => {
                if in_path {
                    paths.push(std::mem::take(&mut current));
                    in_path = false;
                }
            }
            None => {
                current.push(ch);
                in_path = true;
            }
        }
    }
    if in_path {
        paths.push(current);
    }
    paths
}
