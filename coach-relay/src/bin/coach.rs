//! Coach CLI - ask the coding coach about a saved problem page
//!
//! Usage:
//!   coach <PAGE> <MODE> <TEXT> [--url <url>] [--relay <url>] [--history <file>] [--verbose]
//!
//! Example:
//!   coach two-sum.html approach "Sort, then walk two pointers inward"
//!   coach two-sum.html code @solution.py
//!   coach two-sum.html code -          (use the code found in the page's editor)
//!   coach two-sum.html chat "Any edge cases I am missing?"

use anyhow::{Context, Result};
use coach::complexity::ComplexityEstimate;
use coach::controller::{Controller, Mode, NoticeLevel, Panel, RelayClient, SubmitOutcome};
use coach::conversation::{ConversationEntry, JsonFileStore, Sender};
use coach::editor::{CodeDetector, NO_CODE_DETECTED};
use coach::page::SelectorConfig;
use coach::{PageScraper, PageSnapshot, RelayConfig};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

const DEFAULT_RELAY_URL: &str = "http://localhost:3000";
const DEFAULT_HISTORY_FILE: &str = ".coach-history.json";

fn print_usage() {
    eprintln!(
        r#"
{} - Interview coaching for a saved problem page

{}
    coach <PAGE> <MODE> <TEXT> [OPTIONS]

{}
    <PAGE>     Saved HTML of the problem page
    <MODE>     approach | code | chat
    <TEXT>     Your input; @FILE reads it from a file, - uses the code found in the page

{}
    --url <URL>           Page URL used to key the conversation (default: file:// path)
    -r, --relay <URL>     Relay server URL (default: http://localhost:3000)
    --history <FILE>      Conversation history file (default: .coach-history.json)
    -c, --config <FILE>   Relay config whose [selectors] override the scraper defaults
    --clear               Drop the stored conversation before submitting
    -v, --verbose         Show diagnostic logs
    -h, --help            Print this help message

{}
    coach two-sum.html approach "Sort, then walk two pointers inward"
    coach two-sum.html code @solution.py
    coach two-sum.html chat "Any edge cases I am missing?" --relay http://10.0.0.2:3000
"#,
        "Coach CLI".bold(),
        "USAGE:".bold(),
        "ARGS:".bold(),
        "OPTIONS:".bold(),
        "EXAMPLES:".bold(),
    );
}

struct CliArgs {
    page: PathBuf,
    mode: Mode,
    text: String,
    url: Option<String>,
    relay_url: String,
    history: PathBuf,
    config: Option<PathBuf>,
    clear: bool,
    verbose: bool,
}

fn parse_args() -> Result<CliArgs> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 4 || args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        std::process::exit(if args.iter().any(|a| a == "--help" || a == "-h") {
            0
        } else {
            1
        });
    }

    let page = PathBuf::from(&args[1]);
    let mode = args[2].parse::<Mode>().map_err(anyhow::Error::msg)?;
    let text = args[3].clone();

    let mut url = None;
    let mut relay_url = DEFAULT_RELAY_URL.to_string();
    let mut history = PathBuf::from(DEFAULT_HISTORY_FILE);
    let mut config = None;
    let mut clear = false;
    let mut verbose = false;

    let mut i = 4;
    while i < args.len() {
        match args[i].as_str() {
            "--url" => {
                i += 1;
                if i < args.len() {
                    url = Some(args[i].clone());
                }
            }
            "--relay" | "-r" => {
                i += 1;
                if i < args.len() {
                    relay_url = args[i].clone();
                }
            }
            "--history" => {
                i += 1;
                if i < args.len() {
                    history = PathBuf::from(&args[i]);
                }
            }
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    config = Some(PathBuf::from(&args[i]));
                }
            }
            "--clear" => clear = true,
            "--verbose" | "-v" => verbose = true,
            _ => {}
        }
        i += 1;
    }

    Ok(CliArgs {
        page,
        mode,
        text,
        url,
        relay_url,
        history,
        config,
        clear,
        verbose,
    })
}

/// Renders the panel as colored terminal output
struct TerminalPanel;

impl Panel for TerminalPanel {
    fn set_mode(&mut self, mode: Mode) {
        eprintln!("{} {}", "Mode:".dimmed(), mode.as_str().bold());
    }

    fn set_busy(&mut self, busy: bool) {
        if busy {
            eprint!("{}", "Thinking...".dimmed());
        } else {
            eprintln!();
        }
        let _ = std::io::stderr().flush();
    }

    fn show_notice(&mut self, level: NoticeLevel, text: &str) {
        match level {
            NoticeLevel::Info => eprintln!("{} {}", "Info:".blue(), text),
            NoticeLevel::Warning => eprintln!("{} {}", "Warning:".yellow(), text),
            NoticeLevel::Error => eprintln!("{} {}", "Error:".red().bold(), text),
        }
    }

    fn append_entry(&mut self, entry: &ConversationEntry) {
        let stamp = entry.timestamp.format("%H:%M");
        match entry.sender {
            Sender::User => {
                eprintln!("{} {}", format!("[{stamp}] You").cyan().bold(), entry.message);
            }
            Sender::Assistant => {
                eprintln!("{}", format!("[{stamp}] Coach").green().bold());
                println!("{}", entry.message);
            }
        }
    }

    fn show_complexity(&mut self, complexity: &ComplexityEstimate) {
        eprintln!(
            "{}",
            "════════════════════════════════════════════════════════════════".green()
        );
        eprintln!(
            "{} {}    {} {}",
            "Time:".dimmed(),
            complexity.time.bold(),
            "Space:".dimmed(),
            complexity.space.bold()
        );
        eprintln!(
            "{}",
            "════════════════════════════════════════════════════════════════".green()
        );
    }

    fn reset(&mut self) {
        eprintln!("{}", "Conversation cleared".dimmed());
    }
}

fn read_input(args: &CliArgs, snapshot: &PageSnapshot) -> Result<String> {
    if args.text == "-" {
        let code = CodeDetector::new().detect(snapshot);
        if code == NO_CODE_DETECTED {
            eprintln!("{} No code found in the page", "Warning:".yellow());
        }
        return Ok(code);
    }
    match args.text.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path)),
        None => Ok(args.text.clone()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;

    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let html = std::fs::read_to_string(&args.page)
        .with_context(|| format!("Failed to read page: {}", args.page.display()))?;
    let url = args
        .url
        .clone()
        .unwrap_or_else(|| format!("file://{}", args.page.display()));
    let snapshot = PageSnapshot::new(url, html);

    let selectors = match &args.config {
        Some(path) => RelayConfig::load(path)?.selectors,
        None => SelectorConfig::default(),
    };
    let context = PageScraper::new(selectors).extract(&snapshot);
    eprintln!();
    eprintln!("{} {}", "Problem:".dimmed(), context.title.bold());
    eprintln!(
        "{} {} examples, {} constraints",
        "Parsed:".dimmed(),
        context.examples.len(),
        context.constraints.len()
    );

    let input = read_input(&args, &snapshot)?;

    let client = RelayClient::new(&args.relay_url);
    if !client.probe().await {
        eprintln!(
            "{} Relay at {} is not responding; answers will be offline hints",
            "Warning:".yellow(),
            client.base_url()
        );
    }

    let store = JsonFileStore::new(args.history.clone());
    let mut controller = Controller::new(client, TerminalPanel, store, context);
    if args.clear {
        controller.clear();
    }
    controller.set_mode(args.mode);

    let outcome = controller.submit(&input).await;
    controller.destroy();

    match outcome {
        SubmitOutcome::Rejected | SubmitOutcome::Failed => std::process::exit(1),
        SubmitOutcome::Live | SubmitOutcome::Fallback => Ok(()),
    }
}
