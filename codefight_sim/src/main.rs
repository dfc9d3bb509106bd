//! CodeFight command shell
//!
//! Reads commands line by line from stdin, or from a file with `--commands`.

use clap::Parser;
use codefight_sim::{Shell, StartupConfig, ERROR_PREFIX, WELCOME_MESSAGE};
use std::io::BufRead;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// CodeFight: programs battling in a shared circular memory arena
#[derive(Parser, Debug)]
#[command(name = "codefight")]
#[command(about = "Run CodeFight matches from an interactive shell", long_about = None)]
struct Args {
    /// Arena size, four display symbols, then a symbol and bomb symbol per program
    #[arg(required = true, allow_hyphen_values = true)]
    tokens: Vec<String>,

    /// Read commands from this file instead of stdin
    #[arg(short, long)]
    commands: Option<String>,

    /// Upper bound on turns for `next` with a negative count
    #[arg(short, long)]
    max_turns: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Print the final session state as JSON on exit
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    // Logs go to stderr so stdout carries only shell output
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let startup = match StartupConfig::from_tokens(&args.tokens) {
        Ok(startup) => startup,
        Err(e) => {
            println!("{}{}", ERROR_PREFIX, e);
            std::process::exit(1);
        }
    };

    let mut shell = match Shell::new(&startup) {
        Ok(shell) => shell.with_turn_cap(args.max_turns),
        Err(e) => {
            println!("{}{}", ERROR_PREFIX, e);
            std::process::exit(1);
        }
    };

    info!(
        "Arena of {} cells, {} program slots",
        startup.arena_size,
        startup.program_symbols.len()
    );
    println!("{}", WELCOME_MESSAGE);

    let lines: Box<dyn Iterator<Item = std::io::Result<String>>> = match &args.commands {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => {
                debug!("Reading commands from {}", path);
                Box::new(text.lines().map(|l| Ok::<_, std::io::Error>(l.to_string())).collect::<Vec<_>>().into_iter())
            }
            Err(e) => {
                error!("Failed to read {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Box::new(std::io::stdin().lock().lines()),
    };

    for line in lines {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read input: {}", e);
                break;
            }
        };

        match shell.execute(&line) {
            Ok(Some(output)) => println!("{}", output),
            Ok(None) => {}
            Err(e) => eprintln!("{}{}", ERROR_PREFIX, e),
        }

        if !shell.is_running() {
            break;
        }
    }

    if args.json {
        match serde_json::to_string_pretty(&shell.summary()) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to serialize session: {}", e),
        }
    }
}
