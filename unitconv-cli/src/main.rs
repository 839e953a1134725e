//! Unitconv - interactive unit converter
//!
//! Reads one query per line from stdin:
//! - `4, km` converts into every unit of the category
//! - `4, km, mile` converts into one unit and shows the formula
//! - `help` / `help <category>` lists categories and units
//!
//! Environment:
//! - `UNITCONV_DATASET`: dataset path (overridden by the first argument)
//! - `UNITCONV_LOG`: log level, default `warn`
//! - `UNITCONV_OUTPUT`: `text` or `json`

mod config;
mod render;

use std::io::{self, BufRead, Write};
use std::process;

use tracing::{debug, error, info};
use unitconv_core::{Diagnostic, QueryError, USAGE_TIP};
use unitconv_units::UnitConverter;

use config::{Config, OutputMode};
use render::{JsonRenderer, TextRenderer};

/// A line of input, classified
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Help(Option<&'a str>),
    Query(&'a str),
}

fn classify(line: &str) -> Command<'_> {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        [word] if word.eq_ignore_ascii_case("help") => Command::Help(None),
        [word, category] if word.eq_ignore_ascii_case("help") => Command::Help(Some(*category)),
        _ => Command::Query(line),
    }
}

/// Answer one input line
fn respond(converter: &UnitConverter, mode: OutputMode, line: &str) -> String {
    match (classify(line), mode) {
        (Command::Help(category), OutputMode::Text) => {
            TextRenderer::new().render_help(&converter.help(category))
        }
        (Command::Help(category), OutputMode::Json) => {
            JsonRenderer::new().render_ok(&converter.help(category))
        }
        (Command::Query(query), mode) => match converter.run(query) {
            Ok(outcome) => match mode {
                OutputMode::Text => TextRenderer::new().render_outcome(&outcome),
                OutputMode::Json => JsonRenderer::new().render_ok(&outcome),
            },
            Err(err) => {
                debug!(query, code = err.code(), "query rejected");
                render_error(mode, &err)
            }
        },
    }
}

fn render_error(mode: OutputMode, err: &QueryError) -> String {
    let diagnostic = Diagnostic::from(err);
    match mode {
        OutputMode::Text => TextRenderer::new().render_diagnostic(&diagnostic),
        OutputMode::Json => JsonRenderer::new().render_error(&diagnostic),
    }
}

fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration Error: {}", e);
            process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_writer(io::stderr)
        .init();

    let converter = match UnitConverter::load(&config.dataset) {
        Ok(converter) => converter,
        Err(e) => {
            error!(path = %config.dataset.display(), error = %e, "dataset load failed");
            let diagnostic = Diagnostic::dataset_unavailable(e.to_string());
            match config.output {
                OutputMode::Text => eprintln!("{}", diagnostic),
                OutputMode::Json => println!("{}", JsonRenderer::new().render_error(&diagnostic)),
            }
            process::exit(1);
        }
    };

    info!(
        path = %config.dataset.display(),
        categories = converter.catalog().categories().len(),
        "dataset loaded"
    );

    if config.output == OutputMode::Text {
        println!("{}\n", USAGE_TIP);
    }

    let stdin = io::stdin();
    let mut reader = io::BufReader::new(stdin.lock());

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let response = respond(&converter, config.output, line.trim());
                let mut stdout = io::stdout().lock();
                let _ = writeln!(stdout, "{}", response);
                let _ = stdout.flush();
            }
            Err(e) => {
                error!(error = %e, "failed to read stdin");
                break;
            }
        }
    }
}
