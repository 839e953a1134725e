//! Text and JSON renderers for query results

use serde::Serialize;
use serde_json::json;
use unitconv_core::{format_plain, Diagnostic};
use unitconv_units::{CategoryHelp, Notice, QueryOutcome};

const WIDTH: usize = 40;
const VALUE_WIDTH: usize = 18;
const TRIANGLE: char = '\u{25B6}';
const CIRCLE: char = '\u{25CF}';

fn rule() -> String {
    "-".repeat(WIDTH)
}

/// `"degree celsius"` -> `"Degree Celsius"`
pub fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// `"length"` -> `"Length"`
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn header(title: &str) -> String {
    format!("{:^width$}\n{}\n", title, rule(), width = WIDTH)
}

fn value_line(value: &str, unit: &str) -> String {
    format!("{:>width$}: {}\n", value, title_case(unit), width = VALUE_WIDTH)
}

/// Human-readable output
#[derive(Debug, Default, Clone, Copy)]
pub struct TextRenderer;

impl TextRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render_outcome(&self, outcome: &QueryOutcome) -> String {
        let mut output = String::new();

        // Abbreviation expansions are implicit; only corrections are announced
        let corrections: Vec<&Notice> = outcome
            .notices
            .iter()
            .filter(|notice| matches!(notice, Notice::Corrected { .. }))
            .collect();
        for notice in &corrections {
            output.push_str(&format!("{}\n", notice));
        }
        if !corrections.is_empty() {
            output.push('\n');
        }

        let value = format_plain(outcome.value);
        output.push_str(&header(&capitalize(&outcome.source.category)));
        output.push_str(&value_line(&value, &outcome.source.name));
        output.push_str(&rule());
        output.push('\n');

        if !outcome.targeted {
            output.push('\n');
            for result in &outcome.results {
                output.push_str(&value_line(&result.formatted_value, &result.target_unit));
            }
            output.push_str(&rule());
            output.push('\n');
            return output;
        }

        for result in &outcome.results {
            output.push_str(&value_line(&result.formatted_value, &result.target_unit));
            if let Some(formula) = &result.formula {
                output.push_str(&rule());
                output.push('\n');
                output.push_str(&header("Formula"));
                output.push_str(&format!("{}\nWhere n = {}\n", formula, value));
            }
        }
        output.push_str(&rule());
        output.push('\n');
        output
    }

    pub fn render_help(&self, help: &CategoryHelp) -> String {
        let mut output = String::new();

        match help {
            CategoryHelp::Categories { categories } => {
                output.push_str(&header("Available Categories"));
                output.push('\n');
                for category in categories {
                    output.push_str(&format!("{} {}\n", TRIANGLE, capitalize(category)));
                }
                output.push_str("\nEnter 'help <category>' to see units inside a category.\n");
            }
            CategoryHelp::Units { category, units } => {
                self.render_units(&mut output, category, units);
            }
            CategoryHelp::DidYouMean { suggested, units } => {
                output.push_str(&format!("Did you mean '{}'?\n\n", suggested));
                self.render_units(&mut output, suggested, units);
            }
            CategoryHelp::Suggestions { query, candidates } => {
                if candidates.is_empty() {
                    output.push_str(&format!("No category resembles '{}'.\n", query));
                } else {
                    output.push_str(&format!("Suggestions for '{}': {}\n", query, candidates.join(", ")));
                }
            }
        }

        output
    }

    fn render_units(&self, output: &mut String, category: &str, units: &[String]) {
        output.push_str(&header("Units"));
        output.push('\n');
        output.push_str(&format!("{} {}\n", TRIANGLE, capitalize(category)));
        for unit in units {
            output.push_str(&format!("\t\t{} {}\n", CIRCLE, title_case(unit)));
        }
    }

    pub fn render_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        format!("{}\n", diagnostic)
    }
}

/// One JSON object per line
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer;

impl JsonRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render_ok<T: Serialize>(&self, value: &T) -> String {
        json!({ "ok": value }).to_string()
    }

    pub fn render_error(&self, diagnostic: &Diagnostic) -> String {
        json!({ "error": diagnostic }).to_string()
    }
}
