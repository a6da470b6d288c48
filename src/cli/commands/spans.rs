//! Spans command implementation.
use super::read_input;
use crate::cli::args::SpansOutputFormat;
use chatex::matcher::{MathSpan, find_math_spans};
use std::path::PathBuf;

pub fn run(
    file: Option<PathBuf>,
    format: SpansOutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let html = read_input(file.as_deref())?;
    let spans: Vec<MathSpan> = find_math_spans(&html).collect();

    match format {
        SpansOutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&spans)?)
        }
        SpansOutputFormat::Text => {
            for span in &spans {
                println!("{}..{}\t{}", span.start, span.end, span.text);
            }
        }
    }
    Ok(())
}
