//! Wrap command implementation.
use super::{read_input, write_output};
use chatex::wrap::wrap;
use std::path::PathBuf;

pub fn run(
    file: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let html = read_input(file.as_deref())?;
    write_output(output, &wrap(&html))
}
