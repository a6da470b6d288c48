pub mod render;
pub mod spans;
pub mod toggle;
pub mod wrap;

use std::io::Read;
use std::path::{Path, PathBuf};

/// Read `file`, or stdin when there is none.
pub fn read_input(file: Option<&Path>) -> std::io::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

pub fn write_output(
    output: Option<PathBuf>,
    out: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(output_path) = output {
        std::fs::write(&output_path, out)?;
        eprintln!("Output written to: {}", output_path.display());
    } else {
        println!("{}", out);
    }
    Ok(())
}
