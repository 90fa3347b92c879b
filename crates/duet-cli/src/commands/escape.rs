use anyhow::Result;
use std::io::Read;
use std::path::Path;

pub fn run(file: Option<&Path>) -> Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    println!("{}", escape_lines(&text));
    Ok(())
}

/// Trims each line and joins them with a literal `\n`, dropping leading and
/// trailing blank lines.
pub fn escape_lines(text: &str) -> String {
    text.trim()
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\\n")
}
