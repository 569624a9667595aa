use std::io::Write;

use anyhow::Result;

use annotext::Annotated;

use crate::OutputFormat;

pub fn print_results(results: &[Annotated], format: OutputFormat) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for annotated in results {
        match format {
            OutputFormat::Json => {
                let line = serde_json::json!({
                    "index": annotated.index,
                    "text": annotated.styled.text(),
                    "runs": annotated.styled.runs(),
                });
                writeln!(out, "{}", serde_json::to_string(&line)?)?;
            }
            OutputFormat::Plain => {
                writeln!(out, "{}", annotated.styled.text())?;
            }
        }
    }

    Ok(())
}
