//! JSON rendering of the analysis result.
//!
//! The caller parses exactly one JSON object from stdout, so the writer emits
//! one object followed by a newline and nothing else.

use crate::error::Result;
use crate::types::AnalysisResult;
use std::io::Write;

/// Write a result as one JSON document followed by a newline, then flush.
pub fn write_result<W: Write>(mut writer: W, result: &AnalysisResult, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut writer, result)?;
    } else {
        serde_json::to_writer(&mut writer, result)?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
