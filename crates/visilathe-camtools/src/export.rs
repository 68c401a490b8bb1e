//! Machine code export.
//!
//! A program is the selected postprocessor's serialization of every
//! toolpath's moves, concatenated. Writing goes through a temporary file in
//! the destination directory that is renamed over the target, so an
//! interrupted export never leaves a truncated program behind.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::CamToolResult;
use crate::moves::MoveSequence;
use crate::post::PostprocessorRegistry;
use crate::settings::GlobalSettings;

/// Serialize already generated moves with the postprocessor named `id`.
pub fn export_lines(
    moves: &MoveSequence,
    global: &GlobalSettings,
    registry: &PostprocessorRegistry,
    id: &str,
) -> CamToolResult<Vec<String>> {
    let post = registry.create(id, global)?;
    let lines: Vec<String> = post.serialize(moves).collect();
    tracing::debug!("{}: {} moves -> {} lines", id, moves.len(), lines.len());
    Ok(lines)
}

/// File extension registered for postprocessor `id`.
pub fn file_extension(
    global: &GlobalSettings,
    registry: &PostprocessorRegistry,
    id: &str,
) -> CamToolResult<&'static str> {
    Ok(registry.create(id, global)?.file_extension())
}

fn write_to<W: Write>(writer: W, lines: &[String]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(writer);
    for line in lines {
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Write one line per entry, each terminated by `\n`.
///
/// With `atomic` the previous file content is kept intact until the new
/// content is completely written.
pub fn write_lines(path: &Path, lines: &[String], atomic: bool) -> CamToolResult<()> {
    if !atomic {
        write_to(File::create(path)?, lines)?;
        return Ok(());
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;
    write_to(temp.as_file_mut(), lines)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    tracing::info!("Wrote {} lines to {}", lines.len(), path.display());
    Ok(())
}
