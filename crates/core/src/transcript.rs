//! Persistence of finished conversations.
//!
//! A transcript is a JSON array. The first element lists the functions that
//! were available, followed by every message of the conversation and a final
//! system message marking the end.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use duck_chat_model::{FunctionDescriptor, Message};
use serde::Serialize;
use serde_json::Serializer;
use serde_json::ser::PrettyFormatter;

/// Content of the system message appended to every transcript.
pub const END_MARKER: &str = "Conversation ended.";

#[derive(Serialize)]
#[serde(untagged)]
enum Entry<'a> {
    Functions { functions: &'a [FunctionDescriptor] },
    Message(&'a Message),
}

/// Returns `<root>/<YYYY-MM-DD>/<HH-MM-SS>.json` for the given time.
pub fn transcript_path(root: &Path, time: &DateTime<Local>) -> PathBuf {
    root.join(time.format("%Y-%m-%d").to_string())
        .join(format!("{}.json", time.format("%H-%M-%S")))
}

/// Writes a transcript to `path`, creating parent directories as needed.
///
/// An existing file at `path` is overwritten.
pub fn write_transcript(
    path: &Path,
    functions: &[FunctionDescriptor],
    messages: &[Message],
) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let end = Message::system(END_MARKER);
    let entries = std::iter::once(Entry::Functions { functions })
        .chain(messages.iter().map(Entry::Message))
        .chain(std::iter::once(Entry::Message(&end)))
        .collect::<Vec<_>>();

    let mut writer = BufWriter::new(File::create(path)?);
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut writer, formatter);
    entries.serialize(&mut serializer)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    debug!("transcript saved to {}", path.display());
    Ok(())
}
