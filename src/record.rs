//! Record construction and JSON-Lines output.
//!
//! Each record is written as a single line:
//!
//! ```text
//! {"messages":[{"role":"user","content":"…"},{"role":"assistant","content":"…"}],"metadata":{"source":"…","category":"…"}}
//! ```
//!
//! String fields are escaped by `serde_json`: `"` `\` and the control
//! characters `\b` `\f` `\n` `\r` `\t` get two-character escapes, every other
//! character below 0x20 becomes `\u00XX` with lowercase hex, and nothing else
//! is escaped.

use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use crate::models::Record;

/// Where a record's prompt comes from.
#[derive(Debug, Clone, Copy)]
pub enum PromptMaterial<'a> {
    /// Synthesize from the category and an optional extracted title.
    Synthesized { title: Option<&'a str> },
    /// Use the hand-written prompt unchanged.
    Verbatim(&'a str),
}

/// Prompt for a catalog item.
pub fn synthesize_prompt(category: &str, title: Option<&str>) -> String {
    match title {
        Some(title) => format!(
            "Explain this {} concept in detail for an OS developer:\n\n{}",
            category, title
        ),
        None => format!(
            "Explain this {} technical content for an OS developer.",
            category
        ),
    }
}

pub fn build(material: PromptMaterial<'_>, content: &str, source: &str, category: &str) -> Record {
    let prompt = match material {
        PromptMaterial::Synthesized { title } => synthesize_prompt(category, title),
        PromptMaterial::Verbatim(prompt) => prompt.to_string(),
    };
    Record {
        prompt,
        response: content.to_string(),
        source: source.to_string(),
        category: category.to_string(),
    }
}

#[derive(Serialize)]
struct WireRecord<'a> {
    messages: [WireMessage<'a>; 2],
    metadata: WireMetadata<'a>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct WireMetadata<'a> {
    source: &'a str,
    category: &'a str,
}

impl Record {
    /// Serialize as one JSON line, including the trailing `\n`.
    pub fn to_json_line(&self) -> Result<String> {
        let wire = WireRecord {
            messages: [
                WireMessage {
                    role: "user",
                    content: &self.prompt,
                },
                WireMessage {
                    role: "assistant",
                    content: &self.response,
                },
            ],
            metadata: WireMetadata {
                source: &self.source,
                category: &self.category,
            },
        };
        let mut line = serde_json::to_string(&wire)?;
        line.push('\n');
        Ok(line)
    }
}

/// Appends records to an output stream, one write per record.
///
/// The writer is expected to be unbuffered (a plain `File`) so that every
/// emitted record is on disk even if the run dies later.
pub struct RecordWriter<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn emit(&mut self, record: &Record) -> Result<()> {
        let line = record.to_json_line()?;
        self.out.write_all(line.as_bytes())?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
