use crate::boundary::BoundaryKind;
use crate::error::Result;
use crate::types::Chunk;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;

/// Serialized shape of a chunk, the only contract downstream consumers see
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRecord {
    pub path: String,
    pub language: String,
    pub start_line: usize,
    pub end_line: usize,
    pub kind: BoundaryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_text: Option<String>,
    pub oversized: bool,
    /// Hex SHA-256 of context followed by text
    pub content_hash: String,
}

impl From<&Chunk> for ChunkRecord {
    fn from(chunk: &Chunk) -> Self {
        let mut hasher = Sha256::new();
        if let Some(context) = &chunk.context {
            hasher.update(context.as_bytes());
        }
        hasher.update(chunk.text.as_bytes());

        Self {
            path: chunk.path.clone(),
            language: chunk.language.clone(),
            start_line: chunk.start_line,
            end_line: chunk.end_line,
            kind: chunk.kind,
            name: chunk.name.clone(),
            text: chunk.text.clone(),
            context_text: chunk.context.clone(),
            oversized: chunk.is_oversized(),
            content_hash: format!("{:x}", hasher.finalize()),
        }
    }
}

/// Output framing for chunk records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// One pretty-printed JSON array
    #[default]
    Json,
    /// One compact record per line
    JsonLines,
}

/// Writes chunk records; identical chunks always produce identical bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct Emitter {
    format: OutputFormat,
}

impl Emitter {
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    #[must_use]
    pub const fn format(&self) -> OutputFormat {
        self.format
    }

    #[must_use]
    pub fn records(chunks: &[Chunk]) -> Vec<ChunkRecord> {
        chunks.iter().map(ChunkRecord::from).collect()
    }

    /// Write records for `chunks` to `writer`
    pub fn write<W: Write>(&self, mut writer: W, chunks: &[Chunk]) -> Result<()> {
        let records = Self::records(chunks);
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut writer, &records)?;
                writeln!(writer)?;
            }
            OutputFormat::JsonLines => {
                for record in &records {
                    serde_json::to_writer(&mut writer, record)?;
                    writeln!(writer)?;
                }
            }
        }
        writer.flush()?;
        Ok(())
    }

    /// Render records for `chunks` into a string
    pub fn render(&self, chunks: &[Chunk]) -> Result<String> {
        let mut buf = Vec::new();
        self.write(&mut buf, chunks)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OverflowReason;
    use pretty_assertions::assert_eq;

    fn chunk(start_line: usize, text: &str, context: Option<&str>) -> Chunk {
        Chunk {
            path: "alarm.cc".to_string(),
            language: "cpp".to_string(),
            start_line,
            end_line: start_line + text.lines().count().saturating_sub(1),
            start_byte: 0,
            end_byte: text.len(),
            kind: BoundaryKind::Function,
            name: Some("Cancel".to_string()),
            text: text.to_string(),
            context: context.map(str::to_string),
            core_size: text.len(),
            overflow: None,
        }
    }

    #[test]
    fn record_uses_camel_case_and_omits_missing_fields() {
        let mut plain = chunk(3, "void Cancel() {}\n", None);
        plain.name = None;
        let value = serde_json::to_value(ChunkRecord::from(&plain)).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object["startLine"], 3);
        assert_eq!(object["endLine"], 3);
        assert_eq!(object["kind"], "function");
        assert_eq!(object["oversized"], false);
        assert!(!object.contains_key("name"));
        assert!(!object.contains_key("contextText"));
        assert_eq!(object["contentHash"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn hash_covers_context_and_text() {
        let bare = ChunkRecord::from(&chunk(3, "void Cancel() {}\n", None));
        let stitched = ChunkRecord::from(&chunk(3, "void Cancel() {}\n", Some("class Alarm {\n")));
        let again = ChunkRecord::from(&chunk(3, "void Cancel() {}\n", Some("class Alarm {\n")));

        assert_ne!(bare.content_hash, stitched.content_hash);
        assert_eq!(stitched, again);
        assert_eq!(stitched.context_text.as_deref(), Some("class Alarm {\n"));
    }

    #[test]
    fn oversized_flag_follows_overflow() {
        let mut big = chunk(1, "x\n", None);
        big.overflow = Some(OverflowReason::AtomicPreserved);
        assert!(ChunkRecord::from(&big).oversized);
    }

    #[test]
    fn json_lines_writes_one_record_per_line() {
        let chunks = vec![chunk(1, "a\n", None), chunk(2, "b\n", None)];
        let out = Emitter::new(OutputFormat::JsonLines).render(&chunks).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 2);
        let second: ChunkRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.start_line, 2);
        assert_eq!(second.text, "b\n");
    }

    #[test]
    fn json_output_is_deterministic() {
        let chunks = vec![chunk(1, "a\n", Some("ctx\n")), chunk(2, "b\n", None)];
        let emitter = Emitter::default();
        let first = emitter.render(&chunks).unwrap();
        let second = emitter.render(&chunks).unwrap();

        assert_eq!(first, second);
        let parsed: Vec<ChunkRecord> = serde_json::from_str(&first).unwrap();
        assert_eq!(parsed, Emitter::records(&chunks));
    }

    #[test]
    fn empty_chunk_list_is_an_empty_array() {
        assert_eq!(Emitter::default().render(&[]).unwrap(), "[]\n");
    }
}
