//! JSONL chunk-dump reader.

use std::io::{BufRead, BufReader};
use std::{fs::File, path::Path};

use tracing::{info, warn};

use crate::errors::IndexError;
use crate::record::ChunkRecord;

/// Reads a chunk dump line by line.
///
/// - Ignores empty lines.
/// - Malformed rows are logged at `warn` and skipped; ingestion tools are
///   trusted but a single corrupt line must not take the whole index down.
///
/// # Errors
/// - [`IndexError::Io`] if the file cannot be opened or read.
pub fn read_chunks(jsonl_path: impl AsRef<Path>) -> Result<Vec<ChunkRecord>, IndexError> {
    info!("Reading chunk JSONL: {:?}", jsonl_path.as_ref());

    let file = File::open(jsonl_path.as_ref())?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<ChunkRecord>(&line) {
            Ok(record) => out.push(record),
            Err(e) => warn!("line {} parse error, skipping: {}", i + 1, e),
        }
    }

    info!("Loaded {} chunk records", out.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_records_and_skips_bad_lines() {
        let dir = std::env::temp_dir().join("doc-index-io-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("chunks.jsonl");

        let mut f = File::create(&path).unwrap();
        writeln!(
            f,
            r#"{{"id":"c1","source_file":"a.pdf","page_number":1,"text":"alpha"}}"#
        )
        .unwrap();
        writeln!(f).unwrap();
        writeln!(f, "garbage line").unwrap();
        writeln!(
            f,
            r#"{{"id":"c2","source_file":"b.pdf","page_number":3,"text":"beta","embedding":[0.1,0.2]}}"#
        )
        .unwrap();

        let records = read_chunks(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "c1");
        assert_eq!(records[1].embedding.as_ref().unwrap().len(), 2);
    }
}
