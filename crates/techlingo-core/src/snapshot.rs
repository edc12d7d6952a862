//! Self-checking JSON snapshots.
//!
//! Layout: one header line `{"format", "version", "length", "checksum"}`
//! followed by the JSON payload. The checksum is XxHash64 (seed 0) over the
//! payload bytes.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::hash::Hasher;
use std::path::Path;
use twox_hash::XxHash64;

use crate::error::{Error, Result};
use crate::types::Corpus;

pub const SNAPSHOT_VERSION: u32 = 1;
pub const CORPUS_FORMAT: &str = "techlingo-corpus";

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotHeader {
    format: String,
    version: u32,
    length: usize,
    checksum: u64,
}

fn checksum(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}

pub fn encode<T: Serialize>(format: &str, value: &T) -> Result<Vec<u8>> {
    let payload = serde_json::to_vec(value)?;
    let header = SnapshotHeader {
        format: format.to_string(),
        version: SNAPSHOT_VERSION,
        length: payload.len(),
        checksum: checksum(&payload),
    };
    let mut out = serde_json::to_vec(&header)?;
    out.push(b'\n');
    out.extend_from_slice(&payload);
    Ok(out)
}

pub fn decode<T: DeserializeOwned>(format: &str, bytes: &[u8]) -> Result<T> {
    let split = bytes
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| Error::Snapshot("missing header line".to_string()))?;
    let header: SnapshotHeader = serde_json::from_slice(&bytes[..split])
        .map_err(|e| Error::Snapshot(format!("unreadable header: {}", e)))?;
    let payload = &bytes[split + 1..];

    if header.format != format {
        return Err(Error::Snapshot(format!("expected format '{}', found '{}'", format, header.format)));
    }
    if header.version != SNAPSHOT_VERSION {
        return Err(Error::Snapshot(format!(
            "unsupported version {} (this build reads {})",
            header.version, SNAPSHOT_VERSION
        )));
    }
    if header.length != payload.len() {
        return Err(Error::Snapshot(format!("payload is {} bytes, header says {}", payload.len(), header.length)));
    }
    if header.checksum != checksum(payload) {
        return Err(Error::Snapshot("checksum mismatch".to_string()));
    }
    Ok(serde_json::from_slice(payload)?)
}

/// Write via a sibling temp file and rename, so readers never see a torn file.
pub fn write_snapshot<T: Serialize>(path: &Path, format: &str, value: &T) -> Result<()> {
    let bytes = encode(format, value)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn read_snapshot<T: DeserializeOwned>(path: &Path, format: &str) -> Result<T> {
    if !path.exists() {
        return Err(Error::NotFound(format!("snapshot {}", path.display())));
    }
    decode(format, &fs::read(path)?)
}

impl Corpus {
    pub fn save(&self, path: &Path) -> Result<()> {
        write_snapshot(path, CORPUS_FORMAT, self)
    }

    pub fn load(path: &Path) -> Result<Self> {
        read_snapshot(path, CORPUS_FORMAT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CorpusStats;

    #[test]
    fn round_trip_preserves_value() {
        let corpus = Corpus { min_score: 4.5, chunks: Vec::new(), stats: CorpusStats { documents_in: 3, ..CorpusStats::default() } };
        let bytes = encode(CORPUS_FORMAT, &corpus).expect("encode");
        let back: Corpus = decode(CORPUS_FORMAT, &bytes).expect("decode");
        assert_eq!(back, corpus);
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let mut bytes = encode(CORPUS_FORMAT, &Corpus::empty(5.0)).expect("encode");
        let last = bytes.len() - 2;
        bytes[last] = if bytes[last] == b'0' { b'1' } else { b'0' };
        assert!(matches!(decode::<Corpus>(CORPUS_FORMAT, &bytes), Err(Error::Snapshot(_))));
    }

    #[test]
    fn wrong_format_is_rejected() {
        let bytes = encode("techlingo-index", &Corpus::empty(5.0)).expect("encode");
        let err = decode::<Corpus>(CORPUS_FORMAT, &bytes).unwrap_err();
        assert!(err.to_string().contains("techlingo-index"));
    }

    #[test]
    fn save_and_load_through_the_filesystem() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/corpus.json");
        Corpus::empty(6.0).save(&path).expect("save");
        assert_eq!(Corpus::load(&path).expect("load"), Corpus::empty(6.0));
        assert!(matches!(Corpus::load(&dir.path().join("missing.json")), Err(Error::NotFound(_))));
    }
}
