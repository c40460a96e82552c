//! Content hashing for managed files.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// What the file database remembers about a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// SHA-256 of the content, hex encoded.
    pub hexdigest: String,
    pub size: u64,
    /// When the record was taken.
    pub recorded: DateTime<Utc>,
}

impl FileRecord {
    pub fn from_content(content: &str) -> Self {
        Self {
            hexdigest: hexdigest_str(content),
            size: content.len() as u64,
            recorded: Utc::now(),
        }
    }

    pub fn from_path(path: &Path) -> io::Result<Self> {
        Ok(Self {
            hexdigest: hexdigest_file(path)?,
            size: fs::metadata(path)?.len(),
            recorded: Utc::now(),
        })
    }

    /// True when `content` hashes to the recorded digest.
    pub fn matches(&self, content: &str) -> bool {
        self.size == content.len() as u64 && self.hexdigest == hexdigest_str(content)
    }
}

pub fn hexdigest_str(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

pub fn hexdigest_file(path: &Path) -> io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
