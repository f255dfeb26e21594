//! Static cache-source configuration: the list of `{url, output}` pairs the
//! cache-pull stage fetches.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheSource {
    pub url: String,
    /// Filename the fetched bytes are stored under inside the hourly
    /// snapshot folder.
    pub output: String,
}

pub fn load_cache_sources(path: &Path) -> Result<Vec<CacheSource>> {
    let payload = fs::read(path)?;
    Ok(serde_json::from_slice(&payload)?)
}
