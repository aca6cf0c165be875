//! Serde helpers that write paths as strings, replacing invalid UTF-8.
//!
//! Directory names are arbitrary bytes on Unix; a single odd name must not
//! make a finished report unexportable.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

pub fn path<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}

pub fn paths<S: Serializer>(paths: &[PathBuf], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(paths.iter().map(|path| path.to_string_lossy()))
}

pub fn path_keys<S, V>(map: &HashMap<PathBuf, V>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    serializer.collect_map(map.iter().map(|(path, value)| (path.to_string_lossy(), value)))
}
