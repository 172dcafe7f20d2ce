//! [`FileBackend`]: the JSON-file implementation of [`Backend`].

use std::{
  ffi::OsString,
  fs, io,
  path::{Path, PathBuf},
};

use excusal_core::backend::Backend;
use serde_json::{Map, Value};

use crate::{Error, Result};

// ─── Backend ─────────────────────────────────────────────────────────────────

/// A key-value blob stored as a single JSON object in a file.
///
/// Every read parses the whole file and every write rewrites it, replacing
/// the old file by rename. Cloning is cheap; clones address the same file.
#[derive(Debug, Clone)]
pub struct FileBackend {
  path: PathBuf,
}

impl FileBackend {
  /// Use the blob at `path`, creating its parent directory if needed. The
  /// file itself is created on first write.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent).map_err(|source| Error::Io {
        path: parent.to_path_buf(),
        source,
      })?;
    }
    Ok(Self { path })
  }

  pub fn path(&self) -> &Path { &self.path }

  /// Parse the whole blob. A missing file is an empty blob.
  fn read_all(&self) -> Result<Map<String, Value>> {
    let raw = match fs::read_to_string(&self.path) {
      Ok(raw) => raw,
      Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
      Err(source) => {
        return Err(Error::Io {
          path: self.path.clone(),
          source,
        });
      }
    };

    if raw.trim().is_empty() {
      return Ok(Map::new());
    }

    match serde_json::from_str(&raw)? {
      Value::Object(map) => Ok(map),
      _ => Err(Error::NotAnObject(self.path.clone())),
    }
  }

  /// Like `read_all`, but a corrupt file yields an empty blob so the next
  /// write replaces it.
  fn read_for_write(&self) -> Result<Map<String, Value>> {
    match self.read_all() {
      Err(err @ (Error::Json(_) | Error::NotAnObject(_))) => {
        tracing::warn!(path = %self.path.display(), error = %err, "blob corrupt, starting fresh");
        Ok(Map::new())
      }
      other => other,
    }
  }

  fn write_all(&self, map: Map<String, Value>) -> Result<()> {
    let body = serde_json::to_string_pretty(&Value::Object(map))?;

    let mut tmp_name = self
      .path
      .file_name()
      .map(OsString::from)
      .unwrap_or_else(|| OsString::from("blob"));
    tmp_name.push(".tmp");
    let tmp = self.path.with_file_name(tmp_name);

    fs::write(&tmp, body).map_err(|source| Error::Io {
      path: tmp.clone(),
      source,
    })?;
    fs::rename(&tmp, &self.path).map_err(|source| Error::Io {
      path: self.path.clone(),
      source,
    })
  }
}

// ─── Backend impl ────────────────────────────────────────────────────────────

impl Backend for FileBackend {
  type Error = Error;

  fn get(&self, key: &str) -> Result<Option<Value>> {
    Ok(self.read_all()?.remove(key))
  }

  fn put_many(&mut self, entries: Vec<(String, Value)>) -> Result<()> {
    let mut map = self.read_for_write()?;
    map.extend(entries);
    self.write_all(map)
  }

  fn remove(&mut self, key: &str) -> Result<()> {
    let mut map = self.read_for_write()?;
    if map.remove(key).is_some() {
      self.write_all(map)?;
    }
    Ok(())
  }
}
