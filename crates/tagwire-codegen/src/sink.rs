//! Destinations for generated units.
//!
//! Every unit is keyed by its package, its name and its source kind. [`FileSink`] lays
//! units out on disk and writes a manifest that `include!`s all of them, so a consuming
//! crate needs a single `include!` of the manifest.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::GenerateError;
use crate::naming::to_snake_case;

/// Name of the manifest [`FileSink`] writes by default.
pub const MANIFEST_FILE: &str = "codecs.rs";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceKind {
    Rust,
}

impl SourceKind {
    pub fn extension(self) -> &'static str {
        match self {
            SourceKind::Rust => "rs",
        }
    }
}

/// Identity of one generated unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitKey {
    /// Module path the unit belongs to, such as `crate::model`
    pub package: String,
    /// Name of the unit's main item, such as `ItemCodec`
    pub name: String,
    pub kind: SourceKind,
}

impl UnitKey {
    pub fn rust(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            kind: SourceKind::Rust,
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", to_snake_case(&self.name), self.kind.extension())
    }

    /// Path of the unit relative to a sink root: one directory per package segment,
    /// with the leading `crate` dropped.
    pub fn relative_path(&self) -> PathBuf {
        let mut path = PathBuf::new();
        for segment in self.package.split("::").filter(|s| !s.is_empty()) {
            if path.as_os_str().is_empty() && segment == "crate" {
                continue;
            }
            path.push(segment);
        }
        path.push(self.file_name());
        path
    }
}

/// Receives generated units.
pub trait OutputSink {
    fn write_unit(&mut self, key: &UnitKey, code: &str) -> Result<(), GenerateError>;

    /// Called once after the last unit.
    fn finish(&mut self) -> Result<(), GenerateError> {
        Ok(())
    }
}

/// Writes units below a root directory.
#[derive(Debug)]
pub struct FileSink {
    root: PathBuf,
    manifest: Option<String>,
    written: Vec<PathBuf>,
}

impl FileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            manifest: Some(MANIFEST_FILE.to_string()),
            written: Vec::new(),
        }
    }

    /// Change the manifest file name, or disable the manifest with `None`.
    pub fn manifest(mut self, name: Option<&str>) -> Self {
        self.manifest = name.map(str::to_string);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files written so far, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl OutputSink for FileSink {
    fn write_unit(&mut self, key: &UnitKey, code: &str) -> Result<(), GenerateError> {
        let path = self.root.join(key.relative_path());
        write_atomic(&path, code)?;
        debug!(path = %path.display(), "wrote unit");
        self.written.push(path);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), GenerateError> {
        let Some(manifest) = &self.manifest else {
            return Ok(());
        };

        let mut content = String::from("// Includes every generated codec unit.\n\n");
        for path in &self.written {
            let absolute = std::path::absolute(path).map_err(|source| GenerateError::Write {
                path: path.display().to_string(),
                source,
            })?;
            content.push_str(&format!("include!({:?});\n", absolute.display().to_string()));
        }

        let path = self.root.join(manifest);
        write_atomic(&path, &content)?;
        debug!(path = %path.display(), units = self.written.len(), "wrote manifest");
        Ok(())
    }
}

/// Keeps units in memory, ordered by key.
#[derive(Debug, Default)]
pub struct MemorySink {
    units: BTreeMap<UnitKey, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &UnitKey) -> Option<&str> {
        self.units.get(key).map(String::as_str)
    }

    pub fn units(&self) -> &BTreeMap<UnitKey, String> {
        &self.units
    }

    pub fn into_units(self) -> BTreeMap<UnitKey, String> {
        self.units
    }
}

impl OutputSink for MemorySink {
    fn write_unit(&mut self, key: &UnitKey, code: &str) -> Result<(), GenerateError> {
        self.units.insert(key.clone(), code.to_string());
        Ok(())
    }
}

/// Writes content to a file atomically using temp file + rename.
fn write_atomic(path: &Path, content: &str) -> Result<(), GenerateError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| GenerateError::Write {
            path: parent.display().to_string(),
            source,
        })?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).map_err(|source| GenerateError::Write {
        path: temp_path.display().to_string(),
        source,
    })?;

    fs::rename(&temp_path, path).map_err(|source| GenerateError::Write {
        path: path.display().to_string(),
        source,
    })
}
