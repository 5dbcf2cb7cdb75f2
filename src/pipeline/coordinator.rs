//! Corpus discovery and output layout.

use crate::constants::raster;
use crate::error::{Error, Result};
use crate::signal::{is_recording_file, recording_id};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One recording found in the corpus tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusEntry {
    /// Declared class (the class subdirectory name).
    pub class: String,
    /// Recording file path.
    pub path: PathBuf,
}

impl CorpusEntry {
    /// Recording identifier.
    pub fn id(&self) -> String {
        recording_id(&self.path)
    }
}

/// Collect every recording under `<root>/<class>/` for the declared classes.
///
/// Class directories are searched recursively and returned in class order,
/// each sorted by path. Subdirectories of `root` that are not declared
/// classes are ignored with a warning. Identifiers name rasters and table
/// rows, so two files with the same stem anywhere in the corpus are an error.
pub fn collect_corpus(root: &Path, classes: &[String]) -> Result<Vec<CorpusEntry>> {
    if !root.is_dir() {
        return Err(Error::CorpusNotFound {
            path: root.to_path_buf(),
        });
    }

    let declared: HashSet<&str> = classes.iter().map(String::as_str).collect();
    let mut undeclared: Vec<String> = std::fs::read_dir(root)?
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| !declared.contains(name.as_str()))
        .collect();
    undeclared.sort();
    for name in undeclared {
        warn!("Ignoring undeclared class directory: {}", root.join(name).display());
    }

    let mut entries = Vec::new();
    for class in classes {
        let dir = root.join(class);
        let mut files = Vec::new();
        if dir.is_dir() {
            collect_recording_files_recursive(&dir, &mut files)?;
        }
        if files.is_empty() {
            return Err(Error::EmptyClass {
                class: class.clone(),
            });
        }
        files.sort();
        debug!("class {class}: {} recordings", files.len());
        entries.extend(files.into_iter().map(|path| CorpusEntry {
            class: class.clone(),
            path,
        }));
    }

    check_unique_ids(&entries)?;
    Ok(entries)
}

fn check_unique_ids(entries: &[CorpusEntry]) -> Result<()> {
    let mut seen: HashMap<String, &Path> = HashMap::with_capacity(entries.len());
    for entry in entries {
        if let Some(first) = seen.insert(entry.id(), &entry.path) {
            return Err(Error::DuplicateRecording {
                id: entry.id(),
                first: first.to_path_buf(),
                second: entry.path.clone(),
            });
        }
    }
    Ok(())
}

/// Recursively collect recording files from a directory.
fn collect_recording_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            collect_recording_files_recursive(&path, files)?;
        } else if is_recording_file(&path) {
            files.push(path);
        }
    }

    Ok(())
}

/// Path of the raster image for a recording.
pub fn raster_path_for(output_dir: &Path, class: &str, id: &str) -> PathBuf {
    output_dir
        .join(raster::DIR_NAME)
        .join(class)
        .join(format!("{id}.{}", raster::EXTENSION))
}
