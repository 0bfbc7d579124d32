//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};

/// Directory tree of files which are written once and never replaced
#[derive(Clone, Debug)]
pub struct Filecache {
    pub basepath: String,
}

impl Filecache {
    pub fn new<P: AsRef<Path>>(basepath: P) -> Filecache {
        Filecache {
            basepath: basepath.as_ref().to_string_lossy().to_string(),
        }
    }
    pub fn fullpath(&self, path: &str) -> PathBuf {
        Path::new(&self.basepath).join(path)
    }
    pub fn exists(&self, path: &str) -> bool {
        self.fullpath(path).is_file()
    }
    /// File content, `None` if the file doesn't exist
    pub fn read(&self, path: &str) -> Result<Option<Vec<u8>>, io::Error> {
        let fullpath = self.fullpath(path);
        debug!("Filecache.read {}", fullpath.display());
        match fs::read(&fullpath) {
            Ok(data) => Ok(Some(data)),
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
    /// Write file atomically, keeping an existing file.
    ///
    /// Content is written to a temporary file in the target directory and moved
    /// to its final name without replacing a file written concurrently.
    /// Returns `false` if the file already existed.
    pub fn write(&self, path: &str, obj: &[u8]) -> Result<bool, io::Error> {
        let fullpath = self.fullpath(path);
        debug!("Filecache.write {}", fullpath.display());
        if fullpath.is_file() {
            return Ok(false);
        }
        let tmp = Self::stage(&fullpath, obj)?;
        Self::commit(tmp, &fullpath)
    }
    /// Temporary file with the content, next to its final location
    pub(crate) fn stage(fullpath: &Path, obj: &[u8]) -> Result<NamedTempFile, io::Error> {
        let dir = fullpath.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;
        let mut tmp = Builder::new()
            .prefix(".partial-")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        tmp.write_all(obj)?;
        tmp.as_file().sync_all()?;
        Ok(tmp)
    }
    /// Move a staged file to its final name, unless another writer was faster
    pub(crate) fn commit(tmp: NamedTempFile, fullpath: &Path) -> Result<bool, io::Error> {
        match tmp.persist_noclobber(fullpath) {
            Ok(_) => Ok(true),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!("{} - written by concurrent writer", fullpath.display());
                Ok(false)
            }
            Err(e) => Err(e.error),
        }
    }
    pub fn remove(&self, path: &str) -> Result<(), io::Error> {
        fs::remove_file(self.fullpath(path))
    }
}
