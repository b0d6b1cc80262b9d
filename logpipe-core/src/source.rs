// logpipe-core/src/source.rs
//! Raw log sources.
//!
//! A [`LogSource`] is a file on disk (optionally gzip-compressed), a string
//! held in memory, or the process's standard input. File names are checked when the source is created,
//! before anything touches the file system; existence is only checked when
//! the source is opened.
//!
//! License: MIT OR APACHE 2.0

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::errors::{LogPipeError, Result};

lazy_static! {
    /// `.log` or `.txt`, then up to two numeric rotation suffixes (`latest.log.1.2`),
    /// then an optional `.gz`.
    static ref ALLOWED_FILE_NAME: Regex =
        Regex::new(r"\A.*\.(log|txt)(\.[0-9]+){0,2}(\.gz)?\z").unwrap();
}

/// Returns true if `file_name` may be uploaded as a log.
pub fn is_allowed_file_name(file_name: &str) -> bool {
    ALLOWED_FILE_NAME.is_match(file_name)
}

/// Where the raw log content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSource {
    File { path: PathBuf, gzip: bool },
    InMemory(String),
    /// Standard input, streamed; read at most once.
    Stdin,
}

impl LogSource {
    /// A file source. Fails with [`LogPipeError::InputRejected`] if the file
    /// name does not look like a log.
    pub fn file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| LogPipeError::InputRejected(path.display().to_string()))?;

        if !is_allowed_file_name(file_name) {
            return Err(LogPipeError::InputRejected(file_name.to_string()));
        }

        let gzip = file_name.ends_with(".gz");
        Ok(LogSource::File { path, gzip })
    }

    pub fn in_memory(content: impl Into<String>) -> Self {
        LogSource::InMemory(content.into())
    }

    pub fn stdin() -> Self {
        LogSource::Stdin
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            LogSource::File { path, .. } => Some(path),
            LogSource::InMemory(_) | LogSource::Stdin => None,
        }
    }

    /// Opens the raw byte stream, decompressing gzip files on the fly.
    pub fn open(&self) -> Result<Box<dyn BufRead + Send + '_>> {
        match self {
            LogSource::File { path, gzip } => {
                let is_file = fs::metadata(path).map(|m| m.is_file()).unwrap_or(false);
                if !is_file {
                    return Err(LogPipeError::NotFound(path.clone()));
                }

                let file = File::open(path)?;
                debug!("Opened log file {} (gzip: {}).", path.display(), gzip);
                if *gzip {
                    Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
                } else {
                    Ok(Box::new(BufReader::new(file)))
                }
            }
            LogSource::InMemory(content) => Ok(Box::new(Cursor::new(content.as_bytes()))),
            LogSource::Stdin => {
                debug!("Streaming log from stdin.");
                Ok(Box::new(BufReader::new(io::stdin())))
            }
        }
    }
}
