// logpipe-core/src/headless.rs
//! One-shot helpers for running the pipeline without building a [`Log`] by hand.
//!
//! The pipeline itself is blocking. [`sanitize_in_background`] moves it onto
//! tokio's blocking pool so an async transport can await the result.

use std::path::Path;
use std::sync::Arc;

use log::debug;

use crate::errors::Result;
use crate::filters::FilterChain;
use crate::log::Log;

/// Runs `content` through the bounded reader and `chain`.
pub fn sanitize_string(content: &str, chain: &FilterChain) -> Result<String> {
    let mut log = Log::from_string(content);
    Ok(log.content(chain)?.to_string())
}

/// Validates the file name, then reads and filters the file.
pub fn sanitize_file<P: AsRef<Path>>(path: P, chain: &FilterChain) -> Result<String> {
    let mut log = Log::from_path(path.as_ref())?;
    Ok(log.content(chain)?.to_string())
}

/// Computes the content of `log` on a blocking worker thread.
///
/// The log is handed back with its content cached, ready for
/// [`Log::upload_payload`].
pub async fn sanitize_in_background(mut log: Log, chain: Arc<FilterChain>) -> Result<(Log, String)> {
    debug!("Dispatching log sanitization to the blocking pool.");
    tokio::task::spawn_blocking(move || -> Result<(Log, String)> {
        let content = log.content(&chain)?.to_string();
        Ok((log, content))
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Limits;
    use crate::errors::LogPipeError;
    use crate::log::Metadata;
    use std::io::Write;

    #[test]
    fn test_sanitize_string_default_chain() -> Result<()> {
        let chain = FilterChain::default_for(&Limits::default());
        let output = sanitize_string("\n\n  Connection from 203.0.113.7 accepted\n", &chain)?;
        assert_eq!(output, "Connection from **.**.**.** accepted");
        Ok(())
    }

    #[test]
    fn test_sanitize_file_plain() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".log").tempfile()?;
        writeln!(file, "a\nb\nc")?;
        let chain = FilterChain::default_for(&Limits::new(60, 100, 2));
        assert_eq!(sanitize_file(file.path(), &chain)?, "a\nb");
        Ok(())
    }

    #[test]
    fn test_sanitize_file_rejects_name() {
        let chain = FilterChain::default();
        assert!(matches!(
            sanitize_file("notes.md", &chain),
            Err(LogPipeError::InputRejected(_))
        ));
    }

    #[tokio::test]
    async fn test_sanitize_in_background() -> Result<()> {
        let mut log = Log::from_string("  user 10.1.2.3 joined");
        log.set_source(Some("test".to_string()))
            .add_metadata(Metadata::new("k", "v"));
        let chain = Arc::new(FilterChain::default_for(&Limits::default()));

        let (mut log, content) = sanitize_in_background(log, Arc::clone(&chain)).await?;
        assert_eq!(content, "user **.**.**.** joined");

        let payload = log.upload_payload(&chain)?;
        assert_eq!(payload.content, content);
        assert_eq!(payload.source.as_deref(), Some("test"));
        assert_eq!(payload.metadata.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_background_error_is_propagated() {
        let log = Log::from_path("/definitely/not/here/server.log").unwrap();
        let result = sanitize_in_background(log, Arc::new(FilterChain::default())).await;
        assert!(matches!(result, Err(LogPipeError::NotFound(_))));
    }
}
