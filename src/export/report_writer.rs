use crate::constants::PARTIAL_SUFFIX;
use crate::errors::{AppError, AppResult};
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Writes a streamed report archive to `directory/filename`.
///
/// # Behavior
///
/// - **Bounded memory**: chunks are written as they arrive.
/// - **Atomic**: data goes to `{filename}.part` first and is renamed once the
///   stream ends cleanly, replacing any existing file of the same name.
/// - **No leftovers**: the `.part` file is removed when writing fails.
///
/// # Errors
///
/// Returns `NetworkError` if the stream yields an error before its end, and
/// `IoError` if the directory cannot be created or written to.
pub async fn save<S, B, E>(filename: &str, stream: S, directory: &Path) -> AppResult<PathBuf>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    if !directory.exists() {
        fs::create_dir_all(directory).await.map_err(|e| {
            AppError::IoError(format!(
                "Failed to create directory {}: {e}",
                directory.display()
            ))
        })?;
    }

    let file_path = directory.join(filename);
    let tmp_path = directory.join(format!("{filename}{PARTIAL_SUFFIX}"));

    let written = match write_stream(&tmp_path, stream).await {
        Ok(written) => written,
        Err(e) => {
            if let Err(remove_err) = fs::remove_file(&tmp_path).await {
                warn!(
                    file_path = %tmp_path.display(),
                    error = %remove_err,
                    "Failed to remove partial download"
                );
            }
            return Err(e);
        }
    };

    fs::rename(&tmp_path, &file_path).await.map_err(|e| {
        AppError::IoError(format!(
            "Failed to rename temp file {} to {}: {}",
            tmp_path.display(),
            file_path.display(),
            e
        ))
    })?;

    info!(
        file_path = %file_path.display(),
        bytes = written,
        "Export file downloaded"
    );
    Ok(file_path)
}

async fn write_stream<S, B, E>(tmp_path: &Path, stream: S) -> AppResult<u64>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut file = File::create(tmp_path).await.map_err(|e| {
        AppError::IoError(format!(
            "Failed to create temp file {}: {}",
            tmp_path.display(),
            e
        ))
    })?;

    let mut stream = std::pin::pin!(stream);
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            AppError::NetworkError(format!(
                "Download stream for {} ended abnormally: {e}",
                tmp_path.display()
            ))
        })?;
        let bytes = chunk.as_ref();
        file.write_all(bytes).await.map_err(|e| {
            AppError::IoError(format!(
                "Failed to write to temp file {}: {}",
                tmp_path.display(),
                e
            ))
        })?;
        written += bytes.len() as u64;
    }

    file.flush().await.map_err(|e| {
        AppError::IoError(format!(
            "Failed to flush temp file {}: {}",
            tmp_path.display(),
            e
        ))
    })?;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::io;
    use tempfile::TempDir;

    fn chunks(parts: &[&'static [u8]]) -> impl Stream<Item = Result<Vec<u8>, io::Error>> {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok::<_, io::Error>(p.to_vec()))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn save_writes_all_chunks() {
        let dir = TempDir::new().unwrap();

        let path = save("report.zip", chunks(&[b"PK", b"\x03\x04", b"rest"]), dir.path())
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("report.zip"));
        assert_eq!(std::fs::read(&path).unwrap(), b"PK\x03\x04rest");
        assert!(!dir.path().join("report.zip.part").exists());
    }

    #[tokio::test]
    async fn save_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("downloads");

        let path = save("report.zip", chunks(&[b"data"]), &target).await.unwrap();

        assert!(path.starts_with(&target));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn save_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("report.zip"), b"old contents").unwrap();

        let path = save("report.zip", chunks(&[b"new"]), dir.path()).await.unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"new");
    }

    #[tokio::test]
    async fn save_broken_stream_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let broken = stream::iter(vec![
            Ok(b"partial".to_vec()),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer")),
        ]);

        let err = save("report.zip", broken, dir.path()).await.unwrap_err();

        assert!(matches!(err, AppError::NetworkError(_)));
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("reset by peer"));
        assert!(!dir.path().join("report.zip").exists());
        assert!(!dir.path().join("report.zip.part").exists());
    }

    #[tokio::test]
    async fn save_empty_stream_writes_empty_file() {
        let dir = TempDir::new().unwrap();

        let path = save("empty.zip", chunks(&[]), dir.path()).await.unwrap();

        assert_eq!(std::fs::metadata(path).unwrap().len(), 0);
    }
}
