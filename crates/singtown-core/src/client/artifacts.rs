use std::{
    io::{self, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use singtown_model::url_file_name;

use super::Client;
use crate::error::ClientError;

const DEFAULT_RESULT_NAME: &str = "result.zip";

impl Client {
    /// Upload a result archive from disk.
    pub async fn upload_results_zip(&self, path: impl AsRef<Path>) -> Result<(), ClientError> {
        let path = path.as_ref();
        let content = match tokio::fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ClientError::MissingFile(path.to_path_buf()));
            }
            Err(e) => return Err(ClientError::io(path, e)),
        };
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_RESULT_NAME.to_string());

        let size = content.len();
        self.shared.state.upload_result(&file_name, content).await?;
        info!(target: "singtown.core.client", %file_name, size, "result uploaded");
        Ok(())
    }

    /// Replace `model_dir` with the contents of the task's trained archive.
    ///
    /// Returns `false` without touching the filesystem when the task has no
    /// trained file.
    pub async fn download_trained_file(
        &self,
        model_dir: impl AsRef<Path>,
    ) -> Result<bool, ClientError> {
        let url = self.shared.state.task().trained_file;
        if url.is_empty() {
            debug!(target: "singtown.core.client", "no trained file");
            return Ok(false);
        }

        let dir = model_dir.as_ref().to_path_buf();
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(ClientError::io(&dir, e)),
        }
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ClientError::io(&dir, e))?;

        let archive = self.shared.state.fetch(&url).await?;
        let target = dir.clone();
        tokio::task::spawn_blocking(move || extract_archive(&archive, &target))
            .await
            .map_err(|e| ClientError::io(&dir, io::Error::other(e)))??;

        info!(target: "singtown.core.client", dir = %dir.display(), "trained file extracted");
        Ok(true)
    }

    /// Store the image behind `url` in `folder` under its URL file name.
    ///
    /// An existing file of that name is kept and no request is made.
    pub async fn download_image(
        &self,
        url: &str,
        folder: impl AsRef<Path>,
    ) -> Result<PathBuf, ClientError> {
        let name = url_file_name(url);
        if name.is_empty() {
            return Err(ClientError::InvalidUrl(url.to_string()));
        }
        let folder = folder.as_ref();
        let dest = folder.join(name);

        let exists = tokio::fs::try_exists(&dest)
            .await
            .map_err(|e| ClientError::io(&dest, e))?;
        if exists {
            return Ok(dest);
        }

        tokio::fs::create_dir_all(folder)
            .await
            .map_err(|e| ClientError::io(folder, e))?;
        let content = self.shared.state.fetch(url).await?;
        tokio::fs::write(&dest, content)
            .await
            .map_err(|e| ClientError::io(&dest, e))?;
        Ok(dest)
    }
}

/// Stage `bytes` in a temporary file and unpack it into `dir`.
///
/// The temporary file is removed when this returns, whatever the outcome.
fn extract_archive(bytes: &[u8], dir: &Path) -> Result<(), ClientError> {
    let tmp_dir = std::env::temp_dir();
    let mut staged = tempfile::NamedTempFile::new().map_err(|e| ClientError::io(&tmp_dir, e))?;
    let staged_path = staged.path().to_path_buf();

    staged
        .write_all(bytes)
        .map_err(|e| ClientError::io(&staged_path, e))?;
    staged
        .as_file_mut()
        .seek(SeekFrom::Start(0))
        .map_err(|e| ClientError::io(&staged_path, e))?;

    let mut archive = zip::ZipArchive::new(staged.as_file())?;
    archive.extract(dir)?;
    Ok(())
}
