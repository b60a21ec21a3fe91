use async_trait::async_trait;
use log::debug;
use std::io;
use std::path::Path;

/// Persists text artifacts. Parent directories are created as needed and existing files are replaced.
#[async_trait]
pub trait FileWriter: Send + Sync {
    async fn write(&self, path: &Path, content: &str) -> io::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileWriter;

#[async_trait]
impl FileWriter for LocalFileWriter {
    async fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await?;
        debug!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(())
    }
}
