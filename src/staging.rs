//! Ephemeral staging directory for ISO contents.
//!
//! Each build stages its inputs into a uniquely named temporary directory laid
//! out the way the final image expects them:
//!
//! ```text
//! <staging>/
//!   boot/            kernel and loader artifacts, flattened
//!   boot/grub/       GRUB configuration
//!   stage2_eltorito  (fallback backend only)
//! ```
//!
//! The directory is removed when the [`StagingDir`] is dropped, so every exit
//! path of the build step - success, copy failure, tool failure, timeout -
//! leaves nothing behind. Unique naming also keeps parallel builds of
//! different targets from colliding.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Staging directory with the `boot/grub` layout, removed on drop.
pub struct StagingDir {
    dir: TempDir,
}

impl StagingDir {
    /// Create a fresh staging directory containing `boot/grub/`.
    ///
    /// With `work_dir` set the directory is created inside it, otherwise under
    /// the system temp dir.
    pub fn new(work_dir: Option<&Path>) -> Result<Self> {
        let dir = match work_dir {
            Some(parent) => TempDir::with_prefix_in("iso-staging.", parent),
            None => TempDir::with_prefix("iso-staging."),
        }
        .context("creating ISO staging directory")?;

        fs::create_dir_all(dir.path().join("boot/grub"))
            .context("creating boot/grub layout in staging directory")?;

        Ok(Self { dir })
    }

    /// Root of the staging tree, passed to the backend tool as its input.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// The `boot/` directory inside the staging tree.
    pub fn boot_dir(&self) -> PathBuf {
        self.dir.path().join("boot")
    }

    /// The `boot/grub/` directory inside the staging tree.
    pub fn grub_dir(&self) -> PathBuf {
        self.dir.path().join("boot/grub")
    }

    /// Copy every source, in order, flat into `boot/`.
    ///
    /// Source subdirectory structure is discarded; two sources with the same
    /// filename end up as one staged file, last copy wins. That matches the
    /// flat `/boot` namespace inside the image.
    pub fn stage_sources(&self, sources: &[PathBuf]) -> Result<()> {
        for source in sources {
            copy_into(source, &self.boot_dir())?;
        }
        Ok(())
    }

    /// Copy one file into `boot/grub/`.
    pub fn stage_grub_file(&self, source: &Path) -> Result<()> {
        copy_into(source, &self.grub_dir())
    }

    /// Copy one file into the staging root.
    pub fn stage_root_file(&self, source: &Path) -> Result<()> {
        copy_into(source, self.root())
    }

    /// Remove the staging directory now, surfacing any removal error.
    ///
    /// Dropping removes it too, but silently; the build step calls this on
    /// the success path so a cleanup problem is not swallowed.
    pub fn close(self) -> Result<()> {
        self.dir.close().context("removing ISO staging directory")
    }
}

fn copy_into(source: &Path, dest_dir: &Path) -> Result<()> {
    let name = source
        .file_name()
        .with_context(|| format!("source path '{}' has no file name", source.display()))?;
    fs::copy(source, dest_dir.join(name))
        .with_context(|| format!("copying '{}' into staging directory", source.display()))?;
    Ok(())
}
