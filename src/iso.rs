//! The ISO build step.
//!
//! Linear flow, no state carried between invocations:
//!
//! 1. validate the source list
//! 2. select a backend via the injected tool lookup
//! 3. stage sources and backend assets into a fresh temporary directory
//! 4. run the backend tool
//! 5. remove the staging directory (guaranteed on every exit path)

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use crate::backend::select_backend;
use crate::checksum::write_iso_checksum;
use crate::config::BuildEnv;
use crate::preflight::ToolLookup;
use crate::staging::StagingDir;

/// Build a bootable ISO image at `target` from the given boot artifacts.
///
/// Every path in `sources` is copied, in order, into `boot/` inside the image
/// (flattened; filename collisions keep the last copy). The backend tool is
/// chosen through `tools`: grub-mkrescue preferred, mkisofs as fallback,
/// error if neither is installed.
///
/// A non-zero exit from the backend is fatal. The staging directory never
/// outlives the call, whichever way it ends.
pub fn build_iso(
    target: &Path,
    sources: &[PathBuf],
    env: &BuildEnv,
    tools: &dyn ToolLookup,
) -> Result<()> {
    // Build-log line, printed regardless of outcome.
    println!("  ISO  {}", target.display());

    if sources.is_empty() {
        bail!("no source files given for '{}'", target.display());
    }
    for source in sources {
        if !source.is_file() {
            bail!(
                "source file '{}' does not exist or is not a regular file",
                source.display()
            );
        }
    }

    // Fail on a toolless host before creating anything on disk.
    let backend = select_backend(tools)?;

    let staging = StagingDir::new(env.work_dir.as_deref())?;
    staging.stage_sources(sources)?;
    backend.stage_assets(env, &staging)?;
    backend.command(env, &staging, target).run()?;
    staging.close()?;

    if env.checksum {
        write_iso_checksum(target)?;
    }

    Ok(())
}
