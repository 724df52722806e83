//! ISO-authoring backends.
//!
//! The step never writes ISO-9660/El-Torito structures itself; it picks
//! whichever supported external tool the host has and hands it the staging
//! tree. Selection is deterministic: grub-mkrescue when present, mkisofs as
//! the legacy fallback, otherwise the build fails before touching the
//! filesystem.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use crate::config::{BuildEnv, ELTORITO_STAGE};
use crate::preflight::ToolLookup;
use crate::process::Cmd;
use crate::staging::StagingDir;

/// Primary backend: GRUB2 rescue-image tool.
pub const GRUB_RESCUE_TOOL: &str = "grub-mkrescue";

/// Fallback backend: legacy ISO-mastering tool.
pub const LEGACY_ISO_TOOL: &str = "mkisofs";

/// BIOS module list passed to grub-mkrescue. Kept to the minimum needed to
/// load a multiboot kernel from the ISO.
pub const GRUB_MODULES: &str = "multiboot iso9660 biosdisk gzio";

/// A detected ISO-authoring backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// grub-mkrescue at the given executable path.
    GrubRescue(PathBuf),
    /// mkisofs at the given executable path.
    Mkisofs(PathBuf),
}

/// Pick a backend - first match wins, grub-mkrescue before mkisofs.
pub fn select_backend(tools: &dyn ToolLookup) -> Result<Backend> {
    if let Some(tool) = tools.find(GRUB_RESCUE_TOOL) {
        return Ok(Backend::GrubRescue(tool));
    }
    if let Some(tool) = tools.find(LEGACY_ISO_TOOL) {
        return Ok(Backend::Mkisofs(tool));
    }
    bail!(
        "no ISO authoring tool found; install '{}' (grub2 tools) or '{}' (cdrtools)",
        GRUB_RESCUE_TOOL,
        LEGACY_ISO_TOOL
    );
}

impl Backend {
    /// Tool name, for log and error messages.
    pub fn tool_name(&self) -> &'static str {
        match self {
            Backend::GrubRescue(_) => GRUB_RESCUE_TOOL,
            Backend::Mkisofs(_) => LEGACY_ISO_TOOL,
        }
    }

    fn tool_path(&self) -> &Path {
        match self {
            Backend::GrubRescue(path) | Backend::Mkisofs(path) => path,
        }
    }

    /// Copy this backend's board assets into the staging tree.
    ///
    /// grub-mkrescue wants `boot/grub/grub.cfg`; mkisofs wants the legacy
    /// `boot/grub/menu.lst` plus the El-Torito stage file at the ISO root.
    pub fn stage_assets(&self, env: &BuildEnv, staging: &StagingDir) -> Result<()> {
        match self {
            Backend::GrubRescue(_) => staging.stage_grub_file(&env.grub_cfg()),
            Backend::Mkisofs(_) => {
                staging.stage_grub_file(&env.menu_lst())?;
                staging.stage_root_file(&env.eltorito_stage())
            }
        }
    }

    /// Argument list for the backend invocation.
    pub fn argv(&self, env: &BuildEnv, staging_root: &Path, target: &Path) -> Vec<String> {
        match self {
            Backend::GrubRescue(_) => vec![
                "-d".into(),
                env.grub_bios_dir.to_string_lossy().into_owned(),
                "-o".into(),
                target.to_string_lossy().into_owned(),
                format!("--modules={}", GRUB_MODULES),
                staging_root.to_string_lossy().into_owned(),
            ],
            Backend::Mkisofs(_) => vec![
                "-quiet".into(),
                "-R".into(),
                "-b".into(),
                ELTORITO_STAGE.into(),
                "-no-emul-boot".into(),
                "-boot-load-size".into(),
                "4".into(),
                "-boot-info-table".into(),
                "-o".into(),
                target.to_string_lossy().into_owned(),
                "-V".into(),
                env.volume_label(),
                staging_root.to_string_lossy().into_owned(),
            ],
        }
    }

    /// Build the ready-to-run command for this backend.
    pub fn command(&self, env: &BuildEnv, staging: &StagingDir, target: &Path) -> Cmd {
        let mut cmd = Cmd::new(self.tool_path().to_string_lossy())
            .args(self.argv(env, staging.root(), target))
            .error_msg(format!(
                "{} failed to generate '{}'",
                self.tool_name(),
                target.display()
            ));
        if let Some(limit) = env.tool_timeout {
            cmd = cmd.timeout(limit);
        }
        cmd
    }
}
