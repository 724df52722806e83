//! Build configuration for the ISO step.
//!
//! The surrounding build system supplies a product name and version (used for
//! the ISO volume label) and the location of the board's boot assets. Both come
//! from a small TOML file; [`BuildEnv`] is the resolved runtime view handed to
//! [`crate::build_iso`].

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the GRUB BIOS (i386-pc) module directory.
pub const DEFAULT_GRUB_BIOS_DIR: &str = "/usr/lib/grub/i386-pc";

/// GRUB menu configuration staged into `boot/grub/` for the primary backend.
pub const GRUB_CFG: &str = "grub.cfg";

/// GRUB legacy boot menu staged into `boot/grub/` for the fallback backend.
pub const MENU_LST: &str = "menu.lst";

/// El-Torito boot-catalog stage file staged into the ISO root for the
/// fallback backend.
pub const ELTORITO_STAGE: &str = "stage2_eltorito";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IsoToml {
    product: ProductToml,
    boot: BootToml,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProductToml {
    name: String,
    version: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BootToml {
    /// Directory holding the board's boot assets (grub.cfg, menu.lst,
    /// stage2_eltorito).
    board_dir: PathBuf,
    grub_bios_dir: Option<PathBuf>,
}

/// Resolved environment for one ISO build.
#[derive(Debug, Clone)]
pub struct BuildEnv {
    /// Product name, first half of the volume label.
    pub product_name: String,
    /// Product version, second half of the volume label.
    pub version: String,
    /// Directory holding the board's fixed boot assets.
    pub board_dir: PathBuf,
    /// GRUB BIOS module directory passed to grub-mkrescue via `-d`.
    pub grub_bios_dir: PathBuf,
    /// Wall-clock limit for the backend tool. `None` means wait forever.
    pub tool_timeout: Option<Duration>,
    /// Parent directory for staging directories. `None` uses the system
    /// temp dir. Each build still gets its own uniquely named subdirectory.
    pub work_dir: Option<PathBuf>,
    /// Write a `<target>.sha512` sidecar after a successful build.
    pub checksum: bool,
}

impl BuildEnv {
    /// Create an environment with default GRUB module dir, no timeout, system
    /// temp staging, and no checksum sidecar.
    pub fn new(product_name: &str, version: &str, board_dir: &Path) -> Self {
        Self {
            product_name: product_name.to_string(),
            version: version.to_string(),
            board_dir: board_dir.to_path_buf(),
            grub_bios_dir: PathBuf::from(DEFAULT_GRUB_BIOS_DIR),
            tool_timeout: None,
            work_dir: None,
            checksum: false,
        }
    }

    /// Volume label written into the image: `"<product> <version>"`.
    pub fn volume_label(&self) -> String {
        format!("{} {}", self.product_name, self.version)
    }

    /// Path of the board's GRUB menu configuration.
    pub fn grub_cfg(&self) -> PathBuf {
        self.board_dir.join(GRUB_CFG)
    }

    /// Path of the board's GRUB legacy boot menu.
    pub fn menu_lst(&self) -> PathBuf {
        self.board_dir.join(MENU_LST)
    }

    /// Path of the board's El-Torito boot-catalog stage file.
    pub fn eltorito_stage(&self) -> PathBuf {
        self.board_dir.join(ELTORITO_STAGE)
    }
}

/// Load a [`BuildEnv`] from a TOML config file.
///
/// ```toml
/// [product]
/// name = "MyOS"
/// version = "1.0.0"
///
/// [boot]
/// board_dir = "kernel/intel/nuc"
/// grub_bios_dir = "/usr/lib/grub/i386-pc"   # optional
/// ```
///
/// Relative `board_dir` paths are resolved against the config file's parent
/// directory, so the config stays valid regardless of the caller's cwd.
pub fn load_config(path: &Path) -> Result<BuildEnv> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading ISO config '{}'", path.display()))?;
    let parsed: IsoToml = toml::from_str(&raw)
        .with_context(|| format!("parsing ISO config '{}'", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let board_dir = if parsed.boot.board_dir.is_absolute() {
        parsed.boot.board_dir
    } else {
        base.join(parsed.boot.board_dir)
    };

    Ok(BuildEnv {
        product_name: parsed.product.name,
        version: parsed.product.version,
        board_dir,
        grub_bios_dir: parsed
            .boot
            .grub_bios_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_GRUB_BIOS_DIR)),
        tool_timeout: None,
        work_dir: None,
        checksum: false,
    })
}
