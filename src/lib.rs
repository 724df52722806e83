//! Build step that packages kernel boot artifacts into a bootable ISO image.
//!
//! This crate is the ISO step of a larger build pipeline: given an output path
//! and an ordered list of compiled boot artifacts (kernel binary, loader
//! stages), it stages them into a conventional `boot/` layout inside a fresh
//! temporary directory and invokes an external ISO-authoring tool to produce
//! the image. The ISO-9660/El-Torito byte layout is owned entirely by that
//! tool; this crate only orchestrates.
//!
//! Two backends are supported, tried in order:
//!
//! - **grub-mkrescue** (primary) - assembles a GRUB2-based rescue image from
//!   the staging tree.
//! - **mkisofs** (fallback) - legacy ISO mastering with an El-Torito
//!   `stage2_eltorito` boot-catalog stage file.
//!
//! # Example
//!
//! ```rust,ignore
//! use iso_builder::{build_iso, BuildEnv, HostTools};
//! use std::path::{Path, PathBuf};
//!
//! let env = BuildEnv::new("MyOS", "1.0", Path::new("kernel/intel/nuc"));
//! build_iso(
//!     Path::new("build/myos.iso"),
//!     &[PathBuf::from("build/kernel.bin"), PathBuf::from("build/loader.bin")],
//!     &env,
//!     &HostTools,
//! )?;
//! ```
//!
//! Tool detection is injected through the [`ToolLookup`] trait so tests and
//! embedding orchestrators can substitute their own capability sets instead of
//! querying the host `PATH`.

pub mod backend;
pub mod checksum;
pub mod config;
pub mod iso;
pub mod preflight;
pub mod process;
pub mod staging;

pub use backend::{select_backend, Backend};
pub use checksum::write_iso_checksum;
pub use config::{load_config, BuildEnv};
pub use iso::build_iso;
pub use preflight::{FixedTools, HostTools, ToolLookup};
