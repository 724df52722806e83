//! SHA-512 sidecar for produced images.

use anyhow::{Context, Result};
use sha2::{Digest, Sha512};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Write `<iso>.sha512` next to the image, in `sha512sum -c` format.
///
/// The sidecar references just the filename (not the full path) so users can
/// verify with `cd output && sha512sum -c os.iso.sha512`.
pub fn write_iso_checksum(iso_path: &Path) -> Result<PathBuf> {
    let mut file = fs::File::open(iso_path)
        .with_context(|| format!("opening '{}' for checksumming", iso_path.display()))?;

    let mut hasher = Sha512::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("reading '{}' for checksumming", iso_path.display()))?;
    let hash = hex_string(&hasher.finalize());

    let filename = iso_path
        .file_name()
        .context("ISO path has no file name")?
        .to_string_lossy();

    // Standard format: "<hash>  <filename>" (two spaces)
    let mut sidecar = iso_path.as_os_str().to_owned();
    sidecar.push(".sha512");
    let sidecar = PathBuf::from(sidecar);
    fs::write(&sidecar, format!("{}  {}\n", hash, filename))
        .with_context(|| format!("writing checksum file '{}'", sidecar.display()))?;

    println!("  SHA512: {}...{}", &hash[..8], &hash[hash.len() - 8..]);

    Ok(sidecar)
}

fn hex_string(digest: &[u8]) -> String {
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
