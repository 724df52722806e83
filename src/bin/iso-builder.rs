use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use iso_builder::backend::{GRUB_RESCUE_TOOL, LEGACY_ISO_TOOL};
use iso_builder::{build_iso, load_config, HostTools, ToolLookup};

fn usage() -> &'static str {
    "Usage:\n  iso-builder build <iso.toml> <target.iso> <source>... [--checksum] [--timeout=<secs>]\n  iso-builder tools"
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.as_slice() {
        [cmd, config, target, rest @ ..] if cmd == "build" && !rest.is_empty() => {
            build(Path::new(config), Path::new(target), rest)
        }
        [cmd] if cmd == "tools" => report_tools(),
        _ => bail!(usage()),
    }
}

fn build(config: &Path, target: &Path, rest: &[String]) -> Result<()> {
    let mut env = load_config(config)?;
    let mut sources = Vec::new();

    for arg in rest {
        if arg == "--checksum" {
            env.checksum = true;
        } else if let Some(secs) = arg.strip_prefix("--timeout=") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("invalid --timeout value '{}'", secs))?;
            env.tool_timeout = Some(Duration::from_secs(secs));
        } else if arg.starts_with("--") {
            bail!("unknown option '{}'\n{}", arg, usage());
        } else {
            sources.push(PathBuf::from(arg));
        }
    }

    if sources.is_empty() {
        bail!(usage());
    }

    build_iso(target, &sources, &env, &HostTools)
}

fn report_tools() -> Result<()> {
    let mut found_any = false;
    for tool in [GRUB_RESCUE_TOOL, LEGACY_ISO_TOOL] {
        match HostTools.find(tool) {
            Some(path) => {
                println!("  {:14} {}", tool, path.display());
                found_any = true;
            }
            None => println!("  {:14} not found", tool),
        }
    }
    if !found_any {
        bail!("no ISO authoring tool installed");
    }
    Ok(())
}
