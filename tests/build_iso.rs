//! End-to-end tests for the ISO build step, using stub backend executables
//! instead of real grub-mkrescue/mkisofs.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use iso_builder::backend::{GRUB_RESCUE_TOOL, LEGACY_ISO_TOOL};
use iso_builder::{build_iso, BuildEnv, FixedTools};
use tempfile::TempDir;

/// Everything one test run needs: board assets, sources, a staging work dir,
/// and a scratch dir for stub tools and their recordings.
struct Fixture {
    root: TempDir,
    board: PathBuf,
    work: PathBuf,
    sources: Vec<PathBuf>,
    target: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let board = root.path().join("board");
        let work = root.path().join("work");
        let out = root.path().join("out");
        fs::create_dir_all(&board).unwrap();
        fs::create_dir_all(&work).unwrap();
        fs::create_dir_all(&out).unwrap();

        fs::write(board.join("grub.cfg"), "menuentry 'TestOS' {}\n").unwrap();
        fs::write(board.join("menu.lst"), "title TestOS\n").unwrap();
        fs::write(board.join("stage2_eltorito"), "eltorito-stage").unwrap();

        let kernel = root.path().join("kernel.bin");
        let loader = root.path().join("loader.bin");
        fs::write(&kernel, "kernel").unwrap();
        fs::write(&loader, "loader").unwrap();

        Self {
            target: out.join("test.iso"),
            root,
            board,
            work,
            sources: vec![kernel, loader],
        }
    }

    fn env(&self) -> BuildEnv {
        let mut env = BuildEnv::new("TestOS", "1.0", &self.board);
        env.work_dir = Some(self.work.clone());
        env
    }

    /// Install a stub tool that records its argv (one per line), snapshots the
    /// staging tree it was handed, and creates the `-o` output file.
    fn stub_backend(&self, name: &str) -> PathBuf {
        let argv_file = self.argv_file(name);
        let listing_file = self.listing_file(name);
        let script = format!(
            "#!/bin/sh\n\
             printf '%s\\n' \"$@\" > \"{argv}\"\n\
             out=\"\"\n\
             prev=\"\"\n\
             last=\"\"\n\
             for a in \"$@\"; do\n\
             \tif [ \"$prev\" = \"-o\" ]; then out=\"$a\"; fi\n\
             \tprev=\"$a\"\n\
             \tlast=\"$a\"\n\
             done\n\
             ( cd \"$last\" && find . | sort ) > \"{listing}\"\n\
             : > \"$out\"\n",
            argv = argv_file.display(),
            listing = listing_file.display(),
        );
        self.install_stub(name, &script)
    }

    fn install_stub(&self, name: &str, script: &str) -> PathBuf {
        let path = self.root.path().join(name);
        fs::write(&path, script).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn argv_file(&self, name: &str) -> PathBuf {
        self.root.path().join(format!("{name}.argv"))
    }

    fn listing_file(&self, name: &str) -> PathBuf {
        self.root.path().join(format!("{name}.listing"))
    }

    fn recorded_argv(&self, name: &str) -> Vec<String> {
        fs::read_to_string(self.argv_file(name))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn recorded_listing(&self, name: &str) -> Vec<String> {
        fs::read_to_string(self.listing_file(name))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn work_dir_is_empty(&self) -> bool {
        fs::read_dir(&self.work).unwrap().next().is_none()
    }
}

#[test]
fn primary_backend_builds_image_and_cleans_up() {
    let fx = Fixture::new();
    let tools = FixedTools::new().with(GRUB_RESCUE_TOOL, fx.stub_backend(GRUB_RESCUE_TOOL));

    build_iso(&fx.target, &fx.sources, &fx.env(), &tools).unwrap();

    assert!(fx.target.is_file());
    assert!(fx.work_dir_is_empty(), "staging directory left behind");

    let listing = fx.recorded_listing(GRUB_RESCUE_TOOL);
    assert!(listing.contains(&"./boot/kernel.bin".to_string()));
    assert!(listing.contains(&"./boot/loader.bin".to_string()));
    assert!(listing.contains(&"./boot/grub/grub.cfg".to_string()));

    let argv = fx.recorded_argv(GRUB_RESCUE_TOOL);
    assert_eq!(argv[0], "-d");
    assert_eq!(argv[1], "/usr/lib/grub/i386-pc");
    assert_eq!(argv[2], "-o");
    assert_eq!(Path::new(&argv[3]), fx.target);
    assert_eq!(argv[4], "--modules=multiboot iso9660 biosdisk gzio");
    assert!(Path::new(&argv[5]).starts_with(&fx.work));
}

#[test]
fn primary_is_preferred_when_both_tools_exist() {
    let fx = Fixture::new();
    let tools = FixedTools::new()
        .with(GRUB_RESCUE_TOOL, fx.stub_backend(GRUB_RESCUE_TOOL))
        .with(LEGACY_ISO_TOOL, fx.stub_backend(LEGACY_ISO_TOOL));

    build_iso(&fx.target, &fx.sources, &fx.env(), &tools).unwrap();

    assert!(fx.argv_file(GRUB_RESCUE_TOOL).exists());
    assert!(!fx.argv_file(LEGACY_ISO_TOOL).exists());
}

#[test]
fn fallback_backend_gets_eltorito_layout_and_volume_label() {
    let fx = Fixture::new();
    let tools = FixedTools::new().with(LEGACY_ISO_TOOL, fx.stub_backend(LEGACY_ISO_TOOL));

    build_iso(&fx.target, &fx.sources, &fx.env(), &tools).unwrap();

    assert!(fx.target.is_file());
    assert!(fx.work_dir_is_empty());

    let listing = fx.recorded_listing(LEGACY_ISO_TOOL);
    assert!(listing.contains(&"./stage2_eltorito".to_string()));
    assert!(listing.contains(&"./boot/grub/menu.lst".to_string()));
    assert!(listing.contains(&"./boot/kernel.bin".to_string()));

    let argv = fx.recorded_argv(LEGACY_ISO_TOOL);
    let expected_head = [
        "-quiet",
        "-R",
        "-b",
        "stage2_eltorito",
        "-no-emul-boot",
        "-boot-load-size",
        "4",
        "-boot-info-table",
        "-o",
    ];
    assert_eq!(&argv[..expected_head.len()], expected_head);
    assert_eq!(Path::new(&argv[9]), fx.target);
    assert_eq!(argv[10], "-V");
    assert_eq!(argv[11], "TestOS 1.0");
    assert!(Path::new(&argv[12]).starts_with(&fx.work));
}

#[test]
fn no_backend_fails_before_touching_the_filesystem() {
    let fx = Fixture::new();

    let err = build_iso(&fx.target, &fx.sources, &fx.env(), &FixedTools::new()).unwrap_err();

    assert!(err.to_string().contains(GRUB_RESCUE_TOOL));
    assert!(!fx.target.exists());
    assert!(fx.work_dir_is_empty());
}

#[test]
fn missing_source_fails_before_invoking_the_tool() {
    let fx = Fixture::new();
    let tools = FixedTools::new().with(GRUB_RESCUE_TOOL, fx.stub_backend(GRUB_RESCUE_TOOL));

    let mut sources = fx.sources.clone();
    sources.push(fx.root.path().join("does-not-exist.bin"));

    let err = build_iso(&fx.target, &sources, &fx.env(), &tools).unwrap_err();

    assert!(err.to_string().contains("does-not-exist.bin"));
    assert!(!fx.argv_file(GRUB_RESCUE_TOOL).exists(), "tool was invoked");
    assert!(!fx.target.exists());
    assert!(fx.work_dir_is_empty());
}

#[test]
fn empty_source_list_is_rejected() {
    let fx = Fixture::new();
    let tools = FixedTools::new().with(GRUB_RESCUE_TOOL, fx.stub_backend(GRUB_RESCUE_TOOL));

    let err = build_iso(&fx.target, &[], &fx.env(), &tools).unwrap_err();

    assert!(err.to_string().contains("no source files"));
}

#[test]
fn backend_failure_is_fatal_and_still_cleans_up() {
    let fx = Fixture::new();
    let stub = fx.install_stub(GRUB_RESCUE_TOOL, "#!/bin/sh\necho 'bad staging tree' >&2\nexit 3\n");
    let tools = FixedTools::new().with(GRUB_RESCUE_TOOL, stub);

    let err = build_iso(&fx.target, &fx.sources, &fx.env(), &tools).unwrap_err();

    let msg = format!("{err:#}");
    assert!(msg.contains("exit code 3"));
    assert!(msg.contains("bad staging tree"));
    assert!(!fx.target.exists());
    assert!(fx.work_dir_is_empty(), "staging directory left behind");
}

#[test]
fn hung_backend_is_killed_after_timeout() {
    let fx = Fixture::new();
    let stub = fx.install_stub(GRUB_RESCUE_TOOL, "#!/bin/sh\nsleep 10\n");
    let tools = FixedTools::new().with(GRUB_RESCUE_TOOL, stub);

    let mut env = fx.env();
    env.tool_timeout = Some(Duration::from_millis(200));

    let err = build_iso(&fx.target, &fx.sources, &env, &tools).unwrap_err();

    assert!(format!("{err:#}").contains("timed out"));
    assert!(fx.work_dir_is_empty(), "staging directory left behind");
}

#[test]
fn checksum_sidecar_is_written_on_request() {
    let fx = Fixture::new();
    let tools = FixedTools::new().with(GRUB_RESCUE_TOOL, fx.stub_backend(GRUB_RESCUE_TOOL));

    let mut env = fx.env();
    env.checksum = true;

    build_iso(&fx.target, &fx.sources, &env, &tools).unwrap();

    let sidecar = fx.target.with_extension("iso.sha512");
    let contents = fs::read_to_string(&sidecar).unwrap();
    assert!(contents.ends_with("  test.iso\n"));
}
