//! End-to-end launch tests.
//!
//! These need root and a statically linked busybox (taken from
//! `CORRAL_TEST_BUSYBOX`, default `/bin/busybox`). They are ignored by
//! default; run them with `sudo -E cargo test -- --ignored`.
//!
//! The container writes its observations into files under `/`, which land
//! in the container's `cow_rw` upper directory on the host.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic, clippy::print_stderr)]

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use corral_common::config::RuntimeConfig;
use corral_common::error::{CorralError, FailureKind};
use corral_common::types::{ContainerDirectories, ContainerId, ContainerInitParams, ImageReference};
use corral_runtime::Launcher;

const APPLETS: &[&str] = &["sh", "echo", "cat", "ls", "head", "pwd", "hostname", "sleep"];

struct Sandbox {
    _dir: tempfile::TempDir,
    config: RuntimeConfig,
}

impl Sandbox {
    /// Stages a busybox image as `library/busybox:latest`.
    fn new() -> Option<Self> {
        let busybox = std::env::var_os("CORRAL_TEST_BUSYBOX")
            .map_or_else(|| PathBuf::from("/bin/busybox"), PathBuf::from);
        if !busybox.is_file() {
            eprintln!("skipping: no busybox at {}", busybox.display());
            return None;
        }

        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig::with_data_dir(dir.path());
        let bin = image().contents_path(&config.image_root).join("bin");
        fs::create_dir_all(&bin).unwrap();
        let _ = fs::copy(&busybox, bin.join("busybox")).unwrap();
        for applet in APPLETS {
            symlink("busybox", bin.join(applet)).unwrap();
        }
        Some(Self { _dir: dir, config })
    }

    fn launcher(&self) -> Launcher {
        Launcher::new(self.config.clone())
    }

    /// Runs `script` with `/bin/sh -c` and returns the container id.
    fn sh(&self, script: &str) -> (ContainerId, i32) {
        let id = ContainerId::generate();
        let params = ContainerInitParams::new(
            image(),
            vec!["/bin/sh".into(), "-c".into(), script.into()],
            id.clone(),
        )
        .unwrap();
        let outcome = self.launcher().launch(&params).unwrap();
        (id, outcome.exit_code())
    }

    fn written(&self, id: &ContainerId, name: &str) -> Vec<u8> {
        let dirs = ContainerDirectories::for_container(&self.config.container_root, id);
        fs::read(dirs.rw_dir.join(name)).unwrap()
    }

    fn written_str(&self, id: &ContainerId, name: &str) -> String {
        String::from_utf8(self.written(id, name)).unwrap()
    }
}

fn image() -> ImageReference {
    "busybox".parse().unwrap()
}

fn host_mounts_under(path: &Path) -> Vec<String> {
    let needle = path.to_string_lossy().into_owned();
    fs::read_to_string("/proc/self/mountinfo")
        .unwrap()
        .lines()
        .filter(|line| line.contains(&needle))
        .map(str::to_owned)
        .collect()
}

#[test]
#[ignore = "requires root"]
fn echo_exits_zero() {
    let Some(sb) = Sandbox::new() else { return };
    let (id, code) = sb.sh("echo hello > /out.txt");
    assert_eq!(code, 0);
    assert_eq!(sb.written_str(&id, "out.txt"), "hello\n");
}

#[test]
#[ignore = "requires root"]
fn command_exit_status_is_propagated() {
    let Some(sb) = Sandbox::new() else { return };
    let (_, code) = sb.sh("exit 42");
    assert_eq!(code, 42);
}

#[test]
#[ignore = "requires root"]
fn root_listing_shows_system_mounts_and_no_old_root() {
    let Some(sb) = Sandbox::new() else { return };
    let (id, code) = sb.sh("ls -a / > /root.txt; ls /dev > /dev.txt");
    assert_eq!(code, 0);

    let root = sb.written_str(&id, "root.txt");
    let entries: Vec<&str> = root.lines().collect();
    for expected in ["proc", "sys", "dev", "bin"] {
        assert!(entries.contains(&expected), "missing /{expected}: {entries:?}");
    }
    assert!(!entries.contains(&"old_root"));

    let dev = sb.written_str(&id, "dev.txt");
    let devices: Vec<&str> = dev.lines().collect();
    for expected in ["null", "zero", "tty", "random", "urandom", "console", "full", "pts"] {
        assert!(devices.contains(&expected), "missing /dev/{expected}: {devices:?}");
    }
}

#[test]
#[ignore = "requires root"]
fn working_directory_is_root() {
    let Some(sb) = Sandbox::new() else { return };
    let (id, code) = sb.sh("pwd > /pwd.txt");
    assert_eq!(code, 0);
    assert_eq!(sb.written_str(&id, "pwd.txt"), "/\n");
}

#[test]
#[ignore = "requires root"]
fn hostname_is_container_id() {
    let Some(sb) = Sandbox::new() else { return };
    let (id, code) = sb.sh("hostname > /hostname.txt");
    assert_eq!(code, 0);
    assert_eq!(sb.written_str(&id, "hostname.txt").trim(), id.as_str());
}

#[test]
#[ignore = "requires root"]
fn command_runs_as_pid_one() {
    let Some(sb) = Sandbox::new() else { return };
    let (id, code) = sb.sh("echo $$ > /pid.txt");
    assert_eq!(code, 0);
    assert_eq!(sb.written_str(&id, "pid.txt").trim(), "1");
}

#[test]
#[ignore = "requires root"]
fn dev_zero_reads_zeros() {
    let Some(sb) = Sandbox::new() else { return };
    let (id, code) = sb.sh("head -c 16 /dev/zero > /zero.bin");
    assert_eq!(code, 0);
    let bytes = sb.written(&id, "zero.bin");
    assert_eq!(bytes.len(), 16);
    assert!(bytes.iter().all(|b| *b == 0));
}

#[test]
#[ignore = "requires root"]
fn dev_null_reads_eof() {
    let Some(sb) = Sandbox::new() else { return };
    let (id, code) = sb.sh("cat /dev/null > /null.out && echo ok > /null.status");
    assert_eq!(code, 0);
    assert!(sb.written(&id, "null.out").is_empty());
    assert_eq!(sb.written_str(&id, "null.status"), "ok\n");
}

#[test]
#[ignore = "requires root"]
fn writes_stay_out_of_the_image() {
    let Some(sb) = Sandbox::new() else { return };
    let (_, code) = sb.sh("echo scratch > /bin/scratch");
    assert_eq!(code, 0);
    let lower = image().contents_path(&sb.config.image_root);
    assert!(!lower.join("bin/scratch").exists());
}

#[test]
#[ignore = "requires root"]
fn concurrent_containers_are_isolated() {
    let Some(sb) = Sandbox::new() else { return };
    // Each container drops a marker, waits for the other to do the same,
    // then lists its own root.
    let script = |marker: &str| {
        format!("echo {marker} > /{marker}; hostname > /name.txt; sleep 1; ls / > /ls.txt")
    };
    let (script_a, script_b) = (script("only-a"), script("only-b"));

    let (a, b) = std::thread::scope(|s| {
        let a = s.spawn(|| sb.sh(&script_a));
        let b = s.spawn(|| sb.sh(&script_b));
        (a.join().unwrap(), b.join().unwrap())
    });
    assert_eq!(a.1, 0);
    assert_eq!(b.1, 0);
    assert_ne!(a.0, b.0);
    assert_eq!(sb.written_str(&a.0, "name.txt").trim(), a.0.as_str());
    assert_eq!(sb.written_str(&b.0, "name.txt").trim(), b.0.as_str());

    let seen_by_a = sb.written_str(&a.0, "ls.txt");
    let seen_by_b = sb.written_str(&b.0, "ls.txt");
    assert!(seen_by_a.lines().any(|l| l == "only-a"), "{seen_by_a}");
    assert!(!seen_by_a.lines().any(|l| l == "only-b"), "{seen_by_a}");
    assert!(seen_by_b.lines().any(|l| l == "only-b"), "{seen_by_b}");
    assert!(!seen_by_b.lines().any(|l| l == "only-a"), "{seen_by_b}");

    let rw = |id: &ContainerId| ContainerDirectories::for_container(&sb.config.container_root, id).rw_dir;
    assert!(rw(&a.0).join("only-a").is_file());
    assert!(!rw(&a.0).join("only-b").exists());
    assert!(rw(&b.0).join("only-b").is_file());
    assert!(!rw(&b.0).join("only-a").exists());
}

#[test]
#[ignore = "requires root"]
fn missing_command_fails_with_127_and_leaves_no_mounts() {
    let Some(sb) = Sandbox::new() else { return };
    let id = ContainerId::generate();
    let params = ContainerInitParams::new(image(), vec!["/bin/does-not-exist".into()], id.clone())
        .unwrap();

    let err = sb.launcher().launch(&params).unwrap_err();
    match &err {
        CorralError::ContainerSetup {
            kind, exit_code, ..
        } => {
            assert_eq!(*kind, FailureKind::Exec);
            assert_eq!(*exit_code, 127);
        }
        other => panic!("unexpected error: {other}"),
    }

    let dirs = ContainerDirectories::for_container(&sb.config.container_root, &id);
    assert!(host_mounts_under(&dirs.root_dir).is_empty());
}

#[test]
#[ignore = "requires root"]
fn missing_image_fails_with_image_not_found() {
    let Some(sb) = Sandbox::new() else { return };
    let params = ContainerInitParams::new(
        "acme/absent:1.0".parse().unwrap(),
        vec!["/bin/sh".into()],
        ContainerId::generate(),
    )
    .unwrap();

    let err = sb.launcher().launch(&params).unwrap_err();
    assert_eq!(err.kind(), Some(FailureKind::ImageNotFound));
    assert_eq!(err.exit_code(), FailureKind::ImageNotFound.exit_code());
}
