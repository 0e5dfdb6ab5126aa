#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::assert::Assert;
use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// An isolated home for one test: scan directory, creation directory, and
/// log file all live under a private temp dir.
pub struct Sandbox {
    pub temp: TempDir,
}

impl Sandbox {
    pub fn new(prefix: &str) -> Self {
        let temp = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .expect("tempdir");
        fs::create_dir_all(temp.path().join("envs")).expect("envs dir");
        fs::create_dir_all(temp.path().join("home")).expect("home dir");
        Self { temp }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn env_dir(&self) -> PathBuf {
        self.root().join("envs")
    }

    pub fn create_dir(&self) -> PathBuf {
        self.root().join("home")
    }

    pub fn log_path(&self) -> PathBuf {
        self.root().join("venv_log.json")
    }

    pub fn venvkit(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("venvkit");
        cmd.current_dir(self.root())
            .env("VENVKIT_LOG", self.log_path())
            .env("VENVKIT_ENV_DIR", self.env_dir())
            .env("VENVKIT_CREATE_DIR", self.create_dir())
            .env("HOME", self.create_dir())
            .env("NO_COLOR", "1")
            .env_remove("VENVKIT_PYTHON")
            .env_remove("VENVKIT_TERMINAL")
            .env_remove("COMPLETE");
        cmd
    }

    pub fn write_log(&self, contents: &str) {
        fs::write(self.log_path(), contents).expect("write log");
    }

    pub fn read_log(&self) -> Value {
        let raw = fs::read_to_string(self.log_path()).expect("read log");
        serde_json::from_str(&raw).expect("log json")
    }
}

/// Lays out the files `venv` would leave behind: an activation script, a
/// `pyvenv.cfg`, and (optionally) an interpreter stand-in.
pub fn make_env(path: &Path) {
    fs::create_dir_all(path.join("bin")).expect("bin dir");
    fs::write(path.join("bin").join("activate"), "# activate\n").expect("activate");
    fs::write(path.join("pyvenv.cfg"), "home = /usr/bin\n").expect("pyvenv.cfg");
}

pub fn write_script(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("script dir");
    }
    fs::write(path, format!("#!/bin/sh\n{body}")).expect("script");
    make_executable(path);
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("chmod");
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}

pub fn parse_json(assert: &Assert) -> Value {
    serde_json::from_slice(&assert.get_output().stdout).expect("json output")
}

pub fn stdout_text(assert: &Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout")
}

pub fn stderr_text(assert: &Assert) -> String {
    String::from_utf8(assert.get_output().stderr.clone()).expect("utf8 stderr")
}
