//! Applying unified diffs with the system `patch` utility.

use std::env;
use std::ffi::{OsStr, OsString};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{self, Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use log::{debug, error};

use crate::error::{ChartError, PatchFailure};
use crate::patch::{DEFAULT_STRIP, PATCH_PROGRAM};

/// How to invoke the external patch tool.
///
/// The default runs `patch -E -p1` found on `$PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchTool {
    /// Program name (looked up on the search path) or a path to it
    pub program: OsString,
    /// Leading path components stripped from patch file names (`-pN`)
    pub strip: u32,
    /// Remove files left empty by the patch (`-E`)
    pub remove_empty_files: bool,
    /// Directories to search instead of `$PATH`
    pub search_path: Option<OsString>,
}

impl Default for PatchTool {
    fn default() -> Self {
        PatchTool {
            program: PATCH_PROGRAM.into(),
            strip: DEFAULT_STRIP,
            remove_empty_files: true,
            search_path: None,
        }
    }
}

impl PatchTool {
    pub fn new(program: impl Into<OsString>) -> Self {
        PatchTool {
            program: program.into(),
            ..PatchTool::default()
        }
    }

    pub fn with_strip(mut self, strip: u32) -> Self {
        self.strip = strip;
        self
    }

    pub fn with_remove_empty_files(mut self, remove: bool) -> Self {
        self.remove_empty_files = remove;
        self
    }

    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// Command-line arguments passed to the tool.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.remove_empty_files {
            args.push("-E".to_string());
        }
        args.push(format!("-p{}", self.strip));
        args
    }

    /// Locate the executable.
    ///
    /// The returned path is absolute, so it stays valid once the tool runs
    /// with a different working directory.
    pub fn resolve(&self) -> Result<PathBuf, ChartError> {
        let program = Path::new(&self.program);
        let unavailable = || ChartError::PatchToolUnavailable {
            program: self.program.to_string_lossy().into_owned(),
        };

        // Anything with a directory component is used as given
        if program.components().count() > 1 {
            return if is_executable(program) {
                path::absolute(program).map_err(|_| unavailable())
            } else {
                Err(unavailable())
            };
        }

        let search_path = self
            .search_path
            .clone()
            .or_else(|| env::var_os("PATH"))
            .unwrap_or_default();
        env::split_paths(&search_path)
            .map(|dir| dir.join(with_exe_suffix(&self.program)))
            .find(|candidate| is_executable(candidate))
            .and_then(|candidate| path::absolute(candidate).ok())
            .ok_or_else(unavailable)
    }

    /// Apply `patch_file` to the files under `dest_dir`.
    ///
    /// The tool runs with `dest_dir` as its working directory and the patch
    /// on stdin. Its output is logged; a non-zero exit becomes
    /// [`ChartError::PatchApplication`].
    pub fn apply(&self, patch_file: &Path, dest_dir: &Path) -> Result<(), ChartError> {
        let program = self.resolve()?;

        let patch = File::open(patch_file).map_err(|e| ChartError::PatchFileOpen {
            path: patch_file.to_path_buf(),
            source: e,
        })?;

        let (status, captured) = run_combined(&program, &self.args(), dest_dir, patch)
            .map_err(|e| ChartError::PatchApplication(PatchFailure::Spawn(e)))?;

        if !status.success() {
            error!(
                "applying {} in {} failed:\n{}",
                patch_file.display(),
                dest_dir.display(),
                captured
            );
            return Err(ChartError::PatchApplication(PatchFailure::Exit(status)));
        }

        debug!("applied {}:\n{}", patch_file.display(), captured);
        Ok(())
    }
}

/// Apply `patch_file` in `dest_dir` using the default [`PatchTool`].
pub fn apply_patch(patch_file: &Path, dest_dir: &Path) -> Result<(), ChartError> {
    PatchTool::default().apply(patch_file, dest_dir)
}

/// Run the tool with stdout and stderr sharing one pipe, so the captured
/// output keeps the order the tool wrote it in.
fn run_combined(
    program: &Path,
    args: &[String],
    dest_dir: &Path,
    patch: File,
) -> io::Result<(ExitStatus, String)> {
    let (mut reader, writer) = io::pipe()?;

    // The command holds write ends of the pipe; drop it once spawned so the
    // read below sees EOF when the child exits.
    let mut child = {
        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(dest_dir)
            .stdin(Stdio::from(patch))
            .stdout(writer.try_clone()?)
            .stderr(writer);
        command.spawn()?
    };

    let mut captured = Vec::new();
    let read = reader.read_to_end(&mut captured);
    let status = child.wait()?;
    read?;

    Ok((status, String::from_utf8_lossy(&captured).into_owned()))
}

fn with_exe_suffix(program: &OsStr) -> OsString {
    let mut name = program.to_os_string();
    if !env::consts::EXE_SUFFIX.is_empty() && Path::new(program).extension().is_none() {
        name.push(env::consts::EXE_SUFFIX);
    }
    name
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}
