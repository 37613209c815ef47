//! Staging of compressed `.dbc` containers.
//!
//! A `.dbc` input is expanded to `<output>.dbf` by an external `dbc2dbf`
//! tool before the table is opened. The staged file is removed when the
//! [`StagedInput`] guard is dropped, whatever the outcome of the run.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use crate::error::ContainerError;

/// Extractors tried, in order, when none is configured.
pub const DEFAULT_EXTRACTORS: [&str; 2] = ["./dbc2dbf", "dbc2dbf"];

/// Whether `path` has a `.dbc` extension (any case).
#[must_use]
pub fn is_container(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("dbc"))
}

/// Path of the staged table for `output`: the output path with `.dbf`
/// appended.
#[must_use]
pub fn staging_path(output: &Path) -> PathBuf {
    let mut name = OsString::from(output.as_os_str());
    name.push(".dbf");
    PathBuf::from(name)
}

/// Input table ready to open.
///
/// Plain tables pass through untouched; extracted containers own their
/// temporary file.
#[derive(Debug)]
pub struct StagedInput {
    path: PathBuf,
    temporary: bool,
}

impl StagedInput {
    /// Path of the table to open.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the table was extracted into a temporary file.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }
}

impl Drop for StagedInput {
    fn drop(&mut self) {
        if !self.temporary {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed staged table"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "cannot remove staged table"),
        }
    }
}

/// Prepares `input` for reading.
///
/// Non-container inputs are returned as-is. A container is extracted to
/// [`staging_path`]`(output)` with `tool`, or with [`DEFAULT_EXTRACTORS`]
/// when no tool is given. If every extractor fails, a sibling `<stem>.DBF`
/// or `<stem>.dbf` is copied instead.
///
/// # Errors
///
/// [`ContainerError::Extract`] when neither extraction nor the sibling copy
/// succeeds.
pub fn stage_input(
    input: &Path,
    output: &Path,
    tool: Option<&Path>,
) -> Result<StagedInput, ContainerError> {
    if !is_container(input) {
        return Ok(StagedInput {
            path: input.to_path_buf(),
            temporary: false,
        });
    }

    // Guard first, so partial output from a failed extractor is cleaned up.
    let staged = StagedInput {
        path: staging_path(output),
        temporary: true,
    };
    info!(input = %input.display(), staged = %staged.path.display(), "extracting .dbc container");

    let extractors: Vec<&Path> = match tool {
        Some(tool) => vec![tool],
        None => DEFAULT_EXTRACTORS.into_iter().map(Path::new).collect(),
    };
    if extractors
        .into_iter()
        .any(|tool| run_extractor(tool, input, &staged.path))
    {
        return Ok(staged);
    }

    for sibling in sibling_tables(input) {
        if !sibling.is_file() {
            continue;
        }
        match fs::copy(&sibling, &staged.path) {
            Ok(_) => {
                info!(sibling = %sibling.display(), "using already extracted sibling table");
                return Ok(staged);
            }
            Err(e) => warn!(sibling = %sibling.display(), error = %e, "cannot copy sibling table"),
        }
    }

    Err(ContainerError::Extract {
        input: input.to_path_buf(),
    })
}

fn run_extractor(tool: &Path, input: &Path, target: &Path) -> bool {
    match Command::new(tool).arg(input).arg(target).output() {
        Ok(out) if out.status.success() => {
            debug!(tool = %tool.display(), "container extracted");
            true
        }
        Ok(out) => {
            debug!(
                tool = %tool.display(),
                status = %out.status,
                stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                "extractor failed"
            );
            false
        }
        Err(e) => {
            debug!(tool = %tool.display(), error = %e, "extractor not runnable");
            false
        }
    }
}

fn sibling_tables(input: &Path) -> [PathBuf; 2] {
    [input.with_extension("DBF"), input.with_extension("dbf")]
}
