//! dcmqi `tid1500reader` invocation
//!
//! The converter is a black box: it gets `--inputDICOM <file> --outputMetadata
//! <json>` and must leave a JSON report behind. Its console output goes to
//! files in a scratch directory so a chatty child can never block on a full
//! pipe while we wait for it.

use crate::error::{Dcm2TablesError, Result};
use crate::types::ParserOptions;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::measurements::MeasurementReport;

/// Executable name of the dcmqi SR reader
pub const TID1500_READER: &str = if cfg!(windows) {
    "tid1500reader.exe"
} else {
    "tid1500reader"
};

const OUTPUT_FILE: &str = "measurements.json";
const STDOUT_FILE: &str = "tid1500reader.stdout";
const STDERR_FILE: &str = "tid1500reader.stderr";
const POLL_INTERVAL: Duration = Duration::from_millis(50);
const STDERR_TAIL_LINES: usize = 20;

/// Locates `tid1500reader`
///
/// With a dcmqi directory only that directory is considered, otherwise every
/// `PATH` entry is tried in order.
pub fn find_tid1500_reader(dcmqi_path: Option<&Path>) -> Result<PathBuf> {
    let found = match dcmqi_path {
        Some(dir) => Some(dir.join(TID1500_READER)).filter(|p| is_executable(p)),
        None => std::env::var_os("PATH").and_then(|paths| find_in_path(TID1500_READER, &paths)),
    };

    found.ok_or_else(|| {
        Dcm2TablesError::ExternalToolNotFound(format!(
            "Could not find dcmqi executable {}",
            TID1500_READER
        ))
    })
}

/// First directory of a `PATH`-style list holding an executable `name`
pub fn find_in_path(name: &str, paths: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(paths)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Runs the TID 1500 converter on one file
#[derive(Debug, Clone)]
pub struct Tid1500Converter {
    executable: PathBuf,
    timeout: Option<Duration>,
}

impl Tid1500Converter {
    pub fn new(executable: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            executable: executable.into(),
            timeout,
        }
    }

    /// Finds the executable the options point at
    pub fn locate(options: &ParserOptions) -> Result<Self> {
        let executable = find_tid1500_reader(options.dcmqi_path.as_deref())?;
        Ok(Self::new(executable, options.converter_timeout))
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Converts `input` and reads back the report
    ///
    /// Scratch files live in a fresh directory below `temp_base` that is
    /// removed before returning.
    ///
    /// # Errors
    ///
    /// `ExternalToolExecution` when the converter cannot be started, exits
    /// unsuccessfully, runs past the timeout, or leaves no readable report.
    pub fn convert(&self, input: &Path, temp_base: &Path) -> Result<MeasurementReport> {
        let scratch = tempfile::Builder::new()
            .prefix("dcm2tables-")
            .tempdir_in(temp_base)?;
        let output_json = scratch.path().join(OUTPUT_FILE);
        let stderr_path = scratch.path().join(STDERR_FILE);

        let mut child = Command::new(&self.executable)
            .arg("--inputDICOM")
            .arg(input)
            .arg("--outputMetadata")
            .arg(&output_json)
            .stdin(Stdio::null())
            .stdout(File::create(scratch.path().join(STDOUT_FILE))?)
            .stderr(File::create(&stderr_path)?)
            .spawn()
            .map_err(|e| {
                Dcm2TablesError::ExternalToolExecution(format!(
                    "failed to start {}: {}",
                    self.executable.display(),
                    e
                ))
            })?;

        let status = match wait_with_timeout(&mut child, self.timeout)? {
            Some(status) => status,
            None => {
                return Err(Dcm2TablesError::ExternalToolExecution(format!(
                    "{} timed out after {:?}{}",
                    self.executable.display(),
                    self.timeout.unwrap_or_default(),
                    stderr_tail(&stderr_path)
                )))
            }
        };

        if !status.success() {
            return Err(Dcm2TablesError::ExternalToolExecution(format!(
                "{} failed with {}{}",
                self.executable.display(),
                status,
                stderr_tail(&stderr_path)
            )));
        }

        if !output_json.is_file() {
            return Err(Dcm2TablesError::ExternalToolExecution(format!(
                "{} produced no output{}",
                self.executable.display(),
                stderr_tail(&stderr_path)
            )));
        }

        MeasurementReport::from_path(&output_json).map_err(|e| {
            Dcm2TablesError::ExternalToolExecution(format!("malformed converter output: {}", e))
        })
    }
}

/// Waits for the child, killing it once the timeout expires
///
/// Returns `None` when the child had to be killed. A killed child is always
/// reaped. A timeout too large to express as a deadline waits indefinitely.
fn wait_with_timeout(child: &mut Child, timeout: Option<Duration>) -> Result<Option<ExitStatus>> {
    let Some(deadline) = timeout.and_then(|timeout| Instant::now().checked_add(timeout)) else {
        return Ok(Some(child.wait()?));
    };

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            // fails only if the child exited in the meantime
            child.kill().ok();
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

/// Last lines of the captured stderr, formatted as an error message suffix
fn stderr_tail(path: &Path) -> String {
    let Ok(bytes) = fs::read(path) else {
        return String::new();
    };
    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return String::new();
    }
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    format!(": {}", lines[start..].join("\n"))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    const REPORT: &str = r#"{"Measurements":[{
        "TrackingIdentifier":"t1",
        "measurementItems":[{"value":"5.2"}],
        "qualitativeEvaluations":[]
    }]}"#;

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn output_arg_then(body: &str) -> String {
        format!(
            r#"while [ "$#" -gt 0 ]; do
  if [ "$1" = "--outputMetadata" ]; then out="$2"; fi
  shift
done
{}"#,
            body
        )
    }

    fn converter(script: &str, timeout: Option<Duration>) -> (TempDir, Tid1500Converter) {
        let dir = TempDir::new().unwrap();
        let exe = write_script(dir.path(), TID1500_READER, script);
        (dir, Tid1500Converter::new(exe, timeout))
    }

    fn run(converter: &Tid1500Converter) -> (TempDir, Result<MeasurementReport>) {
        let scratch = TempDir::new().unwrap();
        let result = converter.convert(Path::new("/data/sr.dcm"), scratch.path());
        (scratch, result)
    }

    fn execution_error(result: Result<MeasurementReport>) -> String {
        match result {
            Err(Dcm2TablesError::ExternalToolExecution(message)) => message,
            other => panic!("expected ExternalToolExecution, got {:?}", other),
        }
    }

    #[test]
    fn test_convert_success_cleans_scratch() {
        let script = output_arg_then(&format!("echo '{}' > \"$out\"", REPORT));
        let (_dir, converter) = converter(&script, Some(Duration::from_secs(30)));

        let (scratch, result) = run(&converter);
        let report = result.unwrap();

        assert_eq!(report.measurements.len(), 1);
        assert_eq!(report.measurements[0].measurement_items.len(), 1);
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_convert_passes_input_path() {
        let script = format!(
            "[ \"$1\" = --inputDICOM ] && [ \"$2\" = /data/sr.dcm ] || exit 9\n{}",
            output_arg_then(r#"echo '{"Measurements":[]}' > "$out""#)
        );
        let (_dir, converter) = converter(&script, None);
        let (_scratch, result) = run(&converter);
        assert!(result.unwrap().measurements.is_empty());
    }

    #[test]
    fn test_convert_nonzero_exit_reports_stderr() {
        let (_dir, converter) = converter("echo 'cannot parse SR' >&2\nexit 3", None);
        let message = execution_error(run(&converter).1);
        assert!(message.contains("cannot parse SR"), "{}", message);
    }

    #[test]
    fn test_convert_without_output() {
        let (_dir, converter) = converter("exit 0", None);
        let message = execution_error(run(&converter).1);
        assert!(message.contains("produced no output"), "{}", message);
    }

    #[test]
    fn test_convert_malformed_output() {
        let script = output_arg_then(r#"echo 'not json' > "$out""#);
        let (_dir, converter) = converter(&script, None);
        let message = execution_error(run(&converter).1);
        assert!(
            message.starts_with("malformed converter output"),
            "{}",
            message
        );
    }

    #[test]
    fn test_convert_with_huge_timeout_waits_for_exit() {
        let (_dir, converter) = converter(
            "echo 'bad input' >&2\nexit 3",
            Some(Duration::from_secs(u64::MAX)),
        );
        let message = execution_error(run(&converter).1);
        assert!(message.contains("bad input"), "{}", message);
    }

    #[test]
    fn test_convert_timeout_kills_child() {
        let (_dir, converter) = converter("exec sleep 30", Some(Duration::from_millis(200)));
        let started = Instant::now();
        let message = execution_error(run(&converter).1);
        assert!(message.contains("timed out"), "{}", message);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_find_in_dcmqi_dir() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            find_tid1500_reader(Some(dir.path())),
            Err(Dcm2TablesError::ExternalToolNotFound(_))
        ));

        // present but not executable
        let path = dir.path().join(TID1500_READER);
        fs::write(&path, "#!/bin/sh\n").unwrap();
        assert!(find_tid1500_reader(Some(dir.path())).is_err());

        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(find_tid1500_reader(Some(dir.path())).unwrap(), path);
    }

    #[test]
    fn test_find_in_path_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let third = TempDir::new().unwrap();
        write_script(second.path(), "tool", "exit 0");
        let expected = second.path().join("tool");
        write_script(third.path(), "tool", "exit 0");

        let paths = std::env::join_paths([first.path(), second.path(), third.path()]).unwrap();
        assert_eq!(find_in_path("tool", &paths), Some(expected));
        assert_eq!(find_in_path("other", &paths), None);
    }
}
