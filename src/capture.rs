use crate::error::{Error, Result};
use crate::process::ManagedChild;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub const CAPTURE_TOOL: &str = "airodump-ng";

/// airodump-ng writing CSV snapshots of what it hears to `<dir>/<prefix>-NN.csv`.
pub struct CaptureProcess {
    child: ManagedChild,
}

impl CaptureProcess {
    pub fn start(interface: &str, dir: &Path, prefix: &str) -> Result<Self> {
        Self::launch(CAPTURE_TOOL, interface, dir, prefix)
    }

    fn launch(tool: &'static str, interface: &str, dir: &Path, prefix: &str) -> Result<Self> {
        let args = capture_args(interface, dir, prefix);
        let child = ManagedChild::spawn(tool, &args, true)
            .map_err(|source| Error::Spawn { tool, source })?;
        Ok(CaptureProcess { child })
    }

    pub async fn stop(self, grace: Duration) {
        self.child.shutdown(grace).await;
    }
}

pub fn capture_args(interface: &str, dir: &Path, prefix: &str) -> Vec<String> {
    vec![
        "-w".to_string(),
        dir.join(prefix).to_string_lossy().into_owned(),
        "--write-interval".to_string(),
        "1".to_string(),
        "--output-format".to_string(),
        "csv".to_string(),
        interface.to_string(),
    ]
}

fn is_capture_file(name: &str, prefix: &str) -> bool {
    name.starts_with(prefix) && name.ends_with(".csv")
}

/// Most recently modified capture file in `dir`; on equal times the name
/// that sorts last wins, so `file-02.csv` beats `file-01.csv`.
pub fn latest_capture_file(dir: &Path, prefix: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;

    let mut latest: Option<(SystemTime, String, PathBuf)> = None;
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_capture_file(&name, prefix) {
            continue;
        }
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => continue,
        };
        let newer = match &latest {
            Some((time, best, _)) => (modified, &name) > (*time, best),
            None => true,
        };
        if newer {
            latest = Some((modified, name, entry.path()));
        }
    }

    latest.map(|(_, _, path)| path)
}
