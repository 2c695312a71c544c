use chrono::Local;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const BACKUP_DIR: &str = "backup";

fn safe_timestamp() -> String {
    Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Moves every `.csv` left in `dir` by earlier sessions into
/// `dir/backup/<timestamp>-<name>`. Returns the new paths.
pub fn backup_previous_captures(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let backup_dir = dir.join(BACKUP_DIR);
    fs::create_dir_all(&backup_dir)?;

    let stamp = safe_timestamp();
    let mut moved = Vec::new();
    for entry in fs::read_dir(dir)?.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(".csv") || !entry.path().is_file() {
            continue;
        }

        let destination = backup_dir.join(format!("{}-{}", stamp, name));
        match fs::rename(entry.path(), &destination) {
            Ok(()) => moved.push(destination),
            Err(e) => log::warn!("Could not back up {}: {}", name, e),
        }
    }

    Ok(moved)
}
