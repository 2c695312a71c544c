use crate::parser::AccessPointRecord;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::Path;

const ESSID_WIDTH: usize = 32;

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Where operator-facing output goes. Only `info` is required: the other
/// message kinds fall back to it, `clear` and `banner` do nothing.
pub trait Presenter {
    fn clear(&self) {}

    fn banner(&self) {}

    fn info(&self, message: &str);

    fn success(&self, message: &str) {
        self.info(message);
    }

    fn warn(&self, message: &str) {
        self.info(message);
    }

    fn error(&self, message: &str) {
        self.info(message);
    }

    fn table(&self, records: &[AccessPointRecord]) {
        self.info(&render_table(records));
    }
}

/// Plain stdout presenter, optionally with ANSI colours.
pub struct Console {
    color: bool,
}

impl Console {
    pub fn new(color: bool) -> Self {
        Console { color }
    }

    fn paint(&self, color: &str, message: &str) -> String {
        if self.color {
            format!("{}{}{}", color, message, RESET)
        } else {
            message.to_string()
        }
    }
}

impl Presenter for Console {
    fn clear(&self) {
        print!("\x1b[2J\x1b[1;1H");
        let _ = io::stdout().flush();
    }

    fn banner(&self) {
        println!("{}", self.paint(RED, "=== WiFi Scanner + Deauth ==="));
    }

    fn info(&self, message: &str) {
        println!("{}", message);
    }

    fn success(&self, message: &str) {
        println!("{}", self.paint(GREEN, &format!("[+] {}", message)));
    }

    fn warn(&self, message: &str) {
        println!("{}", self.paint(YELLOW, &format!("[*] {}", message)));
    }

    fn error(&self, message: &str) {
        eprintln!("{}", self.paint(RED, &format!("[!] {}", message)));
    }
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

/// Fixed-width access point table, one row per record, indexed from 0.
pub fn render_table(records: &[AccessPointRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<3} {:<20} {:<4} {:<4} {:<8} {:<32}",
        "NO", "BSSID", "CH", "PWR", "ENC", "ESSID"
    );
    let _ = writeln!(out, "{}", "-".repeat(75));
    for (idx, ap) in records.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:<3} {:<20} {:<4} {:<4} {:<8} {:<32}",
            idx,
            ap.bssid,
            ap.channel,
            ap.power,
            ap.privacy,
            truncate(ap.display_name(), ESSID_WIDTH)
        );
    }
    out
}

/// Writes the access points to `path` as pretty JSON.
pub fn export_snapshot(path: &Path, records: &[AccessPointRecord]) -> crate::error::Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(io::BufWriter::new(file), records)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(bssid: &str, essid: &str) -> AccessPointRecord {
        AccessPointRecord {
            bssid: bssid.to_string(),
            channel: "6".to_string(),
            power: "-40".to_string(),
            privacy: "WPA2".to_string(),
            essid: essid.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_render_table_rows() {
        let table = render_table(&[
            record("AA:BB:CC:DD:EE:01", "HomeNet"),
            record("AA:BB:CC:DD:EE:02", ""),
        ]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("NO  BSSID"));
        assert!(lines[2].starts_with("0   AA:BB:CC:DD:EE:01    6    -40  WPA2     HomeNet"));
        assert!(lines[3].contains("<hidden>"));
    }

    #[test]
    fn test_long_names_truncated() {
        let long = "x".repeat(50);
        let table = render_table(&[record("AA:BB:CC:DD:EE:01", &long)]);
        let row = table.lines().nth(2).unwrap();

        assert!(row.contains(&"x".repeat(32)));
        assert!(!row.contains(&"x".repeat(33)));
    }

    #[test]
    fn test_plain_console_has_no_escapes() {
        let console = Console::new(false);
        assert_eq!(console.paint(RED, "hi"), "hi");
        assert_eq!(Console::new(true).paint(RED, "hi"), "\x1b[31mhi\x1b[0m");
    }

    #[test]
    fn test_export_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        export_snapshot(&path, &[record("AA:BB:CC:DD:EE:01", "HomeNet")]).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["bssid"], "AA:BB:CC:DD:EE:01");
        assert_eq!(value[0]["essid"], "HomeNet");
    }
}
