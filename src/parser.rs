use csv::{ReaderBuilder, Trim};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

/// First column of the access point table header.
const AP_HEADER: &str = "BSSID";

/// First column of the station table, which follows the access points.
const STATION_MARKER: &str = "Station MAC";

pub const HIDDEN_ESSID: &str = "<hidden>";

/// One row of the access point section of an airodump-ng CSV file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccessPointRecord {
    pub bssid: String,
    pub first_seen: String,
    pub last_seen: String,
    pub channel: String,
    pub speed: String,
    pub privacy: String,
    pub cipher: String,
    pub authentication: String,
    pub power: String,
    pub beacons: String,
    pub iv: String,
    pub lan_ip: String,
    pub id_length: String,
    pub essid: String,
    pub key: String,
}

impl AccessPointRecord {
    fn from_fields<'a>(mut fields: impl Iterator<Item = &'a str>) -> Self {
        let mut next = || fields.next().map(clean_field).unwrap_or_default();
        AccessPointRecord {
            bssid: next(),
            first_seen: next(),
            last_seen: next(),
            channel: next(),
            speed: next(),
            privacy: next(),
            cipher: next(),
            authentication: next(),
            power: next(),
            beacons: next(),
            iv: next(),
            lan_ip: next(),
            id_length: next(),
            essid: next(),
            key: next(),
        }
    }

    /// ESSID as shown to the operator; hidden networks get a placeholder.
    pub fn display_name(&self) -> &str {
        if self.essid.is_empty() {
            HIDDEN_ESSID
        } else {
            &self.essid
        }
    }

    pub fn channel_number(&self) -> Option<u32> {
        self.channel.parse().ok()
    }
}

// airodump-ng pads hidden names with NUL bytes
fn clean_field(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_string()
}

/// Reads every access point row of a capture file.
///
/// The header row is skipped wherever it appears and reading stops at the
/// station table marker, so client rows never come back as access points.
pub fn read_records(path: &Path) -> io::Result<Vec<AccessPointRecord>> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let record = AccessPointRecord::from_fields(row.iter());

        if record.bssid == AP_HEADER {
            continue;
        }
        if record.bssid == STATION_MARKER {
            break;
        }
        if record.bssid.is_empty() {
            continue;
        }
        records.push(record);
    }

    Ok(records)
}

/// Like [`read_records`], but a missing or half-written file is just "no data".
pub fn parse(path: &Path) -> Vec<AccessPointRecord> {
    match read_records(path) {
        Ok(records) => records,
        Err(e) => {
            log::debug!("Ignoring unreadable capture file {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Keeps the first record seen for each BSSID, in file order.
pub fn dedup(records: Vec<AccessPointRecord>) -> Vec<AccessPointRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.bssid.clone()))
        .collect()
}
