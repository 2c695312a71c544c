use crate::attack::AttackConfig;
use crate::scan::ScanConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "wifi-deauth")]
#[command(version)]
#[command(about = "Scan nearby WiFi networks and run a deauthentication test against one of them", long_about = None)]
pub struct Args {
    /// Wireless interface to use (prompted for when omitted)
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Directory airodump-ng writes its capture files into
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Capture file prefix
    #[arg(long, default_value = "file")]
    pub prefix: String,

    /// Seconds between scan refreshes
    #[arg(long, default_value_t = 2)]
    pub scan_interval: u64,

    /// Seconds between deauth bursts
    #[arg(long, default_value_t = 2)]
    pub attack_interval: u64,

    /// Deauth frames per burst, 0 sends continuously
    #[arg(long, default_value_t = 0)]
    pub deauth_count: u32,

    /// Seconds a stopped tool gets to exit before it is killed
    #[arg(long, default_value_t = 3)]
    pub grace: u64,

    /// Leave capture files from earlier runs in place
    #[arg(long)]
    pub no_backup: bool,

    /// Plain output without colours
    #[arg(long)]
    pub no_color: bool,

    /// Write the final scan results to this JSON file
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Skip the authorization confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl Args {
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            dir: self.dir.clone(),
            prefix: self.prefix.clone(),
            interval: Duration::from_secs(self.scan_interval),
            grace: Duration::from_secs(self.grace),
        }
    }

    pub fn attack_config(&self) -> AttackConfig {
        AttackConfig {
            interval: Duration::from_secs(self.attack_interval),
            deauth_count: self.deauth_count,
            grace: Duration::from_secs(self.grace),
        }
    }
}
