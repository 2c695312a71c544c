use lazy_static::lazy_static;
use regex::Regex;
use std::io;
use std::process::{Command, Stdio};

lazy_static! {
    static ref LINK_NAME: Regex = Regex::new(r"(?m)^\d+:\s+([^:@\s]+)[^:]*:\s+<").unwrap();
    static ref IW_DEV_INTERFACE: Regex = Regex::new(r"Interface\s+(\S+)").unwrap();
    static ref IWCONFIG_INTERFACE: Regex =
        Regex::new(r"(?m)^(wlan[0-9]+|wlp[0-9a-zA-Z]+|wlx[0-9a-zA-Z]+)").unwrap();
}

const WIRELESS_PREFIXES: [&str; 5] = ["wl", "wlan", "wlp", "wlx", "mon"];

/// A wireless adapter driven through the aircrack-ng and iw tool family.
pub struct WifiInterface {
    interface_name: String,
}

impl WifiInterface {
    pub fn new(interface_name: &str) -> Self {
        WifiInterface {
            interface_name: interface_name.to_string(),
        }
    }

    /// `airmon-ng start`. A missing tool surfaces as `ErrorKind::NotFound`;
    /// the exit status is not checked because airmon-ng often reports
    /// failure after creating the monitor interface anyway.
    pub fn set_monitor_mode(&self) -> io::Result<()> {
        quiet("airmon-ng", &["start", &self.interface_name]).status()?;
        Ok(())
    }

    pub fn set_managed_mode(&self) -> io::Result<()> {
        self.execute_command_with_check("airmon-ng", &["stop", &self.interface_name])
    }

    pub fn is_monitor_mode(&self) -> bool {
        command_stdout("iw", &["dev", &self.interface_name, "info"])
            .map(|info| info.contains("type monitor"))
            .unwrap_or(false)
    }

    pub fn set_channel(&self, channel: &str) -> io::Result<()> {
        self.execute_command_with_check(
            "iw",
            &["dev", &self.interface_name, "set", "channel", channel],
        )
    }

    pub fn set_channel_legacy(&self, channel: &str) -> io::Result<()> {
        self.execute_command_with_check("iwconfig", &[&self.interface_name, "channel", channel])
    }

    fn execute_command_with_check(&self, cmd: &str, args: &[&str]) -> io::Result<()> {
        let status = quiet(cmd, args).status()?;
        if !status.success() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} {} exited with {}", cmd, args.join(" "), status),
            ));
        }
        Ok(())
    }
}

fn quiet(cmd: &str, args: &[&str]) -> Command {
    let mut command = Command::new(cmd);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    command
}

/// Stdout of a listing tool, or `None` when it is missing or fails to run.
pub fn command_stdout(cmd: &str, args: &[&str]) -> Option<String> {
    match Command::new(cmd).args(args).stderr(Stdio::null()).output() {
        Ok(output) => Some(String::from_utf8_lossy(&output.stdout).into_owned()),
        Err(e) => {
            log::debug!("{} unavailable: {}", cmd, e);
            None
        }
    }
}

/// Output of `ip link show`, empty when `ip` cannot be run.
pub fn link_listing() -> String {
    command_stdout("ip", &["link", "show"]).unwrap_or_default()
}

/// Interface names in an `ip link show` listing, in listing order.
pub fn link_names(listing: &str) -> Vec<String> {
    LINK_NAME
        .captures_iter(listing)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Monitor interface candidates for `base`, most conventional first.
pub fn monitor_candidates(base: &str, listing: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    if !base.is_empty() {
        candidates.push(format!("{}mon", base));
        candidates.push(format!("mon{}", base));
    }
    candidates.extend((0..6).map(|i| format!("mon{}", i)));

    for name in link_names(listing) {
        let related = !base.is_empty() && name.contains(base) && name.contains("mon");
        if (related || name.ends_with("mon")) && !candidates.contains(&name) {
            candidates.push(name);
        }
    }

    candidates
}

/// Picks the monitor interface created for `base` out of a link listing.
/// Falls back to `base` when nothing plausible is present.
pub fn resolve_from_listing(base: &str, listing: &str) -> String {
    let present = link_names(listing);
    monitor_candidates(base, listing)
        .into_iter()
        .find(|candidate| present.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

pub fn resolve_monitor_interface(base: &str) -> String {
    let resolved = resolve_from_listing(base, &link_listing());
    if resolved != base {
        log::info!("Resolved {} to monitor interface {}", base, resolved);
    }
    resolved
}

pub fn parse_iw_dev(output: &str) -> Vec<String> {
    IW_DEV_INTERFACE
        .captures_iter(output)
        .map(|caps| caps[1].to_string())
        .collect()
}

pub fn parse_ip_link(output: &str) -> Vec<String> {
    link_names(output)
        .into_iter()
        .filter(|name| WIRELESS_PREFIXES.iter().any(|p| name.starts_with(p)))
        .collect()
}

pub fn parse_iwconfig(output: &str) -> Vec<String> {
    IWCONFIG_INTERFACE
        .captures_iter(output)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Wireless interfaces on this host, trying `iw dev`, `ip link show` and
/// `iwconfig` in turn. Empty when none of them report anything.
pub fn detect_interfaces() -> Vec<String> {
    detect_interfaces_with(command_stdout)
}

pub fn detect_interfaces_with<F>(run: F) -> Vec<String>
where
    F: Fn(&str, &[&str]) -> Option<String>,
{
    let strategies: [(&str, &[&str], fn(&str) -> Vec<String>); 3] = [
        ("iw", &["dev"], parse_iw_dev),
        ("ip", &["link", "show"], parse_ip_link),
        ("iwconfig", &[], parse_iwconfig),
    ];

    for (cmd, args, extract) in strategies {
        let found = run(cmd, args).map(|out| extract(&out)).unwrap_or_default();
        let mut interfaces: Vec<String> = Vec::new();
        for name in found {
            if !interfaces.contains(&name) {
                interfaces.push(name);
            }
        }
        if !interfaces.is_empty() {
            log::debug!("Found interfaces {:?} via {}", interfaces, cmd);
            return interfaces;
        }
    }

    Vec::new()
}
