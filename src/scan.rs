use crate::capture::{latest_capture_file, CaptureProcess};
use crate::display::Presenter;
use crate::error::Result;
use crate::parser::{dedup, read_records, AccessPointRecord};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub dir: PathBuf,
    pub prefix: String,
    pub interval: Duration,
    pub grace: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            dir: PathBuf::from("."),
            prefix: "file".to_string(),
            interval: Duration::from_secs(2),
            grace: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    CaptureStarting,
    Polling,
    Stopping,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// No capture file has been written yet.
    Waiting,
    /// The latest file could not be read; the previous snapshot is kept.
    Unreadable,
    /// The snapshot was rebuilt with this many access points.
    Updated(usize),
}

/// The live scan: a capture process plus the latest parsed snapshot.
pub struct ScanSession {
    config: ScanConfig,
    state: ScanState,
    snapshot: Vec<AccessPointRecord>,
    capture: Option<CaptureProcess>,
    reader: fn(&Path) -> io::Result<Vec<AccessPointRecord>>,
    ticks: usize,
}

impl ScanSession {
    pub fn new(config: ScanConfig) -> Self {
        ScanSession {
            config,
            state: ScanState::Idle,
            snapshot: Vec::new(),
            capture: None,
            reader: read_records,
            ticks: 0,
        }
    }

    /// Launches airodump-ng on `interface`, writing into the configured directory.
    pub fn start(config: ScanConfig, interface: &str) -> Result<Self> {
        let mut session = ScanSession::new(config);
        session.transition(ScanState::CaptureStarting);
        let capture = CaptureProcess::start(interface, &session.config.dir, &session.config.prefix);
        match capture {
            Ok(capture) => {
                session.capture = Some(capture);
                Ok(session)
            }
            Err(e) => {
                session.transition(ScanState::Idle);
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: ScanState) {
        log::debug!("Scan {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn snapshot(&self) -> &[AccessPointRecord] {
        &self.snapshot
    }

    /// Rebuilds the snapshot from the newest capture file.
    pub fn poll_once(&mut self) -> PollOutcome {
        let path = match latest_capture_file(&self.config.dir, &self.config.prefix) {
            Some(path) => path,
            None => return PollOutcome::Waiting,
        };

        match (self.reader)(&path) {
            Ok(records) => {
                self.snapshot = dedup(records);
                PollOutcome::Updated(self.snapshot.len())
            }
            Err(e) => {
                log::debug!("Skipping this cycle, {} unreadable: {}", path.display(), e);
                PollOutcome::Unreadable
            }
        }
    }

    fn render<P: Presenter + ?Sized>(&mut self, presenter: &P, outcome: &PollOutcome) {
        presenter.clear();
        presenter.banner();
        presenter.info("\n[*] Scanning for nearby WiFi networks...");
        presenter.info(&format!(
            "({}) Press Ctrl+C to stop.\n",
            SPINNER[self.ticks % SPINNER.len()]
        ));
        self.ticks += 1;

        match outcome {
            PollOutcome::Waiting => presenter.warn("Waiting for the capture file..."),
            PollOutcome::Updated(0) => presenter.error("No access point detected yet."),
            PollOutcome::Updated(count) => {
                presenter.table(&self.snapshot);
                presenter.success(&format!("[{}] access points detected.", count));
            }
            PollOutcome::Unreadable if self.snapshot.is_empty() => {
                presenter.error("No access point detected yet.")
            }
            PollOutcome::Unreadable => presenter.table(&self.snapshot),
        }
    }

    /// Polls and renders until `cancel` fires, then stops the capture and
    /// hands back the last snapshot that parsed.
    pub async fn run<P: Presenter + ?Sized>(
        mut self,
        presenter: &P,
        cancel: CancellationToken,
    ) -> Vec<AccessPointRecord> {
        self.transition(ScanState::Polling);

        while !cancel.is_cancelled() {
            let outcome = self.poll_once();
            self.render(presenter, &outcome);

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        presenter.error("Scan stopped by user.");
        self.stop().await;
        std::mem::take(&mut self.snapshot)
    }

    async fn stop(&mut self) {
        self.transition(ScanState::Stopping);
        if let Some(capture) = self.capture.take() {
            capture.stop(self.config.grace).await;
        }
        self.transition(ScanState::Idle);
    }
}
