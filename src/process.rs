use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};

/// A background tool process that is always reaped.
///
/// `shutdown` asks it to stop with SIGTERM, waits up to the grace period and
/// then kills it. Dropping the handle without a shutdown kills the process.
pub struct ManagedChild {
    tool: &'static str,
    child: Child,
}

impl ManagedChild {
    pub fn spawn(tool: &'static str, args: &[String], quiet: bool) -> io::Result<Self> {
        let mut command = Command::new(tool);
        command.args(args).stdin(Stdio::null()).kill_on_drop(true);
        if quiet {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let child = command.spawn()?;
        log::debug!("Started {} (pid {:?})", tool, child.id());
        Ok(ManagedChild { tool, child })
    }

    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait().await
    }

    pub async fn shutdown(mut self, grace: Duration) {
        if let Ok(Some(status)) = self.child.try_wait() {
            log::debug!("{} already exited with {}", self.tool, status);
            return;
        }

        if let Some(pid) = self.child.id() {
            // SAFETY: pid belongs to our own un-reaped child.
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            }
        }

        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => log::debug!("{} stopped with {}", self.tool, status),
            Ok(Err(e)) => log::warn!("Failed to wait for {}: {}", self.tool, e),
            Err(_) => {
                log::warn!("{} ignored SIGTERM, killing it", self.tool);
                if let Err(e) = self.child.kill().await {
                    log::warn!("Failed to kill {}: {}", self.tool, e);
                }
            }
        }
    }
}
