use std::io;
use std::process::{Child, Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Exited(ExitStatus),
    TimedOut,
}

/// Child process owned by the gateway.
///
/// Dropping a handle whose process is still running kills and reaps it.
#[derive(Debug)]
pub struct ManagedChild {
    label: String,
    child: Child,
    launched_at: Instant,
}

impl ManagedChild {
    pub fn spawn(command: &mut Command, label: impl Into<String>) -> io::Result<Self> {
        let label = label.into();
        let child = command.spawn()?;
        log::debug!("Started {} (pid {})", label, child.id());
        Ok(Self {
            label,
            child,
            launched_at: Instant::now(),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    pub fn launched_at(&self) -> Instant {
        self.launched_at
    }

    /// Exit status if the process has already finished.
    pub fn try_status(&mut self) -> io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    /// Block until exit, or until `timeout` after launch has passed.
    pub fn wait_with_deadline(&mut self, timeout: Option<Duration>) -> io::Result<WaitOutcome> {
        let Some(timeout) = timeout else {
            return self.child.wait().map(WaitOutcome::Exited);
        };
        self.wait_until(self.launched_at + timeout)
    }

    /// Block until exit or until `deadline`.
    pub fn wait_until(&mut self, deadline: Instant) -> io::Result<WaitOutcome> {
        loop {
            if let Some(status) = self.child.try_wait()? {
                return Ok(WaitOutcome::Exited(status));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(WaitOutcome::TimedOut);
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }

    /// Ask the process to stop the way a terminal Ctrl-C would.
    #[cfg(unix)]
    pub fn interrupt(&mut self) -> io::Result<()> {
        use nix::sys::signal::{self, Signal};
        use nix::unistd::Pid;

        signal::kill(Pid::from_raw(self.child.id() as i32), Signal::SIGINT)?;
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn interrupt(&mut self) -> io::Result<()> {
        self.child.kill()
    }

    /// Forcefully stop and reap the process.
    pub fn kill(&mut self) -> io::Result<ExitStatus> {
        if let Some(status) = self.child.try_wait()? {
            return Ok(status);
        }
        self.child.kill()?;
        self.child.wait()
    }

    /// SIGINT, then a bounded wait, then a forced kill.
    pub fn shutdown(&mut self, grace: Duration) -> io::Result<ExitStatus> {
        if let Some(status) = self.child.try_wait()? {
            return Ok(status);
        }

        if let Err(e) = self.interrupt() {
            log::warn!("Failed to interrupt {} (pid {}): {}", self.label, self.id(), e);
        }

        match self.wait_until(Instant::now() + grace)? {
            WaitOutcome::Exited(status) => Ok(status),
            WaitOutcome::TimedOut => {
                log::warn!(
                    "{} (pid {}) ignored interrupt for {:?}, killing",
                    self.label,
                    self.id(),
                    grace
                );
                self.kill()
            }
        }
    }
}

impl Drop for ManagedChild {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            log::warn!("Killing leftover {} (pid {})", self.label, self.child.id());
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
