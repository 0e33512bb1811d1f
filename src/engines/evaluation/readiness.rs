use super::process::ManagedChild;
use crate::config::Readiness;
use crate::error::{GpError, Result};
use std::net::{TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};

/// Block until the server is ready to accept clients.
///
/// Fails with `EvaluatorLaunch` if the server exits first or a probe runs
/// out of time.
pub fn wait_until_ready(readiness: &Readiness, server: &mut ManagedChild) -> Result<()> {
    match readiness {
        Readiness::FixedDelay { millis } => {
            thread::sleep(Duration::from_millis(*millis));
            ensure_running(server)
        }
        Readiness::UdpPortBound { port, timeout_ms, poll_ms } => {
            let port = *port;
            poll(server, *timeout_ms, *poll_ms, &format!("UDP port {}", port), || {
                udp_port_bound(port)
            })
        }
        Readiness::TcpConnect { address, timeout_ms, poll_ms } => {
            let probe_timeout = Duration::from_millis(*poll_ms);
            poll(server, *timeout_ms, *poll_ms, address, || {
                tcp_accepts(address, probe_timeout)
            })
        }
    }
}

fn poll<F>(server: &mut ManagedChild, timeout_ms: u64, poll_ms: u64, what: &str, mut probe: F) -> Result<()>
where
    F: FnMut() -> Result<bool>,
{
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        ensure_running(server)?;
        if probe()? {
            log::debug!("{} ready on {}", server.label(), what);
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(GpError::EvaluatorLaunch(format!(
                "{} not ready on {} after {} ms",
                server.label(),
                what,
                timeout_ms
            )));
        }
        thread::sleep(Duration::from_millis(poll_ms));
    }
}

fn ensure_running(server: &mut ManagedChild) -> Result<()> {
    match server.try_status()? {
        None => Ok(()),
        Some(status) => Err(GpError::EvaluatorLaunch(format!(
            "{} exited during startup ({})",
            server.label(),
            status
        ))),
    }
}

fn tcp_accepts(address: &str, timeout: Duration) -> Result<bool> {
    let addrs = address.to_socket_addrs().map_err(|e| {
        GpError::Configuration(format!("Cannot resolve readiness address {}: {}", address, e))
    })?;
    Ok(addrs.into_iter().any(|addr| TcpStream::connect_timeout(&addr, timeout).is_ok()))
}

/// Whether any socket is bound to the UDP port, read from the kernel's
/// socket tables so the probe never competes with the server for the port.
#[cfg(target_os = "linux")]
fn udp_port_bound(port: u16) -> Result<bool> {
    for table in ["/proc/net/udp", "/proc/net/udp6"] {
        match std::fs::read_to_string(table) {
            Ok(text) if socket_table_has_port(&text, port) => return Ok(true),
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(false)
}

#[cfg(not(target_os = "linux"))]
fn udp_port_bound(_port: u16) -> Result<bool> {
    Err(GpError::Configuration(
        "udp_port_bound readiness is only supported on Linux".to_string(),
    ))
}

/// Scan a `/proc/net/udp`-style table for a local address on `port`.
pub fn socket_table_has_port(table: &str, port: u16) -> bool {
    let wanted = format!("{:04X}", port);
    table.lines().skip(1).any(|line| {
        line.split_whitespace()
            .nth(1)
            .and_then(|local| local.rsplit(':').next())
            .map(|p| p.eq_ignore_ascii_case(&wanted))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode ref pointer drops
  12: 00000000:2328 00000000:0000 07 00000000:00000000 00:00000000 00000000  1000        0 41234 2 0000000000000000 0
  13: 0100007F:0035 00000000:0000 07 00000000:00000000 00:00000000 00000000   101        0 19876 2 0000000000000000 0
";

    #[test]
    fn test_socket_table_port_match() {
        assert!(socket_table_has_port(TABLE, 9000));
        assert!(socket_table_has_port(TABLE, 53));
        assert!(!socket_table_has_port(TABLE, 9001));
    }

    #[test]
    fn test_remote_port_is_ignored() {
        let table = "header\n  1: 00000000:0001 00000000:2328 07\n";
        assert!(!socket_table_has_port(table, 9000));
    }
}
