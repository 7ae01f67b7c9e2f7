use serde::Serialize;
use std::net::{IpAddr, ToSocketAddrs};
use std::process::Command;

const LOOPBACK_NAMES: &[&str] = &["localhost", "127.0.0.1", "::1"];

/// Where the probes of one host run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Local,
    Remote,
}

/// Names and address of the machine running the audit
#[derive(Debug, Clone, Default)]
pub struct LocalIdentity {
    short_name: String,
    fqdn: Option<String>,
    primary_ip: Option<IpAddr>,
}

impl LocalIdentity {
    pub fn new(short_name: impl Into<String>, fqdn: Option<String>, primary_ip: Option<IpAddr>) -> Self {
        Self {
            short_name: short_name.into(),
            fqdn,
            primary_ip,
        }
    }

    /// Detect hostname, FQDN and primary IP of this machine
    pub fn detect() -> Self {
        let short_name = Self::get_hostname();
        let fqdn = Self::get_fqdn().filter(|f| f != &short_name);
        let primary_ip = Self::get_primary_ip(&short_name);

        tracing::debug!(%short_name, ?fqdn, ?primary_ip, "detected local identity");

        Self {
            short_name,
            fqdn,
            primary_ip,
        }
    }

    /// Get hostname
    fn get_hostname() -> String {
        nix::unistd::gethostname()
            .ok()
            .and_then(|h| h.into_string().ok())
            .map(|h| h.split('.').next().unwrap_or_default().to_string())
            .unwrap_or_else(|| "localhost".to_string())
    }

    fn get_fqdn() -> Option<String> {
        let output = Command::new("hostname").arg("-f").output().ok()?;
        if !output.status.success() {
            return None;
        }
        let fqdn = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if fqdn.is_empty() {
            None
        } else {
            Some(fqdn)
        }
    }

    /// First non-loopback address the hostname resolves to, else the first
    /// address reported by `hostname -I`
    fn get_primary_ip(short_name: &str) -> Option<IpAddr> {
        let resolved = resolve(short_name)
            .into_iter()
            .find(|ip| !ip.is_loopback());
        if resolved.is_some() {
            return resolved;
        }

        let output = Command::new("hostname").arg("-I").output().ok()?;
        String::from_utf8_lossy(&output.stdout)
            .split_whitespace()
            .filter_map(|token| token.parse::<IpAddr>().ok())
            .find(|ip| !ip.is_loopback())
    }

    /// Decide whether an address designates this machine
    pub fn route(&self, address: &str) -> Route {
        if self.is_local(address) {
            Route::Local
        } else {
            Route::Remote
        }
    }

    fn is_local(&self, address: &str) -> bool {
        let address = address.trim().to_ascii_lowercase();

        if LOOPBACK_NAMES.contains(&address.as_str()) {
            return true;
        }

        if let Ok(ip) = address.parse::<IpAddr>() {
            return ip.is_loopback() || Some(ip) == self.primary_ip;
        }

        if address == self.short_name.to_ascii_lowercase() {
            return true;
        }
        if let Some(ref fqdn) = self.fqdn {
            if address == fqdn.to_ascii_lowercase() {
                return true;
            }
        }

        resolve(&address)
            .iter()
            .any(|ip| ip.is_loopback() || Some(*ip) == self.primary_ip)
    }
}

fn resolve(name: &str) -> Vec<IpAddr> {
    (name, 0u16)
        .to_socket_addrs()
        .map(|addrs| addrs.map(|a| a.ip()).collect())
        .unwrap_or_default()
}
