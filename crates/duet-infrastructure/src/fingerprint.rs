//! Machine/user fingerprint used to key the preference cache.
//!
//! The fingerprint only separates several local users or machines sharing one
//! cache file. It is not a secret and not an authentication mechanism.

use std::env;

/// The identity triple hashed into the fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineIdentity {
    /// OS platform name, e.g. "Linux", "Darwin", "Windows".
    pub platform: String,
    /// Network host name.
    pub hostname: String,
    /// OS login name.
    pub login: String,
}

impl MachineIdentity {
    pub fn new(
        platform: impl Into<String>,
        hostname: impl Into<String>,
        login: impl Into<String>,
    ) -> Self {
        Self {
            platform: platform.into(),
            hostname: hostname.into(),
            login: login.into(),
        }
    }

    /// Reads the identity of the running process.
    pub fn detect() -> Self {
        Self {
            platform: platform_name().to_string(),
            hostname: hostname().unwrap_or_else(|| "unknown-host".to_string()),
            login: login_name().unwrap_or_else(|| "unknown-user".to_string()),
        }
    }

    /// Hex md5 of `"{platform}_{hostname}_{login}"`.
    pub fn fingerprint(&self) -> String {
        let key = format!("{}_{}_{}", self.platform, self.hostname, self.login);
        format!("{:x}", md5::compute(key.as_bytes()))
    }
}

/// Computes the fingerprint of the running process.
pub fn compute_fingerprint() -> String {
    MachineIdentity::detect().fingerprint()
}

/// Platform names in the same spelling `uname` reports.
fn platform_name() -> &'static str {
    match env::consts::OS {
        "linux" => "Linux",
        "macos" => "Darwin",
        "windows" => "Windows",
        "freebsd" => "FreeBSD",
        other => other,
    }
}

#[cfg(unix)]
fn hostname() -> Option<String> {
    let mut buf = [0u8; 256];
    // SAFETY: buf is valid for buf.len() bytes and gethostname NUL-terminates on success.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
    if rc != 0 {
        return env::var("HOSTNAME").ok();
    }
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    let name = String::from_utf8_lossy(&buf[..end]).trim().to_string();
    if name.is_empty() { None } else { Some(name) }
}

#[cfg(not(unix))]
fn hostname() -> Option<String> {
    env::var("COMPUTERNAME").ok().filter(|name| !name.is_empty())
}

fn login_name() -> Option<String> {
    ["LOGNAME", "USER", "USERNAME"]
        .iter()
        .filter_map(|var| env::var(var).ok())
        .find(|name| !name.trim().is_empty())
}
