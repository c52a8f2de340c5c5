//! Local machine identity used to select per-machine record overrides.

use std::fs;
use std::path::Path;

use tracing::debug;

const MACHINE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::machine");

/// Default location of the systemd machine id.
pub const DEFAULT_MACHINE_ID_PATH: &str = "/etc/machine-id";

/// Machine id and hostname of the querying host.
///
/// Either part may be empty when it could not be read. Empty values never
/// match a per-machine condition or a binding key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineIdentity {
    machine_id: String,
    hostname: String,
}

impl MachineIdentity {
    /// Builds an identity from known values.
    #[must_use]
    pub fn new(machine_id: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            machine_id: machine_id.into(),
            hostname: hostname.into(),
        }
    }

    /// Reads the identity of the running host from the default locations.
    #[must_use]
    pub fn detect() -> Self {
        Self::from_machine_id_file(Path::new(DEFAULT_MACHINE_ID_PATH))
    }

    /// Reads the machine id from `path` and the hostname from the kernel.
    #[must_use]
    pub fn from_machine_id_file(path: &Path) -> Self {
        Self {
            machine_id: read_machine_id(path),
            hostname: read_hostname(),
        }
    }

    /// The machine id, or an empty string.
    #[must_use]
    pub const fn machine_id(&self) -> &str {
        self.machine_id.as_str()
    }

    /// The hostname, or an empty string.
    #[must_use]
    pub const fn hostname(&self) -> &str {
        self.hostname.as_str()
    }
}

fn read_machine_id(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(contents) => contents.trim_end_matches('\n').to_owned(),
        Err(error) => {
            debug!(
                target: MACHINE_TARGET,
                path = %path.display(),
                %error,
                "machine id unavailable"
            );
            String::new()
        }
    }
}

fn read_hostname() -> String {
    match nix::unistd::gethostname() {
        Ok(name) => name.into_string().unwrap_or_else(|raw| {
            debug!(target: MACHINE_TARGET, hostname = ?raw, "hostname is not valid UTF-8");
            String::new()
        }),
        Err(error) => {
            debug!(target: MACHINE_TARGET, %error, "hostname unavailable");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use tempfile::NamedTempFile;

    #[test]
    fn trims_trailing_newline_from_machine_id() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "ecb5a44f1a5846ad871566e113bf8937").expect("write machine id");
        let identity = MachineIdentity::from_machine_id_file(file.path());
        assert_eq!(identity.machine_id(), "ecb5a44f1a5846ad871566e113bf8937");
    }

    #[test]
    fn missing_machine_id_file_yields_empty_id() {
        let dir = tempfile::tempdir().expect("temp dir");
        let identity = MachineIdentity::from_machine_id_file(&dir.path().join("absent"));
        assert_eq!(identity.machine_id(), "");
    }

    #[test]
    fn new_keeps_values() {
        let identity = MachineIdentity::new("abc", "host");
        assert_eq!(identity.machine_id(), "abc");
        assert_eq!(identity.hostname(), "host");
    }
}
