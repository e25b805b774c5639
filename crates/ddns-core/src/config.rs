//! Configuration types for the DDNS system
//!
//! Configuration is read from an optional TOML file and then overlaid with
//! environment variables. A non-empty environment variable always wins over
//! the file value.
//!
//! ## Recognized keys
//!
//! | key                      | alias            |
//! |--------------------------|------------------|
//! | `DNSPOD_SECRET_ID`       | `SECRET_ID`      |
//! | `DNSPOD_SECRET_KEY`      | `SECRET_KEY`     |
//! | `DNSPOD_DOMAIN`          | `DOMAIN`         |
//! | `DNSPOD_RECORDID_IPV4`   | `RECORD_ID_IPV4` |
//! | `DNSPOD_RECORDID_IPV6`   | `RECORD_ID_IPV6` |
//! | `DNSPOD_SUBDOMAIN_IPV4`  | `SUBDOMAIN_IPV4` |
//! | `DNSPOD_SUBDOMAIN_IPV6`  | `SUBDOMAIN_IPV6` |
//!
//! Either spelling may be used in the file and in the environment; when both
//! are set the prefixed one wins. Record ids may be written as integers or
//! strings.
//!
//! Missing required values only produce a warning here. They become fatal
//! when the service is started (see [`UpdatePlan::validate`]).

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::traits::{AddressFamily, Credentials, RecordId, RecordType, effective_sub_domain};

/// Default config file name, looked up next to the executable
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Raw configuration as read from file and environment
///
/// Record ids are kept as strings until [`AppConfig::into_plan`] so that a
/// file and an environment variable can be merged before parsing.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub secret_id: String,
    pub secret_key: String,
    pub domain: String,
    pub record_id_ipv4: String,
    pub record_id_ipv6: String,
    pub sub_domain_ipv4: String,
    pub sub_domain_ipv6: String,
}

/// A config file value; record ids are commonly written as bare integers
#[derive(Deserialize)]
#[serde(untagged)]
enum FileValue {
    Text(String),
    Integer(i64),
}

impl From<FileValue> for String {
    fn from(value: FileValue) -> Self {
        match value {
            FileValue::Text(text) => text,
            FileValue::Integer(n) => n.to_string(),
        }
    }
}

/// On-disk layout
///
/// Both spellings of a key may appear; the prefixed one wins unless it is
/// empty, as with environment variables.
#[derive(Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    #[serde(rename = "DNSPOD_SECRET_ID")]
    secret_id: Option<FileValue>,
    #[serde(rename = "SECRET_ID")]
    secret_id_alias: Option<FileValue>,

    #[serde(rename = "DNSPOD_SECRET_KEY")]
    secret_key: Option<FileValue>,
    #[serde(rename = "SECRET_KEY")]
    secret_key_alias: Option<FileValue>,

    #[serde(rename = "DNSPOD_DOMAIN")]
    domain: Option<FileValue>,
    #[serde(rename = "DOMAIN")]
    domain_alias: Option<FileValue>,

    #[serde(rename = "DNSPOD_RECORDID_IPV4")]
    record_id_ipv4: Option<FileValue>,
    #[serde(rename = "RECORD_ID_IPV4")]
    record_id_ipv4_alias: Option<FileValue>,

    #[serde(rename = "DNSPOD_RECORDID_IPV6")]
    record_id_ipv6: Option<FileValue>,
    #[serde(rename = "RECORD_ID_IPV6")]
    record_id_ipv6_alias: Option<FileValue>,

    #[serde(rename = "DNSPOD_SUBDOMAIN_IPV4")]
    sub_domain_ipv4: Option<FileValue>,
    #[serde(rename = "SUBDOMAIN_IPV4")]
    sub_domain_ipv4_alias: Option<FileValue>,

    #[serde(rename = "DNSPOD_SUBDOMAIN_IPV6")]
    sub_domain_ipv6: Option<FileValue>,
    #[serde(rename = "SUBDOMAIN_IPV6")]
    sub_domain_ipv6_alias: Option<FileValue>,
}

fn first_non_empty(prefixed: Option<FileValue>, alias: Option<FileValue>) -> String {
    [prefixed, alias]
        .into_iter()
        .flatten()
        .map(String::from)
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

impl From<ConfigFile> for AppConfig {
    fn from(file: ConfigFile) -> Self {
        Self {
            secret_id: first_non_empty(file.secret_id, file.secret_id_alias),
            secret_key: first_non_empty(file.secret_key, file.secret_key_alias),
            domain: first_non_empty(file.domain, file.domain_alias),
            record_id_ipv4: first_non_empty(file.record_id_ipv4, file.record_id_ipv4_alias),
            record_id_ipv6: first_non_empty(file.record_id_ipv6, file.record_id_ipv6_alias),
            sub_domain_ipv4: first_non_empty(file.sub_domain_ipv4, file.sub_domain_ipv4_alias),
            sub_domain_ipv6: first_non_empty(file.sub_domain_ipv6, file.sub_domain_ipv6_alias),
        }
    }
}

// Custom Debug implementation that hides the secret key
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("secret_id_set", &!self.secret_id.is_empty())
            .field("secret_key", &"<REDACTED>")
            .field("domain", &self.domain)
            .field("record_id_ipv4", &self.record_id_ipv4)
            .field("record_id_ipv6", &self.record_id_ipv6)
            .field("sub_domain_ipv4", &self.sub_domain_ipv4)
            .field("sub_domain_ipv6", &self.sub_domain_ipv6)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from `path` (or the default location) and the
    /// process environment
    pub fn load(path: Option<&Path>) -> Self {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Load configuration with an explicit environment lookup
    ///
    /// # Parameters
    ///
    /// - `path`: Explicit config file; `None` means `config.toml` next to the executable
    /// - `env`: Lookup for environment variables (injected so tests stay hermetic)
    pub fn load_with_env<F>(path: Option<&Path>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let explicit = path.is_some();
        let path = path.map(Path::to_path_buf).or_else(default_config_path);

        let mut config = match path {
            Some(ref path) => Self::read_file(path, explicit).unwrap_or_default(),
            None => {
                warn!("Unable to determine executable directory to find {}; relying on environment", DEFAULT_CONFIG_FILE);
                Self::default()
            }
        };

        config.apply_env(env);

        let missing = config.missing_fields();
        if !missing.is_empty() {
            warn!(
                missing = ?missing,
                "Configuration incomplete: DNSPOD_SECRET_ID, DNSPOD_SECRET_KEY, DNSPOD_DOMAIN and at least one of DNSPOD_RECORDID_IPV4/DNSPOD_RECORDID_IPV6 must be set in the config file or environment"
            );
        }

        config
    }

    /// Read and parse a TOML config file
    ///
    /// Never fails: a missing or broken file is logged and `None` is returned
    /// so the environment can still supply every value.
    fn read_file(path: &Path, explicit: bool) -> Option<Self> {
        match std::fs::metadata(path) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if explicit {
                    info!("Config file {} not found; relying on environment", path.display());
                } else {
                    info!("No config file at default location {}; relying on environment", path.display());
                }
                return None;
            }
            Err(e) => {
                warn!("Error checking config file {}: {}; relying on environment", path.display(), e);
                return None;
            }
        }

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file {}: {}; relying on environment", path.display(), e);
                return None;
            }
        };

        match Self::from_toml_str(&contents) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                Some(config)
            }
            Err(e) => {
                warn!("Failed to parse config file {}: {}; relying on environment", path.display(), e);
                None
            }
        }
    }

    /// Parse configuration from TOML text
    ///
    /// Values may be strings or integers. Unknown keys are ignored.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str::<ConfigFile>(contents)
            .map(Self::from)
            .map_err(|e| Error::config(format!("Failed to parse TOML: {}", e)))
    }

    /// Overlay non-empty environment variables onto this configuration
    pub fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |names: &[&str]| -> Option<String> {
            names
                .iter()
                .filter_map(|name| env(*name))
                .find(|value| !value.is_empty())
        };

        let fields: [(&mut String, [&str; 2]); 7] = [
            (&mut self.secret_id, ["DNSPOD_SECRET_ID", "SECRET_ID"]),
            (&mut self.secret_key, ["DNSPOD_SECRET_KEY", "SECRET_KEY"]),
            (&mut self.domain, ["DNSPOD_DOMAIN", "DOMAIN"]),
            (&mut self.record_id_ipv4, ["DNSPOD_RECORDID_IPV4", "RECORD_ID_IPV4"]),
            (&mut self.record_id_ipv6, ["DNSPOD_RECORDID_IPV6", "RECORD_ID_IPV6"]),
            (&mut self.sub_domain_ipv4, ["DNSPOD_SUBDOMAIN_IPV4", "SUBDOMAIN_IPV4"]),
            (&mut self.sub_domain_ipv6, ["DNSPOD_SUBDOMAIN_IPV6", "SUBDOMAIN_IPV6"]),
        ];

        for (field, names) in fields {
            if let Some(value) = lookup(&names) {
                *field = value;
            }
        }
    }

    /// Names of required values that are still missing
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.secret_id.is_empty() {
            missing.push("DNSPOD_SECRET_ID");
        }
        if self.secret_key.is_empty() {
            missing.push("DNSPOD_SECRET_KEY");
        }
        if self.domain.is_empty() {
            missing.push("DNSPOD_DOMAIN");
        }
        if self.record_id_ipv4.is_empty() && self.record_id_ipv6.is_empty() {
            missing.push("DNSPOD_RECORDID_IPV4|DNSPOD_RECORDID_IPV6");
        }
        missing
    }

    /// Whether every required value is present
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Convert into the immutable plan used by the service
    ///
    /// # Returns
    ///
    /// - `Ok(UpdatePlan)`: Record ids parsed (empty or `0` means not configured)
    /// - `Err(Error::Config)`: A record id is not an unsigned integer
    pub fn into_plan(self) -> Result<UpdatePlan> {
        let ipv4 = parse_record_id(&self.record_id_ipv4, "DNSPOD_RECORDID_IPV4")?;
        let ipv6 = parse_record_id(&self.record_id_ipv6, "DNSPOD_RECORDID_IPV6")?;

        Ok(UpdatePlan {
            credentials: Credentials::new(self.secret_id, self.secret_key),
            domain: self.domain,
            ipv4: UpdateTarget::new(AddressFamily::V4, ipv4, self.sub_domain_ipv4),
            ipv6: UpdateTarget::new(AddressFamily::V6, ipv6, self.sub_domain_ipv6),
        })
    }
}

/// `config.toml` next to the running executable
pub fn default_config_path() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join(DEFAULT_CONFIG_FILE))
}

fn parse_record_id(raw: &str, key: &str) -> Result<Option<RecordId>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let value: u64 = raw
        .parse()
        .map_err(|e| Error::config(format!("Cannot parse {} ('{}') as an integer: {}", key, raw, e)))?;

    let id = RecordId::new(value);
    if id.is_none() {
        warn!("{} is 0, which is not a valid record id; treating it as not configured", key);
    }
    Ok(id)
}

/// One address family's update intent
///
/// Immutable for the lifetime of the process; record ids are never reloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTarget {
    /// Record to update; `None` keeps this family permanently inert
    pub record_id: Option<RecordId>,
    /// Host label; empty means root
    pub sub_domain: String,
    /// A for IPv4, AAAA for IPv6
    pub record_type: RecordType,
}

impl UpdateTarget {
    /// Create a target for `family`
    pub fn new(family: AddressFamily, record_id: Option<RecordId>, sub_domain: impl Into<String>) -> Self {
        Self {
            record_id,
            sub_domain: sub_domain.into(),
            record_type: RecordType::for_family(family),
        }
    }

    /// A target that will never be updated
    pub fn unconfigured(family: AddressFamily) -> Self {
        Self::new(family, None, "")
    }

    /// Whether a record id is configured
    pub fn is_configured(&self) -> bool {
        self.record_id.is_some()
    }

    /// Subdomain to send, falling back to `"@"`
    pub fn effective_sub_domain(&self) -> &str {
        effective_sub_domain(&self.sub_domain)
    }
}

/// Everything an update cycle needs, read-only after construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePlan {
    /// Provider credentials
    pub credentials: Credentials,
    /// Zone to update, e.g. "example.com"
    pub domain: String,
    /// IPv4 (A record) target
    pub ipv4: UpdateTarget,
    /// IPv6 (AAAA record) target
    pub ipv6: UpdateTarget,
}

impl UpdatePlan {
    /// Target for `family`
    pub fn target(&self, family: AddressFamily) -> &UpdateTarget {
        match family {
            AddressFamily::V4 => &self.ipv4,
            AddressFamily::V6 => &self.ipv6,
        }
    }

    /// Check that the plan can do any work at all
    ///
    /// Requires credentials, a domain and at least one configured record id.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.credentials.secret_id.is_empty() {
            missing.push("secret id");
        }
        if self.credentials.secret_key.is_empty() {
            missing.push("secret key");
        }
        if self.domain.is_empty() {
            missing.push("domain");
        }
        if !self.ipv4.is_configured() && !self.ipv6.is_configured() {
            missing.push("record id for IPv4 or IPv6");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::config(format!(
                "Critical configuration missing: {}. Service cannot start",
                missing.join(", ")
            )))
        }
    }
}
