//! VPS models: request parameters and normalized results.

use chrono::{Datelike, NaiveDate};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;
use validator::Validate;
use virtualizor_core::query::QueryParams;
use virtualizor_core::Error;

/// Result of an operation: the normalized value, or the parsed panel body
/// when the client runs in raw mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply<T> {
    /// Parsed panel body (or its documented sub-object)
    Raw(Value),
    /// Canonical result
    Normalized(T),
}

impl<T> Reply<T> {
    /// Returns true for raw replies.
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }

    /// Borrow the normalized value, if any.
    #[must_use]
    pub const fn as_normalized(&self) -> Option<&T> {
        match self {
            Self::Normalized(value) => Some(value),
            Self::Raw(_) => None,
        }
    }

    /// Consume the reply, keeping the normalized value.
    #[must_use]
    pub fn into_normalized(self) -> Option<T> {
        match self {
            Self::Normalized(value) => Some(value),
            Self::Raw(_) => None,
        }
    }

    /// Consume the reply, keeping the raw body.
    #[must_use]
    pub fn into_raw(self) -> Option<Value> {
        match self {
            Self::Raw(value) => Some(value),
            Self::Normalized(_) => None,
        }
    }
}

/// Filters accepted by the list operation. Unset filters are not sent.
#[derive(Debug, Default, Clone)]
pub struct ListFilters {
    /// Filter by VPS id.
    pub vpsid: Option<String>,
    /// Filter by VPS name (e.g. `v1001`).
    pub vpsname: Option<String>,
    /// Filter by IP address.
    pub vpsip: Option<String>,
    /// Filter by hostname.
    pub vpshostname: Option<String>,
    /// Filter by status (`up`, `down`, `suspended`).
    pub vsstatus: Option<String>,
    /// Filter by virtualization type (`kvm`, `openvz`, ...).
    pub vstype: Option<String>,
    /// Filter by owner email.
    pub user: Option<String>,
    /// Filter by server id.
    pub serid: Option<u32>,
    /// Page number.
    pub page: Option<u32>,
    /// Results per page.
    pub reslen: Option<u32>,
}

impl ListFilters {
    /// Append the filters to a parameter builder.
    pub fn push_into(&self, params: &mut QueryParams) {
        params.push_opt("vpsid", self.vpsid.as_deref());
        params.push_opt("vpsname", self.vpsname.as_deref());
        params.push_opt("vpsip", self.vpsip.as_deref());
        params.push_opt("vpshostname", self.vpshostname.as_deref());
        params.push_opt("vsstatus", self.vsstatus.as_deref());
        params.push_opt("vstype", self.vstype.as_deref());
        params.push_opt("user", self.user.as_deref());
        params.push_opt("serid", self.serid);
        params.push_opt("page", self.page);
        params.push_opt("reslen", self.reslen);
    }
}

/// Disk space for a new VPS, in GB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageSpace {
    /// One disk
    Single(u64),
    /// Several disks; the panel receives their total
    Multiple(Vec<u64>),
}

impl StorageSpace {
    /// Total size in GB, or `None` if the sizes overflow.
    #[must_use]
    pub fn total(&self) -> Option<u64> {
        match self {
            Self::Single(size) => Some(*size),
            Self::Multiple(sizes) => sizes
                .iter()
                .try_fold(0u64, |acc, size| acc.checked_add(*size)),
        }
    }
}

/// Parameters for provisioning a VPS.
#[derive(Debug, Clone, Validate)]
pub struct CreateVpsRequest {
    /// Virtualization type (`kvm`, `openvz`, `xen`, ...).
    #[validate(length(min = 1))]
    pub virt: String,
    /// Node selection (server id or group).
    pub node_select: Option<String>,
    /// Email of the owning user.
    #[validate(email)]
    pub user_email: String,
    /// Password of the owning user.
    pub user_pass: SecretString,
    /// Hostname of the new VPS.
    #[validate(length(min = 1))]
    pub hostname: String,
    /// Root password of the new VPS.
    pub root_pass: SecretString,
    /// Operating system template id.
    #[validate(length(min = 1))]
    pub os_id: String,
    /// IP address to assign.
    pub ip: Option<String>,
    /// Disk space.
    pub space: Option<StorageSpace>,
    /// RAM in MB.
    pub ram: Option<u64>,
    /// Bandwidth limit in GB (0 for unlimited).
    pub bandwidth: Option<u64>,
    /// CPU cores.
    pub cores: Option<u32>,
}

impl CreateVpsRequest {
    /// Create a request with the required parameters.
    pub fn new(
        virt: impl Into<String>,
        hostname: impl Into<String>,
        os_id: impl Into<String>,
        user_email: impl Into<String>,
        user_pass: impl Into<String>,
        root_pass: impl Into<String>,
    ) -> Self {
        Self {
            virt: virt.into(),
            node_select: None,
            user_email: user_email.into(),
            user_pass: SecretString::from(user_pass.into()),
            hostname: hostname.into(),
            root_pass: SecretString::from(root_pass.into()),
            os_id: os_id.into(),
            ip: None,
            space: None,
            ram: None,
            bandwidth: None,
            cores: None,
        }
    }

    /// Select the node to provision on.
    #[must_use]
    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node_select = Some(node.into());
        self
    }

    /// Assign an IP address.
    #[must_use]
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Set disk space.
    #[must_use]
    pub fn with_space(mut self, space: StorageSpace) -> Self {
        self.space = Some(space);
        self
    }

    /// Set RAM in MB.
    #[must_use]
    pub const fn with_ram(mut self, ram: u64) -> Self {
        self.ram = Some(ram);
        self
    }

    /// Set the bandwidth limit in GB.
    #[must_use]
    pub const fn with_bandwidth(mut self, bandwidth: u64) -> Self {
        self.bandwidth = Some(bandwidth);
        self
    }

    /// Set the number of CPU cores.
    #[must_use]
    pub const fn with_cores(mut self, cores: u32) -> Self {
        self.cores = Some(cores);
        self
    }

    /// Validate the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if a required field is missing or invalid.
    pub fn check(&self) -> Result<(), Error> {
        self.validate()?;
        if self.user_pass.expose_secret().is_empty() {
            return Err(Error::ValidationError("user_pass is required".to_string()));
        }
        if self.root_pass.expose_secret().is_empty() {
            return Err(Error::ValidationError("root_pass is required".to_string()));
        }
        if self.space.as_ref().is_some_and(|space| space.total().is_none()) {
            return Err(Error::ValidationError(
                "space exceeds the supported total size".to_string(),
            ));
        }
        Ok(())
    }

    /// Append the provisioning parameters to a parameter builder.
    pub fn push_into(&self, params: &mut QueryParams) {
        params.push("virt", &self.virt);
        params.push_opt("node_select", self.node_select.as_deref());
        params.push("user_email", &self.user_email);
        params.push("user_pass", self.user_pass.expose_secret());
        params.push("hostname", &self.hostname);
        params.push("root_pass", self.root_pass.expose_secret());
        params.push("os_id", &self.os_id);
        params.push_opt("ips", self.ip.as_deref());
        params.push_opt("space", self.space.as_ref().and_then(StorageSpace::total));
        params.push_opt("ram", self.ram);
        params.push_opt("bandwidth", self.bandwidth);
        params.push_opt("cores", self.cores);
    }
}

/// Calendar month for bandwidth reports, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BandwidthMonth(NaiveDate);

impl BandwidthMonth {
    /// Create a month from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the month is out of range.
    pub fn new(year: i32, month: u32) -> Result<Self, Error> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or_else(|| Error::ValidationError(format!("invalid month {year}-{month}")))
    }

    /// The year.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// The month (1-12).
    #[must_use]
    pub fn month(&self) -> u32 {
        self.0.month()
    }
}

impl From<NaiveDate> for BandwidthMonth {
    fn from(date: NaiveDate) -> Self {
        Self(date.with_day(1).unwrap_or(date))
    }
}

impl FromStr for BandwidthMonth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
            .map(Self)
            .map_err(|err| Error::ValidationError(format!("invalid month `{s}`, expected YYYY-MM: {err}")))
    }
}

impl fmt::Display for BandwidthMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

/// One VPS as it appears in a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VpsDescriptor {
    /// VPS id.
    pub id: String,
    /// Internal VPS name (e.g. `v1001`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Hostname.
    pub hostname: String,
    /// Operating system name.
    pub os: String,
    /// CPU cores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cores: Option<String>,
    /// RAM in MB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram: Option<String>,
    /// Disk space in GB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<String>,
    /// Bandwidth limit in GB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<String>,
    /// Name of the hosting server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    /// Status reported by the panel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Assigned IP addresses, in panel order.
    #[serde(default)]
    pub ips: Vec<String>,
}

/// Normalized listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VpsList {
    /// Records that carried an id, hostname and OS name, in panel order.
    pub servers: Vec<VpsDescriptor>,
    /// Number of records skipped because one of those fields was empty.
    pub dropped: usize,
}

/// Bandwidth figures of one VPS, in GB.
///
/// Figures keep the panel's numeric form, so whole numbers stay integers.
/// A limit of 0 means the plan is unlimited and has no remainder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandwidthUsage {
    /// Limit (0 for unlimited).
    pub limit: Number,
    /// Used this month.
    pub used: Number,
    /// Remaining; `None` for unlimited plans.
    pub free: Option<Number>,
}

impl BandwidthUsage {
    /// Returns true if the plan has no bandwidth cap.
    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        self.limit.as_f64() == Some(0.0)
    }
}

/// Normalized view of one VPS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VpsDetails {
    /// Primary IP address.
    pub ip: String,
    /// Hostname.
    pub hostname: String,
    /// Status reported by the panel.
    pub status: String,
    /// Operating system name.
    pub os: String,
    /// CPU cores.
    pub cores: String,
    /// RAM in MB.
    pub ram: String,
    /// Disk space in GB.
    pub space: String,
    /// Bandwidth figures.
    pub bandwidth: BandwidthUsage,
    /// Name of the hosting server.
    pub datacenter: String,
}

/// Outcome of a create, start, stop or restart call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifecycleResult {
    /// Success message, absent on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error reported by the panel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Server-side processing time in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_taken: Option<f64>,
    /// VPS the action applied to, when the panel echoes it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vps_id: Option<String>,
    /// The parsed panel body.
    pub raw: Value,
}

impl LifecycleResult {
    /// Returns true if the panel reported success and no error.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.message.is_some() && self.error.is_none()
    }
}

/// Usage figures (RAM, CPU, disk, bandwidth) or plan listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageReport {
    /// The panel's sub-object for the metric, unchanged.
    pub data: Value,
    /// Server-side processing time in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_taken: Option<f64>,
}
