//! Response normalization.
//!
//! The admin and end-user APIs wrap the same information in different
//! envelopes. Each operation has one projection per API variant; the variant
//! is fixed when the client is built, so no projection inspects a body to
//! decide which shape it has.
//!
//! All functions here are pure: they borrow the parsed body and build new
//! values from it.

use crate::models::{
    BandwidthUsage, LifecycleResult, Reply, UsageReport, VpsDescriptor, VpsDetails, VpsList,
};
use crate::Result;
use serde_json::{Number, Value};
use virtualizor_core::action::Action;
use virtualizor_core::config::ApiVariant;
use virtualizor_core::Error;

/// Usage endpoints whose replies are passed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// RAM usage
    Ram,
    /// CPU usage
    Cpu,
    /// Disk usage
    Disk,
    /// Bandwidth usage
    Bandwidth,
    /// Plan listing
    Plans,
}

impl Metric {
    /// Key of the sub-object carrying the metric.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Ram => "ram",
            Self::Cpu => "cpu",
            Self::Disk => "disk",
            Self::Bandwidth => "bandwidth",
            Self::Plans => "plans",
        }
    }

    /// The panel action serving the metric.
    #[must_use]
    pub const fn action(&self) -> Action {
        match self {
            Self::Ram => Action::Ram,
            Self::Cpu => Action::Cpu,
            Self::Disk => Action::Disk,
            Self::Bandwidth => Action::Bandwidth,
            Self::Plans => Action::Plans,
        }
    }
}

/// Shapes parsed panel bodies into canonical results.
///
/// In raw mode the body is returned as parsed, except for `get` and `list`
/// which are trimmed to the record or record map:
///
/// | operation | admin         | end user    |
/// |-----------|---------------|-------------|
/// | list      | `vs`          | `data.vs`   |
/// | get       | `vs.<id>`     | `info`      |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    variant: ApiVariant,
    raw_mode: bool,
}

impl Normalizer {
    /// Create a normalizer for one API variant.
    #[must_use]
    pub const fn new(variant: ApiVariant, raw_mode: bool) -> Self {
        Self { variant, raw_mode }
    }

    /// The API variant.
    #[must_use]
    pub const fn variant(&self) -> ApiVariant {
        self.variant
    }

    /// Whether raw mode is enabled.
    #[must_use]
    pub const fn raw_mode(&self) -> bool {
        self.raw_mode
    }

    /// Shape the reply to a `get` call for VPS `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] if a required field is missing.
    pub fn details(&self, id: &str, body: &Value) -> Result<Reply<VpsDetails>> {
        match (self.variant, self.raw_mode) {
            (ApiVariant::Admin, true) => Ok(Reply::Raw(require(body, &["vs", id])?.clone())),
            (ApiVariant::EndUser, true) => Ok(Reply::Raw(require(body, &["info"])?.clone())),
            (ApiVariant::Admin, false) => admin_details(body, id).map(Reply::Normalized),
            (ApiVariant::EndUser, false) => user_details(body).map(Reply::Normalized),
        }
    }

    /// Shape the reply to a `list` call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] if the record map is missing.
    pub fn list(&self, body: &Value) -> Result<Reply<VpsList>> {
        let path: &[&str] = match self.variant {
            ApiVariant::Admin => &["vs"],
            ApiVariant::EndUser => &["data", "vs"],
        };
        let records = require(body, path)?;

        if self.raw_mode {
            return Ok(Reply::Raw(records.clone()));
        }

        let entries: Vec<&Value> = match records {
            Value::Object(map) => map.values().collect(),
            // PHP encodes an empty associative array as `[]`.
            Value::Array(items) => items.iter().collect(),
            _ => {
                return Err(malformed(
                    body,
                    format!("`{}` is not a record map", path.join(".")),
                ))
            }
        };

        let servers: Vec<VpsDescriptor> = entries.iter().filter_map(|r| descriptor(r)).collect();
        let dropped = entries.len() - servers.len();

        Ok(Reply::Normalized(VpsList { servers, dropped }))
    }

    /// Shape the reply to a create, start, stop or restart call.
    ///
    /// # Errors
    ///
    /// This projection accepts any parsed body and does not return an error.
    pub fn lifecycle(&self, body: &Value) -> Result<Reply<LifecycleResult>> {
        if self.raw_mode {
            return Ok(Reply::Raw(body.clone()));
        }

        Ok(Reply::Normalized(match self.variant {
            ApiVariant::Admin => admin_lifecycle(body),
            ApiVariant::EndUser => user_lifecycle(body),
        }))
    }

    /// Shape the reply to a usage or plans call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] if the metric's sub-object is missing.
    pub fn usage(&self, metric: Metric, body: &Value) -> Result<Reply<UsageReport>> {
        if self.raw_mode {
            return Ok(Reply::Raw(body.clone()));
        }

        let data = require(body, &[metric.key()])?.clone();
        Ok(Reply::Normalized(UsageReport {
            data,
            time_taken: body.get("time_taken").and_then(number),
        }))
    }
}

fn user_details(body: &Value) -> Result<VpsDetails> {
    Ok(VpsDetails {
        ip: require_ip(body, &["info", "ip"])?,
        hostname: require_text(body, &["info", "hostname"])?,
        status: require_text(body, &["info", "status"])?,
        os: require_text(body, &["info", "vps", "os_name"])?,
        cores: require_text(body, &["info", "vps", "cores"])?,
        ram: require_text(body, &["info", "vps", "ram"])?,
        space: require_text(body, &["info", "vps", "space"])?,
        bandwidth: user_bandwidth(body)?,
        datacenter: require_text(body, &["info", "server_name"])?,
    })
}

// The admin API has no per-VPS bandwidth block: the record carries the limit
// and the month's usage, and the remainder is derived.
fn admin_details(body: &Value, id: &str) -> Result<VpsDetails> {
    let path = |key: &'static str| ["vs", id, key];

    let limit = require_figure(body, &path("bandwidth"))?;
    let used = require_figure(body, &path("used_bandwidth"))?;
    let free = match (limit.as_f64(), used.as_f64()) {
        (Some(limit), _) if limit == 0.0 => None,
        (Some(limit), Some(used)) => Some(figure_from_f64((limit - used).max(0.0))),
        _ => None,
    };

    Ok(VpsDetails {
        ip: require_ip(body, &path("ips"))?,
        hostname: require_text(body, &path("hostname"))?,
        status: admin_status(body, id)?,
        os: require_text(body, &path("os_name"))?,
        cores: require_text(body, &path("cores"))?,
        ram: require_text(body, &path("ram"))?,
        space: require_text(body, &path("space"))?,
        bandwidth: BandwidthUsage { limit, used, free },
        datacenter: require_text(body, &path("server_name"))?,
    })
}

// Admin records carry no run state, only the suspension flag. A `status`
// field is used when a panel version sends one.
fn admin_status(body: &Value, id: &str) -> Result<String> {
    if let Some(status) = non_empty(lookup(body, &["vs", id, "status"])) {
        return Ok(status);
    }
    let suspended = require(body, &["vs", id, "suspended"])?;
    Ok(if truthy(suspended) { "suspended" } else { "active" }.to_string())
}

fn user_bandwidth(body: &Value) -> Result<BandwidthUsage> {
    let limit = require_figure(body, &["info", "bandwidth", "limit"])?;
    let used = require_figure(body, &["info", "bandwidth", "used"])?;
    let free = require_figure(body, &["info", "bandwidth", "free"])?;
    let unlimited = limit.as_f64() == Some(0.0);

    Ok(BandwidthUsage {
        limit,
        used,
        free: (!unlimited).then_some(free),
    })
}

// Records without an id, hostname or OS name are skipped. Partially
// provisioned servers end up here; the caller sees them only as a count.
fn descriptor(record: &Value) -> Option<VpsDescriptor> {
    let id = non_empty(record.get("vpsid"))?;
    let hostname = non_empty(record.get("hostname"))?;
    let os = non_empty(record.get("os_name"))?;

    Some(VpsDescriptor {
        id,
        name: record.get("vps_name").and_then(text),
        hostname,
        os,
        cores: record.get("cores").and_then(text),
        ram: record.get("ram").and_then(text),
        space: record.get("space").and_then(text),
        bandwidth: record.get("bandwidth").and_then(text),
        server_name: record.get("server_name").and_then(text),
        status: record.get("status").and_then(text),
        ips: record.get("ips").map(ip_list).unwrap_or_default(),
    })
}

fn admin_lifecycle(body: &Value) -> LifecycleResult {
    let message = match body.get("done") {
        Some(Value::Object(done)) => done.get("msg").and_then(text),
        Some(done) if truthy(done) => body.get("done_msg").and_then(text),
        _ => None,
    };
    let error = non_empty(body.get("error_msg")).or_else(|| body.get("error").and_then(error_text));
    let vps_id = body
        .get("vpsid")
        .and_then(text)
        .or_else(|| lookup(body, &["newvs", "vpsid"]).and_then(text));

    LifecycleResult {
        message,
        error,
        time_taken: body.get("time_taken").and_then(number),
        vps_id,
        raw: body.clone(),
    }
}

fn user_lifecycle(body: &Value) -> LifecycleResult {
    LifecycleResult {
        message: lookup(body, &["done", "msg"]).and_then(text),
        error: body.get("error").and_then(error_text),
        time_taken: body.get("time_taken").and_then(number),
        vps_id: body.get("vpsid").and_then(text),
        raw: body.clone(),
    }
}

fn malformed(body: &Value, message: String) -> Error {
    Error::malformed(message, serde_json::to_vec(body).unwrap_or_default())
}

fn lookup<'a>(body: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(body, |value, key| value.get(*key))
}

fn require<'a>(body: &'a Value, path: &[&str]) -> Result<&'a Value> {
    match lookup(body, path) {
        Some(Value::Null) | None => Err(malformed(
            body,
            format!("missing `{}` in panel response", path.join(".")),
        )),
        Some(value) => Ok(value),
    }
}

fn require_text(body: &Value, path: &[&str]) -> Result<String> {
    text(require(body, path)?)
        .ok_or_else(|| malformed(body, format!("`{}` is not a scalar", path.join("."))))
}

fn require_figure(body: &Value, path: &[&str]) -> Result<Number> {
    figure(require(body, path)?)
        .ok_or_else(|| malformed(body, format!("`{}` is not a number", path.join("."))))
}

fn require_ip(body: &Value, path: &[&str]) -> Result<String> {
    ip_list(require(body, path)?)
        .into_iter()
        .next()
        .ok_or_else(|| malformed(body, format!("`{}` holds no address", path.join("."))))
}

/// Scalar as text; the panel sends most numbers as strings and some as numbers.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value.and_then(text).filter(|s| !s.is_empty())
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Number in the panel's own form; numeric strings become integers when whole.
fn figure(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .map(Number::from)
                .or_else(|_| s.parse::<i64>().map(Number::from))
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(Number::from_f64))
        }
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn figure_from_f64(value: f64) -> Number {
    if value.fract() == 0.0 && (0.0..u64::MAX as f64).contains(&value) {
        Number::from(value as u64)
    } else {
        Number::from_f64(value).unwrap_or_else(|| Number::from(0))
    }
}

/// Addresses come as a string, a list, or a map keyed by address id.
fn ip_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(text).collect(),
        Value::Object(map) => map.values().filter_map(text).collect(),
        other => text(other).into_iter().filter(|s| !s.is_empty()).collect(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Panel errors arrive as a string, a list of strings or a map of them.
fn error_text(value: &Value) -> Option<String> {
    let parts: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(text).collect(),
        Value::Object(map) => map.values().filter_map(text).collect(),
        Value::Bool(false) | Value::Null => Vec::new(),
        other => text(other).into_iter().collect(),
    };
    let joined = parts
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("; ");
    (!joined.is_empty()).then_some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(raw: bool) -> Normalizer {
        Normalizer::new(ApiVariant::EndUser, raw)
    }

    fn admin(raw: bool) -> Normalizer {
        Normalizer::new(ApiVariant::Admin, raw)
    }

    fn manage_body() -> Value {
        json!({
            "info": {
                "ip": "1.2.3.4",
                "hostname": "h",
                "status": "on",
                "vps": {"os_name": "centos", "cores": "1", "ram": "512", "space": "10"},
                "bandwidth": {"limit": 100, "used": 10, "free": 90},
                "server_name": "dc1"
            }
        })
    }

    #[test]
    fn user_details_projection() {
        let details = user(false)
            .details("7", &manage_body())
            .unwrap()
            .into_normalized()
            .unwrap();

        assert_eq!(
            details,
            VpsDetails {
                ip: "1.2.3.4".into(),
                hostname: "h".into(),
                status: "on".into(),
                os: "centos".into(),
                cores: "1".into(),
                ram: "512".into(),
                space: "10".into(),
                bandwidth: BandwidthUsage {
                    limit: Number::from(100),
                    used: Number::from(10),
                    free: Some(Number::from(90)),
                },
                datacenter: "dc1".into(),
            }
        );

        let serialized = serde_json::to_value(&details).unwrap();
        assert_eq!(
            serialized,
            json!({
                "ip": "1.2.3.4", "hostname": "h", "status": "on", "os": "centos",
                "cores": "1", "ram": "512", "space": "10",
                "bandwidth": {"limit": 100, "used": 10, "free": 90},
                "datacenter": "dc1"
            })
        );
    }

    #[test]
    fn user_details_missing_path_is_malformed() {
        for (outer, inner) in [
            ("vps", Some("os_name")),
            ("bandwidth", Some("free")),
            ("server_name", None),
            ("ip", None),
        ] {
            let mut body = manage_body();
            let info = body["info"].as_object_mut().unwrap();
            match inner {
                Some(key) => {
                    info[outer].as_object_mut().unwrap().remove(key);
                }
                None => {
                    info.remove(outer);
                }
            }

            let err = user(false).details("7", &body).unwrap_err();
            assert!(
                matches!(err, Error::MalformedResponse { .. }),
                "removing {outer}.{inner:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn user_details_without_info_is_malformed() {
        let err = user(false).details("7", &json!({"error": ["Invalid"]})).unwrap_err();
        assert!(err.body_lossy().unwrap().contains("Invalid"));
    }

    #[test]
    fn admin_details_projection() {
        let body = json!({
            "vs": {
                "37": {
                    "vpsid": "37", "hostname": "h", "status": 1, "os_name": "centos",
                    "cores": "1", "ram": "128", "space": "2", "bandwidth": "10",
                    "used_bandwidth": "2.5", "server_name": "localhost",
                    "ips": {"2": "8.8.8.1", "3": "8.8.8.2"}
                }
            }
        });

        let details = admin(false).details("37", &body).unwrap().into_normalized().unwrap();
        assert_eq!(details.ip, "8.8.8.1");
        assert_eq!(details.status, "1");
        assert_eq!(details.datacenter, "localhost");
        assert_eq!(details.bandwidth.free, Number::from_f64(7.5));
    }

    // Record as returned by the admin `act=vs` listing; it has no `status`.
    fn listed_admin_record() -> Value {
        json!({"vs": {"37": {
            "vpsid": "37", "vps_name": "v1001", "uuid": "mark7ygoeqtfdf72", "serid": 0,
            "virt": "kvm", "uid": "55", "plid": "1", "hostname": "www.mydomainff.com",
            "osid": "270", "os_name": "centos-6.5-x86", "space": "2", "ram": "128",
            "cores": "1", "bandwidth": "1", "suspended": "0", "suspend_reason": null,
            "used_bandwidth": "0.01", "server_name": "localhost", "email": "tt@rrr.com",
            "os_distro": "centos", "ips": {"2": "8.8.8.1"}
        }}})
    }

    #[test]
    fn admin_details_without_status_field() {
        let details = admin(false)
            .details("37", &listed_admin_record())
            .unwrap()
            .into_normalized()
            .unwrap();
        assert_eq!(details.status, "active");
        assert_eq!(details.ip, "8.8.8.1");
        assert_eq!(details.bandwidth.limit, Number::from(1));

        let mut body = listed_admin_record();
        body["vs"]["37"]["suspended"] = json!("1");
        let details = admin(false).details("37", &body).unwrap().into_normalized().unwrap();
        assert_eq!(details.status, "suspended");

        body["vs"]["37"]["status"] = json!("1");
        let details = admin(false).details("37", &body).unwrap().into_normalized().unwrap();
        assert_eq!(details.status, "1");

        let mut body = listed_admin_record();
        body["vs"]["37"].as_object_mut().unwrap().remove("suspended");
        assert!(matches!(
            admin(false).details("37", &body),
            Err(Error::MalformedResponse { .. })
        ));
    }

    #[test]
    fn unlimited_bandwidth_has_no_remainder() {
        let mut body = listed_admin_record();
        body["vs"]["37"]["bandwidth"] = json!("0");
        body["vs"]["37"]["used_bandwidth"] = json!("3.75");

        let usage = admin(false)
            .details("37", &body)
            .unwrap()
            .into_normalized()
            .unwrap()
            .bandwidth;
        assert!(usage.is_unlimited());
        assert_eq!(usage.used, Number::from_f64(3.75).unwrap());
        assert_eq!(usage.free, None);

        let mut body = manage_body();
        body["info"]["bandwidth"] = json!({"limit": 0, "used": 12, "free": 0});
        let usage = user(false)
            .details("7", &body)
            .unwrap()
            .into_normalized()
            .unwrap()
            .bandwidth;
        assert_eq!(usage.free, None);
    }

    #[test]
    fn admin_remainder_never_negative() {
        let mut body = listed_admin_record();
        body["vs"]["37"]["bandwidth"] = json!("10");
        body["vs"]["37"]["used_bandwidth"] = json!("12");
        let usage = admin(false)
            .details("37", &body)
            .unwrap()
            .into_normalized()
            .unwrap()
            .bandwidth;
        assert_eq!(usage.free, Some(Number::from(0)));
    }

    #[test]
    fn numeric_strings_keep_integer_form() {
        assert_eq!(figure(&json!("100")), Some(Number::from(100)));
        assert_eq!(figure(&json!(" -3 ")), Some(Number::from(-3)));
        assert_eq!(figure(&json!("0.5")), Number::from_f64(0.5));
        assert_eq!(figure(&json!("n/a")), None);
        assert_eq!(figure_from_f64(8.0), Number::from(8));
    }

    #[test]
    fn admin_details_unknown_id_is_malformed() {
        let body = json!({"vs": {"37": {"vpsid": "37"}}});
        assert!(admin(false).details("38", &body).is_err());
        assert!(admin(true).details("38", &body).is_err());
    }

    #[test]
    fn raw_details_are_trimmed() {
        let body = manage_body();
        let raw = user(true).details("7", &body).unwrap().into_raw().unwrap();
        assert_eq!(raw, body["info"]);

        let body = json!({"vs": {"37": {"vpsid": "37"}}, "time_taken": "0.1"});
        let raw = admin(true).details("37", &body).unwrap().into_raw().unwrap();
        assert_eq!(raw, json!({"vpsid": "37"}));
    }

    #[test]
    fn list_scenario() {
        let body = json!({"data": {"vs": {"37": {
            "vpsid": "37", "hostname": "h", "os_name": "centos", "cores": "1", "ram": "128"
        }}}});

        let list = user(false).list(&body).unwrap().into_normalized().unwrap();
        assert_eq!(list.dropped, 0);
        assert_eq!(list.servers.len(), 1);

        let vps = &list.servers[0];
        assert_eq!(vps.id, "37");
        assert_eq!(vps.hostname, "h");
        assert_eq!(vps.os, "centos");
        assert_eq!(vps.cores.as_deref(), Some("1"));
        assert_eq!(vps.ram.as_deref(), Some("128"));
        assert!(vps.ips.is_empty());
    }

    #[test]
    fn list_drops_incomplete_records() {
        let body = json!({"data": {"vs": {
            "1": {"vpsid": "1", "hostname": "", "os_name": "centos"},
            "2": {"vpsid": "2", "hostname": "b", "os_name": "debian"},
            "3": {"vpsid": "3", "hostname": "c"},
            "4": null,
            "5": {"vpsid": "", "hostname": "e", "os_name": "alma"}
        }}});

        let list = user(false).list(&body).unwrap().into_normalized().unwrap();
        assert_eq!(list.dropped, 4);
        assert_eq!(list.servers.len(), 1);
        assert_eq!(list.servers[0].id, "2");
        for vps in &list.servers {
            assert!(!vps.id.is_empty() && !vps.hostname.is_empty() && !vps.os.is_empty());
        }
    }

    #[test]
    fn list_keeps_panel_order() {
        let body = json!({"vs": {
            "9": {"vpsid": "9", "hostname": "z", "os_name": "a"},
            "2": {"vpsid": "2", "hostname": "y", "os_name": "b"},
            "5": {"vpsid": "5", "hostname": "x", "os_name": "c"}
        }});

        let list = admin(false).list(&body).unwrap().into_normalized().unwrap();
        let ids: Vec<_> = list.servers.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["9", "2", "5"]);
    }

    #[test]
    fn list_accepts_empty_php_array() {
        let list = admin(false)
            .list(&json!({"vs": []}))
            .unwrap()
            .into_normalized()
            .unwrap();
        assert_eq!(list, VpsList::default());
    }

    #[test]
    fn list_without_record_map_is_malformed() {
        assert!(user(false).list(&json!({"vs": {}})).is_err());
        assert!(admin(false).list(&json!({"data": {"vs": {}}})).is_err());
        assert!(admin(false).list(&json!({"vs": "nope"})).is_err());
    }

    #[test]
    fn raw_list_is_record_map() {
        let body = json!({"data": {"vs": {"1": {"vpsid": "1"}}}, "time_taken": 0.2});
        let raw = user(true).list(&body).unwrap().into_raw().unwrap();
        assert_eq!(raw, json!({"1": {"vpsid": "1"}}));
    }

    #[test]
    fn admin_lifecycle_success_and_failure() {
        let body = json!({"done": 1, "done_msg": "VPS has been started", "time_taken": "0.52"});
        let result = admin(false).lifecycle(&body).unwrap().into_normalized().unwrap();
        assert_eq!(result.message.as_deref(), Some("VPS has been started"));
        assert_eq!(result.error, None);
        assert_eq!(result.time_taken, Some(0.52));
        assert!(result.succeeded());
        assert_eq!(result.raw, body);

        let body = json!({"error_msg": "VPS is already running"});
        let result = admin(false).lifecycle(&body).unwrap().into_normalized().unwrap();
        assert_eq!(result.message, None);
        assert_eq!(result.error.as_deref(), Some("VPS is already running"));
        assert!(!result.succeeded());

        let body = json!({"error": ["Invalid vpsid", "Not permitted"]});
        let result = admin(false).lifecycle(&body).unwrap().into_normalized().unwrap();
        assert_eq!(result.error.as_deref(), Some("Invalid vpsid; Not permitted"));
    }

    #[test]
    fn admin_create_reads_done_object() {
        let body = json!({"done": {"msg": "VPS created"}, "newvs": {"vpsid": 41}});
        let result = admin(false).lifecycle(&body).unwrap().into_normalized().unwrap();
        assert_eq!(result.message.as_deref(), Some("VPS created"));
        assert_eq!(result.vps_id.as_deref(), Some("41"));
    }

    #[test]
    fn user_lifecycle_projection() {
        let body = json!({"done": {"msg": "Started"}, "time_taken": 1.5, "vpsid": "37"});
        let result = user(false).lifecycle(&body).unwrap().into_normalized().unwrap();
        assert_eq!(result.message.as_deref(), Some("Started"));
        assert_eq!(result.time_taken, Some(1.5));
        assert_eq!(result.vps_id.as_deref(), Some("37"));
        assert_eq!(result.error, None);

        let body = json!({"done": false, "error": {"start": "Could not start"}});
        let result = user(false).lifecycle(&body).unwrap().into_normalized().unwrap();
        assert_eq!(result.message, None);
        assert_eq!(result.error.as_deref(), Some("Could not start"));
    }

    #[test]
    fn usage_passes_sub_object_through() {
        let body = json!({"ram": {"used": 100, "limit": 512}, "time_taken": "0.01", "other": 1});
        let report = user(false)
            .usage(Metric::Ram, &body)
            .unwrap()
            .into_normalized()
            .unwrap();
        assert_eq!(report.data, json!({"used": 100, "limit": 512}));
        assert_eq!(report.time_taken, Some(0.01));

        assert!(user(false).usage(Metric::Cpu, &body).is_err());
        assert_eq!(
            user(true).usage(Metric::Cpu, &body).unwrap().into_raw(),
            Some(body)
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let body = manage_body();
        let normalizer = user(false);
        let before = body.clone();
        assert_eq!(
            normalizer.details("7", &body).unwrap(),
            normalizer.details("7", &body).unwrap()
        );
        assert_eq!(body, before);

        let body = json!({"done": 1, "done_msg": "ok"});
        assert_eq!(
            admin(false).lifecycle(&body).unwrap(),
            admin(false).lifecycle(&body).unwrap()
        );
    }

    #[test]
    fn raw_round_trip_is_unmodified() {
        let body = json!({"done": 1, "done_msg": "ok", "extra": [1, 2, 3]});
        for normalizer in [admin(true), user(true)] {
            assert_eq!(normalizer.lifecycle(&body).unwrap(), Reply::Raw(body.clone()));
            assert_eq!(
                normalizer.usage(Metric::Plans, &body).unwrap(),
                Reply::Raw(body.clone())
            );
        }
    }
}
