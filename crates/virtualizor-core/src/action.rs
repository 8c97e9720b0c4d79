//! Catalog of panel actions.
//!
//! Each client operation maps to exactly one wire-level action code. The
//! catalog is closed: the client exposes one method per action rather than a
//! generic dispatcher.

use crate::config::ApiVariant;
use std::fmt;

/// Supported panel actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Provision a new VPS
    Create,
    /// List VPSes
    List,
    /// Fetch one VPS
    Get,
    /// Start a VPS
    Start,
    /// Stop a VPS
    Stop,
    /// Restart a VPS
    Restart,
    /// RAM usage
    Ram,
    /// CPU usage
    Cpu,
    /// Disk usage
    Disk,
    /// Bandwidth usage
    Bandwidth,
    /// Available plans
    Plans,
}

impl Action {
    /// Returns the semantic operation name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::List => "list",
            Self::Get => "get",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Ram => "ram",
            Self::Cpu => "cpu",
            Self::Disk => "disk",
            Self::Bandwidth => "bandwidth",
            Self::Plans => "plans",
        }
    }

    /// Returns the action code the panel expects for this operation.
    ///
    /// The admin API looks single servers up through its listing action
    /// filtered by id; the end-user API has dedicated list and manage actions.
    #[must_use]
    pub const fn code(&self, variant: ApiVariant) -> &'static str {
        match (self, variant) {
            (Self::Create, _) => "addvs",
            (Self::List | Self::Get, ApiVariant::Admin) => "vs",
            (Self::List, ApiVariant::EndUser) => "listvs",
            (Self::Get, ApiVariant::EndUser) => "vpsmanage",
            (Self::Start, _) => "start",
            (Self::Stop, _) => "stop",
            (Self::Restart, _) => "restart",
            (Self::Ram, _) => "ram",
            (Self::Cpu, _) => "cpu",
            (Self::Disk, _) => "disk",
            (Self::Bandwidth, _) => "bandwidth",
            (Self::Plans, _) => "plans",
        }
    }

    /// Returns true for the actions that change VPS state and notify subscribers.
    #[must_use]
    pub const fn is_lifecycle(&self) -> bool {
        matches!(self, Self::Create | Self::Start | Self::Stop | Self::Restart)
    }

    /// Returns all actions.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Create,
            Self::List,
            Self::Get,
            Self::Start,
            Self::Stop,
            Self::Restart,
            Self::Ram,
            Self::Cpu,
            Self::Disk,
            Self::Bandwidth,
            Self::Plans,
        ]
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_codes() {
        let variant = ApiVariant::Admin;
        assert_eq!(Action::Create.code(variant), "addvs");
        assert_eq!(Action::List.code(variant), "vs");
        assert_eq!(Action::Get.code(variant), "vs");
        assert_eq!(Action::Start.code(variant), "start");
        assert_eq!(Action::Stop.code(variant), "stop");
        assert_eq!(Action::Restart.code(variant), "restart");
        assert_eq!(Action::Ram.code(variant), "ram");
        assert_eq!(Action::Cpu.code(variant), "cpu");
        assert_eq!(Action::Disk.code(variant), "disk");
        assert_eq!(Action::Bandwidth.code(variant), "bandwidth");
        assert_eq!(Action::Plans.code(variant), "plans");
    }

    #[test]
    fn test_enduser_codes() {
        assert_eq!(Action::List.code(ApiVariant::EndUser), "listvs");
        assert_eq!(Action::Get.code(ApiVariant::EndUser), "vpsmanage");
        assert_eq!(Action::Start.code(ApiVariant::EndUser), "start");
    }

    #[test]
    fn test_catalog_is_total() {
        for action in Action::all() {
            for variant in [ApiVariant::Admin, ApiVariant::EndUser] {
                assert!(!action.code(variant).is_empty(), "{action} has no code");
            }
        }
        assert_eq!(Action::all().len(), 11);
    }

    #[test]
    fn test_lifecycle_actions() {
        let lifecycle: Vec<_> = Action::all().iter().filter(|a| a.is_lifecycle()).collect();
        assert_eq!(
            lifecycle,
            vec![&Action::Create, &Action::Start, &Action::Stop, &Action::Restart]
        );
    }
}
