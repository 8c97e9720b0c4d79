//! VPS client and data models for the Virtualizor panel API.
//!
//! Provides an asynchronous client that turns VPS lifecycle operations into
//! panel requests, normalizes the panel's replies into typed results and
//! notifies subscribers of lifecycle changes.

#![deny(missing_docs)]

pub mod client;
pub mod events;
pub mod models;
pub mod normalize;

pub use client::{VpsClient, VpsClientBuilder};
pub use events::{Event, EventBus, LifecycleEvent, SubscriptionId};
pub use models::{
    BandwidthMonth, BandwidthUsage, CreateVpsRequest, LifecycleResult, ListFilters, Reply,
    StorageSpace, UsageReport, VpsDescriptor, VpsDetails, VpsList,
};
pub use normalize::{Metric, Normalizer};

/// Convenient result alias that reuses the shared Virtualizor error type.
pub type Result<T> = virtualizor_core::Result<T>;
