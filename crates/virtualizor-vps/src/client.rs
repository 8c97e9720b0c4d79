//! Asynchronous VPS client implementation.
//!
//! Every operation runs the same three steps: build the request from its
//! parameters and the stored credentials, perform exactly one exchange, then
//! shape the reply. Lifecycle operations publish their result to subscribers
//! before returning it. There is no retry and no partial success.

use crate::events::{Event, EventBus, LifecycleEvent, SubscriptionId};
use crate::models::{
    BandwidthMonth, CreateVpsRequest, LifecycleResult, ListFilters, Reply, UsageReport,
    VpsDetails, VpsList,
};
use crate::normalize::{Metric, Normalizer};
use crate::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use virtualizor_core::action::Action;
use virtualizor_core::client::{ApiRequest, HttpTransport, Transport};
use virtualizor_core::config::{ApiVariant, ClientConfig, Credentials};
use virtualizor_core::query::QueryParams;
use virtualizor_core::Error;

/// Builder for [`VpsClient`].
#[derive(Clone)]
pub struct VpsClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl VpsClientBuilder {
    /// Create a builder from a configuration.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
        }
    }

    /// Use a custom transport instead of the reqwest one.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Validate the configuration and build the client.
    pub fn build(self) -> Result<VpsClient> {
        self.config.check()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::from_config(&self.config)?),
        };

        let normalizer = Normalizer::new(self.config.variant(), self.config.raw_mode);

        Ok(VpsClient {
            transport,
            credentials: Arc::new(self.config.credentials),
            normalizer,
            events: Arc::new(EventBus::new()),
        })
    }
}

/// Asynchronous VPS client.
///
/// Clones share the same transport and subscriber table.
#[derive(Clone)]
pub struct VpsClient {
    transport: Arc<dyn Transport>,
    credentials: Arc<Credentials>,
    normalizer: Normalizer,
    events: Arc<EventBus>,
}

impl VpsClient {
    /// Construct a client directly from the configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        VpsClientBuilder::new(config).build()
    }

    /// Start a builder for the configuration.
    #[must_use]
    pub fn builder(config: ClientConfig) -> VpsClientBuilder {
        VpsClientBuilder::new(config)
    }

    /// The API variant this client speaks.
    #[must_use]
    pub const fn variant(&self) -> ApiVariant {
        self.normalizer.variant()
    }

    /// Whether results are returned raw.
    #[must_use]
    pub const fn raw_mode(&self) -> bool {
        self.normalizer.raw_mode()
    }

    /// The client's subscriber table.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to a lifecycle event.
    pub fn on<F>(&self, event: LifecycleEvent, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.events.subscribe(event, handler)
    }

    /// Remove a subscription.
    pub fn off(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Provision a VPS. Publishes [`LifecycleEvent::Created`].
    pub async fn create(&self, request: &CreateVpsRequest) -> Result<Reply<LifecycleResult>> {
        request.check()?;

        let mut params = self.action_params(Action::Create);
        request.push_into(&mut params);

        let body = self
            .execute(ApiRequest::post(Action::Create, self.encode(params), None))
            .await?;
        let reply = self.normalizer.lifecycle(&body)?;
        self.notify(LifecycleEvent::Created, &reply);
        Ok(reply)
    }

    /// Fetch one VPS.
    pub async fn get(&self, id: &str) -> Result<Reply<VpsDetails>> {
        let id = require_id(id)?;

        let mut params = self.action_params(Action::Get);
        params.push(self.id_key(Action::Get), id);

        let body = self
            .execute(ApiRequest::get(Action::Get, self.encode(params)))
            .await?;
        self.normalizer.details(id, &body)
    }

    /// List VPSes matching the filters.
    pub async fn list(&self, filters: &ListFilters) -> Result<Reply<VpsList>> {
        let mut params = self.action_params(Action::List);
        filters.push_into(&mut params);

        let body = self
            .execute(ApiRequest::get(Action::List, self.encode(params)))
            .await?;
        let reply = self.normalizer.list(&body)?;

        if let Reply::Normalized(list) = &reply {
            if list.dropped > 0 {
                warn!(
                    dropped = list.dropped,
                    kept = list.servers.len(),
                    "Skipped VPS records without id, hostname or OS name"
                );
            }
        }

        Ok(reply)
    }

    /// Start a VPS. Publishes [`LifecycleEvent::Started`].
    pub async fn start(&self, id: &str) -> Result<Reply<LifecycleResult>> {
        self.power(Action::Start, LifecycleEvent::Started, id).await
    }

    /// Stop a VPS. Publishes [`LifecycleEvent::Stopped`].
    pub async fn stop(&self, id: &str) -> Result<Reply<LifecycleResult>> {
        self.power(Action::Stop, LifecycleEvent::Stopped, id).await
    }

    /// Restart a VPS. Publishes [`LifecycleEvent::Restarted`].
    pub async fn restart(&self, id: &str) -> Result<Reply<LifecycleResult>> {
        self.power(Action::Restart, LifecycleEvent::Restarted, id).await
    }

    /// RAM usage of a VPS.
    pub async fn ram(&self, id: &str) -> Result<Reply<UsageReport>> {
        self.usage(Metric::Ram, id, None).await
    }

    /// CPU usage of a VPS.
    pub async fn cpu(&self, id: &str) -> Result<Reply<UsageReport>> {
        self.usage(Metric::Cpu, id, None).await
    }

    /// Disk usage of a VPS.
    pub async fn disk(&self, id: &str) -> Result<Reply<UsageReport>> {
        self.usage(Metric::Disk, id, None).await
    }

    /// Bandwidth usage of a VPS for one month.
    pub async fn bandwidth(&self, id: &str, month: BandwidthMonth) -> Result<Reply<UsageReport>> {
        self.usage(Metric::Bandwidth, id, Some(month)).await
    }

    /// Plans available on the panel.
    pub async fn plans(&self) -> Result<Reply<UsageReport>> {
        let params = self.action_params(Action::Plans);
        let body = self
            .execute(ApiRequest::get(Action::Plans, self.encode(params)))
            .await?;
        self.normalizer.usage(Metric::Plans, &body)
    }

    async fn power(
        &self,
        action: Action,
        event: LifecycleEvent,
        id: &str,
    ) -> Result<Reply<LifecycleResult>> {
        let id = require_id(id)?;
        let code = action.code(self.variant());

        // The admin API names the power action in `action` and confirms the
        // VPS section with `act=vs`; the end-user API wants `do=1`.
        let request = match self.variant() {
            ApiVariant::Admin => {
                let mut params = QueryParams::new();
                params.push("action", code);
                params.push(self.id_key(action), id);

                let mut form = QueryParams::new();
                form.push("act", "vs");
                ApiRequest::post(action, self.encode(params), Some(form.encode_form()))
            }
            ApiVariant::EndUser => {
                let mut params = self.action_params(action);
                params.push("do", 1);
                params.push(self.id_key(action), id);
                ApiRequest::get(action, self.encode(params))
            }
        };

        let body = self.execute(request).await?;
        let reply = self.normalizer.lifecycle(&body)?;
        self.notify(event, &reply);
        Ok(reply)
    }

    async fn usage(
        &self,
        metric: Metric,
        id: &str,
        month: Option<BandwidthMonth>,
    ) -> Result<Reply<UsageReport>> {
        let id = require_id(id)?;
        let action = metric.action();

        let mut params = self.action_params(action);
        params.push(self.id_key(action), id);
        let query = self.encode(params);

        let request = match month {
            Some(month) => {
                let mut form = QueryParams::new();
                form.push("show", month);
                ApiRequest::post(action, query, Some(form.encode_form()))
            }
            None => ApiRequest::get(action, query),
        };

        let body = self.execute(request).await?;
        self.normalizer.usage(metric, &body)
    }

    async fn execute(&self, request: ApiRequest) -> Result<Value> {
        info!(
            action = %request.action,
            variant = %self.variant(),
            method = %request.method,
            "Sending Virtualizor request"
        );
        self.transport.execute(request).await
    }

    fn notify(&self, kind: LifecycleEvent, reply: &Reply<LifecycleResult>) {
        self.events.publish(&Event {
            kind,
            payload: reply.clone(),
        });
    }

    fn action_params(&self, action: Action) -> QueryParams {
        let mut params = QueryParams::new();
        params.push("act", action.code(self.variant()));
        params
    }

    fn encode(&self, mut params: QueryParams) -> String {
        params.push_credentials(&self.credentials);
        params.encode()
    }

    fn id_key(&self, action: Action) -> &'static str {
        match (self.variant(), action) {
            (ApiVariant::Admin, Action::Get | Action::Start | Action::Stop | Action::Restart) => {
                "vpsid"
            }
            (ApiVariant::Admin, Action::Disk | Action::Bandwidth) => "changeserid",
            _ => "svs",
        }
    }
}

fn require_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(Error::ValidationError("vpsid is required".to_string()));
    }
    Ok(id)
}
