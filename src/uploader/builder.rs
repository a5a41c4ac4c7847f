use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use crate::channel::Channel;
use crate::config::UploaderConfig;
use crate::policies::{SendErrorPolicy, SubmitPolicy};
use crate::uploader::client::StreamClient;
use crate::uploader::shared::UploaderOptions;
use crate::uploader::stream::StreamUploader;

/// Builder for a [`StreamUploader`] with non-default configuration.
pub struct UploaderBuilder<C: StreamClient, Id> {
    client: C,
    channel: Channel,
    cfg: UploaderConfig,
    _id: PhantomData<fn(Id)>,
}

impl<C, Id> UploaderBuilder<C, Id>
where
    C: StreamClient,
    Id: std::fmt::Debug + Send + Sync + 'static,
{
    /// Creates a builder with [`UploaderConfig::default`].
    pub fn new(client: C, channel: Channel) -> Self {
        Self {
            client,
            channel,
            cfg: UploaderConfig::default(),
            _id: PhantomData,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, cfg: UploaderConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the name used as diagnostic origin and in logs.
    pub fn name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.cfg.name = name.into();
        self
    }

    /// Sets the queue capacity (clamped to at least 1).
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.cfg.queue_capacity = capacity;
        self
    }

    /// Sets the idle heartbeat period.
    pub fn idle_tick(mut self, tick: Duration) -> Self {
        self.cfg.idle_tick = tick;
        self
    }

    /// Sets how long and how often `submit` waits on a full queue.
    pub fn submit_policy(mut self, policy: SubmitPolicy) -> Self {
        self.cfg.submit = policy;
        self
    }

    /// Sets the worker's reaction to a failed stream send.
    pub fn on_send_error(mut self, policy: SendErrorPolicy) -> Self {
        self.cfg.on_send_error = policy;
        self
    }

    /// Builds an idle uploader. Nothing is spawned until
    /// [`StreamUploader::run_uploader_worker`] or [`StreamUploader::shutdown_and_wait`].
    pub fn build(self) -> StreamUploader<C, Id> {
        StreamUploader::new(self.client, UploaderOptions::new(self.cfg, self.channel))
    }
}
