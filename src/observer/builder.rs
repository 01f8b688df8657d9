//! Fluent construction of a [`DealObserver`].
//!
//! Configuration starts from [`ObserverConfig::new`] (defaults, optional file,
//! environment) unless one is supplied, then the individual setters are applied
//! on top and the result is validated once in [`ObserverBuilder::build`].
//!
//! ```ignore
//! let observer = DealObserver::builder(reader, writer)
//!     .poll_interval(Duration::from_secs(2))
//!     .claim_costs(55_000, 130_000)
//!     .build()?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::DealObserver;
use crate::LedgerReader;
use crate::LedgerWriter;
use crate::ObserverConfig;
use crate::Result;

pub struct ObserverBuilder {
    reader: Arc<dyn LedgerReader>,
    writer: Arc<dyn LedgerWriter>,
    config: Option<ObserverConfig>,
    poll_interval: Option<Duration>,
    claim_costs: Option<(u64, u64)>,
}

impl ObserverBuilder {
    pub fn new(
        reader: Arc<dyn LedgerReader>,
        writer: Arc<dyn LedgerWriter>,
    ) -> Self {
        Self {
            reader,
            writer,
            config: None,
            poll_interval: None,
            claim_costs: None,
        }
    }

    /// Use `config` instead of loading one from the environment.
    pub fn config(
        mut self,
        config: ObserverConfig,
    ) -> Self {
        self.config = Some(config);
        self
    }

    pub fn poll_interval(
        mut self,
        interval: Duration,
    ) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Per-item costs of a plain claim and of an initialize-and-claim.
    pub fn claim_costs(
        mut self,
        claim_cost: u64,
        init_and_claim_cost: u64,
    ) -> Self {
        self.claim_costs = Some((claim_cost, init_and_claim_cost));
        self
    }

    pub fn build(self) -> Result<DealObserver> {
        let mut config = match self.config {
            Some(config) => config,
            None => ObserverConfig::new()?,
        };
        if let Some(interval) = self.poll_interval {
            config.watch.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        }
        if let Some((claim_cost, init_and_claim_cost)) = self.claim_costs {
            config.claim.claim_cost = claim_cost;
            config.claim.init_and_claim_cost = init_and_claim_cost;
        }
        let config = config.validate()?;
        debug!(?config, "deal observer configured");

        Ok(DealObserver::from_parts(self.reader, self.writer, config))
    }
}
