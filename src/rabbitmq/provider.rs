//! The provider is the only component that talks to the broker.
//!
//! Publishing is an AMQP primitive and goes through a [`Publisher`]; topology
//! CRUD and listing go through the [`Management`] API. Callers only see the
//! provider, never the transport.

use tracing::{debug, info, instrument};

use super::amqp_client::{AmqpPublisher, Publisher};
use super::connection::ConnectionConfig;
use super::errors::{Context, Error, Result};
use super::management::{HttpManagement, Management};
use crate::filter::Filter;
use crate::models::{Binding, Exchange, Message, Queue};

pub struct Provider {
    publisher: Box<dyn Publisher>,
    management: Box<dyn Management>,
}

impl Provider {
    /// A provider backed by AMQP for publishing and the HTTP management API
    /// for everything else, both reaching the broker described by `config`.
    pub fn new(config: ConnectionConfig) -> Self {
        debug!(config = ?config, "Creating provider");

        Self {
            publisher: Box::new(AmqpPublisher::new(config.clone())),
            management: Box::new(HttpManagement::new(config)),
        }
    }

    pub fn with_backends<P, M>(publisher: P, management: M) -> Self
    where
        P: Publisher + 'static,
        M: Management + 'static,
    {
        Self {
            publisher: Box::new(publisher),
            management: Box::new(management),
        }
    }

    #[instrument(skip(self, exchange), fields(exchange = %exchange.name))]
    pub async fn create_exchange(&self, exchange: Exchange) -> Result<()> {
        let context = Context::new("create exchange", &exchange.name);
        require_name(&exchange.name, "exchange")?;

        self.management
            .declare_exchange(&exchange)
            .await
            .map_err(|e| e.within(context))?;

        info!(kind = %exchange.kind, durable = exchange.durable, "Created exchange");
        Ok(())
    }

    pub async fn get_exchanges(&self, filter: &Filter<Exchange>) -> Result<Vec<Exchange>> {
        let exchanges = self
            .management
            .list_exchanges()
            .await
            .map_err(|e| e.within(Context::new("get exchanges", "")))?;

        let total = exchanges.len();
        let exchanges = filter.apply(exchanges);
        debug!(total, matched = exchanges.len(), "Listed exchanges");

        Ok(exchanges)
    }

    #[instrument(skip(self, exchange), fields(exchange = %exchange.name))]
    pub async fn delete_exchange(&self, exchange: Exchange) -> Result<()> {
        let context = Context::new("delete exchange", &exchange.name);
        require_name(&exchange.name, "exchange")?;

        self.management
            .delete_exchange(&exchange.name)
            .await
            .map_err(|e| e.within(context))?;

        info!("Deleted exchange");
        Ok(())
    }

    /// Returns the name the broker registered the queue under.
    #[instrument(skip(self, queue), fields(queue = %queue.name))]
    pub async fn create_queue(&self, queue: Queue) -> Result<String> {
        let context = Context::new("create queue", &queue.name);
        require_name(&queue.name, "queue")?;

        let name = self
            .management
            .declare_queue(&queue)
            .await
            .map_err(|e| e.within(context))?;

        info!(kind = %queue.kind, durable = queue.durable, "Created queue");
        Ok(name)
    }

    pub async fn get_queues(&self, filter: &Filter<Queue>) -> Result<Vec<Queue>> {
        let queues = self
            .management
            .list_queues()
            .await
            .map_err(|e| e.within(Context::new("get queues", "")))?;

        let total = queues.len();
        let queues = filter.apply(queues);
        debug!(total, matched = queues.len(), "Listed queues");

        Ok(queues)
    }

    /// Returns how many messages were dropped along with the queue.
    #[instrument(skip(self, queue), fields(queue = %queue.name))]
    pub async fn delete_queue(&self, queue: Queue) -> Result<u64> {
        let context = Context::new("delete queue", &queue.name);
        require_name(&queue.name, "queue")?;

        let purged = self
            .management
            .delete_queue(&queue.name)
            .await
            .map_err(|e| e.within(context))?;

        info!(purged, "Deleted queue");
        Ok(purged)
    }

    #[instrument(skip(self, binding), fields(from = %binding.from.name, target = %binding.target_name))]
    pub async fn create_binding(&self, binding: Binding) -> Result<()> {
        let context = Context::new(
            "create binding",
            format!("{} -> {}", binding.from.name, binding.target_name),
        );
        require_name(&binding.from.name, "source exchange")?;
        require_name(&binding.target_name, "binding target")?;

        self.management
            .declare_binding(&binding)
            .await
            .map_err(|e| e.within(context))?;

        info!(kind = %binding.kind, key = %binding.key, "Created binding");
        Ok(())
    }

    pub async fn get_bindings(&self, filter: &Filter<Binding>) -> Result<Vec<Binding>> {
        let bindings = self
            .management
            .list_bindings()
            .await
            .map_err(|e| e.within(Context::new("get bindings", "")))?;

        let total = bindings.len();
        let bindings = filter.apply(bindings);
        debug!(total, matched = bindings.len(), "Listed bindings");

        Ok(bindings)
    }

    /// Publishing to the empty exchange name targets the default exchange.
    #[instrument(skip(self, message), fields(exchange = %message.target.name, routing_key = %message.routing_key))]
    pub async fn publish_message(&self, message: Message) -> Result<()> {
        let context = Context::new("publish to exchange", &message.target.name);

        self.publisher
            .publish(&message)
            .await
            .map_err(|e| e.within(context))?;

        info!(bytes = message.body.len(), "Published message");
        Ok(())
    }
}

fn require_name(name: &str, what: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::argument(format!("{} name must not be empty", what)));
    }
    Ok(())
}
