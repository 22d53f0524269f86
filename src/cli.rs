//! Command line surface: parses arguments into domain values, resolves
//! credentials, calls the provider and renders the result.

use clap::{Parser, Subcommand};
use tabled::{Table, Tabled};
use tracing::debug;

use crate::credentials::{resolve_credentials, ConsoleTerminal};
use crate::env::Settings;
use crate::filter::Filter;
use crate::models::{parse_headers, Binding, Exchange, Message, Queue, QueueType};
use crate::rabbitmq::{Address, ConnectionConfig, Error, Provider, Result};

#[derive(Parser, Debug)]
#[command(name = "buneary")]
#[command(about = "An easy-to-use CLI client for RabbitMQ.")]
#[command(long_about = "buneary, pronounced bun-ear-y, is an easy-to-use RabbitMQ command line client \
for managing exchanges, managing queues and publishing messages to exchanges.")]
#[command(version)]
pub struct Cli {
    /// The username to connect with
    #[arg(short, long, global = true, default_value = "")]
    pub user: String,

    /// The password to authenticate with
    #[arg(short, long, global = true, default_value = "")]
    pub password: String,

    /// The virtual host to operate on (defaults to BUNEARY_VHOST or "/")
    #[arg(long, global = true)]
    pub vhost: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a resource
    #[command(subcommand)]
    Create(CreateCommands),

    /// Get resources
    #[command(subcommand)]
    Get(GetCommands),

    /// Publish a message to an exchange
    Publish {
        address: String,
        exchange: String,
        routing_key: String,
        body: String,
        /// Headers as comma-separated key=value pairs
        #[arg(long, value_name = "K1=V1,K2=V2")]
        headers: Option<String>,
    },

    /// Delete a resource
    #[command(subcommand)]
    Delete(DeleteCommands),

    /// Print version information
    Version,
}

#[derive(Subcommand, Debug)]
pub enum CreateCommands {
    /// Create a new exchange
    Exchange {
        address: String,
        name: String,
        #[arg(value_name = "TYPE")]
        kind: String,
        /// Make the exchange durable
        #[arg(long)]
        durable: bool,
        /// Make the exchange auto-deleted
        #[arg(long)]
        auto_delete: bool,
        /// Make the exchange internal
        #[arg(long)]
        internal: bool,
    },

    /// Create a new queue
    Queue {
        address: String,
        name: String,
        #[arg(value_name = "TYPE")]
        kind: String,
        /// Make the queue durable
        #[arg(long)]
        durable: bool,
        /// Make the queue auto-deleted
        #[arg(long)]
        auto_delete: bool,
    },

    /// Create a new binding
    Binding {
        address: String,
        name: String,
        target: String,
        binding_key: String,
        /// The target is another exchange
        #[arg(long)]
        to_exchange: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum GetCommands {
    /// Get all exchanges, or a single one by name
    #[command(visible_alias = "exchange")]
    Exchanges { address: String, name: Option<String> },

    /// Get all queues, or a single one by name
    #[command(visible_alias = "queue")]
    Queues { address: String, name: Option<String> },

    /// Get all bindings, those from one exchange, or those between two resources
    #[command(visible_alias = "binding")]
    Bindings {
        address: String,
        from: Option<String>,
        target: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DeleteCommands {
    /// Delete an exchange
    Exchange { address: String, name: String },

    /// Delete a queue
    Queue { address: String, name: String },
}

/// A fully parsed request. Building one performs all argument validation, so
/// a malformed command fails before credentials are asked for.
#[derive(Debug)]
pub enum Request {
    CreateExchange(Exchange),
    CreateQueue(Queue),
    CreateBinding(Binding),
    GetExchanges(Filter<Exchange>),
    GetQueues(Filter<Queue>),
    GetBindings(Filter<Binding>),
    Publish(Message),
    DeleteExchange(Exchange),
    DeleteQueue(Queue),
}

impl Commands {
    /// Splits the command into the broker address and the request to run.
    /// `None` for commands that never reach the broker.
    pub fn into_request(self) -> Result<Option<(Address, Request)>> {
        let (address, request) = match self {
            Commands::Version => return Ok(None),
            Commands::Create(CreateCommands::Exchange {
                address,
                name,
                kind,
                durable,
                auto_delete,
                internal,
            }) => (
                address,
                Request::CreateExchange(Exchange {
                    name,
                    kind: kind.parse()?,
                    durable,
                    auto_delete,
                    internal,
                    no_wait: false,
                }),
            ),
            Commands::Create(CreateCommands::Queue {
                address,
                name,
                kind,
                durable,
                auto_delete,
            }) => (
                address,
                Request::CreateQueue(Queue {
                    name,
                    kind: QueueType::parse_or_default(&kind),
                    durable,
                    auto_delete,
                }),
            ),
            Commands::Create(CreateCommands::Binding {
                address,
                name,
                target,
                binding_key,
                to_exchange,
            }) => (
                address,
                Request::CreateBinding(Binding::new(name, target, binding_key, to_exchange)),
            ),
            Commands::Get(GetCommands::Exchanges { address, name }) => {
                let filter: Filter<Exchange> = name.map(Filter::named).unwrap_or_default();
                (address, Request::GetExchanges(filter))
            }
            Commands::Get(GetCommands::Queues { address, name }) => {
                let filter: Filter<Queue> = name.map(Filter::named).unwrap_or_default();
                (address, Request::GetQueues(filter))
            }
            Commands::Get(GetCommands::Bindings { address, from, target }) => {
                let filter = match (from, target) {
                    (Some(from), Some(target)) => Filter::between(from, target),
                    (Some(from), None) => Filter::from_exchange(from),
                    _ => Filter::all(),
                };
                (address, Request::GetBindings(filter))
            }
            Commands::Publish {
                address,
                exchange,
                routing_key,
                body,
                headers,
            } => {
                let headers = match headers {
                    Some(headers) => parse_headers(&headers)?,
                    None => None,
                };
                let message = Message::new(exchange, routing_key, body).with_headers(headers);
                (address, Request::Publish(message))
            }
            Commands::Delete(DeleteCommands::Exchange { address, name }) => {
                (address, Request::DeleteExchange(Exchange::named(name)))
            }
            Commands::Delete(DeleteCommands::Queue { address, name }) => {
                (address, Request::DeleteQueue(Queue::named(name)))
            }
        };

        Ok(Some((Address::parse(&address)?, request)))
    }
}

/// Runs one command end to end. Output goes to stdout; errors are returned to
/// the caller, which decides the exit status.
pub async fn run(cli: Cli, settings: Settings) -> Result<()> {
    let Some((address, request)) = cli.command.into_request()? else {
        println!("buneary version {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    };

    let credentials = resolve_credentials(&cli.user, &cli.password, ConsoleTerminal).await?;

    let mut config = ConnectionConfig::for_address(address, &credentials.user, &credentials.password, &settings);
    if let Some(vhost) = cli.vhost {
        config = config.with_vhost(vhost);
    }

    let provider = Provider::new(config);
    debug!(request = ?request, "Executing request");

    tokio::select! {
        result = execute(&provider, request) => result,
        _ = tokio::signal::ctrl_c() => Err(Error::Cancelled),
    }
}

pub async fn execute(provider: &Provider, request: Request) -> Result<()> {
    match request {
        Request::CreateExchange(exchange) => provider.create_exchange(exchange).await,
        Request::CreateQueue(queue) => provider.create_queue(queue).await.map(|_| ()),
        Request::CreateBinding(binding) => provider.create_binding(binding).await,
        Request::GetExchanges(filter) => {
            let exchanges = provider.get_exchanges(&filter).await?;
            println!("{}", exchange_table(&exchanges));
            Ok(())
        }
        Request::GetQueues(filter) => {
            let queues = provider.get_queues(&filter).await?;
            println!("{}", queue_table(&queues));
            Ok(())
        }
        Request::GetBindings(filter) => {
            let bindings = provider.get_bindings(&filter).await?;
            println!("{}", binding_table(&bindings));
            Ok(())
        }
        Request::Publish(message) => provider.publish_message(message).await,
        Request::DeleteExchange(exchange) => provider.delete_exchange(exchange).await,
        Request::DeleteQueue(queue) => {
            let name = queue.name.clone();
            let purged = provider.delete_queue(queue).await?;
            println!("deleted queue '{}', {} messages purged", name, purged);
            Ok(())
        }
    }
}

#[derive(Tabled)]
struct ExchangeRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Durable")]
    durable: &'static str,
    #[tabled(rename = "Auto-Delete")]
    auto_delete: &'static str,
    #[tabled(rename = "Internal")]
    internal: &'static str,
}

#[derive(Tabled)]
struct QueueRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Durable")]
    durable: &'static str,
    #[tabled(rename = "Auto-Delete")]
    auto_delete: &'static str,
}

#[derive(Tabled)]
struct BindingRow {
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Binding Key")]
    key: String,
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn exchange_table(exchanges: &[Exchange]) -> Table {
    Table::new(exchanges.iter().map(|exchange| ExchangeRow {
        name: exchange.name.clone(),
        kind: exchange.kind.to_string(),
        durable: yes_no(exchange.durable),
        auto_delete: yes_no(exchange.auto_delete),
        internal: yes_no(exchange.internal),
    }))
}

fn queue_table(queues: &[Queue]) -> Table {
    Table::new(queues.iter().map(|queue| QueueRow {
        name: queue.name.clone(),
        kind: queue.kind.to_string(),
        durable: yes_no(queue.durable),
        auto_delete: yes_no(queue.auto_delete),
    }))
}

fn binding_table(bindings: &[Binding]) -> Table {
    Table::new(bindings.iter().map(|binding| BindingRow {
        from: binding.from.name.clone(),
        target: binding.target_name.clone(),
        kind: binding.kind.to_string(),
        key: binding.key.clone(),
    }))
}
