//! Console harness: drives the registration flows from stdin.

mod console;

use std::error::Error;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use registration_flows::adapters::{
    ConsoleChannel, HttpRecordApi, InMemoryDraftStore, InMemoryIntentHistory, InMemoryRecordApi,
    InMemorySessionStore, RedisDraftStore, RedisIntentHistory, RedisKeys, RedisSessionStore,
};
use registration_flows::application::flows::{
    death_definition, death_messages, expense_definition, expense_messages,
};
use registration_flows::application::{FlowEngine, FlowPorts, FlowRouter, RouterError};
use registration_flows::config::{AppConfig, LogFormat, RuntimeConfig, StorageBackend};
use registration_flows::domain::foundation::UserId;
use registration_flows::domain::registration::{FlowContext, FlowMessages, FlowType};
use registration_flows::ports::{
    DraftStore, IntentHistory, MessagingChannel, RecordApi, SessionStore,
};

use console::{parse_line, ConsoleInput, HELP};

const CONSOLE_USER_VAR: &str = "REGISTRATION_FLOWS_USER";

struct Stores {
    sessions: Arc<dyn SessionStore>,
    drafts: Arc<dyn DraftStore>,
    intents: Arc<dyn IntentHistory>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.runtime);

    tracing::info!(
        backend = ?config.storage.backend,
        record_api = config.record_api.base_url.as_deref().unwrap_or("in-memory"),
        "Starting registration flows console"
    );

    let stores = build_stores(&config).await?;
    let records = build_record_api(&config)?;
    let channel: Arc<dyn MessagingChannel> = Arc::new(ConsoleChannel::new());
    let router = build_router(&config, &stores, records, channel)?;

    let user = std::env::var(CONSOLE_USER_VAR).unwrap_or_else(|_| "console".to_string());
    let user_id = UserId::new(user)?;
    run(&router, user_id).await
}

fn init_tracing(runtime: &RuntimeConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&runtime.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    // stdout carries the conversation
    match runtime.log_format {
        LogFormat::Json => registry.with(fmt::layer().json().with_writer(std::io::stderr)).init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_writer(std::io::stderr)).init(),
    }
}

async fn build_stores(config: &AppConfig) -> Result<Stores, Box<dyn Error>> {
    let storage = &config.storage;
    match storage.backend {
        StorageBackend::Memory => Ok(Stores {
            sessions: Arc::new(InMemorySessionStore::new(storage.session_ttl())),
            drafts: Arc::new(InMemoryDraftStore::new(storage.draft_ttl())),
            intents: Arc::new(InMemoryIntentHistory::new(
                storage.intent_max_entries,
                storage.intent_ttl(),
            )),
        }),
        StorageBackend::Redis => {
            let client = redis::Client::open(config.redis.url.as_str())?;
            let conn = tokio::time::timeout(
                config.redis.timeout(),
                client.get_multiplexed_async_connection(),
            )
            .await??;
            let keys = RedisKeys::new(config.redis.key_prefix.clone());
            tracing::info!(prefix = %config.redis.key_prefix, "Connected to Redis");
            Ok(Stores {
                sessions: Arc::new(RedisSessionStore::new(
                    conn.clone(),
                    keys.clone(),
                    storage.session_ttl(),
                )),
                drafts: Arc::new(RedisDraftStore::new(
                    conn.clone(),
                    keys.clone(),
                    storage.draft_ttl(),
                )),
                intents: Arc::new(RedisIntentHistory::new(
                    conn,
                    keys,
                    storage.intent_max_entries,
                    storage.intent_ttl(),
                )),
            })
        }
    }
}

fn build_record_api(config: &AppConfig) -> Result<Arc<dyn RecordApi>, Box<dyn Error>> {
    match config.record_api.http() {
        Some(http) => Ok(Arc::new(HttpRecordApi::new(http)?)),
        None => {
            tracing::warn!("No record API configured, records are kept in memory");
            Ok(Arc::new(InMemoryRecordApi::new()))
        }
    }
}

/// The configured catalog of `flow_type`, or `fallback` when none is set.
fn messages_for(
    config: &AppConfig,
    flow_type: FlowType,
    fallback: FlowMessages,
) -> Result<FlowMessages, Box<dyn Error>> {
    match config.messages_path(flow_type) {
        Some(path) => {
            let yaml = std::fs::read_to_string(path)?;
            Ok(FlowMessages::from_yaml_str(&yaml)?)
        }
        None => Ok(fallback),
    }
}

fn build_router(
    config: &AppConfig,
    stores: &Stores,
    records: Arc<dyn RecordApi>,
    channel: Arc<dyn MessagingChannel>,
) -> Result<FlowRouter, Box<dyn Error>> {
    let ports = FlowPorts {
        sessions: stores.sessions.clone(),
        channel: channel.clone(),
        intents: stores.intents.clone(),
    };

    let expense = expense_definition(
        stores.drafts.clone(),
        records.clone(),
        channel.clone(),
        config.access_gate(FlowType::Expense),
    )
    .with_messages(messages_for(config, FlowType::Expense, expense_messages())?);
    let death = death_definition(
        stores.drafts.clone(),
        records,
        channel,
        config.access_gate(FlowType::Death),
    )
    .with_messages(messages_for(config, FlowType::Death, death_messages())?);

    Ok(FlowRouter::builder(stores.sessions.clone())
        .register(Arc::new(FlowEngine::new(expense, ports.clone())))
        .register(Arc::new(FlowEngine::new(death, ports)))
        .build())
}

async fn run(router: &FlowRouter, user_id: UserId) -> Result<(), Box<dyn Error>> {
    let mut ctx = FlowContext::new(user_id);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let flows: Vec<&str> = router.flow_types().iter().map(|flow| flow.as_str()).collect();
    println!("Registration flows ready ({}). Type /help for commands.", flows.join(", "));

    while let Some(line) = lines.next_line().await? {
        let command = match parse_line(&line) {
            Ok(ConsoleInput::Command(command)) => command,
            Ok(ConsoleInput::Plan(plan)) => {
                println!("Plan set to {:?}", plan.plan_id);
                ctx = ctx.with_plan(plan);
                continue;
            }
            Ok(ConsoleInput::Help) => {
                println!("{}", HELP);
                continue;
            }
            Ok(ConsoleInput::Quit) => break,
            Ok(ConsoleInput::Empty) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match router.handle(&ctx, command).await {
            // interactive responses were already printed by the channel
            Ok(response) if response.interactive => {}
            Ok(response) => println!("{}", response.message),
            Err(RouterError::NoActiveRegistration) => {
                println!("Nothing in progress. Start with /start <flow>.");
            }
            Err(e) => {
                tracing::warn!(user_id = %ctx.user_id, error = %e, "Command failed");
                println!("{}", e);
            }
        }
    }
    Ok(())
}
