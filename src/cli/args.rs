use clap::Parser;

use crate::kafka::{DEFAULT_BROKERS, DEFAULT_MAX_MESSAGES, DEFAULT_TOPIC};

/// Print CNC telemetry from a Kafka topic, replaying it from the beginning.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// Topic to consume
    #[arg(long, env = "input", default_value = DEFAULT_TOPIC)]
    pub topic: String,

    /// Platform SDK token (only shown masked)
    #[arg(long, env = "Quix__Sdk__Token", hide_env_values = true)]
    pub sdk_token: Option<String>,

    /// Comma separated list of bootstrap brokers
    #[arg(long, env = "KAFKA_BROKERS", default_value = DEFAULT_BROKERS)]
    pub brokers: String,

    /// Stop after this many messages
    #[arg(
        long,
        env = "MAX_MESSAGES",
        default_value_t = DEFAULT_MAX_MESSAGES,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub max_messages: u64,

    /// Stop once the end of the topic is reached (default: false)
    #[arg(long, env = "STOP_AT_EOF", default_value = "false")]
    pub until_eof: bool,
}
