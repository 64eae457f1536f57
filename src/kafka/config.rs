use crate::cli::Args;

// Kafka configuration key constants
pub const BOOTSTRAP_SERVERS: &str = "bootstrap.servers";
pub const GROUP_ID: &str = "group.id";
pub const ENABLE_PARTITION_EOF: &str = "enable.partition.eof";
pub const AUTO_OFFSET_RESET: &str = "auto.offset.reset";
pub const ENABLE_AUTO_COMMIT: &str = "enable.auto.commit";
pub const SESSION_TIMEOUT_MS: &str = "session.timeout.ms";

// Timeout value (in milliseconds)
pub const TIMEOUT_MS: &str = "6000"; // 6 seconds

pub const DEFAULT_TOPIC: &str = "cnc-data";
pub const DEFAULT_BROKERS: &str = "localhost:9092";
pub const DEFAULT_MAX_MESSAGES: u64 = 100;

/// Placeholder credential used when none is supplied.
pub const DEFAULT_SDK_TOKEN: &str = "sdk-8310f429a0b34c03b7f684d8409502bf";

pub const CONSUMER_GROUP_PREFIX: &str = "cnc-consumer";

/// Everything the consumer needs for one run. Built once at startup.
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    pub brokers: String,
    pub topic: String,
    pub sdk_token: String,
    pub group_id: String,
    pub max_messages: u64,
    pub until_eof: bool,
}

impl ConsumerSettings {
    pub fn from_args(args: Args) -> Self {
        Self::with_group_id(args, consumer_group_id(chrono::Utc::now().timestamp()))
    }

    fn with_group_id(args: Args, group_id: String) -> Self {
        Self {
            brokers: args.brokers,
            topic: args.topic,
            sdk_token: args
                .sdk_token
                .unwrap_or_else(|| DEFAULT_SDK_TOKEN.to_string()),
            group_id,
            max_messages: args.max_messages,
            until_eof: args.until_eof,
        }
    }

    /// `***` followed by the last four characters, or `Not set`.
    pub fn masked_token(&self) -> String {
        mask_token(&self.sdk_token)
    }
}

/// Unique per whole second, so separate runs never share committed offsets.
pub fn consumer_group_id(unix_seconds: i64) -> String {
    format!("{}-{}", CONSUMER_GROUP_PREFIX, unix_seconds)
}

pub fn mask_token(token: &str) -> String {
    if token.is_empty() {
        return "Not set".to_string();
    }
    let tail_start = token
        .char_indices()
        .rev()
        .nth(3)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    format!("***{}", &token[tail_start..])
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["cnc-topic-logger"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn masks_all_but_last_four_characters() {
        let masked = mask_token("sdk-8310f429a0b34c03b7f684d8409502bf");
        assert_eq!(masked, "***02bf");
        assert!(!masked.contains("8310f429"));
    }

    #[test]
    fn short_and_empty_tokens() {
        assert_eq!(mask_token("ab"), "***ab");
        assert_eq!(mask_token(""), "Not set");
        assert_eq!(mask_token("tökén"), "***ökén");
    }

    #[test]
    fn group_ids_differ_across_seconds() {
        let first = consumer_group_id(1_700_000_000);
        let second = consumer_group_id(1_700_000_001);
        assert_eq!(first, "cnc-consumer-1700000000");
        assert_ne!(first, second);
    }

    #[test]
    fn missing_token_falls_back_to_placeholder() {
        let settings = ConsumerSettings::with_group_id(args(&[]), "g".into());
        assert_eq!(settings.sdk_token, DEFAULT_SDK_TOKEN);
        assert_eq!(settings.masked_token(), "***02bf");
    }

    #[test]
    fn empty_token_is_kept_and_reported_unset() {
        let settings =
            ConsumerSettings::with_group_id(args(&["--sdk-token", ""]), "g".into());
        assert_eq!(settings.masked_token(), "Not set");
    }

    #[test]
    fn generated_group_id_has_prefix() {
        let settings = ConsumerSettings::from_args(args(&[]));
        assert!(settings.group_id.starts_with("cnc-consumer-"));
        let suffix = &settings.group_id["cnc-consumer-".len()..];
        assert!(suffix.parse::<i64>().is_ok());
    }
}
