use std::{
    collections::HashSet,
    future::Future,
    io::{self, Write},
};

use anyhow::{anyhow, bail, Context};
use futures::{future, Stream, StreamExt};
use log::{error, info, warn};
use rdkafka::{
    config::RDKafkaLogLevel, consumer::Consumer, error::KafkaError, ClientConfig, Message,
};
use serde_json::Value;

use crate::{
    cli::CncReading,
    kafka::{
        ConsumerSettings, TelemetryConsumer, TelemetryContext, AUTO_OFFSET_RESET,
        BOOTSTRAP_SERVERS, ENABLE_AUTO_COMMIT, ENABLE_PARTITION_EOF, GROUP_ID,
        SESSION_TIMEOUT_MS, TIMEOUT_MS,
    },
};

/// Why the consume loop ended.
#[derive(Debug)]
pub enum StopReason {
    LimitReached,
    Interrupted,
    EndOfStream,
    Failed(anyhow::Error),
}

#[derive(Debug)]
pub struct RunOutcome {
    pub reason: StopReason,
    pub processed: u64,
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self.reason {
            StopReason::Failed(_) => 1,
            _ => 0,
        }
    }
}

enum Flow {
    Continue,
    Stop,
}

/// Prints each message and enforces the message cap.
pub struct TopicLogger<W> {
    out: W,
    message_count: u64,
    max_messages: u64,
}

impl<W: Write> TopicLogger<W> {
    pub fn new(out: W, max_messages: u64) -> Self {
        Self {
            out,
            message_count: 0,
            max_messages,
        }
    }

    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    fn log_message(&mut self, json: &Value) -> io::Result<Flow> {
        self.message_count += 1;
        CncReading::parse(json).write_block(&mut self.out, self.message_count)?;

        if self.message_count >= self.max_messages {
            writeln!(
                self.out,
                "Reached {} messages. Stopping for safety...",
                self.max_messages
            )?;
            return Ok(Flow::Stop);
        }
        Ok(Flow::Continue)
    }

    /// Drains `messages` in order until the cap, the end of the stream, an error,
    /// or `shutdown` resolving. Shutdown is only observed between messages.
    pub async fn run<S, F>(&mut self, messages: S, shutdown: F) -> StopReason
    where
        S: Stream<Item = anyhow::Result<Value>>,
        F: Future<Output = ()>,
    {
        tokio::pin!(messages);
        tokio::pin!(shutdown);

        loop {
            let next = tokio::select! {
                biased;
                _ = &mut shutdown => return StopReason::Interrupted,
                next = messages.next() => next,
            };

            let json = match next {
                None => return StopReason::EndOfStream,
                Some(Err(e)) => return StopReason::Failed(e),
                Some(Ok(json)) => json,
            };

            match self.log_message(&json) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => return StopReason::LimitReached,
                Err(e) => {
                    return StopReason::Failed(anyhow!(e).context("Failed to write message"))
                }
            }
        }
    }

    pub fn write_summary(&mut self, reason: &StopReason) -> io::Result<()> {
        let count = self.message_count;
        match reason {
            StopReason::LimitReached => writeln!(
                self.out,
                "\nConsumer stopped after processing {} messages (safety limit reached).",
                count
            ),
            StopReason::EndOfStream => writeln!(
                self.out,
                "\nConsumer stopped after processing {} messages.",
                count
            ),
            StopReason::Interrupted => writeln!(
                self.out,
                "\nConsumer interrupted by user after {} messages.",
                count
            ),
            StopReason::Failed(e) => {
                writeln!(self.out, "\nError occurred: {:#}", e)?;
                writeln!(self.out, "Processed {} messages before error.", count)
            }
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

/// Startup banner shown before any broker connection is made.
pub fn write_banner<W: Write>(out: &mut W, settings: &ConsumerSettings) -> io::Result<()> {
    writeln!(out, "CNC Data Consumer Application")?;
    writeln!(out, "{}", "=".repeat(28))?;
    writeln!(out, "Input Topic: {}", settings.topic)?;
    writeln!(out, "SDK Token: {}", settings.masked_token())?;
    writeln!(out)
}

fn write_consumer_header<W: Write>(out: &mut W, settings: &ConsumerSettings) -> io::Result<()> {
    writeln!(out, "Creating consumer application...")?;
    writeln!(out, "Consumer Group: {}", settings.group_id)?;
    writeln!(out, "Topic: {}", settings.topic)?;
    writeln!(out, "Will process messages with stop condition\n")?;
    writeln!(out, "Starting CNC data consumer...")?;
    writeln!(out, "{}", "=".repeat(60))
}

/// Parses a payload into a JSON object.
pub fn parse_payload(payload: &str) -> anyhow::Result<Value> {
    let json: Value =
        serde_json::from_str(payload).context("Failed to parse message as JSON")?;
    if !json.is_object() {
        bail!("Expected a JSON object payload, got: {}", json);
    }
    Ok(json)
}

fn decode_message<M: Message>(m: &M) -> anyhow::Result<Value> {
    let payload = match m.payload_view::<str>() {
        None => bail!(
            "No payload found in message at {}[{}]@{}",
            m.topic(),
            m.partition(),
            m.offset()
        ),
        Some(Ok(s)) => s,
        Some(Err(e)) => {
            return Err(anyhow!("Error while deserializing message payload: {:?}", e))
        }
    };
    parse_payload(payload)
}

/// Partitions that have hit their current end since they last delivered a message.
#[derive(Debug, Default)]
pub struct PartitionEof {
    reached: HashSet<i32>,
}

impl PartitionEof {
    /// Records EOF on `partition`; true once every assigned partition is at its end.
    pub fn reached(&mut self, partition: i32, assigned: &[i32]) -> bool {
        self.reached.insert(partition);
        !assigned.is_empty() && assigned.iter().all(|p| self.reached.contains(p))
    }

    /// A message arrived on `partition`, so it is no longer at its end.
    pub fn resumed(&mut self, partition: i32) {
        self.reached.remove(&partition);
    }
}

fn assigned_partitions(consumer: &TelemetryConsumer) -> Vec<i32> {
    match consumer.assignment() {
        Ok(tpl) => tpl.elements().iter().map(|e| e.partition()).collect(),
        Err(e) => {
            warn!("Unable to read partition assignment: {}", e);
            Vec::new()
        }
    }
}

/// Polls `shutdown` once so signal listeners are installed before setup work.
/// Returns true if it already completed.
async fn arm<F: Future<Output = ()> + Unpin>(shutdown: F) -> bool {
    futures::poll!(shutdown).is_ready()
}

async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Unable to listen for Ctrl+C: {}", e);
        future::pending::<()>().await;
    }
    info!("Interrupt received");
}

pub async fn consume_topic(settings: &ConsumerSettings) -> Result<RunOutcome, anyhow::Error> {
    let shutdown = interrupt();
    tokio::pin!(shutdown);

    let mut stdout = io::stdout();
    if arm(shutdown.as_mut()).await {
        let mut logger = TopicLogger::new(stdout, settings.max_messages);
        logger.write_summary(&StopReason::Interrupted)?;
        return Ok(RunOutcome {
            processed: 0,
            reason: StopReason::Interrupted,
        });
    }
    write_consumer_header(&mut stdout, settings)?;

    let mut config = ClientConfig::new();
    config
        .set(GROUP_ID, &settings.group_id)
        .set(BOOTSTRAP_SERVERS, &settings.brokers)
        .set(AUTO_OFFSET_RESET, "earliest") // Replay retained history
        .set(ENABLE_AUTO_COMMIT, "true")
        .set(ENABLE_PARTITION_EOF, settings.until_eof.to_string())
        .set(SESSION_TIMEOUT_MS, TIMEOUT_MS)
        .set_log_level(RDKafkaLogLevel::Warning);

    let consumer: TelemetryConsumer = config
        .create_with_context(TelemetryContext)
        .context("Consumer creation failed")?;

    consumer
        .subscribe(&[settings.topic.as_str()])
        .map_err(|e| anyhow!("Failed to subscribe to topic: {}", e))?;
    info!(
        "Subscribed to {} as {} (brokers: {})",
        settings.topic, settings.group_id, settings.brokers
    );

    let mut eof = PartitionEof::default();
    let messages = consumer
        .stream()
        .take_while(|result| {
            let done = match result {
                Err(KafkaError::PartitionEOF(partition)) => {
                    info!("Reached end of partition {} (EOF)", partition);
                    eof.reached(*partition, &assigned_partitions(&consumer))
                }
                Ok(m) => {
                    eof.resumed(m.partition());
                    false
                }
                Err(_) => false,
            };
            future::ready(!done)
        })
        .filter(|result| future::ready(!matches!(result, Err(KafkaError::PartitionEOF(_)))))
        .map(|result| {
            let m = result.context("Kafka error while reading message")?;
            decode_message(&m)
        });

    let mut logger = TopicLogger::new(stdout, settings.max_messages);
    let reason = logger.run(messages, shutdown).await;

    match &reason {
        StopReason::Failed(e) => error!("Consumer failed: {:#}", e),
        StopReason::Interrupted => warn!("Consumer interrupted"),
        _ => {}
    }
    logger.write_summary(&reason)?;

    Ok(RunOutcome {
        processed: logger.message_count(),
        reason,
    })
}
