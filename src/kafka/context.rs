use log::{debug, info, warn};
use rdkafka::{
    consumer::{BaseConsumer, ConsumerContext, Rebalance, StreamConsumer},
    error::KafkaResult,
    ClientContext, TopicPartitionList,
};

/// Routes librdkafka logs through `log` and reports group membership changes.
pub struct TelemetryContext;

impl ClientContext for TelemetryContext {}

impl ConsumerContext for TelemetryContext {
    fn pre_rebalance(&self, _: &BaseConsumer<Self>, rebalance: &Rebalance) {
        debug!("Pre rebalance {:?}", rebalance);
    }

    fn post_rebalance(&self, _: &BaseConsumer<Self>, rebalance: &Rebalance) {
        match rebalance {
            Rebalance::Assign(partitions) => {
                info!("Assigned {} partition(s)", partitions.count())
            }
            Rebalance::Revoke(partitions) => {
                info!("Revoked {} partition(s)", partitions.count())
            }
            Rebalance::Error(e) => warn!("Rebalance error: {}", e),
        }
    }

    fn commit_callback(&self, result: KafkaResult<()>, offsets: &TopicPartitionList) {
        match result {
            Ok(()) => debug!("Committed offsets: {:?}", offsets),
            Err(e) => warn!("Offset commit failed: {}", e),
        }
    }
}

pub type TelemetryConsumer = StreamConsumer<TelemetryContext>;

#[cfg(test)]
mod tests {
    use rdkafka::{consumer::Consumer, ClientConfig};

    use super::*;
    use crate::kafka::{BOOTSTRAP_SERVERS, GROUP_ID};

    #[tokio::test]
    async fn consumer_builds_with_context() {
        let consumer: TelemetryConsumer = ClientConfig::new()
            .set(BOOTSTRAP_SERVERS, "localhost:9092")
            .set(GROUP_ID, "cnc-consumer-test")
            .create_with_context(TelemetryContext)
            .unwrap();
        assert_eq!(consumer.assignment().unwrap().count(), 0);
    }
}
