use crate::common::DefaultAggregator;

#[embassy_executor::task]
pub async fn aggregator_task(mut aggregator: DefaultAggregator) -> ! {
    aggregator.run().await
}
