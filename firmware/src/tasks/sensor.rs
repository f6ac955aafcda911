use crate::common::Sht40Poller;

// One instance per SHT40 quantity
#[embassy_executor::task(pool_size = 2)]
pub async fn sht40_task(poller: Sht40Poller) -> ! {
    defmt::debug!("Sensor task {} starting", poller.info().name);
    poller.run().await
}
