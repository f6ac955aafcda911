use crate::{common::RadioRequestReceiver, drivers::wisol::DefaultWisol};
use defmt::{debug, info, warn};
use sensor_aggregation::RadioRequest;
use wire_protocols::radio::Command;

pub struct RadioTaskState {
    driver: DefaultWisol,
    receiver: RadioRequestReceiver,
}

impl RadioTaskState {
    pub fn new(driver: DefaultWisol, receiver: RadioRequestReceiver) -> Self {
        Self { driver, receiver }
    }
}

#[embassy_executor::task]
pub async fn radio_task(state: RadioTaskState) -> ! {
    let RadioTaskState {
        mut driver,
        receiver,
    } = state;

    loop {
        match receiver.receive().await {
            RadioRequest::Startup(commands) => {
                for cmd in commands.iter() {
                    execute(&mut driver, cmd).await;
                }
                info!("Radio: startup sequence complete");
            }
            RadioRequest::Payload {
                data,
                expect_downlink,
            } => {
                let cmd = Command::SendFrame {
                    payload: &data,
                    downlink: expect_downlink,
                };
                execute(&mut driver, &cmd).await;
            }
        }
    }
}

// Failures are logged, nothing is retried
async fn execute(driver: &mut DefaultWisol, cmd: &Command<'_>) {
    debug!("Radio: {}", defmt::Display2Format(cmd));
    match driver.execute(cmd).await {
        Ok(resp) => info!(
            "Radio: {} -> {}",
            defmt::Display2Format(cmd),
            defmt::Display2Format(&resp)
        ),
        Err(e) => warn!("Radio: {} failed. {}", defmt::Display2Format(cmd), e),
    }
}
