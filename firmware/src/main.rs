#![no_std]
#![no_main]

use {defmt_rtt as _, panic_persist as _};

use core::panic::PanicInfo;
use defmt::{error, info};
use embassy_executor::Spawner;
use embassy_stm32::{
    bind_interrupts,
    i2c::{self, I2c},
    peripherals,
    time::Hertz,
    usart::{self, Uart},
    Config,
};
use embassy_time::{Duration, Timer};
use sensor_aggregation::{
    AggregatorConfig, PollSchedule, SensorIds, SensorInfo, SensorPoller, SensorReport,
};
use static_cell::StaticCell;
use wire_protocols::payload::FieldFormat;

use crate::{
    common::{AggregatorInbox, DefaultAggregator, RadioRequestChannel, SharedI2cBus},
    drivers::sht40::{Quantity, Sht40},
    drivers::wisol::DefaultWisol,
    tasks::aggregator::aggregator_task,
    tasks::radio::{radio_task, RadioTaskState},
    tasks::sensor::sht40_task,
};

mod common;
mod config;
mod drivers;
mod tasks;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

static I2C_BUS: StaticCell<SharedI2cBus> = StaticCell::new();
static AGGREGATOR_INBOX: StaticCell<AggregatorInbox> = StaticCell::new();
static RADIO_CHANNEL: StaticCell<RadioRequestChannel> = StaticCell::new();

bind_interrupts!(struct Irqs {
    USART3 => usart::InterruptHandler<peripherals::USART3>;
    I2C2_EV => i2c::EventInterruptHandler<peripherals::I2C2>;
    I2C2_ER => i2c::ErrorInterruptHandler<peripherals::I2C2>;
});

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let mut config = Config::default();
    {
        use embassy_stm32::rcc::*;
        config.rcc.hse = Some(Hse {
            freq: Hertz(12_000_000),
            mode: HseMode::Oscillator,
        });
        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV12,
            mul: PllMul::MUL240,
            divp: Some(PllPDiv::DIV2), // 12MHz / 12 * 240 / 2 = 120Mhz
            divq: None,
            divr: None,
        });
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;
        config.rcc.sys = Sysclk::PLL1_P;
    }
    let p = embassy_stm32::init(config);

    let last_panic_msg = panic_persist::get_panic_message_utf8();

    info!("############################################################");
    info!(
        "{} {} ({})",
        crate::built_info::PKG_NAME,
        crate::built_info::PKG_VERSION,
        crate::built_info::PROFILE
    );
    info!("Build date: {}", crate::built_info::BUILT_TIME_UTC);
    info!("Compiler: {}", crate::built_info::RUSTC_VERSION);
    if let Some(gc) = crate::built_info::GIT_COMMIT_HASH {
        info!("Commit: {}", gc);
    }
    info!("Transmit interval: {} seconds", config::TRANSMIT_INTERVAL_SEC);
    info!("Last panic msg: {}", last_panic_msg);
    info!("############################################################");

    info!(
        "Setup: startup delay {} seconds",
        config::STARTUP_DELAY_SECONDS
    );
    Timer::after_secs(config::STARTUP_DELAY_SECONDS).await;

    // Setup channels
    let inbox: &'static AggregatorInbox = AGGREGATOR_INBOX.init(AggregatorInbox::new());
    let radio_channel = RADIO_CHANNEL.init(RadioRequestChannel::new());

    info!("Setup: Wisol");
    let mut radio_serial_config = usart::Config::default();
    radio_serial_config.baudrate = config::RADIO_BAUD_RATE;
    let radio_serial = Uart::new(
        p.USART3,
        p.PD9,
        p.PD8,
        Irqs,
        p.DMA1_CH3,
        p.DMA1_CH1,
        radio_serial_config,
    )
    .unwrap();
    let radio_state = RadioTaskState::new(
        DefaultWisol::new(radio_serial),
        radio_channel.receiver(),
    );

    info!("Setup: aggregator");
    let format = FieldFormat::new(config::PAYLOAD_FIELD_SCALE, config::PAYLOAD_FIELD_WIDTH).unwrap();
    let aggregator_config = AggregatorConfig {
        transmit_period: Duration::from_secs(config::TRANSMIT_INTERVAL_SEC),
        expect_downlink: config::EXPECT_DOWNLINK,
        format,
    };
    let aggregator = DefaultAggregator::new(aggregator_config, inbox, radio_channel.sender());

    // Shared I2C2 bus, data is only shared between tasks on the same executor
    info!("Setup: I2C2");
    let i2c = I2c::new(
        p.I2C2,
        p.PF1,
        p.PF0,
        Irqs,
        p.DMA1_CH7,
        p.DMA1_CH2,
        Hertz(config::I2C_FREQUENCY_HZ),
        Default::default(),
    );
    let i2c_bus: &'static SharedI2cBus = I2C_BUS.init(SharedI2cBus::new(i2c));

    info!("Setup: SHT40");
    let mut ids = SensorIds::new();
    let tmp = SensorInfo::register(
        &mut ids,
        "tmp",
        PollSchedule::from_interval_ms(config::TEMPERATURE_POLL_INTERVAL_MS),
    )
    .unwrap();
    let hmd = SensorInfo::register(
        &mut ids,
        "hmd",
        PollSchedule::from_interval_ms(config::HUMIDITY_POLL_INTERVAL_MS),
    )
    .unwrap();
    let tmp_poller = SensorPoller::new(
        tmp,
        Sht40::new(Quantity::Temperature),
        i2c_bus,
        inbox.sender(),
    );
    let hmd_poller = SensorPoller::new(
        hmd,
        Sht40::new(Quantity::Humidity),
        i2c_bus,
        inbox.sender(),
    );
    info!("Sensor {} id {}", tmp.name, tmp.id.get());
    info!("Sensor {} id {}", hmd.name, hmd.id.get());

    spawner.spawn(radio_task(radio_state)).unwrap();
    spawner.spawn(aggregator_task(aggregator)).unwrap();
    spawner.spawn(sht40_task(tmp_poller)).unwrap();
    spawner.spawn(sht40_task(hmd_poller)).unwrap();

    // Start the radio registration before the first reading comes in
    inbox.send(SensorReport::begin().into()).await;

    info!(">>> Initialized <<<");
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    cortex_m::interrupt::disable();

    error!("Panic occured!");
    error!("{}", defmt::Display2Format(info));
    panic_persist::report_panic_info(info);

    cortex_m::peripheral::SCB::sys_reset();
}
