pub mod aggregator;
pub mod radio;
pub mod sensor;
