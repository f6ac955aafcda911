use clap::{Parser, Subcommand, ValueEnum};
use wire_protocols::payload::FieldFormat;

#[derive(Parser, Debug, Clone)]
#[clap(version, about = "Sensor node host tools", long_about = None)]
pub struct Opts {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Decode uplink payloads received from the network
    Decode(Decode),
    /// Print the radio command line that sends a payload
    Frame(Frame),
}

#[derive(Parser, Debug, Clone)]
pub struct FieldOpts {
    /// Fixed point scale of every field
    #[clap(long, env = "SENSOR_NODE_FIELD_SCALE", default_value_t = FieldFormat::DEFAULT.scale())]
    pub scale: u16,

    /// Number of digits in every field
    #[clap(long, env = "SENSOR_NODE_FIELD_WIDTH", default_value_t = FieldFormat::DEFAULT.width() as u8)]
    pub width: u8,
}

#[derive(Parser, Debug, Clone)]
pub struct Decode {
    #[clap(flatten)]
    pub field: FieldOpts,

    /// Interpret the fields as ten's complement numbers
    #[clap(long)]
    pub signed: bool,

    /// Output format
    #[clap(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Payloads to decode.
    /// Read from stdin, one per line, when none are given.
    pub payloads: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct Frame {
    /// Request a downlink acknowledgment
    #[clap(long)]
    pub downlink: bool,

    /// The payload digits
    pub payload: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

impl Format {
    pub fn is_text(&self) -> bool {
        matches!(self, Format::Text)
    }
}
