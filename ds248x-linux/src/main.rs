use clap::{Parser, ValueEnum};
use ds248x::{DeviceConfiguration, Ds248xBuilder, Model, SearchKind};
use onewire_core::{OneWireError, Rom};

/// Bridge models accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum BridgeModel {
    #[value(name = "ds2482-100")]
    Ds2482_100,
    #[value(name = "ds2482-800")]
    Ds2482_800,
    #[value(name = "ds2484")]
    Ds2484,
}

impl From<BridgeModel> for Model {
    fn from(value: BridgeModel) -> Self {
        match value {
            BridgeModel::Ds2482_100 => Model::Ds2482_100,
            BridgeModel::Ds2482_800 => Model::Ds2482_800,
            BridgeModel::Ds2484 => Model::Ds2484,
        }
    }
}

/// List the 1-Wire devices behind a DS248x bridge
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to I2C bus (e.g., /dev/i2c-1)
    #[arg(short, long)]
    path: String,
    /// 7-bit I2C address of the bridge (decimal or 0x-prefixed hex)
    #[arg(short, long, default_value = "0x18", value_parser = parse_u8)]
    address: u8,
    /// Bridge model
    #[arg(short, long, value_enum, default_value_t = BridgeModel::Ds2484)]
    model: BridgeModel,
    /// 1-Wire channel to use (DS2482-800 only)
    #[arg(short, long)]
    channel: Option<u8>,
    /// Only list devices of this family code (decimal or 0x-prefixed hex)
    #[arg(short, long, value_parser = parse_u8)]
    family: Option<u8>,
    /// Only list devices with an active alarm condition
    #[arg(long)]
    alarmed: bool,
    /// Check whether a single device (e.g. 28:ff:64:1e:0f:1c:3c:b7) is present instead of listing
    #[arg(long)]
    verify: Option<Rom>,
    /// Status register reads before a busy 1-Wire line times out
    #[arg(short, long, default_value_t = 100)]
    retries: u16,
    /// Enable the active pullup
    #[arg(long)]
    active_pullup: bool,
    /// Reset the bridge when the 1-Wire line stays busy
    #[arg(long)]
    reset_on_timeout: bool,
}

fn parse_u8(s: &str) -> Result<u8, std::num::ParseIntError> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize the logger
    env_logger::init();
    // Parse command line arguments
    let args = Args::parse();
    // Open the I2C bus
    let i2c = linux_embedded_hal::I2cdev::new(&args.path)?;
    let config = DeviceConfiguration::new().with_active_pullup(args.active_pullup);
    let mut bridge = Ds248xBuilder::new()
        .with_address(args.address)
        .with_model(args.model.into())
        .with_retries(args.retries)
        .with_config(config)
        .with_reset_on_timeout(args.reset_on_timeout)
        .with_fault_handler(|fault| log::error!("Bridge fault: {fault:?}"))
        .build(i2c, linux_embedded_hal::Delay)?;

    if let Some(channel) = args.channel {
        bridge.select_channel(channel)?;
    }
    if args.alarmed {
        bridge.set_search_kind(SearchKind::Alarmed);
    }

    if let Some(rom) = args.verify {
        let present = bridge.verify(&rom)?;
        println!("{rom}: {}", if present { "present" } else { "absent" });
        return Ok(());
    }

    let mut found = 0usize;
    let mut result = match args.family {
        Some(family) => bridge.search_family(family),
        None => bridge.search(),
    };
    loop {
        match result {
            Ok(Some(rom)) if args.family.is_none_or(|family| rom.family() == family) => {
                found += 1;
                println!("{rom}");
            }
            Ok(_) => break,
            Err(OneWireError::InvalidRomCrc) => {
                log::warn!("Skipping a device whose ROM code failed the CRC check")
            }
            Err(e) => return Err(e.into()),
        }
        result = bridge.search();
    }
    log::info!("Found {found} devices");
    Ok(())
}
