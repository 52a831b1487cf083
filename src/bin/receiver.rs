//! Demo receiver, ported from
//! `virtual154Radio/examples/virtual154RadioReceiver.c`.
//!
//! Just enables RX and logs whatever arrives; pair with `sender` on the
//! same multicast group to see the ACK round-trip.

use virtual154::address::MediumConfig;
use virtual154::medium::MediumEndpoint;
use virtual154::radio::{RadioCore, RadioMetaConfig, RxStatus};
use virtual154::{driver, Result};

const INTERFACE_IPV4: &str = "127.0.0.1";
const TX_ADDR: &str = "127.0.0.1:9001";
const RX_ADDR: &str = "224.0.0.116:9000";

const SOURCE_PAN_ID: u16 = 0x2137;
const SOURCE_SHORT_ADDR: u16 = 0x0420;
const RADIO_CHANNEL: u8 = 20;

fn main() -> Result<()> {
    env_logger::init();

    let medium_config = MediumConfig::from_strings(INTERFACE_IPV4, TX_ADDR, RX_ADDR, 256)?;
    let medium = MediumEndpoint::init(medium_config)?;

    let meta = RadioMetaConfig {
        rx_sensitivity_dbm: -104,
        eui64: [0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F, 0x01],
        skip_shr_phr: true,
    };
    let mut radio = RadioCore::init(meta, medium);

    radio.pan_id = SOURCE_PAN_ID;
    radio.short_addr = SOURCE_SHORT_ADDR;
    radio.set_channel(RADIO_CHANNEL)?;

    radio.on_rx_done(|status: RxStatus, mpdu| {
        log::info!("RX done: {status:?} ({} bytes): {mpdu:02x?}", mpdu.len())
    });

    radio.enable();
    radio.receive();

    let mut scratch = vec![0u8; 256];
    loop {
        driver::processing_loop(&mut radio, &mut scratch)?;
    }
}
