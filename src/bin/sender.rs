//! Demo sender, ported from `virtual154Radio/examples/virtual154RadioSender.c`.
//!
//! Builds an ACK-requesting DATA frame addressed to the companion receiver
//! demo, then resends it once a second from a cooperative tick loop.

use std::time::Duration;

use virtual154::address::MediumConfig;
use virtual154::mac_frame::{Address, MacFrame};
use virtual154::medium::MediumEndpoint;
use virtual154::radio::{AckCallbackStatus, RadioCore, RadioMetaConfig, RxStatus, TxStatus};
use virtual154::{driver, Result};

const INTERFACE_IPV4: &str = "127.0.0.1";
const TX_ADDR: &str = "127.0.0.1:9000";
const RX_ADDR: &str = "224.0.0.116:9000";

const SOURCE_PAN_ID: u16 = 0x2137;
const SOURCE_SHORT_ADDR: u16 = 0x1234;
const DEST_PAN_ID: u16 = 0x2137;
const DEST_SHORT_ADDR: u16 = 0x0420;
const RADIO_CHANNEL: u8 = 20;

fn main() -> Result<()> {
    env_logger::init();

    let medium_config = MediumConfig::from_strings(INTERFACE_IPV4, TX_ADDR, RX_ADDR, 256)?;
    let medium = MediumEndpoint::init(medium_config)?;

    let meta = RadioMetaConfig {
        rx_sensitivity_dbm: -104,
        eui64: [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08],
        skip_shr_phr: true,
    };
    let mut radio = RadioCore::init(meta, medium);

    radio.pan_id = SOURCE_PAN_ID;
    radio.short_addr = SOURCE_SHORT_ADDR;
    radio.tx_power_dbm = 12;
    radio.set_channel(RADIO_CHANNEL)?;

    radio.on_tx_done(|status: TxStatus| log::info!("TX done: {status:?}"));
    radio.on_ack_done(|status: AckCallbackStatus, _mpdu| log::info!("ACK done: {status:?}"));
    radio.on_rx_done(|status: RxStatus, mpdu| log::info!("RX done: {status:?} ({} bytes)", mpdu.len()));

    radio.enable();
    radio.receive();

    let frame = MacFrame::build_data(
        radio.next_sequence_number(),
        DEST_PAN_ID,
        Some(Address::Short(DEST_SHORT_ADDR)),
        true,
        true,
        b"randompayload\0",
    );

    let mut scratch = vec![0u8; 256];
    loop {
        radio.send_data(frame.as_bytes())?;
        std::thread::sleep(Duration::from_secs(1));
        // Normally done by radio hardware firing an interrupt; here it's
        // the host main loop's job, per spec.md §4.F.
        driver::processing_loop(&mut radio, &mut scratch)?;
    }
}
