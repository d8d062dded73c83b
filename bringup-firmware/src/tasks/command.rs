//! Command processor task
//!
//! Owns the [`CommandProcessor`]: waits for the first byte of a burst,
//! then alternates draining the channel and servicing frames until the
//! channel is empty and the buffer holds nothing complete. The EXIT handler
//! flushes its reply before the loop ends. Yields between bursts so the
//! receiver keeps up.

use defmt::*;
use embassy_futures::yield_now;
use embassy_rp::uart::BufferedUartTx;

use bringup_hal_rp2040::{BufferedTx, ChannelRx};
use bringup_protocol::{CommandProcessor, ProtocolConfig};

use crate::applet::{command_table, Applet};
use crate::channels::{APPLET_EXIT, RX_BYTES};

#[embassy_executor::task]
pub async fn command_task(tx: BufferedUartTx, config: ProtocolConfig) {
    info!("Command task started");

    let table = match command_table() {
        Ok(table) => table,
        Err(e) => {
            error!("Command table rejected: {:?}", e);
            return;
        }
    };
    debug!("{} commands registered", table.len());

    let mut processor = CommandProcessor::new(table, config);
    let mut applet = Applet::default();
    let mut source = ChannelRx::new(RX_BYTES.receiver());
    let mut sink = BufferedTx::new(tx);

    while !applet.exit_requested() {
        processor.push(source.receive().await);

        // poll takes at most a buffer's worth per cycle, so keep going
        // while frames dispatch or the channel still holds bytes
        loop {
            let dispatched = match processor.poll(&mut applet, &mut source, &mut sink) {
                Ok(id) => id,
                Err(never) => match never {},
            };
            if applet.exit_requested() || (dispatched.is_none() && source.is_empty()) {
                break;
            }
        }

        yield_now().await;
    }

    let stats = processor.stats();
    info!(
        "Command loop finished: {} dispatched, {} bytes discarded, {} overflows",
        stats.handler_done,
        stats.discarded(),
        stats.rx_overflow
    );
    APPLET_EXIT.signal(());
}
