//! UART receive task
//!
//! Moves bytes from the buffered UART into the processor's channel.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use crate::channels::RX_BYTES;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Receiver task - forwards every byte from the host
#[embassy_executor::task]
pub async fn uart_rx_task(mut rx: BufferedUartRx) {
    info!("UART RX task started");

    let mut buf = [0u8; RX_BUF_SIZE];
    // bytes lost in the current overflow burst
    let mut dropped: u32 = 0;

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                for &byte in &buf[..n] {
                    if RX_BYTES.try_send(byte).is_ok() {
                        if dropped > 0 {
                            warn!("RX channel drained, {} bytes dropped", dropped);
                            dropped = 0;
                        }
                    } else {
                        if dropped == 0 {
                            warn!("RX channel full, dropping bytes");
                        }
                        dropped = dropped.saturating_add(1);
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}
