//! Bring-up applet firmware
//!
//! Answers the bring-up command protocol on UART0 (GPIO0 TX, GPIO1 RX) of
//! an RP2040 board. Two tasks share the work:
//!
//! - `uart_rx_task` pushes received bytes into a bounded channel
//! - `command_task` drains the channel, validates frames and runs handlers
//!
//! The EXIT command ends the command loop and resets the chip.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use bringup_hal_rp2040::rp_config;

use crate::channels::APPLET_EXIT;

mod applet;
mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Bring-up applet starting...");

    let p = embassy_rp::init(Default::default());
    let config = config::load();

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, rp_config(&config.uart));
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized at {} baud", config.uart.baudrate);

    unwrap!(spawner.spawn(tasks::uart_rx_task(rx)));
    unwrap!(spawner.spawn(tasks::command_task(tx, config)));

    APPLET_EXIT.wait().await;

    info!("Exit requested, resetting");
    // let RTT drain the last log lines
    embassy_time::Timer::after_millis(10).await;
    cortex_m::peripheral::SCB::sys_reset();
}
