//! UART adapters for embassy-rp

use core::convert::Infallible;

use bringup_hal::{DataBits, Parity, StopBits, UartConfig, UartRx, UartTx};
use embassy_rp::uart::{self, BufferedUartTx};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Receiver;
use embedded_io::Write;

/// Map the protocol's serial settings onto the embassy-rp UART config
pub fn rp_config(config: &UartConfig) -> uart::Config {
    let mut rp = uart::Config::default();
    rp.baudrate = config.baudrate;
    rp.data_bits = match config.data_bits {
        DataBits::Seven => uart::DataBits::DataBits7,
        DataBits::Eight => uart::DataBits::DataBits8,
    };
    rp.parity = match config.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    rp.stop_bits = match config.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    rp
}

/// Response sink over the interrupt-driven buffered UART
///
/// Writes block until the frame is in the TX ring buffer. Responses are at
/// most 255 bytes, so this never waits on more than one buffer drain.
pub struct BufferedTx {
    tx: BufferedUartTx,
}

impl BufferedTx {
    pub fn new(tx: BufferedUartTx) -> Self {
        Self { tx }
    }
}

impl UartTx for BufferedTx {
    type Error = uart::Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.tx.write_all(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Write::flush(&mut self.tx)
    }
}

/// Byte source backed by the channel the receiver task fills
pub struct ChannelRx<'ch, M: RawMutex, const N: usize> {
    receiver: Receiver<'ch, M, u8, N>,
}

impl<'ch, M: RawMutex, const N: usize> ChannelRx<'ch, M, N> {
    pub fn new(receiver: Receiver<'ch, M, u8, N>) -> Self {
        Self { receiver }
    }

    /// Wait for the next byte
    ///
    /// Used to park the processor task while the line is idle.
    pub async fn receive(&mut self) -> u8 {
        self.receiver.receive().await
    }

    /// Nothing left queued by the receiver task
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl<M: RawMutex, const N: usize> UartRx for ChannelRx<'_, M, N> {
    type Error = Infallible;

    fn try_read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        Ok(self.receiver.try_receive().ok())
    }
}
