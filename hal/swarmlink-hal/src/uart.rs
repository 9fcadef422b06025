//! UART serial communication abstractions
//!
//! The wired link carries an unframed byte stream; framing is recovered
//! above this layer.

/// UART transmitter
pub trait UartTx {
    /// Error type for transmit operations
    type Error;

    /// Write data to the UART
    ///
    /// Blocks until all data has been written or an error occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// UART receiver
pub trait UartRx {
    /// Error type for receive operations
    type Error;

    /// Copy bytes that have already arrived into `buf`
    ///
    /// Never waits for more data. Returns the number of bytes copied, which
    /// is 0 when the receive FIFO is empty.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Combined UART interface
///
/// For UARTs that provide both TX and RX on a single peripheral.
pub trait Uart: UartTx + UartRx {}

// Blanket implementation
impl<T: UartTx + UartRx> Uart for T {}
