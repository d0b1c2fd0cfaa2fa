//! Serial link adapter.
//!
//! Implements [`ByteSource`] for the sensor controller's UART.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::hal::uart::UartDriver`, read
//!   without blocking.
//! - **all other targets**: an in-memory byte queue fed by [`UartLink::inject`].

use crate::app::ports::ByteSource;
use crate::error::LinkError;

#[cfg(target_os = "espidf")]
pub struct UartLink {
    driver: esp_idf_svc::hal::uart::UartDriver<'static>,
}

#[cfg(target_os = "espidf")]
impl UartLink {
    pub fn new(driver: esp_idf_svc::hal::uart::UartDriver<'static>) -> Self {
        Self { driver }
    }
}

#[cfg(target_os = "espidf")]
impl ByteSource for UartLink {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        use esp_idf_svc::hal::delay::NON_BLOCK;

        self.driver
            .read(buf, NON_BLOCK)
            .map_err(|e| LinkError::ReadFailed(e.code()))
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
pub struct UartLink {
    rx: std::collections::VecDeque<u8>,
}

#[cfg(not(target_os = "espidf"))]
impl UartLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes as if the sensor controller had sent them.
    pub fn inject(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

#[cfg(not(target_os = "espidf"))]
impl ByteSource for UartLink {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}
