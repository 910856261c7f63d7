use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::USB;
use embassy_rp::usb::{Driver, InterruptHandler};
use embassy_usb::class::cdc_acm::{CdcAcmClass, Sender, State};
use embassy_usb::driver::EndpointError;
use embassy_usb::{Builder, Config};

use crate::Error;
use crate::shell::Transport;

pub const VENDOR_ID: u16 = 0xc0de;
pub const PRODUCT_ID: u16 = 0xcafe;
pub const MANUFACTURER: &str = "calc-shell";
pub const PRODUCT: &str = "USB Serial Calculator";
pub const SERIAL_NUMBER: &str = "000001";
pub const MAX_PACKET_SIZE: u16 = 64;

// Bind USB interrupts
bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => InterruptHandler<USB>;
});

/// Handles conversion of USB endpoint errors to our Error type
impl From<EndpointError> for Error {
    fn from(val: EndpointError) -> Self {
        match val {
            EndpointError::BufferOverflow => Error::BufferOverflow,
            EndpointError::Disabled => Error::Disconnected,
        }
    }
}

/// Initializes the USB CDC ACM (serial) device
pub fn setup_usb<'d>(
    usb_peripheral: USB,
    state: &'d mut State<'d>,
    config_desc: &'d mut [u8; 256],
    bos_desc: &'d mut [u8; 256],
    control_buf: &'d mut [u8; 64],
) -> (
    Builder<'d, Driver<'d, USB>>,
    CdcAcmClass<'d, Driver<'d, USB>>,
) {
    let driver = Driver::new(usb_peripheral, Irqs);

    let mut config = Config::new(VENDOR_ID, PRODUCT_ID);
    config.manufacturer = Some(MANUFACTURER);
    config.product = Some(PRODUCT);
    config.serial_number = Some(SERIAL_NUMBER);

    let mut builder = Builder::new(
        driver,
        config,
        config_desc,
        bos_desc,
        &mut [],
        control_buf,
    );

    let class = CdcAcmClass::new(&mut builder, state, MAX_PACKET_SIZE);

    (builder, class)
}

impl<'d> Transport for Sender<'d, Driver<'d, USB>> {
    async fn write_str(&mut self, text: &str) -> Result<(), Error> {
        let max = usize::from(self.max_packet_size());
        for chunk in text.as_bytes().chunks(max) {
            self.write_packet(chunk).await?;
        }
        // A full last packet needs a zero-length packet to end the transfer.
        if !text.is_empty() && text.len() % max == 0 {
            self.write_packet(&[]).await?;
        }
        Ok(())
    }

    fn connected(&self) -> bool {
        self.dtr()
    }
}
