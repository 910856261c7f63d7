#![no_std]
#![no_main]

use calc_shell::commands::{CommandRegistry, register_app_commands};
use calc_shell::queue::{ByteSink, RxQueue};
use calc_shell::shell::{Config, Shell, Transport};
use calc_shell::{PROMPT, RX_QUEUE_SIZE, usb};
use defmt::*;
use embassy_executor::Spawner;
use embassy_futures::yield_now;
use embassy_rp::block::ImageDef;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_time::{Duration, Timer};
use embassy_usb::UsbDevice;
use embassy_usb::class::cdc_acm::{Receiver, Sender, State};
use heapless::spsc::{Consumer, Producer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

#[unsafe(link_section = ".start_block")]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

const BANNER: &str = "\r\nCalculadora serie\r\nEscriba 'help' para ver los comandos\r\n";
const HEARTBEAT: Duration = Duration::from_millis(500);

static RX_QUEUE: StaticCell<RxQueue> = StaticCell::new();
static USB_STATE: StaticCell<State> = StaticCell::new();
static CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

type UsbDriver = Driver<'static, USB>;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("calc-shell starting");

    let mut registry = CommandRegistry::new();
    if let Err(e) = register_app_commands(&mut registry) {
        error!("command registration failed: {}", e);
    }
    let config = Config {
        echo: true,
        prompt: Some(PROMPT),
        ..Config::new()
    };
    let shell = Shell::new(registry, config);

    let (builder, class) = usb::setup_usb(
        p.USB,
        USB_STATE.init(State::new()),
        CONFIG_DESC.init([0; 256]),
        BOS_DESC.init([0; 256]),
        CONTROL_BUF.init([0; 64]),
    );
    let device = builder.build();
    let (sender, receiver) = class.split();
    let (producer, consumer) = RX_QUEUE.init(RxQueue::new()).split();

    let led = Output::new(p.PIN_25, Level::Low);

    unwrap!(spawner.spawn(usb_task(device)));
    unwrap!(spawner.spawn(rx_task(receiver, producer)));
    unwrap!(spawner.spawn(shell_task(shell, sender, consumer)));
    unwrap!(spawner.spawn(heartbeat_task(led)));
}

#[embassy_executor::task]
async fn usb_task(mut device: UsbDevice<'static, UsbDriver>) -> ! {
    device.run().await
}

/// Only producer of the RX queue.
#[embassy_executor::task]
async fn rx_task(
    mut receiver: Receiver<'static, UsbDriver>,
    mut producer: Producer<'static, u8, RX_QUEUE_SIZE>,
) {
    let mut read_buf = [0; 64];

    loop {
        receiver.wait_connection().await;

        loop {
            match receiver.read_packet(&mut read_buf).await {
                Ok(n) => {
                    for &byte in &read_buf[..n] {
                        while !producer.insert(byte) {
                            trace!("rx queue full");
                            yield_now().await;
                        }
                    }
                }
                Err(_) => {
                    debug!("receiver disconnected");
                    break;
                }
            }
        }
    }
}

/// Only consumer of the RX queue.
#[embassy_executor::task]
async fn shell_task(
    mut shell: Shell,
    mut sender: Sender<'static, UsbDriver>,
    mut consumer: Consumer<'static, u8, RX_QUEUE_SIZE>,
) {
    loop {
        wait_connection(&mut sender).await;
        info!("host connected");

        let welcome = match sender.write_str(BANNER).await {
            Ok(()) => sender.write_str(PROMPT).await,
            Err(e) => Err(e),
        };
        if let Err(e) = welcome {
            warn!("failed to send welcome: {}", e);
            continue;
        }

        loop {
            if shell.is_waiting(&consumer) && sender.connected() {
                Timer::after(Duration::from_millis(1)).await;
                continue;
            }
            // A dropped DTR surfaces here as `Disconnected`, with the shell reset.
            if let Err(e) = shell.step(&mut consumer, &mut sender).await {
                warn!("shell stopped: {}", e);
                break;
            }
        }
    }
}

async fn wait_connection(sender: &mut Sender<'static, UsbDriver>) {
    sender.wait_connection().await;
    while !sender.dtr() {
        Timer::after(Duration::from_millis(10)).await;
        debug!("Waiting for DTR...");
    }
}

/// Keep-alive LED.
#[embassy_executor::task]
async fn heartbeat_task(mut led: Output<'static>) {
    loop {
        led.toggle();
        Timer::after(HEARTBEAT).await;
    }
}
