#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod commands;
pub mod number;
pub mod params;
pub mod queue;
pub mod reply;
pub mod shell;
#[cfg(feature = "rp")]
pub mod usb;

use core::fmt::{Display, Formatter};

// Common error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    Disconnected,
    BufferOverflow,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Disconnected => f.write_str("transport disconnected"),
            Error::BufferOverflow => f.write_str("transport buffer overflow"),
        }
    }
}

/// Every failure the interpreter reports to the operator.
///
/// None of these stop the shell: each one is rendered into the reply buffer
/// with [`Diagnostic::message`] and flushed like any other output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Diagnostic {
    CommandNotFound,
    ArityMismatch,
    NonNumericParameter,
    ParameterOverflow,
    DivisionByZero,
    OutputBufferTooSmall,
    UnknownState,
}

impl Diagnostic {
    pub const fn message(self) -> &'static str {
        match self {
            Diagnostic::CommandNotFound => {
                "Command not recognised.  Enter 'help' to view a list of available commands.\r\n\r\n"
            }
            Diagnostic::ArityMismatch => {
                "Incorrect command parameter(s).  Enter \"help\" to view a list of available commands.\r\n\r\n"
            }
            Diagnostic::NonNumericParameter => "Ingrese un número correcto\r\n",
            Diagnostic::ParameterOverflow => "El número excede el permitido\r\n",
            Diagnostic::DivisionByZero => "ERROR\r\n",
            Diagnostic::OutputBufferTooSmall => "Tamaño de buffer pequeño\r\n",
            Diagnostic::UnknownState => "ERROR: estado desconocido\r\n\r\n",
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

/// Returned by [`commands::CommandRegistry::register`] once every slot is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegistryFull;

impl Display for RegistryFull {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str("command registry is full")
    }
}

// Common constants
pub const MAX_COMMAND_LENGTH: usize = 64;
pub const OUTPUT_BUFFER_SIZE: usize = 256;
pub const MAX_COMMANDS: usize = 8;
/// Backing size of the RX queue; one slot stays free, so 15 bytes are usable.
pub const RX_QUEUE_SIZE: usize = 16;

pub const PROMPT: &str = "> ";
pub const NEWLINE: &str = "\r\n";

/// ETX (Ctrl+C): discards the line being typed.
pub const ABORT: u8 = 0x03;
pub const BACKSPACE: u8 = 0x08;
pub const DELETE: u8 = 0x7f;

pub use commands::{Command, CommandRegistry, Invocation, Step};
pub use queue::{ByteSink, ByteSource, RxQueue};
pub use reply::Reply;
pub use shell::{Config, Shell, State, Transport};
