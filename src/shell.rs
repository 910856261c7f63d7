use heapless::String;

use crate::commands::{CommandRegistry, Step};
use crate::queue::ByteSource;
use crate::reply::Reply;
use crate::{ABORT, BACKSPACE, DELETE, Diagnostic, Error, MAX_COMMAND_LENGTH, MAX_COMMANDS, NEWLINE};

/// Output side of the serial link.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn write_str(&mut self, text: &str) -> Result<(), Error>;

    /// False once the host has gone away.
    fn connected(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Echo accepted input back to the terminal.
    pub echo: bool,
    /// Written after every finished or aborted line.
    pub prompt: Option<&'static str>,
    /// Consecutive [`Step::Again`] answers tolerated for one line before the
    /// shell gives up on the handler and resets.
    pub max_continuations: usize,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            echo: false,
            prompt: None,
            max_continuations: 4 * MAX_COMMANDS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    Idle,
    Receiving,
    Processing,
}

/// Line assembler and dispatch loop fed from the RX byte queue.
///
/// Each call to [`Shell::step`] does one unit of work: notice pending input,
/// consume one byte, or make one dispatch call and flush its reply. Nothing
/// blocks except the transport write.
pub struct Shell {
    registry: CommandRegistry,
    config: Config,
    state: State,
    line: String<MAX_COMMAND_LENGTH>,
    reply: Reply,
    continuations: usize,
}

impl Shell {
    pub fn new(registry: CommandRegistry, config: Config) -> Self {
        Self {
            registry,
            config,
            state: State::Idle,
            line: String::new(),
            reply: Reply::new(),
            continuations: 0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The line typed so far.
    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// True when there is nothing to do until more bytes arrive.
    ///
    /// Does not look at the link; callers idling on this should also poll
    /// [`Transport::connected`].
    pub fn is_waiting<Q: ByteSource>(&self, rx: &Q) -> bool {
        self.state != State::Processing && rx.count() == 0
    }

    pub async fn step<Q, T>(&mut self, rx: &mut Q, tx: &mut T) -> Result<(), Error>
    where
        Q: ByteSource,
        T: Transport,
    {
        if !tx.connected() {
            debug!("host gone, dropping session");
            self.reset();
            return Err(Error::Disconnected);
        }

        let result = match self.state {
            State::Idle => {
                if rx.count() > 0 {
                    self.state = State::Receiving;
                }
                Ok(())
            }
            State::Receiving => match rx.pop() {
                Some(byte) => self.receive(byte, tx).await,
                None => Ok(()),
            },
            State::Processing => self.process(tx).await,
        };

        if let Err(err) = result {
            warn!("transport error: {}", err);
            self.reset();
        }
        result
    }

    async fn receive<T: Transport>(&mut self, byte: u8, tx: &mut T) -> Result<(), Error> {
        match byte {
            ABORT => {
                debug!("line aborted");
                self.reset();
                self.prompt(tx).await?;
            }
            BACKSPACE | DELETE => {
                if self.line.pop().is_some() && self.config.echo {
                    tx.write_str("\x08 \x08").await?;
                }
            }
            b'\n' => {
                self.state = State::Processing;
                if self.config.echo {
                    tx.write_str(NEWLINE).await?;
                }
            }
            0x20..=0x7e => {
                if self.line.push(byte as char).is_err() {
                    trace!("line full, dropped {}", byte);
                } else if self.config.echo {
                    let mut utf8 = [0u8; 4];
                    tx.write_str((byte as char).encode_utf8(&mut utf8)).await?;
                }
            }
            _ => trace!("dropped byte {}", byte),
        }
        Ok(())
    }

    async fn process<T: Transport>(&mut self, tx: &mut T) -> Result<(), Error> {
        let step = self.registry.process(&self.line, &mut self.reply);
        self.continuations += 1;

        if !self.reply.is_empty() {
            tx.write_str(self.reply.as_str()).await?;
        }

        match step {
            Step::Done => {
                self.reset();
                self.prompt(tx).await
            }
            Step::Again if self.continuations > self.config.max_continuations => {
                error!("'{}' never finished, resetting", self.line.as_str());
                self.fault(tx).await
            }
            Step::Again => Ok(()),
        }
    }

    /// Drops the current line, reply and any half-finished command output and
    /// goes back to `Idle`.
    pub fn reset(&mut self) {
        self.registry.reset_cursor();
        self.line.clear();
        self.reply.clear();
        self.continuations = 0;
        self.state = State::Idle;
    }

    async fn fault<T: Transport>(&mut self, tx: &mut T) -> Result<(), Error> {
        self.reset();
        tx.write_str(Diagnostic::UnknownState.message()).await
    }

    async fn prompt<T: Transport>(&mut self, tx: &mut T) -> Result<(), Error> {
        match self.config.prompt {
            Some(prompt) => tx.write_str(prompt).await,
            None => Ok(()),
        }
    }
}
