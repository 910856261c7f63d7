mod handlers;
pub use handlers::*;

use heapless::Vec;

use crate::params::parameter_count;
use crate::reply::Reply;
use crate::{Diagnostic, MAX_COMMANDS, RegistryFull};

/// What the dispatcher should do after a handler returns.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Output is complete.
    Done,
    /// Flush the reply and dispatch the same line again for more output.
    Again,
}

/// Number of parameters a command expects after its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Arity {
    Exact(usize),
    /// Any count; the dispatcher does not check.
    Variadic,
}

impl Arity {
    fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(expected) => expected == count,
            Arity::Variadic => true,
        }
    }
}

/// Everything a handler sees for one dispatch call.
pub struct Invocation<'a> {
    /// The full command line, command name included.
    pub line: &'a str,
    pub reply: &'a mut Reply,
    /// Registered commands in lookup order.
    pub commands: &'a [&'static Command],
    /// Resumption state for handlers answering [`Step::Again`]. Starts at zero
    /// and is reset to zero by the dispatcher once the handler is done.
    pub cursor: &'a mut usize,
}

pub type Handler = fn(&mut Invocation<'_>) -> Step;

pub struct Command {
    pub name: &'static str,
    pub help: &'static str,
    pub handler: Handler,
    pub arity: Arity,
}

impl Command {
    /// True when `line` starts with this command's name as a whole word.
    pub fn matches(&self, line: &str) -> bool {
        match line.strip_prefix(self.name) {
            Some(rest) => rest.is_empty() || rest.starts_with(' '),
            None => false,
        }
    }
}

/// Command table and dispatcher.
///
/// `help` always occupies the first slot; further commands are appended in
/// registration order and are never removed. Lookup walks the table front to
/// back, so an earlier registration shadows a later one with the same name.
pub struct CommandRegistry {
    commands: Vec<&'static Command, MAX_COMMANDS>,
    cursor: usize,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut commands = Vec::new();
        let _ = commands.push(&HELP);
        Self { commands, cursor: 0 }
    }

    pub fn register(&mut self, command: &'static Command) -> Result<(), RegistryFull> {
        match self.commands.push(command) {
            Ok(()) => {
                info!("registered command '{}'", command.name);
                Ok(())
            }
            Err(_) => {
                warn!("registry full, '{}' not registered", command.name);
                Err(RegistryFull)
            }
        }
    }

    pub fn find(&self, line: &str) -> Option<&'static Command> {
        self.commands.iter().copied().find(|cmd| cmd.matches(line))
    }

    pub fn commands(&self) -> &[&'static Command] {
        &self.commands
    }

    /// Abandons any unfinished multi-call command so the next one starts over.
    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    /// Runs one dispatch call for `line`, replacing the contents of `reply`.
    ///
    /// While this returns [`Step::Again`] the caller must flush `reply` and
    /// call again with the same line.
    pub fn process(&mut self, line: &str, reply: &mut Reply) -> Step {
        reply.clear();

        let Some(command) = self.find(line) else {
            debug!("command not found");
            reply.report(Diagnostic::CommandNotFound);
            self.cursor = 0;
            return Step::Done;
        };

        if !command.arity.accepts(parameter_count(line)) {
            debug!("wrong parameter count for '{}'", command.name);
            reply.report(Diagnostic::ArityMismatch);
            self.cursor = 0;
            return Step::Done;
        }

        debug!("dispatching '{}'", command.name);
        let mut invocation = Invocation {
            line,
            reply,
            commands: &self.commands,
            cursor: &mut self.cursor,
        };
        let step = (command.handler)(&mut invocation);

        if step == Step::Done {
            self.cursor = 0;
        }
        step
    }

    /// Dispatches `line` until it is done, passing every reply to `flush`.
    /// Returns the number of dispatch calls made.
    pub fn execute(&mut self, line: &str, reply: &mut Reply, mut flush: impl FnMut(&str)) -> usize {
        let mut calls = 0;
        loop {
            let step = self.process(line, reply);
            calls += 1;
            flush(reply.as_str());
            if step == Step::Done {
                return calls;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_first(inv: &mut Invocation<'_>) -> Step {
        inv.reply.set("sum\r\n");
        Step::Done
    }

    fn echo_second(inv: &mut Invocation<'_>) -> Step {
        inv.reply.set("suma\r\n");
        Step::Done
    }

    fn variadic(inv: &mut Invocation<'_>) -> Step {
        inv.reply.set("ok\r\n");
        Step::Done
    }

    static SUM: Command = Command {
        name: "sum",
        help: "sum\r\n",
        handler: echo_first,
        arity: Arity::Exact(2),
    };

    static SUMA_SHADOW: Command = Command {
        name: "suma",
        help: "suma (shadow)\r\n",
        handler: echo_second,
        arity: Arity::Exact(2),
    };

    static ANY: Command = Command {
        name: "any",
        help: "any\r\n",
        handler: variadic,
        arity: Arity::Variadic,
    };

    #[test]
    fn help_is_always_first() {
        let registry = CommandRegistry::new();
        assert_eq!(registry.commands().len(), 1);
        assert_eq!(registry.commands()[0].name, "help");
    }

    #[test]
    fn shorter_name_does_not_match_longer_word() {
        let mut registry = CommandRegistry::new();
        registry.register(&SUM).unwrap();
        registry.register(&SUMA_SHADOW).unwrap();

        assert_eq!(registry.find("suma 1 2").map(|c| c.name), Some("suma"));
        assert_eq!(registry.find("sum 1 2").map(|c| c.name), Some("sum"));
        assert_eq!(registry.find("sum").map(|c| c.name), Some("sum"));
        assert!(registry.find("su 1 2").is_none());
        assert!(registry.find(" sum 1 2").is_none());
        assert!(registry.find("").is_none());
    }

    #[test]
    fn first_registration_wins() {
        let mut registry = CommandRegistry::new();
        registry.register(&SUMA_SHADOW).unwrap();
        registry.register(&SUMA).unwrap();

        let mut reply = Reply::new();
        assert_eq!(registry.process("suma 1 2", &mut reply), Step::Done);
        assert_eq!(reply.as_str(), "suma\r\n");
    }

    #[test]
    fn full_registry_is_left_unchanged() {
        let mut registry = CommandRegistry::new();
        for _ in 1..MAX_COMMANDS {
            registry.register(&ANY).unwrap();
        }
        assert_eq!(registry.register(&SUM), Err(RegistryFull));
        assert_eq!(registry.commands().len(), MAX_COMMANDS);
        assert!(registry.find("sum 1 2").is_none());
    }

    #[test]
    fn unknown_command() {
        let mut registry = CommandRegistry::new();
        let mut reply = Reply::new();
        assert_eq!(registry.process("foo 1 2", &mut reply), Step::Done);
        assert_eq!(reply.as_str(), Diagnostic::CommandNotFound.message());
    }

    #[test]
    fn arity_mismatch_skips_the_handler() {
        let mut registry = CommandRegistry::new();
        registry.register(&SUM).unwrap();
        let mut reply = Reply::new();

        for line in ["sum 1", "sum 1 2 3", "sum"] {
            assert_eq!(registry.process(line, &mut reply), Step::Done);
            assert_eq!(reply.as_str(), Diagnostic::ArityMismatch.message(), "{line}");
        }
        assert_eq!(registry.process("sum 1  2 ", &mut reply), Step::Done);
        assert_eq!(reply.as_str(), "sum\r\n");
    }

    #[test]
    fn variadic_commands_are_not_checked() {
        let mut registry = CommandRegistry::new();
        registry.register(&ANY).unwrap();
        let mut reply = Reply::new();

        for line in ["any", "any 1", "any a b c d e"] {
            assert_eq!(registry.process(line, &mut reply), Step::Done);
            assert_eq!(reply.as_str(), "ok\r\n");
        }
    }

    #[test]
    fn help_takes_one_call_per_command() {
        let mut registry = CommandRegistry::new();
        register_app_commands(&mut registry).unwrap();
        let k = registry.commands().len();
        let mut reply = Reply::new();

        let mut pages = std::vec::Vec::new();
        let calls = registry.execute("help", &mut reply, |page| pages.push(page.to_owned()));
        assert_eq!(calls, k);
        assert_eq!(pages[0], HELP.help);
        assert_eq!(pages[k - 1], DIVIDE.help);

        // The cursor was reset, so a second traversal is identical.
        let again = registry.execute("help", &mut reply, |_| {});
        assert_eq!(again, k);
    }

    #[test]
    fn reset_cursor_restarts_an_abandoned_help() {
        let mut registry = CommandRegistry::new();
        register_app_commands(&mut registry).unwrap();
        let mut reply = Reply::new();

        assert_eq!(registry.process("help", &mut reply), Step::Again);
        assert_eq!(registry.process("help", &mut reply), Step::Again);
        registry.reset_cursor();

        assert_eq!(registry.process("help", &mut reply), Step::Again);
        assert_eq!(reply.as_str(), HELP.help);
    }

    #[test]
    fn help_alone_finishes_in_one_call() {
        let mut registry = CommandRegistry::new();
        let mut reply = Reply::new();
        assert_eq!(registry.process("help", &mut reply), Step::Done);
        assert_eq!(reply.as_str(), HELP.help);
    }

    #[test]
    fn help_with_parameters_is_an_arity_error() {
        let mut registry = CommandRegistry::new();
        let mut reply = Reply::new();
        assert_eq!(registry.process("help suma", &mut reply), Step::Done);
        assert_eq!(reply.as_str(), Diagnostic::ArityMismatch.message());
    }
}
