use core::fmt::Write;

use super::{Arity, Command, CommandRegistry, Invocation, Step};
use crate::params::extract_operands;
use crate::reply::write_general;
use crate::{Diagnostic, NEWLINE, RegistryFull};

pub static HELP: Command = Command {
    name: "help",
    help: "\r\nhelp:\r\n Lista todos los comandos registrados\r\n\r\n",
    handler: handle_help,
    arity: Arity::Exact(0),
};

pub static SUMA: Command = Command {
    name: "suma",
    help: "\r\nsuma:\r\n realiza la sumatoria de dos números decimales. Acepta signo y/o punto decimal, y números de hasta 6 dígitos\r\n",
    handler: handle_suma,
    arity: Arity::Exact(2),
};

pub static RESTA: Command = Command {
    name: "resta",
    help: "\r\nresta:\r\n realiza la resta de dos números decimales. Acepta signo y/o punto decimal, y números de hasta 6 dígitos\r\n",
    handler: handle_resta,
    arity: Arity::Exact(2),
};

pub static MULTIPLICA: Command = Command {
    name: "multiplica",
    help: "\r\nmultiplica:\r\n realiza la multiplicación de dos números decimales. Acepta signo y/o punto decimal, y números de hasta 6 dígitos\r\n",
    handler: handle_multiplica,
    arity: Arity::Exact(2),
};

pub static DIVIDE: Command = Command {
    name: "divide",
    help: "\r\ndivide:\r\n realiza la divición de dos números decimales. El primer número es el numerador, y el segundo es el denominador.\r\nAcepta signo y/o punto decimal, y números de hasta 6 dígitos\r\n",
    handler: handle_divide,
    arity: Arity::Exact(2),
};

/// Registers the arithmetic commands after the built-in `help`.
pub fn register_app_commands(registry: &mut CommandRegistry) -> Result<(), RegistryFull> {
    for command in [&SUMA, &RESTA, &MULTIPLICA, &DIVIDE] {
        registry.register(command)?;
    }
    Ok(())
}

/// Emits one command's help text per call, in table order.
pub fn handle_help(inv: &mut Invocation<'_>) -> Step {
    let Some(command) = inv.commands.get(*inv.cursor) else {
        *inv.cursor = 0;
        return Step::Done;
    };

    if command.help.len() < inv.reply.capacity() {
        inv.reply.set(command.help);
    } else {
        inv.reply.report(Diagnostic::OutputBufferTooSmall);
    }

    *inv.cursor += 1;
    if *inv.cursor >= inv.commands.len() {
        *inv.cursor = 0;
        Step::Done
    } else {
        Step::Again
    }
}

pub fn handle_suma(inv: &mut Invocation<'_>) -> Step {
    arithmetic(inv, |a, b| a + b)
}

pub fn handle_resta(inv: &mut Invocation<'_>) -> Step {
    arithmetic(inv, |a, b| a - b)
}

pub fn handle_multiplica(inv: &mut Invocation<'_>) -> Step {
    arithmetic(inv, |a, b| a * b)
}

pub fn handle_divide(inv: &mut Invocation<'_>) -> Step {
    let Ok((a, b)) = extract_operands(inv.line, inv.reply) else {
        return Step::Done;
    };

    // Exact zero only; tiny denominators still divide.
    if b == 0.0 {
        inv.reply.report(Diagnostic::DivisionByZero);
    } else {
        write_result(inv, a / b);
    }
    Step::Done
}

fn arithmetic(inv: &mut Invocation<'_>, op: impl FnOnce(f64, f64) -> f64) -> Step {
    if let Ok((a, b)) = extract_operands(inv.line, inv.reply) {
        write_result(inv, op(a, b));
    }
    Step::Done
}

fn write_result(inv: &mut Invocation<'_>, value: f64) {
    inv.reply.clear();
    let _ = write_general(&mut *inv.reply, value);
    let _ = inv.reply.write_str(NEWLINE);
}
