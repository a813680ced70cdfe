// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only `!ry` query commands.

use crate::format::render_status;
use tg_core::Clock;
use tg_storage::{CarFilter, Store};

/// Top-level words the router treats as commands.
pub fn is_command_word(word: &str) -> bool {
    matches!(word, "status" | "car" | "engine" | "help")
}

/// Handles the `!ry` command grammar against the orchestrator read-side.
pub struct CommandHandler<C: Clock> {
    store: Store<C>,
}

impl<C: Clock> Clone for CommandHandler<C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<C: Clock> CommandHandler<C> {
    pub fn new(store: Store<C>) -> Self {
        Self { store }
    }

    /// Execute a command. `input` is the text after the `!ry` prefix (or
    /// mention marker). Always returns a reply; never errors.
    pub fn handle(&self, input: &str) -> String {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        match tokens.split_first() {
            None => help_text(),
            Some((&"help", _)) => help_text(),
            Some((&"status", _)) => self.status(),
            Some((&"car", rest)) => self.car(rest),
            Some((&"engine", rest)) => self.engine(rest),
            Some((word, _)) => unknown(word),
        }
    }

    fn status(&self) -> String {
        match self.store.status_info() {
            Ok(info) => render_status(&info),
            Err(e) => format!("Failed to query status: {e}"),
        }
    }

    fn car(&self, rest: &[&str]) -> String {
        match rest.split_first() {
            Some((&"list", args)) => self.car_list(args),
            Some((&"show", args)) => match args.first() {
                Some(id) => self.car_show(id),
                None => "Usage: !ry car show <carID>".to_string(),
            },
            Some((word, _)) => unknown(&format!("car {word}")),
            None => unknown("car"),
        }
    }

    fn car_list(&self, args: &[&str]) -> String {
        let mut filter = CarFilter::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let value = |iter: &mut std::slice::Iter<'_, &str>| {
                iter.next().map(|v| v.to_string())
            };
            match *arg {
                "--track" => filter.track = value(&mut iter),
                "--status" => filter.status = value(&mut iter),
                "--type" => filter.car_type = value(&mut iter),
                other => return format!("Unknown flag: `{other}`\n\nUsage: !ry car list [--track <t>] [--status <s>] [--type <t>]"),
            }
        }

        match self.store.list_cars(&filter) {
            Ok(cars) if cars.is_empty() => "No cars found.".to_string(),
            Ok(cars) => cars
                .iter()
                .map(|c| format!("{} [{}] {} — {}", c.id, c.status, c.track, c.title))
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => format!("Failed to list cars: {e}"),
        }
    }

    fn car_show(&self, id: &str) -> String {
        match self.store.get_car(id) {
            Ok(Some(car)) => format!(
                "{}\n  status: {}\n  track: {}\n  title: {}",
                car.id, car.status, car.track, car.title
            ),
            Ok(None) => format!("Car not found: {id}"),
            Err(e) => format!("Failed to look up car: {e}"),
        }
    }

    fn engine(&self, rest: &[&str]) -> String {
        match rest.first() {
            Some(&"list") => match self.store.list_engines() {
                Ok(engines) if engines.is_empty() => "No engines registered.".to_string(),
                Ok(engines) => engines
                    .iter()
                    .map(|e| match &e.current_car {
                        Some(car) => format!("{} [{}] pulling {}", e.name, e.status, car),
                        None => format!("{} [{}]", e.name, e.status),
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
                Err(e) => format!("Failed to list engines: {e}"),
            },
            Some(word) => unknown(&format!("engine {word}")),
            None => unknown("engine"),
        }
    }
}

fn unknown(word: &str) -> String {
    format!("Unknown command: `{word}`\n\n{}", help_text())
}

fn help_text() -> String {
    "Railyard bridge commands:\n\
     \x20 !ry status                                        Orchestration summary\n\
     \x20 !ry car list [--track <t>] [--status <s>] [--type <t>]\n\
     \x20 !ry car show <carID>                              Car details\n\
     \x20 !ry engine list                                   Engine status\n\
     \x20 !ry help                                          This message\n\
     \n\
     Mention the bot (or start a message with `!ry `) followed by a request \
     to open a dispatch session."
        .to_string()
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
