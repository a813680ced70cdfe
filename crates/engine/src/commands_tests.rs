// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tg_core::FakeClock;
use yare::parameterized;

fn handler() -> CommandHandler<FakeClock> {
    let store = Store::open_in_memory(FakeClock::new()).unwrap();
    store.seed_car("car-1", "open", "main", "Fix login").unwrap();
    store.seed_car("car-2", "in_progress", "main", "Add caching").unwrap();
    store.seed_car("car-3", "done", "infra", "Upgrade CI").unwrap();
    store.seed_engine("engine-1", "working").unwrap();
    CommandHandler::new(store)
}

#[parameterized(
    status = { "status", true },
    car = { "car", true },
    engine = { "engine", true },
    help = { "help", true },
    list = { "list", false },
    free_text = { "fix", false },
)]
fn command_word_set(word: &str, expected: bool) {
    assert_eq!(is_command_word(word), expected);
}

#[test]
fn empty_input_shows_help() {
    let reply = handler().handle("");
    assert!(reply.contains("!ry status"));
    assert!(reply.contains("!ry car list"));
}

#[test]
fn status_renders_summary() {
    let reply = handler().handle("status");
    assert!(reply.contains("Active: 1"));
    assert!(reply.contains("Done: 1"));
    assert!(reply.contains("engine-1 [working]"));
}

#[test]
fn car_list_plain_and_filtered() {
    let h = handler();
    let reply = h.handle("car list");
    assert!(reply.contains("car-1 [open] main — Fix login"));
    assert!(reply.contains("car-3"));

    let reply = h.handle("car list --track infra");
    assert!(reply.contains("car-3"));
    assert!(!reply.contains("car-1"));

    let reply = h.handle("car list --status open --track main");
    assert!(reply.contains("car-1"));
    assert!(!reply.contains("car-2"));

    let reply = h.handle("car list --track ghost");
    assert_eq!(reply, "No cars found.");
}

#[test]
fn car_show_found_and_missing() {
    let h = handler();
    let reply = h.handle("car show car-2");
    assert!(reply.contains("status: in_progress"));
    assert!(reply.contains("title: Add caching"));

    assert_eq!(h.handle("car show car-404"), "Car not found: car-404");
    assert_eq!(h.handle("car show"), "Usage: !ry car show <carID>");
}

#[test]
fn engine_list_renders() {
    let reply = handler().handle("engine list");
    assert_eq!(reply, "engine-1 [working]");
}

#[test]
fn unknown_words_get_help() {
    let reply = handler().handle("frobnicate");
    assert!(reply.starts_with("Unknown command: `frobnicate`"));
    assert!(reply.contains("!ry help"));

    let reply = handler().handle("car explode");
    assert!(reply.starts_with("Unknown command: `car explode`"));
}

#[test]
fn bad_flag_shows_usage() {
    let reply = handler().handle("car list --color red");
    assert!(reply.contains("Unknown flag: `--color`"));
}
