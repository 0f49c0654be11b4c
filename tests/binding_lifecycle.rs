//! Registration, dispatch and context removal through the public service API.

mod common;

use common::{binding_file, Harness};
use pretty_assertions::assert_eq;
use urtsi_bridge::port::MockPortOpener;
use urtsi_bridge::{BindingError, BindingFile, Command, Item, ItemKind, PortError};

#[test]
fn test_shared_port_single_connection_scenario() {
    let h = Harness::new();
    h.bind("file1", "A", "p0:1");
    h.bind("file1", "B", "p0:2");

    assert_eq!(h.opener.open_count("p0"), 1);
    assert_eq!(h.binding.open_ports(), vec!["p0"]);

    h.send("A", Command::Up);
    assert_eq!(h.port("p0").written_strings(), vec!["0101U"]);

    assert_eq!(h.binding.remove_context("file1"), 2);
    assert_eq!(h.port("p0").close_count(), 1);
    assert!(h.binding.open_ports().is_empty());
    assert!(h.binding.resolve("A").is_none());
    assert!(h.binding.resolve("B").is_none());
}

#[test]
fn test_port_shared_across_contexts_stays_open() {
    let h = Harness::new();
    h.bind("file1", "A", "p0:1");
    h.bind("file2", "C", "p0:3");

    h.binding.remove_context("file1");
    assert_eq!(h.port("p0").close_count(), 0);
    assert_eq!(h.binding.open_ports(), vec!["p0"]);

    h.send("C", Command::Down);
    assert_eq!(h.port("p0").written_strings(), vec!["0103D"]);

    h.binding.remove_context("file2");
    assert_eq!(h.port("p0").close_count(), 1);
}

#[test]
fn test_context_removal_only_closes_its_own_ports() {
    let h = Harness::new();
    h.bind("file1", "A", "p0:1");
    h.bind("file2", "B", "p1:1");

    h.binding.remove_context("file1");
    assert_eq!(h.port("p0").close_count(), 1);
    assert_eq!(h.port("p1").close_count(), 0);
    assert_eq!(h.binding.contexts(), vec!["file2"]);
}

#[test]
fn test_removing_unknown_context_is_noop() {
    let h = Harness::new();
    h.bind("file1", "A", "p0:1");

    assert_eq!(h.binding.remove_context("file9"), 0);
    assert_eq!(h.binding.open_ports(), vec!["p0"]);
}

#[test]
fn test_wire_payloads() {
    let h = Harness::new();
    h.bind("f", "Seven", "p0:7");
    h.bind("f", "Twelve", "p0:12");
    h.bind("f", "One", "p0:1");

    h.send("Seven", Command::Up);
    h.send("Twelve", Command::Down);
    h.send("One", Command::Stop);

    assert_eq!(h.port("p0").written_strings(), vec!["0107U", "0112D", "0101U"]);
}

#[test]
fn test_unknown_item_performs_no_write() {
    let h = Harness::new();
    h.bind("f", "A", "p0:1");

    assert!(h.binding.dispatch("Ghost", Command::Up).is_none());
    h.binding.shutdown();
    assert!(h.port("p0").get_write_log().is_empty());
}

#[test]
fn test_non_shutter_item_rejected_without_side_effects() {
    let h = Harness::new();
    h.bind("f", "A", "p0:1");

    let err = h
        .binding
        .register("f", &Item::new("Lamp", ItemKind::Switch), "p1:1")
        .unwrap_err();

    match err {
        BindingError::TypeMismatch { item, kind } => {
            assert_eq!(item, "Lamp");
            assert_eq!(kind, "Switch");
        }
        other => panic!("Expected TypeMismatch, got {:?}", other),
    }
    assert_eq!(h.binding.items_in("f"), vec!["A"]);
    assert_eq!(h.binding.open_ports(), vec!["p0"]);
    assert_eq!(h.opener.open_count("p1"), 0);
}

#[test]
fn test_missing_port_reports_available_ports() {
    let h = Harness::with_opener(MockPortOpener::with_available(["/dev/ttyS0", "/dev/ttyUSB0"]));

    let err = h
        .binding
        .register("f", &Item::rollershutter("A"), "/dev/ttyUSB7:1")
        .unwrap_err();

    match err {
        BindingError::Initialization {
            source: PortError::NotFound { available, .. },
            ..
        } => assert_eq!(available, vec!["/dev/ttyS0", "/dev/ttyUSB0"]),
        other => panic!("Expected NotFound, got {:?}", other),
    }
    assert!(h.binding.contexts().is_empty());
}

#[test]
fn test_failed_item_does_not_affect_other_contexts() {
    let h = Harness::new();
    h.opener.mark_busy("busy");
    h.bind("file1", "A", "p0:1");

    assert!(h
        .binding
        .register("file2", &Item::rollershutter("B"), "busy:1")
        .is_err());

    h.send("A", Command::Down);
    assert_eq!(h.port("p0").written_strings(), vec!["0101D"]);
    assert!(h.binding.contexts().iter().all(|c| c != "file2"));
}

#[test]
fn test_write_failure_is_not_escalated() {
    let h = Harness::new();
    h.bind("f", "A", "p0:1");
    let port = h.port("p0");

    port.set_fail_writes(true);
    let ticket = h.binding.dispatch("A", Command::Up).unwrap();
    assert!(matches!(ticket.wait(), Err(PortError::Io(_))));

    port.set_fail_writes(false);
    h.send("A", Command::Down);
    assert_eq!(port.written_strings(), vec!["0101D"]);
    assert_eq!(port.close_count(), 0);
}

#[test]
fn test_reloading_binding_file_replaces_context() {
    let h = Harness::new();
    let first = BindingFile::load(
        binding_file(
            r#"
            [[item]]
            name = "A"
            urtsi = "p0:1"

            [[item]]
            name = "B"
            urtsi = "p1:2"
            "#,
        )
        .path(),
    )
    .unwrap();
    let second = BindingFile::load(
        binding_file(
            r#"
            [[item]]
            name = "A"
            urtsi = "p0:5"
            "#,
        )
        .path(),
    )
    .unwrap();

    let report = h.binding.load_context("shutters.toml", &first);
    assert!(report.is_clean());
    assert_eq!(h.binding.open_ports(), vec!["p0", "p1"]);

    let report = h.binding.load_context("shutters.toml", &second);
    assert_eq!(report.registered, vec!["A"]);
    assert_eq!(h.binding.open_ports(), vec!["p0"]);
    assert_eq!(h.port("p1").close_count(), 1);
    assert!(h.binding.resolve("B").is_none());

    h.send("A", Command::Up);
    assert_eq!(h.port("p0").written_strings(), vec!["0105U"]);
}

#[test]
fn test_bad_entry_does_not_cost_the_rest_of_the_file() {
    let h = Harness::new();
    let file = BindingFile::load(
        binding_file(
            r#"
            [[item]]
            name = "Good"
            urtsi = "p0:1"

            [[item]]
            name = "Heater"
            type = "Thermostat"
            urtsi = "p0:2"
            "#,
        )
        .path(),
    )
    .unwrap();

    let report = h.binding.load_context("mixed.toml", &file);
    assert_eq!(report.registered, vec!["Good"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, "Heater");

    h.send("Good", Command::Down);
    assert_eq!(h.port("p0").written_strings(), vec!["0101D"]);
}
