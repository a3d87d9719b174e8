//! End-to-end ingest tests: chunked delivery, resynchronization,
//! bounded reassembly, backpressure, and observer ordering.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{build_add, build_cancel, build_execute, build_replace};
use feedbook::{Engine, EngineConfig, EventKind, OrderSnapshot, Side};

type EventLog = Rc<RefCell<Vec<(EventKind, OrderSnapshot)>>>;

fn attach_log(engine: &mut Engine) -> EventLog {
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    engine.set_event_callback(move |kind, snap| {
        sink.borrow_mut().push((kind, *snap));
    });
    log
}

#[test]
fn chunked_add_waits_then_completes() {
    let mut engine = Engine::new();

    let msg = build_add(12345, 10000, 50, b'B', 1_000_000);
    assert_eq!(msg.len(), 36);

    assert!(engine.write_chunk(&msg[..10]));
    engine.process();
    assert_eq!(engine.active_order_count(), 0);
    assert_eq!(engine.error_stats().incomplete_messages, 1);

    assert!(engine.write_chunk(&msg[10..]));
    engine.process();
    assert_eq!(engine.active_order_count(), 1);
    assert_eq!(engine.best_bid(), Some((10000, 50)));

    let snap = engine.find_order(12345).unwrap();
    assert_eq!(snap.quantity, 50);
    assert_eq!(snap.timestamp, 1_000_000);
}

#[test]
fn partial_execute_over_the_wire() {
    let mut engine = Engine::new();
    let log = attach_log(&mut engine);

    engine.write_chunk(&build_add(12345, 10000, 50, b'B', 1_000_000));
    engine.process();

    engine.write_chunk(&build_execute(12345, 20));
    engine.process();

    assert_eq!(engine.find_order(12345).unwrap().quantity, 30);
    assert_eq!(engine.best_bid(), Some((10000, 30)));

    let log = log.borrow();
    let (kind, snap) = log.last().unwrap();
    assert_eq!(*kind, EventKind::Execute);
    assert_eq!(snap.quantity, 30);
}

#[test]
fn cancel_nonexistent_leaves_state_untouched() {
    let mut engine = Engine::new();
    engine.write_chunk(&build_add(1, 10000, 50, b'B', 0));
    engine.process();

    assert!(!engine.cancel_order(999_999));
    assert_eq!(engine.error_stats().invalid_operations, 1);
    assert_eq!(engine.active_order_count(), 1);
    assert_eq!(engine.best_bid(), Some((10000, 50)));
}

#[test]
fn cancel_over_the_wire_is_full_cancel() {
    let mut engine = Engine::new();
    engine.write_chunk(&build_add(7, 10000, 50, b'B', 0));
    engine.process();

    // The wire carries a partial quantity; the engine cancels whole.
    engine.write_chunk(&build_cancel(7, 10));
    engine.process();

    assert_eq!(engine.find_order(7), None);
    assert_eq!(engine.best_bid(), None);
    assert_eq!(engine.order_count(), 0);
}

#[test]
fn replace_over_the_wire() {
    let mut engine = Engine::new();
    let log = attach_log(&mut engine);

    engine.write_chunk(&build_add(12345, 10000, 30, b'B', 42));
    engine.process();

    engine.write_chunk(&build_replace(12345, 12347, 100, 10050, 99));
    engine.process();

    assert_eq!(engine.find_order(12345), None);
    let snap = engine.find_order(12347).unwrap();
    assert_eq!(snap.price, 10050);
    assert_eq!(snap.quantity, 100);
    assert_eq!(snap.side, Side::Bid);
    assert_eq!(snap.timestamp, 42); // original's timestamp survives
    assert_eq!(engine.best_bid(), Some((10050, 100)));

    let log = log.borrow();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].0, EventKind::Replace);
    assert_eq!(log[1].1.order_id, 12347);
}

#[test]
fn unknown_type_byte_resyncs() {
    let mut engine = Engine::new();

    let mut stream = vec![0xFF];
    stream.extend_from_slice(&build_add(1, 10000, 50, b'B', 0));
    engine.write_chunk(&stream);
    engine.process();

    assert_eq!(engine.error_stats().unknown_message_types, 1);
    assert_eq!(engine.active_order_count(), 1);
    assert_eq!(engine.best_bid(), Some((10000, 50)));
}

#[test]
fn junk_between_messages_counts_per_byte() {
    let mut engine = Engine::new();

    let junk = [0x00, 0x7F, b'Z', 0xFE, 0x01];
    let mut stream = build_add(1, 10000, 10, b'B', 0);
    stream.extend_from_slice(&junk);
    stream.extend_from_slice(&build_add(2, 10010, 20, b'S', 0));
    stream.extend_from_slice(&junk);
    stream.extend_from_slice(&build_execute(1, 5));

    engine.write_chunk(&stream);
    engine.process();

    assert_eq!(engine.error_stats().unknown_message_types, 2 * junk.len() as u64);
    assert_eq!(engine.find_order(1).unwrap().quantity, 5);
    assert_eq!(engine.best_ask(), Some((10010, 20)));
}

#[test]
fn reassembly_overflow_clears_and_recovers() {
    let mut engine = Engine::new();

    // 17 frames = 612 bytes, past the 512-byte reassembly bound, all
    // drained in a single process() call.
    for i in 0..17u64 {
        assert!(engine.write_chunk(&build_add(i, 10000 + i as u32, 10, b'B', 0)));
    }
    engine.process();

    assert_eq!(engine.error_stats().buffer_overflows, 1);
    assert_eq!(engine.order_count(), 0);
    assert_eq!(engine.best_bid(), None);

    // The stream is usable again afterwards
    engine.write_chunk(&build_add(100, 10000, 10, b'B', 0));
    engine.process();
    assert_eq!(engine.active_order_count(), 1);
}

#[test]
fn fifo_backpressure_caps_accepted_frames() {
    let mut engine = Engine::with_config(EngineConfig {
        fifo_capacity_bytes: 256,
        ..EngineConfig::default()
    });

    let mut accepted = 0;
    for i in 0..20u64 {
        if engine.write_chunk(&build_add(i, 10000, 10, b'B', 0)) {
            accepted += 1;
        }
    }

    // floor(256 / 36) = 7 frames fit
    assert_eq!(accepted, 7);
    let stats = engine.fifo_stats();
    assert_eq!(stats.backpressure_events, 13);
    assert_eq!(stats.bytes_dropped, 13 * 36);
    assert!(stats.high_water_mark <= 256);

    engine.process();
    assert_eq!(engine.active_order_count(), 7);

    // Drained: the producer's retry now succeeds
    assert!(engine.write_chunk(&build_add(100, 10000, 10, b'B', 0)));
}

#[test]
fn chunk_partitioning_does_not_change_outcome() {
    let mut stream = Vec::new();
    stream.extend_from_slice(&build_add(1, 10000, 50, b'B', 10));
    stream.extend_from_slice(&build_add(2, 10010, 30, b'S', 20));
    stream.extend_from_slice(&build_add(3, 10000, 25, b'B', 30));
    stream.extend_from_slice(&build_execute(1, 20));
    stream.extend_from_slice(&build_replace(2, 4, 60, 10020, 40));
    stream.extend_from_slice(&build_cancel(3, 0));

    let run = |chunk_size: usize| {
        let mut engine = Engine::new();
        let log = attach_log(&mut engine);
        for chunk in stream.chunks(chunk_size) {
            assert!(engine.write_chunk(chunk));
            engine.process();
        }
        let events = log.borrow().clone();
        (
            engine.depth(16),
            engine.order_count(),
            engine.best_bid(),
            engine.best_ask(),
            events,
        )
    };

    let whole = run(stream.len());
    for chunk_size in [1, 2, 3, 5, 7, 11, 36, 64] {
        assert_eq!(run(chunk_size), whole, "chunk_size={chunk_size}");
    }
}

#[test]
fn observer_sees_events_in_byte_order() {
    let mut engine = Engine::new();
    let log = attach_log(&mut engine);

    let mut stream = Vec::new();
    stream.extend_from_slice(&build_add(1, 10000, 50, b'B', 0));
    stream.extend_from_slice(&build_add(2, 10010, 30, b'S', 0));
    stream.extend_from_slice(&build_execute(1, 50));
    stream.extend_from_slice(&build_cancel(2, 0));
    engine.write_chunk(&stream);
    engine.process();

    let log = log.borrow();
    let kinds: Vec<EventKind> = log.iter().map(|(k, _)| *k).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::Add,
            EventKind::Add,
            EventKind::Execute,
            EventKind::Cancel,
        ]
    );

    // Full execute shows the final state before erasure
    assert_eq!(log[2].1.quantity, 0);
    assert!(!log[2].1.active);
    // Cancel shows the order inactive with its remaining quantity
    assert_eq!(log[3].1.quantity, 30);
    assert!(!log[3].1.active);
}

#[test]
fn process_is_idempotent_without_new_bytes() {
    let mut engine = Engine::new();
    engine.write_chunk(&build_add(1, 10000, 50, b'B', 0));
    engine.process();

    let before = (engine.depth(8), engine.order_count());
    engine.process();
    engine.process();
    assert_eq!((engine.depth(8), engine.order_count()), before);
    assert_eq!(engine.error_stats().buffer_overflows, 0);
    assert_eq!(engine.error_stats().unknown_message_types, 0);
}

#[test]
fn add_then_cancel_round_trips_book_state() {
    let mut engine = Engine::new();
    engine.write_chunk(&build_add(1, 10000, 50, b'B', 0));
    engine.write_chunk(&build_add(2, 10010, 30, b'S', 0));
    engine.process();

    let before = (
        engine.depth(16),
        engine.best_bid(),
        engine.best_ask(),
        engine.spread(),
        engine.order_count(),
    );

    engine.write_chunk(&build_add(3, 10005, 40, b'B', 0));
    engine.write_chunk(&build_cancel(3, 0));
    engine.process();

    let after = (
        engine.depth(16),
        engine.best_bid(),
        engine.best_ask(),
        engine.spread(),
        engine.order_count(),
    );
    assert_eq!(after, before);
}
