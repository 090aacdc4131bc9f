//! Worker pool behavior through the public builder: delivery guarantees,
//! failure and panic isolation, duplicate-key handling.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use conveyor::port::message_handler::mocks::{FailingHandler, RecordingHandler};
use conveyor::{KeySelector, MessageId, QueueBuilder, QueueSettings};

async fn wait_until(deadline: Duration, check: impl Fn() -> bool) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}

/// Every enqueued message is handled exactly once, regardless of which of
/// the three workers picks it up.
#[tokio::test]
async fn each_message_is_handled_exactly_once() {
    let handler = Arc::new(RecordingHandler::new());
    let engine = QueueBuilder::new(QueueSettings::new(3, 10, 2))
        .handler(Arc::clone(&handler))
        .build()
        .unwrap();
    engine.start().unwrap();

    let mut expected = Vec::new();
    for n in 0..5u32 {
        expected.push(engine.enqueue(n).await);
    }

    assert!(
        wait_until(Duration::from_secs(2), || {
            handler.handled_count() == 5 && engine.in_flight_count() == 0
        })
        .await
    );
    let mut handled = handler.handled();
    handled.sort();
    expected.sort();
    assert_eq!(handled, expected);
    engine.stop();
}

/// Handler errors are absorbed per message; the pool keeps draining.
#[tokio::test]
async fn handler_failures_do_not_stall_the_pool() {
    let handler = Arc::new(FailingHandler::new());
    let engine = QueueBuilder::new(QueueSettings::new(2, 10, 2))
        .handler(Arc::clone(&handler))
        .build()
        .unwrap();
    engine.start().unwrap();

    for n in 0..6u32 {
        engine.enqueue(n).await;
    }

    assert!(
        wait_until(Duration::from_secs(2), || {
            handler.seen_count() == 6
                && engine.queue_count() == 0
                && engine.in_flight_count() == 0
        })
        .await
    );
    engine.stop();
}

/// A panicking handler takes down neither its worker nor the engine; the
/// remaining messages are still processed.
#[tokio::test]
async fn handler_panic_is_isolated_to_one_message() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&seen);
    let engine = QueueBuilder::new(QueueSettings::new(2, 10, 2))
        .handler_fn(move |ctx: conveyor::MessageContext<u32>| {
            if *ctx.message() == 3 {
                panic!("poison message");
            }
            recorded.lock().unwrap().push(*ctx.message());
            Ok(())
        })
        .build()
        .unwrap();
    engine.start().unwrap();

    for n in 0..6u32 {
        engine.enqueue(n).await;
    }

    assert!(
        wait_until(Duration::from_secs(2), || {
            seen.lock().unwrap().len() == 5 && engine.in_flight_count() == 0
        })
        .await
    );

    // The pool survived the panic and still accepts new work
    engine.enqueue(7).await;
    assert!(wait_until(Duration::from_secs(2), || {
        seen.lock().unwrap().contains(&7)
    })
    .await);
    engine.stop();
}

/// Two messages mapping to the same key: while the first is in flight the
/// second is dropped instead of being processed concurrently.
#[tokio::test]
async fn same_key_in_flight_suppresses_the_duplicate() {
    let handler = Arc::new(RecordingHandler::with_delay(Duration::from_millis(80)));
    let engine = QueueBuilder::new(QueueSettings::new(2, 10, 2))
        .key_selector(KeySelector::from_fn(|_: &u32| MessageId::new("same")))
        .handler(Arc::clone(&handler))
        .build()
        .unwrap();
    engine.start().unwrap();

    engine.enqueue(1).await;
    engine.enqueue(2).await;

    let h = Arc::clone(&handler);
    assert!(wait_until(Duration::from_secs(2), move || h.handled_count() >= 1).await);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(handler.handled_count(), 1, "duplicate dropped unhandled");
    engine.stop();
}

/// Handlers that fail with an error still report the message they saw.
#[tokio::test]
async fn failing_handler_reports_each_message_once() {
    let handler = Arc::new(FailingHandler::new());
    let engine = QueueBuilder::new(QueueSettings::new(1, 10, 1))
        .handler(Arc::clone(&handler))
        .build()
        .unwrap();
    engine.start().unwrap();

    let a = engine.enqueue(1u8).await;
    let b = engine.enqueue(2u8).await;

    assert!(wait_until(Duration::from_secs(2), || handler.seen_count() == 2).await);
    let mut ids = handler.seen();
    ids.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(ids, expected);
    engine.stop();
}
