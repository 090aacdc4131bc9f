//! Pull-style queue demo: a numeric source polled every 500ms, three
//! workers, case-by-value dedup.
//!
//! Run with `cargo run --example pull_queue`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use conveyor::{KeySelector, MessageContext, MessageId, QueueBuilder, QueueSettings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let next = Arc::new(AtomicUsize::new(0));
    let engine = QueueBuilder::new(QueueSettings::new(3, 10, 2))
        .source_fn(
            move |count| {
                let start = next.fetch_add(count, Ordering::SeqCst);
                (start..start + count).collect::<Vec<usize>>()
            },
            Duration::from_millis(500),
        )
        .key_selector(KeySelector::from_fn(|n: &usize| {
            MessageId::new(n.to_string())
        }))
        .distinct_by(|a: &usize, b: &usize| a == b)
        .handler_fn(|ctx: MessageContext<usize>| {
            println!("handled message {} (value {})", ctx.message_id(), ctx.message());
            Ok(())
        })
        .build()?;

    engine.start()?;
    tokio::time::sleep(Duration::from_secs(3)).await;
    engine.stop();
    println!("stopped; {} messages still buffered", engine.queue_count());
    Ok(())
}
