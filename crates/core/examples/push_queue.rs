//! Push-style queue demo: callers enqueue directly, the buffer is bounded
//! by the high-water mark and ids are generated.
//!
//! Run with `cargo run --example push_queue`.

use std::time::Duration;

use conveyor::{MessageContext, QueueBuilder, QueueSettings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let engine = QueueBuilder::new(QueueSettings::new(2, 8, 1))
        .handler_fn(|ctx: MessageContext<String>| {
            println!("handled {}: {}", ctx.message_id(), ctx.message());
            Ok(())
        })
        .build()?;

    engine.start()?;
    for i in 0..20 {
        // Blocks once 8 messages are buffered until a worker frees a slot.
        let id = engine.enqueue(format!("job-{i}")).await;
        println!("enqueued {id}");
    }

    tokio::time::sleep(Duration::from_millis(200)).await;
    engine.stop();
    Ok(())
}
