// Step over statements of a simulated program run
//
// Feeds a short instrumentation trace through the step loop and prints where
// each step suspends.

use step_engine::{
    spawn_step_loop, DebuggerSession, InstrumentationEvent, SourceElementKind, StepConfig,
    SuspendAnchor,
};

fn trace() -> Vec<InstrumentationEvent> {
    use SourceElementKind::*;
    use SuspendAnchor::*;

    vec![
        InstrumentationEvent::new(Before).with_tag(Root).at("main"),
        InstrumentationEvent::new(Before).with_tag(Statement).at("main.sl:2"),
        InstrumentationEvent::new(Before).with_tag(Expression).at("main.sl:2:9"),
        InstrumentationEvent::new(After).with_tag(Expression).at("main.sl:2:9"),
        InstrumentationEvent::new(Before).with_tag(Statement).at("main.sl:3"),
        InstrumentationEvent::new(Before).with_tag(Statement).at("main.sl:4"),
        InstrumentationEvent::new(After).with_tag(Root).at("main"),
    ]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("step_engine=debug")
        .init();

    let session = DebuggerSession::with_source_elements(&[
        SourceElementKind::Root,
        SourceElementKind::Statement,
    ])?;
    let handle = spawn_step_loop(session);

    println!("Stepping over two statements...");
    handle
        .prepare_step(
            StepConfig::builder()
                .source_elements(&[SourceElementKind::Statement])?
                .count(2)?
                .build(),
        )
        .await?;

    for event in trace() {
        handle.report(event).await?;
    }

    if let Some(suspended) = handle.recv_suspended().await {
        println!(
            "Suspended at {} ({})",
            suspended.event.location.as_deref().unwrap_or("?"),
            suspended.event.anchor
        );
    }

    Ok(())
}
