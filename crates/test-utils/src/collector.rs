use std::sync::{Arc, Mutex};

use buildrunner::events::{EventHandler, RunnerEvent};

/// An [`EventHandler`] that records every event for later inspection.
///
/// Returns the handler plus a shared handle to the recorded events.
pub fn collecting_handler() -> (EventHandler, Arc<Mutex<Vec<RunnerEvent>>>) {
    let collected: Arc<Mutex<Vec<RunnerEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&collected);
    let handler: EventHandler = Arc::new(move |event| {
        sink.lock().unwrap().push(event);
    });
    (handler, collected)
}

/// Flatten collected events into `(kind, name)` pairs for order assertions.
pub fn event_summary(events: &[RunnerEvent]) -> Vec<(String, String)> {
    events
        .iter()
        .map(|event| {
            let kind = match event {
                RunnerEvent::Start(_) => "start",
                RunnerEvent::Progress(_) => "progress",
                RunnerEvent::Result(_) => "result",
                RunnerEvent::Error(_) => "error",
            };
            (kind.to_string(), event.name().to_string())
        })
        .collect()
}
