use lockstep_core::{Event, EventRef, ProcessId};

pub const METRIC: &str = "Lateness";

pub fn pid(id: u32) -> ProcessId {
    ProcessId::new(id)
}

/// Builds a step-ordered sequence where every event after the first carries a
/// `comm_prev` link to its predecessor, mirroring what a trace importer
/// produces for a process that communicates at every step.
pub fn chained(process: u32, points: &[(i64, i64)]) -> Vec<Event> {
    points
        .iter()
        .enumerate()
        .map(|(index, &(step, value))| {
            let event = Event::new(step).with_metric(METRIC, value);
            if index == 0 {
                event
            } else {
                event.with_comm_prev(EventRef::new(pid(process), index - 1))
            }
        })
        .collect()
}
