//! Trace data model consumed by the clustering and selection passes.
//!
//! The importer collaborator assembles a [`Trace`] through [`TraceBuilder`];
//! the core treats the built trace as read-only input. Cross-references
//! between events (message endpoints, causal predecessors) are composite keys
//! ([`EventRef`]) resolved through the owning process's sequence on demand,
//! never owning pointers, so a trace can be shared freely between the
//! clustering engine and the selection pass.

use std::collections::BTreeMap;
use std::fmt;

use crate::{
    distance::{Dissimilarity, sequence_distance},
    error::{LockstepError, TraceError},
};

/// Metric the engine clusters on when the caller does not override it.
pub const DEFAULT_METRIC: &str = "Lateness";

/// Identifier of one traced process (for example one rank).
///
/// # Examples
/// ```
/// use lockstep_core::ProcessId;
///
/// let id = ProcessId::new(3);
/// assert_eq!(id.get(), 3);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(u32);

impl ProcessId {
    /// Creates a new process identifier.
    #[rustfmt::skip]
    #[must_use]
    pub const fn new(id: u32) -> Self { Self(id) }

    /// Returns the underlying numeric identifier.
    #[rustfmt::skip]
    #[must_use]
    pub const fn get(self) -> u32 { self.0 }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite key addressing one event inside a process's sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventRef {
    process: ProcessId,
    index: usize,
}

impl EventRef {
    /// Creates a reference to the event at `index` in `process`'s sequence.
    #[must_use]
    pub const fn new(process: ProcessId, index: usize) -> Self {
        Self { process, index }
    }

    /// Returns the process owning the referenced event.
    #[rustfmt::skip]
    #[must_use]
    pub const fn process(self) -> ProcessId { self.process }

    /// Returns the index of the referenced event within its sequence.
    #[rustfmt::skip]
    #[must_use]
    pub const fn index(self) -> usize { self.index }
}

/// Index of a message in the trace's message table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(usize);

impl MessageId {
    /// Returns the position of the message in [`Trace::messages`].
    #[rustfmt::skip]
    #[must_use]
    pub const fn get(self) -> usize { self.0 }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct MetricValue {
    value: i64,
    aggregate: i64,
}

/// A single traced event.
///
/// Events carry an integer logical `step`, a small set of named metrics (each
/// with a per-event value and an aggregated value covering the preceding
/// inter-step span), an optional causal predecessor on the same process, and
/// the messages attached to them by [`TraceBuilder`]. A metric absent from an
/// event reads as `0`.
///
/// # Examples
/// ```
/// use lockstep_core::Event;
///
/// let event = Event::new(4).with_metric("Lateness", 17);
/// assert_eq!(event.step(), 4);
/// assert_eq!(event.metric("Lateness"), 17);
/// assert_eq!(event.metric("Imbalance"), 0);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    step: i64,
    metrics: BTreeMap<String, MetricValue>,
    comm_prev: Option<EventRef>,
    messages: Vec<MessageId>,
}

impl Event {
    /// Creates an event at the given logical step with no metrics.
    #[must_use]
    pub const fn new(step: i64) -> Self {
        Self {
            step,
            metrics: BTreeMap::new(),
            comm_prev: None,
            messages: Vec::new(),
        }
    }

    /// Sets the per-event value of a named metric.
    #[must_use]
    pub fn with_metric(mut self, name: impl Into<String>, value: i64) -> Self {
        self.metrics.entry(name.into()).or_default().value = value;
        self
    }

    /// Sets the aggregated (inter-step) value of a named metric.
    #[must_use]
    pub fn with_aggregate(mut self, name: impl Into<String>, value: i64) -> Self {
        self.metrics.entry(name.into()).or_default().aggregate = value;
        self
    }

    /// Links this event to its causal predecessor on the same process.
    #[must_use]
    pub const fn with_comm_prev(mut self, prev: EventRef) -> Self {
        self.comm_prev = Some(prev);
        self
    }

    /// Returns the logical step of this event.
    #[rustfmt::skip]
    #[must_use]
    pub const fn step(&self) -> i64 { self.step }

    /// Returns the per-event value of `name`, or `0` when absent.
    #[must_use]
    pub fn metric(&self, name: &str) -> i64 {
        self.metrics.get(name).map_or(0, |m| m.value)
    }

    /// Returns the aggregated value of `name`, or `0` when absent.
    #[must_use]
    pub fn aggregate_metric(&self, name: &str) -> i64 {
        self.metrics.get(name).map_or(0, |m| m.aggregate)
    }

    /// Returns whether the event carries a value for `name`.
    #[must_use]
    pub fn has_metric(&self, name: &str) -> bool {
        self.metrics.contains_key(name)
    }

    /// Returns the causal predecessor link, if any.
    #[rustfmt::skip]
    #[must_use]
    pub const fn comm_prev(&self) -> Option<EventRef> { self.comm_prev }

    /// Returns the messages attached to this event.
    #[must_use]
    pub fn messages(&self) -> &[MessageId] {
        &self.messages
    }

    fn attach_message(&mut self, id: MessageId) {
        self.messages.push(id);
    }
}

/// A directed message between two events of (usually) different processes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Message {
    sender: EventRef,
    receiver: EventRef,
}

impl Message {
    /// Returns the sending event.
    #[rustfmt::skip]
    #[must_use]
    pub const fn sender(self) -> EventRef { self.sender }

    /// Returns the receiving event.
    #[rustfmt::skip]
    #[must_use]
    pub const fn receiver(self) -> EventRef { self.receiver }
}

/// Borrowed view of one process's step-ordered event sequence.
#[derive(Clone, Copy, Debug)]
pub struct SequenceView<'a> {
    process: ProcessId,
    events: &'a [Event],
}

impl<'a> SequenceView<'a> {
    /// Creates a view over `process`'s events.
    #[must_use]
    pub const fn new(process: ProcessId, events: &'a [Event]) -> Self {
        Self { process, events }
    }

    /// Returns the owning process id.
    #[rustfmt::skip]
    #[must_use]
    pub const fn process(self) -> ProcessId { self.process }

    /// Returns the events in step order.
    #[rustfmt::skip]
    #[must_use]
    pub const fn events(self) -> &'a [Event] { self.events }
}

/// A complete, validated execution trace.
///
/// # Examples
/// ```
/// use lockstep_core::{Event, EventRef, ProcessId, Trace};
///
/// let trace = Trace::builder()
///     .with_process(ProcessId::new(0), vec![
///         Event::new(0).with_metric("Lateness", 4),
///         Event::new(1).with_metric("Lateness", 6),
///     ])
///     .with_process(ProcessId::new(1), vec![
///         Event::new(0).with_metric("Lateness", 5),
///     ])
///     .with_message(
///         EventRef::new(ProcessId::new(0), 0),
///         EventRef::new(ProcessId::new(1), 0),
///     )
///     .build()?;
/// assert_eq!(trace.process_count(), 2);
/// assert_eq!(trace.step_extents(), Some((0, 1)));
/// # Ok::<(), lockstep_core::TraceError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trace {
    processes: BTreeMap<ProcessId, Vec<Event>>,
    messages: Vec<Message>,
    step_extents: Option<(i64, i64)>,
}

impl Trace {
    /// Creates an empty [`TraceBuilder`].
    #[must_use]
    pub fn builder() -> TraceBuilder {
        TraceBuilder::default()
    }

    /// Returns the process ids in ascending order.
    pub fn process_ids(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.processes.keys().copied()
    }

    /// Returns the number of processes in the trace.
    #[must_use]
    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    /// Returns whether the trace contains no processes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Returns the event sequence of `process`, if present.
    #[must_use]
    pub fn events(&self, process: ProcessId) -> Option<&[Event]> {
        self.processes.get(&process).map(Vec::as_slice)
    }

    /// Returns a [`SequenceView`] over `process`'s events, if present.
    #[must_use]
    pub fn sequence(&self, process: ProcessId) -> Option<SequenceView<'_>> {
        self.processes
            .get(&process)
            .map(|events| SequenceView::new(process, events))
    }

    /// Returns views over every process's sequence in ascending id order.
    pub fn sequences(&self) -> impl Iterator<Item = SequenceView<'_>> {
        self.processes
            .iter()
            .map(|(&process, events)| SequenceView::new(process, events))
    }

    /// Resolves a message id to its record.
    #[must_use]
    pub fn message(&self, id: MessageId) -> Option<Message> {
        self.messages.get(id.0).copied()
    }

    /// Returns every message in the trace.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the global `(min, max)` step across all processes, or `None`
    /// for a trace without processes.
    #[rustfmt::skip]
    #[must_use]
    pub const fn step_extents(&self) -> Option<(i64, i64)> { self.step_extents }

    /// Resolves an [`EventRef`] to its event.
    #[must_use]
    pub fn resolve(&self, reference: EventRef) -> Option<&Event> {
        self.processes
            .get(&reference.process)?
            .get(reference.index)
    }

    /// Computes the gap-tolerant dissimilarity between two processes'
    /// sequences for one metric.
    ///
    /// # Errors
    /// Returns [`LockstepError::UnknownProcess`] when either process is not
    /// part of the trace.
    ///
    /// # Examples
    /// ```
    /// use lockstep_core::{Dissimilarity, Event, ProcessId, Trace};
    ///
    /// let trace = Trace::builder()
    ///     .with_process(ProcessId::new(0), vec![Event::new(0).with_metric("Lateness", 2)])
    ///     .with_process(ProcessId::new(1), vec![Event::new(0).with_metric("Lateness", 5)])
    ///     .build()
    ///     .expect("trace is valid");
    /// let distance = trace
    ///     .metric_distance(ProcessId::new(0), ProcessId::new(1), "Lateness")
    ///     .expect("both processes exist");
    /// assert_eq!(distance, Dissimilarity::Measured(9));
    /// ```
    pub fn metric_distance(
        &self,
        left: ProcessId,
        right: ProcessId,
        metric: &str,
    ) -> Result<Dissimilarity, LockstepError> {
        let left_view = self
            .sequence(left)
            .ok_or(LockstepError::UnknownProcess { process: left })?;
        let right_view = self
            .sequence(right)
            .ok_or(LockstepError::UnknownProcess { process: right })?;
        Ok(sequence_distance(left_view, right_view, metric))
    }
}

/// Collects processes and messages, then validates them into a [`Trace`].
///
/// Validation enforces the model invariants: unique process ids, non-empty
/// step-ordered sequences, resolvable event references, and `comm_prev`
/// links that stay on their own process and point backwards.
#[derive(Clone, Debug, Default)]
pub struct TraceBuilder {
    processes: Vec<(ProcessId, Vec<Event>)>,
    links: Vec<(EventRef, EventRef)>,
}

impl TraceBuilder {
    /// Adds one process and its step-ordered event sequence.
    #[must_use]
    pub fn with_process(mut self, process: ProcessId, events: Vec<Event>) -> Self {
        self.processes.push((process, events));
        self
    }

    /// Adds a directed message between two events.
    #[must_use]
    pub fn with_message(mut self, sender: EventRef, receiver: EventRef) -> Self {
        self.links.push((sender, receiver));
        self
    }

    /// Validates the collected input and builds the trace.
    ///
    /// # Errors
    /// Returns the first [`TraceError`] encountered: duplicate process ids,
    /// empty or unsorted sequences, dangling event references, or invalid
    /// `comm_prev` links.
    pub fn build(self) -> Result<Trace, TraceError> {
        let mut processes: BTreeMap<ProcessId, Vec<Event>> = BTreeMap::new();
        for (process, events) in self.processes {
            if processes.contains_key(&process) {
                return Err(TraceError::DuplicateProcess { process });
            }
            if events.is_empty() {
                return Err(TraceError::EmptySequence { process });
            }
            for (index, pair) in events.windows(2).enumerate() {
                if let [previous, current] = pair
                    && current.step() < previous.step()
                {
                    return Err(TraceError::UnsortedSteps {
                        process,
                        index: index.saturating_add(1),
                    });
                }
            }
            processes.insert(process, events);
        }

        validate_comm_prev(&processes)?;

        let mut messages = Vec::with_capacity(self.links.len());
        for (sender, receiver) in self.links {
            resolve_ref(&processes, sender)?;
            resolve_ref(&processes, receiver)?;
            let id = MessageId(messages.len());
            messages.push(Message { sender, receiver });
            attach(&mut processes, sender, id);
            attach(&mut processes, receiver, id);
        }

        let step_extents = compute_extents(&processes);
        Ok(Trace {
            processes,
            messages,
            step_extents,
        })
    }
}

fn validate_comm_prev(processes: &BTreeMap<ProcessId, Vec<Event>>) -> Result<(), TraceError> {
    for (&process, events) in processes {
        for (index, event) in events.iter().enumerate() {
            let Some(prev) = event.comm_prev() else {
                continue;
            };
            if prev.process() != process {
                return Err(TraceError::CrossProcessCommPrev { process, index });
            }
            if prev.index() >= index {
                return Err(TraceError::CommPrevNotPreceding { process, index });
            }
            if prev.index() >= events.len() {
                return Err(TraceError::DanglingRef {
                    process: prev.process(),
                    index: prev.index(),
                });
            }
        }
    }
    Ok(())
}

fn resolve_ref(
    processes: &BTreeMap<ProcessId, Vec<Event>>,
    reference: EventRef,
) -> Result<(), TraceError> {
    let resolves = processes
        .get(&reference.process())
        .is_some_and(|events| reference.index() < events.len());
    if resolves {
        Ok(())
    } else {
        Err(TraceError::DanglingRef {
            process: reference.process(),
            index: reference.index(),
        })
    }
}

fn attach(processes: &mut BTreeMap<ProcessId, Vec<Event>>, endpoint: EventRef, id: MessageId) {
    if let Some(event) = processes
        .get_mut(&endpoint.process())
        .and_then(|events| events.get_mut(endpoint.index()))
    {
        event.attach_message(id);
    }
}

fn compute_extents(processes: &BTreeMap<ProcessId, Vec<Event>>) -> Option<(i64, i64)> {
    let mut extents: Option<(i64, i64)> = None;
    for events in processes.values() {
        for event in events {
            let step = event.step();
            extents = Some(match extents {
                None => (step, step),
                Some((min, max)) => (min.min(step), max.max(step)),
            });
        }
    }
    extents
}
