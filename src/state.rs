use crate::model::ExtractionEvent;
use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultState {
    events: Vec<ExtractionEvent>,
    count: u64,
    error_message: Option<String>,
    busy: bool,
}

impl ResultState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ExtractionEvent] {
        &self.events
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Guard rejection: records the reason without ever becoming busy.
    ///
    /// Refused while an operation is in flight, so it can back a
    /// `send_if_modified` just like [`InFlight::begin`].
    pub(crate) fn reject(&mut self, reason: &str) -> bool {
        if self.busy {
            return false;
        }
        self.error_message = Some(reason.to_string());
        true
    }
}

/// How a finished operation changes the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Parsed `/extract` payload; replaces the rows and the count.
    Loaded {
        events: Vec<ExtractionEvent>,
        count: u64,
    },
    /// CSV written client-side; rows, count and error stay as they are.
    Saved,
    /// Any failure; only the error message changes.
    Failed(String),
}

impl Completion {
    fn apply(self, state: &mut ResultState) {
        match self {
            Completion::Loaded { events, count } => {
                state.events = events;
                state.count = count;
                state.error_message = None;
            }
            Completion::Saved => {}
            Completion::Failed(message) => {
                state.error_message = Some(message);
            }
        }
    }
}

/// Proof that this caller owns the one in-flight operation.
#[must_use = "dropping the guard immediately releases the busy flag"]
pub struct InFlight<'a> {
    state: &'a watch::Sender<ResultState>,
    released: bool,
}

impl<'a> InFlight<'a> {
    /// Clears the previous error and sets `busy` in one publish.
    ///
    /// Returns `None` if another operation is already in flight.
    pub fn begin(state: &'a watch::Sender<ResultState>) -> Option<Self> {
        let acquired = state.send_if_modified(|s| {
            if s.busy {
                return false;
            }
            s.error_message = None;
            s.busy = true;
            true
        });

        // Built lazily: a guard constructed on the losing path would release
        // the winner's flag when dropped.
        acquired.then(|| Self {
            state,
            released: false,
        })
    }

    /// Applies the outcome and releases `busy` in the same publish.
    pub fn complete(mut self, completion: Completion) {
        self.state.send_modify(|s| {
            completion.apply(s);
            s.busy = false;
        });
        self.released = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.released {
            log::debug!("in-flight operation dropped before completion, releasing busy flag");
            self.state.send_modify(|s| s.busy = false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str) -> ExtractionEvent {
        ExtractionEvent {
            event: name.to_string(),
            start: None,
            end: None,
            source: format!("{} line", name),
        }
    }

    #[test]
    fn test_initial_state_is_empty() {
        let state = ResultState::new();
        assert!(state.events().is_empty());
        assert_eq!(state.count(), 0);
        assert_eq!(state.error_message(), None);
        assert!(!state.is_busy());
    }

    #[test]
    fn test_begin_blocks_second_operation() {
        let (tx, _rx) = watch::channel(ResultState::new());
        let first = InFlight::begin(&tx).expect("first operation should start");
        assert!(tx.borrow().is_busy());
        assert!(InFlight::begin(&tx).is_none());

        first.complete(Completion::Saved);
        assert!(!tx.borrow().is_busy());
        assert!(InFlight::begin(&tx).is_some());
    }

    #[test]
    fn test_begin_clears_previous_error() {
        let (tx, _rx) = watch::channel(ResultState::new());
        tx.send_if_modified(|s| s.reject("Server 500"));

        let in_flight = InFlight::begin(&tx).unwrap();
        assert_eq!(tx.borrow().error_message(), None);
        in_flight.complete(Completion::Saved);
        assert_eq!(tx.borrow().error_message(), None);
    }

    #[test]
    fn test_reject_refused_while_busy() {
        let (tx, _rx) = watch::channel(ResultState::new());
        let in_flight = InFlight::begin(&tx).unwrap();

        assert!(!tx.send_if_modified(|s| s.reject("Choose a PDF or DOCX first.")));
        assert_eq!(tx.borrow().error_message(), None);

        in_flight.complete(Completion::Saved);
        assert!(tx.send_if_modified(|s| s.reject("Choose a PDF or DOCX first.")));
        assert_eq!(tx.borrow().error_message(), Some("Choose a PDF or DOCX first."));
        assert!(!tx.borrow().is_busy());
    }

    #[test]
    fn test_drop_releases_busy() {
        let (tx, _rx) = watch::channel(ResultState::new());
        {
            let _in_flight = InFlight::begin(&tx).unwrap();
            assert!(tx.borrow().is_busy());
        }
        assert!(!tx.borrow().is_busy());
    }

    #[test]
    fn test_failure_keeps_rows() {
        let (tx, _rx) = watch::channel(ResultState::new());
        InFlight::begin(&tx).unwrap().complete(Completion::Loaded {
            events: vec![event("Arrival")],
            count: 1,
        });

        InFlight::begin(&tx)
            .unwrap()
            .complete(Completion::Failed("Server 500".to_string()));

        let state = tx.borrow();
        assert_eq!(state.events().len(), 1);
        assert_eq!(state.count(), 1);
        assert_eq!(state.error_message(), Some("Server 500"));
        assert!(!state.is_busy());
    }

    #[test]
    fn test_completion_is_a_single_publish() {
        let (tx, mut rx) = watch::channel(ResultState::new());
        let in_flight = InFlight::begin(&tx).unwrap();
        assert!(rx.borrow_and_update().is_busy());

        in_flight.complete(Completion::Loaded {
            events: vec![event("Arrival"), event("Departure")],
            count: 2,
        });

        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert!(!seen.is_busy());
        assert_eq!(seen.count(), 2);
        assert!(!rx.has_changed().unwrap());
    }
}
