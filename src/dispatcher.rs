use crate::download::{FileSaver, CSV_FILE_NAME};
use crate::error::{ExtractorError, Result};
use crate::guard::{FileSelection, GuardOutcome, InputGuard};
use crate::model::{ExtractionEvent, ExtractionResponse, OperationKind, OperationRequest};
use crate::service::{ExtractionService, ServiceResponse};
use crate::state::{Completion, InFlight, ResultState};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;

#[derive(Debug)]
pub enum DispatchOutcome {
    /// Another operation was in flight; nothing changed.
    Ignored,
    /// No file selected; the error message was set, no request was sent.
    Rejected,
    /// Events replaced with a fresh result.
    Loaded { count: u64 },
    /// Binary response saved client-side.
    Saved { path: PathBuf },
    /// Server or transport failure; the error message was set.
    Failed(ExtractorError),
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            DispatchOutcome::Loaded { .. } | DispatchOutcome::Saved { .. }
        )
    }
}

/// A success body, classified by the operation that asked for it.
#[derive(Debug)]
enum Classified {
    Events {
        events: Vec<ExtractionEvent>,
        count: u64,
    },
    Blob(Vec<u8>),
}

enum Settled {
    Loaded {
        events: Vec<ExtractionEvent>,
        count: u64,
    },
    Saved(PathBuf),
}

fn classify(kind: OperationKind, response: ServiceResponse) -> Result<Classified> {
    if !response.is_success() {
        return Err(ExtractorError::Server {
            status: response.status,
        });
    }

    match kind {
        OperationKind::ExtractCsv => Ok(Classified::Blob(response.body)),
        OperationKind::ExtractEvents => {
            let parsed: ExtractionResponse = serde_json::from_slice(&response.body)?;
            let (events, count) = parsed.into_parts();
            Ok(Classified::Events { events, count })
        }
    }
}

pub struct Dispatcher<S, F> {
    service: S,
    saver: F,
    guard: InputGuard,
    selection: Mutex<FileSelection>,
    state: watch::Sender<ResultState>,
}

impl<S: ExtractionService, F: FileSaver> Dispatcher<S, F> {
    pub fn new(service: S, saver: F, guard: InputGuard) -> Self {
        let (state, _) = watch::channel(ResultState::new());
        Self {
            service,
            saver,
            guard,
            selection: Mutex::new(FileSelection::empty()),
            state,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Receiver that sees every published state change.
    pub fn subscribe(&self) -> watch::Receiver<ResultState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ResultState {
        self.state.borrow().clone()
    }

    fn selection_guard(&self) -> MutexGuard<'_, FileSelection> {
        self.selection.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn select_file<P: Into<PathBuf>>(&self, path: P) {
        self.selection_guard().select(path);
    }

    pub fn clear_selection(&self) {
        self.selection_guard().clear();
    }

    pub fn selection(&self) -> FileSelection {
        self.selection_guard().clone()
    }

    pub async fn dispatch(&self, kind: OperationKind) -> DispatchOutcome {
        if self.state.borrow().is_busy() {
            log::debug!("{} ignored: an operation is already in flight", kind);
            return DispatchOutcome::Ignored;
        }

        let file = match self.guard.check(&self.selection()) {
            GuardOutcome::Ready(file) => file,
            GuardOutcome::Rejected(reason) => {
                // Another dispatch may have gone busy since the check above.
                if !self.state.send_if_modified(|s| s.reject(reason)) {
                    return DispatchOutcome::Ignored;
                }
                log::warn!("{} rejected: {}", kind, reason);
                return DispatchOutcome::Rejected;
            }
        };

        if !self.guard.is_advisory_match(&file) {
            log::warn!(
                "{} does not look like a PDF or DOCX, sending it anyway",
                file.file_name()
            );
        }

        let Some(in_flight) = InFlight::begin(&self.state) else {
            return DispatchOutcome::Ignored;
        };

        let request = OperationRequest { kind, file };
        match self.execute(&request).await {
            Ok(Settled::Loaded { events, count }) => {
                log::info!("{} returned {} rows", kind, count);
                in_flight.complete(Completion::Loaded { events, count });
                DispatchOutcome::Loaded { count }
            }
            Ok(Settled::Saved(path)) => {
                in_flight.complete(Completion::Saved);
                DispatchOutcome::Saved { path }
            }
            Err(error) => {
                log::error!("{} failed: {}", kind, error);
                in_flight.complete(Completion::Failed(error.to_string()));
                DispatchOutcome::Failed(error)
            }
        }
    }

    /// Everything between the suspension point and the state publish.
    async fn execute(&self, request: &OperationRequest) -> Result<Settled> {
        let response = self.service.submit(request).await?;
        match classify(request.kind, response)? {
            Classified::Events { events, count } => Ok(Settled::Loaded { events, count }),
            Classified::Blob(bytes) => {
                let path = self.saver.save(CSV_FILE_NAME, &bytes)?;
                Ok(Settled::Saved(path))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NO_FILE_SELECTED;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    const TWO_EVENTS: &str = r#"{"count": 2, "events": [
        {"event": "Arrival", "start": "2024-01-01", "end": "2024-01-02", "source": "p.3"},
        {"event": "Departure", "source": "p.5"}
    ]}"#;

    /// Answers from a queue and counts calls.
    #[derive(Default)]
    struct ScriptedService {
        responses: Mutex<VecDeque<Result<ServiceResponse>>>,
        calls: AtomicUsize,
    }

    impl ScriptedService {
        fn with(responses: Vec<Result<ServiceResponse>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ExtractionService for ScriptedService {
        async fn submit(&self, _request: &OperationRequest) -> Result<ServiceResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected request")
        }
    }

    /// Holds the request open until the test releases it.
    struct GatedService {
        calls: AtomicUsize,
        started: Notify,
        release: Notify,
        response: ServiceResponse,
    }

    #[async_trait]
    impl ExtractionService for GatedService {
        async fn submit(&self, _request: &OperationRequest) -> Result<ServiceResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            self.release.notified().await;
            Ok(self.response.clone())
        }
    }

    #[derive(Default)]
    struct RecordingSaver {
        saved: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl FileSaver for RecordingSaver {
        fn save(&self, file_name: &str, contents: &[u8]) -> Result<PathBuf> {
            self.saved
                .lock()
                .unwrap()
                .push((file_name.to_string(), contents.to_vec()));
            Ok(PathBuf::from("/downloads").join(file_name))
        }
    }

    struct ReadOnlySaver;

    impl FileSaver for ReadOnlySaver {
        fn save(&self, file_name: &str, _contents: &[u8]) -> Result<PathBuf> {
            Err(ExtractorError::Save {
                path: format!("/downloads/{}", file_name),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
    }

    fn dispatcher(
        responses: Vec<Result<ServiceResponse>>,
    ) -> Dispatcher<ScriptedService, RecordingSaver> {
        Dispatcher::new(
            ScriptedService::with(responses),
            RecordingSaver::default(),
            InputGuard::default(),
        )
    }

    fn ok_json(body: &str) -> Result<ServiceResponse> {
        Ok(ServiceResponse::new(200, body.as_bytes().to_vec()))
    }

    #[tokio::test]
    async fn test_events_loaded() {
        let d = dispatcher(vec![ok_json(TWO_EVENTS)]);
        d.select_file("sof.pdf");

        let outcome = d.dispatch(OperationKind::ExtractEvents).await;

        assert!(matches!(outcome, DispatchOutcome::Loaded { count: 2 }));
        let state = d.snapshot();
        assert_eq!(state.count(), 2);
        assert_eq!(state.events().len(), 2);
        assert_eq!(state.events()[0].event, "Arrival");
        assert_eq!(state.events()[1].start, None);
        assert_eq!(state.error_message(), None);
        assert!(!state.is_busy());
    }

    #[tokio::test]
    async fn test_server_error_keeps_rows() {
        let d = dispatcher(vec![
            ok_json(TWO_EVENTS),
            Ok(ServiceResponse::new(500, Vec::new())),
        ]);
        d.select_file("sof.pdf");
        d.dispatch(OperationKind::ExtractEvents).await;

        let outcome = d.dispatch(OperationKind::ExtractEvents).await;

        assert!(matches!(
            outcome,
            DispatchOutcome::Failed(ExtractorError::Server { status: 500 })
        ));
        let state = d.snapshot();
        assert!(state.error_message().unwrap().contains("500"));
        assert_eq!(state.count(), 2);
        assert_eq!(state.events().len(), 2);
        assert!(!state.is_busy());
    }

    #[tokio::test]
    async fn test_csv_saved_state_untouched() {
        let d = dispatcher(vec![
            ok_json(TWO_EVENTS),
            Ok(ServiceResponse::new(200, b"event,start,end,source\n".to_vec())),
        ]);
        d.select_file("sof.docx");
        d.dispatch(OperationKind::ExtractEvents).await;
        let before = d.snapshot();

        let outcome = d.dispatch(OperationKind::ExtractCsv).await;

        match outcome {
            DispatchOutcome::Saved { path } => assert!(path.ends_with("events.csv")),
            other => panic!("expected Saved, got {:?}", other),
        }
        let saved = d.saver.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, "events.csv");
        assert_eq!(saved[0].1, b"event,start,end,source\n");
        assert_eq!(d.snapshot(), before);
    }

    #[tokio::test]
    async fn test_no_file_no_request() {
        let d = dispatcher(Vec::new());
        let mut rx = d.subscribe();

        let outcome = d.dispatch(OperationKind::ExtractEvents).await;

        assert!(matches!(outcome, DispatchOutcome::Rejected));
        assert_eq!(d.service().calls(), 0);
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.error_message(), Some("Choose a PDF or DOCX first."));
        assert!(!state.is_busy());

        assert!(matches!(
            d.dispatch(OperationKind::ExtractCsv).await,
            DispatchOutcome::Rejected
        ));
        assert_eq!(d.service().calls(), 0);
        assert!(d.saver.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_count_derivation() {
        let three = r#"[
            {"event": "Arrival", "source": "a"},
            {"event": "Loading", "source": "b"},
            {"event": "Departure", "source": "c"}
        ]"#;
        let d = dispatcher(vec![
            ok_json(&format!(r#"{{"count": 5, "events": {}}}"#, three)),
            ok_json(&format!(r#"{{"events": {}}}"#, three)),
            ok_json("{}"),
        ]);
        d.select_file("sof.pdf");

        d.dispatch(OperationKind::ExtractEvents).await;
        assert_eq!(d.snapshot().count(), 5);
        assert_eq!(d.snapshot().events().len(), 3);

        d.dispatch(OperationKind::ExtractEvents).await;
        assert_eq!(d.snapshot().count(), 3);

        d.dispatch(OperationKind::ExtractEvents).await;
        assert_eq!(d.snapshot().count(), 0);
        assert!(d.snapshot().events().is_empty());
    }

    #[tokio::test]
    async fn test_success_clears_previous_error() {
        let d = dispatcher(vec![ok_json(TWO_EVENTS)]);
        d.dispatch(OperationKind::ExtractEvents).await;
        assert!(d.snapshot().error_message().is_some());

        d.select_file("sof.pdf");
        d.dispatch(OperationKind::ExtractEvents).await;

        let state = d.snapshot();
        assert_eq!(state.error_message(), None);
        assert_eq!(state.count(), 2);
    }

    #[tokio::test]
    async fn test_transport_error_sets_message_only() {
        let d = dispatcher(vec![
            ok_json(TWO_EVENTS),
            Err(ExtractorError::transport("connection refused")),
        ]);
        d.select_file("sof.pdf");
        d.dispatch(OperationKind::ExtractEvents).await;

        let outcome = d.dispatch(OperationKind::ExtractEvents).await;

        assert!(matches!(
            outcome,
            DispatchOutcome::Failed(ExtractorError::Transport { .. })
        ));
        let state = d.snapshot();
        assert_eq!(state.error_message(), Some("connection refused"));
        assert_eq!(state.count(), 2);
        assert!(!state.is_busy());
    }

    #[tokio::test]
    async fn test_malformed_json_is_not_partially_applied() {
        let d = dispatcher(vec![
            ok_json(TWO_EVENTS),
            ok_json(r#"{"count": 7, "events": [{"event": "Arrival""#),
        ]);
        d.select_file("sof.pdf");
        d.dispatch(OperationKind::ExtractEvents).await;

        let outcome = d.dispatch(OperationKind::ExtractEvents).await;

        assert!(!outcome.is_success());
        let state = d.snapshot();
        assert!(state.error_message().unwrap().starts_with("malformed response"));
        assert_eq!(state.count(), 2);
        assert_eq!(state.events().len(), 2);
    }

    #[tokio::test]
    async fn test_csv_server_error_saves_nothing() {
        let d = dispatcher(vec![Ok(ServiceResponse::new(404, Vec::new()))]);
        d.select_file("sof.pdf");

        let outcome = d.dispatch(OperationKind::ExtractCsv).await;

        assert!(matches!(outcome, DispatchOutcome::Failed(_)));
        assert!(d.saver.saved.lock().unwrap().is_empty());
        assert_eq!(d.snapshot().error_message(), Some("Server 404"));
    }

    #[tokio::test]
    async fn test_error_and_rows_exclusive_per_call() {
        let d = dispatcher(vec![
            ok_json(TWO_EVENTS),
            Ok(ServiceResponse::new(502, Vec::new())),
            ok_json(r#"{"events": [{"event": "Bunkering", "source": "x"}]}"#),
        ]);
        d.select_file("sof.pdf");

        for _ in 0..3 {
            let before = d.snapshot();
            let outcome = d.dispatch(OperationKind::ExtractEvents).await;
            let after = d.snapshot();
            match outcome {
                DispatchOutcome::Loaded { .. } => assert_eq!(after.error_message(), None),
                DispatchOutcome::Failed(_) => {
                    assert!(after.error_message().is_some());
                    assert_eq!(after.events(), before.events());
                }
                other => panic!("unexpected outcome {:?}", other),
            }
        }
        assert_eq!(d.snapshot().count(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_while_busy_is_ignored() {
        let d = Dispatcher::new(
            GatedService {
                calls: AtomicUsize::new(0),
                started: Notify::new(),
                release: Notify::new(),
                response: ServiceResponse::new(200, TWO_EVENTS.as_bytes().to_vec()),
            },
            RecordingSaver::default(),
            InputGuard::default(),
        );
        d.select_file("sof.pdf");

        let first = d.dispatch(OperationKind::ExtractEvents);
        let second = async {
            d.service().started.notified().await;
            let during = d.snapshot();
            assert!(during.is_busy());

            let ignored = d.dispatch(OperationKind::ExtractCsv).await;
            assert!(matches!(ignored, DispatchOutcome::Ignored));
            assert_eq!(d.snapshot(), during);
            assert_eq!(d.service().calls.load(Ordering::SeqCst), 1);

            d.clear_selection();
            let still_ignored = d.dispatch(OperationKind::ExtractEvents).await;
            assert!(matches!(still_ignored, DispatchOutcome::Ignored));
            assert_eq!(d.snapshot(), during);

            d.service().release.notify_one();
        };

        let (outcome, ()) = tokio::join!(first, second);

        assert!(matches!(outcome, DispatchOutcome::Loaded { count: 2 }));
        assert_eq!(d.service().calls.load(Ordering::SeqCst), 1);
        assert!(d.saver.saved.lock().unwrap().is_empty());
        assert!(!d.snapshot().is_busy());
    }

    #[tokio::test]
    async fn test_dropped_dispatch_releases_busy() {
        let d = Dispatcher::new(
            GatedService {
                calls: AtomicUsize::new(0),
                started: Notify::new(),
                release: Notify::new(),
                response: ServiceResponse::new(200, b"{}".to_vec()),
            },
            RecordingSaver::default(),
            InputGuard::default(),
        );
        d.select_file("sof.pdf");

        {
            let pending = d.dispatch(OperationKind::ExtractEvents);
            tokio::pin!(pending);
            tokio::select! {
                _ = &mut pending => panic!("gated request should not finish"),
                _ = d.service().started.notified() => {}
            }
            assert!(d.snapshot().is_busy());
        }

        assert!(!d.snapshot().is_busy());
    }

    #[tokio::test]
    async fn test_csv_save_failure_sets_error_and_keeps_rows() {
        let d = Dispatcher::new(
            ScriptedService::with(vec![
                ok_json(TWO_EVENTS),
                Ok(ServiceResponse::new(200, b"event,start\n".to_vec())),
            ]),
            ReadOnlySaver,
            InputGuard::default(),
        );
        d.select_file("sof.pdf");
        d.dispatch(OperationKind::ExtractEvents).await;

        let outcome = d.dispatch(OperationKind::ExtractCsv).await;

        assert!(matches!(
            outcome,
            DispatchOutcome::Failed(ExtractorError::Save { .. })
        ));
        let state = d.snapshot();
        assert!(state.error_message().unwrap().contains("/downloads/events.csv"));
        assert_eq!(state.count(), 2);
        assert_eq!(state.events().len(), 2);
        assert!(!state.is_busy());
    }

    #[tokio::test]
    async fn test_rejection_never_lands_on_a_busy_state() {
        let d = dispatcher(Vec::new());
        let held = InFlight::begin(&d.state).unwrap();

        // Stale idle read followed by a rejection: the write must be refused.
        assert!(!d.state.send_if_modified(|s| s.reject(NO_FILE_SELECTED)));
        assert_eq!(d.snapshot().error_message(), None);
        assert!(d.snapshot().is_busy());

        assert!(matches!(
            d.dispatch(OperationKind::ExtractEvents).await,
            DispatchOutcome::Ignored
        ));
        drop(held);
        assert!(!d.snapshot().is_busy());
    }

    #[test]
    fn test_classify_csv_keeps_body_opaque() {
        let body = vec![0xde, 0xad, 0xbe, 0xef];
        let classified = classify(
            OperationKind::ExtractCsv,
            ServiceResponse::new(200, body.clone()),
        )
        .unwrap();
        assert!(matches!(classified, Classified::Blob(b) if b == body));
    }
}
