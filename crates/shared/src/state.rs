use std::time::Instant;

use crate::extraction::{ExtractionError, StoryExtractor};
use crate::models::{ExtractedStory, ProcessingStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Input,
    Results,
}

/// Handed out by `AppState::begin_submit` and given back to
/// `AppState::complete`. Not `Clone`, so a request completes at most once.
#[derive(Debug)]
pub struct PendingRequest {
    text: String,
    started: Instant,
}

impl PendingRequest {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Top-level application state. Fields are private; every change goes
/// through `begin_submit`/`complete`, `back` or `dismiss_error`.
#[derive(Debug, Default)]
pub struct AppState {
    view: View,
    input_text: String,
    stories: Vec<ExtractedStory>,
    is_loading: bool,
    error: Option<String>,
    stats: Option<ProcessingStats>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn stories(&self) -> &[ExtractedStory] {
        &self.stories
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn stats(&self) -> Option<ProcessingStats> {
        self.stats
    }

    /// Whether `text` would be accepted by `begin_submit` right now.
    pub fn can_submit(&self, text: &str) -> bool {
        self.view == View::Input && !self.is_loading && !text.trim().is_empty()
    }

    /// Start a submission. Returns `None` (and changes nothing) for blank
    /// text, while a request is in flight, or outside the input view.
    pub fn begin_submit(&mut self, text: &str) -> Option<PendingRequest> {
        if !self.can_submit(text) {
            tracing::debug!(
                loading = self.is_loading,
                view = ?self.view,
                "submission refused"
            );
            return None;
        }

        self.input_text = text.to_string();
        self.error = None;
        self.is_loading = true;
        tracing::debug!(chars = text.len(), "submission started");

        Some(PendingRequest {
            text: text.to_string(),
            started: Instant::now(),
        })
    }

    /// Apply the outcome of the extraction started by `request`. Ignored
    /// unless a request is loading.
    pub fn complete(
        &mut self,
        request: PendingRequest,
        outcome: Result<Vec<ExtractedStory>, ExtractionError>,
    ) {
        if !self.is_loading {
            tracing::warn!(
                chars = request.text.len(),
                "ignoring completion with no request loading"
            );
            return;
        }
        self.is_loading = false;

        match outcome {
            Ok(stories) => {
                let elapsed = request.started.elapsed().as_millis() as u64;
                self.stats = Some(ProcessingStats::new(&request.text, &stories, elapsed));
                self.stories = stories;
                self.view = View::Results;
                tracing::debug!(count = self.stories.len(), "switched to results view");
            }
            Err(e) => {
                tracing::warn!(error = %e, "extraction failed");
                self.error = Some(e.to_string());
                self.view = View::Input;
            }
        }
    }

    /// Submit `text` and wait for the extractor. Returns `false` when the
    /// submission was refused and no call was made.
    pub async fn submit<E>(&mut self, text: &str, extractor: &E) -> bool
    where
        E: StoryExtractor + ?Sized,
    {
        let Some(request) = self.begin_submit(text) else {
            return false;
        };

        let outcome = extractor.extract(request.text()).await;
        self.complete(request, outcome);
        true
    }

    /// Return to the input view. Stories stay in memory until the next
    /// successful submit.
    pub fn back(&mut self) -> bool {
        if self.view != View::Results || self.is_loading {
            return false;
        }

        self.view = View::Input;
        self.error = None;
        true
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::decode_stories;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use std::collections::HashSet;
    use std::sync::Mutex;

    const TWO_STORIES: &str = r#"[
        {"title": "A", "content": "Story A text.", "summary": "s1"},
        {"title": "B", "content": "Story B text.", "summary": "s2"}
    ]"#;

    enum Reply {
        Payload(&'static str),
        Status(StatusCode),
        Empty,
    }

    struct ScriptedExtractor {
        reply: Reply,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedExtractor {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StoryExtractor for ScriptedExtractor {
        async fn extract(
            &self,
            full_text: &str,
        ) -> Result<Vec<ExtractedStory>, ExtractionError> {
            self.calls.lock().unwrap().push(full_text.to_string());
            match &self.reply {
                Reply::Payload(payload) => decode_stories(payload, 1_700_000_000_000),
                Reply::Status(status) => Err(ExtractionError::Service {
                    status: *status,
                    message: "quota exceeded".to_string(),
                }),
                Reply::Empty => Err(ExtractionError::EmptyResponse),
            }
        }
    }

    #[test]
    fn test_initial_state() {
        let state = AppState::new();
        assert_eq!(state.view(), View::Input);
        assert_eq!(state.input_text(), "");
        assert!(state.stories().is_empty());
        assert!(!state.is_loading());
        assert!(state.error().is_none());
        assert!(state.stats().is_none());
    }

    #[tokio::test]
    async fn test_submit_success_shows_results() {
        let extractor = ScriptedExtractor::new(Reply::Payload(TWO_STORIES));
        let mut state = AppState::new();
        let text = "Story A text. \n\n Story B text.";

        assert!(state.submit(text, &extractor).await);

        assert_eq!(state.view(), View::Results);
        assert!(!state.is_loading());
        assert!(state.error().is_none());
        assert_eq!(state.input_text(), text);
        assert_eq!(state.stories().len(), 2);
        assert_eq!(state.stories()[0].title, "A");
        assert_eq!(state.stories()[1].title, "B");

        let ids: HashSet<_> = state.stories().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(state.stories().iter().all(|s| !s.id.is_empty()));

        assert_eq!(extractor.calls(), vec![text.to_string()]);

        let stats = state.stats().unwrap();
        assert_eq!(stats.original_word_count, 6);
        assert_eq!(stats.extracted_count, 2);
    }

    #[tokio::test]
    async fn test_submit_empty_array_is_results_without_error() {
        let extractor = ScriptedExtractor::new(Reply::Payload("[]"));
        let mut state = AppState::new();

        assert!(state.submit("Just one paragraph.", &extractor).await);

        assert_eq!(state.view(), View::Results);
        assert!(state.stories().is_empty());
        assert!(state.error().is_none());
    }

    #[tokio::test]
    async fn test_blank_submit_is_noop() {
        let extractor = ScriptedExtractor::new(Reply::Payload(TWO_STORIES));
        let mut state = AppState::new();

        for text in ["", "   ", "\n\t \n"] {
            assert!(!state.submit(text, &extractor).await);
        }

        assert!(extractor.calls().is_empty());
        assert_eq!(state.view(), View::Input);
        assert_eq!(state.input_text(), "");
        assert!(!state.is_loading());
        assert!(state.error().is_none());
    }

    #[tokio::test]
    async fn test_failure_keeps_draft_and_sets_error() {
        let extractor = ScriptedExtractor::new(Reply::Status(StatusCode::TOO_MANY_REQUESTS));
        let mut state = AppState::new();
        let text = "A long draft the user must not lose.";

        assert!(state.submit(text, &extractor).await);

        assert_eq!(state.view(), View::Input);
        assert!(!state.is_loading());
        assert_eq!(state.input_text(), text);
        let error = state.error().unwrap();
        assert!(error.contains("quota exceeded"));
        assert!(state.stats().is_none());
    }

    #[tokio::test]
    async fn test_empty_response_is_failure() {
        let extractor = ScriptedExtractor::new(Reply::Empty);
        let mut state = AppState::new();

        state.submit("Some text", &extractor).await;

        assert_eq!(state.view(), View::Input);
        assert_eq!(state.error(), Some("No data returned from AI service"));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_failure() {
        let extractor = ScriptedExtractor::new(Reply::Payload(r#"[{"title": "A"}]"#));
        let mut state = AppState::new();

        state.submit("Some text", &extractor).await;

        assert_eq!(state.view(), View::Input);
        assert!(state.stories().is_empty());
        assert!(state.error().is_some());
    }

    #[test]
    fn test_loading_blocks_other_transitions() {
        let mut state = AppState::new();
        let request = state.begin_submit("first").unwrap();

        assert!(state.is_loading());
        assert!(state.error().is_none());
        assert!(state.begin_submit("second").is_none());
        assert!(!state.back());
        state.dismiss_error();
        assert!(state.is_loading());
        assert_eq!(state.input_text(), "first");
        assert_eq!(request.text(), "first");

        state.complete(request, Ok(Vec::new()));
        assert!(!state.is_loading());
    }

    #[test]
    fn test_begin_submit_clears_previous_error() {
        let mut state = AppState::new();
        let request = state.begin_submit("text").unwrap();
        state.complete(request, Err(ExtractionError::EmptyResponse));
        assert!(state.error().is_some());

        let request = state.begin_submit("text again").unwrap();
        assert!(state.error().is_none());
        assert!(state.is_loading());
        state.complete(request, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn test_back_returns_to_input_and_keeps_stories() {
        let extractor = ScriptedExtractor::new(Reply::Payload(TWO_STORIES));
        let mut state = AppState::new();
        state.submit("Story A text. Story B text.", &extractor).await;

        assert!(state.back());

        assert_eq!(state.view(), View::Input);
        assert!(state.error().is_none());
        assert_eq!(state.stories().len(), 2);
        assert_eq!(state.input_text(), "Story A text. Story B text.");
    }

    #[test]
    fn test_back_outside_results_is_noop() {
        let mut state = AppState::new();
        assert!(!state.back());
        assert_eq!(state.view(), View::Input);
    }

    #[tokio::test]
    async fn test_submit_refused_in_results_view() {
        let extractor = ScriptedExtractor::new(Reply::Payload(TWO_STORIES));
        let mut state = AppState::new();
        state.submit("first", &extractor).await;

        assert!(!state.submit("second", &extractor).await);
        assert_eq!(extractor.calls().len(), 1);
        assert_eq!(state.input_text(), "first");
    }

    #[tokio::test]
    async fn test_dismiss_error_changes_nothing_else() {
        let extractor = ScriptedExtractor::new(Reply::Status(StatusCode::BAD_GATEWAY));
        let mut state = AppState::new();
        state.submit("draft", &extractor).await;
        assert!(state.error().is_some());

        state.dismiss_error();

        assert!(state.error().is_none());
        assert_eq!(state.view(), View::Input);
        assert_eq!(state.input_text(), "draft");
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn test_retry_after_failure_replaces_stories() {
        let failing = ScriptedExtractor::new(Reply::Empty);
        let working = ScriptedExtractor::new(Reply::Payload(TWO_STORIES));
        let mut state = AppState::new();

        state.submit("draft", &failing).await;
        let draft = state.input_text().to_string();
        state.submit(&draft, &working).await;

        assert_eq!(state.view(), View::Results);
        assert!(state.error().is_none());
        assert_eq!(state.stories().len(), 2);
    }
    #[test]
    fn test_complete_without_loading_is_ignored() {
        let mut other = AppState::new();
        let request = other.begin_submit("from another state").unwrap();
        let mut state = AppState::new();

        let stray = ExtractedStory {
            id: "story-1-0".to_string(),
            title: "Stray".to_string(),
            content: "Should not appear.".to_string(),
            summary: "s".to_string(),
        };
        state.complete(request, Ok(vec![stray]));

        assert_eq!(state.view(), View::Input);
        assert!(state.stories().is_empty());
        assert!(state.stats().is_none());
        assert!(state.error().is_none());
        assert!(!state.is_loading());
    }

    #[test]
    fn test_second_completion_is_ignored() {
        let mut state = AppState::new();
        let request = state.begin_submit("text").unwrap();
        state.complete(request, Ok(Vec::new()));
        assert_eq!(state.view(), View::Results);

        let mut other = AppState::new();
        let stale = other.begin_submit("stale").unwrap();
        state.complete(stale, Err(ExtractionError::EmptyResponse));

        assert_eq!(state.view(), View::Results);
        assert!(state.error().is_none());
    }
}
