//! The kiosk state machine: selection, view transitions, language switch.
//!
//! All state lives in [`KioskController`]; input arrives as typed
//! [`Command`]s and time-driven progress happens in [`KioskController::tick`],
//! which the UI loop calls every poll interval. The only background work is
//! the submit-and-precompute task spawned per transition, which reports back
//! through a oneshot channel.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::{Duration, Instant};

use crate::backend::{BackendError, ResultCloud, VoteBackend};
use crate::selection::SelectionSet;

/// Which screen the kiosk is on. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Grid is interactive, visitor is picking items
    Selecting,
    /// Submit accepted: launch animation plays while the vote is recorded
    /// and clouds are precomputed
    Transitioning,
    /// Word cloud on screen, auto-return timer running
    ResultShown,
}

/// Typed input commands consumed one at a time by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ToggleItem(String),
    ToggleSlot(usize),
    Submit,
    Return,
    SetLanguage(String),
}

/// In-flight `Selecting -> Transitioning` work.
struct Transition {
    started: Instant,
    outcome_rx: oneshot::Receiver<Result<(), BackendError>>,
    outcome: Option<Result<(), BackendError>>,
}

pub struct KioskController<B> {
    backend: Arc<B>,

    pub selection: SelectionSet,
    view: ViewState,

    language: String,
    languages: Vec<String>,
    translations: HashMap<String, String>,

    launch_duration: Duration,
    idle_timeout: Duration,

    transition: Option<Transition>,
    shown_since: Option<Instant>,

    // Fetched clouds for this transition, keyed by language
    clouds: HashMap<String, ResultCloud>,
    displayed_language: Option<String>,

    last_error: Option<String>,
}

impl<B: VoteBackend> KioskController<B> {
    pub fn new(
        backend: Arc<B>,
        language: String,
        languages: Vec<String>,
        launch_duration: Duration,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            selection: SelectionSet::new(),
            view: ViewState::Selecting,
            language,
            languages,
            translations: HashMap::new(),
            launch_duration,
            idle_timeout,
            transition: None,
            shown_since: None,
            clouds: HashMap::new(),
            displayed_language: None,
            last_error: None,
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Display text for a key, falling back to the key itself when the
    /// catalog has no entry (or was never loaded).
    pub fn text<'a>(&'a self, key: &'a str) -> &'a str {
        self.translations.get(key).map(String::as_str).unwrap_or(key)
    }

    /// The cloud currently on screen, if any.
    pub fn cloud(&self) -> Option<&ResultCloud> {
        self.displayed_language
            .as_deref()
            .and_then(|lang| self.clouds.get(lang))
    }

    /// Seconds until the result screen auto-returns, while it is shown.
    pub fn idle_remaining_secs(&self) -> Option<u64> {
        let since = self.shown_since?;
        Some(
            self.idle_timeout
                .saturating_sub(since.elapsed())
                .as_secs(),
        )
    }

    /// Launch animation progress in [0, 1] while transitioning.
    pub fn launch_progress(&self) -> Option<f64> {
        let transition = self.transition.as_ref()?;
        if self.launch_duration.is_zero() {
            return Some(1.0);
        }
        let ratio =
            transition.started.elapsed().as_secs_f64() / self.launch_duration.as_secs_f64();
        Some(ratio.min(1.0))
    }

    /// Take the latest error notice for display, clearing it.
    pub fn take_error(&mut self) -> Option<String> {
        self.last_error.take()
    }

    /// Load the translation catalog for the current language. Failure keeps
    /// whatever catalog was last applied.
    pub async fn load_translations(&mut self) {
        match self.backend.translations(&self.language).await {
            Ok(catalog) => self.translations = catalog,
            Err(e) => tracing::warn!("translations for '{}' unavailable: {}", self.language, e),
        }
    }

    pub async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::ToggleItem(key) => {
                if self.view == ViewState::Selecting {
                    self.selection.toggle_item(&key);
                }
            }
            Command::ToggleSlot(slot) => {
                if self.view == ViewState::Selecting {
                    self.selection.toggle_slot(slot);
                }
            }
            Command::Submit => {
                // Re-entrant submits while transitioning are no-ops
                if self.view == ViewState::Selecting && self.selection.is_full() {
                    self.begin_transition();
                }
            }
            Command::Return => {
                if self.view == ViewState::ResultShown {
                    self.return_to_selecting();
                }
            }
            Command::SetLanguage(lang) => self.set_language(lang).await,
        }
    }

    /// Advance timers and poll in-flight work. Called from the UI loop.
    pub async fn tick(&mut self) {
        match self.view {
            ViewState::Selecting => {}
            ViewState::Transitioning => self.poll_transition().await,
            ViewState::ResultShown => {
                if let Some(since) = self.shown_since {
                    if since.elapsed() >= self.idle_timeout {
                        tracing::info!("idle timeout, returning to selection");
                        self.return_to_selecting();
                    }
                }
            }
        }
    }

    fn begin_transition(&mut self) {
        let Some(keys) = self.selection.keys() else {
            return;
        };

        let backend = Arc::clone(&self.backend);
        let languages = self.languages.clone();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let result: Result<(), BackendError> = async {
                backend.submit_vote(&keys).await?;
                // Precompute every language up front so a later language
                // switch on the result screen is pure retrieval
                for lang in &languages {
                    backend.precompute_result(&keys, lang).await?;
                }
                Ok(())
            }
            .await;
            let _ = tx.send(result);
        });

        self.clouds.clear();
        self.displayed_language = None;
        self.transition = Some(Transition {
            started: Instant::now(),
            outcome_rx: rx,
            outcome: None,
        });
        self.view = ViewState::Transitioning;
    }

    async fn poll_transition(&mut self) {
        let launch_duration = self.launch_duration;
        let (failure, ready) = match self.transition.as_mut() {
            None => {
                // Should not happen; recover to an interactive state
                self.view = ViewState::Selecting;
                return;
            }
            Some(transition) => {
                if transition.outcome.is_none() {
                    match transition.outcome_rx.try_recv() {
                        Ok(result) => transition.outcome = Some(result),
                        Err(oneshot::error::TryRecvError::Empty) => {}
                        Err(oneshot::error::TryRecvError::Closed) => {
                            transition.outcome =
                                Some(Err(BackendError::Network("vote task vanished".into())));
                        }
                    }
                }

                let animation_done = transition.started.elapsed() >= launch_duration;
                match &transition.outcome {
                    Some(Err(e)) => (Some(e.to_string()), false),
                    Some(Ok(())) => (None, animation_done),
                    // Still waiting on the network (and maybe the animation)
                    None => (None, false),
                }
            }
        };

        if let Some(notice) = failure {
            self.abort_transition(notice);
        } else if ready {
            self.show_result().await;
        }
    }

    /// Both gates passed: commit (best-effort), fetch the cloud, flip screens.
    async fn show_result(&mut self) {
        self.transition = None;

        if let Err(e) = self.backend.commit_result().await {
            tracing::warn!("commit failed, showing result anyway: {}", e);
        }

        match self.backend.fetch_result_asset(&self.language).await {
            Ok(cloud) => {
                self.clouds.insert(self.language.clone(), cloud);
                self.displayed_language = Some(self.language.clone());
                self.view = ViewState::ResultShown;
                self.shown_since = Some(Instant::now());
            }
            Err(e) => {
                let notice = e.to_string();
                self.abort_transition(notice);
            }
        }
    }

    /// Abort a transition: back to selecting with selections intact.
    fn abort_transition(&mut self, notice: String) {
        tracing::warn!("transition aborted: {}", notice);
        self.transition = None;
        self.view = ViewState::Selecting;
        self.last_error = Some(notice);
    }

    /// Leave the result screen: clear the selection and the pending
    /// auto-return timer so nothing fires late.
    fn return_to_selecting(&mut self) {
        self.shown_since = None;
        self.selection.reset();
        self.view = ViewState::Selecting;
    }

    async fn set_language(&mut self, lang: String) {
        if lang == self.language {
            return;
        }

        self.language = lang;
        self.load_translations().await;

        // On the result screen, re-point the displayed cloud. All languages
        // were precomputed at transition entry, so this is retrieval only.
        if self.view == ViewState::ResultShown {
            if !self.clouds.contains_key(&self.language) {
                match self.backend.fetch_result_asset(&self.language).await {
                    Ok(cloud) => {
                        self.clouds.insert(self.language.clone(), cloud);
                    }
                    Err(e) => {
                        // Keep the previous cloud on screen
                        self.last_error = Some(e.to_string());
                        return;
                    }
                }
            }
            self.displayed_language = Some(self.language.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeBackend {
        votes: AtomicUsize,
        precomputes: AtomicUsize,
        commits: AtomicUsize,
        fetches: AtomicUsize,
        fail_precompute: AtomicBool,
        fail_fetch: AtomicBool,
        precompute_delay: Option<Duration>,
    }

    #[async_trait]
    impl VoteBackend for FakeBackend {
        async fn submit_vote(&self, _keys: &[String; 3]) -> Result<(), BackendError> {
            self.votes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn precompute_result(
            &self,
            _keys: &[String; 3],
            language: &str,
        ) -> Result<(), BackendError> {
            if let Some(delay) = self.precompute_delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_precompute.load(Ordering::SeqCst) {
                return Err(BackendError::Network("generator down".into()));
            }
            self.precomputes.fetch_add(1, Ordering::SeqCst);
            let _ = language;
            Ok(())
        }

        async fn commit_result(&self) -> Result<(), BackendError> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn fetch_result_asset(&self, language: &str) -> Result<ResultCloud, BackendError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_fetch.load(Ordering::SeqCst) {
                return Err(BackendError::AssetLoad("no such cloud".into()));
            }
            Ok(ResultCloud {
                language: language.to_string(),
                words: vec![],
            })
        }

        async fn translations(
            &self,
            _language: &str,
        ) -> Result<HashMap<String, String>, BackendError> {
            Ok(HashMap::new())
        }
    }

    fn controller(
        backend: Arc<FakeBackend>,
        launch: Duration,
        idle: Duration,
    ) -> KioskController<FakeBackend> {
        KioskController::new(
            backend,
            "en".to_string(),
            vec!["en".to_string(), "de".to_string()],
            launch,
            idle,
        )
    }

    async fn select_three(ctl: &mut KioskController<FakeBackend>) {
        for key in ["a", "b", "c"] {
            ctl.handle_command(Command::ToggleItem(key.to_string())).await;
        }
        assert!(ctl.selection.is_full());
    }

    #[tokio::test(start_paused = true)]
    async fn result_waits_for_animation_even_when_network_is_fast() {
        let backend = Arc::new(FakeBackend::default());
        let mut ctl = controller(backend.clone(), Duration::from_secs(3), Duration::from_secs(60));

        select_three(&mut ctl).await;
        ctl.handle_command(Command::Submit).await;
        assert_eq!(ctl.view(), ViewState::Transitioning);

        // Let the spawned task finish; network is done, animation is not
        tokio::task::yield_now().await;
        ctl.tick().await;
        assert_eq!(ctl.view(), ViewState::Transitioning);

        tokio::time::advance(Duration::from_secs(3)).await;
        ctl.tick().await;
        assert_eq!(ctl.view(), ViewState::ResultShown);
        assert_eq!(backend.votes.load(Ordering::SeqCst), 1);
        assert_eq!(backend.precomputes.load(Ordering::SeqCst), 2); // en + de
        assert_eq!(backend.commits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn result_waits_for_network_even_when_animation_is_done() {
        let backend = Arc::new(FakeBackend {
            precompute_delay: Some(Duration::from_secs(10)),
            ..Default::default()
        });
        let mut ctl = controller(backend.clone(), Duration::ZERO, Duration::from_secs(60));

        select_three(&mut ctl).await;
        ctl.handle_command(Command::Submit).await;
        tokio::task::yield_now().await;

        // Animation duration is zero but the precompute is still in flight
        ctl.tick().await;
        assert_eq!(ctl.view(), ViewState::Transitioning);

        // Two languages, two sequential delayed precomputes
        for _ in 0..2 {
            tokio::time::advance(Duration::from_secs(10)).await;
            tokio::task::yield_now().await;
        }
        ctl.tick().await;
        assert_eq!(ctl.view(), ViewState::ResultShown);
    }

    #[tokio::test(start_paused = true)]
    async fn second_submit_while_transitioning_is_a_no_op() {
        let backend = Arc::new(FakeBackend::default());
        let mut ctl = controller(backend.clone(), Duration::from_secs(3), Duration::from_secs(60));

        select_three(&mut ctl).await;
        ctl.handle_command(Command::Submit).await;
        ctl.handle_command(Command::Submit).await;
        tokio::task::yield_now().await;

        assert_eq!(backend.votes.load(Ordering::SeqCst), 1);

        // Toggles are also ignored mid-transition
        ctl.handle_command(Command::ToggleItem("a".to_string())).await;
        assert!(ctl.selection.is_full());
    }

    #[tokio::test(start_paused = true)]
    async fn precompute_failure_restores_selecting_with_picks_intact() {
        let backend = Arc::new(FakeBackend::default());
        backend.fail_precompute.store(true, Ordering::SeqCst);
        let mut ctl = controller(backend.clone(), Duration::from_secs(3), Duration::from_secs(60));

        select_three(&mut ctl).await;
        ctl.handle_command(Command::Submit).await;
        tokio::task::yield_now().await;
        ctl.tick().await;

        assert_eq!(ctl.view(), ViewState::Selecting);
        assert!(ctl.selection.is_full());
        assert!(ctl.take_error().is_some());

        // Submit works again after the fault clears
        backend.fail_precompute.store(false, Ordering::SeqCst);
        ctl.handle_command(Command::Submit).await;
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_secs(3)).await;
        ctl.tick().await;
        assert_eq!(ctl.view(), ViewState::ResultShown);
    }

    #[tokio::test(start_paused = true)]
    async fn asset_fetch_failure_aborts_like_any_other_transition_failure() {
        let backend = Arc::new(FakeBackend::default());
        backend.fail_fetch.store(true, Ordering::SeqCst);
        let mut ctl = controller(backend.clone(), Duration::ZERO, Duration::from_secs(60));

        select_three(&mut ctl).await;
        ctl.handle_command(Command::Submit).await;
        tokio::task::yield_now().await;
        ctl.tick().await;

        assert_eq!(ctl.view(), ViewState::Selecting);
        assert!(ctl.selection.is_full());
        assert!(ctl.take_error().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_timeout_auto_returns_and_clears_selection() {
        let backend = Arc::new(FakeBackend::default());
        let mut ctl = controller(backend, Duration::ZERO, Duration::from_secs(30));

        select_three(&mut ctl).await;
        ctl.handle_command(Command::Submit).await;
        tokio::task::yield_now().await;
        ctl.tick().await;
        assert_eq!(ctl.view(), ViewState::ResultShown);

        tokio::time::advance(Duration::from_secs(30)).await;
        ctl.tick().await;
        assert_eq!(ctl.view(), ViewState::Selecting);
        assert!(ctl.selection.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_return_cancels_the_auto_return_timer() {
        let backend = Arc::new(FakeBackend::default());
        let mut ctl = controller(backend, Duration::ZERO, Duration::from_secs(30));

        select_three(&mut ctl).await;
        ctl.handle_command(Command::Submit).await;
        tokio::task::yield_now().await;
        ctl.tick().await;
        assert_eq!(ctl.view(), ViewState::ResultShown);

        ctl.handle_command(Command::Return).await;
        assert_eq!(ctl.view(), ViewState::Selecting);
        assert!(ctl.selection.is_empty());

        // A pick made after the manual return must survive the old deadline
        ctl.handle_command(Command::ToggleItem("x".to_string())).await;
        tokio::time::advance(Duration::from_secs(60)).await;
        ctl.tick().await;
        assert_eq!(ctl.view(), ViewState::Selecting);
        assert_eq!(ctl.selection.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn language_switch_on_result_repoints_without_recompute() {
        let backend = Arc::new(FakeBackend::default());
        let mut ctl = controller(backend.clone(), Duration::ZERO, Duration::from_secs(60));

        select_three(&mut ctl).await;
        ctl.handle_command(Command::Submit).await;
        tokio::task::yield_now().await;
        ctl.tick().await;
        assert_eq!(ctl.view(), ViewState::ResultShown);
        let precomputes_before = backend.precomputes.load(Ordering::SeqCst);

        ctl.handle_command(Command::SetLanguage("de".to_string())).await;
        assert_eq!(ctl.view(), ViewState::ResultShown);
        assert_eq!(ctl.cloud().map(|c| c.language.as_str()), Some("de"));
        // Retrieval only, no extra generation
        assert_eq!(backend.precomputes.load(Ordering::SeqCst), precomputes_before);
    }

    #[tokio::test(start_paused = true)]
    async fn language_switch_never_touches_selection_or_view() {
        let backend = Arc::new(FakeBackend::default());
        let mut ctl = controller(backend, Duration::ZERO, Duration::from_secs(60));

        ctl.handle_command(Command::ToggleItem("a".to_string())).await;
        ctl.handle_command(Command::SetLanguage("de".to_string())).await;

        assert_eq!(ctl.view(), ViewState::Selecting);
        assert_eq!(ctl.selection.len(), 1);
        assert_eq!(ctl.language(), "de");
    }
}
