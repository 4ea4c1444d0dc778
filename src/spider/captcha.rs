//! Captcha interrupt/resume protocol
//!
//! When a search lands on the challenge host, the search branch is suspended
//! while one captcha episode runs:
//!
//! 1. The challenge page is parsed for its image and its form.
//! 2. The image is fetched through the `google-captcha` callback and written
//!    to a per-episode artifact file.
//! 3. An operator reads the image and types the solution.
//! 4. The artifact is removed and the form is resubmitted with the solution,
//!    which lands back on the ordinary `google` callback.
//!
//! The image handler and the suspended branch meet through `CaptchaEpisodes`,
//! keyed by episode id.

use crate::crawler::{Context, PendingRequest, Response};
use crate::spider::{GoogleSpider, GOOGLE, GOOGLE_CAPTCHA};
use crate::state::CaptchaState;
use crate::url::resolve_href;
use crate::{CaptchaError, CaptchaResult, SpiderError};
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::oneshot;
use url::Url;

/// Form field that carries the operator's solution
pub const SOLUTION_FIELD: &str = "captcha";

/// Request metadata key holding the episode id
pub const EPISODE_META: &str = "captcha-episode";

/// Outcome the image handler reports to the waiting episode
pub type Capture = Result<(), String>;

/// The resubmission form of a challenge page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeForm {
    pub action: Url,
    pub fields: Vec<(String, String)>,
}

impl ChallengeForm {
    /// Form fields with the solution filled in
    ///
    /// Every other field is kept as found, in page order.
    pub fn solved(&self, text: &str) -> Vec<(String, String)> {
        let mut fields = self.fields.clone();
        match fields.iter_mut().find(|(name, _)| name == SOLUTION_FIELD) {
            Some((_, value)) => *value = text.to_string(),
            None => fields.push((SOLUTION_FIELD.to_string(), text.to_string())),
        }
        fields
    }
}

/// What a challenge page offers: an image to solve and a form to submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengePage {
    pub image_url: Url,
    pub form: ChallengeForm,
}

/// Parses a challenge page
///
/// Both the image and the form must be present; otherwise nothing can be
/// resubmitted and the episode must not start.
pub fn parse_challenge(page_url: &Url, document: &Html) -> CaptchaResult<ChallengePage> {
    let image_url = challenge_image(page_url, document).ok_or_else(|| CaptchaError::MissingImage {
        url: page_url.to_string(),
    })?;
    let form = challenge_form(page_url, document).ok_or_else(|| CaptchaError::MissingForm {
        url: page_url.to_string(),
    })?;

    Ok(ChallengePage { image_url, form })
}

fn challenge_image(page_url: &Url, document: &Html) -> Option<Url> {
    let selector = Selector::parse("img[src]").ok()?;
    let src = document.select(&selector).next()?.value().attr("src")?;
    resolve_href(page_url, src).ok()
}

fn challenge_form(page_url: &Url, document: &Html) -> Option<ChallengeForm> {
    let form_selector = Selector::parse("form").ok()?;
    let input_selector = Selector::parse("input[name]").ok()?;

    let form = document.select(&form_selector).next()?;
    let mut action = match form.value().attr("action").map(str::trim) {
        Some(action) if !action.is_empty() => resolve_href(page_url, action).ok()?,
        _ => page_url.clone(),
    };
    // A GET submission replaces the action's own query with the form fields
    action.set_query(None);
    action.set_fragment(None);

    let fields = form
        .select(&input_selector)
        .filter_map(|input| {
            let input = input.value();
            let name = input.attr("name")?;
            let kind = input.attr("type").unwrap_or_default();
            let checkable =
                kind.eq_ignore_ascii_case("checkbox") || kind.eq_ignore_ascii_case("radio");
            if checkable && input.attr("checked").is_none() {
                return None;
            }
            Some((
                name.to_string(),
                input.attr("value").unwrap_or_default().to_string(),
            ))
        })
        .collect();

    Some(ChallengeForm { action, fields })
}

/// Location of the captcha image for one episode
pub fn artifact_path(dir: &Path, episode: u64) -> PathBuf {
    dir.join(format!("captcha-{}.jpg", episode))
}

/// One captcha episode in progress
#[derive(Debug)]
pub struct CaptchaSession {
    pub episode: u64,
    pub source: Url,
    pub challenge: ChallengePage,
    pub artifact: PathBuf,
    state: CaptchaState,
}

impl CaptchaSession {
    pub fn new(episode: u64, source: Url, challenge: ChallengePage, artifact: PathBuf) -> Self {
        Self {
            episode,
            source,
            challenge,
            artifact,
            state: CaptchaState::ChallengeDetected,
        }
    }

    pub fn state(&self) -> CaptchaState {
        self.state
    }

    /// Moves the episode to `to`, rejecting anything but the next step or failure
    pub fn advance(&mut self, to: CaptchaState) -> CaptchaResult<()> {
        if !self.state.can_transition_to(to) {
            return Err(CaptchaError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        tracing::debug!("Captcha episode {}: {} -> {}", self.episode, self.state, to);
        self.state = to;
        Ok(())
    }

    /// Marks the episode failed, unless it already ended
    pub fn fail(&mut self) {
        if self.state.is_active() {
            tracing::debug!(
                "Captcha episode {}: {} -> {}",
                self.episode,
                self.state,
                CaptchaState::Failed
            );
            self.state = CaptchaState::Failed;
        }
    }
}

/// Rendezvous between suspended episodes and the image handler
#[derive(Debug, Default)]
pub struct CaptchaEpisodes {
    last_id: AtomicU64,
    waiting: Mutex<HashMap<u64, oneshot::Sender<Capture>>>,
}

impl CaptchaEpisodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts an episode, returning its id and the receiver for its image
    pub fn open(&self) -> (u64, oneshot::Receiver<Capture>) {
        let episode = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let (sender, receiver) = oneshot::channel();
        self.waiting
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(episode, sender);
        (episode, receiver)
    }

    /// Reports the image outcome to the waiting episode
    ///
    /// Fails with `UnknownEpisode` if the episode was never opened, was already
    /// completed, or stopped waiting.
    pub fn complete(&self, episode: u64, capture: Capture) -> CaptchaResult<()> {
        let sender = self
            .waiting
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&episode)
            .ok_or(CaptchaError::UnknownEpisode { episode })?;
        sender
            .send(capture)
            .map_err(|_| CaptchaError::UnknownEpisode { episode })
    }

    /// Forgets an episode that gave up waiting
    pub fn abandon(&self, episode: u64) {
        self.waiting
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&episode);
    }

    /// Number of episodes waiting for their image
    pub fn pending(&self) -> usize {
        self.waiting
            .lock()
            .map(|waiting| waiting.len())
            .unwrap_or_default()
    }
}

fn discard_artifact(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!("Removed captcha image {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove captcha image {}: {}", path.display(), e),
    }
}

impl GoogleSpider {
    /// Runs a full captcha episode for a challenge page
    ///
    /// Returns once the solved form has been scheduled. On failure the episode
    /// is torn down and its artifact removed.
    pub(crate) async fn solve_captcha(
        &self,
        ctx: &Context,
        response: &Response,
    ) -> Result<(), SpiderError> {
        ctx.stats().record_captcha();
        tracing::warn!("Challenge page at {}", response.url());

        let challenge = {
            let document = response.html();
            parse_challenge(response.url(), &document)
        };
        let challenge = challenge.map_err(|e| {
            tracing::error!("{}", e);
            e
        })?;

        let (episode, captured) = self.episodes.open();
        let mut session = CaptchaSession::new(
            episode,
            response.url().clone(),
            challenge,
            artifact_path(Path::new(&self.config.captcha_dir), episode),
        );

        match self.run_episode(ctx, &mut session, captured).await {
            Ok(()) => {
                ctx.stats().record_captcha_resolved();
                Ok(())
            }
            Err(e) => {
                tracing::error!("Captcha episode {} failed in {}: {}", episode, session.state(), e);
                session.fail();
                self.episodes.abandon(episode);
                discard_artifact(&session.artifact);
                Err(e)
            }
        }
    }

    async fn run_episode(
        &self,
        ctx: &Context,
        session: &mut CaptchaSession,
        captured: oneshot::Receiver<Capture>,
    ) -> Result<(), SpiderError> {
        let image_url = session.challenge.image_url.clone();
        let image_request = PendingRequest::new(image_url, GOOGLE_CAPTCHA)
            .with_referer(session.source.as_str())
            .with_meta(EPISODE_META, session.episode.to_string());
        ctx.schedule(image_request)?;
        session.advance(CaptchaState::ImageRequested)?;

        self.wait_for_image(ctx, session.episode, captured).await?;
        session.advance(CaptchaState::ImageCaptured)?;

        ctx.sleep(Duration::from_millis(self.config.captcha_delay_ms)).await?;
        session.advance(CaptchaState::AwaitingResolution)?;
        let question = format!("Give me the captcha text ({})", session.artifact.display());
        let text = self.prompt.ask(&question, ctx.cancel_token()).await?;
        tracing::info!("Using captcha text: {:?}", text);

        session.advance(CaptchaState::Resubmitting)?;
        tokio::fs::remove_file(&session.artifact)
            .await
            .map_err(|source| CaptchaError::ArtifactRemove {
                path: session.artifact.clone(),
                source,
            })?;

        let resubmission = PendingRequest::new(session.challenge.form.action.clone(), GOOGLE)
            .with_referer(session.source.as_str())
            .with_query(session.challenge.form.solved(&text));
        ctx.schedule(resubmission)?;
        session.advance(CaptchaState::Resumed)?;
        Ok(())
    }

    async fn wait_for_image(
        &self,
        ctx: &Context,
        episode: u64,
        captured: oneshot::Receiver<Capture>,
    ) -> Result<(), SpiderError> {
        let timeout = Duration::from_millis(self.config.captcha_image_timeout_ms);
        let outcome = tokio::select! {
            _ = ctx.cancel_token().cancelled() => return Err(SpiderError::Cancelled),
            outcome = tokio::time::timeout(timeout, captured) => outcome,
        };

        let reason = match outcome {
            Ok(Ok(Ok(()))) => return Ok(()),
            Ok(Ok(Err(reason))) => reason,
            Ok(Err(_)) => "image handler went away".to_string(),
            Err(_) => format!("no image after {:?}", timeout),
        };
        Err(CaptchaError::ImageNotCaptured { episode, reason }.into())
    }

    /// Handles the challenge image response
    ///
    /// Writes the image to the episode's artifact and wakes the episode. An
    /// image nobody waits for anymore is deleted again.
    pub async fn google_captcha(
        &self,
        _ctx: Context,
        response: Response,
    ) -> Result<(), SpiderError> {
        let episode = response
            .meta(EPISODE_META)
            .and_then(|value| value.parse::<u64>().ok())
            .ok_or(CaptchaError::MissingEpisode)?;
        let path = artifact_path(Path::new(&self.config.captcha_dir), episode);

        let written = self.capture_image(&response, &path).await;
        let capture = match &written {
            Ok(()) => Ok(()),
            Err(SpiderError::Captcha(e)) => Err(e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        if let Err(e) = self.episodes.complete(episode, capture) {
            tracing::warn!("{}", e);
            discard_artifact(&path);
            return Err(e.into());
        }
        written
    }

    async fn capture_image(&self, response: &Response, path: &Path) -> Result<(), SpiderError> {
        response.ensure_success()?;

        let write_error = |source| CaptchaError::ArtifactWrite {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await.map_err(write_error)?;
        }
        tokio::fs::write(path, response.body()).await.map_err(write_error)?;

        tracing::info!("Captcha image saved to {}", path.display());
        Ok(())
    }
}
