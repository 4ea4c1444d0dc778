//! Operator prompts for captcha solutions

use crate::{CaptchaError, CaptchaResult};
use async_trait::async_trait;
use dialoguer::Input;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Source of captcha solutions
///
/// Implementations may block for as long as a human needs, but must give up
/// with `PromptCancelled` once `cancel` fires.
#[async_trait]
pub trait Prompt: Send + Sync {
    async fn ask(&self, message: &str, cancel: &CancellationToken) -> CaptchaResult<String>;
}

/// Reads the solution from the controlling terminal
#[derive(Debug, Default)]
pub struct TerminalPrompt {
    // One question on the terminal at a time
    turn: tokio::sync::Mutex<()>,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Prompt for TerminalPrompt {
    async fn ask(&self, message: &str, cancel: &CancellationToken) -> CaptchaResult<String> {
        let _turn = tokio::select! {
            _ = cancel.cancelled() => return Err(CaptchaError::PromptCancelled),
            turn = self.turn.lock() => turn,
        };

        // The read blocks on stdin, so it runs on a detached thread that the
        // runtime does not wait for on shutdown.
        let (sender, receiver) = oneshot::channel();
        let message = message.to_string();
        std::thread::Builder::new()
            .name("captcha-prompt".to_string())
            .spawn(move || {
                let answer = Input::<String>::new()
                    .with_prompt(message)
                    .interact_text()
                    .map_err(|e| e.to_string());
                let _ = sender.send(answer);
            })
            .map_err(|e| CaptchaError::Prompt(e.to_string()))?;

        tokio::select! {
            _ = cancel.cancelled() => Err(CaptchaError::PromptCancelled),
            answer = receiver => match answer {
                Ok(Ok(text)) => Ok(text.trim().to_string()),
                Ok(Err(e)) => Err(CaptchaError::Prompt(e)),
                Err(_) => Err(CaptchaError::Prompt(
                    "prompt thread exited without an answer".to_string(),
                )),
            },
        }
    }
}

/// Answers from a fixed list, in order
///
/// Used for unattended runs and tests. Every question asked is recorded.
#[derive(Debug, Default)]
pub struct StaticPrompt {
    answers: Mutex<VecDeque<String>>,
    questions: Mutex<Vec<String>>,
}

impl StaticPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            questions: Mutex::new(Vec::new()),
        }
    }

    /// Questions asked so far
    pub fn questions(&self) -> Vec<String> {
        self.questions
            .lock()
            .map(|questions| questions.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Prompt for StaticPrompt {
    async fn ask(&self, message: &str, cancel: &CancellationToken) -> CaptchaResult<String> {
        if cancel.is_cancelled() {
            return Err(CaptchaError::PromptCancelled);
        }

        if let Ok(mut questions) = self.questions.lock() {
            questions.push(message.to_string());
        }

        self.answers
            .lock()
            .map_err(|_| CaptchaError::Prompt("answer list lock poisoned".to_string()))?
            .pop_front()
            .ok_or_else(|| CaptchaError::Prompt("no captcha answer left".to_string()))
    }
}
