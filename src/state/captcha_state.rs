/// Captcha episode state definitions
///
/// An episode starts when the ordinary page handler lands on the challenge host
/// and ends either when the solved form has been resubmitted or when a step fails.
use std::fmt;

/// Represents the current step of a captcha episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptchaState {
    // ===== Active States =====
    /// Challenge page was recognized and parsed
    ChallengeDetected,

    /// Challenge image fetch has been scheduled
    ImageRequested,

    /// Challenge image was written to the local artifact
    ImageCaptured,

    /// Waiting for the operator to type the solution
    AwaitingResolution,

    /// Artifact removed, solved form being scheduled
    Resubmitting,

    // ===== Terminal States =====
    /// Solved form was scheduled; the search branch continues
    Resumed,

    /// A protocol step failed; the branch is abandoned
    Failed,
}

impl CaptchaState {
    /// Returns true if this is a terminal state (no further steps follow)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resumed | Self::Failed)
    }

    /// Returns true if this is an active state (episode still in progress)
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns the state that normally follows this one, if any
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::ChallengeDetected => Some(Self::ImageRequested),
            Self::ImageRequested => Some(Self::ImageCaptured),
            Self::ImageCaptured => Some(Self::AwaitingResolution),
            Self::AwaitingResolution => Some(Self::Resubmitting),
            Self::Resubmitting => Some(Self::Resumed),
            Self::Resumed | Self::Failed => None,
        }
    }

    /// Returns true if moving from `self` to `to` is allowed
    ///
    /// Steps only move forward one at a time. Any active state may fail.
    pub fn can_transition_to(&self, to: Self) -> bool {
        if to == Self::Failed {
            return self.is_active();
        }
        self.next() == Some(to)
    }

    /// Short name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChallengeDetected => "challenge_detected",
            Self::ImageRequested => "image_requested",
            Self::ImageCaptured => "image_captured",
            Self::AwaitingResolution => "awaiting_resolution",
            Self::Resubmitting => "resubmitting",
            Self::Resumed => "resumed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CaptchaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
