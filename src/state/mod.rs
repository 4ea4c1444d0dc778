//! State module for tracking captcha episodes
//!
//! # Components
//!
//! - `CaptchaState`: Tracks the step a captcha episode has reached (detected,
//!   image requested, image captured, awaiting resolution, resubmitting, resumed)

mod captcha_state;

// Re-export main types
pub use captcha_state::CaptchaState;
