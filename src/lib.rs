//! Chat emotion dashboard.
//!
//! Collects chat lines, sends them to an emotion-analysis backend, and
//! renders the per-message labels, the aggregate distribution and a trend
//! summary as a terminal report, a standalone HTML page, or a local web UI.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod messages;
pub mod model;
pub mod palette;
pub mod pipeline;
pub mod render;
pub mod web;

pub use client::{AnalysisClient, ClientConfig};
pub use error::ViewError;
pub use messages::{split_messages, AnalyzeRequest};
pub use model::{AnalysisResult, EmotionDistribution, TimelineEntry};
pub use palette::{EmotionPalette, Rgb};
pub use pipeline::{Pipeline, RunGuard};
pub use render::{Dashboard, Renderer, Surface};
