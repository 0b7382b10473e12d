//! Input → analysis → render, one run at a time.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tracing::{info, warn};
use uuid::Uuid;

use crate::client::AnalysisClient;
use crate::error::ViewError;
use crate::messages::split_messages;
use crate::model::AnalysisResult;
use crate::palette::EmotionPalette;
use crate::render::{draw, Dashboard, Surface};

/// Admits at most one pipeline run at a time.
///
/// A second trigger while a run is waiting on the backend is refused with
/// [`ViewError::Busy`] instead of racing the first one.
#[derive(Debug, Default)]
pub struct RunGuard {
    active: AtomicBool,
    generation: AtomicU64,
}

/// Proof that the holder owns the single run slot; releases it on drop.
#[derive(Debug)]
pub struct RunTicket<'a> {
    guard: &'a RunGuard,
    generation: u64,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_begin(&self) -> Result<RunTicket<'_>, ViewError> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ViewError::Busy)?;
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        Ok(RunTicket { guard: self, generation })
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Number of runs admitted so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

impl RunTicket<'_> {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for RunTicket<'_> {
    fn drop(&mut self) {
        self.guard.active.store(false, Ordering::Release);
    }
}

pub struct Pipeline {
    client: AnalysisClient,
    palette: EmotionPalette,
    guard: RunGuard,
}

impl Pipeline {
    pub fn new(client: AnalysisClient, palette: EmotionPalette) -> Self {
        Self {
            client,
            palette,
            guard: RunGuard::new(),
        }
    }

    pub fn palette(&self) -> &EmotionPalette {
        &self.palette
    }

    pub fn client(&self) -> &AnalysisClient {
        &self.client
    }

    pub fn guard(&self) -> &RunGuard {
        &self.guard
    }

    /// Split `raw`, send it for analysis and project the result.
    pub async fn analyze(&self, raw: &str) -> Result<Dashboard, ViewError> {
        let ticket = self.guard.try_begin()?;
        let run_id = Uuid::new_v4();
        let messages = split_messages(raw);
        info!(%run_id, generation = ticket.generation(), messages = messages.len(), "analysis run started");

        let result: AnalysisResult = match self.client.analyze(&messages).await {
            Ok(r) => r,
            Err(e) => {
                warn!(%run_id, kind = e.kind(), error = %e, "analysis run aborted");
                return Err(e);
            }
        };
        Ok(Dashboard::project(&result, &self.palette))
    }

    /// Full run onto `surface`. On error the surface is not touched.
    pub async fn run(&self, raw: &str, surface: &mut dyn Surface) -> Result<Dashboard, ViewError> {
        let dashboard = self.analyze(raw).await?;
        draw(surface, &dashboard);
        Ok(dashboard)
    }
}
