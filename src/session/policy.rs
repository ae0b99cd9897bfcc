//! The segment skipping policy driven by the checkpoint scheduler.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::prompt::{Notification, PromptSettings, SkipNotifier, SkipPrompt};
use crate::config::Config;
use crate::player::PlayerControl;
use crate::scheduler::CheckpointPolicy;
use crate::segments::{SegmentSelector, SkipPlan};
use crate::sponsorblock::SegmentApi;

/// What happens around a skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipSettings {
    pub show_skipped_dialog: bool,
    pub skip_count_tracking: bool,
    pub prompt: PromptSettings,
}

impl Default for SkipSettings {
    fn default() -> Self {
        Self {
            show_skipped_dialog: true,
            skip_count_tracking: true,
            prompt: PromptSettings::default(),
        }
    }
}

impl From<&Config> for SkipSettings {
    fn from(config: &Config) -> Self {
        Self {
            show_skipped_dialog: config.prompt.show_skipped_dialog,
            skip_count_tracking: config.tracking.skip_count_tracking,
            prompt: PromptSettings {
                idle_timeout: config.idle_timeout(),
                interacted_timeout: config.interacted_timeout(),
                auto_upvote: config.prompt.auto_upvote,
            },
        }
    }
}

/// Skips the selected segment when its checkpoint is reached.
pub struct SegmentSkipPolicy {
    selector: SegmentSelector,
    settings: SkipSettings,
    player: Arc<dyn PlayerControl>,
    api: Arc<dyn SegmentApi>,
    notifier: Arc<dyn SkipNotifier>,
}

impl SegmentSkipPolicy {
    pub fn new(
        selector: SegmentSelector,
        settings: SkipSettings,
        player: Arc<dyn PlayerControl>,
        api: Arc<dyn SegmentApi>,
        notifier: Arc<dyn SkipNotifier>,
    ) -> Self {
        Self {
            selector,
            settings,
            player,
            api,
            notifier,
        }
    }

    pub fn selector(&self) -> &SegmentSelector {
        &self.selector
    }

    pub fn selector_mut(&mut self) -> &mut SegmentSelector {
        &mut self.selector
    }

    pub fn settings(&self) -> SkipSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: SkipSettings) {
        self.settings = settings;
    }

    fn execute(&self, plan: SkipPlan) -> Result<()> {
        match plan {
            SkipPlan::SeekTo(target) => self
                .player
                .seek_to(target)
                .with_context(|| format!("failed to seek to {:.3}", target)),
            SkipPlan::NextItem => self
                .player
                .advance_to_next_item()
                .context("failed to advance to the next item"),
            SkipPlan::StopPlayback => self
                .player
                .stop_playback()
                .context("failed to stop playback"),
        }
    }
}

impl CheckpointPolicy for SegmentSkipPolicy {
    fn select_next(&mut self, current_time: f64) {
        self.selector.select_next(current_time);
    }

    fn reset(&mut self) {
        self.selector.reset();
    }

    fn checkpoint(&self) -> Option<f64> {
        self.selector.checkpoint()
    }

    fn on_reached(&mut self) -> Result<()> {
        let Some(index) = self.selector.next_index() else {
            warn!("checkpoint reached without a selected segment");
            return Ok(());
        };
        let segment = self.selector.segments()[index].clone();

        let total = match self.player.total_duration() {
            Ok(total) => Some(total),
            Err(err) => {
                warn!(error = %err, "failed to read total duration, ignoring end of media");
                None
            }
        };
        let has_next = self.player.has_next_item();
        let plan = self
            .selector
            .plan_skip(index, total, has_next)
            .context("selected segment disappeared")?;

        info!(%segment, ?plan, "skipping segment");
        self.execute(plan)?;
        self.notifier.notify(Notification::Skipped {
            segment: segment.clone(),
            plan,
        });

        // Unskipping only makes sense while the item is still playing
        if self.settings.show_skipped_dialog && matches!(plan, SkipPlan::SeekTo(_)) {
            match SkipPrompt::spawn(
                segment.clone(),
                self.settings.prompt,
                Arc::clone(&self.player),
                Arc::clone(&self.api),
                Arc::clone(&self.notifier),
            ) {
                Ok(prompt) => self.notifier.show_skipped(prompt),
                Err(err) => warn!(error = %err, "failed to open skip prompt"),
            }
        }

        if self.settings.skip_count_tracking {
            if let Err(err) = self.api.report_viewed(&segment.uuid) {
                warn!(uuid = %segment.uuid, error = %err, "failed to report segment as viewed");
            }
        }

        Ok(())
    }
}
