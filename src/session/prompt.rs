//! The post-skip prompt: undo, report, or let it expire.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::player::PlayerControl;
use crate::segments::{Segment, SkipPlan};
use crate::sponsorblock::SegmentApi;

/// Something the user should be told about.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A segment was skipped
    Skipped { segment: Segment, plan: SkipPlan },
    VoteSucceeded { uuid: String, upvote: bool },
    VoteFailed {
        uuid: String,
        upvote: bool,
        message: String,
    },
}

/// Surfaces skips and prompts to the user.
///
/// Called from the scheduler's worker thread and from prompt threads;
/// implementations must return promptly.
pub trait SkipNotifier: Send + Sync {
    /// Offer the unskip/report prompt for a skip that just happened.
    ///
    /// Dropping the prompt leaves it to expire on its own.
    fn show_skipped(&self, prompt: SkipPrompt);

    fn notify(&self, notification: Notification);
}

/// Vote on a segment and tell the user how it went.
///
/// Only an `explicit` vote (one the user asked for) is announced, whether it
/// succeeds or fails. Failures are always logged. Returns whether the vote
/// went through.
pub fn vote_on_segment(
    api: &dyn SegmentApi,
    notifier: &dyn SkipNotifier,
    uuid: &str,
    upvote: bool,
    explicit: bool,
) -> bool {
    match api.vote(uuid, upvote) {
        Ok(()) => {
            info!(uuid, upvote, "voted on segment");
            if explicit {
                notifier.notify(Notification::VoteSucceeded {
                    uuid: uuid.to_string(),
                    upvote,
                });
            }
            true
        }
        Err(err) => {
            error!(uuid, upvote, error = %err, "failed to vote on segment");
            if explicit {
                notifier.notify(Notification::VoteFailed {
                    uuid: uuid.to_string(),
                    upvote,
                    message: err.to_string(),
                });
            }
            false
        }
    }
}

/// Timeouts and behavior of a [`SkipPrompt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptSettings {
    pub idle_timeout: Duration,
    /// Replaces the idle timeout once the user interacts
    pub interacted_timeout: Duration,
    /// Upvote when the prompt expires untouched
    pub auto_upvote: bool,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(10),
            interacted_timeout: Duration::from_secs(3),
            auto_upvote: false,
        }
    }
}

/// How a prompt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    Expired { upvoted: bool },
    Unskipped,
    Reported,
    Dismissed,
}

enum PromptMessage {
    Interacted,
    Unskip,
    Report,
    Dismiss,
}

/// Everything the prompt thread needs to act on the user's choice.
struct PromptTask {
    segment: Segment,
    settings: PromptSettings,
    player: Arc<dyn PlayerControl>,
    api: Arc<dyn SegmentApi>,
    notifier: Arc<dyn SkipNotifier>,
}

impl PromptTask {
    fn revert(&self) {
        debug!(segment = %self.segment, "reverting skip");
        if let Err(err) = self.player.seek_to(self.segment.start) {
            warn!(error = %err, "failed to seek back to segment start");
        }
    }

    fn run(self, rx: mpsc::Receiver<PromptMessage>) -> PromptOutcome {
        let mut deadline = Instant::now() + self.settings.idle_timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(PromptMessage::Interacted) => {
                    deadline = Instant::now() + self.settings.interacted_timeout;
                }
                Ok(PromptMessage::Unskip) => {
                    self.revert();
                    return PromptOutcome::Unskipped;
                }
                Ok(PromptMessage::Report) => {
                    vote_on_segment(
                        self.api.as_ref(),
                        self.notifier.as_ref(),
                        &self.segment.uuid,
                        false,
                        true,
                    );
                    self.revert();
                    return PromptOutcome::Reported;
                }
                Ok(PromptMessage::Dismiss) => return PromptOutcome::Dismissed,
                Err(RecvTimeoutError::Timeout) => return self.expire(),
                Err(RecvTimeoutError::Disconnected) => {
                    // Handle dropped: nobody can act on it anymore, let it run out
                    thread::sleep(deadline.saturating_duration_since(Instant::now()));
                    return self.expire();
                }
            }
        }
    }

    fn expire(&self) -> PromptOutcome {
        debug!(uuid = %self.segment.uuid, "skip prompt expired");
        let upvoted = self.settings.auto_upvote
            && vote_on_segment(
                self.api.as_ref(),
                self.notifier.as_ref(),
                &self.segment.uuid,
                true,
                false,
            );
        PromptOutcome::Expired { upvoted }
    }
}

/// Handle to an open post-skip prompt.
///
/// The prompt expires on its own thread after the idle timeout, or after the
/// shorter interacted timeout once [`interacted`](Self::interacted) is called.
/// Unskip, report and dismiss end it immediately.
pub struct SkipPrompt {
    segment: Segment,
    tx: Sender<PromptMessage>,
    handle: Option<JoinHandle<PromptOutcome>>,
}

impl SkipPrompt {
    pub(crate) fn spawn(
        segment: Segment,
        settings: PromptSettings,
        player: Arc<dyn PlayerControl>,
        api: Arc<dyn SegmentApi>,
        notifier: Arc<dyn SkipNotifier>,
    ) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let task = PromptTask {
            segment: segment.clone(),
            settings,
            player,
            api,
            notifier,
        };
        let handle = thread::Builder::new()
            .name("skip-prompt".to_string())
            .spawn(move || task.run(rx))?;

        Ok(Self {
            segment,
            tx,
            handle: Some(handle),
        })
    }

    /// The skipped segment.
    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    /// The user touched the prompt; switch to the shorter timeout.
    pub fn interacted(&self) {
        self.send(PromptMessage::Interacted);
    }

    /// Seek back to the segment start.
    pub fn unskip(&self) {
        self.send(PromptMessage::Unskip);
    }

    /// Downvote the segment and seek back to its start.
    pub fn report(&self) {
        self.send(PromptMessage::Report);
    }

    /// Close without expiring.
    pub fn dismiss(&self) {
        self.send(PromptMessage::Dismiss);
    }

    fn send(&self, message: PromptMessage) {
        // The prompt may already be over
        let _ = self.tx.send(message);
    }

    /// Wait for the prompt to end.
    pub fn wait(mut self) -> PromptOutcome {
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(outcome)) => outcome,
            Some(Err(_)) => {
                error!("skip prompt thread panicked");
                PromptOutcome::Dismissed
            }
            None => PromptOutcome::Dismissed,
        }
    }
}

impl std::fmt::Debug for SkipPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkipPrompt")
            .field("segment", &self.segment)
            .finish_non_exhaustive()
    }
}
