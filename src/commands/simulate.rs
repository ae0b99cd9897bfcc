//! Simulate command handler

use anyhow::{bail, Context, Result};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use segskip::cli::SimulateArgs;
use segskip::player::{PlayerControl, PlayerEvent, SimItem, SimulatedPlayer};
use segskip::segments::SkipPlan;
use segskip::session::{Notification, SkipNotifier, SkipPrompt};
use segskip::sponsorblock::FileSegmentSource;
use segskip::{Config, PlaybackMonitor};

/// Prints skips and votes to stdout. Prompts are left to expire.
struct ConsoleNotifier;

impl SkipNotifier for ConsoleNotifier {
    fn show_skipped(&self, prompt: SkipPrompt) {
        tracing::debug!(segment = %prompt.segment(), "skip prompt left to expire");
    }

    fn notify(&self, notification: Notification) {
        match notification {
            Notification::Skipped { segment, plan } => match plan {
                SkipPlan::SeekTo(target) => println!("skipped {} -> {:.3}", segment, target),
                SkipPlan::NextItem => println!("skipped {} -> next item", segment),
                SkipPlan::StopPlayback => println!("skipped {} -> stop", segment),
            },
            Notification::VoteSucceeded { uuid, upvote } => {
                println!("{} {}", if upvote { "upvoted" } else { "downvoted" }, uuid)
            }
            Notification::VoteFailed { uuid, message, .. } => {
                eprintln!("vote on {} failed: {}", uuid, message)
            }
        }
    }
}

enum Done {
    Finished,
    Interrupted,
}

/// Play the videos in a simulated player with a monitor attached.
pub fn handle(args: &SimulateArgs) -> Result<()> {
    if !(args.duration > 0.0) {
        bail!("--duration must be positive");
    }
    if !(args.speed > 0.0) {
        bail!("--speed must be positive");
    }
    if !args.dir.is_dir() {
        bail!("Segment directory not found: {}", args.dir.display());
    }

    let mut config = Config::load()?;
    config.ensure_user_id();

    let items = args
        .video_ids
        .iter()
        .map(|id| SimItem::new(id.clone(), args.duration))
        .collect();
    let player = Arc::new(
        SimulatedPlayer::new(items).with_seek_latency(Duration::from_millis(args.seek_latency_ms)),
    );
    let api = Arc::new(FileSegmentSource::new(&args.dir));
    let monitor = Arc::new(PlaybackMonitor::new(
        player.clone(),
        api,
        Arc::new(ConsoleNotifier),
        &config,
    ));

    let (done_tx, done_rx) = mpsc::channel::<Done>();

    let interrupt_tx = done_tx.clone();
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.send(Done::Interrupted);
    })
    .context("Failed to set Ctrl-C handler")?;

    let sink_monitor = Arc::clone(&monitor);
    let sink_player = Arc::clone(&player);
    let pump = player
        .attach(move |event| {
            if let PlayerEvent::PlaybackStarted(Some(video_id)) = &event {
                println!("playing {}", video_id);
            }
            let finished = event.ends_session() && !sink_player.is_playing();
            sink_monitor.handle_event(event);
            if finished {
                let _ = done_tx.send(Done::Finished);
            }
        })
        .context("Failed to attach to player")?;

    player.set_speed(args.speed);
    player.play().context("Failed to start playback")?;
    if args.start > 0.0 {
        player.seek_to(args.start).context("Failed to seek to start")?;
    }

    let outcome = done_rx.recv();
    monitor.stop();
    pump.shutdown();

    match outcome {
        Ok(Done::Interrupted) => println!("interrupted"),
        Ok(Done::Finished) | Err(_) => println!("finished"),
    }
    Ok(())
}
