//! End-to-end sessions: simulated player, file-backed segments, real scheduler

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use segskip::player::{EventPump, PlayerControl, SimItem, SimulatedPlayer};
use segskip::segments::SkipPlan;
use segskip::session::PromptOutcome;
use segskip::sponsorblock::{FileSegmentSource, Vote};
use segskip::{Config, PlaybackMonitor};
use tempfile::TempDir;

use crate::helpers::{segment_dir, wait_until, Recorder};

struct Session {
    _dir: TempDir,
    player: Arc<SimulatedPlayer>,
    api: Arc<FileSegmentSource>,
    notifier: Arc<Recorder>,
    monitor: Arc<PlaybackMonitor>,
    pump: Option<EventPump>,
}

impl Session {
    fn new(files: &[(&str, &str)], player: SimulatedPlayer, config: &Config) -> Self {
        let dir = segment_dir(files);
        let player = Arc::new(player);
        let api = Arc::new(FileSegmentSource::new(dir.path()));
        let notifier = Arc::new(Recorder::default());
        let monitor = Arc::new(PlaybackMonitor::new(
            player.clone(),
            api.clone(),
            notifier.clone(),
            config,
        ));

        let sink = Arc::clone(&monitor);
        let pump = player.attach(move |event| sink.handle_event(event)).unwrap();

        Self {
            _dir: dir,
            player,
            api,
            notifier,
            monitor,
            pump: Some(pump),
        }
    }

    fn skips(&self) -> Vec<(String, SkipPlan)> {
        self.notifier.skips()
    }

    fn wait_for_skips(&self, count: usize) -> bool {
        wait_until(Duration::from_secs(10), || self.skips().len() >= count)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.monitor.stop();
        if let Some(pump) = self.pump.take() {
            pump.shutdown();
        }
    }
}

fn one_video(duration: f64) -> SimulatedPlayer {
    SimulatedPlayer::new(vec![SimItem::new("abc", duration)])
}

fn quiet_config() -> Config {
    let mut config = Config::default();
    config.prompt.show_skipped_dialog = false;
    config
}

#[test]
fn skips_segment_once_and_reports_view() {
    let session = Session::new(
        &[(
            "abc",
            r#"[{"UUID": "a", "category": "sponsor", "segment": [1.0, 4.0]}]"#,
        )],
        one_video(30.0),
        &quiet_config(),
    );
    session.player.play().unwrap();

    assert!(session.wait_for_skips(1));
    assert!(session.player.position() >= 4.0);

    thread::sleep(Duration::from_millis(500));
    assert_eq!(session.skips(), vec![("a".to_string(), SkipPlan::SeekTo(4.0))]);
    assert_eq!(session.api.views(), vec!["a".to_string()]);
}

#[test]
fn chained_segments_are_one_skip() {
    let session = Session::new(
        &[(
            "abc",
            r#"[
                {"UUID": "a", "category": "sponsor", "segment": [1.0, 3.0]},
                {"UUID": "b", "category": "sponsor", "segment": [3.5, 6.0]}
            ]"#,
        )],
        one_video(30.0),
        &quiet_config(),
    );
    session.player.play().unwrap();

    assert!(session.wait_for_skips(1));
    thread::sleep(Duration::from_millis(500));
    assert_eq!(session.skips(), vec![("a".to_string(), SkipPlan::SeekTo(6.0))]);
}

#[test]
fn stale_position_after_seek_does_not_retrigger() {
    let player = one_video(30.0).with_seek_latency(Duration::from_secs(2));
    let session = Session::new(
        &[(
            "abc",
            r#"[
                {"UUID": "a", "category": "sponsor", "segment": [1.0, 3.0]},
                {"UUID": "b", "category": "sponsor", "segment": [4.5, 7.0]}
            ]"#,
        )],
        player,
        &quiet_config(),
    );
    session.player.play().unwrap();

    assert!(session.wait_for_skips(2));
    assert_eq!(
        session.skips(),
        vec![
            ("a".to_string(), SkipPlan::SeekTo(3.0)),
            ("b".to_string(), SkipPlan::SeekTo(7.0)),
        ]
    );
}

#[test]
fn speed_shortens_the_wait() {
    let player = one_video(60.0);
    player.set_speed(8.0);
    let session = Session::new(
        &[(
            "abc",
            r#"[{"UUID": "a", "category": "sponsor", "segment": [16.0, 20.0]}]"#,
        )],
        player,
        &quiet_config(),
    );
    session.player.play().unwrap();

    // 16 seconds of media at 8x
    assert!(wait_until(Duration::from_secs(5), || !session.skips().is_empty()));
}

#[test]
fn paused_player_is_not_skipped_until_resumed() {
    let session = Session::new(
        &[(
            "abc",
            r#"[{"UUID": "a", "category": "sponsor", "segment": [1.0, 4.0]}]"#,
        )],
        one_video(30.0),
        &quiet_config(),
    );
    session.player.play().unwrap();
    session.player.pause();

    thread::sleep(Duration::from_millis(1500));
    assert!(session.skips().is_empty());

    session.player.resume();
    assert!(session.wait_for_skips(1));
}

#[test]
fn manual_seek_past_segment_skips_nothing() {
    let session = Session::new(
        &[(
            "abc",
            r#"[{"UUID": "a", "category": "sponsor", "segment": [2.0, 4.0]}]"#,
        )],
        one_video(30.0),
        &quiet_config(),
    );
    session.player.play().unwrap();
    assert!(wait_until(Duration::from_secs(2), || session.monitor.scheduler().is_running()));

    session.player.seek_to(10.0).unwrap();
    thread::sleep(Duration::from_millis(2500));
    assert!(session.skips().is_empty());
}

#[test]
fn skip_into_end_moves_to_next_video() {
    let player = SimulatedPlayer::new(vec![SimItem::new("abc", 10.0), SimItem::new("def", 10.0)]);
    let session = Session::new(
        &[(
            "abc",
            r#"[{"UUID": "outro", "category": "sponsor", "segment": [1.0, 9.5]}]"#,
        )],
        player,
        &quiet_config(),
    );
    session.player.play().unwrap();

    assert!(session.wait_for_skips(1));
    assert_eq!(session.skips()[0], ("outro".to_string(), SkipPlan::NextItem));
    assert!(wait_until(Duration::from_secs(2), || {
        session.player.current_video_id().as_deref() == Some("def")
    }));
}

#[test]
fn ignored_video_plays_through() {
    let session = Session::new(
        &[(
            "abc",
            r#"[{"UUID": "a", "category": "sponsor", "segment": [0.5, 4.0]}]"#,
        )],
        one_video(30.0),
        &quiet_config(),
    );
    session.monitor.ignore_next_video("abc");
    session.player.play().unwrap();

    thread::sleep(Duration::from_millis(1500));
    assert!(session.skips().is_empty());
}

#[test]
fn invalid_list_is_discarded() {
    let session = Session::new(
        &[(
            "abc",
            r#"[
                {"UUID": "a", "category": "sponsor", "segment": [1.0, 1.05]},
                {"UUID": "b", "category": "sponsor", "segment": [2.0, 5.0]}
            ]"#,
        )],
        one_video(30.0),
        &quiet_config(),
    );
    session.player.play().unwrap();

    thread::sleep(Duration::from_millis(2500));
    assert!(session.skips().is_empty());
    assert_eq!(session.monitor.loaded_video(), None);
}

#[test]
fn report_from_prompt_downvotes_and_reverts() {
    let session = Session::new(
        &[(
            "abc",
            r#"[{"UUID": "a", "category": "sponsor", "segment": [1.0, 10.0]}]"#,
        )],
        one_video(60.0),
        &Config::default(),
    );
    session.player.play().unwrap();
    assert!(session.wait_for_skips(1));

    let mut prompt = None;
    assert!(wait_until(Duration::from_secs(2), || {
        prompt = session.notifier.take_prompt();
        prompt.is_some()
    }));
    let prompt = prompt.unwrap();
    assert_eq!(prompt.segment().uuid, "a");
    prompt.report();
    assert_eq!(prompt.wait(), PromptOutcome::Reported);

    assert!(session.player.position() < 5.0);
    assert_eq!(
        session.api.votes(),
        vec![Vote {
            uuid: "a".to_string(),
            upvote: false
        }]
    );

    // Back at the segment start, but it is not selected again
    thread::sleep(Duration::from_millis(1000));
    assert_eq!(session.skips().len(), 1);
}
