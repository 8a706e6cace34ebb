use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use pvgcontrol::{Broadcaster, PlayerCommand, PlayerTarget, QualityLevel, StaggerPolicy};

/// Cible de test : enregistre les commandes livrées et peut être
/// invalidée pour simuler un lecteur démonté.
struct RecordingTarget {
    live: AtomicBool,
    received: Mutex<Vec<String>>,
}

impl RecordingTarget {
    fn new(live: bool) -> Arc<Self> {
        Arc::new(Self {
            live: AtomicBool::new(live),
            received: Mutex::new(Vec::new()),
        })
    }

    fn dispose(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    fn deliveries(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

impl PlayerTarget for RecordingTarget {
    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn deliver(&self, command: &PlayerCommand) {
        self.received.lock().unwrap().push(command.to_wire());
    }
}

fn linear(step_millis: u64) -> Broadcaster {
    Broadcaster::new(StaggerPolicy::Linear {
        step: Duration::from_millis(step_millis),
    })
}

#[tokio::test(start_paused = true)]
async fn test_broadcast_skips_dead_target_silently() {
    let alive_first = RecordingTarget::new(true);
    let dead_middle = RecordingTarget::new(false);
    let alive_last = RecordingTarget::new(true);
    let targets: Vec<Arc<dyn PlayerTarget>> = vec![
        alive_first.clone(),
        dead_middle.clone(),
        alive_last.clone(),
    ];

    linear(25).broadcast(&targets, &PlayerCommand::Play);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(alive_first.deliveries().len(), 1);
    assert!(dead_middle.deliveries().is_empty(), "dead target must be a no-op");
    assert_eq!(alive_last.deliveries().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_liveness_is_checked_at_delivery_time() {
    let first = RecordingTarget::new(true);
    let second = RecordingTarget::new(true);
    let targets: Vec<Arc<dyn PlayerTarget>> = vec![first.clone(), second.clone()];

    linear(50).broadcast(&targets, &PlayerCommand::Mute);
    // La cible disparaît pendant la fenêtre d'étalement, après la
    // planification mais avant son échéance à 50 ms
    second.dispose();

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(first.deliveries().len(), 1);
    assert!(second.deliveries().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_every_command_kind_is_delivered() {
    let target = RecordingTarget::new(true);
    let targets: Vec<Arc<dyn PlayerTarget>> = vec![target.clone()];
    let broadcaster = linear(10);

    let commands = [
        PlayerCommand::Play,
        PlayerCommand::Pause,
        PlayerCommand::Mute,
        PlayerCommand::Unmute,
        PlayerCommand::SetQuality(QualityLevel::Hd1080),
    ];
    for command in &commands {
        broadcaster.broadcast(&targets, command);
    }

    tokio::time::sleep(Duration::from_millis(100)).await;

    let deliveries = target.deliveries();
    assert_eq!(deliveries.len(), commands.len());
    assert!(deliveries.iter().any(|wire| wire.contains("setPlaybackQuality")));
    assert!(deliveries.iter().any(|wire| wire.contains("hd1080")));
}

#[tokio::test(start_paused = true)]
async fn test_jitter_policy_delivers_within_bound() {
    let target = RecordingTarget::new(true);
    let targets: Vec<Arc<dyn PlayerTarget>> = vec![target.clone(), target.clone()];
    let broadcaster = Broadcaster::new(StaggerPolicy::RandomJitter {
        max: Duration::from_millis(100),
    });

    broadcaster.broadcast(&targets, &PlayerCommand::Pause);
    tokio::time::sleep(Duration::from_millis(101)).await;

    assert_eq!(target.deliveries().len(), 2);
}

#[tokio::test]
async fn test_broadcast_to_no_targets_is_harmless() {
    linear(25).broadcast(&[], &PlayerCommand::Unmute);
}
