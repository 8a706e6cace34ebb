//! Scheduler de rotation des adresses.
//!
//! Machine à états `Idle -> Scheduled -> Idle` : `start` publie une
//! affectation initiale puis arme une minuterie à un coup dont la durée
//! est tirée uniformément dans `[min_interval, max_interval]`. À chaque
//! déclenchement l'affectation est régénérée, publiée, et la minuterie
//! est réarmée avec une durée tirée indépendamment (pas un intervalle
//! fixe).
//!
//! L'annulation est déterministe : `stop` incrémente un compteur de
//! génération et le callback en attente se neutralise lui-même, même
//! s'il était déjà en file au moment de l'annulation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use rand::Rng;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use pvgpool::{AddressAssignment, assign_addresses};
use pvgutils::AddressRange;

use crate::errors::ControlError;
use crate::events::AssignmentBus;

/// Bornes de l'intervalle de rotation.
#[derive(Clone, Copy, Debug)]
pub struct RotationConfig {
    pub min_interval: Duration,
    pub max_interval: Duration,
}

impl RotationConfig {
    /// Valide les bornes (`min <= max`).
    pub fn validated(self) -> Result<Self, ControlError> {
        if self.min_interval > self.max_interval {
            return Err(ControlError::InvalidInterval {
                min_millis: self.min_interval.as_millis() as u64,
                max_millis: self.max_interval.as_millis() as u64,
            });
        }
        Ok(self)
    }
}

struct Shared {
    // Incrémenté à chaque stop : les callbacks d'une génération
    // antérieure se neutralisent.
    generation: AtomicU64,
    current: Mutex<AddressAssignment>,
    last_rotation: Mutex<Option<Instant>>,
    bus: AssignmentBus,
}

impl Shared {
    fn store_and_publish(&self, assignment: AddressAssignment) {
        *self.current.lock().unwrap() = assignment.clone();
        *self.last_rotation.lock().unwrap() = Some(Instant::now());
        self.bus.publish(assignment);
    }
}

/// Minuterie de rotation possédée, un seul timer vivant à la fois.
///
/// Le scheduler est l'unique écrivain de l'affectation courante ; les
/// lecteurs y accèdent par [`RotationScheduler::current`] ou en
/// s'abonnant via [`RotationScheduler::subscribe`].
pub struct RotationScheduler {
    config: RotationConfig,
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RotationScheduler {
    pub fn new(config: RotationConfig) -> Result<Self, ControlError> {
        let config = config.validated()?;
        Ok(Self {
            config,
            shared: Arc::new(Shared {
                generation: AtomicU64::new(0),
                current: Mutex::new(Vec::new()),
                last_rotation: Mutex::new(None),
                bus: AssignmentBus::new(),
            }),
            task: Mutex::new(None),
        })
    }

    /// S'abonne aux affectations publiées (initiale comprise si
    /// l'abonnement précède `start`).
    pub fn subscribe(&self) -> Receiver<AddressAssignment> {
        self.shared.bus.subscribe()
    }

    /// Affectation courante, vide tant que `start` n'a pas été appelé.
    pub fn current(&self) -> AddressAssignment {
        self.shared.current.lock().unwrap().clone()
    }

    /// Horodatage de la dernière rotation (ou publication initiale).
    pub fn last_rotation(&self) -> Option<Instant> {
        *self.shared.last_rotation.lock().unwrap()
    }

    /// Vrai si une minuterie est armée.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Démarre la rotation pour `slot_count` slots.
    ///
    /// Publie immédiatement une affectation initiale (observable via
    /// [`current`](Self::current) sans attendre la minuterie), puis arme
    /// le premier cycle. Un scheduler déjà démarré est d'abord arrêté :
    /// l'invariant est un seul timer vivant, deux timers concurrents
    /// publieraient sans garantie d'ordre.
    ///
    /// # Errors
    ///
    /// [`ControlError::Pool`] si `ranges` est vide.
    pub fn start(
        &self,
        slot_count: usize,
        ranges: Vec<AddressRange>,
    ) -> Result<(), ControlError> {
        self.stop();

        let initial = assign_addresses(&mut rand::rng(), slot_count, &ranges)?;
        self.shared.store_and_publish(initial);
        info!(slots = slot_count, ranges = ranges.len(), "rotation scheduler started");

        let shared = Arc::clone(&self.shared);
        let generation = shared.generation.load(Ordering::SeqCst);
        let config = self.config;

        let handle = tokio::spawn(async move {
            loop {
                let interval = sample_interval(&config);
                debug!(interval_millis = interval.as_millis() as u64, "rotation armed");
                tokio::time::sleep(interval).await;

                if shared.generation.load(Ordering::SeqCst) != generation {
                    // stop() est passé pendant l'attente
                    return;
                }

                match assign_addresses(&mut rand::rng(), slot_count, &ranges) {
                    Ok(assignment) => {
                        shared.store_and_publish(assignment);
                        info!(slots = slot_count, "addresses rotated");
                    }
                    Err(err) => {
                        // Non fatal : on garde l'affectation précédente et
                        // on réarme le cycle suivant.
                        warn!(error = %err, "rotation pass failed, keeping previous assignment");
                    }
                }
            }
        });

        *self.task.lock().unwrap() = Some(handle);
        Ok(())
    }

    /// Arrête la minuterie. Idempotent ; aucune publication ne peut
    /// survenir après le retour de cet appel.
    pub fn stop(&self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
            debug!("rotation scheduler stopped");
        }
    }
}

impl Drop for RotationScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Tire la durée du prochain cycle, uniformément dans `[min, max]`.
fn sample_interval(config: &RotationConfig) -> Duration {
    let min_ms = config.min_interval.as_millis() as u64;
    let max_ms = config.max_interval.as_millis() as u64;
    if min_ms >= max_ms {
        return config.min_interval;
    }
    Duration::from_millis(rand::rng().random_range(min_ms..=max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_sampling_stays_within_bounds() {
        let config = RotationConfig {
            min_interval: Duration::from_millis(300),
            max_interval: Duration::from_millis(900),
        };
        for _ in 0..500 {
            let interval = sample_interval(&config);
            assert!(interval >= config.min_interval);
            assert!(interval <= config.max_interval);
        }
    }

    #[test]
    fn test_equal_bounds_yield_fixed_interval() {
        let config = RotationConfig {
            min_interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(5),
        };
        assert_eq!(sample_interval(&config), Duration::from_secs(5));
    }

    #[test]
    fn test_inverted_bounds_are_rejected() {
        let config = RotationConfig {
            min_interval: Duration::from_secs(10),
            max_interval: Duration::from_secs(1),
        };
        assert!(matches!(
            config.validated(),
            Err(ControlError::InvalidInterval { .. })
        ));
    }
}
