//! Diffusion étalée des commandes de lecture.
//!
//! Chaque cible reçoit la commande après un délai propre à son index,
//! pour éviter des livraisons simultanées sur toute la grille. La
//! livraison est sans accusé de réception : le diffuseur ne sait jamais
//! si la cible a appliqué la commande.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::trace;

use crate::command::PlayerCommand;

/// Poignée opaque vers un lecteur de la grille.
///
/// La vivacité est testée au moment de la livraison, pas à la
/// planification : une cible peut disparaître pendant le délai
/// d'étalement. Livrer à une cible morte est un non-événement silencieux.
pub trait PlayerTarget: Send + Sync {
    fn is_live(&self) -> bool;
    fn deliver(&self, command: &PlayerCommand);
}

/// Politique d'étalement des livraisons.
///
/// Le défaut est l'étalement linéaire `index * step` ; la gigue
/// aléatoire bornée reste disponible via la configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StaggerPolicy {
    Linear { step: Duration },
    RandomJitter { max: Duration },
}

impl StaggerPolicy {
    /// Délai appliqué à la cible d'index `index`. Le tirage de la gigue
    /// se fait à la planification, comme dans l'étalement linéaire.
    pub fn delay_for(&self, index: usize) -> Duration {
        match self {
            StaggerPolicy::Linear { step } => *step * index as u32,
            StaggerPolicy::RandomJitter { max } => {
                let max_ms = max.as_millis() as u64;
                if max_ms == 0 {
                    return Duration::ZERO;
                }
                Duration::from_millis(rand::rng().random_range(0..=max_ms))
            }
        }
    }
}

impl Default for StaggerPolicy {
    fn default() -> Self {
        StaggerPolicy::Linear {
            step: Duration::from_millis(25),
        }
    }
}

/// Diffuseur de commandes vers les cibles de la grille.
#[derive(Clone, Copy, Debug, Default)]
pub struct Broadcaster {
    policy: StaggerPolicy,
}

impl Broadcaster {
    pub fn new(policy: StaggerPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> StaggerPolicy {
        self.policy
    }

    /// Planifie la livraison de `command` à chaque cible, décalée selon
    /// la politique d'étalement.
    ///
    /// Fire-and-forget : pas d'accusé de réception, pas de reprise. Les
    /// livraisons planifiées ne sont pas annulables individuellement ;
    /// pour en supprimer une, l'appelant invalide la vivacité de la
    /// cible avant l'échéance du délai.
    pub fn broadcast(&self, targets: &[Arc<dyn PlayerTarget>], command: &PlayerCommand) {
        for (index, target) in targets.iter().enumerate() {
            let delay = self.policy.delay_for(index);
            let target = Arc::clone(target);
            let command = command.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if target.is_live() {
                    trace!(index, %command, "delivering command");
                    target.deliver(&command);
                } else {
                    // Cible démontée pendant le délai : non-événement
                    trace!(index, %command, "target gone, dropping delivery");
                }
            });
        }
    }
}
