//! Extension pour lire la configuration du cœur de contrôle depuis
//! pvgconfig.
//!
//! Ce module fournit le trait [`RotationConfigExt`] qui étend
//! `pvgconfig::Config` avec des lectures typées pour le scheduler et le
//! diffuseur, en appliquant les défauts quand la configuration est
//! absente ou invalide.

use std::time::Duration;

use tracing::warn;

use pvgconfig::Config;

use crate::broadcast::StaggerPolicy;
use crate::scheduler::RotationConfig;

pub trait RotationConfigExt {
    /// Bornes de l'intervalle de rotation, converties en durées.
    fn rotation_config(&self) -> RotationConfig;

    /// Politique d'étalement du diffuseur (`linear` par défaut).
    fn stagger_policy(&self) -> StaggerPolicy;
}

impl RotationConfigExt for Config {
    fn rotation_config(&self) -> RotationConfig {
        let (min_minutes, max_minutes) = self.get_rotation_interval_minutes();
        RotationConfig {
            min_interval: Duration::from_secs(min_minutes * 60),
            max_interval: Duration::from_secs(max_minutes * 60),
        }
    }

    fn stagger_policy(&self) -> StaggerPolicy {
        match self.get_stagger_policy().as_str() {
            "linear" => StaggerPolicy::Linear {
                step: Duration::from_millis(self.get_stagger_step_millis()),
            },
            "jitter" => StaggerPolicy::RandomJitter {
                max: Duration::from_millis(self.get_jitter_max_millis()),
            },
            other => {
                warn!(policy = %other, "unknown stagger policy, using linear");
                StaggerPolicy::Linear {
                    step: Duration::from_millis(self.get_stagger_step_millis()),
                }
            }
        }
    }
}
