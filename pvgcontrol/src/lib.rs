//! Cœur de contrôle de PVGrid.
//!
//! Trois composants coopèrent pour piloter la grille de lecteurs :
//! - [`RotationScheduler`] : minuterie à période aléatoire qui régénère
//!   l'affectation d'adresses à chaque cycle et la publie aux abonnés ;
//! - [`Broadcaster`] : livraison étalée et sans accusé de réception d'une
//!   commande de lecture à chaque cible vivante ;
//! - [`AssignmentBus`] : bus d'abonnement aux affectations publiées.

mod events;

pub mod broadcast;
pub mod command;
pub mod config_ext;
pub mod errors;
pub mod scheduler;

pub use broadcast::{Broadcaster, PlayerTarget, StaggerPolicy};
pub use command::{PlayerCommand, QualityLevel};
pub use config_ext::RotationConfigExt;
pub use errors::ControlError;
pub use events::AssignmentBus;
pub use scheduler::{RotationConfig, RotationScheduler};
