//! Pool d'adresses de PVGrid.
//!
//! Fournit le tirage pseudo-aléatoire d'une adresse dans un bloc et la
//! génération d'une affectation complète (une adresse par slot de la
//! grille), en privilégiant des blocs distincts entre les slots d'une
//! même passe.
//!
//! Toutes les fonctions prennent une source de hasard injectée afin que
//! les tests puissent fournir un générateur déterministe.

pub mod errors;
mod pool;

pub use errors::PoolError;
pub use pool::{AddressAssignment, assign_addresses, sample_in_range};
