use std::collections::HashSet;

use rand::Rng;
use tracing::trace;

use pvgutils::{Address, AddressRange};

use crate::errors::PoolError;

/// Affectation d'adresses, une par slot de la grille, alignée sur les
/// index des slots. Reconstruite en bloc à chaque rotation ou changement
/// du nombre de slots, jamais modifiée en place.
pub type AddressAssignment = Vec<Address>;

/// Tire une adresse pseudo-aléatoire dans un bloc.
///
/// Le tirage suit la convention demi-ouverte `[start, end)` :
/// `start + uniform(0, end - start)`, donc `end` n'est jamais produit.
/// Le bloc dégénéré `start == end` produit `start`.
///
/// Fonction pure de ses entrées et de la source de hasard.
pub fn sample_in_range<R: Rng + ?Sized>(rng: &mut R, range: &AddressRange) -> Address {
    let span = range.span();
    if span == 0 {
        return range.start();
    }
    let offset = rng.random_range(0..span);
    Address::from_u32(range.start().as_u32() + offset)
}

/// Génère une affectation complète : une adresse par slot.
///
/// Pour chaque slot, un bloc est choisi au hasard en privilégiant un bloc
/// pas encore utilisé dans cette passe. Le tirage est retenté au plus
/// `ranges.len()` fois ; si la borne est atteinte alors qu'il reste des
/// blocs inutilisés, le premier bloc inutilisé à partir du tirage courant
/// (parcours circulaire) est retenu. Une fois tous les blocs utilisés,
/// les répétitions sont permises.
///
/// `slot_count == 0` retourne une affectation vide.
///
/// # Errors
///
/// [`PoolError::EmptyRangeSet`] si `ranges` est vide.
pub fn assign_addresses<R: Rng + ?Sized>(
    rng: &mut R,
    slot_count: usize,
    ranges: &[AddressRange],
) -> Result<AddressAssignment, PoolError> {
    if ranges.is_empty() {
        return Err(PoolError::EmptyRangeSet);
    }

    let mut used: HashSet<usize> = HashSet::new();
    let mut assignment = Vec::with_capacity(slot_count);

    for slot in 0..slot_count {
        let index = pick_range_index(rng, ranges.len(), &used);
        used.insert(index);
        let address = sample_in_range(rng, &ranges[index]);
        trace!(slot, range = %ranges[index], %address, "assigned address");
        assignment.push(address);
    }

    Ok(assignment)
}

/// Choisit l'index d'un bloc, en évitant ceux déjà utilisés dans la passe
/// tant qu'il en reste. Tirages bornés à `range_count` tentatives, avec un
/// parcours circulaire comme repli pour garder la sélection totale.
fn pick_range_index<R: Rng + ?Sized>(
    rng: &mut R,
    range_count: usize,
    used: &HashSet<usize>,
) -> usize {
    let mut pick = rng.random_range(0..range_count);
    if used.len() >= range_count {
        // Tous les blocs ont déjà servi : les répétitions sont permises.
        return pick;
    }

    for _ in 0..range_count {
        if !used.contains(&pick) {
            return pick;
        }
        pick = rng.random_range(0..range_count);
    }

    // Borne de tentatives atteinte : premier bloc libre à partir du
    // dernier tirage.
    for offset in 0..range_count {
        let candidate = (pick + offset) % range_count;
        if !used.contains(&candidate) {
            return candidate;
        }
    }
    pick
}
