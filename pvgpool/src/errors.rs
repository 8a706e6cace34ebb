use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    // Levée quand le pool est interrogé sans aucun bloc configuré :
    // aucune sélection n'est possible, l'appelant doit fournir une
    // configuration par défaut non vide.
    #[error("No address range configured: cannot assign addresses")]
    EmptyRangeSet,
}
