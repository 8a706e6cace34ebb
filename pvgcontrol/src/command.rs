use std::fmt;
use std::str::FromStr;

use serde_json::json;

use crate::errors::ControlError;

/// Niveau de qualité demandé aux lecteurs embarqués.
///
/// L'ensemble est fermé et correspond aux jetons acceptés par l'API des
/// lecteurs (`auto`, `hd1080`, `hd720`, `large`, `medium`, `small`, `tiny`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QualityLevel {
    Auto,
    Hd1080,
    Hd720,
    Large,
    Medium,
    Small,
    Tiny,
}

impl QualityLevel {
    /// Jeton envoyé sur le fil pour ce niveau de qualité.
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLevel::Auto => "auto",
            QualityLevel::Hd1080 => "hd1080",
            QualityLevel::Hd720 => "hd720",
            QualityLevel::Large => "large",
            QualityLevel::Medium => "medium",
            QualityLevel::Small => "small",
            QualityLevel::Tiny => "tiny",
        }
    }

    /// Tous les niveaux, dans l'ordre décroissant de qualité.
    pub fn all() -> &'static [QualityLevel] {
        &[
            QualityLevel::Auto,
            QualityLevel::Hd1080,
            QualityLevel::Hd720,
            QualityLevel::Large,
            QualityLevel::Medium,
            QualityLevel::Small,
            QualityLevel::Tiny,
        ]
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityLevel {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(QualityLevel::Auto),
            "hd1080" => Ok(QualityLevel::Hd1080),
            "hd720" => Ok(QualityLevel::Hd720),
            "large" => Ok(QualityLevel::Large),
            "medium" => Ok(QualityLevel::Medium),
            "small" => Ok(QualityLevel::Small),
            "tiny" => Ok(QualityLevel::Tiny),
            other => Err(ControlError::UnknownQuality(other.to_string())),
        }
    }
}

/// Commande de lecture diffusée à tous les lecteurs de la grille.
///
/// Éphémère : construite à chaque diffusion, jamais persistée.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayerCommand {
    Play,
    Pause,
    Mute,
    Unmute,
    SetQuality(QualityLevel),
}

impl PlayerCommand {
    /// Nom de fonction de l'API des lecteurs embarqués.
    pub fn func(&self) -> &'static str {
        match self {
            PlayerCommand::Play => "playVideo",
            PlayerCommand::Pause => "pauseVideo",
            PlayerCommand::Mute => "mute",
            PlayerCommand::Unmute => "unMute",
            PlayerCommand::SetQuality(_) => "setPlaybackQuality",
        }
    }

    /// Argument optionnel transporté par la commande.
    pub fn value(&self) -> Option<&'static str> {
        match self {
            PlayerCommand::SetQuality(quality) => Some(quality.as_str()),
            _ => None,
        }
    }

    /// Encode la commande dans l'enveloppe JSON attendue par les lecteurs.
    ///
    /// La clé `args` est omise quand la commande ne transporte pas de
    /// valeur, conformément au format de l'API.
    pub fn to_wire(&self) -> String {
        let envelope = match self.value() {
            Some(value) => json!({
                "event": "command",
                "func": self.func(),
                "args": [value],
            }),
            None => json!({
                "event": "command",
                "func": self.func(),
            }),
        };
        envelope.to_string()
    }
}

impl fmt::Display for PlayerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(value) => write!(f, "{}({})", self.func(), value),
            None => f.write_str(self.func()),
        }
    }
}
