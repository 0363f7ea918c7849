use std::path::Path;

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Mode {
    Aggressive,
    #[default]
    Conservative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum BandMode {
    Off,
    #[default]
    Soft,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum DiversityPreset {
    #[default]
    Auto,
    Solo,
    Coverage,
}

/// Paramètres d'un run de sélection, tels que reçus de la ligne de commande.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    pub mode: Mode,
    pub window: u32,
    pub finals: usize,
    pub max_run: usize,
    pub sample_size: usize,
    pub seed: u64,
    pub hot_count: usize,
    pub band_mode: BandMode,
    pub k_std: f64,
}

/// Poids du score composite. Tous ajustables ; les valeurs par défaut
/// viennent des réglages historiques du projet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiversityConfig {
    /// Bonus par dezena encore absente de l'union des grilles choisies.
    pub coverage_weight: f64,
    /// Punition du recouvrement brut avec les grilles déjà choisies.
    pub overlap_weight: f64,
    /// Punition de la similarité de Jaccard maximale.
    pub jaccard_weight: f64,
    /// Force de la séparation agressif / conservateur.
    pub mode_separation_weight: f64,
    /// Au-delà de ce recouvrement, la punition devient exponentielle.
    pub overlap_target: usize,
    /// Multiplicateur appliqué par dezena au-delà de la cible.
    pub overlap_escalation: f64,

    pub hot_weight_aggressive: f64,
    pub hot_weight_conservative: f64,
    pub cold_weight_aggressive: f64,
    pub cold_weight_conservative: f64,

    /// Recouvrement toléré avec un tirage récent avant punition.
    pub recent_tolerance_aggressive: usize,
    pub recent_tolerance_conservative: usize,

    /// Échelle de la punition de bande en mode soft.
    pub band_weight: f64,
}

impl Default for DiversityConfig {
    fn default() -> Self {
        DiversityConfig {
            coverage_weight: 0.8,
            overlap_weight: 1.2,
            jaccard_weight: 6.0,
            mode_separation_weight: 0.15,
            overlap_target: 11,
            overlap_escalation: 1.8,
            hot_weight_aggressive: 0.6,
            hot_weight_conservative: 0.3,
            cold_weight_aggressive: 0.2,
            cold_weight_conservative: 0.4,
            recent_tolerance_aggressive: 9,
            recent_tolerance_conservative: 7,
            band_weight: 1.0,
        }
    }
}

impl DiversityConfig {
    /// Punit peu la diversité : adapté quand on ne joue qu'une grille.
    pub fn solo() -> Self {
        DiversityConfig {
            coverage_weight: 0.25,
            overlap_weight: 0.6,
            jaccard_weight: 3.0,
            mode_separation_weight: 0.12,
            overlap_target: 12,
            overlap_escalation: 1.4,
            ..DiversityConfig::default()
        }
    }

    /// Punit le recouvrement et force la couverture : plusieurs grilles.
    pub fn coverage() -> Self {
        DiversityConfig {
            coverage_weight: 1.0,
            overlap_weight: 1.3,
            jaccard_weight: 7.0,
            mode_separation_weight: 0.18,
            overlap_target: 10,
            overlap_escalation: 2.0,
            ..DiversityConfig::default()
        }
    }

    /// `auto` choisit solo pour une seule grille, coverage sinon.
    pub fn resolve(preset: DiversityPreset, finals: usize) -> Self {
        match preset {
            DiversityPreset::Solo => DiversityConfig::solo(),
            DiversityPreset::Coverage => DiversityConfig::coverage(),
            DiversityPreset::Auto => {
                if finals <= 1 {
                    DiversityConfig::solo()
                } else {
                    DiversityConfig::coverage()
                }
            }
        }
    }

    pub fn recent_tolerance(&self, mode: Mode) -> usize {
        match mode {
            Mode::Aggressive => self.recent_tolerance_aggressive,
            Mode::Conservative => self.recent_tolerance_conservative,
        }
    }

    pub fn hot_weight(&self, mode: Mode) -> f64 {
        match mode {
            Mode::Aggressive => self.hot_weight_aggressive,
            Mode::Conservative => self.hot_weight_conservative,
        }
    }

    pub fn cold_weight(&self, mode: Mode) -> f64 {
        match mode {
            Mode::Aggressive => self.cold_weight_aggressive,
            Mode::Conservative => self.cold_weight_conservative,
        }
    }
}

pub fn load_weights(path: &Path) -> Result<DiversityConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    let cfg: DiversityConfig =
        serde_json::from_str(&content).with_context(|| format!("JSON invalide dans {:?}", path))?;
    Ok(cfg)
}

pub fn save_weights(cfg: &DiversityConfig, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(cfg)?;
    std::fs::write(path, content).with_context(|| format!("Impossible d'écrire {:?}", path))?;
    Ok(())
}

/// Seed déterministe basé sur la date du jour (YYYYMMDD).
pub fn date_seed() -> u64 {
    let today = chrono::Local::now().date_naive();
    let y = today.year() as u64;
    let m = today.month() as u64;
    let d = today.day() as u64;
    y * 10_000 + m * 100 + d
}
