use lotofacil_db::models::{max_consecutive_run, Draw, PICK_COUNT};

use crate::error::WizardError;

/// Largeur minimale d'une bande quand l'écart-type observé est nul.
const STD_EPSILON: f64 = 1e-6;

/// Nombre de lignes de la grille 5×5 (1-5, 6-10, 11-15, 16-20, 21-25).
pub const LINE_COUNT: usize = 5;

/// Valeurs dérivées d'une combinaison, comparées aux bandes historiques.
#[derive(Debug, Clone, PartialEq)]
pub struct Features {
    pub sum: f64,
    pub even_count: f64,
    pub line_counts: [f64; LINE_COUNT],
    pub max_run: f64,
}

pub fn extract_features(numbers: &[u8; PICK_COUNT]) -> Features {
    let sum: u32 = numbers.iter().map(|&n| n as u32).sum();
    let even_count = numbers.iter().filter(|&&n| n % 2 == 0).count();

    let mut line_counts = [0.0f64; LINE_COUNT];
    for &n in numbers {
        line_counts[((n - 1) / 5) as usize] += 1.0;
    }

    Features {
        sum: sum as f64,
        even_count: even_count as f64,
        line_counts,
        max_run: max_consecutive_run(numbers) as f64,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub mean: f64,
    pub std_dev: f64,
    pub low: f64,
    pub high: f64,
}

impl Band {
    fn from_values(values: &[f64], k_std: f64) -> Band {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let mut std_dev = variance.sqrt();
        if std_dev < STD_EPSILON {
            std_dev = STD_EPSILON;
        }
        Band {
            mean,
            std_dev,
            low: mean - k_std * std_dev,
            high: mean + k_std * std_dev,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    /// Distance hors bande, en nombre d'écarts-types. 0 à l'intérieur.
    pub fn excess(&self, value: f64) -> f64 {
        if value < self.low {
            (self.low - value) / self.std_dev
        } else if value > self.high {
            (value - self.high) / self.std_dev
        } else {
            0.0
        }
    }
}

/// Bandes « typiques » des tirages récents : moyenne ± k_std·écart-type
/// pour chaque caractéristique suivie.
#[derive(Debug, Clone, PartialEq)]
pub struct BandModel {
    pub sum: Band,
    pub even_count: Band,
    pub lines: [Band; LINE_COUNT],
    pub max_run: Band,
    pub window: usize,
}

// Poids relatifs des caractéristiques dans la punition soft.
const SUM_WEIGHT: f64 = 1.0;
const EVEN_WEIGHT: f64 = 0.8;
const LINE_WEIGHT: f64 = 0.5;
const RUN_WEIGHT: f64 = 0.7;

impl BandModel {
    pub fn build(draws: &[Draw], window: usize, k_std: f64) -> Result<Self, WizardError> {
        if draws.is_empty() {
            return Err(WizardError::Data("aucun tirage chargé".to_string()));
        }

        let window = window.min(draws.len());
        let features: Vec<Features> = draws
            .iter()
            .take(window)
            .map(|d| extract_features(&d.numbers))
            .collect();

        let sums: Vec<f64> = features.iter().map(|f| f.sum).collect();
        let evens: Vec<f64> = features.iter().map(|f| f.even_count).collect();
        let runs: Vec<f64> = features.iter().map(|f| f.max_run).collect();

        let lines: [Band; LINE_COUNT] = std::array::from_fn(|i| {
            let values: Vec<f64> = features.iter().map(|f| f.line_counts[i]).collect();
            Band::from_values(&values, k_std)
        });

        Ok(BandModel {
            sum: Band::from_values(&sums, k_std),
            even_count: Band::from_values(&evens, k_std),
            lines,
            max_run: Band::from_values(&runs, k_std),
            window,
        })
    }

    pub fn contains(&self, features: &Features) -> bool {
        self.sum.contains(features.sum)
            && self.even_count.contains(features.even_count)
            && self
                .lines
                .iter()
                .zip(features.line_counts.iter())
                .all(|(band, &v)| band.contains(v))
            && self.max_run.contains(features.max_run)
    }

    /// Somme pondérée des distances hors bande, en écarts-types.
    pub fn soft_penalty(&self, features: &Features) -> f64 {
        let mut penalty = SUM_WEIGHT * self.sum.excess(features.sum)
            + EVEN_WEIGHT * self.even_count.excess(features.even_count)
            + RUN_WEIGHT * self.max_run.excess(features.max_run);
        for (band, &v) in self.lines.iter().zip(features.line_counts.iter()) {
            penalty += LINE_WEIGHT * band.excess(v);
        }
        penalty
    }
}
