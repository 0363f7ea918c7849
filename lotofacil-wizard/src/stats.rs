use lotofacil_db::models::{Draw, PICK_COUNT, POOL_SIZE};

use crate::error::WizardError;

const N: usize = POOL_SIZE as usize;

/// Fréquences des dezenas sur une fenêtre de tirages récents.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyStats {
    /// Nombre d'apparitions par dezena (indexé par dezena - 1).
    pub counts: [u32; N],
    /// Fréquence normalisée : part des tirages de la fenêtre contenant la dezena.
    pub freq: [f64; N],
    /// Dezenas les plus fréquentes, par fréquence décroissante.
    pub hot: Vec<u8>,
    /// Dezenas les moins fréquentes, par fréquence croissante.
    pub cold: Vec<u8>,
    /// Moyenne des fréquences normalisées sur le pool.
    pub mean_freq: f64,
    /// Taille effective de la fenêtre (min(window, tirages disponibles)).
    pub window: usize,
}

impl FrequencyStats {
    /// `draws[0]` = tirage le plus récent ; seuls les `window` premiers comptent.
    /// Les égalités de rang sont départagées par la valeur de la dezena.
    pub fn build(draws: &[Draw], window: usize, hot_count: usize) -> Result<Self, WizardError> {
        if draws.is_empty() {
            return Err(WizardError::Data("aucun tirage chargé".to_string()));
        }

        let window = window.min(draws.len());
        let mut counts = [0u32; N];
        for draw in draws.iter().take(window) {
            for &n in &draw.numbers {
                if n < 1 || n > POOL_SIZE {
                    return Err(WizardError::Data(format!(
                        "dezena {} hors limites au concours {}",
                        n, draw.concurso
                    )));
                }
                counts[(n - 1) as usize] += 1;
            }
        }

        let total: u32 = counts.iter().sum();
        if total != (window * PICK_COUNT) as u32 {
            return Err(WizardError::Data(format!(
                "comptage incohérent : {} dezenas pour {} tirages",
                total, window
            )));
        }

        let mut freq = [0.0f64; N];
        for (i, &c) in counts.iter().enumerate() {
            freq[i] = c as f64 / window as f64;
        }
        let mean_freq = freq.iter().sum::<f64>() / N as f64;

        // Classement décroissant, dezena la plus basse d'abord à égalité.
        let mut ranked: Vec<u8> = (1..=POOL_SIZE).collect();
        ranked.sort_by(|a, b| {
            counts[(*b - 1) as usize]
                .cmp(&counts[(*a - 1) as usize])
                .then(a.cmp(b))
        });

        let hot_count = hot_count.min(N);
        let hot: Vec<u8> = ranked[..hot_count].to_vec();
        let mut cold: Vec<u8> = ranked[N - hot_count..].to_vec();
        cold.reverse();

        Ok(FrequencyStats {
            counts,
            freq,
            hot,
            cold,
            mean_freq,
            window,
        })
    }

    pub fn is_hot(&self, n: u8) -> bool {
        self.hot.contains(&n)
    }

    pub fn is_cold(&self, n: u8) -> bool {
        self.cold.contains(&n)
    }
}
