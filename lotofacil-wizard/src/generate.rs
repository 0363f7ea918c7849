use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;

use lotofacil_db::models::{Draw, Grille, PICK_COUNT, POOL_SIZE};

const N: usize = POOL_SIZE as usize;

/// Probabilités de tirage par dezena : mélange des fréquences récentes et
/// totales (0.7 / 0.3, lissage +1), avec un léger coup de pouce aux dezenas
/// hautes (20-25). Somme = 1.
pub fn build_probabilities(draws: &[Draw], window: usize) -> [f64; N] {
    let mut total = [1.0f64; N];
    let mut recent = [1.0f64; N];

    for (i, draw) in draws.iter().enumerate() {
        for &n in &draw.numbers {
            total[(n - 1) as usize] += 1.0;
            if i < window {
                recent[(n - 1) as usize] += 1.0;
            }
        }
    }

    let total_sum: f64 = total.iter().sum();
    let recent_sum: f64 = recent.iter().sum();

    let alpha = 0.7;
    let beta = 0.3;
    let mut mix = [0.0f64; N];
    for i in 0..N {
        mix[i] = alpha * recent[i] / recent_sum + beta * total[i] / total_sum;
        if (i + 1) as u8 >= 20 {
            mix[i] += 0.05;
        }
    }

    let mix_sum: f64 = mix.iter().sum();
    for p in &mut mix {
        *p /= mix_sum;
    }
    mix
}

/// Tire `PICK_COUNT` dezenas sans remise, pondérées par `probs`.
fn sample_without_replacement(probs: &[f64; N], rng: &mut StdRng) -> Result<Vec<u8>> {
    let mut available: Vec<(u8, f64)> = probs
        .iter()
        .enumerate()
        .map(|(i, &p)| ((i + 1) as u8, p))
        .collect();
    let mut selected = Vec::with_capacity(PICK_COUNT);

    for _ in 0..PICK_COUNT {
        let weights: Vec<f64> = available.iter().map(|(_, w)| *w).collect();
        let dist = WeightedIndex::new(&weights)?;
        let idx = dist.sample(rng);
        let (number, _) = available.remove(idx);
        selected.push(number);
    }

    Ok(selected)
}

/// Génère des combinaisons candidates pour la source du sélecteur.
/// Déterministe à seed égal ; filtre les suites trop longues, les grilles
/// trop chargées en dezenas basses et les doublons exacts.
pub fn generate_candidates(
    draws: &[Draw],
    window: usize,
    count: usize,
    max_run: usize,
    seed: u64,
) -> Result<Vec<Grille>> {
    let probs = build_probabilities(draws, window);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut seen: HashSet<Grille> = HashSet::with_capacity(count);
    let mut grilles: Vec<Grille> = Vec::with_capacity(count);

    let mut attempts = 0usize;
    let max_attempts = count.saturating_mul(50);

    while grilles.len() < count && attempts < max_attempts {
        attempts += 1;

        let numbers = sample_without_replacement(&probs, &mut rng)?;
        let grille = Grille::new(&numbers)?;

        if grille.max_run() > max_run {
            continue;
        }
        // Règle d'équilibre : pas plus de 9 dezenas dans la moitié basse.
        let low_count = grille.numbers().iter().filter(|&&n| n <= 10).count();
        if low_count > 9 {
            continue;
        }
        if !seen.insert(grille.clone()) {
            continue;
        }
        grilles.push(grille);
    }

    Ok(grilles)
}

/// Écrit une grille par ligne, dezenas sur deux chiffres séparées par des
/// espaces : le format lu par l'échantillonneur.
pub fn write_grilles(path: &Path, grilles: &[Grille]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Impossible d'écrire {:?}", path))?;
    for grille in grilles {
        writeln!(file, "{}", grille)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(concurso: u32, numbers: [u8; 15]) -> Draw {
        Draw {
            concurso,
            date: format!("2024-01-{:02}", (concurso % 28) + 1),
            numbers,
        }
    }

    fn sample_draws() -> Vec<Draw> {
        vec![
            draw(3, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]),
            draw(2, [11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25]),
            draw(1, [1, 3, 5, 7, 9, 11, 13, 15, 17, 19, 21, 23, 25, 2, 4]),
        ]
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let probs = build_probabilities(&sample_draws(), 2);
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(probs.iter().all(|&p| p > 0.0));
    }

    #[test]
    fn test_probabilities_favor_high_numbers() {
        // Les dezenas 10 et 20 ont la même fréquence dans la base d'essai ;
        // seule 20 reçoit le coup de pouce.
        let probs = build_probabilities(&sample_draws(), 3);
        assert!(probs[19] > probs[9]);
    }

    #[test]
    fn test_generate_count_and_validity() {
        let grilles = generate_candidates(&sample_draws(), 2, 50, 6, 42).unwrap();
        assert_eq!(grilles.len(), 50);
        for g in &grilles {
            assert!(g.max_run() <= 6);
            assert!(g.numbers().iter().filter(|&&n| n <= 10).count() <= 9);
        }
    }

    #[test]
    fn test_generate_no_duplicates() {
        let grilles = generate_candidates(&sample_draws(), 2, 100, 6, 42).unwrap();
        let unique: HashSet<_> = grilles.iter().collect();
        assert_eq!(unique.len(), grilles.len());
    }

    #[test]
    fn test_generate_deterministic() {
        let a = generate_candidates(&sample_draws(), 2, 20, 6, 7).unwrap();
        let b = generate_candidates(&sample_draws(), 2, 20, 6, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_write_then_read_format() {
        let grilles = generate_candidates(&sample_draws(), 2, 5, 6, 42).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combinaisons.csv");
        write_grilles(&path, &grilles).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 5);
        for line in lines {
            let parsed: Vec<u8> = line
                .split_whitespace()
                .map(|s| s.parse::<u8>().unwrap())
                .collect();
            assert!(Grille::new(&parsed).is_ok());
        }
    }
}
