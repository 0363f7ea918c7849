use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};

use lotofacil_db::models::{Draw, Grille, PICK_COUNT, POOL_SIZE};

/// Bilan d'une grille contre les tirages analysés.
#[derive(Debug, Clone)]
pub struct BacktestRow {
    pub index: usize,
    pub grille: Grille,
    pub mean_hits: f64,
    pub max_hits: u32,
    pub min_hits: u32,
    /// Nombre de tirages à 11, 12, 13, 14 et 15 acertos.
    pub prize_counts: [u32; 5],
}

/// Compte les acertos de chaque grille sur les tirages fournis, trié par
/// moyenne décroissante (à égalité, ordre d'entrée).
pub fn run_backtest(grilles: &[Grille], draws: &[Draw]) -> Vec<BacktestRow> {
    let mut rows: Vec<BacktestRow> = grilles
        .iter()
        .enumerate()
        .map(|(i, grille)| {
            let mut max_hits = 0u32;
            let mut min_hits = PICK_COUNT as u32;
            let mut total = 0u64;
            let mut prize_counts = [0u32; 5];

            for draw in draws {
                let hits = Grille::from_draw(draw).overlap(grille) as u32;
                max_hits = max_hits.max(hits);
                min_hits = min_hits.min(hits);
                total += hits as u64;
                if (11..=15).contains(&hits) {
                    prize_counts[(hits - 11) as usize] += 1;
                }
            }

            BacktestRow {
                index: i + 1,
                grille: grille.clone(),
                mean_hits: if draws.is_empty() {
                    0.0
                } else {
                    total as f64 / draws.len() as f64
                },
                max_hits,
                min_hits: if draws.is_empty() { 0 } else { min_hits },
                prize_counts,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.mean_hits
            .partial_cmp(&a.mean_hits)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rows
}

/// Lit un fichier de grilles au format libre : chaque ligne contenant au
/// moins 15 nombres valides compte, les 15 derniers sont retenus (pour
/// tolérer un préfixe « Grille 01 : »). Doublons retirés, ordre préservé.
pub fn parse_grilles_file(path: &Path) -> Result<Vec<Grille>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;

    let mut seen: HashSet<Grille> = HashSet::new();
    let mut grilles = Vec::new();

    for line in content.lines() {
        let nums: Vec<u8> = line
            .replace(':', " ")
            .split_whitespace()
            .filter_map(|s| s.parse::<u8>().ok())
            .filter(|&n| (1..=POOL_SIZE).contains(&n))
            .collect();

        if nums.len() < PICK_COUNT {
            continue;
        }
        let tail = &nums[nums.len() - PICK_COUNT..];
        let Ok(grille) = Grille::new(tail) else {
            continue;
        };
        if seen.insert(grille.clone()) {
            grilles.push(grille);
        }
    }

    if grilles.is_empty() {
        bail!("Aucune grille valide (15 dezenas) dans {:?}", path);
    }
    Ok(grilles)
}
