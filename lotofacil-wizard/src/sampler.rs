use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use lotofacil_db::models::Grille;

use crate::error::WizardError;

/// Bilan du balayage de la source de combinaisons.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub scanned: u64,
    pub malformed: u64,
    pub excluded: u64,
    pub run_rejected: u64,
    pub valid: u64,
}

/// Échantillonnage réservoir (algorithme R) sur la source de combinaisons,
/// en un seul passage et à mémoire bornée par `sample_size`.
///
/// Chaque ligne valide a la même probabilité `sample_size / total_valides`
/// d'être retenue, quel que soit l'ordre du fichier. Les lignes mal formées,
/// les combinaisons égales à un tirage exclu et celles dépassant `max_run`
/// sont filtrées pendant le balayage. Le résultat est dédoublonné ; une
/// source sans ligne valide donne une liste vide, pas une erreur.
pub fn sample_candidates(
    path: &Path,
    excluded: &HashSet<Grille>,
    max_run: usize,
    sample_size: usize,
    seed: u64,
) -> Result<(Vec<Grille>, ScanReport), WizardError> {
    let file = File::open(path).map_err(|_| WizardError::SourceNotFound(path.to_path_buf()))?;
    let reader = BufReader::new(file);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut reservoir: Vec<Grille> = Vec::with_capacity(sample_size);
    let mut report = ScanReport::default();

    for line in reader.lines() {
        report.scanned += 1;

        let line = match line {
            Ok(l) => l,
            Err(_) => {
                report.malformed += 1;
                continue;
            }
        };
        if line.trim().is_empty() {
            report.malformed += 1;
            continue;
        }

        let numbers: Result<Vec<u8>, _> =
            line.split_whitespace().map(|s| s.parse::<u8>()).collect();
        let grille = match numbers {
            Ok(v) => match Grille::new(&v) {
                Ok(g) => g,
                Err(_) => {
                    report.malformed += 1;
                    continue;
                }
            },
            Err(_) => {
                report.malformed += 1;
                continue;
            }
        };

        if excluded.contains(&grille) {
            report.excluded += 1;
            continue;
        }
        if grille.max_run() > max_run {
            report.run_rejected += 1;
            continue;
        }

        report.valid += 1;
        if reservoir.len() < sample_size {
            reservoir.push(grille);
        } else {
            // i-ème ligne valide (1-indexée) : remplace un slot uniforme
            // avec probabilité sample_size / i.
            let j = rng.random_range(0..report.valid);
            if (j as usize) < sample_size {
                reservoir[j as usize] = grille;
            }
        }
    }

    // La source peut contenir des doublons ; le pool n'en garde qu'un.
    let mut seen: HashSet<Grille> = HashSet::with_capacity(reservoir.len());
    let pool: Vec<Grille> = reservoir
        .into_iter()
        .filter(|g| seen.insert(g.clone()))
        .collect();

    Ok((pool, report))
}
