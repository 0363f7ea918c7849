use lotofacil_db::models::{Draw, POOL_SIZE};

#[derive(Debug, Clone)]
pub struct NumberStats {
    pub number: u8,
    pub frequency: u32,
    pub gap: u32,
}

/// Fréquence et retard de chaque dezena sur les tirages fournis.
/// `draws[0]` = tirage le plus récent ; le retard est le nombre de tirages
/// depuis la dernière apparition (0 = sorti au dernier concours).
pub fn compute_stats(draws: &[Draw]) -> Vec<NumberStats> {
    let mut stats: Vec<NumberStats> = (1..=POOL_SIZE)
        .map(|n| NumberStats {
            number: n,
            frequency: 0,
            gap: u32::MAX,
        })
        .collect();

    for (i, draw) in draws.iter().enumerate() {
        for &n in &draw.numbers {
            let stat = &mut stats[(n - 1) as usize];
            stat.frequency += 1;
            if stat.gap == u32::MAX {
                stat.gap = i as u32;
            }
        }
    }

    for stat in &mut stats {
        if stat.gap == u32::MAX {
            stat.gap = draws.len() as u32;
        }
    }

    stats
}
