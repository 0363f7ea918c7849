use std::cmp::Ordering;
use std::collections::BTreeSet;

use rayon::prelude::*;

use lotofacil_db::models::{Grille, POOL_SIZE};

use crate::score::{score_grille, ScoreContext, SCORE_REJECT};

/// État de la sélection en cours. Possédé exclusivement par le sélecteur ;
/// le score ne fait que le lire.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    pub chosen: Vec<Grille>,
    pub union_coverage: BTreeSet<u8>,
    pub pick_counts: [u32; POOL_SIZE as usize],
}

impl SelectionState {
    pub fn new() -> SelectionState {
        SelectionState::default()
    }

    pub fn record(&mut self, grille: Grille) {
        for &n in grille.numbers() {
            self.union_coverage.insert(n);
            self.pick_counts[(n - 1) as usize] += 1;
        }
        self.chosen.push(grille);
    }
}

/// Une grille retenue, avec le score qu'elle avait au moment de son choix.
#[derive(Debug, Clone)]
pub struct Finalist {
    pub grille: Grille,
    pub score: f64,
}

/// Sélection gloutonne : à chaque tour, rescorer tout le pool restant face à
/// l'état courant, retenir le maximum, mettre à jour l'état et retirer la
/// grille du pool. Les égalités de score sont départagées par le tuple trié
/// des dezenas (le plus petit gagne), pour un résultat déterministe.
///
/// Peut retourner moins de `count` grilles : pool épuisé, ou plus aucune
/// candidate acceptée par les bandes en mode hard. C'est à l'appelant de
/// vérifier la longueur.
pub fn select_finalists(mut pool: Vec<Grille>, count: usize, ctx: &ScoreContext) -> Vec<Finalist> {
    let mut state = SelectionState::new();
    let mut finalists = Vec::with_capacity(count.min(pool.len()));

    while finalists.len() < count && !pool.is_empty() {
        let best = pool
            .par_iter()
            .enumerate()
            .map(|(i, g)| (i, score_grille(g, ctx, &state)))
            .reduce_with(|a, b| better(a, b, &pool));

        let Some((idx, score)) = best else { break };
        if score == SCORE_REJECT {
            // Mode hard : plus aucune candidate dans les bandes.
            break;
        }

        let grille = pool.swap_remove(idx);
        state.record(grille.clone());
        finalists.push(Finalist { grille, score });
    }

    finalists
}

/// Ordre total sur (score, dezenas) : la réduction parallèle reste
/// déterministe quel que soit le découpage.
fn better(a: (usize, f64), b: (usize, f64), pool: &[Grille]) -> (usize, f64) {
    match a.1.partial_cmp(&b.1) {
        Some(Ordering::Greater) => a,
        Some(Ordering::Less) => b,
        _ => {
            if pool[a.0].numbers() <= pool[b.0].numbers() {
                a
            } else {
                b
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::BandModel;
    use crate::config::{BandMode, DiversityConfig, Mode};
    use crate::stats::FrequencyStats;
    use lotofacil_db::models::Draw;

    fn draw(concurso: u32, numbers: [u8; 15]) -> Draw {
        Draw {
            concurso,
            date: format!("2024-01-{:02}", (concurso % 28) + 1),
            numbers,
        }
    }

    fn grille(v: &[u8]) -> Grille {
        Grille::new(v).unwrap()
    }

    fn sample_draws() -> Vec<Draw> {
        vec![
            draw(4, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]),
            draw(3, [1, 2, 3, 4, 5, 11, 12, 13, 14, 15, 21, 22, 23, 24, 25]),
            draw(2, [1, 3, 5, 7, 9, 11, 13, 15, 17, 19, 21, 23, 25, 2, 4]),
            draw(1, [2, 4, 6, 8, 10, 12, 14, 16, 18, 20, 22, 24, 1, 3, 5]),
        ]
    }

    fn sample_pool() -> Vec<Grille> {
        vec![
            grille(&[1, 2, 3, 4, 6, 7, 8, 9, 11, 12, 13, 16, 17, 21, 22]),
            grille(&[2, 3, 4, 5, 7, 8, 9, 10, 12, 13, 14, 18, 19, 23, 24]),
            grille(&[1, 4, 5, 6, 8, 10, 11, 14, 15, 16, 18, 20, 21, 24, 25]),
            grille(&[3, 5, 6, 7, 9, 10, 11, 13, 15, 17, 19, 20, 22, 23, 25]),
            grille(&[1, 2, 5, 6, 9, 10, 12, 14, 16, 17, 19, 20, 21, 23, 25]),
            grille(&[2, 4, 6, 8, 9, 11, 13, 15, 16, 18, 20, 22, 23, 24, 25]),
        ]
    }

    struct Fixture {
        stats: FrequencyStats,
        bands: BandModel,
        recent: Vec<Grille>,
        cfg: DiversityConfig,
    }

    impl Fixture {
        fn new() -> Fixture {
            let draws = sample_draws();
            Fixture {
                stats: FrequencyStats::build(&draws, 4, 7).unwrap(),
                bands: BandModel::build(&draws, 4, 1.0).unwrap(),
                recent: draws.iter().map(Grille::from_draw).collect(),
                cfg: DiversityConfig::coverage(),
            }
        }

        fn ctx(&self, mode: Mode, band_mode: BandMode) -> ScoreContext<'_> {
            ScoreContext {
                stats: &self.stats,
                bands: &self.bands,
                recent: &self.recent,
                mode,
                band_mode,
                cfg: &self.cfg,
            }
        }
    }

    #[test]
    fn test_returns_requested_count() {
        let fx = Fixture::new();
        let ctx = fx.ctx(Mode::Conservative, BandMode::Off);
        let finalists = select_finalists(sample_pool(), 3, &ctx);
        assert_eq!(finalists.len(), 3);
    }

    #[test]
    fn test_pool_exhaustion_returns_fewer() {
        let fx = Fixture::new();
        let ctx = fx.ctx(Mode::Conservative, BandMode::Off);
        let finalists = select_finalists(sample_pool(), 50, &ctx);
        assert_eq!(finalists.len(), sample_pool().len());
    }

    #[test]
    fn test_no_duplicate_finalists() {
        let fx = Fixture::new();
        let ctx = fx.ctx(Mode::Conservative, BandMode::Off);
        let finalists = select_finalists(sample_pool(), 6, &ctx);
        for i in 0..finalists.len() {
            for j in (i + 1)..finalists.len() {
                assert_ne!(finalists[i].grille, finalists[j].grille);
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let fx = Fixture::new();
        let ctx = fx.ctx(Mode::Conservative, BandMode::Soft);
        let a = select_finalists(sample_pool(), 4, &ctx);
        let b = select_finalists(sample_pool(), 4, &ctx);
        let na: Vec<_> = a.iter().map(|f| f.grille.clone()).collect();
        let nb: Vec<_> = b.iter().map(|f| f.grille.clone()).collect();
        assert_eq!(na, nb);
    }

    #[test]
    fn test_tie_break_lexicographic() {
        // Pool de deux grilles parfaitement symétriques pour le score
        // (aucune statistique ne les distingue) : la plus petite au sens
        // lexicographique doit sortir en premier.
        let draws = vec![
            draw(2, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]),
            draw(1, [11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25]),
        ];
        let stats = FrequencyStats::build(&draws, 2, 0).unwrap();
        let bands = BandModel::build(&draws, 2, 1.0).unwrap();
        let cfg = DiversityConfig::default();
        let ctx = ScoreContext {
            stats: &stats,
            bands: &bands,
            recent: &[],
            mode: Mode::Aggressive,
            band_mode: BandMode::Off,
            cfg: &cfg,
        };

        // Images miroir l'une de l'autre : mêmes fréquences cumulées.
        let a = grille(&[1, 2, 3, 4, 5, 6, 7, 11, 12, 13, 14, 15, 16, 17, 18]);
        let b = grille(&[8, 9, 10, 11, 12, 13, 14, 15, 19, 20, 21, 22, 23, 24, 25]);
        let sa = score_grille(&a, &ctx, &SelectionState::new());
        let sb = score_grille(&b, &ctx, &SelectionState::new());
        assert_eq!(sa, sb, "le test suppose des scores égaux : {sa} vs {sb}");

        let finalists = select_finalists(vec![b.clone(), a.clone()], 1, &ctx);
        assert_eq!(finalists[0].grille, a);
    }

    #[test]
    fn test_hard_band_dead_end_stops_early() {
        let fx = Fixture::new();
        let ctx = fx.ctx(Mode::Conservative, BandMode::Hard);
        // Toutes les candidates sont très loin des bandes des tirages d'essai.
        let pool = vec![
            grille(&[11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25]),
            grille(&[10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24]),
        ];
        let finalists = select_finalists(pool, 2, &ctx);
        assert!(finalists.is_empty());
    }

    #[test]
    fn test_hard_band_never_returns_out_of_band() {
        let fx = Fixture::new();
        let ctx = fx.ctx(Mode::Conservative, BandMode::Hard);
        let mut pool = sample_pool();
        pool.push(grille(&[11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25]));

        let finalists = select_finalists(pool, 10, &ctx);
        for f in &finalists {
            let features = crate::bands::extract_features(f.grille.numbers());
            assert!(fx.bands.contains(&features));
        }
    }

    #[test]
    fn test_coverage_preset_limits_similarity() {
        let fx = Fixture::new();
        let ctx = fx.ctx(Mode::Conservative, BandMode::Off);
        let finalists = select_finalists(sample_pool(), 4, &ctx);

        // Avec le preset coverage sur ce pool synthétique, aucun couple de
        // finalistes ne doit approcher le clonage (cible overlap = 10,
        // soit Jaccard 0.5).
        for i in 0..finalists.len() {
            for j in (i + 1)..finalists.len() {
                let jac = finalists[i].grille.jaccard(&finalists[j].grille);
                assert!(
                    jac <= 0.5 + 1e-9,
                    "finalistes {} et {} trop proches (jaccard {:.3})",
                    i,
                    j,
                    jac
                );
            }
        }
    }

    #[test]
    fn test_selection_state_bookkeeping() {
        let mut state = SelectionState::new();
        state.record(grille(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]));
        state.record(grille(&[11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25]));

        assert_eq!(state.chosen.len(), 2);
        assert_eq!(state.union_coverage.len(), 25);
        let total: u32 = state.pick_counts.iter().sum();
        assert_eq!(total, 30);
        assert_eq!(state.pick_counts[10], 2); // dezena 11, choisie deux fois
        assert_eq!(state.pick_counts[0], 1);
    }

    #[test]
    fn test_empty_pool_gives_empty_result() {
        let fx = Fixture::new();
        let ctx = fx.ctx(Mode::Conservative, BandMode::Off);
        let finalists = select_finalists(Vec::new(), 5, &ctx);
        assert!(finalists.is_empty());
    }

    #[test]
    fn test_two_pick_trace_handmade() {
        // Trace vérifiable à la main : deux candidates seulement.
        // La première retenue est celle au meilleur score isolé ; la seconde
        // est l'autre, et la couverture de l'état doit être l'union des deux.
        let fx = Fixture::new();
        let ctx = fx.ctx(Mode::Conservative, BandMode::Off);
        let a = grille(&[1, 2, 3, 4, 6, 7, 8, 9, 11, 12, 13, 16, 17, 21, 22]);
        let b = grille(&[3, 5, 6, 7, 9, 10, 11, 13, 15, 17, 19, 20, 22, 23, 25]);

        let empty = SelectionState::new();
        let sa = score_grille(&a, &ctx, &empty);
        let sb = score_grille(&b, &ctx, &empty);
        let expected_first = if sa > sb || (sa == sb && a.numbers() <= b.numbers()) {
            a.clone()
        } else {
            b.clone()
        };

        let finalists = select_finalists(vec![a.clone(), b.clone()], 2, &ctx);
        assert_eq!(finalists.len(), 2);
        assert_eq!(finalists[0].grille, expected_first);
        assert_ne!(finalists[1].grille, finalists[0].grille);
        assert_eq!(finalists[0].score, sa.max(sb));
    }

    #[test]
    fn test_modes_produce_different_selections() {
        // Sur un pool contrasté, l'agressif et le conservateur ne doivent pas
        // retenir la même première grille.
        let draws = sample_draws();
        let stats = FrequencyStats::build(&draws, 4, 7).unwrap();
        let bands = BandModel::build(&draws, 4, 1.0).unwrap();
        // Neutralise tout sauf le terme de séparation de modes.
        let recent: Vec<Grille> = Vec::new();
        let mut cfg = DiversityConfig::coverage();
        cfg.mode_separation_weight = 5.0;
        cfg.hot_weight_aggressive = 0.0;
        cfg.hot_weight_conservative = 0.0;
        cfg.cold_weight_aggressive = 0.0;
        cfg.cold_weight_conservative = 0.0;

        // Une grille très « quente » et une grille au profil moyen.
        let hot_heavy = grille(&[1, 2, 3, 4, 5, 7, 9, 11, 12, 13, 14, 15, 21, 23, 25]);
        let balanced = grille(&[1, 2, 6, 7, 8, 10, 11, 14, 16, 17, 19, 20, 22, 24, 25]);
        let pool = vec![hot_heavy.clone(), balanced.clone()];

        let ctx_a = ScoreContext {
            stats: &stats,
            bands: &bands,
            recent: &recent,
            mode: Mode::Aggressive,
            band_mode: BandMode::Off,
            cfg: &cfg,
        };
        let ctx_c = ScoreContext {
            stats: &stats,
            bands: &bands,
            recent: &recent,
            mode: Mode::Conservative,
            band_mode: BandMode::Off,
            cfg: &cfg,
        };

        let first_a = select_finalists(pool.clone(), 1, &ctx_a);
        let first_c = select_finalists(pool.clone(), 1, &ctx_c);
        assert_eq!(first_a[0].grille, hot_heavy);
        assert_eq!(first_c[0].grille, balanced);
    }
}
