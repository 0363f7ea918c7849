use lotofacil_db::models::Grille;

use crate::bands::{extract_features, BandModel};
use crate::config::{BandMode, DiversityConfig, Mode};
use crate::select::SelectionState;
use crate::stats::FrequencyStats;

/// Score sentinelle d'une grille rejetée par les bandes en mode hard.
pub const SCORE_REJECT: f64 = f64::NEG_INFINITY;

/// Tout ce que le score lit sans le modifier pendant un run.
pub struct ScoreContext<'a> {
    pub stats: &'a FrequencyStats,
    pub bands: &'a BandModel,
    /// Tirages récents, pour la punition de recouvrement.
    pub recent: &'a [Grille],
    pub mode: Mode,
    pub band_mode: BandMode,
    pub cfg: &'a DiversityConfig,
}

/// Score composite d'une candidate face à la sélection en cours.
/// Fonction pure : l'état n'est jamais modifié ici, seul le sélecteur écrit.
pub fn score_grille(grille: &Grille, ctx: &ScoreContext, state: &SelectionState) -> f64 {
    let cfg = ctx.cfg;

    // Rejet dur avant tout calcul : inutile de scorer une grille hors bandes.
    let features = extract_features(grille.numbers());
    if ctx.band_mode == BandMode::Hard && !ctx.bands.contains(&features) {
        return SCORE_REJECT;
    }

    let mut score = 0.0f64;

    // 1) Couverture : récompense les dezenas absentes des grilles choisies.
    let new_numbers = grille
        .numbers()
        .iter()
        .filter(|n| !state.union_coverage.contains(*n))
        .count();
    score += cfg.coverage_weight * new_numbers as f64;

    // 2) Recouvrement avec les tirages récents, au-delà de la tolérance du mode.
    let max_recent = ctx
        .recent
        .iter()
        .map(|d| grille.overlap(d))
        .max()
        .unwrap_or(0);
    let tolerance = cfg.recent_tolerance(ctx.mode);
    score -= cfg.overlap_weight * max_recent.saturating_sub(tolerance) as f64;

    // 3) Diversité face aux grilles déjà choisies.
    if !state.chosen.is_empty() {
        let max_overlap = state
            .chosen
            .iter()
            .map(|g| grille.overlap(g))
            .max()
            .unwrap_or(0);
        let max_jaccard = state
            .chosen
            .iter()
            .map(|g| grille.jaccard(g))
            .fold(0.0f64, f64::max);

        let mut penalty_overlap = cfg.overlap_weight * max_overlap as f64;
        if max_overlap >= cfg.overlap_target {
            // Punition exponentielle contre les quasi-clones.
            let extra = (max_overlap - cfg.overlap_target + 1) as i32;
            penalty_overlap *= cfg.overlap_escalation.powi(extra);
        }

        score -= penalty_overlap + cfg.jaccard_weight * max_jaccard;
    }

    // 4) Alignement quentes / frias.
    let hot_hits = grille
        .numbers()
        .iter()
        .filter(|&&n| ctx.stats.is_hot(n))
        .count();
    let cold_hits = grille
        .numbers()
        .iter()
        .filter(|&&n| ctx.stats.is_cold(n))
        .count();
    score += cfg.hot_weight(ctx.mode) * hot_hits as f64;
    score -= cfg.cold_weight(ctx.mode) * cold_hits as f64;

    // 5) Déviation de bandes en mode soft.
    if ctx.band_mode == BandMode::Soft {
        score -= cfg.band_weight * ctx.bands.soft_penalty(&features);
    }

    // 6) Séparation des modes : l'agressif tire vers les fréquences hautes,
    // le conservateur vers la moyenne de la population.
    let grille_mean = grille
        .numbers()
        .iter()
        .map(|&n| ctx.stats.freq[(n - 1) as usize])
        .sum::<f64>()
        / grille.numbers().len() as f64;
    let delta = grille_mean - ctx.stats.mean_freq;
    match ctx.mode {
        Mode::Aggressive => score += cfg.mode_separation_weight * delta,
        Mode::Conservative => score -= cfg.mode_separation_weight * delta.abs(),
    }

    score
}
