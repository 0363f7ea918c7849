use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use lotofacil_db::db::{count_draws, db_path, fetch_last_draws, migrate, open_db};
use lotofacil_db::models::{Draw, Grille};
use lotofacil_wizard::backtest::{parse_grilles_file, run_backtest};
use lotofacil_wizard::bands::BandModel;
use lotofacil_wizard::config::{
    date_seed, load_weights, BandMode, DiversityConfig, DiversityPreset, Mode, WizardConfig,
};
use lotofacil_wizard::display::{
    display_backtest, display_bands, display_finalists, display_scan_report, display_wizard_stats,
};
use lotofacil_wizard::error::WizardError;
use lotofacil_wizard::generate::{generate_candidates, write_grilles};
use lotofacil_wizard::sampler::sample_candidates;
use lotofacil_wizard::score::ScoreContext;
use lotofacil_wizard::select::select_finalists;
use lotofacil_wizard::stats::FrequencyStats;

#[derive(Parser)]
#[command(
    name = "lotofacil-wizard",
    about = "Sélection diversifiée de grilles Lotofácil"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sélectionner les grilles finales depuis la source de combinaisons
    Predict {
        /// Mode de jeu
        #[arg(short, long, default_value = "conservative")]
        mode: Mode,

        /// Fenêtre d'analyse (nombre de tirages récents)
        #[arg(short, long, default_value = "200")]
        window: u32,

        /// Nombre de grilles finales
        #[arg(short, long, default_value = "5")]
        finals: usize,

        /// Suite maximale de dezenas consécutives acceptée
        #[arg(long, default_value = "4")]
        max_run: usize,

        /// Taille de l'échantillon réservoir
        #[arg(long, default_value = "20000")]
        sample_size: usize,

        /// Seed pour la reproductibilité (défaut: date du jour YYYYMMDD)
        #[arg(long)]
        seed: Option<u64>,

        /// Taille des ensembles quentes/frias
        #[arg(long, default_value = "7")]
        hot: usize,

        /// Preset de diversité
        #[arg(short, long, default_value = "auto")]
        preset: DiversityPreset,

        /// Usage des bandes statistiques
        #[arg(short, long, default_value = "soft")]
        band_mode: BandMode,

        /// Largeur des bandes en écarts-types
        #[arg(long, default_value = "1.0")]
        k_std: f64,

        /// Fichier source des combinaisons candidates
        #[arg(long, default_value = "data/combinaisons.csv")]
        source: PathBuf,

        /// Fichier JSON de poids remplaçant le preset
        #[arg(long)]
        weights: Option<PathBuf>,

        /// Écrire les grilles retenues dans ce fichier
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Afficher fréquences, quentes et frias
    Stats {
        #[arg(short, long, default_value = "200")]
        window: u32,

        /// Taille des ensembles quentes/frias
        #[arg(long, default_value = "7")]
        hot: usize,
    },

    /// Afficher les bandes typiques des tirages récents
    Bands {
        #[arg(short, long, default_value = "200")]
        window: u32,

        #[arg(long, default_value = "1.0")]
        k_std: f64,
    },

    /// Générer le fichier de combinaisons candidates
    Generate {
        /// Nombre de combinaisons à produire
        #[arg(short, long, default_value = "20000")]
        count: usize,

        #[arg(short, long, default_value = "200")]
        window: u32,

        #[arg(long, default_value = "4")]
        max_run: usize,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(short, long, default_value = "data/combinaisons.csv")]
        output: PathBuf,
    },

    /// Confronter un fichier de grilles aux tirages passés
    Backtest {
        /// Fichier texte contenant les grilles (15 dezenas par ligne)
        file: PathBuf,

        #[arg(short, long, default_value = "200")]
        window: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Predict {
            mode,
            window,
            finals,
            max_run,
            sample_size,
            seed,
            hot,
            preset,
            band_mode,
            k_std,
            source,
            weights,
            output,
        } => {
            let config = WizardConfig {
                mode,
                window,
                finals,
                max_run,
                sample_size,
                seed: resolve_seed(seed),
                hot_count: hot,
                band_mode,
                k_std,
            };
            cmd_predict(&conn, &config, preset, weights.as_deref(), &source, output.as_deref())
        }
        Command::Stats { window, hot } => cmd_stats(&conn, window, hot),
        Command::Bands { window, k_std } => cmd_bands(&conn, window, k_std),
        Command::Generate {
            count,
            window,
            max_run,
            seed,
            output,
        } => cmd_generate(&conn, count, window, max_run, resolve_seed(seed), &output),
        Command::Backtest { file, window } => cmd_backtest(&conn, &file, window),
    }
}

fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        let ds = date_seed();
        println!("(Seed du jour : {ds})");
        ds
    })
}

fn load_window(conn: &lotofacil_db::rusqlite::Connection, window: u32) -> Result<Vec<Draw>> {
    let n = count_draws(conn)?;
    if n == 0 {
        bail!("Base vide. Lancez d'abord : lotofacil import");
    }
    Ok(fetch_last_draws(conn, window.min(n))?)
}

fn cmd_predict(
    conn: &lotofacil_db::rusqlite::Connection,
    config: &WizardConfig,
    preset: DiversityPreset,
    weights: Option<&std::path::Path>,
    source: &std::path::Path,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let draws = load_window(conn, config.window)?;

    let stats = FrequencyStats::build(&draws, config.window as usize, config.hot_count)?;
    let bands = BandModel::build(&draws, config.window as usize, config.k_std)?;

    let recent: Vec<Grille> = draws.iter().map(Grille::from_draw).collect();
    let excluded: HashSet<Grille> = recent.iter().cloned().collect();

    println!("🔍 Lecture des combinaisons : {}", source.display());
    let (pool, report) = sample_candidates(
        source,
        &excluded,
        config.max_run,
        config.sample_size,
        config.seed,
    )?;
    display_scan_report(&report, pool.len());

    if pool.is_empty() {
        return Err(WizardError::EmptyPool.into());
    }

    let div_cfg = match weights {
        Some(path) => {
            println!("(Poids chargés depuis {})", path.display());
            load_weights(path)?
        }
        None => DiversityConfig::resolve(preset, config.finals),
    };

    let ctx = ScoreContext {
        stats: &stats,
        bands: &bands,
        recent: &recent,
        mode: config.mode,
        band_mode: config.band_mode,
        cfg: &div_cfg,
    };

    let finalists = select_finalists(pool, config.finals, &ctx);

    if finalists.len() < config.finals {
        println!(
            "⚠️  Seulement {} grille(s) sur {} demandées : pool épuisé ou bandes trop strictes.",
            finalists.len(),
            config.finals
        );
    }
    if finalists.is_empty() {
        return Ok(());
    }

    display_finalists(&finalists);

    if let Some(path) = output {
        let grilles: Vec<Grille> = finalists.iter().map(|f| f.grille.clone()).collect();
        write_grilles(path, &grilles)?;
        println!("\nGrilles écrites dans : {}", path.display());
    }

    Ok(())
}

fn cmd_stats(conn: &lotofacil_db::rusqlite::Connection, window: u32, hot: usize) -> Result<()> {
    let draws = load_window(conn, window)?;
    let stats = FrequencyStats::build(&draws, window as usize, hot)?;
    display_wizard_stats(&stats);
    Ok(())
}

fn cmd_bands(conn: &lotofacil_db::rusqlite::Connection, window: u32, k_std: f64) -> Result<()> {
    let draws = load_window(conn, window)?;
    let bands = BandModel::build(&draws, window as usize, k_std)?;
    display_bands(&bands);
    Ok(())
}

fn cmd_generate(
    conn: &lotofacil_db::rusqlite::Connection,
    count: usize,
    window: u32,
    max_run: usize,
    seed: u64,
    output: &std::path::Path,
) -> Result<()> {
    let n = count_draws(conn)?;
    if n == 0 {
        bail!("Base vide. Lancez d'abord : lotofacil import");
    }
    // Toute la base : le mélange de fréquences pondère récent et historique.
    let draws = fetch_last_draws(conn, n)?;

    println!("🎲 Génération de {} combinaisons...", count);
    let grilles = generate_candidates(&draws, window as usize, count, max_run, seed)?;

    if grilles.len() < count {
        println!(
            "⚠️  Seulement {} combinaisons générées après filtrage.",
            grilles.len()
        );
    }

    write_grilles(output, &grilles)?;
    println!("💾 {} combinaisons écrites dans : {}", grilles.len(), output.display());
    Ok(())
}

fn cmd_backtest(
    conn: &lotofacil_db::rusqlite::Connection,
    file: &std::path::Path,
    window: u32,
) -> Result<()> {
    let draws = load_window(conn, window)?;
    let grilles = parse_grilles_file(file)?;

    let pb = ProgressBar::new(grilles.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=> "),
    );
    pb.set_message("backtest");

    // Grille par grille pour faire vivre la barre ; le travail par grille
    // reste borné par la fenêtre.
    let mut rows = Vec::with_capacity(grilles.len());
    for (i, grille) in grilles.iter().enumerate() {
        let mut batch = run_backtest(std::slice::from_ref(grille), &draws);
        if let Some(row) = batch.first_mut() {
            row.index = i + 1;
        }
        rows.append(&mut batch);
        pb.inc(1);
    }
    pb.finish_with_message("terminé");

    rows.sort_by(|a, b| {
        b.mean_hits
            .partial_cmp(&a.mean_hits)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    // Les index reflètent l'ordre du fichier d'entrée, pas le classement.
    display_backtest(&rows, draws.len());
    Ok(())
}
