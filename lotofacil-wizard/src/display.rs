use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use textplots::Plot;

use lotofacil_db::models::POOL_SIZE;

use crate::backtest::BacktestRow;
use crate::bands::{Band, BandModel};
use crate::sampler::ScanReport;
use crate::select::Finalist;
use crate::stats::FrequencyStats;

pub fn display_scan_report(report: &ScanReport, pool_len: usize) {
    println!("Balayage de la source terminé :");
    println!("  Lignes lues        : {}", report.scanned);
    println!("  Valides            : {}", report.valid);
    println!("  Mal formées        : {}", report.malformed);
    println!("  Tirages exclus     : {}", report.excluded);
    println!("  Suites trop longues: {}", report.run_rejected);
    println!("  Pool retenu        : {}", pool_len);
}

pub fn display_finalists(finalists: &[Finalist]) {
    println!("\n🎲 Grilles sélectionnées\n");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Dezenas", "Score au choix"]);

    for (i, f) in finalists.iter().enumerate() {
        table.add_row(vec![
            &format!("{:02}", i + 1),
            &f.grille.to_string(),
            &format!("{:.4}", f.score),
        ]);
    }
    println!("{table}");
}

pub fn display_bands(bands: &BandModel) {
    println!("\n📊 Bandes typiques sur les {} derniers tirages\n", bands.window);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Caractéristique", "Moyenne", "Écart-type", "Basse", "Haute"]);

    let mut add = |name: &str, band: &Band| {
        table.add_row(vec![
            name.to_string(),
            format!("{:.2}", band.mean),
            format!("{:.2}", band.std_dev),
            format!("{:.2}", band.low),
            format!("{:.2}", band.high),
        ]);
    };

    add("Somme", &bands.sum);
    add("Paires", &bands.even_count);
    for (i, band) in bands.lines.iter().enumerate() {
        add(&format!("Ligne {} ({:02}-{:02})", i + 1, i * 5 + 1, i * 5 + 5), band);
    }
    add("Suite max", &bands.max_run);

    println!("{table}");
}

pub fn display_wizard_stats(stats: &FrequencyStats) {
    println!("\n🎯 Fréquences sur les {} derniers tirages\n", stats.window);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Dezena", "Apparitions", "Fréquence", "Tag"]);

    let mut order: Vec<u8> = (1..=POOL_SIZE).collect();
    order.sort_by(|a, b| {
        stats.counts[(*b - 1) as usize]
            .cmp(&stats.counts[(*a - 1) as usize])
            .then(a.cmp(b))
    });

    for n in order {
        let idx = (n - 1) as usize;
        let (tag, color) = if stats.is_hot(n) {
            ("QUENTE", Color::Green)
        } else if stats.is_cold(n) {
            ("FRIA", Color::Red)
        } else {
            ("-", Color::White)
        };
        table.add_row(vec![
            Cell::new(format!("{:2}", n)),
            Cell::new(stats.counts[idx].to_string()),
            Cell::new(format!("{:.4}", stats.freq[idx])),
            Cell::new(tag).fg(color),
        ]);
    }
    println!("{table}");

    display_frequency_chart(stats);
}

fn display_frequency_chart(stats: &FrequencyStats) {
    println!("\n== Fréquence par dezena ==\n");

    let points: Vec<(f32, f32)> = stats
        .freq
        .iter()
        .enumerate()
        .map(|(i, &f)| ((i + 1) as f32, f as f32))
        .collect();

    let y_max = stats.freq.iter().cloned().fold(0.0f64, f64::max) as f32 + 0.05;
    let shape = textplots::Shape::Points(&points);
    let mut chart = textplots::Chart::new_with_y_range(120, 40, 1.0, POOL_SIZE as f32, 0.0, y_max);
    println!("{}", chart.lineplot(&shape));
}

pub fn display_backtest(rows: &[BacktestRow], window: usize) {
    println!("\n📊 Backtest sur les {} derniers tirages\n", window);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Grille", "Dezenas", "Moyenne", "Max", "Min", "11", "12", "13", "14", "15",
        ]);

    for row in rows {
        table.add_row(vec![
            format!("{:02}", row.index),
            row.grille.to_string(),
            format!("{:.2}", row.mean_hits),
            row.max_hits.to_string(),
            row.min_hits.to_string(),
            row.prize_counts[0].to_string(),
            row.prize_counts[1].to_string(),
            row.prize_counts[2].to_string(),
            row.prize_counts[3].to_string(),
            row.prize_counts[4].to_string(),
        ]);
    }
    println!("{table}");

    println!("\nLégende :");
    println!("- Moyenne : acertos moyens de la grille sur les tirages analysés");
    println!("- Colonnes 11..15 : nombre de tirages où la grille aurait fait 11, 12... points");
}
