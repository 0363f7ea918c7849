use anyhow::{bail, Context, Result};
use lotofacil_db::rusqlite::Connection;
use std::path::Path;

use lotofacil_db::db::insert_draw;
use lotofacil_db::models::{validate_numbers, Draw, PICK_COUNT};

/// Format attendu : `Concurso;Data;D1;...;D15`, dates en JJ/MM/AAAA.
fn parse_record(record: &csv::StringRecord) -> Result<Draw> {
    let get = |idx: usize| -> Result<String> {
        record
            .get(idx)
            .map(|s| s.trim().to_string())
            .with_context(|| format!("Champ manquant à l'index {}", idx))
    };

    let get_u8 = |idx: usize| -> Result<u8> {
        let s = get(idx)?;
        s.parse::<u8>()
            .with_context(|| format!("Impossible de parser '{}' (index {})", s, idx))
    };

    let concurso: u32 = get(0)?
        .parse()
        .with_context(|| "Numéro de concours invalide".to_string())?;

    let raw_date = get(1)?;
    let date = parse_date(&raw_date)?;

    let mut numbers = [0u8; PICK_COUNT];
    for (i, n) in numbers.iter_mut().enumerate() {
        *n = get_u8(2 + i)?;
    }
    numbers.sort();
    validate_numbers(&numbers)?;

    Ok(Draw {
        concurso,
        date,
        numbers,
    })
}

fn parse_date(raw: &str) -> Result<String> {
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() != 3 {
        bail!("Format de date invalide: '{}'", raw);
    }
    Ok(format!("{}-{}-{}", parts[2], parts[1], parts[0]))
}

pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let tx = conn
        .unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult {
        total_records: 0,
        inserted: 0,
        skipped: 0,
        errors: 0,
    };

    for record_result in reader.records() {
        result.total_records += 1;
        match record_result {
            Ok(record) => match parse_record(&record) {
                Ok(draw) => match insert_draw(&tx, &draw) {
                    Ok(true) => result.inserted += 1,
                    Ok(false) => result.skipped += 1,
                    Err(e) => {
                        eprintln!("Erreur insertion concours ligne {}: {}", result.total_records, e);
                        result.errors += 1;
                    }
                },
                Err(e) => {
                    eprintln!("Erreur parsing ligne {}: {}", result.total_records, e);
                    result.errors += 1;
                }
            },
            Err(e) => {
                eprintln!("Erreur lecture ligne {}: {}", result.total_records, e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("17/02/2026").unwrap(), "2026-02-17");
        assert_eq!(parse_date("01/01/2020").unwrap(), "2020-01-01");
        assert!(parse_date("2020-01-01").is_err());
    }

    #[test]
    fn test_parse_record_ok() {
        let record = csv::StringRecord::from(vec![
            "3000", "05/01/2024", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12",
            "13", "14", "15",
        ]);
        let draw = parse_record(&record).unwrap();
        assert_eq!(draw.concurso, 3000);
        assert_eq!(draw.date, "2024-01-05");
        assert_eq!(draw.numbers, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);
    }

    #[test]
    fn test_parse_record_unsorted_input() {
        let record = csv::StringRecord::from(vec![
            "3001", "06/01/2024", "25", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12",
            "13", "14", "1",
        ]);
        let draw = parse_record(&record).unwrap();
        assert_eq!(draw.numbers[0], 1);
        assert_eq!(draw.numbers[14], 25);
    }

    #[test]
    fn test_parse_record_rejects_duplicates() {
        let record = csv::StringRecord::from(vec![
            "3002", "07/01/2024", "1", "1", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12",
            "13", "14", "15",
        ]);
        assert!(parse_record(&record).is_err());
    }

    #[test]
    fn test_parse_record_rejects_out_of_range() {
        let record = csv::StringRecord::from(vec![
            "3003", "08/01/2024", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12",
            "13", "14", "26",
        ]);
        assert!(parse_record(&record).is_err());
    }

    #[test]
    fn test_parse_record_missing_column() {
        let record = csv::StringRecord::from(vec!["3004", "09/01/2024", "1", "2", "3"]);
        assert!(parse_record(&record).is_err());
    }
}
