use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

use crate::models::{Draw, PICK_COUNT};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    concurso  INTEGER PRIMARY KEY,
    date      TEXT NOT NULL,
    d1        INTEGER NOT NULL,
    d2        INTEGER NOT NULL,
    d3        INTEGER NOT NULL,
    d4        INTEGER NOT NULL,
    d5        INTEGER NOT NULL,
    d6        INTEGER NOT NULL,
    d7        INTEGER NOT NULL,
    d8        INTEGER NOT NULL,
    d9        INTEGER NOT NULL,
    d10       INTEGER NOT NULL,
    d11       INTEGER NOT NULL,
    d12       INTEGER NOT NULL,
    d13       INTEGER NOT NULL,
    d14       INTEGER NOT NULL,
    d15       INTEGER NOT NULL
);
";

const DEZENA_COLS: &str = "d1, d2, d3, d4, d5, d6, d7, d8, d9, d10, d11, d12, d13, d14, d15";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("lotofacil.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let sql = format!(
        "INSERT OR IGNORE INTO draws (concurso, date, {})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        DEZENA_COLS
    );
    let changed = conn
        .execute(
            &sql,
            rusqlite::params![
                draw.concurso,
                draw.date,
                draw.numbers[0],
                draw.numbers[1],
                draw.numbers[2],
                draw.numbers[3],
                draw.numbers[4],
                draw.numbers[5],
                draw.numbers[6],
                draw.numbers[7],
                draw.numbers[8],
                draw.numbers[9],
                draw.numbers[10],
                draw.numbers[11],
                draw.numbers[12],
                draw.numbers[13],
                draw.numbers[14],
            ],
        )
        .context("Échec de l'insertion")?;
    Ok(changed > 0)
}

/// Retourne les `limit` derniers tirages, le plus récent en premier.
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>> {
    let sql = format!(
        "SELECT concurso, date, {} FROM draws ORDER BY concurso DESC LIMIT ?1",
        DEZENA_COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let draws = stmt
        .query_map([limit], |row| {
            let mut numbers = [0u8; PICK_COUNT];
            for (i, n) in numbers.iter_mut().enumerate() {
                *n = row.get::<_, u8>(2 + i)?;
            }
            numbers.sort();
            Ok(Draw {
                concurso: row.get(0)?,
                date: row.get(1)?,
                numbers,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}
