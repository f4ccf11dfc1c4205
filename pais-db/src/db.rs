use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

use crate::models::Draw;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    draw_id  INTEGER PRIMARY KEY,
    main_1   INTEGER NOT NULL,
    main_2   INTEGER NOT NULL,
    main_3   INTEGER NOT NULL,
    main_4   INTEGER NOT NULL,
    main_5   INTEGER NOT NULL,
    main_6   INTEGER NOT NULL,
    strong   INTEGER NOT NULL
);
";

const SELECT_DRAW: &str =
    "SELECT draw_id, main_1, main_2, main_3, main_4, main_5, main_6, strong FROM draws";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("pais.db");
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
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (draw_id, main_1, main_2, main_3, main_4, main_5, main_6, strong)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            draw.draw_id,
            draw.mains[0],
            draw.mains[1],
            draw.mains[2],
            draw.mains[3],
            draw.mains[4],
            draw.mains[5],
            draw.strong,
        ],
    ).context("Échec de l'insertion")?;
    Ok(changed > 0)
}

fn row_to_draw(row: &rusqlite::Row<'_>) -> rusqlite::Result<Draw> {
    Ok(Draw {
        draw_id: row.get(0)?,
        mains: [
            row.get::<_, u8>(1)?,
            row.get::<_, u8>(2)?,
            row.get::<_, u8>(3)?,
            row.get::<_, u8>(4)?,
            row.get::<_, u8>(5)?,
            row.get::<_, u8>(6)?,
        ],
        strong: row.get(7)?,
    })
}

/// Historique complet, du plus ancien au plus récent (ordre attendu par le moteur).
pub fn fetch_history(conn: &Connection) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!("{SELECT_DRAW} ORDER BY draw_id ASC"))?;
    let draws = stmt
        .query_map([], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()
        .context("Échec de la lecture de l'historique")?;
    Ok(draws)
}

/// Derniers tirages, du plus récent au plus ancien.
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!("{SELECT_DRAW} ORDER BY draw_id DESC LIMIT ?1"))?;
    let draws = stmt
        .query_map([limit], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_draw(id: u32) -> Draw {
        Draw::new(id, [1, 2, 3, 4, 5, 6], 1).unwrap()
    }

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_count() {
        let conn = memory_db();
        assert_eq!(count_draws(&conn).unwrap(), 0);

        insert_draw(&conn, &test_draw(1)).unwrap();
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_ignored() {
        let conn = memory_db();

        let inserted = insert_draw(&conn, &test_draw(1)).unwrap();
        assert!(inserted);
        let inserted = insert_draw(&conn, &test_draw(1)).unwrap();
        assert!(!inserted);
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_history_ascending() {
        let conn = memory_db();

        insert_draw(&conn, &test_draw(3)).unwrap();
        insert_draw(&conn, &test_draw(1)).unwrap();
        insert_draw(&conn, &test_draw(2)).unwrap();

        let ids: Vec<u32> = fetch_history(&conn).unwrap().iter().map(|d| d.draw_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_fetch_last_order() {
        let conn = memory_db();

        insert_draw(&conn, &test_draw(1)).unwrap();
        insert_draw(&conn, &test_draw(5)).unwrap();
        insert_draw(&conn, &test_draw(3)).unwrap();

        let draws = fetch_last_draws(&conn, 2).unwrap();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].draw_id, 5);
        assert_eq!(draws[1].draw_id, 3);
    }

    #[test]
    fn test_roundtrip_preserves_numbers() {
        let conn = memory_db();
        let draw = Draw::new(42, [37, 5, 12, 19, 28, 33], 7).unwrap();
        insert_draw(&conn, &draw).unwrap();

        let history = fetch_history(&conn).unwrap();
        assert_eq!(history, vec![draw]);
    }
}
