use anyhow::{Context, Result, bail};
use pais_db::rusqlite::Connection;
use std::path::Path;
use tracing::{info, warn};

use pais_db::db::insert_draw;
use pais_db::models::Draw;

const MIN_FIELDS: usize = 9;

/// Décode le fichier : UTF-8 (BOM éventuel retiré), sinon encodage mono-octet.
/// Seuls les chiffres ASCII comptent pour le parsing, le repli Latin-1 suffit
/// pour les exports en cp1255.
pub fn decode_history(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Colonnes : 0 = identifiant, 2..=7 = numéros principaux, 8 = numéro fort.
fn parse_record(record: &csv::StringRecord) -> Result<Draw> {
    if record.len() < MIN_FIELDS {
        bail!("{} champs, {} attendus", record.len(), MIN_FIELDS);
    }

    let get = |idx: usize| -> Result<&str> {
        record
            .get(idx)
            .map(str::trim)
            .with_context(|| format!("Champ manquant à l'index {}", idx))
    };

    let draw_id: u32 = get(0)?
        .parse()
        .with_context(|| format!("Identifiant invalide '{}'", record.get(0).unwrap_or_default()))?;

    let mut mains = [0u8; 6];
    for (i, slot) in mains.iter_mut().enumerate() {
        let s = get(i + 2)?;
        *slot = s
            .parse::<u8>()
            .with_context(|| format!("Impossible de parser '{}' (index {})", s, i + 2))?;
    }

    let raw_strong = get(8)?;
    if raw_strong.is_empty() {
        bail!("Numéro fort absent");
    }
    let strong = raw_strong
        .parse::<u8>()
        .with_context(|| format!("Numéro fort invalide '{}'", raw_strong))?;

    Draw::new(draw_id, mains, strong)
}

pub struct CsvHistory {
    pub draws: Vec<Draw>,
    pub total_records: u32,
    pub errors: u32,
}

/// Lit l'historique ; les lignes invalides sont ignorées et comptées.
pub fn read_history(text: &str) -> CsvHistory {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut history = CsvHistory {
        draws: Vec::new(),
        total_records: 0,
        errors: 0,
    };

    for record_result in reader.records() {
        history.total_records += 1;
        let line = history.total_records;
        match record_result {
            Ok(record) => match parse_record(&record) {
                Ok(draw) => history.draws.push(draw),
                Err(e) => {
                    warn!(line, "ligne ignorée : {e:#}");
                    history.errors += 1;
                }
            },
            Err(e) => {
                warn!(line, "erreur de lecture : {e}");
                history.errors += 1;
            }
        }
    }

    history.draws.sort_by_key(|d| d.draw_id);
    history
}

pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    let history = read_history(&decode_history(&bytes));

    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult {
        total_records: history.total_records,
        inserted: 0,
        skipped: 0,
        errors: history.errors,
    };

    for draw in &history.draws {
        match insert_draw(&tx, draw) {
            Ok(true) => result.inserted += 1,
            Ok(false) => result.skipped += 1,
            Err(e) => {
                warn!(draw_id = draw.draw_id, "erreur insertion : {e:#}");
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    info!(
        inserted = result.inserted,
        skipped = result.skipped,
        errors = result.errors,
        "import terminé"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pais_db::db::{count_draws, fetch_history, migrate};

    const CSV: &str = "\
id,date,n1,n2,n3,n4,n5,n6,strong
3,2024-01-08,30,2,17,9,1,25,4
1,2024-01-01,1,2,3,4,5,6,7
2,2024-01-04,10,11,12,13,14,15,
4,2024-01-11,1,2,3,4,5,38,1
5,2024-01-15,1,1,3,4,5,6,1
6,2024-01-18,x,2,3,4,5,6,1
7,2024-01-22,1,2
";

    #[test]
    fn test_read_history_skips_invalid_rows() {
        let history = read_history(CSV);
        assert_eq!(history.total_records, 7);
        assert_eq!(history.errors, 5);
        let ids: Vec<u32> = history.draws.iter().map(|d| d.draw_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(history.draws[1].mains, [1, 2, 9, 17, 25, 30]);
        assert_eq!(history.draws[1].strong, 4);
    }

    #[test]
    fn test_decode_utf8_bom() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice(CSV.as_bytes());
        let text = decode_history(&bytes);
        assert!(text.starts_with("id,"));
    }

    #[test]
    fn test_decode_single_byte_fallback() {
        // 0xE0 = "א" en cp1255, invalide en UTF-8
        let bytes = b"id,\xE0\xE1,n1,n2,n3,n4,n5,n6,strong\n1,x,1,2,3,4,5,6,7\n";
        let history = read_history(&decode_history(bytes));
        assert_eq!(history.draws.len(), 1);
        assert_eq!(history.errors, 0);
    }

    #[test]
    fn test_import_into_db() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lotto-history.csv");
        std::fs::write(&path, CSV).unwrap();

        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        let first = import_csv(&conn, &path).unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!(first.errors, 5);

        let second = import_csv(&conn, &path).unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 2);

        assert_eq!(count_draws(&conn).unwrap(), 2);
        assert_eq!(fetch_history(&conn).unwrap()[0].draw_id, 1);
    }
}
