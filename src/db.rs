use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{types::ToSql, Connection, OptionalExtension};
use tracing::info;

use crate::parser::record::{BondKind, DrugRecord, Section, SectionFields};
use crate::writer;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {:?}", parent))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS drug (
            drug_id              TEXT PRIMARY KEY,
            drug_name            TEXT,
            identification       TEXT CHECK (json_valid(identification)),
            pharmacology         TEXT CHECK (json_valid(pharmacology)),
            interactions         TEXT CHECK (json_valid(interactions)),
            products             TEXT CHECK (json_valid(products)),
            categories           TEXT CHECK (json_valid(categories)),
            chemical_identifiers TEXT CHECK (json_valid(chemical_identifiers)),
            "references"         TEXT CHECK (json_valid("references")),
            clinical_trials      TEXT CHECK (json_valid(clinical_trials)),
            pharmacoeconomics    TEXT CHECK (json_valid(pharmacoeconomics)),
            properties           TEXT CHECK (json_valid(properties)),
            metadata             TEXT,
            loaded_at            TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS drug_bond (
            bond_id    INTEGER PRIMARY KEY AUTOINCREMENT,
            drug_id    TEXT NOT NULL REFERENCES drug(drug_id),
            bond_type  TEXT NOT NULL CHECK(bond_type IN ('target','enzyme','carrier','transporter')),
            properties TEXT CHECK (json_valid(properties))
        );
        CREATE INDEX IF NOT EXISTS idx_drug_bond_drug ON drug_bond(drug_id);
        CREATE INDEX IF NOT EXISTS idx_drug_bond_type ON drug_bond(bond_type);
        "#,
    )?;
    Ok(())
}

// ── Loading ──

/// Insert one drug row, then one row per bond card. The display name is
/// resolved before anything is written, and both steps share a transaction.
/// Returns the number of bond rows inserted.
pub fn load_drug(conn: &Connection, drug_id: &str, record: &DrugRecord) -> Result<usize> {
    let name = record.drug_name()?;

    let empty = SectionFields::new();
    let sections = Section::ALL
        .iter()
        .map(|s| serde_json::to_string(record.section(*s).unwrap_or(&empty)))
        .collect::<Result<Vec<_>, _>>()?;

    let tx = conn.unchecked_transaction()?;
    let mut inserted = 0;
    {
        let mut values: Vec<&dyn ToSql> = vec![&drug_id, &name];
        values.extend(sections.iter().map(|s| s as &dyn ToSql));
        values.push(&record.metadata);

        tx.execute(
            r#"INSERT INTO drug
               (drug_id, drug_name, identification, pharmacology, interactions,
                products, categories, chemical_identifiers, "references",
                clinical_trials, pharmacoeconomics, properties, metadata)
               VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13)"#,
            values.as_slice(),
        )
        .with_context(|| format!("Failed to insert drug {}", drug_id))?;

        let mut stmt = tx.prepare(
            "INSERT INTO drug_bond (drug_id, bond_type, properties) VALUES (?1, ?2, ?3)",
        )?;
        for kind in BondKind::ALL {
            for bond in record.bonds(kind) {
                let properties = serde_json::to_string(bond)?;
                inserted += stmt.execute(rusqlite::params![drug_id, kind.bond_type(), properties])?;
            }
        }
    }
    tx.commit()?;
    Ok(inserted)
}

/// Load `<source_dir>/<id>.json` into the store.
pub fn load_file(conn: &Connection, drug_id: &str, source_dir: &Path) -> Result<usize> {
    let path = writer::json_path(source_dir, drug_id);
    if !path.is_file() {
        anyhow::bail!("Source file {:?} doesn't exist", path);
    }
    info!("Loading data from {} to database", path.display());
    let record = writer::read_record(&path)?;
    load_drug(conn, drug_id, &record)
}

// ── Reads ──

pub fn fetch_drug_name(conn: &Connection, drug_id: &str) -> Result<Option<String>> {
    let name = conn
        .query_row(
            "SELECT drug_name FROM drug WHERE drug_id = ?1",
            rusqlite::params![drug_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(name)
}

pub struct Stats {
    pub drugs: usize,
    pub bonds: Vec<(BondKind, usize)>,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let drugs: usize = conn.query_row("SELECT COUNT(*) FROM drug", [], |r| r.get(0))?;
    let mut bonds = Vec::with_capacity(BondKind::ALL.len());
    for kind in BondKind::ALL {
        let n: usize = conn.query_row(
            "SELECT COUNT(*) FROM drug_bond WHERE bond_type = ?1",
            rusqlite::params![kind.bond_type()],
            |r| r.get(0),
        )?;
        bonds.push((kind, n));
    }
    Ok(Stats { drugs, bonds })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::parser;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn warfarin() -> DrugRecord {
        let html = std::fs::read_to_string("tests/fixtures/warfarin.html").unwrap();
        parser::process_page(&html).unwrap()
    }

    fn count_bonds(conn: &Connection, drug_id: &str, kind: BondKind) -> Result<usize> {
        let n = conn.query_row(
            "SELECT COUNT(*) FROM drug_bond WHERE drug_id = ?1 AND bond_type = ?2",
            rusqlite::params![drug_id, kind.bond_type()],
            |r| r.get(0),
        )?;
        Ok(n)
    }

    fn row_count(conn: &Connection, table: &str) -> usize {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn load_writes_drug_and_bonds() {
        let conn = memory_db();
        let inserted = load_drug(&conn, "DB00682", &warfarin()).unwrap();
        assert_eq!(inserted, 3);
        assert_eq!(fetch_drug_name(&conn, "DB00682").unwrap().as_deref(), Some("Warfarin"));
        assert_eq!(count_bonds(&conn, "DB00682", BondKind::Targets).unwrap(), 2);
        assert_eq!(count_bonds(&conn, "DB00682", BondKind::Enzymes).unwrap(), 1);
        assert_eq!(count_bonds(&conn, "DB00682", BondKind::Carriers).unwrap(), 0);
    }

    #[test]
    fn load_stamps_loaded_at() {
        let conn = memory_db();
        load_drug(&conn, "DB00682", &warfarin()).unwrap();
        let loaded_at: String = conn
            .query_row("SELECT loaded_at FROM drug WHERE drug_id = 'DB00682'", [], |r| r.get(0))
            .unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(&loaded_at, "%Y-%m-%d %H:%M:%S").is_ok());
    }

    #[test]
    fn bond_rows_hold_one_card_each() {
        let conn = memory_db();
        load_drug(&conn, "DB00682", &warfarin()).unwrap();
        let names: Vec<String> = conn
            .prepare("SELECT json_extract(properties, '$.\"Molecule name\"') FROM drug_bond ORDER BY bond_id")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            names,
            vec![
                "Vitamin K epoxide reductase complex subunit 1",
                "Coagulation factor X",
                "Cytochrome P450 2C9",
            ]
        );
    }

    #[test]
    fn section_columns_are_json() {
        let conn = memory_db();
        load_drug(&conn, "DB00682", &warfarin()).unwrap();
        let unii: String = conn
            .query_row(
                "SELECT json_extract(chemical_identifiers, '$.UNII') FROM drug WHERE drug_id = 'DB00682'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(unii, "5Q7ZVV76EI");
    }

    #[test]
    fn missing_name_inserts_nothing() {
        let conn = memory_db();
        let mut record = warfarin();
        record.sections[&Section::Identification].shift_remove("Name");

        let err = load_drug(&conn, "DB00682", &record).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::MissingField { field: "Name", .. })
        ));
        assert_eq!(row_count(&conn, "drug"), 0);
        assert_eq!(row_count(&conn, "drug_bond"), 0);
    }

    #[test]
    fn duplicate_drug_rolls_back_bonds() {
        let conn = memory_db();
        load_drug(&conn, "DB00682", &warfarin()).unwrap();
        assert!(load_drug(&conn, "DB00682", &warfarin()).is_err());
        assert_eq!(row_count(&conn, "drug"), 1);
        assert_eq!(row_count(&conn, "drug_bond"), 3);
    }

    #[test]
    fn bond_requires_existing_drug() {
        let conn = memory_db();
        let res = conn.execute(
            "INSERT INTO drug_bond (drug_id, bond_type, properties) VALUES ('DB0', 'target', '{}')",
            [],
        );
        assert!(res.is_err());
    }

    #[test]
    fn name_survives_json_file_round_trip() {
        let conn = memory_db();
        let dir = tempfile::tempdir().unwrap();
        let record = warfarin();
        writer::persist(&record, &writer::json_path(dir.path(), "DB00682")).unwrap();

        load_file(&conn, "DB00682", dir.path()).unwrap();
        let stored = fetch_drug_name(&conn, "DB00682").unwrap().unwrap();
        assert_eq!(stored.as_bytes(), record.drug_name().unwrap().as_bytes());

        let stats = get_stats(&conn).unwrap();
        assert_eq!(stats.drugs, 1);
        assert_eq!(stats.bonds[0], (BondKind::Targets, 2));
    }

    #[test]
    fn load_file_requires_source() {
        let conn = memory_db();
        let dir = tempfile::tempdir().unwrap();
        assert!(load_file(&conn, "DB00682", dir.path()).is_err());
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = memory_db();
        init_schema(&conn).unwrap();
    }
}
