use rusqlite::Connection;

use crate::schema;

/// Ordered schema migrations: (version, description, statements).
const MIGRATIONS: &[(i64, &str, &str)] = &[(1, "key-value table", schema::CREATE_KV)];

/// Bring the schema up to the latest version. Safe to call on every open.
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(schema::CREATE_SCHEMA_VERSION)?;

    let current = current_version(conn)?;
    for (version, description, sql) in MIGRATIONS {
        if *version <= current {
            continue;
        }
        tracing::info!(version, "applying migration: {description}");
        conn.execute_batch(sql)?;
        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
            [version],
        )?;
    }

    Ok(())
}

pub fn current_version(conn: &Connection) -> anyhow::Result<i64> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), 1);

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
