use rusqlite::{params, Connection, OptionalExtension};

pub fn get_value(conn: &Connection, key: &str) -> anyhow::Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

pub fn set_value(conn: &Connection, key: &str, value: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value],
    )?;
    Ok(())
}

pub fn delete_value(conn: &Connection, key: &str) -> anyhow::Result<()> {
    conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
    Ok(())
}

/// Write every entry inside one transaction.
pub fn set_values(conn: &mut Connection, entries: &[(&str, String)]) -> anyhow::Result<()> {
    let tx = conn.transaction()?;
    for (key, value) in entries {
        set_value(&tx, key, value)?;
    }
    tx.commit()?;
    Ok(())
}

pub fn list_keys(conn: &Connection) -> anyhow::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT key FROM kv ORDER BY key")?;
    let keys = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::open_memory_db;

    #[test]
    fn test_kv_crud() {
        let conn = open_memory_db().unwrap();
        assert!(get_value(&conn, "unicircle_collections").unwrap().is_none());

        set_value(&conn, "unicircle_collections", "[]").unwrap();
        set_value(&conn, "unicircle_collections", "[{}]").unwrap();
        assert_eq!(
            get_value(&conn, "unicircle_collections").unwrap().as_deref(),
            Some("[{}]")
        );
        assert_eq!(list_keys(&conn).unwrap(), vec!["unicircle_collections"]);

        delete_value(&conn, "unicircle_collections").unwrap();
        assert!(get_value(&conn, "unicircle_collections").unwrap().is_none());
    }

    #[test]
    fn test_set_values_is_atomic() {
        let mut conn = open_memory_db().unwrap();
        set_value(&conn, "a", "old").unwrap();

        // Reject the second key so the batch fails half way through.
        conn.execute_batch(
            "CREATE TRIGGER reject_b BEFORE INSERT ON kv WHEN NEW.key = 'b'
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .unwrap();

        let result = set_values(&mut conn, &[("a", "new".to_string()), ("b", "x".to_string())]);
        assert!(result.is_err());
        assert_eq!(get_value(&conn, "a").unwrap().as_deref(), Some("old"));
        assert!(get_value(&conn, "b").unwrap().is_none());
    }

    #[test]
    fn test_list_keys_surfaces_unreadable_rows() {
        let conn = open_memory_db().unwrap();
        set_value(&conn, "unicircle_collections", "[]").unwrap();
        // A blob key cannot be read back as text.
        conn.execute("INSERT INTO kv (key, value) VALUES (X'FF00', '[]')", [])
            .unwrap();

        assert!(list_keys(&conn).is_err());
    }
}
