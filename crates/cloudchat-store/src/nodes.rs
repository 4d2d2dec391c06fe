use rusqlite::{params, Connection};
use serde_json::Value;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::path::DbPath;
use crate::tree;

impl Database {
    /// Read the JSON value stored at `path`, or `None` if nothing is there.
    pub fn read_node(&self, path: &DbPath) -> Result<Option<Value>> {
        let leaves = read_leaves(self.conn(), path)?;
        Ok(tree::assemble(path, leaves))
    }

    /// Replace the value at each path, in order, in one transaction.
    ///
    /// Writing `null` (or an empty object) deletes. A write below a scalar
    /// replaces the scalar. If any write is invalid nothing is applied.
    pub fn write_nodes(&mut self, writes: &[(DbPath, Value)]) -> Result<()> {
        let tx = self.conn_mut().transaction()?;

        for (path, value) in writes {
            if path.is_root() {
                return Err(StoreError::InvalidPath("cannot write the root".into()));
            }

            let mut leaves = Vec::new();
            tree::flatten(path, value, &mut leaves)?;

            delete_subtree(&tx, path)?;
            for ancestor in path.ancestors() {
                tx.execute(
                    "DELETE FROM nodes WHERE path = ?1",
                    params![ancestor.encode()],
                )?;
            }

            for (leaf, leaf_value) in &leaves {
                tx.execute(
                    "INSERT INTO nodes (path, value) VALUES (?1, ?2)",
                    params![leaf.encode(), serde_json::to_string(leaf_value)?],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn write_node(&mut self, path: &DbPath, value: Value) -> Result<()> {
        self.write_nodes(&[(path.clone(), value)])
    }
}

/// `(exact, lower, upper)` bounds selecting `path` and everything below it.
///
/// Children sort between `path/` and `path0` because `0` follows `/`.
fn subtree_bounds(path: &DbPath) -> (String, String, String) {
    let exact = path.encode();
    let lower = format!("{exact}/");
    let upper = format!("{exact}0");
    (exact, lower, upper)
}

fn read_leaves(conn: &Connection, path: &DbPath) -> Result<Vec<(DbPath, Value)>> {
    let mut rows: Vec<(String, String)> = Vec::new();

    if path.is_root() {
        let mut stmt = conn.prepare("SELECT path, value FROM nodes ORDER BY path")?;
        let mapped = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        for row in mapped {
            rows.push(row?);
        }
    } else {
        let (exact, lower, upper) = subtree_bounds(path);
        let mut stmt = conn.prepare(
            "SELECT path, value FROM nodes
             WHERE path = ?1 OR (path >= ?2 AND path < ?3)
             ORDER BY path",
        )?;
        let mapped = stmt.query_map(params![exact, lower, upper], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;
        for row in mapped {
            rows.push(row?);
        }
    }

    rows.into_iter()
        .map(|(p, v)| -> Result<(DbPath, Value)> {
            Ok((DbPath::parse(&p)?, serde_json::from_str(&v)?))
        })
        .collect()
}

fn delete_subtree(conn: &Connection, path: &DbPath) -> Result<usize> {
    let (exact, lower, upper) = subtree_bounds(path);
    let affected = conn.execute(
        "DELETE FROM nodes WHERE path = ?1 OR (path >= ?2 AND path < ?3)",
        params![exact, lower, upper],
    )?;
    Ok(affected)
}
