//! Row-level join emulation
//!
//! List endpoints fetch parent rows first, collect the distinct profile ids
//! they reference, fetch those profiles in one batched query and merge the
//! summaries back in memory. A dangling id simply embeds as `null`.

use rusqlite::Result as SqliteResult;
use std::collections::{BTreeSet, HashMap};

use super::columns;
use super::Database;
use crate::models::ProfileSummary;

/// SQLite caps bound parameters per statement; stay well below it
const LOOKUP_CHUNK: usize = 500;

pub type ProfileIndex = HashMap<String, ProfileSummary>;

/// Distinct, non-empty foreign keys in a stable order
pub fn collect_keys<'a, I>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    keys.into_iter()
        .flatten()
        .filter(|k| !k.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Look up one foreign key in a fetched index
pub fn embed(index: &ProfileIndex, key: Option<&str>) -> Option<ProfileSummary> {
    key.and_then(|k| index.get(k)).cloned()
}

impl Database {
    /// Fetch profile summaries for a set of ids in batched `IN (...)` queries
    pub fn profile_summaries(&self, ids: &[String]) -> SqliteResult<ProfileIndex> {
        let mut index = HashMap::with_capacity(ids.len());
        if ids.is_empty() {
            return Ok(index);
        }

        let conn = self.conn.lock();
        for chunk in ids.chunks(LOOKUP_CHUNK) {
            let placeholders: Vec<String> = (1..=chunk.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT id, email, full_name, role FROM profiles WHERE id IN ({})",
                placeholders.join(", ")
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(rusqlite::params_from_iter(chunk.iter()), |row| {
                Ok(ProfileSummary {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    full_name: row.get(2)?,
                    role: columns::enumeration(row, 3)?,
                })
            })?;
            for summary in rows {
                let summary = summary?;
                index.insert(summary.id.clone(), summary);
            }
        }

        Ok(index)
    }

    /// Collect keys from `rows` and resolve them in one pass
    pub fn profiles_for<'a, T, I>(&self, rows: &'a [T], keys: impl Fn(&'a T) -> I) -> SqliteResult<ProfileIndex>
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let ids = collect_keys(rows.iter().flat_map(keys));
        self.profile_summaries(&ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tables::test_support::seed_profile;
    use crate::models::Role;

    #[test]
    fn test_collect_keys_dedupes_and_skips_nulls() {
        let keys = collect_keys(vec![Some("b"), None, Some("a"), Some("b"), Some("")]);
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert!(collect_keys(Vec::<Option<&str>>::new()).is_empty());
    }

    #[test]
    fn test_profile_summaries_batches_and_ignores_unknown_ids() {
        let db = Database::in_memory().unwrap();
        let alice = seed_profile(&db, "alice@example.com", Role::Admin);
        let bob = seed_profile(&db, "bob@example.com", Role::Employee);

        let index = db
            .profile_summaries(&[alice.id.clone(), bob.id.clone(), "ghost".to_string()])
            .unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index[&alice.id].email, "alice@example.com");
        assert_eq!(index[&bob.id].role, Role::Employee);

        assert_eq!(embed(&index, Some("ghost")), None);
        assert_eq!(embed(&index, None), None);
        assert_eq!(embed(&index, Some(bob.id.as_str())).map(|p| p.full_name), Some(bob.full_name));
    }

    #[test]
    fn test_empty_lookup_skips_query() {
        let db = Database::in_memory().unwrap();
        assert!(db.profile_summaries(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_large_lookup_spans_chunks() {
        let db = Database::in_memory().unwrap();
        let known = seed_profile(&db, "known@example.com", Role::Manager);
        let mut ids: Vec<String> = (0..1200).map(|i| format!("missing-{}", i)).collect();
        ids.push(known.id.clone());

        let index = db.profile_summaries(&ids).unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.contains_key(&known.id));
    }
}
