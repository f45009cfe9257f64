use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::Category;

/// All categories, alphabetically.
pub fn list_categories(conn: &Connection) -> rusqlite::Result<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY name ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    rows.collect()
}

pub fn find_category(conn: &Connection, id: i64) -> rusqlite::Result<Option<Category>> {
    conn.query_row(
        "SELECT id, name FROM categories WHERE id = ?1",
        params![id],
        |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    )
    .optional()
}

/// Names of the categories a post is filed under.
pub fn names_for_post(conn: &Connection, post_id: i64) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT c.name FROM categories c
         JOIN post_categories pc ON pc.category_id = c.id
         WHERE pc.post_id = ?1
         ORDER BY c.name ASC",
    )?;
    let rows = stmt.query_map(params![post_id], |row| row.get(0))?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::seed_categories;
    use crate::db::tests::test_pool;

    #[test]
    fn categories_are_listed_alphabetically() {
        let (_tmp, pool) = test_pool();
        seed_categories(
            &pool,
            &["Questions".to_string(), "Fossils".to_string(), "General".to_string()],
        )
        .unwrap();
        let conn = pool.get().unwrap();
        let names: Vec<String> = list_categories(&conn)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Fossils", "General", "Questions"]);
    }

    #[test]
    fn find_category_by_id() {
        let (_tmp, pool) = test_pool();
        seed_categories(&pool, &["General".to_string()]).unwrap();
        let conn = pool.get().unwrap();
        let general = list_categories(&conn).unwrap().remove(0);
        assert_eq!(find_category(&conn, general.id).unwrap(), Some(general));
        assert_eq!(find_category(&conn, 9999).unwrap(), None);
    }
}
