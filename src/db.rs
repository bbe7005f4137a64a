use crate::config::Config;
use crate::model::*;
use crate::store::{EntityStore, StoreError, StoreResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::path::Path;

pub const IN_MEMORY: &str = ":memory:";

const SYSTEM_MIGRATIONS: &[(&str, &str)] =
    &[("system/000_migrations_table.sql", include_str!("migrations/system/000_migrations_table.sql"))];

const MIGRATIONS: &[(&str, &str)] = &[
    ("001_users.sql", include_str!("migrations/001_users.sql")),
    ("002_books.sql", include_str!("migrations/002_books.sql")),
];

const USER_COLUMNS: &str = "id, email, name, password";
const BOOK_COLUMNS: &str = "id, title, body, user_id";

pub struct Database {
    // Owns the handle `conn` was opened from; dropping it closes local files.
    _db: LibsqlDatabase,
    conn: Connection,
}

impl Database {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Opens the database described by `cfg`. A relative local path is resolved
    /// against `data_dir`.
    pub async fn new(cfg: &Config, data_dir: &Path) -> Result<Self> {
        let database_url = cfg.app.database_url();
        let auth_token = cfg.app.auth_token();

        let db = match (database_url, auth_token) {
            (Some(url), Some(token)) => {
                tracing::info!(url = %url, "[db] running against remote libsql server");
                Builder::new_remote(url, token).build().await?
            }
            _ => {
                let database = cfg.app.get_db();
                if database == IN_MEMORY {
                    tracing::warn!("[db] using in-memory database, data will not survive a restart");
                    Builder::new_local(IN_MEMORY).build().await?
                } else {
                    let path = data_dir.join(database);
                    tracing::info!(path = ?path, "[db] running in local file mode");
                    Builder::new_local(&path).build().await?
                }
            }
        };

        Self::setup(db).await
    }

    pub async fn open_local(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new_local(path).build().await?;
        Self::setup(db).await
    }

    async fn setup(db: LibsqlDatabase) -> Result<Self> {
        let conn = db.connect()?;
        conn.query("SELECT 1", ()).await?;

        for (filename, sql) in SYSTEM_MIGRATIONS.iter().chain(MIGRATIONS) {
            Self::run_migration(&conn, filename, sql).await?;
        }

        Ok(Database { _db: db, conn })
    }

    /// The `_migrations` table itself is created by the first system
    /// migration, so its absence means nothing has run yet.
    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        match conn.query("SELECT 1 FROM _migrations WHERE name = ?", libsql::params![name]).await {
            Ok(mut rows) => Ok(rows.next().await?.is_some()),
            Err(e) if e.to_string().contains("no such table") => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Applies one embedded schema file and records it by name, skipping
    /// files a previous start already applied.
    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!(migration = name, "[db] schema file already applied");
            return Ok(());
        }

        tracing::info!(migration = name, "[db] applying schema file");
        conn.execute_batch(sql)
            .await
            .with_context(|| format!("failed to apply schema file {name}"))?;

        conn.execute(
            "INSERT INTO _migrations (name, applied_at) VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
            libsql::params![name],
        )
        .await?;
        Ok(())
    }

    fn row_to_user(row: &libsql::Row) -> StoreResult<User> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            password: row.get(3)?,
        })
    }

    fn row_to_book(row: &libsql::Row) -> StoreResult<Book> {
        Ok(Book {
            id: row.get(0)?,
            title: row.get(1)?,
            body: row.get(2)?,
            user_id: row.get(3)?,
        })
    }
}

#[async_trait]
impl EntityStore for Database {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let query = format!(
            "INSERT INTO users (email, name, password) VALUES (?, ?, ?) RETURNING {USER_COLUMNS}"
        );

        let mut rows = self
            .conn
            .query(&query, libsql::params![user.email, user.name, user.password])
            .await?;

        match rows.next().await? {
            Some(row) => Self::row_to_user(&row),
            None => Err(StoreError::Backend("insert returned no user row".to_string())),
        }
    }

    async fn find_user(&self, credentials: Credentials) -> StoreResult<User> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? AND password = ? ORDER BY id LIMIT 1"
        );

        let mut rows = self
            .conn
            .query(&query, libsql::params![credentials.email, credentials.password])
            .await?;

        match rows.next().await? {
            Some(row) => Self::row_to_user(&row),
            None => Err(StoreError::not_found("user")),
        }
    }

    async fn create_book(&self, book: NewBook) -> StoreResult<Book> {
        let query = format!(
            "INSERT INTO books (title, body, user_id) VALUES (?, ?, ?) RETURNING {BOOK_COLUMNS}"
        );

        let mut rows = self
            .conn
            .query(&query, libsql::params![book.title, book.body, book.user_id])
            .await?;

        match rows.next().await? {
            Some(row) => Self::row_to_book(&row),
            None => Err(StoreError::Backend("insert returned no book row".to_string())),
        }
    }

    async fn get_book(&self, id: i64) -> StoreResult<Book> {
        let query = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?");

        let mut rows = self.conn.query(&query, libsql::params![id]).await?;

        match rows.next().await? {
            Some(row) => Self::row_to_book(&row),
            None => Err(StoreError::not_found("book")),
        }
    }

    async fn list_books(&self) -> StoreResult<Vec<Book>> {
        let query = format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY id");

        let mut rows = self.conn.query(&query, ()).await?;
        let mut books = vec![];

        while let Some(row) = rows.next().await? {
            books.push(Self::row_to_book(&row)?);
        }

        Ok(books)
    }

    async fn update_book(&self, id: i64, changes: BookChanges) -> StoreResult<Book> {
        let query = format!(
            "UPDATE books SET title = ?, body = ? WHERE id = ? RETURNING {BOOK_COLUMNS}"
        );

        let mut rows = self
            .conn
            .query(&query, libsql::params![changes.title, changes.body, id])
            .await?;

        match rows.next().await? {
            Some(row) => Self::row_to_book(&row),
            None => Err(StoreError::not_found("book")),
        }
    }

    async fn delete_book(&self, id: i64) -> StoreResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM books WHERE id = ?", libsql::params![id])
            .await?;

        if deleted == 0 {
            return Err(StoreError::not_found("book"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_db() -> Database {
        Database::open_local(IN_MEMORY).await.expect("in-memory database")
    }

    fn new_user(email: &str, password: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: "A".to_string(),
            password: password.to_string(),
        }
    }

    fn new_book(title: &str, user_id: i64) -> NewBook {
        NewBook {
            title: title.to_string(),
            body: "B".to_string(),
            user_id,
        }
    }

    #[tokio::test]
    async fn test_migrations_are_recorded_once() {
        let db = memory_db().await;
        for (filename, sql) in SYSTEM_MIGRATIONS.iter().chain(MIGRATIONS) {
            Database::run_migration(db.connection(), filename, sql).await.unwrap();
        }

        let mut rows = db
            .connection()
            .query("SELECT COUNT(*) FROM _migrations", ())
            .await
            .unwrap();
        let count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(count as usize, SYSTEM_MIGRATIONS.len() + MIGRATIONS.len());
    }

    #[tokio::test]
    async fn test_create_user_assigns_distinct_ids() {
        let db = memory_db().await;
        let first = db.create_user(new_user("a@x.com", "p")).await.unwrap();
        let second = db.create_user(new_user("a@x.com", "p")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.email, "a@x.com");
        assert_eq!(first.password, "p");
    }

    #[tokio::test]
    async fn test_find_user_requires_exact_pair() {
        let db = memory_db().await;
        db.create_user(new_user("a@x.com", "p")).await.unwrap();

        let found = db
            .find_user(Credentials {
                email: "a@x.com".to_string(),
                password: "p".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(found.id, 1);

        let miss = db
            .find_user(Credentials {
                email: "a@x.com".to_string(),
                password: "P".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(miss, StoreError::not_found("user"));
    }

    #[tokio::test]
    async fn test_find_user_prefers_lowest_id_on_duplicates() {
        let db = memory_db().await;
        let first = db.create_user(new_user("dup@x.com", "p")).await.unwrap();
        db.create_user(new_user("dup@x.com", "p")).await.unwrap();

        let found = db
            .find_user(Credentials {
                email: "dup@x.com".to_string(),
                password: "p".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(found, first);
    }

    #[tokio::test]
    async fn test_book_lifecycle() {
        let db = memory_db().await;
        let created = db.create_book(new_book("T", 1)).await.unwrap();
        assert_eq!(db.get_book(created.id).await.unwrap(), created);

        let updated = db
            .update_book(
                created.id,
                BookChanges {
                    title: "T2".to_string(),
                    body: "B2".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "T2");
        assert_eq!(updated.body, "B2");
        assert_eq!(updated.user_id, 1);

        db.delete_book(created.id).await.unwrap();
        assert!(db.get_book(created.id).await.unwrap_err().is_not_found());
        assert!(db.delete_book(created.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_create_book_for_unknown_user_is_accepted() {
        let db = memory_db().await;
        let book = db.create_book(new_book("orphan", 999)).await.unwrap();
        assert_eq!(book.user_id, 999);
    }

    #[tokio::test]
    async fn test_update_missing_book_is_not_found() {
        let db = memory_db().await;
        let err = db
            .update_book(
                42,
                BookChanges {
                    title: "T".to_string(),
                    body: "B".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_books_in_id_order() {
        let db = memory_db().await;
        for title in ["one", "two", "three"] {
            db.create_book(new_book(title, 1)).await.unwrap();
        }

        let titles: Vec<String> = db.list_books().await.unwrap().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let db = memory_db().await;
        let first = db.create_book(new_book("T", 1)).await.unwrap();
        db.delete_book(first.id).await.unwrap();
        let second = db.create_book(new_book("T", 1)).await.unwrap();
        assert!(second.id > first.id);
    }
}
