//! SQLite persistence for tasks.
//!
//! The store holds only the database path. Every unit of work opens its own
//! connection, runs inside a single transaction on tokio's blocking pool and
//! drops the connection when done, whether it succeeded or not.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use shared::{PageRequest, SortField, Task};
use thiserror::Error;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tasks (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT    NOT NULL UNIQUE,
        description TEXT    NOT NULL,
        completed   INTEGER NOT NULL DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS ix_tasks_name ON tasks (name);
    CREATE INDEX IF NOT EXISTS ix_tasks_description ON tasks (description);
";

// Wait on a locked database rather than failing immediately with SQLITE_BUSY.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("store task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone)]
pub struct Store {
    path: Arc<PathBuf>,
}

impl Store {
    /// Opens the database at `path`, creating the file and schema if absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self {
            path: Arc::new(path.as_ref().to_path_buf()),
        };
        let conn = store.connect()?;
        let journal_mode: String =
            conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(path = %store.path.display(), %journal_mode, "task schema ready");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(self.path.as_path())?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Runs `work` in a read transaction.
    pub async fn read<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Session<'_>) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        self.run(TransactionBehavior::Deferred, work).await
    }

    /// Runs `work` in a write transaction, taking the write lock up front so
    /// that a check followed by a mutation cannot interleave with another
    /// writer.
    pub async fn write<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Session<'_>) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        self.run(TransactionBehavior::Immediate, work).await
    }

    async fn run<T, E, F>(&self, behavior: TransactionBehavior, work: F) -> Result<T, E>
    where
        F: FnOnce(&Session<'_>) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || -> Result<T, E> {
            let mut conn = store.connect()?;
            let tx = conn
                .transaction_with_behavior(behavior)
                .map_err(StoreError::from)?;
            // An Err drops `tx` uncommitted, which rolls it back.
            let output = work(&Session { conn: &tx })?;
            tx.commit().map_err(StoreError::from)?;
            Ok(output)
        })
        .await
        .map_err(|error| E::from(StoreError::from(error)))?
    }
}

/// Task queries bound to one open transaction.
pub struct Session<'conn> {
    conn: &'conn Connection,
}

fn order_clause(sort_by: SortField) -> &'static str {
    match sort_by {
        SortField::Id => "id",
        SortField::Name => "name, id",
        SortField::Description => "description, id",
        SortField::Completed => "completed, id",
    }
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        completed: row.get(3)?,
    })
}

impl Session<'_> {
    pub fn count(&self) -> Result<i64, StoreError> {
        let total = self
            .conn
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
        Ok(total)
    }

    pub fn page(&self, request: &PageRequest) -> Result<Vec<Task>, StoreError> {
        let sql = format!(
            "SELECT id, name, description, completed FROM tasks ORDER BY {} LIMIT ?1 OFFSET ?2",
            order_clause(request.sort_by)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![request.limit, request.offset()], task_from_row)?;
        let tasks = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<Task>, StoreError> {
        let task = self
            .conn
            .query_row(
                "SELECT id, name, description, completed FROM tasks WHERE name = ?1",
                params![name],
                task_from_row,
            )
            .optional()?;
        Ok(task)
    }

    /// Inserts an uncompleted task and returns its id.
    pub fn insert(&self, name: &str, description: &str) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO tasks (name, description, completed) VALUES (?1, ?2, 0)",
            params![name, description],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn mark_completed(&self, id: i64) -> Result<(), StoreError> {
        self.conn
            .execute("UPDATE tasks SET completed = 1 WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct TestStore {
        store: Store,
        _dir: TempDir,
    }

    #[fixture]
    fn test_store() -> TestStore {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("tasks.db")).unwrap();
        TestStore { store, _dir: dir }
    }

    fn page(limit: i64, page: i64, sort_by: SortField) -> PageRequest {
        PageRequest {
            page,
            limit,
            sort_by,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn insert_then_find(test_store: TestStore) {
        let store = test_store.store.clone();
        let found = store
            .write(|session| {
                let id = session.insert("buy milk", "2%")?;
                assert_eq!(id, 1);
                session.find_by_name("buy milk")
            })
            .await
            .unwrap();

        assert_eq!(
            found,
            Some(Task {
                id: 1,
                name: "buy milk".to_string(),
                description: "2%".to_string(),
                completed: false,
            })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn reopening_keeps_existing_rows(test_store: TestStore) {
        test_store
            .store
            .write(|session| session.insert("a", "b"))
            .await
            .unwrap();

        let reopened = Store::open(test_store.store.path()).unwrap();
        let total = reopened.read(|session| session.count()).await.unwrap();
        assert_eq!(total, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn failed_work_is_rolled_back(test_store: TestStore) {
        let result: Result<(), StoreError> = test_store
            .store
            .write(|session| {
                session.insert("a", "b")?;
                // Violates the UNIQUE constraint.
                session.insert("a", "c")?;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(StoreError::Sqlite(_))));

        let total = test_store.store.read(|session| session.count()).await.unwrap();
        assert_eq!(total, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn page_orders_and_slices(test_store: TestStore) {
        let store = test_store.store.clone();
        store
            .write(|session| {
                session.insert("c", "1")?;
                session.insert("a", "3")?;
                session.insert("b", "2")?;
                Ok::<_, StoreError>(())
            })
            .await
            .unwrap();

        let names = |tasks: Vec<Task>| tasks.into_iter().map(|t| t.name).collect::<Vec<_>>();

        let by_name = store
            .read(|session| session.page(&page(10, 1, SortField::Name)))
            .await
            .unwrap();
        assert_eq!(names(by_name), ["a", "b", "c"]);

        let by_description = store
            .read(|session| session.page(&page(2, 1, SortField::Description)))
            .await
            .unwrap();
        assert_eq!(names(by_description), ["c", "b"]);

        let second_page = store
            .read(|session| session.page(&page(2, 2, SortField::Id)))
            .await
            .unwrap();
        assert_eq!(names(second_page), ["b"]);

        let past_the_end = store
            .read(|session| session.page(&page(2, 9, SortField::Id)))
            .await
            .unwrap();
        assert!(past_the_end.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn complete_and_delete(test_store: TestStore) {
        let store = test_store.store.clone();
        let task = store
            .write(|session| {
                let id = session.insert("x", "y")?;
                session.mark_completed(id)?;
                session.mark_completed(id)?;
                session.find_by_name("x")
            })
            .await
            .unwrap()
            .unwrap();
        assert!(task.completed);

        let remaining = store
            .write(move |session| {
                session.delete(task.id)?;
                session.count()
            })
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
