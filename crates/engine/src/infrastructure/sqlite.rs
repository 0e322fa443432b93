//! SQLite-backed game store.
//!
//! A [`GameSession`] reads straight from the pool until it locks a game or
//! writes. At that point it opens a transaction whose first statement bumps
//! the `store_lock` row, so it owns the database write lock before it reads
//! anything else. Writers queue on the busy timeout instead of failing on a
//! read-to-write lock upgrade. Sessions that only read never take the lock,
//! and in WAL mode they are not blocked by a writer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use zavalinka_domain::{
    Game, GameId, GameKind, GameTag, GameText, Nickname, Player, PlayerId, PlayerState, Prolog,
};

use crate::infrastructure::ports::{ClockPort, GameSession, GameStore, RepoError};

const SCHEMA: [&str; 5] = [
    r#"
    CREATE TABLE IF NOT EXISTS games (
        id TEXT PRIMARY KEY,
        tag TEXT NOT NULL UNIQUE,
        kind TEXT NOT NULL,
        prolog TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS players (
        id INTEGER PRIMARY KEY,
        nickname TEXT,
        game_id TEXT REFERENCES games(id),
        is_host INTEGER NOT NULL DEFAULT 0,
        for_whom_votes INTEGER REFERENCES players(id) ON DELETE SET NULL,
        state TEXT NOT NULL,
        game_text TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_players_game_id ON players(game_id)",
    r#"
    CREATE TABLE IF NOT EXISTS store_lock (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        generation INTEGER NOT NULL
    )
    "#,
    "INSERT OR IGNORE INTO store_lock (id, generation) VALUES (1, 0)",
];

const PLAYER_COLUMNS: &str = "id, nickname, game_id, is_host, for_whom_votes, state";
const GAME_COLUMNS: &str = "id, tag, kind, prolog, created_at";

/// SQLite implementation of the game store.
pub struct SqliteGameStore {
    pool: SqlitePool,
    clock: Arc<dyn ClockPort>,
}

impl SqliteGameStore {
    pub async fn new(
        db_path: &str,
        busy_timeout: Duration,
        clock: Arc<dyn ClockPort>,
    ) -> Result<Self, RepoError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(busy_timeout);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| RepoError::database("connect", e))?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| RepoError::database("migrate", e))?;
        }

        tracing::info!(path = %db_path, "SQLite game store ready");
        Ok(Self { pool, clock })
    }
}

#[async_trait]
impl GameStore for SqliteGameStore {
    async fn begin(&self) -> Result<Box<dyn GameSession>, RepoError> {
        Ok(Box::new(SqliteSession {
            pool: self.pool.clone(),
            tx: None,
            clock: self.clock.clone(),
        }))
    }
}

struct SqliteSession {
    pool: SqlitePool,
    tx: Option<Transaction<'static, Sqlite>>,
    clock: Arc<dyn ClockPort>,
}

impl SqliteSession {
    /// The write transaction, opened by taking the write lock on first use.
    async fn writer(&mut self) -> Result<&mut Transaction<'static, Sqlite>, RepoError> {
        if self.tx.is_none() {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| RepoError::database("begin", e))?;
            sqlx::query("UPDATE store_lock SET generation = generation + 1 WHERE id = 1")
                .execute(&mut *tx)
                .await
                .map_err(|e| RepoError::database("lock", e))?;
            self.tx = Some(tx);
        }
        self.tx
            .as_mut()
            .ok_or_else(|| RepoError::database("lock", "transaction was not opened"))
    }

    async fn fetch_optional<'q>(
        &mut self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Result<Option<SqliteRow>, sqlx::Error> {
        match self.tx.as_mut() {
            Some(tx) => query.fetch_optional(&mut **tx).await,
            None => query.fetch_optional(&self.pool).await,
        }
    }

    async fn fetch_all<'q>(
        &mut self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Result<Vec<SqliteRow>, sqlx::Error> {
        match self.tx.as_mut() {
            Some(tx) => query.fetch_all(&mut **tx).await,
            None => query.fetch_all(&self.pool).await,
        }
    }
}

#[async_trait]
impl GameSession for SqliteSession {
    async fn lock_game(&mut self, _id: GameId) -> Result<(), RepoError> {
        self.writer().await?;
        Ok(())
    }

    async fn load_player(&mut self, id: PlayerId) -> Result<Option<Player>, RepoError> {
        let row = self
            .fetch_optional(
                sqlx::query(&format!(
                    "SELECT {} FROM players WHERE id = ?",
                    PLAYER_COLUMNS
                ))
                .bind(id.get()),
            )
            .await
            .map_err(|e| RepoError::database("load_player", e))?;

        row.as_ref().map(row_to_player).transpose()
    }

    async fn create_player(&mut self, id: PlayerId) -> Result<Player, RepoError> {
        let tx = self.writer().await?;
        sqlx::query("INSERT INTO players (id, state) VALUES (?, ?) ON CONFLICT(id) DO NOTHING")
            .bind(id.get())
            .bind(PlayerState::Default.as_str())
            .execute(&mut **tx)
            .await
            .map_err(|e| RepoError::database("create_player", e))?;

        self.load_player(id)
            .await?
            .ok_or_else(|| RepoError::not_found("Player", id))
    }

    async fn save_player(&mut self, player: &Player) -> Result<(), RepoError> {
        let tx = self.writer().await?;
        let result = sqlx::query(
            r#"
            UPDATE players
            SET nickname = ?, game_id = ?, is_host = ?, for_whom_votes = ?, state = ?
            WHERE id = ?
            "#,
        )
        .bind(player.nickname().map(|n| n.as_str().to_string()))
        .bind(player.game_id().map(|g| g.to_string()))
        .bind(player.is_host())
        .bind(player.for_whom_votes().map(|p| p.get()))
        .bind(player.state().as_str())
        .bind(player.id().get())
        .execute(&mut **tx)
        .await
        .map_err(|e| constraint_or_database("save_player", e))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found("Player", player.id()));
        }
        Ok(())
    }

    async fn players_in_game(&mut self, game_id: GameId) -> Result<Vec<Player>, RepoError> {
        let rows = self
            .fetch_all(
                sqlx::query(&format!(
                    "SELECT {} FROM players WHERE game_id = ? ORDER BY id",
                    PLAYER_COLUMNS
                ))
                .bind(game_id.to_string()),
            )
            .await
            .map_err(|e| RepoError::database("players_in_game", e))?;

        rows.iter().map(row_to_player).collect()
    }

    async fn voters_for(&mut self, id: PlayerId) -> Result<Vec<Player>, RepoError> {
        let rows = self
            .fetch_all(
                sqlx::query(&format!(
                    "SELECT {} FROM players WHERE for_whom_votes = ? ORDER BY id",
                    PLAYER_COLUMNS
                ))
                .bind(id.get()),
            )
            .await
            .map_err(|e| RepoError::database("voters_for", e))?;

        rows.iter().map(row_to_player).collect()
    }

    async fn save_player_text(
        &mut self,
        id: PlayerId,
        text: Option<&GameText>,
    ) -> Result<(), RepoError> {
        let tx = self.writer().await?;
        let result = sqlx::query("UPDATE players SET game_text = ? WHERE id = ?")
            .bind(text.map(|t| t.as_str().to_string()))
            .bind(id.get())
            .execute(&mut **tx)
            .await
            .map_err(|e| RepoError::database("save_player_text", e))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found("Player", id));
        }
        Ok(())
    }

    async fn player_texts(
        &mut self,
        game_id: GameId,
    ) -> Result<Vec<(PlayerId, GameText)>, RepoError> {
        let rows = self
            .fetch_all(
                sqlx::query(
                    "SELECT id, game_text FROM players WHERE game_id = ? AND game_text IS NOT NULL ORDER BY id",
                )
                .bind(game_id.to_string()),
            )
            .await
            .map_err(|e| RepoError::database("player_texts", e))?;

        rows.iter()
            .map(|row| {
                let id: i64 = column(row, "id")?;
                let text: String = column(row, "game_text")?;
                let text = GameText::new(text).map_err(RepoError::serialization)?;
                Ok((PlayerId::new(id), text))
            })
            .collect()
    }

    async fn load_game(&mut self, id: GameId) -> Result<Option<Game>, RepoError> {
        let row = self
            .fetch_optional(
                sqlx::query(&format!("SELECT {} FROM games WHERE id = ?", GAME_COLUMNS))
                    .bind(id.to_string()),
            )
            .await
            .map_err(|e| RepoError::database("load_game", e))?;

        row.as_ref().map(row_to_game).transpose()
    }

    async fn load_game_by_tag(&mut self, tag: &GameTag) -> Result<Option<Game>, RepoError> {
        let row = self
            .fetch_optional(
                sqlx::query(&format!("SELECT {} FROM games WHERE tag = ?", GAME_COLUMNS))
                    .bind(tag.as_str()),
            )
            .await
            .map_err(|e| RepoError::database("load_game_by_tag", e))?;

        row.as_ref().map(row_to_game).transpose()
    }

    async fn create_game(&mut self, tag: GameTag, kind: GameKind) -> Result<Game, RepoError> {
        let game = Game::new(tag, kind, self.clock.now());

        let tx = self.writer().await?;
        sqlx::query("INSERT INTO games (id, tag, kind, prolog, created_at) VALUES (?, ?, ?, NULL, ?)")
            .bind(game.id().to_string())
            .bind(game.tag().as_str())
            .bind(game.kind().as_str())
            .bind(game.created_at().to_rfc3339())
            .execute(&mut **tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    RepoError::duplicate("Game", game.tag())
                }
                other => RepoError::database("create_game", other),
            })?;

        Ok(game)
    }

    async fn save_game(&mut self, game: &Game) -> Result<(), RepoError> {
        let tx = self.writer().await?;
        let result = sqlx::query("UPDATE games SET prolog = ? WHERE id = ?")
            .bind(game.prolog().map(|p| p.as_str().to_string()))
            .bind(game.id().to_string())
            .execute(&mut **tx)
            .await
            .map_err(|e| RepoError::database("save_game", e))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found("Game", game.id()));
        }
        Ok(())
    }

    async fn delete_game(&mut self, id: GameId) -> Result<(), RepoError> {
        let tx = self.writer().await?;
        sqlx::query("DELETE FROM games WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut **tx)
            .await
            .map_err(|e| constraint_or_database("delete_game", e))?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        match self.tx {
            Some(tx) => tx
                .commit()
                .await
                .map_err(|e| RepoError::database("commit", e)),
            None => Ok(()),
        }
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepoError> {
        match self.tx {
            Some(tx) => tx
                .rollback()
                .await
                .map_err(|e| RepoError::database("rollback", e)),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Row mapping
// =============================================================================

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, RepoError>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(name)
        .map_err(|e| RepoError::serialization(format!("column {}: {}", name, e)))
}

fn row_to_player(row: &SqliteRow) -> Result<Player, RepoError> {
    let id: i64 = column(row, "id")?;
    let nickname: Option<String> = column(row, "nickname")?;
    let game_id: Option<String> = column(row, "game_id")?;
    let is_host: bool = column(row, "is_host")?;
    let for_whom_votes: Option<i64> = column(row, "for_whom_votes")?;
    let state: String = column(row, "state")?;

    let nickname = nickname
        .map(Nickname::new)
        .transpose()
        .map_err(RepoError::serialization)?;
    let game_id = game_id
        .map(|g| g.parse::<GameId>())
        .transpose()
        .map_err(RepoError::serialization)?;
    let state = state
        .parse::<PlayerState>()
        .map_err(RepoError::serialization)?;

    Ok(Player::new(PlayerId::new(id))
        .with_nickname(nickname)
        .with_game(game_id, is_host)
        .with_vote(for_whom_votes.map(PlayerId::new))
        .with_state(state))
}

fn row_to_game(row: &SqliteRow) -> Result<Game, RepoError> {
    let id: String = column(row, "id")?;
    let tag: String = column(row, "tag")?;
    let kind: String = column(row, "kind")?;
    let prolog: Option<String> = column(row, "prolog")?;
    let created_at: String = column(row, "created_at")?;

    let id = id.parse::<GameId>().map_err(RepoError::serialization)?;
    let tag = GameTag::new(tag).map_err(RepoError::serialization)?;
    let kind = kind.parse::<GameKind>().map_err(RepoError::serialization)?;
    let prolog = prolog
        .map(Prolog::new)
        .transpose()
        .map_err(RepoError::serialization)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(RepoError::serialization)?;

    Ok(Game::new(tag, kind, created_at)
        .with_id(id)
        .with_prolog(prolog))
}

fn constraint_or_database(operation: &'static str, e: sqlx::Error) -> RepoError {
    match e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            RepoError::constraint(format!("{}: {}", operation, db.message()))
        }
        other => RepoError::database(operation, other),
    }
}
