//! In-memory game store for development and testing
//!
//! Committed rows live in shared tables behind a read-write lock that is held
//! for one read or one commit at a time, never for a whole session. A session
//! buffers its writes in [`Pending`] and reads through them; commit applies the
//! buffer in one step, rollback (or drop) throws it away.
//!
//! Game locks are async mutexes keyed by game id in a `DashMap`. Creating a
//! game locks its tag the same way, so two creators of one tag cannot both
//! succeed.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use zavalinka_domain::{Game, GameId, GameKind, GameTag, GameText, Player, PlayerId};

use crate::infrastructure::ports::{ClockPort, GameSession, GameStore, RepoError};

#[derive(Debug, Default)]
struct Tables {
    players: BTreeMap<PlayerId, Player>,
    texts: HashMap<PlayerId, GameText>,
    games: HashMap<GameId, Game>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LockKey {
    Game(GameId),
    Tag(GameTag),
}

type LockTable = Arc<DashMap<LockKey, Arc<Mutex<()>>>>;

/// A lock held by one session until it ends.
struct HeldLock {
    key: LockKey,
    guard: Option<OwnedMutexGuard<()>>,
    table: LockTable,
}

impl Drop for HeldLock {
    fn drop(&mut self) {
        self.guard.take();
        // Forget the mutex once nobody holds or waits on it
        self.table
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

async fn acquire(table: &LockTable, key: LockKey) -> HeldLock {
    let mutex = table.entry(key.clone()).or_default().clone();
    let guard = mutex.lock_owned().await;
    HeldLock {
        key,
        guard: Some(guard),
        table: table.clone(),
    }
}

/// Process-local store. Data does not survive a restart.
pub struct MemoryGameStore {
    tables: Arc<RwLock<Tables>>,
    locks: LockTable,
    clock: Arc<dyn ClockPort>,
}

impl MemoryGameStore {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            locks: Arc::new(DashMap::new()),
            clock,
        }
    }

    #[cfg(test)]
    pub(crate) async fn game_count(&self) -> usize {
        self.tables.read().await.games.len()
    }
}

#[async_trait]
impl GameStore for MemoryGameStore {
    async fn begin(&self) -> Result<Box<dyn GameSession>, RepoError> {
        Ok(Box::new(MemorySession {
            tables: self.tables.clone(),
            locks: self.locks.clone(),
            held: Vec::new(),
            pending: Pending::default(),
            clock: self.clock.clone(),
        }))
    }
}

/// Uncommitted writes of one session. `None` marks a deleted game or a
/// cleared text.
#[derive(Debug, Default)]
struct Pending {
    players: BTreeMap<PlayerId, Player>,
    texts: HashMap<PlayerId, Option<GameText>>,
    games: HashMap<GameId, Option<Game>>,
}

impl Pending {
    fn player(&self, tables: &Tables, id: PlayerId) -> Option<Player> {
        self.players
            .get(&id)
            .or_else(|| tables.players.get(&id))
            .cloned()
    }

    fn players_where(&self, tables: &Tables, keep: impl Fn(&Player) -> bool) -> Vec<Player> {
        let mut found: BTreeMap<PlayerId, Player> = tables
            .players
            .values()
            .filter(|p| keep(p))
            .map(|p| (p.id(), p.clone()))
            .collect();
        for (id, player) in &self.players {
            if keep(player) {
                found.insert(*id, player.clone());
            } else {
                found.remove(id);
            }
        }
        found.into_values().collect()
    }

    fn text(&self, tables: &Tables, id: PlayerId) -> Option<GameText> {
        match self.texts.get(&id) {
            Some(text) => text.clone(),
            None => tables.texts.get(&id).cloned(),
        }
    }

    fn game(&self, tables: &Tables, id: GameId) -> Option<Game> {
        match self.games.get(&id) {
            Some(game) => game.clone(),
            None => tables.games.get(&id).cloned(),
        }
    }

    fn game_by_tag(&self, tables: &Tables, tag: &GameTag) -> Option<Game> {
        self.games
            .values()
            .flatten()
            .find(|g| g.tag() == tag)
            .or_else(|| {
                tables
                    .games
                    .values()
                    .find(|g| g.tag() == tag && !self.games.contains_key(&g.id()))
            })
            .cloned()
    }

    fn apply(self, tables: &mut Tables) {
        for (id, game) in self.games {
            match game {
                Some(game) => {
                    tables.games.insert(id, game);
                }
                None => {
                    tables.games.remove(&id);
                }
            }
        }
        tables.players.extend(self.players);
        for (id, text) in self.texts {
            match text {
                Some(text) => {
                    tables.texts.insert(id, text);
                }
                None => {
                    tables.texts.remove(&id);
                }
            }
        }
    }
}

struct MemorySession {
    tables: Arc<RwLock<Tables>>,
    locks: LockTable,
    held: Vec<HeldLock>,
    pending: Pending,
    clock: Arc<dyn ClockPort>,
}

impl MemorySession {
    async fn lock(&mut self, key: LockKey) {
        if self.held.iter().any(|held| held.key == key) {
            return;
        }
        let held = acquire(&self.locks, key).await;
        self.held.push(held);
    }
}

#[async_trait]
impl GameSession for MemorySession {
    async fn lock_game(&mut self, id: GameId) -> Result<(), RepoError> {
        self.lock(LockKey::Game(id)).await;
        Ok(())
    }

    async fn load_player(&mut self, id: PlayerId) -> Result<Option<Player>, RepoError> {
        let tables = self.tables.read().await;
        Ok(self.pending.player(&tables, id))
    }

    async fn create_player(&mut self, id: PlayerId) -> Result<Player, RepoError> {
        let tables = self.tables.read().await;
        if let Some(existing) = self.pending.player(&tables, id) {
            return Ok(existing);
        }
        let player = Player::new(id);
        self.pending.players.insert(id, player.clone());
        Ok(player)
    }

    async fn save_player(&mut self, player: &Player) -> Result<(), RepoError> {
        let tables = self.tables.read().await;
        if let Some(game_id) = player.game_id() {
            if self.pending.game(&tables, game_id).is_none() {
                return Err(RepoError::not_found("Game", game_id));
            }
        }
        self.pending.players.insert(player.id(), player.clone());
        Ok(())
    }

    async fn players_in_game(&mut self, game_id: GameId) -> Result<Vec<Player>, RepoError> {
        let tables = self.tables.read().await;
        Ok(self
            .pending
            .players_where(&tables, |p| p.game_id() == Some(game_id)))
    }

    async fn voters_for(&mut self, id: PlayerId) -> Result<Vec<Player>, RepoError> {
        let tables = self.tables.read().await;
        Ok(self
            .pending
            .players_where(&tables, |p| p.for_whom_votes() == Some(id)))
    }

    async fn save_player_text(
        &mut self,
        id: PlayerId,
        text: Option<&GameText>,
    ) -> Result<(), RepoError> {
        let tables = self.tables.read().await;
        if self.pending.player(&tables, id).is_none() {
            return Err(RepoError::not_found("Player", id));
        }
        self.pending.texts.insert(id, text.cloned());
        Ok(())
    }

    async fn player_texts(
        &mut self,
        game_id: GameId,
    ) -> Result<Vec<(PlayerId, GameText)>, RepoError> {
        let tables = self.tables.read().await;
        let pending = &self.pending;
        Ok(pending
            .players_where(&tables, |p| p.game_id() == Some(game_id))
            .iter()
            .filter_map(|p| pending.text(&tables, p.id()).map(|t| (p.id(), t)))
            .collect())
    }

    async fn load_game(&mut self, id: GameId) -> Result<Option<Game>, RepoError> {
        let tables = self.tables.read().await;
        Ok(self.pending.game(&tables, id))
    }

    async fn load_game_by_tag(&mut self, tag: &GameTag) -> Result<Option<Game>, RepoError> {
        let tables = self.tables.read().await;
        Ok(self.pending.game_by_tag(&tables, tag))
    }

    async fn create_game(&mut self, tag: GameTag, kind: GameKind) -> Result<Game, RepoError> {
        self.lock(LockKey::Tag(tag.clone())).await;

        let tables = self.tables.read().await;
        if self.pending.game_by_tag(&tables, &tag).is_some() {
            return Err(RepoError::duplicate("Game", tag));
        }
        let game = Game::new(tag, kind, self.clock.now());
        self.pending.games.insert(game.id(), Some(game.clone()));
        Ok(game)
    }

    async fn save_game(&mut self, game: &Game) -> Result<(), RepoError> {
        let tables = self.tables.read().await;
        if self.pending.game(&tables, game.id()).is_none() {
            return Err(RepoError::not_found("Game", game.id()));
        }
        self.pending.games.insert(game.id(), Some(game.clone()));
        Ok(())
    }

    async fn delete_game(&mut self, id: GameId) -> Result<(), RepoError> {
        let tables = self.tables.read().await;
        if !self
            .pending
            .players_where(&tables, |p| p.game_id() == Some(id))
            .is_empty()
        {
            return Err(RepoError::constraint(format!(
                "game {} still has players",
                id
            )));
        }
        self.pending.games.insert(id, None);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        let MemorySession {
            tables,
            pending,
            held,
            ..
        } = *self;
        pending.apply(&mut *tables.write().await);
        // Locks go only after the writes are visible
        drop(held);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepoError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::infrastructure::clock::FixedClock;
    use chrono::{TimeZone, Utc};

    fn store() -> MemoryGameStore {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        MemoryGameStore::new(Arc::new(FixedClock(now)))
    }

    fn tag(s: &str) -> GameTag {
        GameTag::new(s).expect("tag")
    }

    #[tokio::test]
    async fn committed_writes_are_visible_to_later_sessions() {
        let store = store();

        let mut session = store.begin().await.expect("begin");
        session.create_player(PlayerId::new(1)).await.expect("create");
        session.commit().await.expect("commit");

        let mut session = store.begin().await.expect("begin");
        assert!(session
            .load_player(PlayerId::new(1))
            .await
            .expect("load")
            .is_some());
    }

    #[tokio::test]
    async fn rolled_back_writes_are_discarded() {
        let store = store();

        let mut session = store.begin().await.expect("begin");
        session.create_player(PlayerId::new(1)).await.expect("create");
        session.rollback().await.expect("rollback");

        let mut session = store.begin().await.expect("begin");
        assert!(session
            .load_player(PlayerId::new(1))
            .await
            .expect("load")
            .is_none());
    }

    #[tokio::test]
    async fn dropped_session_behaves_like_rollback() {
        let store = store();
        {
            let mut session = store.begin().await.expect("begin");
            session
                .create_game(tag("evening"), GameKind::Poetic)
                .await
                .expect("create");
        }
        let mut session = store.begin().await.expect("begin");
        assert!(session
            .load_game_by_tag(&tag("evening"))
            .await
            .expect("load")
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_tag_is_rejected() {
        let store = store();
        let mut session = store.begin().await.expect("begin");
        session
            .create_game(tag("evening"), GameKind::Poetic)
            .await
            .expect("first");
        let err = session
            .create_game(tag("evening"), GameKind::Dictionary)
            .await
            .expect_err("duplicate");
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn create_player_is_idempotent() {
        let store = store();
        let mut session = store.begin().await.expect("begin");
        let mut player = session.create_player(PlayerId::new(5)).await.expect("create");
        player.set_state(zavalinka_domain::PlayerState::TypingNickname);
        session.save_player(&player).await.expect("save");

        let again = session.create_player(PlayerId::new(5)).await.expect("create");
        assert_eq!(again.state(), zavalinka_domain::PlayerState::TypingNickname);
    }

    #[tokio::test]
    async fn game_with_players_cannot_be_deleted() {
        let store = store();
        let mut session = store.begin().await.expect("begin");
        let game = session
            .create_game(tag("evening"), GameKind::Poetic)
            .await
            .expect("game");
        let mut player = session.create_player(PlayerId::new(1)).await.expect("player");
        player.join_game(game.id()).expect("join");
        session.save_player(&player).await.expect("save");

        assert!(session.delete_game(game.id()).await.is_err());

        player.leave_game();
        session.save_player(&player).await.expect("save");
        session.delete_game(game.id()).await.expect("delete");
        assert!(session.load_game(game.id()).await.expect("load").is_none());
    }

    #[tokio::test]
    async fn texts_and_votes_are_queried_per_game() {
        let store = store();
        let mut session = store.begin().await.expect("begin");
        let game = session
            .create_game(tag("evening"), GameKind::Poetic)
            .await
            .expect("game");

        let mut alice = session.create_player(PlayerId::new(1)).await.expect("alice");
        let mut bob = session.create_player(PlayerId::new(2)).await.expect("bob");
        let outsider = session.create_player(PlayerId::new(3)).await.expect("outsider");
        alice.join_game(game.id()).expect("join");
        bob.join_game(game.id()).expect("join");
        bob.vote_for(&alice).expect("vote");
        for p in [&alice, &bob] {
            session.save_player(p).await.expect("save");
        }

        let text = GameText::new("и в воздухе весна").expect("text");
        session
            .save_player_text(alice.id(), Some(&text))
            .await
            .expect("text");
        session
            .save_player_text(outsider.id(), Some(&text))
            .await
            .expect("text");

        let texts = session.player_texts(game.id()).await.expect("texts");
        assert_eq!(texts, vec![(alice.id(), text)]);

        let voters = session.voters_for(alice.id()).await.expect("voters");
        assert_eq!(voters.len(), 1);
        assert_eq!(voters[0].id(), bob.id());
    }

    #[tokio::test]
    async fn uncommitted_writes_are_invisible_to_other_sessions() {
        let store = store();
        let mut writer = store.begin().await.expect("begin");
        writer.create_player(PlayerId::new(1)).await.expect("create");

        let mut reader = store.begin().await.expect("begin");
        assert!(reader
            .load_player(PlayerId::new(1))
            .await
            .expect("load")
            .is_none());

        writer.commit().await.expect("commit");
        assert!(reader
            .load_player(PlayerId::new(1))
            .await
            .expect("load")
            .is_some());
    }

    #[tokio::test]
    async fn locks_on_different_games_do_not_wait_for_each_other() {
        let store = store();
        let mut setup = store.begin().await.expect("begin");
        let evening = setup
            .create_game(tag("evening"), GameKind::Poetic)
            .await
            .expect("game");
        let morning = setup
            .create_game(tag("morning"), GameKind::Poetic)
            .await
            .expect("game");
        setup.commit().await.expect("commit");

        let mut first = store.begin().await.expect("begin");
        first.lock_game(evening.id()).await.expect("lock");

        let mut second = store.begin().await.expect("begin");
        tokio::time::timeout(Duration::from_secs(1), second.lock_game(morning.id()))
            .await
            .expect("other game is not blocked")
            .expect("lock");
        // Relocking a game the session already holds is a no-op
        tokio::time::timeout(Duration::from_secs(1), first.lock_game(evening.id()))
            .await
            .expect("reentrant lock")
            .expect("lock");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn locks_on_one_game_are_serialized() {
        let store = Arc::new(store());
        let mut setup = store.begin().await.expect("begin");
        let game = setup
            .create_game(tag("evening"), GameKind::Poetic)
            .await
            .expect("game");
        setup.commit().await.expect("commit");

        let mut first = store.begin().await.expect("begin");
        first.lock_game(game.id()).await.expect("lock");
        let mut host = first.create_player(PlayerId::new(1)).await.expect("player");
        host.join_game(game.id()).expect("join");
        host.become_host().expect("host");
        first.save_player(&host).await.expect("save");

        let second_store = store.clone();
        let second = tokio::spawn(async move {
            let mut session = second_store.begin().await.expect("begin");
            session.lock_game(game.id()).await.expect("lock");
            session.players_in_game(game.id()).await.expect("players")
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!second.is_finished());

        first.commit().await.expect("commit");
        let seen = second.await.expect("join");
        assert_eq!(seen.len(), 1);
        assert!(seen[0].is_host());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_creators_of_one_tag_see_a_duplicate() {
        let store = Arc::new(store());
        let mut first = store.begin().await.expect("begin");
        first
            .create_game(tag("evening"), GameKind::Poetic)
            .await
            .expect("create");

        let second_store = store.clone();
        let second = tokio::spawn(async move {
            let mut session = second_store.begin().await.expect("begin");
            session.create_game(tag("evening"), GameKind::Poetic).await
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!second.is_finished());

        first.commit().await.expect("commit");
        let err = second.await.expect("join").expect_err("duplicate");
        assert!(err.is_duplicate());
        assert_eq!(store.game_count().await, 1);
    }

    #[tokio::test]
    async fn released_locks_are_forgotten() {
        let store = store();
        let mut session = store.begin().await.expect("begin");
        let game = session
            .create_game(tag("evening"), GameKind::Poetic)
            .await
            .expect("game");
        session.lock_game(game.id()).await.expect("lock");
        assert_eq!(store.locks.len(), 2);

        session.commit().await.expect("commit");
        assert!(store.locks.is_empty());
    }
}
