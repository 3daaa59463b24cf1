//! SQLite-backed media store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use super::{
    Episode, EpisodePatch, EpisodeStatus, MediaStore, MediaType, MetadataSource, NewEpisode,
    NewProfile, NewSubscription, NewTorrent, Profile, StoreError, Subscription,
    SubscriptionPatch, SubscriptionStatus, TorrentPatch, TorrentRecord, TorrentStatus,
};

const SUBSCRIPTION_COLUMNS: &str = "id, source, external_id, media_type, title, season, status, profile_id, library_path, file_path, created_at, updated_at";
const EPISODE_COLUMNS: &str = "id, subscription_id, season, episode_number, name, overview, still_path, air_date, status, torrent_hash, file_path, created_at, updated_at";
const TORRENT_COLUMNS: &str =
    "id, subscription_id, episode_id, title, link, hash, status, created_at, updated_at";
const PROFILE_COLUMNS: &str = "id, name, resolutions, qualities, formats, encoders, preferred_keywords, excluded_keywords, min_size_mb, max_size_mb";

/// SQLite-backed media store.
pub struct SqliteMediaStore {
    conn: Mutex<Connection>,
}

impl SqliteMediaStore {
    /// Open (or create) the database file and its tables.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(db_error)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(db_error)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                resolutions TEXT NOT NULL DEFAULT '[]',
                qualities TEXT NOT NULL DEFAULT '[]',
                formats TEXT NOT NULL DEFAULT '[]',
                encoders TEXT NOT NULL DEFAULT '[]',
                preferred_keywords TEXT NOT NULL DEFAULT '[]',
                excluded_keywords TEXT NOT NULL DEFAULT '[]',
                min_size_mb REAL,
                max_size_mb REAL
            );

            CREATE TABLE IF NOT EXISTS subscriptions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source TEXT NOT NULL,
                external_id TEXT NOT NULL,
                media_type TEXT NOT NULL,
                title TEXT NOT NULL,
                season INTEGER,
                status TEXT NOT NULL,
                profile_id INTEGER,
                library_path TEXT,
                file_path TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS episodes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                subscription_id INTEGER NOT NULL REFERENCES subscriptions(id) ON DELETE CASCADE,
                season INTEGER,
                episode_number INTEGER NOT NULL,
                name TEXT,
                overview TEXT,
                still_path TEXT,
                air_date TEXT,
                status TEXT NOT NULL,
                torrent_hash TEXT,
                file_path TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS torrents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                subscription_id INTEGER NOT NULL REFERENCES subscriptions(id) ON DELETE CASCADE,
                episode_id INTEGER REFERENCES episodes(id) ON DELETE SET NULL,
                title TEXT NOT NULL,
                link TEXT NOT NULL,
                hash TEXT,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_episodes_subscription ON episodes(subscription_id);
            CREATE INDEX IF NOT EXISTS idx_torrents_subscription ON torrents(subscription_id);
            CREATE INDEX IF NOT EXISTS idx_torrents_episode ON torrents(episode_id);
            CREATE INDEX IF NOT EXISTS idx_torrents_link ON torrents(link);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_torrents_hash
                ON torrents(hash) WHERE hash IS NOT NULL;
            "#,
        )
        .map_err(db_error)?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection mutex poisoned".to_string()))
    }

    fn row_to_subscription(row: &rusqlite::Row) -> rusqlite::Result<Subscription> {
        let source: String = row.get(1)?;
        let media_type: String = row.get(3)?;
        let status: String = row.get(6)?;
        let created_at: String = row.get(10)?;
        let updated_at: String = row.get(11)?;

        Ok(Subscription {
            id: row.get(0)?,
            source: decode(1, &source, MetadataSource::parse)?,
            external_id: row.get(2)?,
            media_type: decode(3, &media_type, MediaType::parse)?,
            title: row.get(4)?,
            season: row.get(5)?,
            status: decode(6, &status, SubscriptionStatus::parse)?,
            profile_id: row.get(7)?,
            library_path: row.get(8)?,
            file_path: row.get(9)?,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }

    fn row_to_episode(row: &rusqlite::Row) -> rusqlite::Result<Episode> {
        let status: String = row.get(8)?;
        let created_at: String = row.get(11)?;
        let updated_at: String = row.get(12)?;

        Ok(Episode {
            id: row.get(0)?,
            subscription_id: row.get(1)?,
            season: row.get(2)?,
            episode_number: row.get(3)?,
            name: row.get(4)?,
            overview: row.get(5)?,
            still_path: row.get(6)?,
            air_date: row.get(7)?,
            status: decode(8, &status, EpisodeStatus::parse)?,
            torrent_hash: row.get(9)?,
            file_path: row.get(10)?,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }

    fn row_to_torrent(row: &rusqlite::Row) -> rusqlite::Result<TorrentRecord> {
        let status: String = row.get(6)?;
        let created_at: String = row.get(7)?;
        let updated_at: String = row.get(8)?;

        Ok(TorrentRecord {
            id: row.get(0)?,
            subscription_id: row.get(1)?,
            episode_id: row.get(2)?,
            title: row.get(3)?,
            link: row.get(4)?,
            hash: row.get(5)?,
            status: decode(6, &status, TorrentStatus::parse)?,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }

    fn row_to_profile(row: &rusqlite::Row) -> rusqlite::Result<Profile> {
        Ok(Profile {
            id: row.get(0)?,
            name: row.get(1)?,
            resolutions: decode_list(row, 2)?,
            qualities: decode_list(row, 3)?,
            formats: decode_list(row, 4)?,
            encoders: decode_list(row, 5)?,
            preferred_keywords: decode_list(row, 6)?,
            excluded_keywords: decode_list(row, 7)?,
            min_size_mb: row.get(8)?,
            max_size_mb: row.get(9)?,
        })
    }

    fn fetch_subscription(conn: &Connection, id: i64) -> Result<Option<Subscription>, StoreError> {
        conn.query_row(
            &format!("SELECT {} FROM subscriptions WHERE id = ?", SUBSCRIPTION_COLUMNS),
            params![id],
            Self::row_to_subscription,
        )
        .optional()
        .map_err(db_error)
    }

    fn fetch_episode(conn: &Connection, id: i64) -> Result<Option<Episode>, StoreError> {
        conn.query_row(
            &format!("SELECT {} FROM episodes WHERE id = ?", EPISODE_COLUMNS),
            params![id],
            Self::row_to_episode,
        )
        .optional()
        .map_err(db_error)
    }

    fn fetch_torrent(conn: &Connection, id: i64) -> Result<Option<TorrentRecord>, StoreError> {
        conn.query_row(
            &format!("SELECT {} FROM torrents WHERE id = ?", TORRENT_COLUMNS),
            params![id],
            Self::row_to_torrent,
        )
        .optional()
        .map_err(db_error)
    }

    fn find_torrent_where(
        &self,
        clause: &str,
        value: &dyn rusqlite::ToSql,
    ) -> Result<Option<TorrentRecord>, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT {} FROM torrents WHERE {} ORDER BY id ASC LIMIT 1",
                TORRENT_COLUMNS, clause
            ),
            &[value],
            Self::row_to_torrent,
        )
        .optional()
        .map_err(db_error)
    }
}

impl MediaStore for SqliteMediaStore {
    fn list_active_subscriptions(&self) -> Result<Vec<Subscription>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM subscriptions WHERE status != 'disabled' ORDER BY id ASC",
                SUBSCRIPTION_COLUMNS
            ))
            .map_err(db_error)?;

        let rows = stmt
            .query_map([], Self::row_to_subscription)
            .map_err(db_error)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(db_error)
    }

    fn get_subscription(&self, id: i64) -> Result<Option<Subscription>, StoreError> {
        let conn = self.conn()?;
        Self::fetch_subscription(&conn, id)
    }

    fn create_subscription(&self, request: NewSubscription) -> Result<Subscription, StoreError> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO subscriptions (source, external_id, media_type, title, season, status, profile_id, library_path, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                request.source.as_str(),
                request.external_id,
                request.media_type.as_str(),
                request.title,
                request.season,
                SubscriptionStatus::Active.as_str(),
                request.profile_id,
                request.library_path,
                now,
                now,
            ],
        )
        .map_err(db_error)?;

        let id = conn.last_insert_rowid();
        Self::fetch_subscription(&conn, id)?.ok_or(StoreError::NotFound {
            entity: "subscription",
            id,
        })
    }

    fn update_subscription(
        &self,
        id: i64,
        patch: SubscriptionPatch,
    ) -> Result<Subscription, StoreError> {
        let conn = self.conn()?;

        let changed = conn
            .execute(
                "UPDATE subscriptions SET status = COALESCE(?, status), file_path = COALESCE(?, file_path), updated_at = ? WHERE id = ?",
                params![
                    patch.status.map(|s| s.as_str()),
                    patch.file_path,
                    Utc::now().to_rfc3339(),
                    id,
                ],
            )
            .map_err(db_error)?;

        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "subscription",
                id,
            });
        }

        Self::fetch_subscription(&conn, id)?.ok_or(StoreError::NotFound {
            entity: "subscription",
            id,
        })
    }

    fn list_episodes(&self, subscription_id: i64) -> Result<Vec<Episode>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM episodes WHERE subscription_id = ? ORDER BY season ASC, episode_number ASC, id ASC",
                EPISODE_COLUMNS
            ))
            .map_err(db_error)?;

        let rows = stmt
            .query_map(params![subscription_id], Self::row_to_episode)
            .map_err(db_error)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(db_error)
    }

    fn create_episode(&self, request: NewEpisode) -> Result<Episode, StoreError> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO episodes (subscription_id, season, episode_number, name, overview, still_path, air_date, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                request.subscription_id,
                request.season,
                request.episode_number,
                request.name,
                request.overview,
                request.still_path,
                request.air_date,
                request.status.as_str(),
                now,
                now,
            ],
        )
        .map_err(db_error)?;

        let id = conn.last_insert_rowid();
        Self::fetch_episode(&conn, id)?.ok_or(StoreError::NotFound {
            entity: "episode",
            id,
        })
    }

    fn update_episode(&self, id: i64, patch: EpisodePatch) -> Result<Episode, StoreError> {
        let conn = self.conn()?;

        let changed = conn
            .execute(
                "UPDATE episodes SET status = COALESCE(?, status), torrent_hash = COALESCE(?, torrent_hash), file_path = COALESCE(?, file_path), updated_at = ? WHERE id = ?",
                params![
                    patch.status.map(|s| s.as_str()),
                    patch.torrent_hash,
                    patch.file_path,
                    Utc::now().to_rfc3339(),
                    id,
                ],
            )
            .map_err(db_error)?;

        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "episode",
                id,
            });
        }

        Self::fetch_episode(&conn, id)?.ok_or(StoreError::NotFound {
            entity: "episode",
            id,
        })
    }

    fn list_torrents(&self, subscription_id: i64) -> Result<Vec<TorrentRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM torrents WHERE subscription_id = ? ORDER BY id ASC",
                TORRENT_COLUMNS
            ))
            .map_err(db_error)?;

        let rows = stmt
            .query_map(params![subscription_id], Self::row_to_torrent)
            .map_err(db_error)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(db_error)
    }

    fn create_torrent(&self, request: NewTorrent) -> Result<TorrentRecord, StoreError> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();
        let hash = request.hash.map(|h| h.to_lowercase());

        conn.execute(
            "INSERT INTO torrents (subscription_id, episode_id, title, link, hash, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                request.subscription_id,
                request.episode_id,
                request.title,
                request.link,
                hash,
                request.status.as_str(),
                now,
                now,
            ],
        )
        .map_err(db_error)?;

        let id = conn.last_insert_rowid();
        Self::fetch_torrent(&conn, id)?.ok_or(StoreError::NotFound {
            entity: "torrent",
            id,
        })
    }

    fn update_torrent(&self, id: i64, patch: TorrentPatch) -> Result<TorrentRecord, StoreError> {
        let conn = self.conn()?;

        let changed = conn
            .execute(
                "UPDATE torrents SET status = COALESCE(?, status), hash = COALESCE(?, hash), updated_at = ? WHERE id = ?",
                params![
                    patch.status.map(|s| s.as_str()),
                    patch.hash.map(|h| h.to_lowercase()),
                    Utc::now().to_rfc3339(),
                    id,
                ],
            )
            .map_err(db_error)?;

        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "torrent",
                id,
            });
        }

        Self::fetch_torrent(&conn, id)?.ok_or(StoreError::NotFound {
            entity: "torrent",
            id,
        })
    }

    fn find_torrent_by_hash(&self, hash: &str) -> Result<Option<TorrentRecord>, StoreError> {
        self.find_torrent_where("hash = ?", &hash.to_lowercase())
    }

    fn find_torrent_by_link(&self, link: &str) -> Result<Option<TorrentRecord>, StoreError> {
        self.find_torrent_where("link = ?", &link)
    }

    fn find_torrent_by_episode(
        &self,
        episode_id: i64,
    ) -> Result<Option<TorrentRecord>, StoreError> {
        self.find_torrent_where("episode_id = ?", &episode_id)
    }

    fn get_profile(&self, id: i64) -> Result<Option<Profile>, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM profiles WHERE id = ?", PROFILE_COLUMNS),
            params![id],
            Self::row_to_profile,
        )
        .optional()
        .map_err(db_error)
    }

    fn create_profile(&self, request: NewProfile) -> Result<Profile, StoreError> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO profiles (name, resolutions, qualities, formats, encoders, preferred_keywords, excluded_keywords, min_size_mb, max_size_mb) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                request.name,
                encode_list(&request.resolutions)?,
                encode_list(&request.qualities)?,
                encode_list(&request.formats)?,
                encode_list(&request.encoders)?,
                encode_list(&request.preferred_keywords)?,
                encode_list(&request.excluded_keywords)?,
                request.min_size_mb,
                request.max_size_mb,
            ],
        )
        .map_err(db_error)?;

        Ok(Profile {
            id: conn.last_insert_rowid(),
            name: request.name,
            resolutions: request.resolutions,
            qualities: request.qualities,
            formats: request.formats,
            encoders: request.encoders,
            preferred_keywords: request.preferred_keywords,
            excluded_keywords: request.excluded_keywords,
            min_size_mb: request.min_size_mb,
            max_size_mb: request.max_size_mb,
        })
    }
}

fn db_error(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::SqliteFailure(ref err, _) if err.code == ErrorCode::ConstraintViolation => {
            StoreError::Conflict(e.to_string())
        }
        rusqlite::Error::FromSqlConversionFailure(_, _, ref inner) => {
            StoreError::InvalidData(inner.to_string())
        }
        e => StoreError::Database(e.to_string()),
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn decode<T>(idx: usize, raw: &str, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    parse(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown value '{}' in column {}", raw, idx).into(),
        )
    })
}

/// Profile lists are stored as JSON arrays; NULL or empty text reads as an empty list.
fn decode_list(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: Option<String> = row.get(idx)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(json) => serde_json::from_str(json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Text,
                format!("profile list column {}: {}", idx, e).into(),
            )
        }),
    }
}

fn encode_list(values: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(values).map_err(|e| StoreError::InvalidData(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteMediaStore {
        SqliteMediaStore::in_memory().unwrap()
    }

    fn create_show(store: &SqliteMediaStore) -> Subscription {
        store
            .create_subscription(NewSubscription::tv("1399", "Test Show").with_season(1))
            .unwrap()
    }

    fn new_episode(subscription_id: i64, number: u32) -> NewEpisode {
        NewEpisode {
            subscription_id,
            season: Some(1),
            episode_number: number,
            name: Some(format!("Episode {}", number)),
            overview: None,
            still_path: None,
            air_date: Some("2024-01-01".to_string()),
            status: EpisodeStatus::Pending,
        }
    }

    fn new_torrent(subscription_id: i64, episode_id: Option<i64>, hash: &str) -> NewTorrent {
        NewTorrent {
            subscription_id,
            episode_id,
            title: "Test Show S01E01 1080p".to_string(),
            link: format!("magnet:?xt=urn:btih:{}", hash),
            hash: Some(hash.to_string()),
            status: TorrentStatus::Downloading,
        }
    }

    #[test]
    fn test_create_and_get_subscription() {
        let store = create_test_store();
        let sub = create_show(&store);

        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.season, Some(1));
        assert_eq!(sub.media_type, MediaType::Tv);

        let fetched = store.get_subscription(sub.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Test Show");
        assert!(store.get_subscription(9999).unwrap().is_none());
    }

    #[test]
    fn test_list_active_excludes_disabled() {
        let store = create_test_store();
        let a = create_show(&store);
        let b = store
            .create_subscription(NewSubscription::movie("603", "The Matrix"))
            .unwrap();
        store
            .update_subscription(b.id, SubscriptionPatch::status(SubscriptionStatus::Disabled))
            .unwrap();
        let c = store
            .create_subscription(NewSubscription::movie("604", "Reloaded"))
            .unwrap();
        store
            .update_subscription(
                c.id,
                SubscriptionPatch::status(SubscriptionStatus::Completed),
            )
            .unwrap();

        let active: Vec<i64> = store
            .list_active_subscriptions()
            .unwrap()
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(active, vec![a.id, c.id]);
    }

    #[test]
    fn test_update_subscription_keeps_unpatched_fields() {
        let store = create_test_store();
        let sub = store
            .create_subscription(NewSubscription::movie("603", "The Matrix"))
            .unwrap();

        let updated = store
            .update_subscription(
                sub.id,
                SubscriptionPatch::status(SubscriptionStatus::Completed)
                    .with_file_path("/media/Movies/The Matrix/The Matrix.mkv"),
            )
            .unwrap();
        assert_eq!(updated.status, SubscriptionStatus::Completed);
        assert_eq!(
            updated.file_path.as_deref(),
            Some("/media/Movies/The Matrix/The Matrix.mkv")
        );

        let again = store
            .update_subscription(sub.id, SubscriptionPatch::default())
            .unwrap();
        assert!(again.file_path.is_some());
    }

    #[test]
    fn test_update_missing_subscription() {
        let store = create_test_store();
        let result = store.update_subscription(42, SubscriptionPatch::default());
        assert!(matches!(result, Err(StoreError::NotFound { id: 42, .. })));
    }

    #[test]
    fn test_list_episodes_ordered() {
        let store = create_test_store();
        let sub = create_show(&store);
        store.create_episode(new_episode(sub.id, 3)).unwrap();
        store.create_episode(new_episode(sub.id, 1)).unwrap();
        store
            .create_episode(NewEpisode {
                season: Some(2),
                ..new_episode(sub.id, 1)
            })
            .unwrap();

        let episodes = store.list_episodes(sub.id).unwrap();
        let order: Vec<(Option<u32>, u32)> = episodes
            .iter()
            .map(|e| (e.season, e.episode_number))
            .collect();
        assert_eq!(order, vec![(Some(1), 1), (Some(1), 3), (Some(2), 1)]);
    }

    #[test]
    fn test_update_episode() {
        let store = create_test_store();
        let sub = create_show(&store);
        let ep = store.create_episode(new_episode(sub.id, 1)).unwrap();

        let updated = store
            .update_episode(
                ep.id,
                EpisodePatch::status(EpisodeStatus::Downloading)
                    .with_torrent_hash(Some("abc".to_string())),
            )
            .unwrap();
        assert_eq!(updated.status, EpisodeStatus::Downloading);
        assert_eq!(updated.torrent_hash.as_deref(), Some("abc"));
        assert!(updated.file_path.is_none());
    }

    #[test]
    fn test_torrent_lookups() {
        let store = create_test_store();
        let sub = create_show(&store);
        let ep = store.create_episode(new_episode(sub.id, 1)).unwrap();
        let t = store
            .create_torrent(new_torrent(sub.id, Some(ep.id), "ABCDEF"))
            .unwrap();

        assert_eq!(t.hash.as_deref(), Some("abcdef"));
        assert_eq!(store.find_torrent_by_hash("AbCdEf").unwrap().unwrap().id, t.id);
        assert_eq!(
            store
                .find_torrent_by_link("magnet:?xt=urn:btih:ABCDEF")
                .unwrap()
                .unwrap()
                .id,
            t.id
        );
        assert_eq!(store.find_torrent_by_episode(ep.id).unwrap().unwrap().id, t.id);
        assert!(store.find_torrent_by_hash("other").unwrap().is_none());
        assert_eq!(store.list_torrents(sub.id).unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_hash_is_conflict() {
        let store = create_test_store();
        let sub = create_show(&store);
        store.create_torrent(new_torrent(sub.id, None, "dup")).unwrap();

        let result = store.create_torrent(new_torrent(sub.id, None, "DUP"));
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[test]
    fn test_null_hashes_do_not_conflict() {
        let store = create_test_store();
        let sub = create_show(&store);
        for _ in 0..2 {
            store
                .create_torrent(NewTorrent {
                    hash: None,
                    link: "https://example.org/a.torrent".to_string(),
                    ..new_torrent(sub.id, None, "unused")
                })
                .unwrap();
        }
        assert_eq!(store.list_torrents(sub.id).unwrap().len(), 2);
    }

    #[test]
    fn test_update_torrent_status() {
        let store = create_test_store();
        let sub = create_show(&store);
        let t = store.create_torrent(new_torrent(sub.id, None, "h1")).unwrap();

        let updated = store
            .update_torrent(t.id, TorrentPatch::status(TorrentStatus::Completed))
            .unwrap();
        assert_eq!(updated.status, TorrentStatus::Completed);
        assert_eq!(updated.hash.as_deref(), Some("h1"));
    }

    #[test]
    fn test_profile_round_trip() {
        let store = create_test_store();
        let profile = store
            .create_profile(NewProfile {
                name: "HD".to_string(),
                resolutions: vec!["1080p".to_string()],
                excluded_keywords: vec!["cam".to_string()],
                min_size_mb: Some(100.0),
                ..Default::default()
            })
            .unwrap();

        let fetched = store.get_profile(profile.id).unwrap().unwrap();
        assert_eq!(fetched, profile);
        assert!(store.get_profile(999).unwrap().is_none());
    }

    #[test]
    fn test_malformed_profile_list_is_invalid_data() {
        let store = create_test_store();
        let profile = store
            .create_profile(NewProfile {
                name: "Broken".to_string(),
                ..Default::default()
            })
            .unwrap();
        store
            .conn()
            .unwrap()
            .execute(
                "UPDATE profiles SET resolutions = 'not json' WHERE id = ?",
                params![profile.id],
            )
            .unwrap();

        let result = store.get_profile(profile.id);
        assert!(matches!(result, Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn test_file_based_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("showrunner.db");

        let id = {
            let store = SqliteMediaStore::new(&path).unwrap();
            create_show(&store).id
        };

        let store = SqliteMediaStore::new(&path).unwrap();
        assert!(store.get_subscription(id).unwrap().is_some());
    }
}
