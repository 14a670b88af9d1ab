use crate::course::CourseTree;
use crate::map::CompanionDescriptor;
use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE_NAME: &str = "lessonmap.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses(
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            tree_json TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS companions(
            user_id TEXT PRIMARY KEY,
            animation_asset_url TEXT,
            updated_at TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS player_positions(
            course_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            lesson_id TEXT NOT NULL,
            updated_at TEXT,
            PRIMARY KEY(course_id, user_id),
            FOREIGN KEY(course_id) REFERENCES courses(id) ON DELETE CASCADE
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_player_positions_user ON player_positions(user_id)",
        [],
    )?;

    Ok(conn)
}

fn now_ts() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub fn settings_get_json(
    conn: &Connection,
    key: &str,
) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |row| row.get(0),
        )
        .optional()?;
    match raw {
        Some(s) => Ok(Some(
            serde_json::from_str(&s)
                .with_context(|| format!("settings {} is not valid json", key))?,
        )),
        None => Ok(None),
    }
}

pub fn settings_set_json(
    conn: &Connection,
    key: &str,
    value: &serde_json::Value,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        params![key, serde_json::to_string(value)?],
    )?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct CourseRow {
    pub id: String,
    pub title: String,
    pub tree: CourseTree,
    pub updated_at: Option<String>,
}

pub fn course_put(conn: &Connection, id: &str, tree: &CourseTree) -> anyhow::Result<()> {
    let tree_json = serde_json::to_string(tree).context("failed to serialize course tree")?;
    conn.execute(
        "INSERT INTO courses(id, title, tree_json, updated_at) VALUES(?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
           title = excluded.title,
           tree_json = excluded.tree_json,
           updated_at = excluded.updated_at",
        params![id, tree.title, tree_json, now_ts()],
    )?;
    Ok(())
}

pub fn course_get(conn: &Connection, id: &str) -> anyhow::Result<Option<CourseRow>> {
    let row: Option<(String, String, String, Option<String>)> = conn
        .query_row(
            "SELECT id, title, tree_json, updated_at FROM courses WHERE id = ?",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()?;
    let Some((id, title, tree_json, updated_at)) = row else {
        return Ok(None);
    };
    let mut tree: CourseTree = serde_json::from_str(&tree_json)
        .with_context(|| format!("stored course {} is not a valid course tree", id))?;
    tree.id = Some(id.clone());
    Ok(Some(CourseRow {
        id,
        title,
        tree,
        updated_at,
    }))
}

pub fn courses_list(conn: &Connection) -> anyhow::Result<Vec<CourseRow>> {
    let mut stmt =
        conn.prepare("SELECT id FROM courses ORDER BY title COLLATE NOCASE, id")?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(row) = course_get(conn, &id)? {
            out.push(row);
        }
    }
    Ok(out)
}

pub fn companion_get(
    conn: &Connection,
    user_id: &str,
) -> anyhow::Result<Option<CompanionDescriptor>> {
    let url: Option<Option<String>> = conn
        .query_row(
            "SELECT animation_asset_url FROM companions WHERE user_id = ?",
            [user_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(url.map(|animation_asset_url| CompanionDescriptor {
        animation_asset_url,
    }))
}

pub fn companion_set(
    conn: &Connection,
    user_id: &str,
    companion: Option<&CompanionDescriptor>,
) -> anyhow::Result<()> {
    match companion {
        Some(c) => {
            conn.execute(
                "INSERT INTO companions(user_id, animation_asset_url, updated_at) VALUES(?, ?, ?)
                 ON CONFLICT(user_id) DO UPDATE SET
                   animation_asset_url = excluded.animation_asset_url,
                   updated_at = excluded.updated_at",
                params![user_id, c.animation_asset_url, now_ts()],
            )?;
        }
        None => {
            conn.execute("DELETE FROM companions WHERE user_id = ?", [user_id])?;
        }
    }
    Ok(())
}

/// Records the learner's chosen position with the lesson service.
pub fn player_position_confirm(
    conn: &Connection,
    course_id: &str,
    user_id: &str,
    lesson_id: &str,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO player_positions(course_id, user_id, lesson_id, updated_at) VALUES(?, ?, ?, ?)
         ON CONFLICT(course_id, user_id) DO UPDATE SET
           lesson_id = excluded.lesson_id,
           updated_at = excluded.updated_at",
        params![course_id, user_id, lesson_id, now_ts()],
    )
    .with_context(|| format!("failed to record position for course {}", course_id))?;
    Ok(())
}

pub fn player_position_get(
    conn: &Connection,
    course_id: &str,
    user_id: &str,
) -> anyhow::Result<Option<String>> {
    Ok(conn
        .query_row(
            "SELECT lesson_id FROM player_positions WHERE course_id = ? AND user_id = ?",
            params![course_id, user_id],
            |row| row.get(0),
        )
        .optional()?)
}
