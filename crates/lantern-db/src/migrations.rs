use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Community submissions under moderation. created_at doubles as the
        -- pagination cursor, so it is written by the application with
        -- sub-second precision rather than defaulted by SQLite.
        CREATE TABLE IF NOT EXISTS submissions (
            id              TEXT PRIMARY KEY,
            type            TEXT NOT NULL CHECK (type IN ('feedback', 'suggestion', 'resource')),
            status          TEXT NOT NULL DEFAULT 'pending'
                            CHECK (status IN ('pending', 'approved', 'rejected', 'spam', 'added')),
            is_deleted      INTEGER NOT NULL DEFAULT 0,
            title           TEXT NOT NULL,
            message         TEXT,
            url             TEXT,
            resource_type   TEXT CHECK (resource_type IN ('video', 'article')),
            admin_notes     TEXT,
            name            TEXT,
            email           TEXT,
            context_title   TEXT,
            context_url     TEXT,
            target_type     TEXT CHECK (target_type IN ('course', 'roadmap')),
            target_day_id   TEXT REFERENCES days(id),
            target_topic_id TEXT REFERENCES topics(id),
            created_at      TEXT NOT NULL,
            CHECK ((url IS NULL) = (type != 'resource')),
            CHECK (target_type IS NOT NULL OR (target_day_id IS NULL AND target_topic_id IS NULL)),
            CHECK (target_type IS NULL
                   OR (target_type = 'course' AND target_day_id IS NOT NULL AND target_topic_id IS NULL)
                   OR (target_type = 'roadmap' AND target_topic_id IS NOT NULL AND target_day_id IS NULL))
        );

        CREATE INDEX IF NOT EXISTS idx_submissions_partition
            ON submissions(type, status, is_deleted, created_at);

        CREATE INDEX IF NOT EXISTS idx_submissions_email
            ON submissions(email);

        -- Course hierarchy: category -> course -> day, with lessons as
        -- the leaf items a conversion appends.
        CREATE TABLE IF NOT EXISTS categories (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            position    INTEGER NOT NULL DEFAULT 0,
            published   INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS courses (
            id          TEXT PRIMARY KEY,
            category_id TEXT NOT NULL REFERENCES categories(id),
            title       TEXT NOT NULL,
            position    INTEGER NOT NULL DEFAULT 0,
            published   INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS days (
            id          TEXT PRIMARY KEY,
            course_id   TEXT NOT NULL REFERENCES courses(id),
            title       TEXT NOT NULL,
            position    INTEGER NOT NULL DEFAULT 0,
            published   INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS lessons (
            id          TEXT PRIMARY KEY,
            day_id      TEXT NOT NULL REFERENCES days(id),
            title       TEXT NOT NULL,
            url         TEXT NOT NULL,
            type        TEXT NOT NULL CHECK (type IN ('video', 'article')),
            position    INTEGER NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_lessons_day
            ON lessons(day_id, position);

        -- Roadmap hierarchy: track -> topic, with resources as the leaf.
        CREATE TABLE IF NOT EXISTS tracks (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            position    INTEGER NOT NULL DEFAULT 0,
            published   INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS topics (
            id          TEXT PRIMARY KEY,
            track_id    TEXT NOT NULL REFERENCES tracks(id),
            title       TEXT NOT NULL,
            position    INTEGER NOT NULL DEFAULT 0,
            published   INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS resources (
            id          TEXT PRIMARY KEY,
            topic_id    TEXT NOT NULL REFERENCES topics(id),
            title       TEXT NOT NULL,
            url         TEXT NOT NULL,
            type        TEXT NOT NULL CHECK (type IN ('video', 'article')),
            position    INTEGER NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_resources_topic
            ON resources(topic_id, position);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
