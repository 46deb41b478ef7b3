use crate::error::StorageError;
use crate::{AnalysisKind, AnalysisRecord, StoredSummary};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

type Result<T> = std::result::Result<T, StorageError>;

/// Reduced texts and analysis results, one SQLite file per home
pub struct SummaryDb {
    conn: Connection,
}

impl SummaryDb {
    pub fn new(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                text_tokens INTEGER NOT NULL,
                summarized_text TEXT NOT NULL,
                encoding TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS analyses (
                document_id TEXT NOT NULL REFERENCES documents(id),
                analysis_type TEXT NOT NULL,
                provider TEXT NOT NULL,
                result TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_analyses_document ON analyses(document_id);
            CREATE INDEX IF NOT EXISTS idx_documents_updated ON documents(updated_at);
            ",
        )?;
        Ok(())
    }

    /// Insert or replace the reduced text of a document
    pub fn upsert_summary(&self, summary: &StoredSummary) -> Result<()> {
        self.conn.execute(
            "INSERT INTO documents (id, title, text_tokens, summarized_text, encoding, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                text_tokens = excluded.text_tokens,
                summarized_text = excluded.summarized_text,
                encoding = excluded.encoding,
                updated_at = excluded.updated_at",
            params![
                summary.document_id,
                summary.title,
                summary.text_tokens,
                summary.summarized_text,
                summary.encoding,
                format_timestamp(summary.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_summary(&self, document_id: &str) -> Result<Option<StoredSummary>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, title, text_tokens, summarized_text, encoding, updated_at
                 FROM documents WHERE id = ?",
                params![document_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        row.map(
            |(document_id, title, text_tokens, summarized_text, encoding, updated_at)| {
                Ok(StoredSummary {
                    document_id,
                    title,
                    text_tokens,
                    summarized_text,
                    encoding,
                    updated_at: parse_timestamp(&updated_at)?,
                })
            },
        )
        .transpose()
    }

    /// Stored summaries, most recently updated first
    pub fn list_summaries(&self) -> Result<Vec<StoredSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, text_tokens, summarized_text, encoding, updated_at
             FROM documents ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (document_id, title, text_tokens, summarized_text, encoding, updated_at) = row?;
            summaries.push(StoredSummary {
                document_id,
                title,
                text_tokens,
                summarized_text,
                encoding,
                updated_at: parse_timestamp(&updated_at)?,
            });
        }
        Ok(summaries)
    }

    pub fn insert_analysis(&self, record: &AnalysisRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO analyses (document_id, analysis_type, provider, result, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.document_id,
                record.kind.name(),
                record.provider,
                record.result,
                format_timestamp(record.created_at),
            ],
        )?;
        Ok(())
    }

    /// Analyses of a document, oldest first
    pub fn analyses_for(&self, document_id: &str) -> Result<Vec<AnalysisRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT document_id, analysis_type, provider, result, created_at
             FROM analyses WHERE document_id = ?1 ORDER BY created_at, rowid",
        )?;
        let rows = stmt.query_map(params![document_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (document_id, kind, provider, result, created_at) = row?;
            records.push(AnalysisRecord {
                document_id,
                kind: kind.parse().unwrap_or(AnalysisKind::Custom),
                provider,
                result,
                created_at: parse_timestamp(&created_at)?,
            });
        }
        Ok(records)
    }
}

/// Fixed-width so text ordering matches time ordering
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}
