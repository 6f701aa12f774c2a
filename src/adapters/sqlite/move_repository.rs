//! SQLite implementation of the MoveRepository.
//!
//! A move is stored across three tables: the move row, one row per task
//! (ordered by `position`) and one row per compression record (ordered by
//! `seq`). Saving rewrites the task rows and appends unseen records.

use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use super::{parse_date, parse_datetime, parse_json_or_default, parse_optional_datetime, parse_optional_uuid, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CompressionActionKind, CompressionLog, CompressionRecord, MoveStatus, Plan, Recommendation, Task, TaskKind,
    TaskStatus,
};
use crate::domain::ports::{MoveFilter, MoveRepository};

#[derive(Clone)]
pub struct SqliteMoveRepository {
    pool: SqlitePool,
}

impl SqliteMoveRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn write_tasks(conn: &mut SqliteConnection, plan: &Plan) -> DomainResult<()> {
        sqlx::query("DELETE FROM move_tasks WHERE move_id = ?")
            .bind(plan.id.to_string())
            .execute(&mut *conn)
            .await?;

        for (position, task) in plan.tasks.iter().enumerate() {
            let merged_from = if task.merged_from.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&task.merged_from)?)
            };

            sqlx::query(
                r#"INSERT INTO move_tasks (id, move_id, position, title, description, kind, day_number, status,
                   dependency_id, due_date, completed_at, produces, requires, merged_from)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(task.id.to_string())
            .bind(plan.id.to_string())
            .bind(position as i64)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.kind.as_str())
            .bind(i64::from(task.day_number))
            .bind(task.status.as_str())
            .bind(task.dependency_id.map(|id| id.to_string()))
            .bind(task.due_date.to_string())
            .bind(task.completed_at.map(|t| t.to_rfc3339()))
            .bind(&task.produces)
            .bind(&task.requires)
            .bind(merged_from)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Insert records not yet stored. Stored records are never touched.
    async fn append_records(conn: &mut SqliteConnection, plan: &Plan) -> DomainResult<usize> {
        let stored: Vec<(String,)> = sqlx::query_as("SELECT id FROM compression_records WHERE move_id = ?")
            .bind(plan.id.to_string())
            .fetch_all(&mut *conn)
            .await?;
        let stored: HashSet<String> = stored.into_iter().map(|(id,)| id).collect();

        let mut appended = 0;
        for (seq, record) in plan.compression_log.iter().enumerate() {
            let id = record.id.to_string();
            if stored.contains(&id) {
                continue;
            }
            sqlx::query(
                r#"INSERT INTO compression_records (id, move_id, seq, action, task_ids, rationale, recommendation, night, recorded_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(id)
            .bind(plan.id.to_string())
            .bind(seq as i64)
            .bind(record.action.as_str())
            .bind(serde_json::to_string(&record.task_ids)?)
            .bind(&record.rationale)
            .bind(record.recommendation.map(|r| r.as_str()))
            .bind(i64::from(record.night))
            .bind(record.recorded_at.to_rfc3339())
            .execute(&mut *conn)
            .await?;
            appended += 1;
        }
        Ok(appended)
    }
}

#[async_trait]
impl MoveRepository for SqliteMoveRepository {
    async fn insert(&self, plan: &Plan) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO moves (id, name, duration_days, start_date, status)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(plan.id.to_string())
        .bind(&plan.name)
        .bind(i64::from(plan.duration_days))
        .bind(plan.start_date.to_string())
        .bind(plan.status.as_str())
        .execute(&mut *tx)
        .await?;

        Self::write_tasks(&mut tx, plan).await?;
        Self::append_records(&mut tx, plan).await?;
        tx.commit().await?;

        debug!(move_id = %plan.id, tasks = plan.tasks.len(), "inserted move");
        Ok(())
    }

    async fn load(&self, id: Uuid) -> DomainResult<Plan> {
        let row: Option<MoveRow> = sqlx::query_as(
            "SELECT id, name, duration_days, start_date, status FROM moves WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        let row = row.ok_or(DomainError::MoveNotFound(id))?;

        let task_rows: Vec<TaskRow> = sqlx::query_as(
            r#"SELECT id, title, description, kind, day_number, status, dependency_id, due_date,
               completed_at, produces, requires, merged_from
               FROM move_tasks WHERE move_id = ? ORDER BY position"#,
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let record_rows: Vec<RecordRow> = sqlx::query_as(
            r#"SELECT id, action, task_ids, rationale, recommendation, night, recorded_at
               FROM compression_records WHERE move_id = ? ORDER BY seq"#,
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let tasks = task_rows
            .into_iter()
            .map(Task::try_from)
            .collect::<DomainResult<Vec<_>>>()?;
        let records = record_rows
            .into_iter()
            .map(|r| r.into_record(id))
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(Plan {
            id: parse_uuid(&row.id)?,
            name: row.name,
            duration_days: to_u32(row.duration_days, "duration_days")?,
            start_date: parse_date(&row.start_date)?,
            status: MoveStatus::from_str(&row.status)
                .ok_or_else(|| DomainError::SerializationError(format!("Invalid move status: {}", row.status)))?,
            tasks,
            compression_log: CompressionLog::from_records(records),
        })
    }

    async fn save(&self, plan: &Plan) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"UPDATE moves SET name = ?, duration_days = ?, start_date = ?, status = ?,
               updated_at = datetime('now')
               WHERE id = ?"#,
        )
        .bind(&plan.name)
        .bind(i64::from(plan.duration_days))
        .bind(plan.start_date.to_string())
        .bind(plan.status.as_str())
        .bind(plan.id.to_string())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::MoveNotFound(plan.id));
        }

        Self::write_tasks(&mut tx, plan).await?;
        let appended = Self::append_records(&mut tx, plan).await?;
        tx.commit().await?;

        debug!(move_id = %plan.id, status = %plan.status, appended, "saved move");
        Ok(())
    }

    async fn list_ids(&self, filter: MoveFilter) -> DomainResult<Vec<Uuid>> {
        let rows: Vec<(String,)> = match filter.status {
            Some(status) => {
                sqlx::query_as("SELECT id FROM moves WHERE status = ? ORDER BY rowid")
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT id FROM moves ORDER BY rowid")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.iter().map(|(id,)| parse_uuid(id)).collect()
    }
}

fn to_u32(value: i64, field: &str) -> DomainResult<u32> {
    u32::try_from(value).map_err(|_| DomainError::SerializationError(format!("Invalid {field}: {value}")))
}

#[derive(sqlx::FromRow)]
struct MoveRow {
    id: String,
    name: String,
    duration_days: i64,
    start_date: String,
    status: String,
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: String,
    title: String,
    description: String,
    kind: String,
    day_number: i64,
    status: String,
    dependency_id: Option<String>,
    due_date: String,
    completed_at: Option<String>,
    produces: Option<String>,
    requires: Option<String>,
    merged_from: Option<String>,
}

impl TryFrom<TaskRow> for Task {
    type Error = DomainError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            id: parse_uuid(&row.id)?,
            title: row.title,
            description: row.description,
            kind: TaskKind::from_str(&row.kind)
                .ok_or_else(|| DomainError::SerializationError(format!("Invalid task kind: {}", row.kind)))?,
            day_number: to_u32(row.day_number, "day_number")?,
            status: TaskStatus::from_str(&row.status)
                .ok_or_else(|| DomainError::SerializationError(format!("Invalid task status: {}", row.status)))?,
            dependency_id: parse_optional_uuid(row.dependency_id)?,
            due_date: parse_date(&row.due_date)?,
            completed_at: parse_optional_datetime(row.completed_at)?,
            produces: row.produces,
            requires: row.requires,
            merged_from: parse_json_or_default(row.merged_from)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: String,
    action: String,
    task_ids: String,
    rationale: String,
    recommendation: Option<String>,
    night: i64,
    recorded_at: String,
}

impl RecordRow {
    fn into_record(self, move_id: Uuid) -> DomainResult<CompressionRecord> {
        let recommendation = self
            .recommendation
            .map(|r| {
                Recommendation::from_str(&r)
                    .ok_or_else(|| DomainError::SerializationError(format!("Invalid recommendation: {r}")))
            })
            .transpose()?;

        Ok(CompressionRecord {
            id: parse_uuid(&self.id)?,
            move_id,
            task_ids: serde_json::from_str(&self.task_ids)?,
            action: CompressionActionKind::from_str(&self.action)
                .ok_or_else(|| DomainError::SerializationError(format!("Invalid action: {}", self.action)))?,
            rationale: self.rationale,
            recommendation,
            night: to_u32(self.night, "night")?,
            recorded_at: parse_datetime(&self.recorded_at)?,
        })
    }
}
