//! SQLite-backed prediction log, student history and alert log.

use super::{
    cohort_of, render_csv, AlertRecord, CohortReport, CohortStats, HistoryRow, RiskCounts,
    StudentHighCount, StudentHistory, TeacherSummary,
};
use crate::error::StoreError;
use crate::features::LoggedFeatures;
use crate::risk::{PredictionResult, PredictionSink, RiskLevel};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const TOP_PER_COHORT: usize = 5;
const TOP_OVERALL: usize = 10;

pub struct HistoryStore {
    conn: Mutex<Connection>,
}

impl HistoryStore {
    /// Open or create DB at path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS predictions (
                ts TEXT NOT NULL,
                attendance_trend REAL NOT NULL,
                assignment_delay_avg REAL NOT NULL,
                marks_std REAL NOT NULL,
                engagement_score REAL NOT NULL,
                risk_level TEXT NOT NULL,
                confidence REAL NOT NULL
            );
            CREATE TABLE IF NOT EXISTS student_history (
                ts TEXT NOT NULL,
                student_id TEXT NOT NULL,
                attendance_trend REAL NOT NULL,
                assignment_delay_avg REAL NOT NULL,
                marks_std REAL NOT NULL,
                engagement_score REAL NOT NULL,
                risk_level TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_history_student ON student_history(student_id);
            CREATE TABLE IF NOT EXISTS alerts (
                ts TEXT NOT NULL,
                student_id TEXT NOT NULL,
                message TEXT NOT NULL,
                method TEXT NOT NULL,
                status TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Append to the prediction log and the student's history atomically.
    pub fn record_prediction(
        &self,
        features: &LoggedFeatures,
        result: &PredictionResult,
    ) -> Result<(), StoreError> {
        let ts = Utc::now().to_rfc3339();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO predictions (ts, attendance_trend, assignment_delay_avg, marks_std, engagement_score, risk_level, confidence)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                ts,
                features.attendance_trend,
                features.assignment_delay_avg,
                features.marks_std,
                features.engagement_score,
                result.risk_level.as_str(),
                result.confidence
            ],
        )?;
        tx.execute(
            "INSERT INTO student_history (ts, student_id, attendance_trend, assignment_delay_avg, marks_std, engagement_score, risk_level)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                ts,
                result.student_id,
                features.attendance_trend,
                features.assignment_delay_avg,
                features.marks_std,
                features.engagement_score,
                result.risk_level.as_str()
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn student_history(&self, student_id: &str) -> Result<StudentHistory, StoreError> {
        let rows = self.rows_where(Some(("student_id = ?1", student_id)))?;
        Ok(StudentHistory {
            timestamps: rows.iter().map(|r| r.timestamp.clone()).collect(),
            risks: rows.iter().map(|r| r.risk_level).collect(),
        })
    }

    /// All history rows, optionally restricted to ids starting with `prefix`.
    pub fn history_rows(&self, prefix: Option<&str>) -> Result<Vec<HistoryRow>, StoreError> {
        self.rows_where(prefix.map(|p| ("substr(student_id, 1, length(?1)) = ?1", p)))
    }

    /// History rows in insertion order. `filter` is a WHERE clause and its `?1` argument.
    fn rows_where(&self, filter: Option<(&str, &str)>) -> Result<Vec<HistoryRow>, StoreError> {
        const SELECT: &str = "SELECT ts, student_id, attendance_trend, assignment_delay_avg, marks_std, engagement_score, risk_level
             FROM student_history";
        let conn = self.conn()?;
        let rows = match filter {
            Some((clause, arg)) => {
                let sql = format!("{} WHERE {} ORDER BY rowid", SELECT, clause);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![arg], history_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let sql = format!("{} ORDER BY rowid", SELECT);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([], history_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(rows)
    }

    /// Per-student counts of each risk level, keyed by student id.
    fn per_student(&self) -> Result<BTreeMap<String, RiskCounts>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT student_id, risk_level, COUNT(*) FROM student_history GROUP BY student_id, risk_level",
        )?;
        let mut out: BTreeMap<String, RiskCounts> = BTreeMap::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let level: String = row.get(1)?;
            let n: i64 = row.get(2)?;
            out.entry(id)
                .or_default()
                .add(RiskLevel::parse_canonical(&level), n.max(0) as u64);
        }
        Ok(out)
    }

    pub fn cohort_stats(&self) -> Result<CohortReport, StoreError> {
        let mut cohorts: BTreeMap<String, Vec<(String, RiskCounts)>> = BTreeMap::new();
        for (id, counts) in self.per_student()? {
            cohorts.entry(cohort_of(&id)).or_default().push((id, counts));
        }

        let cohorts = cohorts
            .into_iter()
            .map(|(cohort, students)| {
                let mut counts = RiskCounts::default();
                for (_, c) in &students {
                    counts.merge(c);
                }
                CohortStats {
                    cohort,
                    counts,
                    top_students: top_high(students, TOP_PER_COHORT),
                }
            })
            .collect();
        Ok(CohortReport { cohorts })
    }

    pub fn teacher_summary(&self) -> Result<TeacherSummary, StoreError> {
        let students: Vec<(String, RiskCounts)> = self.per_student()?.into_iter().collect();
        let mut counts = RiskCounts::default();
        for (_, c) in &students {
            counts.merge(c);
        }
        let total_students = students.len() as u64;

        let avg_confidence: Option<f64> = self
            .conn()?
            .query_row("SELECT AVG(confidence) FROM predictions", [], |r| r.get(0))?;

        Ok(TeacherSummary {
            total_students,
            counts,
            top_high_students: top_high(students, TOP_OVERALL),
            avg_confidence: avg_confidence.unwrap_or(0.0),
        })
    }

    /// CSV of history rows for a cohort prefix (or everyone). `None` when empty.
    pub fn cohort_export(&self, prefix: Option<&str>) -> Result<Option<String>, StoreError> {
        let rows = self.history_rows(prefix)?;
        Ok((!rows.is_empty()).then(|| render_csv(&rows)))
    }

    /// CSV of one student's history. `None` when the student has no rows.
    pub fn student_report(&self, student_id: &str) -> Result<Option<String>, StoreError> {
        let rows = self.rows_where(Some(("student_id = ?1", student_id)))?;
        Ok((!rows.is_empty()).then(|| render_csv(&rows)))
    }

    pub fn record_alert(
        &self,
        student_id: &str,
        message: &str,
        method: &str,
        status: &str,
    ) -> Result<AlertRecord, StoreError> {
        let record = AlertRecord {
            timestamp: Utc::now().to_rfc3339(),
            student_id: student_id.to_string(),
            message: message.to_string(),
            method: method.to_string(),
            status: status.to_string(),
        };
        self.conn()?.execute(
            "INSERT INTO alerts (ts, student_id, message, method, status) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.timestamp,
                record.student_id,
                record.message,
                record.method,
                record.status
            ],
        )?;
        Ok(record)
    }

    pub fn alerts(&self, student_id: Option<&str>) -> Result<Vec<AlertRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT ts, student_id, message, method, status FROM alerts
             WHERE ?1 IS NULL OR student_id = ?1 ORDER BY rowid",
        )?;
        let alerts = stmt
            .query_map(params![student_id], |r| {
                Ok(AlertRecord {
                    timestamp: r.get(0)?,
                    student_id: r.get(1)?,
                    message: r.get(2)?,
                    method: r.get(3)?,
                    status: r.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(alerts)
    }
}

impl PredictionSink for HistoryStore {
    fn record(&self, features: &LoggedFeatures, result: &PredictionResult) -> Result<(), StoreError> {
        self.record_prediction(features, result)
    }
}

fn history_row(r: &Row<'_>) -> rusqlite::Result<HistoryRow> {
    let level: String = r.get(6)?;
    Ok(HistoryRow {
        timestamp: r.get(0)?,
        student_id: r.get(1)?,
        features: LoggedFeatures {
            attendance_trend: r.get(2)?,
            assignment_delay_avg: r.get(3)?,
            marks_std: r.get(4)?,
            engagement_score: r.get(5)?,
        },
        risk_level: RiskLevel::parse_canonical(&level),
    })
}

/// Students ordered by High count (descending, ties by id), truncated to `n`.
fn top_high(mut students: Vec<(String, RiskCounts)>, n: usize) -> Vec<StudentHighCount> {
    students.sort_by(|a, b| b.1.high.cmp(&a.1.high).then_with(|| a.0.cmp(&b.0)));
    students
        .into_iter()
        .take(n)
        .map(|(student_id, c)| StudentHighCount {
            student_id,
            high_count: c.high,
        })
        .collect()
}
