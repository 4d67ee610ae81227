//! rocpd SQLite reader
//!
//! Reads the tables written by the rocpd profiler:
//!
//! | Table | Tracks | Key |
//! |-------|--------|-----|
//! | `rocpd_api` | CPU threads ([`TrackCategory::Region`]) | `pid`, `tid` |
//! | `rocpd_op` | GPU queues ([`TrackCategory::Kernel`]) | `gpuId`, `queueId` |
//! | `rocpd_monitor` | counters ([`TrackCategory::Counter`]) | `deviceId > 0`, `monitorType` |
//!
//! Event names and arguments are ids into `rocpd_string`. An event belongs
//! to a window `[s, e)` when it overlaps it (`start < e AND end > s`), so a
//! call straddling a window edge is returned for both neighbours. A
//! zero-length event counts when its start lies inside. Counter samples are
//! instants and belong to the window holding their start.
//!
//! Per-event detail comes from three more places:
//!
//! | Detail | Source |
//! |--------|--------|
//! | flow trace | `rocpd_api_ops` links between `rocpd_api` and `rocpd_op` rows |
//! | stack trace | `rocpd_stackframe` rows of a `rocpd_api` call |
//! | extended data | every column of the event's own row, strings resolved |
//!
//! Files without `rocpd_api_ops` or `rocpd_stackframe` answer with empty
//! flow and stack traces. Track descriptors carry their key columns as
//! extended data (`Process`/`Thread` for CPU threads, `Agent`/`Queue` for
//! GPU queues).
//!
//! The connection is opened read-only and guarded by a mutex: SQLite
//! connections are `Send` but not `Sync`.

use crate::error::{DatabaseError, Result};
use parking_lot::Mutex;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use rustc_hash::FxHashMap;
use std::path::Path;
use tracestore_core::{
    EventId, EventOperation, EventPropertyKind, EventSource, ExtDataRecord, RawEvent,
    RawEventProperty, RawFlowEndpoint, RawRecord, StackFrame, TimeWindow, TraceMetadata,
    TrackCategory, TrackInfo,
};
use tracing::{debug, info};

const API_EVENTS: &str = "SELECT A.pid, A.tid, A.id, A.start, A.end, S1.string, S2.string \
     FROM rocpd_api A \
     LEFT JOIN rocpd_string S1 ON S1.id = A.apiName_id \
     LEFT JOIN rocpd_string S2 ON S2.id = A.args_id \
     WHERE A.start < ?2 AND (A.end > ?1 OR A.start >= ?1)";

const OP_EVENTS: &str = "SELECT O.gpuId, O.queueId, O.id, O.start, O.end, S1.string, S2.string \
     FROM rocpd_op O \
     LEFT JOIN rocpd_string S1 ON S1.id = O.opType_id \
     LEFT JOIN rocpd_string S2 ON S2.id = O.description_id \
     WHERE O.start < ?2 AND (O.end > ?1 OR O.start >= ?1)";

const LAUNCH_FLOWS: &str = "SELECT L.op_id, O.gpuId, O.queueId, O.start \
     FROM rocpd_api_ops L \
     JOIN rocpd_op O ON O.id = L.op_id \
     WHERE L.api_id = ?1 ORDER BY O.start";

const DISPATCH_FLOWS: &str = "SELECT L.api_id, A.pid, A.tid, A.end \
     FROM rocpd_api_ops L \
     JOIN rocpd_api A ON A.id = L.api_id \
     WHERE L.op_id = ?1 ORDER BY A.end";

const STACK_FRAMES: &str = "SELECT S2.string, S3.string, S1.string, F.depth \
     FROM rocpd_stackframe F \
     JOIN rocpd_string S1 ON S1.id = F.name_id \
     JOIN rocpd_api A ON A.id = F.api_ptr_id \
     LEFT JOIN rocpd_string S2 ON S2.id = A.apiName_id \
     LEFT JOIN rocpd_string S3 ON S3.id = A.args_id \
     WHERE A.id = ?1 ORDER BY F.depth";

const API_DETAIL: &str = "SELECT A.id, A.pid, A.tid, A.start, A.end, \
     S1.string AS apiName, S2.string AS args \
     FROM rocpd_api A \
     LEFT JOIN rocpd_string S1 ON S1.id = A.apiName_id \
     LEFT JOIN rocpd_string S2 ON S2.id = A.args_id \
     WHERE A.id = ?1";

const OP_DETAIL: &str = "SELECT O.id, O.gpuId, O.queueId, O.sequenceId, O.start, O.end, \
     S1.string AS opType, S2.string AS description \
     FROM rocpd_op O \
     LEFT JOIN rocpd_string S1 ON S1.id = O.opType_id \
     LEFT JOIN rocpd_string S2 ON S2.id = O.description_id \
     WHERE O.id = ?1";

const MONITOR_SAMPLES: &str = "SELECT deviceId, monitorType, start, CAST(value AS REAL) \
     FROM rocpd_monitor \
     WHERE deviceId > 0 AND start >= ?1 AND start < ?2";

/// Kind of file found at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedFormat {
    /// rocpd schema (`rocpd_api` present)
    Rocpd,
    /// rocprofiler-sdk schema (`rocpd_info_node_*` tables)
    Rocprof,
    /// SQLite, but neither schema
    Unknown,
}

/// Inspect `sqlite_master` to tell the schemas apart
pub fn detect(path: &Path) -> Result<DetectedFormat> {
    let conn = open_read_only(path)?;
    if has_table(&conn, "rocpd_api")? {
        return Ok(DetectedFormat::Rocpd);
    }
    let rocprof: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'rocpd_info_node_%'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(if rocprof.is_some() {
        DetectedFormat::Rocprof
    } else {
        DetectedFormat::Unknown
    })
}

fn open_read_only(path: &Path) -> Result<Connection> {
    if !path.exists() {
        return Err(DatabaseError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }
    Ok(Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?)
}

fn has_table(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn to_sql_time(t: u64) -> i64 {
    i64::try_from(t).unwrap_or(i64::MAX)
}

fn from_sql_time(t: Option<i64>) -> u64 {
    t.map_or(0, |v| v.max(0) as u64)
}

/// Track key as stored in the database
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TrackKey {
    Thread { pid: i64, tid: i64 },
    Queue { gpu: i64, queue: i64 },
    Monitor { device: i64, kind: String },
}

impl TrackKey {
    fn of(track: &TrackInfo) -> Result<Self> {
        let int = |s: &str| {
            s.parse::<i64>().map_err(|_| {
                DatabaseError::Schema(format!("{:?} is not a numeric track key", s))
            })
        };
        match track.category {
            TrackCategory::Region => Ok(TrackKey::Thread {
                pid: int(&track.process)?,
                tid: int(&track.subprocess)?,
            }),
            TrackCategory::Kernel => Ok(TrackKey::Queue {
                gpu: int(&track.process)?,
                queue: int(&track.subprocess)?,
            }),
            TrackCategory::Counter => Ok(TrackKey::Monitor {
                device: int(&track.process)?,
                kind: track.subprocess.clone(),
            }),
            other => Err(DatabaseError::Unsupported(format!(
                "rocpd has no {} tracks",
                other
            ))),
        }
    }

    fn table(&self) -> Table {
        match self {
            TrackKey::Thread { .. } => Table::Api,
            TrackKey::Queue { .. } => Table::Op,
            TrackKey::Monitor { .. } => Table::Monitor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Table {
    Api,
    Op,
    Monitor,
}

fn event_row(row: &Row<'_>, operation: EventOperation) -> rusqlite::Result<RawRecord> {
    let start = from_sql_time(row.get(3)?);
    let end = from_sql_time(row.get(4)?);
    Ok(RawRecord::Event(RawEvent {
        id: row.get::<_, i64>(2)? as u64,
        operation,
        timestamp: start,
        duration: end as i64 - start as i64,
        type_name: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        symbol: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
    }))
}

/// Column value as text; `None` for NULL and blobs
fn column_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Integer(v) => Some(v.to_string()),
        ValueRef::Real(v) => Some(v.to_string()),
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    }
}

/// Descriptive attributes of a track built from its key columns
fn with_key_data(info: TrackInfo) -> TrackInfo {
    let (process, subprocess) = (info.process.clone(), info.subprocess.clone());
    match info.category {
        TrackCategory::Region => info
            .with_ext_data("Process", "pid", process)
            .with_ext_data("Thread", "tid", subprocess),
        TrackCategory::Kernel => info
            .with_ext_data("Agent", "gpuId", process)
            .with_ext_data("Queue", "queueId", subprocess),
        _ => info,
    }
}

/// Reader over a rocpd database file
#[derive(Debug)]
pub struct RocpdSource {
    name: String,
    conn: Mutex<Connection>,
    has_monitor: bool,
    has_flows: bool,
    has_stacks: bool,
}

impl RocpdSource {
    /// Open `path` read-only and check it carries the rocpd schema
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = open_read_only(path)?;
        for table in ["rocpd_api", "rocpd_op", "rocpd_string"] {
            if !has_table(&conn, table)? {
                return Err(DatabaseError::Schema(format!(
                    "{} has no {} table",
                    path.display(),
                    table
                )));
            }
        }
        let has_monitor = has_table(&conn, "rocpd_monitor")?;
        let has_flows = has_table(&conn, "rocpd_api_ops")?;
        let has_stacks = has_table(&conn, "rocpd_stackframe")?;
        info!(
            path = %path.display(),
            has_monitor,
            has_flows,
            has_stacks,
            "rocpd database opened"
        );
        Ok(Self {
            name: path.display().to_string(),
            conn: Mutex::new(conn),
            has_monitor,
            has_flows,
            has_stacks,
        })
    }

    fn bounds(&self, conn: &Connection) -> Result<TimeWindow> {
        let mut sql = String::from(
            "SELECT MIN(s), MAX(e) FROM (\
             SELECT MIN(start) AS s, MAX(end) AS e FROM rocpd_api \
             UNION ALL SELECT MIN(start), MAX(end) FROM rocpd_op",
        );
        if self.has_monitor {
            sql.push_str(" UNION ALL SELECT MIN(start), MAX(start) FROM rocpd_monitor");
        }
        sql.push(')');
        let (start, end): (Option<i64>, Option<i64>) =
            conn.query_row(&sql, [], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let start = from_sql_time(start);
        let end = end.map_or(start, |e| from_sql_time(Some(e)).saturating_add(1));
        Ok(TimeWindow::new(start, end))
    }

    fn tracks(&self, conn: &Connection, sql: &str, category: TrackCategory) -> Result<Vec<TrackInfo>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            let process: i64 = row.get(0)?;
            let sub: rusqlite::types::Value = row.get(1)?;
            Ok((process, sub))
        })?;
        let mut tracks = Vec::new();
        for row in rows {
            let (process, sub) = row?;
            let sub = match sub {
                rusqlite::types::Value::Integer(v) => v.to_string(),
                rusqlite::types::Value::Text(s) => s,
                rusqlite::types::Value::Real(v) => v.to_string(),
                _ => String::new(),
            };
            tracks.push(with_key_data(TrackInfo::new(
                category,
                process.to_string(),
                sub,
            )));
        }
        Ok(tracks)
    }

    /// Rows of one table within `window`, bucketed by track key
    fn scan(
        &self,
        table: Table,
        window: TimeWindow,
        wanted: &FxHashMap<TrackKey, usize>,
        out: &mut [Vec<RawRecord>],
    ) -> Result<()> {
        let conn = self.conn.lock();
        let (start, end) = (to_sql_time(window.start), to_sql_time(window.end));
        let mut rows_seen = 0usize;
        match table {
            Table::Api | Table::Op => {
                let (sql, operation) = if table == Table::Api {
                    (API_EVENTS, EventOperation::Launch)
                } else {
                    (OP_EVENTS, EventOperation::Dispatch)
                };
                let mut stmt = conn.prepare(&format!("{} ORDER BY start", sql))?;
                let mut rows = stmt.query(params![start, end])?;
                while let Some(row) = rows.next()? {
                    let a: i64 = row.get(0)?;
                    let b: i64 = row.get(1)?;
                    let key = if table == Table::Api {
                        TrackKey::Thread { pid: a, tid: b }
                    } else {
                        TrackKey::Queue { gpu: a, queue: b }
                    };
                    if let Some(&slot) = wanted.get(&key) {
                        out[slot].push(event_row(row, operation)?);
                        rows_seen += 1;
                    }
                }
            }
            Table::Monitor => {
                if !self.has_monitor {
                    return Ok(());
                }
                let mut stmt = conn.prepare(&format!("{} ORDER BY start", MONITOR_SAMPLES))?;
                let mut rows = stmt.query(params![start, end])?;
                while let Some(row) = rows.next()? {
                    let key = TrackKey::Monitor {
                        device: row.get(0)?,
                        kind: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    };
                    if let Some(&slot) = wanted.get(&key) {
                        out[slot].push(RawRecord::Counter {
                            timestamp: from_sql_time(row.get(2)?),
                            value: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
                        });
                        rows_seen += 1;
                    }
                }
            }
        }
        debug!(source = %self.name, ?table, %window, rows = rows_seen, "table scanned");
        Ok(())
    }

    fn flows(&self, conn: &Connection, event: EventId) -> Result<Vec<RawFlowEndpoint>> {
        if !self.has_flows {
            return Ok(Vec::new());
        }
        // Launches land on the queue of their dispatch, dispatches on the
        // thread that launched them.
        let (sql, category, linked) = match event.operation {
            EventOperation::Launch => {
                (LAUNCH_FLOWS, TrackCategory::Kernel, EventOperation::Dispatch)
            }
            _ => (DISPATCH_FLOWS, TrackCategory::Region, EventOperation::Launch),
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![event.id as i64], |row| {
            Ok(RawFlowEndpoint {
                category,
                process: row.get::<_, i64>(1)?.to_string(),
                subprocess: row.get::<_, i64>(2)?.to_string(),
                event: EventId::new(row.get::<_, i64>(0)? as u64, linked),
                timestamp: from_sql_time(row.get(3)?),
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn stack(&self, conn: &Connection, event: EventId) -> Result<Vec<StackFrame>> {
        if !self.has_stacks {
            return Ok(Vec::new());
        }
        let mut stmt = conn.prepare(STACK_FRAMES)?;
        let rows = stmt.query_map(params![event.id as i64], |row| {
            Ok(StackFrame {
                symbol: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                args: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                code_line: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                depth: row.get::<_, Option<i64>>(3)?.unwrap_or(0).max(0) as u64,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn ext_data(&self, conn: &Connection, event: EventId) -> Result<Vec<ExtDataRecord>> {
        let sql = match event.operation {
            EventOperation::Launch => API_DETAIL,
            _ => OP_DETAIL,
        };
        let mut stmt = conn.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query(params![event.id as i64])?;
        let mut records = Vec::new();
        if let Some(row) = rows.next()? {
            for (i, name) in names.iter().enumerate() {
                if let Some(value) = column_text(row.get_ref(i)?) {
                    records.push(ExtDataRecord::new("Properties", name.as_str(), value));
                }
            }
        }
        Ok(records)
    }

    fn read(&self, tracks: &[&TrackInfo], window: TimeWindow) -> Result<Vec<Vec<RawRecord>>> {
        let mut by_table: FxHashMap<Table, FxHashMap<TrackKey, usize>> = FxHashMap::default();
        for (slot, track) in tracks.iter().enumerate() {
            let key = TrackKey::of(track)?;
            by_table.entry(key.table()).or_default().entry(key).or_insert(slot);
        }
        let mut out = vec![Vec::new(); tracks.len()];
        for table in [Table::Api, Table::Op, Table::Monitor] {
            if let Some(wanted) = by_table.get(&table) {
                self.scan(table, window, wanted, &mut out)?;
            }
        }
        // Duplicate descriptors share one slot; fill the rest.
        for (slot, track) in tracks.iter().enumerate() {
            let first = tracks.iter().position(|t| t == track).unwrap_or(slot);
            if first != slot {
                out[slot] = out[first].clone();
            }
        }
        Ok(out)
    }
}

impl EventSource for RocpdSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_metadata(
        &self,
        progress: &mut dyn FnMut(f64, &str),
    ) -> tracestore_core::Result<TraceMetadata> {
        let conn = self.conn.lock();
        let window = self.bounds(&conn)?;
        progress(25.0, "Trace bounds loaded");

        let mut tracks = self.tracks(
            &conn,
            "SELECT DISTINCT pid, tid FROM rocpd_api ORDER BY pid, tid",
            TrackCategory::Region,
        )?;
        progress(25.0, "CPU thread tracks loaded");

        tracks.extend(self.tracks(
            &conn,
            "SELECT DISTINCT gpuId, queueId FROM rocpd_op ORDER BY gpuId, queueId",
            TrackCategory::Kernel,
        )?);
        progress(25.0, "GPU queue tracks loaded");

        if self.has_monitor {
            tracks.extend(self.tracks(
                &conn,
                "SELECT DISTINCT deviceId, monitorType FROM rocpd_monitor \
                 WHERE deviceId > 0 ORDER BY deviceId, monitorType",
                TrackCategory::Counter,
            )?);
        }
        progress(25.0, "Counter tracks loaded");

        Ok(TraceMetadata {
            start_time: window.start,
            end_time: window.end,
            tracks,
        })
    }

    fn read_track(
        &self,
        track: &TrackInfo,
        window: TimeWindow,
    ) -> tracestore_core::Result<Vec<RawRecord>> {
        let mut rows = self.read(&[track], window)?;
        Ok(rows.pop().unwrap_or_default())
    }

    fn read_tracks(
        &self,
        tracks: &[&TrackInfo],
        window: TimeWindow,
    ) -> tracestore_core::Result<Vec<Vec<RawRecord>>> {
        Ok(self.read(tracks, window)?)
    }

    fn read_event_property(
        &self,
        kind: EventPropertyKind,
        event: EventId,
    ) -> tracestore_core::Result<RawEventProperty> {
        if !kind.applies_to(event.operation) {
            return Err(tracestore_core::Error::InvalidParameter(format!(
                "{} is not available for {}",
                kind, event
            )));
        }
        let conn = self.conn.lock();
        let property = match kind {
            EventPropertyKind::FlowTrace => RawEventProperty::Flow(self.flows(&conn, event)?),
            EventPropertyKind::StackTrace => RawEventProperty::Stack(self.stack(&conn, event)?),
            EventPropertyKind::ExtData => RawEventProperty::Ext(self.ext_data(&conn, event)?),
        };
        debug!(source = %self.name, %kind, %event, "event property read");
        Ok(property)
    }
}
