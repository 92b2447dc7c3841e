//! Structured logging for ensemble simulation runs.
//!
//! Every record is a single JSON line carrying a sequence number, the run id,
//! a level and a domain. Records go to stdout and, when `LOG_DIR` is set, to
//! `LOG_DIR/<run_id>/events.jsonl` (info and above) or `trace.jsonl`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

static DEFAULT_LEVEL: OnceLock<Level> = OnceLock::new();

/// Minimum level used when `LOG_LEVEL` is unset. First call wins.
pub fn set_default_level(level: Level) {
    let _ = DEFAULT_LEVEL.set(level);
}

impl Level {
    pub fn from_env() -> Self {
        let fallback = DEFAULT_LEVEL.get().copied().unwrap_or(Level::Info);
        Self::resolve(std::env::var("LOG_LEVEL").ok().as_deref(), fallback)
    }

    /// Level named by `value`, or `fallback` when absent or unknown.
    pub fn resolve(value: Option<&str>, fallback: Level) -> Self {
        match value {
            Some("trace") => Level::Trace,
            Some("debug") => Level::Debug,
            Some("info") => Level::Info,
            Some("warn") => Level::Warn,
            Some("error") => Level::Error,
            Some("fatal") => Level::Fatal,
            _ => fallback,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

// =============================================================================
// Log Domains (categories for filtering)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Ensemble, // Entry insertion, refresh, removal
    Join,     // Join flux and join resolution
    Stop,     // Stop-condition evaluation
    Sim,      // Trajectory stepping
    System,   // Startup, config, shutdown
    Profile,  // Performance profiling
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Ensemble => "ensemble",
            Domain::Join => "join",
            Domain::Stop => "stop",
            Domain::Sim => "sim",
            Domain::System => "system",
            Domain::Profile => "profile",
        }
    }

    pub fn is_enabled(&self) -> bool {
        // LOG_DOMAINS is a comma-separated list or "all"
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Sequence counter and run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    sinks: Option<Sinks>,
}

#[derive(Debug)]
struct Sinks {
    events: Mutex<BufWriter<File>>,
    trace: Mutex<BufWriter<File>>,
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let sinks = std::env::var("LOG_DIR")
            .ok()
            .and_then(|base| open_sinks(&run_id, &base));
        RunContext { run_id, sinks }
    })
}

fn open_sinks(run_id: &str, base: &str) -> Option<Sinks> {
    let mut run_dir = PathBuf::from(base);
    run_dir.push(run_id);
    if let Err(err) = create_dir_all(&run_dir) {
        eprintln!("[log] failed to create run dir: {}", err);
        return None;
    }

    let _ = std::fs::write(
        run_dir.join("manifest.json"),
        json!({
            "run_id": run_id,
            "ts": ts_now(),
            "pid": process::id(),
            "log_dir": run_dir.to_string_lossy(),
        })
        .to_string(),
    );

    let events = File::create(run_dir.join("events.jsonl"))
        .map_err(|err| eprintln!("[log] failed to create events log: {}", err))
        .ok()?;
    let trace = File::create(run_dir.join("trace.jsonl"))
        .map_err(|err| eprintln!("[log] failed to create trace log: {}", err))
        .ok()?;

    Some(Sinks {
        events: Mutex::new(BufWriter::new(events)),
        trace: Mutex::new(BufWriter::new(trace)),
    })
}

fn write_line(writer: &Mutex<BufWriter<File>>, line: &str) {
    if let Ok(mut w) = writer.lock() {
        let _ = writeln!(w, "{}", line);
    }
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Epoch milliseconds
pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    let min_level = Level::from_env();
    if level < min_level || !domain.is_enabled() {
        return;
    }

    emit_record(level, domain.as_str(), event, fields);
}

fn emit_record(level: Level, component: &str, event: &str, mut fields: Map<String, Value>) {
    let ctx = ensure_run_context();

    let msg = fields.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(ctx.run_id.clone()));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(component));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    entry.insert("data".to_string(), Value::Object(fields));

    let line = Value::Object(entry).to_string();
    if let Some(sinks) = &ctx.sinks {
        match level {
            Level::Trace | Level::Debug => write_line(&sinks.trace, &line),
            _ => write_line(&sinks.events, &line),
        }
    }
    match level {
        Level::Error | Level::Fatal => eprintln!("{}", line),
        _ => println!("{}", line),
    }
}

// =============================================================================
// Domain-Specific Logging Helpers
// =============================================================================

pub fn log_entry_added(id: u64, strands: &str, count: usize) {
    log(
        Level::Debug,
        Domain::Ensemble,
        "entry_added",
        obj(&[
            ("id", json!(id)),
            ("strands", v_str(strands)),
            ("count", json!(count)),
        ]),
    );
}

pub fn log_join(outer_id: u64, inner_id: u64, move_index: u64, indices: (u32, u32)) {
    log(
        Level::Debug,
        Domain::Join,
        "join_chosen",
        obj(&[
            ("outer_id", json!(outer_id)),
            ("inner_id", json!(inner_id)),
            ("move_index", json!(move_index)),
            ("outer_index", json!(indices.0)),
            ("inner_index", json!(indices.1)),
        ]),
    );
}

pub fn log_step(step: u64, time: f64, total_flux: f64, join_flux: f64, complexes: usize) {
    log(
        Level::Trace,
        Domain::Sim,
        "step",
        obj(&[
            ("step", json!(step)),
            ("time", v_num(time)),
            ("total_flux", v_num(total_flux)),
            ("join_flux", v_num(join_flux)),
            ("complexes", json!(complexes)),
        ]),
    );
}

pub fn log_stop_reached(tag: &str, time: f64, steps: u64) {
    log(
        Level::Info,
        Domain::Stop,
        "stop_reached",
        obj(&[
            ("tag", v_str(tag)),
            ("time", v_num(time)),
            ("steps", json!(steps)),
        ]),
    );
}

// =============================================================================
// Utility Functions
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Profiling Scope
// =============================================================================

/// Profiling scope that emits structured timing on drop.
pub struct ProfileScope {
    label: &'static str,
    context: Option<Map<String, Value>>,
    started: Instant,
}

impl ProfileScope {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            context: None,
            started: Instant::now(),
        }
    }

    pub fn with_context(label: &'static str, fields: &[(&str, Value)]) -> Self {
        Self {
            label,
            context: Some(obj(fields)),
            started: Instant::now(),
        }
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let mut fields = self.context.take().unwrap_or_default();
        fields.insert("label".to_string(), v_str(self.label));
        fields.insert("elapsed_ms".to_string(), v_num(elapsed_ms));
        log(Level::Trace, Domain::Profile, "profile", fields);
    }
}

// =============================================================================
// Tests
// =============================================================================
