use lazy_static::lazy_static;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::Level;
use tracing_subscriber::{EnvFilter, prelude::*};
use tracing_timing::{Builder, Histogram};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use parking_lot::RwLock;
use std::time::{Duration, Instant};
use std::cell::RefCell;

// Longest span we expect to record: one minute, in nanoseconds.
const HISTOGRAM_MAX_NS: u64 = 60_000_000_000;

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum OperationCategory {
    AssetGraph,
    CustomerAssignment,
    Consumption,
    Billing,
    Incidents,
    SinkWrite {
        subcategory: SinkWriteType,
    },
    Other,
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum SinkWriteType {
    Assets,
    Customers,
    TimeSeries,
    Events,
    Other,
}

impl OperationCategory {
    pub fn as_str(&self) -> String {
        match self {
            OperationCategory::AssetGraph => "Asset Graph".to_string(),
            OperationCategory::CustomerAssignment => "Customer Assignment".to_string(),
            OperationCategory::Consumption => "Consumption".to_string(),
            OperationCategory::Billing => "Billing".to_string(),
            OperationCategory::Incidents => "Maintenance/Outages".to_string(),
            OperationCategory::SinkWrite { subcategory } => {
                format!("Sink Write - {}", match subcategory {
                    SinkWriteType::Assets => "Assets",
                    SinkWriteType::Customers => "Customers",
                    SinkWriteType::TimeSeries => "Time Series",
                    SinkWriteType::Events => "Events",
                    SinkWriteType::Other => "Other",
                })
            },
            OperationCategory::Other => "Other Operations".to_string(),
        }
    }
}

thread_local! {
    static TIMING_STACK: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

lazy_static! {
    static ref TIMING_ENABLED: AtomicBool = AtomicBool::new(false);
    static ref FUNCTION_TIMINGS: Arc<RwLock<HashMap<String, Histogram<u64>>>> = Arc::new(RwLock::new(HashMap::new()));
    static ref CATEGORY_TIMINGS: Arc<RwLock<HashMap<OperationCategory, Histogram<u64>>>> = Arc::new(RwLock::new(HashMap::new()));
    static ref HIERARCHICAL_TIMINGS: Arc<RwLock<HashMap<String, (Duration, usize, Vec<String>)>>> = Arc::new(RwLock::new(HashMap::new()));
}

/// Records the elapsed time of a scope when dropped.
pub struct TimingGuard {
    function_name: String,
    category: OperationCategory,
    start: Instant,
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        record_timing_end(&self.function_name, duration, &self.category);
    }
}

pub fn start_timing(function_name: &str, category: OperationCategory) -> TimingGuard {
    TIMING_STACK.with(|stack| {
        stack.borrow_mut().push(function_name.to_string());
    });

    TimingGuard {
        function_name: function_name.to_string(),
        category,
        start: Instant::now(),
    }
}

fn new_histogram() -> Option<Histogram<u64>> {
    Histogram::<u64>::new_with_bounds(1, HISTOGRAM_MAX_NS, 3).ok()
}

fn record_histogram<K>(map: &RwLock<HashMap<K, Histogram<u64>>>, key: K, duration_ns: u64)
where
    K: std::hash::Hash + Eq,
{
    let mut timings = map.write();
    let histogram = match timings.entry(key) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => match new_histogram() {
            Some(histogram) => entry.insert(histogram),
            None => return,
        },
    };
    let _ = histogram.record(duration_ns.max(1));
}

fn record_timing_end(function_name: &str, duration: Duration, category: &OperationCategory) {
    // Keep the stack balanced even when timing is off.
    let parent = TIMING_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        stack.pop();
        stack.last().cloned()
    });

    if !is_timing_enabled() {
        return;
    }

    let duration_ns = duration.as_nanos().min(u64::MAX as u128) as u64;

    {
        let mut hierarchical = HIERARCHICAL_TIMINGS.write();
        let entry = hierarchical
            .entry(function_name.to_string())
            .or_insert((Duration::from_nanos(0), 0, Vec::new()));

        entry.0 += duration;
        entry.1 += 1;

        if let Some(parent_name) = parent {
            if !entry.2.contains(&parent_name) {
                entry.2.push(parent_name);
            }
        }
    }

    record_histogram(&FUNCTION_TIMINGS, function_name.to_string(), duration_ns);
    record_histogram(&CATEGORY_TIMINGS, category.clone(), duration_ns);
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` is honoured; `debug` raises this crate to debug level.
pub fn init_logging(enable_timing: bool, debug: bool) -> anyhow::Result<()> {
    TIMING_ENABLED.store(enable_timing, Ordering::SeqCst);

    let crate_level = if debug { "gridsynth=debug" } else { "gridsynth=info" };
    let env_filter = EnvFilter::from_default_env()
        .add_directive(Level::WARN.into())
        .add_directive(crate_level.parse()?);

    if enable_timing {
        let timing_layer = Builder::default().layer(|| {
            Histogram::<u64>::new_with_bounds(1, HISTOGRAM_MAX_NS, 3).expect("histogram bounds are constant")
        });

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .with(timing_layer.boxed());

        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().compact());

        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

pub fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::SeqCst)
}

pub fn set_timing_enabled(enabled: bool) {
    TIMING_ENABLED.store(enabled, Ordering::SeqCst);
}

/// Total recorded time and call count for a timed function, if any.
pub fn function_timing(function_name: &str) -> Option<(Duration, usize)> {
    HIERARCHICAL_TIMINGS
        .read()
        .get(function_name)
        .map(|(total, count, _)| (*total, *count))
}

fn ms(ns: f64) -> f64 {
    ns / 1_000_000.0
}

/// Renders what the timing guards recorded: time per stage first, then
/// every timed scope, slowest total first. `None` while timing is off.
pub fn timing_report() -> Option<String> {
    use std::fmt::Write;

    if !is_timing_enabled() {
        return None;
    }
    let mut out = String::new();

    let categories = CATEGORY_TIMINGS.read();
    let mut stages: Vec<(String, f64, &Histogram<u64>)> = categories
        .iter()
        .map(|(category, hist)| (category.as_str(), hist.mean() * hist.len() as f64, hist))
        .collect();
    stages.sort_by(|a, b| b.1.total_cmp(&a.1));
    let run_ns: f64 = stages.iter().map(|(_, total, _)| total).sum();

    let _ = writeln!(out, "\nTime by stage");
    for (name, total_ns, hist) in &stages {
        let share = if run_ns > 0.0 { total_ns / run_ns * 100.0 } else { 0.0 };
        let _ = writeln!(
            out,
            "  {:<28} {:>6.1}%  {:>10.2}ms over {:>7} calls (p95 {:.3}ms)",
            name,
            share,
            ms(*total_ns),
            hist.len(),
            ms(hist.value_at_quantile(0.95) as f64),
        );
    }

    let scopes = HIERARCHICAL_TIMINGS.read();
    let per_call = FUNCTION_TIMINGS.read();
    let mut rows: Vec<_> = scopes.iter().collect();
    rows.sort_by(|a, b| b.1 .0.cmp(&a.1 .0));

    let _ = writeln!(out, "\nTimed scopes");
    for (name, (total, calls, callers)) in rows {
        let worst = per_call.get(name).map_or(0, |hist| hist.max());
        let _ = write!(
            out,
            "  {:<28} {:>10.2}ms total, {} calls, slowest {:.3}ms",
            name,
            total.as_secs_f64() * 1000.0,
            calls,
            ms(worst as f64),
        );
        if !callers.is_empty() {
            let _ = write!(out, " [inside {}]", callers.join(", "));
        }
        out.push('\n');
    }
    Some(out)
}

pub fn print_timing_report() {
    if let Some(report) = timing_report() {
        println!("{}", report);
    }
}
