//! Statistics collection and export.
//!
//! [`SimulationStats`] is a serializable snapshot assembled by
//! [`Simulation::stats`](crate::Simulation::stats) from the engine, the
//! recalculation manager and the timeline. It exports to JSON, CSV and a
//! plain-text summary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use crate::component::ComponentStatus;
use crate::recalc::RecalcStats;
use crate::timeline::TimelineStats;
use crate::types::{ComponentId, SimTime};

/// Aggregate statistics for a simulation run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SimulationStats {
    /// Simulation metadata
    pub metadata: SimulationMetadata,

    /// Engine-level counters
    pub engine: EngineStats,

    /// Recalculation counters
    pub recalc: RecalcStats,

    /// Timeline counters
    pub timeline: TimelineStats,

    /// Per-component snapshot
    pub components: BTreeMap<ComponentId, ComponentStats>,

    /// Wall-clock timing
    pub timing: TimingStats,
}

/// Metadata about the simulation run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimulationMetadata {
    pub name: String,

    /// Start time (wall clock)
    pub start_time: Option<String>,

    /// End time (wall clock)
    pub end_time: Option<String>,

    /// Crate version
    pub version: String,
}

/// Engine-level counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Logical time when the snapshot was taken
    pub final_time: SimTime,

    /// Timestamp batches executed
    pub batches_executed: u64,

    /// Timeline events dispatched
    pub events_dispatched: u64,

    /// Events whose component or wire no longer existed
    pub events_dropped: u64,

    /// External input changes applied
    pub inputs_applied: u64,

    pub component_count: usize,
    pub wire_count: usize,

    /// Events still pending at snapshot time
    pub pending_events: usize,
}

/// Snapshot of one component.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComponentStats {
    pub name: String,
    pub type_name: String,
    pub status: ComponentStatus,
    /// Message of the last failed evaluation, if the component is in error
    pub error: Option<String>,
}

/// Timing/performance statistics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TimingStats {
    /// Total wall-clock time in milliseconds
    pub total_wall_time_ms: f64,

    /// Logical time per wall-clock second
    pub sim_time_per_second: f64,

    /// Component evaluations per second
    pub evaluations_per_second: f64,
}

impl SimulationStats {
    /// Creates an empty snapshot carrying the crate version.
    pub fn new() -> Self {
        Self {
            metadata: SimulationMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Sets the simulation name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.metadata.name = name.into();
        self
    }

    /// Records the start time.
    pub fn record_start(&mut self) {
        self.metadata.start_time = Some(wall_clock_now());
    }

    /// Records the end time.
    pub fn record_end(&mut self) {
        self.metadata.end_time = Some(wall_clock_now());
    }

    /// Updates timing statistics based on wall clock time.
    pub fn compute_timing(&mut self, wall_time_ms: f64) {
        self.timing.total_wall_time_ms = wall_time_ms;

        if wall_time_ms > 0.0 {
            let seconds = wall_time_ms / 1000.0;
            self.timing.sim_time_per_second = self.engine.final_time as f64 / seconds;
            self.timing.evaluations_per_second = self.recalc.evaluations as f64 / seconds;
        }
    }

    /// Components currently in error.
    pub fn components_in_error(&self) -> impl Iterator<Item = (&ComponentId, &ComponentStats)> {
        self.components.iter().filter(|(_, c)| c.error.is_some())
    }

    /// Exports statistics to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Exports statistics to JSON file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Exports summary counters to CSV.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("metric,value\n");

        csv.push_str(&format!("final_time,{}\n", self.engine.final_time));
        csv.push_str(&format!("batches_executed,{}\n", self.engine.batches_executed));
        csv.push_str(&format!("events_dispatched,{}\n", self.engine.events_dispatched));
        csv.push_str(&format!("events_dropped,{}\n", self.engine.events_dropped));
        csv.push_str(&format!("inputs_applied,{}\n", self.engine.inputs_applied));
        csv.push_str(&format!("component_count,{}\n", self.engine.component_count));
        csv.push_str(&format!("wire_count,{}\n", self.engine.wire_count));

        csv.push_str(&format!("recalc_passes,{}\n", self.recalc.passes));
        csv.push_str(&format!("evaluations,{}\n", self.recalc.evaluations));
        csv.push_str(&format!("evaluation_errors,{}\n", self.recalc.evaluation_errors));
        csv.push_str(&format!(
            "reentrancy_rejections,{}\n",
            self.recalc.reentrancy_rejections
        ));
        csv.push_str(&format!("oscillation_cutoffs,{}\n", self.recalc.oscillation_cutoffs));

        csv.push_str(&format!("events_scheduled,{}\n", self.timeline.scheduled));
        csv.push_str(&format!("events_cancelled,{}\n", self.timeline.cancelled));
        csv.push_str(&format!("late_batches,{}\n", self.timeline.late_batches));

        csv.push_str(&format!("wall_time_ms,{:.2}\n", self.timing.total_wall_time_ms));
        csv.push_str(&format!("sim_time_per_second,{:.2}\n", self.timing.sim_time_per_second));

        csv
    }

    /// Exports summary counters to CSV file.
    pub fn to_csv_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.to_csv())
    }

    /// Exports the per-component snapshot to CSV.
    pub fn components_to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("component_id,name,type,status,error\n");

        for (id, c) in &self.components {
            csv.push_str(&format!(
                "{},{},{},{:?},{}\n",
                id,
                c.name,
                c.type_name,
                c.status,
                c.error.as_deref().unwrap_or_default(),
            ));
        }

        csv
    }

    /// Writes a human-readable summary to a writer.
    pub fn write_summary<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        writeln!(w, "=== Simulation Statistics ===")?;
        writeln!(w)?;

        if !self.metadata.name.is_empty() {
            writeln!(w, "Name: {}", self.metadata.name)?;
        }
        if let Some(ref start) = self.metadata.start_time {
            writeln!(w, "Started: {}", start)?;
        }
        if let Some(ref end) = self.metadata.end_time {
            writeln!(w, "Ended: {}", end)?;
        }
        writeln!(w)?;

        writeln!(w, "--- Engine ---")?;
        writeln!(w, "Logical time: {}", self.engine.final_time)?;
        writeln!(w, "Batches executed: {}", self.engine.batches_executed)?;
        writeln!(w, "Events dispatched: {}", self.engine.events_dispatched)?;
        writeln!(w, "Events dropped: {}", self.engine.events_dropped)?;
        writeln!(w, "Components: {}", self.engine.component_count)?;
        writeln!(w, "Wires: {}", self.engine.wire_count)?;
        writeln!(w)?;

        writeln!(w, "--- Recalculation ---")?;
        writeln!(w, "Passes: {}", self.recalc.passes)?;
        writeln!(w, "Evaluations: {}", self.recalc.evaluations)?;
        writeln!(w, "Errors: {}", self.recalc.evaluation_errors)?;
        writeln!(w, "Oscillation cutoffs: {}", self.recalc.oscillation_cutoffs)?;
        writeln!(w)?;

        writeln!(w, "--- Timeline ---")?;
        writeln!(w, "Scheduled: {}", self.timeline.scheduled)?;
        writeln!(w, "Fired: {}", self.timeline.fired)?;
        writeln!(w, "Late batches: {}", self.timeline.late_batches)?;

        let failing: Vec<_> = self.components_in_error().collect();
        if !failing.is_empty() {
            writeln!(w)?;
            writeln!(w, "--- Components in error ---")?;
            for (id, c) in failing {
                writeln!(
                    w,
                    "c{} {} ({}): {}",
                    id,
                    c.name,
                    c.type_name,
                    c.error.as_deref().unwrap_or_default()
                )?;
            }
        }

        Ok(())
    }

    /// Returns the summary as a string.
    pub fn summary(&self) -> String {
        let mut buf = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.write_summary(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// A simple timer for measuring wall-clock time.
#[derive(Debug)]
pub struct Timer {
    start: std::time::Instant,
}

impl Timer {
    /// Starts a timer now.
    pub fn start() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }

    /// Returns elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}

fn wall_clock_now() -> String {
    let now = std::time::SystemTime::now();
    let duration = now.duration_since(std::time::UNIX_EPOCH).unwrap_or_default();
    format!("{}s", duration.as_secs())
}

/// Brackets a run with wall-clock timing.
#[derive(Debug, Default)]
pub struct StatsCollector {
    name: String,
    started: Option<String>,
    timer: Option<Timer>,
}

impl StatsCollector {
    /// Creates an unnamed collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names the run in the exported statistics.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Starts timing.
    pub fn start(&mut self) {
        self.timer = Some(Timer::start());
        self.started = Some(wall_clock_now());
    }

    /// Stops timing and completes a snapshot taken from the simulation.
    pub fn finish(&mut self, mut stats: SimulationStats) -> SimulationStats {
        stats.metadata.name = self.name.clone();
        stats.metadata.start_time = self.started.clone();
        stats.record_end();
        if let Some(ref timer) = self.timer {
            stats.compute_timing(timer.elapsed_ms());
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_creation() {
        let stats = SimulationStats::new().with_name("Test Simulation");

        assert_eq!(stats.metadata.name, "Test Simulation");
        assert_eq!(stats.metadata.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_stats_json_export() {
        let mut stats = SimulationStats::new();
        stats.engine.final_time = 1000;
        stats.recalc.evaluations = 77;

        let json = stats.to_json().unwrap();
        assert!(json.contains("1000"));
        assert!(json.contains("\"evaluations\": 77"));
    }

    #[test]
    fn test_stats_csv_export() {
        let mut stats = SimulationStats::new();
        stats.engine.final_time = 1000;
        stats.engine.events_dispatched = 500;
        stats.timeline.late_batches = 2;

        let csv = stats.to_csv();
        assert!(csv.starts_with("metric,value\n"));
        assert!(csv.contains("final_time,1000"));
        assert!(csv.contains("events_dispatched,500"));
        assert!(csv.contains("late_batches,2"));
    }

    #[test]
    fn test_components_csv_and_summary() {
        let mut stats = SimulationStats::new().with_name("Summary Test");
        stats.components.insert(
            3,
            ComponentStats {
                name: "u3".to_string(),
                type_name: "And".to_string(),
                status: ComponentStatus::Clean,
                error: Some("expected 2 input values, got 1".to_string()),
            },
        );

        let csv = stats.components_to_csv();
        assert!(csv.contains("3,u3,And,Clean,expected 2 input values, got 1"));

        let summary = stats.summary();
        assert!(summary.contains("Summary Test"));
        assert!(summary.contains("Components in error"));
        assert!(summary.contains("c3 u3 (And)"));
    }

    #[test]
    fn test_compute_timing() {
        let mut stats = SimulationStats::new();
        stats.engine.final_time = 500;
        stats.recalc.evaluations = 1000;
        stats.compute_timing(250.0);

        assert_eq!(stats.timing.sim_time_per_second, 2000.0);
        assert_eq!(stats.timing.evaluations_per_second, 4000.0);
    }

    #[test]
    fn test_stats_collector() {
        let mut collector = StatsCollector::new();
        collector.set_name("Test");
        collector.start();

        std::thread::sleep(std::time::Duration::from_millis(5));

        let stats = collector.finish(SimulationStats::new());
        assert_eq!(stats.metadata.name, "Test");
        assert!(stats.metadata.start_time.is_some());
        assert!(stats.metadata.end_time.is_some());
        assert!(stats.timing.total_wall_time_ms >= 5.0);
    }
}
