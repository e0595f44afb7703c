// src/rollout/sinks.rs
#![forbid(unsafe_code)]

use std::time::Duration;

use indicatif::ProgressBar;

use maze_engine::engine::{Map, render_ascii};
use maze_engine::rollout::{EpisodeRow, LearningStats, StepEvent, TrainingSink};

use super::stats::live_msg;

/// Fixed internal cadence for progress-bar message updates, in episodes.
const LIVE_EVERY: u64 = 10;

/// Human-readable periodic table sink.
///
/// Cadence (every N episodes) is handled by `CliSink`. This sink prints whenever called.
pub struct TableSink {
    header_every: usize,
    rows_printed: usize,
}

impl TableSink {
    const DEFAULT_HEADER_EVERY: usize = 20;

    /// If `header_every == 0`, a reasonable default is used.
    pub fn new(header_every: usize) -> Self {
        Self {
            header_every: if header_every == 0 {
                Self::DEFAULT_HEADER_EVERY
            } else {
                header_every
            },
            rows_printed: 0,
        }
    }

    fn header_line(&self) -> String {
        // Note: keep widths aligned with row_line() below.
        format!(
            "{:>8} {:>6} {:>10} {:>10} {:>10} {:>8} {:>4}",
            "episode", "steps", "reward", "avg_r", "best_r", "epsilon", "fin"
        )
    }

    fn sep_line(&self) -> String {
        "-".repeat(self.header_line().len())
    }

    fn row_line(&self, r: &EpisodeRow) -> String {
        format!(
            "{:>8} {:>6} {:>10.4} {:>10.4} {:>10.4} {:>8.4} {:>4}",
            r.episode,
            r.steps,
            r.total_reward,
            r.avg_recent_reward,
            r.best_reward,
            r.epsilon,
            if r.finished { "y" } else { "n" },
        )
    }
}

impl TrainingSink for TableSink {
    fn on_episode_end(&mut self, row: &EpisodeRow) {
        if self.rows_printed % self.header_every == 0 {
            println!("{}", self.header_line());
            println!("{}", self.sep_line());
        }
        println!("{}", self.row_line(row));
        self.rows_printed += 1;
    }
}

/// Wraps the reporting sink with the CLI's UI concerns: progress bar, report cadence
/// and per-step ASCII rendering.
pub struct CliSink<'a> {
    inner: &'a mut dyn TrainingSink,
    pb: Option<ProgressBar>,
    stats: LearningStats,
    report_every: u64,

    map: &'a Map,
    render_ms: Option<u64>,
}

impl<'a> CliSink<'a> {
    pub fn new(
        inner: &'a mut dyn TrainingSink,
        pb: Option<ProgressBar>,
        window: usize,
        report_every: u64,
        map: &'a Map,
        render_ms: Option<u64>,
    ) -> Self {
        Self {
            inner,
            pb,
            stats: LearningStats::new(window),
            report_every,
            map,
            render_ms,
        }
    }

    pub fn finish(&self) {
        if let Some(pb) = &self.pb {
            pb.finish_with_message("done");
        }
    }
}

impl TrainingSink for CliSink<'_> {
    fn on_step(&mut self, event: &StepEvent<'_>) {
        let Some(ms) = self.render_ms else {
            return;
        };
        let frame = format!(
            "episode={} t={} action={} reward={:.3}\n{}",
            event.episode,
            event.t,
            event.action,
            event.reward,
            render_ascii(self.map, event.next_state, event.path),
        );
        match &self.pb {
            Some(pb) => pb.suspend(|| print!("{frame}")),
            None => print!("{frame}"),
        }
        if ms > 0 {
            std::thread::sleep(Duration::from_millis(ms));
        }
    }

    fn on_episode_end(&mut self, row: &EpisodeRow) {
        self.stats.record(row.total_reward, row.steps, row.finished);

        if let Some(pb) = &self.pb {
            pb.inc(1);
            if row.episode % LIVE_EVERY == 0 {
                pb.set_message(live_msg(&self.stats, row));
            }
        }

        if self.report_every > 0 && row.episode % self.report_every == 0 {
            let inner = &mut *self.inner;
            match &self.pb {
                Some(pb) => pb.suspend(|| inner.on_episode_end(row)),
                None => inner.on_episode_end(row),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_engine::rollout::RecordingSink;

    fn row(episode: u64) -> EpisodeRow {
        EpisodeRow {
            episode,
            steps: 3,
            total_reward: 0.5,
            finished: true,
            epsilon: 0.9,
            avg_recent_reward: 0.5,
            best_reward: 0.5,
        }
    }

    #[test]
    fn forwards_rows_at_report_cadence() {
        let map = Map::from_string("SG").unwrap();
        let mut rec = RecordingSink::default();
        {
            let mut sink = CliSink::new(&mut rec, None, 10, 5, &map, None);
            for e in 0..12 {
                sink.on_episode_end(&row(e));
            }
        }
        let episodes: Vec<u64> = rec.rows.iter().map(|r| r.episode).collect();
        assert_eq!(episodes, vec![0, 5, 10]);
    }

    #[test]
    fn zero_cadence_forwards_nothing() {
        let map = Map::from_string("SG").unwrap();
        let mut rec = RecordingSink::default();
        {
            let mut sink = CliSink::new(&mut rec, None, 10, 0, &map, None);
            sink.on_episode_end(&row(0));
        }
        assert!(rec.rows.is_empty());
    }

    #[test]
    fn table_row_is_aligned_with_header() {
        let t = TableSink::new(0);
        assert_eq!(t.header_every, 20);
        assert_eq!(t.header_line().len(), t.row_line(&row(7)).len());
        assert_eq!(t.sep_line().len(), t.header_line().len());
    }
}
