use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionStats {
    pub attempts: u32,
    pub total_correct: u64,
    pub best_score: usize,
    pub started_at_ms: u64,
}

impl SessionStats {
    pub fn new(started_at_ms: u64) -> Self {
        Self {
            attempts: 0,
            total_correct: 0,
            best_score: 0,
            started_at_ms,
        }
    }

    pub fn record(&mut self, correct_count: usize) {
        self.attempts = self.attempts.saturating_add(1);
        self.total_correct = self.total_correct.saturating_add(correct_count as u64);
        self.best_score = self.best_score.max(correct_count);
    }

    pub fn average(&self) -> f64 {
        self.total_correct as f64 / self.attempts.max(1) as f64
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Verification {
    pub results: Vec<bool>,
    pub correct_count: usize,
}

impl Verification {
    pub fn from_results(results: Vec<bool>) -> Self {
        let correct_count = results.iter().filter(|correct| **correct).count();
        Self {
            results,
            correct_count,
        }
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn is_complete(&self) -> bool {
        !self.results.is_empty() && self.correct_count == self.results.len()
    }

    pub fn progress(&self) -> f32 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.correct_count as f32 / self.results.len() as f32
    }

    pub fn progress_label(&self) -> String {
        format!("{}/{}", self.correct_count, self.total())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatsSnapshot {
    pub attempts: u32,
    pub elapsed: Duration,
    pub average: f64,
    pub best_score: usize,
    pub total_correct: u64,
    pub frame_count: usize,
}

impl StatsSnapshot {
    pub fn elapsed_label(&self) -> String {
        format_elapsed(self.elapsed)
    }

    pub fn average_label(&self) -> String {
        format!("{:.1}", self.average)
    }

    pub fn best_label(&self) -> String {
        format!("{}/{}", self.best_score, self.frame_count)
    }
}

/// `MM:SS`, minutes keep growing past 99.
pub fn format_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs();
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
