use crate::history::History;

/// Reactions strictly below this many seconds are flagged as elite
pub const ELITE_THRESHOLD_SECS: f64 = 0.200;

/// Rating bucket shown next to a reaction time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceTier {
    JumpStart,
    Godlike,
    F1Level,
    Excellent,
    KeepTraining,
}

impl PerformanceTier {
    pub fn from_reaction(secs: f64) -> Self {
        if secs <= 0.0 {
            PerformanceTier::JumpStart
        } else if secs < 0.180 {
            PerformanceTier::Godlike
        } else if secs < 0.230 {
            PerformanceTier::F1Level
        } else if secs < 0.300 {
            PerformanceTier::Excellent
        } else {
            PerformanceTier::KeepTraining
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PerformanceTier::JumpStart => "JUMP START",
            PerformanceTier::Godlike => "GODLIKE REFLEXES",
            PerformanceTier::F1Level => "F1 LEVEL",
            PerformanceTier::Excellent => "EXCELLENT",
            PerformanceTier::KeepTraining => "KEEP TRAINING",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Benchmark {
    pub name: &'static str,
    pub time: f64,
    pub label: &'static str,
}

pub const PRO_BENCHMARKS: [Benchmark; 5] = [
    Benchmark {
        name: "Graham Hill",
        time: 0.160,
        label: "World Record",
    },
    Benchmark {
        name: "Lewis Hamilton",
        time: 0.165,
        label: "7x Champ",
    },
    Benchmark {
        name: "Max Verstappen",
        time: 0.180,
        label: "Peak Performance",
    },
    Benchmark {
        name: "F1 Pole Average",
        time: 0.200,
        label: "Elite",
    },
    Benchmark {
        name: "Avg F1 Driver",
        time: 0.220,
        label: "Pro Standard",
    },
];

impl Benchmark {
    pub fn is_beaten_by(&self, best: Option<f64>) -> bool {
        best.is_some_and(|b| b <= self.time)
    }
}

/// Benchmarks matched or beaten by `best`
pub fn benchmarks_beaten(best: Option<f64>) -> impl Iterator<Item = &'static Benchmark> {
    PRO_BENCHMARKS.iter().filter(move |b| b.is_beaten_by(best))
}

/// Derived view of a history; never stored
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub attempts: usize,
    pub valid: usize,
    pub jump_starts: usize,
    pub best: Option<f64>,
    pub average: Option<f64>,
    pub std_dev: Option<f64>,
}

pub fn summarize(history: &History) -> Summary {
    let valid_times = history.valid_times();
    Summary {
        attempts: history.len(),
        valid: valid_times.len(),
        jump_starts: history.len() - valid_times.len(),
        best: history.best_time(),
        average: mean(&valid_times),
        std_dev: std_dev(&valid_times),
    }
}

pub fn mean(data: &[f64]) -> Option<f64> {
    match data.len() {
        0 => None,
        count => Some(data.iter().sum::<f64>() / count as f64),
    }
}

/// Population standard deviation; how consistent the reactions are
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Attempt;

    #[test]
    fn tiers_follow_thresholds() {
        assert_eq!(PerformanceTier::from_reaction(-1.0), PerformanceTier::JumpStart);
        assert_eq!(PerformanceTier::from_reaction(0.0), PerformanceTier::JumpStart);
        assert_eq!(PerformanceTier::from_reaction(0.179), PerformanceTier::Godlike);
        assert_eq!(PerformanceTier::from_reaction(0.180), PerformanceTier::F1Level);
        assert_eq!(PerformanceTier::from_reaction(0.229), PerformanceTier::F1Level);
        assert_eq!(PerformanceTier::from_reaction(0.250), PerformanceTier::Excellent);
        assert_eq!(PerformanceTier::from_reaction(0.300), PerformanceTier::KeepTraining);
        assert_eq!(PerformanceTier::Godlike.label(), "GODLIKE REFLEXES");
    }

    #[test]
    fn benchmarks_beaten_by_best() {
        let names: Vec<_> = benchmarks_beaten(Some(0.180)).map(|b| b.name).collect();
        assert_eq!(names, vec!["Max Verstappen", "F1 Pole Average", "Avg F1 Driver"]);
        assert_eq!(benchmarks_beaten(None).count(), 0);
        assert_eq!(benchmarks_beaten(Some(0.5)).count(), 0);
    }

    #[test]
    fn summary_counts_jump_starts_separately() {
        let mut history = History::default();
        for t in [0.2, -1.0, 0.3, -0.12] {
            history.record(Attempt::new(t));
        }
        let summary = summarize(&history);
        assert_eq!(summary.attempts, 4);
        assert_eq!(summary.valid, 2);
        assert_eq!(summary.jump_starts, 2);
        assert_eq!(summary.best, Some(0.2));
        assert!((summary.average.unwrap() - 0.25).abs() < 1e-12);
        assert!((summary.std_dev.unwrap() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn summary_of_empty_history() {
        let summary = summarize(&History::default());
        assert_eq!(summary.attempts, 0);
        assert_eq!(summary.best, None);
        assert_eq!(summary.average, None);
        assert_eq!(summary.std_dev, None);
    }

    #[test]
    fn test_mean() {
        assert!((mean(&[0.2, 0.4]).unwrap() - 0.3).abs() < 1e-12);
        assert_eq!(mean(&[0.25]), Some(0.25));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(std_dev(&[0.25]), Some(0.0));
        assert_eq!(std_dev(&[]), None);
        let sd = std_dev(&[0.18, 0.22, 0.20]).unwrap();
        assert!((sd - 0.016329931618554516).abs() < 1e-12);
    }
}
