use std::collections::HashMap;

use chrono::{SecondsFormat, Utc};

use crate::types::{LeaderboardEntry, LeaderboardResponse};

/// Best endless score per display name; nothing here survives a restart.
#[derive(Debug, Default)]
pub struct ScoreLedger {
    bests: HashMap<String, StoredBest>,
}

#[derive(Clone, Debug)]
struct StoredBest {
    name: String,
    best: i32,
}

fn ledger_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn best(&self, name: &str) -> i32 {
        self.bests
            .get(&ledger_key(name))
            .map(|entry| entry.best)
            .unwrap_or(0)
    }

    pub fn record(&mut self, name: &str, score: i32) -> bool {
        let key = ledger_key(name);
        if key.is_empty() {
            return false;
        }
        let entry = self.bests.entry(key).or_insert_with(|| StoredBest {
            name: name.trim().to_string(),
            best: 0,
        });
        if score > entry.best {
            entry.name = name.trim().to_string();
            entry.best = score;
            return true;
        }
        false
    }

    pub fn build_response(&self, requested_limit: Option<usize>) -> LeaderboardResponse {
        LeaderboardResponse {
            generated_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            entries: self.top(requested_limit),
        }
    }

    fn top(&self, requested_limit: Option<usize>) -> Vec<LeaderboardEntry> {
        let limit = requested_limit.unwrap_or(10).clamp(1, 100);
        let mut entries: Vec<LeaderboardEntry> = self
            .bests
            .values()
            .map(|entry| LeaderboardEntry {
                name: entry.name.clone(),
                best_score: entry.best,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.best_score
                .cmp(&a.best_score)
                .then_with(|| a.name.cmp(&b.name))
        });
        entries.truncate(limit);
        entries
    }
}
