//! Margin calculator history.
//!
//! `CalculationHistory` keeps the most recent calculations, newest first,
//! bounded by capacity. When full the oldest entry is dropped before the new
//! one goes in (`VecDeque` ring semantics). `HistoryFile` persists the list
//! as JSON between runs.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use tokio::fs;

use crate::error::AppError;
use crate::margin::MarginCalculation;

pub const DEFAULT_CAPACITY: usize = 20;

/// Same cost and sale recorded within this window are treated as one.
pub const DEDUPE_WINDOW_SECONDS: i64 = 5;

#[derive(Debug, Clone)]
pub struct CalculationHistory {
    entries: VecDeque<MarginCalculation>,
    capacity: usize,
}

impl Default for CalculationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CalculationHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn from_entries(entries: Vec<MarginCalculation>, capacity: usize) -> Self {
        let mut entries: VecDeque<_> = entries.into();
        entries.truncate(capacity);
        Self { entries, capacity }
    }

    /// Record `calc` as of `now`. Returns `false` when it duplicates a
    /// recent entry and was skipped.
    pub fn record_at(&mut self, calc: MarginCalculation, now: DateTime<Utc>) -> bool {
        let window = Duration::seconds(DEDUPE_WINDOW_SECONDS);
        let duplicate = self.entries.iter().any(|h| {
            now - h.timestamp < window && h.cost == calc.cost && h.sale == calc.sale
        });
        if duplicate {
            return false;
        }

        if self.entries.len() >= self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(calc);
        true
    }

    pub fn record(&mut self, calc: MarginCalculation) -> bool {
        self.record_at(calc, Utc::now())
    }

    /// Newest first.
    pub fn entries(&self) -> impl Iterator<Item = &MarginCalculation> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// JSON file backing a [`CalculationHistory`].
#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file means empty history. A corrupt file is logged and also
    /// treated as empty so the calculator keeps working.
    pub async fn load(&self) -> Result<CalculationHistory, AppError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CalculationHistory::default());
            }
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_str::<Vec<MarginCalculation>>(&raw) {
            Ok(entries) => Ok(CalculationHistory::from_entries(entries, DEFAULT_CAPACITY)),
            Err(err) => {
                tracing::warn!("Ignoring unreadable history at {}: {}", self.path.display(), err);
                Ok(CalculationHistory::default())
            }
        }
    }

    pub async fn save(&self, history: &CalculationHistory) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let entries: Vec<&MarginCalculation> = history.entries().collect();
        let json = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.path, json).await?;
        tracing::debug!("Saved {} calculations to {}", history.len(), self.path.display());
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), AppError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
