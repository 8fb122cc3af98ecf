// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::utc_now;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// Scope guard that reports the elapsed time of a top-level operation and,
/// when a profiler file is configured, appends a timing record to it.
pub struct OpTimer {
    name: &'static str,
    start: Instant,
    profile: Option<PathBuf>,
}

impl OpTimer {
    pub fn start(name: &'static str, profile: Option<PathBuf>) -> Self {
        Self {
            name,
            start: Instant::now(),
            profile,
        }
    }
}

impl Drop for OpTimer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        info!("operation '{}' elapsed time: {:?}", self.name, elapsed);
        if let Some(path) = &self.profile {
            let record = format!("{} {} {}\n", utc_now!(), self.name, elapsed.as_millis());
            let result = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| file.write_all(record.as_bytes()));
            if let Err(error) = result {
                warn!("unable to write profiler record to {:?}: {}", path, error);
            }
        }
    }
}
