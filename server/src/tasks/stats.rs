/*
 * Copyright (c) 2021 gematik GmbH
 * 
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 * 
 *    http://www.apache.org/licenses/LICENSE-2.0
 * 
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 */

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Cycle statistics of a worker.
#[derive(Default)]
pub struct Stats {
    cycles: AtomicU64,
    failed: AtomicU64,
    not_found: AtomicU64,
    last_process_time: AtomicU64,
    total_process_time: AtomicU64,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Snapshot {
    pub cycles: u64,
    pub failed: u64,
    pub not_found: u64,
    pub last_process_time_ms: u64,
    pub total_process_time_ms: u64,
}

impl Stats {
    pub fn cycle(&self, process_time: Duration) {
        let ms = process_time.as_millis() as u64;

        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.last_process_time.store(ms, Ordering::Relaxed);
        self.total_process_time.fetch_add(ms, Ordering::Relaxed);
    }

    pub fn failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            last_process_time_ms: self.last_process_time.load(Ordering::Relaxed),
            total_process_time_ms: self.total_process_time.load(Ordering::Relaxed),
        }
    }
}

impl Display for Snapshot {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(
            f,
            "cycles/total={} cycles/failed={} cycles/processTime={}ms (total {}ms) errors/not_found={}",
            self.cycles,
            self.failed,
            self.last_process_time_ms,
            self.total_process_time_ms,
            self.not_found
        )
    }
}
