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

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{error, info};

use crate::{
    queue::{Error as QueueError, MemoryQueue},
    state::{Error as StateError, State},
};

use super::{Shutdown, Stats};

/// Something that is written to a file now and then.
#[async_trait]
pub trait Persist: Send + Sync {
    type Error: Display + Send;

    async fn persist_to(&self, path: &Path) -> Result<(), Self::Error>;
}

#[async_trait]
impl Persist for State {
    type Error = StateError;

    async fn persist_to(&self, path: &Path) -> Result<(), StateError> {
        self.save_file(path).await
    }
}

#[async_trait]
impl Persist for MemoryQueue {
    type Error = QueueError;

    async fn persist_to(&self, path: &Path) -> Result<(), QueueError> {
        self.save_file(path).await
    }
}

/// Saves `target` every `interval` and once more on shutdown.
pub async fn persist<T>(
    name: &'static str,
    target: T,
    path: PathBuf,
    interval: Duration,
    mut shutdown: Shutdown,
) where
    T: Persist,
{
    while shutdown.sleep(interval).await {
        if let Err(err) = target.persist_to(&path).await {
            error!("Unable to save {} to {}: {}", name, path.display(), err);
        }
    }

    match target.persist_to(&path).await {
        Ok(()) => info!("Saved {} to {}", name, path.display()),
        Err(err) => error!("Unable to save {} to {}: {}", name, path.display(), err),
    }
}

/// Logs the statistics of the workers every `interval`.
pub async fn log_stats(workers: Vec<(&'static str, Arc<Stats>)>, interval: Duration, mut shutdown: Shutdown) {
    while shutdown.sleep(interval).await {
        for (name, stats) in &workers {
            info!("{}: {}", name, stats.snapshot());
        }
    }
}
