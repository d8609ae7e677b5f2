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

use std::time::Duration;

use tokio::{select, sync::watch, time::delay_for};

/// Creates a connected pair of shutdown trigger and shutdown signal.
pub fn shutdown() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);

    (ShutdownTrigger(tx), Shutdown(rx))
}

pub struct ShutdownTrigger(watch::Sender<bool>);

/// Shutdown signal observed by the workers. Dropping the trigger counts as
/// a shutdown.
#[derive(Clone)]
pub struct Shutdown(watch::Receiver<bool>);

impl ShutdownTrigger {
    pub fn trigger(&self) {
        let _ = self.0.broadcast(true);
    }
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once shutdown was triggered.
    pub async fn wait(&mut self) {
        while !self.is_triggered() {
            if self.0.recv().await.is_none() {
                return;
            }
        }
    }

    /// Sleeps for `duration`. Returns `false` if shutdown was triggered in the
    /// meantime.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        select! {
            _ = delay_for(duration) => !self.is_triggered(),
            _ = self.wait() => false,
        }
    }
}
