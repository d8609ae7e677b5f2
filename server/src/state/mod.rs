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

mod data_store;
mod directory;
mod error;
mod persist;
mod prescriptions;
mod refill_requests;
mod status_events;
mod store;
mod work_queue;

use std::cmp::max;
use std::sync::Arc;

use tokio::{
    sync::{Mutex, MutexGuard},
    time::{timeout, Duration},
};

pub use data_store::{Appended, DataStore, Lookup};
pub use directory::{Clinicians, Patients, Pharmacies};
pub use error::{Conflict, Error};
pub use prescriptions::Prescriptions;
pub use refill_requests::{RefillRequestRow, RefillRequests};
pub use status_events::StatusEvents;
pub use work_queue::WorkQueue;

/// In-memory data store shared by all workers.
#[derive(Clone)]
pub struct State {
    inner: Arc<Mutex<Inner>>,
    config: Arc<Config>,
}

#[derive(Default)]
pub struct Inner {
    next_id: u64,

    prescriptions: Prescriptions,
    refill_requests: RefillRequests,
    status_events: StatusEvents,
    patients: Patients,
    clinicians: Clinicians,
    pharmacies: Pharmacies,
    work_queue: WorkQueue,
}

struct Config {
    lock_timeout: Duration,
}

impl State {
    pub fn new(lock_timeout: Duration) -> Self {
        let inner = Arc::new(Mutex::new(Inner::default()));
        let config = Arc::new(Config { lock_timeout });

        Self { inner, config }
    }

    /// Locks the store. Fails with `Error::Timeout` if the lock could not be
    /// acquired within the configured timeout.
    pub async fn lock(&self) -> Result<MutexGuard<'_, Inner>, Error> {
        timeout(self.config.lock_timeout, self.inner.lock())
            .await
            .map_err(|_| Error::Timeout)
    }
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;

        self.next_id
    }

    fn reserve_id(&mut self, id: u64) {
        self.next_id = max(self.next_id, id);
    }
}
