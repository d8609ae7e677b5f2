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

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Lock shared by the replicas of a periodic worker, so only one of them
/// performs a cycle at a time.
#[async_trait]
pub trait WorkerLock: Send + Sync {
    /// Takes the lock for `owner`. Returns `false` if someone else holds it.
    async fn try_acquire(&self, owner: &str) -> bool;

    async fn release(&self, owner: &str);
}

/// Process local `WorkerLock`.
#[derive(Default)]
pub struct LocalLock {
    holder: Mutex<Option<String>>,
}

#[async_trait]
impl WorkerLock for LocalLock {
    async fn try_acquire(&self, owner: &str) -> bool {
        let mut holder = self.holder.lock().await;

        match &*holder {
            Some(current) => current == owner,
            None => {
                *holder = Some(owner.into());

                true
            }
        }
    }

    async fn release(&self, owner: &str) {
        let mut holder = self.holder.lock().await;

        if holder.as_deref() == Some(owner) {
            *holder = None;
        }
    }
}
