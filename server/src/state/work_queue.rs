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

use resources::{ClinicianQueueItem, QueueItemStatus};

/// Durable clinician work queue. At most one pending item exists per
/// clinician, item and event type.
#[derive(Default)]
pub struct WorkQueue {
    items: Vec<ClinicianQueueItem>,
}

impl WorkQueue {
    pub fn enqueue(&mut self, item: ClinicianQueueItem) -> bool {
        let key = item.pending_key();
        let exists = self
            .items
            .iter()
            .any(|other| other.status == QueueItemStatus::Pending && other.pending_key() == key);

        if exists && item.status == QueueItemStatus::Pending {
            return false;
        }

        self.items.push(item);

        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClinicianQueueItem> {
        self.items.iter()
    }
}
