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

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use resources::{
    misc::{
        ClinicianId, PatientId, PharmacyId, PrescriptionId, QueueItemId, RefillRequestId,
        RemoteId,
    },
    Kind,
};
use serde::{Deserialize, Serialize};

use super::{Conflict, Error};

/// Stored form of a refill request. The prescriptions are kept in the
/// prescription table and referenced by id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefillRequestRow {
    pub id: RefillRequestId,
    pub queue_item_id: QueueItemId,
    #[serde(default)]
    pub reference_number: String,
    #[serde(default)]
    pub pharmacy_rx_reference_number: String,
    pub requested_prescription_id: PrescriptionId,
    pub dispensed_prescription_id: Option<PrescriptionId>,
    pub requested_at: DateTime<Utc>,
    pub patient_id: PatientId,
    pub pharmacy_id: Option<PharmacyId>,
    pub clinician_id: ClinicianId,

    /// Gateway id of the prescription transmitted when the request was
    /// approved or denied.
    #[serde(default)]
    pub remote_id: Option<RemoteId>,
}

#[derive(Default)]
pub struct RefillRequests {
    by_id: HashMap<RefillRequestId, RefillRequestRow>,
    by_queue_item_id: HashMap<QueueItemId, RefillRequestId>,
    by_remote_id: HashMap<RemoteId, RefillRequestId>,
}

impl RefillRequests {
    pub fn insert(&mut self, row: RefillRequestRow) -> Result<(), Error> {
        if self.by_queue_item_id.contains_key(&row.queue_item_id) {
            return Err(Conflict::DuplicateQueueItem(row.queue_item_id).into());
        }

        if let Some(remote_id) = row.remote_id {
            if self.by_remote_id.contains_key(&remote_id) {
                return Err(Conflict::DuplicateRemoteId(Kind::RefillRequest, remote_id).into());
            }

            self.by_remote_id.insert(remote_id, row.id);
        }

        self.by_queue_item_id.insert(row.queue_item_id, row.id);
        self.by_id.insert(row.id, row);

        Ok(())
    }

    pub fn contains_queue_item_id(&self, queue_item_id: QueueItemId) -> bool {
        self.by_queue_item_id.contains_key(&queue_item_id)
    }

    pub fn get_by_id(&self, id: RefillRequestId) -> Option<&RefillRequestRow> {
        self.by_id.get(&id)
    }

    pub fn get_by_queue_item_id(&self, queue_item_id: QueueItemId) -> Option<&RefillRequestRow> {
        self.by_queue_item_id
            .get(&queue_item_id)
            .and_then(|id| self.by_id.get(id))
    }

    /// Checks that `remote_id` may be assigned to the request `id`. Returns
    /// `false` if it is assigned already.
    pub fn check_remote_id(&self, id: RefillRequestId, remote_id: RemoteId) -> Result<bool, Error> {
        let row = self
            .by_id
            .get(&id)
            .ok_or_else(|| Error::UnknownItem(Kind::RefillRequest, id.into()))?;

        match (row.remote_id, self.by_remote_id.get(&remote_id)) {
            (Some(current), _) if current == remote_id => Ok(false),
            (Some(current), _) => Err(Conflict::RemoteIdAssigned {
                item_id: id.into(),
                current,
                next: remote_id,
            }
            .into()),
            (None, Some(_)) => Err(Conflict::DuplicateRemoteId(Kind::RefillRequest, remote_id).into()),
            (None, None) => Ok(true),
        }
    }

    pub fn set_remote_id(&mut self, id: RefillRequestId, remote_id: RemoteId) -> Result<(), Error> {
        if !self.check_remote_id(id, remote_id)? {
            return Ok(());
        }

        if let Some(row) = self.by_id.get_mut(&id) {
            row.remote_id = Some(remote_id);
            self.by_remote_id.insert(remote_id, id);
        }

        Ok(())
    }

    pub fn get_by_remote_id(&self, remote_id: RemoteId) -> Option<&RefillRequestRow> {
        self.by_remote_id
            .get(&remote_id)
            .and_then(|id| self.by_id.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RefillRequestRow> {
        self.by_id.values()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn row(id: u64, queue_item_id: u64) -> RefillRequestRow {
        RefillRequestRow {
            id: RefillRequestId::new(id),
            queue_item_id: QueueItemId::new(queue_item_id),
            reference_number: String::new(),
            pharmacy_rx_reference_number: String::new(),
            requested_prescription_id: PrescriptionId::new(id + 100),
            dispensed_prescription_id: None,
            requested_at: Utc.ymd(2021, 3, 1).and_hms(10, 0, 0),
            patient_id: PatientId::new(20),
            pharmacy_id: None,
            clinician_id: ClinicianId::new(50),
            remote_id: None,
        }
    }

    #[test]
    fn remote_id_is_unique() {
        let mut requests = RefillRequests::default();
        requests.insert(row(1, 9001)).unwrap();
        requests.insert(row(2, 9002)).unwrap();

        let first = RefillRequestId::new(1);
        let second = RefillRequestId::new(2);
        let remote_id = RemoteId::new(99);

        requests.set_remote_id(first, remote_id).unwrap();
        requests.set_remote_id(first, remote_id).unwrap();
        assert_eq!(requests.get_by_remote_id(remote_id).unwrap().id, first);

        let err = requests.set_remote_id(second, remote_id).unwrap_err();
        assert!(err.is_conflict());

        let err = requests.set_remote_id(first, RemoteId::new(98)).unwrap_err();
        assert!(err.is_conflict());

        let err = requests.insert(row(3, 9001)).unwrap_err();
        assert!(matches!(err, Error::Conflict(Conflict::DuplicateQueueItem(_))));
    }
}
