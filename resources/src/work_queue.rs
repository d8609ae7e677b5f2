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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    kind::Kind,
    misc::{ClinicianId, ItemId, PatientId},
    patient::Patient,
};

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum QueueEventType {
    #[serde(rename = "TRANSMISSION_ERROR")]
    TransmissionError,

    #[serde(rename = "REFILL_TRANSMISSION_ERROR")]
    RefillTransmissionError,

    #[serde(rename = "UNLINKED_DNTF_TRANSMISSION_ERROR")]
    UnlinkedFollowupTransmissionError,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueItemStatus {
    Pending,
    Completed,
}

/// Row of a clinician's work queue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClinicianQueueItem {
    pub clinician_id: ClinicianId,
    pub patient_id: Option<PatientId>,
    pub item_id: ItemId,
    pub kind: Kind,
    pub event_type: QueueEventType,
    pub status: QueueItemStatus,
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub short_description: String,
}

impl ClinicianQueueItem {
    /// Pending item telling `clinician_id` about a failed transmission.
    pub fn transmission_error(
        kind: Kind,
        clinician_id: ClinicianId,
        item_id: ItemId,
        patient: &Patient,
        created_at: DateTime<Utc>,
    ) -> Self {
        let spec = kind.spec();

        Self {
            clinician_id,
            patient_id: patient.id,
            item_id,
            kind,
            event_type: spec.work_event,
            status: QueueItemStatus::Pending,
            created_at,
            description: format!(
                "{} {} {}",
                spec.description, patient.first_name, patient.last_name
            ),
            short_description: spec.short_description.into(),
        }
    }

    /// Key of the "one pending row per clinician, item and event type" rule.
    pub fn pending_key(&self) -> (ClinicianId, ItemId, QueueEventType) {
        (self.clinician_id, self.item_id, self.event_type)
    }
}
