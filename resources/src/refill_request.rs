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
    misc::{ClinicianId, PatientId, PharmacyId, QueueItemId, RefillRequestId, RemoteId},
    prescription::Prescription,
};

/// A pharmacy-initiated request to authorize another fill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefillRequest {
    pub id: Option<RefillRequestId>,
    pub queue_item_id: QueueItemId,

    #[serde(default)]
    pub reference_number: String,

    #[serde(default)]
    pub pharmacy_rx_reference_number: String,

    pub requested_prescription: Prescription,
    pub dispensed_prescription: Option<Prescription>,
    pub requested_at: DateTime<Utc>,
    pub patient_id: PatientId,
    pub pharmacy_id: Option<PharmacyId>,
    pub clinician_id: ClinicianId,

    /// Gateway id of the prescription that was transmitted when the
    /// clinician approved or denied the request. Status checks and error
    /// reports of the request refer to this id.
    #[serde(default)]
    pub remote_id: Option<RemoteId>,
}
