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

use serde::{Deserialize, Serialize};

use super::{
    kind::Kind,
    medication::Medication,
    misc::{ClinicianId, ItemId, PatientId, PharmacyId, PrescriptionId, RemoteId, TreatmentPlanId},
    status::{Status, StatusEvent},
};

/// A concrete medication order.
///
/// The status history is not part of the prescription; it belongs to the
/// owning item and is read through [`TrackedItem`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: Option<PrescriptionId>,
    pub remote_id: Option<RemoteId>,
    pub kind: Kind,
    pub clinician_id: ClinicianId,
    pub patient_id: PatientId,
    pub pharmacy_id: Option<PharmacyId>,
    pub treatment_plan_id: Option<TreatmentPlanId>,

    /// Treatment this prescription continues, if one could be identified.
    pub original_prescription_id: Option<PrescriptionId>,

    pub medication: Medication,
}

/// An item together with the prescription the gateway knows it by and its
/// status history (newest first).
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedItem {
    pub kind: Kind,
    pub item_id: ItemId,
    pub prescription: Prescription,
    pub history: Vec<StatusEvent>,
}

impl TrackedItem {
    pub fn latest(&self) -> Option<&StatusEvent> {
        self.history.first()
    }

    pub fn current_status(&self) -> Option<Status> {
        self.latest().map(|event| event.status)
    }

    pub fn is_terminal(&self) -> bool {
        self.current_status()
            .map(Status::is_terminal)
            .unwrap_or(false)
    }

    /// Returns `true` if an error was already recorded or resolved for this item.
    pub fn has_error_recorded(&self) -> bool {
        self.history
            .iter()
            .any(|event| event.status.is_error() || event.status.is_resolution())
    }
}
