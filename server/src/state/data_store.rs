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

use std::collections::HashSet;

use async_trait::async_trait;
use resources::{
    misc::{
        ClinicianId, ItemId, PatientId, PharmacyId, PrescriptionId, QueueItemId, RefillRequestId,
        RemoteClinicianId, RemoteId, RemotePatientId, RemotePharmacyId,
    },
    Clinician, ClinicianQueueItem, Kind, Patient, PatientDetails, Pharmacy, PharmacySource,
    Prescription, RefillRequest, StatusEvent, TrackedItem,
};

use super::Error;

/// Result of a lookup that may legitimately find nothing.
#[derive(Clone, Debug, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Appended {
    Inserted,
    Duplicate,
}

/// Persistence contract shared by the reconciliation workers.
///
/// Every operation may fail with a transient error (see `Error::is_transient`)
/// the caller retries on its next cycle. Invariant violations are reported as
/// `Error::Conflict` and must not be retried.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn patient(&self, id: PatientId) -> Result<Lookup<Patient>, Error>;

    async fn clinician(&self, id: ClinicianId) -> Result<Lookup<Clinician>, Error>;

    /// Items of `kind` owned by the patient that have a remote id and whose
    /// latest status is not terminal.
    async fn tracked_items(
        &self,
        kind: Kind,
        patient_id: PatientId,
    ) -> Result<Vec<TrackedItem>, Error>;

    async fn prescription_by_remote_id(
        &self,
        kind: Kind,
        remote_id: RemoteId,
    ) -> Result<Lookup<TrackedItem>, Error>;

    async fn refill_request_by_queue_item_id(
        &self,
        queue_item_id: QueueItemId,
    ) -> Result<Lookup<RefillRequest>, Error>;

    async fn append_status_event(
        &self,
        kind: Kind,
        item_id: ItemId,
        event: StatusEvent,
    ) -> Result<Appended, Error>;

    /// Appends an error event and enqueues the clinician work item in one
    /// transaction. The work item is enqueued even if the event is a
    /// duplicate.
    async fn record_transmission_error(
        &self,
        kind: Kind,
        item_id: ItemId,
        event: StatusEvent,
        work: ClinicianQueueItem,
    ) -> Result<Appended, Error>;

    /// Status history of the item, newest first.
    async fn latest_status_events(
        &self,
        kind: Kind,
        item_id: ItemId,
    ) -> Result<Vec<StatusEvent>, Error>;

    /// Queue item ids of all refill requests with a non terminal status.
    async fn in_flight_refill_requests(&self) -> Result<HashSet<QueueItemId>, Error>;

    /// Inserts the request, its prescriptions and the initial status event
    /// atomically.
    async fn insert_refill_request(
        &self,
        request: RefillRequest,
        initial: StatusEvent,
    ) -> Result<RefillRequest, Error>;

    /// Stores the gateway id of the prescription transmitted on approval or
    /// denial and appends the `Approved`/`Denied` event atomically. Calling
    /// it again with the same id and event is a `Duplicate`.
    async fn mark_refill_request_transmitted(
        &self,
        id: RefillRequestId,
        remote_id: RemoteId,
        event: StatusEvent,
    ) -> Result<Appended, Error>;

    async fn link_requested_prescription_to_original(
        &self,
        requested: &Prescription,
        patient: &Patient,
    ) -> Result<Lookup<PrescriptionId>, Error>;

    async fn patient_by_remote_patient_id(
        &self,
        remote_patient_id: RemotePatientId,
    ) -> Result<Lookup<Patient>, Error>;

    async fn create_unlinked_patient(
        &self,
        details: PatientDetails,
        creating_clinician: ClinicianId,
        pathway: &str,
    ) -> Result<Patient, Error>;

    async fn pharmacy_by_remote_ref(
        &self,
        remote_pharmacy_id: RemotePharmacyId,
        source: PharmacySource,
    ) -> Result<Lookup<Pharmacy>, Error>;

    async fn add_pharmacy(&self, pharmacy: Pharmacy) -> Result<PharmacyId, Error>;

    async fn clinician_by_remote_clinician_id(
        &self,
        remote_clinician_id: RemoteClinicianId,
    ) -> Result<Lookup<Clinician>, Error>;

    async fn first_clinician_with_remote_id(&self) -> Result<Lookup<Clinician>, Error>;

    /// Returns `false` if an equal pending item does already exist.
    async fn enqueue_clinician_work(&self, item: ClinicianQueueItem) -> Result<bool, Error>;

    async fn list_active_providers_in_clinic(&self) -> Result<Vec<Clinician>, Error>;
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(value) => Lookup::Found(value),
            None => Lookup::NotFound,
        }
    }
}

impl Appended {
    pub fn is_inserted(&self) -> bool {
        *self == Appended::Inserted
    }
}
