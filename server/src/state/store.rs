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
        ClinicianId, ItemId, PatientId, PharmacyId, PrescriptionId, QueueItemId,
        RefillRequestId, RemoteClinicianId, RemoteId, RemotePatientId, RemotePharmacyId,
    },
    Clinician, ClinicianQueueItem, Kind, Patient, PatientDetails, Pharmacy, PharmacySource,
    Prescription, ProviderRole, RefillRequest, Status, StatusEvent, TrackedItem,
};

use super::{Appended, Conflict, DataStore, Error, Inner, Lookup, RefillRequestRow, State};

impl Inner {
    pub fn insert_patient(&mut self, mut patient: Patient) -> Result<PatientId, Error> {
        match patient.id {
            Some(id) => self.reserve_id(id.value()),
            None => patient.id = Some(self.next_id().into()),
        }

        self.patients.insert(patient)
    }

    pub fn insert_clinician(&mut self, clinician: Clinician) {
        self.reserve_id(clinician.id.value());
        self.clinicians.insert(clinician);
    }

    /// Inserts a treatment or unlinked follow-up prescription. Its history
    /// is written with `append_status_event`.
    pub fn insert_prescription(
        &mut self,
        mut prescription: Prescription,
    ) -> Result<PrescriptionId, Error> {
        let id = match prescription.id {
            Some(id) => {
                self.reserve_id(id.value());

                id
            }
            None => self.next_id().into(),
        };

        prescription.id = Some(id);
        let tracked = prescription.kind != Kind::RefillRequest;
        self.prescriptions.insert(prescription, tracked)?;

        Ok(id)
    }

    pub fn clinician_work(&self) -> impl Iterator<Item = &ClinicianQueueItem> {
        self.work_queue.iter()
    }

    pub fn patient(&self, id: PatientId) -> Lookup<Patient> {
        self.patients.get_by_id(id).cloned().into()
    }

    pub fn clinician(&self, id: ClinicianId) -> Lookup<Clinician> {
        self.clinicians.get_by_id(id).cloned().into()
    }

    pub fn tracked_items(&self, kind: Kind, patient_id: PatientId) -> Vec<TrackedItem> {
        let item_ids: Vec<ItemId> = match kind {
            Kind::RefillRequest => self
                .refill_requests
                .iter()
                .filter(|row| row.patient_id == patient_id)
                .map(|row| row.id.into())
                .collect(),
            _ => self
                .prescriptions
                .iter()
                .filter(|p| p.kind == kind && p.patient_id == patient_id)
                .filter_map(|p| p.id)
                .map(Into::into)
                .collect(),
        };

        let mut items = item_ids
            .into_iter()
            .filter_map(|item_id| self.tracked_item(kind, item_id))
            .filter(|item| item.prescription.remote_id.is_some())
            .filter(|item| !item.history.is_empty() && !item.is_terminal())
            .collect::<Vec<_>>();
        items.sort_by_key(|item| item.item_id);

        items
    }

    /// Refill requests are found by the id of the prescription transmitted
    /// on approval or denial, the other kinds by their own remote id.
    pub fn prescription_by_remote_id(&self, kind: Kind, remote_id: RemoteId) -> Lookup<TrackedItem> {
        let item_id: ItemId = match kind {
            Kind::RefillRequest => match self.refill_requests.get_by_remote_id(remote_id) {
                Some(row) => row.id.into(),
                None => return Lookup::NotFound,
            },
            _ => match self
                .prescriptions
                .get_by_remote_id(kind, remote_id)
                .and_then(|p| p.id)
            {
                Some(id) => id.into(),
                None => return Lookup::NotFound,
            },
        };

        self.tracked_item(kind, item_id).into()
    }

    pub fn refill_request_by_queue_item_id(
        &self,
        queue_item_id: QueueItemId,
    ) -> Lookup<RefillRequest> {
        self.refill_requests
            .get_by_queue_item_id(queue_item_id)
            .and_then(|row| self.assemble_refill_request(row))
            .into()
    }

    pub fn append_status_event(
        &mut self,
        kind: Kind,
        item_id: ItemId,
        event: StatusEvent,
    ) -> Result<Appended, Error> {
        if !self.item_exists(kind, item_id) {
            return Err(Error::UnknownItem(kind, item_id));
        }

        self.status_events.append(kind, item_id, event)
    }

    pub fn record_transmission_error(
        &mut self,
        kind: Kind,
        item_id: ItemId,
        event: StatusEvent,
        work: ClinicianQueueItem,
    ) -> Result<Appended, Error> {
        let appended = self.append_status_event(kind, item_id, event)?;
        self.work_queue.enqueue(work);

        Ok(appended)
    }

    pub fn latest_status_events(&self, kind: Kind, item_id: ItemId) -> Vec<StatusEvent> {
        self.status_events.history(kind, item_id)
    }

    pub fn in_flight_refill_requests(&self) -> HashSet<QueueItemId> {
        self.refill_requests
            .iter()
            .filter(|row| {
                self.status_events
                    .latest(Kind::RefillRequest, row.id.into())
                    .map(|event| !event.status.is_terminal())
                    .unwrap_or(false)
            })
            .map(|row| row.queue_item_id)
            .collect()
    }

    pub fn insert_refill_request(
        &mut self,
        request: RefillRequest,
        initial: StatusEvent,
    ) -> Result<RefillRequest, Error> {
        let kind = Kind::RefillRequest;

        if self.refill_requests.contains_queue_item_id(request.queue_item_id) {
            return Err(Conflict::DuplicateQueueItem(request.queue_item_id).into());
        }

        if let Some(remote_id) = request.remote_id {
            if self.refill_requests.get_by_remote_id(remote_id).is_some() {
                return Err(Conflict::DuplicateRemoteId(kind, remote_id).into());
            }
        }

        let id = match request.id {
            Some(id) => {
                self.reserve_id(id.value());

                id
            }
            None => RefillRequestId::new(self.next_id()),
        };

        self.status_events.check(kind, id.into(), &initial)?;

        let mut requested = request.requested_prescription;
        requested.id = Some(self.next_id().into());
        requested.kind = kind;

        let dispensed = request.dispensed_prescription.map(|mut dispensed| {
            dispensed.id = Some(self.next_id().into());
            dispensed.kind = kind;

            dispensed
        });

        let row = RefillRequestRow {
            id,
            queue_item_id: request.queue_item_id,
            reference_number: request.reference_number,
            pharmacy_rx_reference_number: request.pharmacy_rx_reference_number,
            requested_prescription_id: requested.id.ok_or(Error::MissingField("requested_prescription.id"))?,
            dispensed_prescription_id: dispensed.as_ref().and_then(|p| p.id),
            requested_at: request.requested_at,
            patient_id: request.patient_id,
            pharmacy_id: request.pharmacy_id,
            clinician_id: request.clinician_id,
            remote_id: request.remote_id,
        };

        self.prescriptions.insert(requested, false)?;
        if let Some(dispensed) = dispensed {
            self.prescriptions.insert(dispensed, false)?;
        }
        self.refill_requests.insert(row)?;
        self.status_events.append(kind, id.into(), initial)?;

        self.refill_requests
            .get_by_id(id)
            .and_then(|row| self.assemble_refill_request(row))
            .ok_or(Error::UnknownItem(kind, id.into()))
    }

    /// Finds the treatment the requested prescription is a refill of: the
    /// latest treatment of the patient with the same prescriber and
    /// medication.
    pub fn link_requested_prescription_to_original(
        &self,
        requested: &Prescription,
        patient: &Patient,
    ) -> Lookup<PrescriptionId> {
        let patient_id = match patient.id {
            Some(patient_id) => patient_id,
            None => return Lookup::NotFound,
        };

        let name = requested.medication.display_name.to_lowercase();

        self.prescriptions
            .iter()
            .filter(|p| p.kind == Kind::Treatment && p.patient_id == patient_id)
            .filter(|p| p.clinician_id == requested.clinician_id)
            .filter(|p| p.medication.display_name.to_lowercase() == name)
            .filter_map(|p| p.id)
            .max()
            .into()
    }

    /// Stores the id of the prescription the gateway transmitted when the
    /// clinician approved or denied the refill request, together with the
    /// `Approved` or `Denied` event.
    pub fn mark_refill_request_transmitted(
        &mut self,
        id: RefillRequestId,
        remote_id: RemoteId,
        event: StatusEvent,
    ) -> Result<Appended, Error> {
        let kind = Kind::RefillRequest;
        let item_id: ItemId = id.into();

        if !self.item_exists(kind, item_id) {
            return Err(Error::UnknownItem(kind, item_id));
        }

        if !matches!(event.status, Status::Approved | Status::Denied) {
            return Err(Conflict::InvalidTransition {
                kind,
                item_id,
                current: self.status_events.latest(kind, item_id).map(|e| e.status),
                next: event.status,
            }
            .into());
        }

        let appended = self.status_events.check(kind, item_id, &event)?;
        self.refill_requests.check_remote_id(id, remote_id)?;

        self.refill_requests.set_remote_id(id, remote_id)?;
        if appended.is_inserted() {
            self.status_events.append(kind, item_id, event)?;
        }

        Ok(appended)
    }

    pub fn patient_by_remote_patient_id(&self, remote_patient_id: RemotePatientId) -> Lookup<Patient> {
        self.patients
            .get_by_remote_id(remote_patient_id)
            .cloned()
            .into()
    }

    pub fn create_unlinked_patient(
        &mut self,
        details: PatientDetails,
        creating_clinician: ClinicianId,
        pathway: &str,
    ) -> Result<Patient, Error> {
        if let Some(patient) = self.patients.get_by_remote_id(details.remote_patient_id) {
            return Ok(patient.clone());
        }

        let mut patient = Patient::unlinked(details, creating_clinician, pathway);
        patient.id = Some(self.next_id().into());
        self.patients.insert(patient.clone())?;

        Ok(patient)
    }

    pub fn pharmacy_by_remote_ref(
        &self,
        remote_pharmacy_id: RemotePharmacyId,
        source: PharmacySource,
    ) -> Lookup<Pharmacy> {
        self.pharmacies
            .get_by_remote_ref(remote_pharmacy_id, source)
            .cloned()
            .into()
    }

    pub fn add_pharmacy(&mut self, mut pharmacy: Pharmacy) -> Result<PharmacyId, Error> {
        if let Some(existing) = self
            .pharmacies
            .get_by_remote_ref(pharmacy.remote_id, pharmacy.source)
        {
            return existing
                .local_id
                .ok_or(Error::MissingField("pharmacy.local_id"));
        }

        match pharmacy.local_id {
            Some(id) => self.reserve_id(id.value()),
            None => pharmacy.local_id = Some(self.next_id().into()),
        }

        self.pharmacies.insert(pharmacy)
    }

    pub fn clinician_by_remote_clinician_id(
        &self,
        remote_clinician_id: RemoteClinicianId,
    ) -> Lookup<Clinician> {
        self.clinicians
            .get_by_remote_id(remote_clinician_id)
            .cloned()
            .into()
    }

    pub fn first_clinician_with_remote_id(&self) -> Lookup<Clinician> {
        self.clinicians
            .iter()
            .find(|c| c.active && c.role == ProviderRole::Clinician && c.remote_clinician_id.is_some())
            .cloned()
            .into()
    }

    pub fn enqueue_clinician_work(&mut self, item: ClinicianQueueItem) -> bool {
        self.work_queue.enqueue(item)
    }

    pub fn list_active_providers_in_clinic(&self) -> Vec<Clinician> {
        self.clinicians.iter().filter(|c| c.active).cloned().collect()
    }

    fn item_exists(&self, kind: Kind, item_id: ItemId) -> bool {
        match kind {
            Kind::RefillRequest => self.refill_requests.get_by_id(item_id.into()).is_some(),
            _ => self
                .prescriptions
                .get_by_id(item_id.into())
                .map(|p| p.kind == kind)
                .unwrap_or(false),
        }
    }

    fn tracked_item(&self, kind: Kind, item_id: ItemId) -> Option<TrackedItem> {
        let prescription = match kind {
            Kind::RefillRequest => {
                let row = self.refill_requests.get_by_id(item_id.into())?;

                let mut prescription = self
                    .prescriptions
                    .get_by_id(row.requested_prescription_id)?
                    .clone();
                prescription.remote_id = row.remote_id;

                prescription
            }
            _ => {
                let prescription = self.prescriptions.get_by_id(item_id.into())?;
                if prescription.kind != kind {
                    return None;
                }

                prescription.clone()
            }
        };

        Some(TrackedItem {
            kind,
            item_id,
            prescription,
            history: self.status_events.history(kind, item_id),
        })
    }

    fn assemble_refill_request(&self, row: &RefillRequestRow) -> Option<RefillRequest> {
        let requested_prescription = self
            .prescriptions
            .get_by_id(row.requested_prescription_id)?
            .clone();
        let dispensed_prescription = row
            .dispensed_prescription_id
            .and_then(|id| self.prescriptions.get_by_id(id))
            .cloned();

        Some(RefillRequest {
            id: Some(row.id),
            queue_item_id: row.queue_item_id,
            reference_number: row.reference_number.clone(),
            pharmacy_rx_reference_number: row.pharmacy_rx_reference_number.clone(),
            requested_prescription,
            dispensed_prescription,
            requested_at: row.requested_at,
            patient_id: row.patient_id,
            pharmacy_id: row.pharmacy_id,
            clinician_id: row.clinician_id,
            remote_id: row.remote_id,
        })
    }
}

#[async_trait]
impl DataStore for State {
    async fn patient(&self, id: PatientId) -> Result<Lookup<Patient>, Error> {
        Ok(self.lock().await?.patient(id))
    }

    async fn clinician(&self, id: ClinicianId) -> Result<Lookup<Clinician>, Error> {
        Ok(self.lock().await?.clinician(id))
    }

    async fn tracked_items(
        &self,
        kind: Kind,
        patient_id: PatientId,
    ) -> Result<Vec<TrackedItem>, Error> {
        Ok(self.lock().await?.tracked_items(kind, patient_id))
    }

    async fn prescription_by_remote_id(
        &self,
        kind: Kind,
        remote_id: RemoteId,
    ) -> Result<Lookup<TrackedItem>, Error> {
        Ok(self.lock().await?.prescription_by_remote_id(kind, remote_id))
    }

    async fn refill_request_by_queue_item_id(
        &self,
        queue_item_id: QueueItemId,
    ) -> Result<Lookup<RefillRequest>, Error> {
        Ok(self
            .lock()
            .await?
            .refill_request_by_queue_item_id(queue_item_id))
    }

    async fn append_status_event(
        &self,
        kind: Kind,
        item_id: ItemId,
        event: StatusEvent,
    ) -> Result<Appended, Error> {
        self.lock().await?.append_status_event(kind, item_id, event)
    }

    async fn record_transmission_error(
        &self,
        kind: Kind,
        item_id: ItemId,
        event: StatusEvent,
        work: ClinicianQueueItem,
    ) -> Result<Appended, Error> {
        self.lock()
            .await?
            .record_transmission_error(kind, item_id, event, work)
    }

    async fn latest_status_events(
        &self,
        kind: Kind,
        item_id: ItemId,
    ) -> Result<Vec<StatusEvent>, Error> {
        Ok(self.lock().await?.latest_status_events(kind, item_id))
    }

    async fn in_flight_refill_requests(&self) -> Result<HashSet<QueueItemId>, Error> {
        Ok(self.lock().await?.in_flight_refill_requests())
    }

    async fn insert_refill_request(
        &self,
        request: RefillRequest,
        initial: StatusEvent,
    ) -> Result<RefillRequest, Error> {
        self.lock().await?.insert_refill_request(request, initial)
    }

    async fn mark_refill_request_transmitted(
        &self,
        id: RefillRequestId,
        remote_id: RemoteId,
        event: StatusEvent,
    ) -> Result<Appended, Error> {
        self.lock()
            .await?
            .mark_refill_request_transmitted(id, remote_id, event)
    }

    async fn link_requested_prescription_to_original(
        &self,
        requested: &Prescription,
        patient: &Patient,
    ) -> Result<Lookup<PrescriptionId>, Error> {
        Ok(self
            .lock()
            .await?
            .link_requested_prescription_to_original(requested, patient))
    }

    async fn patient_by_remote_patient_id(
        &self,
        remote_patient_id: RemotePatientId,
    ) -> Result<Lookup<Patient>, Error> {
        Ok(self
            .lock()
            .await?
            .patient_by_remote_patient_id(remote_patient_id))
    }

    async fn create_unlinked_patient(
        &self,
        details: PatientDetails,
        creating_clinician: ClinicianId,
        pathway: &str,
    ) -> Result<Patient, Error> {
        self.lock()
            .await?
            .create_unlinked_patient(details, creating_clinician, pathway)
    }

    async fn pharmacy_by_remote_ref(
        &self,
        remote_pharmacy_id: RemotePharmacyId,
        source: PharmacySource,
    ) -> Result<Lookup<Pharmacy>, Error> {
        Ok(self
            .lock()
            .await?
            .pharmacy_by_remote_ref(remote_pharmacy_id, source))
    }

    async fn add_pharmacy(&self, pharmacy: Pharmacy) -> Result<PharmacyId, Error> {
        self.lock().await?.add_pharmacy(pharmacy)
    }

    async fn clinician_by_remote_clinician_id(
        &self,
        remote_clinician_id: RemoteClinicianId,
    ) -> Result<Lookup<Clinician>, Error> {
        Ok(self
            .lock()
            .await?
            .clinician_by_remote_clinician_id(remote_clinician_id))
    }

    async fn first_clinician_with_remote_id(&self) -> Result<Lookup<Clinician>, Error> {
        Ok(self.lock().await?.first_clinician_with_remote_id())
    }

    async fn enqueue_clinician_work(&self, item: ClinicianQueueItem) -> Result<bool, Error> {
        Ok(self.lock().await?.enqueue_clinician_work(item))
    }

    async fn list_active_providers_in_clinic(&self) -> Result<Vec<Clinician>, Error> {
        Ok(self.lock().await?.list_active_providers_in_clinic())
    }
}
