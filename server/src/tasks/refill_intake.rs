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

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use resources::{
    misc::{ClinicianId, PatientId, PharmacyId, RemotePharmacyId},
    Clinician, Kind, Patient, PharmacySource, Prescription, RefillRequest, Status, StatusEvent,
};

use crate::{
    events::{EventBus, RefillRequestCreatedEvent},
    gateway::{ErxGateway, GatewayPrescription, RefillRequestItem},
    state::{DataStore, Lookup},
};

use super::{Error, Shutdown, Stats, WorkerLock};

const LOCK_OWNER: &str = "refill_intake";

#[derive(Clone, Debug)]
pub struct IntakeConfig {
    pub interval: Duration,
    pub pathway: String,
}

/// Pulls the refill requests from the clinic queue of the gateway and
/// creates the local refill request records.
pub struct RefillIntakePoller {
    store: Arc<dyn DataStore>,
    gateway: Arc<dyn ErxGateway>,
    events: Arc<EventBus>,
    lock: Arc<dyn WorkerLock>,
    config: IntakeConfig,
    stats: Arc<Stats>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IntakeReport {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum Intake {
    Created,
    Exists,
}

impl RefillIntakePoller {
    pub fn new(
        store: Arc<dyn DataStore>,
        gateway: Arc<dyn ErxGateway>,
        events: Arc<EventBus>,
        lock: Arc<dyn WorkerLock>,
        config: IntakeConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            events,
            lock,
            config,
            stats: Default::default(),
        }
    }

    pub fn stats(&self) -> Arc<Stats> {
        self.stats.clone()
    }

    pub async fn run(self, mut shutdown: Shutdown) {
        info!("Refill intake poller started");

        while !shutdown.is_triggered() {
            self.tick().await;

            if !shutdown.sleep(self.config.interval).await {
                break;
            }
        }

        self.lock.release(LOCK_OWNER).await;

        info!("Refill intake poller stopped");
    }

    /// Runs one cycle if this replica holds the worker lock.
    pub async fn tick(&self) -> Option<IntakeReport> {
        if !self.lock.try_acquire(LOCK_OWNER).await {
            debug!("Refill intake lock is held by another worker");

            return None;
        }

        let started = Instant::now();
        let report = match self.run_once().await {
            Ok(report) => report,
            Err(err) => {
                error!("Refill intake cycle failed: {}", err);
                self.stats.failed();

                IntakeReport::default()
            }
        };

        self.stats.cycle(started.elapsed());
        self.lock.release(LOCK_OWNER).await;

        Some(report)
    }

    pub async fn run_once(&self) -> Result<IntakeReport, Error> {
        let in_flight = self.store.in_flight_refill_requests().await?;

        let clinician = match self.store.first_clinician_with_remote_id().await? {
            Lookup::Found(clinician) => clinician,
            Lookup::NotFound => {
                warn!("Unable to get a clinician with a remote clinician id");

                return Ok(IntakeReport::default());
            }
        };
        let remote_clinician_id = clinician
            .remote_clinician_id
            .ok_or(Error::MissingRemoteClinicianId(clinician.id))?;

        let items = self
            .gateway
            .refill_request_queue_for_clinic(remote_clinician_id)
            .await?;

        let mut report = IntakeReport::default();
        for item in &items {
            if in_flight.contains(&item.queue_item_id) {
                report.skipped += 1;

                continue;
            }

            match self.intake(item).await {
                Ok(Intake::Created) => report.created += 1,
                Ok(Intake::Exists) => report.skipped += 1,
                Err(err) if err.is_duplicate_queue_item() => {
                    debug!(
                        "Refill request {} was created concurrently: {}",
                        item.queue_item_id, err
                    );

                    report.skipped += 1;
                }
                Err(err) if err.is_transient() => {
                    warn!(
                        "Unable to take in refill request {}, retrying next cycle: {}",
                        item.queue_item_id, err
                    );
                    self.stats.failed();

                    report.failed += 1;
                }
                Err(err) => {
                    error!(
                        "Unable to take in refill request {}: {}",
                        item.queue_item_id, err
                    );
                    self.stats.failed();

                    report.failed += 1;
                }
            }
        }

        if report.created > 0 || report.failed > 0 {
            info!(
                "Refill intake: {} created, {} skipped, {} failed",
                report.created, report.skipped, report.failed
            );
        }

        Ok(report)
    }

    async fn intake(&self, item: &RefillRequestItem) -> Result<Intake, Error> {
        let queue_item_id = item.queue_item_id;
        let invalid = |msg: &str| Error::InvalidRefillRequest(queue_item_id, msg.into());

        if self
            .store
            .refill_request_by_queue_item_id(queue_item_id)
            .await?
            .is_found()
        {
            return Ok(Intake::Exists);
        }

        let requested = item
            .requested_prescription
            .as_ref()
            .ok_or_else(|| invalid("requested prescription is missing"))?;
        let dispensed = item
            .dispensed_prescription
            .as_ref()
            .ok_or_else(|| invalid("dispensed prescription is missing"))?;

        let clinician = match self
            .store
            .clinician_by_remote_clinician_id(item.remote_clinician_id)
            .await?
        {
            Lookup::Found(clinician) => clinician,
            Lookup::NotFound => {
                return Err(invalid(&format!(
                    "no clinician with remote id {}",
                    item.remote_clinician_id
                )))
            }
        };

        let requested_prescriber = self.prescriber(item, requested).await?;
        let dispensed_prescriber = self.prescriber(item, dispensed).await?;

        if requested_prescriber.id != clinician.id {
            return Err(invalid(&format!(
                "clinician {} does not match the prescriber {} of the requested prescription",
                clinician.id, requested_prescriber.id
            )));
        }

        let dispensed_pharmacy = self.pharmacy(item, dispensed).await?;
        let requested_pharmacy = self.pharmacy(item, requested).await?;

        if item.remote_patient_id.value() == 0 {
            return Err(invalid("remote patient id is not set"));
        }

        let (patient, created) = self.patient(item, &clinician).await?;
        let patient_id = patient
            .id
            .ok_or_else(|| invalid("patient has no local id"))?;

        let mut requested = prescription(
            requested,
            requested_prescriber.id,
            patient_id,
            requested_pharmacy,
        );
        let dispensed = prescription(
            dispensed,
            dispensed_prescriber.id,
            patient_id,
            dispensed_pharmacy,
        );

        if !created {
            match self
                .store
                .link_requested_prescription_to_original(&requested, &patient)
                .await?
            {
                Lookup::Found(original) => requested.original_prescription_id = Some(original),
                Lookup::NotFound => debug!(
                    "No original prescription found for refill request {}",
                    queue_item_id
                ),
            }
        }

        let request = RefillRequest {
            id: None,
            queue_item_id,
            reference_number: item.reference_number.clone(),
            pharmacy_rx_reference_number: item.pharmacy_rx_reference_number.clone(),
            requested_prescription: requested,
            dispensed_prescription: Some(dispensed),
            requested_at: item.requested_at,
            patient_id,
            pharmacy_id: Some(requested_pharmacy),
            clinician_id: clinician.id,
            remote_id: None,
        };
        let initial = StatusEvent::gateway(Status::Requested, item.requested_at, "");

        let request = self.store.insert_refill_request(request, initial).await?;
        let refill_request_id = request
            .id
            .ok_or_else(|| invalid("refill request has no local id"))?;

        info!(
            "Created refill request {} for queue item {}",
            refill_request_id, queue_item_id
        );

        self.events
            .refill_requests_created
            .publish(RefillRequestCreatedEvent {
                clinician_id: requested_prescriber.id,
                refill_request_id,
                patient_id,
            });

        Ok(Intake::Created)
    }

    async fn prescriber(
        &self,
        item: &RefillRequestItem,
        prescription: &GatewayPrescription,
    ) -> Result<Clinician, Error> {
        let remote_id = prescription.prescriber_id.ok_or_else(|| {
            Error::InvalidRefillRequest(item.queue_item_id, "prescriber is missing".into())
        })?;

        match self.store.clinician_by_remote_clinician_id(remote_id).await? {
            Lookup::Found(clinician) => Ok(clinician),
            Lookup::NotFound => Err(Error::InvalidRefillRequest(
                item.queue_item_id,
                format!("no clinician with remote id {}", remote_id),
            )),
        }
    }

    async fn pharmacy(
        &self,
        item: &RefillRequestItem,
        prescription: &GatewayPrescription,
    ) -> Result<PharmacyId, Error> {
        let remote_id: RemotePharmacyId = prescription.pharmacy_id.ok_or_else(|| {
            Error::InvalidRefillRequest(item.queue_item_id, "pharmacy is missing".into())
        })?;
        let source = PharmacySource::Surescripts;

        if let Lookup::Found(pharmacy) = self.store.pharmacy_by_remote_ref(remote_id, source).await? {
            if let Some(local_id) = pharmacy.local_id {
                return Ok(local_id);
            }
        }

        info!(
            "Pharmacy {} not found locally, fetching it from the gateway",
            remote_id
        );

        let mut pharmacy = self.gateway.pharmacy_details(remote_id).await?;
        pharmacy.local_id = None;
        pharmacy.remote_id = remote_id;
        pharmacy.source = source;

        Ok(self.store.add_pharmacy(pharmacy).await?)
    }

    /// Resolves the patient of the request, creating an unlinked patient if
    /// it is unknown. The flag tells whether the patient was created.
    async fn patient(
        &self,
        item: &RefillRequestItem,
        clinician: &Clinician,
    ) -> Result<(Patient, bool), Error> {
        if let Lookup::Found(patient) = self
            .store
            .patient_by_remote_patient_id(item.remote_patient_id)
            .await?
        {
            return Ok((patient, false));
        }

        if !item.patient_added_for_this_request {
            warn!(
                "Patient {} of refill request {} was expected to exist locally",
                item.remote_patient_id, item.queue_item_id
            );
        }

        debug!(
            "Creating unlinked patient for remote patient {}",
            item.remote_patient_id
        );

        let details = self.gateway.patient_details(item.remote_patient_id).await?;
        let patient = self
            .store
            .create_unlinked_patient(details, clinician.id, &self.config.pathway)
            .await?;

        Ok((patient, true))
    }
}

fn prescription(
    prescription: &GatewayPrescription,
    clinician_id: ClinicianId,
    patient_id: PatientId,
    pharmacy_id: PharmacyId,
) -> Prescription {
    Prescription {
        id: None,
        remote_id: prescription.remote_id,
        kind: Kind::RefillRequest,
        clinician_id,
        patient_id,
        pharmacy_id: Some(pharmacy_id),
        treatment_plan_id: None,
        original_prescription_id: None,
        medication: prescription.medication.clone(),
    }
}
