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

//! Fixtures and a scripted gateway for the worker tests.

mod error_sweeper;
mod status_reconciler;

pub use failing_store::FailingStore;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::StatusCode;
use resources::{
    misc::{
        ClinicianId, ItemId, PatientId, QueueItemId, RemoteClinicianId, RemoteId,
        RemotePatientId, RemotePharmacyId,
    },
    Clinician, Kind, Medication, Patient, PatientDetails, Pharmacy, PharmacySource, Prescription,
    ProviderRole, RefillRequest, RemoteStatus, Status, StatusEvent,
};

use crate::{
    events::EventBus,
    gateway::{
        ErroredPrescription, Error as GatewayError, ErxGateway, GatewayPrescription, LogEntry,
        RefillRequestItem,
    },
    queue::{MemoryQueue, StatusCheckRequest, StatusQueue},
    state::{DataStore, State},
    tasks::{
        ErrorSweeper, IntakeConfig, LocalLock, ReconcilerConfig, RefillIntakePoller,
        StatusReconciler, WorkerLock,
    },
};

pub const PATIENT_ID: PatientId = PatientId::new(20);
pub const CLINICIAN_ID: ClinicianId = ClinicianId::new(50);
pub const REMOTE_CLINICIAN_ID: RemoteClinicianId = RemoteClinicianId::new(5);
pub const PATHWAY: &str = "health_condition_acne";

pub fn t(secs: i64) -> DateTime<Utc> {
    Utc.timestamp(1_600_000_000 + secs, 0)
}

pub fn clinician(id: u64, remote_id: Option<u64>, role: ProviderRole) -> Clinician {
    Clinician {
        id: ClinicianId::new(id),
        remote_clinician_id: remote_id.map(RemoteClinicianId::new),
        role,
        first_name: "Gregory".into(),
        last_name: "House".into(),
        active: true,
    }
}

pub fn patient(id: u64, remote_id: Option<u64>) -> Patient {
    Patient {
        id: Some(PatientId::new(id)),
        remote_patient_id: remote_id.map(RemotePatientId::new),
        first_name: "Jane".into(),
        last_name: "Doe".into(),
        dob: None,
        gender: "female".into(),
        phone: String::new(),
        address: None,
        unlinked: false,
        pathway: None,
        care_provider: Some(CLINICIAN_ID),
    }
}

pub fn medication(name: &str) -> Medication {
    Medication {
        display_name: name.into(),
        refills: Some(1),
        ..Default::default()
    }
}

pub fn log_entry(status: RemoteStatus, at: DateTime<Utc>, info: &str) -> LogEntry {
    LogEntry {
        status,
        reported_at: at,
        additional_info: info.into(),
    }
}

/// Refill request of the clinician with a requested prescription that has
/// the given remote id.
pub fn refill_request(queue_item_id: u64, remote_id: u64, patient_id: PatientId) -> RefillRequest {
    RefillRequest {
        id: None,
        queue_item_id: QueueItemId::new(queue_item_id),
        reference_number: "R-1".into(),
        pharmacy_rx_reference_number: "PRX-1".into(),
        requested_prescription: Prescription {
            id: None,
            remote_id: Some(RemoteId::new(remote_id)),
            kind: Kind::RefillRequest,
            clinician_id: CLINICIAN_ID,
            patient_id,
            pharmacy_id: None,
            treatment_plan_id: None,
            original_prescription_id: None,
            medication: medication("Doxycycline 100mg"),
        },
        dispensed_prescription: None,
        requested_at: t(10),
        patient_id,
        pharmacy_id: None,
        clinician_id: CLINICIAN_ID,
        remote_id: None,
    }
}

pub fn gateway_prescription(remote_id: u64, prescriber: u64, pharmacy: u64) -> GatewayPrescription {
    GatewayPrescription {
        remote_id: Some(RemoteId::new(remote_id)),
        prescriber_id: Some(RemoteClinicianId::new(prescriber)),
        pharmacy_id: Some(RemotePharmacyId::new(pharmacy)),
        medication: medication("Doxycycline 100mg"),
    }
}

/// Queue entry of remote patient 700: requested prescription 41 at pharmacy
/// 300 and dispensed prescription 40 at pharmacy 301, both prescribed by
/// remote clinician 5.
pub fn queue_item(queue_item_id: u64) -> RefillRequestItem {
    RefillRequestItem {
        queue_item_id: QueueItemId::new(queue_item_id),
        reference_number: "R-9001".into(),
        pharmacy_rx_reference_number: "PRX-77".into(),
        remote_clinician_id: REMOTE_CLINICIAN_ID,
        remote_patient_id: RemotePatientId::new(700),
        requested_at: t(10),
        requested_prescription: Some(gateway_prescription(41, 5, 300)),
        dispensed_prescription: Some(gateway_prescription(40, 5, 301)),
        patient_added_for_this_request: true,
    }
}

pub fn patient_details(remote_id: u64) -> PatientDetails {
    PatientDetails {
        remote_patient_id: RemotePatientId::new(remote_id),
        first_name: "John".into(),
        last_name: "Roe".into(),
        dob: None,
        gender: "male".into(),
        phone: "2065550100".into(),
        address: None,
    }
}

pub fn message(kind: Kind) -> String {
    StatusCheckRequest {
        patient_id: PATIENT_ID,
        clinician_id: CLINICIAN_ID,
        kind,
    }
    .to_body()
    .unwrap()
}

/// Test setup: a store with one clinician (50, remote 5) and one patient
/// (20), a scripted gateway and an in-memory queue.
pub struct Harness {
    pub state: State,
    pub gateway: Arc<FakeGateway>,
    pub queue: Arc<MemoryQueue>,
    pub events: Arc<EventBus>,
    pub lock: Arc<LocalLock>,
}

impl Harness {
    pub async fn new() -> Self {
        let state = State::new(Duration::from_secs(5));

        {
            let mut inner = state.lock().await.unwrap();
            inner.insert_clinician(clinician(50, Some(5), ProviderRole::Clinician));
            inner.insert_patient(patient(20, None)).unwrap();
        }

        Self {
            state,
            gateway: Arc::new(FakeGateway::default()),
            queue: Arc::new(MemoryQueue::default()),
            events: Arc::new(EventBus::new()),
            lock: Arc::new(LocalLock::default()),
        }
    }

    pub fn reconciler(&self) -> StatusReconciler {
        StatusReconciler::new(
            Arc::new(self.state.clone()),
            self.gateway.clone(),
            self.queue.clone(),
            self.events.clone(),
            ReconcilerConfig {
                poll_interval: Duration::from_millis(10),
                visibility_timeout: Duration::from_millis(0),
                long_poll: Duration::from_millis(0),
                batch_size: 10,
            },
        )
    }

    pub fn intake(&self) -> RefillIntakePoller {
        self.intake_with(Arc::new(self.state.clone()))
    }

    pub fn intake_with(&self, store: Arc<dyn DataStore>) -> RefillIntakePoller {
        RefillIntakePoller::new(
            store,
            self.gateway.clone(),
            self.events.clone(),
            self.lock.clone() as Arc<dyn WorkerLock>,
            IntakeConfig {
                interval: Duration::from_millis(10),
                pathway: PATHWAY.into(),
            },
        )
    }

    pub fn sweeper(&self) -> ErrorSweeper {
        ErrorSweeper::new(
            Arc::new(self.state.clone()),
            self.gateway.clone(),
            self.events.clone(),
            self.lock.clone() as Arc<dyn WorkerLock>,
            Duration::from_millis(10),
        )
    }

    pub async fn send(&self, kind: Kind) {
        self.queue.send(message(kind)).await.unwrap();
    }

    /// Inserts a treatment or unlinked follow-up prescription of patient 20
    /// and writes its history, one event per second.
    pub async fn prescription(&self, kind: Kind, remote_id: u64, history: &[Status]) -> ItemId {
        let mut inner = self.state.lock().await.unwrap();

        let id = inner
            .insert_prescription(Prescription {
                id: None,
                remote_id: Some(RemoteId::new(remote_id)),
                kind,
                clinician_id: CLINICIAN_ID,
                patient_id: PATIENT_ID,
                pharmacy_id: None,
                treatment_plan_id: None,
                original_prescription_id: None,
                medication: medication("Doxycycline 100mg"),
            })
            .unwrap();

        for (i, status) in history.iter().enumerate() {
            inner
                .append_status_event(kind, id.into(), StatusEvent::local(*status, t(i as i64)))
                .unwrap();
        }

        id.into()
    }

    /// Inserts a refill request of patient 20 whose requested prescription
    /// has the gateway id 41 and reports it as transmitted under
    /// `remote_id`.
    pub async fn transmitted_refill_request(
        &self,
        queue_item_id: u64,
        remote_id: u64,
        status: Status,
    ) -> ItemId {
        let request = self
            .state
            .insert_refill_request(
                refill_request(queue_item_id, 41, PATIENT_ID),
                StatusEvent::gateway(Status::Requested, t(10), ""),
            )
            .await
            .unwrap();
        let id = request.id.unwrap();

        self.state
            .mark_refill_request_transmitted(
                id,
                RemoteId::new(remote_id),
                StatusEvent::local(status, t(20)),
            )
            .await
            .unwrap();

        id.into()
    }

    pub async fn history(&self, kind: Kind, item_id: ItemId) -> Vec<StatusEvent> {
        self.state.latest_status_events(kind, item_id).await.unwrap()
    }

    pub async fn work_items(&self) -> Vec<resources::ClinicianQueueItem> {
        self.state.lock().await.unwrap().clinician_work().cloned().collect()
    }
}

/// Write of another replica that happens while the gateway answers.
pub enum Interleaved {
    /// Appended during a prescription log request.
    StatusEvent {
        state: State,
        kind: Kind,
        item_id: ItemId,
        event: StatusEvent,
    },

    /// Inserted during a pharmacy details request.
    RefillRequest {
        state: State,
        request: RefillRequest,
    },
}

impl Interleaved {
    async fn apply(self) {
        match self {
            Interleaved::StatusEvent {
                state,
                kind,
                item_id,
                event,
            } => {
                state.append_status_event(kind, item_id, event).await.unwrap();
            }
            Interleaved::RefillRequest { state, request } => {
                let initial = StatusEvent::gateway(Status::Requested, request.requested_at, "");
                state.insert_refill_request(request, initial).await.unwrap();
            }
        }
    }
}

#[derive(Default)]
pub struct FakeGateway {
    inner: Mutex<FakeInner>,
}

#[derive(Default)]
struct FakeInner {
    logs: HashMap<RemoteId, Vec<LogEntry>>,
    missing: HashSet<RemoteId>,
    failing: HashSet<RemoteId>,
    refill_queue: Vec<RefillRequestItem>,
    patients: HashMap<RemotePatientId, PatientDetails>,
    pharmacies: HashMap<RemotePharmacyId, Pharmacy>,
    errors: HashMap<RemoteClinicianId, Vec<ErroredPrescription>>,
    interleaved: Option<Interleaved>,
    patient_calls: usize,
    pharmacy_calls: usize,
}

impl FakeGateway {
    fn with<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut FakeInner) -> T,
    {
        f(&mut self.inner.lock().unwrap())
    }

    pub fn set_log(&self, remote_id: u64, entries: Vec<LogEntry>) {
        self.with(|inner| inner.logs.insert(RemoteId::new(remote_id), entries));
    }

    pub fn set_missing(&self, remote_id: u64) {
        self.with(|inner| inner.missing.insert(RemoteId::new(remote_id)));
    }

    pub fn set_failing(&self, remote_id: u64, failing: bool) {
        self.with(|inner| {
            if failing {
                inner.failing.insert(RemoteId::new(remote_id));
            } else {
                inner.failing.remove(&RemoteId::new(remote_id));
            }
        });
    }

    pub fn set_refill_queue(&self, items: Vec<RefillRequestItem>) {
        self.with(|inner| inner.refill_queue = items);
    }

    pub fn add_patient(&self, details: PatientDetails) {
        self.with(|inner| inner.patients.insert(details.remote_patient_id, details));
    }

    pub fn add_pharmacy(&self, remote_id: u64, name: &str) {
        let pharmacy = Pharmacy {
            local_id: None,
            remote_id: RemotePharmacyId::new(remote_id),
            source: PharmacySource::Surescripts,
            name: name.into(),
            address: None,
            phone: String::new(),
            fax: String::new(),
        };

        self.with(|inner| inner.pharmacies.insert(pharmacy.remote_id, pharmacy));
    }

    pub fn set_errors(&self, clinician: RemoteClinicianId, errors: Vec<ErroredPrescription>) {
        self.with(|inner| inner.errors.insert(clinician, errors));
    }

    pub fn interleave(&self, interleaved: Interleaved) {
        self.with(|inner| inner.interleaved = Some(interleaved));
    }

    async fn apply_interleaved(&self, log_request: bool) {
        let interleaved = self.with(|inner| {
            let due = match &inner.interleaved {
                Some(Interleaved::StatusEvent { .. }) => log_request,
                Some(Interleaved::RefillRequest { .. }) => !log_request,
                None => false,
            };

            if due {
                inner.interleaved.take()
            } else {
                None
            }
        });

        if let Some(interleaved) = interleaved {
            interleaved.apply().await;
        }
    }

    pub fn patient_calls(&self) -> usize {
        self.with(|inner| inner.patient_calls)
    }

    pub fn pharmacy_calls(&self) -> usize {
        self.with(|inner| inner.pharmacy_calls)
    }
}

#[async_trait]
impl ErxGateway for FakeGateway {
    async fn prescription_log_entries(
        &self,
        clinician: RemoteClinicianId,
        remote_id: RemoteId,
    ) -> Result<Vec<LogEntry>, GatewayError> {
        assert_eq!(clinician, REMOTE_CLINICIAN_ID);

        self.apply_interleaved(true).await;

        self.with(|inner| {
            if inner.failing.contains(&remote_id) {
                Err(GatewayError::InvalidResponse(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "maintenance".into(),
                ))
            } else if inner.missing.contains(&remote_id) {
                Err(GatewayError::NotFound(format!("prescription {}", remote_id)))
            } else {
                Ok(inner.logs.get(&remote_id).cloned().unwrap_or_default())
            }
        })
    }

    async fn refill_request_queue_for_clinic(
        &self,
        _clinician: RemoteClinicianId,
    ) -> Result<Vec<RefillRequestItem>, GatewayError> {
        Ok(self.with(|inner| inner.refill_queue.clone()))
    }

    async fn patient_details(
        &self,
        remote_patient_id: RemotePatientId,
    ) -> Result<PatientDetails, GatewayError> {
        self.with(|inner| {
            inner.patient_calls += 1;

            inner
                .patients
                .get(&remote_patient_id)
                .cloned()
                .ok_or_else(|| GatewayError::NotFound(format!("patient {}", remote_patient_id)))
        })
    }

    async fn pharmacy_details(
        &self,
        remote_pharmacy_id: RemotePharmacyId,
    ) -> Result<Pharmacy, GatewayError> {
        self.apply_interleaved(false).await;

        self.with(|inner| {
            inner.pharmacy_calls += 1;

            inner
                .pharmacies
                .get(&remote_pharmacy_id)
                .cloned()
                .ok_or_else(|| GatewayError::NotFound(format!("pharmacy {}", remote_pharmacy_id)))
        })
    }

    async fn transmission_error_details(
        &self,
        clinician: RemoteClinicianId,
    ) -> Result<Vec<ErroredPrescription>, GatewayError> {
        Ok(self.with(|inner| inner.errors.get(&clinician).cloned().unwrap_or_default()))
    }
}
