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

mod client;
mod error;
mod http;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use resources::{
    misc::{QueueItemId, RemoteClinicianId, RemoteId, RemotePatientId, RemotePharmacyId},
    Medication, PatientDetails, Pharmacy, RemoteStatus,
};
use serde::{Deserialize, Serialize};

pub use client::HttpGateway;
pub use error::Error;

/// Adapter for the remote pharmacy network. None of the operations is
/// transactional with the local data store, all of them may fail
/// transiently.
#[async_trait]
pub trait ErxGateway: Send + Sync {
    /// Log of the prescription, newest entry first.
    async fn prescription_log_entries(
        &self,
        clinician: RemoteClinicianId,
        remote_id: RemoteId,
    ) -> Result<Vec<LogEntry>, Error>;

    async fn refill_request_queue_for_clinic(
        &self,
        clinician: RemoteClinicianId,
    ) -> Result<Vec<RefillRequestItem>, Error>;

    async fn patient_details(&self, remote_patient_id: RemotePatientId)
        -> Result<PatientDetails, Error>;

    async fn pharmacy_details(&self, remote_pharmacy_id: RemotePharmacyId)
        -> Result<Pharmacy, Error>;

    async fn transmission_error_details(
        &self,
        clinician: RemoteClinicianId,
    ) -> Result<Vec<ErroredPrescription>, Error>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub status: RemoteStatus,
    pub reported_at: DateTime<Utc>,
    #[serde(default)]
    pub additional_info: String,
}

/// Prescription as embedded in a refill request of the clinic queue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GatewayPrescription {
    pub remote_id: Option<RemoteId>,
    pub prescriber_id: Option<RemoteClinicianId>,
    pub pharmacy_id: Option<RemotePharmacyId>,
    #[serde(default)]
    pub medication: Medication,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefillRequestItem {
    pub queue_item_id: QueueItemId,
    #[serde(default)]
    pub reference_number: String,
    #[serde(default)]
    pub pharmacy_rx_reference_number: String,
    pub remote_clinician_id: RemoteClinicianId,
    pub remote_patient_id: RemotePatientId,
    pub requested_at: DateTime<Utc>,
    pub requested_prescription: Option<GatewayPrescription>,
    pub dispensed_prescription: Option<GatewayPrescription>,
    #[serde(default)]
    pub patient_added_for_this_request: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErroredPrescription {
    pub remote_id: RemoteId,
    pub reported_at: DateTime<Utc>,
    #[serde(default)]
    pub error_details: String,
}
