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

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::misc::{Address, ClinicianId, PatientId, RemotePatientId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: Option<PatientId>,
    pub remote_patient_id: Option<RemotePatientId>,
    pub first_name: String,
    pub last_name: String,
    pub dob: Option<NaiveDate>,

    #[serde(default)]
    pub gender: String,

    #[serde(default)]
    pub phone: String,

    pub address: Option<Address>,

    /// Placeholder created for a refill request of a person the system has
    /// never seen before.
    #[serde(default)]
    pub unlinked: bool,

    pub pathway: Option<String>,
    pub care_provider: Option<ClinicianId>,
}

/// Demographics of a patient as known to the eRx gateway.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatientDetails {
    pub remote_patient_id: RemotePatientId,
    pub first_name: String,
    pub last_name: String,
    pub dob: Option<NaiveDate>,

    #[serde(default)]
    pub gender: String,

    #[serde(default)]
    pub phone: String,

    pub address: Option<Address>,
}

impl Patient {
    pub fn unlinked(details: PatientDetails, care_provider: ClinicianId, pathway: &str) -> Self {
        Self {
            id: None,
            remote_patient_id: Some(details.remote_patient_id),
            first_name: details.first_name,
            last_name: details.last_name,
            dob: details.dob,
            gender: details.gender,
            phone: details.phone,
            address: details.address,
            unlinked: true,
            pathway: Some(pathway.into()),
            care_provider: Some(care_provider),
        }
    }
}
