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

use super::misc::{ClinicianId, RemoteClinicianId};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ProviderRole {
    #[serde(rename = "DOCTOR")]
    Clinician,

    #[serde(rename = "MA")]
    CareCoordinator,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Clinician {
    pub id: ClinicianId,
    pub remote_clinician_id: Option<RemoteClinicianId>,
    pub role: ProviderRole,
    pub first_name: String,
    pub last_name: String,

    #[serde(default = "active_default")]
    pub active: bool,
}

fn active_default() -> bool {
    true
}
