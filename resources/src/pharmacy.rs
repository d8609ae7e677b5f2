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

use super::misc::{Address, PharmacyId, RemotePharmacyId};

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PharmacySource {
    Surescripts,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pharmacy {
    #[serde(default)]
    pub local_id: Option<PharmacyId>,

    pub remote_id: RemotePharmacyId,

    #[serde(default = "source_default")]
    pub source: PharmacySource,

    pub name: String,
    pub address: Option<Address>,

    #[serde(default)]
    pub phone: String,

    #[serde(default)]
    pub fax: String,
}

fn source_default() -> PharmacySource {
    PharmacySource::Surescripts
}
