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

use std::collections::{BTreeMap, HashMap};

use resources::{
    misc::{ClinicianId, PatientId, PharmacyId, RemoteClinicianId, RemotePatientId, RemotePharmacyId},
    Clinician, Patient, Pharmacy, PharmacySource,
};

use super::Error;

#[derive(Default)]
pub struct Patients {
    by_id: HashMap<PatientId, Patient>,
    by_remote_id: HashMap<RemotePatientId, PatientId>,
}

/// Clinicians ordered by id, so "the first" clinician is stable.
#[derive(Default)]
pub struct Clinicians {
    by_id: BTreeMap<ClinicianId, Clinician>,
    by_remote_id: HashMap<RemoteClinicianId, ClinicianId>,
}

#[derive(Default)]
pub struct Pharmacies {
    by_id: HashMap<PharmacyId, Pharmacy>,
    by_remote_ref: HashMap<(RemotePharmacyId, PharmacySource), PharmacyId>,
}

impl Patients {
    pub fn insert(&mut self, patient: Patient) -> Result<PatientId, Error> {
        let id = patient.id.ok_or(Error::MissingField("patient.id"))?;
        if let Some(remote_id) = patient.remote_patient_id {
            self.by_remote_id.insert(remote_id, id);
        }

        self.by_id.insert(id, patient);

        Ok(id)
    }

    pub fn get_by_id(&self, id: PatientId) -> Option<&Patient> {
        self.by_id.get(&id)
    }

    pub fn get_by_remote_id(&self, remote_id: RemotePatientId) -> Option<&Patient> {
        self.by_remote_id
            .get(&remote_id)
            .and_then(|id| self.by_id.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Patient> {
        self.by_id.values()
    }
}

impl Clinicians {
    pub fn insert(&mut self, clinician: Clinician) {
        if let Some(remote_id) = clinician.remote_clinician_id {
            self.by_remote_id.insert(remote_id, clinician.id);
        }

        self.by_id.insert(clinician.id, clinician);
    }

    pub fn get_by_id(&self, id: ClinicianId) -> Option<&Clinician> {
        self.by_id.get(&id)
    }

    pub fn get_by_remote_id(&self, remote_id: RemoteClinicianId) -> Option<&Clinician> {
        self.by_remote_id
            .get(&remote_id)
            .and_then(|id| self.by_id.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clinician> {
        self.by_id.values()
    }
}

impl Pharmacies {
    pub fn insert(&mut self, pharmacy: Pharmacy) -> Result<PharmacyId, Error> {
        let id = pharmacy
            .local_id
            .ok_or(Error::MissingField("pharmacy.local_id"))?;

        self.by_remote_ref
            .insert((pharmacy.remote_id, pharmacy.source), id);
        self.by_id.insert(id, pharmacy);

        Ok(id)
    }

    pub fn get_by_remote_ref(
        &self,
        remote_id: RemotePharmacyId,
        source: PharmacySource,
    ) -> Option<&Pharmacy> {
        self.by_remote_ref
            .get(&(remote_id, source))
            .and_then(|id| self.by_id.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pharmacy> {
        self.by_id.values()
    }
}
