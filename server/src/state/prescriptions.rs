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

use std::collections::HashMap;

use resources::{
    misc::{PrescriptionId, RemoteId},
    Kind, Prescription,
};

use super::{Conflict, Error};

#[derive(Default)]
pub struct Prescriptions {
    by_id: HashMap<PrescriptionId, Prescription>,
    by_remote_id: HashMap<(Kind, RemoteId), PrescriptionId>,
}

impl Prescriptions {
    /// Inserts the prescription. Tracked prescriptions are indexed by their
    /// kind and remote id, which must be unique.
    pub fn insert(&mut self, prescription: Prescription, tracked: bool) -> Result<(), Error> {
        let id = prescription
            .id
            .ok_or(Error::MissingField("prescription.id"))?;

        if tracked {
            if let Some(remote_id) = prescription.remote_id {
                let key = (prescription.kind, remote_id);
                match self.by_remote_id.get(&key) {
                    Some(other) if *other != id => {
                        return Err(Conflict::DuplicateRemoteId(prescription.kind, remote_id).into())
                    }
                    _ => (),
                }

                self.by_remote_id.insert(key, id);
            }
        }

        self.by_id.insert(id, prescription);

        Ok(())
    }

    pub fn get_by_id(&self, id: PrescriptionId) -> Option<&Prescription> {
        self.by_id.get(&id)
    }

    pub fn get_by_remote_id(&self, kind: Kind, remote_id: RemoteId) -> Option<&Prescription> {
        self.by_remote_id
            .get(&(kind, remote_id))
            .and_then(|id| self.by_id.get(id))
    }

    pub fn is_tracked(&self, prescription: &Prescription) -> bool {
        match (prescription.id, prescription.remote_id) {
            (Some(id), Some(remote_id)) => {
                self.by_remote_id.get(&(prescription.kind, remote_id)) == Some(&id)
            }
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prescription> {
        self.by_id.values()
    }
}

#[cfg(test)]
mod tests {
    use resources::misc::{ClinicianId, PatientId};

    use super::*;

    fn prescription(id: u64, remote_id: u64) -> Prescription {
        Prescription {
            id: Some(PrescriptionId::new(id)),
            remote_id: Some(RemoteId::new(remote_id)),
            kind: Kind::Treatment,
            clinician_id: ClinicianId::new(50),
            patient_id: PatientId::new(20),
            pharmacy_id: None,
            treatment_plan_id: None,
            original_prescription_id: None,
            medication: Default::default(),
        }
    }

    #[test]
    fn remote_id_is_unique_per_kind() {
        let mut prescriptions = Prescriptions::default();
        prescriptions.insert(prescription(1, 40), true).unwrap();

        let err = prescriptions.insert(prescription(2, 40), true).unwrap_err();
        assert!(err.is_conflict());

        let mut other = prescription(3, 40);
        other.kind = Kind::UnlinkedFollowup;
        prescriptions.insert(other, true).unwrap();

        prescriptions.insert(prescription(4, 40), false).unwrap();
        assert!(!prescriptions.is_tracked(prescriptions.get_by_id(PrescriptionId::new(4)).unwrap()));

        let found = prescriptions
            .get_by_remote_id(Kind::Treatment, RemoteId::new(40))
            .unwrap();
        assert_eq!(found.id, Some(PrescriptionId::new(1)));
    }
}
