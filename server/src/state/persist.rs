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

use std::fs::{rename, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use resources::{
    misc::ItemId, Clinician, ClinicianQueueItem, Kind, Patient, Pharmacy, Prescription,
    StatusEvent,
};
use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer};

use super::{Error, Inner, RefillRequestRow, State};

impl State {
    /// Loads the snapshot stored at `path`. A missing file leaves the store
    /// empty.
    pub async fn load_file(&self, path: &Path) -> Result<(), Error> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        self.lock().await?.load(BufReader::new(file))
    }

    /// Writes the snapshot to a temporary file next to `path` and moves it
    /// into place.
    pub async fn save_file(&self, path: &Path) -> Result<(), Error> {
        let tmp = path.with_extension("tmp");

        {
            let inner = self.lock().await?;
            let mut writer = BufWriter::new(File::create(&tmp)?);
            inner.save(&mut writer)?;
            writer.flush()?;
        }

        rename(&tmp, path)?;

        Ok(())
    }
}

impl Inner {
    pub fn load<R>(&mut self, reader: R) -> Result<(), Error>
    where
        R: Read,
    {
        let data: Data = from_reader(reader)?;

        for clinician in data.clinicians {
            self.insert_clinician(clinician);
        }

        for patient in data.patients {
            self.insert_patient(patient)?;
        }

        for pharmacy in data.pharmacies {
            self.add_pharmacy(pharmacy)?;
        }

        for PrescriptionData {
            prescription,
            tracked,
        } in data.prescriptions
        {
            if let Some(id) = prescription.id {
                self.reserve_id(id.value());
            }

            self.prescriptions.insert(prescription, tracked)?;
        }

        for row in data.refill_requests {
            self.reserve_id(row.id.value());
            self.refill_requests.insert(row)?;
        }

        for StatusEventData {
            kind,
            item_id,
            event,
        } in data.status_events
        {
            self.status_events.restore(kind, item_id, event);
        }

        for item in data.clinician_work {
            self.work_queue.enqueue(item);
        }

        self.reserve_id(data.next_id);

        Ok(())
    }

    pub fn save<W>(&self, writer: W) -> Result<(), Error>
    where
        W: Write,
    {
        let mut data = Data {
            next_id: self.next_id,
            prescriptions: self
                .prescriptions
                .iter()
                .map(|prescription| PrescriptionData {
                    prescription: prescription.clone(),
                    tracked: self.prescriptions.is_tracked(prescription),
                })
                .collect(),
            refill_requests: self.refill_requests.iter().cloned().collect(),
            status_events: self
                .status_events
                .iter()
                .map(|(kind, item_id, event)| StatusEventData {
                    kind,
                    item_id,
                    event: event.clone(),
                })
                .collect(),
            patients: self.patients.iter().cloned().collect(),
            clinicians: self.clinicians.iter().cloned().collect(),
            pharmacies: self.pharmacies.iter().cloned().collect(),
            clinician_work: self.work_queue.iter().cloned().collect(),
        };

        data.prescriptions.sort_by_key(|p| p.prescription.id);
        data.refill_requests.sort_by_key(|r| r.id);
        data.status_events.sort_by_key(|e| (e.kind, e.item_id));
        data.patients.sort_by_key(|p| p.id);
        data.pharmacies.sort_by_key(|p| p.local_id);

        to_writer(writer, &data)?;

        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct Data {
    next_id: u64,
    prescriptions: Vec<PrescriptionData>,
    refill_requests: Vec<RefillRequestRow>,
    status_events: Vec<StatusEventData>,
    patients: Vec<Patient>,
    clinicians: Vec<Clinician>,
    pharmacies: Vec<Pharmacy>,
    clinician_work: Vec<ClinicianQueueItem>,
}

#[derive(Serialize, Deserialize)]
struct PrescriptionData {
    prescription: Prescription,
    tracked: bool,
}

#[derive(Serialize, Deserialize)]
struct StatusEventData {
    kind: Kind,
    item_id: ItemId,
    event: StatusEvent,
}
