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

mod address;
mod ids;

pub mod id_as_string;

pub use address::Address;
pub use ids::{
    ClinicianId, ItemId, PatientId, PharmacyId, PrescriptionId, QueueItemId, RefillRequestId,
    RemoteClinicianId, RemoteId, RemotePatientId, RemotePharmacyId, TreatmentPlanId,
};
