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

pub mod clinician;
pub mod kind;
pub mod medication;
pub mod misc;
pub mod patient;
pub mod pharmacy;
pub mod prescription;
pub mod refill_request;
pub mod status;
pub mod work_queue;

pub use clinician::{Clinician, ProviderRole};
pub use kind::{Kind, KindSpec, Resolution};
pub use medication::Medication;
pub use patient::{Patient, PatientDetails};
pub use pharmacy::{Pharmacy, PharmacySource};
pub use prescription::{Prescription, TrackedItem};
pub use refill_request::RefillRequest;
pub use status::{RemoteStatus, Source, Status, StatusEvent};
pub use work_queue::{ClinicianQueueItem, QueueEventType, QueueItemStatus};
