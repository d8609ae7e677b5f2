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

use resources::misc::{ClinicianId, PatientId, QueueItemId};
use thiserror::Error;

use crate::{
    gateway::Error as GatewayError,
    queue::Error as QueueError,
    state::{Conflict, Error as StateError},
};

#[derive(Debug, Error)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("State Error: {0}")]
    StateError(StateError),

    #[error("Gateway Error: {0}")]
    GatewayError(GatewayError),

    #[error("Queue Error: {0}")]
    QueueError(QueueError),

    #[error("Unknown patient: {0}")]
    UnknownPatient(PatientId),

    #[error("Unknown clinician: {0}")]
    UnknownClinician(ClinicianId),

    #[error("Clinician {0} has no remote clinician id")]
    MissingRemoteClinicianId(ClinicianId),

    #[error("Invalid refill request (queue_item_id={0}): {1}")]
    InvalidRefillRequest(QueueItemId, String),
}

impl Error {
    /// Invariant violations reported by the data store.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::StateError(err) if err.is_conflict())
    }

    /// The refill request of the queue item was stored by someone else in
    /// the meantime.
    pub fn is_duplicate_queue_item(&self) -> bool {
        matches!(
            self,
            Error::StateError(StateError::Conflict(Conflict::DuplicateQueueItem(_)))
        )
    }

    /// Failures that go away on their own and are retried on the next cycle.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::StateError(err) => err.is_transient(),
            Error::GatewayError(err) => err.is_transient(),
            _ => false,
        }
    }
}

impl From<StateError> for Error {
    fn from(v: StateError) -> Self {
        Self::StateError(v)
    }
}

impl From<GatewayError> for Error {
    fn from(v: GatewayError) -> Self {
        Self::GatewayError(v)
    }
}

impl From<QueueError> for Error {
    fn from(v: QueueError) -> Self {
        Self::QueueError(v)
    }
}
