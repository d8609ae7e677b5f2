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

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use resources::{
    misc::{ClinicianId, PatientId, QueueItemId},
    Status,
};
use serde_json::json;
use thiserror::Error;

use crate::{queue::Error as QueueError, state::Error as StateError};

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("State Error: {0}")]
    StateError(StateError),

    #[error("Queue Error: {0}")]
    QueueError(QueueError),

    #[error("Unknown patient: {0}")]
    UnknownPatient(PatientId),

    #[error("Unknown clinician: {0}")]
    UnknownClinician(ClinicianId),

    #[error("No refill request for queue item {0}")]
    UnknownQueueItem(QueueItemId),

    #[error("Refill request can not be transmitted with status {0}")]
    InvalidStatus(Status),
}

impl ResponseError for RequestError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::StateError(StateError::Conflict(_)) => StatusCode::CONFLICT,
            Self::StateError(StateError::UnknownItem(_, _)) => StatusCode::NOT_FOUND,
            Self::StateError(err) if err.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            Self::StateError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::QueueError(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::UnknownPatient(_) | Self::UnknownClinician(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UnknownQueueItem(_) => StatusCode::NOT_FOUND,
            Self::InvalidStatus(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

impl From<StateError> for RequestError {
    fn from(v: StateError) -> Self {
        Self::StateError(v)
    }
}

impl From<QueueError> for RequestError {
    fn from(v: QueueError) -> Self {
        Self::QueueError(v)
    }
}
