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

mod memory;
mod persist;

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::Error as IoError;
use std::time::Duration;

use async_trait::async_trait;
use resources::{
    misc::{id_as_string, ClinicianId, PatientId},
    Kind,
};
use serde::{Deserialize, Serialize};
use serde_json::{from_str, to_string, Error as JsonError};
use thiserror::Error;

pub use memory::MemoryQueue;

/// Message queue with at-least-once delivery. A received message stays
/// invisible for the visibility timeout and is delivered again unless it is
/// deleted with its receipt before the timeout expires.
#[async_trait]
pub trait StatusQueue: Send + Sync {
    /// Receives up to `max` messages. Waits up to `wait` if no message is
    /// available.
    async fn receive(
        &self,
        max: usize,
        visibility: Duration,
        wait: Duration,
    ) -> Result<Vec<Message>, Error>;

    async fn delete(&self, receipt: &Receipt) -> Result<(), Error>;

    async fn send(&self, body: String) -> Result<(), Error>;
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Receipt(pub String);

#[derive(Clone, Debug)]
pub struct Message {
    pub body: String,
    pub receipt: Receipt,
    pub receive_count: u32,
}

/// Body of a status check message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusCheckRequest {
    #[serde(with = "id_as_string")]
    pub patient_id: PatientId,

    #[serde(rename = "doctor_id", with = "id_as_string")]
    pub clinician_id: ClinicianId,

    #[serde(rename = "event_check_type")]
    pub kind: Kind,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown or expired receipt: {0}")]
    UnknownReceipt(Receipt),

    #[error("Invalid Message: {0}")]
    InvalidMessage(JsonError),

    #[error("IO Error: {0}")]
    IoError(IoError),

    #[error("Invalid queue snapshot: {0}")]
    InvalidSnapshot(JsonError),
}

impl From<IoError> for Error {
    fn from(v: IoError) -> Self {
        Self::IoError(v)
    }
}

impl StatusCheckRequest {
    pub fn from_body(body: &str) -> Result<Self, Error> {
        from_str(body).map_err(Error::InvalidMessage)
    }

    pub fn to_body(&self) -> Result<String, Error> {
        to_string(self).map_err(Error::InvalidMessage)
    }
}

impl Display for Receipt {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_wire_format() {
        let req = StatusCheckRequest::from_body(
            r#"{ "patient_id": "20", "doctor_id": "50", "event_check_type": "erx" }"#,
        )
        .unwrap();

        assert_eq!(req.patient_id, PatientId::new(20));
        assert_eq!(req.clinician_id, ClinicianId::new(50));
        assert_eq!(req.kind, Kind::Treatment);

        let req = StatusCheckRequest::from_body(
            r#"{ "patient_id": 21, "doctor_id": 51, "event_check_type": "unlinked_dntf_treatment" }"#,
        )
        .unwrap();
        assert_eq!(req.kind, Kind::UnlinkedFollowup);
    }

    #[test]
    fn encode_wire_format() {
        let req = StatusCheckRequest {
            patient_id: PatientId::new(20),
            clinician_id: ClinicianId::new(50),
            kind: Kind::RefillRequest,
        };

        assert_eq!(
            req.to_body().unwrap(),
            r#"{"patient_id":"20","doctor_id":"50","event_check_type":"refill_rx"}"#
        );
    }

    #[test]
    fn reject_malformed_body() {
        assert!(StatusCheckRequest::from_body("{}").is_err());
        assert!(StatusCheckRequest::from_body(
            r#"{ "patient_id": "x", "doctor_id": "50", "event_check_type": "erx" }"#
        )
        .is_err());
        assert!(StatusCheckRequest::from_body(
            r#"{ "patient_id": "20", "doctor_id": "50", "event_check_type": "fax" }"#
        )
        .is_err());
    }
}
