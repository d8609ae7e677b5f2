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

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    status::{RemoteStatus, Status},
    work_queue::QueueEventType,
};

/// Kind of item a tracked prescription belongs to.
///
/// The kind decides which status history an item lives in, which statuses
/// the reconciler asks the gateway about and which work-queue event a
/// transmission error produces. All of that is kept in one [`KindSpec`] row
/// per kind.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Kind {
    #[serde(rename = "erx")]
    Treatment,

    #[serde(rename = "refill_rx")]
    RefillRequest,

    #[serde(rename = "unlinked_dntf_treatment")]
    UnlinkedFollowup,
}

pub struct KindSpec {
    pub tag: &'static str,

    /// Statuses that are waiting for the gateway to report an outcome.
    pub polled: &'static [Status],

    /// Statuses an item's history may start with.
    pub initial: &'static [Status],

    pub sent: Status,
    pub error: Status,
    pub deleted: Status,

    pub work_event: QueueEventType,
    pub description: &'static str,
    pub short_description: &'static str,
}

/// What the reconciler should do with an item after reading the gateway log.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Resolution {
    Pending,
    Advance(Status),
}

#[derive(Debug, Error)]
#[error("Unknown event check type: {0}")]
pub struct UnknownKind(pub String);

static TREATMENT: KindSpec = KindSpec {
    tag: "erx",
    polled: &[Status::Sending],
    initial: &[Status::Sending],
    sent: Status::Sent,
    error: Status::Error,
    deleted: Status::Deleted,
    work_event: QueueEventType::TransmissionError,
    description: "Error sending prescription for",
    short_description: "Prescription error",
};

static REFILL_REQUEST: KindSpec = KindSpec {
    tag: "refill_rx",
    polled: &[Status::Approved, Status::Denied],
    initial: &[Status::Requested],
    sent: Status::SentToPharmacy,
    error: Status::ErrorAtPharmacy,
    deleted: Status::Deleted,
    work_event: QueueEventType::RefillTransmissionError,
    description: "Error completing refill request for",
    short_description: "Refill request error",
};

static UNLINKED_FOLLOWUP: KindSpec = KindSpec {
    tag: "unlinked_dntf_treatment",
    polled: &[Status::Sending],
    initial: &[Status::Sending],
    sent: Status::Sent,
    error: Status::Error,
    deleted: Status::Deleted,
    work_event: QueueEventType::UnlinkedFollowupTransmissionError,
    description: "Error sending prescription for",
    short_description: "Prescription error",
};

impl Kind {
    pub const ALL: [Kind; 3] = [Kind::Treatment, Kind::RefillRequest, Kind::UnlinkedFollowup];

    pub fn spec(self) -> &'static KindSpec {
        match self {
            Kind::Treatment => &TREATMENT,
            Kind::RefillRequest => &REFILL_REQUEST,
            Kind::UnlinkedFollowup => &UNLINKED_FOLLOWUP,
        }
    }

    pub fn tag(self) -> &'static str {
        self.spec().tag
    }

    pub fn is_polled(self, status: Status) -> bool {
        self.spec().polled.contains(&status)
    }

    pub fn is_initial(self, status: Status) -> bool {
        self.spec().initial.contains(&status)
    }

    /// Maps the newest gateway log entry onto the item's state machine.
    pub fn resolve(self, current: Status, reported: &RemoteStatus) -> Resolution {
        let spec = self.spec();
        let target = match reported {
            RemoteStatus::Sent => spec.sent,
            RemoteStatus::Error => spec.error,
            RemoteStatus::Deleted => spec.deleted,
            _ => return Resolution::Pending,
        };

        if current.accepts(target) {
            Resolution::Advance(target)
        } else {
            Resolution::Pending
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.write_str(self.tag())
    }
}

impl FromStr for Kind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::ALL
            .iter()
            .copied()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| UnknownKind(s.into()))
    }
}
