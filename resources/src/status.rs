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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of a tracked prescription item.
///
/// Treatments and unlinked follow-up treatments move from `Sending` to one of
/// the terminal states `Sent`, `Error` or `Deleted`. Refill requests start at
/// `Requested`, are approved or denied by a clinician and then end in
/// `SentToPharmacy`, `ErrorAtPharmacy` or `Deleted`. The resolution states are
/// only ever written by clinicians.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "Sending")]
    Sending,

    #[serde(rename = "eRxSent")]
    Sent,

    #[serde(rename = "Error")]
    Error,

    #[serde(rename = "Deleted")]
    Deleted,

    #[serde(rename = "Resolved")]
    Resolved,

    #[serde(rename = "RefillRxRequested")]
    Requested,

    #[serde(rename = "RefillRxApproved")]
    Approved,

    #[serde(rename = "RefillRxDenied")]
    Denied,

    #[serde(rename = "RefillRxSent")]
    SentToPharmacy,

    #[serde(rename = "RefillRxError")]
    ErrorAtPharmacy,

    #[serde(rename = "RefillRxErrorResolved")]
    ErrorResolved,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        !matches!(
            self,
            Status::Sending | Status::Requested | Status::Approved | Status::Denied
        )
    }

    pub fn is_error(self) -> bool {
        matches!(self, Status::Error | Status::ErrorAtPharmacy)
    }

    pub fn is_resolution(self) -> bool {
        matches!(self, Status::Resolved | Status::ErrorResolved)
    }

    /// Returns `true` if `next` may directly follow `self` in an item's history.
    pub fn accepts(self, next: Status) -> bool {
        use Status::*;

        match (self, next) {
            (Sending, Sent) | (Sending, Error) | (Sending, Deleted) => true,
            (Requested, Approved) | (Requested, Denied) | (Requested, Deleted) => true,
            (Requested, ErrorAtPharmacy) => true,
            (Approved, SentToPharmacy) | (Approved, ErrorAtPharmacy) | (Approved, Deleted) => true,
            (Denied, SentToPharmacy) | (Denied, ErrorAtPharmacy) | (Denied, Deleted) => true,
            (Error, Resolved) | (ErrorAtPharmacy, ErrorResolved) => true,
            _ => false,
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        let s = match self {
            Status::Sending => "Sending",
            Status::Sent => "eRxSent",
            Status::Error => "Error",
            Status::Deleted => "Deleted",
            Status::Resolved => "Resolved",
            Status::Requested => "RefillRxRequested",
            Status::Approved => "RefillRxApproved",
            Status::Denied => "RefillRxDenied",
            Status::SentToPharmacy => "RefillRxSent",
            Status::ErrorAtPharmacy => "RefillRxError",
            Status::ErrorResolved => "RefillRxErrorResolved",
        };

        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Local,
    Gateway,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub status: Status,
    pub reported_at: DateTime<Utc>,

    #[serde(default)]
    pub detail: String,

    pub source: Source,
}

impl StatusEvent {
    pub fn local(status: Status, reported_at: DateTime<Utc>) -> Self {
        Self {
            status,
            reported_at,
            detail: String::new(),
            source: Source::Local,
        }
    }

    pub fn gateway<D>(status: Status, reported_at: DateTime<Utc>, detail: D) -> Self
    where
        D: Into<String>,
    {
        Self {
            status,
            reported_at,
            detail: detail.into(),
            source: Source::Gateway,
        }
    }

    /// Two events describe the same occurrence if status and report time match.
    pub fn same_occurrence(&self, other: &StatusEvent) -> bool {
        self.status == other.status && self.reported_at == other.reported_at
    }
}

/// Prescription status as reported by the eRx gateway's prescription log.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RemoteStatus {
    Entered,
    Sending,
    Sent,
    Error,
    Deleted,
    Other(String),
}

impl RemoteStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RemoteStatus::Sent | RemoteStatus::Error | RemoteStatus::Deleted
        )
    }
}

impl From<String> for RemoteStatus {
    fn from(v: String) -> Self {
        match v.as_str() {
            "Entered" => RemoteStatus::Entered,
            "Sending" => RemoteStatus::Sending,
            "eRxSent" | "Sent" => RemoteStatus::Sent,
            "Error" => RemoteStatus::Error,
            "Deleted" => RemoteStatus::Deleted,
            _ => RemoteStatus::Other(v),
        }
    }
}

impl From<RemoteStatus> for String {
    fn from(v: RemoteStatus) -> Self {
        match v {
            RemoteStatus::Entered => "Entered".into(),
            RemoteStatus::Sending => "Sending".into(),
            RemoteStatus::Sent => "eRxSent".into(),
            RemoteStatus::Error => "Error".into(),
            RemoteStatus::Deleted => "Deleted".into(),
            RemoteStatus::Other(s) => s,
        }
    }
}
