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

use std::io::Error as IoError;

use resources::{
    misc::{ItemId, QueueItemId, RemoteId},
    Kind, Status,
};
use serde_json::Error as JsonError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Timeout while waiting for the data store")]
    Timeout,

    #[error("Conflict: {0}")]
    Conflict(Conflict),

    #[error("Unknown {0} item: {1}")]
    UnknownItem(Kind, ItemId),

    #[error("Missing mandatory field: {0}")]
    MissingField(&'static str),

    #[error("IO Error: {0}")]
    IoError(IoError),

    #[error("JSON Error: {0}")]
    JsonError(JsonError),
}

#[derive(Debug, Error)]
pub enum Conflict {
    #[error("{kind} item {item_id} is already in terminal state {current}, refusing {next}")]
    Terminal {
        kind: Kind,
        item_id: ItemId,
        current: Status,
        next: Status,
    },

    #[error("{kind} item {item_id} can not move from {current:?} to {next}")]
    InvalidTransition {
        kind: Kind,
        item_id: ItemId,
        current: Option<Status>,
        next: Status,
    },

    #[error("Refill request for queue item {0} does already exist")]
    DuplicateQueueItem(QueueItemId),

    #[error("{0} prescription with remote id {1} does already exist")]
    DuplicateRemoteId(Kind, RemoteId),

    #[error("Refill request {item_id} was already transmitted as {current}, refusing {next}")]
    RemoteIdAssigned {
        item_id: ItemId,
        current: RemoteId,
        next: RemoteId,
    },
}

impl Error {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    /// Errors the caller may retry on its next cycle.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Timeout | Error::IoError(_))
    }
}

impl From<Conflict> for Error {
    fn from(v: Conflict) -> Self {
        Self::Conflict(v)
    }
}

impl From<IoError> for Error {
    fn from(v: IoError) -> Self {
        Self::IoError(v)
    }
}

impl From<JsonError> for Error {
    fn from(v: JsonError) -> Self {
        Self::JsonError(v)
    }
}
