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

use log::SetLoggerError;
use log4rs::config::Errors as Log4RsError;
use thiserror::Error;

use crate::{
    gateway::Error as GatewayError, queue::Error as QueueError, state::Error as StateError,
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO Error: {0}")]
    IoError(IoError),

    #[error("Unable to set logger: {0}")]
    SetLoggerError(SetLoggerError),

    #[error("Unable to setup log4rs: {0}")]
    Log4RsError(Log4RsError),

    #[error("State Error: {0}")]
    StateError(StateError),

    #[error("Gateway Error: {0}")]
    GatewayError(GatewayError),

    #[error("Queue Error: {0}")]
    QueueError(QueueError),
}

impl From<IoError> for Error {
    fn from(v: IoError) -> Self {
        Self::IoError(v)
    }
}

impl From<SetLoggerError> for Error {
    fn from(v: SetLoggerError) -> Self {
        Self::SetLoggerError(v)
    }
}

impl From<Log4RsError> for Error {
    fn from(v: Log4RsError) -> Self {
        Self::Log4RsError(v)
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
