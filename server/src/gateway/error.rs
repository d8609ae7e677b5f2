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

use reqwest::{Error as ReqwestError, StatusCode};
use thiserror::Error;
use url::ParseError;

#[derive(Debug, Error)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("Reqwest Error: {0}")]
    ReqwestError(ReqwestError),

    #[error("Url Parse Error: {0}")]
    ParseError(ParseError),

    #[error("Invalid Base Url: {0}")]
    InvalidBaseUrl(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Invalid Response ({0}): {1}")]
    InvalidResponse(StatusCode, String),
}

impl Error {
    /// Failures that are worth another attempt: transport errors, throttling
    /// and server side errors.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::ReqwestError(err) => err.is_timeout() || !err.is_builder(),
            Error::InvalidResponse(status, _) => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<ReqwestError> for Error {
    fn from(err: ReqwestError) -> Self {
        Self::ReqwestError(err)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Self::ParseError(err)
    }
}
