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

use std::cmp::min;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::StatusCode;
use resources::{
    misc::{RemoteClinicianId, RemoteId, RemotePatientId, RemotePharmacyId},
    PatientDetails, Pharmacy,
};
use serde::de::DeserializeOwned;
use tokio::time::delay_for;
use url::Url;

use super::{
    http::Client, Error, ErroredPrescription, ErxGateway, LogEntry, RefillRequestItem,
};

const CLINIC_KEY_HEADER: &str = "X-Clinic-Key";

/// JSON over HTTP implementation of `ErxGateway`.
pub struct HttpGateway {
    client: Client,
    base: Url,
    clinic_key: Option<String>,
    retry_attempts: usize,
    retry_delay: Duration,
}

impl HttpGateway {
    pub fn new(
        base: Url,
        clinic_key: Option<String>,
        timeout: Duration,
        retry_attempts: usize,
    ) -> Result<Self, Error> {
        if base.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl(base.to_string()));
        }

        Ok(Self {
            client: Client::new(timeout)?,
            base,
            clinic_key,
            retry_attempts: retry_attempts.max(1),
            retry_delay: Duration::from_secs(1),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base.clone();

        url.path_segments_mut()
            .map_err(|()| Error::InvalidBaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    async fn fetch<T>(&self, url: Url) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let mut retry_timeout = self.retry_delay.as_millis() as u64;
        let mut attempt = 1;

        loop {
            match self.fetch_once(url.clone()).await {
                Err(err) if err.is_transient() && attempt < self.retry_attempts => {
                    warn!(
                        "Gateway request failed (url={}, attempt={}): {}",
                        url, attempt, err
                    );

                    delay_for(Duration::from_millis(retry_timeout)).await;
                    retry_timeout = min(30_000, (retry_timeout as f64 * 1.2) as u64);
                    attempt += 1;
                }
                res => return res,
            }
        }
    }

    async fn fetch_once<T>(&self, url: Url) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        debug!("GET {}", url);

        let mut req = self.client.get(url.clone());
        if let Some(clinic_key) = &self.clinic_key {
            req = req.header(CLINIC_KEY_HEADER, clinic_key.as_str());
        }

        let res = req.send().await?;
        let status = res.status();

        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(url.to_string()));
        }

        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();

            return Err(Error::InvalidResponse(status, text));
        }

        Ok(res.json::<T>().await?)
    }
}

#[async_trait]
impl ErxGateway for HttpGateway {
    async fn prescription_log_entries(
        &self,
        clinician: RemoteClinicianId,
        remote_id: RemoteId,
    ) -> Result<Vec<LogEntry>, Error> {
        let url = self.url(&[
            "clinicians",
            &clinician.to_string(),
            "prescriptions",
            &remote_id.to_string(),
            "log",
        ])?;

        let mut entries: Vec<LogEntry> = self.fetch(url).await?;
        sort_newest_first(&mut entries);

        Ok(entries)
    }

    async fn refill_request_queue_for_clinic(
        &self,
        clinician: RemoteClinicianId,
    ) -> Result<Vec<RefillRequestItem>, Error> {
        let url = self.url(&["clinicians", &clinician.to_string(), "refill-requests"])?;

        self.fetch(url).await
    }

    async fn patient_details(
        &self,
        remote_patient_id: RemotePatientId,
    ) -> Result<PatientDetails, Error> {
        let url = self.url(&["patients", &remote_patient_id.to_string()])?;

        self.fetch(url).await
    }

    async fn pharmacy_details(
        &self,
        remote_pharmacy_id: RemotePharmacyId,
    ) -> Result<Pharmacy, Error> {
        let url = self.url(&["pharmacies", &remote_pharmacy_id.to_string()])?;

        self.fetch(url).await
    }

    async fn transmission_error_details(
        &self,
        clinician: RemoteClinicianId,
    ) -> Result<Vec<ErroredPrescription>, Error> {
        let url = self.url(&[
            "clinicians",
            &clinician.to_string(),
            "transmission-errors",
        ])?;

        self.fetch(url).await
    }
}

fn sort_newest_first(entries: &mut Vec<LogEntry>) {
    entries.sort_by(|a, b| b.reported_at.cmp(&a.reported_at));
}
