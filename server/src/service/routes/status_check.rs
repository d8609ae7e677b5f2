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

use std::sync::Arc;

use actix_web::{
    web::{post, resource, Data, Json, ServiceConfig},
    HttpResponse,
};
use log::debug;

use crate::{
    queue::{StatusCheckRequest, StatusQueue},
    state::DataStore,
};

use super::super::RequestError;

pub fn configure_routes(cfg: &mut ServiceConfig) {
    cfg.service(resource("/StatusCheck").route(post().to(post_status_check)));
}

async fn post_status_check(
    store: Data<Arc<dyn DataStore>>,
    queue: Data<Arc<dyn StatusQueue>>,
    request: Json<StatusCheckRequest>,
) -> Result<HttpResponse, RequestError> {
    enqueue_status_check(
        store.get_ref().as_ref(),
        queue.get_ref().as_ref(),
        request.into_inner(),
    )
    .await?;

    Ok(HttpResponse::Accepted().finish())
}

/// Puts a status check for a known patient and clinician on the status
/// queue.
pub async fn enqueue_status_check(
    store: &dyn DataStore,
    queue: &dyn StatusQueue,
    request: StatusCheckRequest,
) -> Result<(), RequestError> {
    if !store.patient(request.patient_id).await?.is_found() {
        return Err(RequestError::UnknownPatient(request.patient_id));
    }

    if !store.clinician(request.clinician_id).await?.is_found() {
        return Err(RequestError::UnknownClinician(request.clinician_id));
    }

    queue.send(request.to_body()?).await?;

    debug!(
        "Enqueued {} status check for patient {} (clinician {})",
        request.kind, request.patient_id, request.clinician_id
    );

    Ok(())
}
