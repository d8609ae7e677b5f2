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
    web::{post, resource, Data, Json, Path, ServiceConfig},
    HttpResponse,
};
use chrono::{DateTime, Utc};
use log::{debug, info};
use resources::{
    misc::{QueueItemId, RemoteId},
    Kind, RefillRequest, Status, StatusEvent,
};
use serde::Deserialize;

use crate::{
    queue::{StatusCheckRequest, StatusQueue},
    state::{Appended, DataStore, Error as StateError, Lookup},
};

use super::super::RequestError;

/// Body of a transmission report: the gateway id of the prescription that
/// was sent on approval or denial.
#[derive(Clone, Debug, Deserialize)]
pub struct Transmitted {
    pub remote_id: RemoteId,
    pub status: Status,

    #[serde(default)]
    pub reported_at: Option<DateTime<Utc>>,
}

pub fn configure_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        resource("/RefillRequest/{queue_item_id}/transmitted")
            .route(post().to(post_transmitted)),
    );
}

async fn post_transmitted(
    store: Data<Arc<dyn DataStore>>,
    queue: Data<Arc<dyn StatusQueue>>,
    queue_item_id: Path<u64>,
    transmitted: Json<Transmitted>,
) -> Result<HttpResponse, RequestError> {
    let queue_item_id = QueueItemId::new(queue_item_id.into_inner());
    let request = mark_transmitted(
        store.get_ref().as_ref(),
        queue.get_ref().as_ref(),
        queue_item_id,
        transmitted.into_inner(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(request))
}

/// Stores the transmitted gateway id of the refill request together with
/// the clinician's decision and enqueues a status check for it. Reporting
/// the same transmission twice is accepted.
pub async fn mark_transmitted(
    store: &dyn DataStore,
    queue: &dyn StatusQueue,
    queue_item_id: QueueItemId,
    transmitted: Transmitted,
) -> Result<RefillRequest, RequestError> {
    if !matches!(transmitted.status, Status::Approved | Status::Denied) {
        return Err(RequestError::InvalidStatus(transmitted.status));
    }

    let mut request = match store.refill_request_by_queue_item_id(queue_item_id).await? {
        Lookup::Found(request) => request,
        Lookup::NotFound => return Err(RequestError::UnknownQueueItem(queue_item_id)),
    };
    let id = request.id.ok_or(StateError::MissingField("id"))?;

    let reported_at = transmitted.reported_at.unwrap_or_else(Utc::now);
    let event = StatusEvent::local(transmitted.status, reported_at);

    match store
        .mark_refill_request_transmitted(id, transmitted.remote_id, event)
        .await?
    {
        Appended::Inserted => info!(
            "Refill request {} was transmitted as prescription {} ({})",
            id, transmitted.remote_id, transmitted.status
        ),
        Appended::Duplicate => debug!(
            "Transmission of refill request {} was already recorded",
            id
        ),
    }

    request.remote_id = Some(transmitted.remote_id);

    let check = StatusCheckRequest {
        patient_id: request.patient_id,
        clinician_id: request.clinician_id,
        kind: Kind::RefillRequest,
    };
    queue.send(check.to_body()?).await?;

    Ok(request)
}
