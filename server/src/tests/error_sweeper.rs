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


use resources::{misc::RemoteId, Kind, QueueEventType, Source, Status};

use crate::tasks::SweepReport;

use super::*;

fn errored(remote_id: u64, details: &str) -> ErroredPrescription {
    ErroredPrescription {
        remote_id: RemoteId::new(remote_id),
        reported_at: t(300),
        error_details: details.into(),
    }
}

#[tokio::test]
async fn missed_error_is_recorded_once() {
    let h = Harness::new().await;
    let mut errors = h.events.transmission_errors.channel();
    let sweeper = h.sweeper();

    let item_id = h.prescription(Kind::Treatment, 40, &[Status::Sending]).await;
    h.gateway
        .set_errors(REMOTE_CLINICIAN_ID, vec![errored(40, "pharmacy offline")]);

    let report = sweeper.run_once().await.unwrap();
    assert_eq!(
        report,
        SweepReport {
            recorded: 1,
            ..Default::default()
        }
    );

    let history = h.history(Kind::Treatment, item_id).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].status, Status::Error);
    assert_eq!(history[0].reported_at, t(300));
    assert_eq!(history[0].detail, "pharmacy offline");
    assert_eq!(history[0].source, Source::Gateway);

    let event = errors.try_recv().unwrap();
    assert_eq!(event.item_id, item_id);
    assert_eq!(event.provider_id, CLINICIAN_ID);

    let report = sweeper.run_once().await.unwrap();
    assert_eq!(report.recorded, 0);
    assert_eq!(report.already_recorded, 1);

    assert_eq!(h.history(Kind::Treatment, item_id).await.len(), 2);
    assert_eq!(h.work_items().await.len(), 1);
    assert!(errors.try_recv().is_err());
}

#[tokio::test]
async fn resolved_error_is_not_recorded_again() {
    let h = Harness::new().await;

    let item_id = h
        .prescription(
            Kind::Treatment,
            40,
            &[Status::Sending, Status::Error, Status::Resolved],
        )
        .await;
    h.gateway
        .set_errors(REMOTE_CLINICIAN_ID, vec![errored(40, "pharmacy offline")]);

    let report = h.sweeper().run_once().await.unwrap();
    assert_eq!(report.already_recorded, 1);
    assert_eq!(h.history(Kind::Treatment, item_id).await.len(), 3);
}

#[tokio::test]
async fn unknown_prescription_is_counted() {
    let h = Harness::new().await;
    let sweeper = h.sweeper();

    h.gateway
        .set_errors(REMOTE_CLINICIAN_ID, vec![errored(999, "unknown")]);

    let report = sweeper.run_once().await.unwrap();
    assert_eq!(report.not_found, 1);
    assert_eq!(sweeper.stats().snapshot().not_found, 1);
    assert!(h.work_items().await.is_empty());
}

#[tokio::test]
async fn refill_request_error_is_attached_to_request() {
    let h = Harness::new().await;

    let item_id = h
        .transmitted_refill_request(9001, 99, Status::Denied)
        .await;

    h.gateway.set_errors(
        REMOTE_CLINICIAN_ID,
        vec![errored(99, "rejected"), errored(41, "requested, never sent")],
    );

    let report = h.sweeper().run_once().await.unwrap();
    assert_eq!(report.recorded, 1);
    assert_eq!(report.not_found, 1);

    let history = h.history(Kind::RefillRequest, item_id).await;
    assert_eq!(history[0].status, Status::ErrorAtPharmacy);
    assert_eq!(history[0].detail, "rejected");

    let work = h.work_items().await;
    assert_eq!(work.len(), 1);
    assert_eq!(work[0].item_id, item_id);
    assert_eq!(work[0].event_type, QueueEventType::RefillTransmissionError);
}

#[tokio::test]
async fn unlinked_followup_is_resolved_last() {
    let h = Harness::new().await;

    let item_id = h
        .prescription(Kind::UnlinkedFollowup, 42, &[Status::Sending])
        .await;
    h.gateway
        .set_errors(REMOTE_CLINICIAN_ID, vec![errored(42, "no route")]);

    let report = h.sweeper().run_once().await.unwrap();
    assert_eq!(report.recorded, 1);

    let history = h.history(Kind::UnlinkedFollowup, item_id).await;
    assert_eq!(history[0].status, Status::Error);
    assert_eq!(
        h.work_items().await[0].event_type,
        QueueEventType::UnlinkedFollowupTransmissionError
    );
}
