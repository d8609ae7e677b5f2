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


use resources::{
    misc::{ClinicianId, RemoteId},
    Kind, ProviderRole, QueueEventType, QueueItemStatus, RemoteStatus, Source, Status,
    StatusEvent,
};

use crate::{
    state::{Appended, DataStore},
    tasks::Outcome,
};

use super::*;

#[tokio::test]
async fn sent_prescription_completes_status_check() {
    let h = Harness::new().await;
    let mut errors = h.events.transmission_errors.channel();

    let item_id = h.prescription(Kind::Treatment, 40, &[Status::Sending]).await;
    h.gateway.set_log(
        40,
        vec![
            log_entry(RemoteStatus::Sent, t(100), ""),
            log_entry(RemoteStatus::Sending, t(50), ""),
        ],
    );
    h.send(Kind::Treatment).await;

    let outcomes = h.reconciler().run_once().await.unwrap();
    assert_eq!(outcomes, vec![Outcome::Completed]);

    let history = h.history(Kind::Treatment, item_id).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].status, Status::Sent);
    assert_eq!(history[0].reported_at, t(100));
    assert_eq!(history[0].source, Source::Gateway);

    assert!(errors.try_recv().is_err());
    assert!(h.work_items().await.is_empty());
    assert!(h.queue.is_empty().await);
}

#[tokio::test]
async fn errored_prescription_notifies_prescriber() {
    let h = Harness::new().await;
    let mut errors = h.events.transmission_errors.channel();

    let item_id = h.prescription(Kind::Treatment, 40, &[Status::Sending]).await;
    h.gateway
        .set_log(40, vec![log_entry(RemoteStatus::Error, t(100), "error!")]);
    h.send(Kind::Treatment).await;

    let outcomes = h.reconciler().run_once().await.unwrap();
    assert_eq!(outcomes, vec![Outcome::Completed]);

    let history = h.history(Kind::Treatment, item_id).await;
    assert_eq!(history[0].status, Status::Error);
    assert_eq!(history[0].detail, "error!");

    let event = errors.try_recv().unwrap();
    assert_eq!(event.item_id, item_id);
    assert_eq!(event.remote_id, Some(RemoteId::new(40)));
    assert_eq!(event.kind, Kind::Treatment);
    assert_eq!(event.provider_id, CLINICIAN_ID);
    assert_eq!(event.provider_role, ProviderRole::Clinician);
    assert_eq!(event.patient.id, Some(PATIENT_ID));
    assert!(errors.try_recv().is_err());

    let work = h.work_items().await;
    assert_eq!(work.len(), 1);
    assert_eq!(work[0].clinician_id, CLINICIAN_ID);
    assert_eq!(work[0].item_id, item_id);
    assert_eq!(work[0].event_type, QueueEventType::TransmissionError);
    assert_eq!(work[0].status, QueueItemStatus::Pending);
    assert_eq!(work[0].description, "Error sending prescription for Jane Doe");

    assert!(h.queue.is_empty().await);
}

#[tokio::test]
async fn errored_prescription_goes_to_care_coordinator() {
    let h = Harness::new().await;
    let mut errors = h.events.transmission_errors.channel();

    h.state
        .lock()
        .await
        .unwrap()
        .insert_clinician(clinician(60, None, ProviderRole::CareCoordinator));

    h.prescription(Kind::Treatment, 40, &[Status::Sending]).await;
    h.gateway
        .set_log(40, vec![log_entry(RemoteStatus::Error, t(100), "error!")]);
    h.send(Kind::Treatment).await;

    h.reconciler().run_once().await.unwrap();

    let event = errors.try_recv().unwrap();
    assert_eq!(event.provider_id, ClinicianId::new(60));
    assert_eq!(event.provider_role, ProviderRole::CareCoordinator);

    let work = h.work_items().await;
    assert_eq!(work.len(), 1);
    assert_eq!(work[0].clinician_id, ClinicianId::new(60));
}

#[tokio::test]
async fn unlinked_followup_error_is_kept_apart() {
    let h = Harness::new().await;
    let mut errors = h.events.transmission_errors.channel();

    let item_id = h
        .prescription(Kind::UnlinkedFollowup, 41, &[Status::Sending])
        .await;
    h.gateway
        .set_log(41, vec![log_entry(RemoteStatus::Error, t(100), "no route")]);
    h.send(Kind::UnlinkedFollowup).await;

    let outcomes = h.reconciler().run_once().await.unwrap();
    assert_eq!(outcomes, vec![Outcome::Completed]);

    let history = h.history(Kind::UnlinkedFollowup, item_id).await;
    assert_eq!(history[0].status, Status::Error);
    assert!(h.history(Kind::Treatment, item_id).await.is_empty());

    let event = errors.try_recv().unwrap();
    assert_eq!(event.kind, Kind::UnlinkedFollowup);

    let work = h.work_items().await;
    assert_eq!(work.len(), 1);
    assert_eq!(
        work[0].event_type,
        QueueEventType::UnlinkedFollowupTransmissionError
    );
}

#[tokio::test]
async fn terminal_status_is_not_overwritten() {
    let h = Harness::new().await;
    let mut errors = h.events.transmission_errors.channel();

    let item_id = h.prescription(Kind::Treatment, 40, &[Status::Sending]).await;

    // another replica records the sent status while this one polls
    h.gateway.interleave(Interleaved::StatusEvent {
        state: h.state.clone(),
        kind: Kind::Treatment,
        item_id,
        event: StatusEvent::gateway(Status::Sent, t(90), ""),
    });
    h.gateway
        .set_log(40, vec![log_entry(RemoteStatus::Error, t(100), "late")]);
    h.send(Kind::Treatment).await;

    let outcomes = h.reconciler().run_once().await.unwrap();
    assert_eq!(outcomes, vec![Outcome::Completed]);

    let history = h.history(Kind::Treatment, item_id).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].status, Status::Sent);

    assert!(errors.try_recv().is_err());
    assert!(h.work_items().await.is_empty());

    let err = h
        .state
        .append_status_event(
            Kind::Treatment,
            item_id,
            StatusEvent::gateway(Status::Error, t(100), "late"),
        )
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn in_flight_prescription_is_retained() {
    let h = Harness::new().await;
    let reconciler = h.reconciler();

    let item_id = h.prescription(Kind::Treatment, 40, &[Status::Sending]).await;
    h.gateway
        .set_log(40, vec![log_entry(RemoteStatus::Sending, t(50), "")]);
    h.send(Kind::Treatment).await;

    for _ in 0..3 {
        let outcomes = reconciler.run_once().await.unwrap();
        assert_eq!(outcomes, vec![Outcome::Retained]);
    }

    assert_eq!(h.queue.len().await, 1);
    assert_eq!(h.history(Kind::Treatment, item_id).await.len(), 1);

    h.gateway
        .set_log(40, vec![log_entry(RemoteStatus::Sent, t(200), "")]);

    let outcomes = reconciler.run_once().await.unwrap();
    assert_eq!(outcomes, vec![Outcome::Completed]);
    assert!(h.queue.is_empty().await);
}

#[tokio::test]
async fn empty_log_is_retained() {
    let h = Harness::new().await;

    h.prescription(Kind::Treatment, 40, &[Status::Sending]).await;
    h.send(Kind::Treatment).await;

    let outcomes = h.reconciler().run_once().await.unwrap();
    assert_eq!(outcomes, vec![Outcome::Retained]);
}

#[tokio::test]
async fn failed_item_does_not_block_others() {
    let h = Harness::new().await;
    let reconciler = h.reconciler();

    let first = h.prescription(Kind::Treatment, 40, &[Status::Sending]).await;
    let second = h.prescription(Kind::Treatment, 41, &[Status::Sending]).await;

    h.gateway.set_failing(40, true);
    h.gateway
        .set_log(40, vec![log_entry(RemoteStatus::Sent, t(100), "")]);
    h.gateway
        .set_log(41, vec![log_entry(RemoteStatus::Sent, t(100), "")]);
    h.send(Kind::Treatment).await;

    let outcomes = reconciler.run_once().await.unwrap();
    assert_eq!(outcomes, vec![Outcome::Retained]);
    assert_eq!(h.history(Kind::Treatment, first).await[0].status, Status::Sending);
    assert_eq!(h.history(Kind::Treatment, second).await[0].status, Status::Sent);
    assert_eq!(reconciler.stats().snapshot().failed, 1);

    h.gateway.set_failing(40, false);

    let outcomes = reconciler.run_once().await.unwrap();
    assert_eq!(outcomes, vec![Outcome::Completed]);
    assert_eq!(h.history(Kind::Treatment, first).await[0].status, Status::Sent);
}

#[tokio::test]
async fn missing_prescription_is_marked_deleted() {
    let h = Harness::new().await;

    let item_id = h.prescription(Kind::Treatment, 40, &[Status::Sending]).await;
    h.gateway.set_missing(40);
    h.send(Kind::Treatment).await;

    let outcomes = h.reconciler().run_once().await.unwrap();
    assert_eq!(outcomes, vec![Outcome::Completed]);

    let history = h.history(Kind::Treatment, item_id).await;
    assert_eq!(history[0].status, Status::Deleted);
    assert_eq!(history[0].source, Source::Local);
}

#[tokio::test]
async fn malformed_message_is_dropped() {
    let h = Harness::new().await;
    let reconciler = h.reconciler();

    h.queue.send("{\"patient_id\": 20}".into()).await.unwrap();

    let outcomes = reconciler.run_once().await.unwrap();
    assert_eq!(outcomes, vec![Outcome::Dropped]);
    assert!(h.queue.is_empty().await);
    assert_eq!(reconciler.stats().snapshot().failed, 1);
}

#[tokio::test]
async fn unknown_patient_is_retained() {
    let h = Harness::new().await;

    h.queue
        .send(r#"{"patient_id":"99","doctor_id":"50","event_check_type":"erx"}"#.into())
        .await
        .unwrap();

    let outcomes = h.reconciler().run_once().await.unwrap();
    assert_eq!(outcomes, vec![Outcome::Retained]);
    assert_eq!(h.queue.len().await, 1);
}

#[tokio::test]
async fn nothing_to_check_completes() {
    let h = Harness::new().await;

    let item_id = h
        .prescription(Kind::Treatment, 40, &[Status::Sending, Status::Sent])
        .await;
    h.send(Kind::Treatment).await;

    let outcomes = h.reconciler().run_once().await.unwrap();
    assert_eq!(outcomes, vec![Outcome::Completed]);
    assert_eq!(h.history(Kind::Treatment, item_id).await.len(), 2);
}

#[tokio::test]
async fn approved_refill_request_reaches_pharmacy() {
    let h = Harness::new().await;

    let item_id = h
        .transmitted_refill_request(9001, 99, Status::Approved)
        .await;

    // the requested prescription is not what the gateway reports on
    h.gateway.set_missing(41);
    h.gateway
        .set_log(99, vec![log_entry(RemoteStatus::Sent, t(30), "")]);
    h.send(Kind::RefillRequest).await;

    let outcomes = h.reconciler().run_once().await.unwrap();
    assert_eq!(outcomes, vec![Outcome::Completed]);

    let history = h.history(Kind::RefillRequest, item_id).await;
    assert_eq!(history[0].status, Status::SentToPharmacy);
    assert_eq!(history.len(), 3);
}

#[tokio::test]
async fn untransmitted_refill_request_is_not_polled() {
    let h = Harness::new().await;

    let request = h
        .state
        .insert_refill_request(
            refill_request(9001, 41, PATIENT_ID),
            StatusEvent::gateway(Status::Requested, t(10), ""),
        )
        .await
        .unwrap();
    let item_id = request.id.unwrap().into();

    let appended = h
        .state
        .append_status_event(
            Kind::RefillRequest,
            item_id,
            StatusEvent::local(Status::Approved, t(20)),
        )
        .await
        .unwrap();
    assert_eq!(appended, Appended::Inserted);

    h.gateway
        .set_log(41, vec![log_entry(RemoteStatus::Sent, t(30), "")]);
    h.send(Kind::RefillRequest).await;

    let outcomes = h.reconciler().run_once().await.unwrap();
    assert_eq!(outcomes, vec![Outcome::Completed]);

    let history = h.history(Kind::RefillRequest, item_id).await;
    assert_eq!(history[0].status, Status::Approved);
}

#[tokio::test]
async fn refill_request_error_at_pharmacy_notifies_clinician() {
    for status in &[Status::Approved, Status::Denied] {
        let h = Harness::new().await;
        let mut errors = h.events.transmission_errors.channel();

        let item_id = h.transmitted_refill_request(9001, 99, *status).await;
        h.gateway.set_log(
            99,
            vec![log_entry(RemoteStatus::Error, t(30), "pharmacy rejected")],
        );
        h.send(Kind::RefillRequest).await;

        let outcomes = h.reconciler().run_once().await.unwrap();
        assert_eq!(outcomes, vec![Outcome::Completed]);

        let history = h.history(Kind::RefillRequest, item_id).await;
        assert_eq!(history[0].status, Status::ErrorAtPharmacy);
        assert_eq!(history[0].detail, "pharmacy rejected");
        assert_eq!(history[1].status, *status);

        let event = errors.try_recv().unwrap();
        assert_eq!(event.kind, Kind::RefillRequest);
        assert_eq!(event.item_id, item_id);
        assert_eq!(event.remote_id, Some(RemoteId::new(99)));
        assert_eq!(event.provider_id, CLINICIAN_ID);
        assert!(errors.try_recv().is_err());

        let work = h.work_items().await;
        assert_eq!(work.len(), 1);
        assert_eq!(work[0].item_id, item_id);
        assert_eq!(work[0].event_type, QueueEventType::RefillTransmissionError);
        assert_eq!(work[0].description, "Error completing refill request for Jane Doe");
        assert_eq!(work[0].status, QueueItemStatus::Pending);
    }
}
