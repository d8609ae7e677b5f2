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
use std::time::{Duration, Instant};

use chrono::Utc;
use log::{debug, error, info, warn};
use resources::{
    misc::RemoteClinicianId, ClinicianQueueItem, Kind, Patient, Resolution, Status, StatusEvent,
    TrackedItem,
};
use tokio::select;

use crate::{
    events::{EventBus, RxTransmissionErrorEvent},
    gateway::{ErxGateway, LogEntry},
    queue::{Message, StatusCheckRequest, StatusQueue},
    router::ProviderRouter,
    state::{DataStore, Lookup},
};

use super::{Error, Shutdown, Stats};

#[derive(Clone, Debug)]
pub struct ReconcilerConfig {
    pub poll_interval: Duration,
    pub visibility_timeout: Duration,
    pub long_poll: Duration,
    pub batch_size: usize,
}

/// Drains the status check queue and advances the status of the
/// prescriptions the messages refer to.
pub struct StatusReconciler {
    store: Arc<dyn DataStore>,
    gateway: Arc<dyn ErxGateway>,
    queue: Arc<dyn StatusQueue>,
    events: Arc<EventBus>,
    router: ProviderRouter,
    config: ReconcilerConfig,
    stats: Arc<Stats>,
}

/// What happened to a received message.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// All items reached a terminal state, the message was deleted.
    Completed,
    /// Some items are still in flight or failed, the message is delivered
    /// again after the visibility timeout.
    Retained,
    /// The message could not be decoded and was deleted.
    Dropped,
}

#[derive(Default)]
struct Progress {
    pending: usize,
    failed: usize,
    advanced: usize,
}

enum ItemOutcome {
    Pending,
    Advanced(Status),
    Unchanged,
}

impl StatusReconciler {
    pub fn new(
        store: Arc<dyn DataStore>,
        gateway: Arc<dyn ErxGateway>,
        queue: Arc<dyn StatusQueue>,
        events: Arc<EventBus>,
        config: ReconcilerConfig,
    ) -> Self {
        let router = ProviderRouter::new(store.clone());

        Self {
            store,
            gateway,
            queue,
            events,
            router,
            config,
            stats: Default::default(),
        }
    }

    pub fn stats(&self) -> Arc<Stats> {
        self.stats.clone()
    }

    pub async fn run(self, mut shutdown: Shutdown) {
        info!("Status reconciler started");

        while !shutdown.is_triggered() {
            let received = select! {
                res = self.receive() => res,
                _ = shutdown.wait() => break,
            };

            match received {
                Ok(messages) if messages.is_empty() => {
                    if !shutdown.sleep(self.config.poll_interval).await {
                        break;
                    }
                }
                Ok(messages) => {
                    for message in messages {
                        self.process(message).await;
                    }
                }
                Err(err) => {
                    error!("Unable to receive status check messages: {}", err);
                    self.stats.failed();

                    if !shutdown.sleep(self.config.poll_interval).await {
                        break;
                    }
                }
            }
        }

        info!("Status reconciler stopped");
    }

    /// Receives one batch of messages and processes it.
    pub async fn run_once(&self) -> Result<Vec<Outcome>, Error> {
        let messages = self.receive().await?;

        let mut outcomes = Vec::with_capacity(messages.len());
        for message in messages {
            outcomes.push(self.process(message).await);
        }

        Ok(outcomes)
    }

    async fn receive(&self) -> Result<Vec<Message>, Error> {
        let messages = self
            .queue
            .receive(
                self.config.batch_size,
                self.config.visibility_timeout,
                self.config.long_poll,
            )
            .await?;

        Ok(messages)
    }

    async fn process(&self, message: Message) -> Outcome {
        let started = Instant::now();

        let request = match StatusCheckRequest::from_body(&message.body) {
            Ok(request) => request,
            Err(err) => {
                error!("Dropping malformed status check message: {}", err);
                self.stats.failed();
                self.delete(&message).await;

                return Outcome::Dropped;
            }
        };

        let outcome = match self.reconcile(&request).await {
            Ok(progress) if progress.pending == 0 && progress.failed == 0 => {
                debug!(
                    "Status check for patient {} ({}) completed, {} item(s) advanced",
                    request.patient_id, request.kind, progress.advanced
                );

                if self.delete(&message).await {
                    Outcome::Completed
                } else {
                    Outcome::Retained
                }
            }
            Ok(progress) => {
                debug!(
                    "Status check for patient {} ({}) retained: {} pending, {} failed",
                    request.patient_id, request.kind, progress.pending, progress.failed
                );

                Outcome::Retained
            }
            Err(err) => {
                error!(
                    "Unable to process status check for patient {} ({}): {}",
                    request.patient_id, request.kind, err
                );
                self.stats.failed();

                Outcome::Retained
            }
        };

        self.stats.cycle(started.elapsed());

        outcome
    }

    async fn delete(&self, message: &Message) -> bool {
        match self.queue.delete(&message.receipt).await {
            Ok(()) => true,
            Err(err) => {
                error!("Failed to delete message {}: {}", message.receipt, err);
                self.stats.failed();

                false
            }
        }
    }

    async fn reconcile(&self, request: &StatusCheckRequest) -> Result<Progress, Error> {
        let kind = request.kind;

        let patient = match self.store.patient(request.patient_id).await? {
            Lookup::Found(patient) => patient,
            Lookup::NotFound => return Err(Error::UnknownPatient(request.patient_id)),
        };

        let clinician = match self.store.clinician(request.clinician_id).await? {
            Lookup::Found(clinician) => clinician,
            Lookup::NotFound => return Err(Error::UnknownClinician(request.clinician_id)),
        };

        let remote_clinician_id = clinician
            .remote_clinician_id
            .ok_or(Error::MissingRemoteClinicianId(clinician.id))?;

        let items = self
            .store
            .tracked_items(kind, request.patient_id)
            .await?
            .into_iter()
            .filter(|item| match item.current_status() {
                Some(status) => kind.is_polled(status),
                None => false,
            })
            .collect::<Vec<_>>();

        if items.is_empty() {
            info!(
                "There are no pending {} items for patient {}",
                kind, request.patient_id
            );
        }

        let mut progress = Progress::default();
        for item in &items {
            match self.reconcile_item(&patient, remote_clinician_id, item).await {
                Ok(ItemOutcome::Pending) => progress.pending += 1,
                Ok(ItemOutcome::Advanced(status)) => {
                    debug!("{} item {} advanced to {}", kind, item.item_id, status);

                    progress.advanced += 1;
                }
                Ok(ItemOutcome::Unchanged) => (),
                Err(err) if err.is_conflict() => {
                    error!(
                        "Refusing status update of {} item {}: {}",
                        kind, item.item_id, err
                    );
                }
                Err(err) => {
                    if err.is_transient() {
                        warn!(
                            "Unable to reconcile {} item {}, retrying later: {}",
                            kind, item.item_id, err
                        );
                    } else {
                        error!(
                            "Unable to reconcile {} item {}: {}",
                            kind, item.item_id, err
                        );
                    }
                    self.stats.failed();

                    progress.failed += 1;
                }
            }
        }

        Ok(progress)
    }

    async fn reconcile_item(
        &self,
        patient: &Patient,
        remote_clinician_id: RemoteClinicianId,
        item: &TrackedItem,
    ) -> Result<ItemOutcome, Error> {
        let kind = item.kind;

        let (remote_id, current) = match (item.prescription.remote_id, item.current_status()) {
            (Some(remote_id), Some(current)) => (remote_id, current),
            _ => return Ok(ItemOutcome::Unchanged),
        };

        let entries = match self
            .gateway
            .prescription_log_entries(remote_clinician_id, remote_id)
            .await
        {
            Ok(entries) => entries,
            Err(err) if err.is_not_found() => {
                let deleted = kind.spec().deleted;
                if !current.accepts(deleted) {
                    return Ok(ItemOutcome::Unchanged);
                }

                warn!(
                    "Prescription {} of {} item {} does no longer exist at the gateway",
                    remote_id, kind, item.item_id
                );

                let event = StatusEvent::local(deleted, Utc::now());
                self.store
                    .append_status_event(kind, item.item_id, event)
                    .await?;

                return Ok(ItemOutcome::Advanced(deleted));
            }
            Err(err) => return Err(err.into()),
        };

        let newest = match entries.first() {
            Some(newest) => newest,
            None => return Ok(ItemOutcome::Pending),
        };

        match kind.resolve(current, &newest.status) {
            Resolution::Pending => Ok(ItemOutcome::Pending),
            Resolution::Advance(status) if status.is_error() => {
                self.record_error(patient, item, status, newest).await?;

                Ok(ItemOutcome::Advanced(status))
            }
            Resolution::Advance(status) => {
                let event = StatusEvent::gateway(
                    status,
                    newest.reported_at,
                    newest.additional_info.clone(),
                );
                self.store
                    .append_status_event(kind, item.item_id, event)
                    .await?;

                Ok(ItemOutcome::Advanced(status))
            }
        }
    }

    async fn record_error(
        &self,
        patient: &Patient,
        item: &TrackedItem,
        status: Status,
        entry: &LogEntry,
    ) -> Result<(), Error> {
        record_transmission_error(
            &*self.store,
            &self.router,
            &self.events,
            patient,
            item,
            StatusEvent::gateway(status, entry.reported_at, entry.additional_info.clone()),
        )
        .await
    }
}

/// Records the error event together with the clinician work item and
/// publishes the transmission error if the event is new.
pub(super) async fn record_transmission_error(
    store: &dyn DataStore,
    router: &ProviderRouter,
    events: &EventBus,
    patient: &Patient,
    item: &TrackedItem,
    event: StatusEvent,
) -> Result<(), Error> {
    let kind: Kind = item.kind;
    let route = router.route(item.prescription.clinician_id).await?;

    let work = ClinicianQueueItem::transmission_error(
        kind,
        route.provider_id,
        item.item_id,
        patient,
        Utc::now(),
    );

    let appended = store
        .record_transmission_error(kind, item.item_id, event, work)
        .await?;

    if appended.is_inserted() {
        events.transmission_errors.publish(RxTransmissionErrorEvent {
            provider_id: route.provider_id,
            provider_role: route.role,
            item_id: item.item_id,
            remote_id: item.prescription.remote_id,
            kind,
            patient: patient.clone(),
        });
    }

    Ok(())
}
