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

use log::{debug, error, info};
use resources::{Kind, ProviderRole, StatusEvent, TrackedItem};

use crate::{
    events::EventBus,
    gateway::{ErroredPrescription, ErxGateway},
    router::ProviderRouter,
    state::{DataStore, Lookup},
};

use super::{status_reconciler::record_transmission_error, Error, Shutdown, Stats, WorkerLock};

const LOCK_OWNER: &str = "error_sweeper";

/// Kinds in the order an errored prescription is resolved against.
const RESOLUTION_ORDER: [Kind; 3] = [Kind::Treatment, Kind::RefillRequest, Kind::UnlinkedFollowup];

/// Attaches transmission errors reported by the gateway to the local items
/// whose status checks never made it through the queue.
pub struct ErrorSweeper {
    store: Arc<dyn DataStore>,
    gateway: Arc<dyn ErxGateway>,
    events: Arc<EventBus>,
    router: ProviderRouter,
    lock: Arc<dyn WorkerLock>,
    interval: Duration,
    stats: Arc<Stats>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SweepReport {
    pub recorded: usize,
    pub already_recorded: usize,
    pub not_found: usize,
    pub failed: usize,
}

enum Sweep {
    Recorded,
    AlreadyRecorded,
    NotFound,
}

impl ErrorSweeper {
    pub fn new(
        store: Arc<dyn DataStore>,
        gateway: Arc<dyn ErxGateway>,
        events: Arc<EventBus>,
        lock: Arc<dyn WorkerLock>,
        interval: Duration,
    ) -> Self {
        let router = ProviderRouter::new(store.clone());

        Self {
            store,
            gateway,
            events,
            router,
            lock,
            interval,
            stats: Default::default(),
        }
    }

    pub fn stats(&self) -> Arc<Stats> {
        self.stats.clone()
    }

    pub async fn run(self, mut shutdown: Shutdown) {
        info!("Error sweeper started");

        while !shutdown.is_triggered() {
            self.tick().await;

            if !shutdown.sleep(self.interval).await {
                break;
            }
        }

        self.lock.release(LOCK_OWNER).await;

        info!("Error sweeper stopped");
    }

    /// Runs one sweep if this replica holds the worker lock.
    pub async fn tick(&self) -> Option<SweepReport> {
        if !self.lock.try_acquire(LOCK_OWNER).await {
            debug!("Error sweeper lock is held by another worker");

            return None;
        }

        let started = Instant::now();
        let report = match self.run_once().await {
            Ok(report) => report,
            Err(err) => {
                error!("Error sweep failed: {}", err);
                self.stats.failed();

                SweepReport::default()
            }
        };

        self.stats.cycle(started.elapsed());
        self.lock.release(LOCK_OWNER).await;

        Some(report)
    }

    pub async fn run_once(&self) -> Result<SweepReport, Error> {
        let clinicians = self
            .store
            .list_active_providers_in_clinic()
            .await?
            .into_iter()
            .filter(|c| c.role == ProviderRole::Clinician)
            .filter_map(|c| c.remote_clinician_id.map(|remote_id| (c.id, remote_id)));

        let mut report = SweepReport::default();
        for (clinician_id, remote_clinician_id) in clinicians {
            let errors = match self
                .gateway
                .transmission_error_details(remote_clinician_id)
                .await
            {
                Ok(errors) => errors,
                Err(err) => {
                    error!(
                        "Unable to get transmission errors of clinician {}: {}",
                        clinician_id, err
                    );
                    self.stats.failed();

                    report.failed += 1;

                    continue;
                }
            };

            for errored in &errors {
                match self.sweep(errored).await {
                    Ok(Sweep::Recorded) => report.recorded += 1,
                    Ok(Sweep::AlreadyRecorded) => report.already_recorded += 1,
                    Ok(Sweep::NotFound) => {
                        debug!(
                            "Errored prescription {} is not in our database",
                            errored.remote_id
                        );
                        self.stats.not_found();

                        report.not_found += 1;
                    }
                    Err(err) => {
                        error!(
                            "Unable to record transmission error of prescription {}: {}",
                            errored.remote_id, err
                        );
                        self.stats.failed();

                        report.failed += 1;
                    }
                }
            }
        }

        if report.recorded > 0 {
            info!("Error sweep recorded {} new transmission error(s)", report.recorded);
        }

        Ok(report)
    }

    async fn sweep(&self, errored: &ErroredPrescription) -> Result<Sweep, Error> {
        for kind in RESOLUTION_ORDER.iter().copied() {
            if let Lookup::Found(item) = self
                .store
                .prescription_by_remote_id(kind, errored.remote_id)
                .await?
            {
                return self.attach(item, errored).await;
            }
        }

        Ok(Sweep::NotFound)
    }

    async fn attach(&self, item: TrackedItem, errored: &ErroredPrescription) -> Result<Sweep, Error> {
        if item.has_error_recorded() {
            return Ok(Sweep::AlreadyRecorded);
        }

        let patient_id = item.prescription.patient_id;
        let patient = match self.store.patient(patient_id).await? {
            Lookup::Found(patient) => patient,
            Lookup::NotFound => return Err(Error::UnknownPatient(patient_id)),
        };

        let event = StatusEvent::gateway(
            item.kind.spec().error,
            errored.reported_at,
            errored.error_details.clone(),
        );

        record_transmission_error(
            &*self.store,
            &self.router,
            &self.events,
            &patient,
            &item,
            event,
        )
        .await?;

        Ok(Sweep::Recorded)
    }
}
