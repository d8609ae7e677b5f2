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

use futures::future::join_all;
use log::{error, info, warn};
use structopt::StructOpt;
use tokio::{runtime::Builder, signal::ctrl_c, spawn, task::LocalSet};

use erx_reconciler::{
    config::Config,
    error::Error,
    events::EventBus,
    gateway::HttpGateway,
    logging::init_logger,
    queue::MemoryQueue,
    service::Service,
    state::State,
    tasks::{
        log_stats, persist, shutdown, ErrorSweeper, LocalLock, RefillIntakePoller,
        StatusReconciler,
    },
};

fn main() -> Result<(), Error> {
    let config = Config::from_args();

    init_logger(&config.log_config, config.log_level)?;

    let mut runtime = Builder::new().threaded_scheduler().enable_all().build()?;
    let local = LocalSet::new();

    runtime.block_on(local.run_until(async {
        let state = State::new(config.datastore_timeout);
        if let Some(state_file) = &config.state_file {
            state.load_file(state_file).await?;

            info!("State loaded from {}", state_file.display());
        }

        let queue = MemoryQueue::default();
        if let Some(queue_file) = &config.queue_file {
            let count = queue.load_file(queue_file).await?;

            info!(
                "Loaded {} pending status check(s) from {}",
                count,
                queue_file.display()
            );
        }

        let gateway = Arc::new(HttpGateway::new(
            config.gateway_url.clone(),
            config.gateway_clinic_key.clone(),
            config.gateway_timeout,
            config.gateway_retry_attempts,
        )?);
        let status_queue = Arc::new(queue.clone());
        let store = Arc::new(state.clone());
        let events = Arc::new(EventBus::new());

        events.transmission_errors.subscribe(|event| async move {
            warn!(
                "Transmission error for {} item {} routed to provider {} ({:?})",
                event.kind, event.item_id, event.provider_id, event.provider_role
            );
        });
        events.refill_requests_created.subscribe(|event| async move {
            info!(
                "Refill request {} created for clinician {}",
                event.refill_request_id, event.clinician_id
            );
        });
        info!(
            "Subscribed to topics {} and {}",
            events.transmission_errors.name(),
            events.refill_requests_created.name()
        );

        let server = Service::new(store.clone(), status_queue.clone())
            .listen(&config.listen)?
            .run(&local)?;

        info!("Listening on {}", config.listen);

        let reconciler = StatusReconciler::new(
            store.clone(),
            gateway.clone(),
            status_queue,
            events.clone(),
            config.reconciler(),
        );
        let intake = RefillIntakePoller::new(
            store.clone(),
            gateway.clone(),
            events.clone(),
            Arc::new(LocalLock::default()),
            config.intake(),
        );
        let sweeper = ErrorSweeper::new(
            store,
            gateway,
            events,
            Arc::new(LocalLock::default()),
            config.error_sweeper_interval,
        );

        let stats = vec![
            ("status_reconciler", reconciler.stats()),
            ("refill_intake", intake.stats()),
            ("error_sweeper", sweeper.stats()),
        ];

        let (trigger, shutdown) = shutdown();

        let mut handles = vec![
            spawn(reconciler.run(shutdown.clone())),
            spawn(intake.run(shutdown.clone())),
            spawn(sweeper.run(shutdown.clone())),
            spawn(log_stats(stats, config.stats_interval, shutdown.clone())),
        ];

        if let Some(state_file) = config.state_file.clone() {
            handles.push(spawn(persist(
                "state",
                state,
                state_file,
                config.persist_interval,
                shutdown.clone(),
            )));
        }

        if let Some(queue_file) = config.queue_file.clone() {
            handles.push(spawn(persist(
                "status queue",
                queue,
                queue_file,
                config.persist_interval,
                shutdown.clone(),
            )));
        }

        ctrl_c().await?;
        info!("Shutting down");

        server.stop(true).await;
        trigger.trigger();

        for res in join_all(handles).await {
            if let Err(err) = res {
                error!("Worker terminated abnormally: {}", err);
            }
        }

        Ok(())
    }))
}
