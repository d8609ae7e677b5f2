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

use rand::{rngs::OsRng, seq::SliceRandom};
use resources::{misc::ClinicianId, Clinician, ProviderRole};

use crate::state::{DataStore, Error};

/// Provider that is notified about a transmission error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Route {
    pub provider_id: ClinicianId,
    pub role: ProviderRole,
}

/// Picks a random active care coordinator of the clinic, or the prescribing
/// clinician if there is none.
#[derive(Clone)]
pub struct ProviderRouter {
    store: Arc<dyn DataStore>,
}

impl ProviderRouter {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn route(&self, prescriber: ClinicianId) -> Result<Route, Error> {
        let providers = self.store.list_active_providers_in_clinic().await?;

        Ok(choose(&providers, prescriber))
    }
}

fn choose(providers: &[Clinician], prescriber: ClinicianId) -> Route {
    let coordinators = providers
        .iter()
        .filter(|p| p.active && p.role == ProviderRole::CareCoordinator)
        .collect::<Vec<_>>();

    match coordinators.choose(&mut OsRng) {
        Some(coordinator) => Route {
            provider_id: coordinator.id,
            role: ProviderRole::CareCoordinator,
        },
        None => Route {
            provider_id: prescriber,
            role: ProviderRole::Clinician,
        },
    }
}
