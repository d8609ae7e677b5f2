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

mod error;
mod error_sweeper;
mod lock;
mod periodic;
mod refill_intake;
mod shutdown;
mod stats;
mod status_reconciler;

pub use error::Error;
pub use error_sweeper::{ErrorSweeper, SweepReport};
pub use lock::{LocalLock, WorkerLock};
pub use periodic::{log_stats, persist, Persist};
pub use refill_intake::{IntakeConfig, IntakeReport, RefillIntakePoller};
pub use shutdown::{shutdown, Shutdown, ShutdownTrigger};
pub use stats::{Snapshot, Stats};
pub use status_reconciler::{Outcome, ReconcilerConfig, StatusReconciler};
