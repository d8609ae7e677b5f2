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

use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

use log::LevelFilter;
use structopt::StructOpt;
use url::Url;

use crate::tasks::{IntakeConfig, ReconcilerConfig};

#[derive(Clone, Debug, StructOpt)]
#[structopt(name = "erx-reconciler", about = "Keeps local eRx state in sync with the eRx gateway")]
pub struct Config {
    /// Base URL of the eRx gateway API.
    #[structopt(long = "gateway-url")]
    pub gateway_url: Url,

    /// Clinic key sent to the gateway with every request.
    #[structopt(long = "gateway-clinic-key")]
    pub gateway_clinic_key: Option<String>,

    /// Timeout of a single gateway request in seconds.
    #[structopt(long = "gateway-timeout", default_value = "30", parse(try_from_str = parse_secs))]
    pub gateway_timeout: Duration,

    #[structopt(long = "gateway-retry-attempts", default_value = "3")]
    pub gateway_retry_attempts: usize,

    #[structopt(long = "status-reconciler-poll-interval", default_value = "30", parse(try_from_str = parse_secs))]
    pub status_reconciler_poll_interval: Duration,

    #[structopt(long = "status-queue-visibility-timeout", default_value = "300", parse(try_from_str = parse_secs))]
    pub status_queue_visibility_timeout: Duration,

    #[structopt(long = "status-queue-long-poll", default_value = "20", parse(try_from_str = parse_secs))]
    pub status_queue_long_poll: Duration,

    #[structopt(long = "status-queue-batch-size", default_value = "10")]
    pub status_queue_batch_size: usize,

    #[structopt(long = "refill-poller-interval", default_value = "30", parse(try_from_str = parse_secs))]
    pub refill_poller_interval: Duration,

    #[structopt(long = "error-sweeper-interval", default_value = "7200", parse(try_from_str = parse_secs))]
    pub error_sweeper_interval: Duration,

    /// Pathway assigned to patients created for unknown refill request patients.
    #[structopt(long = "unlinked-patient-pathway")]
    pub pathway_id_for_unlinked_patients: String,

    #[structopt(long = "datastore-timeout", default_value = "5", parse(try_from_str = parse_secs))]
    pub datastore_timeout: Duration,

    /// Address the HTTP service listens on.
    #[structopt(long = "listen", default_value = "[::]:3000")]
    pub listen: String,

    /// File the pending status checks are loaded from and saved to.
    #[structopt(long = "queue-file")]
    pub queue_file: Option<PathBuf>,

    /// File the state is loaded from and saved to.
    #[structopt(short = "s", long = "state-file")]
    pub state_file: Option<PathBuf>,

    #[structopt(long = "persist-interval", default_value = "60", parse(try_from_str = parse_secs))]
    pub persist_interval: Duration,

    #[structopt(long = "stats-interval", default_value = "300", parse(try_from_str = parse_secs))]
    pub stats_interval: Duration,

    #[structopt(short = "c", long = "config", default_value = "./log4rs.yml")]
    pub log_config: PathBuf,

    #[structopt(short = "l", long = "log-level", default_value = "info")]
    pub log_level: LevelFilter,
}

impl Config {
    pub fn reconciler(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            poll_interval: self.status_reconciler_poll_interval,
            visibility_timeout: self.status_queue_visibility_timeout,
            long_poll: self.status_queue_long_poll,
            batch_size: self.status_queue_batch_size,
        }
    }

    pub fn intake(&self) -> IntakeConfig {
        IntakeConfig {
            interval: self.refill_poller_interval,
            pathway: self.pathway_id_for_unlinked_patients.clone(),
        }
    }
}

fn parse_secs(s: &str) -> Result<Duration, ParseIntError> {
    Ok(Duration::from_secs(s.trim().parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::from_iter(&[
            "erx-reconciler",
            "--gateway-url",
            "https://gateway.example.com/api/",
            "--unlinked-patient-pathway",
            "health_condition_acne",
        ]);

        assert_eq!(config.gateway_timeout, Duration::from_secs(30));
        assert_eq!(config.gateway_retry_attempts, 3);
        assert_eq!(config.status_queue_visibility_timeout, Duration::from_secs(300));
        assert_eq!(config.status_queue_long_poll, Duration::from_secs(20));
        assert_eq!(config.error_sweeper_interval, Duration::from_secs(2 * 60 * 60));
        assert_eq!(config.datastore_timeout, Duration::from_secs(5));
        assert_eq!(config.log_level, LevelFilter::Info);
        assert!(config.state_file.is_none());
        assert_eq!(config.listen, "[::]:3000");
        assert!(config.queue_file.is_none());

        let intake = config.intake();
        assert_eq!(intake.interval, Duration::from_secs(30));
        assert_eq!(intake.pathway, "health_condition_acne");
    }

    #[test]
    fn overrides() {
        let config = Config::from_iter(&[
            "erx-reconciler",
            "--gateway-url",
            "https://gateway.example.com/api/",
            "--unlinked-patient-pathway",
            "unknown",
            "--status-queue-long-poll",
            "5",
            "--state-file",
            "/var/lib/erx/state.json",
            "--queue-file",
            "/var/lib/erx/queue.json",
            "--listen",
            "127.0.0.1:8080",
            "-l",
            "debug",
        ]);

        let reconciler = config.reconciler();
        assert_eq!(reconciler.long_poll, Duration::from_secs(5));
        assert_eq!(reconciler.batch_size, 10);
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.state_file, Some(PathBuf::from("/var/lib/erx/state.json")));
        assert_eq!(config.queue_file, Some(PathBuf::from("/var/lib/erx/queue.json")));
        assert_eq!(config.listen, "127.0.0.1:8080");
    }
}
