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

use std::future::Future;

use arc_swap::ArcSwap;
use log::{debug, warn};
use resources::{
    misc::{ClinicianId, ItemId, PatientId, RefillRequestId, RemoteId},
    Kind, Patient, ProviderRole,
};
use tokio::{
    spawn,
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
};

/// A transmission error was recorded for an item.
#[derive(Clone, Debug, PartialEq)]
pub struct RxTransmissionErrorEvent {
    pub provider_id: ClinicianId,
    pub provider_role: ProviderRole,
    pub item_id: ItemId,
    pub remote_id: Option<RemoteId>,
    pub kind: Kind,
    pub patient: Patient,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RefillRequestCreatedEvent {
    pub clinician_id: ClinicianId,
    pub refill_request_id: RefillRequestId,
    pub patient_id: PatientId,
}

/// In-process event bus with one topic per event type.
pub struct EventBus {
    pub transmission_errors: Topic<RxTransmissionErrorEvent>,
    pub refill_requests_created: Topic<RefillRequestCreatedEvent>,
}

/// Publish/subscribe topic. Every subscriber has its own unbounded channel,
/// so publishing never waits for a subscriber.
pub struct Topic<E> {
    name: &'static str,
    subscribers: ArcSwap<Vec<UnboundedSender<E>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            transmission_errors: Topic::new("rx_transmission_error"),
            refill_requests_created: Topic::new("refill_request_created"),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Topic<E>
where
    E: Clone + Send + 'static,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            subscribers: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Registers a subscriber that receives the events in its own task.
    pub fn subscribe<F, R>(&self, handler: F)
    where
        F: Fn(E) -> R + Send + Sync + 'static,
        R: Future<Output = ()> + Send + 'static,
    {
        let mut rx = self.channel();

        spawn(async move {
            while let Some(event) = rx.recv().await {
                handler(event).await;
            }
        });
    }

    /// Registers a subscriber that reads the events from a channel.
    pub fn channel(&self) -> UnboundedReceiver<E> {
        let (tx, rx) = unbounded_channel();

        self.subscribers.rcu(|subscribers| {
            let mut subscribers = Vec::clone(subscribers);
            subscribers.push(tx.clone());

            subscribers
        });

        rx
    }

    /// Hands the event to every subscriber and returns the number of
    /// subscribers that accepted it.
    pub fn publish(&self, event: E) -> usize {
        let subscribers = self.subscribers.load();

        let mut delivered = 0;
        for subscriber in subscribers.iter() {
            match subscriber.send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => warn!("Subscriber of topic {} is gone", self.name),
            }
        }

        debug!(
            "Published event on topic {} to {} subscriber(s)",
            self.name, delivered
        );

        delivered
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use tokio::time::{delay_for, Duration};

    use super::*;

    fn event(id: u64) -> RefillRequestCreatedEvent {
        RefillRequestCreatedEvent {
            clinician_id: ClinicianId::new(50),
            refill_request_id: RefillRequestId::new(id),
            patient_id: PatientId::new(20),
        }
    }

    #[tokio::test]
    async fn fan_out_to_all_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.refill_requests_created.name(), "refill_request_created");
        assert_eq!(bus.transmission_errors.name(), "rx_transmission_error");

        let mut first = bus.refill_requests_created.channel();
        let mut second = bus.refill_requests_created.channel();

        assert_eq!(bus.refill_requests_created.publish(event(1)), 2);

        assert_eq!(first.recv().await, Some(event(1)));
        assert_eq!(second.recv().await, Some(event(1)));
    }

    #[tokio::test]
    async fn handler_runs_in_own_task() {
        let topic = Topic::new("test");
        let counter = Arc::new(AtomicUsize::new(0));

        let c = counter.clone();
        topic.subscribe(move |_: RefillRequestCreatedEvent| {
            let c = c.clone();

            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        topic.publish(event(1));
        topic.publish(event(2));

        for _ in 0..50 {
            if counter.load(Ordering::SeqCst) == 2 {
                break;
            }

            delay_for(Duration::from_millis(10)).await;
        }

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn dropped_subscriber_is_skipped() {
        let topic = Topic::new("test");

        let rx = topic.channel();
        drop(rx);

        assert_eq!(topic.publish(event(1)), 0);
    }
}
