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

use std::cmp::min;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::{
    sync::Mutex,
    time::{delay_for, Instant},
};

use super::{Error, Message, Receipt, StatusQueue};

const POLL_STEP: Duration = Duration::from_millis(100);

/// In-process implementation of `StatusQueue`.
#[derive(Clone, Default)]
pub struct MemoryQueue(pub(super) Arc<Mutex<Inner>>);

#[derive(Default)]
pub(super) struct Inner {
    next_receipt: u64,
    pub(super) entries: Vec<Entry>,
}

pub(super) struct Entry {
    pub(super) body: String,
    pub(super) receipt: Option<Receipt>,
    pub(super) invisible_until: Option<Instant>,
    pub(super) receive_count: u32,
}

impl MemoryQueue {
    /// Number of messages in the queue, visible or not.
    pub async fn len(&self) -> usize {
        self.0.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Inner {
    fn take_visible(&mut self, max: usize, visibility: Duration) -> Vec<Message> {
        let now = Instant::now();
        let mut messages = Vec::new();

        for entry in &mut self.entries {
            if messages.len() >= max {
                break;
            }

            let visible = match entry.invisible_until {
                Some(until) => until <= now,
                None => true,
            };
            if !visible {
                continue;
            }

            self.next_receipt += 1;
            let receipt = Receipt(format!("receipt-{}", self.next_receipt));

            entry.receipt = Some(receipt.clone());
            entry.invisible_until = Some(now + visibility);
            entry.receive_count += 1;

            messages.push(Message {
                body: entry.body.clone(),
                receipt,
                receive_count: entry.receive_count,
            });
        }

        messages
    }
}

#[async_trait]
impl StatusQueue for MemoryQueue {
    async fn receive(
        &self,
        max: usize,
        visibility: Duration,
        wait: Duration,
    ) -> Result<Vec<Message>, Error> {
        let deadline = Instant::now() + wait;

        loop {
            let messages = self.0.lock().await.take_visible(max, visibility);
            if !messages.is_empty() {
                return Ok(messages);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(messages);
            }

            delay_for(min(POLL_STEP, deadline - now)).await;
        }
    }

    async fn delete(&self, receipt: &Receipt) -> Result<(), Error> {
        let mut inner = self.0.lock().await;

        let pos = inner
            .entries
            .iter()
            .position(|entry| entry.receipt.as_ref() == Some(receipt));

        match pos {
            Some(pos) => {
                inner.entries.remove(pos);

                Ok(())
            }
            None => Err(Error::UnknownReceipt(receipt.clone())),
        }
    }

    async fn send(&self, body: String) -> Result<(), Error> {
        self.0.lock().await.entries.push(Entry {
            body,
            receipt: None,
            invisible_until: None,
            receive_count: 0,
        });

        Ok(())
    }
}
