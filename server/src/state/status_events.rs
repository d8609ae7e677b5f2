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

use std::collections::HashMap;

use resources::{misc::ItemId, Kind, StatusEvent};

use super::{Appended, Conflict, Error};

/// One append-only status history table per kind. Histories are kept in
/// insertion order.
#[derive(Default)]
pub struct StatusEvents {
    treatments: HashMap<ItemId, Vec<StatusEvent>>,
    refill_requests: HashMap<ItemId, Vec<StatusEvent>>,
    unlinked_followups: HashMap<ItemId, Vec<StatusEvent>>,
}

impl StatusEvents {
    /// History of the item, newest first.
    pub fn history(&self, kind: Kind, item_id: ItemId) -> Vec<StatusEvent> {
        self.table(kind)
            .get(&item_id)
            .map(|events| events.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    pub fn latest(&self, kind: Kind, item_id: ItemId) -> Option<&StatusEvent> {
        self.table(kind)
            .get(&item_id)
            .and_then(|events| events.last())
    }

    /// Checks whether `event` could be appended to the item's history
    /// without changing anything.
    pub fn check(&self, kind: Kind, item_id: ItemId, event: &StatusEvent) -> Result<Appended, Error> {
        let events = match self.table(kind).get(&item_id) {
            Some(events) => events.as_slice(),
            None => &[],
        };

        if events.iter().any(|e| e.same_occurrence(event)) {
            return Ok(Appended::Duplicate);
        }

        match events.last() {
            None if kind.is_initial(event.status) => Ok(Appended::Inserted),
            Some(latest) if latest.status == event.status => Ok(Appended::Duplicate),
            Some(latest) if latest.status.accepts(event.status) => Ok(Appended::Inserted),
            Some(latest) if latest.status.is_terminal() => Err(Conflict::Terminal {
                kind,
                item_id,
                current: latest.status,
                next: event.status,
            }
            .into()),
            latest => Err(Conflict::InvalidTransition {
                kind,
                item_id,
                current: latest.map(|e| e.status),
                next: event.status,
            }
            .into()),
        }
    }

    pub fn append(&mut self, kind: Kind, item_id: ItemId, event: StatusEvent) -> Result<Appended, Error> {
        let appended = self.check(kind, item_id, &event)?;
        if appended == Appended::Inserted {
            self.restore(kind, item_id, event);
        }

        Ok(appended)
    }

    /// Pushes an event without any checks. Used when loading a snapshot.
    pub fn restore(&mut self, kind: Kind, item_id: ItemId, event: StatusEvent) {
        self.table_mut(kind).entry(item_id).or_default().push(event);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Kind, ItemId, &StatusEvent)> {
        Kind::ALL.to_vec().into_iter().flat_map(move |kind| {
            self.table(kind).iter().flat_map(move |(item_id, events)| {
                events.iter().map(move |event| (kind, *item_id, event))
            })
        })
    }

    fn table(&self, kind: Kind) -> &HashMap<ItemId, Vec<StatusEvent>> {
        match kind {
            Kind::Treatment => &self.treatments,
            Kind::RefillRequest => &self.refill_requests,
            Kind::UnlinkedFollowup => &self.unlinked_followups,
        }
    }

    fn table_mut(&mut self, kind: Kind) -> &mut HashMap<ItemId, Vec<StatusEvent>> {
        match kind {
            Kind::Treatment => &mut self.treatments,
            Kind::RefillRequest => &mut self.refill_requests,
            Kind::UnlinkedFollowup => &mut self.unlinked_followups,
        }
    }
}
