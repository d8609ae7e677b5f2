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

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_ids {
    ( $( $(#[$meta:meta])* $name:ident ),* $(,)? ) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(u64);

            impl $name {
                pub const fn new(value: u64) -> Self {
                    Self(value)
                }

                pub fn value(&self) -> u64 {
                    self.0
                }
            }

            impl From<u64> for $name {
                fn from(v: u64) -> Self {
                    Self(v)
                }
            }

            impl From<$name> for u64 {
                fn from(v: $name) -> Self {
                    v.0
                }
            }

            impl Display for $name {
                fn fmt(&self, f: &mut Formatter) -> FmtResult {
                    write!(f, "{}", self.0)
                }
            }

            impl FromStr for $name {
                type Err = ParseIntError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    Ok(Self(s.trim().parse()?))
                }
            }
        )*
    };
}

define_ids!(
    PatientId,
    ClinicianId,
    PrescriptionId,
    RefillRequestId,
    PharmacyId,
    TreatmentPlanId,
    /// Identifier of the item a status history belongs to. For treatments and
    /// unlinked follow-up treatments this is the prescription id, for refill
    /// requests the refill request id.
    ItemId,
    /// Prescription identifier assigned by the eRx gateway.
    RemoteId,
    RemoteClinicianId,
    RemotePatientId,
    RemotePharmacyId,
    /// Opaque identifier of a refill request inside the gateway's clinic queue.
    QueueItemId,
);

impl From<PrescriptionId> for ItemId {
    fn from(v: PrescriptionId) -> Self {
        Self(v.0)
    }
}

impl From<RefillRequestId> for ItemId {
    fn from(v: RefillRequestId) -> Self {
        Self(v.0)
    }
}

impl From<ItemId> for PrescriptionId {
    fn from(v: ItemId) -> Self {
        Self(v.0)
    }
}

impl From<ItemId> for RefillRequestId {
    fn from(v: ItemId) -> Self {
        Self(v.0)
    }
}
