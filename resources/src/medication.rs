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

use serde::{Deserialize, Serialize};

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub display_name: String,

    #[serde(default)]
    pub strength: String,

    #[serde(default)]
    pub dispense: String,

    #[serde(default)]
    pub dispense_unit: String,

    pub refills: Option<u32>,
    pub days_supply: Option<u32>,

    #[serde(default)]
    pub instructions: String,

    #[serde(default)]
    pub substitutions_allowed: bool,
}
