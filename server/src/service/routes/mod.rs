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

pub mod health;
pub mod refill_request;
pub mod status_check;

use actix_web::web::ServiceConfig;

pub fn configure_routes(cfg: &mut ServiceConfig) {
    health::configure_routes(cfg);
    status_check::configure_routes(cfg);
    refill_request::configure_routes(cfg);
}
