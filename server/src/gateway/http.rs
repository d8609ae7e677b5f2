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

use std::env::var;
use std::time::Duration;

use glob::Pattern;
use log::warn;
use reqwest::{Client as HttpClient, Error, Proxy, RequestBuilder};
use url::Url;

/// HTTP client that honors the `http_proxy`, `https_proxy` and `no_proxy`
/// environment variables. `no_proxy` may contain glob patterns.
pub struct Client {
    http_proxy: HttpClient,
    http_no_proxy: HttpClient,
    no_proxy: Vec<Pattern>,
}

impl Client {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let no_proxy = match var("no_proxy") {
            Ok(no_proxy) => parse_no_proxy(&no_proxy),
            Err(_) => Vec::new(),
        };

        let mut http = HttpClient::builder().timeout(timeout);

        if let Ok(http_proxy) = var("http_proxy") {
            http = http.proxy(Proxy::http(&http_proxy)?);
        }

        if let Ok(https_proxy) = var("https_proxy") {
            http = http.proxy(Proxy::https(&https_proxy)?);
        }

        let http_proxy = http.build()?;
        let http_no_proxy = HttpClient::builder().timeout(timeout).no_proxy().build()?;

        Ok(Self {
            http_proxy,
            http_no_proxy,
            no_proxy,
        })
    }

    pub fn get(&self, url: Url) -> RequestBuilder {
        let http = if self.bypass_proxy(&url) {
            &self.http_no_proxy
        } else {
            &self.http_proxy
        };

        http.get(url)
    }

    fn bypass_proxy(&self, url: &Url) -> bool {
        match url.host_str() {
            Some(host) => self.no_proxy.iter().any(|p| p.matches(host)),
            None => false,
        }
    }
}

fn parse_no_proxy(no_proxy: &str) -> Vec<Pattern> {
    no_proxy
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Pattern::new)
        .filter_map(|pattern| match pattern {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                warn!("Invalid pattern in NO_PROXY environment variable: {}", err);

                None
            }
        })
        .collect()
}
