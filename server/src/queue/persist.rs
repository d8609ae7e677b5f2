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

use std::fs::{rename, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer};

use super::{memory::Entry, Error, MemoryQueue};

/// Message as it is written to the queue snapshot. Receipts and visibility
/// do not survive a restart, every restored message is visible at once.
#[derive(Serialize, Deserialize)]
struct StoredMessage {
    body: String,

    #[serde(default)]
    receive_count: u32,
}

impl MemoryQueue {
    /// Appends the messages stored at `path`. A missing file is not an error.
    pub async fn load_file(&self, path: &Path) -> Result<usize, Error> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };

        let messages: Vec<StoredMessage> =
            from_reader(BufReader::new(file)).map_err(Error::InvalidSnapshot)?;
        let count = messages.len();

        let mut inner = self.0.lock().await;
        for StoredMessage {
            body,
            receive_count,
        } in messages
        {
            inner.entries.push(Entry {
                body,
                receipt: None,
                invisible_until: None,
                receive_count,
            });
        }

        Ok(count)
    }

    /// Writes all messages, including the ones currently in flight, to a
    /// temporary file next to `path` and moves it into place.
    pub async fn save_file(&self, path: &Path) -> Result<(), Error> {
        let tmp = path.with_extension("tmp");

        {
            let inner = self.0.lock().await;
            let messages = inner
                .entries
                .iter()
                .map(|entry| StoredMessage {
                    body: entry.body.clone(),
                    receive_count: entry.receive_count,
                })
                .collect::<Vec<_>>();

            let mut writer = BufWriter::new(File::create(&tmp)?);
            to_writer(&mut writer, &messages).map_err(Error::InvalidSnapshot)?;
            writer.flush()?;
        }

        rename(&tmp, path)?;

        Ok(())
    }
}
