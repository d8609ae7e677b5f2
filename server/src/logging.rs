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

use std::path::Path;

use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    file::Deserializers,
    init_config, load_config_file,
};

use crate::error::Error;

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {h({l:5})} [{M}] {m}{n}";

/// Loads the log4rs configuration from `config`. If the file is missing or
/// invalid, a console logger with the given level is installed.
pub fn init_logger(config: &Path, level: LevelFilter) -> Result<(), Error> {
    let config = load_config_file(config, Deserializers::default())
        .or_else(|_| create_default_config(level))?;

    init_config(config)?;

    Ok(())
}

fn create_default_config(level: LevelFilter) -> Result<Config, Error> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))?;

    Ok(config)
}
