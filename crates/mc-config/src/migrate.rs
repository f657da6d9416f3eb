//! Schema migration framework.

use crate::ConfigError;
use crate::schema::ControllerConfig;

pub const LATEST_VERSION: u32 = 1;

pub fn migrate_to_latest(mut config: ControllerConfig) -> Result<ControllerConfig, ConfigError> {
    while config.version < LATEST_VERSION {
        config = migrate_one_version(config)?;
    }
    Ok(config)
}

fn migrate_one_version(config: ControllerConfig) -> Result<ControllerConfig, ConfigError> {
    match config.version {
        0 => migrate_v0_to_v1(config),
        v => Err(ConfigError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

/// Version 0 files predate the status log; a zero interval there meant "unset".
fn migrate_v0_to_v1(mut config: ControllerConfig) -> Result<ControllerConfig, ConfigError> {
    if config.control.status_every_ticks == 0 {
        config.control.status_every_ticks = crate::schema::ControlDef::default().status_every_ticks;
    }
    config.version = 1;
    Ok(config)
}
