use super::Settings;
use crate::error::FetchPrepError;
use config::Config as ConfigBuilder;

pub fn load_settings(config_path: &str) -> Result<Settings, FetchPrepError> {
    let config_builder = ConfigBuilder::builder()
        .add_source(config::File::with_name(config_path))
        .build()?;

    config_builder.try_deserialize().map_err(Into::into)
}
