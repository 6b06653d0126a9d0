use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use dosealert_models::settings::Settings;

pub fn load() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("appsettings").required(true))
        .add_source(File::with_name("appsettings.local").required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        );

    build(builder)
}

fn build(builder: ConfigBuilder<DefaultState>) -> Result<Settings, ConfigError> {
    builder.build()?.try_deserialize()
}
