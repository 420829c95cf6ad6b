mod settings;

pub use settings::{
    ApiConfig, DatabaseConfig, DispatchConfig, OtelConfig, RedisConfig, ServerConfig, Settings,
    StoreConfig, VapidConfig,
};
