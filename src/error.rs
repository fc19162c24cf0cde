#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    YAML(#[from] serde_yaml::Error),
    #[error(transparent)]
    JSON(#[from] serde_json::Error),
    #[error(transparent)]
    TOML(#[from] toml::de::Error),
    #[error(transparent)]
    Regex(#[from] regex::Error),
    #[error(transparent)]
    FancyRegex(#[from] fancy_regex::Error),
    /// The backend module was never registered (the "not installed" case).
    #[error("{0} is not installed")]
    BackendMissing(String),
    /// The module is registered but none of the adapter's probes resolved.
    #[error("{0} exposes no usable parse entry point")]
    NoEntryPoint(String),
    #[error("no user agents provided: populate the inline list or create {0}")]
    NoInput(String),
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
