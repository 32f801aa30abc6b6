use std::sync::Arc;

use crate::config::Config;

pub trait Services {
    fn config(&self) -> Arc<Config>;
    fn http(&self) -> reqwest::Client;
}

#[derive(Clone)]
pub struct ServicesContainer {
    pub config: Arc<Config>,
    pub client: reqwest::Client,
}

impl ServicesContainer {
    pub fn new(config: Config) -> Result<Self, human_errors::Error> {
        let client = crate::http::build_client(&config.http)?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }
}

#[cfg(test)]
impl ServicesContainer {
    /// Services pointed at a mock API with throttling turned off.
    pub fn new_mock(api_url: impl ToString) -> Result<Self, human_errors::Error> {
        let mut config = Config::default();
        config.api.base_url = api_url.to_string();
        config.throttle = crate::config::ThrottleConfig::disabled();
        Self::new(config)
    }
}

impl Services for ServicesContainer {
    fn config(&self) -> Arc<Config> {
        self.config.clone()
    }

    fn http(&self) -> reqwest::Client {
        self.client.clone()
    }
}
