//! Client-side `HttpSettings` (`spec.md` §6).
//!
//! Every field is an `Option`; `None` is the "unset" sentinel and
//! [`HttpSettings::merge`] leaves the current value alone when the
//! incoming settings don't specify one. There is no environment-variable or
//! on-disk configuration source — settings are constructed and merged
//! entirely in-process.

use std::collections::HashMap;
use std::time::Duration;

const DEFAULT_PIPELINE_LENGTH: u32 = 8;
const DEFAULT_TIMEOUT_MS: u32 = 30_000;
const DEFAULT_THREAD_POOL_SIZE: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct HttpSettings {
    pub url: Option<String>,
    pub headers: Option<HashMap<String, String>>,
    pub pipeline_length: Option<u32>,
    pub timeout_ms: Option<u32>,
    pub time_to_live_ms: Option<u32>,
    pub thread_pool_size: Option<usize>,
}

impl HttpSettings {
    /// Overlays `other`'s set fields onto `self`, leaving unset fields as
    /// they were.
    pub fn merge(mut self, other: HttpSettings) -> Self {
        if other.url.is_some() {
            self.url = other.url;
        }
        if other.headers.is_some() {
            self.headers = other.headers;
        }
        if other.pipeline_length.is_some() {
            self.pipeline_length = other.pipeline_length;
        }
        if other.timeout_ms.is_some() {
            self.timeout_ms = other.timeout_ms;
        }
        if other.time_to_live_ms.is_some() {
            self.time_to_live_ms = other.time_to_live_ms;
        }
        if other.thread_pool_size.is_some() {
            self.thread_pool_size = other.thread_pool_size;
        }
        self
    }

    pub fn url_or_default(&self) -> &str {
        self.url.as_deref().unwrap_or("")
    }

    pub fn headers_or_default(&self) -> HashMap<String, String> {
        self.headers.clone().unwrap_or_default()
    }

    pub fn pipeline_length_or_default(&self) -> u32 {
        self.pipeline_length.unwrap_or(DEFAULT_PIPELINE_LENGTH)
    }

    pub fn timeout_or_default(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS) as u64)
    }

    pub fn time_to_live(&self) -> Option<Duration> {
        self.time_to_live_ms.map(|ms| Duration::from_millis(ms as u64))
    }

    pub fn thread_pool_size_or_default(&self) -> usize {
        self.thread_pool_size.unwrap_or(DEFAULT_THREAD_POOL_SIZE)
    }
}
