//! Server-side `HttpSettings` (`spec.md` §6), mirroring the client's
//! `Option<T>` + [`HttpSettings::merge`] pattern.

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_MS: u32 = 30_000;
const DEFAULT_THREAD_POOL_SIZE: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct HttpSettings {
    pub port: Option<u16>,
    pub timeout_ms: Option<u32>,
    pub thread_pool_size: Option<usize>,
}

impl HttpSettings {
    pub fn merge(mut self, other: HttpSettings) -> Self {
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.timeout_ms.is_some() {
            self.timeout_ms = other.timeout_ms;
        }
        if other.thread_pool_size.is_some() {
            self.thread_pool_size = other.thread_pool_size;
        }
        self
    }

    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn timeout_ms_or_default(&self) -> u32 {
        self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)
    }

    pub fn thread_pool_size_or_default(&self) -> usize {
        self.thread_pool_size.unwrap_or(DEFAULT_THREAD_POOL_SIZE)
    }
}
