//! Process-wide HTTP fetch client shared by every HTTP archive.

use std::io;
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::time::Duration;

pub use reqwest::Url;

/// Concurrent fetches allowed when nothing else was configured.
pub const DEFAULT_CONCURRENCY: usize = 4;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

static SHARED: OnceLock<Arc<FetchClient>> = OnceLock::new();

/// Completed fetch: status code and whole body.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    #[inline(always)]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can download a URL in one go.
///
/// Errors are transport failures only; HTTP error statuses come back as a
/// response.
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &Url) -> io::Result<FetchResponse>;
}

/// Counting gate bounding the number of fetches in flight.
#[derive(Debug)]
struct Slots {
    free: Mutex<usize>,
    freed: Condvar,
}

struct SlotGuard<'a>(&'a Slots);

impl Slots {
    fn new(count: usize) -> Slots {
        Slots {
            free: Mutex::new(count.max(1)),
            freed: Condvar::new(),
        }
    }

    fn acquire(&self) -> SlotGuard<'_> {
        let mut free = self.free.lock().unwrap_or_else(|e| e.into_inner());
        while *free == 0 {
            free = self.freed.wait(free).unwrap_or_else(|e| e.into_inner());
        }
        *free -= 1;
        SlotGuard(self)
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        let mut free = self.0.free.lock().unwrap_or_else(|e| e.into_inner());
        *free += 1;
        self.0.freed.notify_one();
    }
}

/// Blocking HTTP client with a fixed number of concurrent fetches. Callers
/// beyond that number wait for a slot.
#[derive(Debug)]
pub struct FetchClient {
    client: reqwest::blocking::Client,
    concurrency: usize,
    slots: Slots,
}

impl FetchClient {
    pub fn new(concurrency: usize) -> io::Result<FetchClient> {
        let client = reqwest::blocking::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .pool_max_idle_per_host(concurrency)
            .build()
            .map_err(io::Error::other)?;

        Ok(FetchClient {
            client,
            concurrency,
            slots: Slots::new(concurrency),
        })
    }

    #[inline(always)]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }
}

impl Fetch for FetchClient {
    fn fetch(&self, url: &Url) -> io::Result<FetchResponse> {
        let _slot = self.slots.acquire();
        tracing::trace!(%url, "fetching");

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(io::Error::other)?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(io::Error::other)?.to_vec();

        Ok(FetchResponse { status, body })
    }
}

/// Sets the concurrency of the shared client. Only possible before the
/// shared client was first used.
pub fn configure(concurrency: usize) -> io::Result<()> {
    let client = Arc::new(FetchClient::new(concurrency)?);
    SHARED.set(client).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "shared fetch client is already initialized",
        )
    })
}

/// The process-wide client, created with [`DEFAULT_CONCURRENCY`] on first use.
pub fn shared() -> io::Result<Arc<FetchClient>> {
    if let Some(client) = SHARED.get() {
        return Ok(client.clone());
    }

    let client = Arc::new(FetchClient::new(DEFAULT_CONCURRENCY)?);
    Ok(SHARED.get_or_init(|| client).clone())
}
