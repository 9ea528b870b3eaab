// ── Parallel partition fetch ──
//
// Runs one request per partition with at most `MAX_IN_FLIGHT` in flight,
// pulls the `"aN": "value"` fragments out of each body, and aggregates
// them into a shared insert-only map keyed by request index. The first
// failure aborts the whole query: dropping the stream drops every
// outstanding request.

use std::future::Future;
use std::sync::{LazyLock, Mutex, PoisonError};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::{FutureExt, StreamExt, TryStreamExt, stream};
use regex::Regex;
use tracing::trace;

use super::partition::{Partition, QueryPlan};
use crate::error::Error;

/// Upper bound on concurrently outstanding partition requests.
pub const MAX_IN_FLIGHT: usize = 4;

/// Progress callback: `(values received, values requested)`.
pub type Progress = dyn Fn(usize, usize) + Send + Sync;

/// A progress callback borrowed for the duration of one query.
type ProgressRef<'a> = &'a (dyn Fn(usize, usize) + Send + Sync + 'a);

/// `query.lua` answers with JSON-ish text that is not always valid JSON,
/// so values are pulled out fragment by fragment.
static FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""a(\d+)":\s*"((?:[^"\\]|\\.)*)",?"#).expect("fragment pattern is valid")
});

/// Request index → raw value, filled concurrently by partition fetches.
#[derive(Debug, Default)]
pub struct ResultMap {
    values: DashMap<u32, String>,
}

impl ResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. Each index may only arrive once.
    pub fn insert(&self, index: u32, value: String) -> Result<(), Error> {
        match self.values.entry(index) {
            Entry::Occupied(_) => Err(Error::protocol(format!(
                "duplicate element a{index} in query response"
            ))),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn into_entries(self) -> impl Iterator<Item = (u32, String)> {
        self.values.into_iter()
    }
}

/// Forwards only forward progress, so late or repeated reports from
/// concurrently finishing partitions never move the counter backwards.
struct ProgressReporter<'a> {
    callback: Option<ProgressRef<'a>>,
    total: usize,
    delivered: Mutex<usize>,
}

impl<'a> ProgressReporter<'a> {
    fn new(callback: Option<ProgressRef<'a>>, total: usize) -> Self {
        Self {
            callback,
            total,
            delivered: Mutex::new(0),
        }
    }

    fn report(&self, count: usize) {
        let Some(callback) = self.callback else {
            return;
        };
        let mut delivered = self.delivered.lock().unwrap_or_else(PoisonError::into_inner);
        if count > *delivered {
            *delivered = count;
            callback(count, self.total);
        }
    }
}

/// Decode the escapes the router emits inside fragment values.
fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_owned();
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(e @ ('"' | '\\' | '/')) => out.push(e),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Extract every `"a<index>": "<value>"` fragment from a response body.
pub fn parse_fragments(body: &str) -> Result<Vec<(u32, String)>, Error> {
    FRAGMENT
        .captures_iter(body)
        .map(|caps| {
            let digits = &caps[1];
            let index = digits.parse::<u32>().map_err(|_| {
                Error::protocol(format!("unusable element index a{digits} in query response"))
            })?;
            Ok((index, unescape(&caps[2])))
        })
        .collect()
}

fn absorb(results: &ResultMap, reporter: &ProgressReporter<'_>, body: &str) -> Result<(), Error> {
    let fragments = parse_fragments(body)?;
    trace!(fragments = fragments.len(), "partition answered");
    for (index, value) in fragments {
        results.insert(index, value)?;
        reporter.report(results.len());
    }
    Ok(())
}

/// Fetch every partition of `plan` with bounded concurrency.
///
/// `fetch` performs the request for one partition and returns the body.
/// Completion order does not matter: values are keyed by request index.
pub async fn fetch_partitions<'p, F, Fut>(
    plan: &QueryPlan,
    progress: Option<ProgressRef<'p>>,
    fetch: F,
) -> Result<ResultMap, Error>
where
    F: Fn(&Partition) -> Fut + Sync,
    Fut: Future<Output = Result<String, Error>> + Send,
{
    let results = ResultMap::new();
    let reporter = ProgressReporter::new(progress, plan.total);

    let mut pending = stream::iter(&plan.partitions)
        .map(|partition| {
            let request = fetch(partition);
            let results = &results;
            let reporter = &reporter;
            async move {
                let body = request.await?;
                absorb(results, reporter, &body)
            }
            .boxed()
        })
        .buffer_unordered(MAX_IN_FLIGHT)
        .boxed();

    while pending.try_next().await?.is_some() {}
    drop(pending);

    Ok(results)
}
