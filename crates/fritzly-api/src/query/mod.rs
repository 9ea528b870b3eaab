// Bulk status queries
//
// `GET /query.lua?sid=..&a0=<cmd>&a1=<cmd>...` resolves many named values
// in one round trip. Large queries are split into URL-sized partitions
// (`partition`), fetched in parallel (`fetch`), and put back into request
// order (`sequence`).

mod fetch;
mod partition;
mod sequence;

pub use fetch::{MAX_IN_FLIGHT, Progress, ResultMap, fetch_partitions, parse_fragments};
pub use partition::{DEFAULT_MAX_URL_LENGTH, Partition, QueryCommand, QueryPlan, partition};
pub use sequence::sequence;

use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Error;
use crate::session::Session;
use crate::transport;

const QUERY_PATH: &str = "/query.lua";

impl Session {
    /// Resolve `commands` to their current values, in request order.
    ///
    /// Everything that can be checked locally (cancellation, partition
    /// sizes) is checked before the first request goes out. Either every
    /// value arrives or the whole query fails; partial results are
    /// discarded.
    pub async fn query<S: AsRef<str>>(
        &self,
        commands: &[S],
        progress: Option<&Progress>,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, Error> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let prefix = self.endpoint_with_sid(QUERY_PATH)?;
        let plan = partition(commands, prefix.as_str(), self.options().max_url_length)?;
        if plan.total == 0 {
            return Ok(Vec::new());
        }

        self.force_session(cancel).await?;

        debug!(
            partitions = plan.partitions.len(),
            total = plan.total,
            "dispatching query"
        );

        let fetch = fetch_partitions(&plan, progress, |partition| {
            let request = self.partition_request(partition);
            async move {
                let body = transport::send_text(request?, cancel).await?;
                self.touch();
                Ok(body)
            }
            .boxed()
        });
        let results = transport::cancellable(cancel, fetch).await?;

        sequence(results, plan.total)
    }

    fn partition_request(&self, partition: &Partition) -> Result<reqwest::RequestBuilder, Error> {
        let mut url = self.endpoint_with_sid(QUERY_PATH)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, command) in partition.pairs() {
                pairs.append_pair(&key, command);
            }
        }
        debug!(%url, items = partition.len(), "fetching partition");
        Ok(self.http().get(url))
    }
}
