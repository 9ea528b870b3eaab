// ── Query partitioning ──
//
// `query.lua` takes its commands as URL arguments, and the router drops
// requests whose URL grows past a fixed length. Commands are numbered in
// request order and packed greedily into batches that stay under the
// byte budget.

use url::form_urlencoded;

use crate::error::Error;

/// Classic browser URL limit the router's web server enforces.
pub const DEFAULT_MAX_URL_LENGTH: usize = 2083;

/// One command plus its position in the original request.
///
/// The index doubles as the correlation key: the router echoes it back
/// as `"a<index>"` in its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCommand {
    pub index: u32,
    pub command: String,
}

impl QueryCommand {
    /// The URL argument name for this command, e.g. `a3`.
    pub fn key(&self) -> String {
        format!("a{}", self.index)
    }
}

/// An ordered batch of commands sent in a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    items: Vec<QueryCommand>,
    encoded_len: usize,
}

impl Partition {
    fn seeded(prefix_len: usize) -> Self {
        Self {
            items: Vec::new(),
            encoded_len: prefix_len,
        }
    }

    pub fn items(&self) -> &[QueryCommand] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Length of the full request URL this partition produces.
    pub fn encoded_len(&self) -> usize {
        self.encoded_len
    }

    /// `(a<index>, command)` pairs in request order.
    pub fn pairs(&self) -> impl Iterator<Item = (String, &str)> {
        self.items.iter().map(|q| (q.key(), q.command.as_str()))
    }
}

/// The partitioned form of a query.
#[derive(Debug, Clone, Default)]
pub struct QueryPlan {
    pub partitions: Vec<Partition>,
    /// Number of commands across all partitions.
    pub total: usize,
}

/// Bytes `&a<index>=<command>` adds to a URL.
fn encoded_item_len(key: &str, command: &str) -> usize {
    let value: usize = form_urlencoded::byte_serialize(command.as_bytes())
        .map(str::len)
        .sum();
    1 + key.len() + 1 + value
}

/// Split `commands` into batches whose URL stays below `budget` bytes.
///
/// `prefix` is the request URL before any command argument
/// (`http://host/query.lua?sid=...`); every batch starts from it. A command
/// that cannot fit even into an empty batch is an error, not a batch of
/// its own.
pub fn partition<S: AsRef<str>>(
    commands: &[S],
    prefix: &str,
    budget: usize,
) -> Result<QueryPlan, Error> {
    let mut partitions = Vec::new();
    let mut current = Partition::seeded(prefix.len());

    for (position, command) in commands.iter().enumerate() {
        let index = u32::try_from(position)
            .map_err(|_| Error::protocol("too many query commands"))?;
        let item = QueryCommand {
            index,
            command: command.as_ref().to_owned(),
        };
        let item_len = encoded_item_len(&item.key(), &item.command);

        if current.encoded_len + item_len >= budget {
            if !current.is_empty() {
                let full = std::mem::replace(&mut current, Partition::seeded(prefix.len()));
                partitions.push(full);
            }
            if current.encoded_len + item_len >= budget {
                return Err(Error::ItemTooLong {
                    index,
                    length: current.encoded_len + item_len,
                    limit: budget,
                });
            }
        }

        current.encoded_len += item_len;
        current.items.push(item);
    }

    if !current.is_empty() {
        partitions.push(current);
    }

    Ok(QueryPlan {
        partitions,
        total: commands.len(),
    })
}
