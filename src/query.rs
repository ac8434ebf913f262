//! Single-query execution and response interpretation.
//!
//! Sends one question to one server and classifies what came back:
//! a direct address, an alias to chase, or a referral to better-placed
//! name servers. Glue addresses from the additional section go straight
//! into the cache as a side effect, whether or not the overall resolve
//! later succeeds.

use std::net::Ipv4Addr;

use tracing::{debug, trace};

use crate::cache::Cache;
use crate::dns::{self, RecordData, RecordKind, Response, TYPE_A, TYPE_CNAME};
use crate::error::{Error, Result};
use crate::transport::UdpClient;

/// What one query step produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Terminal result. `None` means the server answered cleanly but had
    /// no address data for the name.
    Answer(Option<Ipv4Addr>),
    /// A CNAME: resolution restarts from the root with this target.
    Alias(String),
    /// Name-server hostnames from the authority section, to try next.
    Referral(Vec<String>),
}

/// Executes one query at a time over a shared [`UdpClient`].
pub struct Executor {
    client: UdpClient,
}

impl Executor {
    pub fn new(client: UdpClient) -> Self {
        Self { client }
    }

    /// Ask `server` about `target` and interpret the response.
    ///
    /// Every A record in the additional section is offered to the cache
    /// keyed by its owner name; the insert itself is first-write-wins,
    /// so repeated glue is harmless.
    pub async fn query(
        &self,
        cache: &mut Cache,
        target: &str,
        server: Ipv4Addr,
        kind: RecordKind,
    ) -> Result<Outcome> {
        let (payload, id) = dns::build_query(target, kind);
        debug!(%target, %server, ?kind, id, "sending query");

        let bytes = self.client.exchange(&payload, server).await?;
        let response = Response::parse(&bytes)?;

        if response.id != id {
            return Err(Error::TransactionMismatch);
        }
        if response.rcode != 0 {
            return Err(Error::QueryFailed(response.rcode));
        }

        // First A wins; a CNAME only counts while nothing better has
        // been seen.
        let mut address = None;
        let mut alias = None;
        for record in &response.answers {
            match (&record.data, record.rtype) {
                (RecordData::Addr(addr), TYPE_A) if address.is_none() => {
                    address = Some(*addr);
                }
                (RecordData::Name(name), TYPE_CNAME)
                    if address.is_none() && alias.is_none() =>
                {
                    alias = Some(name.clone());
                }
                _ => {}
            }
        }

        for record in &response.additionals {
            if let (RecordData::Addr(addr), TYPE_A) = (&record.data, record.rtype) {
                trace!(name = %record.name, %addr, "caching glue record");
                cache.insert(&record.name, *addr, target);
            }
        }

        if address.is_some() {
            return Ok(Outcome::Answer(address));
        }
        if let Some(alias) = alias {
            return Ok(Outcome::Alias(alias));
        }
        // No answer records and nothing authoritative to follow: a clean
        // "no data" reply, distinct from both alias and referral.
        if response.authorities.is_empty() {
            return Ok(Outcome::Answer(None));
        }

        let servers = response
            .authorities
            .iter()
            .filter_map(|record| match &record.data {
                RecordData::Name(name) => Some(name.clone()),
                _ => None,
            })
            .collect();
        Ok(Outcome::Referral(servers))
    }
}
