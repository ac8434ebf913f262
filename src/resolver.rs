//! The iterative resolution state machine.
//!
//! One walk per name: start at the root (or wherever the cache lets us
//! jump in), follow referrals downward, restart from the top when an
//! alias appears, and stop on an address, an explicit no-data reply, or
//! a failure. Candidates within a hop are tried strictly in order and
//! the first timeout abandons the whole resolve, matching the behavior
//! existing deployments depend on.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::Cache;
use crate::dns::RecordKind;
use crate::domain;
use crate::error::{Error, Result, MAX_ALIAS_RESTARTS};
use crate::query::{Executor, Outcome};
use crate::transport::{DNS_PORT, UdpClient};

/// ICANN root server (l.root-servers.net). Any of the 13 roots listed
/// at <https://www.iana.org/domains/root/servers> would do.
pub const ROOT_SERVER: Ipv4Addr = Ipv4Addr::new(199, 7, 83, 42);

/// Per-query receive deadline in the reference configuration.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Resolver configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server every fresh walk starts from.
    pub root: Ipv4Addr,
    /// Destination UDP port (53 outside of tests).
    pub port: u16,
    /// Per-query receive deadline.
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: ROOT_SERVER,
            port: DNS_PORT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// How one walk attempt ended.
enum Walk {
    Done(Option<Ipv4Addr>),
    Alias(String),
}

/// Iterative resolver owning the session cache and the UDP client.
pub struct Resolver {
    cache: Cache,
    executor: Executor,
    root: Ipv4Addr,
}

impl Resolver {
    /// Bind the outbound socket and set up an empty cache.
    pub async fn new(config: Config) -> Result<Self> {
        let client = UdpClient::bind(config.port, config.timeout).await?;
        Ok(Self {
            cache: Cache::new(),
            executor: Executor::new(client),
            root: config.root,
        })
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut Cache {
        &mut self.cache
    }

    /// Resolve `name` to an IPv4 address.
    ///
    /// `Ok(None)` means a server answered authoritatively but had no
    /// address data. Aliases restart the walk from the root with the new
    /// target; the answer is cached and reported under the name that was
    /// originally asked for, however long the CNAME chain was. The chain
    /// is bounded so an alias cycle fails instead of looping forever.
    pub async fn resolve(&mut self, name: &str) -> Result<Option<Ipv4Addr>> {
        let mut current = name.to_string();

        for _ in 0..=MAX_ALIAS_RESTARTS {
            match self.walk(&current, name).await? {
                Walk::Done(address) => return Ok(address),
                Walk::Alias(target) => {
                    info!(alias = %target, "discovered alias, returning to root");
                    current = target;
                }
            }
        }

        Err(Error::AliasLoop)
    }

    /// One pass of the state machine for `domain`.
    ///
    /// `record_as` is the originally requested name; a terminal address
    /// is cached under it even when `domain` is an alias target.
    async fn walk(&mut self, domain: &str, record_as: &str) -> Result<Walk> {
        let targets = domain::substrings(domain);
        let last = targets.len() - 1;

        // Full-name hit short-circuits the entire walk.
        if let Some(address) = self.cache.lookup(domain) {
            info!(%domain, %address, "answer from cache");
            return Ok(Walk::Done(Some(address)));
        }

        // A server learned while resolving one of our targets lets the
        // walk start below the root, most specific match first.
        let mut step = 0;
        let mut candidates: Vec<String> = Vec::new();
        for (seed_step, target) in [(2usize, targets.get(1)), (1usize, targets.first())] {
            let Some(target) = target else { continue };
            if let Some(entry) = self.cache.server_for(target) {
                debug!(server = %entry.name, %target, "consulting cached server");
                candidates = vec![entry.address.to_string()];
                step = seed_step;
                break;
            }
        }

        loop {
            // The step index never runs past the final target: a
            // referral on the last hop re-asks the new servers for the
            // same full name.
            let index = step.min(last);
            let target = &targets[index];
            let kind = if index == last {
                RecordKind::A
            } else {
                RecordKind::Ns
            };

            if step == 0 {
                debug!(%target, "consulting root server");
                let outcome = self
                    .executor
                    .query(&mut self.cache, target, self.root, kind)
                    .await?;

                match outcome {
                    Outcome::Referral(servers) if last > 0 => {
                        if servers.is_empty() {
                            return Err(Error::NoAnswer);
                        }
                        candidates = servers;
                        step = 1;
                    }
                    // Single-label walks end in one hop; an answer from
                    // the root is terminal either way.
                    Outcome::Referral(_) => return Err(Error::NoAnswer),
                    Outcome::Answer(address) => return Ok(Walk::Done(address)),
                    Outcome::Alias(alias) => return Ok(Walk::Alias(alias)),
                }
                continue;
            }

            if candidates.is_empty() {
                return Err(Error::NoResponse);
            }

            let mut result = None;
            for server in &candidates {
                let address = self.server_address(server).await?;
                debug!(%server, %address, %target, "consulting server");
                match self
                    .executor
                    .query(&mut self.cache, target, address, kind)
                    .await
                {
                    Ok(outcome) => {
                        result = Some(outcome);
                        break;
                    }
                    // A timeout mid-hop abandons the resolve; remaining
                    // candidates are not tried. Glue already cached from
                    // earlier hops is kept.
                    Err(Error::Timeout) => {
                        debug!(%server, "server timed out");
                        return Err(Error::Timeout);
                    }
                    Err(other) => return Err(other),
                }
            }
            let Some(outcome) = result else {
                return Err(Error::NoResponse);
            };

            match outcome {
                Outcome::Answer(address) => {
                    if let Some(address) = address {
                        self.cache.insert(record_as, address, record_as);
                        info!(name = %record_as, %address, "resolved");
                    }
                    return Ok(Walk::Done(address));
                }
                Outcome::Alias(alias) => return Ok(Walk::Alias(alias)),
                Outcome::Referral(servers) => {
                    if servers.is_empty() {
                        return Err(Error::NoAnswer);
                    }
                    candidates = servers;
                    if step < last {
                        step += 1;
                    }
                }
            }
        }
    }

    /// Turn a candidate (IPv4 literal or NS hostname) into an address.
    ///
    /// Hostnames are satisfied from cached glue first; only when no glue
    /// was bundled does the system resolver get involved.
    async fn server_address(&self, server: &str) -> Result<Ipv4Addr> {
        if let Ok(address) = server.parse::<Ipv4Addr>() {
            return Ok(address);
        }

        let host = server.strip_suffix('.').unwrap_or(server);
        if let Some(address) = self.cache.lookup(host) {
            return Ok(address);
        }

        let addrs = tokio::net::lookup_host((host, DNS_PORT))
            .await
            .map_err(|_| Error::BadServer(server.to_string()))?;
        for addr in addrs {
            if let SocketAddr::V4(v4) = addr {
                return Ok(*v4.ip());
            }
        }
        Err(Error::BadServer(server.to_string()))
    }
}
