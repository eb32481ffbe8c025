//! DNS lookups from the channel.

use std::net::IpAddr;
use std::str::FromStr;
use std::sync::RwLock;

use hickory_resolver::config::{NameServerConfigGroup, ResolveHosts, ResolverConfig, ResolverOpts};
use hickory_resolver::lookup::Lookup;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::rr::RecordType;
use hickory_resolver::{Resolver, TokioResolver};
use tracing::debug;

use crate::plugin::prelude::*;

pub struct Dig {
    command: Trigger,
    /// Resolver built from the `dig.name_servers` setting; `None` falls back to the shared
    /// resolver.
    resolver: RwLock<Option<TokioResolver>>,
}

const SETTINGS: &[Setting] = &[Setting {
    name: "name_servers",
    default: "",
    description: "comma-separated nameserver addresses, empty for the default resolver",
}];

#[async_trait]
impl Plugin for Dig {
    fn name() -> Name {
        Name::from("dig")
    }

    fn author() -> Author {
        Author::from("Mikkel Kroman <mk@maero.dk>")
    }

    fn version() -> Version {
        Version::from("0.2")
    }

    fn settings() -> &'static [Setting] {
        SETTINGS
    }

    fn new(ctx: &Context) -> Self {
        Dig {
            command: Trigger::new(".dig"),
            resolver: RwLock::new(configured_resolver(ctx)),
        }
    }

    async fn handle_message(
        &self,
        ctx: &Context,
        client: &Client,
        message: &Message,
    ) -> Result<(), IotaError> {
        if let Command::PRIVMSG(ref channel, ref text) = message.command
            && let Some(args) = self.command.parse(text)
        {
            let mut words = args.words();
            let Some(name) = words.next() else {
                client.send_privmsg(channel, "\x0310> Usage: .dig\x0f <name> [type]")?;
                return Ok(());
            };

            let record_type = match words.next() {
                Some(word) => match parse_record_type(word) {
                    Some(record_type) => record_type,
                    None => {
                        client.send_privmsg(
                            channel,
                            format!("\x0310> Invalid record type\x0f {word}"),
                        )?;
                        return Ok(());
                    }
                },
                None => RecordType::A,
            };

            let resolver = {
                let custom = self.resolver.read().expect("resolver lock poisoned");

                custom.clone().unwrap_or_else(|| ctx.dns.clone())
            };

            match resolver.lookup(name, record_type).await {
                Ok(lookup) => {
                    for line in format_records(&lookup) {
                        client.send_privmsg(channel, format!("\x0310>\x0f\x02 Dig:\x02\x0310 {line}"))?;
                    }
                }
                Err(err) => {
                    client.send_privmsg(channel, format!("\x0310>\x0f\x02 Dig:\x02\x0310 {err}"))?;
                }
            }
        }

        Ok(())
    }

    async fn handle_config_change(
        &self,
        ctx: &Context,
        _client: &Client,
        name: &str,
    ) -> Result<(), IotaError> {
        if name == "dig.name_servers" {
            debug!("nameserver setting changed, rebuilding resolver");

            let rebuilt = configured_resolver(ctx);
            *self.resolver.write().expect("resolver lock poisoned") = rebuilt;
        }

        Ok(())
    }
}

/// Builds a resolver from the `dig.name_servers` setting, if any addresses are configured.
fn configured_resolver(ctx: &Context) -> Option<TokioResolver> {
    let servers: Vec<IpAddr> = ctx
        .settings
        .list_value("dig.name_servers")
        .iter()
        .filter_map(|address| address.parse().ok())
        .collect();

    if servers.is_empty() {
        return None;
    }

    debug!(name_servers = ?servers, "using configured nameservers");

    let group = NameServerConfigGroup::from_ips_clear(&servers, 53, true);
    let config = ResolverConfig::from_parts(None, vec![], group);
    let mut opts = ResolverOpts::default();
    opts.use_hosts_file = ResolveHosts::Never;

    let resolver = Resolver::builder_with_config(config, TokioConnectionProvider::default())
        .with_options(opts)
        .build();

    Some(resolver)
}

/// Parses a record type name such as `mx`, ignoring case.
fn parse_record_type(s: &str) -> Option<RecordType> {
    RecordType::from_str(&s.to_uppercase()).ok()
}

/// Formats lookup records as aligned `name ttl class type data` columns.
fn format_records(lookup: &Lookup) -> Vec<String> {
    lookup
        .record_iter()
        .map(|record| {
            let name = record.name().to_string();
            let ttl = record.ttl().to_string();
            let dns_class = record.dns_class().to_string();
            let record_type = record.record_type().to_string();
            let data = record.data();

            format!("{name:<25} {ttl:<7} {dns_class:<4} {record_type:<6} {data}")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_parse_record_types() {
        assert_eq!(parse_record_type("a"), Some(RecordType::A));
        assert_eq!(parse_record_type("MX"), Some(RecordType::MX));
        assert_eq!(parse_record_type("aaaa"), Some(RecordType::AAAA));
        assert_eq!(parse_record_type("bogus"), None);
    }
}
