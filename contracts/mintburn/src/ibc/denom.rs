//! ICS-20 denomination traces.

/// A denom split into its `{port}/{channel}` hops and the base denom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DenomTrace {
    pub path: String,
    pub base_denom: String,
}

impl DenomTrace {
    pub fn is_native(&self) -> bool {
        self.path.is_empty()
    }
}

/// True when the token was first sent from this chain over the packet's
/// source port/channel, i.e. the denom carries that hop as its prefix.
pub fn receiver_chain_is_source(source_port: &str, source_channel: &str, denom: &str) -> bool {
    denom.starts_with(&format!("{source_port}/{source_channel}/"))
}

/// Splits leading `{port}/{channel-N}` pairs off a full denom. Whatever
/// follows the last pair, slashes included, is the base denom.
pub fn parse_denom_trace(raw: &str) -> DenomTrace {
    let parts: Vec<&str> = raw.split('/').collect();
    let mut hops = 0;
    while hops + 1 < parts.len()
        && !parts[hops].is_empty()
        && is_channel_id(parts[hops + 1])
    {
        hops += 2;
    }
    if hops >= parts.len() {
        // nothing left for a base denom; treat the whole string as native
        return DenomTrace {
            path: String::new(),
            base_denom: raw.to_string(),
        };
    }
    DenomTrace {
        path: parts[..hops].join("/"),
        base_denom: parts[hops..].join("/"),
    }
}

fn is_channel_id(s: &str) -> bool {
    s.strip_prefix("channel-")
        .map(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_prefix() {
        assert!(receiver_chain_is_source("transfer", "channel-0", "transfer/channel-0/umaany"));
        assert!(!receiver_chain_is_source("transfer", "channel-0", "umaany"));
        assert!(!receiver_chain_is_source("transfer", "channel-0", "transfer/channel-01/umaany"));
    }

    #[test]
    fn traces() {
        assert_eq!(
            parse_denom_trace("umaany"),
            DenomTrace {
                path: String::new(),
                base_denom: "umaany".to_string()
            }
        );
        assert_eq!(
            parse_denom_trace("transfer/channel-5/umaany"),
            DenomTrace {
                path: "transfer/channel-5".to_string(),
                base_denom: "umaany".to_string()
            }
        );
        assert_eq!(
            parse_denom_trace("transfer/channel-5/transfer/channel-9/gamm/pool/1"),
            DenomTrace {
                path: "transfer/channel-5/transfer/channel-9".to_string(),
                base_denom: "gamm/pool/1".to_string()
            }
        );
        assert!(parse_denom_trace("factory/maany1x/token").is_native());
        assert_eq!(parse_denom_trace("transfer/channel-5").base_denom, "transfer/channel-5");
    }
}
