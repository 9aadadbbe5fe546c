//! DNS helpers
// (c) 2026 The rfetch developers

use std::net::IpAddr;

use super::AddressFamily;
use crate::client::ConnectionError;

/// DNS lookup helper
///
/// Results can be restricted to a given address family.
/// Only the first matching result is returned.
/// If there are no matching records of the required type, returns an error.
///
/// Literal IP addresses are accepted without a lookup, subject to the same family check.
///
/// This call blocks; async callers should use [`tokio::task::spawn_blocking`].
pub(crate) fn lookup_host_by_family(
    host: &str,
    desired: AddressFamily,
) -> Result<IpAddr, ConnectionError> {
    let no_address = || ConnectionError::NoAddress {
        host: host.to_owned(),
        family: desired,
    };
    if let Ok(literal) = host.parse::<IpAddr>() {
        return if desired.matches(&literal) {
            Ok(literal)
        } else {
            Err(no_address())
        };
    }
    let candidates = dns_lookup::lookup_host(host).map_err(|source| ConnectionError::Lookup {
        host: host.to_owned(),
        source,
    })?;
    candidates
        .into_iter()
        .find(|addr| desired.matches(addr))
        .ok_or_else(no_address)
}
