//! IPv4 CIDR arithmetic for the IpRange controller
//!
//! Thin layer over `ipnet` providing the operations the reconciler needs:
//! strict parsing, overlap testing and deterministic power-of-two splitting
//! of an address block into per-zone sub-blocks.

use ipnet::Ipv4Net;
use thiserror::Error;

/// Errors from CIDR parsing and splitting
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CidrError {
    /// The text is not a valid IPv4 CIDR block
    #[error("invalid cidr {0:?}")]
    InvalidCidr(String),

    /// The block has too few host bits to yield one sub-block per zone
    #[error("cidr {cidr} can not be split into {zone_count} ranges")]
    CannotSplit {
        /// Block that was being split
        cidr: Ipv4Net,
        /// Requested number of sub-blocks
        zone_count: usize,
    },
}

/// Parses `text` as an IPv4 CIDR block.
///
/// Host bits must be zero: `10.0.0.0/24` is a block, `10.0.0.5/24` is an
/// interface address and is rejected.
pub fn parse(text: &str) -> Result<Ipv4Net, CidrError> {
    let net: Ipv4Net = text
        .parse()
        .map_err(|_| CidrError::InvalidCidr(text.to_string()))?;
    if net.addr() != net.network() {
        return Err(CidrError::InvalidCidr(text.to_string()));
    }
    Ok(net)
}

/// Structural equality of network address and prefix length.
pub fn equals(a: Ipv4Net, b: Ipv4Net) -> bool {
    a == b
}

/// True iff the address ranges of `a` and `b` intersect.
///
/// One block containing the other counts as overlap; adjacent blocks do not.
pub fn overlaps(a: Ipv4Net, b: Ipv4Net) -> bool {
    a.contains(&b.network()) || b.contains(&a.network())
}

/// Splits `block` into one sub-block per zone.
///
/// Extends the prefix so the block divides into the smallest power of two
/// >= `zone_count` equal sub-blocks, and returns the first `zone_count` of
/// them in ascending address order. The result is fully determined by
/// `(block, zone_count)`, which is what lets an interrupted reconciliation
/// re-derive the same layout.
pub fn split_for_zones(block: Ipv4Net, zone_count: usize) -> Result<Vec<Ipv4Net>, CidrError> {
    if zone_count == 0 {
        return Err(CidrError::CannotSplit {
            cidr: block,
            zone_count,
        });
    }
    let extra_bits = usize::BITS - (zone_count - 1).leading_zeros();
    let new_prefix = u32::from(block.prefix_len()) + extra_bits;
    if new_prefix > 32 {
        return Err(CidrError::CannotSplit {
            cidr: block,
            zone_count,
        });
    }
    let subnets = block
        .subnets(new_prefix as u8)
        .map_err(|_| CidrError::CannotSplit {
            cidr: block,
            zone_count,
        })?
        .take(zone_count)
        .collect::<Vec<_>>();
    Ok(subnets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> Ipv4Net {
        s.parse().unwrap()
    }

    #[test]
    fn parse_accepts_block() {
        assert_eq!(parse("10.0.0.0/24").unwrap(), net("10.0.0.0/24"));
        assert_eq!(parse("0.0.0.0/0").unwrap(), net("0.0.0.0/0"));
        assert_eq!(parse("10.1.2.3/32").unwrap(), net("10.1.2.3/32"));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(parse("not-a-cidr"), Err(CidrError::InvalidCidr(_))));
        assert!(matches!(parse("10.0.0.0"), Err(CidrError::InvalidCidr(_))));
        assert!(matches!(parse("10.0.0.0/33"), Err(CidrError::InvalidCidr(_))));
        // host bits set
        assert!(matches!(parse("10.0.0.5/24"), Err(CidrError::InvalidCidr(_))));
    }

    #[test]
    fn overlap_is_symmetric_and_reflexive() {
        let a = net("10.0.1.0/24");
        let b = net("10.0.1.128/25");
        assert!(overlaps(a, a));
        assert!(overlaps(a, b));
        assert!(overlaps(b, a));
    }

    #[test]
    fn adjacent_blocks_do_not_overlap() {
        let lo = net("10.0.0.0/25");
        let hi = net("10.0.0.128/25");
        assert!(!overlaps(lo, hi));
        assert!(!overlaps(hi, lo));
    }

    #[test]
    fn disjoint_ends_of_supernet_do_not_overlap() {
        // opposite ends of 10.0.0.0/16
        let first = net("10.0.0.0/24");
        let last = net("10.0.255.0/24");
        assert!(!overlaps(first, last));
    }

    #[test]
    fn split_three_zones_from_slash24() {
        // next power of two above 3 is 4, so /24 becomes four /26 and the
        // first three are kept
        let ranges = split_for_zones(net("10.0.0.0/24"), 3).unwrap();
        assert_eq!(
            ranges,
            vec![net("10.0.0.0/26"), net("10.0.0.64/26"), net("10.0.0.128/26")]
        );
    }

    #[test]
    fn split_single_zone_returns_block() {
        let ranges = split_for_zones(net("10.0.0.0/24"), 1).unwrap();
        assert_eq!(ranges, vec![net("10.0.0.0/24")]);
    }

    #[test]
    fn split_results_are_contained_and_disjoint() {
        let block = net("192.168.0.0/22");
        for count in 1..=16 {
            let ranges = split_for_zones(block, count).unwrap();
            assert_eq!(ranges.len(), count);
            for (i, r) in ranges.iter().enumerate() {
                assert!(block.contains(&r.network()));
                for other in &ranges[i + 1..] {
                    assert!(!overlaps(*r, *other));
                }
            }
        }
    }

    #[test]
    fn split_beyond_capacity_fails() {
        // a /32 holds one address, two sub-blocks are impossible
        assert!(matches!(
            split_for_zones(net("10.0.0.1/32"), 2),
            Err(CidrError::CannotSplit { zone_count: 2, .. })
        ));
        // /30 has 2 host bits, 8 sub-blocks would need 3
        assert!(matches!(
            split_for_zones(net("10.0.0.0/30"), 8),
            Err(CidrError::CannotSplit { .. })
        ));
    }

    #[test]
    fn split_zero_zones_fails() {
        assert!(matches!(
            split_for_zones(net("10.0.0.0/24"), 0),
            Err(CidrError::CannotSplit { zone_count: 0, .. })
        ));
    }
}
