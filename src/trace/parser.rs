//! Hop line parsing for the two trace-utility output dialects
//!
//! `tracert` (Windows) and `traceroute` (everything else) emit different
//! line grammars. The dialect is chosen once per session; after that every
//! raw line goes through the same contract: either it yields a [`Hop`] or
//! it is noise. A line the parser cannot make sense of is never an error.

use crate::trace::types::Hop;
use once_cell::sync::Lazy;
use regex::Regex;

/// Leading hop number at the start of a line.
static HOP_NUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)\s").expect("valid regex"));

/// One probe round-trip time token. Matches both `12 ms` and `<1 ms`.
static RTT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*ms").expect("valid regex"));

/// First dotted-decimal IPv4 address on the line.
static IPV4: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("valid regex"));

/// Output dialect of the trace utility, selected once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Windows `tracert` output.
    Tracert,
    /// Unix `traceroute` output.
    Traceroute,
}

impl Dialect {
    /// The dialect of the current platform's trace utility.
    pub fn for_platform() -> Self {
        if cfg!(windows) {
            Dialect::Tracert
        } else {
            Dialect::Traceroute
        }
    }

    /// Header and footer lines that carry no hop data.
    fn is_header(self, line: &str) -> bool {
        match self {
            Dialect::Tracert => {
                line.contains("Tracing route")
                    || line.contains("over a maximum")
                    || line.contains("Trace complete")
            }
            Dialect::Traceroute => line.contains("traceroute to"),
        }
    }
}

/// Parser for raw trace-utility output lines.
#[derive(Debug, Clone, Copy)]
pub struct HopLineParser {
    dialect: Dialect,
}

impl HopLineParser {
    /// Create a parser for the given dialect.
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// The dialect this parser was created for.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Parse one raw output line.
    ///
    /// Returns `Some(Hop)` for a hop data line (with the timeout sentinels
    /// when all probes went unanswered) and `None` for headers, noise, and
    /// anything that cannot confidently be read as a hop.
    pub fn parse_line(&self, line: &str) -> Option<Hop> {
        if line.trim().is_empty() || self.dialect.is_header(line) {
            return None;
        }

        let hop_num: u32 = HOP_NUM.captures(line)?.get(1)?.as_str().parse().ok()?;

        let rtts: Vec<f64> = RTT
            .captures_iter(line)
            .filter_map(|cap| cap.get(1)?.as_str().parse().ok())
            .collect();
        let avg_ms = if rtts.is_empty() {
            0.0
        } else {
            round2(rtts.iter().sum::<f64>() / rtts.len() as f64)
        };

        match IPV4.find(line) {
            Some(ip_match) => {
                let ip = ip_match.as_str().to_string();
                let host = host_token_before(line, ip_match.start(), &ip)
                    .unwrap_or_else(|| Hop::UNKNOWN_HOST.to_string());
                Some(Hop {
                    hop: hop_num,
                    host,
                    ip,
                    rtt_ms: avg_ms,
                })
            }
            None => {
                // No address on the line: only a `*` probe marker or an RTT
                // token makes this an all-timeout hop rather than noise, so
                // summary lines with a leading number never fabricate hops.
                if line.contains('*') || !rtts.is_empty() {
                    Some(Hop {
                        hop: hop_num,
                        host: Hop::TIMEOUT.to_string(),
                        ip: Hop::TIMEOUT.to_string(),
                        rtt_ms: avg_ms,
                    })
                } else {
                    None
                }
            }
        }
    }
}

/// The hostname token immediately preceding the IP, if it looks like one.
///
/// Both dialects print the name just before the address (`host (ip)` on
/// unix, `host [ip]` from tracert), possibly separated by an opening
/// bracket. RTT tokens, probe markers, and bare numbers never qualify.
fn host_token_before(line: &str, ip_start: usize, ip: &str) -> Option<String> {
    let mut tokens = line[..ip_start].split_whitespace().rev();
    let mut candidate = tokens.next()?.trim_matches(|c| c == '(' || c == '[');
    if candidate.is_empty() {
        // The bracket was its own token; the name is one back.
        candidate = tokens.next()?;
    }
    let bare = candidate.trim_start_matches('<');
    if candidate == ip
        || candidate == "ms"
        || candidate == "*"
        || bare.is_empty()
        || bare.chars().all(|c| c.is_ascii_digit() || c == '.')
    {
        return None;
    }
    Some(candidate.to_string())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracert() -> HopLineParser {
        HopLineParser::new(Dialect::Tracert)
    }

    fn traceroute() -> HopLineParser {
        HopLineParser::new(Dialect::Traceroute)
    }

    #[test]
    fn test_tracert_bare_ip_line() {
        let hop = tracert()
            .parse_line("  3  12 ms  14 ms  13 ms  93.184.216.34")
            .unwrap();
        assert_eq!(hop.hop, 3);
        assert_eq!(hop.ip, "93.184.216.34");
        assert_eq!(hop.rtt_ms, 13.0);
        // No name on the line and "ms" is not a hostname.
        assert_eq!(hop.host, Hop::UNKNOWN_HOST);
    }

    #[test]
    fn test_tracert_named_hop() {
        let hop = tracert()
            .parse_line("  2    10 ms     9 ms    12 ms  gw1.example.net [203.0.113.1]")
            .unwrap();
        assert_eq!(hop.hop, 2);
        assert_eq!(hop.host, "gw1.example.net");
        assert_eq!(hop.ip, "203.0.113.1");
        assert_eq!(hop.rtt_ms, 10.33);
    }

    #[test]
    fn test_tracert_sub_millisecond() {
        let hop = tracert()
            .parse_line("  1    <1 ms    <1 ms    <1 ms  192.168.1.1")
            .unwrap();
        assert_eq!(hop.hop, 1);
        assert_eq!(hop.ip, "192.168.1.1");
        assert_eq!(hop.rtt_ms, 1.0);
    }

    #[test]
    fn test_tracert_request_timed_out() {
        let hop = tracert()
            .parse_line("  5     *        *        *     Request timed out.")
            .unwrap();
        assert_eq!(hop.hop, 5);
        assert_eq!(hop.ip, Hop::TIMEOUT);
        assert_eq!(hop.host, Hop::TIMEOUT);
        assert_eq!(hop.rtt_ms, 0.0);
    }

    #[test]
    fn test_tracert_headers_ignored() {
        let parser = tracert();
        assert!(parser
            .parse_line("Tracing route to example.com [93.184.216.34]")
            .is_none());
        assert!(parser.parse_line("over a maximum of 20 hops:").is_none());
        assert!(parser.parse_line("Trace complete.").is_none());
    }

    #[test]
    fn test_traceroute_named_hop() {
        let hop = traceroute()
            .parse_line(" 1  router.local (192.168.1.1)  0.523 ms  0.610 ms  0.544 ms")
            .unwrap();
        assert_eq!(hop.hop, 1);
        assert_eq!(hop.host, "router.local");
        assert_eq!(hop.ip, "192.168.1.1");
        assert_eq!(hop.rtt_ms, 0.56);
    }

    #[test]
    fn test_traceroute_numeric_host_falls_back() {
        // With `-n` style output the first IPv4 on the line is the hop
        // address itself; nothing before it qualifies as a name.
        let hop = traceroute()
            .parse_line(" 4  93.184.216.34 (93.184.216.34)  11.372 ms")
            .unwrap();
        assert_eq!(hop.ip, "93.184.216.34");
        assert_eq!(hop.host, Hop::UNKNOWN_HOST);
        assert_eq!(hop.rtt_ms, 11.37);
    }

    #[test]
    fn test_traceroute_all_timeouts() {
        let hop = traceroute().parse_line(" 7  * * *").unwrap();
        assert_eq!(hop.hop, 7);
        assert_eq!(hop.ip, Hop::TIMEOUT);
        assert_eq!(hop.host, Hop::TIMEOUT);
        assert_eq!(hop.rtt_ms, 0.0);
    }

    #[test]
    fn test_traceroute_partial_timeouts() {
        let hop = traceroute()
            .parse_line(" 6  ae2.cr1.example.net (198.51.100.9)  24.1 ms  * 25.9 ms")
            .unwrap();
        assert_eq!(hop.host, "ae2.cr1.example.net");
        assert_eq!(hop.rtt_ms, 25.0);
    }

    #[test]
    fn test_traceroute_header_ignored() {
        assert!(traceroute()
            .parse_line("traceroute to example.com (93.184.216.34), 20 hops max, 60 byte packets")
            .is_none());
    }

    #[test]
    fn test_noise_lines_ignored() {
        let parser = traceroute();
        assert!(parser.parse_line("").is_none());
        assert!(parser.parse_line("   ").is_none());
        assert!(parser.parse_line("garbage with no structure").is_none());
        // Leading number but no probe marker, RTT, or address.
        assert!(parser.parse_line("20 hops probed in total").is_none());
    }

    #[test]
    fn test_malformed_lines_never_panic() {
        let parser = tracert();
        for line in [
            "999999999999999999999  * ",
            "1",
            "  1 ms",
            "* * *",
            "  3  12 ms 340282366920938463463374607431768211456 ms  1.2.3.4",
            "\u{0}\u{1}\u{2}",
        ] {
            // Either a hop or noise; both are acceptable for garbage.
            let _ = parser.parse_line(line);
        }
    }

    #[test]
    fn test_platform_dialect() {
        let dialect = Dialect::for_platform();
        if cfg!(windows) {
            assert_eq!(dialect, Dialect::Tracert);
        } else {
            assert_eq!(dialect, Dialect::Traceroute);
        }
    }
}
