use super::{labels, Probe, ProbeSet};

/// Network exposure: listening sockets and established connections
pub struct NetworkProbes;

impl ProbeSet for NetworkProbes {
    fn category(&self) -> &'static str {
        "network"
    }

    fn probes(&self) -> Vec<Probe> {
        let category = self.category();
        vec![
            // ss is preferred, netstat is the fallback
            Probe::new(
                labels::LISTENING,
                category,
                "ss -tuln 2>/dev/null || netstat -tuln 2>/dev/null || echo 'Neither ss nor netstat available'",
            ),
            Probe::new(
                labels::CONNECTIONS,
                category,
                "(ss -tun state established 2>/dev/null || netstat -tun 2>/dev/null | grep ESTABLISHED) | head -n 25; true",
            ),
        ]
    }
}

/// Extract the local port from one line of `ss -tuln` or `netstat -tuln`.
///
/// The local address is the first column shaped like `addr:port` with a
/// numeric port; peer columns (`0.0.0.0:*`) and headers never qualify.
pub fn parse_local_port(line: &str) -> Option<u16> {
    let proto = line.split_whitespace().next()?;
    if !(proto.starts_with("tcp") || proto.starts_with("udp")) {
        return None;
    }

    line.split_whitespace().skip(1).find_map(parse_address_port)
}

fn parse_address_port(addr: &str) -> Option<u16> {
    let port_str = if addr.starts_with('[') {
        // IPv6: [::]:22 or [::1]:22
        addr.rsplit_once("]:")?.1
    } else {
        // IPv4 or ss's IPv6 without brackets: 0.0.0.0:22, *:22, :::22
        addr.rsplit_once(':')?.1
    };

    port_str.parse().ok()
}

/// Try to identify common services by port number
pub fn identify_service(port: u16) -> Option<&'static str> {
    match port {
        20 => Some("FTP-DATA"),
        21 => Some("FTP"),
        22 => Some("SSH"),
        23 => Some("Telnet"),
        25 => Some("SMTP"),
        53 => Some("DNS"),
        80 => Some("HTTP"),
        110 => Some("POP3"),
        111 => Some("RPC"),
        139 => Some("NetBIOS"),
        143 => Some("IMAP"),
        443 => Some("HTTPS"),
        445 => Some("SMB"),
        631 => Some("CUPS/IPP"),
        993 => Some("IMAPS"),
        995 => Some("POP3S"),
        2049 => Some("NFS"),
        3306 => Some("MySQL"),
        3389 => Some("RDP"),
        5432 => Some("PostgreSQL"),
        5900 => Some("VNC"),
        6379 => Some("Redis"),
        8080 => Some("HTTP-Alt"),
        8443 => Some("HTTPS-Alt"),
        27017 => Some("MongoDB"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ss_lines() {
        assert_eq!(
            parse_local_port("tcp   LISTEN 0      128          0.0.0.0:22        0.0.0.0:*"),
            Some(22)
        );
        assert_eq!(
            parse_local_port("tcp   LISTEN 0      511             [::]:80           [::]:*"),
            Some(80)
        );
        assert_eq!(
            parse_local_port("udp   UNCONN 0      0          127.0.0.53%lo:53        0.0.0.0:*"),
            Some(53)
        );
    }

    #[test]
    fn parses_netstat_lines() {
        assert_eq!(
            parse_local_port("tcp        0      0 127.0.0.1:5432          0.0.0.0:*               LISTEN"),
            Some(5432)
        );
        assert_eq!(
            parse_local_port("tcp6       0      0 :::443                  :::*                    LISTEN"),
            Some(443)
        );
    }

    #[test]
    fn ignores_headers_and_noise() {
        assert_eq!(
            parse_local_port("Netid State  Recv-Q Send-Q Local Address:Port Peer Address:Port"),
            None
        );
        assert_eq!(parse_local_port("Active Internet connections (only servers)"), None);
        assert_eq!(parse_local_port(""), None);
    }

    #[test]
    fn names_well_known_ports() {
        assert_eq!(identify_service(22), Some("SSH"));
        assert_eq!(identify_service(3306), Some("MySQL"));
        assert_eq!(identify_service(40000), None);
    }
}
