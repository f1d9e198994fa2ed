use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time;

/// Ports that get an active HTTP probe after the passive banner read.
const WEB_PORTS: &[u16] = &[80, 443, 8080, 8443];

/// Minimal request sent to web ports to coax a response out of quiet servers.
const HTTP_PROBE: &[u8] = b"GET / HTTP/1.0\r\nHost: localhost\r\n\r\n";

/// Maximum number of HTTP response lines collected.
const HTTP_RESPONSE_LINES: usize = 10;

/// Identify the service behind an established connection.
///
/// Reads one line as a passive banner, then for web ports sends a minimal
/// HTTP/1.0 request and collects up to ten response lines, which replace
/// the passive banner and force the service to HTTP/HTTPS. If the catalog
/// did not recognize the port, the banner text is matched against known
/// service keywords as a last resort.
///
/// Every read/write is bounded by `timeout`; I/O errors along the way are
/// swallowed and simply yield no banner for that step.
pub async fn identify<S>(stream: S, port: u16, timeout: Duration) -> (String, String)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(stream);

    // Raw bytes, converted lossily: binary-ish banners (a MySQL handshake,
    // say) must still be classifiable.
    let mut banner = String::new();
    let mut line = Vec::new();
    if let Ok(Ok(n)) = time::timeout(timeout, reader.read_until(b'\n', &mut line)).await {
        if n > 0 {
            banner = String::from_utf8_lossy(&line).trim().to_string();
        }
    }

    let mut service = well_known_service(port).to_string();

    if WEB_PORTS.contains(&port) {
        if let Some(response) = http_banner(&mut reader, timeout).await {
            banner = response;
            service = if port == 443 || port == 8443 {
                "HTTPS".to_string()
            } else {
                "HTTP".to_string()
            };
        }
    }

    if service == "Unknown" && !banner.is_empty() {
        service = classify_banner(&banner).to_string();
    }

    (service, banner)
}

/// Send the HTTP probe and collect the first response lines, joined with
/// newlines. Returns `None` when the write fails or nothing comes back.
async fn http_banner<S>(stream: &mut BufReader<S>, timeout: Duration) -> Option<String>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    time::timeout(timeout, stream.write_all(HTTP_PROBE))
        .await
        .ok()?
        .ok()?;

    let mut response = String::new();
    for _ in 0..HTTP_RESPONSE_LINES {
        let mut line = Vec::new();
        match time::timeout(timeout, stream.read_until(b'\n', &mut line)).await {
            Ok(Ok(n)) if n > 0 => {
                let text = String::from_utf8_lossy(&line);
                response.push_str(text.trim_end_matches(['\r', '\n']));
                response.push('\n');
            }
            _ => break,
        }
    }

    let response = response.trim().to_string();
    if response.is_empty() {
        None
    } else {
        Some(response)
    }
}

/// Static catalog of well-known TCP ports, used as a prior before any
/// banner inspection.
pub fn well_known_service(port: u16) -> &'static str {
    match port {
        21 => "FTP",
        22 => "SSH",
        23 => "Telnet",
        25 => "SMTP",
        53 => "DNS",
        80 => "HTTP",
        110 => "POP3",
        143 => "IMAP",
        443 => "HTTPS",
        993 => "IMAPS",
        995 => "POP3S",
        3306 => "MySQL",
        3389 => "RDP",
        5432 => "PostgreSQL",
        6379 => "Redis",
        8080 => "HTTP",
        8443 => "HTTPS",
        _ => "Unknown",
    }
}

/// Classify a banner by substring match against known service keywords.
/// First match wins; order matters (an SSH banner mentioning "http" in a
/// comment must still classify as SSH).
pub fn classify_banner(banner: &str) -> &'static str {
    const KEYWORDS: &[(&str, &str)] = &[
        ("SSH", "SSH"),
        ("HTTP", "HTTP"),
        ("FTP", "FTP"),
        ("SMTP", "SMTP"),
        ("POP3", "POP3"),
        ("IMAP", "IMAP"),
        ("MYSQL", "MySQL"),
        ("POSTGRESQL", "PostgreSQL"),
        ("REDIS", "Redis"),
    ];

    let upper = banner.to_uppercase();
    for (needle, service) in KEYWORDS {
        if upper.contains(needle) {
            return service;
        }
    }
    "Unknown"
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    const SHORT: Duration = Duration::from_millis(100);

    #[test]
    fn catalog_knows_common_ports() {
        assert_eq!(well_known_service(22), "SSH");
        assert_eq!(well_known_service(443), "HTTPS");
        assert_eq!(well_known_service(6379), "Redis");
        assert_eq!(well_known_service(12345), "Unknown");
    }

    #[test]
    fn keyword_match_is_case_insensitive_and_ordered() {
        assert_eq!(classify_banner("220 ftp ready"), "FTP");
        assert_eq!(classify_banner("SSH-2.0-OpenSSH_9.6 http tunnel"), "SSH");
        assert_eq!(classify_banner("5.7.42 mysql native"), "MySQL");
        assert_eq!(classify_banner("hello world"), "Unknown");
    }

    #[tokio::test]
    async fn passive_banner_with_keyword_fallback() {
        let (client, mut server) = tokio::io::duplex(1024);
        let peer = tokio::spawn(async move {
            server.write_all(b"220 FTP ready\r\n").await.unwrap();
        });

        // Unrecognized port, so the keyword match must supply the label.
        let (service, banner) = identify(client, 12345, SHORT).await;
        assert_eq!(service, "FTP");
        assert_eq!(banner, "220 FTP ready");
        peer.await.unwrap();
    }

    #[tokio::test]
    async fn binary_banner_still_keyword_matches() {
        let (client, mut server) = tokio::io::duplex(1024);
        let peer = tokio::spawn(async move {
            // Invalid UTF-8 framing around a recognizable keyword, the way
            // a MySQL handshake packet leads with binary fields.
            server
                .write_all(b"\xff\xfe\x00\x10mysql_native_password\r\n")
                .await
                .unwrap();
        });

        let (service, banner) = identify(client, 12345, SHORT).await;
        assert_eq!(service, "MySQL");
        assert!(banner.contains("mysql_native_password"));
        peer.await.unwrap();
    }

    #[tokio::test]
    async fn silent_port_falls_back_to_catalog() {
        let (client, server) = tokio::io::duplex(1024);
        // Peer accepts but never speaks.
        let (service, banner) = identify(client, 22, SHORT).await;
        assert_eq!(service, "SSH");
        assert_eq!(banner, "");
        drop(server);
    }

    #[tokio::test]
    async fn http_response_replaces_banner_and_forces_service() {
        let (client, server) = tokio::io::duplex(4096);
        let peer = tokio::spawn(async move {
            let mut server = BufReader::new(server);
            // Wait for the probe request before answering.
            let mut request = String::new();
            server.read_line(&mut request).await.unwrap();
            assert!(request.starts_with("GET / HTTP/1.0"));
            server
                .write_all(b"HTTP/1.0 200 OK\r\nServer: nginx\r\n\r\n")
                .await
                .unwrap();
        });

        let (service, banner) = identify(client, 8080, SHORT).await;
        assert_eq!(service, "HTTP");
        assert_eq!(banner, "HTTP/1.0 200 OK\nServer: nginx");
        peer.await.unwrap();
    }

    #[tokio::test]
    async fn https_port_forces_https_label() {
        let (client, server) = tokio::io::duplex(4096);
        let peer = tokio::spawn(async move {
            let mut server = BufReader::new(server);
            let mut request = String::new();
            server.read_line(&mut request).await.unwrap();
            server.write_all(b"HTTP/1.0 400 Bad Request\r\n").await.unwrap();
        });

        let (service, banner) = identify(client, 8443, SHORT).await;
        assert_eq!(service, "HTTPS");
        assert_eq!(banner, "HTTP/1.0 400 Bad Request");
        peer.await.unwrap();
    }

    #[tokio::test]
    async fn quiet_web_port_keeps_catalog_label() {
        // Peer never answers the probe; the catalog label survives and the
        // banner stays empty.
        let (client, mut server) = tokio::io::duplex(1024);
        let drain = tokio::spawn(async move {
            let mut sink = Vec::new();
            let _ = server.read_to_end(&mut sink).await;
        });

        let (service, banner) = identify(client, 8080, SHORT).await;
        assert_eq!(service, "HTTP");
        assert_eq!(banner, "");
        drain.await.unwrap();
    }
}
