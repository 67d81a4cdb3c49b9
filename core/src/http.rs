//! HTTP/1.1 framing for the sink write request

use core::fmt::Write;
use core::net::SocketAddrV4;

use heapless::String;

pub const PATH_MAX_LEN: usize = 96;
pub const URL_MAX_LEN: usize = 128;
pub const REQUEST_MAX_LEN: usize = 640;

/// `/write?db=<db_name>`
pub fn write_path(db_name: &str) -> Result<String<PATH_MAX_LEN>, core::fmt::Error> {
    let mut path = String::new();
    write!(path, "/write?db={}", db_name)?;
    Ok(path)
}

/// Full URL of the write endpoint, for logs
pub fn sink_url(remote: SocketAddrV4, path: &str) -> Result<String<URL_MAX_LEN>, core::fmt::Error> {
    let mut url = String::new();
    write!(url, "http://{}{}", remote, path)?;
    Ok(url)
}

/// Complete `POST` request carrying `body` as plain text
pub fn post_request(
    remote: SocketAddrV4,
    path: &str,
    body: &str,
) -> Result<String<REQUEST_MAX_LEN>, core::fmt::Error> {
    let mut request = String::new();
    write!(request, "POST {} HTTP/1.1\r\n", path)?;
    write!(request, "Host: {}\r\n", remote)?;
    request.write_str("Content-Type: text/plain; charset=utf-8\r\n")?;
    write!(request, "Content-Length: {}\r\n", body.len())?;
    request.write_str("Connection: close\r\n\r\n")?;
    request.write_str(body)?;
    Ok(request)
}

/// Status code from the response status line, if one was received
pub fn status_code(response: &[u8]) -> Option<u16> {
    let end = response
        .iter()
        .position(|&b| b == b'\r' || b == b'\n')
        .unwrap_or(response.len());
    let line = core::str::from_utf8(&response[..end]).ok()?;
    let mut parts = line.split(' ');
    if !parts.next()?.starts_with("HTTP/") {
        return None;
    }
    let code = parts.next()?;
    if code.len() != 3 {
        return None;
    }
    code.parse().ok()
}

/// 2xx
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::net::Ipv4Addr;

    fn sink() -> SocketAddrV4 {
        SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 20), 8086)
    }

    #[test]
    fn test_url() {
        let path = write_path("sensors").unwrap();
        let url = sink_url(sink(), &path).unwrap();
        assert_eq!(url.as_str(), "http://192.168.1.20:8086/write?db=sensors");
    }

    #[test]
    fn test_post_request_framing() {
        let body = "room,id=dev exist=1";
        let request = post_request(sink(), "/write?db=home", body).unwrap();
        assert_eq!(
            request.as_str(),
            "POST /write?db=home HTTP/1.1\r\n\
             Host: 192.168.1.20:8086\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             Content-Length: 19\r\n\
             Connection: close\r\n\
             \r\n\
             room,id=dev exist=1"
        );
    }

    #[test]
    fn test_status_code() {
        assert_eq!(status_code(b"HTTP/1.1 204 No Content\r\n\r\n"), Some(204));
        assert_eq!(status_code(b"HTTP/1.0 404 Not Found\r\n"), Some(404));
        assert_eq!(status_code(b"HTTP/1.1 400"), Some(400));
        assert_eq!(status_code(b""), None);
        assert_eq!(status_code(b"garbage"), None);
        assert_eq!(status_code(b"HTTP/1.1 20"), None);
    }

    #[test]
    fn test_success_range() {
        assert!(is_success(200));
        assert!(is_success(204));
        assert!(!is_success(301));
        assert!(!is_success(500));
    }
}
