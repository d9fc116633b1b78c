use url::Url;

pub fn format_url_string(host: [u8; 4], port: u16) -> String {
    let host_string = host
        .iter()
        .map(|int| int.to_string())
        .collect::<Vec<String>>()
        .join(".");
    format!("{}:{}", host_string, port)
}

/// Joins `path` onto an http(s) base such as `http://localhost:8000`.
pub fn endpoint_url(api_base: &str, path: &str) -> crate::Result<Url> {
    let base = Url::parse(api_base)?;
    Ok(base.join(path)?)
}

/// Derives the chat websocket url from the http api base, keeping host and port.
pub fn chat_url(api_base: &str, envelope: bool) -> crate::Result<Url> {
    let mut url = endpoint_url(api_base, "/chat")?;
    let scheme = match url.scheme() {
        "https" => "wss",
        _ => "ws",
    };
    url.set_scheme(scheme)
        .map_err(|_| crate::SwarmError::Config(format!("cannot derive ws url from {}", api_base)))?;
    if envelope {
        url.set_query(Some("framing=envelope"));
    }
    Ok(url)
}
