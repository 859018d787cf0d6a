//! `MediaBrowser` authorization header values understood by the catalog
//! service.

use core_runtime::config::ClientInfo;

/// Header carrying the client identity on unauthenticated requests.
pub const CLIENT_AUTHORIZATION_HEADER: &str = "X-Emby-Authorization";

/// Header carrying the access token on authenticated requests.
pub const TOKEN_AUTHORIZATION_HEADER: &str = "Authorization";

/// `MediaBrowser Client="…", Device="…", DeviceId="…", Version="…"`
pub fn client_authorization(info: &ClientInfo) -> String {
    format!(
        "MediaBrowser Client=\"{}\", Device=\"{}\", DeviceId=\"{}\", Version=\"{}\"",
        info.name, info.device_name, info.device_id, info.version
    )
}

/// `MediaBrowser Token="…"`
pub fn token_authorization(access_token: &str) -> String {
    format!("MediaBrowser Token=\"{}\"", access_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_authorization_format() {
        let info = ClientInfo::default()
            .with_device_name("Sonora Music App")
            .with_device_id("sonora-app-abc")
            .with_version("1.0.0");

        assert_eq!(
            client_authorization(&info),
            r#"MediaBrowser Client="Sonora", Device="Sonora Music App", DeviceId="sonora-app-abc", Version="1.0.0""#
        );
    }

    #[test]
    fn test_token_authorization_format() {
        assert_eq!(token_authorization("t0k"), r#"MediaBrowser Token="t0k""#);
    }
}
