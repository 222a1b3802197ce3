//! Client identification header for native engines.

use bridge_traits::ClientInfo;
use std::collections::HashMap;

pub const USER_AGENT: &str = "User-Agent";

/// Formats the identification string sent with every native media request:
/// `App/OS version; device; OS os_version`.
pub fn user_agent(info: &ClientInfo) -> String {
    format!(
        "{}/{} {}; {}; {} {}",
        info.app_name,
        info.os_name,
        info.app_version,
        info.device_model,
        info.os_name,
        info.os_version
    )
}

/// Header map attached to a native open request.
pub fn client_headers(info: &ClientInfo) -> HashMap<String, String> {
    let mut headers = HashMap::with_capacity(1);
    headers.insert(USER_AGENT.to_string(), user_agent(info));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_identification_string() {
        let info = ClientInfo::new("Radio", "4.2.0")
            .with_device_model("iPhone15,2")
            .with_os("iOS", "17.4");

        assert_eq!(user_agent(&info), "Radio/iOS 4.2.0; iPhone15,2; iOS 17.4");
    }

    #[test]
    fn header_map_has_user_agent_only() {
        let headers = client_headers(&ClientInfo::new("Radio", "1.0"));

        assert_eq!(headers.len(), 1);
        assert!(headers[USER_AGENT].starts_with("Radio/"));
    }
}
