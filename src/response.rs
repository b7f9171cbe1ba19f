// ABOUTME: Tolerant parsing of raw AT command responses
// ABOUTME: Error discrimination, field extraction and the single-value query pipeline

/// Sentinel returned for string fields a device failed to report. Device
/// responses vary too widely to surface a parse error for every oddity.
pub const VALUE_NOT_REPORTED: &str = "* N/A *";

/// Decides whether an AT response reports failure.
///
/// An empty response counts as an error (it is what the serial layer yields
/// when it cannot cope). Otherwise a response is an error when some line
/// trims to exactly `ERROR` or contains a `CME ERROR:` / `CMS ERROR:` tag.
/// Lines merely containing the substring "ERROR" inside quoted menu strings
/// (e.g. `+STGI: "ERROR TITLE"`) are not errors.
pub fn is_error(response: &str) -> bool {
    if response.is_empty() {
        return true;
    }
    response.lines().any(|line| {
        let line = line.trim();
        line == "ERROR" || line.contains("CME ERROR:") || line.contains("CMS ERROR:")
    })
}

/// True when the response carries a CMS error, which send paths retry.
pub fn is_cms_error(response: &str) -> bool {
    response.contains("CMS ERROR:")
}

/// Extracts the memory index from a message-listing line such as
/// `+CMGL: 2,0,,26` - the integer between the first `:` and the first `,`.
pub fn mem_index_of_line(line: &str) -> Option<i32> {
    let colon = line.find(':')?;
    let comma = line.find(',')?;
    line.get(colon + 1..comma)?.trim().parse().ok()
}

/// Returns the next line carrying information - the first whose trimmed form
/// is non-empty - or `None` at end of input.
pub fn next_useful_line<'a>(lines: &mut impl Iterator<Item = &'a str>) -> Option<&'a str> {
    lines.map(str::trim).find(|line| !line.is_empty())
}

/// Drops `OK` lines and blank lines, keeping everything else trimmed.
fn useful_lines(response: &str) -> impl Iterator<Item = &str> {
    response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.eq_ignore_ascii_case("OK"))
}

/// The common single-value pipeline: drop OK and blank lines, join the rest
/// and strip whitespace, quotes, commas and colons.
fn strip_response(response: &str) -> String {
    let joined: String = useful_lines(response).collect();
    joined
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '"' | ',' | ':'))
        .collect()
}

fn reported_or_not(value: String) -> String {
    if value.is_empty() {
        VALUE_NOT_REPORTED.to_owned()
    } else {
        value
    }
}

/// Parses an `AT+CGMI` response into the manufacturer name.
pub fn parse_manufacturer(response: &str) -> String {
    if response.contains("ERROR") {
        return VALUE_NOT_REPORTED.to_owned();
    }
    reported_or_not(strip_response(response))
}

/// Parses an `AT+CGMM` response into the model name. Some devices wrap the
/// model in a band list (`"GSM900","GSM1800","MODEL=V635"`).
pub fn parse_model(response: &str) -> String {
    if response.contains("ERROR") {
        return VALUE_NOT_REPORTED.to_owned();
    }
    let stripped = strip_response(response);
    let model = match stripped.to_uppercase().find("MODEL=") {
        Some(at) => stripped[at + "MODEL=".len()..].to_owned(),
        None => stripped,
    };
    reported_or_not(model)
}

/// Parses an `AT+CGSN` response into the serial number (digits only).
pub fn parse_serial_no(response: &str) -> String {
    if is_error(response) {
        return VALUE_NOT_REPORTED.to_owned();
    }
    let digits: String = useful_lines(response)
        .collect::<String>()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    reported_or_not(digits)
}

/// Parses an `AT+CIMI` response into the IMSI. Anything non-numeric means
/// the device did not report one.
pub fn parse_imsi(response: &str) -> String {
    if is_error(response) {
        return VALUE_NOT_REPORTED.to_owned();
    }
    let value: String = useful_lines(response).collect();
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return VALUE_NOT_REPORTED.to_owned();
    }
    value
}

/// Parses an `AT+CGMR` response into the software version, inner spacing
/// preserved.
pub fn parse_sw_version(response: &str) -> String {
    if is_error(response) {
        return VALUE_NOT_REPORTED.to_owned();
    }
    reported_or_not(useful_lines(response).collect::<Vec<_>>().join(" "))
}

/// Parses an `AT+CNUM` response into the subscriber number. The number is
/// the first quoted field when quotes are present, otherwise the field
/// between the first two commas.
pub fn parse_msisdn(response: &str) -> String {
    if response.contains("ERROR") {
        return VALUE_NOT_REPORTED.to_owned();
    }
    let joined: String = useful_lines(response)
        .collect::<String>()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();

    let mut value = joined.as_str();
    if let Some(open) = value.find('"') {
        if let Some(close) = value[open + 1..].find('"') {
            value = &value[open + 1..open + 1 + close];
        }
    }
    if let Some(first) = value.find(',') {
        if let Some(second) = value[first + 1..].find(',') {
            value = &value[first + 1..first + 1 + second];
        }
    }
    reported_or_not(value.to_owned())
}

/// Splits a stripped response on colons and commas, dropping empty fields -
/// the tokenization the numeric queries share.
fn numeric_fields(response: &str) -> Vec<&str> {
    response
        .split([':', ','])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Parses an `AT+CBC` response into the battery percentage - the second
/// integer after the colon. Malformed responses yield 0.
pub fn parse_battery_level(response: &str) -> i32 {
    if is_error(response) {
        return 0;
    }
    let stripped: String = useful_lines(response).collect();
    numeric_fields(&stripped)
        .get(2)
        .and_then(|t| t.parse().ok())
        .unwrap_or(0)
}

/// Parses an `AT+CSQ` response into a 0-100 signal level - the first integer
/// after the colon, rescaled from the 0-31 RSSI range. Malformed responses
/// yield 0.
pub fn parse_signal_level(response: &str) -> i32 {
    if is_error(response) {
        return 0;
    }
    let stripped: String = useful_lines(response).collect();
    numeric_fields(&stripped)
        .get(1)
        .and_then(|t| t.parse::<i32>().ok())
        .map(|v| v * 100 / 31)
        .unwrap_or(0)
}

/// Parses an `AT+CGATT?` response: true when the device reports GPRS
/// attachment.
pub fn parse_gprs_attached(response: &str) -> bool {
    if is_error(response) || !response.contains("CGATT") {
        return false;
    }
    let stripped: String = useful_lines(response).collect();
    numeric_fields(&stripped)
        .get(1)
        .and_then(|t| t.parse::<i32>().ok())
        .map(|v| v == 1)
        .unwrap_or(false)
}

/// Network registration states reported by `AT+CREG?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkRegistration {
    /// Automatic registration is disabled on the device.
    Disabled,
    /// Registered to the home network.
    Home,
    /// Not registered yet; the device is searching.
    Searching,
    /// Registration was denied by the network.
    Denied,
    /// The device reports an unknown registration state.
    Unknown,
    /// Registered to a foreign network (roaming).
    Roaming,
    /// The response could not be interpreted at all.
    Invalid,
}

/// Parses an `AT+CREG?` response. `None` means the device answered with an
/// error; otherwise the second integer of the reply selects the state.
pub fn parse_registration(response: &str) -> Option<NetworkRegistration> {
    if response.contains("ERROR") {
        return None;
    }
    let stripped: String = useful_lines(response)
        .collect::<String>()
        .replace("+CREG:", "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let answer = stripped
        .split(',')
        .nth(1)
        .and_then(|t| t.parse::<i32>().ok())
        .unwrap_or(-1);
    Some(match answer {
        0 => NetworkRegistration::Disabled,
        1 => NetworkRegistration::Home,
        2 => NetworkRegistration::Searching,
        3 => NetworkRegistration::Denied,
        4 => NetworkRegistration::Unknown,
        5 => NetworkRegistration::Roaming,
        _ => NetworkRegistration::Invalid,
    })
}

/// Collects the distinct two-letter storage location codes out of an
/// `AT+CPMS?` response, concatenated in order of first appearance
/// (e.g. `"SMME"`).
pub fn parse_storage_locations(response: &str) -> String {
    if is_error(response) {
        return String::new();
    }
    let mut out = String::new();
    let mut rest = response;
    while let Some(open) = rest.find('"') {
        rest = &rest[open + 1..];
        let Some(close) = rest.find('"') else { break };
        let name = &rest[..close];
        if name.len() == 2 && name.chars().all(|c| c.is_ascii_alphabetic()) {
            let mut found = false;
            for i in (0..out.len()).step_by(2) {
                if &out[i..i + 2] == name {
                    found = true;
                    break;
                }
            }
            if !found {
                out.push_str(name);
            }
        }
        rest = &rest[close + 1..];
    }
    out
}

/// Extracts the message reference from an `AT+CMGS` success response
/// (`+CMGS: 123`).
pub fn parse_send_ref(response: &str) -> Option<i32> {
    let at = response.find("+CMGS")?;
    let tail = &response[at + "+CMGS".len()..];
    let digits: String = tail
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_responses() {
        for response in [
            "",
            "\rCME ERROR: 29\r",
            "\n\r\n+CME ERROR: 11\r",
            "\nAT+CBC\r\r\n+CME ERROR: SIM PIN required\r\n",
            "\nERROR\r",
            "\r\n+CME ERROR: 3\r",
        ] {
            assert!(is_error(response), "not flagged as error: {response:?}");
        }
    }

    #[test]
    fn non_error_responses() {
        for response in [
            " ",
            "somerandomtext",
            " OK\r",
            "\r\nOK\r",
            "\nAT\r\r\nOK\r",
            "+CMGS:123\rOK\r",
            "+CIND: (\"Voice Mail\",(0,1)),(\"service\",(0,1)),(\"call\",(0,1))\"\rOK\r",
            "+MBAN: Copyright 2000-2004 Motorola, Inc.\rOK\r",
            "\r\n+STIN: 6\r",
            "\r\n+STGI: \"ERROR TITLE\"\r\n\r\nOK\r",
            "\nAT+CPIN?\r\r\n+CPIN: SIM PIN\r",
            "\r\n+CREG: 0,1\r\n\r\nOK\r",
            "\r\n WAVECOM WIRELESS CPU\r\n\r\nOK\r",
        ] {
            assert!(!is_error(response), "wrongly flagged as error: {response:?}");
        }
    }

    #[test]
    fn memory_index_extraction() {
        assert_eq!(mem_index_of_line("+CMGL: 1,1,,142"), Some(1));
        assert_eq!(mem_index_of_line("+CMGL: 2,0,,26"), Some(2));
        assert_eq!(mem_index_of_line("+CMGL: 10,1,,159"), Some(10));
        assert_eq!(mem_index_of_line("garbage"), None);
    }

    #[test]
    fn next_useful_line_skips_blanks() {
        let text = "\r\n\r\n+CMGL: 1,1,,142\n\nDEADBEEF\n\nOK";
        let mut lines = text.lines();
        assert_eq!(next_useful_line(&mut lines), Some("+CMGL: 1,1,,142"));
        assert_eq!(next_useful_line(&mut lines), Some("DEADBEEF"));
        assert_eq!(next_useful_line(&mut lines), Some("OK"));
        assert_eq!(next_useful_line(&mut lines), None);
    }

    #[test]
    fn manufacturer_pipeline() {
        assert_eq!(
            parse_manufacturer("\r\n WAVECOM WIRELESS CPU\r\n\r\nOK\r"),
            "WAVECOMWIRELESSCPU"
        );
        assert_eq!(parse_manufacturer("SonyEricsson\r\rOK\r"), "SonyEricsson");
        assert_eq!(parse_manufacturer("\nERROR\r"), VALUE_NOT_REPORTED);
        assert_eq!(parse_manufacturer(""), VALUE_NOT_REPORTED);
    }

    #[test]
    fn model_pipeline() {
        assert_eq!(
            parse_model("\"GSM900\",\"GSM1800\",\"GSM1900\",\"GSM850\",\"MODEL=V635\""),
            "V635"
        );
        assert_eq!(parse_model("MTK2"), "MTK2");
        assert_eq!(parse_model("\r\n MULTIBAND  900E  1800 \r\n\r\nOK\r"), "MULTIBAND900E1800");
        assert_eq!(parse_model("\nERROR\r"), VALUE_NOT_REPORTED);
    }

    #[test]
    fn serial_and_imsi_pipeline() {
        assert_eq!(parse_serial_no("\r\n123412341234123\r\n\r\nOK\r"), "123412341234123");
        assert_eq!(parse_serial_no("blah blah blah"), VALUE_NOT_REPORTED);
        assert_eq!(parse_imsi("\r\n123412341234111\r\n\r\nOK\r"), "123412341234111");
        assert_eq!(parse_imsi("blah blah blah"), VALUE_NOT_REPORTED);
        assert_eq!(
            parse_imsi("\nAT+CBC\r\r\n+CME ERROR: SIM PIN required\r\n"),
            VALUE_NOT_REPORTED
        );
    }

    #[test]
    fn sw_version_keeps_inner_spacing() {
        assert_eq!(
            parse_sw_version("\r\nR7.42.0.201003050914.GL6110 2131816 030510 09:14\r\n\r\nOK\r"),
            "R7.42.0.201003050914.GL6110 2131816 030510 09:14"
        );
    }

    #[test]
    fn msisdn_pipeline() {
        assert_eq!(
            parse_msisdn("\n+CNUM: Owner Name,15555555555,129\r\n"),
            "15555555555"
        );
        assert_eq!(parse_msisdn("\n+CNUM: ,\"0123456789\",122\r\nOK\r"), "0123456789");
        assert_eq!(
            parse_msisdn("\r\n+CNUM: \"flsms test no\",\"254704593111\",161\r\n\r\nOK\r"),
            "254704593111"
        );
        assert_eq!(parse_msisdn("\n+CNUM\r\n"), VALUE_NOT_REPORTED);
    }

    #[test]
    fn battery_pipeline() {
        assert_eq!(parse_battery_level("+CBC: 1,37"), 37);
        assert_eq!(parse_battery_level("\r\n+CBC: 0,0\r\n\r\nOK\r"), 0);
        assert_eq!(parse_battery_level("+CBC: 123,"), 0);
        assert_eq!(parse_battery_level("+CBC: little,elephant"), 0);
        assert_eq!(parse_battery_level(""), 0);
    }

    #[test]
    fn signal_pipeline_rescales() {
        assert_eq!(parse_signal_level("\r\n+CSQ: 22,0\r\n\r\nOK\r"), 70);
        assert_eq!(parse_signal_level("+CSQ: 18,99"), 58);
        assert_eq!(parse_signal_level("+CSQ: 28,99"), 90);
        assert_eq!(parse_signal_level("+CSQ: sock,shoe"), 0);
        assert_eq!(parse_signal_level(""), 0);
    }

    #[test]
    fn gprs_pipeline() {
        assert!(parse_gprs_attached("\r\n+CGATT: 1\r\n\r\nOK\r"));
        assert!(!parse_gprs_attached("\r\n+CGATT: 0\r\n\r\nOK\r"));
        assert!(!parse_gprs_attached("\nERROR\r"));
    }

    #[test]
    fn registration_states() {
        assert_eq!(
            parse_registration("\r\n+CREG: 0,1\r\n\r\nOK\r"),
            Some(NetworkRegistration::Home)
        );
        assert_eq!(
            parse_registration("\r\n+CREG: 0,5\r\n\r\nOK\r"),
            Some(NetworkRegistration::Roaming)
        );
        assert_eq!(
            parse_registration("\r\n+CREG: 0,2\r\n\r\nOK\r"),
            Some(NetworkRegistration::Searching)
        );
        assert_eq!(
            parse_registration("\r\n+CREG: 0,3\r\n\r\nOK\r"),
            Some(NetworkRegistration::Denied)
        );
        assert_eq!(parse_registration("\nERROR\r"), None);
        assert_eq!(
            parse_registration("gibberish"),
            Some(NetworkRegistration::Invalid)
        );
    }

    #[test]
    fn storage_location_discovery() {
        assert_eq!(
            parse_storage_locations("\r\n+CPMS: \"SM\",3,25,\"SM\",3,25,\"ME\",3,25\r\n\r\nOK\r"),
            "SMME"
        );
        assert_eq!(parse_storage_locations("\r\n+CPMS: 2,28,2,28,2,28\r\n\r\nOK\r"), "");
        assert_eq!(parse_storage_locations("\nERROR\r"), "");
    }

    #[test]
    fn send_ref_extraction() {
        assert_eq!(parse_send_ref("+CMGS: 12\r\rOK\r"), Some(12));
        assert_eq!(parse_send_ref("+CMGS:123\rOK"), Some(123));
        assert_eq!(parse_send_ref("\r\nOK\r"), None);
    }
}
