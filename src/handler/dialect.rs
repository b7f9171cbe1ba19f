// ABOUTME: Vendor AT dialect table and its resolution rules
// ABOUTME: Resolves a dialect from (manufacturer, model, alias), most specific first

use tracing::info;

use crate::handler::Protocol;

/// The knobs that differ between vendor AT implementations: extra
/// initialization, indication syntax and capability limits. The command flow
/// itself is shared by every dialect.
#[derive(Debug)]
pub struct Dialect {
    /// Registry name, matched case-insensitively during resolution.
    pub name: &'static str,
    /// Commands issued after reset, before anything else.
    pub init_commands: &'static [&'static str],
    /// Command that resets the device.
    pub reset_command: &'static str,
    /// Command enabling unsolicited `+CMTI` new-message indications.
    pub enable_indications: &'static str,
    /// Command disabling unsolicited new-message indications.
    pub disable_indications: &'static str,
    /// Command nudging the device to keep the GSM link open before a send
    /// batch; empty when the device has none.
    pub keep_link_open: &'static str,
    /// Storage locations known a priori; discovered from the device when
    /// empty.
    pub default_storage: &'static str,
    /// Protocol the device works best with.
    pub preferred_protocol: Protocol,
    pub supports_receive: bool,
    pub supports_binary: bool,
    pub supports_ucs2: bool,
    pub supports_stk: bool,
}

const BASE: Dialect = Dialect {
    name: "base",
    init_commands: &[],
    reset_command: "ATZ\r",
    enable_indications: "AT+CNMI=1,1,0,0,0\r",
    disable_indications: "AT+CNMI=0,0,0,0,0\r",
    keep_link_open: "",
    default_storage: "",
    preferred_protocol: Protocol::Pdu,
    supports_receive: true,
    supports_binary: true,
    supports_ucs2: true,
    supports_stk: false,
};

/// Compiled-in dialects, ordered roughly by specificity. The plain base
/// dialect is the fallback of last resort.
static DIALECTS: &[Dialect] = &[
    Dialect {
        name: "base_wavecom_m1306b",
        keep_link_open: "AT+CMMS=1\r",
        supports_stk: true,
        ..BASE
    },
    Dialect {
        name: "base_wavecom",
        supports_stk: true,
        ..BASE
    },
    Dialect {
        name: "base_huawei",
        init_commands: &["AT^CURC=0\r"],
        enable_indications: "AT+CNMI=2,1,0,0,0\r",
        ..BASE
    },
    Dialect {
        name: "base_siemens_tc35",
        init_commands: &["AT^SM20=0,0\r"],
        ..BASE
    },
    Dialect {
        name: "base_siemens_m55",
        enable_indications: "AT+CNMI=2,1,0,0,0\r",
        ..BASE
    },
    Dialect {
        name: "base_siemens_s55",
        enable_indications: "AT+CNMI=2,1,0,0,0\r",
        ..BASE
    },
    Dialect {
        name: "base_siemens_mc75",
        keep_link_open: "AT+CMMS=1\r",
        ..BASE
    },
    Dialect {
        name: "base_sonyericsson_w550i",
        enable_indications: "AT+CNMI=3,1,0,0,0\r",
        ..BASE
    },
    Dialect {
        name: "base_sonyericsson",
        enable_indications: "AT+CNMI=3,1,0,0,0\r",
        ..BASE
    },
    Dialect {
        name: "base_nokia_s40",
        preferred_protocol: Protocol::Text,
        supports_binary: false,
        supports_ucs2: false,
        ..BASE
    },
    Dialect {
        name: "base_samsung",
        ..BASE
    },
    Dialect {
        name: "base_motorola_razrv3x",
        init_commands: &["AT+MODE=0\r"],
        ..BASE
    },
    Dialect {
        name: "base_simcom_sim300",
        enable_indications: "AT+CNMI=2,1,0,0,0\r",
        ..BASE
    },
    BASE,
];

/// Lowercases and strips everything but letters and digits, so that
/// "SonyEricsson", "sony ericsson" and "SONY-ERICSSON" all resolve alike.
fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn find(name: &str) -> Option<&'static Dialect> {
    DIALECTS.iter().find(|d| d.name.eq_ignore_ascii_case(name))
}

/// Resolves the dialect for a device, trying `base_<alias>`,
/// `base_<manufacturer>_<model>`, `base_<manufacturer>` and finally the
/// plain base dialect. The first match wins.
pub fn resolve(manufacturer: &str, model: &str, alias: &str) -> &'static Dialect {
    let manufacturer = sanitize(manufacturer);
    let model = sanitize(model);
    let alias = sanitize(alias);

    let mut candidates = Vec::with_capacity(3);
    if !alias.is_empty() {
        candidates.push(format!("base_{alias}"));
    }
    if !manufacturer.is_empty() {
        if !model.is_empty() {
            candidates.push(format!("base_{manufacturer}_{model}"));
        }
        candidates.push(format!("base_{manufacturer}"));
    }

    for candidate in &candidates {
        if let Some(dialect) = find(candidate) {
            info!(dialect = dialect.name, "resolved AT dialect");
            return dialect;
        }
        info!(candidate = candidate.as_str(), "no such dialect; trying a more generic one");
    }
    &DIALECTS[DIALECTS.len() - 1]
}
