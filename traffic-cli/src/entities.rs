//! Built-in fallback list of entity codes, used when no entities file is
//! given on the command line.

pub const DEFAULT_ENTITIES: &[&str] = &[
    "OM", "MV", "BJ", "NZ", "MD", "AW", "CN", "EE", "HR", "AE", "SL",
    "FI", "BI", "VG", "GM", "ID", "YT", "TR", "VI", "AX", "CO", "MW",
    "LA", "FJ", "ME", "KN", "PR", "GN", "IE", "LR", "NI", "AF", "AU",
    "US", "CL", "EC", "ZW", "UA", "BY", "IT", "ET", "VE", "NF", "MS",
    "QA", "BG", "TN", "RW", "MU", "MC", "CM", "NG", "AD", "SK", "BZ",
    "MT", "BH", "TO", "GL", "VU", "KI", "IR", "PM", "BW", "SH", "MQ",
    "KZ", "TL", "BE", "RU", "GI", "VC", "PL", "AR", "SY", "CI", "MA",
    "AT", "CK", "RE", "NE", "SI", "DO", "IS", "BF", "ES", "TM", "SZ",
    "HN", "JE", "MR", "LK", "GY", "TJ", "RS", "CY", "GG", "CG", "HK",
    "MO", "DK", "SG", "DM", "IQ", "KH", "CZ", "GH", "NC", "KY", "MP",
    "BD", "KG", "ZA", "PK", "CH", "TH", "BA", "GE", "LI", "FR", "MM",
    "IM", "PH", "SC", "BR", "GF", "NA", "SE", "BT", "KW", "MN", "BB",
    "NR", "AO", "CF", "SV", "TZ", "BS", "SD", "DJ", "KE", "IN", "MK",
    "CU", "RO", "PF", "NO", "AL", "SA", "VN", "TW", "GT", "PW", "GB",
    "JO", "ML", "PY", "CV", "TG", "GD", "AM", "PG", "CD", "ST", "DZ",
    "SB", "GU", "IL", "NP", "LY", "WS", "JP", "CA", "BN", "DE", "GR",
    "LV", "UY", "CR", "TC", "JM", "MZ", "MH", "SR", "FO", "ZM", "PE",
    "BO", "TV", "KR", "TD", "UZ", "GA", "GP", "LT", "YE", "HT", "LB",
    "MX", "PS", "EG", "LS", "PA", "AG", "SN", "NL", "LU", "AI", "UG",
    "MY", "LC", "BM", "TT", "GQ", "PT", "AZ", "HU", "SO", "MG",
];
