//! ID prefix constants.
//!
//! IDs are `"{prefix}-{8 hex chars}"`, generated by the database layer.

pub const PREFIX_COMPANY: &str = "cmp";
pub const PREFIX_ADMIN_USER: &str = "usr";
pub const PREFIX_CUSTOMER: &str = "cus";
pub const PREFIX_FEEDBACK: &str = "fbk";
pub const PREFIX_THEME: &str = "thm";
pub const PREFIX_STRATEGY: &str = "str";
pub const PREFIX_INITIATIVE: &str = "ini";
pub const PREFIX_OBJECTIVE: &str = "obj";
pub const PREFIX_KEY_RESULT: &str = "kr";
pub const PREFIX_SURVEY: &str = "srv";
pub const PREFIX_SURVEY_LINK: &str = "lnk";
pub const PREFIX_SURVEY_RESPONSE: &str = "rsp";
pub const PREFIX_AUDIT: &str = "aud";

/// Every prefix in use, for exhaustive tests.
pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_COMPANY,
    PREFIX_ADMIN_USER,
    PREFIX_CUSTOMER,
    PREFIX_FEEDBACK,
    PREFIX_THEME,
    PREFIX_STRATEGY,
    PREFIX_INITIATIVE,
    PREFIX_OBJECTIVE,
    PREFIX_KEY_RESULT,
    PREFIX_SURVEY,
    PREFIX_SURVEY_LINK,
    PREFIX_SURVEY_RESPONSE,
    PREFIX_AUDIT,
];
