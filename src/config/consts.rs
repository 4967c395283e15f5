// src/config/consts.rs

// Source
pub const DEFAULT_SHEET_NAME: &str = "BNI TYFCB Data";
pub const CREDENTIALS_FILE: &str = "google-sheets-credentials.json";
pub const COL_IDENTITY: &str = "Running User";
pub const COL_AMOUNT: &str = "TYFCB Received";
pub const COL_TIMESTAMP: &str = "Timestamp";
pub const COL_CHAPTER: &str = "Chapter";
pub const COL_TOTAL_GIVEN: &str = "Total Given Amount";
pub const COL_RECORDS_COUNT: &str = "Records Count";
pub const IDENTITY_ALIASES: &[&str] = &[COL_IDENTITY, "Name", "ชื่อ"];
pub const AMOUNT_ALIASES: &[&str] = &[
    COL_AMOUNT, "TYFCB received", "tyfcb received", "TYFCB_Received", "Received", "ยอดธุรกิจ Lifetime",
];

// Google endpoints
pub const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
pub const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";
pub const SHEETS_SCOPES: &str = "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive.readonly";
pub const SHEETS_EPOCH: (i32, u32, u32) = (1899, 12, 30);

// Form sink
pub const DEFAULT_FORM_URL: &str =
    "https://docs.google.com/forms/d/e/1FAIpQLSfBkXWsGZXP3IXJ8gR2vZbyAi7VP3R2FSF6YB9ohkr94rIb8g/formResponse";
pub const DEFAULT_NAME_ENTRY: &str = "entry.683444359";
pub const DEFAULT_AMOUNT_ENTRY: &str = "entry.290745485";
// Confirmation page markers; the submit URL itself says nothing about success.
pub const FORM_SUCCESS_MARKERS: &[&str] = &[
    "freebirdFormviewerViewResponseConfirmationMessage",
    "Your response has been recorded",
    "ระบบได้บันทึกคำตอบของคุณแล้ว",
];
pub const USER_AGENT: &str = concat!("tyfcb_relay/", env!("CARGO_PKG_VERSION"));

// Sheet sink
pub const DEFAULT_TARGET_SHEET: &str = "BNI TYFCB Relay";
pub const TARGET_HEADERS: &[&str] =
    &[COL_TIMESTAMP, COL_AMOUNT, COL_IDENTITY, COL_CHAPTER, COL_TOTAL_GIVEN, COL_RECORDS_COUNT];

// Durable state
pub const DEFAULT_STATE_DIR: &str = ".";
pub const SENT_DATA_FILE: &str = "sent_form_data.json";
pub const LAST_DATA_FILE: &str = "last_bni_data.json";
pub const STORE_DIR: &str = ".store";
pub const LOG_FILE: &str = "debug.log";

// Pacing
pub const DEFAULT_WINDOW_DAYS: u32 = 7;
pub const DELIVERY_PAUSE_MS: u64 = 2_000;
pub const HTTP_TIMEOUT_SECS: u64 = 30;
