/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Default page size of the history listing
pub const HISTORY_PAGE_SIZE: i64 = 20;

/// Recent activities shown on the user dashboard
pub const DASHBOARD_RECENT_ACTIVITIES: i64 = 5;

/// Recent activities shown to admins across all users
pub const ADMIN_RECENT_ACTIVITIES: i64 = 50;

/// Chart history entries included in the PDF report data
pub const PDF_CHART_HISTORY_LIMIT: i64 = 20;

/// Spreadsheet extensions accepted by the upload endpoint
pub const ALLOWED_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "xlsb", "ods"];

/// Spreadsheet MIME types accepted by the upload endpoint
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    "application/vnd.ms-excel.sheet.macroEnabled.12",
    "application/vnd.ms-excel.sheet.binary.macroEnabled.12",
    "application/vnd.oasis.opendocument.spreadsheet",
];
