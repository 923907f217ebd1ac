pub const APP_NAME: &str = "shiftsync";

pub const ICS_PRODID: &str = "-//shiftsync//EN";

/// Extra VEVENT property carrying the shift identity next to the UID.
pub const SHIFT_ID_PROPERTY: &str = "X-SHIFTSYNC-ID";

pub const DEFAULT_TITLE: &str = "Shift";

pub const DEFAULT_HISTORY_LIMIT: usize = 20;

pub const DEFAULT_SHIFTWEB_URL: &str = "https://example-shift.com";

pub const DEFAULT_CALDAV_URL: &str = "https://caldav.icloud.com/";

/// Environment override prefix, e.g. `SHIFTSYNC__TITLE=Work`.
pub const ENV_PREFIX: &str = "SHIFTSYNC";
