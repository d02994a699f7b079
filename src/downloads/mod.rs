/*!
# Download observation

Turns "a download finished" events into conversion offers, honouring the
user's `auto_notify` flag and origin whitelist, and remembers the last
offered file for five minutes.
*/

pub mod observer;
pub mod recent;
pub mod whitelist;

pub use observer::{is_csv_download, DownloadDecision, DownloadItem, DownloadObserver, IgnoreReason};
pub use recent::{RecentDownload, RecentDownloadStore, RECENT_WINDOW_MINUTES};
pub use whitelist::{is_url_allowed, parse_whitelist_text};
