/*!
# Conversion service

Request/response front for everything a UI layer needs: settings, the
recent-download slot, download events and conversions. Settings are owned
by the service instance and written back to disk when a path is configured.
*/

mod types;

pub use types::{Notification, Request, Response, ServiceError, ServiceResult};

use chrono::{DateTime, Utc};
use std::path::PathBuf;

use crate::config::{Settings, SettingsPatch};
use crate::convert::{Converter, DownloadSink};
use crate::downloads::{DownloadDecision, DownloadItem, DownloadObserver, RecentDownloadStore};

pub struct ConversionService<S: DownloadSink> {
    settings: Settings,
    settings_path: Option<PathBuf>,
    recent: RecentDownloadStore,
    observer: DownloadObserver,
    converter: Converter<S>,
}

impl<S: DownloadSink> ConversionService<S> {
    pub fn new(settings: Settings, recent: RecentDownloadStore, sink: S) -> Self {
        Self {
            settings,
            settings_path: None,
            recent,
            observer: DownloadObserver::new(),
            converter: Converter::new(sink),
        }
    }

    /// Persist settings updates to `path`
    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn converter(&self) -> &Converter<S> {
        &self.converter
    }

    pub fn handle(&mut self, request: Request) -> Response {
        self.handle_at(request, Utc::now())
    }

    /// Handle a request as of `now`. Failures become [`Response::Error`].
    pub fn handle_at(&mut self, request: Request, now: DateTime<Utc>) -> Response {
        tracing::debug!("Handling request {:?}", request);
        let result = match request {
            Request::GetRecentDownload => self
                .recent
                .get_recent(now)
                .map(|download| Response::RecentDownload { download })
                .map_err(ServiceError::storage),
            Request::ClearRecentDownload => self
                .recent
                .clear()
                .map(|_| Response::Success)
                .map_err(ServiceError::storage),
            Request::GetSettings => Ok(Response::Settings {
                settings: self.settings.clone(),
            }),
            Request::UpdateSettings { settings } => self.update_settings(settings),
            Request::DownloadCompleted { item } => self.download_completed(&item, now),
            Request::ConvertFile { path } => self.convert_path(path),
            Request::ConvertRecent => self.convert_recent(now),
        };

        result.unwrap_or_else(|err| {
            tracing::error!("Request failed: {}", err);
            err.into()
        })
    }

    fn update_settings(&mut self, patch: SettingsPatch) -> ServiceResult<Response> {
        self.settings.apply(patch);
        if let Some(path) = &self.settings_path {
            self.settings
                .save_to_file(path)
                .map_err(ServiceError::storage)?;
        }
        Ok(Response::Success)
    }

    fn download_completed(
        &mut self,
        item: &DownloadItem,
        now: DateTime<Utc>,
    ) -> ServiceResult<Response> {
        let decision = self.observer.on_download_complete(item, &self.settings, now);
        if let DownloadDecision::Offer { download } = &decision {
            self.recent.record(download).map_err(ServiceError::storage)?;
        }
        Ok(Response::Decision { decision })
    }

    fn convert_recent(&mut self, now: DateTime<Utc>) -> ServiceResult<Response> {
        let download = self
            .recent
            .get_recent(now)
            .map_err(ServiceError::storage)?
            .ok_or(ServiceError::NoRecentDownload)?;
        self.convert_path(download.full_path)
    }

    fn convert_path(&mut self, path: PathBuf) -> ServiceResult<Response> {
        let report = self.converter.convert_file(&path)?;

        if report.is_converted() {
            self.recent.clear().map_err(ServiceError::storage)?;
        }

        let notification = Notification::for_report(&self.settings, &report);
        Ok(Response::Converted {
            report,
            notification,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{EncodingClass, MemorySink};
    use crate::core::StatusLevel;
    use chrono::Duration;
    use std::fs;
    use tempfile::TempDir;

    fn service(dir: &TempDir) -> ConversionService<MemorySink> {
        ConversionService::new(
            Settings::default(),
            RecentDownloadStore::new(dir.path().join("recent.json")),
            MemorySink::new(),
        )
    }

    #[test]
    fn test_download_then_convert_recent() {
        let temp_dir = TempDir::new().unwrap();
        let csv = temp_dir.path().join("orders.csv");
        fs::write(&csv, "상품,수량\n사과,3\n").unwrap();

        let mut service = service(&temp_dir);
        let now = Utc::now();

        let item = DownloadItem::new(csv.to_string_lossy());
        let response = service.handle_at(Request::DownloadCompleted { item }, now);
        assert!(matches!(
            response,
            Response::Decision { decision: DownloadDecision::Offer { .. } }
        ));

        match service.handle_at(Request::GetRecentDownload, now) {
            Response::RecentDownload { download: Some(d) } => assert_eq!(d.filename, "orders.csv"),
            other => panic!("unexpected {:?}", other),
        }

        match service.handle_at(Request::ConvertRecent, now + Duration::minutes(1)) {
            Response::Converted { report, notification } => {
                assert_eq!(report.class, EncodingClass::ValidUtf8);
                assert_eq!(notification, None);
            }
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(service.converter().sink().len(), 1);
        assert_eq!(
            service.handle_at(Request::GetRecentDownload, now),
            Response::RecentDownload { download: None }
        );
    }

    #[test]
    fn test_convert_file_clears_recent_download() {
        let temp_dir = TempDir::new().unwrap();
        let csv = temp_dir.path().join("orders.csv");
        fs::write(&csv, "a,b\n").unwrap();

        let mut service = service(&temp_dir);
        let now = Utc::now();
        service.handle_at(
            Request::DownloadCompleted {
                item: DownloadItem::new(csv.to_string_lossy()),
            },
            now,
        );

        let response = service.handle_at(Request::ConvertFile { path: csv }, now);
        assert!(matches!(response, Response::Converted { .. }));
        assert_eq!(
            service.handle_at(Request::GetRecentDownload, now),
            Response::RecentDownload { download: None }
        );
    }

    #[test]
    fn test_convert_recent_without_download() {
        let temp_dir = TempDir::new().unwrap();
        let mut service = service(&temp_dir);

        let response = service.handle(Request::ConvertRecent);
        assert_eq!(
            response,
            Response::Error {
                message: "No recent CSV download to convert".to_string(),
                level: StatusLevel::Warning,
            }
        );
    }

    #[test]
    fn test_update_settings_persists_and_notifies() {
        let temp_dir = TempDir::new().unwrap();
        let settings_path = temp_dir.path().join("settings.toml");
        let mut service = service(&temp_dir).with_settings_path(&settings_path);

        let patch = SettingsPatch {
            show_notifications: Some(true),
            ..Default::default()
        };
        assert_eq!(
            service.handle(Request::UpdateSettings { settings: patch }),
            Response::Success
        );
        assert!(Settings::load_from_file(&settings_path).unwrap().show_notifications);

        let csv = temp_dir.path().join("a.csv");
        fs::write(&csv, "x,y\n").unwrap();
        match service.handle(Request::ConvertFile { path: csv }) {
            Response::Converted { notification: Some(n), .. } => {
                assert_eq!(n.message, "a_utf8sig.csv was created");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_read_failure_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let mut service = service(&temp_dir);

        let response = service.handle(Request::ConvertFile {
            path: temp_dir.path().join("gone.csv"),
        });
        match response {
            Response::Error { level, message } => {
                assert_eq!(level, StatusLevel::Error);
                assert!(message.contains("gone.csv"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
