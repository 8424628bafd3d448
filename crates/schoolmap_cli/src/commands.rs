//! Subcommand bodies.

use anyhow::{anyhow, Context};
use log::{info, warn};
use schoolmap_api::{run_server, SchoolsClient, ServerSettings};
use schoolmap_core::map::headless::{HeadlessLoader, HeadlessRuntime};
use schoolmap_core::map::MapConfig;
use schoolmap_core::{
    PageRequest, RepoError, SchoolDocument, SchoolMapView, SchoolRepository,
    SqliteSchoolRepository, StoreSession,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub async fn serve(settings: &ServerSettings, db_path: &Path) -> anyhow::Result<()> {
    let session = StoreSession::file(db_path);
    run_server(settings, session)
        .await
        .with_context(|| format!("server on {} failed", settings.bind_addr()))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub rejected: usize,
}

/// Upserts every document of a JSON array file.
///
/// Documents failing validation are skipped and counted; store errors abort
/// the run.
pub fn import(session: &StoreSession, file: &Path) -> anyhow::Result<ImportSummary> {
    let content =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let documents: Vec<SchoolDocument> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", file.display()))?;

    let summary = session.with_connection(|conn| {
        let repo = SqliteSchoolRepository::new(conn);
        let mut summary = ImportSummary::default();
        for document in &documents {
            match repo.upsert_school(document) {
                Ok(_) => summary.imported += 1,
                Err(RepoError::Validation(err)) => {
                    warn!(
                        "event=school_import module=cli status=rejected school_code={} error={}",
                        document.school_code, err
                    );
                    summary.rejected += 1;
                }
                Err(err) => return Err(err),
            }
        }
        Ok::<_, RepoError>(summary)
    })?;

    info!(
        "event=school_import module=cli status=ok imported={} rejected={}",
        summary.imported, summary.rejected
    );
    Ok(summary)
}

/// Fetches one page from a running server, renders it on the in-memory map
/// and prints what a user would see. `select` clicks the marker at that
/// index before printing the detail panel.
pub async fn preview(
    base_url: &str,
    page: PageRequest,
    select: Option<usize>,
) -> anyhow::Result<String> {
    let client = SchoolsClient::new(base_url)?;
    let runtime = Arc::new(HeadlessRuntime::new());
    let mut view = SchoolMapView::<HeadlessRuntime>::new(MapConfig::default(), page);
    cancel_on_ctrl_c(view.renderer().cancellation_token());

    let report = view
        .open(&client, &HeadlessLoader::ready(Arc::clone(&runtime)))
        .await;
    report.map?;
    let rendered = report.data?;

    let mut out = format!(
        "schools={} placed={} failed={}\n",
        view.school_count(),
        rendered.placed,
        rendered.failures.len()
    );
    let markers = runtime.markers();
    for (index, marker) in markers.iter().enumerate() {
        out.push_str(&format!(
            "[{index}] {} ({:.5}, {:.5})\n",
            marker.title, marker.position.lat, marker.position.lng
        ));
    }
    for failure in &rendered.failures {
        out.push_str(&format!("skipped: {failure}\n"));
    }

    if let Some(index) = select {
        let marker = markers
            .get(index)
            .ok_or_else(|| anyhow!("no marker at index {index} ({} placed)", markers.len()))?;
        runtime.click(marker.marker);
    }
    out.push_str(&view.detail().to_string());
    out.push('\n');

    view.renderer_mut().teardown();
    Ok(out)
}

fn cancel_on_ctrl_c(token: CancellationToken) {
    actix_web::rt::spawn(async move {
        if actix_web::rt::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::import;
    use schoolmap_core::{list_schools, PageRequest, StoreSession};

    const DOCUMENTS: &str = r#"[
        {
            "sdSchulCode": "7010057",
            "atptOfcdcScCode": "B10",
            "schoolName": "Gyeongbok High",
            "schoolLevel": "high",
            "address": "Jongno-gu, Seoul",
            "location": {"type": "Point", "coordinates": [126.9707, 37.5838]},
            "phoneNumber": "02-730-0000"
        },
        {
            "sdSchulCode": "7010058",
            "schoolName": "Nowhere Middle",
            "schoolLevel": "middle",
            "address": "unknown",
            "location": {"type": "Point", "coordinates": ["unknown", 37.5]}
        }
    ]"#;

    #[test]
    fn import_upserts_valid_documents_and_counts_rejects() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("schools.json");
        std::fs::write(&file, DOCUMENTS).unwrap();
        let session = StoreSession::file(dir.path().join("schools.db"));

        let first = import(&session, &file).unwrap();
        assert_eq!((first.imported, first.rejected), (1, 1));

        let again = import(&session, &file).unwrap();
        assert_eq!(again.imported, 1);

        let listing = list_schools(&session, &PageRequest::default()).unwrap();
        assert_eq!(listing.total, 1);
        assert_eq!(listing.schools[0].school_name, "Gyeongbok High");
    }

    #[test]
    fn import_rejects_non_array_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.json");
        std::fs::write(&file, "{\"schoolName\": 1}").unwrap();
        let session = StoreSession::in_memory();

        let err = import(&session, &file).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }
}
