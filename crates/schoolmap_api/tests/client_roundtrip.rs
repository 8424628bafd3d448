use actix_web::{web, App, HttpServer};
use schoolmap_api::{configure_routes, SchoolsClient};
use schoolmap_core::map::headless::{HeadlessLoader, HeadlessRuntime};
use schoolmap_core::map::MapConfig;
use schoolmap_core::{
    DetailView, GeoPoint, PageRequest, RepoError, SchoolDocument, SchoolMapView, SchoolRepository,
    SchoolSource, SourceError, SqliteSchoolRepository, StoreSession,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

fn document(code: &str, name: &str, lng: f64, lat: f64, phone: Option<&str>) -> SchoolDocument {
    SchoolDocument {
        school_code: code.to_string(),
        office_code: Some("B10".to_string()),
        school_name: name.to_string(),
        school_level: "elementary".to_string(),
        address: format!("{name} street 1"),
        location: GeoPoint::point(lng, lat),
        phone_number: phone.map(str::to_string),
        homepage_url: None,
    }
}

fn seeded_session(path: PathBuf) -> StoreSession {
    let session = StoreSession::file(path);
    session
        .with_connection(|conn| {
            let repo = SqliteSchoolRepository::new(conn);
            repo.upsert_school(&document("7010001", "Seoul Elementary", 126.97, 37.56, Some("02-000-0001")))?;
            repo.upsert_school(&document("7010002", "Mapo Elementary", 126.90, 37.55, None))?;
            repo.upsert_school(&document("7010003", "Jongno Elementary", 126.99, 37.57, Some("  ")))?;
            Ok::<_, RepoError>(())
        })
        .unwrap();
    session
}

fn spawn_server(session: StoreSession) -> SocketAddr {
    let session = web::Data::new(session);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(session.clone())
            .configure(configure_routes)
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    addr
}

#[actix_web::test]
async fn client_fetches_pages_from_running_server() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(seeded_session(dir.path().join("schools.db")));
    let client = SchoolsClient::new(format!("http://{addr}")).unwrap();

    let all = client.fetch_schools(PageRequest::default()).await.unwrap();
    assert_eq!(all.total, 3);
    assert_eq!(all.schools.len(), 3);

    let page = client.fetch_schools(PageRequest::new(2, 1)).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.schools, all.schools[1..3].to_vec());
}

#[actix_web::test]
async fn client_reports_store_failure_as_status_error() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(StoreSession::file(dir.path().join("missing").join("schools.db")));
    let client = SchoolsClient::new(format!("http://{addr}")).unwrap();

    let err = client.fetch_schools(PageRequest::default()).await.unwrap_err();
    match err {
        SourceError::Status { code, message } => {
            assert_eq!(code, 500);
            assert!(message.contains("unavailable"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[actix_web::test]
async fn client_reports_unreachable_server_as_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = SchoolsClient::new(format!("http://{addr}")).unwrap();

    let err = client.fetch_schools(PageRequest::default()).await.unwrap_err();
    assert!(matches!(err, SourceError::Transport(_)));
}

#[actix_web::test]
async fn map_view_renders_served_schools() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(seeded_session(dir.path().join("schools.db")));
    let client = SchoolsClient::new(format!("http://{addr}")).unwrap();
    let runtime = Arc::new(HeadlessRuntime::new());
    let mut view =
        SchoolMapView::<HeadlessRuntime>::new(MapConfig::default(), PageRequest::default());

    let report = view
        .open(&client, &HeadlessLoader::ready(Arc::clone(&runtime)))
        .await;
    report.map.unwrap();
    assert_eq!(report.data.unwrap().placed, 3);
    assert_eq!(runtime.marker_count(), 3);

    let jongno = runtime
        .markers()
        .into_iter()
        .find(|marker| marker.title == "Jongno Elementary")
        .unwrap();
    assert!(runtime.click(jongno.marker));

    let DetailView::School { title, fields } = view.detail() else {
        panic!("expected school detail");
    };
    assert_eq!(title, "Jongno Elementary");
    let labels = fields.iter().map(|field| field.label).collect::<Vec<_>>();
    assert_eq!(labels, ["Level", "Address"]);
}
