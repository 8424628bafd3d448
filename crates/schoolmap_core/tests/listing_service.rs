use schoolmap_core::db::DbError;
use schoolmap_core::{
    list_schools, GeoPoint, ListingError, ListingService, PageRequest, PageWindow, RepoError,
    RepoResult, School, SchoolDocument, SchoolId, SchoolRepository, StoreSession,
};

fn seeded_session(count: usize) -> StoreSession {
    let session = StoreSession::in_memory();
    session
        .with_connection(|conn| {
            let repo = schoolmap_core::SqliteSchoolRepository::new(conn);
            for index in 0..count {
                repo.upsert_school(&SchoolDocument {
                    school_code: format!("S{index:03}"),
                    office_code: None,
                    school_name: format!("School {index}"),
                    school_level: "elementary".to_string(),
                    address: format!("{index} Sejong-daero"),
                    location: GeoPoint::point(126.9 + index as f64 * 0.01, 37.5),
                    phone_number: None,
                    homepage_url: Some(format!("https://s{index}.example")),
                })?;
            }
            Ok::<_, RepoError>(())
        })
        .unwrap();
    session
}

#[test]
fn page_of_two_reports_full_total() {
    let session = seeded_session(5);

    let listing = list_schools(&session, &PageRequest::from_params(Some("2"), Some("0"))).unwrap();

    assert_eq!(listing.schools.len(), 2);
    assert_eq!(listing.total, 5);
    assert_eq!(listing.limit, 2);
    assert_eq!(listing.skip, 0);
}

#[test]
fn total_is_independent_of_window() {
    let session = seeded_session(7);

    for (limit, skip) in [(0, 0), (1, 0), (3, 2), (100, 0), (5, 6), (2, 50)] {
        let listing = list_schools(&session, &PageRequest::new(limit, skip)).unwrap();
        assert!(listing.schools.len() <= limit as usize);
        assert_eq!(listing.total, 7);
    }
}

#[test]
fn malformed_pagination_matches_defaults() {
    let session = seeded_session(3);

    let defaults = list_schools(&session, &PageRequest::new(100, 0)).unwrap();
    for (limit, skip) in [
        (None, None),
        (Some("abc"), Some("xyz")),
        (Some(""), Some("-1")),
        (Some("1.5"), None),
    ] {
        let listing = list_schools(&session, &PageRequest::from_params(limit, skip)).unwrap();
        assert_eq!(listing, defaults);
    }
}

#[test]
fn listing_never_exposes_homepage_or_timestamps() {
    let session = seeded_session(4);
    let listing = list_schools(&session, &PageRequest::default()).unwrap();

    let body = serde_json::to_value(&listing).unwrap();
    for school in body["schools"].as_array().unwrap() {
        let object = school.as_object().unwrap();
        for hidden in ["homepageUrl", "createdAt", "updatedAt", "sdSchulCode"] {
            assert!(!object.contains_key(hidden), "{hidden} leaked");
        }
    }
}

#[test]
fn unreachable_store_reports_store_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let session = StoreSession::file(dir.path().join("no-such-dir").join("schools.db"));

    let err = list_schools(&session, &PageRequest::default()).unwrap_err();
    assert!(matches!(err, ListingError::StoreUnavailable(RepoError::Db(_))));
}

struct FailingCountRepo;

impl SchoolRepository for FailingCountRepo {
    fn find_schools(&self, _window: PageWindow) -> RepoResult<Vec<School>> {
        Ok(Vec::new())
    }

    fn count_schools(&self) -> RepoResult<u64> {
        Err(RepoError::Db(DbError::SessionPoisoned))
    }

    fn upsert_school(&self, _document: &SchoolDocument) -> RepoResult<SchoolId> {
        unreachable!("listing is read-only")
    }
}

#[test]
fn query_failure_returns_no_partial_results() {
    let service = ListingService::new(FailingCountRepo);

    let err = service.list(&PageRequest::default()).unwrap_err();
    assert!(err.to_string().contains("school store unavailable"));
}
