//! Season loading and review against an on-disk registry.

use kisetsu::constants::status;
use kisetsu::domain::{AnimeId, FuzzyDate, Season, SeasonName, SeasonRange, ServiceId};
use kisetsu::library::{AnimeDatabase, AnimeRegistry, SeasonContext, SeasonDatabase, SeasonError};
use kisetsu::models::anime::{AgeRating, AnimeItem};
use kisetsu::services::{
    FetchRequest, FetchResponse, HttpSeasonFetcher, SeasonFetcher, SeasonUi, ServiceManager,
};
use std::cell::RefCell;
use std::path::PathBuf;
use std::time::Duration;

const REMOTE: &str = "https://seasons.example.org/data/";

const SPRING_2018: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<season>
	<info>
		<name>Spring 2018</name>
		<modified>2018-04-01</modified>
	</info>
	<anime>
		<type>1</type>
		<id name="myanimelist">36563</id>
		<id name="kitsu">13882</id>
		<producers>TMS Entertainment, Kodansha</producers>
		<title>Megalo Box</title>
	</anime>
	<anime>
		<type>1</type>
		<id name="myanimelist">35849</id>
		<id name="anilist">99423</id>
		<title>Darling in the FranXX</title>
	</anime>
	<anime>
		<type>3</type>
		<id name="anilist">100388</id>
		<title>Only On AniList</title>
	</anime>
</season>
"#;

#[derive(Default)]
struct RecordingUi {
    statuses: RefCell<Vec<String>>,
    inputs: RefCell<Vec<bool>>,
    errors: RefCell<Vec<(String, String)>>,
}

impl SeasonUi for RecordingUi {
    fn change_status_text(&self, text: &str) {
        self.statuses.borrow_mut().push(text.to_string());
    }

    fn enable_input(&self, enabled: bool) {
        self.inputs.borrow_mut().push(enabled);
    }

    fn display_error_message(&self, text: &str, caption: &str) {
        self.errors
            .borrow_mut()
            .push((text.to_string(), caption.to_string()));
    }
}

#[derive(Default)]
struct RecordingFetcher {
    requests: RefCell<Vec<FetchRequest>>,
}

impl SeasonFetcher for RecordingFetcher {
    fn request(&self, request: FetchRequest) {
        self.requests.borrow_mut().push(request);
    }
}

struct Fixture {
    dir: PathBuf,
    registry: AnimeDatabase,
    services: ServiceManager,
    ui: RecordingUi,
    fetcher: RecordingFetcher,
}

impl Fixture {
    fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("kisetsu-test-{}", uuid::Uuid::new_v4()));
        Self {
            registry: AnimeDatabase::new(dir.join("anime.xml")),
            dir,
            services: ServiceManager::default(),
            ui: RecordingUi::default(),
            fetcher: RecordingFetcher::default(),
        }
    }

    fn seasons(&self, remote: &str) -> SeasonDatabase {
        SeasonDatabase::new(
            self.dir.join("seasons"),
            remote,
            SeasonRange::new(
                Season::new(SeasonName::Winter, 2011),
                Season::new(SeasonName::Spring, 2018),
            ),
        )
    }

    fn ctx(&mut self) -> SeasonContext<'_> {
        SeasonContext {
            registry: &mut self.registry,
            services: &self.services,
            ui: &self.ui,
            fetcher: &self.fetcher,
        }
    }

    fn write_season(&self, file_name: &str, data: &str) {
        let folder = self.dir.join("seasons");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join(file_name), data).unwrap();
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.dir).ok();
    }
}

fn spring_2018() -> Season {
    Season::new(SeasonName::Spring, 2018)
}

fn registry_item(mal_id: i32, title: &str, date_start: FuzzyDate) -> AnimeItem {
    let mut item = AnimeItem::new(ServiceId::MyAnimeList);
    item.set_id(ServiceId::MyAnimeList, mal_id.to_string());
    item.title = title.to_string();
    item.date_start = date_start;
    item
}

#[test]
fn load_cached_season_skips_entries_without_active_service_id() {
    let mut fx = Fixture::new();
    fx.write_season("2018_spring.xml", SPRING_2018);
    let mut seasons = fx.seasons(REMOTE);

    let count = seasons.load_season(spring_2018(), &mut fx.ctx()).unwrap();

    assert_eq!(count, 2);
    assert_eq!(seasons.current_season(), spring_2018());
    assert_eq!(seasons.items(), &[AnimeId::new(36563), AnimeId::new(35849)]);

    let megalo_box = fx.registry.find_item(AnimeId::new(36563)).unwrap();
    assert_eq!(megalo_box.title, "Megalo Box");
    assert_eq!(megalo_box.producers, ["TMS Entertainment", "Kodansha"]);
    assert_eq!(megalo_box.service_id(ServiceId::Kitsu), Some("13882"));
    assert!(fx.registry.find_by_service_id(ServiceId::AniList, "100388").is_none());

    assert!(fx.fetcher.requests.borrow().is_empty());
    assert!(fx.dir.join("anime.xml").exists(), "registry is saved after load");
}

#[test]
fn load_with_other_active_service_keeps_only_its_entries() {
    let mut fx = Fixture::new();
    fx.services.set_current_service_id(ServiceId::AniList);
    fx.write_season("2018_spring.xml", SPRING_2018);
    let mut seasons = fx.seasons(REMOTE);

    let count = seasons.load_season(spring_2018(), &mut fx.ctx()).unwrap();

    assert_eq!(count, 2);
    assert_eq!(seasons.items(), &[AnimeId::new(99423), AnimeId::new(100388)]);
}

#[test]
fn up_to_date_registry_item_is_reused_across_services() {
    let mut fx = Fixture::new();
    let mut existing = AnimeItem::new(ServiceId::Kitsu);
    existing.set_id(ServiceId::Kitsu, "13882");
    existing.title = "Megalo Box (local)".into();
    existing.last_modified = i64::MAX;
    let existing_id = fx.registry.update_item(existing).unwrap();

    fx.write_season("2018_spring.xml", SPRING_2018);
    let mut seasons = fx.seasons(REMOTE);
    seasons.load_season(spring_2018(), &mut fx.ctx()).unwrap();

    assert_eq!(seasons.items()[0], existing_id);
    assert_eq!(
        fx.registry.find_item(existing_id).unwrap().title,
        "Megalo Box (local)"
    );
    assert!(fx.registry.find_item(AnimeId::new(36563)).is_none());
}

#[test]
fn stale_registry_item_is_updated() {
    let mut fx = Fixture::new();
    let mut stale = registry_item(36563, "Megaro Bokusu", FuzzyDate::new(2018, 4, 6));
    stale.last_modified = 1;
    fx.registry.update_item(stale).unwrap();

    fx.write_season("2018_spring.xml", SPRING_2018);
    let mut seasons = fx.seasons(REMOTE);
    seasons.load_season(spring_2018(), &mut fx.ctx()).unwrap();

    let updated = fx.registry.find_item(AnimeId::new(36563)).unwrap();
    assert_eq!(updated.title, "Megalo Box");
    assert_eq!(updated.date_start, FuzzyDate::new(2018, 4, 6));
    assert_eq!(updated.last_modified, 1_522_540_800);
}

#[test]
fn cache_miss_requests_download() {
    let mut fx = Fixture::new();
    let mut seasons = fx.seasons(REMOTE);

    let result = seasons.load_season(spring_2018(), &mut fx.ctx());

    assert!(matches!(
        result,
        Err(SeasonError::NotCached { fetching: true, .. })
    ));
    let requests = fx.fetcher.requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, format!("{REMOTE}2018_spring.xml"));
    assert_eq!(requests[0].filename, "2018_spring.xml");
    assert_eq!(*fx.ui.statuses.borrow(), [status::DOWNLOADING]);
    assert_eq!(*fx.ui.inputs.borrow(), [false]);
}

#[test]
fn cache_miss_without_remote_does_not_fetch() {
    let mut fx = Fixture::new();
    let mut seasons = fx.seasons("");

    let result = seasons.load_season(spring_2018(), &mut fx.ctx());

    assert!(matches!(
        result,
        Err(SeasonError::NotCached {
            fetching: false,
            ..
        })
    ));
    assert!(fx.fetcher.requests.borrow().is_empty());
    assert!(fx.ui.statuses.borrow().is_empty());
}

#[test]
fn unreadable_cache_file_reports_error() {
    let mut fx = Fixture::new();
    fx.write_season("2018_spring.xml", "<season><anime></season>");
    let mut seasons = fx.seasons(REMOTE);

    let result = seasons.load_season(spring_2018(), &mut fx.ctx());

    assert!(matches!(result, Err(SeasonError::Xml(_))));
    let errors = fx.ui.errors.borrow();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, status::READ_FAILED);
    assert!(errors[0].1.ends_with("2018_spring.xml"));
}

#[test]
fn document_without_season_root_is_rejected() {
    let mut fx = Fixture::new();
    let mut seasons = fx.seasons(REMOTE);

    let result = seasons.load_string("<catalogue/>", &mut fx.registry, &fx.services);

    assert!(matches!(result, Err(SeasonError::MissingSeason)));
    assert!(seasons.items().is_empty());
}

#[test]
fn fetch_response_is_loaded_and_cached() {
    let mut fx = Fixture::new();
    let mut seasons = fx.seasons(REMOTE);
    let request = FetchRequest::season(REMOTE, "2018_spring.xml");

    let count = seasons
        .handle_fetch_response(
            FetchResponse {
                request,
                body: Ok(SPRING_2018.to_string()),
            },
            &mut fx.ctx(),
        )
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(*fx.ui.inputs.borrow(), [true]);
    assert_eq!(*fx.ui.statuses.borrow(), [""]);

    let cached = fx.dir.join("seasons").join("2018_spring.xml");
    assert_eq!(std::fs::read_to_string(cached).unwrap(), SPRING_2018);

    seasons.reset();
    let count = seasons.load_season(spring_2018(), &mut fx.ctx()).unwrap();
    assert_eq!(count, 2);
}

#[test]
fn failed_fetch_is_not_cached() {
    let mut fx = Fixture::new();
    let mut seasons = fx.seasons(REMOTE);

    let result = seasons.handle_fetch_response(
        FetchResponse {
            request: FetchRequest::season(REMOTE, "2018_spring.xml"),
            body: Err("connection refused".into()),
        },
        &mut fx.ctx(),
    );
    assert!(matches!(result, Err(SeasonError::Fetch { .. })));
    assert_eq!(*fx.ui.statuses.borrow(), [status::DOWNLOAD_FAILED]);

    let result = seasons.handle_fetch_response(
        FetchResponse {
            request: FetchRequest::season(REMOTE, "2018_spring.xml"),
            body: Ok("<html>Not Found</html>".into()),
        },
        &mut fx.ctx(),
    );
    assert!(result.is_err());
    assert!(!fx.dir.join("seasons").join("2018_spring.xml").exists());
}

#[test]
fn review_removes_out_of_season_and_adds_in_season_items() {
    let mut fx = Fixture::new();
    let inside = fx
        .registry
        .update_item(registry_item(1, "Inside", FuzzyDate::new(2018, 5, 12)))
        .unwrap();
    let month_only = fx
        .registry
        .update_item(registry_item(2, "Month Only", FuzzyDate::new(2018, 4, 0)))
        .unwrap();
    let outside = fx
        .registry
        .update_item(registry_item(3, "Outside", FuzzyDate::new(2018, 7, 1)))
        .unwrap();
    let undated = fx
        .registry
        .update_item(registry_item(4, "Undated", FuzzyDate::default()))
        .unwrap();
    let year_only = fx
        .registry
        .update_item(registry_item(5, "Year Only", FuzzyDate::new(2018, 0, 0)))
        .unwrap();

    fx.write_season(
        "2018_spring.xml",
        r#"<season>
            <info><name>Spring 2018</name><modified>0</modified></info>
            <anime><id name="myanimelist">3</id><title>Outside</title></anime>
            <anime><id name="myanimelist">4</id><title>Undated</title></anime>
            <anime><id name="myanimelist">5</id><title>Year Only</title></anime>
        </season>"#,
    );
    let mut seasons = fx.seasons(REMOTE);
    seasons.load_season(spring_2018(), &mut fx.ctx()).unwrap();
    assert_eq!(seasons.items(), &[outside, undated, year_only]);

    seasons.review(&fx.registry, &fx.services, false);

    assert_eq!(seasons.items(), &[undated, inside, month_only]);
    assert!(!seasons.items().contains(&outside));
    assert!(!seasons.items().contains(&year_only));
}

#[test]
fn review_hides_nsfw_only_when_asked() {
    let mut fx = Fixture::new();
    let safe = fx
        .registry
        .update_item(registry_item(10, "Safe", FuzzyDate::new(2018, 4, 1)))
        .unwrap();
    let mut adult = registry_item(11, "Adult", FuzzyDate::new(2018, 4, 2));
    adult.age_rating = AgeRating::Rx;
    let adult = fx.registry.update_item(adult).unwrap();
    let mut tagged = registry_item(12, "Tagged", FuzzyDate::new(2018, 4, 3));
    tagged.genres = vec!["Hentai".into()];
    let tagged = fx.registry.update_item(tagged).unwrap();

    let mut seasons = fx.seasons(REMOTE);
    seasons.load_season_from_memory(spring_2018(), &fx.registry, &fx.services);
    assert_eq!(seasons.items(), &[safe, adult, tagged]);

    seasons.review(&fx.registry, &fx.services, true);
    assert_eq!(seasons.items(), &[safe]);
}

#[test]
fn review_with_other_service_logs_plain_additions() {
    let mut fx = Fixture::new();
    fx.services.set_current_service_id(ServiceId::Kitsu);
    let id = fx
        .registry
        .update_item(registry_item(20, "Plain", FuzzyDate::new(2018, 6, 30)))
        .unwrap();

    let mut seasons = fx.seasons(REMOTE);
    seasons.load_season_from_memory(spring_2018(), &fx.registry, &fx.services);

    assert_eq!(seasons.items(), &[id]);
}

#[test]
fn refresh_required_after_twenty_incomplete_items() {
    let mut fx = Fixture::new();
    for id in 1..=21 {
        fx.registry
            .update_item(registry_item(id, "Incomplete", FuzzyDate::new(2018, 4, 1)))
            .unwrap();
    }

    let mut seasons = fx.seasons(REMOTE);
    seasons.load_season_from_memory(spring_2018(), &fx.registry, &fx.services);
    assert_eq!(seasons.items().len(), 21);
    assert!(seasons.is_refresh_required(&fx.registry));

    let mut fx = Fixture::new();
    for id in 1..=21 {
        let mut item = registry_item(id, "Complete", FuzzyDate::new(2018, 4, 1));
        item.synopsis = "Known".into();
        fx.registry.update_item(item).unwrap();
    }
    let mut seasons = fx.seasons(REMOTE);
    seasons.load_season_from_memory(spring_2018(), &fx.registry, &fx.services);
    assert!(!seasons.is_refresh_required(&fx.registry));
}

#[test]
fn reset_forgets_season() {
    let mut fx = Fixture::new();
    fx.write_season("2018_spring.xml", SPRING_2018);
    let mut seasons = fx.seasons(REMOTE);
    seasons.load_season(spring_2018(), &mut fx.ctx()).unwrap();

    seasons.reset();

    assert!(seasons.items().is_empty());
    assert!(seasons.current_season().is_unknown());
}

#[tokio::test]
async fn http_fetcher_download_completes_load() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let remote = format!("http://{}/data/", listener.local_addr().unwrap());

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await.unwrap();
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            SPRING_2018.len(),
            SPRING_2018
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let fetcher = HttpSeasonFetcher::with_timeout(
        Duration::from_secs(5),
        "kisetsu-test",
        tokio::runtime::Handle::current(),
        tx,
    )
    .unwrap();

    let mut fx = Fixture::new();
    let mut seasons = fx.seasons(&remote);
    let mut ctx = SeasonContext {
        registry: &mut fx.registry,
        services: &fx.services,
        ui: &fx.ui,
        fetcher: &fetcher,
    };

    let result = seasons.load_season(spring_2018(), &mut ctx);
    assert!(matches!(
        result,
        Err(SeasonError::NotCached { fetching: true, .. })
    ));

    let response = rx.recv().await.unwrap();
    assert!(response.body.is_ok());
    let count = seasons.handle_fetch_response(response, &mut ctx).unwrap();

    assert_eq!(count, 2);
    assert!(fx.dir.join("seasons").join("2018_spring.xml").exists());
    assert_eq!(*fx.ui.inputs.borrow(), [false, true]);
}

#[test]
fn review_drops_duplicate_ids() {
    let mut fx = Fixture::new();
    let mut seasons = fx.seasons(REMOTE);

    let count = seasons
        .load_string(
            r#"<season>
                <info><name>Spring 2018</name><modified>0</modified></info>
                <anime><id name="myanimelist">7</id><title>Twice Listed</title></anime>
                <anime><id name="myanimelist">7</id><title>Twice Listed</title></anime>
            </season>"#,
            &mut fx.registry,
            &fx.services,
        )
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(seasons.items(), &[AnimeId::new(7), AnimeId::new(7)]);

    seasons.review(&fx.registry, &fx.services, false);

    assert_eq!(seasons.items(), &[AnimeId::new(7)]);
}

#[test]
fn cache_write_failure_still_completes_load() {
    let mut fx = Fixture::new();
    std::fs::create_dir_all(&fx.dir).unwrap();
    std::fs::write(fx.dir.join("seasons"), "not a folder").unwrap();
    let mut seasons = fx.seasons(REMOTE);

    let count = seasons
        .handle_fetch_response(
            FetchResponse {
                request: FetchRequest::season(REMOTE, "2018_spring.xml"),
                body: Ok(SPRING_2018.to_string()),
            },
            &mut fx.ctx(),
        )
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(seasons.items().len(), 2);
    assert_eq!(*fx.ui.statuses.borrow(), [""]);
    assert!(fx.dir.join("seasons").is_file());
}
