// crates.io
use httpmock::{Mock, prelude::*};
use time::macros;
// self
use fitbit_link::{
	_preludet::*,
	api::{
		BodyGoalType, BodyResource, DateRange, DetailLevel, FitbitClient, LogListQuery,
		NutritionResource, Period,
	},
	auth::{ScopeSet, TokenRecord, UserId},
	store::BrokerStore,
};

const USER: &str = "5HXR2P";

async fn client(server: &MockServer) -> FitbitClient {
	let (broker, store) =
		build_reqwest_test_broker(mock_descriptor(&server.base_url()), "23ABCD", "secret");
	let record = TokenRecord::builder(
		UserId::new(USER).expect("User fixture should be valid."),
		ScopeSet::all(),
	)
	.access_token("access-endpoints")
	.refresh_token("refresh-endpoints")
	.issued_now()
	.expires_in(Duration::hours(8))
	.build()
	.expect("Record fixture should build.");

	store.save(record).await.expect("Seeding the record should succeed.");

	build_test_client(broker, USER)
}

async fn stub<'a>(server: &'a MockServer, path: &str, body: &str) -> Mock<'a> {
	server
		.mock_async(|when, then| {
			when.method(GET).path(path).header("authorization", "Bearer access-endpoints");
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

fn range() -> DateRange {
	DateRange::new(macros::date!(2025 - 02 - 24), macros::date!(2025 - 03 - 01))
		.expect("Range fixture should be valid.")
}

#[tokio::test]
async fn nutrition_paths_mix_user_and_catalog_roots() {
	let server = MockServer::start_async().await;
	let date = macros::date!(2025 - 03 - 01);
	let log = stub(&server, "/1/user/-/foods/log/date/2025-03-01.json", "{\"foods\":[]}").await;
	let food = stub(&server, "/1/foods/42.json", "{\"food\":{\"foodId\":42}}").await;
	let units = stub(&server, "/1/foods/units.json", "[]").await;
	let water = stub(&server, "/1/user/-/foods/log/water/goal.json", "{}").await;
	let meal = stub(&server, "/1/user/-/meals/7.json", "{}").await;
	let series =
		stub(&server, "/1/user/-/foods/log/caloriesIn/date/2025-03-01/30d.json", "{}").await;
	let ranged =
		stub(&server, "/1/user/-/foods/log/water/date/2025-02-24/2025-03-01.json", "{}").await;
	let search = server
		.mock_async(|when, then| {
			when.method(GET).path("/1/foods/search.json").query_param("query", "oat milk");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"foods\":[{\"foodId\":9}]}");
		})
		.await;
	let client = client(&server).await;

	client.food_log(date).await.expect("Food log should succeed.");

	assert_eq!(client.food(42).await.expect("Food lookup should succeed.")["food"]["foodId"], 42);

	client.food_units().await.expect("Food units should succeed.");
	client.water_goal().await.expect("Water goal should succeed.");
	client.meal(7).await.expect("Meal lookup should succeed.");
	client
		.nutrition_time_series(NutritionResource::CaloriesIn, date, Period::ThirtyDays)
		.await
		.expect("Nutrition series should succeed.");
	client
		.nutrition_time_series_by_range(NutritionResource::Water, range())
		.await
		.expect("Ranged nutrition series should succeed.");

	let foods = client.search_foods("  oat milk ").await.expect("Food search should succeed.");

	assert_eq!(foods[0]["foodId"], 9);

	for mock in [log, food, units, water, meal, series, ranged, search] {
		mock.assert_async().await;
	}

	let err = client.search_foods("   ").await.expect_err("Blank searches should be rejected.");

	assert!(matches!(err, Error::InvalidArgument { .. }));
}

#[tokio::test]
async fn body_paths_cover_goals_logs_and_series() {
	let server = MockServer::start_async().await;
	let date = macros::date!(2025 - 03 - 01);
	let goal = stub(&server, "/1/user/-/body/log/weight/goal.json", "{}").await;
	let fat = stub(&server, "/1/user/-/body/log/fat/date/2025-03-01.json", "{}").await;
	let bmi = stub(&server, "/1/user/-/body/bmi/date/2025-03-01/3m.json", "{}").await;
	let weight = stub(&server, "/1/user/-/body/log/weight/date/2025-03-01/1w.json", "{}").await;
	let ranged =
		stub(&server, "/1/user/-/body/log/fat/date/2025-02-24/2025-03-01.json", "{}").await;
	let client = client(&server).await;

	client.body_goals(BodyGoalType::Weight).await.expect("Body goal should succeed.");
	client.body_fat_log(date).await.expect("Body fat log should succeed.");
	client
		.body_time_series(BodyResource::Bmi, date, Period::ThreeMonths)
		.await
		.expect("Body series should succeed.");
	client
		.body_weight_time_series(date, Period::OneWeek)
		.await
		.expect("Weight log series should succeed.");
	client.body_fat_time_series_by_range(range()).await.expect("Fat range should succeed.");

	for mock in [goal, fat, bmi, weight, ranged] {
		mock.assert_async().await;
	}

	let err = client
		.body_weight_time_series(date, Period::ThreeMonths)
		.await
		.expect_err("Body log series only accept short periods.");

	assert!(matches!(err, Error::InvalidArgument { .. }));
}

#[tokio::test]
async fn sleep_paths_use_api_version_1_2() {
	let server = MockServer::start_async().await;
	let goal =
		stub(&server, "/1.2/user/-/sleep/goal.json", "{\"goal\":{\"minDuration\":420}}").await;
	let day =
		stub(&server, "/1.2/user/-/sleep/date/2025-03-01.json", "{\"sleep\":[{\"logId\":1}]}")
			.await;
	let ranged =
		stub(&server, "/1.2/user/-/sleep/date/2025-02-24/2025-03-01.json", "{\"sleep\":[]}").await;
	let client = client(&server).await;
	let goal_body = client.sleep_goal().await.expect("Sleep goal should succeed.");

	assert_eq!(goal_body["goal"]["minDuration"], 420);

	let logs = client
		.sleep_log(macros::date!(2025 - 03 - 01))
		.await
		.expect("Sleep log should succeed.");

	assert_eq!(logs[0]["logId"], 1);
	assert_eq!(
		client.sleep_log_by_range(range()).await.expect("Ranged sleep log should succeed."),
		JsonValue::Array(Vec::new())
	);

	for mock in [goal, day, ranged] {
		mock.assert_async().await;
	}
}

#[tokio::test]
async fn vitals_paths_follow_their_short_prefixes() {
	let server = MockServer::start_async().await;
	let date = macros::date!(2025 - 03 - 01);
	let core = stub(&server, "/1/user/-/temp/core/date/2025-03-01.json", "{}").await;
	let skin = stub(&server, "/1/user/-/temp/skin/date/2025-02-24/2025-03-01.json", "{}").await;
	let spo2 = stub(&server, "/1/user/-/spo2/date/2025-03-01.json", "{}").await;
	let spo2_intraday = stub(&server, "/1/user/-/spo2/date/2025-03-01/all.json", "{}").await;
	let breathing = stub(&server, "/1/user/-/br/date/2025-02-24/2025-03-01.json", "{}").await;
	let breathing_intraday = stub(&server, "/1/user/-/br/date/2025-03-01/all.json", "{}").await;
	let cardio = stub(&server, "/1/user/-/cardioscore/date/2025-03-01.json", "{}").await;
	let client = client(&server).await;

	client.core_temperature(date).await.expect("Core temperature should succeed.");
	client.skin_temperature_by_range(range()).await.expect("Skin temperature should succeed.");
	client.spo2_summary(date).await.expect("SpO2 summary should succeed.");
	client.spo2_intraday(date).await.expect("SpO2 intraday should succeed.");
	client.breathing_rate_summary_by_range(range()).await.expect("Breathing range should succeed.");
	client.breathing_rate_intraday(date).await.expect("Breathing intraday should succeed.");
	client.vo2_max_summary(date).await.expect("Cardio score should succeed.");

	for mock in [core, skin, spo2, spo2_intraday, breathing, breathing_intraday, cardio] {
		mock.assert_async().await;
	}
}

#[tokio::test]
async fn social_paths_use_api_version_1_1_and_unwrap_badges() {
	let server = MockServer::start_async().await;
	let friends = stub(&server, "/1.1/user/-/friends.json", "{\"data\":[]}").await;
	let leaderboard = stub(&server, "/1.1/user/-/leaderboard/friends.json", "{\"data\":[]}").await;
	let badges = stub(
		&server,
		"/1/user/-/badges.json",
		"{\"badges\":[{\"badgeType\":\"LIFETIME_FLOORS\"}]}",
	)
	.await;
	let client = client(&server).await;

	client.friends().await.expect("Friends should succeed.");
	client.friends_leaderboard().await.expect("Leaderboard should succeed.");

	let earned = client.badges().await.expect("Badges should succeed.");

	assert_eq!(earned[0]["badgeType"], "LIFETIME_FLOORS");

	for mock in [friends, leaderboard, badges] {
		mock.assert_async().await;
	}
}

#[tokio::test]
async fn azm_paths_and_detail_levels() {
	let server = MockServer::start_async().await;
	let date = macros::date!(2025 - 03 - 01);
	let period =
		stub(&server, "/1/user/-/activities/active-zone-minutes/date/2025-03-01/7d.json", "{}")
			.await;
	let interval = stub(
		&server,
		"/1/user/-/activities/active-zone-minutes/date/2025-02-24/2025-03-01.json",
		"{}",
	)
	.await;
	let intraday = stub(
		&server,
		"/1/user/-/activities/active-zone-minutes/date/2025-03-01/1d/5min.json",
		"{}",
	)
	.await;
	let client = client(&server).await;

	client.azm_by_period(date, Period::SevenDays).await.expect("AZM series should succeed.");
	client.azm_by_interval(range()).await.expect("AZM range should succeed.");
	client
		.azm_intraday(date, DetailLevel::FiveMinutes)
		.await
		.expect("AZM intraday should succeed.");

	for mock in [period, interval, intraday] {
		mock.assert_async().await;
	}

	let err = client
		.azm_intraday(date, DetailLevel::OneSecond)
		.await
		.expect_err("AZM intraday has no second-level detail.");

	assert!(matches!(err, Error::InvalidArgument { .. }));
}

#[tokio::test]
async fn ecg_and_irn_lists_page_from_the_anchor_date() {
	let server = MockServer::start_async().await;
	let date = macros::date!(2025 - 03 - 01);
	let ecg = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/1/user/-/ecg/list.json")
				.query_param("afterDate", "2025-03-01")
				.query_param("sort", "asc")
				.query_param("limit", "10")
				.query_param("offset", "0");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"ecgReadings\":[{\"resultClassification\":\"Normal Sinus Rhythm\"}]}");
		})
		.await;
	let irn = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/1/user/-/irn/alerts/list.json")
				.query_param("beforeDate", "2025-03-01")
				.query_param("sort", "desc")
				.query_param("limit", "5");
			then.status(200).header("content-type", "application/json").body("{\"alerts\":[]}");
		})
		.await;
	let profile = stub(&server, "/1/user/-/irn/profile.json", "{\"onboarded\":true}").await;
	let client = client(&server).await;
	let readings =
		client.ecg_log_list(LogListQuery::after(date)).await.expect("ECG list should succeed.");

	assert_eq!(readings[0]["resultClassification"], "Normal Sinus Rhythm");

	client
		.irn_alerts(LogListQuery::before(date).limit(5))
		.await
		.expect("IRN alerts should succeed.");

	assert_eq!(client.irn_profile().await.expect("IRN profile should succeed.")["onboarded"], true);

	for mock in [ecg, irn, profile] {
		mock.assert_async().await;
	}

	let err = client
		.ecg_log_list(LogListQuery::after(date).limit(11))
		.await
		.expect_err("ECG pages hold at most 10 readings.");

	assert!(matches!(err, Error::InvalidArgument { .. }));
}
