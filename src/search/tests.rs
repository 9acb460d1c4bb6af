//! Tests for the search session controller.

use super::*;
use crate::models::RecipeId;
use crate::query::{Cuisine, Diet};
use pretty_assertions::assert_eq;

fn offline_api() -> Arc<RecipeApi> {
    Arc::new(RecipeApi::new().with_base_url("http://127.0.0.1:9").with_api_key("k"))
}

fn summary(id: u64, title: &str) -> RecipeSummary {
    RecipeSummary {
        id: RecipeId::from(id),
        title: title.to_string(),
        image: None,
        ready_in_minutes: None,
        servings: None,
        used_ingredient_count: None,
        missed_ingredient_count: None,
    }
}

fn outcome(recipes: Vec<RecipeSummary>) -> Result<SearchOutcome, EatMateError> {
    Ok(SearchOutcome { recipes, total_results: None })
}

#[test]
fn new_session_is_idle_and_unsearched() {
    let session = SearchSession::ingredients(offline_api());

    assert_eq!(session.state(), SearchState::Idle);
    assert!(!session.has_searched());
    assert!(session.results().is_empty());
    assert!(!session.can_submit());
}

#[test]
fn begin_enters_searching_before_any_outcome() {
    let mut session = SearchSession::ingredients(offline_api());
    session.criteria_mut().add("eggs");

    let ticket = session.begin().unwrap();
    assert_eq!(session.state(), SearchState::Searching);
    assert!(session.has_searched());
    assert!(!session.can_submit());

    assert!(session.complete(&ticket, outcome(vec![summary(1, "Omelette")])));
    assert_eq!(session.state(), SearchState::Results);
}

#[test]
fn empty_response_is_no_results_not_failure() {
    let mut session = SearchSession::nutrients(offline_api());

    let ticket = session.begin().unwrap();
    session.complete(&ticket, outcome(vec![]));

    assert_eq!(session.state(), SearchState::NoResults);
    assert_eq!(session.error_message(), None);
}

#[test]
fn failure_keeps_has_searched() {
    let mut session = SearchSession::nutrients(offline_api());

    let ticket = session.begin().unwrap();
    session.complete(&ticket, Err(EatMateError::Network("reset".to_string())));

    assert_eq!(session.state(), SearchState::Failed);
    assert!(session.has_searched());
    assert_eq!(session.error_message(), Some(crate::error::TRY_AGAIN_MESSAGE));
}

#[test]
fn new_results_replace_previous_set() {
    let mut session = SearchSession::ingredients(offline_api());
    session.criteria_mut().add("rice");

    let first = session.begin().unwrap();
    session.complete(&first, outcome(vec![summary(1, "A"), summary(2, "B")]));

    let second = session.begin().unwrap();
    session.complete(&second, outcome(vec![summary(3, "C")]));

    assert_eq!(session.results(), &[summary(3, "C")]);
}

#[test]
fn begin_clears_previous_results() {
    let mut session = SearchSession::parameters(offline_api());
    session.criteria_mut().query = "soup".to_string();

    let first = session.begin().unwrap();
    session.complete(&first, Ok(SearchOutcome { recipes: vec![summary(1, "Miso")], total_results: Some(1) }));
    assert_eq!(session.results().len(), 1);

    session.begin().unwrap();
    assert_eq!(session.state(), SearchState::Searching);
    assert!(session.results().is_empty());
    assert_eq!(session.total_results(), None);
}

#[test]
fn unsubmittable_parameter_criteria_is_a_no_op() {
    let mut session = SearchSession::parameters(offline_api());

    assert!(session.begin().is_none());
    assert_eq!(session.state(), SearchState::Idle);
    assert!(!session.has_searched());
}

#[tokio::test]
async fn submit_with_empty_ingredients_does_nothing() {
    let mut session = SearchSession::ingredients(offline_api());

    assert!(!session.submit().await);
    assert_eq!(session.state(), SearchState::Idle);
    assert!(!session.has_searched());
}

#[test]
fn stale_response_does_not_clobber_newer_one() {
    let mut session = SearchSession::ingredients(offline_api());
    session.criteria_mut().add("tomato");

    let older = session.begin().unwrap();
    let newer = session.begin().unwrap();

    assert!(session.complete(&newer, outcome(vec![summary(2, "Newer")])));
    assert!(!session.complete(&older, outcome(vec![summary(1, "Older")])));

    assert_eq!(session.results(), &[summary(2, "Newer")]);
    assert_eq!(session.state(), SearchState::Results);
}

#[test]
fn stale_failure_is_ignored_while_newer_is_pending() {
    let mut session = SearchSession::nutrients(offline_api());

    let older = session.begin().unwrap();
    let _newer = session.begin().unwrap();

    assert!(!session.complete(&older, Err(EatMateError::Network("late".to_string()))));
    assert_eq!(session.state(), SearchState::Searching);
}

#[test]
fn late_response_after_teardown_is_discarded() {
    let mut session = SearchSession::nutrients(offline_api());

    let ticket = session.begin().unwrap();
    session.teardown();

    assert!(!session.complete(&ticket, outcome(vec![summary(1, "Late")])));
    assert!(session.results().is_empty());
    assert!(session.begin().is_none());
}

#[tokio::test]
async fn submit_populates_results_from_api() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/recipes/complexSearch")
        .match_query(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("query".into(), "curry".into()),
            mockito::Matcher::UrlEncoded("diet".into(), "vegan".into()),
        ]))
        .with_status(200)
        .with_body(
            serde_json::json!({
                "results": [
                    {"id": 10, "title": "Chickpea Curry"},
                    {"id": 11, "title": "Lentil Curry"}
                ],
                "totalResults": 2
            })
            .to_string(),
        )
        .create_async()
        .await;

    let api = Arc::new(RecipeApi::new().with_base_url(&server.url()).with_api_key("k"));
    let mut session = SearchSession::with_criteria(
        api,
        SearchMode::parameters(),
        ParameterCriteria { query: "curry".to_string(), cuisine: Cuisine::Any, diet: Diet::Vegan },
    );

    assert!(session.submit().await);

    mock.assert_async().await;
    assert_eq!(session.state(), SearchState::Results);
    assert_eq!(session.total_results(), Some(2));
    let titles: Vec<&str> = session.results().iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Chickpea Curry", "Lentil Curry"]);
}

#[tokio::test]
async fn submit_converts_server_error_into_failed_state() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/recipes/findByIngredients")
        .with_status(500)
        .with_body(r#"{"message":"boom"}"#)
        .create_async()
        .await;

    let api = Arc::new(RecipeApi::new().with_base_url(&server.url()).with_api_key("k"));
    let mut session = SearchSession::ingredients(api);
    session.criteria_mut().add("kale");

    assert!(session.submit().await);
    assert_eq!(session.state(), SearchState::Failed);
    assert!(session.has_searched());
    assert!(session.results().is_empty());
}

#[tokio::test]
async fn submit_after_teardown_is_rejected() {
    let mut session = SearchSession::nutrients(offline_api());
    session.teardown();

    assert!(!session.submit().await);
    assert_eq!(session.state(), SearchState::Idle);
}

#[tokio::test(start_paused = true)]
async fn slow_server_keeps_search_pending_until_teardown() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let api = Arc::new(RecipeApi::new().with_base_url(&url).with_api_key("k"));
    let mut session = SearchSession::ingredients(api);
    session.criteria_mut().add("beans");

    tokio::select! {
        applied = session.submit() => panic!("search settled without a response (applied={})", applied),
        _ = tokio::time::sleep(std::time::Duration::from_secs(300)) => {}
    }
    assert_eq!(session.state(), SearchState::Searching);

    let scope = session.scope().clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        scope.teardown();
    });
    assert!(!session.submit().await);
    assert_eq!(session.state(), SearchState::Searching);
}
