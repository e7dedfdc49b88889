mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{email, unique_user, Api};

fn user_ids(list: &Value, key: &str) -> Vec<String> {
    list.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item[key].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn owner_invites_member_who_then_sees_trip() -> Result<()> {
    let api = Api::connect().await?;
    let x = unique_user("x");
    let y = unique_user("y");

    let (status, created) = api
        .post(Some(&x), "/trips", json!({ "title": "Japan", "tags": ["spring"] }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let trip = &created["data"];
    let trip_id = trip["id"].as_str().unwrap().to_string();
    assert_eq!(trip["owner"]["userId"], x.as_str());
    assert_eq!(trip["members"], json!([]));
    assert_eq!(trip["memberIds"], json!([]));
    assert_eq!(trip["tags"], json!(["spring"]));

    let (status, invited) = api
        .post(Some(&x), &format!("/trips/{}/invite", trip_id), json!({ "email": email(&y) }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(invited["data"]["member"]["userId"], y.as_str());

    let (status, trips) = api.get(Some(&y), "/trips/user").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user_ids(&trips["data"], "id"), vec![trip_id.clone()]);

    let (status, events) = api.get(Some(&y), &format!("/trips/{}/events", trip_id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events["data"], json!([]));

    let (status, members) = api.get(Some(&y), &format!("/trips/{}/members", trip_id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user_ids(&members["data"], "userId"), vec![x.clone(), y.clone()]);
    Ok(())
}

#[tokio::test]
async fn create_trip_without_title_is_bad_request() -> Result<()> {
    let api = Api::connect().await?;
    let x = unique_user("x");

    let (status, body) = api.post(Some(&x), "/trips", json!({ "summary": "no title" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");

    let (_, trips) = api.get(Some(&x), "/trips/user").await?;
    assert_eq!(trips["data"], json!([]));
    Ok(())
}

#[tokio::test]
async fn strangers_get_forbidden_without_trip_contents() -> Result<()> {
    let api = Api::connect().await?;
    let x = unique_user("x");
    let z = unique_user("z");
    let trip_id = api.create_trip(&x, "Secret retreat").await?;

    for path in [format!("/trips/{}", trip_id), format!("/trips/{}/members", trip_id)] {
        let (status, body) = api.get(Some(&z), &path).await?;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Access denied");
        assert!(!body.to_string().contains("Secret retreat"));
    }

    let (status, _) = api.get(Some(&x), "/trips/does-not-exist").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn invitation_rules() -> Result<()> {
    let api = Api::connect().await?;
    let x = unique_user("x");
    let y = unique_user("y");
    let w = unique_user("w");
    let trip_id = api.create_trip(&x, "Peru").await?;
    let invite = format!("/trips/{}/invite", trip_id);

    let (status, body) = api.post(Some(&x), &invite, json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing invited user info");

    let (status, body) = api.post(Some(&x), &invite, json!({ "email": email(&x) })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot invite the owner");

    let (status, body) = api
        .post(Some(&x), &invite, json!({ "email": "ghost@elsewhere.example" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User not found");

    let (status, _) = api.post(Some(&x), &invite, json!({ "email": email(&y) })).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = api.post(Some(&x), &invite, json!({ "email": email(&y) })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User already a member");

    // Members cannot invite.
    let (status, _) = api.post(Some(&y), &invite, json!({ "email": email(&w) })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = api
        .post(Some(&x), "/trips/does-not-exist/invite", json!({ "email": email(&w) }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Trip not found");

    let (_, trip) = api.get(Some(&x), &format!("/trips/{}", trip_id)).await?;
    assert_eq!(trip["data"]["memberIds"], json!([y]));
    assert_eq!(trip["data"]["members"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn listing_merges_owned_and_joined_trips() -> Result<()> {
    let api = Api::connect().await?;
    let x = unique_user("x");
    let y = unique_user("y");

    let own = api.create_trip(&x, "Own").await?;
    let joined = api.create_trip(&y, "Joined").await?;
    api.create_trip(&y, "Not mine").await?;
    api.post(Some(&y), &format!("/trips/{}/invite", joined), json!({ "email": email(&x) }))
        .await?;

    let (status, trips) = api.get(Some(&x), "/trips/user").await?;
    assert_eq!(status, StatusCode::OK);
    let mut ids = user_ids(&trips["data"], "id");
    ids.sort();
    let mut expected = vec![own, joined];
    expected.sort();
    assert_eq!(ids, expected);
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_bad_request() -> Result<()> {
    let api = Api::connect().await?;
    let x = unique_user("x");

    let (status, body) = api
        .post(Some(&x), "/trips", json!({ "title": "Japan", "createdAt": "yesterday" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    Ok(())
}
