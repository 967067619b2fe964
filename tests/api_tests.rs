// tests/api_tests.rs

mod common;

use chrono::Duration;
use common::spawn_app;
use recipe_api::models::site_visit::SiteVisit;
use serde_json::{Value, json};

#[tokio::test]
async fn unknown_path_is_404() {
    let app = spawn_app().await;
    let response = app.get("/random_path_that_does_not_exist", None).await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn signup_conflict_and_login() {
    let app = spawn_app().await;

    assert_eq!(app.signup("a@b", "x").await.status().as_u16(), 200);
    let again = app.signup("a@b", "x").await;
    assert_eq!(again.status().as_u16(), 409);

    let ok = app.login("a@b", "x").await;
    assert_eq!(ok.status().as_u16(), 200);
    let body: Value = ok.json().await.unwrap();
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

    let wrong = app.login("a@b", "y").await;
    assert_eq!(wrong.status().as_u16(), 401);
    let body: Value = wrong.json().await.unwrap();
    assert_eq!(body, json!({ "error": "invalid email or password" }));

    let unknown = app.login("nobody@b", "x").await;
    assert_eq!(unknown.status().as_u16(), 401);
    let body: Value = unknown.json().await.unwrap();
    assert_eq!(body["error"], "invalid email or password");
}

#[tokio::test]
async fn signup_rejects_empty_fields_and_bad_json() {
    let app = spawn_app().await;

    let empty = app
        .post_json(
            "/signup",
            &json!({ "name": "", "last_name": "B", "email": "a@b", "password": "x" }),
            None,
        )
        .await;
    assert_eq!(empty.status().as_u16(), 400);

    let garbage = app
        .client
        .post(app.url("/signup"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(garbage.status().as_u16(), 400);
    let body: Value = garbage.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn user_profile_never_leaks_credentials() {
    let app = spawn_app().await;
    let (id, token) = app.register_user("private@example.com").await;

    let response = app.get(&format!("/user/{id}"), Some(&token)).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    let user = &body["data"]["user"];
    assert_eq!(user["email"], "private@example.com");
    for secret in ["password_hash", "salt", "password_reset_token", "password_reset_expires_at"] {
        assert!(user.get(secret).is_none(), "{secret} leaked");
    }
}

#[tokio::test]
async fn forgot_and_reset_password_flow() {
    let app = spawn_app().await;
    app.signup("a@b", "x").await;

    let response = app
        .post_json("/forgot-password", &json!({ "email": "a@b" }), None)
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    let token = body["reset_token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 64);

    let missing = app
        .post_json("/forgot-password", &json!({ "email": "missing@x" }), None)
        .await;
    assert_eq!(missing.status().as_u16(), 200);
    let missing_body: Value = missing.json().await.unwrap();
    assert!(missing_body.get("reset_token").is_none());
    assert_eq!(missing_body["message"], body["message"]);

    let reset = app
        .post_json("/reset-password", &json!({ "token": token, "new_password": "z" }), None)
        .await;
    assert_eq!(reset.status().as_u16(), 200);

    let replay = app
        .post_json("/reset-password", &json!({ "token": token, "new_password": "w" }), None)
        .await;
    assert_eq!(replay.status().as_u16(), 400);
    let body: Value = replay.json().await.unwrap();
    assert_eq!(body["error"], "invalid or expired token");

    assert_eq!(app.login("a@b", "x").await.status().as_u16(), 401);
    assert_eq!(app.login("a@b", "z").await.status().as_u16(), 200);
}

#[tokio::test]
async fn reset_token_expires_after_fifteen_minutes() {
    let app = spawn_app().await;
    app.signup("late@b", "x").await;

    let body: Value = app
        .post_json("/forgot-password", &json!({ "email": "late@b" }), None)
        .await
        .json()
        .await
        .unwrap();
    let token = body["reset_token"].as_str().unwrap().to_string();

    app.clock.advance(Duration::minutes(15));

    let reset = app
        .post_json("/reset-password", &json!({ "token": token, "new_password": "z" }), None)
        .await;
    assert_eq!(reset.status().as_u16(), 400);
    assert_eq!(app.login("late@b", "x").await.status().as_u16(), 200);
}

#[tokio::test]
async fn new_reset_token_replaces_the_old_one() {
    let app = spawn_app().await;
    app.signup("twice@b", "x").await;

    let first: Value = app
        .post_json("/forgot-password", &json!({ "email": "twice@b" }), None)
        .await
        .json()
        .await
        .unwrap();
    let second: Value = app
        .post_json("/forgot-password", &json!({ "email": "twice@b" }), None)
        .await
        .json()
        .await
        .unwrap();
    assert_ne!(first["reset_token"], second["reset_token"]);

    let stale = app
        .post_json(
            "/reset-password",
            &json!({ "token": first["reset_token"], "new_password": "z" }),
            None,
        )
        .await;
    assert_eq!(stale.status().as_u16(), 400);
}

#[tokio::test]
async fn unknown_reset_token_is_rejected() {
    let app = spawn_app().await;
    let token = uuid::Uuid::new_v4().simple().to_string();

    let response = app
        .post_json("/reset-password", &json!({ "token": token, "new_password": "z" }), None)
        .await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "invalid or expired token");
}

#[tokio::test]
async fn empty_reset_token_is_rejected() {
    let app = spawn_app().await;
    app.signup("never@b", "x").await;

    let response = app
        .post_json("/reset-password", &json!({ "token": "", "new_password": "z" }), None)
        .await;
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(app.login("never@b", "x").await.status().as_u16(), 200);
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = spawn_app().await;
    let (_, token) = app.register_user("cook@example.com").await;
    let body = json!({ "title": "T", "text": "X" });

    let missing = app.post_json("/recipe", &body, None).await;
    assert_eq!(missing.status().as_u16(), 401);

    let malformed = app
        .client
        .post(app.url("/recipe"))
        .header("authorization", format!("Token {token}"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status().as_u16(), 401);

    let forged = app.post_json("/recipe", &body, Some("abc.def.ghi")).await;
    assert_eq!(forged.status().as_u16(), 401);
    let forged_body: Value = forged.json().await.unwrap();
    assert_eq!(forged_body["error"], "invalid token");

    app.clock.advance(Duration::hours(24));
    let expired = app.post_json("/recipe", &body, Some(&token)).await;
    assert_eq!(expired.status().as_u16(), 401);
    let expired_body: Value = expired.json().await.unwrap();
    assert_eq!(expired_body["error"], "token expired");
}

#[tokio::test]
async fn recipe_crud_and_listing() {
    let app = spawn_app().await;
    let (user_id, token) = app.register_user("cook@example.com").await;

    let id = app.create_recipe(&token, "Pancakes").await;

    let response = app.get(&format!("/recipe/{id}"), None).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Pancakes");
    assert_eq!(body["data"]["text"], "Mix everything.");
    assert_eq!(body["data"]["user_id"], user_id);
    assert_eq!(body["data"]["ingredients"].as_array().unwrap().len(), 2);

    let ingredients: Value = app
        .get(&format!("/recipe/{id}/ingridients"), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(ingredients["data"][0]["name"], "flour");

    app.create_recipe(&token, "Waffles").await;
    app.create_recipe(&token, "Crepes").await;

    let list: Value = app
        .get("/recipe/list?limit=2&offset=1", None)
        .await
        .json()
        .await
        .unwrap();
    let titles: Vec<_> = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Waffles", "Crepes"]);
    assert_eq!(list["count"], 3);

    let missing = app.get("/recipe/9999", None).await;
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn text_fields_are_stored_verbatim() {
    let app = spawn_app().await;
    let (_, token) = app.register_user("cook@example.com").await;

    let created: Value = app
        .post_json(
            "/recipe",
            &json!({
                "title": "Fish & Chips",
                "text": "Salt & pepper, bake at < 200C",
                "ingridient": [{ "name": "salt & vinegar", "amount": "<1 tsp" }],
            }),
            Some(&token),
        )
        .await
        .json()
        .await
        .unwrap();
    let id = created["id"].as_i64().unwrap();

    let body: Value = app.get(&format!("/recipe/{id}"), None).await.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Fish & Chips");
    assert_eq!(body["data"]["text"], "Salt & pepper, bake at < 200C");
    assert_eq!(body["data"]["ingredients"][0]["name"], "salt & vinegar");
    assert_eq!(body["data"]["ingredients"][0]["amount"], "<1 tsp");

    let comment = app
        .post_json(
            "/comment",
            &json!({ "title": "A & B", "description": "x < y", "recipe_id": id }),
            Some(&token),
        )
        .await;
    assert_eq!(comment.status().as_u16(), 200);

    let comments: Value = app
        .get(&format!("/recipe/{id}/comments"), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(comments["data"][0]["title"], "A & B");
    assert_eq!(comments["data"][0]["description"], "x < y");
}

#[tokio::test]
async fn pagination_boundaries() {
    let app = spawn_app().await;
    let (_, token) = app.register_user("cook@example.com").await;
    app.create_recipe(&token, "Only").await;

    let zero: Value = app.get("/recipe/list?limit=0", None).await.json().await.unwrap();
    assert!(zero["data"].as_array().unwrap().is_empty());
    assert_eq!(zero["count"], 1);

    let defaults = app.get("/recipe/list", None).await;
    assert_eq!(defaults.status().as_u16(), 200);

    // The last one fails to decode at all and must still use the envelope.
    for query in ["limit=-1", "offset=-1", "limit=", "limit=abc", "limit=101", "limit=1&limit=2"] {
        let response = app.get(&format!("/recipe/list?{query}"), None).await;
        assert_eq!(response.status().as_u16(), 400, "{query}");
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].is_string(), "{query}");
    }
}

#[tokio::test]
async fn update_replaces_ingredients_and_checks_owner() {
    let app = spawn_app().await;
    let (_, owner) = app.register_user("owner@example.com").await;
    let (_, stranger) = app.register_user("stranger@example.com").await;
    let id = app.create_recipe(&owner, "Soup").await;

    let body = json!({
        "title": "T",
        "text": "X",
        "ingridient": [{ "name": "a", "amount": "1" }, { "name": "b", "amount": "2" }]
    });

    let forbidden = app.put_json(&format!("/recipe/{id}"), &body, &stranger).await;
    assert_eq!(forbidden.status().as_u16(), 403);

    let ok = app.put_json(&format!("/recipe/{id}"), &body, &owner).await;
    assert_eq!(ok.status().as_u16(), 200);

    let detail: Value = app.get(&format!("/recipe/{id}"), None).await.json().await.unwrap();
    assert_eq!(detail["data"]["title"], "T");
    let names: Vec<_> = detail["data"]["ingredients"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["a", "b"]);

    let too_long = json!({
        "title": "Broken",
        "text": "X",
        "ingridient": [{ "name": "a", "amount": "1" }, { "name": "x".repeat(300), "amount": "2" }]
    });
    let rejected = app.put_json(&format!("/recipe/{id}"), &too_long, &owner).await;
    assert_eq!(rejected.status().as_u16(), 400);

    let unchanged: Value = app.get(&format!("/recipe/{id}"), None).await.json().await.unwrap();
    assert_eq!(unchanged["data"]["title"], "T");
    assert_eq!(unchanged["data"]["ingredients"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn delete_recipe_cascades() {
    let app = spawn_app().await;
    let (_, owner) = app.register_user("owner@example.com").await;
    let (_, fan) = app.register_user("fan@example.com").await;
    let id = app.create_recipe(&owner, "Stew").await;

    for (path, body) in [
        ("/comment", json!({ "title": "Yum", "description": "Great", "recipe_id": id })),
        ("/rating", json!({ "recipe_id": id, "score": 5 })),
        ("/favorite", json!({ "recipe_id": id })),
    ] {
        let response = app.post_json(path, &body, Some(&fan)).await;
        assert_eq!(response.status().as_u16(), 200, "{path}");
    }

    assert_eq!(app.delete(&format!("/recipe/{id}"), &fan).await.status().as_u16(), 403);
    assert_eq!(app.delete(&format!("/recipe/{id}"), &owner).await.status().as_u16(), 200);
    assert_eq!(app.get(&format!("/recipe/{id}"), None).await.status().as_u16(), 404);

    for table in ["ingredients", "comments", "ratings", "favorites"] {
        let sql = format!("SELECT COUNT(*) FROM {table} WHERE recipe_id = ?");
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_one(&app.pool)
            .await
            .unwrap();
        assert_eq!(count, 0, "{table}");
    }
}

#[tokio::test]
async fn comments_are_paginated_and_owned() {
    let app = spawn_app().await;
    let (_, owner) = app.register_user("owner@example.com").await;
    let (_, other) = app.register_user("other@example.com").await;
    let recipe = app.create_recipe(&owner, "Salad").await;

    let mut ids = Vec::new();
    for i in 0..3 {
        let body: Value = app
            .post_json(
                "/comment",
                &json!({ "title": format!("c{i}"), "description": "nice", "recipe_id": recipe }),
                Some(&owner),
            )
            .await
            .json()
            .await
            .unwrap();
        ids.push(body["id"].as_i64().unwrap());
    }

    let page: Value = app
        .get(&format!("/recipe/{recipe}/comments?limit=2&offset=2"), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["count"], 3);
    assert_eq!(page["data"].as_array().unwrap().len(), 1);
    assert_eq!(page["data"][0]["title"], "c2");

    assert_eq!(app.delete(&format!("/comment/{}", ids[0]), &other).await.status().as_u16(), 403);
    assert_eq!(app.delete(&format!("/comment/{}", ids[0]), &owner).await.status().as_u16(), 200);
    assert_eq!(app.delete(&format!("/comment/{}", ids[0]), &owner).await.status().as_u16(), 404);

    let bad_recipe = app
        .post_json(
            "/comment",
            &json!({ "title": "t", "description": "d", "recipe_id": 0 }),
            Some(&owner),
        )
        .await;
    assert_eq!(bad_recipe.status().as_u16(), 400);

    let no_recipe = app
        .post_json(
            "/comment",
            &json!({ "title": "t", "description": "d", "recipe_id": 424242 }),
            Some(&owner),
        )
        .await;
    assert_eq!(no_recipe.status().as_u16(), 404);
}

#[tokio::test]
async fn ratings_are_validated_and_deleted_from_ratings() {
    let app = spawn_app().await;
    let (user_id, token) = app.register_user("rater@example.com").await;
    let recipe = app.create_recipe(&token, "Pie").await;

    for score in [0, 6] {
        let response = app
            .post_json("/rating", &json!({ "recipe_id": recipe, "score": score }), Some(&token))
            .await;
        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("score must be between 1 and 5"));
    }

    for score in [1, 5] {
        let response = app
            .post_json("/rating", &json!({ "recipe_id": recipe, "score": score }), Some(&token))
            .await;
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        let id = body["id"].as_i64().unwrap();

        let stored: i64 = sqlx::query_scalar("SELECT score FROM ratings WHERE id = ?")
            .bind(id)
            .fetch_one(&app.pool)
            .await
            .unwrap();
        assert_eq!(stored, score);
        assert_eq!(app.delete(&format!("/rating/{id}"), &token).await.status().as_u16(), 200);
    }

    let favorite: Value = app
        .post_json("/favorite", &json!({ "recipe_id": recipe }), Some(&token))
        .await
        .json()
        .await
        .unwrap();
    let rating: Value = app
        .post_json("/rating", &json!({ "recipe_id": recipe, "score": 4 }), Some(&token))
        .await
        .json()
        .await
        .unwrap();
    let rating_id = rating["id"].as_i64().unwrap();

    let response = app.delete(&format!("/rating/{rating_id}"), &token).await;
    assert_eq!(response.status().as_u16(), 200);

    let ratings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ratings WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    let favorites: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE id = ?")
        .bind(favorite["id"].as_i64().unwrap())
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(ratings, 0);
    assert_eq!(favorites, 1);
}

#[tokio::test]
async fn favorites_are_unique_per_user() {
    let app = spawn_app().await;
    let (user_id, token) = app.register_user("fan@example.com").await;
    let (_, other) = app.register_user("other@example.com").await;
    let recipe = app.create_recipe(&token, "Cake").await;

    let first = app.post_json("/favorite", &json!({ "recipe_id": recipe }), Some(&token)).await;
    assert_eq!(first.status().as_u16(), 200);
    let favorite_id = first.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let again = app.post_json("/favorite", &json!({ "recipe_id": recipe }), Some(&token)).await;
    assert_eq!(again.status().as_u16(), 409);

    let listed: Value = app
        .get(&format!("/user/{user_id}/favorites"), Some(&token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["data"][0]["title"], "Cake");

    let path = format!("/favorite/{favorite_id}");
    assert_eq!(app.delete(&path, &other).await.status().as_u16(), 403);
    assert_eq!(app.delete(&path, &token).await.status().as_u16(), 200);
}

#[tokio::test]
async fn ingredients_can_be_added_by_the_owner_only() {
    let app = spawn_app().await;
    let (_, owner) = app.register_user("owner@example.com").await;
    let (_, other) = app.register_user("other@example.com").await;
    let recipe = app.create_recipe(&owner, "Bread").await;
    let body = json!({ "name": "salt", "amount": "1 tsp", "recipe_id": recipe });

    assert_eq!(app.post_json("/ingridient", &body, Some(&other)).await.status().as_u16(), 403);

    let created = app.post_json("/ingridient", &body, Some(&owner)).await;
    assert_eq!(created.status().as_u16(), 200);
    let id = created.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let orphan = json!({ "name": "salt", "amount": "", "recipe_id": 777 });
    let missing_recipe = app.post_json("/ingridient", &orphan, Some(&owner)).await;
    assert_eq!(missing_recipe.status().as_u16(), 404);

    assert_eq!(app.delete(&format!("/ingridient/{id}"), &other).await.status().as_u16(), 403);
    assert_eq!(app.delete(&format!("/ingridient/{id}"), &owner).await.status().as_u16(), 200);
}

#[tokio::test]
async fn rankings_follow_ratings_and_favorites() {
    let app = spawn_app().await;
    let (_, token) = app.register_user("rater@example.com").await;
    let r1 = app.create_recipe(&token, "R1").await;
    let r2 = app.create_recipe(&token, "R2").await;
    let r3 = app.create_recipe(&token, "R3").await;

    for (recipe, score) in [(r1, 5), (r1, 5), (r1, 4), (r2, 5)] {
        let response = app
            .post_json("/rating", &json!({ "recipe_id": recipe, "score": score }), Some(&token))
            .await;
        assert_eq!(response.status().as_u16(), 200);
    }

    let top: Value = app
        .get("/recipes/top-rated?limit=2&offset=0", None)
        .await
        .json()
        .await
        .unwrap();
    let top = top.as_array().unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0]["recipe_id"], r2);
    assert_eq!(top[0]["average"].as_f64().unwrap(), 5.0);
    assert_eq!(top[0]["total_votes"], 1);
    assert_eq!(top[1]["recipe_id"], r1);
    assert!((top[1]["average"].as_f64().unwrap() - 14.0 / 3.0).abs() < 1e-9);
    assert_eq!(top[1]["total_votes"], 3);

    app.post_json("/favorite", &json!({ "recipe_id": r3 }), Some(&token)).await;

    let popular: Value = app.get("/recipes/popular", None).await.json().await.unwrap();
    let recipes = popular["recipes"].as_array().unwrap();
    assert_eq!(recipes.len(), 3);
    assert_eq!(recipes[0]["id"], r3);
    assert_eq!(recipes[0]["favorite_count"], 1);
    assert_eq!(recipes[1]["favorite_count"], 0);
}

#[tokio::test]
async fn visits_record_ip_and_authenticated_user() {
    let app = spawn_app().await;
    let (user_id, token) = app.register_user("visitor@example.com").await;

    app.get("/recipe/list", Some(&token)).await;
    app.get("/recipe/list", None).await;

    let rows: Vec<SiteVisit> = sqlx::query_as(
        "SELECT id, ip, user_id, visited_at FROM site_visits ORDER BY id DESC LIMIT 2",
    )
    .fetch_all(&app.pool)
    .await
    .unwrap();
    assert_eq!(rows[0].ip, "127.0.0.1");
    assert_eq!(rows[0].user_id, None);
    assert_eq!(rows[1].ip, "127.0.0.1");
    assert_eq!(rows[1].user_id, Some(user_id));
}
