use serde_json::json;
use std::time::Instant;

const BASE_URL: &str = "http://127.0.0.1:3000";
const NUM_USERS: usize = 50;
const POSTS_PER_USER: usize = 3;
const FEED_PAGES: usize = 5;

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to build client")
}

async fn signup_and_login(client: &reqwest::Client, username: &str, password: &str) -> Option<String> {
    let create_resp = client
        .post(&format!("{}/auth/signup/", BASE_URL))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .ok()?;
    if create_resp.status() != 201 {
        return None;
    }

    let login_resp = client
        .post(&format!("{}/auth/login/", BASE_URL))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .ok()?;
    let token_data = login_resp.json::<serde_json::Value>().await.ok()?;
    token_data["token"].as_str().map(|t| t.to_string())
}

/// Needs a server on `BASE_URL`: `FEEDBOARD_BIND_ADDR=127.0.0.1:3000 cargo run`.
#[ignore]
#[tokio::test(flavor = "multi_thread")]
async fn perf_test_follow_feed() {
    let client = client();
    let start = Instant::now();
    let run_id = uuid::Uuid::new_v4().to_string()[0..8].to_string();

    println!("\n=== Follow Feed Performance Test ===");
    println!("Creating {} users with {} posts each...", NUM_USERS, POSTS_PER_USER);

    let reader = format!("reader_{}", run_id);
    let reader_token = signup_and_login(&client, &reader, "password123")
        .await
        .expect("Failed to create reader");

    let mut posts_created = 0;
    let mut posts_failed = 0;
    let setup_start = Instant::now();
    for i in 0..NUM_USERS {
        let username = format!("perf_{}_{}", i, run_id);
        let Some(token) = signup_and_login(&client, &username, "password123").await else {
            continue;
        };

        for post_num in 0..POSTS_PER_USER {
            let text = format!(
                "Post {} from user {} - Perf test at {}",
                post_num + 1,
                i,
                chrono::Utc::now().to_rfc3339()
            );
            let resp = client
                .post(&format!("{}/create/", BASE_URL))
                .header("Authorization", format!("Bearer {}", token))
                .json(&json!({ "text": text }))
                .send()
                .await;
            match resp {
                Ok(r) if r.status() == 302 => posts_created += 1,
                _ => posts_failed += 1,
            }
        }

        client
            .post(&format!("{}/profile/{}/follow/", BASE_URL, username))
            .header("Authorization", format!("Bearer {}", reader_token))
            .send()
            .await
            .expect("Failed to follow");
    }
    let setup_time = setup_start.elapsed();

    let fetch_start = Instant::now();
    for page in 1..=FEED_PAGES {
        let resp = client
            .get(&format!("{}/follow/?page={}", BASE_URL, page))
            .header("Authorization", format!("Bearer {}", reader_token))
            .send()
            .await
            .expect("Failed to fetch feed");
        assert_eq!(resp.status(), 200);
    }
    let fetch_time = fetch_start.elapsed();

    println!("\n=== Results ===");
    println!("Total time: {:.2}s", start.elapsed().as_secs_f64());
    println!("Setup: {:.2}s", setup_time.as_secs_f64());
    println!("Posts created: {}", posts_created);
    println!("Posts failed: {}", posts_failed);
    println!(
        "Avg follow feed page: {:.2}ms",
        fetch_time.as_secs_f64() * 1000.0 / FEED_PAGES as f64
    );
}
