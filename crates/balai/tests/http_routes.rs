use std::net::SocketAddr;

use balai::model::STATUS_NEW;
use balai::{build_router, AdminCredentials, AppState, Complaint, NewsItem, Store};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{TimeZone, Utc};
use tempfile::{tempdir, TempDir};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

struct Response {
    status: u16,
    head: String,
    body: String,
}

impl Response {
    fn header(&self, name: &str) -> Option<&str> {
        let prefix = format!("{name}: ");
        self.head.lines().find_map(|line| line.strip_prefix(prefix.as_str()))
    }
}

struct TestSite {
    addr: SocketAddr,
    store: Store,
    _dir: TempDir,
}

async fn start_site() -> TestSite {
    start_site_with(AdminCredentials::new("admin", "admin123"), |_| {}).await
}

async fn start_site_with(credentials: AdminCredentials, seed: impl FnOnce(&Store)) -> TestSite {
    let dir = tempdir().expect("tempdir");
    let data_dir = dir.path().join("data");
    let store = Store::open(&data_dir).expect("open store");
    seed(&store);

    let app = build_router(AppState::new(Store::new(&data_dir), credentials));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });

    TestSite {
        addr,
        store,
        _dir: dir,
    }
}

fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")))
}

fn admin_auth() -> String {
    basic("admin", "admin123")
}

async fn send_raw(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    form: Option<&str>,
) -> Response {
    let body = form.map(|form| ("application/x-www-form-urlencoded", form));
    send_with_body(addr, method, path, headers, body).await
}

async fn send_json(addr: SocketAddr, path: &str, headers: &[(&str, &str)], json: &str) -> Response {
    send_with_body(addr, "POST", path, headers, Some(("application/json", json))).await
}

/// POST with no body and no content type.
async fn send_empty(addr: SocketAddr, path: &str, headers: &[(&str, &str)]) -> Response {
    send_with_body(addr, "POST", path, headers, Some(("", ""))).await
}

async fn send_with_body(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<(&str, &str)>,
) -> Response {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (k, v) in headers {
        req.push_str(&format!("{k}: {v}\r\n"));
    }
    if let Some((content_type, body)) = body {
        if !content_type.is_empty() {
            req.push_str(&format!("Content-Type: {content_type}\r\n"));
        }
        req.push_str(&format!("Content-Length: {}\r\n\r\n{body}", body.len()));
    } else {
        req.push_str("\r\n");
    }
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    Response {
        status,
        head: head.to_string(),
        body: body.to_string(),
    }
}

async fn get(addr: SocketAddr, path: &str) -> Response {
    send_raw(addr, "GET", path, &[], None).await
}

fn news_at(title: &str, slug: &str, secs: i64) -> NewsItem {
    NewsItem {
        id: format!("n-{secs}"),
        title: title.to_string(),
        body: format!("Isi {title}"),
        image_ref: None,
        slug: slug.to_string(),
        created_at: Utc.timestamp_opt(secs, 0).unwrap().into(),
    }
}

fn complaint_with_id(id: &str) -> Complaint {
    Complaint {
        id: id.to_string(),
        name: "Budi".to_string(),
        contact: None,
        category: "Jalan".to_string(),
        body: "Jalan berlubang".to_string(),
        status: STATUS_NEW.to_string(),
        created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap().into(),
        updated_at: None,
    }
}

#[tokio::test]
async fn home_shows_six_newest_news_items() {
    let site = start_site_with(AdminCredentials::new("admin", "admin123"), |store| {
        let items: Vec<_> = (1..=8)
            .map(|i| news_at(&format!("Berita nomor {i}"), &format!("berita-{i}"), i))
            .collect();
        store.news().write(&items).unwrap();
    })
    .await;

    let res = get(site.addr, "/").await;
    assert_eq!(res.status, 200);
    assert!(res.header("content-type").unwrap_or("").starts_with("text/html"));
    for i in 3..=8 {
        assert!(res.body.contains(&format!("/berita/berita-{i}\"")), "missing {i}");
    }
    assert!(!res.body.contains("/berita/berita-2\""));
    assert!(!res.body.contains("/berita/berita-1\""));
    let newest = res.body.find("berita-8").unwrap();
    let older = res.body.find("berita-7").unwrap();
    assert!(newest < older);

    let res = get(site.addr, "/berita").await;
    assert_eq!(res.status, 200);
    for i in 1..=8 {
        assert!(res.body.contains(&format!("/berita/berita-{i}\"")));
    }
}

#[tokio::test]
async fn news_detail_uses_first_matching_slug() {
    let site = start_site_with(AdminCredentials::new("admin", "admin123"), |store| {
        store
            .news()
            .write(&[
                news_at("Pertama", "sama", 1),
                news_at("Kedua", "sama", 2),
            ])
            .unwrap();
    })
    .await;

    let res = get(site.addr, "/berita/sama").await;
    assert_eq!(res.status, 200);
    assert!(res.body.contains("Pertama"));
    assert!(!res.body.contains("Kedua"));
}

#[tokio::test]
async fn unknown_slug_and_unknown_route_are_404() {
    let site = start_site().await;

    let res = get(site.addr, "/berita/unknown-slug").await;
    assert_eq!(res.status, 404);
    assert!(res.body.contains("tidak ditemukan"));

    let res = get(site.addr, "/tidak/ada").await;
    assert_eq!(res.status, 404);
    assert!(res.body.contains("<!DOCTYPE html>"));
}

#[tokio::test]
async fn complaint_form_renders() {
    let site = start_site().await;

    let res = get(site.addr, "/pengaduan").await;
    assert_eq!(res.status, 200);
    assert!(res.body.contains("action=\"/pengaduan\""));
}

#[tokio::test]
async fn valid_complaint_is_stored_with_defaults() {
    let site = start_site().await;

    let res = send_raw(
        site.addr,
        "POST",
        "/pengaduan",
        &[],
        Some("name=Siti&contact=0812&body=Lampu+jalan+mati"),
    )
    .await;
    assert_eq!(res.status, 200);
    assert!(res.body.contains("Terima kasih"));

    let complaints = site.store.complaints().read().unwrap();
    assert_eq!(complaints.len(), 1);
    assert_eq!(complaints[0].name, "Siti");
    assert_eq!(complaints[0].body, "Lampu jalan mati");
    assert_eq!(complaints[0].status, "new");
    assert_eq!(complaints[0].category, "General");
    assert_eq!(complaints[0].contact.as_deref(), Some("0812"));
}

#[tokio::test]
async fn legacy_complaint_field_names_are_accepted() {
    let site = start_site().await;

    let res = send_raw(
        site.addr,
        "POST",
        "/pengaduan",
        &[],
        Some("nama=Budi&kategori=Kebersihan&isi=Sampah"),
    )
    .await;
    assert_eq!(res.status, 200);

    let complaints = site.store.complaints().read().unwrap();
    assert_eq!(complaints[0].name, "Budi");
    assert_eq!(complaints[0].category, "Kebersihan");
}

#[tokio::test]
async fn incomplete_complaint_is_rejected() {
    let site = start_site().await;

    for form in ["name=Siti", "body=Tanpa+nama", "name=+&body=+", ""] {
        let res = send_raw(site.addr, "POST", "/pengaduan", &[], Some(form)).await;
        assert_eq!(res.status, 400, "form {form:?}");
        assert!(res.body.contains("wajib diisi"));
    }

    assert!(site.store.complaints().read().unwrap().is_empty());
}

#[tokio::test]
async fn empty_complaint_post_is_rejected_with_form_error() {
    let site = start_site().await;

    let res = send_empty(site.addr, "/pengaduan", &[]).await;
    assert_eq!(res.status, 400);
    assert!(res.body.contains("wajib diisi"));
    assert!(res.body.contains("action=\"/pengaduan\""));

    let res = send_with_body(
        site.addr,
        "POST",
        "/pengaduan",
        &[],
        Some(("text/plain", "name=Siti&body=x")),
    )
    .await;
    assert_eq!(res.status, 400);

    assert!(site.store.complaints().read().unwrap().is_empty());
}

#[tokio::test]
async fn json_complaint_is_stored() {
    let site = start_site().await;

    let res = send_json(
        site.addr,
        "/pengaduan",
        &[],
        r#"{"nama": "Siti", "isi": "Air mati", "kategori": "Air"}"#,
    )
    .await;
    assert_eq!(res.status, 200);

    let complaints = site.store.complaints().read().unwrap();
    assert_eq!(complaints.len(), 1);
    assert_eq!(complaints[0].name, "Siti");
    assert_eq!(complaints[0].category, "Air");
    assert_eq!(complaints[0].status, "new");
}

#[tokio::test]
async fn incomplete_or_malformed_json_complaint_is_rejected() {
    let site = start_site().await;

    for json in [r#"{"name": "Siti"}"#, "{ rusak", "[]"] {
        let res = send_json(site.addr, "/pengaduan", &[], json).await;
        assert_eq!(res.status, 400, "body {json:?}");
        assert!(res.body.contains("wajib diisi"));
    }

    assert!(site.store.complaints().read().unwrap().is_empty());
}

#[tokio::test]
async fn admin_accepts_json_news_and_rejects_empty_post() {
    let site = start_site().await;
    let auth = admin_auth();

    let res = send_json(
        site.addr,
        "/admin/berita",
        &[("Authorization", &auth)],
        r#"{"judul": "Posyandu Mei", "isi": "Tanggal 12", "gambar": "/img/p.jpg"}"#,
    )
    .await;
    assert_eq!(res.status, 302);
    assert_eq!(res.header("location"), Some("/admin"));

    let res = send_empty(site.addr, "/admin/berita", &[("Authorization", &auth)]).await;
    assert_eq!(res.status, 400);

    let news = site.store.news().read().unwrap();
    assert_eq!(news.len(), 1);
    assert_eq!(news[0].slug, "posyandu-mei");
    assert_eq!(news[0].image_ref.as_deref(), Some("/img/p.jpg"));
}

#[tokio::test]
async fn undated_news_item_still_renders() {
    let site = start_site().await;
    std::fs::write(
        site.store.news().path(),
        r#"[
            {"id": "1", "title": "Aneh", "body": "Tanpa tanggal", "slug": "aneh", "createdAt": "kemarin"},
            {"id": "2", "title": "Baik", "body": "Bertanggal", "slug": "baik", "createdAt": "2024-05-01T08:00:00.000Z"}
        ]"#,
    )
    .unwrap();

    let res = get(site.addr, "/").await;
    assert_eq!(res.status, 200);
    let dated = res.body.find("/berita/baik\"").expect("dated item listed");
    let undated = res.body.find("/berita/aneh\"").expect("undated item listed");
    assert!(dated < undated);

    let res = get(site.addr, "/berita").await;
    assert_eq!(res.status, 200);

    let res = get(site.addr, "/berita/baik").await;
    assert_eq!(res.status, 200);
    let res = get(site.addr, "/berita/aneh").await;
    assert_eq!(res.status, 200);
    assert!(res.body.contains("kemarin"));

    let auth = admin_auth();
    let res = send_raw(site.addr, "GET", "/admin", &[("Authorization", &auth)], None).await;
    assert_eq!(res.status, 200);
}

#[tokio::test]
async fn admin_requires_credentials() {
    let site = start_site().await;

    let res = get(site.addr, "/admin").await;
    assert_eq!(res.status, 401);
    assert_eq!(res.header("www-authenticate"), Some("Basic realm=\"Admin\""));

    let wrong = basic("admin", "salah");
    let res = send_raw(site.addr, "GET", "/admin", &[("Authorization", &wrong)], None).await;
    assert_eq!(res.status, 401);

    let res = send_raw(
        site.addr,
        "POST",
        "/admin/berita",
        &[],
        Some("title=Tanpa+izin&body=x"),
    )
    .await;
    assert_eq!(res.status, 401);
    assert!(site.store.news().read().unwrap().is_empty());

    // The gate covers unknown admin paths too.
    let res = get(site.addr, "/admin/rahasia").await;
    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn dashboard_lists_news_and_complaints() {
    let site = start_site_with(AdminCredentials::new("admin", "admin123"), |store| {
        store.news().write(&[news_at("Rapat RT", "rapat-rt", 5)]).unwrap();
        store.complaints().write(&[complaint_with_id("12345")]).unwrap();
    })
    .await;

    let auth = admin_auth();
    let res = send_raw(site.addr, "GET", "/admin", &[("Authorization", &auth)], None).await;
    assert_eq!(res.status, 200);
    assert!(res.body.contains("Rapat RT"));
    assert!(res.body.contains("Jalan berlubang"));
    assert!(res.body.contains("/admin/pengaduan/12345/status"));
}

#[tokio::test]
async fn admin_creates_news_with_slug_and_redirects() {
    let site = start_site().await;

    let auth = admin_auth();
    let res = send_raw(
        site.addr,
        "POST",
        "/admin/berita",
        &[("Authorization", &auth)],
        Some("title=Jalan+Rusak%21%21&body=Segera+diperbaiki"),
    )
    .await;
    assert_eq!(res.status, 302);
    assert_eq!(res.header("location"), Some("/admin"));

    let news = site.store.news().read().unwrap();
    assert_eq!(news.len(), 1);
    assert_eq!(news[0].title, "Jalan Rusak!!");
    assert_eq!(news[0].slug, "jalan-rusak");

    let res = get(site.addr, "/berita/jalan-rusak").await;
    assert_eq!(res.status, 200);
    assert!(res.body.contains("Segera diperbaiki"));
}

#[tokio::test]
async fn admin_news_without_title_is_400_plain_text() {
    let site = start_site().await;

    let auth = admin_auth();
    let res = send_raw(
        site.addr,
        "POST",
        "/admin/berita",
        &[("Authorization", &auth)],
        Some("body=Tanpa+judul"),
    )
    .await;
    assert_eq!(res.status, 400);
    assert!(res.header("content-type").unwrap_or("").starts_with("text/plain"));
    assert!(site.store.news().read().unwrap().is_empty());
}

#[tokio::test]
async fn admin_updates_complaint_status() {
    let site = start_site_with(AdminCredentials::new("admin", "admin123"), |store| {
        store
            .complaints()
            .write(&[complaint_with_id("999"), complaint_with_id("12345")])
            .unwrap();
    })
    .await;

    let auth = admin_auth();
    let res = send_raw(
        site.addr,
        "POST",
        "/admin/pengaduan/12345/status",
        &[("Authorization", &auth)],
        Some("status=selesai"),
    )
    .await;
    assert_eq!(res.status, 302);
    assert_eq!(res.header("location"), Some("/admin"));

    let complaints = site.store.complaints().read().unwrap();
    assert_eq!(complaints[1].id, "12345");
    assert_eq!(complaints[1].status, "selesai");
    assert!(complaints[1].updated_at.is_some());
    assert_eq!(complaints[0].status, "new");
    assert!(complaints[0].updated_at.is_none());
}

#[tokio::test]
async fn blank_status_keeps_previous_value() {
    let site = start_site_with(AdminCredentials::new("admin", "admin123"), |store| {
        store.complaints().write(&[complaint_with_id("7")]).unwrap();
    })
    .await;

    let auth = admin_auth();
    let res = send_raw(
        site.addr,
        "POST",
        "/admin/pengaduan/7/status",
        &[("Authorization", &auth)],
        Some("status="),
    )
    .await;
    assert_eq!(res.status, 302);

    let complaint = &site.store.complaints().read().unwrap()[0];
    assert_eq!(complaint.status, "new");
    assert!(complaint.updated_at.is_some());
}

#[tokio::test]
async fn unknown_complaint_status_update_is_404() {
    let site = start_site().await;

    let auth = admin_auth();
    let res = send_raw(
        site.addr,
        "POST",
        "/admin/pengaduan/nope/status",
        &[("Authorization", &auth)],
        Some("status=selesai"),
    )
    .await;
    assert_eq!(res.status, 404);
    assert!(res.header("content-type").unwrap_or("").starts_with("text/plain"));
}

#[tokio::test]
async fn configured_credentials_replace_default() {
    let site = start_site_with(AdminCredentials::new("lurah", "rahasia"), |_| {}).await;

    let default_auth = admin_auth();
    let res = send_raw(site.addr, "GET", "/admin", &[("Authorization", &default_auth)], None).await;
    assert_eq!(res.status, 401);

    let auth = basic("lurah", "rahasia");
    let res = send_raw(site.addr, "GET", "/admin", &[("Authorization", &auth)], None).await;
    assert_eq!(res.status, 200);
}

#[tokio::test]
async fn corrupt_collection_is_a_server_error() {
    let site = start_site().await;
    std::fs::write(site.store.news().path(), "{ broken").unwrap();

    let res = get(site.addr, "/").await;
    assert_eq!(res.status, 500);

    // The public complaint flow is unaffected by a broken news file.
    let res = get(site.addr, "/pengaduan").await;
    assert_eq!(res.status, 200);
}

#[tokio::test]
async fn simultaneous_news_posts_are_all_kept() {
    let site = start_site().await;
    let auth = admin_auth();

    let requests: Vec<_> = (0..12)
        .map(|i| {
            let addr = site.addr;
            let auth = auth.clone();
            tokio::spawn(async move {
                let form = format!("title=Berita+{i}&body=Isi+{i}");
                send_raw(addr, "POST", "/admin/berita", &[("Authorization", &auth)], Some(&form))
                    .await
                    .status
            })
        })
        .collect();
    for request in requests {
        assert_eq!(request.await.unwrap(), 302);
    }

    assert_eq!(site.store.news().read().unwrap().len(), 12);
}

#[tokio::test]
async fn request_id_is_echoed_or_assigned() {
    let site = start_site().await;

    let res = send_raw(site.addr, "GET", "/", &[("X-Request-Id", "abc-123")], None).await;
    assert_eq!(res.header("x-request-id"), Some("abc-123"));

    let res = get(site.addr, "/").await;
    assert!(res.header("x-request-id").unwrap().starts_with("req-"));
}
